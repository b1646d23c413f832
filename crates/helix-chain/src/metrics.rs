//! Supply and pool metrics, with an optional cached snapshot source.
//!
//! A small helper service may publish a pre-computed snapshot at
//! `GET /api.json`; when it is unreachable or malformed the client
//! recomputes the same figures directly from the LCD, so nothing here
//! ever depends on the helper being up.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use helix_types::dec::{format_units, parse_dec};
use helix_types::{is_base_like, ChainProfile, Result, WalletError};

use crate::lcd::LcdClient;

/// Metrics source configuration.
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Optional cache helper endpoint serving /api.json.
    pub cache_url: Option<String>,
    /// How long a detected denom/decimals pair stays valid.
    pub denom_ttl: Duration,
    /// Output precision cap for formatted figures.
    pub out_max_frac: u32,
    pub request_timeout_ms: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            cache_url: None,
            denom_ttl: Duration::from_secs(6 * 60 * 60),
            out_max_frac: 18,
            request_timeout_ms: 12_000,
        }
    }
}

/// Chain-level supply figures, formatted in display units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainMetrics {
    pub circulating_supply: String,
    pub circulating_supply_raw: String,
    pub community_pool: String,
    pub total_staked: String,
}

struct DenomCache {
    fetched_at: Instant,
    base_denom: String,
    decimals: u32,
}

/// Metrics client with cached-snapshot-first, direct-LCD-fallback fetch.
pub struct MetricsClient {
    lcd: LcdClient,
    profile: ChainProfile,
    config: MetricsConfig,
    http: reqwest::Client,
    denom_cache: Mutex<Option<DenomCache>>,
}

impl MetricsClient {
    pub fn new(lcd: LcdClient, profile: ChainProfile, config: MetricsConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .unwrap_or_default();
        Self {
            lcd,
            profile,
            config,
            http,
            denom_cache: Mutex::new(None),
        }
    }

    /// Fetch the current metrics snapshot.
    pub async fn fetch(&self) -> Result<ChainMetrics> {
        if let Some(url) = &self.config.cache_url {
            match self.fetch_cached(url).await {
                Ok(metrics) => return Ok(metrics),
                Err(e) => tracing::debug!("metrics cache unavailable, computing directly: {}", e),
            }
        }
        self.compute_direct().await
    }

    async fn fetch_cached(&self, base_url: &str) -> Result<ChainMetrics> {
        let url = format!("{}/api.json", base_url.trim_end_matches('/'));
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| WalletError::NetworkError(format!("cache request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(WalletError::NetworkError(format!(
                "cache returned status {}",
                resp.status()
            )));
        }

        resp.json()
            .await
            .map_err(|e| WalletError::NetworkError(format!("bad cache payload: {}", e)))
    }

    /// Recompute the snapshot from LCD queries.
    async fn compute_direct(&self) -> Result<ChainMetrics> {
        let (base_denom, decimals) = self.detect_denom().await;

        let supply_raw = self.supply_raw(&base_denom).await?;
        let (bonded, not_bonded) = self.lcd.staking_pool().await?;
        let staked_raw = bonded.saturating_add(not_bonded);
        let pool_atomics = self.community_pool_atomics(&base_denom).await?;

        Ok(assemble_metrics(
            supply_raw,
            staked_raw,
            pool_atomics,
            decimals,
            self.config.out_max_frac,
        ))
    }

    /// Base supply in atomics, preferring the by_denom query and falling
    /// back to a full-supply scan.
    async fn supply_raw(&self, base_denom: &str) -> Result<u128> {
        match self.lcd.supply_by_denom(base_denom).await {
            Ok(amount) if amount > 0 => Ok(amount),
            _ => {
                let supply = self.lcd.total_supply().await?;
                Ok(supply
                    .iter()
                    .find(|c| is_base_like(&c.denom, base_denom, &self.profile.display_denom))
                    .map(|c| c.amount)
                    .unwrap_or(0))
            }
        }
    }

    /// Community pool total in atomics (sdk.Dec entries truncated).
    async fn community_pool_atomics(&self, base_denom: &str) -> Result<i128> {
        let coins = self.lcd.community_pool().await?;
        Ok(coins
            .iter()
            .filter(|(denom, _)| is_base_like(denom, base_denom, &self.profile.display_denom))
            .map(|(_, amount)| parse_dec(amount, 0))
            .fold(0i128, i128::saturating_add))
    }

    /// Detect the base denom and display exponent, caching the result.
    ///
    /// Every probe is best-effort: the profile's configured values are the
    /// fallback at each step.
    async fn detect_denom(&self) -> (String, u32) {
        {
            let cache = self.denom_cache.lock().unwrap();
            if let Some(c) = cache.as_ref() {
                if c.fetched_at.elapsed() < self.config.denom_ttl {
                    return (c.base_denom.clone(), c.decimals);
                }
            }
        }

        let mut base = self.profile.base_denom.clone();
        let mut decimals = self.profile.decimals;

        if let Ok(Some(bond)) = self.lcd.bond_denom().await {
            base = bond;
        }
        if let Ok(Some(mint)) = self.lcd.mint_denom().await {
            base = mint;
        }
        if let Ok(Some(exponent)) = self
            .lcd
            .denom_exponent(&base, &self.profile.display_denom)
            .await
        {
            decimals = exponent;
        }

        let mut cache = self.denom_cache.lock().unwrap();
        *cache = Some(DenomCache {
            fetched_at: Instant::now(),
            base_denom: base.clone(),
            decimals,
        });
        (base, decimals)
    }
}

/// Format raw chain figures into the published metrics shape.
pub fn assemble_metrics(
    supply_raw: u128,
    staked_raw: u128,
    pool_atomics: i128,
    decimals: u32,
    max_frac: u32,
) -> ChainMetrics {
    let supply = clamp_i128(supply_raw);
    let staked = clamp_i128(staked_raw);
    ChainMetrics {
        circulating_supply: format_units(supply, decimals, max_frac),
        circulating_supply_raw: supply_raw.to_string(),
        community_pool: format_units(pool_atomics, decimals, max_frac),
        total_staked: format_units(staked, decimals, max_frac),
    }
}

fn clamp_i128(v: u128) -> i128 {
    v.min(i128::MAX as u128) as i128
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assemble_metrics_formats_display_units() {
        // 21M tokens at 18 decimals, 5M staked, 120k in the pool.
        let metrics = assemble_metrics(
            21_000_000_000_000_000_000_000_000u128,
            5_000_000_000_000_000_000_000_000u128,
            120_000_000_000_000_000_000_000i128,
            18,
            18,
        );
        assert_eq!(metrics.circulating_supply, "21000000");
        assert_eq!(metrics.circulating_supply_raw, "21000000000000000000000000");
        assert_eq!(metrics.total_staked, "5000000");
        assert_eq!(metrics.community_pool, "120000");
    }

    #[test]
    fn test_assemble_metrics_fractional_pool() {
        let metrics = assemble_metrics(0, 0, 1_500_000i128, 6, 2);
        assert_eq!(metrics.community_pool, "1.5");
        assert_eq!(metrics.circulating_supply, "0");
    }

    #[test]
    fn test_cached_payload_shape_roundtrips() {
        let json = r#"{
            "circulating_supply": "21000000",
            "circulating_supply_raw": "21000000000000000000000000",
            "community_pool": "120000.5",
            "total_staked": "5000000"
        }"#;
        let metrics: ChainMetrics = serde_json::from_str(json).unwrap();
        assert_eq!(metrics.community_pool, "120000.5");
    }
}
