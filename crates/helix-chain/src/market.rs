//! Best-effort market data lookup.
//!
//! Price display is decoration: every failure degrades to `None` and the
//! caller renders a placeholder instead.

use serde_json::Value;
use std::time::Duration;

/// Market endpoint configuration.
#[derive(Debug, Clone)]
pub struct MarketConfig {
    pub base_url: String,
    /// Asset identifier on the market endpoint.
    pub asset_id: String,
    pub vs_currency: String,
    pub request_timeout_ms: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.coingecko.com/api/v3".to_string(),
            asset_id: "helix".to_string(),
            vs_currency: "usd".to_string(),
            request_timeout_ms: 8_000,
        }
    }
}

/// A spot quote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketQuote {
    pub price: f64,
    pub market_cap: Option<f64>,
}

/// Market data client.
pub struct MarketClient {
    config: MarketConfig,
    client: reqwest::Client,
}

impl MarketClient {
    pub fn new(config: MarketConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .unwrap_or_default();
        Self { config, client }
    }

    /// Fetch the current spot quote, or `None` when anything goes wrong.
    pub async fn spot(&self) -> Option<MarketQuote> {
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies={}&include_market_cap=true",
            self.config.base_url.trim_end_matches('/'),
            self.config.asset_id,
            self.config.vs_currency,
        );

        let resp = match self.client.get(&url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                tracing::debug!(status = %r.status(), "market endpoint unavailable");
                return None;
            }
            Err(e) => {
                tracing::debug!("market request failed: {}", e);
                return None;
            }
        };

        let body: Value = resp.json().await.ok()?;
        let entry = body.get(&self.config.asset_id)?;
        let price = entry.get(&self.config.vs_currency)?.as_f64()?;
        let market_cap = entry
            .get(format!("{}_market_cap", self.config.vs_currency))
            .and_then(Value::as_f64);

        Some(MarketQuote { price, market_cap })
    }
}
