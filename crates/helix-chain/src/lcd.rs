//! HTTP client for the chain's LCD REST endpoint.
//!
//! Endpoints:
//! - GET  /cosmos/auth/v1beta1/accounts/{address}
//! - GET  /cosmos/bank/v1beta1/balances/{address}
//! - POST /cosmos/tx/v1beta1/simulate
//! - POST /cosmos/tx/v1beta1/txs
//! - GET  /cosmos/tx/v1beta1/txs/{hash}
//! - GET  /ibc/core/channel/v1/channels/{channel}/ports/transfer/packet_acks/{sequence}
//! - GET  /cosmos/staking/v1beta1/validators
//! - GET  /cosmos/gov/v1beta1/proposals
//! plus the supply/pool/params queries used by the metrics snapshot.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

use helix_types::{Coin, Result, WalletError};

use crate::{AccountInfo, BroadcastResult, ChainApi, ProposalInfo, TxResult, ValidatorInfo};

/// LCD REST client.
pub struct LcdClient {
    base_url: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl LcdClient {
    pub fn new(base_url: &str, timeout_ms: Option<u64>) -> Self {
        let timeout_ms = timeout_ms.unwrap_or(12_000);
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_millis(timeout_ms))
                .build()
                .unwrap_or_default(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    async fn get_json(&self, path: &str) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| WalletError::NetworkError(format!("lcd request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(WalletError::NetworkError(format!(
                "lcd returned status {} for {}",
                resp.status(),
                path
            )));
        }

        resp.json()
            .await
            .map_err(|e| WalletError::NetworkError(format!("failed to parse lcd response: {}", e)))
    }

    async fn post_json(&self, path: &str, body: &Value) -> Result<Value> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| WalletError::NetworkError(format!("lcd request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(WalletError::Other(format!(
                "lcd returned status {} for {}",
                resp.status(),
                path
            )));
        }

        resp.json()
            .await
            .map_err(|e| WalletError::NetworkError(format!("failed to parse lcd response: {}", e)))
    }

    // --- metrics queries (not part of ChainApi) ---

    /// Total supply of one denom, in base atomics.
    pub async fn supply_by_denom(&self, denom: &str) -> Result<u128> {
        let v = self
            .get_json(&format!(
                "/cosmos/bank/v1beta1/supply/by_denom?denom={}",
                urlencode(denom)
            ))
            .await?;
        let amount = v
            .pointer("/amount/amount")
            .and_then(Value::as_str)
            .or_else(|| v.get("amount").and_then(Value::as_str))
            .unwrap_or("0");
        Ok(amount.parse().unwrap_or(0))
    }

    /// Full supply listing, for chains without the by_denom query.
    pub async fn total_supply(&self) -> Result<Vec<Coin>> {
        #[derive(Deserialize)]
        struct SupplyResponse {
            #[serde(default)]
            supply: Vec<Coin>,
        }
        let v = self
            .get_json("/cosmos/bank/v1beta1/supply?pagination.limit=100000")
            .await?;
        let parsed: SupplyResponse = serde_json::from_value(v)
            .map_err(|e| WalletError::NetworkError(format!("bad supply response: {}", e)))?;
        Ok(parsed.supply)
    }

    /// Community pool as (denom, sdk.Dec amount) pairs.
    pub async fn community_pool(&self) -> Result<Vec<(String, String)>> {
        let v = self
            .get_json("/cosmos/distribution/v1beta1/community_pool")
            .await?;
        let coins = v
            .get("community_pool")
            .or_else(|| v.get("pool"))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(coins
            .iter()
            .filter_map(|c| {
                let denom = c.get("denom")?.as_str()?.to_string();
                let amount = c.get("amount")?.as_str()?.to_string();
                Some((denom, amount))
            })
            .collect())
    }

    /// Bonded plus not-bonded staking pool tokens, in base atomics.
    pub async fn staking_pool(&self) -> Result<(u128, u128)> {
        let v = self.get_json("/cosmos/staking/v1beta1/pool").await?;
        let bonded = v
            .pointer("/pool/bonded_tokens")
            .and_then(Value::as_str)
            .unwrap_or("0")
            .parse()
            .unwrap_or(0);
        let not_bonded = v
            .pointer("/pool/not_bonded_tokens")
            .and_then(Value::as_str)
            .unwrap_or("0")
            .parse()
            .unwrap_or(0);
        Ok((bonded, not_bonded))
    }

    /// Bond denom from staking params, if reported.
    pub async fn bond_denom(&self) -> Result<Option<String>> {
        let v = self.get_json("/cosmos/staking/v1beta1/params").await?;
        Ok(v.pointer("/params/bond_denom")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Mint denom from mint params, if reported.
    pub async fn mint_denom(&self) -> Result<Option<String>> {
        let v = self.get_json("/cosmos/mint/v1beta1/params").await?;
        Ok(v.pointer("/params/mint_denom")
            .and_then(Value::as_str)
            .map(str::to_string))
    }

    /// Display exponent for the base denom from bank metadata, paging
    /// through denoms_metadata until a match is found.
    pub async fn denom_exponent(&self, base_denom: &str, display_denom: &str) -> Result<Option<u32>> {
        let mut next_key = String::new();
        for _ in 0..30 {
            let mut path =
                "/cosmos/bank/v1beta1/denoms_metadata?pagination.limit=200".to_string();
            if !next_key.is_empty() {
                path.push_str(&format!("&pagination.key={}", urlencode(&next_key)));
            }
            let v = self.get_json(&path).await?;
            let metas = v.get("metadatas").and_then(Value::as_array).cloned().unwrap_or_default();

            let base_lc = base_denom.trim().to_lowercase();
            let disp_lc = display_denom.trim().to_lowercase();
            let found = metas.iter().find(|m| {
                m.get("base").and_then(Value::as_str).map(|s| s.trim().to_lowercase())
                    == Some(base_lc.clone())
                    || m.get("display").and_then(Value::as_str).map(|s| s.trim().to_lowercase())
                        == Some(disp_lc.clone())
            });

            if let Some(meta) = found {
                let display = meta
                    .get("display")
                    .and_then(Value::as_str)
                    .unwrap_or(display_denom)
                    .trim()
                    .to_lowercase();
                let exponent = meta
                    .get("denom_units")
                    .and_then(Value::as_array)
                    .and_then(|units| {
                        units.iter().find(|u| {
                            u.get("denom").and_then(Value::as_str).map(|s| s.trim().to_lowercase())
                                == Some(display.clone())
                        })
                    })
                    .and_then(|u| u.get("exponent"))
                    .and_then(Value::as_u64)
                    .map(|e| e as u32);
                return Ok(exponent);
            }

            next_key = v
                .pointer("/pagination/next_key")
                .and_then(Value::as_str)
                .unwrap_or("")
                .to_string();
            if next_key.is_empty() {
                break;
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl ChainApi for LcdClient {
    async fn account_info(&self, address: &str) -> Result<AccountInfo> {
        let v = self
            .get_json(&format!("/cosmos/auth/v1beta1/accounts/{}", address))
            .await?;
        parse_account_info(&v)
    }

    async fn balances(&self, address: &str) -> Result<Vec<Coin>> {
        #[derive(Deserialize)]
        struct BalancesResponse {
            #[serde(default)]
            balances: Vec<Coin>,
        }
        let v = self
            .get_json(&format!("/cosmos/bank/v1beta1/balances/{}", address))
            .await?;
        let parsed: BalancesResponse = serde_json::from_value(v)
            .map_err(|e| WalletError::NetworkError(format!("bad balances response: {}", e)))?;
        Ok(parsed.balances)
    }

    async fn simulate(&self, tx_bytes: &[u8]) -> Result<u64> {
        let body = serde_json::json!({ "tx_bytes": BASE64.encode(tx_bytes) });
        let v = self.post_json("/cosmos/tx/v1beta1/simulate", &body).await?;
        v.pointer("/gas_info/gas_used")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| WalletError::Other("simulate response missing gas_used".to_string()))
    }

    async fn broadcast_tx(&self, tx_bytes: &[u8]) -> Result<BroadcastResult> {
        let body = serde_json::json!({
            "tx_bytes": BASE64.encode(tx_bytes),
            "mode": "BROADCAST_MODE_SYNC",
        });
        let v = self.post_json("/cosmos/tx/v1beta1/txs", &body).await?;
        let resp = v
            .get("tx_response")
            .ok_or_else(|| WalletError::Other("broadcast response missing tx_response".to_string()))?;
        Ok(BroadcastResult {
            code: resp.get("code").and_then(Value::as_u64).unwrap_or(0) as u32,
            tx_hash: resp
                .get("txhash")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            raw_log: resp
                .get("raw_log")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        })
    }

    async fn tx_by_hash(&self, hash: &str) -> Result<Option<TxResult>> {
        let url = format!("{}/cosmos/tx/v1beta1/txs/{}", self.base_url, hash);
        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| WalletError::NetworkError(format!("lcd request failed: {}", e)))?;

        // Not found means not yet included, not an error.
        if resp.status().as_u16() == 404 {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(WalletError::NetworkError(format!(
                "lcd returned status {} for tx query",
                resp.status()
            )));
        }

        let v: Value = resp
            .json()
            .await
            .map_err(|e| WalletError::NetworkError(format!("failed to parse lcd response: {}", e)))?;
        Ok(Some(parse_tx_result(&v)?))
    }

    async fn ibc_ack_received(&self, channel: &str, sequence: u64) -> Result<bool> {
        let url = format!(
            "{}/ibc/core/channel/v1/channels/{}/ports/transfer/packet_acks/{}",
            self.base_url, channel, sequence
        );
        let resp = self
            .client
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| WalletError::NetworkError(format!("lcd request failed: {}", e)))?;

        match resp.status().as_u16() {
            200 => Ok(true),
            404 => Ok(false),
            status => Err(WalletError::NetworkError(format!(
                "lcd returned status {} for packet ack query",
                status
            ))),
        }
    }

    async fn validators(&self) -> Result<Vec<ValidatorInfo>> {
        let v = self
            .get_json(
                "/cosmos/staking/v1beta1/validators?status=BOND_STATUS_BONDED&pagination.limit=500",
            )
            .await?;
        let raw = v.get("validators").and_then(Value::as_array).cloned().unwrap_or_default();
        Ok(raw
            .iter()
            .filter_map(|val| {
                Some(ValidatorInfo {
                    operator_address: val.get("operator_address")?.as_str()?.to_string(),
                    moniker: val
                        .pointer("/description/moniker")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string(),
                    tokens: val
                        .get("tokens")
                        .and_then(Value::as_str)
                        .and_then(|s| s.parse().ok())
                        .unwrap_or(0),
                    jailed: val.get("jailed").and_then(Value::as_bool).unwrap_or(false),
                    commission_rate: val
                        .pointer("/commission/commission_rates/rate")
                        .and_then(Value::as_str)
                        .unwrap_or("0")
                        .to_string(),
                })
            })
            .collect())
    }

    async fn proposals(&self) -> Result<Vec<ProposalInfo>> {
        let v = self
            .get_json("/cosmos/gov/v1beta1/proposals?pagination.limit=200&pagination.reverse=true")
            .await?;
        let raw = v.get("proposals").and_then(Value::as_array).cloned().unwrap_or_default();
        Ok(raw
            .iter()
            .filter_map(|p| {
                Some(ProposalInfo {
                    id: p
                        .get("proposal_id")
                        .and_then(Value::as_str)
                        .and_then(|s| s.parse().ok())?,
                    title: p
                        .pointer("/content/title")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string(),
                    status: p.get("status").and_then(Value::as_str).unwrap_or("").to_string(),
                    voting_end_time: p
                        .get("voting_end_time")
                        .and_then(Value::as_str)
                        .unwrap_or("")
                        .to_string(),
                })
            })
            .collect())
    }
}

/// Parse account number and sequence out of an auth query response.
///
/// EVM-enabled chains wrap the base account in an EthAccount envelope, so
/// look through `base_account` before reading fields directly.
pub fn parse_account_info(v: &Value) -> Result<AccountInfo> {
    let account = v.get("account").unwrap_or(v);
    let base = account.get("base_account").unwrap_or(account);

    let account_number = base
        .get("account_number")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| WalletError::NetworkError("account response missing account_number".to_string()))?;
    let sequence = base
        .get("sequence")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);

    Ok(AccountInfo { account_number, sequence })
}

/// Parse a tx-by-hash response body.
pub fn parse_tx_result(v: &Value) -> Result<TxResult> {
    let resp = v
        .get("tx_response")
        .ok_or_else(|| WalletError::NetworkError("tx query missing tx_response".to_string()))?;

    Ok(TxResult {
        code: resp.get("code").and_then(Value::as_u64).unwrap_or(0) as u32,
        raw_log: resp
            .get("raw_log")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        height: resp
            .get("height")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or(0),
        packet_sequence: extract_packet_sequence(resp),
    })
}

/// Pull the IBC packet sequence out of a tx_response's events, if the
/// transaction emitted a send_packet event.
pub fn extract_packet_sequence(tx_response: &Value) -> Option<u64> {
    let events = tx_response.get("events").and_then(Value::as_array)?;
    for event in events {
        if event.get("type").and_then(Value::as_str) != Some("send_packet") {
            continue;
        }
        let attrs = event.get("attributes").and_then(Value::as_array)?;
        for attr in attrs {
            if attr.get("key").and_then(Value::as_str) == Some("packet_sequence") {
                return attr
                    .get("value")
                    .and_then(Value::as_str)
                    .and_then(|s| s.parse().ok());
            }
        }
    }
    None
}

fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_account_info_base_account() {
        let v = serde_json::json!({
            "account": {
                "@type": "/cosmos.auth.v1beta1.BaseAccount",
                "address": "helix1abc",
                "account_number": "42",
                "sequence": "7"
            }
        });
        let info = parse_account_info(&v).unwrap();
        assert_eq!(info, AccountInfo { account_number: 42, sequence: 7 });
    }

    #[test]
    fn test_parse_account_info_eth_account_wrapper() {
        let v = serde_json::json!({
            "account": {
                "@type": "/ethermint.types.v1.EthAccount",
                "base_account": {
                    "address": "helix1abc",
                    "account_number": "13",
                    "sequence": "0"
                },
                "code_hash": "0x"
            }
        });
        let info = parse_account_info(&v).unwrap();
        assert_eq!(info, AccountInfo { account_number: 13, sequence: 0 });
    }

    #[test]
    fn test_parse_account_info_missing_fields() {
        let v = serde_json::json!({ "account": {} });
        assert!(parse_account_info(&v).is_err());
    }

    #[test]
    fn test_parse_tx_result_with_packet_sequence() {
        let v = serde_json::json!({
            "tx_response": {
                "code": 0,
                "height": "10233",
                "raw_log": "",
                "events": [
                    { "type": "message", "attributes": [] },
                    {
                        "type": "send_packet",
                        "attributes": [
                            { "key": "packet_src_channel", "value": "channel-0" },
                            { "key": "packet_sequence", "value": "118" }
                        ]
                    }
                ]
            }
        });
        let result = parse_tx_result(&v).unwrap();
        assert!(result.succeeded());
        assert_eq!(result.height, 10233);
        assert_eq!(result.packet_sequence, Some(118));
    }

    #[test]
    fn test_parse_tx_result_failure_keeps_log() {
        let v = serde_json::json!({
            "tx_response": {
                "code": 5,
                "height": "99",
                "raw_log": "out of gas in location: WriteFlat",
                "events": []
            }
        });
        let result = parse_tx_result(&v).unwrap();
        assert!(!result.succeeded());
        assert_eq!(result.raw_log, "out of gas in location: WriteFlat");
        assert_eq!(result.packet_sequence, None);
    }

    #[test]
    fn test_urlencode() {
        assert_eq!(urlencode("ahlx"), "ahlx");
        assert_eq!(urlencode("ibc/27394F"), "ibc%2F27394F");
    }
}
