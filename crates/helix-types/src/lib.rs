use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod dec;
pub mod profile;

pub use profile::ChainProfile;

/// Wallet SDK error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    #[error("invalid address format: {0}")]
    InvalidAddressFormat(String),

    #[error("no injected wallet provider found")]
    ProviderNotFound,

    #[error("wallet not connected")]
    NotConnected,

    #[error("request rejected by user")]
    UserRejected,

    #[error("signing failed: {0}")]
    SigningError(String),

    #[error("unsupported network: {0}")]
    UnsupportedNetwork(String),

    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParameters { field: String, reason: String },

    #[error("broadcast rejected: {0}")]
    BroadcastRejected(String),

    #[error("transaction failed on chain (code {code}): {log}")]
    OnChainError { code: u32, log: String },

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("timed out waiting for confirmation")]
    TimedOut,

    #[error("{0}")]
    Other(String),
}

impl WalletError {
    /// Shorthand for a parameter validation failure.
    pub fn invalid_param(field: &str, reason: impl Into<String>) -> Self {
        WalletError::InvalidParameters {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WalletError>;

/// A coin amount in base atomics. LCD responses carry amounts as decimal
/// strings, so the wire form is a string either way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub denom: String,
    #[serde(with = "amount_string")]
    pub amount: u128,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: u128) -> Self {
        Self { denom: denom.into(), amount }
    }
}

mod amount_string {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(amount: &u128, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&amount.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u128, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Find a denom in a balance list.
pub fn find_coin<'a>(coins: &'a [Coin], denom: &str) -> Option<&'a Coin> {
    coins.iter().find(|c| c.denom == denom)
}

/// Sum all entries of a denom in a balance list.
pub fn sum_denom(coins: &[Coin], denom: &str) -> u128 {
    coins
        .iter()
        .filter(|c| c.denom == denom)
        .fold(0u128, |acc, c| acc.saturating_add(c.amount))
}

/// Whether a denom names the chain's base token. Chains report the base
/// token under several spellings (bond denom, display symbol, or a
/// unit-prefixed display symbol), so match all of them, case-insensitively.
pub fn is_base_like(denom: &str, base_denom: &str, display_denom: &str) -> bool {
    let dn = denom.trim().to_lowercase();
    if dn.is_empty() {
        return false;
    }
    let bd = base_denom.trim().to_lowercase();
    let disp = display_denom.trim().to_lowercase();
    dn == bd || dn == disp || dn == format!("u{}", disp) || dn == format!("a{}", disp)
}

/// Milliseconds since the Unix epoch.
pub fn unix_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Nanoseconds since the Unix epoch, as used by IBC timeout timestamps.
pub fn unix_nanos() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}
