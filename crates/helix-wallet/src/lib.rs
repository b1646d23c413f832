//! Wallet adapters over browser-injected providers.
//!
//! One underlying key, two injected-provider flavors: an EVM-style provider
//! that speaks 0x-hex addresses and a Cosmos-style provider that speaks
//! Bech32. Both are wrapped behind the same [`WalletAdapter`] surface and
//! produce the same [`Account`] shape, with the missing address form derived
//! through `helix-codec` so the two encodings always share one key hash.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use helix_types::{Coin, Result, WalletError};

pub mod adapter;
pub mod provider;
pub mod session;

pub use adapter::{CosmosAdapter, EvmAdapter, SignRequest, SignedTx, WalletAdapter};
pub use provider::{detect_provider, Provider, ProviderRegistry};
pub use session::{SharedSession, WalletSession};

/// Which injected-provider flavor an adapter wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdapterKind {
    Evm,
    Cosmos,
}

/// A connected account: one key hash, both address encodings, plus the
/// chain-side state needed to build and order transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Opaque fingerprint of the key hash, stable across address forms.
    pub chain_key_id: String,
    pub hex_address: String,
    pub bech32_address: String,
    pub account_number: u64,
    pub sequence: u64,
    pub balances: Vec<Coin>,
}

impl Account {
    /// Build an account from a provider-reported hex address.
    pub fn from_hex(addr: &str, prefix: &str) -> Result<Self> {
        let bytes = helix_codec::parse_hex(addr)?;
        Self::from_bytes(&bytes, prefix)
    }

    /// Build an account from a provider-reported Bech32 address.
    pub fn from_bech32(addr: &str) -> Result<Self> {
        let (prefix, bytes) = helix_codec::decode_bech32(addr)?;
        Self::from_bytes(&bytes, &prefix)
    }

    fn from_bytes(bytes: &[u8; helix_codec::ADDRESS_LEN], prefix: &str) -> Result<Self> {
        Ok(Self {
            chain_key_id: key_fingerprint(bytes),
            hex_address: helix_codec::checksum_hex(bytes),
            bech32_address: helix_codec::encode_bech32(bytes, prefix)?,
            account_number: 0,
            sequence: 0,
            balances: Vec::new(),
        })
    }

    /// Check the invariant that both address forms decode to the same
    /// 20-byte key hash.
    pub fn verify_link(&self) -> Result<()> {
        let hex_bytes = helix_codec::parse_hex(&self.hex_address)?;
        let (_, bech_bytes) = helix_codec::decode_bech32(&self.bech32_address)?;
        if hex_bytes != bech_bytes {
            return Err(WalletError::InvalidAddressFormat(format!(
                "address forms diverge: {} vs {}",
                self.hex_address, self.bech32_address
            )));
        }
        Ok(())
    }

    /// Spendable balance of a denom.
    pub fn balance_of(&self, denom: &str) -> u128 {
        helix_types::sum_denom(&self.balances, denom)
    }
}

/// Sha256 fingerprint of a key hash, hex-encoded.
fn key_fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}
