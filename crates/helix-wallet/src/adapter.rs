//! Uniform wallet surface over the two provider flavors.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::provider::Provider;
use crate::{Account, AdapterKind};
use helix_types::{ChainProfile, Result, WalletError};

/// Everything a provider needs to produce a signature over a transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignRequest {
    pub chain_id: String,
    pub account_number: u64,
    pub sequence: u64,
    /// Canonical sign doc (proto-JSON); serialized verbatim for the
    /// provider.
    pub sign_doc: serde_json::Value,
}

impl SignRequest {
    /// The exact bytes handed to the provider for signing.
    pub fn payload_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&self.sign_doc)
            .map_err(|e| WalletError::SigningError(format!("unserializable sign doc: {}", e)))
    }
}

/// A signed transaction ready for broadcast.
#[derive(Debug, Clone)]
pub struct SignedTx {
    pub tx_bytes: Vec<u8>,
}

/// Uniform capability set over heterogeneous wallet providers.
///
/// Every method may suspend on an extension prompt; callers must treat
/// each call as a suspension point.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    fn kind(&self) -> AdapterKind;

    /// Prompt the user to connect; resolves the connected accounts.
    async fn connect(&self) -> Result<Vec<Account>>;

    /// The currently active account. `NotConnected` before `connect`.
    fn active_account(&self) -> Result<Account>;

    /// Sign a transaction payload with the active account's key.
    async fn sign(&self, request: &SignRequest) -> Result<SignedTx>;

    /// Switch the provider to the target chain.
    async fn switch_network(&self, chain_id: &str) -> Result<()>;
}

/// Adapter over an EVM-style injected provider (hex-native addresses).
pub struct EvmAdapter {
    provider: Arc<dyn Provider>,
    profile: ChainProfile,
    connected: Mutex<Vec<Account>>,
}

impl EvmAdapter {
    pub fn new(provider: Arc<dyn Provider>, profile: ChainProfile) -> Self {
        Self {
            provider,
            profile,
            connected: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl WalletAdapter for EvmAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Evm
    }

    async fn connect(&self) -> Result<Vec<Account>> {
        let addresses = self.provider.request_accounts().await?;
        let mut accounts = Vec::with_capacity(addresses.len());
        for addr in &addresses {
            accounts.push(Account::from_hex(addr, &self.profile.bech32_prefix)?);
        }
        *self.connected.lock().unwrap() = accounts.clone();
        Ok(accounts)
    }

    fn active_account(&self) -> Result<Account> {
        self.connected
            .lock()
            .unwrap()
            .first()
            .cloned()
            .ok_or(WalletError::NotConnected)
    }

    async fn sign(&self, request: &SignRequest) -> Result<SignedTx> {
        let account = self.active_account()?;
        let payload = request.payload_bytes()?;
        let tx_bytes = self
            .provider
            .sign_payload(&account.hex_address, &payload)
            .await?;
        Ok(SignedTx { tx_bytes })
    }

    async fn switch_network(&self, chain_id: &str) -> Result<()> {
        // EVM providers address chains by 0x-hex id.
        let target = if chain_id.starts_with("0x") {
            chain_id.to_string()
        } else {
            self.profile.evm_chain_id_hex()
        };
        self.provider.switch_chain(&target).await
    }
}

/// Adapter over a Cosmos-style injected provider (Bech32-native addresses).
pub struct CosmosAdapter {
    provider: Arc<dyn Provider>,
    profile: ChainProfile,
    connected: Mutex<Vec<Account>>,
}

impl CosmosAdapter {
    pub fn new(provider: Arc<dyn Provider>, profile: ChainProfile) -> Self {
        Self {
            provider,
            profile,
            connected: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl WalletAdapter for CosmosAdapter {
    fn kind(&self) -> AdapterKind {
        AdapterKind::Cosmos
    }

    async fn connect(&self) -> Result<Vec<Account>> {
        let addresses = self.provider.request_accounts().await?;
        let mut accounts = Vec::with_capacity(addresses.len());
        for addr in &addresses {
            let account = Account::from_bech32(addr)?;
            // A Cosmos provider configured for another chain hands back a
            // foreign prefix; that is a connect-time error, not a codec one.
            if !addr.starts_with(&format!("{}1", self.profile.bech32_prefix)) {
                return Err(WalletError::UnsupportedNetwork(format!(
                    "account {} is not a {} address",
                    addr, self.profile.bech32_prefix
                )));
            }
            accounts.push(account);
        }
        *self.connected.lock().unwrap() = accounts.clone();
        Ok(accounts)
    }

    fn active_account(&self) -> Result<Account> {
        self.connected
            .lock()
            .unwrap()
            .first()
            .cloned()
            .ok_or(WalletError::NotConnected)
    }

    async fn sign(&self, request: &SignRequest) -> Result<SignedTx> {
        let account = self.active_account()?;
        let payload = request.payload_bytes()?;
        let tx_bytes = self
            .provider
            .sign_payload(&account.bech32_address, &payload)
            .await?;
        Ok(SignedTx { tx_bytes })
    }

    async fn switch_network(&self, chain_id: &str) -> Result<()> {
        self.provider.switch_chain(chain_id).await
    }
}
