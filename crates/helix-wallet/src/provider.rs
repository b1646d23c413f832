//! The narrow surface of a browser-injected wallet extension.
//!
//! Providers are duck-typed globals in the source environment; here they
//! are an explicit trait, with one registration per [`AdapterKind`] and a
//! single capability-detection call at startup. Every method may suspend
//! on an extension UI prompt.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::AdapterKind;
use helix_types::{Result, WalletError};

/// Injected wallet provider. Addresses cross this boundary in the
/// provider's native form: 0x-hex for EVM providers, Bech32 for Cosmos
/// providers.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Whether the extension is actually usable right now.
    fn is_available(&self) -> bool {
        true
    }

    /// Prompt the user to connect; returns native-form addresses.
    async fn request_accounts(&self) -> Result<Vec<String>>;

    /// Prompt the user to sign `payload` with the key behind `address`;
    /// returns the encoded signed transaction bytes.
    async fn sign_payload(&self, address: &str, payload: &[u8]) -> Result<Vec<u8>>;

    /// Ask the provider to switch (or add) the target chain.
    async fn switch_chain(&self, chain_id: &str) -> Result<()>;
}

/// The set of providers found in the host environment, keyed by kind.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<AdapterKind, Arc<dyn Provider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: AdapterKind, provider: Arc<dyn Provider>) {
        self.providers.insert(kind, provider);
    }

    pub fn get(&self, kind: AdapterKind) -> Option<Arc<dyn Provider>> {
        self.providers.get(&kind).cloned()
    }
}

/// Capability detection: resolve the injected provider for a kind, or fail
/// with `ProviderNotFound` when the extension is absent or unusable.
pub fn detect_provider(kind: AdapterKind, registry: &ProviderRegistry) -> Result<Arc<dyn Provider>> {
    match registry.get(kind) {
        Some(p) if p.is_available() => Ok(p),
        _ => Err(WalletError::ProviderNotFound),
    }
}
