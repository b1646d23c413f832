//! Explicit per-tab wallet session state.
//!
//! There is no ambient "current wallet": callers hold a session value and
//! pass it to every pipeline call. Lifecycle is the runtime of one host
//! environment; nothing here persists.

use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::adapter::WalletAdapter;
use crate::{Account, AdapterKind};
use helix_types::{Result, WalletError};

/// Accounts connected through one adapter, with an active selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletSession {
    pub adapter_kind: AdapterKind,
    pub accounts: Vec<Account>,
    pub active_account_index: usize,
}

/// Session handle shared across concurrently running pipeline steps.
pub type SharedSession = Arc<RwLock<WalletSession>>;

impl WalletSession {
    /// Connect through an adapter and capture the resulting accounts.
    pub async fn connect(adapter: &dyn WalletAdapter) -> Result<Self> {
        let accounts = adapter.connect().await?;
        if accounts.is_empty() {
            return Err(WalletError::NotConnected);
        }
        Ok(Self {
            adapter_kind: adapter.kind(),
            accounts,
            active_account_index: 0,
        })
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(RwLock::new(self))
    }

    pub fn active(&self) -> Result<&Account> {
        self.accounts
            .get(self.active_account_index)
            .ok_or(WalletError::NotConnected)
    }

    pub fn active_mut(&mut self) -> Result<&mut Account> {
        self.accounts
            .get_mut(self.active_account_index)
            .ok_or(WalletError::NotConnected)
    }

    pub fn set_active(&mut self, index: usize) -> Result<()> {
        if index >= self.accounts.len() {
            return Err(WalletError::invalid_param(
                "account_index",
                format!("{} out of range ({} connected)", index, self.accounts.len()),
            ));
        }
        self.active_account_index = index;
        Ok(())
    }

    /// Find a connected account by its Bech32 address.
    pub fn account_mut(&mut self, bech32_address: &str) -> Option<&mut Account> {
        self.accounts
            .iter_mut()
            .find(|a| a.bech32_address == bech32_address)
    }

    /// Drop all connected accounts. The session is unusable afterwards.
    pub fn disconnect(&mut self) {
        self.accounts.clear();
        self.active_account_index = 0;
    }
}
