//! Chain-facing collaborators: query/broadcast endpoint client, market
//! data, and cached supply metrics.
//!
//! The pipeline and builder talk to the chain exclusively through the
//! [`ChainApi`] trait; [`LcdClient`] is the production implementation over
//! the chain's public LCD REST contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use helix_types::{Coin, Result};

pub mod lcd;
pub mod market;
pub mod metrics;

pub use lcd::LcdClient;
pub use market::{MarketClient, MarketConfig, MarketQuote};
pub use metrics::{ChainMetrics, MetricsClient, MetricsConfig};

/// On-chain account state needed for signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account_number: u64,
    pub sequence: u64,
}

/// Outcome of handing a signed transaction to the broadcast endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastResult {
    pub code: u32,
    pub tx_hash: String,
    pub raw_log: String,
}

/// ABCI code the SDK uses for an out-of-date account sequence.
const SEQUENCE_MISMATCH_CODE: u32 = 32;

impl BroadcastResult {
    pub fn accepted(&self) -> bool {
        self.code == 0
    }

    /// Whether the rejection is a stale-sequence rejection, which the
    /// pipeline may retry once with a refreshed sequence.
    pub fn is_sequence_mismatch(&self) -> bool {
        !self.accepted()
            && (self.code == SEQUENCE_MISMATCH_CODE
                || self.raw_log.contains("account sequence mismatch"))
    }
}

/// A transaction found by hash query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxResult {
    pub code: u32,
    pub raw_log: String,
    pub height: u64,
    /// IBC packet sequence from the send_packet event, when present.
    pub packet_sequence: Option<u64>,
}

impl TxResult {
    pub fn succeeded(&self) -> bool {
        self.code == 0
    }
}

/// A bonded validator, as shown in staking views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidatorInfo {
    pub operator_address: String,
    pub moniker: String,
    pub tokens: u128,
    pub jailed: bool,
    pub commission_rate: String,
}

/// A governance proposal, as shown in voting views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalInfo {
    pub id: u64,
    pub title: String,
    pub status: String,
    pub voting_end_time: String,
}

/// The narrow chain surface the builder and pipeline depend on.
#[async_trait]
pub trait ChainApi: Send + Sync {
    /// Account number and current sequence for an address.
    async fn account_info(&self, address: &str) -> Result<AccountInfo>;

    /// Spendable balances for an address.
    async fn balances(&self, address: &str) -> Result<Vec<Coin>>;

    /// Simulate an unsigned transaction; returns gas used.
    async fn simulate(&self, tx_bytes: &[u8]) -> Result<u64>;

    /// Broadcast signed transaction bytes (sync mode).
    async fn broadcast_tx(&self, tx_bytes: &[u8]) -> Result<BroadcastResult>;

    /// Look up a transaction by hash. `None` until it is included.
    async fn tx_by_hash(&self, hash: &str) -> Result<Option<TxResult>>;

    /// Whether the acknowledgment for an IBC packet has been written.
    async fn ibc_ack_received(&self, channel: &str, sequence: u64) -> Result<bool>;

    /// Bonded validator set.
    async fn validators(&self) -> Result<Vec<ValidatorInfo>>;

    /// Governance proposals.
    async fn proposals(&self) -> Result<Vec<ProposalInfo>>;
}
