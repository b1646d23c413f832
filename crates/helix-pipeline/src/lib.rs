//! Submission pipeline: the lifecycle of a transaction from accepted
//! builder output to a terminal status.
//!
//! State machine per transaction:
//! `Building -> Signing -> Broadcasting -> InFlight -> {Confirmed, Failed}`,
//! with IBC transfers inserting `InFlight -> AwaitingRelay -> {Confirmed,
//! TimedOut}`. Every wallet and chain call is a suspension point; many
//! transactions may be in flight at once, but broadcasts for a single
//! account are serialized behind a per-account lock so sequence numbers
//! never collide.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::{sleep, Instant};

use helix_builder::{IbcTransferIntent, MsgKind, UnsignedTx};
use helix_chain::{BroadcastResult, ChainApi, TxResult};
use helix_types::{unix_millis, ChainProfile, Result, WalletError};
use helix_wallet::{Account, SharedSession, SignRequest, SignedTx, WalletAdapter};

/// Lifecycle states of a pending transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TxStatus {
    Building,
    Signing,
    Broadcasting,
    InFlight,
    AwaitingRelay,
    Confirmed,
    Failed,
    TimedOut,
}

impl TxStatus {
    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TxStatus::Confirmed | TxStatus::Failed | TxStatus::TimedOut)
    }
}

/// A transaction owned by the pipeline. Mutated only through pipeline
/// transitions; discarded via [`SubmitPipeline::ack`] once terminal.
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    pub id: String,
    pub kind: MsgKind,
    /// Sender's Bech32 address; broadcasts are serialized per sender.
    pub sender: String,
    pub status: TxStatus,
    pub failure: Option<WalletError>,
    pub tx_hash: Option<String>,
    pub created_at: u64,
    pub last_polled_at: Option<u64>,
}

/// Retry, polling, and timeout policy.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Delay between inclusion polls.
    pub poll_interval_ms: u64,
    /// How long an accepted broadcast may stay unobserved before the
    /// transaction is treated as lost.
    pub confirm_max_wait_ms: u64,
    /// Consecutive network failures tolerated while polling.
    pub poll_max_attempts: u32,
    /// First backoff delay after a network failure; doubles per failure.
    pub backoff_start_ms: u64,
    pub backoff_max_ms: u64,
    /// Delay between destination-acknowledgment polls.
    pub relay_poll_interval_ms: u64,
    /// Maximum relay wait before an IBC transfer is marked TimedOut.
    pub relay_max_wait_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5_000,
            confirm_max_wait_ms: 60_000,
            poll_max_attempts: 5,
            backoff_start_ms: 800,
            backoff_max_ms: 10_000,
            relay_poll_interval_ms: 5_000,
            relay_max_wait_ms: 120_000,
        }
    }
}

/// Status-change notifications for the UI boundary.
#[derive(Debug, Clone)]
pub enum PipelineEvent {
    Status { id: String, status: TxStatus },
    Confirmed { id: String, tx_hash: String },
    Failed { id: String, error: WalletError },
    /// The relay wait ended without an acknowledgment. Outcome is
    /// uncertain, not failed: funds may still arrive.
    RelayTimedOut { id: String, tx_hash: Option<String> },
}

/// Callback type for pipeline events.
pub type PipelineEventHandler = Box<dyn Fn(PipelineEvent) + Send + Sync>;

/// Per-transaction watcher callback.
pub type StatusHandler = Box<dyn Fn(&PendingTransaction) + Send + Sync>;

/// The submission pipeline. One instance per chain profile; safe to share
/// across concurrently submitting tasks.
pub struct SubmitPipeline {
    chain: Arc<dyn ChainApi>,
    profile: ChainProfile,
    config: PipelineConfig,
    txs: Mutex<HashMap<String, PendingTransaction>>,
    cancel_flags: Mutex<HashMap<String, Arc<AtomicBool>>>,
    account_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    watchers: Mutex<HashMap<String, Vec<StatusHandler>>>,
    on_event: Option<PipelineEventHandler>,
}

impl SubmitPipeline {
    pub fn new(
        chain: Arc<dyn ChainApi>,
        profile: ChainProfile,
        config: PipelineConfig,
        on_event: Option<PipelineEventHandler>,
    ) -> Self {
        Self {
            chain,
            profile,
            config,
            txs: Mutex::new(HashMap::new()),
            cancel_flags: Mutex::new(HashMap::new()),
            account_locks: Mutex::new(HashMap::new()),
            watchers: Mutex::new(HashMap::new()),
            on_event,
        }
    }

    /// Start tracking builder output in `Building`. Idempotent; `submit`
    /// calls it implicitly.
    pub fn track(&self, unsigned: &UnsignedTx) -> PendingTransaction {
        if let Some(existing) = self.status(&unsigned.id) {
            return existing;
        }
        let tx = PendingTransaction {
            id: unsigned.id.clone(),
            kind: unsigned.kind,
            sender: unsigned.sender.clone(),
            status: TxStatus::Building,
            failure: None,
            tx_hash: None,
            created_at: unix_millis(),
            last_polled_at: None,
        };
        self.cancel_flags
            .lock()
            .unwrap()
            .insert(tx.id.clone(), Arc::new(AtomicBool::new(false)));
        self.store_and_notify(&tx);
        self.emit(PipelineEvent::Status { id: tx.id.clone(), status: TxStatus::Building });
        tx
    }

    /// Register a watcher for one transaction's status changes.
    pub fn subscribe(&self, id: &str, handler: StatusHandler) {
        self.watchers
            .lock()
            .unwrap()
            .entry(id.to_string())
            .or_default()
            .push(handler);
    }

    /// Snapshot of one tracked transaction.
    pub fn status(&self, id: &str) -> Option<PendingTransaction> {
        self.txs.lock().unwrap().get(id).cloned()
    }

    /// Snapshots of every tracked transaction, oldest first.
    pub fn pending(&self) -> Vec<PendingTransaction> {
        let mut all: Vec<_> = self.txs.lock().unwrap().values().cloned().collect();
        all.sort_by_key(|t| t.created_at);
        all
    }

    /// Request cancellation. Honored only in `Building` (discard before
    /// signing) and `AwaitingRelay` (stop waiting; resolves TimedOut).
    /// Other states are owned by the wallet or the chain and return false.
    pub fn cancel(&self, id: &str) -> bool {
        let cancellable = self
            .txs
            .lock()
            .unwrap()
            .get(id)
            .map(|t| matches!(t.status, TxStatus::Building | TxStatus::AwaitingRelay))
            .unwrap_or(false);
        if !cancellable {
            return false;
        }
        match self.cancel_flags.lock().unwrap().get(id) {
            Some(flag) => {
                flag.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }

    /// Acknowledge and discard a terminal transaction. Returns `None`
    /// (and keeps the entry) while the transaction is still live.
    pub fn ack(&self, id: &str) -> Option<PendingTransaction> {
        let removed = {
            let mut txs = self.txs.lock().unwrap();
            match txs.get(id) {
                Some(tx) if tx.status.is_terminal() => txs.remove(id),
                _ => None,
            }
        };
        if removed.is_some() {
            self.cancel_flags.lock().unwrap().remove(id);
            self.watchers.lock().unwrap().remove(id);
        }
        removed
    }

    /// Drive one accepted transaction to a terminal status.
    ///
    /// Returns the terminal snapshot; an `Err` is produced only when the
    /// transaction was cancelled before signing started (nothing was sent
    /// anywhere, the entry is discarded).
    pub async fn submit(
        &self,
        session: &SharedSession,
        adapter: &dyn WalletAdapter,
        unsigned: UnsignedTx,
    ) -> Result<PendingTransaction> {
        let mut tx = self.track(&unsigned);

        // Last moment the user can abandon the transaction silently.
        if self.cancel_requested(&tx.id) {
            self.discard(&tx.id);
            return Err(WalletError::UserRejected);
        }

        // Sequence and account number must match chain state at broadcast
        // time, so refresh the cached account before signing.
        let info = match self.chain.account_info(&tx.sender).await {
            Ok(info) => info,
            Err(e) => return Ok(self.fail_tx(&mut tx, e)),
        };
        let balances = self.chain.balances(&tx.sender).await.unwrap_or_default();
        update_session_account(session, &tx.sender, |account| {
            account.account_number = info.account_number;
            account.sequence = info.sequence;
            if !balances.is_empty() {
                account.balances = balances.clone();
            }
        });

        self.transition(&mut tx, TxStatus::Signing);
        let mut sequence = info.sequence;
        let mut signed =
            match self.sign(adapter, &unsigned, info.account_number, sequence).await {
                Ok(s) => s,
                Err(e) => return Ok(self.fail_tx(&mut tx, e)),
            };

        // Broadcasts for one account are serialized until the previous
        // transaction's inclusion result is known.
        let lock = self.account_lock(&tx.sender);
        let guard = lock.lock().await;

        self.transition(&mut tx, TxStatus::Broadcasting);
        let mut retried_sequence = false;
        let accepted = loop {
            let result = match self.broadcast_with_backoff(&signed.tx_bytes).await {
                Ok(r) => r,
                Err(e) => return Ok(self.fail_tx(&mut tx, e)),
            };
            if result.accepted() {
                break result;
            }
            if result.is_sequence_mismatch() && !retried_sequence {
                // Exactly one refresh-and-retry; the sequence lives inside
                // the signed bytes, so the retry needs a fresh signature.
                retried_sequence = true;
                tracing::warn!("sequence mismatch for {}, refreshing and retrying", tx.id);
                let refreshed = match self.chain.account_info(&tx.sender).await {
                    Ok(i) => i,
                    Err(e) => return Ok(self.fail_tx(&mut tx, e)),
                };
                sequence = refreshed.sequence;
                update_session_account(session, &tx.sender, |account| {
                    account.sequence = refreshed.sequence;
                });
                signed = match self
                    .sign(adapter, &unsigned, refreshed.account_number, sequence)
                    .await
                {
                    Ok(s) => s,
                    Err(e) => return Ok(self.fail_tx(&mut tx, e)),
                };
                continue;
            }
            return Ok(self.fail_tx(&mut tx, WalletError::BroadcastRejected(result.raw_log)));
        };

        tx.tx_hash = Some(accepted.tx_hash.clone());
        // Optimistic bump; reconciled against chain state on the next
        // refresh.
        update_session_account(session, &tx.sender, |account| {
            account.sequence = sequence + 1;
        });
        self.transition(&mut tx, TxStatus::InFlight);

        let included = match self.poll_inclusion(&mut tx, &accepted.tx_hash).await {
            Ok(result) => result,
            Err(e) => return Ok(self.fail_tx(&mut tx, e)),
        };
        // Inclusion settled the sequence; later waits must not block other
        // transactions from this account.
        drop(guard);

        if !included.succeeded() {
            return Ok(self.fail_tx(
                &mut tx,
                WalletError::OnChainError { code: included.code, log: included.raw_log },
            ));
        }

        match &unsigned.ibc_intent {
            None => {
                let hash = accepted.tx_hash.clone();
                Ok(self.confirm_tx(&mut tx, &hash))
            }
            Some(intent) => {
                self.await_relay(&mut tx, &accepted.tx_hash, intent, included.packet_sequence)
                    .await
            }
        }
    }

    // --- lifecycle steps ---

    async fn sign(
        &self,
        adapter: &dyn WalletAdapter,
        unsigned: &UnsignedTx,
        account_number: u64,
        sequence: u64,
    ) -> Result<SignedTx> {
        let request = SignRequest {
            chain_id: self.profile.chain_id.clone(),
            account_number,
            sequence,
            sign_doc: unsigned.sign_doc(&self.profile.chain_id, account_number, sequence),
        };
        adapter.sign(&request).await
    }

    /// Broadcast with bounded backoff on transport failures. Rebroadcasting
    /// identical bytes is idempotent, so retrying the POST is safe.
    async fn broadcast_with_backoff(&self, tx_bytes: &[u8]) -> Result<BroadcastResult> {
        let mut failures = 0u32;
        let mut backoff = self.config.backoff_start_ms;
        loop {
            match self.chain.broadcast_tx(tx_bytes).await {
                Ok(result) => return Ok(result),
                Err(WalletError::NetworkError(e)) => {
                    failures += 1;
                    if failures >= self.config.poll_max_attempts {
                        return Err(WalletError::NetworkError(e));
                    }
                    tracing::warn!("broadcast attempt {} failed, backing off: {}", failures, e);
                    sleep(Duration::from_millis(backoff)).await;
                    backoff = (backoff * 2).min(self.config.backoff_max_ms);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Poll the query endpoint until the transaction is included, a
    /// bounded run of network failures gives up, or the confirm window
    /// closes.
    async fn poll_inclusion(
        &self,
        tx: &mut PendingTransaction,
        tx_hash: &str,
    ) -> Result<TxResult> {
        let deadline = Instant::now() + Duration::from_millis(self.config.confirm_max_wait_ms);
        let mut failures = 0u32;
        let mut backoff = self.config.backoff_start_ms;

        loop {
            sleep(Duration::from_millis(self.config.poll_interval_ms)).await;
            self.touch(tx);

            match self.chain.tx_by_hash(tx_hash).await {
                Ok(Some(result)) => return Ok(result),
                Ok(None) => {
                    failures = 0;
                    backoff = self.config.backoff_start_ms;
                    if Instant::now() >= deadline {
                        return Err(WalletError::NetworkError(format!(
                            "transaction {} not observed on chain within {}ms",
                            tx_hash, self.config.confirm_max_wait_ms
                        )));
                    }
                }
                Err(e) => {
                    failures += 1;
                    if failures >= self.config.poll_max_attempts {
                        return Err(WalletError::NetworkError(format!(
                            "giving up after {} failed polls: {}",
                            failures, e
                        )));
                    }
                    tracing::warn!("poll {} for {} failed: {}", failures, tx_hash, e);
                    sleep(Duration::from_millis(backoff)).await;
                    backoff = (backoff * 2).min(self.config.backoff_max_ms);
                }
            }
        }
    }

    /// Wait for the destination-chain acknowledgment of an IBC packet.
    ///
    /// Expiry and user cancellation both resolve to `TimedOut`: the packet
    /// may still be relayed, so the outcome is reported as uncertain
    /// rather than failed.
    async fn await_relay(
        &self,
        tx: &mut PendingTransaction,
        tx_hash: &str,
        intent: &IbcTransferIntent,
        packet_sequence: Option<u64>,
    ) -> Result<PendingTransaction> {
        self.transition(tx, TxStatus::AwaitingRelay);
        if packet_sequence.is_none() {
            tracing::warn!(
                "no send_packet sequence in events of {}; cannot observe the ack",
                tx_hash
            );
        }

        let deadline = Instant::now() + Duration::from_millis(self.config.relay_max_wait_ms);
        let mut failures = 0u32;
        let mut backoff = self.config.backoff_start_ms;

        loop {
            if self.cancel_requested(&tx.id) {
                tracing::debug!("relay wait for {} cancelled by user", tx.id);
                return Ok(self.timeout_tx(tx));
            }
            if Instant::now() >= deadline {
                return Ok(self.timeout_tx(tx));
            }
            sleep(Duration::from_millis(self.config.relay_poll_interval_ms)).await;
            self.touch(tx);

            let Some(sequence) = packet_sequence else { continue };
            match self
                .chain
                .ibc_ack_received(&intent.source_channel, sequence)
                .await
            {
                Ok(true) => return Ok(self.confirm_tx(tx, tx_hash)),
                Ok(false) => {
                    failures = 0;
                    backoff = self.config.backoff_start_ms;
                }
                Err(e) => {
                    failures += 1;
                    if failures >= self.config.poll_max_attempts {
                        return Ok(self.fail_tx(
                            tx,
                            WalletError::NetworkError(format!(
                                "giving up after {} failed ack queries: {}",
                                failures, e
                            )),
                        ));
                    }
                    tracing::warn!("ack query {} for {} failed: {}", failures, tx.id, e);
                    sleep(Duration::from_millis(backoff)).await;
                    backoff = (backoff * 2).min(self.config.backoff_max_ms);
                }
            }
        }
    }

    // --- bookkeeping ---

    fn transition(&self, tx: &mut PendingTransaction, status: TxStatus) {
        tx.status = status;
        self.store_and_notify(tx);
        tracing::debug!("transaction {} -> {:?}", tx.id, status);
        self.emit(PipelineEvent::Status { id: tx.id.clone(), status });
    }

    fn fail_tx(&self, tx: &mut PendingTransaction, error: WalletError) -> PendingTransaction {
        tx.failure = Some(error.clone());
        self.transition(tx, TxStatus::Failed);
        self.emit(PipelineEvent::Failed { id: tx.id.clone(), error });
        tx.clone()
    }

    fn confirm_tx(&self, tx: &mut PendingTransaction, tx_hash: &str) -> PendingTransaction {
        tx.tx_hash = Some(tx_hash.to_string());
        self.transition(tx, TxStatus::Confirmed);
        self.emit(PipelineEvent::Confirmed {
            id: tx.id.clone(),
            tx_hash: tx_hash.to_string(),
        });
        tx.clone()
    }

    fn timeout_tx(&self, tx: &mut PendingTransaction) -> PendingTransaction {
        self.transition(tx, TxStatus::TimedOut);
        self.emit(PipelineEvent::RelayTimedOut {
            id: tx.id.clone(),
            tx_hash: tx.tx_hash.clone(),
        });
        tx.clone()
    }

    fn touch(&self, tx: &mut PendingTransaction) {
        tx.last_polled_at = Some(unix_millis());
        self.store_and_notify(tx);
    }

    fn store_and_notify(&self, tx: &PendingTransaction) {
        self.txs.lock().unwrap().insert(tx.id.clone(), tx.clone());
        let watchers = self.watchers.lock().unwrap();
        if let Some(list) = watchers.get(&tx.id) {
            for watcher in list {
                watcher(tx);
            }
        }
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(ref handler) = self.on_event {
            handler(event);
        }
    }

    fn cancel_requested(&self, id: &str) -> bool {
        self.cancel_flags
            .lock()
            .unwrap()
            .get(id)
            .map(|flag| flag.load(Ordering::SeqCst))
            .unwrap_or(false)
    }

    fn discard(&self, id: &str) {
        self.txs.lock().unwrap().remove(id);
        self.cancel_flags.lock().unwrap().remove(id);
        self.watchers.lock().unwrap().remove(id);
    }

    fn account_lock(&self, sender: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.account_locks
            .lock()
            .unwrap()
            .entry(sender.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}

/// Apply a mutation to the session's cached account, if it is connected.
fn update_session_account<F: FnOnce(&mut Account)>(session: &SharedSession, sender: &str, f: F) {
    let mut guard = session.write().unwrap();
    if let Some(account) = guard.account_mut(sender) {
        f(account);
    }
}
