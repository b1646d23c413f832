//! Transaction construction: typed parameters in, signable envelope out.
//!
//! The builder validates user parameters against a snapshot of account
//! state, asks the chain collaborator for a gas estimate (falling back to
//! the profile default when simulation is unavailable), and produces an
//! [`UnsignedTx`] carrying the proto-JSON messages plus a human-readable
//! summary for the confirmation step.

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use helix_chain::ChainApi;
use helix_types::dec::format_units;
use helix_types::{unix_nanos, ChainProfile, Coin, Result, WalletError};
use helix_wallet::Account;

pub mod msgs;

pub use msgs::{Msg, VoteOption};

/// Fraction digits shown in confirmation summaries.
const SUMMARY_FRAC: u32 = 6;

/// The protocol operations the builder can assemble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MsgKind {
    Delegate,
    Redelegate,
    Undelegate,
    ClaimReward,
    Vote,
    Deposit,
    IbcTransfer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DelegateParams {
    pub validator: String,
    pub amount: u128,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RedelegateParams {
    pub from_validator: String,
    pub to_validator: String,
    pub amount: u128,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UndelegateParams {
    pub validator: String,
    pub amount: u128,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClaimRewardParams {
    pub validators: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoteParams {
    pub proposal_id: u64,
    pub option: VoteOption,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DepositParams {
    pub proposal_id: u64,
    pub amount: u128,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IbcTransferParams {
    pub source_channel: String,
    pub dest_channel: Option<String>,
    pub receiver: String,
    /// Token to move; usually the base denom, but any held denom works.
    pub token: Coin,
    /// Relative timeout; the absolute timestamp is computed at build time.
    pub timeout_offset_secs: u64,
}

/// A build request: operation kind plus its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildRequest {
    Delegate(DelegateParams),
    Redelegate(RedelegateParams),
    Undelegate(UndelegateParams),
    ClaimReward(ClaimRewardParams),
    Vote(VoteParams),
    Deposit(DepositParams),
    IbcTransfer(IbcTransferParams),
}

impl BuildRequest {
    pub fn kind(&self) -> MsgKind {
        match self {
            BuildRequest::Delegate(_) => MsgKind::Delegate,
            BuildRequest::Redelegate(_) => MsgKind::Redelegate,
            BuildRequest::Undelegate(_) => MsgKind::Undelegate,
            BuildRequest::ClaimReward(_) => MsgKind::ClaimReward,
            BuildRequest::Vote(_) => MsgKind::Vote,
            BuildRequest::Deposit(_) => MsgKind::Deposit,
            BuildRequest::IbcTransfer(_) => MsgKind::IbcTransfer,
        }
    }
}

/// IBC transfer specifics the pipeline needs for its relay wait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IbcTransferIntent {
    pub source_channel: String,
    pub dest_channel: Option<String>,
    pub timeout_timestamp_nanos: u64,
}

/// An unsigned, chain-specific transaction envelope plus the confirmation
/// summary shown to the user before signing.
#[derive(Debug, Clone)]
pub struct UnsignedTx {
    /// Client-generated id, stable through the whole submission lifecycle.
    pub id: String,
    pub kind: MsgKind,
    /// Sender's Bech32 address.
    pub sender: String,
    pub msgs: Vec<Msg>,
    pub fee: Coin,
    pub gas_limit: u64,
    /// False when simulation failed and the profile default was used; the
    /// confirmation UI must call that out.
    pub gas_estimated: bool,
    pub memo: String,
    pub summary: String,
    pub ibc_intent: Option<IbcTransferIntent>,
}

impl UnsignedTx {
    /// Canonical sign doc handed to the wallet provider.
    pub fn sign_doc(&self, chain_id: &str, account_number: u64, sequence: u64) -> serde_json::Value {
        json!({
            "chain_id": chain_id,
            "account_number": account_number.to_string(),
            "sequence": sequence.to_string(),
            "fee": {
                "amount": [self.fee],
                "gas": self.gas_limit.to_string(),
            },
            "msgs": self.msgs,
            "memo": self.memo,
        })
    }
}

/// Assembles unsigned transactions for one chain profile.
pub struct TxBuilder<'a> {
    profile: &'a ChainProfile,
    chain: &'a dyn ChainApi,
}

impl<'a> TxBuilder<'a> {
    pub fn new(profile: &'a ChainProfile, chain: &'a dyn ChainApi) -> Self {
        Self { profile, chain }
    }

    /// Build an unsigned transaction from validated parameters and the
    /// given account snapshot.
    pub async fn build(&self, account: &Account, request: BuildRequest) -> Result<UnsignedTx> {
        let kind = request.kind();
        let sender = account.bech32_address.clone();
        let (msgs, summary, spend, token_spend, ibc_intent) =
            self.assemble(account, &request)?;

        let (gas_limit, gas_estimated) = self.estimate_gas(account, &msgs).await;
        let fee = self.profile.fee_for_gas(gas_limit);

        // Base-denom spend plus the fee must fit in the spendable balance.
        let spendable = account.balance_of(&self.profile.base_denom);
        let required = spend.saturating_add(fee.amount);
        if required > spendable {
            return Err(WalletError::invalid_param(
                "amount",
                format!(
                    "requires {} {} (incl. fee) but only {} is spendable",
                    required, self.profile.base_denom, spendable
                ),
            ));
        }
        if let Some((denom, amount)) = token_spend {
            if amount > account.balance_of(&denom) {
                return Err(WalletError::invalid_param(
                    "amount",
                    format!("exceeds {} balance", denom),
                ));
            }
        }

        Ok(UnsignedTx {
            id: Uuid::new_v4().to_string(),
            kind,
            sender,
            msgs,
            fee,
            gas_limit,
            gas_estimated,
            memo: String::new(),
            summary,
            ibc_intent,
        })
    }

    /// Validate parameters and produce messages plus the base-denom spend
    /// amount, an optional foreign-denom spend, and the IBC intent.
    #[allow(clippy::type_complexity)]
    fn assemble(
        &self,
        account: &Account,
        request: &BuildRequest,
    ) -> Result<(Vec<Msg>, String, u128, Option<(String, u128)>, Option<IbcTransferIntent>)> {
        let sender = account.bech32_address.clone();
        match request {
            BuildRequest::Delegate(p) => {
                self.check_validator(&p.validator, "validator")?;
                check_positive(p.amount, "amount")?;
                let msgs = vec![Msg::Delegate {
                    delegator_address: sender,
                    validator_address: p.validator.clone(),
                    amount: Coin::new(self.profile.base_denom.clone(), p.amount),
                }];
                let summary = format!(
                    "Delegate {} {} to {}",
                    self.display_amount(p.amount),
                    self.profile.display_denom,
                    p.validator
                );
                Ok((msgs, summary, p.amount, None, None))
            }

            BuildRequest::Redelegate(p) => {
                self.check_validator(&p.from_validator, "from_validator")?;
                self.check_validator(&p.to_validator, "to_validator")?;
                check_positive(p.amount, "amount")?;
                if p.from_validator == p.to_validator {
                    return Err(WalletError::invalid_param(
                        "to_validator",
                        "source and destination validator are the same",
                    ));
                }
                let msgs = vec![Msg::BeginRedelegate {
                    delegator_address: sender,
                    validator_src_address: p.from_validator.clone(),
                    validator_dst_address: p.to_validator.clone(),
                    amount: Coin::new(self.profile.base_denom.clone(), p.amount),
                }];
                let summary = format!(
                    "Redelegate {} {} from {} to {}",
                    self.display_amount(p.amount),
                    self.profile.display_denom,
                    p.from_validator,
                    p.to_validator
                );
                Ok((msgs, summary, 0, None, None))
            }

            BuildRequest::Undelegate(p) => {
                self.check_validator(&p.validator, "validator")?;
                check_positive(p.amount, "amount")?;
                let msgs = vec![Msg::Undelegate {
                    delegator_address: sender,
                    validator_address: p.validator.clone(),
                    amount: Coin::new(self.profile.base_denom.clone(), p.amount),
                }];
                let summary = format!(
                    "Undelegate {} {} from {}",
                    self.display_amount(p.amount),
                    self.profile.display_denom,
                    p.validator
                );
                Ok((msgs, summary, 0, None, None))
            }

            BuildRequest::ClaimReward(p) => {
                if p.validators.is_empty() {
                    return Err(WalletError::invalid_param(
                        "validators",
                        "no validators to claim from",
                    ));
                }
                for validator in &p.validators {
                    self.check_validator(validator, "validators")?;
                }
                let msgs = p
                    .validators
                    .iter()
                    .map(|validator| Msg::WithdrawDelegatorReward {
                        delegator_address: sender.clone(),
                        validator_address: validator.clone(),
                    })
                    .collect();
                let summary = if p.validators.len() == 1 {
                    format!("Claim staking rewards from {}", p.validators[0])
                } else {
                    format!("Claim staking rewards from {} validators", p.validators.len())
                };
                Ok((msgs, summary, 0, None, None))
            }

            BuildRequest::Vote(p) => {
                check_positive(p.proposal_id as u128, "proposal_id")?;
                let msgs = vec![Msg::Vote {
                    proposal_id: p.proposal_id.to_string(),
                    voter: sender,
                    option: p.option,
                }];
                let summary =
                    format!("Vote {} on proposal #{}", p.option.label(), p.proposal_id);
                Ok((msgs, summary, 0, None, None))
            }

            BuildRequest::Deposit(p) => {
                check_positive(p.proposal_id as u128, "proposal_id")?;
                check_positive(p.amount, "amount")?;
                let msgs = vec![Msg::Deposit {
                    proposal_id: p.proposal_id.to_string(),
                    depositor: sender,
                    amount: vec![Coin::new(self.profile.base_denom.clone(), p.amount)],
                }];
                let summary = format!(
                    "Deposit {} {} to proposal #{}",
                    self.display_amount(p.amount),
                    self.profile.display_denom,
                    p.proposal_id
                );
                Ok((msgs, summary, p.amount, None, None))
            }

            BuildRequest::IbcTransfer(p) => {
                check_positive(p.token.amount, "amount")?;
                if !p.source_channel.starts_with("channel-") {
                    return Err(WalletError::invalid_param(
                        "source_channel",
                        format!("{:?} is not a channel identifier", p.source_channel),
                    ));
                }
                // Receiver lives on the counterparty chain; any valid
                // Bech32 account is acceptable, the prefix is theirs.
                helix_codec::decode_bech32(&p.receiver)
                    .map_err(|e| WalletError::invalid_param("receiver", e.to_string()))?;
                if p.timeout_offset_secs == 0 {
                    return Err(WalletError::invalid_param(
                        "timeout_offset_secs",
                        "timeout must be in the future",
                    ));
                }

                let timeout_timestamp_nanos =
                    unix_nanos().saturating_add(p.timeout_offset_secs.saturating_mul(1_000_000_000));
                let is_base = p.token.denom == self.profile.base_denom;
                let msgs = vec![Msg::Transfer {
                    source_port: "transfer".to_string(),
                    source_channel: p.source_channel.clone(),
                    token: p.token.clone(),
                    sender,
                    receiver: p.receiver.clone(),
                    timeout_timestamp: timeout_timestamp_nanos.to_string(),
                }];
                let display = if is_base {
                    format!(
                        "{} {}",
                        self.display_amount(p.token.amount),
                        self.profile.display_denom
                    )
                } else {
                    format!("{} {}", p.token.amount, p.token.denom)
                };
                let summary = format!(
                    "Transfer {} to {} via {}",
                    display, p.receiver, p.source_channel
                );
                let intent = IbcTransferIntent {
                    source_channel: p.source_channel.clone(),
                    dest_channel: p.dest_channel.clone(),
                    timeout_timestamp_nanos,
                };
                let spend = if is_base { p.token.amount } else { 0 };
                let token_spend = if is_base {
                    None
                } else {
                    Some((p.token.denom.clone(), p.token.amount))
                };
                Ok((msgs, summary, spend, token_spend, Some(intent)))
            }
        }
    }

    /// Gas through the simulate collaborator, with the profile default as
    /// fallback. The bool is false when the default was used.
    async fn estimate_gas(&self, account: &Account, msgs: &[Msg]) -> (u64, bool) {
        let probe = json!({
            "chain_id": self.profile.chain_id,
            "account_number": account.account_number.to_string(),
            "sequence": account.sequence.to_string(),
            "fee": {
                "amount": [self.profile.fee_for_gas(self.profile.default_gas_limit)],
                "gas": self.profile.default_gas_limit.to_string(),
            },
            "msgs": msgs,
            "memo": "",
        });
        let bytes = match serde_json::to_vec(&probe) {
            Ok(b) => b,
            Err(_) => return (self.profile.default_gas_limit, false),
        };

        match self.chain.simulate(&bytes).await {
            Ok(gas_used) => (self.profile.adjust_gas(gas_used), true),
            Err(e) => {
                tracing::debug!("gas simulation unavailable, using default: {}", e);
                (self.profile.default_gas_limit, false)
            }
        }
    }

    fn check_validator(&self, address: &str, field: &str) -> Result<()> {
        let (prefix, _) = helix_codec::decode_bech32(address)
            .map_err(|e| WalletError::invalid_param(field, e.to_string()))?;
        let expected = self.profile.valoper_prefix();
        if prefix != expected {
            return Err(WalletError::invalid_param(
                field,
                format!("expected a {} address, got prefix {}", expected, prefix),
            ));
        }
        Ok(())
    }

    fn display_amount(&self, atomics: u128) -> String {
        format_units(
            atomics.min(i128::MAX as u128) as i128,
            self.profile.decimals,
            SUMMARY_FRAC,
        )
    }
}

fn check_positive(value: u128, field: &str) -> Result<()> {
    if value == 0 {
        return Err(WalletError::invalid_param(field, "must be greater than zero"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use helix_chain::{AccountInfo, BroadcastResult, ProposalInfo, TxResult, ValidatorInfo};

    /// Chain stub: only `simulate` matters to the builder.
    struct SimChain {
        gas_used: Option<u64>,
    }

    #[async_trait]
    impl ChainApi for SimChain {
        async fn account_info(&self, _address: &str) -> Result<AccountInfo> {
            Ok(AccountInfo { account_number: 1, sequence: 0 })
        }
        async fn balances(&self, _address: &str) -> Result<Vec<Coin>> {
            Ok(Vec::new())
        }
        async fn simulate(&self, _tx_bytes: &[u8]) -> Result<u64> {
            self.gas_used
                .ok_or_else(|| WalletError::Other("simulate unavailable".to_string()))
        }
        async fn broadcast_tx(&self, _tx_bytes: &[u8]) -> Result<BroadcastResult> {
            unreachable!("builder never broadcasts")
        }
        async fn tx_by_hash(&self, _hash: &str) -> Result<Option<TxResult>> {
            Ok(None)
        }
        async fn ibc_ack_received(&self, _channel: &str, _sequence: u64) -> Result<bool> {
            Ok(false)
        }
        async fn validators(&self) -> Result<Vec<ValidatorInfo>> {
            Ok(Vec::new())
        }
        async fn proposals(&self) -> Result<Vec<ProposalInfo>> {
            Ok(Vec::new())
        }
    }

    fn profile() -> ChainProfile {
        // Zero gas price keeps fee arithmetic out of balance assertions.
        ChainProfile { gas_price: 0, ..ChainProfile::default() }
    }

    fn account_with_balance(amount: u128) -> Account {
        let mut account =
            Account::from_hex("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed", "helix").unwrap();
        account.balances = vec![Coin::new("ahlx", amount)];
        account
    }

    fn valoper(fill: u8) -> String {
        helix_codec::encode_bech32(&[fill; 20], "helixvaloper").unwrap()
    }

    fn bech_account(fill: u8, prefix: &str) -> String {
        helix_codec::encode_bech32(&[fill; 20], prefix).unwrap()
    }

    fn expect_invalid(result: Result<UnsignedTx>, expected_field: &str) {
        match result {
            Err(WalletError::InvalidParameters { field, .. }) => {
                assert_eq!(field, expected_field)
            }
            other => panic!("expected InvalidParameters on {}, got {:?}", expected_field, other),
        }
    }

    #[tokio::test]
    async fn test_delegate_builds_envelope_and_summary() {
        let profile = profile();
        let chain = SimChain { gas_used: Some(100_000) };
        let builder = TxBuilder::new(&profile, &chain);
        let account = account_with_balance(2_000_000_000_000_000_000);

        let tx = builder
            .build(
                &account,
                BuildRequest::Delegate(DelegateParams {
                    validator: valoper(1),
                    amount: 1_500_000_000_000_000_000,
                }),
            )
            .await
            .unwrap();

        assert_eq!(tx.kind, MsgKind::Delegate);
        assert!(tx.gas_estimated);
        assert_eq!(tx.gas_limit, 130_000, "gas adjustment must apply");
        assert!(tx.summary.starts_with("Delegate 1.5 HLX to helixvaloper1"));
        assert!(tx.ibc_intent.is_none());

        let v = serde_json::to_value(&tx.msgs[0]).unwrap();
        assert_eq!(v["@type"], "/cosmos.staking.v1beta1.MsgDelegate");
        assert_eq!(v["amount"]["denom"], "ahlx");
    }

    #[tokio::test]
    async fn test_delegate_exceeding_balance_is_invalid() {
        let profile = profile();
        let chain = SimChain { gas_used: Some(100_000) };
        let builder = TxBuilder::new(&profile, &chain);
        let account = account_with_balance(100);

        let result = builder
            .build(
                &account,
                BuildRequest::Delegate(DelegateParams { validator: valoper(1), amount: 150 }),
            )
            .await;
        expect_invalid(result, "amount");
    }

    #[tokio::test]
    async fn test_delegate_reserves_fee_headroom() {
        // 100 spendable, fee of 1 atomic per gas unit * 100 gas = 100.
        let profile = ChainProfile {
            gas_price: 1,
            default_gas_limit: 100,
            ..ChainProfile::default()
        };
        let chain = SimChain { gas_used: None };
        let builder = TxBuilder::new(&profile, &chain);
        let account = account_with_balance(100);

        let result = builder
            .build(
                &account,
                BuildRequest::Delegate(DelegateParams { validator: valoper(1), amount: 50 }),
            )
            .await;
        expect_invalid(result, "amount");
    }

    #[tokio::test]
    async fn test_zero_amount_rejected() {
        let profile = profile();
        let chain = SimChain { gas_used: Some(100_000) };
        let builder = TxBuilder::new(&profile, &chain);
        let account = account_with_balance(100);

        let result = builder
            .build(
                &account,
                BuildRequest::Delegate(DelegateParams { validator: valoper(1), amount: 0 }),
            )
            .await;
        expect_invalid(result, "amount");
    }

    #[tokio::test]
    async fn test_account_address_rejected_as_validator() {
        let profile = profile();
        let chain = SimChain { gas_used: Some(100_000) };
        let builder = TxBuilder::new(&profile, &chain);
        let account = account_with_balance(100);

        let result = builder
            .build(
                &account,
                BuildRequest::Delegate(DelegateParams {
                    validator: bech_account(1, "helix"),
                    amount: 10,
                }),
            )
            .await;
        expect_invalid(result, "validator");
    }

    #[tokio::test]
    async fn test_redelegate_to_same_validator_is_invalid() {
        let profile = profile();
        let chain = SimChain { gas_used: Some(100_000) };
        let builder = TxBuilder::new(&profile, &chain);
        let account = account_with_balance(100);

        let result = builder
            .build(
                &account,
                BuildRequest::Redelegate(RedelegateParams {
                    from_validator: valoper(1),
                    to_validator: valoper(1),
                    amount: 10,
                }),
            )
            .await;
        expect_invalid(result, "to_validator");
    }

    #[tokio::test]
    async fn test_undelegate_ignores_spendable_balance() {
        let profile = profile();
        let chain = SimChain { gas_used: Some(80_000) };
        let builder = TxBuilder::new(&profile, &chain);
        // Nothing spendable, but undelegating bonded tokens is still fine.
        let account = account_with_balance(0);

        let tx = builder
            .build(
                &account,
                BuildRequest::Undelegate(UndelegateParams { validator: valoper(2), amount: 500 }),
            )
            .await
            .unwrap();
        assert_eq!(tx.kind, MsgKind::Undelegate);
    }

    #[tokio::test]
    async fn test_claim_rewards_one_msg_per_validator() {
        let profile = profile();
        let chain = SimChain { gas_used: Some(90_000) };
        let builder = TxBuilder::new(&profile, &chain);
        let account = account_with_balance(100);

        let tx = builder
            .build(
                &account,
                BuildRequest::ClaimReward(ClaimRewardParams {
                    validators: vec![valoper(1), valoper(2), valoper(3)],
                }),
            )
            .await
            .unwrap();
        assert_eq!(tx.msgs.len(), 3);
        assert_eq!(tx.summary, "Claim staking rewards from 3 validators");
    }

    #[tokio::test]
    async fn test_claim_rewards_requires_validators() {
        let profile = profile();
        let chain = SimChain { gas_used: Some(90_000) };
        let builder = TxBuilder::new(&profile, &chain);
        let account = account_with_balance(100);

        let result = builder
            .build(
                &account,
                BuildRequest::ClaimReward(ClaimRewardParams { validators: vec![] }),
            )
            .await;
        expect_invalid(result, "validators");
    }

    #[tokio::test]
    async fn test_vote_summary_and_envelope() {
        let profile = profile();
        let chain = SimChain { gas_used: Some(60_000) };
        let builder = TxBuilder::new(&profile, &chain);
        let account = account_with_balance(100);

        let tx = builder
            .build(
                &account,
                BuildRequest::Vote(VoteParams { proposal_id: 12, option: VoteOption::Yes }),
            )
            .await
            .unwrap();
        assert_eq!(tx.summary, "Vote yes on proposal #12");
        let v = serde_json::to_value(&tx.msgs[0]).unwrap();
        assert_eq!(v["proposal_id"], "12");
        assert_eq!(v["option"], "VOTE_OPTION_YES");
    }

    #[tokio::test]
    async fn test_gas_fallback_flags_unestimated() {
        let profile = profile();
        let chain = SimChain { gas_used: None };
        let builder = TxBuilder::new(&profile, &chain);
        let account = account_with_balance(1_000);

        let tx = builder
            .build(
                &account,
                BuildRequest::Vote(VoteParams { proposal_id: 1, option: VoteOption::No }),
            )
            .await
            .unwrap();
        assert!(!tx.gas_estimated);
        assert_eq!(tx.gas_limit, profile.default_gas_limit);
    }

    #[tokio::test]
    async fn test_ibc_transfer_intent_and_timeout() {
        let profile = profile();
        let chain = SimChain { gas_used: Some(120_000) };
        let builder = TxBuilder::new(&profile, &chain);
        let account = account_with_balance(1_000);

        let before = unix_nanos();
        let tx = builder
            .build(
                &account,
                BuildRequest::IbcTransfer(IbcTransferParams {
                    source_channel: "channel-0".to_string(),
                    dest_channel: Some("channel-141".to_string()),
                    receiver: bech_account(9, "cosmos"),
                    token: Coin::new("ahlx", 500),
                    timeout_offset_secs: 600,
                }),
            )
            .await
            .unwrap();

        let intent = tx.ibc_intent.expect("ibc transfer must carry an intent");
        assert_eq!(intent.source_channel, "channel-0");
        assert_eq!(intent.dest_channel.as_deref(), Some("channel-141"));
        assert!(
            intent.timeout_timestamp_nanos >= before + 600 * 1_000_000_000,
            "timeout must be at least the offset in the future"
        );
    }

    #[tokio::test]
    async fn test_ibc_transfer_zero_timeout_is_invalid() {
        let profile = profile();
        let chain = SimChain { gas_used: Some(120_000) };
        let builder = TxBuilder::new(&profile, &chain);
        let account = account_with_balance(1_000);

        let result = builder
            .build(
                &account,
                BuildRequest::IbcTransfer(IbcTransferParams {
                    source_channel: "channel-0".to_string(),
                    dest_channel: None,
                    receiver: bech_account(9, "cosmos"),
                    token: Coin::new("ahlx", 500),
                    timeout_offset_secs: 0,
                }),
            )
            .await;
        expect_invalid(result, "timeout_offset_secs");
    }

    #[tokio::test]
    async fn test_ibc_transfer_foreign_denom_checks_its_own_balance() {
        let profile = profile();
        let chain = SimChain { gas_used: Some(120_000) };
        let builder = TxBuilder::new(&profile, &chain);
        let mut account = account_with_balance(1_000);
        account.balances.push(Coin::new("ibc/27394F", 10));

        let result = builder
            .build(
                &account,
                BuildRequest::IbcTransfer(IbcTransferParams {
                    source_channel: "channel-0".to_string(),
                    dest_channel: None,
                    receiver: bech_account(9, "cosmos"),
                    token: Coin::new("ibc/27394F", 11),
                    timeout_offset_secs: 600,
                }),
            )
            .await;
        expect_invalid(result, "amount");
    }

    #[tokio::test]
    async fn test_sign_doc_shape() {
        let profile = profile();
        let chain = SimChain { gas_used: Some(100_000) };
        let builder = TxBuilder::new(&profile, &chain);
        let account = account_with_balance(1_000);

        let tx = builder
            .build(
                &account,
                BuildRequest::Vote(VoteParams { proposal_id: 3, option: VoteOption::Abstain }),
            )
            .await
            .unwrap();

        let doc = tx.sign_doc("helix_4242-1", 42, 7);
        assert_eq!(doc["chain_id"], "helix_4242-1");
        assert_eq!(doc["account_number"], "42");
        assert_eq!(doc["sequence"], "7");
        assert_eq!(doc["fee"]["gas"], "130000");
        assert_eq!(doc["msgs"][0]["@type"], "/cosmos.gov.v1beta1.MsgVote");
    }
}
