//! Proto-JSON message envelopes for the chain's transaction endpoint.
//!
//! Envelopes serialize with the `@type` URL tag the LCD expects, amounts
//! as decimal strings, and u64 ids as strings.

use serde::{Deserialize, Serialize};

use helix_types::Coin;

/// Governance vote options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteOption {
    #[serde(rename = "VOTE_OPTION_YES")]
    Yes,
    #[serde(rename = "VOTE_OPTION_ABSTAIN")]
    Abstain,
    #[serde(rename = "VOTE_OPTION_NO")]
    No,
    #[serde(rename = "VOTE_OPTION_NO_WITH_VETO")]
    NoWithVeto,
}

impl VoteOption {
    /// Short label for confirmation summaries.
    pub fn label(&self) -> &'static str {
        match self {
            VoteOption::Yes => "yes",
            VoteOption::Abstain => "abstain",
            VoteOption::No => "no",
            VoteOption::NoWithVeto => "no with veto",
        }
    }
}

/// A protocol message in proto-JSON form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "@type")]
pub enum Msg {
    #[serde(rename = "/cosmos.staking.v1beta1.MsgDelegate")]
    Delegate {
        delegator_address: String,
        validator_address: String,
        amount: Coin,
    },

    #[serde(rename = "/cosmos.staking.v1beta1.MsgBeginRedelegate")]
    BeginRedelegate {
        delegator_address: String,
        validator_src_address: String,
        validator_dst_address: String,
        amount: Coin,
    },

    #[serde(rename = "/cosmos.staking.v1beta1.MsgUndelegate")]
    Undelegate {
        delegator_address: String,
        validator_address: String,
        amount: Coin,
    },

    #[serde(rename = "/cosmos.distribution.v1beta1.MsgWithdrawDelegatorReward")]
    WithdrawDelegatorReward {
        delegator_address: String,
        validator_address: String,
    },

    #[serde(rename = "/cosmos.gov.v1beta1.MsgVote")]
    Vote {
        proposal_id: String,
        voter: String,
        option: VoteOption,
    },

    #[serde(rename = "/cosmos.gov.v1beta1.MsgDeposit")]
    Deposit {
        proposal_id: String,
        depositor: String,
        amount: Vec<Coin>,
    },

    #[serde(rename = "/ibc.applications.transfer.v1.MsgTransfer")]
    Transfer {
        source_port: String,
        source_channel: String,
        token: Coin,
        sender: String,
        receiver: String,
        /// Absolute timeout in nanoseconds since the Unix epoch.
        timeout_timestamp: String,
    },
}
