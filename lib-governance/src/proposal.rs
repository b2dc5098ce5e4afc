//! Proposal records and the lifecycle state function

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use lib_community::CommunityRules;
use lib_types::constants::{
    CRITICAL_QUORUM_PCT, CRITICAL_TIMELOCK, CRITICAL_VOTING_PERIOD, EXECUTION_WINDOW,
    MAJORITY_PCT, STANDARD_QUORUM_PCT, STANDARD_TIMELOCK, STANDARD_VOTING_PERIOD,
    SUPERMAJORITY_PCT,
};
use lib_types::{Amount, CommunityId, Karma, ProposalId, Timestamp, Wallet};

/// What a proposal does if executed; the variant is the proposal's type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalPayload {
    /// Replace the community's rule thresholds (dispatches to `update_config`)
    RuleChange { rules: CommunityRules },
    /// Appoint a moderator
    ModeratorElection { wallet: Wallet },
    /// Remove a moderator (critical)
    ModeratorRemoval { wallet: Wallet },
    /// Pay out of the community treasury (critical)
    TreasurySpend { recipient: Wallet, amount: Amount },
    /// Replace the community description (dispatches to `update_rules`)
    ConfigChange { description: String },
}

impl ProposalPayload {
    /// The proposal type this payload implies
    pub fn proposal_type(&self) -> ProposalType {
        match self {
            ProposalPayload::RuleChange { .. } => ProposalType::RuleChange,
            ProposalPayload::ModeratorElection { .. } => ProposalType::ModeratorElection,
            ProposalPayload::ModeratorRemoval { .. } => ProposalType::ModeratorRemoval,
            ProposalPayload::TreasurySpend { .. } => ProposalType::TreasurySpend,
            ProposalPayload::ConfigChange { .. } => ProposalType::ConfigChange,
        }
    }
}

/// Proposal classification; drives parameters and the approval threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalType {
    RuleChange,
    ModeratorElection,
    ModeratorRemoval,
    TreasurySpend,
    ConfigChange,
}

impl ProposalType {
    /// Critical types demand a supermajority and stricter parameters
    pub fn is_critical(&self) -> bool {
        matches!(
            self,
            ProposalType::ModeratorRemoval | ProposalType::TreasurySpend
        )
    }

    /// Approval threshold in percent; the for-share must strictly exceed it
    pub fn approval_threshold(&self) -> u64 {
        if self.is_critical() {
            SUPERMAJORITY_PCT
        } else {
            MAJORITY_PCT
        }
    }

    /// Voting parameters for this classification
    pub fn params(&self) -> ProposalParams {
        if self.is_critical() {
            ProposalParams {
                voting_period: CRITICAL_VOTING_PERIOD,
                timelock: CRITICAL_TIMELOCK,
                quorum_pct: CRITICAL_QUORUM_PCT,
            }
        } else {
            ProposalParams {
                voting_period: STANDARD_VOTING_PERIOD,
                timelock: STANDARD_TIMELOCK,
                quorum_pct: STANDARD_QUORUM_PCT,
            }
        }
    }
}

/// Voting-period, timelock and quorum selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalParams {
    /// How long voting stays open
    pub voting_period: Timestamp,
    /// Delay between voting end and earliest execution
    pub timelock: Timestamp,
    /// Quorum as a percentage of community members
    pub quorum_pct: u64,
}

/// Computed lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalState {
    /// Voting is open
    Active,
    /// Quorum missed or approval threshold not exceeded
    Defeated,
    /// Passed; executable once the timelock elapses
    Succeeded,
    /// Dispatched into the community registry (absorbing)
    Executed,
    /// Passed but the execution window lapsed unexecuted (terminal)
    Expired,
}

impl fmt::Display for ProposalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ProposalState::Active => "active",
            ProposalState::Defeated => "defeated",
            ProposalState::Succeeded => "succeeded",
            ProposalState::Executed => "executed",
            ProposalState::Expired => "expired",
        };
        f.write_str(s)
    }
}

/// One wallet's recorded proposal vote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteReceipt {
    /// For or against
    pub support: bool,
    /// Weight fixed from the voter's karma at cast time
    pub weight: u64,
}

/// A governance proposal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    /// Identifier (1-indexed)
    pub id: ProposalId,
    /// Target community
    pub community_id: CommunityId,
    /// Proposing wallet
    pub proposer: Wallet,
    /// Execution payload; its variant is the proposal type
    pub payload: ProposalPayload,
    /// Weighted for-votes
    pub for_votes: u64,
    /// Weighted against-votes
    pub against_votes: u64,
    /// Voting opens (creation time)
    pub start_time: Timestamp,
    /// Voting closes
    pub end_time: Timestamp,
    /// Earliest execution (end of timelock)
    pub execution_time: Timestamp,
    /// One-way flag, set on successful dispatch
    pub executed: bool,
    /// Quorum as a percentage of community members, fixed at creation
    pub quorum_required: u64,
    /// Per-voter receipts; first vote wins, no changing
    pub voters: HashMap<Wallet, VoteReceipt>,
}

/// Vote weight for a karma balance. `None` for non-positive karma: such
/// wallets cannot vote at all.
pub fn voting_weight(karma: Karma) -> Option<u64> {
    if karma <= 0 {
        None
    } else if karma < 100 {
        Some(1)
    } else if karma < 500 {
        Some(2)
    } else if karma < 1_000 {
        Some(3)
    } else {
        Some(4 + karma as u64 / 1_000)
    }
}

/// The lifecycle state of a proposal at `now`, given the community's
/// current member count. Pure; never cached on the proposal.
pub fn proposal_state(proposal: &Proposal, now: Timestamp, member_count: u64) -> ProposalState {
    if proposal.executed {
        return ProposalState::Executed;
    }
    if now < proposal.end_time {
        return ProposalState::Active;
    }
    let total = proposal.for_votes + proposal.against_votes;
    let quorum_votes = member_count * proposal.quorum_required / 100;
    if total < quorum_votes || total == 0 {
        return ProposalState::Defeated;
    }
    let for_pct = proposal.for_votes * 100 / total;
    let threshold = proposal.payload.proposal_type().approval_threshold();
    if for_pct > threshold {
        if now > proposal.execution_time + EXECUTION_WINDOW {
            ProposalState::Expired
        } else {
            ProposalState::Succeeded
        }
    } else {
        ProposalState::Defeated
    }
}
