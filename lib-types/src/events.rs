//! Append-only event log
//!
//! Every committed transition produces zero or more [`Event`]s describing the
//! state changes it made. The sequencer appends them to an immutable history
//! and returns the transition's slice to the caller; nothing ever edits or
//! removes an emitted event.

use serde::{Deserialize, Serialize};

use crate::primitives::{
    Amount, CommentId, CommunityId, ContentRef, Karma, PostId, ProposalId, ReportId, Timestamp,
    Wallet,
};

/// Why a karma balance moved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KarmaReason {
    /// Author's post was upvoted (or the upvote reversed)
    PostVote,
    /// Author's comment was upvoted (or the vote reversed)
    CommentVote,
    /// Content was hidden by moderation
    ContentHidden,
    /// Reporter rewarded for an upheld report
    ValidReport,
    /// Reporter penalized for a frivolous report
    FrivolousReport,
    /// Direct moderator penalty
    ModeratorAction,
    /// Administrative adjustment
    Admin,
}

/// A single ledger event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    // Identity
    UserRegistered {
        wallet: Wallet,
        username: String,
        at: Timestamp,
    },
    KarmaUpdated {
        wallet: Wallet,
        /// Delta actually applied, after the daily-gain clamp
        applied: Karma,
        /// Delta that was requested
        requested: Karma,
        reason: KarmaReason,
        new_karma: Karma,
    },
    UserBanned {
        wallet: Wallet,
        karma: Karma,
    },
    UserUnbanned {
        wallet: Wallet,
    },

    // Communities
    CommunityCreated {
        community: CommunityId,
        name: String,
        creator: Wallet,
        treasury_deposit: Amount,
        protocol_fee: Amount,
    },
    MemberJoined {
        community: CommunityId,
        wallet: Wallet,
    },
    MemberLeft {
        community: CommunityId,
        wallet: Wallet,
    },
    ModeratorAdded {
        community: CommunityId,
        wallet: Wallet,
    },
    ModeratorRemoved {
        community: CommunityId,
        wallet: Wallet,
    },
    TreasuryDeposit {
        community: CommunityId,
        amount: Amount,
    },
    TreasuryWithdrawal {
        community: CommunityId,
        recipient: Wallet,
        amount: Amount,
    },
    CommunityConfigUpdated {
        community: CommunityId,
    },
    CommunityRulesUpdated {
        community: CommunityId,
    },
    CommunityActiveSet {
        community: CommunityId,
        active: bool,
    },

    // Content
    PostCreated {
        post: PostId,
        community: CommunityId,
        author: Wallet,
    },
    CommentCreated {
        comment: CommentId,
        post: PostId,
        parent: CommentId,
        author: Wallet,
    },
    ContentStatusChanged {
        content: ContentRef,
        status: String,
    },
    ScoreAdjusted {
        content: ContentRef,
        delta: i64,
        new_score: i64,
    },

    // Voting
    VoteCast {
        content: ContentRef,
        voter: Wallet,
        upvote: bool,
        stake: Amount,
    },
    VoteChanged {
        content: ContentRef,
        voter: Wallet,
        upvote: bool,
        added_stake: Amount,
        total_stake: Amount,
    },
    StakeWithdrawn {
        content: ContentRef,
        voter: Wallet,
        amount: Amount,
    },
    StakeSlashed {
        content: ContentRef,
        voter: Wallet,
        slashed: Amount,
        remaining: Amount,
    },

    // Moderation
    ContentReported {
        report: ReportId,
        content: ContentRef,
        reporter: Wallet,
    },
    ContentAutoFlagged {
        content: ContentRef,
        report_count: u32,
    },
    ReportResolved {
        report: ReportId,
        upheld: bool,
        frivolous: bool,
        moderator: Wallet,
    },
    ModeratorActionTaken {
        content: ContentRef,
        moderator: Wallet,
        hidden: bool,
        karma_penalty: Karma,
    },
    ContentUnhidden {
        content: ContentRef,
        moderator: Wallet,
    },

    // Governance
    ProposalCreated {
        proposal: ProposalId,
        community: CommunityId,
        proposer: Wallet,
    },
    ProposalVoteCast {
        proposal: ProposalId,
        voter: Wallet,
        support: bool,
        weight: u64,
    },
    ProposalExecuted {
        proposal: ProposalId,
        community: CommunityId,
    },
}

/// Event accumulator for a single transition
///
/// Passed `&mut` through every component call a transition makes; the
/// sequencer drains it into the permanent history only when the transition
/// commits, so an aborted transition emits nothing.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event
    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    /// Events emitted so far
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Consume the log, yielding its events
    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    /// Number of events emitted
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// True if nothing was emitted
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_accumulates_in_order() {
        let mut log = EventLog::new();
        log.emit(Event::MemberJoined {
            community: 1,
            wallet: Wallet::new([1; 32]),
        });
        log.emit(Event::MemberLeft {
            community: 1,
            wallet: Wallet::new([1; 32]),
        });
        assert_eq!(log.len(), 2);
        assert!(matches!(log.events()[0], Event::MemberJoined { .. }));
        assert!(matches!(log.events()[1], Event::MemberLeft { .. }));
    }
}
