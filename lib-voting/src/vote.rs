//! Vote records

use serde::{Deserialize, Serialize};

use lib_types::constants::{
    KARMA_COMMENT_DOWNVOTED, KARMA_COMMENT_UPVOTED, KARMA_POST_DOWNVOTED, KARMA_POST_UPVOTED,
    MIN_DOWNVOTE_STAKE, MIN_UPVOTE_STAKE,
};
use lib_types::{Amount, Karma, Timestamp};

/// Direction of an active vote
///
/// "No vote" is the absence of a record, not a variant, so an active vote
/// always has a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteType {
    /// Upvote
    Up,
    /// Downvote
    Down,
}

impl VoteType {
    /// Minimum stake to cast a vote of this type
    pub fn min_stake(&self) -> Amount {
        match self {
            VoteType::Up => MIN_UPVOTE_STAKE,
            VoteType::Down => MIN_DOWNVOTE_STAKE,
        }
    }

    /// Score contribution of this vote
    pub fn score_delta(&self) -> i64 {
        match self {
            VoteType::Up => 1,
            VoteType::Down => -1,
        }
    }

    /// Author karma contribution for a vote of this type on a post or comment
    pub fn karma_delta(&self, is_post: bool) -> Karma {
        match (self, is_post) {
            (VoteType::Up, true) => KARMA_POST_UPVOTED,
            (VoteType::Down, true) => KARMA_POST_DOWNVOTED,
            (VoteType::Up, false) => KARMA_COMMENT_UPVOTED,
            (VoteType::Down, false) => KARMA_COMMENT_DOWNVOTED,
        }
    }
}

/// One voter's bonded position on one content item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    /// Current direction
    pub vote_type: VoteType,
    /// Total locked stake; vote changes accumulate rather than refund
    pub stake: Amount,
    /// When the vote was last cast or changed; the lock period runs from here
    pub timestamp: Timestamp,
    /// Stake reclaimed after the lock period (terminal)
    pub withdrawn: bool,
    /// Stake slashed by moderation (terminal, blocks withdrawal)
    pub slashed: bool,
}

/// Per-content up/down counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    /// Active upvotes
    pub upvotes: u64,
    /// Active downvotes
    pub downvotes: u64,
}
