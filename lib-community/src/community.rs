//! Community record

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use lib_types::{Amount, CommunityId, Karma, Timestamp, Wallet};

/// Participation thresholds and cooldowns, settable by governance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityRules {
    /// Minimum karma to post
    pub min_karma_to_post: Karma,
    /// Minimum karma to comment
    pub min_karma_to_comment: Karma,
    /// Minimum karma to vote on content
    pub min_karma_to_vote: Karma,
    /// Base post cooldown in seconds (before per-user reductions)
    pub post_cooldown: Timestamp,
    /// Base comment cooldown in seconds (before per-user reductions)
    pub comment_cooldown: Timestamp,
}

impl Default for CommunityRules {
    fn default() -> Self {
        Self {
            min_karma_to_post: 0,
            min_karma_to_comment: 0,
            min_karma_to_vote: 0,
            post_cooldown: 300,
            comment_cooldown: 30,
        }
    }
}

/// Moderator bookkeeping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeratorInfo {
    /// When the moderator was (last) appointed
    pub appointed_at: Timestamp,
    /// Election votes behind the appointment (0 for the founding moderator)
    pub votes_received: u64,
    /// Removed moderators stay in the table, deactivated
    pub is_active: bool,
}

/// A community (subreddit)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    /// Identifier (1-indexed)
    pub id: CommunityId,
    /// Unique name (immutable)
    pub name: String,
    /// Free-form description, settable by governance
    pub description: String,
    /// Creating wallet; always the founding moderator
    pub creator: Wallet,
    /// Creation timestamp
    pub created_at: Timestamp,
    /// Participation thresholds
    pub rules: CommunityRules,
    /// Deactivated communities refuse new content
    pub is_active: bool,
    /// Moderator table; bounded number of active entries
    pub moderators: HashMap<Wallet, ModeratorInfo>,
    /// Member set (BTreeSet keeps snapshots deterministic)
    pub members: BTreeSet<Wallet>,
    /// Community treasury in atomic units
    pub treasury_balance: Amount,
}

impl Community {
    /// Number of members
    pub fn member_count(&self) -> u64 {
        self.members.len() as u64
    }

    /// Number of active moderators
    pub fn active_moderator_count(&self) -> usize {
        self.moderators.values().filter(|m| m.is_active).count()
    }

    /// True if `wallet` is an active moderator
    pub fn is_moderator(&self, wallet: Wallet) -> bool {
        self.moderators
            .get(&wallet)
            .map(|m| m.is_active)
            .unwrap_or(false)
    }

    /// True if `wallet` is a member
    pub fn is_member(&self, wallet: Wallet) -> bool {
        self.members.contains(&wallet)
    }
}
