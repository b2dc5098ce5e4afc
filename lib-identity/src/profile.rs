//! User profile record

use serde::{Deserialize, Serialize};

use lib_types::constants::{
    MIN_COMMENT_COOLDOWN, MIN_POST_COOLDOWN, TRUSTED_ACCOUNT_AGE, TRUSTED_KARMA,
};
use lib_types::{Karma, Timestamp, Wallet};

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Owning wallet address (immutable after registration)
    pub wallet: Wallet,
    /// Unique username (immutable after registration)
    pub username: String,
    /// Reputation balance; may go negative
    pub karma: Karma,
    /// Registration timestamp
    pub created_at: Timestamp,
    /// Timestamp of the last post (0 if none)
    pub last_post_at: Timestamp,
    /// Timestamp of the last comment (0 if none)
    pub last_comment_at: Timestamp,
    /// Lifetime post count
    pub total_posts: u64,
    /// Lifetime comment count
    pub total_comments: u64,
    /// Whether the wallet is banned
    pub is_banned: bool,
    /// UTC day bucket of the last positive karma gain
    pub(crate) gain_day: u64,
    /// Positive karma applied within `gain_day`
    pub(crate) gained_today: Karma,
}

impl UserProfile {
    /// True if the account qualifies for the trusted cooldown halving:
    /// at least 30 days old and at least 100 karma
    pub fn is_trusted(&self, now: Timestamp) -> bool {
        now.saturating_sub(self.created_at) >= TRUSTED_ACCOUNT_AGE && self.karma >= TRUSTED_KARMA
    }

    /// Effective post cooldown for this profile given a community's base.
    ///
    /// Trusted halving applies first, then the single highest matching
    /// karma-tier division on the result, then the 30s floor.
    pub fn post_cooldown(&self, base: Timestamp, now: Timestamp) -> Timestamp {
        let mut cooldown = base;
        if self.is_trusted(now) {
            cooldown /= 2;
        }
        if self.karma >= 1_000 {
            cooldown /= 4;
        } else if self.karma >= 500 {
            cooldown /= 2;
        }
        cooldown.max(MIN_POST_COOLDOWN)
    }

    /// Effective comment cooldown; tiers are lower than for posts.
    pub fn comment_cooldown(&self, base: Timestamp, now: Timestamp) -> Timestamp {
        let mut cooldown = base;
        if self.is_trusted(now) {
            cooldown /= 2;
        }
        if self.karma >= 500 {
            cooldown /= 4;
        } else if self.karma >= 100 {
            cooldown /= 2;
        }
        cooldown.max(MIN_COMMENT_COOLDOWN)
    }
}
