//! Protocol constants for the Agora ledger
//!
//! Every threshold, cooldown and economic parameter of the state machine
//! lives here so subsystems never disagree about a value. Time constants are
//! seconds; token constants are atomic units.

use crate::primitives::{Amount, Karma, Timestamp};

// ============================================================================
// TOKEN UNITS
// ============================================================================

/// Atomic units per token (9 decimals): 1 AGR = 1,000,000,000 units
pub const ONE_TOKEN: Amount = 1_000_000_000;

// ============================================================================
// IDENTITY / KARMA
// ============================================================================

/// Karma granted on registration
pub const INITIAL_KARMA: Karma = 1;

/// Maximum cumulative positive karma a wallet may gain per UTC day;
/// deltas beyond the remaining headroom are clamped, never rejected
pub const MAX_DAILY_KARMA_GAIN: Karma = 500;

/// Karma at or below which a wallet is automatically banned
pub const BAN_THRESHOLD: Karma = -100;

/// Account age after which cooldown trust kicks in (30 days)
pub const TRUSTED_ACCOUNT_AGE: Timestamp = 30 * 24 * 60 * 60;

/// Karma required (together with account age) for the trusted cooldown halving
pub const TRUSTED_KARMA: Karma = 100;

/// Hard floor for the post cooldown after all reductions
pub const MIN_POST_COOLDOWN: Timestamp = 30;

/// Hard floor for the comment cooldown after all reductions
pub const MIN_COMMENT_COOLDOWN: Timestamp = 5;

/// Seconds per UTC day bucket for the daily karma gain cap
pub const SECONDS_PER_DAY: Timestamp = 24 * 60 * 60;

/// Maximum username length in bytes
pub const MAX_USERNAME_LENGTH: usize = 32;

// ============================================================================
// COMMUNITIES
// ============================================================================

/// Payment required to create a community (0.1 AGR); split 50/50 between
/// the protocol treasury and the new community's treasury
pub const COMMUNITY_CREATION_COST: Amount = ONE_TOKEN / 10;

/// Maximum number of active moderators per community
pub const MAX_MODERATORS: usize = 20;

/// Maximum community name length in bytes
pub const MAX_COMMUNITY_NAME_LENGTH: usize = 64;

/// Maximum community description length in bytes
pub const MAX_COMMUNITY_DESCRIPTION_LENGTH: usize = 500;

// ============================================================================
// CONTENT
// ============================================================================

/// Maximum post title length in bytes
pub const MAX_TITLE_LENGTH: usize = 300;

/// Maximum post body length in bytes
pub const MAX_BODY_LENGTH: usize = 10_000;

/// Maximum comment length in bytes
pub const MAX_COMMENT_LENGTH: usize = 2_000;

/// Maximum content-address reference (CID) length in bytes
pub const MAX_MEDIA_REF_LENGTH: usize = 128;

/// Maximum MIME tag length in bytes
pub const MAX_MIME_TYPE_LENGTH: usize = 64;

// ============================================================================
// STAKE VOTING
// ============================================================================

/// Minimum stake to upvote (0.001 AGR)
pub const MIN_UPVOTE_STAKE: Amount = ONE_TOKEN / 1_000;

/// Minimum stake to downvote (0.002 AGR); negativity is costlier by design
pub const MIN_DOWNVOTE_STAKE: Amount = ONE_TOKEN / 500;

/// Period a vote's stake stays locked after casting (24 hours)
pub const STAKE_LOCK_PERIOD: Timestamp = 24 * 60 * 60;

/// Content older than this cannot be voted on (7 days)
pub const MAX_VOTING_AGE: Timestamp = 7 * 24 * 60 * 60;

/// Percentage of remaining stake removed on a slash
pub const STAKE_SLASH_PERCENTAGE: Amount = 10;

/// Author karma for an upvoted post
pub const KARMA_POST_UPVOTED: Karma = 10;

/// Author karma for a downvoted post
pub const KARMA_POST_DOWNVOTED: Karma = -5;

/// Author karma for an upvoted comment
pub const KARMA_COMMENT_UPVOTED: Karma = 5;

/// Author karma for a downvoted comment
pub const KARMA_COMMENT_DOWNVOTED: Karma = -2;

// ============================================================================
// MODERATION
// ============================================================================

/// Minimum interval between two reports from the same wallet (1 hour)
pub const REPORT_COOLDOWN: Timestamp = 60 * 60;

/// Report count at which content is auto-flagged for review
pub const REPORTS_FOR_AUTO_REVIEW: u32 = 5;

/// Karma removed from an author whose content is hidden
pub const KARMA_PENALTY_CONTENT_HIDDEN: Karma = 50;

/// Karma granted to a reporter whose report is upheld
pub const KARMA_BONUS_VALID_REPORT: Karma = 5;

/// Karma removed from a reporter whose report is marked frivolous
pub const KARMA_PENALTY_FRIVOLOUS_REPORT: Karma = 10;

/// Maximum report reason length in bytes
pub const MAX_REPORT_REASON_LENGTH: usize = 500;

// ============================================================================
// GOVERNANCE
// ============================================================================

/// Karma required to create a proposal
pub const MIN_KARMA_TO_PROPOSE: Karma = 100;

/// Approval threshold for critical proposal types (percent, strict)
pub const SUPERMAJORITY_PCT: u64 = 66;

/// Approval threshold for standard proposal types (percent, strict)
pub const MAJORITY_PCT: u64 = 50;

/// Window after the timelock during which a succeeded proposal is executable
pub const EXECUTION_WINDOW: Timestamp = 7 * 24 * 60 * 60;

/// Voting period for standard proposals (3 days)
pub const STANDARD_VOTING_PERIOD: Timestamp = 3 * 24 * 60 * 60;

/// Timelock between voting end and execution for standard proposals (1 day)
pub const STANDARD_TIMELOCK: Timestamp = 24 * 60 * 60;

/// Quorum for standard proposals (percent of community members)
pub const STANDARD_QUORUM_PCT: u64 = 10;

/// Voting period for critical proposals (7 days)
pub const CRITICAL_VOTING_PERIOD: Timestamp = 7 * 24 * 60 * 60;

/// Timelock between voting end and execution for critical proposals (2 days)
pub const CRITICAL_TIMELOCK: Timestamp = 2 * 24 * 60 * 60;

/// Quorum for critical proposals (percent of community members)
pub const CRITICAL_QUORUM_PCT: u64 = 20;
