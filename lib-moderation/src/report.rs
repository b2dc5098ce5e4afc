//! Report and action-log records

use serde::{Deserialize, Serialize};

use lib_types::{ContentRef, Karma, ReportId, Timestamp, Wallet};

/// A user report against a content item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    /// Identifier (1-indexed)
    pub id: ReportId,
    /// Reported content
    pub content: ContentRef,
    /// Reporting wallet; never the content's author
    pub reporter: Wallet,
    /// Free-form reason
    pub reason: String,
    /// When the report was filed
    pub timestamp: Timestamp,
    /// Resolution is terminal
    pub resolved: bool,
    /// Set on resolution
    pub upheld: bool,
}

/// How a moderator settles a report
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReportResolution {
    /// Hide the content and apply the karma transfers
    pub uphold: bool,
    /// If not upholding: penalize the reporter for a frivolous report
    pub frivolous: bool,
}

/// What a logged moderation action did
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    /// A report was upheld and the content hidden
    ReportUpheld { report: ReportId },
    /// A report was dismissed (optionally as frivolous)
    ReportDismissed { report: ReportId, frivolous: bool },
    /// Direct action without a report
    Direct { hidden: bool, karma_penalty: Karma },
    /// Content restored to visible
    Unhide,
    /// A voter's stake on this content was slashed
    StakeSlash { voter: Wallet },
}

/// One entry in a content item's immutable action log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModerationAction {
    /// Acting moderator
    pub moderator: Wallet,
    /// When it happened
    pub at: Timestamp,
    /// What happened
    pub kind: ActionKind,
}
