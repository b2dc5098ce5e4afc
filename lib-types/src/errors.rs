//! Ledger error taxonomy
//!
//! One shared error type for every subsystem. Each variant carries the
//! offending identifiers and values so a caller can correct and resubmit;
//! [`LedgerError::kind`] collapses the variants onto the seven kinds clients
//! branch on.

use thiserror::Error;

use crate::primitives::{
    Amount, CommunityId, ContentRef, Karma, ProposalId, ReportId, Timestamp, Wallet,
};

/// Coarse classification of a [`LedgerError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown entity ID
    NotFound,
    /// Caller lacks a required role
    Unauthorized,
    /// Karma / ban / cooldown / membership gate failed
    PermissionDenied,
    /// Duplicate entity or conflicting terminal state
    Conflict,
    /// Malformed or out-of-bounds input
    InvalidInput,
    /// A time-based precondition is not (or no longer) satisfied
    TimingViolation,
    /// Stake, payment or treasury balance below the required amount
    InsufficientValue,
}

/// Error returned by every fallible ledger operation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    // ------------------------------------------------------------------ NotFound
    #[error("no profile registered for wallet {0}")]
    UserNotFound(Wallet),

    #[error("community {0} does not exist")]
    CommunityNotFound(CommunityId),

    #[error("post {0} does not exist")]
    PostNotFound(u64),

    #[error("comment {0} does not exist")]
    CommentNotFound(u64),

    #[error("parent comment {parent} does not belong to post {post}")]
    ParentNotInPost { parent: u64, post: u64 },

    #[error("no vote by {voter} on {content}")]
    VoteNotFound { content: ContentRef, voter: Wallet },

    #[error("report {0} does not exist")]
    ReportNotFound(ReportId),

    #[error("proposal {0} does not exist")]
    ProposalNotFound(ProposalId),

    // -------------------------------------------------------------- Unauthorized
    #[error("{wallet} is not an active moderator of community {community}")]
    NotModerator {
        wallet: Wallet,
        community: CommunityId,
    },

    // ---------------------------------------------------------- PermissionDenied
    #[error("wallet {0} is banned")]
    Banned(Wallet),

    #[error("karma {actual} below required {required}")]
    InsufficientKarma { required: Karma, actual: Karma },

    #[error("{wallet} is not a member of community {community}")]
    NotMember {
        wallet: Wallet,
        community: CommunityId,
    },

    #[error("community {0} is not active")]
    CommunityInactive(CommunityId),

    #[error("cooldown active: {remaining}s remaining")]
    CooldownActive { remaining: Timestamp },

    #[error("cannot act on own content {0}")]
    SelfAction(ContentRef),

    #[error("{0} is not visible")]
    ContentNotVisible(ContentRef),

    #[error("proposal vote requires positive karma, wallet has {karma}")]
    InsufficientVotingPower { karma: Karma },

    // ------------------------------------------------------------------ Conflict
    #[error("wallet {0} is already registered")]
    AlreadyRegistered(Wallet),

    #[error("username {0:?} is already taken")]
    UsernameTaken(String),

    #[error("community name {0:?} is already taken")]
    CommunityNameTaken(String),

    #[error("{voter} already cast this vote on {content}")]
    AlreadyVoted { content: ContentRef, voter: Wallet },

    #[error("stake for vote by {voter} on {content} was already withdrawn")]
    StakeAlreadyWithdrawn { content: ContentRef, voter: Wallet },

    #[error("stake for vote by {voter} on {content} was slashed")]
    StakeSlashed { content: ContentRef, voter: Wallet },

    #[error("{reporter} already reported {content}")]
    DuplicateReport {
        content: ContentRef,
        reporter: Wallet,
    },

    #[error("report {0} is already resolved")]
    ReportAlreadyResolved(ReportId),

    #[error("{wallet} is already an active moderator of community {community}")]
    ModeratorExists {
        wallet: Wallet,
        community: CommunityId,
    },

    #[error("community {0} already has the maximum number of moderators")]
    ModeratorCapReached(CommunityId),

    #[error("proposal {0} was already executed")]
    ProposalAlreadyExecuted(ProposalId),

    #[error("{voter} already voted on proposal {proposal}")]
    ProposalVoteExists { proposal: ProposalId, voter: Wallet },

    #[error("proposal {proposal} is not executable in state {state}")]
    ProposalNotExecutable { proposal: ProposalId, state: String },

    // -------------------------------------------------------------- InvalidInput
    #[error("invalid username {0:?}")]
    InvalidUsername(String),

    #[error("zero address is not a valid actor")]
    ZeroAddress,

    #[error("{field} must not be empty")]
    EmptyField { field: &'static str },

    #[error("{field} exceeds {max} bytes (got {actual})")]
    FieldTooLong {
        field: &'static str,
        max: usize,
        actual: usize,
    },

    #[error("post kind {kind:?} is not valid for this operation")]
    InvalidPostKind { kind: String },

    // ---------------------------------------------------------- TimingViolation
    #[error("voting on proposal {proposal} closed at {end_time}")]
    VotingClosed {
        proposal: ProposalId,
        end_time: Timestamp,
    },

    #[error("timelock on proposal {proposal} active until {execution_time}")]
    TimelockActive {
        proposal: ProposalId,
        execution_time: Timestamp,
    },

    #[error("stake locked until {unlock_at} (now {now})")]
    StakeLocked { unlock_at: Timestamp, now: Timestamp },

    #[error("{content} is older than the maximum voting age ({age}s > {max}s)")]
    ContentTooOld {
        content: ContentRef,
        age: Timestamp,
        max: Timestamp,
    },

    #[error("report cooldown active until {next_allowed}")]
    ReportCooldown { next_allowed: Timestamp },

    // -------------------------------------------------------- InsufficientValue
    #[error("stake {provided} below required minimum {required}")]
    InsufficientStake { required: Amount, provided: Amount },

    #[error("payment {provided} below required {required}")]
    InsufficientPayment { required: Amount, provided: Amount },

    #[error("treasury of community {community} holds {available}, requested {requested}")]
    TreasuryUnderfunded {
        community: CommunityId,
        requested: Amount,
        available: Amount,
    },
}

impl LedgerError {
    /// The taxonomy kind of this error
    pub fn kind(&self) -> ErrorKind {
        use LedgerError::*;
        match self {
            UserNotFound(_) | CommunityNotFound(_) | PostNotFound(_) | CommentNotFound(_)
            | ParentNotInPost { .. } | VoteNotFound { .. } | ReportNotFound(_)
            | ProposalNotFound(_) => ErrorKind::NotFound,

            NotModerator { .. } => ErrorKind::Unauthorized,

            Banned(_) | InsufficientKarma { .. } | NotMember { .. } | CommunityInactive(_)
            | CooldownActive { .. } | SelfAction(_) | ContentNotVisible(_)
            | InsufficientVotingPower { .. } => ErrorKind::PermissionDenied,

            AlreadyRegistered(_) | UsernameTaken(_) | CommunityNameTaken(_)
            | AlreadyVoted { .. } | StakeAlreadyWithdrawn { .. } | StakeSlashed { .. }
            | DuplicateReport { .. } | ReportAlreadyResolved(_) | ModeratorExists { .. }
            | ModeratorCapReached(_) | ProposalAlreadyExecuted(_)
            | ProposalVoteExists { .. } | ProposalNotExecutable { .. } => ErrorKind::Conflict,

            InvalidUsername(_) | ZeroAddress | EmptyField { .. } | FieldTooLong { .. }
            | InvalidPostKind { .. } => ErrorKind::InvalidInput,

            VotingClosed { .. } | TimelockActive { .. } | StakeLocked { .. }
            | ContentTooOld { .. } | ReportCooldown { .. } => ErrorKind::TimingViolation,

            InsufficientStake { .. } | InsufficientPayment { .. }
            | TreasuryUnderfunded { .. } => ErrorKind::InsufficientValue,
        }
    }
}

/// Result alias used across the ledger
pub type LedgerResult<T> = Result<T, LedgerError>;
