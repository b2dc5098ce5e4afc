//! Shared types for the Agora ledger
//!
//! This crate is the foundation every subsystem builds on: fixed-size
//! identifiers, protocol constants, the error taxonomy returned to clients,
//! the append-only event log, and the capability token gating privileged
//! cross-component calls.

pub mod caps;
pub mod constants;
pub mod errors;
pub mod events;
pub mod primitives;

pub use caps::SystemCap;
pub use errors::{ErrorKind, LedgerError, LedgerResult};
pub use events::{Event, EventLog};
pub use primitives::{
    Amount, CommentId, CommunityId, ContentRef, Karma, PostId, ProposalId, ReportId, Timestamp,
    Wallet,
};
