//! Agora moderation engine
//!
//! Reporting with rate limits, auto-flagging at a report threshold,
//! moderator resolutions with karma consequences, direct moderator action
//! for urgent cases, and stake slashing. Every moderator decision lands in
//! a per-content append-only action log that is never edited.

pub mod engine;
pub mod report;

pub use engine::ModerationEngine;
pub use report::{ActionKind, ModerationAction, Report, ReportResolution};
