//! Agora content store
//!
//! Posts and threaded comments. Content is never deleted: moderation moves
//! it between `Visible`, `Hidden` and `Flagged` and every record stays
//! addressable forever. Scores are mutated only by the voting engine and
//! status only by the moderation engine, both via capability-gated entry
//! points; authors have no direct write access after creation.

pub mod content;
pub mod store;

pub use content::{Comment, ContentMeta, ContentStatus, Post, PostKind};
pub use store::ContentStore;
