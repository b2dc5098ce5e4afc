//! Agora community registry
//!
//! Communities own their membership, moderator set, rule thresholds and a
//! treasury. Creation is paid (the fee is split between the protocol and the
//! new community's treasury); configuration changes after creation only
//! arrive through governance dispatch, never directly from clients.

pub mod community;
pub mod registry;

pub use community::{Community, CommunityRules, ModeratorInfo};
pub use registry::CommunityRegistry;
