//! Agora identity ledger
//!
//! Wallet-to-profile registry with karma accounting. Everything above this
//! crate gates on it: posting, commenting, voting, reporting and proposing
//! all start with a profile lookup here.
//!
//! # Key rules
//!
//! 1. **Registration is once and immutable**: a wallet registers a unique
//!    username exactly once; neither side of the pair ever changes.
//! 2. **Positive karma is capped per day**: gains beyond the daily headroom
//!    are clamped, never rejected. Negative deltas are never capped.
//! 3. **Auto-ban is one-way**: karma at or below the ban threshold flips
//!    `is_banned`, and only an administrative override flips it back.
//! 4. **Cooldowns shrink with reputation**: trusted accounts and high-karma
//!    tiers divide the community's base cooldown, with a hard floor.

pub mod ledger;
pub mod profile;

pub use ledger::IdentityLedger;
pub use profile::UserProfile;
