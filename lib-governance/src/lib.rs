//! Agora governance engine
//!
//! Community proposals with karma-weighted voting, quorum and
//! supermajority thresholds, a timelock between success and execution, and
//! an execution window after which an unexecuted proposal expires.
//!
//! # Key principles
//!
//! 1. **State is computed, never stored**: a proposal's lifecycle state is
//!    a pure function of time, tallies and the `executed` flag. Nothing
//!    caches it, so nothing can drift.
//! 2. **Payload is type**: the dispatch payload enum doubles as the
//!    proposal type, so a payload/type mismatch is unrepresentable.
//! 3. **Critical proposals pay more**: moderator removal and treasury
//!    spending get longer voting, a longer timelock, a higher quorum and a
//!    supermajority threshold.
//! 4. **Vote weight is fixed at cast time** from the voter's karma curve;
//!    later karma changes don't reweigh past votes.

pub mod engine;
pub mod proposal;

pub use engine::GovernanceEngine;
pub use proposal::{
    proposal_state, voting_weight, Proposal, ProposalParams, ProposalPayload, ProposalState,
    ProposalType, VoteReceipt,
};
