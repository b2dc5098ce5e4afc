//! Agora stake voting engine
//!
//! Votes are economically bonded: casting one locks stake for a fixed
//! period, and moderation can slash part of it. Upvotes and downvotes move
//! the content score by one and the author's karma by a per-kind constant;
//! changing a vote reverses the old effect and applies the new one in a
//! single step. Downvotes require double the stake of upvotes.

pub mod engine;
pub mod vote;

pub use engine::StakeVotingEngine;
pub use vote::{Vote, VoteTally, VoteType};
