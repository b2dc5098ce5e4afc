//! Agora ledger node
//!
//! The sequencer: owns every subsystem, wires their dependencies at
//! construction and processes one state-transition request to completion
//! before the next. Each mutating operation runs against a clone of the
//! component state and commits only on success, so any failure aborts with
//! zero observable effects; there is no partial apply anywhere.
//!
//! Time never comes from the wall clock: every operation takes the
//! sequencer's observed timestamp, and all waits (cooldowns, locks,
//! timelocks) are plain timestamp comparisons.
//!
//! Persistence is a JSON snapshot of the full component state plus the
//! event history; how snapshots are stored durably is the embedder's
//! concern.

pub mod ledger;
pub mod state;

pub use ledger::{Ledger, Receipt};
pub use state::LedgerState;
