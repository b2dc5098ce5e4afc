//! Complete ledger state

use serde::{Deserialize, Serialize};

use lib_community::CommunityRegistry;
use lib_content::ContentStore;
use lib_governance::GovernanceEngine;
use lib_identity::IdentityLedger;
use lib_moderation::ModerationEngine;
use lib_types::{Amount, Event};
use lib_voting::StakeVotingEngine;

/// Every component's state, cloned wholesale per transition
///
/// Cross-component references are integer IDs and wallet addresses only,
/// so a plain field-by-field clone is a consistent snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerState {
    /// Identity ledger (profiles, karma, bans)
    pub identity: IdentityLedger,
    /// Community registry (membership, moderators, treasuries)
    pub communities: CommunityRegistry,
    /// Content store (posts, comments, statuses)
    pub content: ContentStore,
    /// Stake voting engine (votes, locks, slashes)
    pub voting: StakeVotingEngine,
    /// Moderation engine (reports, action log)
    pub moderation: ModerationEngine,
    /// Governance engine (proposals)
    pub governance: GovernanceEngine,
    /// Protocol-level treasury, fed by community-creation fees
    pub protocol_treasury: Amount,
}

/// What a snapshot file contains: state plus the full event history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Component state
    pub state: LedgerState,
    /// Append-only event history up to the snapshot point
    pub history: Vec<Event>,
}
