//! The sequencer: one entry point per client operation, applied atomically

use std::fs;
use std::path::Path;

use anyhow::Context;
use tracing::info;

use lib_community::{Community, CommunityRules};
use lib_content::{Comment, Post, PostKind};
use lib_governance::{ProposalPayload, ProposalState};
use lib_moderation::{ModerationAction, Report, ReportResolution};
use lib_types::events::KarmaReason;
use lib_types::{
    Amount, CommentId, CommunityId, ContentRef, Event, EventLog, Karma, LedgerResult, PostId,
    ProposalId, ReportId, SystemCap, Timestamp, Wallet,
};
use lib_voting::{Vote, VoteTally, VoteType};

use crate::state::{LedgerState, Snapshot};

/// The result of a committed operation: its return value plus every event
/// the transition emitted, in emission order.
#[derive(Debug, Clone)]
pub struct Receipt<T> {
    pub value: T,
    pub events: Vec<Event>,
}

/// Owns the full state, the capability token and the event history.
///
/// Every mutating method runs as a snapshot-commit transition: the
/// operation executes against a clone of the state, and only a fully
/// successful run replaces the live state and appends to the history.
/// A failed operation leaves both untouched.
#[derive(Debug)]
pub struct Ledger {
    state: LedgerState,
    cap: SystemCap,
    history: Vec<Event>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Create an empty ledger. The capability token is minted here, once,
    /// and never leaves this struct.
    pub fn new() -> Self {
        Self {
            state: LedgerState::default(),
            cap: SystemCap::mint(),
            history: Vec::new(),
        }
    }

    fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            state: snapshot.state,
            cap: SystemCap::mint(),
            history: snapshot.history,
        }
    }

    /// Run `op` against a clone of the state; commit the clone and the
    /// emitted events only on success.
    fn transition<T>(
        &mut self,
        op: impl FnOnce(&mut LedgerState, &SystemCap, &mut EventLog) -> LedgerResult<T>,
    ) -> LedgerResult<Receipt<T>> {
        let mut next = self.state.clone();
        let mut events = EventLog::new();
        let value = op(&mut next, &self.cap, &mut events)?;
        self.state = next;
        let events = events.into_events();
        self.history.extend(events.iter().cloned());
        Ok(Receipt { value, events })
    }

    // --------------------------------------------------------------- identity

    /// Register a wallet under a username.
    pub fn register(
        &mut self,
        wallet: Wallet,
        username: &str,
        now: Timestamp,
    ) -> LedgerResult<Receipt<()>> {
        self.transition(|state, _cap, events| state.identity.register(wallet, username, now, events))
    }

    /// Administrative karma adjustment. Returns the delta actually applied
    /// after the daily gain clamp.
    pub fn admin_update_karma(
        &mut self,
        wallet: Wallet,
        delta: Karma,
        now: Timestamp,
    ) -> LedgerResult<Receipt<Karma>> {
        self.transition(|state, cap, events| {
            state
                .identity
                .update_karma(cap, wallet, delta, KarmaReason::Admin, now, events)
        })
    }

    /// Administrative ban override.
    pub fn admin_set_ban(&mut self, wallet: Wallet, banned: bool) -> LedgerResult<Receipt<()>> {
        self.transition(|state, cap, events| state.identity.admin_set_ban(cap, wallet, banned, events))
    }

    // ------------------------------------------------------------ communities

    /// Create a community. Half of the payment (rounded down) goes to the
    /// protocol treasury, the rest seeds the community treasury.
    #[allow(clippy::too_many_arguments)]
    pub fn create_community(
        &mut self,
        creator: Wallet,
        name: &str,
        description: &str,
        rules: CommunityRules,
        payment: Amount,
        now: Timestamp,
    ) -> LedgerResult<Receipt<CommunityId>> {
        self.transition(|state, _cap, events| {
            let (id, protocol_share) = state.communities.create(
                &state.identity,
                creator,
                name,
                description,
                rules,
                payment,
                now,
                events,
            )?;
            state.protocol_treasury = state.protocol_treasury.saturating_add(protocol_share);
            Ok(id)
        })
    }

    /// Join a community. Idempotent for existing members.
    pub fn join_community(&mut self, wallet: Wallet, id: CommunityId) -> LedgerResult<Receipt<()>> {
        self.transition(|state, _cap, events| {
            state.communities.join(&state.identity, wallet, id, events)
        })
    }

    /// Leave a community. Idempotent for non-members.
    pub fn leave_community(&mut self, wallet: Wallet, id: CommunityId) -> LedgerResult<Receipt<()>> {
        self.transition(|state, _cap, events| {
            state.communities.leave(&state.identity, wallet, id, events)
        })
    }

    /// Administratively activate or deactivate a community. Deactivated
    /// communities refuse new members, content and votes.
    pub fn admin_set_community_active(
        &mut self,
        id: CommunityId,
        active: bool,
    ) -> LedgerResult<Receipt<()>> {
        self.transition(|state, cap, events| state.communities.set_active(cap, id, active, events))
    }

    /// Deposit into a community treasury.
    pub fn deposit_treasury(
        &mut self,
        id: CommunityId,
        amount: Amount,
    ) -> LedgerResult<Receipt<()>> {
        self.transition(|state, _cap, events| state.communities.deposit_treasury(id, amount, events))
    }

    // ---------------------------------------------------------------- content

    /// Create a text post.
    pub fn create_text_post(
        &mut self,
        author: Wallet,
        community: CommunityId,
        title: &str,
        body: &str,
        now: Timestamp,
    ) -> LedgerResult<Receipt<PostId>> {
        self.transition(|state, cap, events| {
            state.content.create_text_post(
                cap,
                &mut state.identity,
                &state.communities,
                author,
                community,
                title,
                body,
                now,
                events,
            )
        })
    }

    /// Create a media or meme post.
    #[allow(clippy::too_many_arguments)]
    pub fn create_media_post(
        &mut self,
        author: Wallet,
        community: CommunityId,
        kind: PostKind,
        title: &str,
        media_ref: &str,
        mime_type: &str,
        now: Timestamp,
    ) -> LedgerResult<Receipt<PostId>> {
        self.transition(|state, cap, events| {
            state.content.create_media_post(
                cap,
                &mut state.identity,
                &state.communities,
                author,
                community,
                kind,
                title,
                media_ref,
                mime_type,
                now,
                events,
            )
        })
    }

    /// Comment under a post. `parent` is zero for a top-level comment.
    pub fn create_comment(
        &mut self,
        author: Wallet,
        post: PostId,
        parent: CommentId,
        content: &str,
        now: Timestamp,
    ) -> LedgerResult<Receipt<CommentId>> {
        self.transition(|state, cap, events| {
            state.content.create_comment(
                cap,
                &mut state.identity,
                &state.communities,
                author,
                post,
                parent,
                content,
                now,
                events,
            )
        })
    }

    // ----------------------------------------------------------------- voting

    /// Cast or change a stake-backed vote on a content item.
    pub fn vote(
        &mut self,
        voter: Wallet,
        content: ContentRef,
        vote_type: VoteType,
        stake: Amount,
        now: Timestamp,
    ) -> LedgerResult<Receipt<()>> {
        self.transition(|state, cap, events| {
            state.voting.vote(
                cap,
                &mut state.identity,
                &state.communities,
                &mut state.content,
                voter,
                content,
                vote_type,
                stake,
                now,
                events,
            )
        })
    }

    /// Reclaim a vote's stake once its lock has passed.
    pub fn withdraw_stake(
        &mut self,
        voter: Wallet,
        content: ContentRef,
        now: Timestamp,
    ) -> LedgerResult<Receipt<Amount>> {
        self.transition(|state, _cap, events| {
            state.voting.withdraw_stake(voter, content, now, events)
        })
    }

    /// Withdraw every eligible stake among `contents`, skipping the rest.
    /// Returns the total reclaimed and the refs actually withdrawn.
    pub fn batch_withdraw_stakes(
        &mut self,
        voter: Wallet,
        contents: &[ContentRef],
        now: Timestamp,
    ) -> LedgerResult<Receipt<(Amount, Vec<ContentRef>)>> {
        self.transition(|state, _cap, events| {
            Ok(state.voting.batch_withdraw_stakes(voter, contents, now, events))
        })
    }

    // ------------------------------------------------------------- moderation

    /// File a report against a content item.
    pub fn report_content(
        &mut self,
        reporter: Wallet,
        content: ContentRef,
        reason: &str,
        now: Timestamp,
    ) -> LedgerResult<Receipt<ReportId>> {
        self.transition(|state, cap, events| {
            state.moderation.report_content(
                cap,
                &state.identity,
                &mut state.content,
                reporter,
                content,
                reason,
                now,
                events,
            )
        })
    }

    /// Resolve a report as a moderator of the content's community.
    pub fn resolve_report(
        &mut self,
        moderator: Wallet,
        report: ReportId,
        resolution: ReportResolution,
        now: Timestamp,
    ) -> LedgerResult<Receipt<()>> {
        self.transition(|state, cap, events| {
            state.moderation.resolve_report(
                cap,
                &mut state.identity,
                &state.communities,
                &mut state.content,
                moderator,
                report,
                resolution,
                now,
                events,
            )
        })
    }

    /// Direct moderator action: hide and/or penalize without a report.
    pub fn moderator_action(
        &mut self,
        moderator: Wallet,
        content: ContentRef,
        hide: bool,
        karma_penalty: Karma,
        now: Timestamp,
    ) -> LedgerResult<Receipt<()>> {
        self.transition(|state, cap, events| {
            state.moderation.moderator_action(
                cap,
                &mut state.identity,
                &state.communities,
                &mut state.content,
                moderator,
                content,
                hide,
                karma_penalty,
                now,
                events,
            )
        })
    }

    /// Restore hidden or flagged content to visible.
    pub fn unhide_content(
        &mut self,
        moderator: Wallet,
        content: ContentRef,
        now: Timestamp,
    ) -> LedgerResult<Receipt<()>> {
        self.transition(|state, cap, events| {
            state.moderation.unhide_content(
                cap,
                &state.communities,
                &mut state.content,
                moderator,
                content,
                now,
                events,
            )
        })
    }

    /// Slash a voter's stake on a content item, moderator-authorized.
    pub fn slash_vote_stake(
        &mut self,
        moderator: Wallet,
        content: ContentRef,
        voter: Wallet,
        now: Timestamp,
    ) -> LedgerResult<Receipt<()>> {
        self.transition(|state, cap, events| {
            state.moderation.slash_vote_stake(
                cap,
                &state.communities,
                &state.content,
                &mut state.voting,
                moderator,
                content,
                voter,
                now,
                events,
            )
        })
    }

    // ------------------------------------------------------------- governance

    /// Create a governance proposal for a community.
    pub fn create_proposal(
        &mut self,
        proposer: Wallet,
        community: CommunityId,
        payload: ProposalPayload,
        now: Timestamp,
    ) -> LedgerResult<Receipt<ProposalId>> {
        self.transition(|state, _cap, events| {
            state.governance.create_proposal(
                &state.identity,
                &state.communities,
                proposer,
                payload,
                community,
                now,
                events,
            )
        })
    }

    /// Vote on a proposal. Returns the karma-derived weight applied.
    pub fn cast_proposal_vote(
        &mut self,
        voter: Wallet,
        proposal: ProposalId,
        support: bool,
        now: Timestamp,
    ) -> LedgerResult<Receipt<u64>> {
        self.transition(|state, _cap, events| {
            state
                .governance
                .cast_vote(&state.identity, proposal, voter, support, now, events)
        })
    }

    /// Execute a succeeded proposal once its timelock has elapsed.
    /// Callable by anyone.
    pub fn execute_proposal(
        &mut self,
        proposal: ProposalId,
        now: Timestamp,
    ) -> LedgerResult<Receipt<()>> {
        self.transition(|state, cap, events| {
            state
                .governance
                .execute_proposal(cap, &mut state.communities, proposal, now, events)
        })
    }

    // ------------------------------------------------------------------ reads

    /// Direct read access to the full state.
    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn profile(&self, wallet: Wallet) -> LedgerResult<&lib_identity::UserProfile> {
        self.state.identity.profile(wallet)
    }

    pub fn community(&self, id: CommunityId) -> LedgerResult<&Community> {
        self.state.communities.community(id)
    }

    pub fn post(&self, id: PostId) -> LedgerResult<&Post> {
        self.state.content.post(id)
    }

    pub fn comment(&self, id: CommentId) -> LedgerResult<&Comment> {
        self.state.content.comment(id)
    }

    pub fn vote_record(&self, content: ContentRef, voter: Wallet) -> Option<&Vote> {
        self.state.voting.vote_record(content, voter)
    }

    pub fn tally(&self, content: ContentRef) -> VoteTally {
        self.state.voting.tally(content)
    }

    pub fn slashed_pool(&self) -> Amount {
        self.state.voting.slashed_pool()
    }

    pub fn report(&self, id: ReportId) -> LedgerResult<&Report> {
        self.state.moderation.report(id)
    }

    pub fn action_log(&self, content: ContentRef) -> &[ModerationAction] {
        self.state.moderation.action_log(content)
    }

    pub fn proposal(&self, id: ProposalId) -> LedgerResult<&lib_governance::Proposal> {
        self.state.governance.proposal(id)
    }

    /// Computed lifecycle state of a proposal at `now`.
    pub fn proposal_state(&self, id: ProposalId, now: Timestamp) -> LedgerResult<ProposalState> {
        self.state.governance.state(&self.state.communities, id, now)
    }

    pub fn protocol_treasury(&self) -> Amount {
        self.state.protocol_treasury
    }

    /// The append-only event history of every committed operation.
    pub fn history(&self) -> &[Event] {
        &self.history
    }

    // -------------------------------------------------------------- snapshots

    /// Serialize the state and history to a JSON file.
    pub fn save_snapshot(&self, path: &Path) -> anyhow::Result<()> {
        let snapshot = Snapshot {
            state: self.state.clone(),
            history: self.history.clone(),
        };
        let json = serde_json::to_string_pretty(&snapshot)
            .context("failed to serialize ledger snapshot")?;
        fs::write(path, json)
            .with_context(|| format!("failed to write snapshot to {}", path.display()))?;
        info!(path = %path.display(), events = self.history.len(), "snapshot saved");
        Ok(())
    }

    /// Restore a ledger from a JSON snapshot file.
    pub fn load_snapshot(path: &Path) -> anyhow::Result<Self> {
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read snapshot from {}", path.display()))?;
        let snapshot: Snapshot =
            serde_json::from_str(&json).context("failed to parse ledger snapshot")?;
        info!(path = %path.display(), events = snapshot.history.len(), "snapshot loaded");
        Ok(Self::from_snapshot(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_types::constants::COMMUNITY_CREATION_COST;

    fn wallet(tag: u8) -> Wallet {
        Wallet([tag; 32])
    }

    fn ledger_with_user(tag: u8, name: &str) -> Ledger {
        let mut ledger = Ledger::new();
        ledger.register(wallet(tag), name, 1_000).unwrap();
        ledger
    }

    #[test]
    fn test_register_emits_and_appends_history() {
        let mut ledger = Ledger::new();
        let receipt = ledger.register(wallet(1), "alice", 100).unwrap();
        assert_eq!(receipt.events.len(), 1);
        assert_eq!(ledger.history().len(), 1);
        assert_eq!(ledger.profile(wallet(1)).unwrap().username, "alice");
    }

    #[test]
    fn test_failed_operation_leaves_state_and_history_untouched() {
        let mut ledger = ledger_with_user(1, "alice");
        let before = ledger.history().len();
        let err = ledger.register(wallet(1), "alice2", 200).unwrap_err();
        assert!(matches!(err, lib_types::LedgerError::AlreadyRegistered(_)));
        assert_eq!(ledger.history().len(), before);
        assert_eq!(ledger.profile(wallet(1)).unwrap().username, "alice");
    }

    #[test]
    fn test_create_community_credits_protocol_treasury() {
        let mut ledger = ledger_with_user(1, "alice");
        let receipt = ledger
            .create_community(
                wallet(1),
                "rust",
                "systems talk",
                CommunityRules::default(),
                COMMUNITY_CREATION_COST,
                2_000,
            )
            .unwrap();
        assert_eq!(receipt.value, 1);
        assert_eq!(ledger.protocol_treasury(), COMMUNITY_CREATION_COST / 2);
        let community = ledger.community(1).unwrap();
        assert_eq!(
            community.treasury_balance,
            COMMUNITY_CREATION_COST - COMMUNITY_CREATION_COST / 2
        );
    }
}
