//! Governance engine operations

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use lib_community::CommunityRegistry;
use lib_identity::IdentityLedger;
use lib_types::constants::MIN_KARMA_TO_PROPOSE;
use lib_types::{
    Event, EventLog, LedgerError, LedgerResult, ProposalId, SystemCap, Timestamp, Wallet,
};

use crate::proposal::{
    proposal_state, voting_weight, Proposal, ProposalPayload, ProposalState, VoteReceipt,
};

/// Proposal store and lifecycle driver
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GovernanceEngine {
    proposals: HashMap<ProposalId, Proposal>,
    next_id: ProposalId,
}

impl GovernanceEngine {
    /// Create an empty engine
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------ reads

    /// Look up a proposal
    pub fn proposal(&self, id: ProposalId) -> LedgerResult<&Proposal> {
        self.proposals
            .get(&id)
            .ok_or(LedgerError::ProposalNotFound(id))
    }

    /// Computed lifecycle state of a proposal at `now`
    pub fn state(
        &self,
        communities: &CommunityRegistry,
        id: ProposalId,
        now: Timestamp,
    ) -> LedgerResult<ProposalState> {
        let proposal = self.proposal(id)?;
        let member_count = communities.member_count(proposal.community_id)?;
        Ok(proposal_state(proposal, now, member_count))
    }

    // --------------------------------------------------------------- creation

    /// Create a proposal. The proposer must be a registered, unbanned
    /// member of the community with at least [`MIN_KARMA_TO_PROPOSE`] karma.
    /// Voting period, timelock and quorum come from the payload's
    /// critical/standard classification.
    pub fn create_proposal(
        &mut self,
        identity: &IdentityLedger,
        communities: &CommunityRegistry,
        proposer: Wallet,
        payload: ProposalPayload,
        community_id: u64,
        now: Timestamp,
        events: &mut EventLog,
    ) -> LedgerResult<ProposalId> {
        let profile = identity.require_active(proposer)?;
        if profile.karma < MIN_KARMA_TO_PROPOSE {
            return Err(LedgerError::InsufficientKarma {
                required: MIN_KARMA_TO_PROPOSE,
                actual: profile.karma,
            });
        }
        let community = communities.community(community_id)?;
        if !community.is_member(proposer) {
            return Err(LedgerError::NotMember {
                wallet: proposer,
                community: community_id,
            });
        }

        let params = payload.proposal_type().params();
        let end_time = now + params.voting_period;
        self.next_id += 1;
        let id = self.next_id;
        self.proposals.insert(
            id,
            Proposal {
                id,
                community_id,
                proposer,
                payload,
                for_votes: 0,
                against_votes: 0,
                start_time: now,
                end_time,
                execution_time: end_time + params.timelock,
                executed: false,
                quorum_required: params.quorum_pct,
                voters: HashMap::new(),
            },
        );

        info!(proposal = id, community = community_id, %proposer, "proposal created");
        events.emit(Event::ProposalCreated {
            proposal: id,
            community: community_id,
            proposer,
        });
        Ok(id)
    }

    // ----------------------------------------------------------------- voting

    /// Cast a vote on an active proposal. One vote per wallet, no changing;
    /// weight is fixed from the voter's karma at cast time. Non-positive
    /// karma cannot vote.
    pub fn cast_vote(
        &mut self,
        identity: &IdentityLedger,
        proposal_id: ProposalId,
        voter: Wallet,
        support: bool,
        now: Timestamp,
        events: &mut EventLog,
    ) -> LedgerResult<u64> {
        let profile = identity.require_active(voter)?;
        let weight = voting_weight(profile.karma).ok_or(LedgerError::InsufficientVotingPower {
            karma: profile.karma,
        })?;

        let proposal = self
            .proposals
            .get_mut(&proposal_id)
            .ok_or(LedgerError::ProposalNotFound(proposal_id))?;
        if now >= proposal.end_time {
            return Err(LedgerError::VotingClosed {
                proposal: proposal_id,
                end_time: proposal.end_time,
            });
        }
        if proposal.voters.contains_key(&voter) {
            return Err(LedgerError::ProposalVoteExists {
                proposal: proposal_id,
                voter,
            });
        }

        proposal.voters.insert(voter, VoteReceipt { support, weight });
        if support {
            proposal.for_votes += weight;
        } else {
            proposal.against_votes += weight;
        }

        debug!(proposal = proposal_id, %voter, support, weight, "proposal vote cast");
        events.emit(Event::ProposalVoteCast {
            proposal: proposal_id,
            voter,
            support,
            weight,
        });
        Ok(weight)
    }

    // -------------------------------------------------------------- execution

    /// Execute a succeeded proposal once its timelock has elapsed.
    ///
    /// Dispatches the payload into the community registry first and flips
    /// `executed` only after the dispatch succeeds, so a failed dispatch
    /// can never leave the flag set. Callable by anyone; the state machine
    /// is the authorization.
    pub fn execute_proposal(
        &mut self,
        cap: &SystemCap,
        communities: &mut CommunityRegistry,
        proposal_id: ProposalId,
        now: Timestamp,
        events: &mut EventLog,
    ) -> LedgerResult<()> {
        let (community_id, payload, for_votes, execution_time) = {
            let proposal = self.proposal(proposal_id)?;
            let member_count = communities.member_count(proposal.community_id)?;
            match proposal_state(proposal, now, member_count) {
                ProposalState::Succeeded => {}
                ProposalState::Executed => {
                    return Err(LedgerError::ProposalAlreadyExecuted(proposal_id))
                }
                state => {
                    return Err(LedgerError::ProposalNotExecutable {
                        proposal: proposal_id,
                        state: state.to_string(),
                    })
                }
            }
            if now < proposal.execution_time {
                return Err(LedgerError::TimelockActive {
                    proposal: proposal_id,
                    execution_time: proposal.execution_time,
                });
            }
            (
                proposal.community_id,
                proposal.payload.clone(),
                proposal.for_votes,
                proposal.execution_time,
            )
        };

        match &payload {
            ProposalPayload::RuleChange { rules } => {
                communities.update_config(cap, community_id, *rules, events)?;
            }
            ProposalPayload::ModeratorElection { wallet } => {
                communities.add_moderator(cap, community_id, *wallet, for_votes, now, events)?;
            }
            ProposalPayload::ModeratorRemoval { wallet } => {
                communities.remove_moderator(cap, community_id, *wallet, events)?;
            }
            ProposalPayload::TreasurySpend { recipient, amount } => {
                communities.withdraw_treasury(cap, community_id, *recipient, *amount, events)?;
            }
            ProposalPayload::ConfigChange { description } => {
                communities.update_rules(cap, community_id, description, events)?;
            }
        }

        // Dispatch succeeded; the flag flip is infallible from here
        let proposal = self
            .proposals
            .get_mut(&proposal_id)
            .ok_or(LedgerError::ProposalNotFound(proposal_id))?;
        proposal.executed = true;

        info!(
            proposal = proposal_id,
            community = community_id,
            execution_time,
            "proposal executed"
        );
        events.emit(Event::ProposalExecuted {
            proposal: proposal_id,
            community: community_id,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lib_community::CommunityRules;
    use lib_types::constants::{
        COMMUNITY_CREATION_COST, STANDARD_TIMELOCK, STANDARD_VOTING_PERIOD,
    };
    use lib_types::events::KarmaReason;

    fn wallet(b: u8) -> Wallet {
        Wallet::new([b; 32])
    }

    struct Fixture {
        cap: SystemCap,
        identity: IdentityLedger,
        communities: CommunityRegistry,
        engine: GovernanceEngine,
        events: EventLog,
        community: u64,
    }

    // wallet(1): proposer with 150 karma; wallets 2..=4: members with 50 karma
    fn setup() -> Fixture {
        let cap = SystemCap::mint();
        let mut identity = IdentityLedger::new();
        let mut communities = CommunityRegistry::new();
        let mut events = EventLog::new();
        identity.register(wallet(1), "proposer", 0, &mut events).unwrap();
        identity
            .update_karma(&cap, wallet(1), 149, KarmaReason::Admin, 0, &mut events)
            .unwrap();
        let (community, _) = communities
            .create(
                &identity,
                wallet(1),
                "rustaceans",
                "",
                CommunityRules::default(),
                COMMUNITY_CREATION_COST,
                0,
                &mut events,
            )
            .unwrap();
        for b in 2..=4 {
            identity
                .register(wallet(b), &format!("member{b}"), 0, &mut events)
                .unwrap();
            identity
                .update_karma(&cap, wallet(b), 49, KarmaReason::Admin, 0, &mut events)
                .unwrap();
            communities
                .join(&identity, wallet(b), community, &mut events)
                .unwrap();
        }
        Fixture {
            cap,
            identity,
            communities,
            engine: GovernanceEngine::new(),
            events,
            community,
        }
    }

    fn config_change(fx: &mut Fixture, now: Timestamp) -> ProposalId {
        let community = fx.community;
        fx.engine
            .create_proposal(
                &fx.identity,
                &fx.communities,
                wallet(1),
                ProposalPayload::ConfigChange {
                    description: "be kind".to_string(),
                },
                community,
                now,
                &mut fx.events,
            )
            .unwrap()
    }

    #[test]
    fn test_create_requires_karma_and_membership() {
        let mut fx = setup();
        let err = fx
            .engine
            .create_proposal(
                &fx.identity,
                &fx.communities,
                wallet(2), // 50 karma
                ProposalPayload::ConfigChange {
                    description: "x".to_string(),
                },
                fx.community,
                1_000,
                &mut fx.events,
            )
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientKarma {
                required: MIN_KARMA_TO_PROPOSE,
                actual: 50
            }
        );

        // Enough karma but not a member
        fx.identity.register(wallet(9), "outsider", 0, &mut fx.events).unwrap();
        fx.identity
            .update_karma(&fx.cap, wallet(9), 200, KarmaReason::Admin, 0, &mut fx.events)
            .unwrap();
        let err = fx
            .engine
            .create_proposal(
                &fx.identity,
                &fx.communities,
                wallet(9),
                ProposalPayload::ConfigChange {
                    description: "x".to_string(),
                },
                fx.community,
                1_000,
                &mut fx.events,
            )
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotMember { .. }));
    }

    #[test]
    fn test_vote_weight_fixed_at_cast_time() {
        let mut fx = setup();
        let id = config_change(&mut fx, 1_000);
        // wallet(2) has 50 karma: weight 1
        let weight = fx
            .engine
            .cast_vote(&fx.identity, id, wallet(2), true, 1_500, &mut fx.events)
            .unwrap();
        assert_eq!(weight, 1);

        // Karma gained after casting does not reweigh the vote
        fx.identity
            .update_karma(&fx.cap, wallet(2), 450, KarmaReason::Admin, 1_600, &mut fx.events)
            .unwrap();
        assert_eq!(fx.engine.proposal(id).unwrap().for_votes, 1);
    }

    #[test]
    fn test_one_vote_per_wallet_first_wins() {
        let mut fx = setup();
        let id = config_change(&mut fx, 1_000);
        fx.engine
            .cast_vote(&fx.identity, id, wallet(2), true, 1_500, &mut fx.events)
            .unwrap();
        assert_eq!(
            fx.engine
                .cast_vote(&fx.identity, id, wallet(2), false, 1_600, &mut fx.events)
                .unwrap_err(),
            LedgerError::ProposalVoteExists {
                proposal: id,
                voter: wallet(2)
            }
        );
    }

    #[test]
    fn test_voting_closes_at_end_time() {
        let mut fx = setup();
        let id = config_change(&mut fx, 1_000);
        let end_time = 1_000 + STANDARD_VOTING_PERIOD;
        assert_eq!(
            fx.engine
                .cast_vote(&fx.identity, id, wallet(2), true, end_time, &mut fx.events)
                .unwrap_err(),
            LedgerError::VotingClosed {
                proposal: id,
                end_time
            }
        );
    }

    #[test]
    fn test_zero_karma_cannot_vote() {
        let mut fx = setup();
        let id = config_change(&mut fx, 1_000);
        fx.identity.register(wallet(8), "fresh", 0, &mut fx.events).unwrap();
        fx.identity
            .update_karma(&fx.cap, wallet(8), -1, KarmaReason::Admin, 0, &mut fx.events)
            .unwrap();
        assert_eq!(
            fx.engine
                .cast_vote(&fx.identity, id, wallet(8), true, 1_500, &mut fx.events)
                .unwrap_err(),
            LedgerError::InsufficientVotingPower { karma: 0 }
        );
    }

    #[test]
    fn test_execution_respects_timelock_and_dispatches() {
        let mut fx = setup();
        let id = config_change(&mut fx, 1_000);
        // All four members vote for (weights 2+1+1+1); quorum = 4 * 10% = 0 (floored)
        for b in 1..=4 {
            fx.engine
                .cast_vote(&fx.identity, id, wallet(b), true, 1_500, &mut fx.events)
                .unwrap();
        }
        let end_time = 1_000 + STANDARD_VOTING_PERIOD;
        let execution_time = end_time + STANDARD_TIMELOCK;

        // Succeeded but timelocked
        assert_eq!(
            fx.engine.state(&fx.communities, id, end_time).unwrap(),
            ProposalState::Succeeded
        );
        assert_eq!(
            fx.engine
                .execute_proposal(&fx.cap, &mut fx.communities, id, end_time, &mut fx.events)
                .unwrap_err(),
            LedgerError::TimelockActive {
                proposal: id,
                execution_time
            }
        );

        fx.engine
            .execute_proposal(&fx.cap, &mut fx.communities, id, execution_time, &mut fx.events)
            .unwrap();
        assert_eq!(
            fx.communities.community(fx.community).unwrap().description,
            "be kind"
        );
        assert_eq!(
            fx.engine.state(&fx.communities, id, execution_time).unwrap(),
            ProposalState::Executed
        );

        // Re-execution is a conflict
        assert_eq!(
            fx.engine
                .execute_proposal(
                    &fx.cap,
                    &mut fx.communities,
                    id,
                    execution_time + 1,
                    &mut fx.events
                )
                .unwrap_err(),
            LedgerError::ProposalAlreadyExecuted(id)
        );
    }

    #[test]
    fn test_defeated_proposal_not_executable() {
        let mut fx = setup();
        let id = config_change(&mut fx, 1_000);
        fx.engine
            .cast_vote(&fx.identity, id, wallet(2), false, 1_500, &mut fx.events)
            .unwrap();
        let end_time = 1_000 + STANDARD_VOTING_PERIOD;
        let err = fx
            .engine
            .execute_proposal(
                &fx.cap,
                &mut fx.communities,
                id,
                end_time + STANDARD_TIMELOCK,
                &mut fx.events,
            )
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::ProposalNotExecutable {
                proposal: id,
                state: "defeated".to_string()
            }
        );
    }

    #[test]
    fn test_moderator_election_dispatch_records_votes() {
        let mut fx = setup();
        let id = fx
            .engine
            .create_proposal(
                &fx.identity,
                &fx.communities,
                wallet(1),
                ProposalPayload::ModeratorElection { wallet: wallet(2) },
                fx.community,
                1_000,
                &mut fx.events,
            )
            .unwrap();
        for b in 1..=4 {
            fx.engine
                .cast_vote(&fx.identity, id, wallet(b), true, 1_500, &mut fx.events)
                .unwrap();
        }
        let execution_time = 1_000 + STANDARD_VOTING_PERIOD + STANDARD_TIMELOCK;
        fx.engine
            .execute_proposal(&fx.cap, &mut fx.communities, id, execution_time, &mut fx.events)
            .unwrap();
        let community = fx.communities.community(fx.community).unwrap();
        assert!(community.is_moderator(wallet(2)));
        // wallet(1) weight 2 (150 karma) + three weight-1 votes
        assert_eq!(community.moderators[&wallet(2)].votes_received, 5);
    }

    #[test]
    fn test_failed_dispatch_leaves_executed_unset() {
        let mut fx = setup();
        // Treasury spend bigger than the balance: dispatch must fail
        let balance = fx.communities.community(fx.community).unwrap().treasury_balance;
        let id = fx
            .engine
            .create_proposal(
                &fx.identity,
                &fx.communities,
                wallet(1),
                ProposalPayload::TreasurySpend {
                    recipient: wallet(2),
                    amount: balance + 1,
                },
                fx.community,
                1_000,
                &mut fx.events,
            )
            .unwrap();
        for b in 1..=4 {
            fx.engine
                .cast_vote(&fx.identity, id, wallet(b), true, 1_500, &mut fx.events)
                .unwrap();
        }
        let proposal = fx.engine.proposal(id).unwrap();
        let execution_time = proposal.execution_time;

        let err = fx
            .engine
            .execute_proposal(&fx.cap, &mut fx.communities, id, execution_time, &mut fx.events)
            .unwrap_err();
        assert!(matches!(err, LedgerError::TreasuryUnderfunded { .. }));
        assert!(!fx.engine.proposal(id).unwrap().executed);
        // Still succeeded, so a corrected follow-up could execute in time
        assert_eq!(
            fx.engine.state(&fx.communities, id, execution_time).unwrap(),
            ProposalState::Succeeded
        );
    }
}
