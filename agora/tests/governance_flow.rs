//! End-to-end governance lifecycles against the full ledger

use agora::Ledger;
use lib_community::CommunityRules;
use lib_governance::{ProposalPayload, ProposalState};
use lib_types::constants::{
    COMMUNITY_CREATION_COST, CRITICAL_TIMELOCK, CRITICAL_VOTING_PERIOD, EXECUTION_WINDOW,
    ONE_TOKEN, STANDARD_TIMELOCK, STANDARD_VOTING_PERIOD,
};
use lib_types::{CommunityId, LedgerError, Timestamp, Wallet};

const T0: Timestamp = 1_700_000_000;

fn wallet(n: u16) -> Wallet {
    let mut bytes = [0u8; 32];
    bytes[0] = (n >> 8) as u8;
    bytes[1] = n as u8;
    Wallet(bytes)
}

/// A community of `n` members. Member 1 founds it (and has proposal-grade
/// karma); members 2..=n join with their initial karma of 1, so each casts
/// governance votes with weight 1.
fn community_of(n: u16) -> (Ledger, CommunityId) {
    let mut ledger = Ledger::new();
    ledger.register(wallet(1), "founder", T0).unwrap();
    ledger.admin_update_karma(wallet(1), 150, T0).unwrap();
    let community = ledger
        .create_community(
            wallet(1),
            "agora",
            "general assembly",
            CommunityRules::default(),
            COMMUNITY_CREATION_COST,
            T0,
        )
        .unwrap()
        .value;
    for i in 2..=n {
        ledger
            .register(wallet(i), &format!("user{i}"), T0)
            .unwrap();
        ledger.join_community(wallet(i), community).unwrap();
    }
    (ledger, community)
}

#[test]
fn test_proposal_below_quorum_is_defeated() {
    let (mut ledger, community) = community_of(100);
    let proposal = ledger
        .create_proposal(
            wallet(1),
            community,
            ProposalPayload::ConfigChange {
                description: "new description".into(),
            },
            T0,
        )
        .unwrap()
        .value;

    // 9 of the 10 required weight units participate
    for i in 2..=9 {
        ledger.cast_proposal_vote(wallet(i), proposal, true, T0 + 1).unwrap();
    }
    ledger.cast_proposal_vote(wallet(10), proposal, false, T0 + 1).unwrap();

    let after_end = T0 + STANDARD_VOTING_PERIOD;
    assert_eq!(
        ledger.proposal_state(proposal, after_end).unwrap(),
        ProposalState::Defeated
    );
    let err = ledger
        .execute_proposal(proposal, after_end + STANDARD_TIMELOCK)
        .unwrap_err();
    assert!(matches!(err, LedgerError::ProposalNotExecutable { .. }));
}

#[test]
fn test_narrow_majority_succeeds_and_executes_after_timelock() {
    let (mut ledger, community) = community_of(100);
    let proposal = ledger
        .create_proposal(
            wallet(1),
            community,
            ProposalPayload::ConfigChange {
                description: "updated charter".into(),
            },
            T0,
        )
        .unwrap()
        .value;

    // 6 for, 5 against: quorum met, 54% > the 50% threshold
    for i in 2..=7 {
        ledger.cast_proposal_vote(wallet(i), proposal, true, T0 + 1).unwrap();
    }
    for i in 8..=12 {
        ledger.cast_proposal_vote(wallet(i), proposal, false, T0 + 1).unwrap();
    }

    let end = T0 + STANDARD_VOTING_PERIOD;
    assert_eq!(
        ledger.proposal_state(proposal, end).unwrap(),
        ProposalState::Succeeded
    );

    // voting closed, timelock still running
    let err = ledger.execute_proposal(proposal, end).unwrap_err();
    assert!(matches!(err, LedgerError::TimelockActive { .. }));

    let execution_time = end + STANDARD_TIMELOCK;
    ledger.execute_proposal(proposal, execution_time).unwrap();
    assert_eq!(
        ledger.community(community).unwrap().description,
        "updated charter"
    );
    assert_eq!(
        ledger.proposal_state(proposal, execution_time).unwrap(),
        ProposalState::Executed
    );

    let err = ledger
        .execute_proposal(proposal, execution_time + 1)
        .unwrap_err();
    assert!(matches!(err, LedgerError::ProposalAlreadyExecuted(_)));
}

#[test]
fn test_unexecuted_proposal_expires_after_window() {
    let (mut ledger, community) = community_of(100);
    let proposal = ledger
        .create_proposal(
            wallet(1),
            community,
            ProposalPayload::ConfigChange {
                description: "never applied".into(),
            },
            T0,
        )
        .unwrap()
        .value;
    for i in 2..=12 {
        ledger.cast_proposal_vote(wallet(i), proposal, true, T0 + 1).unwrap();
    }

    let execution_time = T0 + STANDARD_VOTING_PERIOD + STANDARD_TIMELOCK;
    assert_eq!(
        ledger
            .proposal_state(proposal, execution_time + EXECUTION_WINDOW)
            .unwrap(),
        ProposalState::Succeeded
    );
    let expired_at = execution_time + EXECUTION_WINDOW + 1;
    assert_eq!(
        ledger.proposal_state(proposal, expired_at).unwrap(),
        ProposalState::Expired
    );
    let err = ledger.execute_proposal(proposal, expired_at).unwrap_err();
    assert!(matches!(err, LedgerError::ProposalNotExecutable { .. }));
}

#[test]
fn test_moderator_election_records_vote_count() {
    let (mut ledger, community) = community_of(100);
    let proposal = ledger
        .create_proposal(
            wallet(1),
            community,
            ProposalPayload::ModeratorElection { wallet: wallet(2) },
            T0,
        )
        .unwrap()
        .value;
    for i in 3..=13 {
        ledger.cast_proposal_vote(wallet(i), proposal, true, T0 + 1).unwrap();
    }

    let execution_time = T0 + STANDARD_VOTING_PERIOD + STANDARD_TIMELOCK;
    ledger.execute_proposal(proposal, execution_time).unwrap();

    let community = ledger.community(community).unwrap();
    assert!(community.is_moderator(wallet(2)));
    assert_eq!(community.moderators[&wallet(2)].votes_received, 11);
}

#[test]
fn test_failed_treasury_dispatch_aborts_atomically() {
    let (mut ledger, community) = community_of(100);
    // asks for more than the community treasury holds
    let proposal = ledger
        .create_proposal(
            wallet(1),
            community,
            ProposalPayload::TreasurySpend {
                recipient: wallet(2),
                amount: ONE_TOKEN,
            },
            T0,
        )
        .unwrap()
        .value;
    // critical classification: 20% quorum, 66% threshold
    for i in 2..=26 {
        ledger.cast_proposal_vote(wallet(i), proposal, true, T0 + 1).unwrap();
    }

    let execution_time = T0 + CRITICAL_VOTING_PERIOD + CRITICAL_TIMELOCK;
    assert_eq!(
        ledger.proposal_state(proposal, execution_time).unwrap(),
        ProposalState::Succeeded
    );

    let history_before = ledger.history().len();
    let state_before = serde_json::to_value(ledger.state()).unwrap();

    let err = ledger.execute_proposal(proposal, execution_time).unwrap_err();
    assert!(matches!(err, LedgerError::TreasuryUnderfunded { .. }));

    // nothing committed: no events, no state change, flag still unset
    assert_eq!(ledger.history().len(), history_before);
    assert_eq!(serde_json::to_value(ledger.state()).unwrap(), state_before);
    assert!(!ledger.proposal(proposal).unwrap().executed);
    assert_eq!(
        ledger.proposal_state(proposal, execution_time).unwrap(),
        ProposalState::Succeeded
    );
}
