use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events},
    vec, Address, Env, IntoVal, String, TryIntoVal, Val, Vec,
};

use crate::events::{
    GrantCancelled, GrantCreated, GranteeAssigned, MilestoneDetailsSet, MilestoneFinalized,
    MilestoneSubmitted, ReputationSet, StakeChanged, VoteCast, VotingOpened,
};
use crate::test::{setup, LOCK, START, VOTING_PERIOD};
use crate::{Outcome, VoteChoice};

/// Events published by `contract`, oldest first.
fn contract_events(env: &Env, contract: &Address) -> std::vec::Vec<(Vec<Val>, Val)> {
    env.events()
        .all()
        .iter()
        .filter(|event| event.0 == *contract)
        .map(|event| (event.1, event.2))
        .collect()
}

#[test]
fn test_grant_created_event() {
    let t = setup();
    let funder = Address::generate(&t.env);
    let grant_id = t.create_grant(&funder, 30, 3);

    let all_events = t.env.events().all();
    let last_event = all_events.last().expect("No events found");

    // Topic: (symbol_short!("created"), grant_id)
    assert_eq!(last_event.0, t.client.address);
    let expected_topics = vec![
        &t.env,
        symbol_short!("created").into_val(&t.env),
        grant_id.into_val(&t.env),
    ];
    assert_eq!(last_event.1, expected_topics);

    let event_data: GrantCreated = last_event.2.try_into_val(&t.env).unwrap();
    assert_eq!(
        event_data,
        GrantCreated {
            grant_id,
            funder,
            title: String::from_str(&t.env, "Open-source indexer"),
            total_amount: 30,
            milestone_count: 3,
            proof_anchor: t.anchor(0x11),
        }
    );
}

#[test]
fn test_grantee_assigned_event() {
    let t = setup();
    let (grant_id, _, grantee) = t.assigned_grant(30, 3);

    let all_events = t.env.events().all();
    let last_event = all_events.last().expect("No events found");

    let expected_topics = vec![
        &t.env,
        symbol_short!("assigned").into_val(&t.env),
        grant_id.into_val(&t.env),
    ];
    assert_eq!(last_event.1, expected_topics);

    let event_data: GranteeAssigned = last_event.2.try_into_val(&t.env).unwrap();
    assert_eq!(event_data, GranteeAssigned { grant_id, grantee });
}

#[test]
fn test_milestone_details_event() {
    let t = setup();
    let funder = Address::generate(&t.env);
    let grant_id = t.create_grant(&funder, 30, 3);
    let title = String::from_str(&t.env, "Indexer alpha");

    t.client.set_milestone_details(
        &funder,
        &grant_id,
        &2,
        &title,
        &String::from_str(&t.env, "Backfill"),
    );

    let all_events = t.env.events().all();
    let last_event = all_events.last().expect("No events found");
    let expected_topics = vec![
        &t.env,
        symbol_short!("details").into_val(&t.env),
        grant_id.into_val(&t.env),
    ];
    assert_eq!(last_event.1, expected_topics);
    let event_data: MilestoneDetailsSet = last_event.2.try_into_val(&t.env).unwrap();
    assert_eq!(
        event_data,
        MilestoneDetailsSet {
            grant_id,
            milestone_index: 2,
            title,
        }
    );
}

#[test]
fn test_submission_emits_submitted_then_voting() {
    let t = setup();
    let (grant_id, _, grantee) = t.assigned_grant(30, 3);

    let session_id = t.submit(grant_id, &grantee, 2);

    let events = contract_events(&t.env, &t.client.address);
    let n = events.len();
    assert!(n >= 2);

    let (topics, data) = events[n - 2].clone();
    assert_eq!(
        topics,
        vec![
            &t.env,
            symbol_short!("submitted").into_val(&t.env),
            grant_id.into_val(&t.env),
        ]
    );
    let submitted: MilestoneSubmitted = data.try_into_val(&t.env).unwrap();
    assert_eq!(
        submitted,
        MilestoneSubmitted {
            grant_id,
            milestone_index: 2,
            proof_anchor: t.anchor(0xa2),
        }
    );

    let (topics, data) = events[n - 1].clone();
    assert_eq!(
        topics,
        vec![
            &t.env,
            symbol_short!("voting").into_val(&t.env),
            grant_id.into_val(&t.env),
        ]
    );
    let opened: VotingOpened = data.try_into_val(&t.env).unwrap();
    assert_eq!(
        opened,
        VotingOpened {
            grant_id,
            milestone_index: 2,
            session_id,
            end_time: START + VOTING_PERIOD,
        }
    );
}

#[test]
fn test_vote_cast_event() {
    let t = setup();
    let (grant_id, _, grantee) = t.assigned_grant(30, 3);
    let session_id = t.submit(grant_id, &grantee, 0);
    let voter = t.staked_voter(7);

    t.client.cast_vote(
        &voter,
        &session_id,
        &VoteChoice::Reject,
        &Some(String::from_str(&t.env, "proof link is dead")),
    );

    let all_events = t.env.events().all();
    let last_event = all_events.last().expect("No events found");

    let expected_topics = vec![
        &t.env,
        symbol_short!("vote_cast").into_val(&t.env),
        session_id.into_val(&t.env),
    ];
    assert_eq!(last_event.1, expected_topics);

    let event_data: VoteCast = last_event.2.try_into_val(&t.env).unwrap();
    assert_eq!(
        event_data,
        VoteCast {
            session_id,
            voter,
            choice: VoteChoice::Reject,
            weight: 7,
        }
    );
}

#[test]
fn test_milestone_finalized_event_reports_release() {
    let t = setup();
    let (grant_id, _, grantee) = t.assigned_grant(30, 3);

    t.approve_milestone(grant_id, &grantee, 1);

    let all_events = t.env.events().all();
    let last_event = all_events.last().expect("No events found");

    assert_eq!(last_event.0, t.client.address);
    let expected_topics = vec![
        &t.env,
        symbol_short!("finalized").into_val(&t.env),
        grant_id.into_val(&t.env),
    ];
    assert_eq!(last_event.1, expected_topics);

    let event_data: MilestoneFinalized = last_event.2.try_into_val(&t.env).unwrap();
    assert_eq!(
        event_data,
        MilestoneFinalized {
            grant_id,
            milestone_index: 1,
            outcome: Outcome::Approved,
            amount_released: 10,
        }
    );
}

#[test]
fn test_inconclusive_finalization_releases_nothing() {
    let t = setup();
    let (grant_id, _, grantee) = t.assigned_grant(30, 3);
    t.submit(grant_id, &grantee, 0);
    t.close_window();

    t.client.finalize_milestone(&grant_id, &0);

    let events = contract_events(&t.env, &t.client.address);
    let (topics, data) = events.last().cloned().expect("No events found");
    assert_eq!(
        topics,
        vec![
            &t.env,
            symbol_short!("finalized").into_val(&t.env),
            grant_id.into_val(&t.env),
        ]
    );
    let event_data: MilestoneFinalized = data.try_into_val(&t.env).unwrap();
    assert_eq!(event_data.outcome, Outcome::Inconclusive);
    assert_eq!(event_data.amount_released, 0);
}

#[test]
fn test_grant_cancelled_event() {
    let t = setup();
    let funder = Address::generate(&t.env);
    let grant_id = t.create_grant(&funder, 30, 3);

    t.client.cancel_grant(&funder, &grant_id);

    let all_events = t.env.events().all();
    let last_event = all_events.last().expect("No events found");

    let expected_topics = vec![
        &t.env,
        symbol_short!("cancelled").into_val(&t.env),
        grant_id.into_val(&t.env),
    ];
    assert_eq!(last_event.1, expected_topics);

    let event_data: GrantCancelled = last_event.2.try_into_val(&t.env).unwrap();
    assert_eq!(
        event_data,
        GrantCancelled {
            grant_id,
            funder,
            refunded: 30,
        }
    );
}

#[test]
fn test_stake_and_unstake_events() {
    let t = setup();
    let staker = Address::generate(&t.env);
    t.mint(&t.governance, &staker, 100);

    t.client.stake(&staker, &60);
    let all_events = t.env.events().all();
    let last_event = all_events.last().expect("No events found");
    let expected_topics = vec![&t.env, symbol_short!("staked").into_val(&t.env)];
    assert_eq!(last_event.1, expected_topics);
    let event_data: StakeChanged = last_event.2.try_into_val(&t.env).unwrap();
    assert_eq!(
        event_data,
        StakeChanged {
            staker: staker.clone(),
            amount: 60,
            total_staked: 60,
        }
    );

    t.advance(LOCK);
    t.client.unstake(&staker, &25);
    let all_events = t.env.events().all();
    let last_event = all_events.last().expect("No events found");
    let expected_topics = vec![&t.env, symbol_short!("unstaked").into_val(&t.env)];
    assert_eq!(last_event.1, expected_topics);
    let event_data: StakeChanged = last_event.2.try_into_val(&t.env).unwrap();
    assert_eq!(
        event_data,
        StakeChanged {
            staker,
            amount: 25,
            total_staked: 35,
        }
    );
}

#[test]
fn test_reputation_set_event() {
    let t = setup();
    let account = Address::generate(&t.env);

    t.client.set_reputation(&t.admin, &account, &42);

    let all_events = t.env.events().all();
    let last_event = all_events.last().expect("No events found");
    let expected_topics = vec![&t.env, symbol_short!("rep_set").into_val(&t.env)];
    assert_eq!(last_event.1, expected_topics);
    let event_data: ReputationSet = last_event.2.try_into_val(&t.env).unwrap();
    assert_eq!(event_data, ReputationSet { account, score: 42 });
}
