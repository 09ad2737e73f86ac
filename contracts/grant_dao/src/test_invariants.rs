//! Property tests for the tally and for escrow conservation.

use proptest::prelude::*;
use soroban_sdk::testutils::Address as _;
use soroban_sdk::{Address, Vec};

use crate::registry::equal_share;
use crate::test::{setup, VOTING_PERIOD};
use crate::voting::tally;
use crate::{BallotTotals, GrantStatus, MilestoneStatus, Outcome, Vote, VoteChoice, VotingRules};

const END: u64 = 10_000;

fn fold(ballots: &[(VoteChoice, i128)]) -> BallotTotals {
    let mut totals = BallotTotals::default();
    for (choice, weight) in ballots {
        totals.record(*choice, *weight);
    }
    totals
}

fn choice() -> impl Strategy<Value = VoteChoice> {
    prop_oneof![Just(VoteChoice::Approve), Just(VoteChoice::Reject)]
}

fn ballot(max_weight: i128) -> impl Strategy<Value = (VoteChoice, i128)> {
    (choice(), 1..max_weight)
}

fn rules() -> impl Strategy<Value = VotingRules> {
    (1u32..8, 1u32..=10_000).prop_map(|(min_votes, approval_threshold_bps)| VotingRules {
        min_votes,
        approval_threshold_bps,
    })
}

proptest! {
    #[test]
    fn tally_ignores_ballot_order(
        ballots in prop::collection::vec(ballot(1_000_000), 0..24),
        rules in rules(),
        shift in any::<usize>(),
        closed in any::<bool>(),
    ) {
        let now = if closed { END + 1 } else { END };
        let expected = tally(&fold(&ballots), &rules, END, now);

        let mut reversed = ballots.clone();
        reversed.reverse();
        prop_assert_eq!(tally(&fold(&reversed), &rules, END, now), expected);

        let mut rotated = ballots.clone();
        if !rotated.is_empty() {
            let k = shift % rotated.len();
            rotated.rotate_left(k);
        }
        prop_assert_eq!(tally(&fold(&rotated), &rules, END, now), expected);

        // Re-evaluating the same totals is stable.
        prop_assert_eq!(tally(&fold(&ballots), &rules, END, now), expected);
    }

    #[test]
    fn closed_tally_always_decides(
        ballots in prop::collection::vec(ballot(1_000), 0..12),
        rules in rules(),
    ) {
        let result = tally(&fold(&ballots), &rules, END, END + 1);
        prop_assert_ne!(result.outcome, Outcome::Pending);

        let quorum = ballots.len() as u32 >= rules.min_votes;
        prop_assert_eq!(result.outcome == Outcome::Inconclusive, !quorum);
    }

    #[test]
    fn extra_approval_never_flips_approved(
        ballots in prop::collection::vec(ballot(1_000), 0..12),
        rules in rules(),
        extra in 1i128..1_000,
    ) {
        let before = tally(&fold(&ballots), &rules, END, END + 1);
        let mut more = ballots;
        more.push((VoteChoice::Approve, extra));
        let after = tally(&fold(&more), &rules, END, END + 1);

        if before.outcome == Outcome::Approved {
            prop_assert_eq!(after.outcome, Outcome::Approved);
        }
        prop_assert_eq!(after.approve_weight, before.approve_weight + extra);
        prop_assert_eq!(after.vote_count, before.vote_count + 1);
    }

    /// Replacing ballots in place leaves the same totals as counting only
    /// each voter's final ballot.
    #[test]
    fn replaced_ballots_match_a_recount(
        first in prop::collection::vec(ballot(1_000), 1..12),
        changes in prop::collection::vec((any::<usize>(), ballot(1_000)), 0..24),
    ) {
        let env = soroban_sdk::Env::default();
        let voter = Address::generate(&env);
        let mut latest = first.clone();
        let mut running = fold(&first);

        for (pick, (choice, weight)) in changes {
            let slot = pick % latest.len();
            let (previous_choice, previous_weight) = latest[slot];
            let previous = Vote {
                voter: voter.clone(),
                choice: previous_choice,
                weight: previous_weight,
                cast_at: END,
                rationale: None,
            };
            running.replace(&previous, choice, weight);
            latest[slot] = (choice, weight);
        }

        prop_assert_eq!(running, fold(&latest));
    }

    #[test]
    fn equal_split_sums_to_total(total in 1i128..1_000_000_000_000, count in 1u32..=20) {
        prop_assume!(total >= count as i128);
        let shares: std::vec::Vec<i128> =
            (0..count).map(|index| equal_share(total, count, index)).collect();

        prop_assert_eq!(shares.iter().sum::<i128>(), total);
        prop_assert!(shares.iter().all(|share| *share > 0));
        prop_assert!(shares.windows(2).rev().skip(1).all(|pair| pair[0] == pair[1]));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// Whatever sequence of submissions and ballots happens, the contract
    /// never pays out more than was escrowed and its books match its balance.
    #[test]
    fn escrow_is_conserved(
        amounts in prop::collection::vec(1i128..500, 1..4),
        rounds in prop::collection::vec(
            (0u32..4, prop::collection::vec(ballot(50), 0..5)),
            1..6,
        ),
    ) {
        let t = setup();
        let funder = Address::generate(&t.env);
        let grantee = Address::generate(&t.env);
        let total: i128 = amounts.iter().sum();
        let count = amounts.len() as u32;
        t.mint(&t.funding, &funder, total);

        let grant_id = t.client.create_grant(
            &funder,
            &t.title(),
            &total,
            &count,
            &t.anchor(7),
            &VOTING_PERIOD,
            &total,
            &Some(Vec::from_slice(&t.env, &amounts)),
        );
        t.client.assign_grantee(&funder, &grant_id, &grantee);

        for (pick, ballots) in rounds {
            let index = pick % count;
            let status = t.client.get_milestone(&grant_id, &index).status;
            if !matches!(status, MilestoneStatus::Pending | MilestoneStatus::Rejected) {
                continue;
            }

            let session_id = t.submit(grant_id, &grantee, index);
            for (choice, weight) in ballots {
                let voter = t.staked_voter(weight);
                t.vote(session_id, &voter, choice);
            }
            t.close_window();
            let outcome = t.client.finalize_milestone(&grant_id, &index);

            let expected = if outcome == Outcome::Approved {
                MilestoneStatus::Released
            } else if outcome == Outcome::Rejected {
                MilestoneStatus::Rejected
            } else {
                MilestoneStatus::Pending
            };
            prop_assert_eq!(t.client.get_milestone(&grant_id, &index).status, expected);

            let grant = t.client.get_grant(&grant_id);
            prop_assert!(grant.escrow_balance >= 0);
            prop_assert!(grant.released_amount <= total);
            prop_assert_eq!(grant.escrow_balance + grant.released_amount, total);
            prop_assert_eq!(t.funding.balance(&t.client.address), grant.escrow_balance);
            prop_assert_eq!(t.funding.balance(&grantee), grant.released_amount);
            prop_assert_eq!(
                grant.status == GrantStatus::Completed,
                grant.released_count == count
            );
        }
    }

    /// Only a voter's latest ballot counts, once.
    #[test]
    fn latest_ballot_wins(choices in prop::collection::vec(choice(), 1..8)) {
        let t = setup();
        let (grant_id, _, grantee) = t.assigned_grant(30, 3);
        let session_id = t.submit(grant_id, &grantee, 0);
        let voter = t.staked_voter(9);

        for choice in choices.iter() {
            t.vote(session_id, &voter, *choice);
        }

        let tally = t.client.get_tally(&session_id);
        prop_assert_eq!(tally.vote_count, 1);
        prop_assert_eq!(tally.approve_weight + tally.reject_weight, 9);
        let last = *choices.last().unwrap();
        prop_assert_eq!(t.client.get_vote(&session_id, &voter).unwrap().choice, last);
    }
}
