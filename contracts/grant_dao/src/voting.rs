//! Time-boxed, stake-weighted voting on milestone submissions.
//!
//! Each session carries running [`BallotTotals`]. A ballot adjusts them in
//! place, so casting and finalizing touch a fixed number of ledger entries
//! however many people vote. [`tally`] turns the totals into an outcome and
//! is a pure function of the totals, the session rules and the clock.

use soroban_sdk::{log, Address, Env, String, Vec};

use crate::{
    events, stake,
    storage::{
        load_session, load_vote, next_session_id, save_session, save_session_voter, save_vote,
        session_voter,
    },
    types::{
        BallotTotals, Outcome, SessionStatus, Tally, Vote, VoteChoice, VotingRules, VotingSession,
        BPS_DENOMINATOR,
    },
    Error,
};

/// Upper bound on the byte length of a ballot rationale.
pub const MAX_RATIONALE_LEN: u32 = 512;

/// Upper bound on voters returned by one `get_voters` page.
pub const MAX_VOTER_PAGE: u32 = 25;

/// Outcome of `totals` under `rules` at time `now`.
pub fn tally(totals: &BallotTotals, rules: &VotingRules, end_time: u64, now: u64) -> Tally {
    let closed = now > end_time;
    let total_weight = totals.approve_weight.saturating_add(totals.reject_weight);

    let outcome = if totals.vote_count < rules.min_votes || total_weight <= 0 {
        if closed {
            Outcome::Inconclusive
        } else {
            Outcome::Pending
        }
    } else if totals.approve_weight.saturating_mul(BPS_DENOMINATOR as i128)
        >= total_weight.saturating_mul(rules.approval_threshold_bps as i128)
    {
        Outcome::Approved
    } else {
        Outcome::Rejected
    };

    Tally {
        approve_weight: totals.approve_weight,
        reject_weight: totals.reject_weight,
        vote_count: totals.vote_count,
        outcome,
    }
}

/// Tally `session` at the current ledger time.
pub fn tally_session(env: &Env, session: &VotingSession) -> Tally {
    tally(
        &session.totals,
        &session.rules,
        session.end_time,
        env.ledger().timestamp(),
    )
}

/// Open a new `Active` session. The caller guarantees no other session of
/// the milestone is still active.
pub fn open(
    env: &Env,
    grant_id: u64,
    milestone_index: u32,
    duration: u64,
    rules: VotingRules,
) -> Result<VotingSession, Error> {
    let start_time = env.ledger().timestamp();
    let end_time = start_time
        .checked_add(duration)
        .ok_or(Error::InvalidVotingPeriod)?;

    let session = VotingSession {
        id: next_session_id(env),
        grant_id,
        milestone_index,
        start_time,
        end_time,
        rules,
        totals: BallotTotals::default(),
        status: SessionStatus::Active,
        result: Outcome::Pending,
    };
    save_session(env, &session);
    events::emit_voting_opened(env, grant_id, milestone_index, session.id, end_time);
    Ok(session)
}

pub fn cast_vote(
    env: &Env,
    voter: &Address,
    session_id: u64,
    choice: VoteChoice,
    rationale: Option<String>,
) -> Result<Vote, Error> {
    let mut session = load_session(env, session_id)?;
    let now = env.ledger().timestamp();
    if session.status != SessionStatus::Active || now > session.end_time {
        return Err(Error::VotingClosed);
    }
    if let Some(text) = &rationale {
        if text.len() > MAX_RATIONALE_LEN {
            return Err(Error::RationaleTooLong);
        }
    }

    let weight = stake::voting_power_of(env, voter)?;
    if weight <= 0 {
        return Err(Error::NotEligible);
    }

    match load_vote(env, session_id, voter) {
        Some(previous) => {
            session.totals.replace(&previous, choice, weight);
            log!(env, "ballot replaced", session_id, voter.clone());
        }
        None => {
            save_session_voter(env, session_id, session.totals.vote_count, voter);
            session.totals.record(choice, weight);
        }
    }

    let vote = Vote {
        voter: voter.clone(),
        choice,
        weight,
        rationale,
        cast_at: now,
    };
    save_vote(env, session_id, &vote);
    save_session(env, &session);
    stake::lock_through(env, voter, session.end_time);

    events::emit_vote_cast(env, session_id, voter.clone(), choice, weight);
    Ok(vote)
}

/// Voters of `session` in first-cast order, starting at `start`, at most
/// `min(limit, MAX_VOTER_PAGE)` of them.
pub fn voters(env: &Env, session: &VotingSession, start: u32, limit: u32) -> Vec<Address> {
    let end = start
        .saturating_add(limit.min(MAX_VOTER_PAGE))
        .min(session.totals.vote_count);
    let mut page = Vec::new(env);
    for index in start..end {
        if let Some(voter) = session_voter(env, session.id, index) {
            page.push_back(voter);
        }
    }
    page
}

/// Mark `session` finalized with `result`. Finalized sessions are never
/// written again.
pub fn close(env: &Env, session: &mut VotingSession, result: Outcome) {
    session.status = SessionStatus::Finalized;
    session.result = result;
    save_session(env, session);
}
