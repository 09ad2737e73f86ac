//! Per-grant fund custody and the milestone state machine.
//!
//! Every entry point here checks all of its preconditions against the stored
//! state before the first write, so a rejected call leaves no trace even
//! before the host rolls the invocation back.
//!
//! Releasing an approved milestone is the only path that debits a live
//! grant's escrow balance, and it only runs on a session that was still
//! `Active`. Finalizing flips that session to `Finalized` in the same
//! invocation, so each submission pays out at most once.

use soroban_sdk::{log, token, Address, BytesN, Env};

use crate::{
    events,
    storage::{
        get_funding_token, load_grant_config, load_grant_state, load_milestone, load_session,
        save_grant_state, save_milestone,
    },
    types::{GrantState, GrantStatus, Milestone, MilestoneStatus, Outcome, SessionStatus},
    voting, Error,
};

pub fn assign_grantee(
    env: &Env,
    caller: &Address,
    grant_id: u64,
    grantee: Address,
) -> Result<(), Error> {
    let config = load_grant_config(env, grant_id)?;
    let mut state = load_grant_state(env, grant_id)?;

    if *caller != config.funder {
        return Err(Error::Unauthorized);
    }
    if state.grantee.is_some() {
        return Err(Error::AlreadyAssigned);
    }
    if state.status != GrantStatus::Created {
        return Err(Error::InvalidGrantState);
    }

    state.grantee = Some(grantee.clone());
    state.status = GrantStatus::GranteeAssigned;
    save_grant_state(env, grant_id, &state);

    events::emit_grantee_assigned(env, grant_id, grantee);
    Ok(())
}

/// Record proof for milestone `index` and open its voting session.
/// Returns the new session id.
pub fn submit_milestone(
    env: &Env,
    caller: &Address,
    grant_id: u64,
    index: u32,
    proof_anchor: BytesN<32>,
) -> Result<u64, Error> {
    let config = load_grant_config(env, grant_id)?;
    let mut state = load_grant_state(env, grant_id)?;

    if state.grantee.as_ref() != Some(caller) {
        return Err(Error::Unauthorized);
    }
    if !matches!(
        state.status,
        GrantStatus::GranteeAssigned | GrantStatus::InProgress
    ) {
        return Err(Error::InvalidGrantState);
    }

    let mut milestone = load_milestone(env, grant_id, index)?;
    if !milestone.status.accepts_submission() {
        return Err(Error::InvalidMilestoneState);
    }
    if let Some(previous) = milestone.session_id {
        if load_session(env, previous)?.status == SessionStatus::Active {
            return Err(Error::InvalidMilestoneState);
        }
    }

    let now = env.ledger().timestamp();
    if now.checked_add(config.voting_period).is_none() {
        return Err(Error::InvalidVotingPeriod);
    }

    milestone.status = MilestoneStatus::Submitted;
    milestone.proof_anchor = Some(proof_anchor.clone());
    milestone.submitted_at = now;
    milestone.submissions = milestone.submissions.saturating_add(1);
    events::emit_milestone_submitted(env, grant_id, index, proof_anchor);

    let session = voting::open(
        env,
        grant_id,
        index,
        config.voting_period,
        config.voting_rules,
    )?;
    milestone.status = MilestoneStatus::VotingOpen;
    milestone.session_id = Some(session.id);
    save_milestone(env, grant_id, &milestone);

    if state.status == GrantStatus::GranteeAssigned {
        state.status = GrantStatus::InProgress;
        save_grant_state(env, grant_id, &state);
    }
    Ok(session.id)
}

/// Debit the escrow for `milestone`, refusing any release that would break
/// the custody invariants.
fn debit_escrow(
    state: &mut GrantState,
    total_amount: i128,
    milestone: &Milestone,
) -> Result<(), Error> {
    let escrow_balance = state
        .escrow_balance
        .checked_sub(milestone.amount)
        .filter(|balance| *balance >= 0)
        .ok_or(Error::InsufficientEscrow)?;
    let released_amount = state
        .released_amount
        .checked_add(milestone.amount)
        .filter(|released| *released <= total_amount)
        .ok_or(Error::InsufficientEscrow)?;

    state.escrow_balance = escrow_balance;
    state.released_amount = released_amount;
    state.released_count += 1;
    Ok(())
}

/// Close the voting window of milestone `index` and apply its outcome.
pub fn finalize_milestone(env: &Env, grant_id: u64, index: u32) -> Result<Outcome, Error> {
    let config = load_grant_config(env, grant_id)?;
    let mut state = load_grant_state(env, grant_id)?;
    let mut milestone = load_milestone(env, grant_id, index)?;

    let session_id = milestone.session_id.ok_or(Error::InvalidMilestoneState)?;
    let mut session = load_session(env, session_id)?;
    if session.status == SessionStatus::Finalized {
        return Err(Error::AlreadyFinalized);
    }
    if milestone.status != MilestoneStatus::VotingOpen {
        return Err(Error::InvalidMilestoneState);
    }
    if env.ledger().timestamp() <= session.end_time {
        return Err(Error::SessionStillActive);
    }

    let tally = voting::tally_session(env, &session);
    log!(
        env,
        "finalizing milestone",
        grant_id,
        index,
        tally.approve_weight,
        tally.reject_weight,
        tally.vote_count
    );

    debug_assert_ne!(tally.outcome, Outcome::Pending);

    let mut amount_released: i128 = 0;
    match tally.outcome {
        // Unreachable: a tally past `end_time` always decides.
        Outcome::Pending => return Err(Error::SessionStillActive),
        Outcome::Approved => {
            let grantee = state.grantee.clone().ok_or(Error::InvalidGrantState)?;
            if let Err(err) = debit_escrow(&mut state, config.total_amount, &milestone) {
                log!(
                    env,
                    "escrow invariant violated",
                    grant_id,
                    index,
                    state.escrow_balance,
                    milestone.amount
                );
                return Err(err);
            }
            if state.released_count == config.milestone_count {
                state.status = GrantStatus::Completed;
            }

            token::Client::new(env, &get_funding_token(env)?).transfer(
                &env.current_contract_address(),
                &grantee,
                &milestone.amount,
            );
            milestone.status = MilestoneStatus::Released;
            amount_released = milestone.amount;
            save_grant_state(env, grant_id, &state);
        }
        Outcome::Rejected => milestone.status = MilestoneStatus::Rejected,
        Outcome::Inconclusive => milestone.status = MilestoneStatus::Pending,
    }

    voting::close(env, &mut session, tally.outcome);
    save_milestone(env, grant_id, &milestone);

    events::emit_milestone_finalized(env, grant_id, index, tally.outcome, amount_released);
    Ok(tally.outcome)
}

/// Withdraw a grant that never reached a submission and refund the funder.
/// Returns the refunded amount.
pub fn cancel_grant(env: &Env, caller: &Address, grant_id: u64) -> Result<i128, Error> {
    let config = load_grant_config(env, grant_id)?;
    let mut state = load_grant_state(env, grant_id)?;

    if *caller != config.funder {
        return Err(Error::Unauthorized);
    }
    if !matches!(
        state.status,
        GrantStatus::Created | GrantStatus::GranteeAssigned
    ) {
        return Err(Error::InvalidGrantState);
    }

    let refunded = state.escrow_balance;
    state.escrow_balance = 0;
    state.status = GrantStatus::Cancelled;
    save_grant_state(env, grant_id, &state);

    if refunded > 0 {
        token::Client::new(env, &get_funding_token(env)?).transfer(
            &env.current_contract_address(),
            &config.funder,
            &refunded,
        );
    }

    events::emit_grant_cancelled(env, grant_id, config.funder, refunded);
    Ok(refunded)
}
