//! Grant creation and lookup.

use soroban_sdk::{token, Address, BytesN, Env, String, Vec};

use crate::{
    events,
    storage::{
        get_config, get_funding_token, grant_count, index_funder_grant, load_grant_config,
        load_grant_state, load_milestone, next_grant_id, save_grant_config, save_grant_state,
        save_milestone,
    },
    types::{GrantConfig, GrantState, GrantStatus, Milestone, MilestoneStatus},
    Error,
};

/// Upper bound on milestones per grant.
pub const MAX_MILESTONES: u32 = 20;
/// Byte limits on milestone details.
pub const MAX_TITLE_LEN: u32 = 128;
pub const MAX_DESCRIPTION_LEN: u32 = 1_024;

/// Amount of milestone `index` when `total` is split evenly over `count`
/// milestones. The remainder of the division goes to the last milestone.
pub fn equal_share(total: i128, count: u32, index: u32) -> i128 {
    let base = total / count as i128;
    if index + 1 == count {
        base + total % count as i128
    } else {
        base
    }
}

/// Validate and materialize per-milestone amounts.
fn milestone_amounts(
    env: &Env,
    total_amount: i128,
    milestone_count: u32,
    custom: Option<Vec<i128>>,
) -> Result<Vec<i128>, Error> {
    match custom {
        Some(amounts) => {
            if amounts.len() != milestone_count {
                return Err(Error::InvalidMilestoneCount);
            }
            let mut sum: i128 = 0;
            for amount in amounts.iter() {
                if amount <= 0 {
                    return Err(Error::InvalidAmount);
                }
                sum = sum.checked_add(amount).ok_or(Error::InvalidAmount)?;
            }
            if sum != total_amount {
                return Err(Error::InvalidAmount);
            }
            Ok(amounts)
        }
        None => {
            // Every milestone must carry a positive amount.
            if total_amount < milestone_count as i128 {
                return Err(Error::InvalidAmount);
            }
            let mut amounts = Vec::new(env);
            for index in 0..milestone_count {
                amounts.push_back(equal_share(total_amount, milestone_count, index));
            }
            Ok(amounts)
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn create_grant(
    env: &Env,
    funder: &Address,
    title: String,
    total_amount: i128,
    milestone_count: u32,
    proof_anchor: BytesN<32>,
    voting_period: u64,
    deposited_funds: i128,
    custom_amounts: Option<Vec<i128>>,
) -> Result<u64, Error> {
    if total_amount <= 0 || deposited_funds != total_amount {
        return Err(Error::InvalidAmount);
    }
    if milestone_count == 0 || milestone_count > MAX_MILESTONES {
        return Err(Error::InvalidMilestoneCount);
    }
    if voting_period == 0 {
        return Err(Error::InvalidVotingPeriod);
    }
    let config = get_config(env)?;
    let funding_token = get_funding_token(env)?;
    let amounts = milestone_amounts(env, total_amount, milestone_count, custom_amounts)?;

    token::Client::new(env, &funding_token).transfer(
        funder,
        &env.current_contract_address(),
        &deposited_funds,
    );

    let id = next_grant_id(env);
    let grant = GrantConfig {
        id,
        funder: funder.clone(),
        title: title.clone(),
        total_amount,
        milestone_count,
        proof_anchor: proof_anchor.clone(),
        voting_period,
        voting_rules: config.voting_rules,
        created_at: env.ledger().timestamp(),
    };
    save_grant_config(env, &grant);
    save_grant_state(
        env,
        id,
        &GrantState {
            grantee: None,
            status: GrantStatus::Created,
            escrow_balance: deposited_funds,
            released_amount: 0,
            released_count: 0,
        },
    );
    for (index, amount) in amounts.iter().enumerate() {
        save_milestone(
            env,
            id,
            &Milestone {
                index: index as u32,
                title: String::from_str(env, ""),
                description: String::from_str(env, ""),
                amount,
                status: MilestoneStatus::Pending,
                proof_anchor: None,
                submitted_at: 0,
                session_id: None,
                submissions: 0,
            },
        );
    }
    index_funder_grant(env, funder, id);

    events::emit_grant_created(
        env,
        id,
        funder.clone(),
        title,
        total_amount,
        milestone_count,
        proof_anchor,
    );
    Ok(id)
}

/// Name and describe a milestone that was never submitted. Only the funder
/// may do this, and only while the grant is open.
pub fn set_milestone_details(
    env: &Env,
    caller: &Address,
    grant_id: u64,
    index: u32,
    title: String,
    description: String,
) -> Result<(), Error> {
    let config = load_grant_config(env, grant_id)?;
    let state = load_grant_state(env, grant_id)?;
    if *caller != config.funder {
        return Err(Error::Unauthorized);
    }
    if matches!(state.status, GrantStatus::Cancelled | GrantStatus::Completed) {
        return Err(Error::InvalidGrantState);
    }
    let mut milestone = load_milestone(env, grant_id, index)?;
    if milestone.status != MilestoneStatus::Pending || milestone.submissions > 0 {
        return Err(Error::InvalidMilestoneState);
    }
    if title.len() > MAX_TITLE_LEN || description.len() > MAX_DESCRIPTION_LEN {
        return Err(Error::DetailsTooLong);
    }

    milestone.title = title.clone();
    milestone.description = description;
    save_milestone(env, grant_id, &milestone);

    events::emit_milestone_details_set(env, grant_id, index, title);
    Ok(())
}

/// IDs of every grant ever created, oldest first.
pub fn list_grants(env: &Env) -> Vec<u64> {
    let mut ids = Vec::new(env);
    for id in 0..grant_count(env) {
        ids.push_back(id);
    }
    ids
}
