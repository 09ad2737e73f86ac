//! Governance-token staking and voting power.
//!
//! Voting power is never stored. It is derived from the current position and
//! the current [`ProtocolConfig`] every time it is read, so a reputation
//! update is visible on the very next ballot.

use soroban_sdk::{token, Address, Env};

use crate::{
    events,
    storage::{get_config, get_governance_token, load_stake, save_stake},
    types::{ProtocolConfig, ReputationBonus, StakePosition, StakingInfo},
    Error,
};

/// Bonus granted for `reputation` under `policy`. Never negative, and never
/// decreasing in `reputation` for a valid policy.
pub fn reputation_bonus(policy: &ReputationBonus, reputation: u32) -> i128 {
    let raw = match *policy {
        ReputationBonus::Disabled => 0,
        ReputationBonus::Linear(per_point) => (reputation as i128).saturating_mul(per_point),
        ReputationBonus::Capped(per_point, cap) => {
            (reputation as i128).saturating_mul(per_point).min(cap)
        }
    };
    raw.max(0)
}

/// `staked + bonus(reputation)`, or zero for an address with nothing staked.
pub fn voting_power(position: &StakePosition, config: &ProtocolConfig) -> i128 {
    if position.amount <= 0 {
        return 0;
    }
    position
        .amount
        .saturating_add(reputation_bonus(&config.reputation_bonus, position.reputation))
}

pub fn voting_power_of(env: &Env, account: &Address) -> Result<i128, Error> {
    let config = get_config(env)?;
    Ok(voting_power(&load_stake(env, account), &config))
}

pub fn stake(env: &Env, staker: &Address, amount: i128) -> Result<StakePosition, Error> {
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    let governance_token = get_governance_token(env)?;
    let mut position = load_stake(env, staker);
    position.amount = position
        .amount
        .checked_add(amount)
        .ok_or(Error::InvalidAmount)?;
    position.staked_at = env.ledger().timestamp();

    token::Client::new(env, &governance_token).transfer(
        staker,
        &env.current_contract_address(),
        &amount,
    );
    save_stake(env, staker, &position);

    events::emit_staked(env, staker.clone(), amount, position.amount);
    Ok(position)
}

pub fn unstake(env: &Env, staker: &Address, amount: i128) -> Result<StakePosition, Error> {
    if amount <= 0 {
        return Err(Error::InvalidAmount);
    }
    let config = get_config(env)?;
    let governance_token = get_governance_token(env)?;
    let mut position = load_stake(env, staker);

    if env.ledger().timestamp() < unlocks_at(&position, &config) {
        return Err(Error::LockActive);
    }
    if amount > position.amount {
        return Err(Error::InsufficientStake);
    }

    position.amount -= amount;
    save_stake(env, staker, &position);
    token::Client::new(env, &governance_token).transfer(
        &env.current_contract_address(),
        staker,
        &amount,
    );

    events::emit_unstaked(env, staker.clone(), amount, position.amount);
    Ok(position)
}

/// Earliest timestamp at which `position` may be withdrawn: the lock period
/// after the last stake, and strictly after every window it voted in.
pub fn unlocks_at(position: &StakePosition, config: &ProtocolConfig) -> u64 {
    position
        .staked_at
        .saturating_add(config.min_lock_duration)
        .max(position.locked_until.saturating_add(1))
}

/// Keep `voter`'s stake locked until the window ending at `end_time` has
/// closed.
pub fn lock_through(env: &Env, voter: &Address, end_time: u64) {
    let mut position = load_stake(env, voter);
    if end_time > position.locked_until {
        position.locked_until = end_time;
        save_stake(env, voter, &position);
    }
}

/// Reputation hook for external governance. The tally never calls this.
pub fn set_reputation(env: &Env, account: &Address, score: u32) {
    let mut position = load_stake(env, account);
    position.reputation = score;
    save_stake(env, account, &position);
    events::emit_reputation_set(env, account.clone(), score);
}

pub fn staking_info(env: &Env, account: &Address) -> Result<StakingInfo, Error> {
    let config = get_config(env)?;
    let position = load_stake(env, account);
    Ok(StakingInfo {
        staked: position.amount,
        staked_at: position.staked_at,
        reputation: position.reputation,
        voting_power: voting_power(&position, &config),
        unlocks_at: unlocks_at(&position, &config),
    })
}
