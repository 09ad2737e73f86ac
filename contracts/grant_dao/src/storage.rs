// contracts/grant_dao/src/storage.rs
//
// Storage helpers for GrantDao.
//
// Layout:
//   instance:   Admin, FundingToken, GovernanceToken, Config, GrantCount, SessionCount
//   persistent: GrantConfig(id), GrantState(id), Milestone(id, index),
//               FunderGrants(funder), Session(id), SessionVoter(id, n),
//               Vote(session, voter), Stake(address)
//
// Every persistent write extends the entry's TTL so long-running grants do
// not get archived between milestones.

use soroban_sdk::{contracttype, Address, Env, Vec};

use crate::{
    types::{
        Grant, GrantConfig, GrantState, Milestone, ProtocolConfig, StakePosition, Vote,
        VotingSession,
    },
    Error,
};

const DAY_IN_LEDGERS: u32 = 17_280;
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = INSTANCE_BUMP_AMOUNT - DAY_IN_LEDGERS;
const PERSISTENT_BUMP_AMOUNT: u32 = 90 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = PERSISTENT_BUMP_AMOUNT - 7 * DAY_IN_LEDGERS;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    Admin,
    FundingToken,
    GovernanceToken,
    Config,
    GrantCount,
    SessionCount,
    GrantConfig(u64),
    GrantState(u64),
    Milestone(u64, u32),
    FunderGrants(Address),
    Session(u64),
    SessionVoter(u64, u32),
    Vote(u64, Address),
    Stake(Address),
}

fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

fn set_persistent<V>(env: &Env, key: &DataKey, value: &V)
where
    V: soroban_sdk::IntoVal<Env, soroban_sdk::Val>,
{
    let storage = env.storage().persistent();
    storage.set(key, value);
    storage.extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

// ─────────────────────────────────────────────────────────
// Protocol setup
// ─────────────────────────────────────────────────────────

pub fn is_initialized(env: &Env) -> bool {
    env.storage().instance().has(&DataKey::Admin)
}

pub fn set_admin(env: &Env, admin: &Address) {
    env.storage().instance().set(&DataKey::Admin, admin);
    bump_instance(env);
}

pub fn get_admin(env: &Env) -> Result<Address, Error> {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Admin)
        .ok_or(Error::NotInitialized)
}

pub fn set_tokens(env: &Env, funding_token: &Address, governance_token: &Address) {
    let instance = env.storage().instance();
    instance.set(&DataKey::FundingToken, funding_token);
    instance.set(&DataKey::GovernanceToken, governance_token);
}

pub fn get_funding_token(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::FundingToken)
        .ok_or(Error::NotInitialized)
}

pub fn get_governance_token(env: &Env) -> Result<Address, Error> {
    env.storage()
        .instance()
        .get(&DataKey::GovernanceToken)
        .ok_or(Error::NotInitialized)
}

pub fn set_config(env: &Env, config: &ProtocolConfig) {
    env.storage().instance().set(&DataKey::Config, config);
    bump_instance(env);
}

pub fn get_config(env: &Env) -> Result<ProtocolConfig, Error> {
    bump_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .ok_or(Error::NotInitialized)
}

// ─────────────────────────────────────────────────────────
// Counters
// ─────────────────────────────────────────────────────────

/// Read and increment the grant counter. Returns the ID for the next grant.
pub fn next_grant_id(env: &Env) -> u64 {
    let id: u64 = grant_count(env);
    env.storage().instance().set(&DataKey::GrantCount, &(id + 1));
    id
}

pub fn grant_count(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::GrantCount)
        .unwrap_or(0)
}

/// Read and increment the session counter. Returns the ID for the next session.
pub fn next_session_id(env: &Env) -> u64 {
    let id: u64 = env
        .storage()
        .instance()
        .get(&DataKey::SessionCount)
        .unwrap_or(0);
    env.storage()
        .instance()
        .set(&DataKey::SessionCount, &(id + 1));
    id
}

// ─────────────────────────────────────────────────────────
// Grants
// ─────────────────────────────────────────────────────────

pub fn save_grant_config(env: &Env, config: &GrantConfig) {
    set_persistent(env, &DataKey::GrantConfig(config.id), config);
}

pub fn load_grant_config(env: &Env, id: u64) -> Result<GrantConfig, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::GrantConfig(id))
        .ok_or(Error::GrantNotFound)
}

pub fn save_grant_state(env: &Env, id: u64, state: &GrantState) {
    set_persistent(env, &DataKey::GrantState(id), state);
}

pub fn load_grant_state(env: &Env, id: u64) -> Result<GrantState, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::GrantState(id))
        .ok_or(Error::GrantNotFound)
}

/// Reconstruct the public `Grant` view from its config and state entries.
pub fn load_grant(env: &Env, id: u64) -> Result<Grant, Error> {
    let config = load_grant_config(env, id)?;
    let state = load_grant_state(env, id)?;
    Ok(Grant::from_parts(config, state))
}

pub fn funder_grants(env: &Env, funder: &Address) -> Vec<u64> {
    env.storage()
        .persistent()
        .get(&DataKey::FunderGrants(funder.clone()))
        .unwrap_or_else(|| Vec::new(env))
}

pub fn index_funder_grant(env: &Env, funder: &Address, grant_id: u64) {
    let mut ids = funder_grants(env, funder);
    ids.push_back(grant_id);
    set_persistent(env, &DataKey::FunderGrants(funder.clone()), &ids);
}

// ─────────────────────────────────────────────────────────
// Milestones
// ─────────────────────────────────────────────────────────

pub fn save_milestone(env: &Env, grant_id: u64, milestone: &Milestone) {
    set_persistent(env, &DataKey::Milestone(grant_id, milestone.index), milestone);
}

pub fn load_milestone(env: &Env, grant_id: u64, index: u32) -> Result<Milestone, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::Milestone(grant_id, index))
        .ok_or(Error::MilestoneNotFound)
}

// ─────────────────────────────────────────────────────────
// Voting sessions and ballots
// ─────────────────────────────────────────────────────────

pub fn save_session(env: &Env, session: &VotingSession) {
    set_persistent(env, &DataKey::Session(session.id), session);
}

pub fn load_session(env: &Env, id: u64) -> Result<VotingSession, Error> {
    env.storage()
        .persistent()
        .get(&DataKey::Session(id))
        .ok_or(Error::SessionNotFound)
}

pub fn load_vote(env: &Env, session_id: u64, voter: &Address) -> Option<Vote> {
    env.storage()
        .persistent()
        .get(&DataKey::Vote(session_id, voter.clone()))
}

pub fn save_vote(env: &Env, session_id: u64, vote: &Vote) {
    set_persistent(env, &DataKey::Vote(session_id, vote.voter.clone()), vote);
}

/// Record `voter` as the `index`-th distinct voter of a session.
pub fn save_session_voter(env: &Env, session_id: u64, index: u32, voter: &Address) {
    set_persistent(env, &DataKey::SessionVoter(session_id, index), voter);
}

pub fn session_voter(env: &Env, session_id: u64, index: u32) -> Option<Address> {
    env.storage()
        .persistent()
        .get(&DataKey::SessionVoter(session_id, index))
}

// ─────────────────────────────────────────────────────────
// Stakes
// ─────────────────────────────────────────────────────────

/// Load a stake position, or an empty one for an unknown address.
pub fn load_stake(env: &Env, staker: &Address) -> StakePosition {
    env.storage()
        .persistent()
        .get(&DataKey::Stake(staker.clone()))
        .unwrap_or_default()
}

pub fn save_stake(env: &Env, staker: &Address, position: &StakePosition) {
    set_persistent(env, &DataKey::Stake(staker.clone()), position);
}
