use soroban_sdk::{contracttype, symbol_short, Address, BytesN, Env, String};

use crate::types::{Outcome, VoteChoice};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GrantCreated {
    pub grant_id: u64,
    pub funder: Address,
    pub title: String,
    pub total_amount: i128,
    pub milestone_count: u32,
    pub proof_anchor: BytesN<32>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GranteeAssigned {
    pub grant_id: u64,
    pub grantee: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MilestoneDetailsSet {
    pub grant_id: u64,
    pub milestone_index: u32,
    pub title: String,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MilestoneSubmitted {
    pub grant_id: u64,
    pub milestone_index: u32,
    pub proof_anchor: BytesN<32>,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VotingOpened {
    pub grant_id: u64,
    pub milestone_index: u32,
    pub session_id: u64,
    pub end_time: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VoteCast {
    pub session_id: u64,
    pub voter: Address,
    pub choice: VoteChoice,
    pub weight: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MilestoneFinalized {
    pub grant_id: u64,
    pub milestone_index: u32,
    pub outcome: Outcome,
    pub amount_released: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GrantCancelled {
    pub grant_id: u64,
    pub funder: Address,
    pub refunded: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StakeChanged {
    pub staker: Address,
    pub amount: i128,
    pub total_staked: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReputationSet {
    pub account: Address,
    pub score: u32,
}

pub fn emit_grant_created(
    env: &Env,
    grant_id: u64,
    funder: Address,
    title: String,
    total_amount: i128,
    milestone_count: u32,
    proof_anchor: BytesN<32>,
) {
    let topics = (symbol_short!("created"), grant_id);
    let data = GrantCreated {
        grant_id,
        funder,
        title,
        total_amount,
        milestone_count,
        proof_anchor,
    };
    env.events().publish(topics, data);
}

pub fn emit_grantee_assigned(env: &Env, grant_id: u64, grantee: Address) {
    let topics = (symbol_short!("assigned"), grant_id);
    env.events()
        .publish(topics, GranteeAssigned { grant_id, grantee });
}

pub fn emit_milestone_details_set(env: &Env, grant_id: u64, milestone_index: u32, title: String) {
    let topics = (symbol_short!("details"), grant_id);
    let data = MilestoneDetailsSet {
        grant_id,
        milestone_index,
        title,
    };
    env.events().publish(topics, data);
}

pub fn emit_milestone_submitted(
    env: &Env,
    grant_id: u64,
    milestone_index: u32,
    proof_anchor: BytesN<32>,
) {
    let topics = (symbol_short!("submitted"), grant_id);
    let data = MilestoneSubmitted {
        grant_id,
        milestone_index,
        proof_anchor,
    };
    env.events().publish(topics, data);
}

pub fn emit_voting_opened(
    env: &Env,
    grant_id: u64,
    milestone_index: u32,
    session_id: u64,
    end_time: u64,
) {
    let topics = (symbol_short!("voting"), grant_id);
    let data = VotingOpened {
        grant_id,
        milestone_index,
        session_id,
        end_time,
    };
    env.events().publish(topics, data);
}

pub fn emit_vote_cast(env: &Env, session_id: u64, voter: Address, choice: VoteChoice, weight: i128) {
    let topics = (symbol_short!("vote_cast"), session_id);
    let data = VoteCast {
        session_id,
        voter,
        choice,
        weight,
    };
    env.events().publish(topics, data);
}

pub fn emit_milestone_finalized(
    env: &Env,
    grant_id: u64,
    milestone_index: u32,
    outcome: Outcome,
    amount_released: i128,
) {
    let topics = (symbol_short!("finalized"), grant_id);
    let data = MilestoneFinalized {
        grant_id,
        milestone_index,
        outcome,
        amount_released,
    };
    env.events().publish(topics, data);
}

pub fn emit_grant_cancelled(env: &Env, grant_id: u64, funder: Address, refunded: i128) {
    let topics = (symbol_short!("cancelled"), grant_id);
    let data = GrantCancelled {
        grant_id,
        funder,
        refunded,
    };
    env.events().publish(topics, data);
}

pub fn emit_staked(env: &Env, staker: Address, amount: i128, total_staked: i128) {
    let topics = (symbol_short!("staked"),);
    let data = StakeChanged {
        staker,
        amount,
        total_staked,
    };
    env.events().publish(topics, data);
}

pub fn emit_unstaked(env: &Env, staker: Address, amount: i128, total_staked: i128) {
    let topics = (symbol_short!("unstaked"),);
    let data = StakeChanged {
        staker,
        amount,
        total_staked,
    };
    env.events().publish(topics, data);
}

pub fn emit_reputation_set(env: &Env, account: Address, score: u32) {
    let topics = (symbol_short!("rep_set"),);
    env.events()
        .publish(topics, ReputationSet { account, score });
}
