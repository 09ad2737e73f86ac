#![no_std]

//! # Grant DAO
//!
//! Escrows funder capital against a milestone plan and releases each
//! milestone's share only after a stake-weighted community vote approves the
//! grantee's proof.
//!
//! ```text
//! create_grant ─► assign_grantee ─► submit_milestone ─► cast_vote* ─► finalize_milestone
//!                                          ▲                                  │
//!                                          └──── Rejected / Inconclusive ─────┘
//! ```
//!
//! Voting power comes from governance tokens staked through [`GrantDao::stake`]
//! plus a configurable reputation bonus.

use soroban_sdk::{
    contract, contracterror, contractimpl, Address, BytesN, Env, String, Vec,
};

mod escrow;
mod events;
mod registry;
mod stake;
mod storage;
mod types;
mod voting;

#[cfg(test)]
extern crate std;
#[cfg(test)]
mod test_events;
#[cfg(test)]
mod test_invariants;

pub use events::{
    GrantCancelled, GrantCreated, GranteeAssigned, MilestoneDetailsSet, MilestoneFinalized,
    MilestoneSubmitted, ReputationSet, StakeChanged, VoteCast, VotingOpened,
};
pub use registry::{MAX_DESCRIPTION_LEN, MAX_MILESTONES, MAX_TITLE_LEN};
pub use types::{
    BallotTotals, Grant, GrantStatus, Milestone, MilestoneStatus, Outcome, ProtocolConfig,
    ReputationBonus, SessionStatus, StakingInfo, Tally, Vote, VoteChoice, VotingRules,
    VotingSession,
};
pub use voting::{MAX_RATIONALE_LEN, MAX_VOTER_PAGE};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    NotInitialized = 1,
    AlreadyInitialized = 2,
    /// Caller does not hold the role the operation requires.
    Unauthorized = 3,
    InvalidAmount = 4,
    InvalidMilestoneCount = 5,
    InvalidVotingPeriod = 6,
    InvalidConfig = 7,
    GrantNotFound = 8,
    MilestoneNotFound = 9,
    SessionNotFound = 10,
    AlreadyAssigned = 11,
    InvalidGrantState = 12,
    InvalidMilestoneState = 13,
    /// Finalize attempted while the voting window is still open.
    SessionStillActive = 14,
    /// The milestone's latest session was already finalized.
    AlreadyFinalized = 15,
    VotingClosed = 16,
    /// Voter has no voting power.
    NotEligible = 17,
    LockActive = 18,
    InsufficientStake = 19,
    /// A release would overdraw the grant's escrow. Indicates a logic defect.
    InsufficientEscrow = 20,
    RationaleTooLong = 21,
    DetailsTooLong = 22,
}

#[contract]
pub struct GrantDao;

#[contractimpl]
impl GrantDao {
    // ─── Setup ──────────────────────────────────────────────

    /// One-time setup.
    ///
    /// - `funding_token` is the asset grants are escrowed in.
    /// - `governance_token` is the asset staked for voting power.
    pub fn init(
        env: Env,
        admin: Address,
        funding_token: Address,
        governance_token: Address,
        config: ProtocolConfig,
    ) -> Result<(), Error> {
        admin.require_auth();
        if storage::is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }
        if !config.is_valid() {
            return Err(Error::InvalidConfig);
        }
        storage::set_admin(&env, &admin);
        storage::set_tokens(&env, &funding_token, &governance_token);
        storage::set_config(&env, &config);
        Ok(())
    }

    /// Replace the protocol config. Grants already created keep the voting
    /// rules they were created with; voting power uses the new bonus at once.
    pub fn update_config(env: Env, admin: Address, config: ProtocolConfig) -> Result<(), Error> {
        admin.require_auth();
        Self::require_admin(&env, &admin)?;
        if !config.is_valid() {
            return Err(Error::InvalidConfig);
        }
        storage::set_config(&env, &config);
        Ok(())
    }

    pub fn transfer_admin(env: Env, admin: Address, new_admin: Address) -> Result<(), Error> {
        admin.require_auth();
        Self::require_admin(&env, &admin)?;
        storage::set_admin(&env, &new_admin);
        Ok(())
    }

    pub fn get_admin(env: Env) -> Result<Address, Error> {
        storage::get_admin(&env)
    }

    pub fn get_config(env: Env) -> Result<ProtocolConfig, Error> {
        storage::get_config(&env)
    }

    // ─── Registry ───────────────────────────────────────────

    /// Escrow `deposited_funds` for a new grant and return its id.
    ///
    /// `deposited_funds` must equal `total_amount`; it is transferred from
    /// `funder` in the funding token. Milestone amounts are an equal split of
    /// `total_amount` unless `milestone_amounts` lists them explicitly.
    #[allow(clippy::too_many_arguments)]
    pub fn create_grant(
        env: Env,
        funder: Address,
        title: String,
        total_amount: i128,
        milestone_count: u32,
        proof_anchor: BytesN<32>,
        voting_period: u64,
        deposited_funds: i128,
        milestone_amounts: Option<Vec<i128>>,
    ) -> Result<u64, Error> {
        funder.require_auth();
        registry::create_grant(
            &env,
            &funder,
            title,
            total_amount,
            milestone_count,
            proof_anchor,
            voting_period,
            deposited_funds,
            milestone_amounts,
        )
    }

    pub fn get_grant(env: Env, grant_id: u64) -> Result<Grant, Error> {
        storage::load_grant(&env, grant_id)
    }

    pub fn list_grants_by_funder(env: Env, funder: Address) -> Vec<u64> {
        storage::funder_grants(&env, &funder)
    }

    pub fn list_grants(env: Env) -> Vec<u64> {
        registry::list_grants(&env)
    }

    pub fn grant_count(env: Env) -> u64 {
        storage::grant_count(&env)
    }

    pub fn get_milestone(env: Env, grant_id: u64, index: u32) -> Result<Milestone, Error> {
        storage::load_milestone(&env, grant_id, index)
    }

    pub fn get_milestones(env: Env, grant_id: u64) -> Result<Vec<Milestone>, Error> {
        let config = storage::load_grant_config(&env, grant_id)?;
        let mut milestones = Vec::new(&env);
        for index in 0..config.milestone_count {
            milestones.push_back(storage::load_milestone(&env, grant_id, index)?);
        }
        Ok(milestones)
    }

    /// Funder names and describes milestone `index` before it is first
    /// submitted. The amount is fixed at creation.
    pub fn set_milestone_details(
        env: Env,
        caller: Address,
        grant_id: u64,
        index: u32,
        title: String,
        description: String,
    ) -> Result<(), Error> {
        caller.require_auth();
        registry::set_milestone_details(&env, &caller, grant_id, index, title, description)
    }

    // ─── Escrow ─────────────────────────────────────────────

    /// Funder names the grantee. Only possible once.
    pub fn assign_grantee(
        env: Env,
        caller: Address,
        grant_id: u64,
        grantee: Address,
    ) -> Result<(), Error> {
        caller.require_auth();
        escrow::assign_grantee(&env, &caller, grant_id, grantee)
    }

    /// Grantee submits proof for milestone `index`; opens a voting session
    /// and returns its id.
    pub fn submit_milestone(
        env: Env,
        caller: Address,
        grant_id: u64,
        index: u32,
        proof_anchor: BytesN<32>,
    ) -> Result<u64, Error> {
        caller.require_auth();
        escrow::submit_milestone(&env, &caller, grant_id, index, proof_anchor)
    }

    /// Apply the outcome of milestone `index`'s vote once its window has
    /// closed. Anyone may call it; only the first call has an effect.
    pub fn finalize_milestone(env: Env, grant_id: u64, index: u32) -> Result<Outcome, Error> {
        escrow::finalize_milestone(&env, grant_id, index)
    }

    /// Funder withdraws a grant before any milestone was submitted and is
    /// refunded in full.
    pub fn cancel_grant(env: Env, caller: Address, grant_id: u64) -> Result<i128, Error> {
        caller.require_auth();
        escrow::cancel_grant(&env, &caller, grant_id)
    }

    // ─── Voting ─────────────────────────────────────────────

    /// Cast or replace `voter`'s ballot. The weight is the voter's voting
    /// power at this moment.
    pub fn cast_vote(
        env: Env,
        voter: Address,
        session_id: u64,
        choice: VoteChoice,
        rationale: Option<String>,
    ) -> Result<Vote, Error> {
        voter.require_auth();
        voting::cast_vote(&env, &voter, session_id, choice, rationale)
    }

    pub fn get_session(env: Env, session_id: u64) -> Result<VotingSession, Error> {
        storage::load_session(&env, session_id)
    }

    /// Current tally of a session. Read-only; for a finalized session the
    /// stored result is authoritative.
    pub fn get_tally(env: Env, session_id: u64) -> Result<Tally, Error> {
        let session = storage::load_session(&env, session_id)?;
        Ok(voting::tally_session(&env, &session))
    }

    pub fn get_vote(env: Env, session_id: u64, voter: Address) -> Option<Vote> {
        storage::load_vote(&env, session_id, &voter)
    }

    /// One page of a session's voters in first-cast order. `limit` is capped
    /// at [`MAX_VOTER_PAGE`].
    pub fn get_voters(
        env: Env,
        session_id: u64,
        start: u32,
        limit: u32,
    ) -> Result<Vec<Address>, Error> {
        let session = storage::load_session(&env, session_id)?;
        Ok(voting::voters(&env, &session, start, limit))
    }

    // ─── Staking ────────────────────────────────────────────

    /// Lock `amount` governance tokens. Restarts the lock period.
    pub fn stake(env: Env, staker: Address, amount: i128) -> Result<StakingInfo, Error> {
        staker.require_auth();
        stake::stake(&env, &staker, amount)?;
        stake::staking_info(&env, &staker)
    }

    pub fn unstake(env: Env, staker: Address, amount: i128) -> Result<StakingInfo, Error> {
        staker.require_auth();
        stake::unstake(&env, &staker, amount)?;
        stake::staking_info(&env, &staker)
    }

    pub fn voting_power_of(env: Env, account: Address) -> Result<i128, Error> {
        stake::voting_power_of(&env, &account)
    }

    pub fn get_stake(env: Env, account: Address) -> Result<StakingInfo, Error> {
        stake::staking_info(&env, &account)
    }

    /// Reputation hook for external governance processes. Admin only.
    pub fn set_reputation(
        env: Env,
        authority: Address,
        account: Address,
        score: u32,
    ) -> Result<(), Error> {
        authority.require_auth();
        Self::require_admin(&env, &authority)?;
        stake::set_reputation(&env, &account, score);
        Ok(())
    }
}

impl GrantDao {
    fn require_admin(env: &Env, caller: &Address) -> Result<(), Error> {
        if storage::get_admin(env)? != *caller {
            return Err(Error::Unauthorized);
        }
        Ok(())
    }
}
