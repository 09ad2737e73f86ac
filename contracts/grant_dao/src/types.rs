//! # Types
//!
//! Data structures shared by the registry, escrow, voting and staking modules.
//!
//! ## Config / State split
//!
//! A grant is stored as two ledger entries:
//!
//! - [`GrantConfig`]: written once by `create_grant`; never mutated.
//! - [`GrantState`]: written on assignment, submission, release and cancel.
//!
//! The public API returns the reconstructed [`Grant`].
//!
//! ## Milestone lifecycle
//!
//! ```text
//! Pending ──submit──► Submitted ──open──► VotingOpen
//!    ▲                    ▲                  │
//!    │                    └──resubmit── Rejected ◄── finalize(Rejected)
//!    └──────────────── finalize(Inconclusive)┤
//!                                            └─ finalize(Approved) ─► Approved ─► Released
//! ```
//!
//! `Submitted` and `Approved` are transient: submission opens the vote in the
//! same invocation and approval releases funds in the same invocation, so the
//! persisted status moves straight to `VotingOpen` / `Released`.

use soroban_sdk::{contracttype, Address, BytesN, String};

/// Basis-point denominator for approval thresholds.
pub const BPS_DENOMINATOR: u32 = 10_000;

/// Lifecycle status of a grant.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GrantStatus {
    /// Funds escrowed; no grantee yet.
    Created,
    /// Grantee set; nothing submitted yet.
    GranteeAssigned,
    /// At least one milestone has been submitted.
    InProgress,
    /// Every milestone released.
    Completed,
    /// Funder withdrew the grant before any work was submitted.
    Cancelled,
}

/// Lifecycle status of a single milestone.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MilestoneStatus {
    Pending,
    Submitted,
    VotingOpen,
    Approved,
    Rejected,
    Released,
}

impl MilestoneStatus {
    /// Whether the grantee may (re)submit proof from this status.
    pub fn accepts_submission(&self) -> bool {
        matches!(self, MilestoneStatus::Pending | MilestoneStatus::Rejected)
    }
}

/// Quorum and approval threshold applied to a vote.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct VotingRules {
    /// Minimum number of distinct voters for a decisive outcome.
    pub min_votes: u32,
    /// Approve share of total weight required, in basis points (1..=10_000).
    pub approval_threshold_bps: u32,
}

/// Monotone non-decreasing bonus added to a staker's voting power.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReputationBonus {
    /// Voting power equals staked amount.
    Disabled,
    /// `reputation * per_point`.
    Linear(i128),
    /// `min(reputation * per_point, cap)`.
    Capped(i128, i128),
}

/// Protocol-wide configuration, stored in instance storage.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProtocolConfig {
    /// Seconds a stake stays locked after the last `stake` call.
    pub min_lock_duration: u64,
    pub reputation_bonus: ReputationBonus,
    /// Rules snapshotted into every grant created under this config.
    pub voting_rules: VotingRules,
}

impl ProtocolConfig {
    /// Reject thresholds outside `(0, 100%]`, an empty quorum and negative
    /// bonus parameters (which would make the bonus decreasing).
    pub fn is_valid(&self) -> bool {
        let rules = &self.voting_rules;
        let bonus_ok = match self.reputation_bonus {
            ReputationBonus::Disabled => true,
            ReputationBonus::Linear(per_point) => per_point >= 0,
            ReputationBonus::Capped(per_point, cap) => per_point >= 0 && cap >= 0,
        };
        rules.min_votes > 0
            && rules.approval_threshold_bps > 0
            && rules.approval_threshold_bps <= BPS_DENOMINATOR
            && bonus_ok
    }
}

/// Immutable grant configuration, written once at creation.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GrantConfig {
    pub id: u64,
    pub funder: Address,
    pub title: String,
    pub total_amount: i128,
    pub milestone_count: u32,
    /// Content hash of the grant proposal document.
    pub proof_anchor: BytesN<32>,
    /// Length of every voting window, in seconds.
    pub voting_period: u64,
    pub voting_rules: VotingRules,
    pub created_at: u64,
}

/// Mutable grant state.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GrantState {
    pub grantee: Option<Address>,
    pub status: GrantStatus,
    /// Funds still held in custody for this grant.
    pub escrow_balance: i128,
    /// Sum of all released milestone amounts.
    pub released_amount: i128,
    pub released_count: u32,
}

/// Full grant view returned by the public API.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Grant {
    pub id: u64,
    pub funder: Address,
    pub title: String,
    pub total_amount: i128,
    pub milestone_count: u32,
    pub proof_anchor: BytesN<32>,
    pub voting_period: u64,
    pub voting_rules: VotingRules,
    pub created_at: u64,
    pub grantee: Option<Address>,
    pub status: GrantStatus,
    pub escrow_balance: i128,
    pub released_amount: i128,
    pub released_count: u32,
}

impl Grant {
    pub fn from_parts(config: GrantConfig, state: GrantState) -> Self {
        Grant {
            id: config.id,
            funder: config.funder,
            title: config.title,
            total_amount: config.total_amount,
            milestone_count: config.milestone_count,
            proof_anchor: config.proof_anchor,
            voting_period: config.voting_period,
            voting_rules: config.voting_rules,
            created_at: config.created_at,
            grantee: state.grantee,
            status: state.status,
            escrow_balance: state.escrow_balance,
            released_amount: state.released_amount,
            released_count: state.released_count,
        }
    }
}

/// A fixed-amount checkpoint within a grant.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Milestone {
    pub index: u32,
    /// Empty until the funder sets the milestone's details.
    pub title: String,
    pub description: String,
    pub amount: i128,
    pub status: MilestoneStatus,
    /// Content hash of the latest submitted proof.
    pub proof_anchor: Option<BytesN<32>>,
    /// Ledger timestamp of the latest submission (0 if never submitted).
    pub submitted_at: u64,
    /// Latest voting session opened for this milestone.
    pub session_id: Option<u64>,
    pub submissions: u32,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionStatus {
    Active,
    Finalized,
}

/// Result of a tally. `Pending` means the vote is not yet decidable.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    Pending,
    Approved,
    Rejected,
    Inconclusive,
}

/// A bounded-time vote on one milestone submission.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VotingSession {
    pub id: u64,
    pub grant_id: u64,
    pub milestone_index: u32,
    pub start_time: u64,
    /// Votes are accepted while `now <= end_time`.
    pub end_time: u64,
    pub rules: VotingRules,
    /// Running totals over the latest ballot of every voter.
    pub totals: BallotTotals,
    pub status: SessionStatus,
    /// `Pending` until finalized.
    pub result: Outcome,
}

/// Weight on each side plus the number of distinct voters.
#[contracttype]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct BallotTotals {
    pub approve_weight: i128,
    pub reject_weight: i128,
    pub vote_count: u32,
}

impl BallotTotals {
    /// Count a voter's first ballot.
    pub fn record(&mut self, choice: VoteChoice, weight: i128) {
        self.add_weight(choice, weight);
        self.vote_count = self.vote_count.saturating_add(1);
    }

    /// Swap a voter's `previous` ballot for a new one. The voter count is
    /// unchanged.
    pub fn replace(&mut self, previous: &Vote, choice: VoteChoice, weight: i128) {
        match previous.choice {
            VoteChoice::Approve => {
                self.approve_weight = self.approve_weight.saturating_sub(previous.weight)
            }
            VoteChoice::Reject => {
                self.reject_weight = self.reject_weight.saturating_sub(previous.weight)
            }
        }
        self.add_weight(choice, weight);
    }

    fn add_weight(&mut self, choice: VoteChoice, weight: i128) {
        match choice {
            VoteChoice::Approve => self.approve_weight = self.approve_weight.saturating_add(weight),
            VoteChoice::Reject => self.reject_weight = self.reject_weight.saturating_add(weight),
        }
    }
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VoteChoice {
    Approve,
    Reject,
}

/// One voter's ballot in a session. Recast ballots overwrite this record.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Vote {
    pub voter: Address,
    pub choice: VoteChoice,
    /// Voting power snapshot taken when the ballot was cast.
    pub weight: i128,
    pub rationale: Option<String>,
    pub cast_at: u64,
}

/// Weighted tally of a session.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Tally {
    pub approve_weight: i128,
    pub reject_weight: i128,
    pub vote_count: u32,
    pub outcome: Outcome,
}

/// A participant's stake in the governance token.
#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct StakePosition {
    pub amount: i128,
    /// Start of the current lock period.
    pub staked_at: u64,
    /// End of the latest voting window this stake was counted in. The stake
    /// stays locked through it.
    pub locked_until: u64,
    /// Set by the reputation authority only.
    pub reputation: u32,
}

/// Read model returned by `get_stake`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StakingInfo {
    pub staked: i128,
    pub staked_at: u64,
    pub reputation: u32,
    pub voting_power: i128,
    /// Earliest timestamp at which `unstake` is accepted.
    pub unlocks_at: u64,
}
