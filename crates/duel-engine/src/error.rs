//! Error taxonomy for the duel engine
//!
//! - [`ActionError`]: a declared action breaks a resource or conversion rule.
//!   Always recoverable; the state it was checked against is untouched.
//! - [`InvariantViolation`]: a programming error on the caller's or engine's
//!   side, never user-facing.
//! - [`RewardError`]: reward distribution requested with bad inputs.

use thiserror::Error;
use crate::duel::MatchState;
use crate::rules::RulesError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("{action} needs an amount greater than zero")]
    ZeroAmount { action: &'static str },

    #[error("not enough attack: requested {requested}, {available} left")]
    InsufficientAttack { requested: u32, available: u32 },

    #[error("not enough defense: requested {requested}, {available} left")]
    InsufficientDefense { requested: u32, available: u32 },

    #[error("conversion limit reached ({used}/{max} used)")]
    ConversionLimit { used: u8, max: u8 },

    #[error("cannot skip while resources remain (attack {attack_pool}, defense {defense_pool})")]
    SkipWithResources { attack_pool: u32, defense_pool: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("match already finished on turn {turn}")]
    MatchFinished { turn: u32 },

    #[error("hp {hp} outside [0, {max_hp}] after resolution")]
    HpOutOfRange { hp: u32, max_hp: u32 },

    #[error("{action} reached resolution but is illegal: {reason}")]
    Unresolvable { action: String, reason: ActionError },

    #[error("match carries invalid rules: {0}")]
    InvalidRules(RulesError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DuelError {
    /// The player's action was refused. `state` is the input state with the
    /// reason appended to its log and nothing else changed.
    #[error("turn rejected: {error}")]
    Rejected {
        error: ActionError,
        state: Box<MatchState>,
    },

    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

impl DuelError {
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RewardError {
    #[error("match has not reached a result yet")]
    MatchNotFinished,

    #[error("requested {requested} points but only {available} available")]
    Overspend { requested: u32, available: u8 },

    #[error("no reward points left to assign")]
    NothingToAssign,
}
