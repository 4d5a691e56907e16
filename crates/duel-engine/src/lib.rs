//! Duel Engine for the fitness arena
//!
//! Turn-based resource-attrition PvP combat: profile attributes become
//! attack/defense budgets, both sides declare one action per turn, and the
//! match ends on a knockout or once every pool is spent.
//! This crate is compiled to:
//! - Native (for the host service)
//! - WASM (for the duel screen)

mod random;
mod rules;
mod stats;
mod combatant;
mod action;
mod bot;
mod duel;
mod reward;
mod error;

#[cfg(feature = "wasm")]
mod wasm;

pub use random::{RandomSource, SeededRng};
pub use rules::{DuelRules, RulesError, CONVERSION_CAP};
pub use stats::{derive_stats, Attributes, CombatProfile, CombatStats};
pub use combatant::CombatantState;
pub use action::{mitigate, resolve, validate, Action, Resolution};
pub use bot::{describe_style, BotParams, BotPolicy, BotStyle, StyledBot};
pub use duel::{
    create_match, create_match_with, replay, submit_turn, submit_turn_with, EndReason,
    MatchOutcome, MatchSetup, MatchState, OpponentKind, Phase, TurnRecord, Winner,
};
pub use reward::{
    allocate_reward, points_available, reward_points, PointsToAssign, ProfileDelta,
    RewardAllocation, RewardStat,
};
pub use error::{ActionError, DuelError, InvariantViolation, RewardError};
