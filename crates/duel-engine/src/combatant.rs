//! Per-match combatant resource state

use serde::{Deserialize, Serialize};
use crate::stats::CombatStats;

/// Resource state of one side of a duel
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantState {
    pub max_hp: u32,
    pub hp: u32,
    /// Remaining attack budget for the match
    pub attack_pool: u32,
    /// Remaining defense budget for the match
    pub defense_pool: u32,
    pub conversions_used: u8,
    /// Set by Defend, cleared at the end of every turn
    pub is_defending: bool,
    pub defense_used: u32,
    /// Loses its next turn
    pub is_stunned: bool,
}

impl CombatantState {
    /// Fresh combatant with full HP and full pools
    pub fn from_stats(stats: &CombatStats) -> Self {
        Self {
            max_hp: stats.max_hp,
            hp: stats.max_hp,
            attack_pool: stats.attack,
            defense_pool: stats.defense,
            conversions_used: 0,
            is_defending: false,
            defense_used: 0,
            is_stunned: false,
        }
    }

    /// Both pools are spent
    pub fn is_exhausted(&self) -> bool {
        self.attack_pool == 0 && self.defense_pool == 0
    }

    pub fn is_knocked_out(&self) -> bool {
        self.hp == 0
    }

    /// Current HP as a whole percentage of max HP
    pub fn hp_percent(&self) -> u32 {
        if self.max_hp == 0 {
            return 0;
        }
        (self.hp as u64 * 100 / self.max_hp as u64) as u32
    }

    pub fn conversions_left(&self, cap: u8) -> u8 {
        cap.saturating_sub(self.conversions_used)
    }

    pub(crate) fn clear_turn_flags(&mut self) {
        self.is_defending = false;
        self.defense_used = 0;
    }
}
