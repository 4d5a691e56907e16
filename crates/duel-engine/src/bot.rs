//! Bot decision heuristic

use serde::{Deserialize, Serialize};
use crate::action::Action;
use crate::combatant::CombatantState;
use crate::random::RandomSource;
use crate::rules::DuelRules;

/// Chooses the opponent's action each turn
///
/// Implementations must be pure: the same inputs and the same random
/// stream always yield the same action.
pub trait BotPolicy {
    fn decide(
        &self,
        me: &CombatantState,
        opponent: &CombatantState,
        turn_number: u32,
        rules: &DuelRules,
        rng: &mut dyn RandomSource,
    ) -> Action;
}

/// Bot temperament
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BotStyle {
    /// Even split between pressure and guarding.
    #[default]
    Balanced,
    /// Attacks most turns with large commitments.
    Aggressive,
    /// Guards often, heals early.
    Defensive,
}

/// Heuristic parameters for fine-tuning behavior
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotParams {
    /// Percentage chance to attack when both pools are available (0-100)
    pub aggression: u8,
    /// Convert attack to HP when own HP drops below this percent
    pub heal_below: u8,
    /// Go all in once opponent HP is at or below this percent
    pub finisher_at: u8,
    /// Smallest share of a pool committed in one turn (percent)
    pub min_commit: u8,
    /// Largest share of a pool committed in one turn (percent)
    pub max_commit: u8,
}

impl BotStyle {
    pub fn params(&self) -> BotParams {
        match self {
            BotStyle::Balanced => BotParams {
                aggression: 55,
                heal_below: 35,
                finisher_at: 25,
                min_commit: 25,
                max_commit: 50,
            },
            BotStyle::Aggressive => BotParams {
                aggression: 80,
                heal_below: 20,
                finisher_at: 35,
                min_commit: 40,
                max_commit: 80,
            },
            BotStyle::Defensive => BotParams {
                aggression: 35,
                heal_below: 50,
                finisher_at: 15,
                min_commit: 20,
                max_commit: 40,
            },
        }
    }
}

/// Default policy driven by a [`BotStyle`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StyledBot {
    pub params: BotParams,
}

impl StyledBot {
    pub fn new(style: BotStyle) -> Self {
        Self { params: style.params() }
    }

    pub fn with_params(params: BotParams) -> Self {
        Self { params }
    }

    /// Amount to commit from `pool` this turn, always within 1..=pool
    fn commit(&self, pool: u32, turn_number: u32, rng: &mut dyn RandomSource) -> u32 {
        let lo = self.params.min_commit.min(100) as u32;
        let hi = self.params.max_commit.clamp(self.params.min_commit, 100) as u32;
        // Opening turn probes with the smallest commitment
        let percent = if turn_number <= 1 { lo } else { rng.next_between(lo, hi) };
        share(pool, percent)
    }
}

impl Default for StyledBot {
    fn default() -> Self {
        Self::new(BotStyle::default())
    }
}

impl BotPolicy for StyledBot {
    fn decide(
        &self,
        me: &CombatantState,
        opponent: &CombatantState,
        turn_number: u32,
        rules: &DuelRules,
        rng: &mut dyn RandomSource,
    ) -> Action {
        if me.is_stunned || me.is_exhausted() {
            return Action::Skip;
        }

        let can_convert = me.conversions_left(rules.max_conversions) > 0;

        // Patch up before it is too late
        if can_convert
            && me.attack_pool > 0
            && me.hp < me.max_hp
            && me.hp_percent() < self.params.heal_below as u32
        {
            return Action::ConvertAttackToHp(self.commit(me.attack_pool, turn_number, rng));
        }

        // Close out a nearly beaten opponent
        if me.attack_pool > 0 && opponent.hp_percent() <= self.params.finisher_at as u32 {
            return Action::Attack(me.attack_pool.min(opponent.hp.max(1)));
        }

        if me.attack_pool == 0 {
            // Only defense left: rearm or turtle
            if can_convert && rng.next_percent() < self.params.aggression {
                let amount = self.commit(me.defense_pool, turn_number, rng);
                return Action::ConvertDefenseToAttack(amount);
            }
            return Action::Defend(self.commit(me.defense_pool, turn_number, rng));
        }

        if me.defense_pool == 0 {
            return Action::Attack(self.commit(me.attack_pool, turn_number, rng));
        }

        if rng.next_percent() < self.params.aggression {
            Action::Attack(self.commit(me.attack_pool, turn_number, rng))
        } else {
            Action::Defend(self.commit(me.defense_pool, turn_number, rng))
        }
    }
}

fn share(pool: u32, percent: u32) -> u32 {
    let amount = (pool as u64 * percent as u64 / 100) as u32;
    amount.clamp(1, pool.max(1))
}

/// Get a human-readable description of a bot style
pub fn describe_style(style: BotStyle) -> String {
    let base = match style {
        BotStyle::Balanced => "Mixes attacks and guards evenly.",
        BotStyle::Aggressive => "Presses the attack with big commitments.",
        BotStyle::Defensive => "Guards often and heals early.",
    };
    let params = style.params();
    format!(
        "{} Attacks {}% of the time, heals below {}% HP.",
        base, params.aggression, params.heal_below
    )
}
