//! Action definitions and resolution

use core::fmt;
use serde::{Deserialize, Serialize};
use crate::combatant::CombatantState;
use crate::error::ActionError;
use crate::rules::DuelRules;

/// One declared action for one turn
///
/// Serialized adjacently tagged: `{"type": "Attack", "amount": 120}`,
/// `{"type": "Skip"}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "amount")]
pub enum Action {
    /// Spend attack pool as damage
    Attack(u32),
    /// Spend defense pool to mitigate this turn's incoming damage
    Defend(u32),
    /// Spend attack pool to restore HP. Ends the turn.
    ConvertAttackToHp(u32),
    /// Move defense pool into attack pool. Ends the turn.
    ConvertDefenseToAttack(u32),
    /// Only legal once both pools are empty
    Skip,
}

impl Action {
    pub const fn name(&self) -> &'static str {
        match self {
            Action::Attack(_) => "Attack",
            Action::Defend(_) => "Defend",
            Action::ConvertAttackToHp(_) => "ConvertAttackToHp",
            Action::ConvertDefenseToAttack(_) => "ConvertDefenseToAttack",
            Action::Skip => "Skip",
        }
    }

    /// Committed amount; zero for Skip
    pub const fn amount(&self) -> u32 {
        match *self {
            Action::Attack(a)
            | Action::Defend(a)
            | Action::ConvertAttackToHp(a)
            | Action::ConvertDefenseToAttack(a) => a,
            Action::Skip => 0,
        }
    }

    /// Same action kind with a different amount
    pub const fn with_amount(&self, amount: u32) -> Self {
        match self {
            Action::Attack(_) => Action::Attack(amount),
            Action::Defend(_) => Action::Defend(amount),
            Action::ConvertAttackToHp(_) => Action::ConvertAttackToHp(amount),
            Action::ConvertDefenseToAttack(_) => Action::ConvertDefenseToAttack(amount),
            Action::Skip => Action::Skip,
        }
    }

    pub const fn is_conversion(&self) -> bool {
        matches!(self, Action::ConvertAttackToHp(_) | Action::ConvertDefenseToAttack(_))
    }

    /// Defense this action puts up against the opponent's attack this turn
    pub const fn declared_defense(&self) -> u32 {
        match *self {
            Action::Defend(a) => a,
            _ => 0,
        }
    }

    /// Upper bound on the amount `actor` could commit for this action kind
    pub fn available(&self, actor: &CombatantState) -> u32 {
        match self {
            Action::Attack(_) | Action::ConvertAttackToHp(_) => actor.attack_pool,
            Action::Defend(_) | Action::ConvertDefenseToAttack(_) => actor.defense_pool,
            Action::Skip => 0,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Skip => f.write_str("Skip"),
            other => write!(f, "{}({})", other.name(), other.amount()),
        }
    }
}

/// Result of resolving one action against one actor
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Actor state after paying for the action
    pub actor: CombatantState,
    /// Damage to apply to the opponent
    pub damage_dealt: u32,
    /// Portion of the attack absorbed by the opponent's Defend
    pub blocked: u32,
    pub healed: u32,
    /// Attack pool gained from a defense conversion
    pub buff_gained: u32,
}

impl Resolution {
    pub(crate) fn unchanged(actor: &CombatantState) -> Self {
        Self {
            actor: actor.clone(),
            damage_dealt: 0,
            blocked: 0,
            healed: 0,
            buff_gained: 0,
        }
    }
}

/// Check an action against the actor's resources without resolving it
pub fn validate(
    action: Action,
    actor: &CombatantState,
    rules: &DuelRules,
) -> Result<(), ActionError> {
    if action.is_conversion() && actor.conversions_used >= rules.max_conversions {
        return Err(ActionError::ConversionLimit {
            used: actor.conversions_used,
            max: rules.max_conversions,
        });
    }

    match action {
        Action::Attack(amount) | Action::ConvertAttackToHp(amount) => {
            if amount == 0 {
                return Err(ActionError::ZeroAmount { action: action.name() });
            }
            if amount > actor.attack_pool {
                return Err(ActionError::InsufficientAttack {
                    requested: amount,
                    available: actor.attack_pool,
                });
            }
        }
        Action::Defend(amount) | Action::ConvertDefenseToAttack(amount) => {
            if amount == 0 {
                return Err(ActionError::ZeroAmount { action: action.name() });
            }
            if amount > actor.defense_pool {
                return Err(ActionError::InsufficientDefense {
                    requested: amount,
                    available: actor.defense_pool,
                });
            }
        }
        Action::Skip => {
            if !actor.is_exhausted() {
                return Err(ActionError::SkipWithResources {
                    attack_pool: actor.attack_pool,
                    defense_pool: actor.defense_pool,
                });
            }
        }
    }

    Ok(())
}

/// Split an attack into (damage, blocked) against committed defense
///
/// Only defense declared this turn mitigates; an unused defense pool is
/// not a standing shield.
pub fn mitigate(attack: u32, opponent_defense_used: u32) -> (u32, u32) {
    let damage = attack.saturating_sub(opponent_defense_used);
    (damage, attack - damage)
}

/// Resolve one action for `actor`
///
/// `opponent_defense_used` is the defense the opponent declared this same
/// turn (zero when it did not Defend). On error nothing is changed.
pub fn resolve(
    action: Action,
    actor: &CombatantState,
    opponent_defense_used: u32,
    rules: &DuelRules,
) -> Result<Resolution, ActionError> {
    validate(action, actor, rules)?;

    let mut out = Resolution::unchanged(actor);
    let me = &mut out.actor;

    match action {
        Action::Attack(amount) => {
            me.attack_pool -= amount;
            let (damage, blocked) = mitigate(amount, opponent_defense_used);
            out.damage_dealt = damage;
            out.blocked = blocked;
        }
        Action::Defend(amount) => {
            me.defense_pool -= amount;
            me.is_defending = true;
            me.defense_used = amount;
        }
        Action::ConvertAttackToHp(amount) => {
            me.attack_pool -= amount;
            let restored = scale(amount, rules.hp_conversion_percent);
            let new_hp = me.hp.saturating_add(restored).min(me.max_hp);
            out.healed = new_hp - me.hp;
            me.hp = new_hp;
            me.conversions_used += 1;
        }
        Action::ConvertDefenseToAttack(amount) => {
            me.defense_pool -= amount;
            let gained = scale(amount, rules.attack_conversion_percent);
            me.attack_pool = me.attack_pool.saturating_add(gained);
            out.buff_gained = gained;
            me.conversions_used += 1;
        }
        Action::Skip => {}
    }

    Ok(out)
}

fn scale(amount: u32, percent: u32) -> u32 {
    (amount as u64 * percent as u64 / 100) as u32
}
