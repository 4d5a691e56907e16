//! Profile attributes to combat stats

use serde::{Deserialize, Serialize};
use crate::rules::DuelRules;

/// Biometric attributes stored on a player profile
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Attributes {
    pub strength: u32,
    pub speed: u32,
    pub defense: u32,
}

/// The slice of a player profile the duel needs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatProfile {
    #[serde(default = "default_level")]
    pub level: u32,
    #[serde(default)]
    pub attributes: Attributes,
}

fn default_level() -> u32 {
    1
}

impl CombatProfile {
    pub fn new(level: u32, strength: u32, speed: u32, defense: u32) -> Self {
        Self {
            level,
            attributes: Attributes { strength, speed, defense },
        }
    }
}

impl Default for CombatProfile {
    fn default() -> Self {
        Self { level: 1, attributes: Attributes::default() }
    }
}

/// Starting stats for one combatant
///
/// `attack` and `defense` are the whole match budget for each pool, not
/// standing stats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatStats {
    pub max_hp: u32,
    pub attack: u32,
    pub defense: u32,
}

/// Derive combat stats from a profile
///
/// ```text
/// max_hp  = base_hp   + level    * hp_per_level
/// attack  = base_pool + strength * pool_per_point
/// defense = base_pool + defense  * pool_per_point
/// ```
pub fn derive_stats(profile: &CombatProfile, rules: &DuelRules) -> CombatStats {
    let level = profile.level.max(1);
    let attrs = &profile.attributes;

    CombatStats {
        max_hp: rules
            .base_hp
            .saturating_add(level.saturating_mul(rules.hp_per_level))
            .max(1),
        attack: rules
            .base_pool
            .saturating_add(attrs.strength.saturating_mul(rules.pool_per_point)),
        defense: rules
            .base_pool
            .saturating_add(attrs.defense.saturating_mul(rules.pool_per_point)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_ten_profile() {
        let profile = CombatProfile::new(10, 10, 10, 10);
        let stats = derive_stats(&profile, &DuelRules::standard());
        assert_eq!(stats, CombatStats { max_hp: 300, attack: 150, defense: 150 });
    }

    #[test]
    fn test_fresh_profile() {
        let stats = derive_stats(&CombatProfile::default(), &DuelRules::standard());
        assert_eq!(stats.max_hp, 165);
        assert_eq!(stats.attack, 100);
        assert_eq!(stats.defense, 100);
    }

    #[test]
    fn test_level_zero_treated_as_one() {
        let rules = DuelRules::standard();
        let zero = derive_stats(&CombatProfile::new(0, 0, 0, 0), &rules);
        let one = derive_stats(&CombatProfile::new(1, 0, 0, 0), &rules);
        assert_eq!(zero, one);
    }

    #[test]
    fn test_hp_monotonic_in_level() {
        let rules = DuelRules::standard();
        let mut last = 0;
        for level in 1..50 {
            let hp = derive_stats(&CombatProfile::new(level, 0, 0, 0), &rules).max_hp;
            assert!(hp > last);
            last = hp;
        }
    }

    #[test]
    fn test_speed_does_not_affect_pools() {
        let rules = DuelRules::standard();
        let slow = derive_stats(&CombatProfile::new(5, 3, 0, 4), &rules);
        let fast = derive_stats(&CombatProfile::new(5, 3, 99, 4), &rules);
        assert_eq!(slow, fast);
    }

    #[test]
    fn test_missing_attributes_default_to_zero() {
        let profile: CombatProfile =
            serde_json::from_str(r#"{"level": 4, "attributes": {"strength": 2}}"#).unwrap();
        assert_eq!(profile.attributes, Attributes { strength: 2, speed: 0, defense: 0 });

        let bare: CombatProfile = serde_json::from_str("{}").unwrap();
        assert_eq!(bare, CombatProfile::default());
    }
}
