//! Tunable duel rules

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Most conversions a combatant may ever spend in one match
pub const CONVERSION_CAP: u8 = 2;

/// Balance constants for a duel
///
/// Snapshotted into every [`MatchState`](crate::MatchState) at creation so a
/// stored match always replays under the rules it was started with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelRules {
    pub base_hp: u32,
    pub hp_per_level: u32,
    pub base_pool: u32,
    /// Pool gained per strength (attack) or defense (defense) point
    pub pool_per_point: u32,
    /// Conversions allowed per combatant, at most [`CONVERSION_CAP`]
    pub max_conversions: u8,
    /// HP gained per 100 attack converted, floored
    pub hp_conversion_percent: u32,
    /// Attack gained per 100 defense converted, floored
    pub attack_conversion_percent: u32,
    /// A single hit of at least this share of max HP stuns the target
    /// for its next turn. `None` disables stuns.
    pub stun_threshold_percent: Option<u8>,
}

impl DuelRules {
    /// Rules used by the live duel screen
    pub fn standard() -> Self {
        Self {
            base_hp: 150,
            hp_per_level: 15,
            base_pool: 100,
            pool_per_point: 5,
            max_conversions: CONVERSION_CAP,
            hp_conversion_percent: 50,
            attack_conversion_percent: 100,
            stun_threshold_percent: Some(50),
        }
    }

    /// Parse rules from JSON; absent fields take their standard value
    pub fn from_json(json: &str) -> Result<Self, RulesError> {
        let rules: Self =
            serde_json::from_str(json).map_err(|e| RulesError::Parse(e.to_string()))?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> Result<(), RulesError> {
        if self.base_hp == 0 {
            return Err(RulesError::ZeroBaseHp);
        }
        if self.max_conversions > CONVERSION_CAP {
            return Err(RulesError::ConversionCap(self.max_conversions));
        }
        if self.hp_conversion_percent > 100 {
            return Err(RulesError::ConversionGain {
                field: "hp_conversion_percent",
                value: self.hp_conversion_percent,
            });
        }
        if self.attack_conversion_percent > 100 {
            return Err(RulesError::ConversionGain {
                field: "attack_conversion_percent",
                value: self.attack_conversion_percent,
            });
        }
        if let Some(p) = self.stun_threshold_percent {
            if p == 0 || p > 100 {
                return Err(RulesError::StunThreshold(p));
            }
        }
        Ok(())
    }
}

impl Default for DuelRules {
    fn default() -> Self {
        Self::standard()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("invalid rules JSON: {0}")]
    Parse(String),

    #[error("base_hp must be greater than zero")]
    ZeroBaseHp,

    #[error("max_conversions = {0}: at most 2 conversions per match")]
    ConversionCap(u8),

    #[error("{field} = {value}: conversions may not create resources (max 100)")]
    ConversionGain { field: &'static str, value: u32 },

    #[error("stun_threshold_percent = {0}: must be within 1..=100")]
    StunThreshold(u8),
}
