//! End-of-match reward distribution

use serde::{Deserialize, Serialize};
use crate::duel::{MatchState, OpponentKind, Winner};
use crate::error::RewardError;
use crate::stats::Attributes;

/// Attribute a reward point can go into
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardStat {
    Strength,
    Defense,
}

/// Points the winner asked to put into each attribute
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PointsToAssign {
    pub strength: u32,
    pub defense: u32,
}

/// Permanent attribute change to persist on the player's profile
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileDelta {
    #[serde(skip_serializing_if = "is_zero")]
    pub strength: u32,
    #[serde(skip_serializing_if = "is_zero")]
    pub defense: u32,
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

impl ProfileDelta {
    pub fn is_empty(&self) -> bool {
        self.strength == 0 && self.defense == 0
    }

    /// Attributes after this delta is applied
    pub fn apply_to(&self, attributes: &Attributes) -> Attributes {
        Attributes {
            strength: attributes.strength.saturating_add(self.strength),
            defense: attributes.defense.saturating_add(self.defense),
            ..*attributes
        }
    }
}

/// Points on offer for a finished match
///
/// Nothing for a loss or a draw, one for beating a bot, two for beating
/// another player's profile.
pub fn points_available(winner: Winner, kind: OpponentKind) -> u8 {
    match (winner, kind) {
        (Winner::Player, OpponentKind::Bot) => 1,
        (Winner::Player, OpponentKind::Human) => 2,
        (Winner::Opponent | Winner::Draw, _) => 0,
    }
}

/// Points on offer for `state`, once it has reached a result
pub fn reward_points(state: &MatchState) -> Result<u8, RewardError> {
    let winner = state.winner().ok_or(RewardError::MatchNotFinished)?;
    Ok(points_available(winner, state.opponent_kind))
}

/// Turn the winner's distribution into a profile delta
///
/// Pure: the same finished state and the same request always give the same
/// delta, so callers may retry persisting it without recomputing.
pub fn allocate_reward(
    state: &MatchState,
    points: PointsToAssign,
) -> Result<ProfileDelta, RewardError> {
    let available = reward_points(state)?;
    let requested = points.strength.saturating_add(points.defense);
    if requested > available as u32 {
        return Err(RewardError::Overspend { requested, available });
    }
    Ok(ProfileDelta { strength: points.strength, defense: points.defense })
}

/// One-point-at-a-time distribution, mirroring the reward screen
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardAllocation {
    available: u8,
    assigned: PointsToAssign,
}

impl RewardAllocation {
    pub fn new(available: u8) -> Self {
        Self { available, assigned: PointsToAssign::default() }
    }

    pub fn for_match(state: &MatchState) -> Result<Self, RewardError> {
        Ok(Self::new(reward_points(state)?))
    }

    pub fn remaining(&self) -> u8 {
        let used = self.assigned.strength + self.assigned.defense;
        self.available.saturating_sub(used.min(u8::MAX as u32) as u8)
    }

    pub fn assign(&mut self, stat: RewardStat) -> Result<(), RewardError> {
        if self.remaining() == 0 {
            return Err(RewardError::NothingToAssign);
        }
        match stat {
            RewardStat::Strength => self.assigned.strength += 1,
            RewardStat::Defense => self.assigned.defense += 1,
        }
        Ok(())
    }

    /// Take a point back; returns false if none was assigned there
    pub fn unassign(&mut self, stat: RewardStat) -> bool {
        let slot = match stat {
            RewardStat::Strength => &mut self.assigned.strength,
            RewardStat::Defense => &mut self.assigned.defense,
        };
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    pub fn assigned(&self) -> PointsToAssign {
        self.assigned
    }
}
