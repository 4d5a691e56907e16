//! Duel lifecycle and turn resolution
//!
//! A match moves `Setup -> Resolving -> (Setup | Result)`. Every call to
//! [`submit_turn`] takes the current [`MatchState`] by reference and returns
//! the next one; the input is never touched.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use crate::action::{resolve, validate, Action, Resolution};
use crate::bot::{BotPolicy, BotStyle, StyledBot};
use crate::combatant::CombatantState;
use crate::error::{ActionError, DuelError, InvariantViolation};
use crate::random::{RandomSource, SeededRng};
use crate::rules::DuelRules;
use crate::stats::{derive_stats, CombatProfile};

/// Who sits across from the player
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpponentKind {
    Bot,
    /// Another player's profile, driven locally by the bot heuristic
    Human,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for the player's action
    Setup,
    /// A turn is being resolved; never observed outside [`submit_turn`]
    Resolving,
    /// Terminal
    Result,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Winner {
    Player,
    Opponent,
    Draw,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndReason {
    KnockOut,
    /// Every pool on both sides ran dry
    Exhaustion,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub winner: Winner,
    pub reason: EndReason,
    /// Turn on which the match ended
    pub turn: u32,
}

/// Result of a single resolved turn
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub turn: u32,
    pub player_action: Action,
    pub opponent_action: Action,
    pub damage_to_player: u32,
    pub damage_to_opponent: u32,
    pub player_hp: u32,
    pub opponent_hp: u32,
}

/// Everything needed to start a match besides the two profiles
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSetup {
    pub rules: DuelRules,
    pub bot: BotStyle,
    /// Randomness seed for the bot
    pub seed: [u8; 32],
    /// Distinguishes matches sharing one seed
    pub match_index: u32,
}

impl MatchSetup {
    pub fn new(seed: [u8; 32]) -> Self {
        Self {
            rules: DuelRules::standard(),
            bot: BotStyle::default(),
            seed,
            match_index: 0,
        }
    }
}

/// Complete state of one duel
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    pub turn_number: u32,
    pub phase: Phase,
    /// Append-only, newest last
    pub log: Vec<String>,
    pub player: CombatantState,
    pub opponent: CombatantState,
    pub opponent_kind: OpponentKind,
    pub bot: BotStyle,
    pub rules: DuelRules,
    pub seed: [u8; 32],
    pub match_index: u32,
    pub turns: Vec<TurnRecord>,
    pub outcome: Option<MatchOutcome>,
}

impl MatchState {
    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Result
    }

    pub fn winner(&self) -> Option<Winner> {
        self.outcome.map(|o| o.winner)
    }

    /// RNG the default bot uses on the current turn
    pub fn turn_rng(&self) -> SeededRng {
        SeededRng::new(&self.seed, self.match_index).for_turn(self.turn_number)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Load a stored snapshot, refusing one whose rules fail validation
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let state: Self = serde_json::from_str(json)?;
        state.rules.validate().map_err(<serde_json::Error as serde::de::Error>::custom)?;
        Ok(state)
    }
}

/// Start a duel with the standard rules and the default bot
pub fn create_match(
    player: &CombatProfile,
    opponent: &CombatProfile,
    kind: OpponentKind,
    seed: [u8; 32],
) -> MatchState {
    create_match_with(player, opponent, kind, MatchSetup::new(seed))
}

/// Start a duel from an explicit setup
///
/// `setup.rules` is not checked here; [`submit_turn_with`] refuses to
/// resolve a turn under rules that fail [`DuelRules::validate`].
pub fn create_match_with(
    player: &CombatProfile,
    opponent: &CombatProfile,
    kind: OpponentKind,
    setup: MatchSetup,
) -> MatchState {
    let player_stats = derive_stats(player, &setup.rules);
    let opponent_stats = derive_stats(opponent, &setup.rules);

    let log = vec![format!(
        "Duel begins: you ({} HP, {} ATK, {} DEF) vs {} ({} HP, {} ATK, {} DEF)",
        player_stats.max_hp,
        player_stats.attack,
        player_stats.defense,
        match kind {
            OpponentKind::Bot => "bot",
            OpponentKind::Human => "challenger",
        },
        opponent_stats.max_hp,
        opponent_stats.attack,
        opponent_stats.defense,
    )];

    MatchState {
        turn_number: 1,
        phase: Phase::Setup,
        log,
        player: CombatantState::from_stats(&player_stats),
        opponent: CombatantState::from_stats(&opponent_stats),
        opponent_kind: kind,
        bot: setup.bot,
        rules: setup.rules,
        seed: setup.seed,
        match_index: setup.match_index,
        turns: Vec::new(),
        outcome: None,
    }
}

/// Resolve one turn using the match's own bot and seeded randomness
pub fn submit_turn(state: &MatchState, player_action: Action) -> Result<MatchState, DuelError> {
    let policy = StyledBot::new(state.bot);
    let mut rng = state.turn_rng();
    submit_turn_with(state, player_action, &policy, &mut rng)
}

/// Resolve one turn with an injected bot policy and random source
pub fn submit_turn_with(
    state: &MatchState,
    player_action: Action,
    policy: &dyn BotPolicy,
    rng: &mut dyn RandomSource,
) -> Result<MatchState, DuelError> {
    if state.is_finished() {
        return Err(InvariantViolation::MatchFinished { turn: state.turn_number }.into());
    }
    state.rules.validate().map_err(InvariantViolation::InvalidRules)?;

    let rules = &state.rules;
    let turn = state.turn_number;
    let mut next = state.clone();
    next.phase = Phase::Resolving;

    // Stunned sides lose the turn regardless of what they wanted
    let player_stunned = next.player.is_stunned;
    let opponent_stunned = next.opponent.is_stunned;
    next.player.is_stunned = false;
    next.opponent.is_stunned = false;

    let player_action = if player_stunned {
        next.log.push(format!("Turn {}: you are stunned and lose the turn", turn));
        Action::Skip
    } else {
        if let Err(error) = validate(player_action, &state.player, rules) {
            warn!(turn, action = %player_action, %error, "player action rejected");
            let mut rejected = state.clone();
            rejected
                .log
                .push(format!("Turn {}: {} rejected: {}", turn, player_action, error));
            return Err(DuelError::Rejected { error, state: Box::new(rejected) });
        }
        player_action
    };

    let opponent_action = if opponent_stunned {
        next.log.push(format!("Turn {}: opponent is stunned and loses the turn", turn));
        Action::Skip
    } else {
        let wanted = policy.decide(&next.opponent, &next.player, turn, rules, rng);
        clamp_to_pool(wanted, &next.opponent, rules)
    };

    // Both actions are declared at once; each side's damage is mitigated by
    // the other side's declaration from this same turn.
    let player_res = resolve_side(
        player_action,
        player_stunned,
        &next.player,
        opponent_action.declared_defense(),
        rules,
    )
    .map_err(|reason| InvariantViolation::Unresolvable {
        action: player_action.to_string(),
        reason,
    })?;
    let opponent_res = resolve_side(
        opponent_action,
        opponent_stunned,
        &next.opponent,
        player_action.declared_defense(),
        rules,
    )
    .map_err(|reason| InvariantViolation::Unresolvable {
        action: opponent_action.to_string(),
        reason,
    })?;

    let damage_to_player = opponent_res.damage_dealt;
    let damage_to_opponent = player_res.damage_dealt;

    let player_raw = player_res.actor.hp as i64 - damage_to_player as i64;
    let opponent_raw = opponent_res.actor.hp as i64 - damage_to_opponent as i64;

    next.player = player_res.actor.clone();
    next.opponent = opponent_res.actor.clone();
    next.player.hp = player_raw.max(0) as u32;
    next.opponent.hp = opponent_raw.max(0) as u32;

    if let Some(threshold) = rules.stun_threshold_percent {
        apply_stun(&mut next.player, damage_to_player, threshold);
        apply_stun(&mut next.opponent, damage_to_opponent, threshold);
    }

    next.player.clear_turn_flags();
    next.opponent.clear_turn_flags();

    for side in [&next.player, &next.opponent] {
        if side.hp > side.max_hp {
            let (hp, max_hp) = (side.hp, side.max_hp);
            return Err(InvariantViolation::HpOutOfRange { hp, max_hp }.into());
        }
    }

    describe_turn(&mut next, turn, player_action, &player_res, opponent_action, &opponent_res);

    next.turns.push(TurnRecord {
        turn,
        player_action,
        opponent_action,
        damage_to_player,
        damage_to_opponent,
        player_hp: next.player.hp,
        opponent_hp: next.opponent.hp,
    });

    debug!(
        turn,
        player = %player_action,
        opponent = %opponent_action,
        damage_to_player,
        damage_to_opponent,
        player_hp = next.player.hp,
        opponent_hp = next.opponent.hp,
        "turn resolved"
    );

    if let Some(outcome) = evaluate_outcome(&next, player_raw, opponent_raw) {
        next.log.push(match outcome.winner {
            Winner::Player => "You win!".to_string(),
            Winner::Opponent => "You lose.".to_string(),
            Winner::Draw => "The duel ends in a draw.".to_string(),
        });
        info!(turn, winner = ?outcome.winner, reason = ?outcome.reason, "duel finished");
        next.outcome = Some(outcome);
        next.phase = Phase::Result;
    } else {
        next.turn_number += 1;
        next.phase = Phase::Setup;
    }

    Ok(next)
}

/// Feed a sequence of player actions through [`submit_turn`]
///
/// Stops at the first error or once the match ends.
pub fn replay(initial: &MatchState, actions: &[Action]) -> Result<MatchState, DuelError> {
    let mut state = initial.clone();
    for action in actions {
        if state.is_finished() {
            break;
        }
        state = submit_turn(&state, *action)?;
    }
    Ok(state)
}

fn resolve_side(
    action: Action,
    forced_skip: bool,
    actor: &CombatantState,
    opponent_defense: u32,
    rules: &DuelRules,
) -> Result<Resolution, ActionError> {
    if forced_skip {
        return Ok(Resolution::unchanged(actor));
    }
    resolve(action, actor, opponent_defense, rules)
}

/// Trim a bot's request to what it can actually pay for
fn clamp_to_pool(action: Action, actor: &CombatantState, rules: &DuelRules) -> Action {
    if actor.is_exhausted() {
        return Action::Skip;
    }

    let clamped = match action {
        Action::Skip => None,
        a if a.is_conversion() && actor.conversions_used >= rules.max_conversions => None,
        a => {
            let amount = a.amount().min(a.available(actor));
            (amount > 0).then(|| a.with_amount(amount))
        }
    };

    clamped.unwrap_or_else(|| {
        let wanted = action.amount().max(1);
        if actor.attack_pool > 0 {
            Action::Attack(wanted.min(actor.attack_pool))
        } else {
            Action::Defend(wanted.min(actor.defense_pool))
        }
    })
}

fn apply_stun(target: &mut CombatantState, damage: u32, threshold_percent: u8) {
    if target.hp > 0 && damage as u64 * 100 >= target.max_hp as u64 * threshold_percent as u64 {
        target.is_stunned = true;
    }
}

fn evaluate_outcome(
    state: &MatchState,
    player_raw: i64,
    opponent_raw: i64,
) -> Option<MatchOutcome> {
    let turn = state.turn_number;
    let by_comparison = |mine: i64, theirs: i64| match mine.cmp(&theirs) {
        core::cmp::Ordering::Greater => Winner::Player,
        core::cmp::Ordering::Less => Winner::Opponent,
        core::cmp::Ordering::Equal => Winner::Draw,
    };

    if state.player.is_knocked_out() || state.opponent.is_knocked_out() {
        // Both down: whoever went less far below zero wins
        let winner = by_comparison(player_raw, opponent_raw);
        return Some(MatchOutcome { winner, reason: EndReason::KnockOut, turn });
    }

    if state.player.is_exhausted() && state.opponent.is_exhausted() {
        let winner = by_comparison(state.player.hp as i64, state.opponent.hp as i64);
        return Some(MatchOutcome { winner, reason: EndReason::Exhaustion, turn });
    }

    None
}

fn describe_turn(
    state: &mut MatchState,
    turn: u32,
    player_action: Action,
    player_res: &Resolution,
    opponent_action: Action,
    opponent_res: &Resolution,
) {
    for (who, action, res) in [
        ("You", player_action, player_res),
        ("Opponent", opponent_action, opponent_res),
    ] {
        let line = match action {
            Action::Attack(amount) if res.blocked > 0 => format!(
                "Turn {}: {} attack with {}: {} blocked, {} damage",
                turn, who, amount, res.blocked, res.damage_dealt
            ),
            Action::Attack(amount) => format!(
                "Turn {}: {} attack with {} for {} damage",
                turn, who, amount, res.damage_dealt
            ),
            Action::Defend(amount) => format!("Turn {}: {} guard with {}", turn, who, amount),
            Action::ConvertAttackToHp(amount) => format!(
                "Turn {}: {} convert {} attack into {} HP",
                turn, who, amount, res.healed
            ),
            Action::ConvertDefenseToAttack(amount) => format!(
                "Turn {}: {} convert {} defense into {} attack",
                turn, who, amount, res.buff_gained
            ),
            Action::Skip => format!("Turn {}: {} pass", turn, who),
        };
        state.log.push(line);
    }

    if state.player.is_stunned {
        state.log.push(format!("Turn {}: you are stunned!", turn));
    }
    if state.opponent.is_stunned {
        state.log.push(format!("Turn {}: opponent is stunned!", turn));
    }
}
