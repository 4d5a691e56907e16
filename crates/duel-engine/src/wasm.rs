//! WASM bindings for the duel screen
//!
//! Match state crosses the boundary as JSON strings so the frontend can
//! keep it in component state and hand it back on the next turn.

#![cfg(feature = "wasm")]

use wasm_bindgen::prelude::*;
use crate::{
    allocate_reward, create_match_with, derive_stats, describe_style, reward_points, submit_turn,
    Action, BotStyle, CombatProfile, DuelError, DuelRules, MatchSetup, MatchState, OpponentKind,
    PointsToAssign,
};

fn parse_profile(json: &str) -> Result<CombatProfile, JsError> {
    serde_json::from_str(json).map_err(|e| JsError::new(&format!("Invalid profile: {}", e)))
}

fn parse_state(json: &str) -> Result<MatchState, JsError> {
    MatchState::from_json(json).map_err(|e| JsError::new(&format!("Invalid match state: {}", e)))
}

fn parse_kind(kind: &str) -> Result<OpponentKind, JsError> {
    match kind {
        "bot" => Ok(OpponentKind::Bot),
        "human" => Ok(OpponentKind::Human),
        _ => Err(JsError::new(&format!("Unknown opponent kind: {}", kind))),
    }
}

fn parse_style(style: &str) -> Result<BotStyle, JsError> {
    match style {
        "" | "Balanced" => Ok(BotStyle::Balanced),
        "Aggressive" => Ok(BotStyle::Aggressive),
        "Defensive" => Ok(BotStyle::Defensive),
        _ => Err(JsError::new(&format!("Unknown bot style: {}", style))),
    }
}

/// Derive combat stats for a profile
#[wasm_bindgen]
pub fn get_combat_stats(profile_json: &str) -> Result<JsValue, JsError> {
    let profile = parse_profile(profile_json)?;
    let stats = derive_stats(&profile, &DuelRules::standard());

    serde_wasm_bindgen::to_value(&stats)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Start a duel
///
/// # Arguments
/// * `player_json` - JSON serialized CombatProfile of the player
/// * `opponent_json` - JSON serialized CombatProfile of the opponent
/// * `kind` - `"bot"` or `"human"`
/// * `bot_style` - `"Balanced"`, `"Aggressive"` or `"Defensive"` (empty = Balanced)
/// * `seed` - 32-byte randomness seed
///
/// # Returns
/// JSON serialized MatchState
#[wasm_bindgen]
pub fn create_duel(
    player_json: &str,
    opponent_json: &str,
    kind: &str,
    bot_style: &str,
    seed: &[u8],
) -> Result<String, JsError> {
    let player = parse_profile(player_json)?;
    let opponent = parse_profile(opponent_json)?;
    let kind = parse_kind(kind)?;

    let seed_arr: [u8; 32] = seed.try_into()
        .map_err(|_| JsError::new("Seed must be exactly 32 bytes"))?;

    let setup = MatchSetup { bot: parse_style(bot_style)?, ..MatchSetup::new(seed_arr) };
    let state = create_match_with(&player, &opponent, kind, setup);

    state.to_json()
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

#[derive(serde::Serialize)]
struct TurnResponse {
    /// JSON serialized MatchState to keep for the next turn
    state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejected: Option<String>,
}

/// Resolve one turn
///
/// Returns `{state}` or `{state, rejected: "..."}` when the action was
/// refused. Rejections are returned as structured data, never thrown.
#[wasm_bindgen]
pub fn submit_duel_turn(state_json: &str, action_json: &str) -> Result<JsValue, JsError> {
    let state = parse_state(state_json)?;
    let action: Action = serde_json::from_str(action_json)
        .map_err(|e| JsError::new(&format!("Invalid action: {}", e)))?;

    let response = match submit_turn(&state, action) {
        Ok(next) => TurnResponse {
            state: next.to_json().map_err(|e| JsError::new(&e.to_string()))?,
            rejected: None,
        },
        Err(DuelError::Rejected { error, state }) => TurnResponse {
            state: state.to_json().map_err(|e| JsError::new(&e.to_string()))?,
            rejected: Some(error.to_string()),
        },
        Err(e @ DuelError::Invariant(_)) => return Err(JsError::new(&e.to_string())),
    };

    serde_wasm_bindgen::to_value(&response)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

/// Points the player may distribute after the duel
#[wasm_bindgen]
pub fn get_reward_points(state_json: &str) -> Result<u8, JsError> {
    let state = parse_state(state_json)?;
    reward_points(&state).map_err(|e| JsError::new(&e.to_string()))
}

/// Turn a distribution into the profile delta to persist
#[wasm_bindgen]
pub fn allocate_duel_reward(state_json: &str, points_json: &str) -> Result<JsValue, JsError> {
    let state = parse_state(state_json)?;
    let points: PointsToAssign = serde_json::from_str(points_json)
        .map_err(|e| JsError::new(&format!("Invalid points: {}", e)))?;

    let delta = allocate_reward(&state, points).map_err(|e| JsError::new(&e.to_string()))?;

    serde_wasm_bindgen::to_value(&delta)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

#[derive(serde::Serialize)]
struct StyleInfo {
    id: &'static str,
    description: String,
}

/// Get all available bot styles
#[wasm_bindgen]
pub fn get_bot_styles() -> Result<JsValue, JsError> {
    let styles: Vec<StyleInfo> = [
        ("Balanced", BotStyle::Balanced),
        ("Aggressive", BotStyle::Aggressive),
        ("Defensive", BotStyle::Defensive),
    ]
    .into_iter()
    .map(|(id, style)| StyleInfo { id, description: describe_style(style) })
    .collect();

    serde_wasm_bindgen::to_value(&styles)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}
