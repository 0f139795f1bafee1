//! A deterministic, server-side rules engine for a hex-map, faction-driven
//! strategy game in the Terra Mystica family. See spec.md for the full
//! specification this crate implements.
//!
//! The engine is pure: every observable mutation goes through [`action::apply`]
//! against a [`state::GameState`], and no module reaches outside the process
//! for clocks, randomness, or I/O (the optional `seeded-setup` feature is the
//! one deliberate exception, confined to setup-phase pool shuffling). Callers
//! own persistence, networking, and the opponent/AI loop; this crate only
//! judges legality and applies effects.

pub mod action;
pub mod cult;
pub mod effects;
pub mod error;
pub mod faction;
pub mod hex;
pub mod holdings;
pub mod player;
pub mod power;
pub mod round;
pub mod scoring;
pub mod state;

pub use action::{
    apply, Action, ActionKind, AppliedEffects, Conversion, FollowUpKind,
};
pub use cult::{CultTrack, CultTracks};
pub use effects::EffectQueues;
pub use error::{EngineError, EngineResult};
pub use faction::{Faction, FactionRules};
pub use hex::{Board, BuildingKind, Hex, Terrain};
pub use holdings::{BonusCardId, FavorTileId, TownTileId};
pub use player::{Player, PlayerId};
pub use power::PowerSystem;
pub use round::{all_players_passed, maybe_enter_cleanup, run_cleanup_phase, run_income_phase};
pub use scoring::{score, FinalScore};
pub use state::{GameState, Phase, PowerActionSpace};

/// Actions legal for `player` right now: queued follow-ups take priority
/// over the main-action catalog. See spec.md §6.
pub fn legal_actions(state: &GameState, player: PlayerId) -> Vec<ActionKind> {
    action::legal_actions(state, player)
}

/// Whether `player` owes any pending follow-up (leech offer, town choice,
/// spade chain, ...) that blocks their next main action. See spec.md §6.
pub fn pending_for(state: &GameState, player: PlayerId) -> bool {
    state.pending_for(player)
}

/// Serialize a [`GameState`] to JSON. Every type reachable from `GameState`
/// derives `Serialize`/`Deserialize`, so the whole game (including pending
/// follow-ups) round-trips through a single call. See spec.md §5 "plain
/// data" requirement.
pub fn to_json(state: &GameState) -> serde_json::Result<String> {
    serde_json::to_string(state)
}

pub fn from_json(json: &str) -> serde_json::Result<GameState> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_game_round_trips_through_json() {
        let mut state = GameState::new_game();
        state.add_player(Faction::Witches).unwrap();
        state.add_player(Faction::Auren).unwrap();
        state.begin().unwrap();

        let json = to_json(&state).unwrap();
        let restored = from_json(&json).unwrap();
        assert_eq!(restored.round, state.round);
        assert_eq!(restored.players.len(), state.players.len());
    }

    #[test]
    fn legal_actions_and_pending_for_agree_on_a_fresh_game() {
        let mut state = GameState::new_game();
        let p0 = state.add_player(Faction::Witches).unwrap();
        state.add_player(Faction::Auren).unwrap();
        state.begin().unwrap();
        state.phase = Phase::Action;

        assert!(!pending_for(&state, p0));
        assert!(!legal_actions(&state, p0).is_empty());
    }
}
