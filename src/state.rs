//! The game-state aggregate and its lifecycle. See spec.md §3, §6.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::cult::CultTracks;
use crate::effects::EffectQueues;
use crate::error::{EngineError, EngineResult};
use crate::faction::Faction;
use crate::hex::{Board, Hex, Terrain};
use crate::holdings::{
    bonus_card_catalog, favor_tile_catalog, scoring_tile_catalog, town_tile_catalog, BonusCard,
    FavorTile, ScoringTile, TownTile,
};
use crate::player::{Player, PlayerId};

/// Which of the six power-action spaces a player may take once per round.
/// See spec.md §4.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerActionSpace {
    Bridge,
    Priest,
    TwoWorkers,
    SevenCoins,
    OneSpade,
    TwoSpades,
}

impl PowerActionSpace {
    pub const ALL: [PowerActionSpace; 6] = [
        PowerActionSpace::Bridge,
        PowerActionSpace::Priest,
        PowerActionSpace::TwoWorkers,
        PowerActionSpace::SevenCoins,
        PowerActionSpace::OneSpade,
        PowerActionSpace::TwoSpades,
    ];

    /// Power cost to take this space. See spec.md §4.5.
    pub fn power_cost(self) -> u32 {
        match self {
            PowerActionSpace::Bridge => 3,
            PowerActionSpace::Priest => 4,
            PowerActionSpace::TwoWorkers => 4,
            PowerActionSpace::SevenCoins => 4,
            PowerActionSpace::OneSpade => 4,
            PowerActionSpace::TwoSpades => 6,
        }
    }
}

/// The round phase. See spec.md §4.5 state machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Setup,
    Income,
    Action,
    Cleanup,
    End,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub round: u32,
    pub phase: Phase,
    pub players: Vec<Player>,
    pub turn_cursor: usize,
    pub pass_order: Vec<PlayerId>,
    pub board: Board,
    pub cult: CultTracks,
    pub scoring_tiles: Vec<ScoringTile>,
    pub bonus_card_pool: Vec<BonusCard>,
    pub favor_tile_pool: Vec<FavorTile>,
    pub town_tile_pool: Vec<TownTile>,
    pub power_actions_used: HashMap<PowerActionSpace, bool>,
    pub effects: EffectQueues,
    pub next_player_id: u8,
}

impl GameState {
    /// Create a new game in `Setup` phase with a standard fixed board and
    /// full pools. No other environment input is taken (spec.md §6 "the
    /// core is pure").
    pub fn new_game() -> Self {
        GameState {
            round: 0,
            phase: Phase::Setup,
            players: Vec::new(),
            turn_cursor: 0,
            pass_order: Vec::new(),
            board: standard_layout(),
            cult: CultTracks::default(),
            scoring_tiles: scoring_tile_catalog(),
            bonus_card_pool: bonus_card_catalog(),
            favor_tile_pool: favor_tile_catalog(),
            town_tile_pool: town_tile_catalog(),
            power_actions_used: PowerActionSpace::ALL.iter().map(|&s| (s, false)).collect(),
            effects: EffectQueues::default(),
            next_player_id: 0,
        }
    }

    /// Create a new game exactly like [`GameState::new_game`], except the
    /// scoring-tile order and bonus-card/favor-tile/town-tile pools are
    /// shuffled from `seed` rather than left in catalog order. Gated behind
    /// `seeded-setup` so the core dispatcher stays seed-free (spec.md §5,
    /// §9: determinism lives in `apply`, not in setup randomness).
    #[cfg(feature = "seeded-setup")]
    pub fn new_game_with_seed(seed: u64) -> Self {
        use rand::seq::SliceRandom;
        use rand::SeedableRng;

        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(seed);
        let mut state = Self::new_game();
        state.scoring_tiles.shuffle(&mut rng);
        state.bonus_card_pool.shuffle(&mut rng);
        state.favor_tile_pool.shuffle(&mut rng);
        state.town_tile_pool.shuffle(&mut rng);
        state
    }

    /// Seat a new player with the given faction. Only legal during Setup.
    pub fn add_player(&mut self, faction: Faction) -> EngineResult<PlayerId> {
        if self.phase != Phase::Setup {
            return Err(EngineError::RuleViolation(
                "players may only be added during Setup".into(),
            ));
        }
        if self.players.iter().any(|p| p.faction == faction) {
            return Err(EngineError::RuleViolation(format!(
                "faction {faction} is already taken"
            )));
        }
        let id = PlayerId::new(self.next_player_id);
        self.next_player_id += 1;
        self.players.push(Player::new(id, faction));
        Ok(id)
    }

    /// Transition from Setup into Income of round 1. Callers are expected
    /// to have already resolved the initial dwelling-placement and
    /// bonus-card mini-phases (spec.md §3 lifecycle) via the `action`
    /// module's setup-phase actions before calling this.
    pub fn begin(&mut self) -> EngineResult<()> {
        if self.phase != Phase::Setup {
            return Err(EngineError::RuleViolation(
                "begin() is only valid from Setup".into(),
            ));
        }
        if self.players.len() < 2 {
            return Err(EngineError::RuleViolation(
                "at least two players are required".into(),
            ));
        }
        self.round = 1;
        self.phase = Phase::Income;
        info!(round = self.round, phase = ?self.phase, "round phase transition");
        Ok(())
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    /// The player whose main turn it currently is, if the game is in the
    /// Action phase and not every player has passed. See spec.md §6.
    pub fn current_player(&self) -> Option<PlayerId> {
        if self.phase != Phase::Action {
            return None;
        }
        let n = self.players.len();
        (0..n)
            .map(|offset| self.players[(self.turn_cursor + offset) % n].id)
            .find(|&id| !self.player(id).is_some_and(|p| p.has_passed))
    }

    /// Advance the turn cursor to the next un-passed player, wrapping
    /// seating order.
    pub fn advance_turn_cursor(&mut self) {
        let n = self.players.len();
        if n == 0 {
            return;
        }
        self.turn_cursor = (self.turn_cursor + 1) % n;
    }

    /// Everything `player` currently owes, for outer-layer prompting. See
    /// spec.md §6.
    pub fn pending_for(&self, player: PlayerId) -> bool {
        self.effects.owes_follow_up(player)
    }

    /// Seating order starting at `player`'s next clockwise seat, wrapping.
    /// Used for the power-leech offer scan. See spec.md §4.5, §9.
    pub fn seating_order_from_next(&self, player: PlayerId) -> Vec<PlayerId> {
        let n = self.players.len();
        let Some(start) = self.players.iter().position(|p| p.id == player) else {
            return Vec::new();
        };
        (1..=n).map(|offset| self.players[(start + offset) % n].id).collect()
    }

    pub fn winner(&self) -> Option<PlayerId> {
        if self.phase != Phase::End {
            return None;
        }
        self.players
            .iter()
            .max_by_key(|p| p.victory_points)
            .map(|p| p.id)
    }
}

/// The fixed Terra-Mystica-shaped board: a central river with terrain hexes
/// on both banks. Radius-4 hex disc, with every third ring-6 hex carved out
/// as a river tile to give every terrain both direct and shipping-reachable
/// neighbors. See spec.md §3 MapHex, §4.1.
pub fn standard_layout() -> Board {
    let terrains = [
        Terrain::Plains,
        Terrain::Swamp,
        Terrain::Lake,
        Terrain::Forest,
        Terrain::Mountain,
        Terrain::Wasteland,
        Terrain::Desert,
    ];
    let center = Hex::new(0, 0);
    let mut tiles = vec![(center, Terrain::Plains)];
    for radius in 1..=4u32 {
        for (i, hex) in center.ring(radius).into_iter().enumerate() {
            let terrain = if i % 5 == 0 {
                Terrain::River
            } else {
                terrains[(radius as usize + i) % terrains.len()]
            };
            tiles.push((hex, terrain));
        }
    }
    Board::from_layout(tiles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_game_starts_in_setup_with_full_pools() {
        let state = GameState::new_game();
        assert_eq!(state.phase, Phase::Setup);
        assert_eq!(state.round, 0);
        assert_eq!(state.bonus_card_pool.len(), 9);
        assert_eq!(state.scoring_tiles.len(), 6);
    }

    #[test]
    fn add_player_rejects_duplicate_factions() {
        let mut state = GameState::new_game();
        state.add_player(Faction::Witches).unwrap();
        assert!(state.add_player(Faction::Witches).is_err());
    }

    #[test]
    fn begin_requires_at_least_two_players() {
        let mut state = GameState::new_game();
        state.add_player(Faction::Witches).unwrap();
        assert!(state.begin().is_err());
    }

    #[test]
    fn begin_transitions_to_income_round_one() {
        let mut state = GameState::new_game();
        state.add_player(Faction::Witches).unwrap();
        state.add_player(Faction::Auren).unwrap();
        state.begin().unwrap();
        assert_eq!(state.phase, Phase::Income);
        assert_eq!(state.round, 1);
    }

    #[test]
    fn current_player_is_none_outside_action_phase() {
        let mut state = GameState::new_game();
        state.add_player(Faction::Witches).unwrap();
        state.add_player(Faction::Auren).unwrap();
        state.begin().unwrap();
        assert_eq!(state.current_player(), None);
    }

    #[test]
    fn seating_order_from_next_wraps_around() {
        let mut state = GameState::new_game();
        let a = state.add_player(Faction::Witches).unwrap();
        let b = state.add_player(Faction::Auren).unwrap();
        let c = state.add_player(Faction::Engineers).unwrap();
        assert_eq!(state.seating_order_from_next(a), vec![b, c]);
        assert_eq!(state.seating_order_from_next(c), vec![a, b]);
    }

    #[test]
    fn standard_layout_has_no_buildings_and_some_river_tiles() {
        let board = standard_layout();
        assert!(board.hex(Hex::new(0, 0)).is_some());
    }
}
