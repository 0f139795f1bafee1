//! Player identity and per-player state. See spec.md §3.

use serde::{Deserialize, Serialize};

use crate::faction::Faction;
use crate::holdings::{BonusCard, FavorTile, TownTile};
use crate::hex::Hex;
use crate::power::PowerSystem;

/// Stable small-integer identifier for a seat at the table. Assigned in
/// join order by `GameState::add_player` and never reused or renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    pub fn new(id: u8) -> Self {
        Self(id)
    }
}

/// A player's full mutable state: faction, resources, holdings, and
/// per-round bookkeeping. See spec.md §3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub faction: Faction,
    pub power: PowerSystem,
    pub coins: u32,
    pub workers: u32,
    pub priests: u32,
    /// Scarce tokens earned by forming towns; required to advance a cult
    /// track to position 10. See spec.md §GLOSSARY "Key".
    pub keys: u32,
    pub shipping: u32,
    pub digging: u32,
    pub bonus_card: Option<BonusCard>,
    pub favor_tiles: Vec<FavorTile>,
    pub town_tiles: Vec<TownTile>,
    pub dwellings_built: u32,
    pub trading_houses_built: u32,
    pub temples_built: u32,
    pub sanctuary_built: bool,
    pub stronghold_built: bool,
    pub victory_points: i32,
    pub has_passed: bool,
    /// Special actions (e.g. faction power actions) already used this round,
    /// keyed by a short stable tag.
    pub used_special_actions: Vec<&'static str>,
    /// Priests sent to any cult track this round. Reset at round cleanup;
    /// feeds the Temple+Priest scoring-tile special case. See spec.md §4.6.
    pub priests_sent_to_cult_this_round: u32,
    /// Home terrain and starting holdings come entirely from `faction`;
    /// `dwellings` occupied hexes live on the shared `Board`, not here.
    pub dwellings: Vec<Hex>,
}

impl Player {
    pub fn new(id: PlayerId, faction: Faction) -> Self {
        let setup = faction.starting_resources();
        Self {
            id,
            faction,
            power: PowerSystem::starting(setup.power_bowl1, setup.power_bowl2),
            coins: setup.coins,
            workers: setup.workers,
            priests: setup.priests,
            keys: 0,
            shipping: setup.shipping,
            digging: 0,
            bonus_card: None,
            favor_tiles: Vec::new(),
            town_tiles: Vec::new(),
            dwellings_built: 0,
            trading_houses_built: 0,
            temples_built: 0,
            sanctuary_built: false,
            stronghold_built: false,
            victory_points: 20,
            has_passed: false,
            used_special_actions: Vec::new(),
            priests_sent_to_cult_this_round: 0,
            dwellings: Vec::new(),
        }
    }

    /// Digging cost in workers for a single spade, after Alchemists/upgrade
    /// discounts encoded in `digging` level. See spec.md §4.1.
    pub fn spade_cost_workers(&self) -> u32 {
        match self.digging {
            0 => 3,
            1 => 2,
            _ => 1,
        }
    }

    pub fn reset_round_flags(&mut self) {
        self.has_passed = false;
        self.used_special_actions.clear();
        self.priests_sent_to_cult_this_round = 0;
    }

    pub fn gain_vp(&mut self, amount: i32) {
        self.victory_points += amount;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faction::Faction;

    #[test]
    fn new_player_starts_with_twenty_victory_points() {
        let player = Player::new(PlayerId::new(0), Faction::Witches);
        assert_eq!(player.victory_points, 20);
        assert!(!player.has_passed);
    }

    #[test]
    fn spade_cost_decreases_with_digging_level() {
        let mut player = Player::new(PlayerId::new(0), Faction::Witches);
        assert_eq!(player.spade_cost_workers(), 3);
        player.digging = 1;
        assert_eq!(player.spade_cost_workers(), 2);
        player.digging = 2;
        assert_eq!(player.spade_cost_workers(), 1);
    }

    #[test]
    fn reset_round_flags_clears_pass_and_special_actions() {
        let mut player = Player::new(PlayerId::new(0), Faction::Witches);
        player.has_passed = true;
        player.used_special_actions.push("sandstorm");
        player.reset_round_flags();
        assert!(!player.has_passed);
        assert!(player.used_special_actions.is_empty());
    }
}
