//! Integration tests driving the public API through the six concrete
//! scenarios from spec.md §8, via the dispatcher's `apply` entry point.

use std::collections::HashSet;

use hexrealm_engine::action::{Action, Conversion};
use hexrealm_engine::cult::CultTrack;
use hexrealm_engine::faction::Faction;
use hexrealm_engine::hex::{Building, BuildingKind, Hex, Terrain};
use hexrealm_engine::holdings::TownTileId;
use hexrealm_engine::state::{GameState, Phase, PowerActionSpace};
use hexrealm_engine::{apply, player::PlayerId};

fn started_game(factions: &[Faction]) -> (GameState, Vec<PlayerId>) {
    let mut state = GameState::new_game();
    let ids = factions
        .iter()
        .map(|&f| state.add_player(f).unwrap())
        .collect();
    state.begin().unwrap();
    state.phase = Phase::Action;
    (state, ids)
}

/// Two non-adjacent, non-river hexes separated by exactly two shared
/// river-able neighbors, for bridge-geometry tests. Found by a generic
/// search over the real `Hex::neighbors` relation rather than a hand-picked
/// coordinate pair, so it holds regardless of the underlying hex library's
/// coordinate convention.
fn find_bridge_candidate() -> (Hex, Hex, Hex, Hex) {
    let center = Hex::new(0, 0);
    for a in center.range(3) {
        for b in center.range(3) {
            if a == b || a.is_adjacent(b) {
                continue;
            }
            let na: HashSet<Hex> = a.neighbors().into_iter().collect();
            let nb: HashSet<Hex> = b.neighbors().into_iter().collect();
            let shared: Vec<Hex> = na.intersection(&nb).copied().collect();
            if shared.len() == 2 {
                return (a, b, shared[0], shared[1]);
            }
        }
    }
    panic!("no bridge-geometry candidate found within range 3 of the origin");
}

/// A neighbor of `hex` that is in none of `exclude`, chosen to be as far as
/// possible from `away_from` so it stays disconnected from the other group
/// until the bridge is built.
fn satellite(hex: Hex, exclude: &[Hex], away_from: Hex) -> Hex {
    hex.neighbors()
        .into_iter()
        .filter(|n| !exclude.contains(n))
        .max_by_key(|n| n.distance(away_from))
        .expect("a hex always has six neighbors")
}

/// Scenario 1 (spec.md §8.1): power-leech to two adjacent opponents, one
/// accepts. Expected: the accepting opponent gains power; the Cultists
/// builder owes a cult-track choice (not +1 power, since someone accepted)
/// and their Fire position advances by one once they choose it.
#[test]
fn scenario_1_cultists_leech_with_one_acceptance_grants_a_cult_choice() {
    let (mut state, ids) = started_game(&[Faction::Cultists, Faction::Swarmlings, Faction::Nomads]);
    let cultists = ids[0];
    let swarmlings = ids[1];
    let nomads = ids[2];

    let h0 = Hex::new(0, 0);
    let [h1, h2, ..] = h0.neighbors();

    state.board.hex_mut(h0).unwrap().terrain = Faction::Cultists.home_terrain();
    state.board.hex_mut(h1).unwrap().terrain = Faction::Swarmlings.home_terrain();
    state.board.hex_mut(h2).unwrap().terrain = Faction::Nomads.home_terrain();
    state
        .board
        .place_building(h1, Building { owner: swarmlings, kind: BuildingKind::Dwelling })
        .unwrap();
    state
        .board
        .place_building(h2, Building { owner: nomads, kind: BuildingKind::Dwelling })
        .unwrap();

    apply(
        &mut state,
        cultists,
        Action::TransformAndBuild { hex: h0, target_terrain: Faction::Cultists.home_terrain() },
    )
    .unwrap();

    assert!(state.pending_for(swarmlings));
    assert!(state.pending_for(nomads));

    let swarmlings_available_before = state.player(swarmlings).unwrap().power.available();
    apply(&mut state, swarmlings, Action::AcceptLeech).unwrap();
    assert!(state.player(swarmlings).unwrap().power.available() > swarmlings_available_before);

    apply(&mut state, nomads, Action::DeclineLeech).unwrap();

    assert!(state.pending_for(cultists));
    let fire_before = state.cult.position(cultists, CultTrack::Fire);
    apply(&mut state, cultists, Action::SelectCultistsTrack(CultTrack::Fire)).unwrap();
    assert_eq!(state.cult.position(cultists, CultTrack::Fire), fire_before + 1);
}

/// Scenario 2 (spec.md §8.2, adapted): Alchemists with a built stronghold
/// take the 2-spade power action, then spend both spades terraforming a
/// hex. Each spade earns the post-stronghold +1 power bonus.
#[test]
fn scenario_2_alchemists_post_stronghold_spades_gain_power() {
    let (mut state, ids) = started_game(&[Faction::Alchemists, Faction::Auren]);
    let alchemists = ids[0];
    state.player_mut(alchemists).unwrap().stronghold_built = true;
    state.player_mut(alchemists).unwrap().power = hexrealm_engine::PowerSystem { bowl1: 0, bowl2: 6, bowl3: 6 };
    state.player_mut(alchemists).unwrap().workers = 20;

    let hex_a = Hex::new(1, 0);
    let hex_b = Hex::new(2, 0);
    state.board.hex_mut(hex_a).unwrap().terrain = Terrain::Forest;
    state.board.hex_mut(hex_b).unwrap().terrain = Terrain::Forest;

    apply(
        &mut state,
        alchemists,
        Action::TakePowerAction { space: PowerActionSpace::TwoSpades },
    )
    .unwrap();
    assert_eq!(*state.effects.pending_spades.get(&alchemists).unwrap(), 2);

    let available_before = state.player(alchemists).unwrap().power.available();
    apply(
        &mut state,
        alchemists,
        Action::UsePendingSpade { hex: hex_a, target_terrain: Terrain::Swamp },
    )
    .unwrap();
    apply(
        &mut state,
        alchemists,
        Action::UsePendingSpade { hex: hex_b, target_terrain: Terrain::Plains },
    )
    .unwrap();

    assert_eq!(*state.effects.pending_spades.get(&alchemists).unwrap(), 0);
    assert_eq!(
        state.player(alchemists).unwrap().power.available(),
        available_before + 2
    );
}

/// Scenario 3 (spec.md §8.3): the Halflings stronghold chain grants three
/// free spades, each scoring the spade-tile's scoring VP plus the
/// Halflings' own +1 VP, and the optional trailing dwelling choice.
#[test]
fn scenario_3_halflings_stronghold_spade_chain() {
    let (mut state, ids) = started_game(&[Faction::Halflings, Faction::Auren]);
    let halflings = ids[0];
    {
        let p = state.player_mut(halflings).unwrap();
        p.trading_houses_built = 1;
        p.workers = 20;
        p.coins = 20;
    }
    let th_hex = Hex::new(0, 0);
    state.board.hex_mut(th_hex).unwrap().terrain = Faction::Halflings.home_terrain();
    state
        .board
        .place_building(th_hex, Building { owner: halflings, kind: BuildingKind::TradingHouse })
        .unwrap();

    apply(
        &mut state,
        halflings,
        Action::Upgrade { hex: th_hex, to: BuildingKind::Stronghold },
    )
    .unwrap();
    assert_eq!(
        state.effects.pending_halflings_spades.as_ref().unwrap().spades_remaining,
        3
    );

    let spots = [Hex::new(2, 0), Hex::new(2, -1), Hex::new(2, 1)];
    for &hex in &spots {
        state.board.hex_mut(hex).unwrap().terrain = Terrain::Mountain;
    }
    let vp_before = state.player(halflings).unwrap().victory_points;
    for &hex in &spots {
        apply(
            &mut state,
            halflings,
            Action::ApplyHalflingsSpade { hex, target_terrain: Faction::Halflings.home_terrain() },
        )
        .unwrap();
    }
    assert!(state.player(halflings).unwrap().victory_points > vp_before);
    assert_eq!(
        state.effects.pending_halflings_spades.as_ref().unwrap().spades_remaining,
        0
    );

    apply(&mut state, halflings, Action::BuildHalflingsDwelling { hex: spots[0] }).unwrap();
    assert!(state.effects.pending_halflings_spades.is_none());
    assert_eq!(
        state.board.hex(spots[0]).unwrap().building.as_ref().unwrap().owner,
        halflings
    );
}

/// Scenario 4 (spec.md §8.4): bridging two disconnected Engineers groups
/// (1 dwelling + 3 trading houses, total power 7) forms a pending town;
/// selecting a town tile seals it and grants the tile's rewards plus a key.
#[test]
fn scenario_4_bridge_completes_a_town() {
    let (mut state, ids) = started_game(&[Faction::Engineers, Faction::Auren]);
    let engineers = ids[0];

    let (a, b, river1, river2) = find_bridge_candidate();
    let sat_a = satellite(a, &[river1, river2, b], b);
    let sat_b = satellite(b, &[river1, river2, a], a);
    assert!(!sat_a.is_adjacent(b) && !sat_a.is_adjacent(sat_b) && !sat_b.is_adjacent(a));

    for hex in [river1, river2] {
        state.board.hex_mut(hex).unwrap().terrain = Terrain::River;
    }
    for hex in [a, sat_a, b, sat_b] {
        state.board.hex_mut(hex).unwrap().terrain = Faction::Engineers.home_terrain();
    }
    state.board.place_building(a, Building { owner: engineers, kind: BuildingKind::TradingHouse }).unwrap();
    state.board.place_building(sat_a, Building { owner: engineers, kind: BuildingKind::Dwelling }).unwrap();
    state.board.place_building(b, Building { owner: engineers, kind: BuildingKind::TradingHouse }).unwrap();
    state.board.place_building(sat_b, Building { owner: engineers, kind: BuildingKind::TradingHouse }).unwrap();

    assert!(state
        .board
        .all_connected_components(engineers, 0)
        .iter()
        .all(|c| c.len() < 4));

    state.player_mut(engineers).unwrap().power = hexrealm_engine::PowerSystem { bowl1: 1, bowl2: 8, bowl3: 3 };
    apply(
        &mut state,
        engineers,
        Action::TakePowerAction { space: PowerActionSpace::Bridge },
    )
    .unwrap();
    apply(&mut state, engineers, Action::BuildBridge { a, b }).unwrap();
    assert!(state
        .effects
        .pending_town_formations
        .get(&engineers)
        .is_some_and(|q| !q.is_empty()));

    let vp_before = state.player(engineers).unwrap().victory_points;
    let coins_before = state.player(engineers).unwrap().coins;
    apply(&mut state, engineers, Action::SelectTownTile(TownTileId::TownTile5Points)).unwrap();

    let p = state.player(engineers).unwrap();
    assert_eq!(p.victory_points, vp_before + 5);
    assert_eq!(p.coins, coins_before + 6);
    assert_eq!(p.keys, 1);
    assert!(state.board.hex(a).unwrap().part_of_town);
    assert!(state.board.hex(sat_b).unwrap().part_of_town);
}

/// Scenario 5 (spec.md §8.5): a cult-reward spade transforms terrain but
/// does not score the scoring tile's per-spade VP, unlike a regular
/// power-action spade.
#[test]
fn scenario_5_cult_reward_spade_does_not_score_tile_vp() {
    let (mut state, ids) = started_game(&[Faction::Cultists, Faction::Auren]);
    let cultists = ids[0];
    state.effects.pending_cult_reward_spades.insert(cultists, 2);

    let hex = Hex::new(0, 1);
    state.board.hex_mut(hex).unwrap().terrain = Terrain::Mountain;
    let vp_before = state.player(cultists).unwrap().victory_points;

    apply(
        &mut state,
        cultists,
        Action::UseCultRewardSpade { hex, target_terrain: Terrain::Desert },
    )
    .unwrap();

    assert_eq!(state.board.hex(hex).unwrap().terrain, Terrain::Desert);
    assert_eq!(state.player(cultists).unwrap().victory_points, vp_before);
    assert_eq!(*state.effects.pending_cult_reward_spades.get(&cultists).unwrap(), 1);
}

/// Scenario 6 (spec.md §8.6): Nomads' sandstorm is a one-shot special
/// action per round, gated on a built stronghold.
#[test]
fn scenario_6_nomads_sandstorm_is_one_shot_per_round() {
    let (mut state, ids) = started_game(&[Faction::Nomads, Faction::Auren]);
    let nomads = ids[0];
    state.player_mut(nomads).unwrap().stronghold_built = true;

    let home = Hex::new(0, 0);
    state.board.hex_mut(home).unwrap().terrain = Faction::Nomads.home_terrain();
    state
        .board
        .place_building(home, Building { owner: nomads, kind: BuildingKind::Dwelling })
        .unwrap();

    let target = home.neighbors()[0];
    state.board.hex_mut(target).unwrap().terrain = Terrain::Lake;

    apply(&mut state, nomads, Action::SandstormAction { hex: target }).unwrap();
    assert_eq!(state.board.hex(target).unwrap().terrain, Terrain::Desert);

    let other_target = home.neighbors()[1];
    state.board.hex_mut(other_target).unwrap().terrain = Terrain::Lake;
    let err = apply(&mut state, nomads, Action::SandstormAction { hex: other_target }).unwrap_err();
    assert_eq!(err, hexrealm_engine::EngineError::AlreadyUsedThisRound);
}

/// A decline-all leech-offer batch leaves VP and power untouched for every
/// recipient (spec.md §8 round-trip property).
#[test]
fn decline_all_leech_offers_changes_nothing_for_recipients() {
    let (mut state, ids) = started_game(&[Faction::Witches, Faction::Auren, Faction::Engineers]);
    let builder = ids[0];
    let opp1 = ids[1];
    let opp2 = ids[2];

    let h0 = Hex::new(0, 0);
    let [h1, h2, ..] = h0.neighbors();
    state.board.hex_mut(h0).unwrap().terrain = Faction::Witches.home_terrain();
    state.board.hex_mut(h1).unwrap().terrain = Faction::Auren.home_terrain();
    state.board.hex_mut(h2).unwrap().terrain = Faction::Engineers.home_terrain();
    state.board.place_building(h1, Building { owner: opp1, kind: BuildingKind::Dwelling }).unwrap();
    state.board.place_building(h2, Building { owner: opp2, kind: BuildingKind::Dwelling }).unwrap();

    apply(
        &mut state,
        builder,
        Action::TransformAndBuild { hex: h0, target_terrain: Faction::Witches.home_terrain() },
    )
    .unwrap();

    let opp1_before = state.player(opp1).unwrap().clone();
    let opp2_before = state.player(opp2).unwrap().clone();
    apply(&mut state, opp1, Action::DeclineLeech).unwrap();
    apply(&mut state, opp2, Action::DeclineLeech).unwrap();

    let opp1_after = state.player(opp1).unwrap();
    let opp2_after = state.player(opp2).unwrap();
    assert_eq!(opp1_before.victory_points, opp1_after.victory_points);
    assert_eq!(opp1_before.power.total(), opp1_after.power.total());
    assert_eq!(opp2_before.victory_points, opp2_after.victory_points);
    assert_eq!(opp2_before.power.total(), opp2_after.power.total());
}

/// Cloning state, applying an action to the clone, and discarding it
/// leaves the original byte-identical via JSON comparison (spec.md §8
/// round-trip property; atomicity is structural, not a deep-equality
/// derive, so JSON is the practical comparison).
#[test]
fn acting_on_a_clone_never_touches_the_original() {
    let (state, ids) = started_game(&[Faction::Witches, Faction::Auren]);
    let before_json = hexrealm_engine::to_json(&state).unwrap();

    let mut clone = state.clone();
    apply(&mut clone, ids[0], Action::AdvanceShipping).unwrap();

    let after_json = hexrealm_engine::to_json(&state).unwrap();
    assert_eq!(before_json, after_json);
    assert_ne!(before_json, hexrealm_engine::to_json(&clone).unwrap());
}

/// Only Alchemists may use the VP<->coin conversions; every other faction
/// is rejected with `WrongFaction`.
#[test]
fn alchemists_only_conversions_reject_other_factions() {
    let (mut state, ids) = started_game(&[Faction::Witches, Faction::Auren]);
    let err = apply(
        &mut state,
        ids[0],
        Action::Convert(Conversion::AlchemistsCoinToVp { coins: 1 }),
    )
    .unwrap_err();
    assert_eq!(
        err,
        hexrealm_engine::EngineError::WrongFaction {
            expected: "alchemists",
            actual: Faction::Witches.name(),
        }
    );
}
