//! Round lifecycle: Income, Action, Cleanup, and the transition into End.
//! See spec.md §3 (round structure), §4.5 state machines, §4.6 (cleanup
//! scoring).

use tracing::{debug, info};

use crate::holdings::Reward;
use crate::hex::BuildingKind;
use crate::player::PlayerId;
use crate::state::{GameState, Phase, PowerActionSpace};

pub const TOTAL_ROUNDS: u32 = 6;

/// Priests in hand plus priests on cult-action spaces must never exceed 7
/// (spec.md §7, §8). Reward-driven gains silently truncate rather than
/// fail, unlike a player-chosen action that would request too many.
const PRIEST_CAP: u32 = 7;

pub(crate) fn gain_priests_capped(state: &mut GameState, player: PlayerId, n: u32) {
    let Some(p) = state.player_mut(player) else {
        return;
    };
    let room = PRIEST_CAP.saturating_sub(p.priests);
    let granted = n.min(room);
    p.priests += granted;
    if granted < n {
        debug!(player = ?player, requested = n, granted, "priest gain short of the 7-priest cap");
    }
}

/// Per-building income in the absence of a faction override: a Dwelling
/// feeds one worker, a Trading House two coins, a Temple one priest, and
/// a Sanctuary or Stronghold its power value to the owner's bowl.
fn building_income(kind: BuildingKind) -> (u32, u32, u32, u32) {
    match kind {
        BuildingKind::Dwelling => (1, 0, 0, 0),
        BuildingKind::TradingHouse => (0, 2, 0, 0),
        BuildingKind::Temple => (0, 0, 1, 0),
        BuildingKind::Sanctuary => (0, 0, 0, kind.power_value()),
        BuildingKind::Stronghold => (0, 0, 0, kind.power_value()),
    }
}

fn grant_reward(state: &mut GameState, player: PlayerId, reward: Reward) {
    match reward {
        Reward::Priests(n) => gain_priests_capped(state, player, n),
        Reward::Spades(n) => {
            *state.effects.pending_spades.entry(player).or_insert(0) += n;
        }
        _ => {
            let Some(p) = state.player_mut(player) else {
                return;
            };
            match reward {
                Reward::Coins(n) => p.coins += n,
                Reward::Workers(n) => p.workers += n,
                Reward::Power(n) => {
                    let advanced = p.power.gain(n);
                    if advanced < n {
                        debug!(player = ?player, requested = n, advanced, "reward power gain short due to bowl caps");
                    }
                }
                Reward::VictoryPoints(n) => p.gain_vp(n),
                Reward::Key => p.keys += 1,
                Reward::Priests(_) | Reward::Spades(_) => unreachable!("handled above"),
            }
        }
    }
}

/// Run the Income phase: every seated player collects income from their
/// buildings and held bonus card. Transitions to Action. See spec.md §3.
pub fn run_income_phase(state: &mut GameState) -> Result<(), String> {
    if state.phase != Phase::Income {
        return Err("run_income_phase requires the Income phase".into());
    }

    let player_ids: Vec<PlayerId> = state.players.iter().map(|p| p.id).collect();
    for player in player_ids {
        let shipping = state.player(player).map(|p| p.shipping).unwrap_or(0);
        let components = state.board.all_connected_components(player, shipping);
        let (mut workers, mut coins, mut priests, mut power) = (0u32, 0u32, 0u32, 0u32);
        for hex in components.into_iter().flatten() {
            if let Some(kind) = state.board.hex(hex).and_then(|h| h.building.as_ref()).map(|b| b.kind) {
                let (w, c, pr, pw) = building_income(kind);
                workers += w;
                coins += c;
                priests += pr;
                power += pw;
            }
        }
        if let Some(p) = state.player_mut(player) {
            p.workers += workers;
            p.coins += coins;
        }
        if priests > 0 {
            gain_priests_capped(state, player, priests);
        }
        if power > 0 {
            if let Some(p) = state.player_mut(player) {
                let advanced = p.power.gain(power);
                if advanced < power {
                    debug!(player = ?player, "stronghold/sanctuary power income short due to bowl caps");
                }
            }
        }

        let bonus_income = state.player(player).and_then(|p| p.bonus_card.map(|c| c.income));
        if let Some(income) = bonus_income {
            grant_reward(state, player, income);
        }
    }

    state.phase = Phase::Action;
    state.turn_cursor = 0;
    info!(round = state.round, phase = ?state.phase, "round phase transition");
    Ok(())
}

/// True once every seated player has passed. The dispatcher's `pass`
/// action is the only way `has_passed` becomes true.
pub fn all_players_passed(state: &GameState) -> bool {
    state.players.iter().all(|p| p.has_passed)
}

/// Run the Cleanup phase: pay out this round's scoring-tile cult reward
/// (with the Temple+Priest special case), clear per-round flags, reset
/// power-action spaces, and advance to the next round's Income or to End
/// after round six. See spec.md §4.6.
pub fn run_cleanup_phase(state: &mut GameState) -> Result<(), String> {
    if state.phase != Phase::Cleanup {
        return Err("run_cleanup_phase requires the Cleanup phase".into());
    }

    if let Some(tile) = state
        .scoring_tiles
        .get((state.round as usize).saturating_sub(1))
        .copied()
    {
        let player_ids: Vec<PlayerId> = state.players.iter().map(|p| p.id).collect();
        if tile.temple_priest_special_case {
            for player in player_ids {
                let sent = state
                    .player(player)
                    .map(|p| p.priests_sent_to_cult_this_round)
                    .unwrap_or(0);
                if sent > 0 {
                    if let Some(p) = state.player_mut(player) {
                        p.coins += 2 * sent;
                    }
                }
            }
        } else {
            let ranking = state.cult.ranking(tile.cult_track);
            for (player, position) in ranking {
                if position >= tile.cult_threshold {
                    grant_reward(state, player, tile.cult_reward);
                }
            }
        }
    }

    for player in &mut state.players {
        player.reset_round_flags();
    }
    state.pass_order.clear();
    state.effects.pending_bridge_grants.clear();
    for used in state.power_actions_used.values_mut() {
        *used = false;
    }

    if state.round >= TOTAL_ROUNDS {
        state.phase = Phase::End;
        info!(round = state.round, "game ends");
    } else {
        state.round += 1;
        state.phase = Phase::Income;
        info!(round = state.round, phase = ?state.phase, "round phase transition");
    }
    Ok(())
}

/// Request the transition from Action to Cleanup once every player has
/// passed. Callers drive this after each `apply` call.
pub fn maybe_enter_cleanup(state: &mut GameState) {
    if state.phase == Phase::Action && all_players_passed(state) {
        state.phase = Phase::Cleanup;
        info!(round = state.round, phase = ?state.phase, "round phase transition");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faction::Faction;

    fn started_game() -> GameState {
        let mut state = GameState::new_game();
        state.add_player(Faction::Witches).unwrap();
        state.add_player(Faction::Auren).unwrap();
        state.begin().unwrap();
        state
    }

    #[test]
    fn income_phase_transitions_to_action() {
        let mut state = started_game();
        run_income_phase(&mut state).unwrap();
        assert_eq!(state.phase, Phase::Action);
    }

    #[test]
    fn all_players_passed_is_false_initially() {
        let state = started_game();
        assert!(!all_players_passed(&state));
    }

    #[test]
    fn cleanup_advances_round_and_resets_power_action_spaces() {
        let mut state = started_game();
        run_income_phase(&mut state).unwrap();
        state.power_actions_used.insert(PowerActionSpace::Bridge, true);
        state.phase = Phase::Cleanup;
        run_cleanup_phase(&mut state).unwrap();
        assert_eq!(state.round, 2);
        assert_eq!(state.phase, Phase::Income);
        assert!(!state.power_actions_used[&PowerActionSpace::Bridge]);
    }

    #[test]
    fn cleanup_on_final_round_ends_the_game() {
        let mut state = started_game();
        state.round = TOTAL_ROUNDS;
        state.phase = Phase::Cleanup;
        run_cleanup_phase(&mut state).unwrap();
        assert_eq!(state.phase, Phase::End);
    }

    #[test]
    fn income_phase_priest_gain_truncates_at_the_seven_priest_cap() {
        use crate::hex::{Building, BuildingKind, Hex};

        let mut state = started_game();
        let p0 = state.players[0].id;
        let center = Hex::new(0, 0);
        state
            .board
            .place_building(center, Building { owner: p0, kind: BuildingKind::Temple })
            .unwrap();
        state.player_mut(p0).unwrap().priests = 6;
        run_income_phase(&mut state).unwrap();
        assert_eq!(state.player(p0).unwrap().priests, 7);
    }

    #[test]
    fn temple_priest_special_case_pays_coins_per_priest_sent() {
        let mut state = started_game();
        let p0 = state.players[0].id;
        state.player_mut(p0).unwrap().priests_sent_to_cult_this_round = 2;
        state.round = 4;
        state.phase = Phase::Cleanup;
        let before = state.player(p0).unwrap().coins;
        run_cleanup_phase(&mut state).unwrap();
        assert_eq!(state.player(p0).unwrap().coins, before + 4);
    }
}
