//! End-of-game scoring: area majorities and cult-track end positions on
//! top of victory points accumulated during play. See spec.md §4.6, §6
//! `score`.

use crate::cult::CultTrack;
use crate::error::{EngineError, EngineResult};
use crate::player::PlayerId;
use crate::state::{GameState, Phase};

/// Area-majority bonus for the largest connected network, 1st/2nd/3rd.
/// Tied networks share the higher slot's points and the following slot is
/// skipped for each tied player beyond the first.
const AREA_BONUS: [i32; 3] = [18, 12, 6];

/// Cult-track end-position bonus for 1st/2nd/3rd/4th non-zero position.
const CULT_BONUS: [i32; 4] = [10, 6, 4, 2];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalScore {
    pub player: PlayerId,
    pub base_victory_points: i32,
    pub area_bonus: i32,
    pub cult_bonus: i32,
    pub total: i32,
}

/// Award ranked bonuses to tied groups of `(player, magnitude)` pairs
/// already sorted descending by magnitude, consuming one bonus slot per
/// tied player.
fn award_ranked<const N: usize>(
    ranked: &[(PlayerId, u32)],
    bonuses: [i32; N],
    out: &mut std::collections::HashMap<PlayerId, i32>,
) {
    let mut slot = 0usize;
    let mut i = 0usize;
    while i < ranked.len() && slot < N {
        let magnitude = ranked[i].1;
        let group_end = ranked[i..]
            .iter()
            .position(|&(_, m)| m != magnitude)
            .map_or(ranked.len(), |offset| i + offset);
        let bonus = bonuses[slot];
        for &(player, _) in &ranked[i..group_end] {
            *out.entry(player).or_insert(0) += bonus;
        }
        slot += group_end - i;
        i = group_end;
    }
}

/// Final score for every seated player. Only meaningful once the game has
/// reached `Phase::End`. See spec.md §6.
pub fn score(state: &GameState) -> EngineResult<Vec<FinalScore>> {
    if state.phase != Phase::End {
        return Err(EngineError::RuleViolation(
            "score() is only meaningful once the game has reached Phase::End".into(),
        ));
    }

    let mut area_bonuses: std::collections::HashMap<PlayerId, i32> = std::collections::HashMap::new();
    let mut cult_bonuses: std::collections::HashMap<PlayerId, i32> = std::collections::HashMap::new();

    let mut largest_networks: Vec<(PlayerId, u32)> = state
        .players
        .iter()
        .map(|p| {
            let largest = state
                .board
                .all_connected_components(p.id, p.shipping)
                .into_iter()
                .map(|c| c.len() as u32)
                .max()
                .unwrap_or(0);
            (p.id, largest)
        })
        .filter(|&(_, size)| size > 0)
        .collect();
    largest_networks.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    award_ranked(&largest_networks, AREA_BONUS, &mut area_bonuses);

    for track in CultTrack::ALL {
        let ranking = state.cult.ranking(track);
        award_ranked(&ranking, CULT_BONUS, &mut cult_bonuses);
    }

    Ok(state
        .players
        .iter()
        .map(|p| {
            let area_bonus = area_bonuses.get(&p.id).copied().unwrap_or(0);
            let cult_bonus = cult_bonuses.get(&p.id).copied().unwrap_or(0);
            FinalScore {
                player: p.id,
                base_victory_points: p.victory_points,
                area_bonus,
                cult_bonus,
                total: p.victory_points + area_bonus + cult_bonus,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::faction::Faction;

    fn end_game_state() -> GameState {
        let mut state = GameState::new_game();
        state.add_player(Faction::Witches).unwrap();
        state.add_player(Faction::Auren).unwrap();
        state.begin().unwrap();
        state.phase = Phase::End;
        state
    }

    #[test]
    fn score_is_rejected_outside_end_phase() {
        let mut state = GameState::new_game();
        state.add_player(Faction::Witches).unwrap();
        state.add_player(Faction::Auren).unwrap();
        state.begin().unwrap();
        assert!(score(&state).is_err());
    }

    #[test]
    fn score_matches_base_vp_with_no_networks_or_cult_positions() {
        let state = end_game_state();
        let scores = score(&state).unwrap();
        for s in scores {
            assert_eq!(s.total, 20);
        }
    }

    #[test]
    fn cult_track_leader_gets_the_top_bonus() {
        let mut state = end_game_state();
        let leader = state.players[0].id;
        state.cult.advance(leader, CultTrack::Fire, 9, false).unwrap();
        let scores = score(&state).unwrap();
        let leader_score = scores.iter().find(|s| s.player == leader).unwrap();
        assert_eq!(leader_score.cult_bonus, 10);
    }

    #[test]
    fn tied_cult_positions_split_the_higher_bonus() {
        let mut state = end_game_state();
        let a = state.players[0].id;
        let b = state.players[1].id;
        state.cult.advance(a, CultTrack::Water, 5, false).unwrap();
        state.cult.advance(b, CultTrack::Water, 5, false).unwrap();
        let scores = score(&state).unwrap();
        let score_a = scores.iter().find(|s| s.player == a).unwrap();
        let score_b = scores.iter().find(|s| s.player == b).unwrap();
        assert_eq!(score_a.cult_bonus, 10);
        assert_eq!(score_b.cult_bonus, 10);
    }
}
