//! The four cult tracks. See spec.md §3 (CultTracks), §4.4.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::player::PlayerId;


/// Power granted for crossing a threshold on a cult track, in crossing
/// order. See spec.md §4.4.
const THRESHOLDS: [(u32, u32); 3] = [(3, 1), (5, 2), (7, 2)];

pub const MAX_POSITION: u32 = 10;
pub const KEY_REQUIRED_POSITION: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CultTrack {
    Fire,
    Water,
    Earth,
    Air,
}

impl CultTrack {
    pub const ALL: [CultTrack; 4] = [
        CultTrack::Fire,
        CultTrack::Water,
        CultTrack::Earth,
        CultTrack::Air,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CultTrack::Fire => "fire",
            CultTrack::Water => "water",
            CultTrack::Earth => "earth",
            CultTrack::Air => "air",
        }
    }
}

/// Outcome of advancing a player's position on one track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvanceResult {
    pub power_gained: u32,
    pub reached_ten: bool,
}

/// Outcome of placing a priest on a track's action spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriestPlacementResult {
    pub steps: u32,
    pub priest_returned: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct TrackState {
    positions: HashMap<PlayerId, u32>,
    occupant_at_ten: Option<PlayerId>,
    two_step_slot_taken: bool,
    three_step_slot_taken: bool,
}

/// Per-track player positions and priest-slot occupancy, for all four
/// tracks. See spec.md §3.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CultTracks {
    fire: TrackState,
    water: TrackState,
    earth: TrackState,
    air: TrackState,
}

impl CultTracks {
    fn track(&self, track: CultTrack) -> &TrackState {
        match track {
            CultTrack::Fire => &self.fire,
            CultTrack::Water => &self.water,
            CultTrack::Earth => &self.earth,
            CultTrack::Air => &self.air,
        }
    }

    fn track_mut(&mut self, track: CultTrack) -> &mut TrackState {
        match track {
            CultTrack::Fire => &mut self.fire,
            CultTrack::Water => &mut self.water,
            CultTrack::Earth => &mut self.earth,
            CultTrack::Air => &mut self.air,
        }
    }

    pub fn position(&self, player: PlayerId, track: CultTrack) -> u32 {
        *self.track(track).positions.get(&player).unwrap_or(&0)
    }

    /// Advance `player` by up to `steps` on `track`. Clamps at position 9
    /// unless `has_key` is true, in which case a crossing into 10 is
    /// permitted provided no other player already holds position 10.
    /// Returns the power gained from crossed milestones (3/5/7).
    pub fn advance(
        &mut self,
        player: PlayerId,
        track: CultTrack,
        steps: u32,
        has_key: bool,
    ) -> EngineResult<AdvanceResult> {
        let state = self.track_mut(track);
        let old = *state.positions.get(&player).unwrap_or(&0);

        if old >= MAX_POSITION {
            return Ok(AdvanceResult {
                power_gained: 0,
                reached_ten: true,
            });
        }

        let ceiling = if has_key && state.occupant_at_ten.is_none() {
            MAX_POSITION
        } else {
            MAX_POSITION - 1
        };
        let new = (old + steps).min(ceiling);

        let reached_ten = new == MAX_POSITION;
        if reached_ten {
            state.occupant_at_ten = Some(player);
        }

        state.positions.insert(player, new);

        let power_gained = THRESHOLDS
            .iter()
            .filter(|(threshold, _)| old < *threshold && new >= *threshold)
            .map(|(_, power)| power)
            .sum();

        Ok(AdvanceResult {
            power_gained,
            reached_ten,
        })
    }

    /// Occupy a priest-action space of the given `value` (1, 2, or 3).
    /// 2- and 3-step spaces are single-occupancy across all players and
    /// permanently consume the priest; 1-step "generic" placement has
    /// unlimited capacity and returns the priest to the owner's pool.
    pub fn place_priest(
        &mut self,
        track: CultTrack,
        value: u32,
    ) -> EngineResult<PriestPlacementResult> {
        match value {
            1 => Ok(PriestPlacementResult {
                steps: 1,
                priest_returned: true,
            }),
            2 => {
                let state = self.track_mut(track);
                if state.two_step_slot_taken {
                    return Err(EngineError::RuleViolation(
                        "2-step cult slot already occupied".into(),
                    ));
                }
                state.two_step_slot_taken = true;
                Ok(PriestPlacementResult {
                    steps: 2,
                    priest_returned: false,
                })
            }
            3 => {
                let state = self.track_mut(track);
                if state.three_step_slot_taken {
                    return Err(EngineError::RuleViolation(
                        "3-step cult slot already occupied".into(),
                    ));
                }
                state.three_step_slot_taken = true;
                Ok(PriestPlacementResult {
                    steps: 3,
                    priest_returned: false,
                })
            }
            other => Err(EngineError::RuleViolation(format!(
                "invalid cult priest placement value {other}"
            ))),
        }
    }

    /// Ranking of non-zero positions on `track`, highest first, for
    /// end-game scoring (spec.md §4.6: 10/6/4/2 for 1st/2nd/3rd/4th).
    pub fn ranking(&self, track: CultTrack) -> Vec<(PlayerId, u32)> {
        let mut entries: Vec<(PlayerId, u32)> = self
            .track(track)
            .positions
            .iter()
            .filter(|(_, &pos)| pos > 0)
            .map(|(&player, &pos)| (player, pos))
            .collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        entries
    }
}
