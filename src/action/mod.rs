//! The action catalog and dispatcher. See spec.md §4.5.
//!
//! Every variant is plain data; `apply` is the single entry point that
//! validates, executes, and reports newly-owed follow-ups. Atomicity is
//! achieved by executing against a clone of the state and swapping it in
//! only on success (spec.md §9: "a snapshot-then-restore pattern").

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cult::CultTrack;
use crate::effects::LeechOffer;
use crate::error::{EngineError, EngineResult};
use crate::faction::{Faction, StrongholdBonus};
use crate::hex::{Building, BuildingKind, Hex, Terrain};
use crate::holdings::{ActionType, BonusCardId, FavorEffect, FavorTileId, TownTileId};
use crate::player::PlayerId;
use crate::state::{GameState, PowerActionSpace};


/// Every legal player action. See spec.md §4.5.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Action {
    TransformAndBuild { hex: Hex, target_terrain: Terrain },
    SkipAndBuild { hex: Hex },
    Upgrade { hex: Hex, to: BuildingKind },
    AdvanceShipping,
    AdvanceDigging,
    SendPriestToCult { track: CultTrack, value: u32 },
    TakePowerAction { space: PowerActionSpace },
    BuildBridge { a: Hex, b: Hex },
    BonusSpadeAction { hex: Hex, target_terrain: Terrain },
    BonusCultAction,
    Pass { next_bonus_card: BonusCardId },
    Convert(Conversion),
    BurnPower(u32),
    AcceptLeech,
    DeclineLeech,
    UseCultRewardSpade { hex: Hex, target_terrain: Terrain },
    SelectTownTile(TownTileId),
    SelectCultistsTrack(CultTrack),
    ApplyHalflingsSpade { hex: Hex, target_terrain: Terrain },
    BuildHalflingsDwelling { hex: Hex },
    SkipHalflingsDwelling,
    UseDarklingsOrdination { workers_to_convert: u32 },
    DiscardPendingSpade,
    UsePendingSpade { hex: Hex, target_terrain: Terrain },
    SandstormAction { hex: Hex },
    SelectFavorTile(FavorTileId),
    GiantsFreeSpades { hex: Hex, target_terrain: Terrain },
    SwarmlingsFreeUpgrade { hex: Hex },
    WitchesRide { hex: Hex },
    ChaosMagiciansDoubleTurn,
}

/// A free in-turn conversion. See spec.md §4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Conversion {
    PowerToCoin { power: u32 },
    PowerToWorker { power: u32 },
    PowerToPriest { power: u32 },
    PriestToWorker { priests: u32 },
    WorkerToCoin { workers: u32 },
    AlchemistsVpToCoin { vp: u32 },
    AlchemistsCoinToVp { coins: u32 },
}

/// A follow-up newly owed after an action, for outer-layer prompting. See
/// spec.md §6 `AppliedEffects`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FollowUpKind {
    LeechOffer,
    Spade,
    CultRewardSpade,
    TownChoice,
    CultistsCultChoice,
    HalflingsSpadeChain,
    DarklingsOrdination,
    FavorTileSelection,
    ExtraMainActionGranted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedEffects {
    pub owed: Vec<(PlayerId, FollowUpKind)>,
}

/// True when `action` resolves an outstanding follow-up rather than acting
/// as a player's "main" turn action. See spec.md §4.5 dispatcher invariants.
fn resolves_follow_up(action: &Action) -> bool {
    matches!(
        action,
        Action::AcceptLeech
            | Action::DeclineLeech
            | Action::SelectTownTile(_)
            | Action::SelectCultistsTrack(_)
            | Action::ApplyHalflingsSpade { .. }
            | Action::BuildHalflingsDwelling { .. }
            | Action::SkipHalflingsDwelling
            | Action::UseDarklingsOrdination { .. }
            | Action::UseCultRewardSpade { .. }
            | Action::DiscardPendingSpade
            | Action::UsePendingSpade { .. }
            | Action::SelectFavorTile(_)
    )
}

/// The single entry point: validate, execute atomically, report newly-owed
/// follow-ups. See spec.md §6.
pub fn apply(state: &mut GameState, player: PlayerId, action: Action) -> EngineResult<AppliedEffects> {
    debug!(?player, ?action, "apply action");

    if resolves_follow_up(&action) {
        if !state.pending_for(player) {
            return Err(EngineError::NotCurrentActor(player));
        }
    } else {
        if state.effects.any_follow_up_outstanding() {
            return Err(EngineError::OwesFollowUp {
                player,
                kind: "an outstanding follow-up elsewhere blocks new main actions".into(),
            });
        }
        if state.current_player() != Some(player) {
            return Err(EngineError::NotCurrentActor(player));
        }
        if state.player(player).is_some_and(|p| p.has_passed) {
            return Err(EngineError::HasPassed(player));
        }
    }

    let mut working = state.clone();
    execute(&mut working, player, action)?;
    let owed = collect_owed(&working);
    working.effects.pending_extra_main_action = None;
    *state = working;
    Ok(AppliedEffects { owed })
}

fn collect_owed(state: &GameState) -> Vec<(PlayerId, FollowUpKind)> {
    let mut owed = Vec::new();
    for player in state.players.iter().map(|p| p.id) {
        if state
            .effects
            .pending_leech_offers
            .get(&player)
            .is_some_and(|q| !q.is_empty())
        {
            owed.push((player, FollowUpKind::LeechOffer));
        }
        if state.effects.pending_spades.get(&player).is_some_and(|&n| n > 0) {
            owed.push((player, FollowUpKind::Spade));
        }
        if state
            .effects
            .pending_cult_reward_spades
            .get(&player)
            .is_some_and(|&n| n > 0)
        {
            owed.push((player, FollowUpKind::CultRewardSpade));
        }
        if state
            .effects
            .pending_town_formations
            .get(&player)
            .is_some_and(|q| !q.is_empty())
        {
            owed.push((player, FollowUpKind::TownChoice));
        }
        if state.effects.pending_favor_tile_selection.get(&player).is_some_and(|&n| n > 0) {
            owed.push((player, FollowUpKind::FavorTileSelection));
        }
    }
    if let Some(p) = state.effects.pending_cultists_cult_selection {
        owed.push((p, FollowUpKind::CultistsCultChoice));
    }
    if let Some(halflings) = &state.effects.pending_halflings_spades {
        owed.push((halflings.player, FollowUpKind::HalflingsSpadeChain));
    }
    if let Some(p) = state.effects.pending_darklings_priest_ordination {
        owed.push((p, FollowUpKind::DarklingsOrdination));
    }
    if let Some(p) = state.effects.pending_extra_main_action {
        owed.push((p, FollowUpKind::ExtraMainActionGranted));
    }
    owed
}

/// Kinds of admissible action, without payloads, for `legal_actions`. See
/// spec.md §6: "may be partial".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    TransformAndBuild,
    Upgrade,
    AdvanceShipping,
    AdvanceDigging,
    SendPriestToCult,
    TakePowerAction,
    BuildBridge,
    Pass,
    Convert,
    BurnPower,
    AcceptLeech,
    DeclineLeech,
    SelectTownTile,
    SelectCultistsTrack,
    ApplyHalflingsSpade,
    UseDarklingsOrdination,
    DiscardPendingSpade,
    UsePendingSpade,
    SelectFavorTile,
}

/// A partial report of which action *kinds* `player` may currently take,
/// derived from pending state and available resources. See spec.md §6,
/// SPEC_FULL.md §11.
pub fn legal_actions(state: &GameState, player: PlayerId) -> Vec<ActionKind> {
    let mut kinds = Vec::new();

    if let Some(queue) = state.effects.pending_leech_offers.get(&player) {
        if !queue.is_empty() {
            kinds.push(ActionKind::AcceptLeech);
            kinds.push(ActionKind::DeclineLeech);
            return kinds;
        }
    }
    if state
        .effects
        .pending_town_formations
        .get(&player)
        .is_some_and(|q| !q.is_empty())
    {
        kinds.push(ActionKind::SelectTownTile);
        return kinds;
    }
    if state.effects.pending_cultists_cult_selection == Some(player) {
        kinds.push(ActionKind::SelectCultistsTrack);
        return kinds;
    }
    if state
        .effects
        .pending_halflings_spades
        .as_ref()
        .is_some_and(|h| h.player == player)
    {
        kinds.push(ActionKind::ApplyHalflingsSpade);
        return kinds;
    }
    if state.effects.pending_darklings_priest_ordination == Some(player) {
        kinds.push(ActionKind::UseDarklingsOrdination);
        return kinds;
    }
    if state.effects.pending_spades.get(&player).is_some_and(|&n| n > 0) {
        kinds.push(ActionKind::UsePendingSpade);
        kinds.push(ActionKind::DiscardPendingSpade);
        return kinds;
    }
    if state.effects.pending_cult_reward_spades.get(&player).is_some_and(|&n| n > 0) {
        kinds.push(ActionKind::DiscardPendingSpade);
        return kinds;
    }
    if state.effects.pending_favor_tile_selection.get(&player).is_some_and(|&n| n > 0) {
        kinds.push(ActionKind::SelectFavorTile);
        return kinds;
    }

    if state.current_player() != Some(player) {
        return kinds;
    }
    if state.effects.any_follow_up_outstanding() {
        return kinds;
    }

    kinds.push(ActionKind::TransformAndBuild);
    kinds.push(ActionKind::Upgrade);
    kinds.push(ActionKind::AdvanceShipping);
    kinds.push(ActionKind::AdvanceDigging);
    kinds.push(ActionKind::SendPriestToCult);
    kinds.push(ActionKind::TakePowerAction);
    let bridge_grant_available = state
        .effects
        .pending_bridge_grants
        .get(&player)
        .is_some_and(|&n| n > 0);
    let engineers_bridge_available = state.player(player).is_some_and(|p| {
        p.faction == Faction::Engineers
            && p.stronghold_built
            && !p.used_special_actions.contains(&"engineers_bridge")
    });
    if bridge_grant_available || engineers_bridge_available {
        kinds.push(ActionKind::BuildBridge);
    }
    kinds.push(ActionKind::Pass);
    kinds.push(ActionKind::Convert);
    kinds.push(ActionKind::BurnPower);
    kinds
}

fn execute(state: &mut GameState, player: PlayerId, action: Action) -> EngineResult<()> {
    match action {
        Action::TransformAndBuild { hex, target_terrain } => {
            transform_and_build(state, player, hex, target_terrain)
        }
        Action::SkipAndBuild { hex } => skip_and_build(state, player, hex),
        Action::Upgrade { hex, to } => upgrade_building(state, player, hex, to),
        Action::AdvanceShipping => advance_shipping(state, player),
        Action::AdvanceDigging => advance_digging(state, player),
        Action::SendPriestToCult { track, value } => send_priest_to_cult(state, player, track, value),
        Action::TakePowerAction { space } => take_power_action(state, player, space),
        Action::BuildBridge { a, b } => build_bridge(state, player, a, b),
        Action::BonusSpadeAction { hex, target_terrain } => {
            bonus_spade_action(state, player, hex, target_terrain)
        }
        Action::BonusCultAction => bonus_cult_action(state, player),
        Action::Pass { next_bonus_card } => pass(state, player, next_bonus_card),
        Action::Convert(conversion) => apply_conversion(state, player, conversion),
        Action::BurnPower(amount) => burn_power(state, player, amount),
        Action::AcceptLeech => accept_leech(state, player),
        Action::DeclineLeech => decline_leech(state, player),
        Action::UseCultRewardSpade { hex, target_terrain } => {
            use_cult_reward_spade(state, player, hex, target_terrain)
        }
        Action::SelectTownTile(tile_id) => select_town_tile(state, player, tile_id),
        Action::SelectCultistsTrack(track) => select_cultists_track(state, player, track),
        Action::ApplyHalflingsSpade { hex, target_terrain } => {
            apply_halflings_spade(state, player, hex, target_terrain)
        }
        Action::BuildHalflingsDwelling { hex } => build_halflings_dwelling(state, player, hex),
        Action::SkipHalflingsDwelling => skip_halflings_dwelling(state, player),
        Action::UseDarklingsOrdination { workers_to_convert } => {
            use_darklings_ordination(state, player, workers_to_convert)
        }
        Action::DiscardPendingSpade => discard_pending_spade(state, player),
        Action::UsePendingSpade { hex, target_terrain } => {
            use_pending_spade(state, player, hex, target_terrain)
        }
        Action::SandstormAction { hex } => sandstorm_action(state, player, hex),
        Action::SelectFavorTile(tile_id) => select_favor_tile(state, player, tile_id),
        Action::GiantsFreeSpades { hex, target_terrain } => {
            giants_free_spades(state, player, hex, target_terrain)
        }
        Action::SwarmlingsFreeUpgrade { hex } => swarmlings_free_upgrade(state, player, hex),
        Action::WitchesRide { hex } => witches_ride(state, player, hex),
        Action::ChaosMagiciansDoubleTurn => chaos_magicians_double_turn(state, player),
    }
}

fn player_faction(state: &GameState, player: PlayerId) -> EngineResult<Faction> {
    Ok(state
        .player(player)
        .ok_or(EngineError::NotCurrentActor(player))?
        .faction)
}

/// Cost and spade count for terraforming `hex` to its owner's home terrain.
/// See spec.md §4.5 "Terraform".
fn terraform_requirement(state: &GameState, player: PlayerId, hex: Hex) -> EngineResult<(u32, Terrain)> {
    let faction = player_faction(state, player)?;
    let map_hex = state
        .board
        .hex(hex)
        .ok_or_else(|| EngineError::IllegalTarget("hex is off the board".into()))?;
    if map_hex.is_river() {
        return Err(EngineError::IllegalTarget("cannot terraform a river hex".into()));
    }
    if map_hex.building.is_some() {
        return Err(EngineError::IllegalTarget("hex already has a building".into()));
    }
    let home = faction.home_terrain();
    let spades = faction
        .rules()
        .fixed_spade_count()
        .unwrap_or_else(|| map_hex.terrain.spade_distance(home));
    Ok((spades, home))
}

fn transform_and_build(
    state: &mut GameState,
    player: PlayerId,
    hex: Hex,
    target_terrain: Terrain,
) -> EngineResult<()> {
    let (spades, home) = terraform_requirement(state, player, hex)?;
    if target_terrain != home {
        return Err(EngineError::IllegalTarget(
            "transform-and-build must terraform to the faction's home terrain".into(),
        ));
    }
    let faction = player_faction(state, player)?;
    let rules = faction.rules();

    if let Some(priests_per_spade) = rules.terraform_priests_per_spade() {
        let priests_needed = priests_per_spade * spades;
        let p = state.player_mut(player).ok_or(EngineError::NotCurrentActor(player))?;
        if p.priests < priests_needed {
            return Err(EngineError::InsufficientResources {
                resource: "priests",
                required: priests_needed,
                available: p.priests,
            });
        }
        p.priests -= priests_needed;
    } else {
        let workers_per_spade = rules.terraform_workers_per_spade(
            state.player(player).ok_or(EngineError::NotCurrentActor(player))?.digging,
        );
        let workers_needed = workers_per_spade * spades;
        let p = state.player_mut(player).ok_or(EngineError::NotCurrentActor(player))?;
        if p.workers < workers_needed {
            return Err(EngineError::InsufficientResources {
                resource: "workers",
                required: workers_needed,
                available: p.workers,
            });
        }
        p.workers -= workers_needed;
    }

    state
        .board
        .transform_terrain(hex, target_terrain)
        .map_err(EngineError::IllegalTarget)?;

    award_spade_bonuses(state, player, spades);
    build_dwelling(state, player, hex)
}

fn skip_and_build(state: &mut GameState, player: PlayerId, hex: Hex) -> EngineResult<()> {
    let faction = player_faction(state, player)?;
    let rules = faction.rules();
    let stronghold_built = state
        .player(player)
        .ok_or(EngineError::NotCurrentActor(player))?
        .stronghold_built;

    let map_hex = state
        .board
        .hex(hex)
        .ok_or_else(|| EngineError::IllegalTarget("hex is off the board".into()))?;
    if map_hex.is_river() || map_hex.building.is_some() {
        return Err(EngineError::IllegalTarget("hex is not buildable".into()));
    }

    if let Some(workers_cost) = rules.tunneling_workers_cost(stronghold_built) {
        let p = state.player_mut(player).ok_or(EngineError::NotCurrentActor(player))?;
        if p.workers < workers_cost {
            return Err(EngineError::InsufficientResources {
                resource: "workers",
                required: workers_cost,
                available: p.workers,
            });
        }
        p.workers -= workers_cost;
    } else if let Some(_range) = rules.carpet_flight_range() {
        let p = state.player_mut(player).ok_or(EngineError::NotCurrentActor(player))?;
        if p.priests < 1 {
            return Err(EngineError::InsufficientResources {
                resource: "priests",
                required: 1,
                available: p.priests,
            });
        }
        p.priests -= 1;
    } else {
        return Err(EngineError::RuleViolation(
            "this faction has no skip-build action".into(),
        ));
    }

    let home = faction.home_terrain();
    state
        .board
        .transform_terrain(hex, home)
        .map_err(EngineError::IllegalTarget)?;

    state.player_mut(player).unwrap().gain_vp(4);
    build_dwelling(state, player, hex)
}

/// Award VP from any held favor tile whose effect pays VP per action of
/// `action_type`, scaled by `count`. See spec.md §4.7 favor tiles.
fn apply_favor_vp(state: &mut GameState, player: PlayerId, action_type: ActionType, count: i32) {
    if count == 0 {
        return;
    }
    let total: i32 = state
        .player(player)
        .map(|p| {
            p.favor_tiles
                .iter()
                .filter_map(|t| match t.effect {
                    FavorEffect::VpPerAction { action_type: ty, vp } if ty == action_type => Some(vp),
                    _ => None,
                })
                .sum()
        })
        .unwrap_or(0);
    if total != 0 {
        if let Some(p) = state.player_mut(player) {
            p.gain_vp(total * count);
        }
    }
}

/// Award per-spade VP/power bonuses and record scoring-tile spade VP. See
/// spec.md §4.3 (Halflings, Alchemists), §4.6.
fn award_spade_bonuses(state: &mut GameState, player: PlayerId, spades: u32) {
    let faction = player_faction(state, player).expect("player exists");
    let rules = faction.rules();
    let stronghold_built = state.player(player).unwrap().stronghold_built;

    let vp = rules.vp_per_spade() * spades as i32;
    if vp != 0 {
        state.player_mut(player).unwrap().gain_vp(vp);
    }

    let power = rules.power_per_spade_post_stronghold(stronghold_built) * spades;
    if power > 0 {
        let p = state.player_mut(player).unwrap();
        let advanced = p.power.gain(power);
        if advanced < power {
            warn!(player = ?player, requested = power, advanced, "power gain short due to bowl caps");
        }
    }

    if let Some(tile) = state.scoring_tiles.get((state.round as usize).saturating_sub(1)).copied() {
        if tile.action_type == crate::holdings::ActionType::Spade {
            state.player_mut(player).unwrap().gain_vp(tile.action_vp * spades as i32);
        }
    }

    apply_favor_vp(state, player, ActionType::Spade, spades as i32);
}

/// Place a dwelling on `hex`, charging the faction's dwelling cost, then
/// run the power-leech scan and town-formation check. See spec.md §4.5
/// "Building a dwelling...".
fn build_dwelling(state: &mut GameState, player: PlayerId, hex: Hex) -> EngineResult<()> {
    let faction = player_faction(state, player)?;
    let cost = faction.rules().dwelling_cost();
    {
        let p = state.player_mut(player).ok_or(EngineError::NotCurrentActor(player))?;
        if p.workers < cost.workers || p.coins < cost.coins {
            return Err(EngineError::InsufficientResources {
                resource: "workers/coins for dwelling",
                required: cost.workers + cost.coins,
                available: p.workers + p.coins,
            });
        }
        if p.dwellings_built >= BuildingKind::Dwelling.limit() {
            return Err(EngineError::RuleViolation("dwelling limit reached".into()));
        }
        p.workers -= cost.workers;
        p.coins -= cost.coins;
        p.dwellings_built += 1;
        p.dwellings.push(hex);
    }

    state
        .board
        .place_building(
            hex,
            Building {
                owner: player,
                kind: BuildingKind::Dwelling,
            },
        )
        .map_err(EngineError::IllegalTarget)?;

    if let Some(tile) = state.scoring_tiles.get((state.round as usize).saturating_sub(1)).copied() {
        if tile.action_type == crate::holdings::ActionType::Dwelling {
            state.player_mut(player).unwrap().gain_vp(tile.action_vp);
        }
    }
    apply_favor_vp(state, player, ActionType::Dwelling, 1);

    scan_power_leech(state, player, hex);
    check_town_formation(state, player);
    Ok(())
}

/// Scan every direct-or-bridge neighbor of `hex` for opponent buildings and
/// queue a leech offer per opponent with any adjacent power. See spec.md
/// §4.5 power-leech protocol.
fn scan_power_leech(state: &mut GameState, builder: PlayerId, hex: Hex) {
    use std::collections::HashMap;

    let mut totals: HashMap<PlayerId, u32> = HashMap::new();
    for neighbor in hex.neighbors() {
        if let Some(building) = state.board.hex(neighbor).and_then(|h| h.building.as_ref()) {
            if building.owner != builder {
                *totals.entry(building.owner).or_insert(0) += building.power_value();
            }
        }
    }
    for bridge in state.board.bridges().to_vec() {
        let other = if bridge.a == hex {
            Some(bridge.b)
        } else if bridge.b == hex {
            Some(bridge.a)
        } else {
            None
        };
        if let Some(other_hex) = other {
            if let Some(building) = state.board.hex(other_hex).and_then(|h| h.building.as_ref()) {
                if building.owner != builder {
                    *totals.entry(building.owner).or_insert(0) += building.power_value();
                }
            }
        }
    }

    for recipient in state.seating_order_from_next(builder) {
        if let Some(&amount) = totals.get(&recipient) {
            if amount > 0 {
                state.effects.queue_leech_offer(
                    recipient,
                    LeechOffer { from: builder, amount },
                );
            }
        }
    }
}

/// Run the connected-component town check for `player` after a build or
/// bridge. See spec.md §4.5 "Town formation".
fn check_town_formation(state: &mut GameState, player: PlayerId) {
    let shipping = state.player(player).map(|p| p.shipping).unwrap_or(0);
    let components = state.board.all_connected_components(player, shipping);
    for component in components {
        if component.is_empty() {
            continue;
        }
        let already_town = component
            .iter()
            .all(|&h| state.board.hex(h).is_some_and(|mh| mh.part_of_town));
        if already_town {
            continue;
        }
        let (count, power): (u32, u32) = component.iter().fold((0, 0), |(c, p), &h| {
            state
                .board
                .hex(h)
                .and_then(|mh| mh.building.as_ref())
                .map_or((c, p), |b| (c + 1, p + b.power_value()))
        });
        let has_sanctuary = component.iter().any(|&h| {
            state
                .board
                .hex(h)
                .and_then(|mh| mh.building.as_ref())
                .is_some_and(|b| b.kind == BuildingKind::Sanctuary)
        });
        let reduction = u32::from(
            state
                .player(player)
                .is_some_and(|p| p.favor_tiles.iter().any(|t| t.effect == FavorEffect::TownRequiresOneFewerBuilding)),
        );
        let qualifies = (count >= 4u32.saturating_sub(reduction) && power >= 7)
            || (count >= 3u32.saturating_sub(reduction) && has_sanctuary && power >= 7);
        if qualifies {
            state.effects.queue_town(player, component);
        }
    }
}

fn upgrade_building(
    state: &mut GameState,
    player: PlayerId,
    hex: Hex,
    to: BuildingKind,
) -> EngineResult<()> {
    let faction = player_faction(state, player)?;
    let rules = faction.rules();

    let current_kind = state
        .board
        .hex(hex)
        .and_then(|h| h.building.as_ref())
        .filter(|b| b.owner == player)
        .map(|b| b.kind)
        .ok_or_else(|| EngineError::IllegalTarget("no owned building on this hex".into()))?;

    let valid_upgrade = matches!(
        (current_kind, to),
        (BuildingKind::Dwelling, BuildingKind::TradingHouse)
            | (BuildingKind::TradingHouse, BuildingKind::Temple)
            | (BuildingKind::Temple, BuildingKind::Sanctuary)
            | (BuildingKind::TradingHouse, BuildingKind::Stronghold)
    );
    if !valid_upgrade {
        return Err(EngineError::IllegalTarget(format!(
            "{current_kind:?} cannot upgrade directly to {to:?}"
        )));
    }

    if to == BuildingKind::TradingHouse && rules.trading_house_requires_adjacent_opponent() {
        let has_adjacent_opponent = hex.neighbors().iter().any(|&n| {
            state
                .board
                .hex(n)
                .and_then(|h| h.building.as_ref())
                .is_some_and(|b| b.owner != player)
        });
        if !has_adjacent_opponent {
            return Err(EngineError::RuleViolation(
                "trading house upgrade requires an adjacent opponent building".into(),
            ));
        }
    }

    let cost = match to {
        BuildingKind::TradingHouse => rules.trading_house_cost(),
        BuildingKind::Temple => rules.temple_cost(),
        BuildingKind::Sanctuary => rules.sanctuary_cost(),
        BuildingKind::Stronghold => rules.stronghold_cost(),
        BuildingKind::Dwelling => unreachable!("dwellings are placed, not upgraded into"),
    };

    {
        let p = state.player_mut(player).ok_or(EngineError::NotCurrentActor(player))?;
        if p.workers < cost.workers || p.coins < cost.coins {
            return Err(EngineError::InsufficientResources {
                resource: "workers/coins for upgrade",
                required: cost.workers + cost.coins,
                available: p.workers + p.coins,
            });
        }
        if to.limit()
            <= match to {
                BuildingKind::TradingHouse => p.trading_houses_built,
                BuildingKind::Temple => p.temples_built,
                BuildingKind::Sanctuary => u32::from(p.sanctuary_built),
                BuildingKind::Stronghold => u32::from(p.stronghold_built),
                BuildingKind::Dwelling => unreachable!(),
            }
        {
            return Err(EngineError::RuleViolation("building limit reached".into()));
        }
        p.workers -= cost.workers;
        p.coins -= cost.coins;
        match to {
            BuildingKind::TradingHouse => {
                p.dwellings_built -= 1;
                p.trading_houses_built += 1;
            }
            BuildingKind::Temple => {
                p.trading_houses_built -= 1;
                p.temples_built += 1;
            }
            BuildingKind::Sanctuary => {
                p.temples_built -= 1;
                p.sanctuary_built = true;
            }
            BuildingKind::Stronghold => {
                p.trading_houses_built -= 1;
                p.stronghold_built = true;
            }
            BuildingKind::Dwelling => unreachable!(),
        }
    }

    state.board.hex_mut(hex).unwrap().building = Some(Building {
        owner: player,
        kind: to,
    });

    if matches!(to, BuildingKind::Temple | BuildingKind::Sanctuary) {
        let picks = rules.favor_tiles_per_temple_or_sanctuary();
        *state.effects.pending_favor_tile_selection.entry(player).or_insert(0) += picks;
    }

    if matches!(to, BuildingKind::Stronghold | BuildingKind::Sanctuary) {
        apply_stronghold_bonus(state, player, rules.stronghold_bonus());
    }

    let action_type = match to {
        BuildingKind::TradingHouse => ActionType::TradingHouse,
        BuildingKind::Temple => ActionType::Temple,
        BuildingKind::Sanctuary => ActionType::Sanctuary,
        BuildingKind::Stronghold => ActionType::Stronghold,
        BuildingKind::Dwelling => unreachable!(),
    };
    apply_favor_vp(state, player, action_type, 1);

    scan_power_leech(state, player, hex);
    check_town_formation(state, player);
    Ok(())
}

fn apply_stronghold_bonus(state: &mut GameState, player: PlayerId, bonus: StrongholdBonus) {
    match bonus {
        StrongholdBonus::None
        | StrongholdBonus::GiantsTwoFreeSpadesPerRound
        | StrongholdBonus::SwarmlingsFreeUpgradeOncePerRound
        | StrongholdBonus::ChaosMagiciansDoubleTurn => {}
        StrongholdBonus::Power(n) => {
            let p = state.player_mut(player).unwrap();
            let advanced = p.power.gain(n);
            if advanced < n {
                warn!(player = ?player, requested = n, advanced, "stronghold power bonus short due to bowl caps");
            }
        }
        StrongholdBonus::VictoryPoints(vp) => state.player_mut(player).unwrap().gain_vp(vp),
        StrongholdBonus::Shipping(n) => state.player_mut(player).unwrap().shipping += n,
        StrongholdBonus::FavorTileChoice(n) => {
            *state.effects.pending_favor_tile_selection.entry(player).or_insert(0) += n;
        }
        StrongholdBonus::PriestOrdination => {
            state.effects.pending_darklings_priest_ordination = Some(player);
        }
        StrongholdBonus::HalflingsThreeSpades => {
            state.effects.pending_halflings_spades = Some(crate::effects::PendingHalflingsSpades {
                player,
                spades_remaining: 3,
                transformed_hexes: Vec::new(),
            });
        }
    }
}

fn advance_shipping(state: &mut GameState, player: PlayerId) -> EngineResult<()> {
    let faction = player_faction(state, player)?;
    if !faction.rules().can_upgrade_shipping() {
        return Err(EngineError::WrongFaction {
            expected: "a faction that can upgrade shipping",
            actual: faction.name(),
        });
    }
    let level = state.player(player).ok_or(EngineError::NotCurrentActor(player))?.shipping;
    let cost = faction
        .rules()
        .shipping_cost(level)
        .ok_or_else(|| EngineError::RuleViolation("shipping is maxed out".into()))?;
    let p = state.player_mut(player).ok_or(EngineError::NotCurrentActor(player))?;
    if p.coins < cost.coins {
        return Err(EngineError::InsufficientResources {
            resource: "coins",
            required: cost.coins,
            available: p.coins,
        });
    }
    p.coins -= cost.coins;
    p.shipping += 1;
    Ok(())
}

fn advance_digging(state: &mut GameState, player: PlayerId) -> EngineResult<()> {
    let faction = player_faction(state, player)?;
    let level = state.player(player).ok_or(EngineError::NotCurrentActor(player))?.digging;
    let cost = faction
        .rules()
        .digging_cost(level)
        .ok_or_else(|| EngineError::WrongFaction {
            expected: "a faction that can upgrade digging",
            actual: faction.name(),
        })?;
    let p = state.player_mut(player).ok_or(EngineError::NotCurrentActor(player))?;
    if p.coins < cost.coins {
        return Err(EngineError::InsufficientResources {
            resource: "coins",
            required: cost.coins,
            available: p.coins,
        });
    }
    p.coins -= cost.coins;
    p.digging += 1;
    Ok(())
}

fn send_priest_to_cult(
    state: &mut GameState,
    player: PlayerId,
    track: CultTrack,
    value: u32,
) -> EngineResult<()> {
    let p = state.player_mut(player).ok_or(EngineError::NotCurrentActor(player))?;
    if p.priests < 1 {
        return Err(EngineError::InsufficientResources {
            resource: "priests",
            required: 1,
            available: 0,
        });
    }
    p.priests -= 1;
    p.priests_sent_to_cult_this_round += 1;

    let placement = state.cult.place_priest(track, value)?;
    if placement.priest_returned {
        state.player_mut(player).unwrap().priests += 1;
    }
    let has_key = state.player(player).unwrap().keys > 0;
    let result = state.cult.advance(player, track, placement.steps, has_key)?;
    if result.reached_ten && has_key {
        state.player_mut(player).unwrap().keys -= 1;
    }
    if result.power_gained > 0 {
        let p = state.player_mut(player).unwrap();
        let advanced = p.power.gain(result.power_gained);
        if advanced < result.power_gained {
            warn!(player = ?player, "cult milestone power gain short due to bowl caps");
        }
    }
    Ok(())
}

fn take_power_action(state: &mut GameState, player: PlayerId, space: PowerActionSpace) -> EngineResult<()> {
    if *state.power_actions_used.get(&space).unwrap_or(&true) {
        return Err(EngineError::RuleViolation("power action space already used this round".into()));
    }
    let cost = space.power_cost();
    {
        let p = state.player_mut(player).ok_or(EngineError::NotCurrentActor(player))?;
        p.power.spend(cost)?;
    }
    state.power_actions_used.insert(space, true);

    match space {
        PowerActionSpace::TwoWorkers => state.player_mut(player).unwrap().workers += 2,
        PowerActionSpace::SevenCoins => state.player_mut(player).unwrap().coins += 7,
        PowerActionSpace::Priest => {
            let p = state.player_mut(player).unwrap();
            if p.priests + 1 > 7 {
                return Err(EngineError::RuleViolation(
                    "priests would exceed the 7-priest cap".into(),
                ));
            }
            p.priests += 1;
        }
        // Grants one free `Action::BuildBridge` call this round; the bridge
        // itself is still validated by the board's geometry rules.
        PowerActionSpace::Bridge => {
            *state.effects.pending_bridge_grants.entry(player).or_insert(0) += 1;
        }
        PowerActionSpace::OneSpade | PowerActionSpace::TwoSpades => {
            let spades = if space == PowerActionSpace::TwoSpades { 2 } else { 1 };
            *state.effects.pending_spades.entry(player).or_insert(0) += spades;
        }
    }
    Ok(())
}

/// Build a bridge. Requires either a pending grant from
/// `PowerActionSpace::Bridge` (cost already paid when that power action was
/// taken) or, once Engineers have built their stronghold, their once-per-round
/// 2-worker special action. See spec.md §4.3, §4.5.
fn build_bridge(state: &mut GameState, player: PlayerId, a: Hex, b: Hex) -> EngineResult<()> {
    let grant_available = state
        .effects
        .pending_bridge_grants
        .get(&player)
        .is_some_and(|&n| n > 0);

    if grant_available {
        let remaining = state.effects.pending_bridge_grants.get(&player).copied().unwrap_or(0);
        state.effects.pending_bridge_grants.insert(player, remaining - 1);
    } else {
        let faction = player_faction(state, player)?;
        if faction != Faction::Engineers {
            return Err(EngineError::RuleViolation(
                "building a bridge requires the Bridge power action".into(),
            ));
        }
        if !state.player(player).unwrap().stronghold_built {
            return Err(EngineError::RuleViolation(
                "engineers need a built stronghold to bridge without the power action".into(),
            ));
        }
        if state.player(player).unwrap().used_special_actions.contains(&"engineers_bridge") {
            return Err(EngineError::AlreadyUsedThisRound);
        }
        let p = state.player_mut(player).unwrap();
        if p.workers < 2 {
            return Err(EngineError::InsufficientResources {
                resource: "workers",
                required: 2,
                available: p.workers,
            });
        }
        p.workers -= 2;
        p.used_special_actions.push("engineers_bridge");
    }

    state.board.build_bridge(player, a, b).map_err(EngineError::IllegalTarget)?;
    check_town_formation(state, player);
    Ok(())
}

fn bonus_spade_action(
    state: &mut GameState,
    player: PlayerId,
    hex: Hex,
    target_terrain: Terrain,
) -> EngineResult<()> {
    let card = state
        .player(player)
        .ok_or(EngineError::NotCurrentActor(player))?
        .bonus_card
        .ok_or_else(|| EngineError::RuleViolation("no bonus card held".into()))?;
    if card.special_action != Some(crate::holdings::SpecialAction::FreeSpade) {
        return Err(EngineError::RuleViolation("held bonus card has no spade action".into()));
    }
    if state.player(player).unwrap().used_special_actions.contains(&"bonus_spade") {
        return Err(EngineError::AlreadyUsedThisRound);
    }
    state.board.transform_terrain(hex, target_terrain).map_err(EngineError::IllegalTarget)?;
    state.player_mut(player).unwrap().used_special_actions.push("bonus_spade");
    award_spade_bonuses(state, player, 1);
    Ok(())
}

fn bonus_cult_action(state: &mut GameState, player: PlayerId) -> EngineResult<()> {
    let card = state
        .player(player)
        .ok_or(EngineError::NotCurrentActor(player))?
        .bonus_card
        .ok_or_else(|| EngineError::RuleViolation("no bonus card held".into()))?;
    let Some(crate::holdings::SpecialAction::AdvanceCult { track, steps }) = card.special_action else {
        return Err(EngineError::RuleViolation("held bonus card has no cult action".into()));
    };
    if state.player(player).unwrap().used_special_actions.contains(&"bonus_cult") {
        return Err(EngineError::AlreadyUsedThisRound);
    }
    state.player_mut(player).unwrap().used_special_actions.push("bonus_cult");
    let result = state.cult.advance(player, track, steps, false)?;
    if result.power_gained > 0 {
        state.player_mut(player).unwrap().power.gain(result.power_gained);
    }
    Ok(())
}

fn pass(state: &mut GameState, player: PlayerId, next_bonus_card: BonusCardId) -> EngineResult<()> {
    let index = state
        .bonus_card_pool
        .iter()
        .position(|c| c.id == next_bonus_card)
        .ok_or_else(|| EngineError::IllegalTarget("bonus card is not available in the pool".into()))?;
    let new_card = state.bonus_card_pool.remove(index);

    let p = state.player_mut(player).ok_or(EngineError::NotCurrentActor(player))?;
    if let Some(old_card) = p.bonus_card.replace(new_card) {
        state.bonus_card_pool.push(old_card);
    }
    state.player_mut(player).unwrap().has_passed = true;
    state.pass_order.push(player);
    award_pass_time_bonuses(state, player);
    Ok(())
}

fn building_count_for(state: &GameState, player: PlayerId, action_type: ActionType) -> u32 {
    state
        .player(player)
        .map(|p| match action_type {
            ActionType::Dwelling => p.dwellings_built,
            ActionType::TradingHouse => p.trading_houses_built,
            ActionType::Temple => p.temples_built,
            ActionType::Sanctuary => u32::from(p.sanctuary_built),
            ActionType::Stronghold => u32::from(p.stronghold_built),
            ActionType::Spade | ActionType::Town => 0,
        })
        .unwrap_or(0)
}

/// VP earned purely by passing: Engineers' per-bridge bonus once their
/// stronghold is built, and any held favor tile that pays coins per
/// building of a given type. See spec.md §4.3, §4.5, §4.7.
fn award_pass_time_bonuses(state: &mut GameState, player: PlayerId) {
    let Ok(faction) = player_faction(state, player) else {
        return;
    };
    let stronghold_built = state.player(player).is_some_and(|p| p.stronghold_built);
    let vp_per_bridge = faction.rules().vp_per_bridge_on_pass(stronghold_built);
    if vp_per_bridge != 0 {
        let bridge_count = state.board.bridges().iter().filter(|br| br.owner == player).count() as i32;
        if bridge_count > 0 {
            state.player_mut(player).unwrap().gain_vp(vp_per_bridge * bridge_count);
        }
    }

    let coin_rewards: Vec<(ActionType, u32)> = state
        .player(player)
        .map(|p| {
            p.favor_tiles
                .iter()
                .filter_map(|t| match t.effect {
                    FavorEffect::PassCoinsPerBuilding { action_type, coins } => Some((action_type, coins)),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();
    for (action_type, coins_per) in coin_rewards {
        let count = building_count_for(state, player, action_type);
        if count > 0 && coins_per > 0 {
            state.player_mut(player).unwrap().coins += coins_per * count;
        }
    }
}

fn apply_conversion(state: &mut GameState, player: PlayerId, conversion: Conversion) -> EngineResult<()> {
    let faction = player_faction(state, player)?;
    let p = state.player_mut(player).ok_or(EngineError::NotCurrentActor(player))?;
    match conversion {
        Conversion::PowerToCoin { power } => {
            p.power.spend(power)?;
            p.coins += power;
        }
        Conversion::PowerToWorker { power } => {
            if power % 3 != 0 {
                return Err(EngineError::RuleViolation("power-to-worker requires a multiple of 3".into()));
            }
            p.power.spend(power)?;
            p.workers += power / 3;
        }
        Conversion::PowerToPriest { power } => {
            if power % 5 != 0 {
                return Err(EngineError::RuleViolation("power-to-priest requires a multiple of 5".into()));
            }
            let gained = power / 5;
            if p.priests + gained > 7 {
                return Err(EngineError::RuleViolation("priests would exceed the 7-priest cap".into()));
            }
            p.power.spend(power)?;
            p.priests += gained;
        }
        Conversion::PriestToWorker { priests } => {
            if p.priests < priests {
                return Err(EngineError::InsufficientResources {
                    resource: "priests",
                    required: priests,
                    available: p.priests,
                });
            }
            p.priests -= priests;
            p.workers += priests;
        }
        Conversion::WorkerToCoin { workers } => {
            if p.workers < workers {
                return Err(EngineError::InsufficientResources {
                    resource: "workers",
                    required: workers,
                    available: p.workers,
                });
            }
            p.workers -= workers;
            p.coins += workers;
        }
        Conversion::AlchemistsVpToCoin { vp } => {
            if faction != Faction::Alchemists {
                return Err(EngineError::WrongFaction {
                    expected: "alchemists",
                    actual: faction.name(),
                });
            }
            p.victory_points -= vp as i32;
            p.coins += vp;
        }
        Conversion::AlchemistsCoinToVp { coins } => {
            if faction != Faction::Alchemists {
                return Err(EngineError::WrongFaction {
                    expected: "alchemists",
                    actual: faction.name(),
                });
            }
            if coins % 2 != 0 {
                return Err(EngineError::RuleViolation("coin-to-VP requires an even number of coins".into()));
            }
            if p.coins < coins {
                return Err(EngineError::InsufficientResources {
                    resource: "coins",
                    required: coins,
                    available: p.coins,
                });
            }
            p.coins -= coins;
            p.victory_points += (coins / 2) as i32;
        }
    }
    Ok(())
}

fn burn_power(state: &mut GameState, player: PlayerId, amount: u32) -> EngineResult<()> {
    let p = state.player_mut(player).ok_or(EngineError::NotCurrentActor(player))?;
    p.power.burn(amount)
}

fn accept_leech(state: &mut GameState, player: PlayerId) -> EngineResult<()> {
    let offer = state
        .effects
        .pending_leech_offers
        .get_mut(&player)
        .and_then(std::collections::VecDeque::pop_front)
        .ok_or(EngineError::NotCurrentActor(player))?;

    let p = state.player_mut(player).ok_or(EngineError::NotCurrentActor(player))?;
    let actual = p.power.max_leechable(offer.amount);
    let advanced = p.power.gain(actual);
    if advanced > 0 {
        p.victory_points -= (advanced as i32) - 1;
    }

    if let Some(any_accepted) = state.effects.leech_batch_any_accepted.get_mut(&offer.from) {
        *any_accepted = true;
    }
    maybe_resolve_cultists_trigger(state, offer.from);
    Ok(())
}

fn decline_leech(state: &mut GameState, player: PlayerId) -> EngineResult<()> {
    let offer = state
        .effects
        .pending_leech_offers
        .get_mut(&player)
        .and_then(std::collections::VecDeque::pop_front)
        .ok_or(EngineError::NotCurrentActor(player))?;
    maybe_resolve_cultists_trigger(state, offer.from);
    Ok(())
}

/// Cultists hook: once every queued offer triggered by `builder`'s action
/// has drained, if `builder` is Cultists, either grant a cult-track choice
/// (someone accepted) or +1 power (everyone declined). See spec.md §4.3,
/// §8 scenario 1.
fn maybe_resolve_cultists_trigger(state: &mut GameState, builder: PlayerId) {
    let still_owed = state
        .effects
        .pending_leech_offers
        .values()
        .flatten()
        .any(|o| o.from == builder);
    if still_owed {
        return;
    }
    let Some(builder_player) = state.player(builder) else {
        return;
    };
    if builder_player.faction != Faction::Cultists {
        return;
    }
    let any_accepted = state
        .effects
        .leech_batch_any_accepted
        .remove(&builder)
        .unwrap_or(false);
    if any_accepted {
        state.effects.pending_cultists_cult_selection = Some(builder);
    } else {
        let p = state.player_mut(builder).unwrap();
        let advanced = p.power.gain(1);
        if advanced == 0 {
            warn!(player = ?builder, "cultists +1 power bonus lost to full bowls");
        }
    }
}

fn use_cult_reward_spade(
    state: &mut GameState,
    player: PlayerId,
    hex: Hex,
    target_terrain: Terrain,
) -> EngineResult<()> {
    let remaining = state.effects.pending_cult_reward_spades.get(&player).copied().unwrap_or(0);
    if remaining == 0 {
        return Err(EngineError::NotCurrentActor(player));
    }
    state.board.transform_terrain(hex, target_terrain).map_err(EngineError::IllegalTarget)?;
    state.effects.pending_cult_reward_spades.insert(player, remaining - 1);
    Ok(())
}

fn select_town_tile(state: &mut GameState, player: PlayerId, tile_id: TownTileId) -> EngineResult<()> {
    let pending = state
        .effects
        .pending_town_formations
        .get_mut(&player)
        .and_then(std::collections::VecDeque::pop_front)
        .ok_or(EngineError::NotCurrentActor(player))?;

    let index = state
        .town_tile_pool
        .iter()
        .position(|t| t.id == tile_id)
        .ok_or_else(|| EngineError::IllegalTarget("town tile is not available".into()))?;
    let tile = state.town_tile_pool.remove(index);

    state.board.mark_town(&pending.hexes);

    let faction = player_faction(state, player)?;
    {
        let p = state.player_mut(player).unwrap();
        p.gain_vp(tile.victory_points + faction.rules().vp_per_town());
        p.coins += tile.coins;
        p.workers += tile.workers + faction.rules().workers_per_town();
        p.keys += u32::from(tile.grants_key);
        if tile.power > 0 {
            let advanced = p.power.gain(tile.power);
            if advanced < tile.power {
                debug!(player = ?player, "town tile power reward short due to bowl caps");
            }
        }
    }
    if tile.priests > 0 {
        crate::round::gain_priests_capped(state, player, tile.priests);
    }
    apply_favor_vp(state, player, ActionType::Town, 1);
    Ok(())
}

fn select_cultists_track(state: &mut GameState, player: PlayerId, track: CultTrack) -> EngineResult<()> {
    if state.effects.pending_cultists_cult_selection != Some(player) {
        return Err(EngineError::NotCurrentActor(player));
    }
    state.effects.pending_cultists_cult_selection = None;
    let result = state.cult.advance(player, track, 1, false)?;
    if result.power_gained > 0 {
        state.player_mut(player).unwrap().power.gain(result.power_gained);
    }
    Ok(())
}

fn apply_halflings_spade(
    state: &mut GameState,
    player: PlayerId,
    hex: Hex,
    target_terrain: Terrain,
) -> EngineResult<()> {
    let mut pending = state
        .effects
        .pending_halflings_spades
        .clone()
        .filter(|p| p.player == player)
        .ok_or(EngineError::NotCurrentActor(player))?;
    if pending.spades_remaining == 0 {
        return Err(EngineError::RuleViolation("no Halflings spades remaining".into()));
    }
    state.board.transform_terrain(hex, target_terrain).map_err(EngineError::IllegalTarget)?;
    pending.spades_remaining -= 1;
    pending.transformed_hexes.push(hex);

    state.player_mut(player).unwrap().gain_vp(1);
    if let Some(tile) = state.scoring_tiles.get((state.round as usize).saturating_sub(1)).copied() {
        if tile.action_type == crate::holdings::ActionType::Spade {
            state.player_mut(player).unwrap().gain_vp(tile.action_vp);
        }
    }

    state.effects.pending_halflings_spades = Some(pending);
    Ok(())
}

fn build_halflings_dwelling(state: &mut GameState, player: PlayerId, hex: Hex) -> EngineResult<()> {
    let pending = state
        .effects
        .pending_halflings_spades
        .clone()
        .filter(|p| p.player == player && p.spades_remaining == 0)
        .ok_or_else(|| EngineError::RuleViolation("Halflings spade chain is not ready for a dwelling choice".into()))?;
    if !pending.transformed_hexes.contains(&hex) {
        return Err(EngineError::IllegalTarget("dwelling must be on a hex just transformed".into()));
    }
    state.effects.pending_halflings_spades = None;
    build_dwelling(state, player, hex)
}

fn skip_halflings_dwelling(state: &mut GameState, player: PlayerId) -> EngineResult<()> {
    let ready = state
        .effects
        .pending_halflings_spades
        .as_ref()
        .is_some_and(|p| p.player == player && p.spades_remaining == 0);
    if !ready {
        return Err(EngineError::RuleViolation("Halflings spade chain is not ready to be cleared".into()));
    }
    state.effects.pending_halflings_spades = None;
    Ok(())
}

fn use_darklings_ordination(
    state: &mut GameState,
    player: PlayerId,
    workers_to_convert: u32,
) -> EngineResult<()> {
    if state.effects.pending_darklings_priest_ordination != Some(player) {
        return Err(EngineError::NotCurrentActor(player));
    }
    let p = state.player_mut(player).ok_or(EngineError::NotCurrentActor(player))?;
    if p.workers < workers_to_convert {
        return Err(EngineError::InsufficientResources {
            resource: "workers",
            required: workers_to_convert,
            available: p.workers,
        });
    }
    if p.priests + workers_to_convert > 7 {
        return Err(EngineError::RuleViolation("priests would exceed the 7-priest cap".into()));
    }
    p.workers -= workers_to_convert;
    p.priests += workers_to_convert;
    state.effects.pending_darklings_priest_ordination = None;
    Ok(())
}

fn discard_pending_spade(state: &mut GameState, player: PlayerId) -> EngineResult<()> {
    let remaining = state.effects.pending_spades.get(&player).copied().unwrap_or(0);
    if remaining == 0 {
        return Err(EngineError::NotCurrentActor(player));
    }
    state.effects.pending_spades.insert(player, remaining - 1);
    Ok(())
}

/// Spend one spade from a power-action follow-up (spec.md §4.5 "Power
/// action ... 1 spade, 2 spades"). Unlike a cult-reward spade (scenario 5),
/// these still earn the scoring-tile's Spade VP and per-spade faction
/// bonuses, since they behave like a regular terraform.
fn use_pending_spade(
    state: &mut GameState,
    player: PlayerId,
    hex: Hex,
    target_terrain: Terrain,
) -> EngineResult<()> {
    let remaining = state.effects.pending_spades.get(&player).copied().unwrap_or(0);
    if remaining == 0 {
        return Err(EngineError::NotCurrentActor(player));
    }
    state.board.transform_terrain(hex, target_terrain).map_err(EngineError::IllegalTarget)?;
    state.effects.pending_spades.insert(player, remaining - 1);
    award_spade_bonuses(state, player, 1);
    Ok(())
}

fn sandstorm_action(state: &mut GameState, player: PlayerId, hex: Hex) -> EngineResult<()> {
    let faction = player_faction(state, player)?;
    if faction != Faction::Nomads {
        return Err(EngineError::WrongFaction {
            expected: "nomads",
            actual: faction.name(),
        });
    }
    if !state.player(player).unwrap().stronghold_built {
        return Err(EngineError::RuleViolation("sandstorm requires a built stronghold".into()));
    }
    if state.player(player).unwrap().used_special_actions.contains(&"sandstorm") {
        return Err(EngineError::AlreadyUsedThisRound);
    }
    let shipping = state.player(player).unwrap().shipping;
    if !state.board.is_adjacent_to_player(hex, player, shipping) {
        return Err(EngineError::IllegalTarget("hex is not adjacent to a Nomads building".into()));
    }
    state.board.transform_terrain(hex, Terrain::Desert).map_err(EngineError::IllegalTarget)?;
    state.player_mut(player).unwrap().used_special_actions.push("sandstorm");
    Ok(())
}

/// Resolve one pending favor-tile selection earned from a Temple/Sanctuary
/// build or a stronghold bonus. See spec.md §4.7, §8.
fn select_favor_tile(state: &mut GameState, player: PlayerId, tile_id: FavorTileId) -> EngineResult<()> {
    let remaining = state
        .effects
        .pending_favor_tile_selection
        .get(&player)
        .copied()
        .unwrap_or(0);
    if remaining == 0 {
        return Err(EngineError::NotCurrentActor(player));
    }

    let index = state
        .favor_tile_pool
        .iter()
        .position(|t| t.id == tile_id)
        .ok_or_else(|| EngineError::IllegalTarget("favor tile is not available".into()))?;
    let tile = state.favor_tile_pool.remove(index);

    state.effects.pending_favor_tile_selection.insert(player, remaining - 1);
    state.player_mut(player).unwrap().favor_tiles.push(tile);

    if let FavorEffect::CultAdvance { track, steps } = tile.effect {
        let has_key = state.player(player).unwrap().keys > 0;
        let result = state.cult.advance(player, track, steps, has_key)?;
        if result.reached_ten && has_key {
            state.player_mut(player).unwrap().keys -= 1;
        }
        if result.power_gained > 0 {
            let p = state.player_mut(player).unwrap();
            let advanced = p.power.gain(result.power_gained);
            if advanced < result.power_gained {
                warn!(player = ?player, "favor tile cult-milestone power gain short due to bowl caps");
            }
        }
    }
    Ok(())
}

/// Giants' stronghold bonus: once per round, transform one hex for free and
/// collect the normal per-spade bonuses for 2 spades. See spec.md §4.3.
fn giants_free_spades(
    state: &mut GameState,
    player: PlayerId,
    hex: Hex,
    target_terrain: Terrain,
) -> EngineResult<()> {
    let faction = player_faction(state, player)?;
    if faction != Faction::Giants {
        return Err(EngineError::WrongFaction {
            expected: "giants",
            actual: faction.name(),
        });
    }
    if !state.player(player).unwrap().stronghold_built {
        return Err(EngineError::RuleViolation("requires a built stronghold".into()));
    }
    if state.player(player).unwrap().used_special_actions.contains(&"giants_free_spades") {
        return Err(EngineError::AlreadyUsedThisRound);
    }
    state.board.transform_terrain(hex, target_terrain).map_err(EngineError::IllegalTarget)?;
    state.player_mut(player).unwrap().used_special_actions.push("giants_free_spades");
    award_spade_bonuses(state, player, 2);
    Ok(())
}

/// Swarmlings' stronghold bonus: once per round, upgrade a Dwelling to a
/// Trading House for free. See spec.md §4.3.
fn swarmlings_free_upgrade(state: &mut GameState, player: PlayerId, hex: Hex) -> EngineResult<()> {
    let faction = player_faction(state, player)?;
    if faction != Faction::Swarmlings {
        return Err(EngineError::WrongFaction {
            expected: "swarmlings",
            actual: faction.name(),
        });
    }
    if !state.player(player).unwrap().stronghold_built {
        return Err(EngineError::RuleViolation("requires a built stronghold".into()));
    }
    if state.player(player).unwrap().used_special_actions.contains(&"swarmlings_free_upgrade") {
        return Err(EngineError::AlreadyUsedThisRound);
    }

    let owned_dwelling = state
        .board
        .hex(hex)
        .and_then(|h| h.building.as_ref())
        .filter(|b| b.owner == player && b.kind == BuildingKind::Dwelling)
        .is_some();
    if !owned_dwelling {
        return Err(EngineError::IllegalTarget("no owned dwelling on this hex".into()));
    }
    let p = state.player_mut(player).unwrap();
    if p.trading_houses_built >= BuildingKind::TradingHouse.limit() {
        return Err(EngineError::RuleViolation("trading house limit reached".into()));
    }
    p.dwellings_built -= 1;
    p.trading_houses_built += 1;
    p.used_special_actions.push("swarmlings_free_upgrade");

    state.board.hex_mut(hex).unwrap().building = Some(Building {
        owner: player,
        kind: BuildingKind::TradingHouse,
    });
    apply_favor_vp(state, player, ActionType::TradingHouse, 1);
    scan_power_leech(state, player, hex);
    check_town_formation(state, player);
    Ok(())
}

/// Witches' Ride: once per round, after their stronghold is built, place a
/// dwelling on any unoccupied Forest hex regardless of adjacency to their
/// existing network. See spec.md §4.3.
fn witches_ride(state: &mut GameState, player: PlayerId, hex: Hex) -> EngineResult<()> {
    let faction = player_faction(state, player)?;
    if faction != Faction::Witches {
        return Err(EngineError::WrongFaction {
            expected: "witches",
            actual: faction.name(),
        });
    }
    if !state.player(player).unwrap().stronghold_built {
        return Err(EngineError::RuleViolation("requires a built stronghold".into()));
    }
    if state.player(player).unwrap().used_special_actions.contains(&"witches_ride") {
        return Err(EngineError::AlreadyUsedThisRound);
    }
    let map_hex = state
        .board
        .hex(hex)
        .ok_or_else(|| EngineError::IllegalTarget("hex is off the board".into()))?;
    if map_hex.terrain != Terrain::Forest || map_hex.building.is_some() {
        return Err(EngineError::IllegalTarget("witches' ride requires an unoccupied forest hex".into()));
    }
    state.player_mut(player).unwrap().used_special_actions.push("witches_ride");
    build_dwelling(state, player, hex)
}

/// Chaos Magicians' stronghold bonus: once per round, grant an extra main
/// action this turn before control passes to the next player. The engine
/// only surfaces this as an informational follow-up; advancing (or not
/// advancing) the turn cursor is left to the embedder. See spec.md §4.3.
fn chaos_magicians_double_turn(state: &mut GameState, player: PlayerId) -> EngineResult<()> {
    let faction = player_faction(state, player)?;
    if faction != Faction::ChaosMagicians {
        return Err(EngineError::WrongFaction {
            expected: "chaos magicians",
            actual: faction.name(),
        });
    }
    if !state.player(player).unwrap().stronghold_built {
        return Err(EngineError::RuleViolation("requires a built stronghold".into()));
    }
    if state.player(player).unwrap().used_special_actions.contains(&"chaos_double_turn") {
        return Err(EngineError::AlreadyUsedThisRound);
    }
    state.player_mut(player).unwrap().used_special_actions.push("chaos_double_turn");
    state.effects.pending_extra_main_action = Some(player);
    Ok(())
}
