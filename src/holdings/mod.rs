//! Bonus cards, favor tiles, town tiles, and scoring tiles: pools and
//! per-player holdings. See spec.md §4.6, §GLOSSARY.

use serde::{Deserialize, Serialize};

use crate::cult::CultTrack;

#[cfg(test)]
mod tests;

/// The action categories a scoring tile or favor tile can reward. See
/// spec.md §4.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    Dwelling,
    TradingHouse,
    Temple,
    Sanctuary,
    Stronghold,
    Spade,
    Town,
}

impl ActionType {
    pub fn name(self) -> &'static str {
        match self {
            ActionType::Dwelling => "dwelling",
            ActionType::TradingHouse => "trading_house",
            ActionType::Temple => "temple",
            ActionType::Sanctuary => "sanctuary",
            ActionType::Stronghold => "stronghold",
            ActionType::Spade => "spade",
            ActionType::Town => "town",
        }
    }
}

/// A resource granted by a cult-reward or town-tile payout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reward {
    Coins(u32),
    Workers(u32),
    Priests(u32),
    Power(u32),
    Spades(u32),
    VictoryPoints(i32),
    Key,
}

/// The round's global scoring rule: per-action VP plus an end-of-round
/// cult-track reward. See spec.md §4.6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringTile {
    pub action_type: ActionType,
    pub action_vp: i32,
    pub cult_track: CultTrack,
    pub cult_threshold: u32,
    pub cult_reward: Reward,
    /// The Temple+Priest special case (spec.md §4.6): reward is 2 coins
    /// per priest sent to any cult track this round, not a threshold
    /// multiple. When true, `cult_track`/`cult_threshold`/`cult_reward`
    /// are ignored by the cleanup step.
    pub temple_priest_special_case: bool,
}

/// A representative catalog of scoring tiles, one per round of a six-round
/// game. See spec.md §4.6, §8 scenario 5 (the Spades tile) and the
/// Temple+Priest special case.
pub fn scoring_tile_catalog() -> Vec<ScoringTile> {
    vec![
        ScoringTile {
            action_type: ActionType::Spade,
            action_vp: 2,
            cult_track: CultTrack::Earth,
            cult_threshold: 4,
            cult_reward: Reward::Spades(1),
            temple_priest_special_case: false,
        },
        ScoringTile {
            action_type: ActionType::Dwelling,
            action_vp: 2,
            cult_track: CultTrack::Water,
            cult_threshold: 3,
            cult_reward: Reward::Coins(3),
            temple_priest_special_case: false,
        },
        ScoringTile {
            action_type: ActionType::TradingHouse,
            action_vp: 3,
            cult_track: CultTrack::Fire,
            cult_threshold: 3,
            cult_reward: Reward::Power(3),
            temple_priest_special_case: false,
        },
        ScoringTile {
            action_type: ActionType::Temple,
            action_vp: 4,
            cult_track: CultTrack::Air,
            cult_threshold: 3,
            cult_reward: Reward::Priests(1),
            temple_priest_special_case: true,
        },
        ScoringTile {
            action_type: ActionType::Town,
            action_vp: 5,
            cult_track: CultTrack::Earth,
            cult_threshold: 2,
            cult_reward: Reward::Workers(2),
            temple_priest_special_case: false,
        },
        ScoringTile {
            action_type: ActionType::Stronghold,
            action_vp: 5,
            cult_track: CultTrack::Fire,
            cult_threshold: 2,
            cult_reward: Reward::Coins(4),
            temple_priest_special_case: false,
        },
    ]
}

/// A once-per-round holding chosen at pass time: modifies income and
/// enables one special action for the round it's held. See spec.md
/// §GLOSSARY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BonusCard {
    pub id: BonusCardId,
    pub income: Reward,
    pub special_action: Option<SpecialAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BonusCardId {
    ThreeCoins,
    FourCoinsSpade,
    OneWorkerOneCoin,
    OnePriest,
    ThreePower,
    FourPowerShippingBonus,
    OneSpade,
    CultAdvanceTwo,
    SixCoins,
}

impl BonusCardId {
    pub fn name(self) -> &'static str {
        match self {
            BonusCardId::ThreeCoins => "bon1_three_coins",
            BonusCardId::FourCoinsSpade => "bon2_spade",
            BonusCardId::OneWorkerOneCoin => "bon3_worker",
            BonusCardId::OnePriest => "bon4_priest",
            BonusCardId::ThreePower => "bon5_three_power",
            BonusCardId::FourPowerShippingBonus => "bon6_four_power",
            BonusCardId::OneSpade => "bon7_spade",
            BonusCardId::CultAdvanceTwo => "bon8_cult",
            BonusCardId::SixCoins => "bon9_six_coins",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpecialAction {
    FreeSpade,
    AdvanceCult { track: CultTrack, steps: u32 },
}

/// The nine bonus cards available each game. See spec.md §4.6.
pub fn bonus_card_catalog() -> Vec<BonusCard> {
    vec![
        BonusCard {
            id: BonusCardId::ThreeCoins,
            income: Reward::Coins(3),
            special_action: None,
        },
        BonusCard {
            id: BonusCardId::FourCoinsSpade,
            income: Reward::Coins(2),
            special_action: Some(SpecialAction::FreeSpade),
        },
        BonusCard {
            id: BonusCardId::OneWorkerOneCoin,
            income: Reward::Workers(1),
            special_action: None,
        },
        BonusCard {
            id: BonusCardId::OnePriest,
            income: Reward::Priests(1),
            special_action: None,
        },
        BonusCard {
            id: BonusCardId::ThreePower,
            income: Reward::Power(3),
            special_action: None,
        },
        BonusCard {
            id: BonusCardId::FourPowerShippingBonus,
            income: Reward::Power(4),
            special_action: None,
        },
        BonusCard {
            id: BonusCardId::OneSpade,
            income: Reward::Coins(1),
            special_action: Some(SpecialAction::FreeSpade),
        },
        BonusCard {
            id: BonusCardId::CultAdvanceTwo,
            income: Reward::Coins(1),
            special_action: Some(SpecialAction::AdvanceCult {
                track: CultTrack::Fire,
                steps: 2,
            }),
        },
        BonusCard {
            id: BonusCardId::SixCoins,
            income: Reward::Coins(6),
            special_action: None,
        },
    ]
}

/// A one-time selection earned by building a Temple or Sanctuary. See
/// spec.md §GLOSSARY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavorTile {
    pub id: FavorTileId,
    pub effect: FavorEffect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FavorTileId {
    Fire1,
    Water1,
    Earth1,
    Earth2,
    Air1,
    TownSizeThree,
    PassCoinsPerTradingHouse,
}

impl FavorTileId {
    pub fn name(self) -> &'static str {
        match self {
            FavorTileId::Fire1 => "fav_fire1",
            FavorTileId::Water1 => "fav_water1",
            FavorTileId::Earth1 => "fav_earth1",
            FavorTileId::Earth2 => "fav_earth2",
            FavorTileId::Air1 => "fav_air1",
            FavorTileId::TownSizeThree => "fav_town3",
            FavorTileId::PassCoinsPerTradingHouse => "fav_pass_th_coins",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FavorEffect {
    CultAdvance { track: CultTrack, steps: u32 },
    VpPerAction { action_type: ActionType, vp: i32 },
    TownRequiresOneFewerBuilding,
    PassCoinsPerBuilding { action_type: ActionType, coins: u32 },
}

pub fn favor_tile_catalog() -> Vec<FavorTile> {
    vec![
        FavorTile {
            id: FavorTileId::Fire1,
            effect: FavorEffect::CultAdvance {
                track: CultTrack::Fire,
                steps: 1,
            },
        },
        FavorTile {
            id: FavorTileId::Water1,
            effect: FavorEffect::CultAdvance {
                track: CultTrack::Water,
                steps: 1,
            },
        },
        FavorTile {
            id: FavorTileId::Earth1,
            effect: FavorEffect::VpPerAction {
                action_type: ActionType::Dwelling,
                vp: 1,
            },
        },
        FavorTile {
            id: FavorTileId::Earth2,
            effect: FavorEffect::CultAdvance {
                track: CultTrack::Earth,
                steps: 1,
            },
        },
        FavorTile {
            id: FavorTileId::Air1,
            effect: FavorEffect::CultAdvance {
                track: CultTrack::Air,
                steps: 1,
            },
        },
        FavorTile {
            id: FavorTileId::TownSizeThree,
            effect: FavorEffect::TownRequiresOneFewerBuilding,
        },
        FavorTile {
            id: FavorTileId::PassCoinsPerTradingHouse,
            effect: FavorEffect::PassCoinsPerBuilding {
                action_type: ActionType::TradingHouse,
                coins: 1,
            },
        },
    ]
}

/// Rewards for sealing a town. See spec.md §GLOSSARY, §8 scenario 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TownTile {
    pub id: TownTileId,
    pub victory_points: i32,
    pub coins: u32,
    pub workers: u32,
    pub priests: u32,
    pub power: u32,
    pub grants_key: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TownTileId {
    TownTile5Points,
    TownTile7PointsWorkers,
    TownTile9PointsCoins,
    TownTile11Points,
}

impl TownTileId {
    pub fn name(self) -> &'static str {
        match self {
            TownTileId::TownTile5Points => "town_5vp_6coins_key",
            TownTileId::TownTile7PointsWorkers => "town_7vp_2workers",
            TownTileId::TownTile9PointsCoins => "town_9vp_1priest",
            TownTileId::TownTile11Points => "town_11vp_key",
        }
    }
}

pub fn town_tile_catalog() -> Vec<TownTile> {
    vec![
        TownTile {
            id: TownTileId::TownTile5Points,
            victory_points: 5,
            coins: 6,
            workers: 0,
            priests: 0,
            power: 0,
            grants_key: true,
        },
        TownTile {
            id: TownTileId::TownTile7PointsWorkers,
            victory_points: 7,
            coins: 0,
            workers: 2,
            priests: 0,
            power: 0,
            grants_key: false,
        },
        TownTile {
            id: TownTileId::TownTile9PointsCoins,
            victory_points: 9,
            coins: 0,
            workers: 0,
            priests: 1,
            power: 0,
            grants_key: false,
        },
        TownTile {
            id: TownTileId::TownTile11Points,
            victory_points: 11,
            coins: 0,
            workers: 0,
            priests: 0,
            power: 0,
            grants_key: true,
        },
    ]
}
