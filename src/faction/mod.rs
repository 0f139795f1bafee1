//! The faction catalog: fourteen variants sharing one capability trait. See
//! spec.md §4.3.
//!
//! Each faction is a zero-sized type implementing [`FactionRules`]; the
//! [`Faction`] enum dispatches to a `&'static dyn FactionRules` rather than
//! matching on a name string, per spec.md §9's explicit guidance against
//! stringly-typed dispatch. Default trait methods give the "standard"
//! faction behavior; only the factions that diverge override a hook.

use serde::{Deserialize, Serialize};

use crate::hex::Terrain;


/// Resources a faction starts the game with. See spec.md §3, §4.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartingResources {
    pub coins: u32,
    pub workers: u32,
    pub priests: u32,
    pub power_bowl1: u32,
    pub power_bowl2: u32,
    pub shipping: u32,
    pub starting_dwellings: u32,
}

/// A workers+coins price, used for every building tier and for
/// shipping/digging advancement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildCost {
    pub workers: u32,
    pub coins: u32,
}

impl BuildCost {
    pub const fn new(workers: u32, coins: u32) -> Self {
        Self { workers, coins }
    }
}

/// What happens the instant a faction's stronghold (or, for a few factions,
/// sanctuary) completes construction. Plain data, applied by the `action`
/// module rather than mutated from within the trait — see spec.md §9 on
/// pending follow-ups being plain data, which this mirrors for symmetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrongholdBonus {
    None,
    Power(u32),
    VictoryPoints(i32),
    Shipping(u32),
    FavorTileChoice(u32),
    PriestOrdination,
    HalflingsThreeSpades,
    GiantsTwoFreeSpadesPerRound,
    SwarmlingsFreeUpgradeOncePerRound,
    ChaosMagiciansDoubleTurn,
}

/// The shared capability set every faction implements. Defaults encode
/// "standard" Terra-Mystica-family behavior; overriding factions only
/// implement the hooks that differ. See spec.md §4.3.
pub trait FactionRules: Send + Sync {
    fn home_terrain(&self) -> Terrain;
    fn starting_resources(&self) -> StartingResources;

    fn dwelling_cost(&self) -> BuildCost {
        BuildCost::new(1, 2)
    }
    fn trading_house_cost(&self) -> BuildCost {
        BuildCost::new(2, 6)
    }
    fn temple_cost(&self) -> BuildCost {
        BuildCost::new(2, 5)
    }
    fn sanctuary_cost(&self) -> BuildCost {
        BuildCost::new(4, 6)
    }
    fn stronghold_cost(&self) -> BuildCost {
        BuildCost::new(4, 8)
    }

    /// `None` means this faction cannot upgrade shipping at all (Fakirs,
    /// Dwarves).
    fn shipping_cost(&self, level: u32) -> Option<BuildCost> {
        Some(BuildCost::new(0, 3 + level))
    }

    /// `None` means this faction cannot upgrade digging (Darklings, who
    /// terraform with priests instead).
    fn digging_cost(&self, level: u32) -> Option<BuildCost> {
        Some(BuildCost::new(0, 2 + 2 * level))
    }

    /// Workers spent per spade at the given digging level. Standard table:
    /// 3 / 2 / 1. Overridden by Alchemists (cheaper at digging 0).
    fn terraform_workers_per_spade(&self, digging_level: u32) -> u32 {
        match digging_level {
            0 => 3,
            1 => 2,
            _ => 1,
        }
    }

    /// `Some(n)` when this faction terraforms with priests instead of
    /// workers, at `n` priests per spade (Darklings: 1).
    fn terraform_priests_per_spade(&self) -> Option<u32> {
        None
    }

    /// `Some(n)` when terraform always costs exactly `n` spades regardless
    /// of wheel distance (Giants: 2).
    fn fixed_spade_count(&self) -> Option<u32> {
        None
    }

    /// Extra VP gained per spade from any source (Halflings: 1).
    fn vp_per_spade(&self) -> i32 {
        0
    }

    /// Extra power gained per spade from any source, only once the
    /// stronghold is built (Alchemists: 1). Callers pass whether the
    /// stronghold is already standing.
    fn power_per_spade_post_stronghold(&self, stronghold_built: bool) -> u32 {
        let _ = stronghold_built;
        0
    }

    fn can_upgrade_shipping(&self) -> bool {
        true
    }

    /// Workers paid to "skip" terraforming (Dwarves tunneling). `None` if
    /// the faction has no skip action.
    fn tunneling_workers_cost(&self, stronghold_built: bool) -> Option<u32> {
        let _ = stronghold_built;
        None
    }

    /// Priests paid to carpet-flight instead of terraforming normally
    /// (Fakirs). `None` if the faction has no carpet-flight action.
    fn carpet_flight_range(&self) -> Option<u32> {
        None
    }

    /// Bonus applied the instant the stronghold is completed.
    fn stronghold_bonus(&self) -> StrongholdBonus {
        StrongholdBonus::None
    }

    /// Extra VP gained per town formed (Witches: 5).
    fn vp_per_town(&self) -> i32 {
        0
    }

    /// Extra workers gained per town formed (Swarmlings: 3).
    fn workers_per_town(&self) -> u32 {
        0
    }

    /// D→TH upgrade normally requires an opponent building in range;
    /// factions may waive this (none do by default).
    fn trading_house_requires_adjacent_opponent(&self) -> bool {
        true
    }

    /// Temples/sanctuaries granting more than one favor-tile pick (Chaos
    /// Magicians: 2 per temple/sanctuary instead of 1).
    fn favor_tiles_per_temple_or_sanctuary(&self) -> u32 {
        1
    }

    /// VP earned per bridge held at pass time, only once the stronghold is
    /// built (Engineers: 3). Callers pass whether the stronghold already
    /// stands.
    fn vp_per_bridge_on_pass(&self, stronghold_built: bool) -> i32 {
        let _ = stronghold_built;
        0
    }
}

macro_rules! faction_unit {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, Default)]
        struct $name;
    };
}

faction_unit!(ChaosMagiciansRules);
faction_unit!(GiantsRules);
faction_unit!(FakirsRules);
faction_unit!(NomadsRules);
faction_unit!(HalflingsRules);
faction_unit!(CultistsRules);
faction_unit!(EngineersRules);
faction_unit!(DwarvesRules);
faction_unit!(AlchemistsRules);
faction_unit!(DarklingsRules);
faction_unit!(MermaidsRules);
faction_unit!(SwarmlingsRules);
faction_unit!(WitchesRules);
faction_unit!(AurenRules);

impl FactionRules for ChaosMagiciansRules {
    fn home_terrain(&self) -> Terrain {
        Terrain::Wasteland
    }
    fn starting_resources(&self) -> StartingResources {
        StartingResources {
            coins: 15,
            workers: 2,
            priests: 2,
            power_bowl1: 4,
            power_bowl2: 8,
            shipping: 0,
            starting_dwellings: 1,
        }
    }
    fn favor_tiles_per_temple_or_sanctuary(&self) -> u32 {
        2
    }
    fn stronghold_bonus(&self) -> StrongholdBonus {
        StrongholdBonus::ChaosMagiciansDoubleTurn
    }
}

impl FactionRules for GiantsRules {
    fn home_terrain(&self) -> Terrain {
        Terrain::Wasteland
    }
    fn starting_resources(&self) -> StartingResources {
        StartingResources {
            coins: 15,
            workers: 3,
            priests: 0,
            power_bowl1: 4,
            power_bowl2: 8,
            shipping: 0,
            starting_dwellings: 2,
        }
    }
    fn fixed_spade_count(&self) -> Option<u32> {
        Some(2)
    }
    fn stronghold_bonus(&self) -> StrongholdBonus {
        StrongholdBonus::GiantsTwoFreeSpadesPerRound
    }
}

impl FactionRules for FakirsRules {
    fn home_terrain(&self) -> Terrain {
        Terrain::Desert
    }
    fn starting_resources(&self) -> StartingResources {
        StartingResources {
            coins: 15,
            workers: 3,
            priests: 2,
            power_bowl1: 4,
            power_bowl2: 8,
            shipping: 0,
            starting_dwellings: 3,
        }
    }
    fn shipping_cost(&self, _level: u32) -> Option<BuildCost> {
        None
    }
    fn can_upgrade_shipping(&self) -> bool {
        false
    }
    fn carpet_flight_range(&self) -> Option<u32> {
        Some(3)
    }
}

impl FactionRules for NomadsRules {
    fn home_terrain(&self) -> Terrain {
        Terrain::Desert
    }
    fn starting_resources(&self) -> StartingResources {
        StartingResources {
            coins: 15,
            workers: 2,
            priests: 2,
            power_bowl1: 4,
            power_bowl2: 8,
            shipping: 0,
            starting_dwellings: 3,
        }
    }
}

impl FactionRules for HalflingsRules {
    fn home_terrain(&self) -> Terrain {
        Terrain::Swamp
    }
    fn starting_resources(&self) -> StartingResources {
        StartingResources {
            coins: 15,
            workers: 3,
            priests: 2,
            power_bowl1: 4,
            power_bowl2: 8,
            shipping: 0,
            starting_dwellings: 3,
        }
    }
    fn vp_per_spade(&self) -> i32 {
        1
    }
    fn stronghold_bonus(&self) -> StrongholdBonus {
        StrongholdBonus::HalflingsThreeSpades
    }
}

impl FactionRules for CultistsRules {
    fn home_terrain(&self) -> Terrain {
        Terrain::Plains
    }
    fn starting_resources(&self) -> StartingResources {
        StartingResources {
            coins: 15,
            workers: 2,
            priests: 2,
            power_bowl1: 4,
            power_bowl2: 8,
            shipping: 0,
            starting_dwellings: 3,
        }
    }
    fn stronghold_bonus(&self) -> StrongholdBonus {
        StrongholdBonus::VictoryPoints(7)
    }
}

impl FactionRules for EngineersRules {
    fn home_terrain(&self) -> Terrain {
        Terrain::Mountain
    }
    fn starting_resources(&self) -> StartingResources {
        StartingResources {
            coins: 10,
            workers: 2,
            priests: 2,
            power_bowl1: 4,
            power_bowl2: 8,
            shipping: 0,
            starting_dwellings: 3,
        }
    }
    fn dwelling_cost(&self) -> BuildCost {
        BuildCost::new(1, 1)
    }
    fn trading_house_cost(&self) -> BuildCost {
        BuildCost::new(2, 3)
    }
    fn vp_per_bridge_on_pass(&self, stronghold_built: bool) -> i32 {
        if stronghold_built {
            3
        } else {
            0
        }
    }
}

impl FactionRules for DwarvesRules {
    fn home_terrain(&self) -> Terrain {
        Terrain::Mountain
    }
    fn starting_resources(&self) -> StartingResources {
        StartingResources {
            coins: 15,
            workers: 3,
            priests: 2,
            power_bowl1: 4,
            power_bowl2: 8,
            shipping: 0,
            starting_dwellings: 3,
        }
    }
    fn shipping_cost(&self, _level: u32) -> Option<BuildCost> {
        None
    }
    fn can_upgrade_shipping(&self) -> bool {
        false
    }
    fn tunneling_workers_cost(&self, stronghold_built: bool) -> Option<u32> {
        Some(if stronghold_built { 1 } else { 2 })
    }
}

impl FactionRules for AlchemistsRules {
    fn home_terrain(&self) -> Terrain {
        Terrain::Swamp
    }
    fn starting_resources(&self) -> StartingResources {
        StartingResources {
            coins: 15,
            workers: 2,
            priests: 2,
            power_bowl1: 4,
            power_bowl2: 8,
            shipping: 0,
            starting_dwellings: 3,
        }
    }
    fn dwelling_cost(&self) -> BuildCost {
        BuildCost::new(1, 2)
    }
    fn terraform_workers_per_spade(&self, digging_level: u32) -> u32 {
        match digging_level {
            0 => 2,
            _ => 1,
        }
    }
    fn power_per_spade_post_stronghold(&self, stronghold_built: bool) -> u32 {
        u32::from(stronghold_built)
    }
    fn stronghold_bonus(&self) -> StrongholdBonus {
        StrongholdBonus::Power(12)
    }
}

impl FactionRules for DarklingsRules {
    fn home_terrain(&self) -> Terrain {
        Terrain::Swamp
    }
    fn starting_resources(&self) -> StartingResources {
        StartingResources {
            coins: 15,
            workers: 3,
            priests: 1,
            power_bowl1: 4,
            power_bowl2: 8,
            shipping: 0,
            starting_dwellings: 3,
        }
    }
    fn digging_cost(&self, _level: u32) -> Option<BuildCost> {
        None
    }
    fn terraform_priests_per_spade(&self) -> Option<u32> {
        Some(1)
    }
    fn vp_per_spade(&self) -> i32 {
        2
    }
    fn stronghold_bonus(&self) -> StrongholdBonus {
        StrongholdBonus::PriestOrdination
    }
}

impl FactionRules for MermaidsRules {
    fn home_terrain(&self) -> Terrain {
        Terrain::Lake
    }
    fn starting_resources(&self) -> StartingResources {
        StartingResources {
            coins: 15,
            workers: 3,
            priests: 2,
            power_bowl1: 4,
            power_bowl2: 8,
            shipping: 1,
            starting_dwellings: 3,
        }
    }
    fn stronghold_bonus(&self) -> StrongholdBonus {
        StrongholdBonus::Shipping(1)
    }
}

impl FactionRules for SwarmlingsRules {
    fn home_terrain(&self) -> Terrain {
        Terrain::Lake
    }
    fn starting_resources(&self) -> StartingResources {
        StartingResources {
            coins: 20,
            workers: 3,
            priests: 2,
            power_bowl1: 4,
            power_bowl2: 8,
            shipping: 0,
            starting_dwellings: 3,
        }
    }
    fn dwelling_cost(&self) -> BuildCost {
        BuildCost::new(1, 3)
    }
    fn trading_house_cost(&self) -> BuildCost {
        BuildCost::new(2, 9)
    }
    fn workers_per_town(&self) -> u32 {
        3
    }
    fn stronghold_bonus(&self) -> StrongholdBonus {
        StrongholdBonus::SwarmlingsFreeUpgradeOncePerRound
    }
}

impl FactionRules for WitchesRules {
    fn home_terrain(&self) -> Terrain {
        Terrain::Forest
    }
    fn starting_resources(&self) -> StartingResources {
        StartingResources {
            coins: 15,
            workers: 3,
            priests: 2,
            power_bowl1: 4,
            power_bowl2: 8,
            shipping: 0,
            starting_dwellings: 3,
        }
    }
    fn vp_per_town(&self) -> i32 {
        5
    }
}

impl FactionRules for AurenRules {
    fn home_terrain(&self) -> Terrain {
        Terrain::Forest
    }
    fn starting_resources(&self) -> StartingResources {
        StartingResources {
            coins: 15,
            workers: 3,
            priests: 3,
            power_bowl1: 4,
            power_bowl2: 8,
            shipping: 0,
            starting_dwellings: 3,
        }
    }
    fn stronghold_bonus(&self) -> StrongholdBonus {
        StrongholdBonus::FavorTileChoice(1)
    }
}

/// The fourteen faction variants. See spec.md §4.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    ChaosMagicians,
    Giants,
    Fakirs,
    Nomads,
    Halflings,
    Cultists,
    Engineers,
    Dwarves,
    Alchemists,
    Darklings,
    Mermaids,
    Swarmlings,
    Witches,
    Auren,
}

impl Faction {
    /// All fourteen variants, in catalog order.
    pub const ALL: [Faction; 14] = [
        Faction::ChaosMagicians,
        Faction::Giants,
        Faction::Fakirs,
        Faction::Nomads,
        Faction::Halflings,
        Faction::Cultists,
        Faction::Engineers,
        Faction::Dwarves,
        Faction::Alchemists,
        Faction::Darklings,
        Faction::Mermaids,
        Faction::Swarmlings,
        Faction::Witches,
        Faction::Auren,
    ];

    /// The capability implementation for this variant. Dispatch is a plain
    /// match to a `&'static dyn` value, not a string lookup.
    pub fn rules(self) -> &'static dyn FactionRules {
        match self {
            Faction::ChaosMagicians => &ChaosMagiciansRules,
            Faction::Giants => &GiantsRules,
            Faction::Fakirs => &FakirsRules,
            Faction::Nomads => &NomadsRules,
            Faction::Halflings => &HalflingsRules,
            Faction::Cultists => &CultistsRules,
            Faction::Engineers => &EngineersRules,
            Faction::Dwarves => &DwarvesRules,
            Faction::Alchemists => &AlchemistsRules,
            Faction::Darklings => &DarklingsRules,
            Faction::Mermaids => &MermaidsRules,
            Faction::Swarmlings => &SwarmlingsRules,
            Faction::Witches => &WitchesRules,
            Faction::Auren => &AurenRules,
        }
    }

    pub fn home_terrain(self) -> Terrain {
        self.rules().home_terrain()
    }

    pub fn starting_resources(self) -> StartingResources {
        self.rules().starting_resources()
    }

    /// Stable textual name, independent of enum discriminant ordering. See
    /// spec.md §6.
    pub fn name(self) -> &'static str {
        match self {
            Faction::ChaosMagicians => "chaos_magicians",
            Faction::Giants => "giants",
            Faction::Fakirs => "fakirs",
            Faction::Nomads => "nomads",
            Faction::Halflings => "halflings",
            Faction::Cultists => "cultists",
            Faction::Engineers => "engineers",
            Faction::Dwarves => "dwarves",
            Faction::Alchemists => "alchemists",
            Faction::Darklings => "darklings",
            Faction::Mermaids => "mermaids",
            Faction::Swarmlings => "swarmlings",
            Faction::Witches => "witches",
            Faction::Auren => "auren",
        }
    }
}

impl std::str::FromStr for Faction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Faction::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| format!("unknown faction: {s}"))
    }
}

impl std::fmt::Display for Faction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
