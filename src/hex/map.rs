//! The game board: terrain, buildings, bridges, and connectivity queries.
//! See spec.md §3 (MapHex, Bridge, Building), §4.1 (adjacency, bridges).

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::geometry::Hex;
use crate::player::PlayerId;

/// The seven non-river terrains, arranged in their canonical wheel order.
/// Terraform cost is the shortest number of steps around this cycle.
pub const TERRAIN_WHEEL: [Terrain; 7] = [
    Terrain::Plains,
    Terrain::Swamp,
    Terrain::Lake,
    Terrain::Forest,
    Terrain::Mountain,
    Terrain::Wasteland,
    Terrain::Desert,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    Plains,
    Mountain,
    Forest,
    Lake,
    Wasteland,
    Swamp,
    Desert,
    River,
}

impl Terrain {
    /// Minimum number of wheel steps from `self` to `target`. Undefined
    /// (returns 0) for `River`, which never takes part in terraforming.
    pub fn spade_distance(self, target: Terrain) -> u32 {
        let Some(from) = TERRAIN_WHEEL.iter().position(|&t| t == self) else {
            return 0;
        };
        let Some(to) = TERRAIN_WHEEL.iter().position(|&t| t == target) else {
            return 0;
        };
        let n = TERRAIN_WHEEL.len();
        let forward = (to + n - from) % n;
        let backward = (from + n - to) % n;
        forward.min(backward) as u32
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildingKind {
    Dwelling,
    TradingHouse,
    Temple,
    Sanctuary,
    Stronghold,
}

impl BuildingKind {
    /// Power value contributed by a building of this kind. See spec.md §3.
    pub fn power_value(self) -> u32 {
        match self {
            BuildingKind::Dwelling => 1,
            BuildingKind::TradingHouse | BuildingKind::Temple => 2,
            BuildingKind::Sanctuary | BuildingKind::Stronghold => 3,
        }
    }

    /// Per-faction ownership limit. See spec.md §3, §8.
    pub fn limit(self) -> u32 {
        match self {
            BuildingKind::Dwelling => 8,
            BuildingKind::TradingHouse => 4,
            BuildingKind::Temple => 3,
            BuildingKind::Sanctuary | BuildingKind::Stronghold => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub owner: PlayerId,
    pub kind: BuildingKind,
}

impl Building {
    pub fn power_value(&self) -> u32 {
        self.kind.power_value()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapHex {
    pub coord: Hex,
    pub terrain: Terrain,
    pub building: Option<Building>,
    pub part_of_town: bool,
}

impl MapHex {
    pub fn is_river(&self) -> bool {
        self.terrain == Terrain::River
    }
}

/// An unordered pair of hex coordinates, owned by the player who built the
/// bridge. See spec.md §3, §4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bridge {
    pub owner: PlayerId,
    pub a: Hex,
    pub b: Hex,
}

impl Bridge {
    /// True when `(a, b)` and `(b, a)` refer to the same bridge.
    fn connects(&self, x: Hex, y: Hex) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Board {
    hexes: HashMap<Hex, MapHex>,
    bridges: Vec<Bridge>,
}

impl Board {
    /// Build a board from an explicit terrain layout. Rivers are inferred
    /// from `Terrain::River` entries. Outer layers (or test fixtures) supply
    /// the fixed Terra-Mystica-shaped layout; this constructor just indexes it.
    pub fn from_layout(tiles: impl IntoIterator<Item = (Hex, Terrain)>) -> Self {
        let hexes = tiles
            .into_iter()
            .map(|(coord, terrain)| {
                (
                    coord,
                    MapHex {
                        coord,
                        terrain,
                        building: None,
                        part_of_town: false,
                    },
                )
            })
            .collect();
        Self {
            hexes,
            bridges: Vec::new(),
        }
    }

    pub fn hex(&self, coord: Hex) -> Option<&MapHex> {
        self.hexes.get(&coord)
    }

    pub fn hex_mut(&mut self, coord: Hex) -> Option<&mut MapHex> {
        self.hexes.get_mut(&coord)
    }

    pub fn bridges(&self) -> &[Bridge] {
        &self.bridges
    }

    /// Validate and record a bridge. The two endpoints must be non-river,
    /// distinct, not already bridged, and separated by exactly the two
    /// river hexes shared between their neighbor sets (the canonical
    /// river-crossing geometry). At least one endpoint must belong to
    /// `builder` via an existing building.
    pub fn build_bridge(&mut self, builder: PlayerId, a: Hex, b: Hex) -> Result<(), String> {
        if a == b {
            return Err("bridge endpoints must be distinct".into());
        }
        let hex_a = self.hex(a).ok_or("bridge endpoint off-map")?;
        let hex_b = self.hex(b).ok_or("bridge endpoint off-map")?;
        if hex_a.is_river() || hex_b.is_river() {
            return Err("bridge endpoints must be non-river".into());
        }
        if self.bridges.iter().any(|br| br.connects(a, b)) {
            return Err("bridge already present between these hexes".into());
        }

        let neighbors_a: HashSet<Hex> = a.neighbors().into_iter().collect();
        let neighbors_b: HashSet<Hex> = b.neighbors().into_iter().collect();
        let shared: Vec<Hex> = neighbors_a.intersection(&neighbors_b).copied().collect();
        let shared_rivers = shared
            .iter()
            .filter(|h| self.hex(**h).is_some_and(MapHex::is_river))
            .count();
        if shared_rivers != 2 {
            return Err("bridge endpoints are not separated by two river hexes".into());
        }

        let owns_endpoint = [a, b].into_iter().any(|coord| {
            self.hex(coord)
                .and_then(|h| h.building.as_ref())
                .is_some_and(|b| b.owner == builder)
        });
        if !owns_endpoint {
            return Err("builder must own a building on one endpoint".into());
        }

        self.bridges.push(Bridge { owner: builder, a, b });
        Ok(())
    }

    /// True when `a` and `b` are linked by direct adjacency or by a bridge
    /// (shipping does not extend this form of adjacency — spec.md §4.5
    /// power-leech protocol and bridge-building both use it as-is).
    pub fn directly_or_bridge_linked(&self, a: Hex, b: Hex) -> bool {
        a.is_adjacent(b) || self.bridges.iter().any(|br| br.connects(a, b))
    }

    /// Indirect adjacency per spec.md §4.1: direct neighbor, bridge, or a
    /// river path of length <= `shipping` hexes of river tiles. Shipping 0
    /// means rivers never connect.
    fn linked_via_shipping(&self, a: Hex, b: Hex, shipping: u32) -> bool {
        if shipping == 0 {
            return false;
        }
        // BFS across river hexes only, starting from each neighbor-river of a.
        let mut queue: VecDeque<(Hex, u32)> = VecDeque::new();
        let mut visited: HashSet<Hex> = HashSet::new();
        for n in a.neighbors() {
            if self.hex(n).is_some_and(MapHex::is_river) {
                queue.push_back((n, 1));
                visited.insert(n);
            }
        }
        while let Some((cur, dist)) = queue.pop_front() {
            if cur.is_adjacent(b) {
                return true;
            }
            if dist >= shipping {
                continue;
            }
            for n in cur.neighbors() {
                if visited.contains(&n) {
                    continue;
                }
                if self.hex(n).is_some_and(MapHex::is_river) {
                    visited.insert(n);
                    queue.push_back((n, dist + 1));
                }
            }
        }
        false
    }

    /// True when `hex` is reachable from any building owned by `player`
    /// through direct adjacency, a bridge, or the player's shipping range.
    pub fn is_adjacent_to_player(&self, hex: Hex, player: PlayerId, shipping: u32) -> bool {
        self.hexes.values().any(|h| {
            h.building.as_ref().is_some_and(|b| b.owner == player)
                && h.coord != hex
                && (self.directly_or_bridge_linked(h.coord, hex)
                    || self.linked_via_shipping(h.coord, hex, shipping))
        })
    }

    /// Connected component of `player`'s buildings reachable from `seed`
    /// via direct adjacency, bridges, or shipping range. Returns an empty
    /// vec if `seed` is not one of the player's own buildings.
    pub fn find_connected_component(
        &self,
        seed: Hex,
        player: PlayerId,
        shipping: u32,
    ) -> Vec<Hex> {
        let owns_seed = self
            .hex(seed)
            .and_then(|h| h.building.as_ref())
            .is_some_and(|b| b.owner == player);
        if !owns_seed {
            return Vec::new();
        }

        let owned: Vec<Hex> = self
            .hexes
            .values()
            .filter(|h| h.building.as_ref().is_some_and(|b| b.owner == player))
            .map(|h| h.coord)
            .collect();

        let mut visited: HashSet<Hex> = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(seed);
        visited.insert(seed);

        while let Some(cur) = queue.pop_front() {
            for &other in &owned {
                if visited.contains(&other) {
                    continue;
                }
                if self.directly_or_bridge_linked(cur, other)
                    || self.linked_via_shipping(cur, other, shipping)
                {
                    visited.insert(other);
                    queue.push_back(other);
                }
            }
        }

        visited.into_iter().collect()
    }

    /// All connected components among `player`'s buildings, deduplicated.
    pub fn all_connected_components(&self, player: PlayerId, shipping: u32) -> Vec<Vec<Hex>> {
        let owned: Vec<Hex> = self
            .hexes
            .values()
            .filter(|h| h.building.as_ref().is_some_and(|b| b.owner == player))
            .map(|h| h.coord)
            .collect();

        let mut seen: HashSet<Hex> = HashSet::new();
        let mut components = Vec::new();
        for &start in &owned {
            if seen.contains(&start) {
                continue;
            }
            let component = self.find_connected_component(start, player, shipping);
            seen.extend(component.iter().copied());
            components.push(component);
        }
        components
    }

    /// Place a building, failing if the hex is a river, off-map, or already
    /// occupied.
    pub fn place_building(&mut self, coord: Hex, building: Building) -> Result<(), String> {
        let hex = self.hex_mut(coord).ok_or("target hex off-map")?;
        if hex.is_river() {
            return Err("cannot build on a river hex".into());
        }
        if hex.building.is_some() {
            return Err("hex already has a building".into());
        }
        hex.building = Some(building);
        Ok(())
    }

    pub fn transform_terrain(&mut self, coord: Hex, terrain: Terrain) -> Result<(), String> {
        let hex = self.hex_mut(coord).ok_or("target hex off-map")?;
        if hex.is_river() {
            return Err("cannot terraform a river hex".into());
        }
        hex.terrain = terrain;
        Ok(())
    }

    pub fn mark_town(&mut self, coords: &[Hex]) {
        for &c in coords {
            if let Some(h) = self.hex_mut(c) {
                h.part_of_town = true;
            }
        }
    }
}
