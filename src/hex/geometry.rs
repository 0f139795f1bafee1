//! Pure axial-hex algorithms wrapping `hexx`. See spec.md §3 ("Hex"), §4.1.
//!
//! All functions take and return `Hex` so no other module imports `hexx`
//! directly — the same boundary the teacher draws in
//! `hex_grid/algorithms.rs`. No serialization-unfriendly or engine-specific
//! state lives here; this is pure coordinate math.

use serde::{Deserialize, Serialize};

/// Axial hex coordinate. Immutable value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hex {
    pub q: i32,
    pub r: i32,
}

impl Hex {
    pub fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    fn to_hexx(self) -> hexx::Hex {
        hexx::Hex::new(self.q, self.r)
    }

    fn from_hexx(hex: hexx::Hex) -> Self {
        Self {
            q: hex.x(),
            r: hex.y(),
        }
    }

    /// The six hexes directly adjacent to `self`.
    pub fn neighbors(self) -> [Hex; 6] {
        self.to_hexx().all_neighbors().map(Hex::from_hexx)
    }

    /// Axial hex distance between `self` and `other`.
    pub fn distance(self, other: Hex) -> u32 {
        self.to_hexx().unsigned_distance_to(other.to_hexx())
    }

    /// All hexes at exactly `radius` distance from `self`. Radius 0 returns
    /// `[self]`.
    pub fn ring(self, radius: u32) -> Vec<Hex> {
        self.to_hexx().ring(radius).map(Hex::from_hexx).collect()
    }

    /// All hexes within `radius` distance from `self` (inclusive of `self`).
    pub fn range(self, radius: u32) -> Vec<Hex> {
        self.to_hexx().range(radius).map(Hex::from_hexx).collect()
    }

    /// True when `self` and `other` are direct neighbors.
    pub fn is_adjacent(self, other: Hex) -> bool {
        self.distance(other) == 1
    }
}
