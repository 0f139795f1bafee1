//! Hex geometry and the game board. See spec.md §3, §4.1.
//!
//! `geometry` wraps `hexx` behind a serializable `Hex` newtype so no other
//! module touches `hexx` directly (mirrors the teacher's
//! `hex_grid/algorithms.rs`, which keeps hex math framework-free and
//! independently testable). `map` owns the fixed board layout, terrain,
//! buildings, bridges, and the shipping/bridge connectivity query.

pub mod geometry;
pub mod map;

#[cfg(test)]
mod tests;

pub use geometry::Hex;
pub use map::{Board, Bridge, Building, BuildingKind, MapHex, Terrain};
