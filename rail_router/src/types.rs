//! Shared types for the search: tile coordinates, node keys and statistics.

use std::collections::HashMap;

use crate::track::{DiagDirection, Trackdir};

/// Tile coordinate on the map. x grows towards SW, y grows towards SE.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Tile {
    pub x: u32,
    pub y: u32,
}

impl Tile {
    #[inline]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Neighbouring tile across the `diagdir` edge, or None when it would leave
    /// the non-negative quadrant.
    #[inline]
    pub fn step(self, diagdir: DiagDirection) -> Option<Tile> {
        let (dx, dy) = diagdir.offset();
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        Some(Tile::new(x, y))
    }

    /// Pack into u64 for hashing
    #[inline]
    pub fn as_key(self) -> u64 {
        ((self.x as u64) << 32) | (self.y as u64)
    }

    #[inline]
    pub fn manhattan_distance(self, other: Tile) -> u64 {
        self.x.abs_diff(other.x) as u64 + self.y.abs_diff(other.y) as u64
    }
}

/// Search key: a directed track segment, i.e. a trackdir on a tile.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct AyStarNode {
    pub tile: Tile,
    pub trackdir: Trackdir,
}

impl AyStarNode {
    #[inline]
    pub const fn new(tile: Tile, trackdir: Trackdir) -> Self {
        Self { tile, trackdir }
    }

    /// Pack into u128 for fast hashing: 32 bits x, 32 bits y, 8 bits trackdir
    #[inline]
    pub fn as_key(&self) -> u128 {
        ((self.tile.x as u128) << 40) | ((self.tile.y as u128) << 8) | self.trackdir as u128
    }

    /// Inverse of [`as_key`](Self::as_key). None if the trackdir byte is invalid.
    #[inline]
    pub fn from_key(key: u128) -> Option<Self> {
        let trackdir = Trackdir::from_raw((key & 0xFF) as u8)?;
        let y = ((key >> 8) & 0xFFFF_FFFF) as u32;
        let x = ((key >> 40) & 0xFFFF_FFFF) as u32;
        Some(Self::new(Tile::new(x, y), trackdir))
    }
}

/// Counters collected while a search runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    pub nodes_expanded: u32,   // Nodes moved to the closed list
    pub nodes_pushed: u32,     // Heap pushes, including decrease-key pushes
    pub nodes_updated: u32,    // Open nodes that got a cheaper parent
    pub nodes_reopened: u32,   // Closed nodes rediscovered cheaper
    pub stale_skips: u32,      // Outdated heap entries dropped on pop
    pub invalid_edges: u32,    // Candidates rejected by calculate_g
    pub cost_limit_discards: u32,
    pub batches: u32,
    pub initial_h: i32,        // Best heuristic among the start nodes
    pub path_length: u32,
    pub path_cost: i32,
}

impl SearchStats {
    /// Flatten to a string-keyed map, with a few derived ratios.
    pub fn to_map(&self) -> HashMap<String, f64> {
        let mut map = HashMap::new();
        map.insert("nodes_expanded".to_string(), self.nodes_expanded as f64);
        map.insert("nodes_pushed".to_string(), self.nodes_pushed as f64);
        map.insert("nodes_updated".to_string(), self.nodes_updated as f64);
        map.insert("nodes_reopened".to_string(), self.nodes_reopened as f64);
        map.insert("stale_skips".to_string(), self.stale_skips as f64);
        map.insert("invalid_edges".to_string(), self.invalid_edges as f64);
        map.insert("cost_limit_discards".to_string(), self.cost_limit_discards as f64);
        map.insert("batches".to_string(), self.batches as f64);
        map.insert("initial_h".to_string(), self.initial_h as f64);
        map.insert("path_length".to_string(), self.path_length as f64);
        map.insert("path_cost".to_string(), self.path_cost as f64);

        if self.initial_h > 0 && self.path_cost > 0 {
            // 1.0 = perfect estimate, >1.0 means the heuristic overestimated
            map.insert("heuristic_ratio".to_string(), self.initial_h as f64 / self.path_cost as f64);
        }
        if self.path_length > 0 {
            map.insert("expansion_ratio".to_string(), self.nodes_expanded as f64 / self.path_length as f64);
        }
        if self.nodes_expanded > 0 {
            map.insert(
                "skip_ratio".to_string(),
                self.stale_skips as f64 / (self.nodes_expanded + self.stale_skips) as f64,
            );
        }
        map
    }
}
