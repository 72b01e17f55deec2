//! Rail routing on top of the A* engine.
//!
//! [`RailRouter`] supplies the callbacks: successors follow the track layout,
//! edge costs follow the track geometry and signals, and the heuristic is the
//! Manhattan distance to the nearest target tile. [`RouteSearch`] drives a
//! search in batches, [`find_route`] runs one to completion.

use log::{debug, trace};
use rustc_hash::FxHashSet;

use crate::aystar::{AyStar, AyStarCallbacks, PathNodeRef, SearchStatus};
use crate::config::{CostSettings, RouterConfig, SignalPolicy};
use crate::error::RouteError;
use crate::rail_map::{RailMap, RailTileType};
use crate::topology::trackdir_crosses_trackdirs;
use crate::track::TrackdirBits;
use crate::types::{AyStarNode, SearchStats, Tile};

/// Where a route may end: any trackdir on a target tile, or an exact node.
#[derive(Clone, Debug, Default)]
pub struct RouteTarget {
    tiles: FxHashSet<u64>,
    nodes: FxHashSet<u128>,
    heuristic_tiles: Vec<Tile>,
}

impl RouteTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tiles(tiles: impl IntoIterator<Item = Tile>) -> Self {
        let mut target = Self::new();
        for tile in tiles {
            target.add_tile(tile);
        }
        target
    }

    pub fn from_nodes(nodes: impl IntoIterator<Item = AyStarNode>) -> Self {
        let mut target = Self::new();
        for node in nodes {
            target.add_node(node);
        }
        target
    }

    pub fn add_tile(&mut self, tile: Tile) {
        if self.tiles.insert(tile.as_key()) && !self.heuristic_tiles.contains(&tile) {
            self.heuristic_tiles.push(tile);
        }
    }

    pub fn add_node(&mut self, node: AyStarNode) {
        if self.nodes.insert(node.as_key()) && !self.heuristic_tiles.contains(&node.tile) {
            self.heuristic_tiles.push(node.tile);
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty() && self.nodes.is_empty()
    }

    #[inline]
    pub fn contains(&self, node: &AyStarNode) -> bool {
        self.tiles.contains(&node.tile.as_key()) || self.nodes.contains(&node.as_key())
    }

    /// Distinct tiles used for the distance estimate
    pub fn tiles(&self) -> &[Tile] {
        &self.heuristic_tiles
    }
}

/// Input of a route search.
#[derive(Clone, Debug, Default)]
pub struct RouteRequest {
    /// Start nodes, all at cost 0
    pub sources: Vec<AyStarNode>,
    pub target: RouteTarget,
    /// Start nodes can not end the search by themselves
    pub ignore_start_as_goal: bool,
}

impl RouteRequest {
    pub fn new(sources: Vec<AyStarNode>, target: RouteTarget) -> Self {
        Self { sources, target, ignore_start_as_goal: false }
    }

    /// Check the request against the map before any search state is touched.
    pub fn validate(&self, map: &RailMap) -> Result<(), RouteError> {
        if self.sources.is_empty() {
            return Err(RouteError::NoSources);
        }
        if self.target.is_empty() {
            return Err(RouteError::NoTargets);
        }
        let out_of_bounds = |tile: Tile| RouteError::OutOfBounds {
            x: tile.x,
            y: tile.y,
            size_x: map.size_x(),
            size_y: map.size_y(),
        };
        for source in &self.sources {
            if !map.contains(source.tile) {
                return Err(out_of_bounds(source.tile));
            }
            if !map.has_track(source.tile, source.trackdir.track()) {
                return Err(RouteError::MissingTrack {
                    x: source.tile.x,
                    y: source.tile.y,
                    trackdir: source.trackdir,
                });
            }
        }
        if let Some(&tile) = self.target.tiles().iter().find(|&&t| !map.contains(t)) {
            return Err(out_of_bounds(tile));
        }
        Ok(())
    }
}

/// Outcome of a finished (or abandoned) route search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RouteResult {
    pub status: SearchStatus,
    /// Start to goal, inclusive
    pub path: Option<Vec<AyStarNode>>,
    pub cost: Option<i32>,
    pub stats: SearchStats,
}

/// Search callbacks for trains moving over a [`RailMap`].
pub struct RailRouter<'a> {
    map: &'a RailMap,
    target: &'a RouteTarget,
    costs: &'a CostSettings,
    found_path: Option<Vec<AyStarNode>>,
}

impl<'a> RailRouter<'a> {
    pub fn new(map: &'a RailMap, target: &'a RouteTarget, costs: &'a CostSettings) -> Self {
        Self { map, target, costs, found_path: None }
    }

    /// Path recorded when the goal was reached, start first.
    pub fn take_path(&mut self) -> Option<Vec<AyStarNode>> {
        self.found_path.take()
    }

    /// Manhattan distance to the nearest target, scaled by the cheapest step.
    /// Admissible as long as `heuristic_weight` is at most 1.
    #[inline]
    fn heuristic_to_targets(&self, tile: Tile) -> i32 {
        let Some(min_dist) = self.target.tiles().iter().map(|t| tile.manhattan_distance(*t)).min() else {
            return 0;
        };
        let h = (min_dist as i64).saturating_mul(self.costs.min_step_cost() as i64);
        let h = (h as f64 * self.costs.heuristic_weight as f64) as i64;
        h.min(i32::MAX as i64) as i32
    }
}

impl AyStarCallbacks for RailRouter<'_> {
    fn calculate_g(&mut self, node: &AyStarNode, parent: PathNodeRef<'_>) -> Option<i32> {
        // Same tile means turning around inside a depot
        if node.tile == parent.tile() {
            return Some(self.costs.depot_reverse_penalty);
        }

        let tile = self.map.get(node.tile)?;
        if tile.is_one_way_against(node.trackdir) {
            return None;
        }

        let mut cost = if node.trackdir.is_diagonal() {
            self.costs.tile_length
        } else {
            self.costs.straight_length
        };
        if node.trackdir != parent.trackdir().next() {
            cost += self.costs.curve_penalty;
        }
        if tile.is_red_along(node.trackdir) {
            match self.costs.signal_policy {
                SignalPolicy::Forbid => return None,
                SignalPolicy::Penalize => cost += self.costs.red_signal_penalty,
            }
        }
        Some(cost)
    }

    fn calculate_h(&mut self, node: &AyStarNode, _parent: Option<PathNodeRef<'_>>) -> i32 {
        self.heuristic_to_targets(node.tile)
    }

    fn get_neighbours(&mut self, current: PathNodeRef<'_>, neighbours: &mut Vec<AyStarNode>) {
        let tile = current.tile();
        let trackdir = current.trackdir();
        let Some(here) = self.map.get(tile) else {
            return;
        };

        // Heading into a depot: the only way on is to turn around
        if let RailTileType::Depot(facing) = here.kind {
            if trackdir.exitdir() != facing {
                neighbours.push(AyStarNode::new(tile, trackdir.reverse()));
                return;
            }
        }

        let exitdir = trackdir.exitdir();
        let Some(next_tile) = self.map.neighbour_tile(tile, exitdir) else {
            return;
        };
        let Some(next) = self.map.get(next_tile) else {
            return;
        };
        if next.rail_type != here.rail_type {
            return;
        }
        // Depots are only entered through their entrance
        if let RailTileType::Depot(facing) = next.kind {
            if facing != exitdir.reverse() {
                return;
            }
        }

        let mut reachable = TrackdirBits::from_track_bits(next.tracks) & trackdir.reaches();
        if self.costs.forbid_90_deg {
            reachable &= !trackdir_crosses_trackdirs(trackdir);
        }
        neighbours.extend(reachable.trackdirs().map(|td| AyStarNode::new(next_tile, td)));
    }

    fn is_end_node(&mut self, current: PathNodeRef<'_>) -> bool {
        self.target.contains(&current.key())
    }

    fn found_end_node(&mut self, current: PathNodeRef<'_>) {
        let mut path: Vec<AyStarNode> = current.path_to_start().collect();
        path.reverse();
        trace!("goal {:?} reached at cost {} ({} segments)", current.key(), current.g(), path.len());
        self.found_path = Some(path);
    }
}

/// Route search that can be advanced in batches.
///
/// The same map must be passed to every call between [`init`](Self::init)
/// and the end of the search.
#[derive(Debug)]
pub struct RouteSearch {
    aystar: AyStar,
    costs: CostSettings,
    target: RouteTarget,
    path: Option<Vec<AyStarNode>>,
}

impl RouteSearch {
    pub fn new(config: &RouterConfig) -> Self {
        Self {
            aystar: AyStar::new(config.search),
            costs: config.costs.clone(),
            target: RouteTarget::new(),
            path: None,
        }
    }

    /// Start a new search, discarding any previous one.
    pub fn init(&mut self, map: &RailMap, request: &RouteRequest) -> Result<(), RouteError> {
        request.validate(map)?;
        self.aystar.reset();
        self.path = None;
        self.target = request.target.clone();

        let mut router = RailRouter::new(map, &self.target, &self.costs);
        for &source in &request.sources {
            if request.ignore_start_as_goal {
                self.aystar.add_start_node_ignoring_goal(&mut router, source, 0);
            } else {
                self.aystar.add_start_node(&mut router, source, 0);
            }
        }
        debug!(
            "route search: {} sources, {} target tiles, initial h {}",
            request.sources.len(),
            self.target.tiles().len(),
            self.aystar.stats().initial_h
        );
        Ok(())
    }

    /// Run one batch of `loops_per_tick` iterations.
    pub fn step(&mut self, map: &RailMap) -> SearchStatus {
        let mut router = RailRouter::new(map, &self.target, &self.costs);
        let status = self.aystar.run_one_batch(&mut router);
        if let Some(path) = router.take_path() {
            self.path = Some(path);
        }
        status
    }

    /// Run batches until the search is finished.
    pub fn run(&mut self, map: &RailMap) -> SearchStatus {
        loop {
            let status = self.step(map);
            if status.is_terminal() {
                return status;
            }
        }
    }

    #[inline]
    pub fn status(&self) -> SearchStatus {
        self.aystar.status()
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.aystar.is_done()
    }

    pub fn path(&self) -> Option<&[AyStarNode]> {
        self.path.as_deref()
    }

    #[inline]
    pub fn stats(&self) -> &SearchStats {
        self.aystar.stats()
    }

    #[inline]
    pub fn aystar(&self) -> &AyStar {
        &self.aystar
    }

    pub fn result(&self) -> RouteResult {
        RouteResult {
            status: self.status(),
            path: self.path.clone(),
            cost: self.aystar.end_node().map(|n| n.g()),
            stats: *self.stats(),
        }
    }
}

/// Run a complete search for `request`.
pub fn find_route(map: &RailMap, request: &RouteRequest, config: &RouterConfig) -> Result<RouteResult, RouteError> {
    let mut search = RouteSearch::new(config);
    search.init(map, request)?;
    search.run(map);
    let result = search.result();
    debug!(
        "find_route: {} (cost {:?}, {} expanded)",
        result.status.as_str(),
        result.cost,
        result.stats.nodes_expanded
    );
    Ok(result)
}
