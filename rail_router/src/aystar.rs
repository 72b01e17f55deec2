//! Time-sliced A* engine.
//!
//! The engine knows nothing about rails. Costs, heuristic, neighbour
//! generation and the goal test come from an [`AyStarCallbacks`]
//! implementation that the caller passes to every run call, so the
//! callbacks may borrow map data that outlives a single batch only.
//!
//! A search goes `Idle -> Running -> {Found, Exhausted, NodeLimit, CostLimit}`.
//! Terminal statuses stick until [`AyStar::reset`].

use log::{debug, trace};

use crate::config::SearchSettings;
use crate::node_list::{InsertOutcome, NodeId, NodeList, PathNode};
use crate::track::Trackdir;
use crate::types::{AyStarNode, SearchStats, Tile};

/// Outcome of a batch (or of the whole search once terminal).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum SearchStatus {
    /// No start node added yet
    Idle,
    /// Batch ended with work remaining
    Running,
    Found,
    /// Open list ran dry without reaching a goal
    Exhausted,
    /// `max_search_nodes` expansions reached
    NodeLimit,
    /// Open list ran dry after some candidates were dropped for exceeding `max_path_cost`
    CostLimit,
}

impl SearchStatus {
    #[inline]
    pub fn is_terminal(self) -> bool {
        !matches!(self, SearchStatus::Idle | SearchStatus::Running)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SearchStatus::Idle => "idle",
            SearchStatus::Running => "running",
            SearchStatus::Found => "found",
            SearchStatus::Exhausted => "exhausted",
            SearchStatus::NodeLimit => "node_limit",
            SearchStatus::CostLimit => "cost_limit",
        }
    }
}

/// Borrowed view of a node in the search, handed to the callbacks.
#[derive(Clone, Copy)]
pub struct PathNodeRef<'a> {
    nodes: &'a NodeList,
    id: NodeId,
}

impl<'a> PathNodeRef<'a> {
    #[inline]
    pub(crate) fn new(nodes: &'a NodeList, id: NodeId) -> Self {
        Self { nodes, id }
    }

    #[inline]
    fn node(&self) -> &'a PathNode {
        self.nodes.get(self.id)
    }

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn key(&self) -> AyStarNode {
        self.node().key
    }

    #[inline]
    pub fn tile(&self) -> Tile {
        self.node().key.tile
    }

    #[inline]
    pub fn trackdir(&self) -> Trackdir {
        self.node().key.trackdir
    }

    /// Accumulated cost from the start
    #[inline]
    pub fn g(&self) -> i32 {
        self.node().g
    }

    #[inline]
    pub fn h(&self) -> i32 {
        self.node().h
    }

    #[inline]
    pub fn f(&self) -> i32 {
        self.node().f()
    }

    #[inline]
    pub fn parent(&self) -> Option<PathNodeRef<'a>> {
        self.node().parent.map(|id| PathNodeRef::new(self.nodes, id))
    }

    #[inline]
    pub fn is_start(&self) -> bool {
        self.node().parent.is_none()
    }

    /// Keys from this node back to its start node, this node first.
    pub fn path_to_start(&self) -> impl Iterator<Item = AyStarNode> + 'a {
        let nodes = self.nodes;
        nodes.ancestors(self.id).map(move |id| nodes.get(id).key)
    }
}

impl std::fmt::Debug for PathNodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathNodeRef")
            .field("key", &self.key())
            .field("g", &self.g())
            .field("h", &self.h())
            .finish()
    }
}

/// Problem-specific hooks driving the engine.
pub trait AyStarCallbacks {
    /// Cost of the edge from `parent` onto `node`, or None if the move is
    /// not allowed. Must not be negative.
    fn calculate_g(&mut self, node: &AyStarNode, parent: PathNodeRef<'_>) -> Option<i32>;

    /// Estimated remaining cost from `node`. `parent` is None for start nodes.
    fn calculate_h(&mut self, node: &AyStarNode, parent: Option<PathNodeRef<'_>>) -> i32;

    /// Append the successors of `current` to `neighbours` (passed in empty).
    fn get_neighbours(&mut self, current: PathNodeRef<'_>, neighbours: &mut Vec<AyStarNode>);

    fn is_end_node(&mut self, current: PathNodeRef<'_>) -> bool;

    /// Called once with the goal node when the search succeeds.
    fn found_end_node(&mut self, _current: PathNodeRef<'_>) {}
}

/// A* search state. Reusable across searches through [`reset`](Self::reset).
#[derive(Debug)]
pub struct AyStar {
    settings: SearchSettings,
    nodes: NodeList,
    neighbours: Vec<AyStarNode>,
    status: SearchStatus,
    end_node: Option<NodeId>,
    stats: SearchStats,
    start_count: u32,
}

impl Default for AyStar {
    fn default() -> Self {
        Self::new(SearchSettings::default())
    }
}

impl AyStar {
    pub fn new(settings: SearchSettings) -> Self {
        Self {
            settings,
            nodes: NodeList::new(),
            neighbours: Vec::with_capacity(8),
            status: SearchStatus::Idle,
            end_node: None,
            stats: SearchStats::default(),
            start_count: 0,
        }
    }

    #[inline]
    pub fn settings(&self) -> &SearchSettings {
        &self.settings
    }

    /// Change limits. Only meaningful before the first start node is added.
    pub fn set_settings(&mut self, settings: SearchSettings) {
        debug_assert!(self.status == SearchStatus::Idle, "changing limits of a running search");
        self.settings = settings;
    }

    /// Seed the open list with a start node of accumulated cost `g`.
    /// Returns None once the search has finished; call [`reset`](Self::reset)
    /// before seeding a new one.
    pub fn add_start_node<C: AyStarCallbacks + ?Sized>(
        &mut self,
        callbacks: &mut C,
        node: AyStarNode,
        g: i32,
    ) -> Option<NodeId> {
        if self.status.is_terminal() {
            debug!("start node {:?} ignored, search already {}", node, self.status.as_str());
            return None;
        }
        let h = callbacks.calculate_h(&node, None);
        let id = match self.nodes.insert(node, g, h, None) {
            InsertOutcome::Unchanged(id) => id,
            outcome => {
                self.stats.nodes_pushed += 1;
                outcome.node()
            }
        };
        self.stats.initial_h = if self.start_count == 0 { h } else { self.stats.initial_h.min(h) };
        self.start_count += 1;
        self.status = SearchStatus::Running;
        trace!("start node {:?} g={} h={}", node, g, h);
        Some(id)
    }

    /// Like [`add_start_node`](Self::add_start_node), but the node itself can
    /// not end the search. It still counts as a goal when reached again
    /// through a path.
    pub fn add_start_node_ignoring_goal<C: AyStarCallbacks + ?Sized>(
        &mut self,
        callbacks: &mut C,
        node: AyStarNode,
        g: i32,
    ) -> Option<NodeId> {
        let id = self.add_start_node(callbacks, node, g)?;
        self.nodes.set_ignore_as_goal(id, true);
        Some(id)
    }

    /// Run at most `loops_per_tick` iterations (all of them when 0).
    /// Returns [`SearchStatus::Running`] if the batch ended with work left.
    pub fn run_one_batch<C: AyStarCallbacks + ?Sized>(&mut self, callbacks: &mut C) -> SearchStatus {
        if self.status.is_terminal() {
            return self.status;
        }
        self.stats.batches += 1;
        let loops = self.settings.loops_per_tick;
        let mut done = 0u32;
        loop {
            let status = self.loop_once(callbacks);
            done += 1;
            if status != SearchStatus::Running {
                return self.finish(status);
            }
            if loops != 0 && done >= loops {
                break;
            }
        }
        trace!(
            "batch {} done: open={} closed={}",
            self.stats.batches,
            self.nodes.open_count(),
            self.nodes.closed_count()
        );
        self.status = SearchStatus::Running;
        self.status
    }

    /// Run batches until the search reaches a terminal status.
    pub fn run_until_done<C: AyStarCallbacks + ?Sized>(&mut self, callbacks: &mut C) -> SearchStatus {
        loop {
            let status = self.run_one_batch(callbacks);
            if status.is_terminal() {
                return status;
            }
        }
    }

    /// Single iteration: pop the best node, test it, expand it.
    pub fn loop_once<C: AyStarCallbacks + ?Sized>(&mut self, callbacks: &mut C) -> SearchStatus {
        let Some(current) = self.nodes.pop_best() else {
            return if self.stats.cost_limit_discards > 0 {
                SearchStatus::CostLimit
            } else {
                SearchStatus::Exhausted
            };
        };

        let node = self.nodes.get(current);
        let goal_allowed = !(node.ignore_as_goal && node.parent.is_none());
        if goal_allowed && callbacks.is_end_node(PathNodeRef::new(&self.nodes, current)) {
            self.end_node = Some(current);
            callbacks.found_end_node(PathNodeRef::new(&self.nodes, current));
            return SearchStatus::Found;
        }

        self.nodes.close(current);
        self.stats.nodes_expanded += 1;

        let mut neighbours = std::mem::take(&mut self.neighbours);
        neighbours.clear();
        callbacks.get_neighbours(PathNodeRef::new(&self.nodes, current), &mut neighbours);
        for neighbour in &neighbours {
            self.check_tile(callbacks, neighbour, current);
        }
        self.neighbours = neighbours;

        let max_nodes = self.settings.max_search_nodes;
        if max_nodes != 0 && self.stats.nodes_expanded >= max_nodes {
            return SearchStatus::NodeLimit;
        }
        SearchStatus::Running
    }

    /// Score one candidate reached from `parent` and offer it to the open list.
    fn check_tile<C: AyStarCallbacks + ?Sized>(&mut self, callbacks: &mut C, node: &AyStarNode, parent: NodeId) {
        let parent_ref = PathNodeRef::new(&self.nodes, parent);
        let Some(step_cost) = callbacks.calculate_g(node, parent_ref) else {
            self.stats.invalid_edges += 1;
            return;
        };
        debug_assert!(step_cost >= 0, "negative edge cost {step_cost} onto {node:?}");
        let g = parent_ref.g().saturating_add(step_cost);

        let max_cost = self.settings.max_path_cost;
        if max_cost != 0 && g > max_cost {
            self.stats.cost_limit_discards += 1;
            return;
        }

        // No need to evaluate the heuristic for a candidate that can not improve anything
        if let Some(existing) = self.nodes.find(node) {
            if self.nodes.get(existing).g <= g {
                return;
            }
        }

        let h = callbacks.calculate_h(node, Some(parent_ref));
        match self.nodes.insert(*node, g, h, Some(parent)) {
            InsertOutcome::Added(_) => self.stats.nodes_pushed += 1,
            InsertOutcome::Updated(_) => {
                self.stats.nodes_updated += 1;
                self.stats.nodes_pushed += 1;
            }
            InsertOutcome::Reopened(_) => {
                self.stats.nodes_reopened += 1;
                self.stats.nodes_pushed += 1;
            }
            InsertOutcome::Unchanged(_) => {}
        }
    }

    fn finish(&mut self, status: SearchStatus) -> SearchStatus {
        self.status = status;
        self.stats.stale_skips = self.nodes.stale_pops();
        if let Some(end) = self.end_node {
            self.stats.path_cost = self.nodes.get(end).g;
            self.stats.path_length = self.nodes.ancestors(end).count() as u32;
        }
        debug!(
            "search finished: {} after {} expansions in {} batches (open={}, closed={})",
            status.as_str(),
            self.stats.nodes_expanded,
            self.stats.batches,
            self.nodes.open_count(),
            self.nodes.closed_count()
        );
        status
    }

    /// Drop all nodes and return to Idle, keeping the limits and allocations.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.neighbours.clear();
        self.status = SearchStatus::Idle;
        self.end_node = None;
        self.stats = SearchStats::default();
        self.start_count = 0;
    }

    #[inline]
    pub fn status(&self) -> SearchStatus {
        self.status
    }

    #[inline]
    pub fn is_done(&self) -> bool {
        self.status.is_terminal()
    }

    #[inline]
    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    #[inline]
    pub fn nodes(&self) -> &NodeList {
        &self.nodes
    }

    /// The goal node, once the search is Found.
    pub fn end_node(&self) -> Option<PathNodeRef<'_>> {
        self.end_node.map(|id| PathNodeRef::new(&self.nodes, id))
    }

    /// Keys from start to goal, once the search is Found.
    pub fn path(&self) -> Option<Vec<AyStarNode>> {
        let end = self.end_node()?;
        let mut path: Vec<AyStarNode> = end.path_to_start().collect();
        path.reverse();
        Some(path)
    }

    /// Node handle for `key`, open or closed.
    pub fn find(&self, key: &AyStarNode) -> Option<PathNodeRef<'_>> {
        self.nodes.find(key).map(|id| PathNodeRef::new(&self.nodes, id))
    }
}
