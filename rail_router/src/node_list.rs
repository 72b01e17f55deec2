//! Node pool with combined open/closed bookkeeping.
//!
//! Nodes live in an index-addressed arena so handles stay valid while the pool
//! grows. A hash index maps each key to its single record; a binary heap orders
//! the open records by f. Decrease-key and reopening push a fresh heap entry and
//! bump the record's stamp, so superseded entries are recognised and dropped
//! when popped.

use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::types::AyStarNode;

/// Stamp of a node that has no live heap entry (popped or closed).
const NOT_QUEUED: u32 = u32::MAX;

/// Stable handle to a node in a [`NodeList`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum NodeState {
    Open,
    Closed,
}

/// A search node. Parents always point at nodes that were closed when the link was made.
#[derive(Clone, Debug)]
pub struct PathNode {
    pub key: AyStarNode,
    pub parent: Option<NodeId>,
    pub g: i32,
    pub h: i32,
    pub state: NodeState,
    /// Start node that may not satisfy the goal check.
    pub ignore_as_goal: bool,
    stamp: u32, // Counter of the heap entry that currently represents this node
}

impl PathNode {
    #[inline]
    pub fn f(&self) -> i32 {
        self.g.saturating_add(self.h)
    }
}

/// Heap entry with reverse ordering for min-heap
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct OpenEntry {
    f_score: i32,
    node: NodeId,
    counter: u32, // Tie-breaker for deterministic ordering
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (lowest f_score first, then oldest entry)
        other.f_score.cmp(&self.f_score)
            .then_with(|| other.counter.cmp(&self.counter))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// What [`NodeList::insert`] did with a candidate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum InsertOutcome {
    Added(NodeId),
    /// An open record got a cheaper g and parent.
    Updated(NodeId),
    /// A closed record was rediscovered cheaper and is open again.
    Reopened(NodeId),
    /// The existing record is at least as cheap; nothing changed.
    Unchanged(NodeId),
}

impl InsertOutcome {
    #[inline]
    pub fn node(self) -> NodeId {
        match self {
            InsertOutcome::Added(id)
            | InsertOutcome::Updated(id)
            | InsertOutcome::Reopened(id)
            | InsertOutcome::Unchanged(id) => id,
        }
    }
}

/// Node pool plus open and closed lists for one search.
#[derive(Debug, Default)]
pub struct NodeList {
    nodes: Vec<PathNode>,
    index: FxHashMap<u128, NodeId>,
    open: BinaryHeap<OpenEntry>,
    counter: u32,
    open_count: usize,
    closed_count: usize,
    stale_pops: u32,
}

impl NodeList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Release every node. Handles from before the call become meaningless.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.open.clear();
        self.counter = 0;
        self.open_count = 0;
        self.closed_count = 0;
        self.stale_pops = 0;
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &PathNode {
        &self.nodes[id.index()]
    }

    /// Look up the record for `key`, open or closed.
    #[inline]
    pub fn find(&self, key: &AyStarNode) -> Option<NodeId> {
        self.index.get(&key.as_key()).copied()
    }

    pub fn find_open(&self, key: &AyStarNode) -> Option<NodeId> {
        self.find(key).filter(|&id| self.get(id).state == NodeState::Open)
    }

    pub fn find_closed(&self, key: &AyStarNode) -> Option<NodeId> {
        self.find(key).filter(|&id| self.get(id).state == NodeState::Closed)
    }

    /// Add `key` to the open list, or improve the existing record if `g` is
    /// strictly cheaper. Equal or worse candidates leave everything untouched.
    pub fn insert(&mut self, key: AyStarNode, g: i32, h: i32, parent: Option<NodeId>) -> InsertOutcome {
        let packed = key.as_key();

        if let Some(&id) = self.index.get(&packed) {
            let node = &mut self.nodes[id.index()];
            if node.g <= g {
                return InsertOutcome::Unchanged(id);
            }
            let was_closed = node.state == NodeState::Closed;
            let was_queued = !was_closed && node.stamp != NOT_QUEUED;
            node.g = g;
            node.h = h;
            node.parent = parent;
            node.state = NodeState::Open;
            node.stamp = self.counter;
            let f_score = node.f();
            if was_closed {
                self.closed_count -= 1;
            }
            if !was_queued {
                self.open_count += 1;
            }
            self.push_entry(f_score, id);
            return if was_closed {
                InsertOutcome::Reopened(id)
            } else {
                InsertOutcome::Updated(id)
            };
        }

        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(PathNode {
            key,
            parent,
            g,
            h,
            state: NodeState::Open,
            ignore_as_goal: false,
            stamp: self.counter,
        });
        self.index.insert(packed, id);
        self.open_count += 1;
        self.push_entry(g.saturating_add(h), id);
        InsertOutcome::Added(id)
    }

    /// Mark a start node so that it can not terminate the search by itself.
    pub fn set_ignore_as_goal(&mut self, id: NodeId, ignore: bool) {
        self.nodes[id.index()].ignore_as_goal = ignore;
    }

    /// Remove and return the open node with the lowest f. Ties go to the node
    /// that was queued first. Superseded heap entries are skipped.
    pub fn pop_best(&mut self) -> Option<NodeId> {
        while let Some(entry) = self.open.pop() {
            let node = &self.nodes[entry.node.index()];
            if node.state != NodeState::Open || node.stamp != entry.counter {
                self.stale_pops += 1;
                continue;
            }
            self.nodes[entry.node.index()].stamp = NOT_QUEUED;
            self.open_count -= 1;
            return Some(entry.node);
        }
        None
    }

    /// Move a popped node to the closed list.
    pub fn close(&mut self, id: NodeId) {
        let node = &mut self.nodes[id.index()];
        debug_assert!(node.state == NodeState::Open, "closing a node twice");
        node.state = NodeState::Closed;
        self.closed_count += 1;
    }

    #[inline]
    pub fn open_count(&self) -> usize {
        self.open_count
    }

    #[inline]
    pub fn closed_count(&self) -> usize {
        self.closed_count
    }

    /// Total records ever allocated since the last clear.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn has_open(&self) -> bool {
        self.open_count > 0
    }

    /// Number of superseded heap entries dropped so far.
    #[inline]
    pub fn stale_pops(&self) -> u32 {
        self.stale_pops
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &PathNode)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i as u32), n))
    }

    /// Walk parent links from `id` back to its start node, `id` first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&current| self.get(current).parent)
    }

    #[inline]
    fn push_entry(&mut self, f_score: i32, node: NodeId) {
        self.open.push(OpenEntry { f_score, node, counter: self.counter });
        self.counter += 1;
    }
}
