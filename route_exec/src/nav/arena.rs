//! Per-search node storage for the A* planner.
//!
//! Nodes are held in a [`NodeArena`] keyed by their grid [`Cell`], and are only allocated when the
//! search first discovers them. Parents are stored as cells rather than references, so the whole
//! search graph is owned by the arena and dropped with it at the end of the search.
//!
//! The [`OpenSet`] is a binary min-heap of `(f, insertion order)` keys. Decreasing a node's key is
//! done by pushing a fresh entry; entries left behind by a later decrease are detected as stale
//! when popped, by comparing their `f` with the node's current one.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::{
    cmp::Ordering,
    collections::{hash_map::Entry, BinaryHeap, HashMap},
};

use ordered_float::NotNan;

use crate::{map::Cell, path::RawPath};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Search state of a single cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchNode {
    /// Cost of the best known path from the start to this node
    pub g: f64,

    /// Heuristic estimate of the cost from this node to the end
    pub h: f64,

    /// Total estimated cost, `g + h`
    pub f: f64,

    /// The cell this node was reached from, `None` for the start node
    pub parent: Option<Cell>,

    /// Whether the node is currently in the open set
    pub open: bool,
}

/// Lazily allocated set of search nodes, addressed by cell.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: HashMap<Cell, SearchNode>,
}

/// Min-priority queue of open cells.
#[derive(Debug, Default)]
pub struct OpenSet {
    heap: BinaryHeap<OpenEntry>,

    /// Counter used to order entries with equal `f` by insertion
    next_seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenEntry {
    f: NotNan<f64>,
    seq: u64,
    cell: Cell,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Default for SearchNode {
    fn default() -> Self {
        Self {
            g: f64::INFINITY,
            h: 0.0,
            f: f64::INFINITY,
            parent: None,
            open: false,
        }
    }
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes discovered so far.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, cell: &Cell) -> Option<&SearchNode> {
        self.nodes.get(cell)
    }

    pub fn get_mut(&mut self, cell: &Cell) -> Option<&mut SearchNode> {
        self.nodes.get_mut(cell)
    }

    /// Get the node for the cell, allocating a fresh unvisited node if it hasn't been seen.
    pub fn get_or_alloc(&mut self, cell: Cell) -> &mut SearchNode {
        match self.nodes.entry(cell) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => e.insert(SearchNode::default()),
        }
    }

    /// Build the path ending at `end` by following parents back to the start.
    ///
    /// Returns `None` if `end` has not been discovered.
    pub fn reconstruct_path(&self, end: Cell) -> Option<RawPath> {
        let mut cells = Vec::new();
        let mut costs = Vec::new();

        let mut next = Some(end);
        while let Some(cell) = next {
            let node = self.nodes.get(&cell)?;

            cells.push(cell);
            costs.push(node.g);

            next = node.parent;
        }

        // Reverse so that the path goes from the start to the end
        cells.reverse();
        costs.reverse();

        Some(RawPath { cells, costs })
    }
}

impl OpenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries in the set, including stale ones.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn push(&mut self, cell: Cell, f: NotNan<f64>) {
        self.heap.push(OpenEntry {
            f,
            seq: self.next_seq,
            cell,
        });
        self.next_seq += 1;
    }

    /// Remove and return the entry with the lowest `f`, the earliest inserted winning ties.
    pub fn pop(&mut self) -> Option<(Cell, NotNan<f64>)> {
        self.heap.pop().map(|e| (e.cell, e.f))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Note that we flip the order here so that the heap will be a min-heap, not a max-heap
        other
            .f
            .cmp(&self.f)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------
