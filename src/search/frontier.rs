//! Per-direction search state: tentative distances, predecessors, frontier
//!
//! All mutation goes through one mutex per direction, which makes `relax`
//! and `pop_next` linearizable with respect to the distance map. Progress
//! hooks fire after the lock is released.
//!
//! The frontier is a binary heap with lazy deletion: an improved node gets
//! a fresh entry and the old one is skipped when it surfaces.

use crate::search::logger::ProgressLogger;
use crate::search::node::{Direction, Node};
use crate::search::result::DirectionStatistics;
use parking_lot::Mutex;
use std::cmp::{Ordering as CmpOrdering, Reverse};
use std::collections::{BTreeMap, BinaryHeap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Frontier entry ordered by distance, then discovery order.
#[derive(Debug)]
struct Entry<N> {
    distance: u32,
    sequence: u64,
    node: N,
}

impl<N> PartialEq for Entry<N> {
    fn eq(&self, other: &Self) -> bool {
        self.distance == other.distance && self.sequence == other.sequence
    }
}

impl<N> Eq for Entry<N> {}

impl<N> PartialOrd for Entry<N> {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl<N> Ord for Entry<N> {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        (self.distance, self.sequence).cmp(&(other.distance, other.sequence))
    }
}

/// Outcome of offering a distance to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relaxation {
    /// First distance for this node
    Generated,
    /// Strictly lower than the recorded distance
    Improved,
    /// Not lower; nothing changed
    Unchanged,
}

/// A node handed to a worker for expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion<N> {
    pub node: N,
    pub distance: u32,
}

/// Result of asking the frontier for work.
#[derive(Debug, PartialEq, Eq)]
pub enum Pop<N> {
    Ready(Expansion<N>),
    /// Nodes are queued, but an in-flight expansion may still lower them
    Blocked,
    /// Nothing queued
    Empty,
}

struct Inner<N> {
    distance: HashMap<N, u32>,
    predecessor: HashMap<N, N>,
    expanded: HashSet<N>,
    frontier: BinaryHeap<Reverse<Entry<N>>>,
    /// Discovered nodes not yet popped
    queued: usize,
    /// Distance -> number of nodes currently being expanded at it
    in_flight: BTreeMap<u32, usize>,
    next_sequence: u64,
}

impl<N: Node> Inner<N> {
    fn push(&mut self, node: N, distance: u32) {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.frontier.push(Reverse(Entry {
            distance,
            sequence,
            node,
        }));
    }

    /// Drop stale entries until the top of the heap is live.
    fn prune(&mut self) {
        while let Some(Reverse(top)) = self.frontier.peek() {
            let live = !self.expanded.contains(&top.node)
                && self.distance.get(&top.node) == Some(&top.distance);
            if live {
                break;
            }
            self.frontier.pop();
        }
    }

    fn min_in_flight(&self) -> Option<u32> {
        self.in_flight.keys().next().copied()
    }
}

/// Search state of one direction.
pub struct DirectionState<N: Node> {
    direction: Direction,
    seed: N,
    inner: Mutex<Inner<N>>,
    logger: Option<Arc<dyn ProgressLogger<N>>>,
    expanded_count: AtomicU64,
    generated_count: AtomicU64,
    improved_count: AtomicU64,
    exhausted: AtomicBool,
}

impl<N: Node> DirectionState<N> {
    /// Fresh state with `seed` queued at distance 0.
    pub fn new(direction: Direction, seed: N, logger: Option<Arc<dyn ProgressLogger<N>>>) -> Self {
        let mut inner = Inner {
            distance: HashMap::new(),
            predecessor: HashMap::new(),
            expanded: HashSet::new(),
            frontier: BinaryHeap::new(),
            queued: 1,
            in_flight: BTreeMap::new(),
            next_sequence: 0,
        };
        inner.distance.insert(seed.clone(), 0);
        inner.push(seed.clone(), 0);

        Self {
            direction,
            seed,
            inner: Mutex::new(inner),
            logger,
            expanded_count: AtomicU64::new(0),
            generated_count: AtomicU64::new(0),
            improved_count: AtomicU64::new(0),
            exhausted: AtomicBool::new(false),
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn seed(&self) -> &N {
        &self.seed
    }

    /// Offer `candidate` as the distance of `node`, reached via `predecessor`.
    pub fn relax(&self, node: &N, candidate: u32, predecessor: &N) -> Relaxation {
        let outcome = {
            let mut inner = self.inner.lock();
            let outcome = match inner.distance.get(node) {
                None => Relaxation::Generated,
                Some(&current) if candidate < current => Relaxation::Improved,
                Some(_) => Relaxation::Unchanged,
            };

            if outcome != Relaxation::Unchanged {
                inner.distance.insert(node.clone(), candidate);
                inner.predecessor.insert(node.clone(), predecessor.clone());
                if outcome == Relaxation::Generated {
                    inner.queued += 1;
                }
                // An expanded node keeps its better label but is never requeued.
                if !inner.expanded.contains(node) {
                    inner.push(node.clone(), candidate);
                }
            }
            outcome
        };

        match outcome {
            Relaxation::Generated => {
                self.generated_count.fetch_add(1, Ordering::Relaxed);
                if let Some(logger) = &self.logger {
                    logger.on_neighbor_generation(node);
                }
            }
            Relaxation::Improved => {
                self.improved_count.fetch_add(1, Ordering::Relaxed);
                if let Some(logger) = &self.logger {
                    logger.on_neighbor_improvement(node);
                }
            }
            Relaxation::Unchanged => {}
        }
        outcome
    }

    /// Take the closest unexpanded node and mark it expanded.
    ///
    /// A node at distance `d` is only released while no in-flight expansion
    /// sits below `d - 1`; such an expansion could still lower it. Every
    /// node therefore leaves the frontier with its final distance, and is
    /// expanded at most once.
    pub fn pop_next(&self) -> Pop<N> {
        let expansion = {
            let mut inner = self.inner.lock();
            inner.prune();

            let Some(Reverse(top)) = inner.frontier.peek() else {
                return Pop::Empty;
            };
            if let Some(lowest) = inner.min_in_flight() {
                if lowest + 1 < top.distance {
                    return Pop::Blocked;
                }
            }

            let Some(Reverse(entry)) = inner.frontier.pop() else {
                return Pop::Empty;
            };
            inner.queued -= 1;
            inner.expanded.insert(entry.node.clone());
            *inner.in_flight.entry(entry.distance).or_insert(0) += 1;
            Expansion {
                node: entry.node,
                distance: entry.distance,
            }
        };

        self.expanded_count.fetch_add(1, Ordering::Relaxed);
        if let Some(logger) = &self.logger {
            logger.on_expansion(&expansion.node);
        }
        Pop::Ready(expansion)
    }

    /// Mark an expansion handed out by `pop_next` as fully relaxed.
    pub fn complete(&self, expansion: &Expansion<N>) {
        let mut inner = self.inner.lock();
        if let Some(count) = inner.in_flight.get_mut(&expansion.distance) {
            *count -= 1;
            if *count == 0 {
                inner.in_flight.remove(&expansion.distance);
            }
        }
    }

    pub fn distance_of(&self, node: &N) -> Option<u32> {
        self.inner.lock().distance.get(node).copied()
    }

    pub fn is_expanded(&self, node: &N) -> bool {
        self.inner.lock().expanded.contains(node)
    }

    /// Smallest distance among queued and in-flight nodes.
    ///
    /// `None` means nothing is left that could ever extend this direction.
    pub fn lower_bound(&self) -> Option<u32> {
        let mut inner = self.inner.lock();
        inner.prune();
        let queued = inner.frontier.peek().map(|Reverse(entry)| entry.distance);
        match (queued, inner.min_in_flight()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// No queued and no in-flight nodes.
    pub fn is_idle(&self) -> bool {
        let inner = self.inner.lock();
        inner.queued == 0 && inner.in_flight.is_empty()
    }

    /// Nodes from `node` back to this direction's seed, `node` first.
    pub fn path_to_seed(&self, node: &N) -> Vec<N> {
        let inner = self.inner.lock();
        let mut path = vec![node.clone()];
        let mut current = node;
        while let Some(previous) = inner.predecessor.get(current) {
            path.push(previous.clone());
            current = previous;
        }
        path
    }

    pub fn mark_exhausted(&self) {
        self.exhausted.store(true, Ordering::SeqCst);
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted.load(Ordering::SeqCst)
    }

    pub fn statistics(&self) -> DirectionStatistics {
        DirectionStatistics {
            expanded_nodes: self.expanded_count.load(Ordering::Relaxed),
            generated_neighbors: self.generated_count.load(Ordering::Relaxed),
            improved_neighbors: self.improved_count.load(Ordering::Relaxed),
            exhausted: self.is_exhausted(),
        }
    }
}
