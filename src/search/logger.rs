//! Progress hooks fired while a search runs

use crate::search::node::{Direction, Node};
use std::sync::atomic::{AtomicU64, Ordering};

/// Lifecycle callbacks for one search direction.
///
/// Hooks run synchronously on whichever worker thread triggers them, so an
/// implementation sees concurrent calls and must synchronize itself. Every
/// hook defaults to a no-op.
pub trait ProgressLogger<N: Node>: Send + Sync {
    /// Called once, before any worker starts.
    fn on_begin_search(&self, _source: &N, _target: &N) {}

    /// Called exactly once for every node this direction expands.
    fn on_expansion(&self, _node: &N) {}

    /// Called when a node receives its first tentative distance.
    fn on_neighbor_generation(&self, _node: &N) {}

    /// Called when a node's tentative distance is lowered.
    fn on_neighbor_improvement(&self, _node: &N) {}
}

/// Counts every event and optionally echoes expansions to stdout.
///
/// Counters are reset by `on_begin_search`, so one logger can be reused
/// across searches and always reports the latest one.
#[derive(Debug)]
pub struct CountingProgressLogger {
    direction: Direction,
    echo: bool,
    expanded: AtomicU64,
    generated: AtomicU64,
    improved: AtomicU64,
}

impl CountingProgressLogger {
    pub fn new(direction: Direction) -> Self {
        Self {
            direction,
            echo: false,
            expanded: AtomicU64::new(0),
            generated: AtomicU64::new(0),
            improved: AtomicU64::new(0),
        }
    }

    /// Print a line for every expansion.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn expanded_nodes(&self) -> u64 {
        self.expanded.load(Ordering::Relaxed)
    }

    pub fn generated_neighbors(&self) -> u64 {
        self.generated.load(Ordering::Relaxed)
    }

    pub fn improved_neighbors(&self) -> u64 {
        self.improved.load(Ordering::Relaxed)
    }
}

impl<N: Node> ProgressLogger<N> for CountingProgressLogger {
    fn on_begin_search(&self, _source: &N, _target: &N) {
        self.expanded.store(0, Ordering::Relaxed);
        self.generated.store(0, Ordering::Relaxed);
        self.improved.store(0, Ordering::Relaxed);
    }

    fn on_expansion(&self, node: &N) {
        self.expanded.fetch_add(1, Ordering::Relaxed);
        if self.echo {
            let label = match self.direction {
                Direction::Forward => "Forward search expands: ",
                Direction::Backward => "Backward search expands:",
            };
            println!("[{} {:?}]", label, node);
        }
    }

    fn on_neighbor_generation(&self, _node: &N) {
        self.generated.fetch_add(1, Ordering::Relaxed);
    }

    fn on_neighbor_improvement(&self, _node: &N) {
        self.improved.fetch_add(1, Ordering::Relaxed);
    }
}
