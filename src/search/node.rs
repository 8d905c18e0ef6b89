//! Node identity and search direction

use std::fmt;
use std::hash::Hash;

/// Bound for anything usable as a graph node identifier.
///
/// Article titles are the usual choice, but any cheap-to-clone hashable
/// value works. Nodes are shared across worker threads, hence `Send + Sync`.
pub trait Node: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

impl<T> Node for T where T: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {}

/// Which end of the search a piece of state belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Grows from the source following outgoing edges
    Forward,
    /// Grows from the target following incoming edges
    Backward,
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }

    /// Short tag used in thread names.
    pub fn tag(self) -> &'static str {
        match self {
            Direction::Forward => "fwd",
            Direction::Backward => "bwd",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => write!(f, "forward"),
            Direction::Backward => write!(f, "backward"),
        }
    }
}
