//! Shortest hop-count path search over lazily expanded graphs
//!
//! This module provides two path finders behind one trait:
//! - Bidirectional: concurrent search from both ends, with a pool of slave
//!   workers and a master thread per direction
//! - Breadth-first: sequential single-direction reference search
//!
//! # Architecture
//!
//! The bidirectional search consists of:
//! - A **coordinator** (the calling thread) that waits for a terminating
//!   condition and rebuilds the path
//! - Per-direction **state**: tentative distances, predecessors, frontier
//! - **Slave workers** that pop frontier nodes, call the expander and relax
//!   the neighbors
//! - **Masters** that decide when a direction has run dry
//! - A **meeting tracker** holding the best path length found so far
//!
//! # Example
//!
//! ```ignore
//! use wikipath::search::{BidirectionalPathFinder, PathFinder, SearchConfig};
//!
//! let mut finder = BidirectionalPathFinder::new(SearchConfig::default().with_threads(16));
//! let path = finder.search(&source, &target, forward, backward, None, None)?;
//! println!("{} hops in {:?}", path.len() - 1, finder.duration());
//! ```

pub mod channel;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod expander;
pub mod frontier;
pub mod logger;
pub mod master;
pub mod meeting;
pub mod node;
pub mod reference;
pub mod result;
pub mod worker;

pub use channel::CancelHandle;
pub use config::SearchConfig;
pub use coordinator::BidirectionalPathFinder;
pub use error::{SearchError, SearchResult};
pub use expander::{ExpandError, NodeExpander};
pub use logger::{CountingProgressLogger, ProgressLogger};
pub use node::{Direction, Node};
pub use reference::BreadthFirstPathFinder;
pub use result::{DirectionStatistics, SearchStatistics, Termination};

use std::sync::Arc;

/// Trait for algorithms that find a shortest hop-count path
pub trait PathFinder {
    /// Search for a shortest path from `source` to `target`
    ///
    /// # Arguments
    /// * `source`, `target` - Terminal nodes
    /// * `forward_expander` - Outgoing neighbors of a node
    /// * `backward_expander` - Incoming neighbors of a node; must walk the
    ///   same graph domain as `forward_expander`
    /// * `forward_logger`, `backward_logger` - Optional progress hooks
    ///
    /// # Returns
    /// The nodes from `source` to `target` inclusive, or an empty path if
    /// the target is unreachable
    fn search<N: Node>(
        &mut self,
        source: &N,
        target: &N,
        forward_expander: Arc<dyn NodeExpander<N>>,
        backward_expander: Arc<dyn NodeExpander<N>>,
        forward_logger: Option<Arc<dyn ProgressLogger<N>>>,
        backward_logger: Option<Arc<dyn ProgressLogger<N>>>,
    ) -> SearchResult<Vec<N>>;

    /// Get statistics from the most recent search
    fn statistics(&self) -> &SearchStatistics;

    /// Reset the statistics for a new search
    fn reset(&mut self);
}
