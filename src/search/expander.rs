//! Neighbor discovery capability consumed by the engine

use crate::search::node::Node;
use thiserror::Error;

/// Failure of a single neighbor lookup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpandError {
    /// Worth retrying: timeouts, throttling, dropped connections
    #[error("transient expansion error: {0}")]
    Transient(String),
    /// Retrying cannot help
    #[error("fatal expansion error: {0}")]
    Fatal(String),
}

impl ExpandError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ExpandError::Transient(_))
    }
}

/// Returns the one-hop neighbors of a node in one direction.
///
/// Implementations are shared between all workers of a direction and are
/// called concurrently, so they must be `Send + Sync`. A call may block on
/// I/O for as long as it needs to.
pub trait NodeExpander<N: Node>: Send + Sync {
    /// Neighbors of `node`. Duplicates are allowed and harmless.
    fn expand(&self, node: &N) -> Result<Vec<N>, ExpandError>;

    /// Identifies the graph this expander walks.
    ///
    /// Forward and backward expanders handed to one search must report the
    /// same domain; this is checked once before any work starts.
    fn domain(&self) -> &str;
}
