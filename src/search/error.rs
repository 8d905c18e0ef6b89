//! Error types for the path finding engine

use crate::search::expander::ExpandError;
use crate::search::node::Direction;
use thiserror::Error;

/// Result type alias for search operations.
pub type SearchResult<T> = Result<T, SearchError>;

/// Everything that can stop a search from producing a path.
///
/// An unreachable target is not an error: it yields an empty path.
#[derive(Error, Debug)]
pub enum SearchError {
    /// Forward and backward expanders walk different graphs.
    #[error("forward expander domain '{forward}' does not match backward expander domain '{backward}'")]
    DomainMismatch { forward: String, backward: String },

    /// An expansion failed for good. Retries, if any, are already spent.
    #[error("{direction} expansion of {node} failed: {source}")]
    Expansion {
        direction: Direction,
        node: String,
        #[source]
        source: ExpandError,
    },

    /// The search was cancelled through its cancel handle.
    #[error("search cancelled")]
    Cancelled,

    /// A worker thread panicked while holding search state.
    #[error("a {direction} search thread panicked")]
    WorkerPanicked { direction: Direction },

    /// The operating system refused to start a search thread.
    #[error("failed to spawn search thread: {0}")]
    ThreadSpawn(#[from] std::io::Error),
}

impl SearchError {
    /// True if the search was stopped on request rather than by a fault.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SearchError::Cancelled)
    }
}
