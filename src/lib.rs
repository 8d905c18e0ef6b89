//! wikipath: shortest hop-count paths between Wikipedia articles
//!
//! The heavy lifting is in [`search`]: a concurrent bidirectional
//! breadth-first search over graphs whose edges are only discovered by
//! asking a [`NodeExpander`](search::NodeExpander), one node at a time.
//! [`wikipedia`] provides expanders over the live MediaWiki API and
//! [`graph`] provides in-memory ones.

pub mod graph;
pub mod search;
pub mod wikipedia;

pub use graph::{AdjacencyGraph, GraphError, GraphExpander};
pub use search::{
    BidirectionalPathFinder, BreadthFirstPathFinder, CancelHandle, CountingProgressLogger,
    Direction, ExpandError, Node, NodeExpander, PathFinder, ProgressLogger, SearchConfig,
    SearchError, SearchResult, SearchStatistics, Termination,
};
pub use wikipedia::{ArticleRef, WikipediaError, WikipediaExpander, parse_article_ref};
