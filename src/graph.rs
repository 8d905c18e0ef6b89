//! In-memory directed graph with forward and backward expanders
//!
//! Edges are stored both ways: `outgoing[a]` lists the targets of a,
//! `incoming[b]` the sources of b. The forward expander reads the former,
//! the backward expander the latter.

use crate::search::expander::{ExpandError, NodeExpander};
use crate::search::node::{Direction, Node};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Separator between source and target in an edge-list line.
pub const EDGE_SEPARATOR: &str = "->";

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("cannot read graph file: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: expected 'SOURCE {sep} TARGET', got '{content}'", sep = EDGE_SEPARATOR)]
    Parse { line: usize, content: String },
}

#[derive(Debug, Clone)]
pub struct AdjacencyGraph<N: Node> {
    name: String,
    outgoing: HashMap<N, Vec<N>>,
    incoming: HashMap<N, Vec<N>>,
    nodes: HashSet<N>,
    edge_count: usize,
}

impl<N: Node> AdjacencyGraph<N> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
            nodes: HashSet::new(),
            edge_count: 0,
        }
    }

    /// Build a graph from `(from, to)` pairs.
    pub fn from_edges<I>(name: impl Into<String>, edges: I) -> Self
    where
        I: IntoIterator<Item = (N, N)>,
    {
        let mut graph = Self::new(name);
        for (from, to) in edges {
            graph.add_edge(from, to);
        }
        graph
    }

    pub fn add_node(&mut self, node: N) {
        self.nodes.insert(node);
    }

    /// Add a directed edge. Also inserts into the incoming adjacency list.
    pub fn add_edge(&mut self, from: N, to: N) {
        self.nodes.insert(from.clone());
        self.nodes.insert(to.clone());
        self.outgoing.entry(from.clone()).or_default().push(to.clone());
        self.incoming.entry(to).or_default().push(from);
        self.edge_count += 1;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Domain identifier reported by both expanders of this graph.
    pub fn domain(&self) -> String {
        format!("memory:{}", self.name)
    }

    pub fn contains(&self, node: &N) -> bool {
        self.nodes.contains(node)
    }

    pub fn neighbors_out(&self, node: &N) -> &[N] {
        self.outgoing.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn neighbors_in(&self, node: &N) -> &[N] {
        self.incoming.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Expander following outgoing edges.
    pub fn forward_expander(self: &Arc<Self>) -> GraphExpander<N> {
        GraphExpander::new(Arc::clone(self), Direction::Forward)
    }

    /// Expander following incoming edges.
    pub fn backward_expander(self: &Arc<Self>) -> GraphExpander<N> {
        GraphExpander::new(Arc::clone(self), Direction::Backward)
    }
}

impl AdjacencyGraph<String> {
    /// Parse an edge list: one `SOURCE -> TARGET` per line.
    ///
    /// Blank lines and lines starting with `#` are skipped. A line without
    /// an arrow declares an isolated node.
    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self, GraphError> {
        let mut graph = Self::new(name);
        for (index, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            match line.split_once(EDGE_SEPARATOR) {
                Some((from, to)) => {
                    let (from, to) = (from.trim(), to.trim());
                    if from.is_empty() || to.is_empty() {
                        return Err(GraphError::Parse {
                            line: index + 1,
                            content: raw.to_string(),
                        });
                    }
                    graph.add_edge(from.to_string(), to.to_string());
                }
                None => graph.add_node(line.to_string()),
            }
        }
        Ok(graph)
    }

    /// Load an edge-list file; the graph is named after the path.
    pub fn load(path: &Path) -> Result<Self, GraphError> {
        let text = fs::read_to_string(path)?;
        Self::parse(path.display().to_string(), &text)
    }
}

impl AdjacencyGraph<u32> {
    /// Seeded random digraph on `0..node_count` with `out_degree` edges per
    /// node. Self loops are skipped, so some nodes end up with fewer.
    pub fn random(node_count: u32, out_degree: usize, seed: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut graph = Self::new(format!("random-{}-{}-{}", node_count, out_degree, seed));
        for node in 0..node_count {
            graph.add_node(node);
            if node_count < 2 {
                continue;
            }
            for _ in 0..out_degree {
                let to = rng.random_range(0..node_count);
                if to != node {
                    graph.add_edge(node, to);
                }
            }
        }
        graph
    }
}

/// `NodeExpander` over an `AdjacencyGraph`, with optional simulated latency.
#[derive(Debug, Clone)]
pub struct GraphExpander<N: Node> {
    graph: Arc<AdjacencyGraph<N>>,
    direction: Direction,
    domain: String,
    latency: Duration,
}

impl<N: Node> GraphExpander<N> {
    pub fn new(graph: Arc<AdjacencyGraph<N>>, direction: Direction) -> Self {
        let domain = graph.domain();
        Self {
            graph,
            direction,
            domain,
            latency: Duration::ZERO,
        }
    }

    /// Sleep this long in every `expand` call, standing in for network I/O.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }
}

impl<N: Node> NodeExpander<N> for GraphExpander<N> {
    fn expand(&self, node: &N) -> Result<Vec<N>, ExpandError> {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        let neighbors = match self.direction {
            Direction::Forward => self.graph.neighbors_out(node),
            Direction::Backward => self.graph.neighbors_in(node),
        };
        Ok(neighbors.to_vec())
    }

    fn domain(&self) -> &str {
        &self.domain
    }
}
