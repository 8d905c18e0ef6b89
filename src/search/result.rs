//! Search statistics and termination records

use std::fmt;
use std::time::Duration;

/// How the last search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Termination {
    /// No search has completed yet
    #[default]
    NotRun,
    /// Source and target coincide
    Trivial,
    /// The stopping rule proved the path optimal
    Optimal {
        best_length: u32,
        /// Sum of the frontier minima when the search stopped; `None` if a
        /// direction had nothing left to expand
        lower_bound: Option<u32>,
    },
    /// Both directions ran dry without meeting
    Exhausted,
    /// Stopped by failure or cancellation
    Aborted,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::NotRun => write!(f, "not run"),
            Termination::Trivial => write!(f, "source equals target"),
            Termination::Optimal {
                best_length,
                lower_bound: Some(bound),
            } => write!(f, "optimal at length {} (lower bound {})", best_length, bound),
            Termination::Optimal {
                best_length,
                lower_bound: None,
            } => write!(f, "optimal at length {} (frontier exhausted)", best_length),
            Termination::Exhausted => write!(f, "unreachable"),
            Termination::Aborted => write!(f, "aborted"),
        }
    }
}

/// Counters of one search direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectionStatistics {
    /// Nodes whose neighbors were requested
    pub expanded_nodes: u64,
    /// Nodes that received their first tentative distance
    pub generated_neighbors: u64,
    /// Times a tentative distance was lowered
    pub improved_neighbors: u64,
    /// Whether the master declared this direction exhausted
    pub exhausted: bool,
}

/// Statistics from the most recent search
#[derive(Debug, Clone, Default)]
pub struct SearchStatistics {
    /// Wall-clock time inside `search`
    pub elapsed_time: Duration,
    pub forward: DirectionStatistics,
    pub backward: DirectionStatistics,
    pub termination: Termination,
    /// Edges on the returned path, `None` if no path was returned
    pub path_length: Option<usize>,
}

impl SearchStatistics {
    pub fn expanded_nodes(&self) -> u64 {
        self.forward.expanded_nodes + self.backward.expanded_nodes
    }

    pub fn generated_neighbors(&self) -> u64 {
        self.forward.generated_neighbors + self.backward.generated_neighbors
    }

    pub fn improved_neighbors(&self) -> u64 {
        self.forward.improved_neighbors + self.backward.improved_neighbors
    }

    /// Expansions per second
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed_time.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.expanded_nodes() as f64 / secs
        }
    }

    /// Format statistics as a human-readable string
    pub fn format_summary(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Time: {:.2?}\n", self.elapsed_time));
        s.push_str(&format!("Termination: {}\n", self.termination));
        if let Some(length) = self.path_length {
            s.push_str(&format!("Path length: {}\n", length));
        }
        for (name, stats) in [("Forward", &self.forward), ("Backward", &self.backward)] {
            s.push_str(&format!(
                "{}: {} expanded, {} generated, {} improved{}\n",
                name,
                stats.expanded_nodes,
                stats.generated_neighbors,
                stats.improved_neighbors,
                if stats.exhausted { ", exhausted" } else { "" }
            ));
        }
        s.push_str(&format!("Throughput: {:.0} expansions/sec\n", self.throughput()));
        s
    }
}
