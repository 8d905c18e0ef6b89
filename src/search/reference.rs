//! Sequential breadth-first reference search

use crate::search::PathFinder;
use crate::search::error::{SearchError, SearchResult};
use crate::search::expander::NodeExpander;
use crate::search::logger::ProgressLogger;
use crate::search::node::{Direction, Node};
use crate::search::result::{SearchStatistics, Termination};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Instant;

/// Plain single-threaded BFS from the source over the forward expander.
///
/// Slow on real link graphs, but obviously correct; used to check the
/// concurrent finder. The backward expander only takes part in the domain
/// check and the backward logger only sees `on_begin_search`.
#[derive(Debug, Default)]
pub struct BreadthFirstPathFinder {
    statistics: SearchStatistics,
}

impl BreadthFirstPathFinder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PathFinder for BreadthFirstPathFinder {
    fn search<N: Node>(
        &mut self,
        source: &N,
        target: &N,
        forward_expander: Arc<dyn NodeExpander<N>>,
        backward_expander: Arc<dyn NodeExpander<N>>,
        forward_logger: Option<Arc<dyn ProgressLogger<N>>>,
        backward_logger: Option<Arc<dyn ProgressLogger<N>>>,
    ) -> SearchResult<Vec<N>> {
        self.reset();
        let start_time = Instant::now();

        if forward_expander.domain() != backward_expander.domain() {
            return Err(SearchError::DomainMismatch {
                forward: forward_expander.domain().to_string(),
                backward: backward_expander.domain().to_string(),
            });
        }
        for logger in forward_logger.iter().chain(backward_logger.iter()) {
            logger.on_begin_search(source, target);
        }

        if source == target {
            self.statistics.termination = Termination::Trivial;
            self.statistics.path_length = Some(0);
            self.statistics.elapsed_time = start_time.elapsed();
            return Ok(vec![source.clone()]);
        }

        // Parent pointers; the source maps to itself
        let mut parent: HashMap<N, N> = HashMap::new();
        let mut queue: VecDeque<N> = VecDeque::new();
        parent.insert(source.clone(), source.clone());
        queue.push_back(source.clone());

        let mut found = false;
        'search: while let Some(current) = queue.pop_front() {
            self.statistics.forward.expanded_nodes += 1;
            if let Some(logger) = &forward_logger {
                logger.on_expansion(&current);
            }

            let neighbors = match forward_expander.expand(&current) {
                Ok(neighbors) => neighbors,
                Err(error) => {
                    self.statistics.termination = Termination::Aborted;
                    self.statistics.elapsed_time = start_time.elapsed();
                    return Err(SearchError::Expansion {
                        direction: Direction::Forward,
                        node: format!("{:?}", current),
                        source: error,
                    });
                }
            };

            for neighbor in neighbors {
                if parent.contains_key(&neighbor) {
                    continue;
                }
                parent.insert(neighbor.clone(), current.clone());
                self.statistics.forward.generated_neighbors += 1;
                if let Some(logger) = &forward_logger {
                    logger.on_neighbor_generation(&neighbor);
                }
                if &neighbor == target {
                    found = true;
                    break 'search;
                }
                queue.push_back(neighbor);
            }
        }

        let path = if found {
            let mut path = vec![target.clone()];
            let mut current = target;
            while current != source {
                current = &parent[current];
                path.push(current.clone());
            }
            path.reverse();
            self.statistics.termination = Termination::Optimal {
                best_length: (path.len() - 1) as u32,
                lower_bound: None,
            };
            path
        } else {
            self.statistics.forward.exhausted = true;
            self.statistics.termination = Termination::Exhausted;
            Vec::new()
        };

        self.statistics.path_length = path.len().checked_sub(1);
        self.statistics.elapsed_time = start_time.elapsed();
        Ok(path)
    }

    fn statistics(&self) -> &SearchStatistics {
        &self.statistics
    }

    fn reset(&mut self) {
        self.statistics = SearchStatistics::default();
    }
}
