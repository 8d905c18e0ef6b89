//! Bidirectional search coordinator that manages master and worker threads.

use crate::search::channel::{
    CancelHandle, CoordinatorChannels, Report, ThreadChannels, create_channels,
};
use crate::search::config::SearchConfig;
use crate::search::error::{SearchError, SearchResult};
use crate::search::expander::NodeExpander;
use crate::search::frontier::DirectionState;
use crate::search::logger::ProgressLogger;
use crate::search::master::{MasterContext, run_master, stopping_rule_holds};
use crate::search::meeting::MeetingTracker;
use crate::search::node::{Direction, Node};
use crate::search::result::{SearchStatistics, Termination};
use crate::search::worker::{WorkerContext, run_worker};
use crate::search::PathFinder;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Concurrent bidirectional breadth-first path finder.
///
/// Each direction runs `thread_count` slave workers and one master. The
/// calling thread coordinates: it waits for a proof of optimality, for both
/// directions to run dry, or for a failure, then shuts the threads down and
/// rebuilds the path from the predecessor maps.
#[derive(Debug)]
pub struct BidirectionalPathFinder {
    config: SearchConfig,
    statistics: SearchStatistics,
    cancel: CancelHandle,
}

impl Default for BidirectionalPathFinder {
    fn default() -> Self {
        Self::new(SearchConfig::default())
    }
}

/// Both directions plus the shared meeting state of one search.
struct SearchState<N: Node> {
    forward: Arc<DirectionState<N>>,
    backward: Arc<DirectionState<N>>,
    tracker: Arc<MeetingTracker<N>>,
}

enum Outcome {
    Found { best_length: u32, lower_bound: Option<u32> },
    Unreachable,
}

impl BidirectionalPathFinder {
    pub fn new(config: SearchConfig) -> Self {
        Self {
            config: config.effective(),
            statistics: SearchStatistics::default(),
            cancel: CancelHandle::default(),
        }
    }

    /// The configuration in effect, minimums applied.
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Handle that cancels the search currently running on this finder.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Wall-clock duration of the last search.
    pub fn duration(&self) -> std::time::Duration {
        self.statistics.elapsed_time
    }

    /// Expansions of both directions in the last search.
    pub fn expanded_nodes(&self) -> u64 {
        self.statistics.expanded_nodes()
    }

    fn run<N: Node>(
        &self,
        state: &SearchState<N>,
        forward_expander: Arc<dyn NodeExpander<N>>,
        backward_expander: Arc<dyn NodeExpander<N>>,
    ) -> SearchResult<Outcome> {
        let (coordinator, threads) = create_channels(self.cancel.clone());

        let mut handles = Vec::with_capacity(2 * (self.config.thread_count + 1));
        let spawned = self
            .spawn_direction(&mut handles, state, Direction::Forward, forward_expander, &threads)
            .and_then(|_| {
                self.spawn_direction(&mut handles, state, Direction::Backward, backward_expander, &threads)
            });

        let outcome = match spawned {
            Ok(()) => self.coordinate(state, &coordinator),
            Err(err) => Err(err),
        };

        coordinator.control.signal_stop();
        self.shutdown(handles);
        outcome
    }

    fn spawn_direction<N: Node>(
        &self,
        handles: &mut Vec<JoinHandle<()>>,
        state: &SearchState<N>,
        direction: Direction,
        expander: Arc<dyn NodeExpander<N>>,
        channels: &ThreadChannels,
    ) -> SearchResult<()> {
        let (own, opposite) = match direction {
            Direction::Forward => (&state.forward, &state.backward),
            Direction::Backward => (&state.backward, &state.forward),
        };

        for worker_id in 0..self.config.thread_count {
            let ctx = WorkerContext {
                worker_id,
                own: Arc::clone(own),
                opposite: Arc::clone(opposite),
                tracker: Arc::clone(&state.tracker),
                expander: Arc::clone(&expander),
                channels: channels.clone(),
                slave_sleep: self.config.slave_sleep,
                expansion_retries: self.config.expansion_retries,
            };
            let handle = thread::Builder::new()
                .name(format!("{}-slave-{}", direction.tag(), worker_id))
                .spawn(move || run_worker(ctx))?;
            handles.push(handle);
        }

        let ctx = MasterContext {
            own: Arc::clone(own),
            opposite: Arc::clone(opposite),
            tracker: Arc::clone(&state.tracker),
            channels: channels.clone(),
            master_sleep: self.config.master_sleep,
            maximum_idle_trials: self.config.maximum_idle_trials,
        };
        let handle = thread::Builder::new()
            .name(format!("{}-master", direction.tag()))
            .spawn(move || run_master(ctx))?;
        handles.push(handle);
        Ok(())
    }

    /// Coordinator loop: wait for a terminating condition.
    fn coordinate<N: Node>(
        &self,
        state: &SearchState<N>,
        channels: &CoordinatorChannels,
    ) -> SearchResult<Outcome> {
        loop {
            if channels.control.is_cancelled() {
                return Err(SearchError::Cancelled);
            }

            // Reports only speed things up; every condition is re-checked here.
            match channels.reports.recv_timeout(self.config.slave_sleep) {
                Ok(Report::Failed {
                    direction,
                    node,
                    error,
                    ..
                }) => {
                    return Err(SearchError::Expansion {
                        direction,
                        node,
                        source: error,
                    });
                }
                Ok(Report::Panicked { direction }) => {
                    return Err(SearchError::WorkerPanicked { direction });
                }
                Ok(Report::Exhausted { direction }) => {
                    debug!(%direction, "direction reported exhausted");
                }
                Ok(Report::BoundReached { .. }) | Err(_) => {}
            }

            if let Some((best_length, lower_bound)) =
                stopping_rule_holds(&state.tracker, &state.forward, &state.backward)
            {
                return Ok(Outcome::Found {
                    best_length,
                    lower_bound,
                });
            }
            if state.forward.is_exhausted() && state.backward.is_exhausted() {
                return Ok(Outcome::Unreachable);
            }
        }
    }

    /// Join threads that finish within the join timeout; detach the rest.
    fn shutdown(&self, handles: Vec<JoinHandle<()>>) {
        let deadline = Instant::now() + self.config.join_timeout;
        while handles.iter().any(|h| !h.is_finished()) && Instant::now() < deadline {
            thread::sleep(self.config.slave_sleep);
        }

        let mut detached = 0;
        for handle in handles {
            if handle.is_finished() {
                if handle.join().is_err() {
                    warn!("search thread panicked during shutdown");
                }
            } else {
                detached += 1;
            }
        }
        if detached > 0 {
            warn!(detached, "detaching search threads still inside a lookup");
        }
    }
}

/// Splice the two predecessor chains at the meeting node.
fn reconstruct_path<N: Node>(state: &SearchState<N>, meeting: &N) -> Vec<N> {
    let mut path = state.forward.path_to_seed(meeting);
    path.reverse();
    path.extend(state.backward.path_to_seed(meeting).into_iter().skip(1));
    path
}

impl PathFinder for BidirectionalPathFinder {
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

        let state = SearchState {
            forward: Arc::new(DirectionState::new(
                Direction::Forward,
                source.clone(),
                forward_logger,
            )),
            backward: Arc::new(DirectionState::new(
                Direction::Backward,
                target.clone(),
                backward_logger,
            )),
            tracker: Arc::new(MeetingTracker::new()),
        };

        let outcome = self.run(&state, forward_expander, backward_expander);
        self.cancel.clear();

        self.statistics.forward = state.forward.statistics();
        self.statistics.backward = state.backward.statistics();

        let path = match outcome {
            Ok(Outcome::Found {
                best_length,
                lower_bound,
            }) => {
                self.statistics.termination = Termination::Optimal {
                    best_length,
                    lower_bound,
                };
                match state.tracker.best() {
                    Some((_, meeting)) => reconstruct_path(&state, &meeting),
                    None => Vec::new(),
                }
            }
            Ok(Outcome::Unreachable) => {
                self.statistics.termination = Termination::Exhausted;
                Vec::new()
            }
            Err(err) => {
                self.statistics.termination = Termination::Aborted;
                self.statistics.elapsed_time = start_time.elapsed();
                return Err(err);
            }
        };

        self.statistics.path_length = path.len().checked_sub(1);
        self.statistics.elapsed_time = start_time.elapsed();
        info!(
            termination = %self.statistics.termination,
            expanded = self.statistics.expanded_nodes(),
            elapsed = ?self.statistics.elapsed_time,
            "search finished"
        );
        Ok(path)
    }

    fn statistics(&self) -> &SearchStatistics {
        &self.statistics
    }

    fn reset(&mut self) {
        self.statistics = SearchStatistics::default();
    }
}
