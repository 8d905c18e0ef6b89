use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use wikipath::search::frontier::{DirectionState, Relaxation};
use wikipath::{
    AdjacencyGraph, BidirectionalPathFinder, BreadthFirstPathFinder, Direction, ExpandError,
    NodeExpander, PathFinder, ProgressLogger, SearchConfig, SearchError, Termination,
};

type Expanders = (Arc<dyn NodeExpander<u32>>, Arc<dyn NodeExpander<u32>>);

fn expanders(graph: &Arc<AdjacencyGraph<u32>>) -> Expanders {
    (
        Arc::new(graph.forward_expander()),
        Arc::new(graph.backward_expander()),
    )
}

fn fast_config(threads: usize) -> SearchConfig {
    SearchConfig::default()
        .with_threads(threads)
        .with_idle_trials(3)
        .with_master_sleep(Duration::from_millis(2))
        .with_slave_sleep(Duration::from_millis(1))
}

fn reference_hops(graph: &Arc<AdjacencyGraph<u32>>, source: u32, target: u32) -> Option<usize> {
    let (forward, backward) = expanders(graph);
    let mut reference = BreadthFirstPathFinder::new();
    let path = reference
        .search(&source, &target, forward, backward, None, None)
        .unwrap();
    path.len().checked_sub(1)
}

/// Every consecutive pair of the path must be an edge of the graph.
fn assert_valid_path(graph: &AdjacencyGraph<u32>, path: &[u32], source: u32, target: u32) {
    assert_eq!(path.first(), Some(&source));
    assert_eq!(path.last(), Some(&target));
    for pair in path.windows(2) {
        assert!(
            graph.neighbors_out(&pair[0]).contains(&pair[1]),
            "{} -> {} is not an edge",
            pair[0],
            pair[1]
        );
    }
}

/// Counts expansions per node, per direction.
#[derive(Default)]
struct ExpansionCounter {
    counts: Mutex<HashMap<u32, usize>>,
}

impl ProgressLogger<u32> for ExpansionCounter {
    fn on_expansion(&self, node: &u32) {
        *self.counts.lock().entry(*node).or_default() += 1;
    }
}

/// Latency that keeps the healthy direction from meeting before a failure lands.
const SLOW: Duration = Duration::from_millis(200);

/// Fails every lookup with the given error, under the graph's domain.
struct Failing {
    domain: String,
    error: ExpandError,
}

impl NodeExpander<u32> for Failing {
    fn expand(&self, _node: &u32) -> Result<Vec<u32>, ExpandError> {
        Err(self.error.clone())
    }

    fn domain(&self) -> &str {
        &self.domain
    }
}

/// Panics inside every lookup, under the graph's domain.
struct Panicking {
    domain: String,
}

impl NodeExpander<u32> for Panicking {
    fn expand(&self, node: &u32) -> Result<Vec<u32>, ExpandError> {
        panic!("lookup of {} blew up", node);
    }

    fn domain(&self) -> &str {
        &self.domain
    }
}

// --- Engine properties ---

#[test]
fn test_matches_reference_on_random_graphs() {
    for seed in 0..4 {
        let graph = Arc::new(AdjacencyGraph::random(300, 3, seed));
        let mut finder = BidirectionalPathFinder::new(fast_config(4));

        for (source, target) in [(0, 299), (5, 150), (17, 42), (120, 3), (250, 251)] {
            let expected = reference_hops(&graph, source, target);
            let (forward, backward) = expanders(&graph);
            let path = finder
                .search(&source, &target, forward, backward, None, None)
                .unwrap();

            assert_eq!(
                path.len().checked_sub(1),
                expected,
                "seed {} pair {} -> {}",
                seed,
                source,
                target
            );
            if !path.is_empty() {
                assert_valid_path(&graph, &path, source, target);
            }
        }
    }
}

#[test]
fn test_unreachable_exhausts_both_directions() {
    let mut graph = AdjacencyGraph::new("split");
    graph.add_edge(1u32, 2);
    graph.add_edge(2, 3);
    graph.add_edge(10, 11);
    graph.add_edge(11, 12);
    let graph = Arc::new(graph);

    let mut finder = BidirectionalPathFinder::new(fast_config(2));
    let (forward, backward) = expanders(&graph);
    let path = finder.search(&1, &12, forward, backward, None, None).unwrap();

    assert!(path.is_empty());
    let stats = finder.statistics();
    assert_eq!(stats.termination, Termination::Exhausted);
    assert!(stats.forward.exhausted);
    assert!(stats.backward.exhausted);
    assert_eq!(stats.path_length, None);
}

#[test]
fn test_relax_without_improvement_changes_nothing() {
    let logger = Arc::new(ExpansionCounter::default());
    let state = DirectionState::new(
        Direction::Forward,
        0u32,
        Some(logger as Arc<dyn ProgressLogger<u32>>),
    );

    assert_eq!(state.relax(&5, 3, &1), Relaxation::Generated);
    assert_eq!(state.relax(&5, 3, &2), Relaxation::Unchanged);
    assert_eq!(state.relax(&5, 4, &2), Relaxation::Unchanged);

    assert_eq!(state.distance_of(&5), Some(3));
    assert_eq!(state.path_to_seed(&5)[1], 1);
    let stats = state.statistics();
    assert_eq!(stats.generated_neighbors, 1);
    assert_eq!(stats.improved_neighbors, 0);
}

#[test]
fn test_each_node_expanded_at_most_once() {
    let graph = Arc::new(AdjacencyGraph::random(400, 4, 7));
    let forward_counter = Arc::new(ExpansionCounter::default());
    let backward_counter = Arc::new(ExpansionCounter::default());

    let mut finder = BidirectionalPathFinder::new(fast_config(16));
    let (forward, backward) = expanders(&graph);
    finder
        .search(
            &0,
            &399,
            forward,
            backward,
            Some(Arc::clone(&forward_counter) as Arc<dyn ProgressLogger<u32>>),
            Some(Arc::clone(&backward_counter) as Arc<dyn ProgressLogger<u32>>),
        )
        .unwrap();

    for counter in [&forward_counter, &backward_counter] {
        let counts = counter.counts.lock();
        assert!(counts.values().all(|&count| count == 1), "{:?}", counts);
    }
    let stats = finder.statistics();
    assert_eq!(
        stats.forward.expanded_nodes as usize,
        forward_counter.counts.lock().len()
    );
    assert_eq!(
        stats.backward.expanded_nodes as usize,
        backward_counter.counts.lock().len()
    );
}

#[test]
fn test_path_length_matches_best_and_bound_holds() {
    let graph = Arc::new(AdjacencyGraph::random(500, 3, 11));
    let mut finder = BidirectionalPathFinder::new(fast_config(8));

    for target in [100, 200, 300, 400] {
        let (forward, backward) = expanders(&graph);
        let path = finder
            .search(&0, &target, forward, backward, None, None)
            .unwrap();
        if path.is_empty() {
            continue;
        }

        match finder.statistics().termination {
            Termination::Optimal {
                best_length,
                lower_bound,
            } => {
                assert_eq!(path.len() - 1, best_length as usize);
                if let Some(bound) = lower_bound {
                    assert!(bound >= best_length, "{} < {}", bound, best_length);
                }
            }
            other => panic!("unexpected termination {:?}", other),
        }
    }
}

#[test]
fn test_hop_count_stable_across_thread_counts() {
    let graph = Arc::new(AdjacencyGraph::random(600, 3, 23));
    let expected = reference_hops(&graph, 1, 598);

    for threads in [2, 3, 8, 16, 32] {
        for _ in 0..3 {
            let mut finder = BidirectionalPathFinder::new(fast_config(threads));
            let (forward, backward) = expanders(&graph);
            let path = finder
                .search(&1, &598, forward, backward, None, None)
                .unwrap();
            assert_eq!(path.len().checked_sub(1), expected, "threads {}", threads);
        }
    }
}

// --- Scenarios ---

#[test]
fn test_source_equals_target() {
    let graph = Arc::new(AdjacencyGraph::random(50, 2, 1));
    let mut finder = BidirectionalPathFinder::new(fast_config(4));
    let (forward, backward) = expanders(&graph);

    let path = finder.search(&9, &9, forward, backward, None, None).unwrap();

    assert_eq!(path, vec![9]);
    assert_eq!(finder.expanded_nodes(), 0);
}

#[test]
fn test_directed_chain() {
    let graph = Arc::new(AdjacencyGraph::from_edges(
        "chain",
        [(0u32, 1), (1, 2), (2, 3)],
    ));
    let mut finder = BidirectionalPathFinder::new(fast_config(4));
    let (forward, backward) = expanders(&graph);

    let path = finder.search(&0, &3, forward, backward, None, None).unwrap();

    assert_eq!(path, vec![0, 1, 2, 3]);
}

#[test]
fn test_chain_against_edge_direction_is_unreachable() {
    let graph = Arc::new(AdjacencyGraph::from_edges(
        "chain",
        [(0u32, 1), (1, 2), (2, 3)],
    ));
    let mut finder = BidirectionalPathFinder::new(fast_config(4));
    let (forward, backward) = expanders(&graph);

    let path = finder.search(&3, &0, forward, backward, None, None).unwrap();

    assert!(path.is_empty());
}

#[test]
fn test_disconnected_target_waits_for_idle_trials() {
    let graph = Arc::new(AdjacencyGraph::from_edges(
        "islands",
        [(0u32, 1), (1, 0), (5, 6)],
    ));
    let config = SearchConfig::default()
        .with_threads(2)
        .with_idle_trials(5)
        .with_master_sleep(Duration::from_millis(10))
        .with_slave_sleep(Duration::from_millis(1));
    let mut finder = BidirectionalPathFinder::new(config);
    let (forward, backward) = expanders(&graph);

    let path = finder.search(&0, &6, forward, backward, None, None).unwrap();

    assert!(path.is_empty());
    // Five empty observations at 10 ms each before a master gives up
    assert!(finder.duration() >= Duration::from_millis(40));
}

#[test]
fn test_domain_mismatch_rejected_before_expanding() {
    let graph = Arc::new(AdjacencyGraph::from_edges("en", [(0u32, 1)]));
    let other = Arc::new(AdjacencyGraph::from_edges("fi", [(0u32, 1)]));
    let counter = Arc::new(ExpansionCounter::default());
    let mut finder = BidirectionalPathFinder::new(fast_config(4));

    let result = finder.search(
        &0,
        &1,
        Arc::new(graph.forward_expander()),
        Arc::new(other.backward_expander()),
        Some(Arc::clone(&counter) as Arc<dyn ProgressLogger<u32>>),
        None,
    );

    match result {
        Err(SearchError::DomainMismatch { forward, backward }) => {
            assert_eq!(forward, "memory:en");
            assert_eq!(backward, "memory:fi");
        }
        other => panic!("expected domain mismatch, got {:?}", other),
    }
    assert!(counter.counts.lock().is_empty());
    assert_eq!(finder.expanded_nodes(), 0);
}

// --- Failures and cancellation ---

#[test]
fn test_fatal_expansion_error_aborts_search() {
    let graph = Arc::new(AdjacencyGraph::from_edges("g", [(0u32, 1), (1, 2)]));
    let failing: Arc<dyn NodeExpander<u32>> = Arc::new(Failing {
        domain: graph.domain(),
        error: ExpandError::Fatal("no such page".to_string()),
    });
    let mut finder = BidirectionalPathFinder::new(fast_config(2));

    let result = finder.search(
        &0,
        &2,
        failing,
        Arc::new(graph.backward_expander().with_latency(SLOW)),
        None,
        None,
    );

    match result {
        Err(SearchError::Expansion {
            direction, source, ..
        }) => {
            assert_eq!(direction, Direction::Forward);
            assert!(!source.is_transient());
        }
        other => panic!("expected expansion failure, got {:?}", other),
    }
    assert_eq!(finder.statistics().termination, Termination::Aborted);
}

#[test]
fn test_persistent_transient_error_aborts_after_retries() {
    let graph = Arc::new(AdjacencyGraph::from_edges("g", [(0u32, 1), (1, 2)]));
    let failing: Arc<dyn NodeExpander<u32>> = Arc::new(Failing {
        domain: graph.domain(),
        error: ExpandError::Transient("HTTP 503".to_string()),
    });
    let config = fast_config(2).with_expansion_retries(2);
    let mut finder = BidirectionalPathFinder::new(config);

    let result = finder.search(
        &0,
        &2,
        Arc::new(graph.forward_expander().with_latency(SLOW)),
        failing,
        None,
        None,
    );

    match result {
        Err(SearchError::Expansion {
            direction, source, ..
        }) => {
            assert_eq!(direction, Direction::Backward);
            assert!(source.is_transient());
        }
        other => panic!("expected expansion failure, got {:?}", other),
    }
}

#[test]
fn test_cancel_stops_running_search() {
    let edges: Vec<(u32, u32)> = (0..10_000).map(|n| (n, n + 1)).collect();
    let graph = Arc::new(AdjacencyGraph::from_edges("long", edges));
    let latency = Duration::from_millis(5);
    let forward: Arc<dyn NodeExpander<u32>> =
        Arc::new(graph.forward_expander().with_latency(latency));
    let backward: Arc<dyn NodeExpander<u32>> =
        Arc::new(graph.backward_expander().with_latency(latency));

    let mut finder = BidirectionalPathFinder::new(fast_config(2));
    let cancel = finder.cancel_handle();
    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        cancel.cancel();
    });

    let start = Instant::now();
    let result = finder.search(&0, &10_000, forward, backward, None, None);
    canceller.join().unwrap();

    assert!(matches!(result, Err(SearchError::Cancelled)));
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(!finder.cancel_handle().is_cancelled());
}

#[test]
fn test_finder_reusable_after_error() {
    let graph = Arc::new(AdjacencyGraph::from_edges("g", [(0u32, 1), (1, 2)]));
    let failing: Arc<dyn NodeExpander<u32>> = Arc::new(Failing {
        domain: graph.domain(),
        error: ExpandError::Fatal("boom".to_string()),
    });
    let mut finder = BidirectionalPathFinder::new(fast_config(2));
    let slow: Arc<dyn NodeExpander<u32>> =
        Arc::new(graph.backward_expander().with_latency(SLOW));
    assert!(finder.search(&0, &2, failing, slow, None, None).is_err());

    let (forward, backward) = expanders(&graph);
    let path = finder.search(&0, &2, forward, backward, None, None).unwrap();
    assert_eq!(path, vec![0, 1, 2]);
}

#[test]
fn test_panicking_expander_reports_worker_panic() {
    let graph = Arc::new(AdjacencyGraph::from_edges("g", [(0u32, 1), (1, 2)]));
    let panicking: Arc<dyn NodeExpander<u32>> = Arc::new(Panicking {
        domain: graph.domain(),
    });
    let slow: Arc<dyn NodeExpander<u32>> =
        Arc::new(graph.backward_expander().with_latency(SLOW));
    let mut finder = BidirectionalPathFinder::new(fast_config(2));

    let start = Instant::now();
    let result = finder.search(&0, &2, panicking, slow, None, None);

    match result {
        Err(SearchError::WorkerPanicked { direction }) => {
            assert_eq!(direction, Direction::Forward);
        }
        other => panic!("expected worker panic, got {:?}", other),
    }
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(finder.statistics().termination, Termination::Aborted);
}
