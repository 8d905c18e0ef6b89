use anyhow::{Context, bail};
use clap::Parser;
use clap::error::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use wikipath::search::config::{
    DEFAULT_EXPANSION_RETRIES, DEFAULT_MAXIMUM_IDLE_TRIALS, DEFAULT_THREAD_COUNT,
};
use wikipath::{
    AdjacencyGraph, BidirectionalPathFinder, CountingProgressLogger, Direction, NodeExpander,
    PathFinder, ProgressLogger, SearchConfig, SearchError, WikipediaExpander, parse_article_ref,
};

// --- Exit codes ---

const EXIT_INPUT_ERROR: i32 = 1;
const EXIT_DOMAIN_MISMATCH: i32 = 2;
const EXIT_SEARCH_ERROR: i32 = 3;

const BAR_WIDTH: usize = 80;

// --- Command Line Arguments ---

#[derive(Parser, Debug)]
#[command(name = "wikipath")]
#[command(about = "wikipath - shortest link paths between Wikipedia articles")]
#[command(version)]
#[command(arg_required_else_help = true)]
struct Args {
    /// Source article URL (a node name with --graph)
    source: String,
    /// Target article URL (a node name with --graph)
    target: String,

    /// Print every expanded node and per-direction counters
    #[arg(long, short)]
    log: bool,
    /// Slave threads per search direction
    #[arg(long, short, value_name = "N", default_value_t = DEFAULT_THREAD_COUNT)]
    threads: usize,
    /// Consecutive empty frontier observations before a direction gives up
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAXIMUM_IDLE_TRIALS)]
    trials: u32,
    /// Master thread sleep between frontier observations
    #[arg(long, short = 'm', value_name = "MS", default_value_t = 100)]
    master_sleep: u64,
    /// Slave thread sleep when there is nothing to expand
    #[arg(long, short = 's', value_name = "MS", default_value_t = 10)]
    slave_sleep: u64,
    /// Retries for lookups failing with a transient error
    #[arg(long, value_name = "N", default_value_t = DEFAULT_EXPANSION_RETRIES)]
    retries: u32,

    /// Search an edge-list file ('A -> B' per line) instead of Wikipedia
    #[arg(long, value_name = "FILE")]
    graph: Option<PathBuf>,
    /// Timeout for each Wikipedia API request
    #[arg(long, value_name = "SECS", default_value_t = 30)]
    http_timeout: u64,
}

/// Everything that makes the process exit non-zero.
enum Failure {
    Input(anyhow::Error),
    Search(SearchError),
}

impl From<anyhow::Error> for Failure {
    fn from(err: anyhow::Error) -> Self {
        Failure::Input(err)
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_names(true)
        .init();
}

fn bar() {
    println!("{}", "-".repeat(BAR_WIDTH));
}

fn plural(count: u64) -> &'static str {
    if count == 1 { "" } else { "s" }
}

fn print_configuration(title: &str, log: bool, config: &SearchConfig) {
    println!("{} Logging: {}", title, log);
    println!("{} Thread count: {}", title, config.thread_count);
    println!("{} Maximum sleep trials: {}", title, config.maximum_idle_trials);
    println!("{} Master sleeps (ms): {}", title, config.master_sleep.as_millis());
    println!("{} Slave sleeps (ms): {}", title, config.slave_sleep.as_millis());
    println!("{} Expansion retries: {}", title, config.expansion_retries);
}

/// Terminal nodes plus the expanders that walk their graph.
struct SearchInputs {
    source: String,
    target: String,
    forward: Arc<dyn NodeExpander<String>>,
    backward: Arc<dyn NodeExpander<String>>,
}

fn graph_inputs(path: &Path, source: &str, target: &str) -> anyhow::Result<SearchInputs> {
    let (source, target) = (source.trim(), target.trim());
    if source.is_empty() || target.is_empty() {
        bail!("source and target node names must not be empty");
    }

    let graph = AdjacencyGraph::<String>::load(path)
        .with_context(|| format!("loading graph {}", path.display()))?;
    let graph = Arc::new(graph);
    Ok(SearchInputs {
        source: source.to_string(),
        target: target.to_string(),
        forward: Arc::new(graph.forward_expander()),
        backward: Arc::new(graph.backward_expander()),
    })
}

fn wikipedia_inputs(source: &str, target: &str, timeout: Duration) -> anyhow::Result<SearchInputs> {
    let source = parse_article_ref(source).context("parsing source article")?;
    let target = parse_article_ref(target).context("parsing target article")?;

    let forward = WikipediaExpander::forward(&source.base_url, timeout)
        .context("creating forward Wikipedia client")?;
    let backward = WikipediaExpander::backward(&target.base_url, timeout)
        .context("creating backward Wikipedia client")?;

    // Different wikis are rejected by the search itself, without a lookup.
    let (source_title, target_title) = if source.base_url == target.base_url {
        (
            forward
                .canonical_title(&source.title)
                .context("resolving source article")?,
            backward
                .canonical_title(&target.title)
                .context("resolving target article")?,
        )
    } else {
        (source.title, target.title)
    };
    Ok(SearchInputs {
        source: source_title,
        target: target_title,
        forward: Arc::new(forward),
        backward: Arc::new(backward),
    })
}

fn run(args: &Args) -> Result<(), Failure> {
    let requested = SearchConfig {
        thread_count: args.threads,
        maximum_idle_trials: args.trials,
        master_sleep: Duration::from_millis(args.master_sleep),
        slave_sleep: Duration::from_millis(args.slave_sleep),
        expansion_retries: args.retries,
        ..SearchConfig::default()
    };
    let effective = requested.effective();

    bar();
    print_configuration("[REQUESTED CONFIGURATION]", args.log, &requested);
    bar();
    print_configuration("[EFFECTIVE CONFIGURATION]", args.log, &effective);
    bar();

    let inputs = match &args.graph {
        Some(path) => graph_inputs(path, &args.source, &args.target)?,
        None => wikipedia_inputs(
            &args.source,
            &args.target,
            Duration::from_secs(args.http_timeout),
        )?,
    };
    println!("[EFFECTIVE CONFIGURATION] The source node \"{}\".", inputs.source);
    println!("[EFFECTIVE CONFIGURATION] The target node \"{}\".", inputs.target);
    bar();

    let loggers = args.log.then(|| {
        (
            Arc::new(CountingProgressLogger::new(Direction::Forward).with_echo(true)),
            Arc::new(CountingProgressLogger::new(Direction::Backward).with_echo(true)),
        )
    });
    let (forward_logger, backward_logger) = match &loggers {
        Some((forward, backward)) => (
            Some(Arc::clone(forward) as Arc<dyn ProgressLogger<String>>),
            Some(Arc::clone(backward) as Arc<dyn ProgressLogger<String>>),
        ),
        None => (None, None),
    };

    let mut finder = BidirectionalPathFinder::new(effective);
    let path = finder
        .search(
            &inputs.source,
            &inputs.target,
            inputs.forward,
            inputs.backward,
            forward_logger,
            backward_logger,
        )
        .map_err(Failure::Search)?;

    if path.is_empty() {
        println!("[RESULT] The target node is not reachable from the source node.");
    } else {
        println!("[RESULT] The shortest path is:");
        for node in &path {
            println!("{}", node);
        }
    }

    let expanded = finder.expanded_nodes();
    println!(
        "[RESULT] The search took {} milliseconds, expanding {} node{}.",
        finder.duration().as_millis(),
        expanded,
        plural(expanded)
    );

    if let Some((forward, backward)) = &loggers {
        for logger in [forward, backward] {
            println!(
                "[RESULT] {} search: {} expanded, {} generated, {} improved.",
                logger.direction(),
                logger.expanded_nodes(),
                logger.generated_neighbors(),
                logger.improved_neighbors()
            );
        }
    }
    Ok(())
}

// --- Main Function ---
fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                let _ = err.print();
                std::process::exit(0);
            }
            _ => {
                eprint!("[INPUT ERROR]: {}", err);
                std::process::exit(EXIT_INPUT_ERROR);
            }
        },
    };

    init_tracing();

    match run(&args) {
        Ok(()) => {}
        Err(Failure::Input(err)) => {
            eprintln!("[INPUT ERROR]: {:#}", err);
            std::process::exit(EXIT_INPUT_ERROR);
        }
        Err(Failure::Search(SearchError::DomainMismatch { forward, backward })) => {
            eprintln!(
                "[INPUT ERROR] It seems like the two terminal URLs point to articles \
                 written in different languages ({} vs. {}).",
                forward, backward
            );
            std::process::exit(EXIT_DOMAIN_MISMATCH);
        }
        Err(Failure::Search(err)) => {
            eprintln!("[SEARCH ERROR] {}", err);
            std::process::exit(EXIT_SEARCH_ERROR);
        }
    }
}
