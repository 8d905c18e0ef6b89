use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

fn wikipath() -> Command {
    Command::new(env!("CARGO_BIN_EXE_wikipath"))
}

fn edge_list(text: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("Failed to create temp file");
    file.write_all(text.as_bytes())
        .expect("Failed to write edge list");
    file
}

fn run_graph(file: &NamedTempFile, source: &str, target: &str, extra: &[&str]) -> Output {
    wikipath()
        .arg("--graph")
        .arg(file.path())
        .args(["--master-sleep", "2", "--slave-sleep", "1", "--trials", "3"])
        .args(extra)
        .arg(source)
        .arg(target)
        .output()
        .expect("Failed to execute wikipath")
}

const GRAPH: &str = "\
# A small link graph
Alpha -> Beta
Beta -> Gamma
Gamma -> Delta
Alpha -> Epsilon
Epsilon -> Delta
Delta -> Alpha
Island
";

#[test]
fn test_cli_prints_shortest_path() {
    let file = edge_list(GRAPH);
    let output = run_graph(&file, "Alpha", "Delta", &[]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout.contains("[REQUESTED CONFIGURATION]"));
    assert!(stdout.contains("[EFFECTIVE CONFIGURATION]"));
    assert!(stdout.contains(&"-".repeat(80)));
    assert!(stdout.contains("[RESULT] The shortest path is:"));
    assert!(stdout.contains("Alpha\nEpsilon\nDelta\n"), "stdout: {}", stdout);
    assert!(stdout.contains("[RESULT] The search took"));
}

#[test]
fn test_cli_reports_unreachable_target() {
    let file = edge_list(GRAPH);
    let output = run_graph(&file, "Alpha", "Island", &[]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("[RESULT] The target node is not reachable from the source node."));
}

#[test]
fn test_cli_shows_requested_and_clamped_threads() {
    let file = edge_list(GRAPH);
    let output = run_graph(&file, "Alpha", "Gamma", &["--threads", "1"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("[REQUESTED CONFIGURATION] Thread count: 1"));
    assert!(stdout.contains("[EFFECTIVE CONFIGURATION] Thread count: 2"));
}

#[test]
fn test_cli_log_echoes_expansions() {
    let file = edge_list(GRAPH);
    let output = run_graph(&file, "Alpha", "Gamma", &["--log"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("[Forward search expands:"));
    assert!(stdout.contains("[RESULT] forward search:"));
    assert!(stdout.contains("[RESULT] backward search:"));
}

#[test]
fn test_cli_same_source_and_target() {
    let file = edge_list(GRAPH);
    let output = run_graph(&file, "Beta", "Beta", &[]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("[RESULT] The shortest path is:\nBeta\n"));
    assert!(stdout.contains("expanding 0 nodes."));
}

#[test]
fn test_cli_rejects_bad_option_value() {
    let output = wikipath()
        .args(["--threads", "many", "A", "B"])
        .output()
        .expect("Failed to execute wikipath");

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("[INPUT ERROR]"));
}

#[test]
fn test_cli_rejects_missing_graph_file() {
    let output = wikipath()
        .args(["--graph", "/nonexistent/wikipath/graph.txt", "A", "B"])
        .output()
        .expect("Failed to execute wikipath");

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_cli_rejects_malformed_edge_list() {
    let file = edge_list("Alpha -> \n");
    let output = run_graph(&file, "Alpha", "Beta", &[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("line 1"));
}

#[test]
fn test_cli_rejects_blank_node_name() {
    let file = edge_list(GRAPH);
    let output = run_graph(&file, "  ", "Beta", &[]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_cli_rejects_articles_in_different_languages() {
    let output = wikipath()
        .arg("https://en.wikipedia.org/wiki/Rust")
        .arg("https://fi.wikipedia.org/wiki/Rust")
        .output()
        .expect("Failed to execute wikipath");

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("different languages"));
}

#[test]
fn test_cli_help_exits_cleanly() {
    let output = wikipath()
        .arg("--help")
        .output()
        .expect("Failed to execute wikipath");

    assert_eq!(output.status.code(), Some(0));
    assert!(String::from_utf8_lossy(&output.stdout).contains("--graph"));
}

#[test]
fn test_cli_without_arguments_prints_help() {
    let output = wikipath().output().expect("Failed to execute wikipath");

    assert_eq!(output.status.code(), Some(0));
}
