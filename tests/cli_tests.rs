//! CLI Integration Tests for Oak
//!
//! Runs the built `oak` binary in a scratch directory, pointing it at a mocked
//! data source through the environment.

mod common;

use common::*;
use std::fs;
use std::path::Path;
use std::process::Output;
use tempfile::TempDir;
use tokio::process::Command;
use wiremock::MockServer;

/// Run `oak` with a clean environment rooted in `dir`.
async fn run_oak(args: &[&str], dir: &Path, base_url: Option<&str>) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_oak"));
    cmd.args(args)
        .arg("--no-color")
        .current_dir(dir)
        .env_remove("OAK_CONFIG")
        .env_remove("OAK_API_TOKEN")
        .env_remove("RUST_LOG")
        .env("OAK_CACHE_DIR", dir.join("cache"))
        .env("OAK_BASE_URL", base_url.unwrap_or("http://127.0.0.1:9"));

    cmd.output().await.expect("Failed to execute oak")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

async fn fire_server() -> MockServer {
    let server = MockServer::start().await;
    mount_category(&server, "fire", &["charmander", "charizard"]).await;
    mount_entity(
        &server,
        "charmander",
        entity_json("charmander", &["fire"], &[("hp", 39), ("attack", 52)]),
    )
    .await;
    mount_entity(
        &server,
        "charizard",
        entity_json("charizard", &["fire", "flying"], &[("hp", 78), ("attack", 84)]),
    )
    .await;
    server
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[tokio::test]
async fn test_help_command() {
    let dir = TempDir::new().unwrap();
    let output = run_oak(&["--help"], dir.path(), None).await;

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Pokémon research orchestrator"));
    assert!(text.contains("Usage"));
    for command in ["research", "plan", "analyze", "lookup", "cache"] {
        assert!(text.contains(command), "help is missing {}", command);
    }
}

#[tokio::test]
async fn test_version_command() {
    let dir = TempDir::new().unwrap();
    let output = run_oak(&["--version"], dir.path(), None).await;

    assert!(output.status.success());
    assert!(stdout(&output).contains("oak"));
}

// =============================================================================
// Command Tests
// =============================================================================

#[tokio::test]
async fn test_plan_needs_no_network() {
    let dir = TempDir::new().unwrap();
    let output = run_oak(&["plan", "Analyze Fire-type Pokémon weaknesses"], dir.path(), None).await;

    assert!(output.status.success(), "plan failed: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Fire"));
    assert!(text.contains("weakness_distribution"));
}

#[tokio::test]
async fn test_research_prints_report_to_stdout() {
    let server = fire_server().await;
    let dir = TempDir::new().unwrap();

    let output = run_oak(
        &["research", "Analyze Fire-type Pokémon weaknesses"],
        dir.path(),
        Some(&server.uri()),
    )
    .await;

    assert!(output.status.success(), "research failed: {}", stderr(&output));
    let report = stdout(&output);
    assert!(report.starts_with("# Pokémon Research Report"));
    assert!(report.contains("Analysis of 2 Fire-type Pokémon"));
    assert!(!report.contains("Research completed"));
    assert!(stderr(&output).contains("Research completed"));
}

#[tokio::test]
async fn test_research_writes_artifacts() {
    let server = fire_server().await;
    let dir = TempDir::new().unwrap();

    let output = run_oak(
        &[
            "research",
            "fire weaknesses",
            "--output",
            "out/report.md",
            "--chart-dir",
            "out",
            "--csv",
            "out/fire.csv",
        ],
        dir.path(),
        Some(&server.uri()),
    )
    .await;

    assert!(output.status.success(), "research failed: {}", stderr(&output));
    let report = fs::read_to_string(dir.path().join("out/report.md")).unwrap();
    assert!(report.contains("## Key Findings"));

    let chart = fs::read_to_string(dir.path().join("out/fire_weakness_distribution.txt")).unwrap();
    assert!(chart.contains("Water"));

    let csv = fs::read_to_string(dir.path().join("out/fire.csv")).unwrap();
    assert!(csv.lines().next().unwrap().starts_with("name,"));
    assert_eq!(csv.lines().count(), 3);
}

#[tokio::test]
async fn test_round_limit_flag_yields_partial_report() {
    let server = fire_server().await;
    let dir = TempDir::new().unwrap();

    let output = run_oak(
        &["research", "fire weaknesses", "--max-rounds", "1"],
        dir.path(),
        Some(&server.uri()),
    )
    .await;

    assert!(output.status.success());
    assert!(stdout(&output).contains("(Partial)"));
}

#[tokio::test]
async fn test_unwritable_chart_dir_still_delivers_report() {
    let server = fire_server().await;
    let dir = TempDir::new().unwrap();
    // A regular file where the chart directory should go.
    fs::write(dir.path().join("blocked"), "not a directory").unwrap();

    let output = run_oak(
        &[
            "research",
            "fire weaknesses",
            "--chart-dir",
            "blocked/charts",
            "--csv",
            "fire.csv",
        ],
        dir.path(),
        Some(&server.uri()),
    )
    .await;

    assert!(output.status.success(), "research failed: {}", stderr(&output));
    assert!(stdout(&output).starts_with("# Pokémon Research Report"));
    assert!(stderr(&output).contains("Could not write chart"));
    assert!(dir.path().join("fire.csv").exists());
}

#[tokio::test]
async fn test_analyze_rejects_unknown_category() {
    let dir = TempDir::new().unwrap();
    let output = run_oak(&["analyze", "plasma"], dir.path(), None).await;

    assert!(!output.status.success());
    assert!(stderr(&output).contains("plasma"));
}

#[tokio::test]
async fn test_lookup_prints_record_to_stdout() {
    let server = fire_server().await;
    let dir = TempDir::new().unwrap();

    let output = run_oak(&["lookup", "Charizard"], dir.path(), Some(&server.uri())).await;

    assert!(output.status.success(), "lookup failed: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.starts_with("charizard"));
    assert!(text.contains("  types: fire, flying"));
    assert!(text.contains("  hp: 78"));
    assert!(text.contains("electric"));
    assert!(!stderr(&output).contains("types:"));
}

#[tokio::test]
async fn test_lookup_unknown_entity_is_not_an_error() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let output = run_oak(&["lookup", "missingno"], dir.path(), Some(&server.uri())).await;

    assert!(output.status.success());
    assert!(stderr(&output).contains("missingno"));
}

#[tokio::test]
async fn test_cache_persists_between_invocations() {
    let server = fire_server().await;
    let dir = TempDir::new().unwrap();

    let first = run_oak(&["lookup", "charizard"], dir.path(), Some(&server.uri())).await;
    assert!(first.status.success());

    let stats = run_oak(&["cache", "stats"], dir.path(), None).await;
    assert!(stats.status.success());
    let text = stdout(&stats);
    assert!(text.starts_with("Entity cache"));
    assert!(text.contains("entries: 1"));

    let cleared = run_oak(&["cache", "clear"], dir.path(), None).await;
    assert!(cleared.status.success());
    let remaining = fs::read_dir(dir.path().join("cache")).unwrap().count();
    assert_eq!(remaining, 0);
}

#[tokio::test]
async fn test_malformed_config_file_exits_nonzero() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("oak.toml"), "[data\nbase_url = ").unwrap();

    let output = run_oak(&["plan", "fire"], dir.path(), None).await;

    assert!(!output.status.success());
}
