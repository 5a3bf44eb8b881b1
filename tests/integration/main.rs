//! Integration tests for Specsniff
//!
//! These run the built binary against throwaway repositories.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn specsniff(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_specsniff"))
        .args(args)
        .current_dir(dir)
        .env_remove("SPECSNIFF_PROVIDER")
        .env_remove("SPECSNIFF_API_KEY")
        .env_remove("SPECSNIFF_DAILY_BUDGET_USD")
        .env_remove("SPECSNIFF_GROUP_SIZE")
        .env("SPECSNIFF_GROUP_DELAY_MS", "0")
        .output()
        .expect("Failed to execute specsniff")
}

fn sample_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("api")).unwrap();
    fs::write(
        dir.path().join("api/openapi.yaml"),
        "openapi: 3.0.0\ninfo:\n  title: Todo\n  version: '1'\npaths:\n  /todos:\n    get: {}\n    post: {}\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("schema.graphql"),
        "type Query {\n  todos: [Todo!]!\n}\n\ntype Todo {\n  id: ID!\n}\n",
    )
    .unwrap();
    fs::write(dir.path().join("config.yml"), "server:\n  port: 8080\n").unwrap();
    fs::write(dir.path().join("README.md"), "# not a candidate\n").unwrap();
    dir
}

/// Test that the CLI can be invoked
#[test]
fn test_cli_help() {
    let dir = TempDir::new().unwrap();
    let output = specsniff(dir.path(), &["--help"]);

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(output.status.success());
    assert!(stdout.contains("scan"));
    assert!(stdout.contains("check"));
}

#[test]
fn test_scan_json_with_local_provider() {
    let repo = sample_repo();
    let output = specsniff(repo.path(), &["scan", "--provider", "local", "--json"]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let entries = report.as_array().unwrap();
    assert_eq!(entries.len(), 3);

    let find = |path: &str| {
        entries
            .iter()
            .find(|entry| entry["path"] == path)
            .unwrap_or_else(|| panic!("missing {path}"))["result"]
            .clone()
    };

    let openapi = find("api/openapi.yaml");
    assert_eq!(openapi["isApiSpec"], true);
    assert_eq!(openapi["specType"], "openapi-3.x");
    assert_eq!(openapi["estimatedEndpointCount"], 2);

    let graphql = find("schema.graphql");
    assert_eq!(graphql["specType"], "graphql");

    let config = find("config.yml");
    assert_eq!(config["isApiSpec"], false);
}

#[test]
fn test_check_named_file() {
    let repo = sample_repo();
    let output = specsniff(repo.path(), &["check", "api/openapi.yaml", "--provider", "local"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("* api/openapi.yaml [openapi-3.x 9/10, ~2 endpoints]"));
    assert!(stdout.contains("1 files: 1 likely specs"));
}

#[test]
fn test_remote_provider_without_key_fails() {
    let repo = sample_repo();
    let output = Command::new(env!("CARGO_BIN_EXE_specsniff"))
        .args(["scan", "--provider", "openai"])
        .current_dir(repo.path())
        .env_remove("SPECSNIFF_API_KEY")
        .env_remove("OPENAI_API_KEY")
        .output()
        .expect("Failed to execute specsniff");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("OPENAI_API_KEY"));
}
