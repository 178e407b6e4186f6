//! Corruption recovery tests for fittrack.
//!
//! These tests verify the CLI keeps working with:
//! - A corrupted local cache file
//! - Corrupted remote documents
//! - Invalid configuration

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn cli(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("fittrack"));
    cmd.env("XDG_CONFIG_HOME", dir.join("config"))
        .env("HOME", dir)
        .env_remove("RUST_LOG")
        .arg("--data-dir")
        .arg(dir.join("data"))
        .arg("--user")
        .arg("alice");
    cmd
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

#[test]
fn test_corrupted_cache_file() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().join("data");
    fs::create_dir_all(&data_dir).unwrap();
    fs::write(data_dir.join("cache.json"), "{ invalid json }}}}").unwrap();

    cli(temp_dir.path())
        .args(["food", "add", "Oats", "300", "10", "--date", "2025-02-10"])
        .assert()
        .success();

    // Next write replaced the broken file
    let cache = fs::read_to_string(data_dir.join("cache.json")).unwrap();
    assert!(serde_json::from_str::<serde_json::Value>(&cache).is_ok());
}

#[test]
fn test_malformed_cache_entry_falls_back_to_remote() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["food", "add", "Oats", "300", "10", "--date", "2025-02-10"])
        .assert()
        .success();

    let cache_path = temp_dir.path().join("data/cache.json");
    let entries = serde_json::json!({ "fittrack/alice/food/2025-02-10": "not json" });
    fs::write(&cache_path, entries.to_string()).unwrap();

    cli(temp_dir.path())
        .args(["food", "show", "--date", "2025-02-10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Oats"));
}

#[test]
fn test_corrupted_remote_catalog_is_not_overwritten() {
    let temp_dir = setup_test_dir();
    let doc_dir = temp_dir.path().join("data/remote/users/alice/data");
    fs::create_dir_all(&doc_dir).unwrap();
    let catalog_path = doc_dir.join("workouts.json");
    fs::write(&catalog_path, "{ truncated").unwrap();

    // Falls back to the default catalog for display
    cli(temp_dir.path())
        .args(["today", "--date", "2024-12-19"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Legs"))
        .stdout(predicate::str::contains("1. "));

    // A read fault is not a missing document, so nothing was written back
    assert_eq!(fs::read_to_string(&catalog_path).unwrap(), "{ truncated");
}

#[test]
fn test_corrupted_progress_document_skipped_in_calendar() {
    let temp_dir = setup_test_dir();

    cli(temp_dir.path())
        .args(["toggle", "1", "1", "--date", "2025-02-10"])
        .assert()
        .success();

    let progress_dir = temp_dir.path().join("data/remote/users/alice/workoutProgress");
    fs::write(progress_dir.join("2025-02-12.json"), "{ invalid").unwrap();
    fs::write(progress_dir.join("notes.json"), "{}").unwrap();

    cli(temp_dir.path())
        .args(["calendar", "--month", "2025-02"])
        .assert()
        .success()
        .stdout(predicate::str::contains("2025-02-10  Back & Biceps"))
        .stdout(predicate::str::contains("2025-02-12  -"));
}

#[test]
fn test_invalid_config_is_rejected() {
    let temp_dir = setup_test_dir();
    let config_path = temp_dir.path().join("bad.toml");
    fs::write(&config_path, "[schedule]\nrotation = []\n").unwrap();

    cli(temp_dir.path())
        .arg("--config")
        .arg(&config_path)
        .arg("today")
        .assert()
        .failure()
        .stderr(predicate::str::contains("rotation must not be empty"));
}

#[test]
fn test_invalid_user_id_is_rejected() {
    let temp_dir = setup_test_dir();

    Command::new(assert_cmd::cargo::cargo_bin!("fittrack"))
        .env("XDG_CONFIG_HOME", temp_dir.path().join("config"))
        .arg("--data-dir")
        .arg(temp_dir.path().join("data"))
        .args(["--user", "../evil", "today"])
        .assert()
        .failure();
}
