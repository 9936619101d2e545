//! Smoke tests for the orderprobe CLI
//!
//! These tests verify basic CLI functionality without launching a browser.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin until assert_cmd is updated
#![allow(clippy::expect_used, clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const SUITE_VARS: [&str; 13] = [
    "ORDERPROBE_CONFIG",
    "BROWSER",
    "HEADLESS",
    "DEFAULT_TIMEOUT",
    "POLL_FREQUENCY",
    "RETRY_TIMES",
    "RETRY_DELAY",
    "ENV",
    "DEVICE",
    "LOG_LEVEL",
    "SCREENSHOT_PATH",
    "ORDER_PAGE_URL",
    "RUST_LOG",
];

/// Get a command for the orderprobe binary with a clean suite environment
fn orderprobe() -> Command {
    let mut cmd = Command::cargo_bin("orderprobe").expect("orderprobe binary should exist");
    for var in SUITE_VARS {
        cmd.env_remove(var);
    }
    cmd
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_version_flag() {
    orderprobe()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.3.0"));
}

#[test]
fn test_help_flag() {
    orderprobe()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("devices"));
}

#[test]
fn test_no_args_fails() {
    orderprobe().assert().failure();
}

#[test]
fn test_run_subcommand_help() {
    orderprobe()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--features"))
        .stdout(predicate::str::contains("--tags"))
        .stdout(predicate::str::contains("--headless"));
}

// ============================================================================
// Config Command
// ============================================================================

#[test]
fn test_config_json_defaults() {
    orderprobe()
        .args(["config", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"env\": \"staging\""))
        .stdout(predicate::str::contains("\"browser\": \"chromium\""))
        .stdout(predicate::str::contains("https://www.transglobalus.com"));
}

#[test]
fn test_config_yaml_reflects_flags() {
    orderprobe()
        .args(["config", "--env", "prod", "--device", "iphone17", "--headless"])
        .assert()
        .success()
        .stdout(predicate::str::contains("env: prod"))
        .stdout(predicate::str::contains("device: iphone17"))
        .stdout(predicate::str::contains("headless: true"));
}

#[test]
fn test_headed_overrides_headless_environment() {
    orderprobe()
        .args(["config", "--headed"])
        .env("HEADLESS", "true")
        .assert()
        .success()
        .stdout(predicate::str::contains("headless: false"));
}

#[test]
fn test_config_reads_environment() {
    orderprobe()
        .args(["config", "--format", "json"])
        .env("BROWSER", "firefox")
        .env("DEFAULT_TIMEOUT", "9")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"browser\": \"firefox\""))
        .stdout(predicate::str::contains("\"timeout\": 9"));
}

#[test]
fn test_config_file_flag() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("orderprobe.yaml");
    fs::write(&path, "env: dev\norder_page_url: https://order.test/golden-dragon\n").unwrap();

    orderprobe()
        .args(["config", "--format", "json", "--config"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"env\": \"dev\""))
        .stdout(predicate::str::contains("https://order.test/golden-dragon"));
}

#[test]
fn test_invalid_timeout_fails() {
    orderprobe()
        .arg("config")
        .env("DEFAULT_TIMEOUT", "soon")
        .assert()
        .failure()
        .stderr(predicate::str::contains("DEFAULT_TIMEOUT"));
}

// ============================================================================
// Devices Command
// ============================================================================

#[test]
fn test_devices_lists_profiles() {
    orderprobe()
        .args(["devices", "--color", "never"])
        .assert()
        .success()
        .stdout(predicate::str::contains("desktop"))
        .stdout(predicate::str::contains("iphone17promax"))
        .stdout(predicate::str::contains("iphone17"))
        .stdout(predicate::str::contains("pixel9pro"));
}

#[test]
fn test_invalid_device_fails() {
    orderprobe()
        .args(["devices", "--device", "nokia3310"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nokia3310"));
}

#[test]
fn test_invalid_browser_fails() {
    orderprobe()
        .args(["config", "--browser", "netscape"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("netscape"));
}

// ============================================================================
// Run Command
// ============================================================================

#[test]
fn test_run_missing_features_fails() {
    let dir = TempDir::new().unwrap();
    orderprobe()
        .args(["run", "--features"])
        .arg(dir.path().join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("feature path not found"));
}
