//! Integration tests for logging flags and environment variables
//!
//! Logs go to stderr only; secrets never appear in them at any level.

#![cfg(unix)]

mod support;

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn beokay() -> Command {
    let mut cmd = Command::cargo_bin("beokay").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("BEOKAY_LOG")
        .env_remove("BEOKAY_LOG_FORMAT");
    cmd
}

#[test]
fn test_json_log_format_flag() {
    let temp_dir = TempDir::new().unwrap();
    beokay()
        .args(["--log-format", "json", "--log-level", "debug", "destroy"])
        .arg("--base-path")
        .arg(temp_dir.path().join("env"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("\"level\":\"DEBUG\""))
        .stderr(predicate::str::contains("CLI initialized with log level: debug"));
}

#[test]
fn test_json_log_format_env_var() {
    let temp_dir = TempDir::new().unwrap();
    beokay()
        .env("BEOKAY_LOG_FORMAT", "json")
        .arg("destroy")
        .arg("--base-path")
        .arg(temp_dir.path().join("env"))
        .assert()
        .success()
        .stderr(predicate::str::contains("\"level\":\"INFO\""));
}

#[test]
fn test_beokay_log_overrides_level_flag() {
    let temp_dir = TempDir::new().unwrap();
    beokay()
        .env("BEOKAY_LOG", "warn")
        .args(["--log-level", "debug", "destroy"])
        .arg("--base-path")
        .arg(temp_dir.path().join("env"))
        .assert()
        .success()
        .stderr(predicate::str::contains("CLI initialized").not())
        .stderr(predicate::str::contains("No environment at").not());
}

#[test]
fn test_default_level_is_info() {
    let temp_dir = TempDir::new().unwrap();
    beokay()
        .arg("destroy")
        .arg("--base-path")
        .arg(temp_dir.path().join("env"))
        .assert()
        .success()
        .stderr(predicate::str::contains("No environment at"))
        .stderr(predicate::str::contains("CLI initialized").not());
}

#[test]
fn test_trace_logging_never_shows_vault_password() {
    if !support::bash_available() {
        eprintln!("Skipping test_trace_logging_never_shows_vault_password: bash not available");
        return;
    }
    let temp_dir = TempDir::new().unwrap();
    let base = temp_dir.path().join("env");
    let vault = temp_dir.path().join("vault-pass");
    support::fake_environment(&base);
    fs::write(&vault, "do-not-log-me").unwrap();

    beokay()
        .args(["--log-level", "trace", "run"])
        .arg("--base-path")
        .arg(&base)
        .arg("--vault-password-file")
        .arg(&vault)
        .args(["true"])
        .env(support::FAKE_LOG_ENV, temp_dir.path().join("log"))
        .assert()
        .success()
        .stderr(predicate::str::contains("export KAYOBE_VAULT_PASSWORD"))
        .stderr(predicate::str::contains("do-not-log-me").not());
}
