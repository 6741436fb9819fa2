//! CLI integration tests
//!
//! Tests the command-line interface using assert_cmd

mod common;

use predicates::prelude::*;

use common::graceful_run_cmd;

// ─────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_help_flag() {
    graceful_run_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("graceful-run"))
        .stdout(predicate::str::contains("probe"))
        .stdout(predicate::str::contains("env"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("version"));
}

#[test]
fn test_version_command() {
    graceful_run_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("graceful-run "))
        .stdout(predicate::str::contains("commit"))
        .stdout(predicate::str::contains("target"));
}

#[test]
fn test_short_version_flag() {
    graceful_run_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("graceful-run"));
}

// ─────────────────────────────────────────────────────────────────
// Probe Command Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_probe_completes() {
    graceful_run_cmd()
        .args(["--quiet", "probe", "--duration-ms", "50", "--tick-ms", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("probe running"))
        .stdout(predicate::str::contains("probe finished"));
}

#[test]
fn test_probe_failure_exit_code() {
    graceful_run_cmd()
        .args(["--quiet", "probe", "--duration-ms", "20", "--tick-ms", "5", "--fail"])
        .assert()
        .code(50)
        .stderr(predicate::str::contains("E500"))
        .stderr(predicate::str::contains("probe configured to fail"));
}

#[test]
fn test_probe_missing_config() {
    graceful_run_cmd()
        .args(["probe", "--config", "/nonexistent/graceful-run.toml"])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_probe_zero_tick_rejected() {
    graceful_run_cmd()
        .args(["probe", "--duration-ms", "10", "--tick-ms", "0"])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("tick_ms"));
}

#[test]
fn test_tick_flag_overrides_env() {
    graceful_run_cmd()
        .env("GRACEFUL_RUN_PROBE_TICK_MS", "0")
        .args(["--quiet", "probe", "--duration-ms", "20", "--tick-ms", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("probe finished"));
}

#[test]
fn test_probe_help() {
    graceful_run_cmd()
        .args(["probe", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--duration-ms"))
        .stdout(predicate::str::contains("--ignore-cancel"));
}

// ─────────────────────────────────────────────────────────────────
// Env Command Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_env_check_present() {
    graceful_run_cmd()
        .env("GRACEFUL_RUN_TEST_TOKEN", "hunter2")
        .env("GRACEFUL_RUN_TEST_EMPTY", "")
        .args(["env", "check", "GRACEFUL_RUN_TEST_TOKEN", "GRACEFUL_RUN_TEST_EMPTY"])
        .assert()
        .success()
        .stdout(predicate::str::contains("GRACEFUL_RUN_TEST_TOKEN: set"))
        .stdout(predicate::str::contains("GRACEFUL_RUN_TEST_EMPTY: set (empty)"))
        .stdout(predicate::str::contains("hunter2").not());
}

#[test]
fn test_env_check_reports_all_missing() {
    graceful_run_cmd()
        .env("GRACEFUL_RUN_TEST_PRESENT", "1")
        .env_remove("GRACEFUL_RUN_TEST_MISSING_A")
        .env_remove("GRACEFUL_RUN_TEST_MISSING_B")
        .args([
            "env",
            "check",
            "GRACEFUL_RUN_TEST_MISSING_A",
            "GRACEFUL_RUN_TEST_PRESENT",
            "GRACEFUL_RUN_TEST_MISSING_B",
        ])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("E104"))
        .stderr(predicate::str::contains(
            "GRACEFUL_RUN_TEST_MISSING_A, GRACEFUL_RUN_TEST_MISSING_B",
        ))
        .stderr(predicate::str::contains("Hint"));
}

#[test]
fn test_env_check_requires_keys() {
    graceful_run_cmd().args(["env", "check"]).assert().failure();
}

// ─────────────────────────────────────────────────────────────────
// Config Command Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_config_show_default() {
    graceful_run_cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[logging]"))
        .stdout(predicate::str::contains("[probe]"));
}

#[test]
fn test_config_validate_default() {
    graceful_run_cmd()
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"));
}

// ─────────────────────────────────────────────────────────────────
// Error Handling Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_unknown_command() {
    graceful_run_cmd()
        .arg("unknown-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_missing_subcommand() {
    graceful_run_cmd().assert().failure();
}
