//! Configuration system tests
//!
//! Tests configuration loading, validation, and environment overrides
//! through the `config` subcommands.

mod common;

use predicates::prelude::*;

use common::{graceful_run_cmd, invalid_config_fixture, valid_config_fixture, ConfigFixture};

#[test]
fn test_fixtures_exist() {
    assert!(valid_config_fixture().exists());
    assert!(invalid_config_fixture().exists());
}

// ─────────────────────────────────────────────────────────────────
// Valid Configuration Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_valid_fixture() {
    graceful_run_cmd()
        .args(["config", "validate", "--config"])
        .arg(valid_config_fixture())
        .assert()
        .success();
}

#[test]
fn test_empty_config_uses_defaults() {
    let fixture = ConfigFixture::new();
    fixture.write_config("");

    graceful_run_cmd()
        .args(["config", "show", "--config", fixture.path()])
        .assert()
        .success()
        .stdout(predicate::str::contains("level = \"info\""))
        .stdout(predicate::str::contains("tick_ms = 1000"));
}

#[test]
fn test_env_overrides_file() {
    let fixture = ConfigFixture::new();
    fixture.write_config(
        r#"
[probe]
duration_ms = 100
"#,
    );

    graceful_run_cmd()
        .env("GRACEFUL_RUN_PROBE_DURATION_MS", "4200")
        .env("GRACEFUL_RUN_LOG_LEVEL", "warn")
        .args(["config", "show", "--config", fixture.path()])
        .assert()
        .success()
        .stdout(predicate::str::contains("duration_ms = 4200"))
        .stdout(predicate::str::contains("level = \"warn\""));
}

#[test]
fn test_config_file_drives_probe() {
    let fixture = ConfigFixture::new();
    fixture.write_config(
        r#"
[logging]
level = "error"

[probe]
duration_ms = 30
tick_ms = 10
"#,
    );

    graceful_run_cmd()
        .args(["probe", "--config", fixture.path()])
        .assert()
        .success()
        .stdout(predicate::str::contains("probe finished"));
}

#[test]
fn test_config_init_creates_file() {
    let fixture = ConfigFixture::new();
    let target = fixture.dir().join("generated").join("config.toml");

    graceful_run_cmd()
        .args(["config", "init", "--path"])
        .arg(&target)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file created"));

    assert!(target.exists());

    graceful_run_cmd()
        .args(["config", "validate", "--config"])
        .arg(&target)
        .assert()
        .success();

    // Second init without --force refuses to overwrite
    graceful_run_cmd()
        .args(["config", "init", "--path"])
        .arg(&target)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

// ─────────────────────────────────────────────────────────────────
// Invalid Configuration Tests
// ─────────────────────────────────────────────────────────────────

#[test]
fn test_invalid_fixture() {
    graceful_run_cmd()
        .args(["config", "validate", "--config"])
        .arg(invalid_config_fixture())
        .assert()
        .code(10)
        .stderr(predicate::str::contains("E102"));
}

#[test]
fn test_malformed_toml() {
    let fixture = ConfigFixture::new();
    fixture.write_config(
        r#"
[logging
level = "info"
"#,
    );

    graceful_run_cmd()
        .args(["config", "validate", "--config", fixture.path()])
        .assert()
        .code(10)
        .stderr(predicate::str::contains("E101"));
}

#[test]
fn test_validate_nonexistent_file() {
    graceful_run_cmd()
        .args(["config", "validate", "--config", "/nonexistent/path/config.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}
