//! Common test utilities and fixtures

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

/// Get a command for the graceful-run binary with a clean environment
pub fn graceful_run_cmd() -> Command {
    let mut cmd = Command::cargo_bin("graceful-run").unwrap();
    cmd.env_remove("GRACEFUL_RUN_CONFIG")
        .env_remove("GRACEFUL_RUN_LOG_LEVEL")
        .env_remove("GRACEFUL_RUN_PROBE_DURATION_MS")
        .env_remove("GRACEFUL_RUN_PROBE_TICK_MS")
        .env_remove("GRACEFUL_RUN_PROBE_IGNORE_CANCEL");
    cmd
}

/// Path to the compiled binary, for tests that drive the process directly
pub fn binary_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_graceful-run"))
}

/// Get the path to the test fixtures directory
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

pub fn valid_config_fixture() -> PathBuf {
    fixtures_dir().join("valid_config.toml")
}

pub fn invalid_config_fixture() -> PathBuf {
    fixtures_dir().join("invalid_config.toml")
}

/// A configuration file in a throwaway directory
pub struct ConfigFixture {
    temp_dir: TempDir,
    config_path: PathBuf,
}

impl ConfigFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        Self {
            temp_dir,
            config_path,
        }
    }

    pub fn write_config(&self, content: &str) {
        fs::write(&self.config_path, content).unwrap();
    }

    pub fn path(&self) -> &str {
        self.config_path.to_str().unwrap()
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }
}
