//! Configuration for the graceful-run binary
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (GRACEFUL_RUN_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use graceful_run::error::{Error, Result};
use graceful_run::{ProcessEnv, ReadEnv};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Logging configuration
    pub logging: LoggingSettings,

    /// Diagnostic probe defaults
    pub probe: ProbeSettings,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Maximum log file size in MB before rotation
    pub max_file_size_mb: u64,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

/// Probe settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    /// How long the probe works before finishing (0 = until cancelled)
    pub duration_ms: u64,

    /// Interval between progress ticks
    pub tick_ms: u64,

    /// Keep working after cancellation is requested
    pub ignore_cancel: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            max_file_size_mb: 50,
            max_files: 5,
            json_format: false,
        }
    }
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            duration_ms: 0,
            tick_ms: 1000,
            ignore_cancel: false,
        }
    }
}

const VALID_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl AppConfig {
    /// Load configuration from file with environment variable overrides.
    ///
    /// Not validated: callers apply their own overrides first, then call
    /// [`AppConfig::validate`].
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(path) = Self::find_config_file(config_path)? {
            debug!(path = %path.display(), "Loading configuration file");
            config = Self::from_file(&path)?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        config.apply_env_overrides();
        config.expand_paths();

        Ok(config)
    }

    /// Parse a configuration file without overrides or validation
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::IoRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| Error::ConfigParse {
            message: format!("{}: {}", path.display(), e.message()),
            source: Some(e),
        })
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        // An explicit path must exist
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            if path.exists() {
                return Ok(Some(path));
            }
            return Err(Error::ConfigNotFound { path });
        }

        let search_paths = [
            PathBuf::from("graceful-run.toml"),
            dirs::config_dir()
                .map(|p| p.join("graceful-run").join("config.toml"))
                .unwrap_or_default(),
            dirs::home_dir()
                .map(|p| p.join(".graceful-run").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &search_paths {
            if !path.as_os_str().is_empty() && path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_from(&ProcessEnv);
    }

    fn apply_env_overrides_from(&mut self, env: &impl ReadEnv) {
        // Logging settings
        if let Ok(val) = env.var("GRACEFUL_RUN_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = env.var("GRACEFUL_RUN_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = env.var("GRACEFUL_RUN_LOG_JSON") {
            self.logging.json_format = parse_flag(&val);
        }

        // Probe settings
        if let Ok(val) = env.var("GRACEFUL_RUN_PROBE_DURATION_MS") {
            if let Ok(n) = val.parse() {
                self.probe.duration_ms = n;
            }
        }
        if let Ok(val) = env.var("GRACEFUL_RUN_PROBE_TICK_MS") {
            if let Ok(n) = val.parse() {
                self.probe.tick_ms = n;
            }
        }
        if let Ok(val) = env.var("GRACEFUL_RUN_PROBE_IGNORE_CANCEL") {
            self.probe.ignore_cancel = parse_flag(&val);
        }
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !VALID_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    VALID_LEVELS.join(", ")
                ),
            ));
        }

        if self.logging.max_files == 0 {
            return Err(Error::config_field_invalid(
                "logging.max_files",
                "max_files must be at least 1",
            ));
        }

        if self.probe.tick_ms == 0 {
            return Err(Error::config_field_invalid(
                "probe.tick_ms",
                "tick_ms must be greater than 0",
            ));
        }

        Ok(())
    }
}

fn parse_flag(val: &str) -> bool {
    val.eq_ignore_ascii_case("true") || val == "1"
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or(std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Default location for `config init`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("graceful-run")
        .join("config.toml")
}

/// Initialize a new configuration file, returning where it was written
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(default_config_path);

    if config_path.exists() && !force {
        return Err(Error::config_field_invalid(
            "path",
            format!(
                "Configuration file already exists: {}. Use --force to overwrite.",
                config_path.display()
            ),
        ));
    }

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::IoWrite {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    fs::write(&config_path, generate_default_config()).map_err(|e| Error::IoWrite {
        path: config_path.clone(),
        source: e,
    })?;

    Ok(config_path)
}

/// Generate default configuration content with comments
fn generate_default_config() -> String {
    r#"# graceful-run configuration

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (omit for console only)
# file = "~/.graceful-run/logs/graceful-run.log"

# Maximum log file size in MB before rotation
max_file_size_mb = 50

# Number of rotated log files to keep
max_files = 5

# Enable JSON formatted logging
json_format = false

[probe]
# How long the probe works before finishing (0 = until cancelled)
duration_ms = 0

# Interval between progress ticks
tick_ms = 1000

# Keep working after cancellation is requested (exercises the grace timeout)
ignore_cancel = false
"#
    .to_string()
}
