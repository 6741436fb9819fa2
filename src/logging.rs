//! tracing-subscriber setup for the binary
//!
//! Events go to stderr so stdout stays free for command output (the probe's
//! `probe running` line in particular). An optional rolling log file gets
//! the same events without ANSI colors. `RUST_LOG` directives refine the
//! configured level per module.

use std::fs;
use std::path::Path;

use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

use graceful_run::error::{Error, Result};

use crate::config::LoggingSettings;

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

/// Keeps the file writer's background thread alive. Dropping it flushes.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_settings(settings: &LoggingSettings) -> Self {
        if settings.json_format {
            LogFormat::Json
        } else {
            LogFormat::Compact
        }
    }
}

/// Install the global subscriber for long-running commands.
pub fn init_logging(settings: &LoggingSettings, verbose: u8, quiet: bool) -> Result<LogGuard> {
    let level = effective_level(&settings.level, verbose, quiet);
    let format = LogFormat::from_settings(settings);

    let (file_layer, file_guard) = match settings.file.as_deref() {
        Some(path) => {
            let (writer, guard) = rolling_writer(path, settings.max_file_size_mb, settings.max_files)?;
            (Some(event_layer(format, writer, false)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter_for(level))
        .with(event_layer(format, std::io::stderr, true))
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Internal(format!("Failed to initialize logging: {}", e)))?;

    tracing::debug!(%level, file = ?settings.file, ?format, "Logging initialized");
    Ok(LogGuard { _file: file_guard })
}

/// Install a stderr-only subscriber for short commands.
pub fn init_simple(level: Level) -> Result<()> {
    tracing_subscriber::registry()
        .with(filter_for(level))
        .with(event_layer(LogFormat::Compact, std::io::stderr, true))
        .try_init()
        .map_err(|e| Error::Internal(format!("Failed to initialize logging: {}", e)))
}

/// `-q` wins over everything, then `-v`/`-vv`, then the configured level.
fn effective_level(configured: &str, verbose: u8, quiet: bool) -> Level {
    match (quiet, verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => configured.parse().unwrap_or(Level::INFO),
        (false, 1) => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Level for commands without a config file: warnings unless asked.
pub fn cli_level(verbose: u8, quiet: bool) -> Level {
    effective_level("warn", verbose, quiet)
}

fn filter_for(level: Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy()
}

fn event_layer<S, W>(format: LogFormat, writer: W, ansi: bool) -> BoxedLayer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true);

    match format {
        LogFormat::Json => layer.json().with_current_span(true).boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}

/// Non-blocking writer over a rotating file next to `path`.
///
/// tracing-appender rotates on time, not size; a small size budget maps to
/// hourly files and anything else to daily ones.
fn rolling_writer(
    path: &str,
    max_size_mb: u64,
    max_files: u32,
) -> Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    let path = Path::new(path);
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));

    fs::create_dir_all(dir).map_err(|e| Error::IoWrite {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let prefix = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("graceful-run");
    let rotation = match max_size_mb {
        1..=9 => Rotation::HOURLY,
        _ => Rotation::DAILY,
    };

    let appender = RollingFileAppender::builder()
        .rotation(rotation)
        .filename_prefix(prefix)
        .filename_suffix("log")
        .max_log_files(max_files as usize)
        .build(dir)
        .map_err(|e| Error::Internal(format!("Failed to open log file in {}: {}", dir.display(), e)))?;

    Ok(tracing_appender::non_blocking(appender))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_effective_level() {
        assert_eq!(effective_level("debug", 0, false), Level::DEBUG);
        assert_eq!(effective_level("WARN", 0, false), Level::WARN);
        assert_eq!(effective_level("chatty", 0, false), Level::INFO);
        assert_eq!(effective_level("error", 1, false), Level::DEBUG);
        assert_eq!(effective_level("error", 4, false), Level::TRACE);
        assert_eq!(effective_level("trace", 2, true), Level::ERROR);
    }

    #[test]
    fn test_cli_level_defaults_to_warn() {
        assert_eq!(cli_level(0, false), Level::WARN);
        assert_eq!(cli_level(1, false), Level::DEBUG);
        assert_eq!(cli_level(0, true), Level::ERROR);
    }

    #[test]
    fn test_format_from_settings() {
        let mut settings = LoggingSettings::default();
        assert_eq!(LogFormat::from_settings(&settings), LogFormat::Compact);

        settings.json_format = true;
        assert_eq!(LogFormat::from_settings(&settings), LogFormat::Json);
    }

    #[test]
    fn test_rolling_writer_creates_directory() {
        let temp_dir = TempDir::new().unwrap();
        let log_path = temp_dir.path().join("logs").join("run.log");

        let (_writer, _guard) = rolling_writer(log_path.to_str().unwrap(), 50, 3).unwrap();
        assert!(temp_dir.path().join("logs").is_dir());
    }
}
