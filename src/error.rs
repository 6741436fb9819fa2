//! Error types for graceful-run
//!
//! Provides structured error handling with:
//! - Numeric error codes for machine parsing
//! - User-friendly messages with suggestions
//! - Exit codes for CLI
//!
//! Errors produced by a unit of work are never wrapped in this type. The
//! runner only synthesizes [`Error::CancelTimeout`] (and registration
//! failures), and hands it to the caller through `E: From<Error>`.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for graceful-run operations
pub type Result<T> = std::result::Result<T, Error>;

/// Numeric error codes for machine parsing and documentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ErrorCode {
    // Configuration and environment errors (1xx)
    ConfigNotFound = 100,
    ConfigParseError = 101,
    ConfigValidation = 102,
    EnvMissing = 104,
    EnvInvalid = 105,

    // IO errors (2xx)
    IoRead = 200,
    IoWrite = 201,
    IoPermission = 202,
    IoNotFound = 203,

    // Signal handling errors (3xx)
    SignalRegistration = 300,

    // Execution errors (5xx)
    ExecutionFailed = 500,
    CancelTimeout = 501,
    ExecutionCancelled = 502,

    // Internal errors (9xx)
    InternalError = 900,
}

impl ErrorCode {
    /// Get the string code (e.g., "E501")
    pub fn as_str(&self) -> String {
        format!("E{}", *self as u16)
    }

    /// Get the exit code for CLI (maps to 1-125 range)
    pub fn exit_code(&self) -> i32 {
        match *self as u16 {
            100..=199 => 10, // Config / environment errors
            200..=299 => 20, // IO errors
            300..=399 => 30, // Signal errors
            500..=599 => 50, // Execution errors
            900..=999 => 90, // Internal errors
            _ => 1,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Main error type
#[derive(Error, Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Configuration / Environment Errors
    // ─────────────────────────────────────────────────────────────

    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    /// Configuration parse error
    #[error("Failed to parse configuration: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<toml::de::Error>,
    },

    /// Configuration validation error
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String, field: Option<String> },

    /// One or more required environment variables are not set
    #[error("{}", missing_env_message(.keys))]
    MissingEnv { keys: Vec<String> },

    /// A required environment variable is set but unusable
    #[error("Environment variable {key} is invalid: {message}")]
    InvalidEnv { key: String, message: String },

    // ─────────────────────────────────────────────────────────────
    // IO Errors
    // ─────────────────────────────────────────────────────────────

    /// File read error
    #[error("Failed to read file: {path}")]
    IoRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File write error
    #[error("Failed to write file: {path}")]
    IoWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML serialization error
    #[error("TOML serialization error: {0}")]
    Toml(#[from] toml::ser::Error),

    // ─────────────────────────────────────────────────────────────
    // Signal Errors
    // ─────────────────────────────────────────────────────────────

    /// The termination signal listener could not be installed
    #[error("Failed to register {signal} handler")]
    SignalRegistration {
        signal: &'static str,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────
    // Execution Errors
    // ─────────────────────────────────────────────────────────────

    /// Cancellation was requested but the run did not finish in time
    #[error("Timed out after {}s waiting for cancelled run to finish", .grace.as_secs())]
    CancelTimeout { grace: Duration },

    /// The unit of work stopped because it was cancelled
    #[error("Run cancelled: {reason}")]
    Cancelled { reason: String },

    /// The unit of work failed
    #[error("Run failed: {0}")]
    Execution(String),

    // ─────────────────────────────────────────────────────────────
    // Internal Errors
    // ─────────────────────────────────────────────────────────────

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    // ─────────────────────────────────────────────────────────────
    // Error Classification
    // ─────────────────────────────────────────────────────────────

    /// Get the numeric error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ConfigNotFound { .. } => ErrorCode::ConfigNotFound,
            Error::ConfigParse { .. } => ErrorCode::ConfigParseError,
            Error::ConfigValidation { .. } => ErrorCode::ConfigValidation,
            Error::MissingEnv { .. } => ErrorCode::EnvMissing,
            Error::InvalidEnv { .. } => ErrorCode::EnvInvalid,

            Error::IoRead { .. } => ErrorCode::IoRead,
            Error::IoWrite { .. } => ErrorCode::IoWrite,
            Error::Io(e) => match e.kind() {
                std::io::ErrorKind::NotFound => ErrorCode::IoNotFound,
                std::io::ErrorKind::PermissionDenied => ErrorCode::IoPermission,
                _ => ErrorCode::IoRead,
            },
            Error::Toml(_) => ErrorCode::ConfigParseError,

            Error::SignalRegistration { .. } => ErrorCode::SignalRegistration,

            Error::CancelTimeout { .. } => ErrorCode::CancelTimeout,
            Error::Cancelled { .. } => ErrorCode::ExecutionCancelled,
            Error::Execution(_) => ErrorCode::ExecutionFailed,

            Error::Internal(_) => ErrorCode::InternalError,
        }
    }

    /// Check if the error is fatal (the process should not start or continue)
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConfigNotFound { .. }
                | Error::ConfigParse { .. }
                | Error::ConfigValidation { .. }
                | Error::MissingEnv { .. }
                | Error::InvalidEnv { .. }
                | Error::SignalRegistration { .. }
                | Error::Internal(_)
        )
    }

    /// Whether this is the runner's grace-period timeout
    pub fn is_cancel_timeout(&self) -> bool {
        matches!(self, Error::CancelTimeout { .. })
    }

    /// Get the exit code for CLI
    pub fn exit_code(&self) -> i32 {
        self.code().exit_code()
    }

    // ─────────────────────────────────────────────────────────────
    // User-Friendly Messages
    // ─────────────────────────────────────────────────────────────

    /// Get a user-friendly suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            Error::ConfigNotFound { .. } => Some(
                "Run 'graceful-run config init' to create a default configuration file."
            ),
            Error::ConfigParse { .. } => Some(
                "Check your configuration file syntax. Run 'graceful-run config validate' to see details."
            ),
            Error::ConfigValidation { .. } => Some(
                "Review the configuration file and fix the invalid values."
            ),
            Error::MissingEnv { .. } => Some(
                "Export the listed variables before starting the process."
            ),
            Error::InvalidEnv { .. } => Some(
                "Fix the variable's value; it is set but could not be used."
            ),
            Error::SignalRegistration { .. } => Some(
                "The process could not install signal handlers. Check that signals are not blocked by the parent."
            ),
            Error::CancelTimeout { .. } => Some(
                "The work ignored cancellation. Make it observe its cancellation token, or finish faster."
            ),
            _ => None,
        }
    }

    /// Format the error for terminal display with colors
    pub fn format_for_terminal(&self) -> String {
        let code = self.code();
        let suggestion = self.suggestion();

        let mut output = format!(
            "\x1b[31mError [{}]\x1b[0m: {}\n",
            code.as_str(),
            self
        );

        if let Some(hint) = suggestion {
            output.push_str(&format!("\n\x1b[33mHint\x1b[0m: {}\n", hint));
        }

        output
    }

    /// Format the error for logging (no colors)
    pub fn format_for_log(&self) -> String {
        format!("[{}] {}", self.code().as_str(), self)
    }
}

fn missing_env_message(keys: &[String]) -> String {
    let verb = if keys.len() == 1 { "variable is" } else { "variables are" };
    format!("Required environment {} not set: {}", verb, keys.join(", "))
}

// ─────────────────────────────────────────────────────────────────
// Error Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    /// Create a config parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Error::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create a config validation error with field name
    pub fn config_field_invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Error::ConfigValidation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a missing environment variable error for one key
    pub fn missing_env(key: impl Into<String>) -> Self {
        Error::MissingEnv {
            keys: vec![key.into()],
        }
    }

    /// Create an invalid environment variable error
    pub fn invalid_env(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::InvalidEnv {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Create a cancelled error
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Error::Cancelled {
            reason: reason.into(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
