//! Required environment variables
//!
//! Configuration that must come from the environment is read once at
//! startup. A missing variable is a fatal [`Error::MissingEnv`]; callers
//! report it and stop instead of continuing with a half-configured process.
//!
//! Presence is what counts: a variable set to the empty string is returned
//! as `""`.

use std::collections::HashMap;
use std::env::VarError;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::error::{Error, Result};

/// Source of environment variables.
///
/// [`ProcessEnv`] reads the real process environment. A
/// `HashMap<String, String>` can stand in for it in tests.
pub trait ReadEnv {
    fn var(&self, key: &str) -> std::result::Result<String, VarError>;
}

/// The environment of the current process
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl ReadEnv for ProcessEnv {
    fn var(&self, key: &str) -> std::result::Result<String, VarError> {
        std::env::var(key)
    }
}

impl ReadEnv for HashMap<String, String> {
    fn var(&self, key: &str) -> std::result::Result<String, VarError> {
        self.get(key).cloned().ok_or(VarError::NotPresent)
    }
}

/// Read `key` from the process environment, failing if it is unset.
pub fn required_env(key: &str) -> Result<String> {
    required_env_from(&ProcessEnv, key)
}

/// Read `key` from `env`, failing if it is unset.
pub fn required_env_from(env: &impl ReadEnv, key: &str) -> Result<String> {
    match env.var(key) {
        Ok(value) => Ok(value),
        Err(VarError::NotPresent) => Err(Error::missing_env(key)),
        Err(VarError::NotUnicode(_)) => Err(Error::invalid_env(key, "value is not valid UTF-8")),
    }
}

/// Read and parse `key` from the process environment.
pub fn required_env_parse<T>(key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    required_env_parse_from(&ProcessEnv, key)
}

/// Read and parse `key` from `env`.
pub fn required_env_parse_from<T>(env: &impl ReadEnv, key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = required_env_from(env, key)?;
    raw.parse::<T>()
        .map_err(|e| Error::invalid_env(key, format!("cannot parse {:?}: {}", raw, e)))
}

// ─────────────────────────────────────────────────────────────────
// Startup Validation
// ─────────────────────────────────────────────────────────────────

/// A set of variables that must all be present before startup continues.
///
/// Unlike calling [`required_env`] key by key, [`EnvRequirements::load`]
/// reports every missing variable in one error.
#[derive(Debug, Clone, Default)]
pub struct EnvRequirements {
    keys: Vec<String>,
}

impl EnvRequirements {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required key. Duplicates are ignored.
    pub fn require(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !self.keys.contains(&key) {
            self.keys.push(key);
        }
        self
    }

    /// Add several required keys.
    pub fn require_all<I, K>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        keys.into_iter().fold(self, |reqs, key| reqs.require(key))
    }

    /// Keys in the order they were added
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Validate against the process environment.
    pub fn load(&self) -> Result<RequiredEnv> {
        self.load_from(&ProcessEnv)
    }

    /// Validate against `env`.
    pub fn load_from(&self, env: &impl ReadEnv) -> Result<RequiredEnv> {
        let mut values = HashMap::with_capacity(self.keys.len());
        let mut missing = Vec::new();

        for key in &self.keys {
            match env.var(key) {
                Ok(value) => {
                    values.insert(key.clone(), value);
                }
                Err(VarError::NotPresent) => missing.push(key.clone()),
                Err(VarError::NotUnicode(_)) => {
                    return Err(Error::invalid_env(key.as_str(), "value is not valid UTF-8"));
                }
            }
        }

        if !missing.is_empty() {
            return Err(Error::MissingEnv { keys: missing });
        }

        debug!(count = values.len(), "Required environment variables present");
        Ok(RequiredEnv { values })
    }
}

/// Values of a validated [`EnvRequirements`] set.
#[derive(Clone, Default)]
pub struct RequiredEnv {
    values: HashMap<String, String>,
}

impl RequiredEnv {
    /// Value of a validated key. `None` only for keys that were never required.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Parse a validated key.
    pub fn parse<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        required_env_parse_from(&self.values, key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// Values are frequently secrets; only key names are printed.
impl fmt::Debug for RequiredEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<&String> = self.values.keys().collect();
        keys.sort();
        f.debug_struct("RequiredEnv").field("keys", &keys).finish()
    }
}
