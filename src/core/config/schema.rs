//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Location
//!
//! Searched in order:
//! 1. `--config <path>` if given
//! 2. `$TREELOCK_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/treelock/config.toml`
//! 4. `~/.treelock/config.toml` (canonical write location)
//!
//! # Validation
//!
//! Config values are validated after parsing (e.g., `workers` must be in
//! `1..=MAX_WORKERS`). Unknown keys are rejected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::manager::Strategy;

/// Upper bound for the parallel executor's worker count.
pub const MAX_WORKERS: usize = 1024;

/// How `run` reports results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One `true`/`false` line per request
    #[default]
    Text,
    /// A JSON document with every outcome
    Json,
}

impl OutputFormat {
    /// Valid spellings.
    pub const NAMES: &'static [&'static str] = &["text", "json"];

    /// Lowercase format name.
    pub fn as_str(self) -> &'static str {
        match self {
            OutputFormat::Text => "text",
            OutputFormat::Json => "json",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!(
                "invalid output format '{}', must be one of: {}",
                other,
                Self::NAMES.join(", ")
            )),
        }
    }
}

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// strategy = "fine"
/// parallel = true
/// workers = 8
/// verify = false
/// output = "text"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Lock manager synchronization discipline
    pub strategy: Option<Strategy>,

    /// Run requests concurrently by default
    pub parallel: Option<bool>,

    /// Worker threads for parallel runs
    pub workers: Option<usize>,

    /// Verify invariants after every run
    pub verify: Option<bool>,

    /// Result format
    pub output: Option<OutputFormat>,
}

impl GlobalConfig {
    /// Keys accepted by [`get`](Self::get) and [`set`](Self::set).
    pub const KEYS: &'static [&'static str] =
        &["strategy", "parallel", "workers", "verify", "output"];

    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(workers) = self.workers {
            if workers == 0 || workers > MAX_WORKERS {
                return Err(ConfigError::InvalidValue(format!(
                    "workers must be between 1 and {}, got {}",
                    MAX_WORKERS, workers
                )));
            }
        }
        Ok(())
    }

    /// Get the explicitly configured value of `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::UnknownKey` for keys outside [`KEYS`](Self::KEYS).
    pub fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        let value = match key {
            "strategy" => self.strategy.map(|s| s.to_string()),
            "parallel" => self.parallel.map(|b| b.to_string()),
            "workers" => self.workers.map(|w| w.to_string()),
            "verify" => self.verify.map(|b| b.to_string()),
            "output" => self.output.map(|o| o.to_string()),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        };
        Ok(value)
    }

    /// Parse and store `value` under `key`.
    ///
    /// # Errors
    ///
    /// - `ConfigError::UnknownKey` for keys outside [`KEYS`](Self::KEYS)
    /// - `ConfigError::InvalidValue` if the value does not parse or fails
    ///   validation
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "strategy" => self.strategy = Some(parse_value(key, value)?),
            "parallel" => self.parallel = Some(parse_value(key, value)?),
            "workers" => self.workers = Some(parse_value(key, value)?),
            "verify" => self.verify = Some(parse_value(key, value)?),
            "output" => self.output = Some(parse_value(key, value)?),
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        self.validate()
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value
        .parse()
        .map_err(|e| ConfigError::InvalidValue(format!("{}: {}", key, e)))
}
