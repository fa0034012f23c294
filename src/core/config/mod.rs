//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. CLI flags (not handled here)
//!
//! # Locations
//!
//! Searched in order:
//! 1. An explicit path (the `--config` flag)
//! 2. `$TREELOCK_CONFIG` if set
//! 3. `$XDG_CONFIG_HOME/treelock/config.toml`
//! 4. `~/.treelock/config.toml` (canonical write location)
//!
//! An explicit path that does not exist is an error. A `$TREELOCK_CONFIG`
//! pointing at a missing file produces a warning and the search continues.
//!
//! # Example
//!
//! ```no_run
//! use treelock::core::config::Config;
//!
//! let result = Config::load(None).unwrap();
//! let config = result.config;
//!
//! println!("Strategy: {}", config.strategy());
//! println!("Workers: {}", config.workers());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, OutputFormat, MAX_WORKERS};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::manager::Strategy;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "TREELOCK_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("unknown config key '{0}' (valid keys: strategy, parallel, workers, verify, output)")]
    UnknownKey(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Loaded configuration with defaults applied by the accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Path to the global config file (if loaded)
    global_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration, preferring `explicit` over the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated, or if `explicit` names a file that does not exist.
    /// Missing default files are not an error (defaults are used).
    pub fn load(explicit: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let (global, global_path) = match explicit {
            Some(path) => (Self::read_global_config(path)?, Some(path.to_path_buf())),
            None => Self::load_global(&mut warnings)?,
        };

        global.validate()?;

        Ok(ConfigLoadResult {
            config: Config {
                global,
                global_path,
            },
            warnings,
        })
    }

    /// Load global configuration from standard locations.
    fn load_global(
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        // 1. Check $TREELOCK_CONFIG
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_global_config(&path)?;
                return Ok((config, Some(path)));
            }
            warnings.push(ConfigWarning {
                message: format!("{} points to a missing file, ignoring it", CONFIG_ENV),
                path,
            });
        }

        // 2. Check $XDG_CONFIG_HOME/treelock/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("treelock/config.toml");
            if path.exists() {
                let config = Self::read_global_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 3. Check ~/.treelock/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".treelock/config.toml");
            if path.exists() {
                let config = Self::read_global_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((GlobalConfig::default(), None))
    }

    /// Read and parse a global config file.
    fn read_global_config(path: &Path) -> Result<GlobalConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Get the canonical path for global config.
    ///
    /// Returns `~/.treelock/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".treelock/config.toml"))
    }

    /// Write global config atomically to the canonical location.
    pub fn write_global(config: &GlobalConfig) -> Result<PathBuf, ConfigError> {
        let path = Self::global_config_path()?;
        Self::write_to(&path, config)?;
        Ok(path)
    }

    /// Write global config atomically to `path`.
    ///
    /// Creates parent directories if needed.
    pub fn write_to(path: &Path, config: &GlobalConfig) -> Result<(), ConfigError> {
        config.validate()?;
        Self::write_config_atomic(path, config)
    }

    fn write_config_atomic<T: serde::Serialize>(
        path: &Path,
        config: &T,
    ) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        // Temp file in the same directory so the rename stays on one filesystem
        let temp_path = path.with_extension("toml.tmp");
        let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        file.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        file.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Get the lock manager strategy.
    ///
    /// Defaults to [`Strategy::Fine`].
    pub fn strategy(&self) -> Strategy {
        self.global.strategy.unwrap_or_default()
    }

    /// Check if requests run concurrently by default.
    ///
    /// Defaults to `false`.
    pub fn parallel(&self) -> bool {
        self.global.parallel.unwrap_or(false)
    }

    /// Get the worker count for parallel runs.
    ///
    /// Defaults to the available parallelism of the machine.
    pub fn workers(&self) -> usize {
        self.global.workers.unwrap_or_else(default_workers)
    }

    /// Check if invariants are verified after every run.
    ///
    /// Defaults to `false`.
    pub fn verify(&self) -> bool {
        self.global.verify.unwrap_or(false)
    }

    /// Get the output format.
    ///
    /// Defaults to [`OutputFormat::Text`].
    pub fn output(&self) -> OutputFormat {
        self.global.output.unwrap_or_default()
    }

    /// Get the path the global config was loaded from (if any).
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }
}

impl From<GlobalConfig> for Config {
    fn from(global: GlobalConfig) -> Self {
        Self {
            global,
            global_path: None,
        }
    }
}

/// Available parallelism, clamped to `1..=MAX_WORKERS`.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .min(MAX_WORKERS)
}
