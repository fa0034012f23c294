//! config command - Get, set, or list configuration values

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::core::config::{Config, GlobalConfig};
use crate::engine::Context;
use crate::ui::output::{self, Verbosity};

/// Effective value of `key`, with defaults applied.
fn effective(config: &Config, key: &str) -> Result<String> {
    // Rejects unknown keys before the defaults below are consulted.
    config.global.get(key)?;

    let value = match key {
        "strategy" => config.strategy().to_string(),
        "parallel" => config.parallel().to_string(),
        "workers" => config.workers().to_string(),
        "verify" => config.verify().to_string(),
        _ => config.output().to_string(),
    };
    Ok(value)
}

/// Get a configuration value.
pub fn get(config: &Config, key: &str) -> Result<()> {
    println!("{}", effective(config, key)?);
    Ok(())
}

/// Where `set` writes: the explicit or loaded file, else the canonical path.
fn target_path(config: &Config, explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit.or_else(|| config.global_config_loaded_from()) {
        return Ok(path.to_path_buf());
    }
    Config::global_config_path().context("Failed to locate config file")
}

/// Set a configuration value.
pub fn set(
    ctx: &Context,
    config: &Config,
    explicit: Option<&Path>,
    key: &str,
    value: &str,
) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);

    let mut global: GlobalConfig = config.global.clone();
    global.set(key, value)?;

    let path = target_path(config, explicit)?;
    Config::write_to(&path, &global)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    output::debug(format!("wrote {}", path.display()), verbosity);
    output::print(format!("Set {} = {}", key, value), verbosity);
    Ok(())
}

/// List all configuration values.
pub fn list(config: &Config) -> Result<()> {
    match config.global_config_loaded_from() {
        Some(path) => println!("# Configuration ({})", path.display()),
        None => println!("# Configuration (defaults)"),
    }

    for key in GlobalConfig::KEYS {
        let value = effective(config, key)?;
        if config.global.get(key)?.is_some() {
            println!("{} = {}", key, value);
        } else {
            println!("{} = {} (default)", key, value);
        }
    }

    Ok(())
}
