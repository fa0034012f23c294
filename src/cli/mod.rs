//! cli
//!
//! Command-line interface layer for treelock.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and report config warnings
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to the
//! [`crate::engine`] for execution. Configuration provides defaults; flags
//! always take precedence.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use crate::core::config::Config;
use crate::engine;
use crate::ui::output::{self, Verbosity};
use anyhow::{Context as _, Result};

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let ctx = engine::Context {
        debug: cli.debug,
        quiet: cli.quiet,
    };
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);

    let loaded = Config::load(cli.config.as_deref()).context("Failed to load config")?;
    for warning in &loaded.warnings {
        output::warn(
            format!("{} ({})", warning.message, warning.path.display()),
            verbosity,
        );
    }
    if let Some(path) = loaded.config.global_config_loaded_from() {
        output::debug(format!("config: {}", path.display()), verbosity);
    }

    commands::dispatch(cli.command, &ctx, &loaded.config, cli.config.as_deref())
}
