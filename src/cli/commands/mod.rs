//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves flags against the loaded configuration
//! 2. Calls the engine to execute the command
//! 3. Formats and displays output
//!
//! Handlers never touch a lock manager directly.

mod check;
mod completion;
mod config_cmd;
mod run;

// Re-export command functions for testing and direct invocation
pub use check::check;
pub use completion::completion;
pub use config_cmd::{get as config_get, list as config_list, set as config_set};
pub use run::{run, RunFlags};

use std::io::Read;
use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::args::{Command, ConfigAction};
use crate::core::config::Config;
use crate::engine::{parse_workload, Context, Workload};

/// Dispatch a command to its handler.
pub fn dispatch(
    command: Command,
    ctx: &Context,
    config: &Config,
    config_path: Option<&Path>,
) -> Result<()> {
    match command {
        Command::Run {
            input,
            strategy,
            parallel,
            workers,
            json,
            verify,
        } => run::run(
            ctx,
            config,
            RunFlags {
                input: input.as_deref(),
                strategy,
                parallel,
                workers,
                json,
                verify,
            },
        ),
        Command::Check { input, format } => check::check(
            ctx,
            input.as_deref(),
            format.unwrap_or_else(|| config.output()),
        ),
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(config, &key),
            ConfigAction::Set { key, value } => {
                config_cmd::set(ctx, config, config_path, &key, &value)
            }
            ConfigAction::List => config_cmd::list(config),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Read the whole input from `path`, or stdin for `None` and `-`.
fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input file {}", path.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

/// Read and parse a workload.
fn read_workload(path: Option<&Path>) -> Result<Workload> {
    let text = read_input(path)?;
    let workload = parse_workload(&text).context("Invalid input")?;
    Ok(workload)
}
