//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//! - `--config <path>`: Use this config file instead of the default search

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::core::config::OutputFormat;
use crate::core::manager::Strategy;

/// treelock - Hierarchical lock manager for m-ary resource trees
#[derive(Parser, Debug)]
#[command(name = "treelock")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file to use instead of the default locations
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a workload and print one result per request
    #[command(
        name = "run",
        long_about = "Execute a workload against a fresh lock tree.\n\n\
            The input starts with `N m Q`, followed by the N node names in \
            level order and Q requests of the form `op name uid`, where op is \
            1 (lock), 2 (unlock) or 3 (upgrade). One `true` or `false` line is \
            printed per request, in input order.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Run a workload file
    treelock run workload.txt

    # Read from stdin
    cat workload.txt | treelock run

    # Concurrent execution on 8 workers, then recount every node
    treelock run workload.txt --parallel --workers 8 --verify

    # Compare against the single-mutex manager
    treelock run workload.txt --strategy coarse

    # Machine-readable outcomes
    treelock run workload.txt --json"
    )]
    Run {
        /// Workload file (reads stdin when omitted or `-`)
        input: Option<PathBuf>,

        /// Lock manager implementation
        #[arg(long, value_name = "fine|coarse")]
        strategy: Option<Strategy>,

        /// Run requests on disjoint paths concurrently (outcomes match a sequential run)
        #[arg(long)]
        parallel: bool,

        /// Worker threads for --parallel
        #[arg(long, value_name = "N")]
        workers: Option<usize>,

        /// Print outcomes as JSON
        #[arg(long)]
        json: bool,

        /// Recount the lock table after the run and fail on any violation
        #[arg(long)]
        verify: bool,
    },

    /// Validate a workload without running it
    #[command(
        name = "check",
        after_help = "\
WORKFLOW EXAMPLES:
    # Validate a file and print a summary of the tree and requests
    treelock check workload.txt"
    )]
    Check {
        /// Workload file (reads stdin when omitted or `-`)
        input: Option<PathBuf>,

        /// Summary format
        #[arg(long, value_name = "text|json")]
        format: Option<OutputFormat>,
    },

    /// Get, set, or list configuration values
    #[command(
        name = "config",
        after_help = "\
WORKFLOW EXAMPLES:
    # Make the single-mutex manager the default
    treelock config set strategy coarse

    # Always verify after a run
    treelock config set verify true

    # Show every key with its effective value
    treelock config list"
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell. Add the output \
            to your shell's configuration to enable tab-completion for treelock commands.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    treelock completion bash >> ~/.bashrc

    # Zsh (add to ~/.zshrc)
    treelock completion zsh >> ~/.zshrc

    # Fish
    treelock completion fish > ~/.config/fish/completions/treelock.fish

    # PowerShell
    treelock completion powershell >> $PROFILE"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Value to set
        value: String,
    },
    /// List all configuration values
    List,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
