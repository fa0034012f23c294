//! ui::output
//!
//! Output formatting and display.
//!
//! # Design
//!
//! Results go to stdout; diagnostics (`debug`, `warn`, `error`) go to
//! stderr so they never interleave with results. Output respects the
//! quiet flag, except results and errors which are always shown.
//! When `--json` is enabled, results are machine-readable JSON.

use std::fmt::Display;

use crate::engine::Outcome;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Debug mode - verbose output
    Debug,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if debug {
            Verbosity::Debug
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a debug message (only in debug mode).
pub fn debug(message: impl Display, verbosity: Verbosity) {
    if verbosity == Verbosity::Debug {
        eprintln!("[debug] {}", message);
    }
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Format a single result the way the line protocol expects.
pub fn format_granted(granted: bool) -> &'static str {
    if granted {
        "true"
    } else {
        "false"
    }
}

/// One `true`/`false` line per outcome, newline terminated.
pub fn format_outcomes(outcomes: &[Outcome]) -> String {
    let mut out = String::with_capacity(outcomes.len() * 6);
    for outcome in outcomes {
        out.push_str(format_granted(outcome.granted));
        out.push('\n');
    }
    out
}

/// Pretty JSON array of outcomes.
pub fn outcomes_json(outcomes: &[Outcome]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(outcomes)
}

/// Format a list of items.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}
