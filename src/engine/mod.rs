//! engine
//!
//! Runs a parsed workload against a lock manager: Build -> Execute -> Verify.
//!
//! # Architecture
//!
//! 1. **Build**: Create a fresh manager of the selected [`Strategy`]
//! 2. **Execute**: Dispatch every request through the [`Executor`]
//! 3. **Verify**: Optionally recount the whole lock table afterwards
//!
//! The engine never prints. Everything a caller may want to report is
//! returned in the [`RunReport`].
//!
//! # Example
//!
//! ```
//! use treelock::core::manager::Strategy;
//! use treelock::engine::{run_workload, ExecMode, RunSettings};
//! use treelock::engine::input::parse_workload;
//!
//! let workload = parse_workload("3 2 2\nroot a b\n1 a 7\n1 root 8\n").unwrap();
//! let settings = RunSettings {
//!     strategy: Strategy::Fine,
//!     mode: ExecMode::Sequential,
//!     verify: true,
//! };
//!
//! let report = run_workload(&workload, &settings).unwrap();
//! assert_eq!(report.granted(), 1);
//! assert!(report.verification.unwrap().ok);
//! ```

pub mod exec;
pub mod input;

pub use exec::{ExecError, ExecMode, Executor, Outcome};
pub use input::{parse_workload, InputError, Workload};

use std::time::{Duration, Instant};

use crate::core::manager::Strategy;
use crate::core::verify::{verify_snapshot, VerifyResult};

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
}

/// Resolved settings for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    pub strategy: Strategy,
    pub mode: ExecMode,
    /// Recount the lock table after the run.
    pub verify: bool,
}

/// Everything a run produced.
#[derive(Debug)]
pub struct RunReport {
    pub strategy: Strategy,
    pub mode: ExecMode,
    /// One outcome per request, in `seq` order
    pub outcomes: Vec<Outcome>,
    /// Present iff verification was requested
    pub verification: Option<VerifyResult>,
    /// Wall time spent executing requests
    pub elapsed: Duration,
}

impl RunReport {
    /// Number of granted requests.
    pub fn granted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.granted).count()
    }

    /// Number of refused requests.
    pub fn denied(&self) -> usize {
        self.outcomes.len() - self.granted()
    }
}

/// Errors from engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Execution failed.
    #[error("execution failed: {0}")]
    Execute(#[from] ExecError),
}

/// Run `workload` on a fresh manager.
pub fn run_workload(workload: &Workload, settings: &RunSettings) -> Result<RunReport, EngineError> {
    let manager = settings.strategy.build(workload.topology);
    let executor = Executor::new(manager, settings.mode);

    let started = Instant::now();
    let outcomes = executor.run(&workload.requests)?;
    let elapsed = started.elapsed();

    let verification = settings
        .verify
        .then(|| verify_snapshot(&workload.topology, &executor.manager().snapshot()));

    Ok(RunReport {
        strategy: settings.strategy,
        mode: settings.mode,
        outcomes,
        verification,
        elapsed,
    })
}
