//! engine::exec
//!
//! Drives a [`LockManager`] over a request sequence.
//!
//! # Modes
//!
//! - [`ExecMode::Sequential`]: one request at a time, in input order
//! - [`ExecMode::Parallel`]: the sequence is cut into waves of consecutive
//!   requests whose nodes are pairwise incomparable (no two on one
//!   root-to-leaf path). Each wave runs on tokio's blocking pool, sharing the
//!   manager through `Arc`, and is joined before the next wave starts.
//!
//! Requests on incomparable nodes commute, so a parallel run grants exactly
//! what a sequential run grants. Requests on one path keep issue order.
//!
//! # Invariants
//!
//! - Outcomes are returned sorted by `seq`, whatever the completion order
//! - Sequential and parallel runs over either manager yield identical outcomes
//! - The first misuse fault (by `seq`) aborts the run with an [`ExecError`]

use std::collections::HashSet;
use std::ops::Range;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::core::manager::{LockManager, ManagerError, OpKind, Request};
use crate::core::topology::Topology;
use crate::core::types::{NodeId, OwnerId};

/// Errors from execution.
#[derive(Debug, Error)]
pub enum ExecError {
    /// A request was rejected as misuse.
    #[error("request {seq} failed: {source}")]
    Manager { seq: usize, source: ManagerError },

    /// The async runtime could not be started.
    #[error("failed to start runtime: {0}")]
    Runtime(#[from] std::io::Error),

    /// A request task panicked or was cancelled.
    #[error("request {seq} did not complete: {message}")]
    TaskFailed { seq: usize, message: String },
}

/// How requests are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// In order, on the calling thread.
    Sequential,
    /// Concurrently on up to `workers` threads, in dependency-ordered waves.
    Parallel { workers: usize },
}

impl ExecMode {
    /// Short label for diagnostics.
    pub fn describe(&self) -> String {
        match self {
            ExecMode::Sequential => "sequential".to_string(),
            ExecMode::Parallel { workers } => format!("parallel ({} workers)", workers),
        }
    }
}

/// Result of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub seq: usize,
    pub kind: OpKind,
    pub node: NodeId,
    pub owner: OwnerId,
    pub granted: bool,
}

impl Outcome {
    fn new(request: &Request, granted: bool) -> Self {
        Self {
            seq: request.seq,
            kind: request.kind,
            node: request.node,
            owner: request.owner,
            granted,
        }
    }
}

/// Request dispatcher bound to one manager.
pub struct Executor {
    manager: Arc<dyn LockManager>,
    mode: ExecMode,
}

impl Executor {
    /// Create an executor.
    pub fn new(manager: Arc<dyn LockManager>, mode: ExecMode) -> Self {
        Self { manager, mode }
    }

    /// The manager requests are applied to.
    pub fn manager(&self) -> &Arc<dyn LockManager> {
        &self.manager
    }

    /// Apply every request and collect the outcomes in `seq` order.
    pub fn run(&self, requests: &[Request]) -> Result<Vec<Outcome>, ExecError> {
        match self.mode {
            ExecMode::Sequential => self.run_sequential(requests),
            ExecMode::Parallel { workers } => self.run_parallel(requests, workers.max(1)),
        }
    }

    fn run_sequential(&self, requests: &[Request]) -> Result<Vec<Outcome>, ExecError> {
        let mut outcomes = Vec::with_capacity(requests.len());
        for request in requests {
            let granted = self
                .manager
                .apply(request)
                .map_err(|source| ExecError::Manager {
                    seq: request.seq,
                    source,
                })?;
            outcomes.push(Outcome::new(request, granted));
        }
        outcomes.sort_by_key(|o| o.seq);
        Ok(outcomes)
    }

    fn run_parallel(&self, requests: &[Request], workers: usize) -> Result<Vec<Outcome>, ExecError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .max_blocking_threads(workers)
            .thread_name("treelock-worker")
            .build()?;

        let mut outcomes = Vec::with_capacity(requests.len());
        for wave in waves(self.manager.topology(), requests) {
            let handles: Vec<_> = requests[wave]
                .iter()
                .map(|request| {
                    let manager = Arc::clone(&self.manager);
                    let request = *request;
                    let handle = runtime.spawn_blocking(move || manager.apply(&request));
                    (request, handle)
                })
                .collect();

            let results = runtime.block_on(async move {
                let mut results = Vec::with_capacity(handles.len());
                for (request, handle) in handles {
                    results.push((request, handle.await));
                }
                results
            });

            for (request, joined) in results {
                let applied = joined.map_err(|e| ExecError::TaskFailed {
                    seq: request.seq,
                    message: e.to_string(),
                })?;
                let granted = applied.map_err(|source| ExecError::Manager {
                    seq: request.seq,
                    source,
                })?;
                outcomes.push(Outcome::new(&request, granted));
            }
        }
        outcomes.sort_by_key(|o| o.seq);
        Ok(outcomes)
    }
}

/// Cut `requests` into consecutive index ranges whose nodes are pairwise
/// incomparable.
///
/// A request starts a new wave when its node is already in the wave, lies on
/// the path above a node in the wave, or has a node in the wave above it.
fn waves(topology: &Topology, requests: &[Request]) -> Vec<Range<usize>> {
    let mut waves = Vec::new();
    let mut start = 0;
    let mut claimed: HashSet<NodeId> = HashSet::new();
    let mut covered: HashSet<NodeId> = HashSet::new();

    for (i, request) in requests.iter().enumerate() {
        let node = request.node;
        let conflicts = claimed.contains(&node)
            || covered.contains(&node)
            || topology.ancestors(node).any(|a| claimed.contains(&a));
        if conflicts {
            waves.push(start..i);
            start = i;
            claimed.clear();
            covered.clear();
        }

        claimed.insert(node);
        // Once an ancestor is covered, so is everything above it.
        for ancestor in topology.ancestors(node) {
            if !covered.insert(ancestor) {
                break;
            }
        }
    }

    if start < requests.len() {
        waves.push(start..requests.len());
    }
    waves
}
