//! core::verify
//!
//! Full-tree verification of lock-table invariants.
//!
//! # Checks
//!
//! - **Exact counts**: every node's `locked_descendants` equals the number
//!   of owned nodes in its strict subtree, recounted from scratch
//! - **Path exclusivity**: no owned node has an owned ancestor
//!
//! # Invariants
//!
//! - Never mutates the lock table
//! - Must be deterministic: nesting errors first, then count errors, each
//!   in node id order

use thiserror::Error;

use super::manager::Snapshot;
use super::topology::Topology;
use super::types::{NodeId, OwnerId};

/// Errors from verification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("snapshot covers {actual} nodes, tree has {expected}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("node {node} records {recorded} locked descendants, found {actual}")]
    CountMismatch {
        node: NodeId,
        recorded: usize,
        actual: usize,
    },

    #[error("node {node} (owner {owner}) is below owned ancestor {ancestor} (owner {ancestor_owner})")]
    NestedOwners {
        node: NodeId,
        owner: OwnerId,
        ancestor: NodeId,
        ancestor_owner: OwnerId,
    },
}

/// Result of verification.
#[derive(Debug)]
pub struct VerifyResult {
    /// Whether verification passed
    pub ok: bool,
    /// Errors found during verification
    pub errors: Vec<VerifyError>,
}

impl VerifyResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: vec![],
        }
    }

    /// Create a failed result with errors.
    pub fn failure(errors: Vec<VerifyError>) -> Self {
        Self { ok: false, errors }
    }
}

/// Recount the whole tree and compare it against `snapshot`.
///
/// Runs in `O(N * depth)`.
pub fn verify_snapshot(topology: &Topology, snapshot: &Snapshot) -> VerifyResult {
    let node_count = topology.node_count();
    if snapshot.len() != node_count {
        return VerifyResult::failure(vec![VerifyError::SizeMismatch {
            expected: node_count,
            actual: snapshot.len(),
        }]);
    }

    let mut errors = Vec::new();
    let mut actual = vec![0usize; node_count];

    for (node, owner) in snapshot.owned() {
        for ancestor in topology.ancestors(node) {
            actual[ancestor.index()] += 1;
            if let Some(ancestor_owner) = snapshot.owner(ancestor) {
                errors.push(VerifyError::NestedOwners {
                    node,
                    owner,
                    ancestor,
                    ancestor_owner,
                });
            }
        }
    }

    for (node, state) in snapshot.iter() {
        let count = actual[node.index()];
        if state.locked_descendants != count {
            errors.push(VerifyError::CountMismatch {
                node,
                recorded: state.locked_descendants,
                actual: count,
            });
        }
    }

    if errors.is_empty() {
        VerifyResult::success()
    } else {
        VerifyResult::failure(errors)
    }
}
