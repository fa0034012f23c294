//! core::manager
//!
//! Hierarchical lock managers over a [`Topology`].
//!
//! # Modules
//!
//! - [`protocol`] - Precondition checks, subtree scan and commits shared by
//!   every manager
//! - [`coarse`] - One mutex over the whole lock table
//! - [`fine`] - One mutex per node with ordered, path-scoped acquisition
//!
//! # Operations
//!
//! - `lock(v, u)`: succeeds iff `v`, its ancestors and its descendants are
//!   all unowned; then `v` is owned by `u`
//! - `unlock(v, u)`: succeeds iff `v` is owned by `u`
//! - `upgrade(v, u)`: succeeds iff `v` and its ancestors are unowned, `v`
//!   has at least one owned descendant, and every owned descendant belongs
//!   to `u`; then all those descendants are released and `v` is owned by `u`
//!
//! # Invariants
//!
//! Between operations:
//! - `locked_descendants` of every node equals the number of owned nodes in
//!   its strict subtree
//! - No two nodes on one root-to-leaf path are owned at the same time
//!
//! # Errors
//!
//! A refused operation is `Ok(false)`. `Err` is reserved for misuse, i.e. a
//! node id outside the tree.

pub mod coarse;
pub mod fine;
pub mod protocol;

pub use coarse::CoarseLockManager;
pub use fine::FineLockManager;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::topology::{Topology, TopologyError};
use super::types::{NodeId, OwnerId};

/// Errors from lock manager operations.
///
/// Contention is never an error; see the module docs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManagerError {
    /// The request named a node outside the tree.
    #[error(transparent)]
    InvalidNode(#[from] TopologyError),
}

/// Lock state of a single node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeState {
    /// Current exclusive holder, if any.
    pub owner: Option<OwnerId>,
    /// Number of owned nodes in this node's strict subtree.
    pub locked_descendants: usize,
}

/// The three manager operations, with their wire opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    /// Opcode 1
    Lock,
    /// Opcode 2
    Unlock,
    /// Opcode 3
    Upgrade,
}

impl OpKind {
    /// Decode a wire opcode.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(OpKind::Lock),
            2 => Some(OpKind::Unlock),
            3 => Some(OpKind::Upgrade),
            _ => None,
        }
    }

    /// Encode as a wire opcode.
    pub fn code(self) -> u8 {
        match self {
            OpKind::Lock => 1,
            OpKind::Unlock => 2,
            OpKind::Upgrade => 3,
        }
    }

    /// Lowercase operation name.
    pub fn as_str(self) -> &'static str {
        match self {
            OpKind::Lock => "lock",
            OpKind::Unlock => "unlock",
            OpKind::Upgrade => "upgrade",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `(operation, node, owner)` request, stamped with its position in the
/// input sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Position in the logical input order, starting at 0.
    pub seq: usize,
    /// Which operation to run.
    pub kind: OpKind,
    /// Target node.
    pub node: NodeId,
    /// Requesting owner.
    pub owner: OwnerId,
}

impl Request {
    /// Build a request.
    pub fn new(seq: usize, kind: OpKind, node: NodeId, owner: OwnerId) -> Self {
        Self {
            seq,
            kind,
            node,
            owner,
        }
    }
}

/// A consistent copy of every node's lock state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    nodes: Vec<NodeState>,
}

impl Snapshot {
    pub(crate) fn new(nodes: Vec<NodeState>) -> Self {
        Self { nodes }
    }

    /// Number of nodes captured.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the snapshot holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Lock state of `node`, or `None` if it is outside the snapshot.
    pub fn get(&self, node: NodeId) -> Option<&NodeState> {
        self.nodes.get(node.index())
    }

    /// Current owner of `node`.
    pub fn owner(&self, node: NodeId) -> Option<OwnerId> {
        self.get(node).and_then(|s| s.owner)
    }

    /// Recorded locked-descendant count of `node` (0 outside the snapshot).
    pub fn locked_descendants(&self, node: NodeId) -> usize {
        self.get(node).map_or(0, |s| s.locked_descendants)
    }

    /// Iterate all owned nodes in id order.
    pub fn owned(&self) -> impl Iterator<Item = (NodeId, OwnerId)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.owner.map(|o| (NodeId::new(i), o)))
    }

    /// Iterate every node's state in id order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NodeState)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, s)| (NodeId::new(i), s))
    }
}

/// A thread-safe hierarchical lock manager.
///
/// Implementations differ only in their synchronization discipline; every
/// implementation produces the same results for the same serial sequence
/// of requests.
pub trait LockManager: Send + Sync {
    /// The tree this manager guards.
    fn topology(&self) -> &Topology;

    /// Lock `node` for `owner`.
    fn lock(&self, node: NodeId, owner: OwnerId) -> Result<bool, ManagerError>;

    /// Release `node` if it is held by `owner`.
    fn unlock(&self, node: NodeId, owner: OwnerId) -> Result<bool, ManagerError>;

    /// Replace `owner`'s locks below `node` with a lock on `node` itself.
    fn upgrade(&self, node: NodeId, owner: OwnerId) -> Result<bool, ManagerError>;

    /// Current lock state of a single node.
    fn node_state(&self, node: NodeId) -> Result<NodeState, ManagerError>;

    /// A consistent copy of the whole lock table.
    fn snapshot(&self) -> Snapshot;

    /// Run a decoded request.
    fn apply(&self, request: &Request) -> Result<bool, ManagerError> {
        match request.kind {
            OpKind::Lock => self.lock(request.node, request.owner),
            OpKind::Unlock => self.unlock(request.node, request.owner),
            OpKind::Upgrade => self.upgrade(request.node, request.owner),
        }
    }
}

/// Synchronization discipline for a lock manager.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// One mutex per node, acquired in id order along the touched paths
    #[default]
    Fine,
    /// One mutex for the whole table
    Coarse,
}

impl Strategy {
    /// Valid spellings, for config validation and messages.
    pub const NAMES: &'static [&'static str] = &["fine", "coarse"];

    /// Lowercase strategy name.
    pub fn as_str(self) -> &'static str {
        match self {
            Strategy::Fine => "fine",
            Strategy::Coarse => "coarse",
        }
    }

    /// Build a fresh manager (all nodes unowned) for `topology`.
    pub fn build(self, topology: Topology) -> Arc<dyn LockManager> {
        match self {
            Strategy::Fine => Arc::new(FineLockManager::new(topology)),
            Strategy::Coarse => Arc::new(CoarseLockManager::new(topology)),
        }
    }

    /// Build a fresh manager for a tree of `node_count` nodes and `arity`.
    ///
    /// # Errors
    ///
    /// Returns a [`TopologyError`] if the shape is degenerate.
    pub fn initialize(
        self,
        node_count: usize,
        arity: usize,
    ) -> Result<Arc<dyn LockManager>, TopologyError> {
        Ok(self.build(Topology::new(node_count, arity)?))
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fine" => Ok(Strategy::Fine),
            "coarse" => Ok(Strategy::Coarse),
            other => Err(format!(
                "invalid strategy '{}', must be one of: {}",
                other,
                Self::NAMES.join(", ")
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcodes_round_trip() {
        for kind in [OpKind::Lock, OpKind::Unlock, OpKind::Upgrade] {
            assert_eq!(OpKind::from_code(kind.code()), Some(kind));
        }
        assert_eq!(OpKind::from_code(0), None);
        assert_eq!(OpKind::from_code(4), None);
    }

    #[test]
    fn strategy_parses_names() {
        assert_eq!("fine".parse::<Strategy>(), Ok(Strategy::Fine));
        assert_eq!("coarse".parse::<Strategy>(), Ok(Strategy::Coarse));
        assert!("global".parse::<Strategy>().unwrap_err().contains("fine"));
    }

    #[test]
    fn initialize_rejects_empty_tree() {
        assert!(matches!(
            Strategy::Fine.initialize(0, 2),
            Err(TopologyError::EmptyTree)
        ));
        assert!(matches!(
            Strategy::Coarse.initialize(3, 0),
            Err(TopologyError::ZeroArity)
        ));
    }

    #[test]
    fn apply_dispatches_by_kind() {
        for strategy in [Strategy::Fine, Strategy::Coarse] {
            let manager = strategy.initialize(3, 2).unwrap();
            let owner = OwnerId::new(1);
            let node = NodeId::new(1);

            let lock = Request::new(0, OpKind::Lock, node, owner);
            let unlock = Request::new(1, OpKind::Unlock, node, owner);
            let upgrade = Request::new(2, OpKind::Upgrade, NodeId::ROOT, owner);

            assert_eq!(manager.apply(&lock), Ok(true));
            assert_eq!(manager.apply(&upgrade), Ok(true));
            assert_eq!(manager.apply(&unlock), Ok(false));
            assert_eq!(manager.node_state(NodeId::ROOT).unwrap().owner, Some(owner));
        }
    }

    #[test]
    fn snapshot_lists_owned_nodes() {
        let manager = Strategy::Coarse.initialize(7, 2).unwrap();
        manager.lock(NodeId::new(3), OwnerId::new(5)).unwrap();
        manager.lock(NodeId::new(6), OwnerId::new(9)).unwrap();

        let snapshot = manager.snapshot();
        assert_eq!(snapshot.len(), 7);
        assert_eq!(
            snapshot.owned().collect::<Vec<_>>(),
            vec![
                (NodeId::new(3), OwnerId::new(5)),
                (NodeId::new(6), OwnerId::new(9))
            ]
        );
        assert_eq!(snapshot.locked_descendants(NodeId::ROOT), 2);
        assert_eq!(snapshot.owner(NodeId::new(42)), None);
    }
}
