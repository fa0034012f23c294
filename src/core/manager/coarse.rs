//! core::manager::coarse
//!
//! Lock manager guarded by a single mutex.
//!
//! Every operation is one critical section over the whole table, so
//! operations are fully serialized, including those on unrelated subtrees.

use std::ops::{Index, IndexMut};

use parking_lot::Mutex;

use super::protocol::{self, NodeSlots, Scan};
use super::{LockManager, ManagerError, NodeState, Snapshot};
use crate::core::topology::Topology;
use crate::core::types::{NodeId, OwnerId};

/// The full lock table, indexed by node id.
#[derive(Debug)]
struct LockTable {
    nodes: Vec<NodeState>,
}

impl Index<NodeId> for LockTable {
    type Output = NodeState;

    fn index(&self, node: NodeId) -> &NodeState {
        &self.nodes[node.index()]
    }
}

impl IndexMut<NodeId> for LockTable {
    fn index_mut(&mut self, node: NodeId) -> &mut NodeState {
        &mut self.nodes[node.index()]
    }
}

impl NodeSlots for LockTable {
    fn get(&self, node: NodeId) -> Option<&NodeState> {
        self.nodes.get(node.index())
    }
}

/// Lock manager with one global mutex.
///
/// # Example
///
/// ```
/// use treelock::core::manager::{CoarseLockManager, LockManager};
/// use treelock::core::topology::Topology;
/// use treelock::core::types::{NodeId, OwnerId};
///
/// let manager = CoarseLockManager::new(Topology::new(7, 2).unwrap());
/// let owner = OwnerId::new(1);
///
/// assert_eq!(manager.lock(NodeId::new(3), owner), Ok(true));
/// assert_eq!(manager.lock(NodeId::new(1), owner), Ok(false));
/// assert_eq!(manager.upgrade(NodeId::new(1), owner), Ok(true));
/// ```
#[derive(Debug)]
pub struct CoarseLockManager {
    topology: Topology,
    table: Mutex<LockTable>,
}

impl CoarseLockManager {
    /// Create a manager with every node unowned.
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            table: Mutex::new(LockTable {
                nodes: vec![NodeState::default(); topology.node_count()],
            }),
        }
    }
}

impl LockManager for CoarseLockManager {
    fn topology(&self) -> &Topology {
        &self.topology
    }

    fn lock(&self, node: NodeId, owner: OwnerId) -> Result<bool, ManagerError> {
        let node = self.topology.check(node)?;
        let mut table = self.table.lock();

        if !protocol::can_lock(&*table, &self.topology, node) {
            return Ok(false);
        }
        protocol::commit_lock(&mut *table, &self.topology, node, owner);
        Ok(true)
    }

    fn unlock(&self, node: NodeId, owner: OwnerId) -> Result<bool, ManagerError> {
        let node = self.topology.check(node)?;
        let mut table = self.table.lock();

        if !protocol::can_unlock(&*table, node, owner) {
            return Ok(false);
        }
        protocol::commit_unlock(&mut *table, &self.topology, node);
        Ok(true)
    }

    fn upgrade(&self, node: NodeId, owner: OwnerId) -> Result<bool, ManagerError> {
        let node = self.topology.check(node)?;
        let mut table = self.table.lock();

        if !protocol::can_upgrade(&*table, &self.topology, node) {
            return Ok(false);
        }

        let scan = protocol::scan_subtree(&self.topology, node, owner, |v| table.get(v).copied());
        match scan {
            Scan::Clear { owned, .. } => {
                protocol::commit_upgrade(&mut *table, &self.topology, node, owner, &owned);
                Ok(true)
            }
            // the whole table is visible, so only a veto lands here
            Scan::Vetoed { .. } | Scan::Incomplete { .. } => Ok(false),
        }
    }

    fn node_state(&self, node: NodeId) -> Result<NodeState, ManagerError> {
        let node = self.topology.check(node)?;
        Ok(self.table.lock()[node])
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.table.lock().nodes.clone())
    }
}
