//! core::manager::fine
//!
//! Lock manager with one mutex per node.
//!
//! # Architecture
//!
//! Each operation first works out the exact set of nodes it must touch,
//! sorts and deduplicates that set by node id, and takes every mutex in
//! that order before reading or writing any of them. All mutexes are
//! released together when the [`LockSet`] is dropped.
//!
//! - `lock` / `unlock` touch `path_to_root(v)`.
//! - `upgrade` runs in two passes. Pass one holds `path_to_root(v)`,
//!   checks the cheap preconditions and scans the subtree to find the
//!   descendants it will need. Pass two releases everything, takes the
//!   path plus those descendants, and repeats every check and the scan
//!   before committing, since the subtree may have changed in between.
//!   If the repeated scan runs into a node outside the held set, the
//!   subtree grew in the gap and the upgrade starts over.
//!
//! # Invariants
//!
//! - Mutexes are only ever acquired in increasing id order. During the
//!   pass-one scan a single descendant is locked at a time while the path
//!   is held; descendants have larger ids than every node on the path, so
//!   the order is preserved.
//! - Any operation that can change state inside the subtree of `v` holds
//!   the mutex of `v` or of one of its ancestors, so two operations on
//!   overlapping paths are serialized.

use std::ops::{Index, IndexMut};

use parking_lot::{Mutex, MutexGuard};

use super::protocol::{self, NodeSlots, Scan};
use super::{LockManager, ManagerError, NodeState, Snapshot};
use crate::core::topology::Topology;
use crate::core::types::{NodeId, OwnerId};

/// Guards for a set of nodes, sorted by id.
///
/// Indexing a node outside the set panics.
pub struct LockSet<'a> {
    held: Vec<(NodeId, MutexGuard<'a, NodeState>)>,
}

impl LockSet<'_> {
    /// Ids covered by this set, in increasing order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.held.iter().map(|(id, _)| *id)
    }

    /// Number of held mutexes.
    pub fn len(&self) -> usize {
        self.held.len()
    }

    /// Check if no mutex is held.
    pub fn is_empty(&self) -> bool {
        self.held.is_empty()
    }

    fn position(&self, node: NodeId) -> Option<usize> {
        self.held.binary_search_by_key(&node, |(id, _)| *id).ok()
    }
}

impl Index<NodeId> for LockSet<'_> {
    type Output = NodeState;

    fn index(&self, node: NodeId) -> &NodeState {
        match self.position(node) {
            Some(i) => &self.held[i].1,
            None => panic!("node {} is not in the held lock set", node),
        }
    }
}

impl IndexMut<NodeId> for LockSet<'_> {
    fn index_mut(&mut self, node: NodeId) -> &mut NodeState {
        match self.position(node) {
            Some(i) => &mut self.held[i].1,
            None => panic!("node {} is not in the held lock set", node),
        }
    }
}

impl NodeSlots for LockSet<'_> {
    fn get(&self, node: NodeId) -> Option<&NodeState> {
        self.position(node).map(|i| &*self.held[i].1)
    }
}

/// Lock manager with one mutex per node and ordered acquisition.
///
/// # Example
///
/// ```
/// use treelock::core::manager::{FineLockManager, LockManager};
/// use treelock::core::topology::Topology;
/// use treelock::core::types::{NodeId, OwnerId};
///
/// let manager = FineLockManager::new(Topology::new(7, 2).unwrap());
///
/// assert_eq!(manager.lock(NodeId::new(3), OwnerId::new(1)), Ok(true));
/// assert_eq!(manager.lock(NodeId::new(5), OwnerId::new(2)), Ok(true));
/// assert_eq!(manager.upgrade(NodeId::new(0), OwnerId::new(1)), Ok(false));
/// ```
#[derive(Debug)]
pub struct FineLockManager {
    topology: Topology,
    slots: Vec<Mutex<NodeState>>,
}

impl FineLockManager {
    /// Create a manager with every node unowned.
    pub fn new(topology: Topology) -> Self {
        let slots = (0..topology.node_count())
            .map(|_| Mutex::new(NodeState::default()))
            .collect();
        Self { topology, slots }
    }

    /// Lock every node in `nodes`, in increasing id order.
    ///
    /// Duplicates are ignored. Every id must already be range-checked.
    pub fn acquire(&self, mut nodes: Vec<NodeId>) -> LockSet<'_> {
        nodes.sort_unstable();
        nodes.dedup();
        let held = nodes
            .into_iter()
            .map(|id| (id, self.slots[id.index()].lock()))
            .collect();
        LockSet { held }
    }

    /// Copy the state of one node under its own mutex.
    fn read(&self, node: NodeId) -> NodeState {
        *self.slots[node.index()].lock()
    }

    /// Pass one of `upgrade`: returns the descendants pass two must hold,
    /// or `None` if the upgrade is refused.
    fn upgrade_footprint(
        &self,
        node: NodeId,
        owner: OwnerId,
        path: &[NodeId],
    ) -> Option<Vec<NodeId>> {
        let held = self.acquire(path.to_vec());
        if !protocol::can_upgrade(&held, &self.topology, node) {
            return None;
        }

        match protocol::scan_subtree(&self.topology, node, owner, |v| Some(self.read(v))) {
            Scan::Clear { footprint, .. } => Some(footprint),
            Scan::Vetoed { .. } | Scan::Incomplete { .. } => None,
        }
    }
}

impl LockManager for FineLockManager {
    fn topology(&self) -> &Topology {
        &self.topology
    }

    fn lock(&self, node: NodeId, owner: OwnerId) -> Result<bool, ManagerError> {
        let node = self.topology.check(node)?;
        let mut held = self.acquire(self.topology.path_to_root(node));

        if !protocol::can_lock(&held, &self.topology, node) {
            return Ok(false);
        }
        protocol::commit_lock(&mut held, &self.topology, node, owner);
        Ok(true)
    }

    fn unlock(&self, node: NodeId, owner: OwnerId) -> Result<bool, ManagerError> {
        let node = self.topology.check(node)?;
        let mut held = self.acquire(self.topology.path_to_root(node));

        if !protocol::can_unlock(&held, node, owner) {
            return Ok(false);
        }
        protocol::commit_unlock(&mut held, &self.topology, node);
        Ok(true)
    }

    fn upgrade(&self, node: NodeId, owner: OwnerId) -> Result<bool, ManagerError> {
        let node = self.topology.check(node)?;
        let path = self.topology.path_to_root(node);

        loop {
            let Some(footprint) = self.upgrade_footprint(node, owner, &path) else {
                return Ok(false);
            };

            let mut nodes = path.clone();
            nodes.extend(footprint);
            let mut held = self.acquire(nodes);

            // Everything may have changed since pass one.
            if !protocol::can_upgrade(&held, &self.topology, node) {
                return Ok(false);
            }
            let rescan =
                protocol::scan_subtree(&self.topology, node, owner, |v| held.get(v).copied());

            match rescan {
                Scan::Clear { owned, .. } => {
                    protocol::commit_upgrade(&mut held, &self.topology, node, owner, &owned);
                    return Ok(true);
                }
                Scan::Vetoed { .. } => return Ok(false),
                // new locks appeared below a branch pass one skipped
                Scan::Incomplete { .. } => continue,
            }
        }
    }

    fn node_state(&self, node: NodeId) -> Result<NodeState, ManagerError> {
        let node = self.topology.check(node)?;
        Ok(self.read(node))
    }

    fn snapshot(&self) -> Snapshot {
        let all = (0..self.topology.node_count()).map(NodeId::new).collect();
        let held = self.acquire(all);
        Snapshot::new(held.held.iter().map(|(_, state)| **state).collect())
    }
}
