//! core::manager::protocol
//!
//! The lock-table state machine, independent of how the table is guarded.
//!
//! # Design
//!
//! Every function here works against [`NodeSlots`], a view of some subset
//! of the table. The coarse manager passes the whole table; the fine
//! manager passes only the nodes whose mutexes it currently holds. Reads
//! through `Index` on a node outside the view are a bug in the caller.
//!
//! # Invariants
//!
//! - Commits adjust `locked_descendants` along the full ancestor chain, so
//!   counts stay exact after every commit
//! - The subtree scan prunes branches with a zero count, which is only
//!   correct because counts are exact

use std::ops::IndexMut;

use crate::core::topology::Topology;
use crate::core::types::{NodeId, OwnerId};

use super::NodeState;

/// A mutable view of some of the nodes of a lock table.
pub trait NodeSlots: IndexMut<NodeId, Output = NodeState> {
    /// State of `node`, or `None` if it is not part of this view.
    fn get(&self, node: NodeId) -> Option<&NodeState>;
}

/// Result of scanning the subtree below an upgrade target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scan {
    /// Every owned descendant belongs to the upgrading owner.
    Clear {
        /// Owned descendants, in discovery order
        owned: Vec<NodeId>,
        /// Every descendant whose state the scan read
        footprint: Vec<NodeId>,
    },
    /// A descendant is held by someone else.
    Vetoed {
        /// The foreign-owned descendant
        node: NodeId,
        /// Its owner
        owner: OwnerId,
    },
    /// The scan needed a node the reader could not see.
    Incomplete {
        /// The first node that could not be read
        node: NodeId,
    },
}

/// Check that neither `node` nor any of its ancestors is owned.
pub fn path_is_free<S: NodeSlots + ?Sized>(slots: &S, topology: &Topology, node: NodeId) -> bool {
    slots[node].owner.is_none() && topology.ancestors(node).all(|a| slots[a].owner.is_none())
}

/// Preconditions of `lock`.
pub fn can_lock<S: NodeSlots + ?Sized>(slots: &S, topology: &Topology, node: NodeId) -> bool {
    slots[node].locked_descendants == 0 && path_is_free(slots, topology, node)
}

/// Preconditions of `unlock`.
pub fn can_unlock<S: NodeSlots + ?Sized>(slots: &S, node: NodeId, owner: OwnerId) -> bool {
    slots[node].owner == Some(owner)
}

/// Preconditions of `upgrade` that do not need the subtree scan.
pub fn can_upgrade<S: NodeSlots + ?Sized>(slots: &S, topology: &Topology, node: NodeId) -> bool {
    slots[node].locked_descendants > 0 && path_is_free(slots, topology, node)
}

/// Depth-first scan of the strict subtree of `root` for owned nodes.
///
/// `read` returns the state of a node, or `None` if the caller cannot see
/// it. A branch is entered only when its `locked_descendants` is non-zero;
/// an owned node has no owned descendants, so it is never entered.
pub fn scan_subtree<F>(topology: &Topology, root: NodeId, owner: OwnerId, mut read: F) -> Scan
where
    F: FnMut(NodeId) -> Option<NodeState>,
{
    let mut owned = Vec::new();
    let mut footprint = Vec::new();
    let mut stack = vec![root];

    while let Some(current) = stack.pop() {
        for child in topology.children(current) {
            let Some(state) = read(child) else {
                return Scan::Incomplete { node: child };
            };
            footprint.push(child);

            match state.owner {
                Some(holder) if holder != owner => {
                    return Scan::Vetoed {
                        node: child,
                        owner: holder,
                    };
                }
                Some(_) => owned.push(child),
                None if state.locked_descendants > 0 => stack.push(child),
                None => {}
            }
        }
    }

    Scan::Clear { owned, footprint }
}

/// Give `node` to `owner` and count it in every ancestor.
pub fn commit_lock<S: NodeSlots + ?Sized>(
    slots: &mut S,
    topology: &Topology,
    node: NodeId,
    owner: OwnerId,
) {
    slots[node].owner = Some(owner);
    for ancestor in topology.ancestors(node) {
        slots[ancestor].locked_descendants += 1;
    }
}

/// Release `node` and uncount it in every ancestor.
pub fn commit_unlock<S: NodeSlots + ?Sized>(slots: &mut S, topology: &Topology, node: NodeId) {
    slots[node].owner = None;
    for ancestor in topology.ancestors(node) {
        slots[ancestor].locked_descendants -= 1;
    }
}

/// Release every node in `owned`, then give `node` to `owner`.
///
/// The caller must have validated the upgrade against the same view.
pub fn commit_upgrade<S: NodeSlots + ?Sized>(
    slots: &mut S,
    topology: &Topology,
    node: NodeId,
    owner: OwnerId,
    owned: &[NodeId],
) {
    for &descendant in owned {
        commit_unlock(slots, topology, descendant);
    }
    commit_lock(slots, topology, node, owner);
}

#[cfg(test)]
mod tests {
    use std::ops::Index;

    use super::*;

    /// Plain table: every node is visible.
    struct Table(Vec<NodeState>);

    impl Index<NodeId> for Table {
        type Output = NodeState;

        fn index(&self, node: NodeId) -> &NodeState {
            &self.0[node.index()]
        }
    }

    impl IndexMut<NodeId> for Table {
        fn index_mut(&mut self, node: NodeId) -> &mut NodeState {
            &mut self.0[node.index()]
        }
    }

    impl NodeSlots for Table {
        fn get(&self, node: NodeId) -> Option<&NodeState> {
            self.0.get(node.index())
        }
    }

    fn setup() -> (Topology, Table) {
        let topology = Topology::new(7, 2).unwrap();
        (topology, Table(vec![NodeState::default(); 7]))
    }

    fn n(i: usize) -> NodeId {
        NodeId::new(i)
    }

    const ALICE: OwnerId = OwnerId::new(10);
    const BOB: OwnerId = OwnerId::new(20);

    #[test]
    fn commit_lock_counts_every_ancestor() {
        let (topology, mut table) = setup();
        commit_lock(&mut table, &topology, n(4), ALICE);

        assert_eq!(table[n(4)].owner, Some(ALICE));
        assert_eq!(table[n(1)].locked_descendants, 1);
        assert_eq!(table[n(0)].locked_descendants, 1);
        assert_eq!(table[n(2)].locked_descendants, 0);
    }

    #[test]
    fn commit_unlock_reverses_commit_lock() {
        let (topology, mut table) = setup();
        commit_lock(&mut table, &topology, n(5), ALICE);
        commit_unlock(&mut table, &topology, n(5));

        assert!(table.0.iter().all(|s| *s == NodeState::default()));
    }

    #[test]
    fn preconditions_see_ancestors_and_descendants() {
        let (topology, mut table) = setup();
        commit_lock(&mut table, &topology, n(3), ALICE);

        // descendant owned
        assert!(!can_lock(&table, &topology, n(1)));
        assert!(can_upgrade(&table, &topology, n(1)));
        // self owned
        assert!(!can_lock(&table, &topology, n(3)));
        // sibling subtree is free
        assert!(can_lock(&table, &topology, n(4)));
        assert!(!can_upgrade(&table, &topology, n(2)));

        commit_lock(&mut table, &topology, n(2), BOB);
        // ancestor owned
        assert!(!can_lock(&table, &topology, n(6)));
        assert!(can_unlock(&table, n(2), BOB));
        assert!(!can_unlock(&table, n(2), ALICE));
    }

    #[test]
    fn scan_collects_own_locks() {
        let (topology, mut table) = setup();
        commit_lock(&mut table, &topology, n(3), ALICE);
        commit_lock(&mut table, &topology, n(4), ALICE);

        let scan = scan_subtree(&topology, n(1), ALICE, |v| table.get(v).copied());
        match scan {
            Scan::Clear { owned, footprint } => {
                assert_eq!(owned, vec![n(3), n(4)]);
                assert_eq!(footprint, vec![n(3), n(4)]);
            }
            other => panic!("expected clear scan, got {:?}", other),
        }
    }

    #[test]
    fn scan_prunes_unlocked_branches() {
        let (topology, mut table) = setup();
        commit_lock(&mut table, &topology, n(5), ALICE);

        let mut visited = Vec::new();
        let scan = scan_subtree(&topology, n(0), ALICE, |v| {
            visited.push(v);
            table.get(v).copied()
        });

        assert!(matches!(scan, Scan::Clear { ref owned, .. } if owned == &vec![n(5)]));
        // node 1 has a zero count, so 3 and 4 are never read
        assert_eq!(visited, vec![n(1), n(2), n(5), n(6)]);
    }

    #[test]
    fn scan_vetoes_foreign_lock() {
        let (topology, mut table) = setup();
        commit_lock(&mut table, &topology, n(3), ALICE);
        commit_lock(&mut table, &topology, n(5), BOB);

        let scan = scan_subtree(&topology, n(0), ALICE, |v| table.get(v).copied());
        assert_eq!(
            scan,
            Scan::Vetoed {
                node: n(5),
                owner: BOB
            }
        );
    }

    #[test]
    fn scan_reports_invisible_nodes() {
        let (topology, mut table) = setup();
        commit_lock(&mut table, &topology, n(6), ALICE);

        let scan = scan_subtree(&topology, n(0), ALICE, |v| {
            if v == n(6) {
                None
            } else {
                table.get(v).copied()
            }
        });
        assert_eq!(scan, Scan::Incomplete { node: n(6) });
    }

    #[test]
    fn commit_upgrade_moves_ownership_up() {
        let (topology, mut table) = setup();
        commit_lock(&mut table, &topology, n(3), ALICE);
        commit_lock(&mut table, &topology, n(4), ALICE);

        commit_upgrade(&mut table, &topology, n(1), ALICE, &[n(3), n(4)]);

        assert_eq!(table[n(1)].owner, Some(ALICE));
        assert_eq!(table[n(3)].owner, None);
        assert_eq!(table[n(4)].owner, None);
        assert_eq!(table[n(1)].locked_descendants, 0);
        assert_eq!(table[n(0)].locked_descendants, 1);
    }
}
