//! Property-based tests for the lock managers.
//!
//! These tests use proptest to check, across random trees and request
//! sequences, that:
//! - both managers agree on every outcome and on the full lock table
//! - the lock table passes a full recount after every request
//! - outcomes match a brute-force model that only tracks owners

use proptest::prelude::*;

use treelock::core::manager::{OpKind, Request, Strategy as ManagerStrategy};
use treelock::core::topology::Topology;
use treelock::core::types::{NodeId, OwnerId};
use treelock::core::verify::verify_snapshot;

/// A tree shape plus requests that fit it.
fn workload() -> impl Strategy<Value = (usize, usize, Vec<(OpKind, usize, i64)>)> {
    (1usize..40, 1usize..5).prop_flat_map(|(nodes, arity)| {
        let request = (
            prop_oneof![
                Just(OpKind::Lock),
                Just(OpKind::Unlock),
                Just(OpKind::Upgrade)
            ],
            0..nodes,
            0i64..3,
        );
        (
            Just(nodes),
            Just(arity),
            prop::collection::vec(request, 0..120),
        )
    })
}

fn requests(ops: &[(OpKind, usize, i64)]) -> Vec<Request> {
    ops.iter()
        .enumerate()
        .map(|(seq, &(kind, node, owner))| {
            Request::new(seq, kind, NodeId::new(node), OwnerId::new(owner))
        })
        .collect()
}

/// Owners only; every rule evaluated by walking the whole tree.
struct Model {
    topology: Topology,
    owners: Vec<Option<OwnerId>>,
}

impl Model {
    fn new(topology: Topology) -> Self {
        Self {
            topology,
            owners: vec![None; topology.node_count()],
        }
    }

    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        (0..self.topology.node_count())
            .map(NodeId::new)
            .filter(|&d| self.topology.is_ancestor(node, d))
            .collect()
    }

    fn path_free(&self, node: NodeId) -> bool {
        self.owners[node.index()].is_none()
            && self
                .topology
                .ancestors(node)
                .all(|a| self.owners[a.index()].is_none())
    }

    fn apply(&mut self, r: &Request) -> bool {
        let v = r.node;
        match r.kind {
            OpKind::Lock => {
                let free = self.path_free(v)
                    && self
                        .descendants(v)
                        .iter()
                        .all(|d| self.owners[d.index()].is_none());
                if free {
                    self.owners[v.index()] = Some(r.owner);
                }
                free
            }
            OpKind::Unlock => {
                let held = self.owners[v.index()] == Some(r.owner);
                if held {
                    self.owners[v.index()] = None;
                }
                held
            }
            OpKind::Upgrade => {
                let owned: Vec<_> = self
                    .descendants(v)
                    .into_iter()
                    .filter(|d| self.owners[d.index()].is_some())
                    .collect();
                let ok = self.path_free(v)
                    && !owned.is_empty()
                    && owned.iter().all(|d| self.owners[d.index()] == Some(r.owner));
                if ok {
                    for d in owned {
                        self.owners[d.index()] = None;
                    }
                    self.owners[v.index()] = Some(r.owner);
                }
                ok
            }
        }
    }
}

proptest! {
    /// Fine and coarse managers produce identical outcomes and tables.
    #[test]
    fn managers_agree((nodes, arity, ops) in workload()) {
        let fine = ManagerStrategy::Fine.initialize(nodes, arity).unwrap();
        let coarse = ManagerStrategy::Coarse.initialize(nodes, arity).unwrap();

        for request in requests(&ops) {
            let a = fine.apply(&request).unwrap();
            let b = coarse.apply(&request).unwrap();
            prop_assert_eq!(a, b, "request {:?}", request);
        }
        prop_assert_eq!(fine.snapshot(), coarse.snapshot());
    }

    /// Invariants hold after every single request.
    #[test]
    fn invariants_hold_after_every_step((nodes, arity, ops) in workload()) {
        let manager = ManagerStrategy::Fine.initialize(nodes, arity).unwrap();

        for request in requests(&ops) {
            manager.apply(&request).unwrap();
            let result = verify_snapshot(manager.topology(), &manager.snapshot());
            prop_assert!(result.ok, "after {:?}: {:?}", request, result.errors);
        }
    }

    /// Outcomes and owners match the brute-force model.
    #[test]
    fn matches_model((nodes, arity, ops) in workload()) {
        let topology = Topology::new(nodes, arity).unwrap();
        let manager = ManagerStrategy::Fine.build(topology);
        let mut model = Model::new(topology);

        for request in requests(&ops) {
            let expected = model.apply(&request);
            prop_assert_eq!(manager.apply(&request).unwrap(), expected, "request {:?}", request);
        }

        let snapshot = manager.snapshot();
        for (i, owner) in model.owners.iter().enumerate() {
            prop_assert_eq!(snapshot.owner(NodeId::new(i)), *owner);
        }
    }

    /// A refused request never changes the table.
    #[test]
    fn refusals_are_side_effect_free((nodes, arity, ops) in workload()) {
        let manager = ManagerStrategy::Fine.initialize(nodes, arity).unwrap();

        for request in requests(&ops) {
            let before = manager.snapshot();
            if !manager.apply(&request).unwrap() {
                prop_assert_eq!(manager.snapshot(), before);
            }
        }
    }

    /// Children of a node always name it as parent.
    #[test]
    fn topology_parent_child_agree(nodes in 1usize..500, arity in 1usize..8) {
        let topology = Topology::new(nodes, arity).unwrap();
        for i in 0..nodes {
            let v = NodeId::new(i);
            for child in topology.children(v) {
                prop_assert_eq!(topology.parent(child), Some(v));
                prop_assert!(child > v);
            }
        }
    }
}
