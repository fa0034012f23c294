//! core::topology
//!
//! Immutable shape of the m-ary resource tree.
//!
//! # Architecture
//!
//! The tree is complete and level-ordered, so nothing is stored per node:
//! - Parent of `v > 0` is `(v - 1) / m`
//! - Children of `v` are the contiguous ids `v*m + 1 ..= v*m + m`, clipped
//!   to the node count
//!
//! # Invariants
//!
//! - `node_count >= 1` and `arity >= 1`
//! - Every ancestor of `v` has a strictly smaller id than `v`
//! - Every descendant of `v` has a strictly larger id than `v`

use std::ops::Range;

use thiserror::Error;

use super::types::NodeId;

/// Errors from topology construction and range checks.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    /// A tree needs at least one node.
    #[error("tree must have at least one node")]
    EmptyTree,

    /// Each node needs room for at least one child.
    #[error("tree arity must be at least 1")]
    ZeroArity,

    /// A node id outside `[0, node_count)`.
    #[error("node {node} is out of range for a tree of {node_count} nodes")]
    NodeOutOfRange {
        /// The offending id
        node: NodeId,
        /// Number of nodes in the tree
        node_count: usize,
    },
}

/// Shape of a complete m-ary tree.
///
/// # Example
///
/// ```
/// use treelock::core::topology::Topology;
/// use treelock::core::types::NodeId;
///
/// let tree = Topology::new(7, 2).unwrap();
/// assert_eq!(tree.parent(NodeId::new(4)), Some(NodeId::new(1)));
///
/// let children: Vec<_> = tree.children(NodeId::new(1)).collect();
/// assert_eq!(children, vec![NodeId::new(3), NodeId::new(4)]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Topology {
    node_count: usize,
    arity: usize,
}

impl Topology {
    /// Build the topology for `node_count` nodes with at most `arity`
    /// children each.
    ///
    /// # Errors
    ///
    /// - [`TopologyError::EmptyTree`] if `node_count` is zero
    /// - [`TopologyError::ZeroArity`] if `arity` is zero
    pub fn new(node_count: usize, arity: usize) -> Result<Self, TopologyError> {
        if node_count == 0 {
            return Err(TopologyError::EmptyTree);
        }
        if arity == 0 {
            return Err(TopologyError::ZeroArity);
        }
        Ok(Self { node_count, arity })
    }

    /// Number of nodes in the tree.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Maximum number of children per node.
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Check if `node` is a valid id for this tree.
    pub fn contains(&self, node: NodeId) -> bool {
        node.index() < self.node_count
    }

    /// Range-check a node id.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::NodeOutOfRange`] if `node` is not in
    /// `[0, node_count)`.
    pub fn check(&self, node: NodeId) -> Result<NodeId, TopologyError> {
        if self.contains(node) {
            Ok(node)
        } else {
            Err(TopologyError::NodeOutOfRange {
                node,
                node_count: self.node_count,
            })
        }
    }

    /// Get the parent of a node, or `None` for the root.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        match node.index() {
            0 => None,
            i => Some(NodeId::new((i - 1) / self.arity)),
        }
    }

    /// Raw id interval of the children of `node`.
    ///
    /// Empty for leaves. Bounds saturate instead of overflowing.
    pub fn child_range(&self, node: NodeId) -> Range<usize> {
        let first = node.index().saturating_mul(self.arity).saturating_add(1);
        let end = first.saturating_add(self.arity).min(self.node_count);
        first.min(end)..end
    }

    /// Iterate the children of `node` in increasing id order.
    pub fn children(&self, node: NodeId) -> impl Iterator<Item = NodeId> {
        self.child_range(node).map(NodeId::new)
    }

    /// Check if `node` has no children.
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.child_range(node).is_empty()
    }

    /// Iterate the strict ancestors of `node`, from its parent up to the root.
    pub fn ancestors(&self, node: NodeId) -> Ancestors<'_> {
        Ancestors {
            topology: self,
            next: self.parent(node),
        }
    }

    /// Get `node` followed by all of its ancestors, ending at the root.
    ///
    /// The result is in strictly decreasing id order.
    pub fn path_to_root(&self, node: NodeId) -> Vec<NodeId> {
        let mut path = Vec::with_capacity(self.depth(node) + 1);
        path.push(node);
        path.extend(self.ancestors(node));
        path
    }

    /// Number of edges between `node` and the root.
    pub fn depth(&self, node: NodeId) -> usize {
        self.ancestors(node).count()
    }

    /// Depth of the deepest node in the tree.
    pub fn height(&self) -> usize {
        self.depth(NodeId::new(self.node_count - 1))
    }

    /// Check if `ancestor` is a strict ancestor of `node`.
    pub fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor < node && self.ancestors(node).any(|a| a == ancestor)
    }
}

/// Iterator over the strict ancestors of a node. See [`Topology::ancestors`].
#[derive(Debug, Clone)]
pub struct Ancestors<'a> {
    topology: &'a Topology,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.topology.parent(current);
        Some(current)
    }
}
