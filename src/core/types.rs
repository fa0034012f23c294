//! core::types
//!
//! Strong types for core domain concepts.
//!
//! # Types
//!
//! - [`NodeId`] - Dense integer identifier of a tree node
//! - [`OwnerId`] - Identifier of a lock holder
//! - [`NodeName`] - Validated external node name
//!
//! # Validation
//!
//! `NodeName` enforces validity at construction time. `NodeId` carries no
//! range information on its own; range checks belong to
//! [`Topology`](super::topology::Topology), which knows the node count.
//!
//! # Examples
//!
//! ```
//! use treelock::core::types::{NodeId, NodeName, OwnerId};
//!
//! let node = NodeId::new(3);
//! assert_eq!(node.index(), 3);
//! assert_eq!(OwnerId::new(10).get(), 10);
//!
//! assert!(NodeName::new("india").is_ok());
//! assert!(NodeName::new("has space").is_err());
//! ```

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid node name: {0}")]
    InvalidNodeName(String),
}

/// Identifier of a node in the tree, in `[0, node_count)`.
///
/// Ids are assigned level by level: the root is `0`, its children are
/// `1..=m`, and so on. The numeric order doubles as the global lock order
/// used by the fine-grained manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(usize);

impl NodeId {
    /// The root of every tree.
    pub const ROOT: NodeId = NodeId(0);

    /// Wrap a raw index.
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the raw index.
    pub const fn index(self) -> usize {
        self.0
    }

    /// Check if this is the root node.
    pub const fn is_root(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for NodeId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// Identifier of a lock holder.
///
/// Every value is a valid owner. An unlocked node is represented as
/// `Option::<OwnerId>::None`, never by a reserved owner value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(i64);

impl OwnerId {
    /// Wrap a raw owner value.
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw owner value.
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for OwnerId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// A validated external node name.
///
/// Node names travel as whitespace-delimited tokens, so a valid name:
/// - Cannot be empty
/// - Cannot contain whitespace
/// - Cannot contain ASCII control characters
///
/// # Example
///
/// ```
/// use treelock::core::types::NodeName;
///
/// let name = NodeName::new("Asia").unwrap();
/// assert_eq!(name.as_str(), "Asia");
///
/// assert!(NodeName::new("").is_err());
/// assert!(NodeName::new("two words").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NodeName(String);

impl NodeName {
    /// Create a new validated node name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidNodeName` if the name is empty or contains
    /// whitespace or control characters.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        if name.is_empty() {
            return Err(TypeError::InvalidNodeName(
                "node name cannot be empty".into(),
            ));
        }

        if let Some(c) = name.chars().find(|c| c.is_whitespace() || c.is_control()) {
            return Err(TypeError::InvalidNodeName(format!(
                "node name '{}' contains invalid character {:?}",
                name.escape_debug(),
                c
            )));
        }

        Ok(())
    }

    /// Get the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for NodeName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for NodeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NodeName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NodeName> for String {
    fn from(name: NodeName) -> Self {
        name.0
    }
}
