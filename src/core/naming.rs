//! core::naming
//!
//! Mapping between external node names and dense node ids.
//!
//! # Features
//!
//! - The i-th name in the input order names node `i`
//! - Duplicate names are rejected, so the mapping is a bijection
//! - Lookups in both directions

use std::collections::HashMap;

use thiserror::Error;

use super::types::{NodeId, NodeName};

/// Errors from name resolution.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NamingError {
    #[error("node name '{name}' is used by both node {first} and node {second}")]
    Duplicate {
        name: NodeName,
        first: NodeId,
        second: NodeId,
    },

    #[error("unknown node name '{0}'")]
    Unknown(String),
}

/// Bidirectional name table for the nodes of one tree.
///
/// # Example
///
/// ```
/// use treelock::core::naming::NameTable;
/// use treelock::core::types::{NodeId, NodeName};
///
/// let names = ["World", "Asia", "Africa"]
///     .into_iter()
///     .map(|n| NodeName::new(n).unwrap())
///     .collect::<Vec<_>>();
/// let table = NameTable::new(names).unwrap();
///
/// assert_eq!(table.resolve("Asia").unwrap(), NodeId::new(1));
/// assert_eq!(table.name(NodeId::new(2)).unwrap().as_str(), "Africa");
/// assert!(table.resolve("Europe").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct NameTable {
    names: Vec<NodeName>,
    ids: HashMap<NodeName, NodeId>,
}

impl NameTable {
    /// Build the table from names in node-id order.
    ///
    /// # Errors
    ///
    /// Returns [`NamingError::Duplicate`] if a name appears twice.
    pub fn new(names: Vec<NodeName>) -> Result<Self, NamingError> {
        let mut ids = HashMap::with_capacity(names.len());

        for (i, name) in names.iter().enumerate() {
            if let Some(first) = ids.insert(name.clone(), NodeId::new(i)) {
                return Err(NamingError::Duplicate {
                    name: name.clone(),
                    first,
                    second: NodeId::new(i),
                });
            }
        }

        Ok(Self { names, ids })
    }

    /// Number of names in the table.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Resolve a name to its node id.
    ///
    /// # Errors
    ///
    /// Returns [`NamingError::Unknown`] if no node has this name.
    pub fn resolve(&self, name: &str) -> Result<NodeId, NamingError> {
        self.ids
            .get(name)
            .copied()
            .ok_or_else(|| NamingError::Unknown(name.to_string()))
    }

    /// Name of a node, if the id is in the table.
    pub fn name(&self, node: NodeId) -> Option<&NodeName> {
        self.names.get(node.index())
    }

    /// Iterate `(id, name)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &NodeName)> + '_ {
        self.names
            .iter()
            .enumerate()
            .map(|(i, name)| (NodeId::new(i), name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(names: &[&str]) -> Result<NameTable, NamingError> {
        NameTable::new(names.iter().map(|n| NodeName::new(*n).unwrap()).collect())
    }

    #[test]
    fn ids_follow_input_order() {
        let t = table(&["World", "Asia", "Africa", "China"]).unwrap();
        assert_eq!(t.len(), 4);
        assert_eq!(t.resolve("World").unwrap(), NodeId::ROOT);
        assert_eq!(t.resolve("China").unwrap(), NodeId::new(3));
        assert_eq!(t.name(NodeId::new(1)).unwrap().as_str(), "Asia");
        assert!(t.name(NodeId::new(4)).is_none());
    }

    #[test]
    fn duplicate_names_rejected() {
        let err = table(&["a", "b", "a"]).unwrap_err();
        assert_eq!(
            err,
            NamingError::Duplicate {
                name: NodeName::new("a").unwrap(),
                first: NodeId::new(0),
                second: NodeId::new(2),
            }
        );
    }

    #[test]
    fn unknown_and_malformed_names() {
        let t = table(&["a"]).unwrap();
        assert_eq!(t.resolve("b"), Err(NamingError::Unknown("b".into())));
        assert_eq!(t.resolve(""), Err(NamingError::Unknown("".into())));
    }

    #[test]
    fn iter_pairs_ids_and_names() {
        let t = table(&["x", "y"]).unwrap();
        let pairs: Vec<_> = t.iter().map(|(id, n)| (id.index(), n.as_str())).collect();
        assert_eq!(pairs, vec![(0, "x"), (1, "y")]);
    }
}
