//! treelock - Hierarchical lock manager for m-ary resource trees
//!
//! A fixed tree of N resources, shaped as a complete m-ary tree in level
//! order, supports three operations on behalf of owners: `lock` a node,
//! `unlock` it, and `upgrade` a node by trading all of an owner's locks
//! below it for a single lock on the node itself. Locking a node
//! implicitly covers its whole subtree, so no two nodes on one
//! root-to-leaf path are ever owned at once.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Input parsing, request dispatch and post-run verification
//! - [`core`] - Domain types, topology, lock managers, verification, config
//! - [`ui`] - Output formatting
//!
//! # Correctness Invariants
//!
//! treelock maintains the following invariants between operations:
//!
//! 1. Every node's `locked_descendants` equals the number of owned nodes
//!    strictly below it
//! 2. No owned node has an owned ancestor
//! 3. A refused operation leaves the lock table unchanged
//! 4. Concurrent runs are linearizable: each operation behaves as if it ran
//!    alone at some instant inside its call

pub mod cli;
pub mod core;
pub mod engine;
pub mod ui;
