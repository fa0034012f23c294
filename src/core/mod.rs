//! core
//!
//! Core domain types and lock managers for treelock.
//!
//! # Modules
//!
//! - [`types`] - Strong types: NodeId, OwnerId, NodeName
//! - [`topology`] - Implicit m-ary tree arithmetic
//! - [`manager`] - Lock managers and the shared locking protocol
//! - [`verify`] - Full-tree verification of lock-table invariants
//! - [`naming`] - Node name table
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Contention is an ordinary outcome, misuse is an error
//! - All verification is deterministic

pub mod config;
pub mod manager;
pub mod naming;
pub mod topology;
pub mod types;
pub mod verify;
