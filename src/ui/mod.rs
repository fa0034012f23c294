//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All printing goes through this module so that verbosity and the
//! stdout/stderr split are handled in one place.

pub mod output;
