//! Read-only validation of tree invariants.
//!
//! The checks stop at the first broken invariant and report it as a
//! [`Violation`] whose message is the diagnostic.

mod checker;

pub use checker::{Violation, node_is_valid, tree_check, tree_is_valid};
