//! Parsed, immutable slash-delimited paths.
//!
//! A [`TreePath`] is validated once at construction and then only ever
//! duplicated or sliced into prefixes, so every path handled by the tree is
//! known to be well formed.

mod tree_path;

pub use tree_path::{PathError, SEPARATOR, TreePath};
