//! Tree entries and the arena that owns them.
//!
//! Directories own their children through the arena; the only upward link
//! is a node's `parent` id, which is never used to keep anything alive.

mod arena;
mod node;

pub use arena::{NodeArena, NodeError};
pub use node::{Node, NodeId, NodeKind};

pub(crate) use arena::copy_contents;
