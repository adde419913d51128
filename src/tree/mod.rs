//! The file tree: one root, a live node count, and the operations that keep
//! both consistent with the nodes reachable from the root.
//!
//! Every public operation parses its path argument, walks the tree from the
//! root one prefix at a time, and only then mutates or queries. Multi-level
//! insertions either complete or leave the tree exactly as they found it.

mod config;
mod error;
mod file_tree;
mod stat;

pub use config::TreeConfig;
pub use error::TreeError;
pub use file_tree::FileTree;
pub use stat::Stat;
