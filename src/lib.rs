//! An in-memory hierarchical namespace of directories and files.
//!
//! Nodes are addressed by slash-delimited paths such as `a/b/c`. A
//! [`FileTree`] has at most one top-level root; directories hold their
//! children sorted by path and files hold an opaque byte payload.
//!
//! ```
//! use filetree::FileTree;
//!
//! let mut tree = FileTree::new();
//! tree.init()?;
//! tree.insert_file("a/b/f", b"hi")?;
//! assert!(tree.contains_dir("a/b"));
//! assert_eq!(tree.listing(), "a\na/b\na/b/f\n");
//! # Ok::<(), filetree::TreeError>(())
//! ```

pub mod checker;
pub mod manifest;
pub mod node;
pub mod path;
pub mod tree;

mod error_kind;

pub use error_kind::ErrorKind;
pub use tree::{FileTree, Stat, TreeConfig, TreeError};
