use snafu::Snafu;

use crate::error_kind::ErrorKind;
use crate::node::NodeError;
use crate::path::PathError;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TreeError {
    #[snafu(display("The tree is not initialized"))]
    NotInitialized,
    #[snafu(display("The tree is already initialized"))]
    AlreadyInitialized,
    #[snafu(display("Invalid path"))]
    InvalidPath { source: PathError },
    #[snafu(display("'{path}' is not in the tree"))]
    NoSuchPath { path: String },
    #[snafu(display("'{path}' is not under the tree root '{root}'"))]
    ConflictingPath { path: String, root: String },
    #[snafu(display("A file cannot be placed at the top level: '{path}'"))]
    FileAtRoot { path: String },
    #[snafu(display("'{path}' is already in the tree"))]
    AlreadyInTree { path: String },
    #[snafu(display("'{path}' is not a directory"))]
    NotADirectory { path: String },
    #[snafu(display("'{path}' is not a file"))]
    NotAFile { path: String },
    #[snafu(display("Node operation on '{path}' failed"))]
    Node { path: String, source: NodeError },
}

impl TreeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TreeError::NotInitialized => ErrorKind::NotInitialized,
            TreeError::AlreadyInitialized => ErrorKind::AlreadyInitialized,
            TreeError::InvalidPath { source } => source.kind(),
            TreeError::NoSuchPath { .. } => ErrorKind::NoSuchPath,
            TreeError::ConflictingPath { .. } | TreeError::FileAtRoot { .. } => {
                ErrorKind::ConflictingPath
            }
            TreeError::AlreadyInTree { .. } => ErrorKind::AlreadyInTree,
            TreeError::NotADirectory { .. } => ErrorKind::NotADirectory,
            TreeError::NotAFile { .. } => ErrorKind::NotAFile,
            TreeError::Node { source, .. } => source.kind(),
        }
    }
}
