use std::cmp::Ordering;

use derive_more::{Display, IsVariant};

use crate::path::TreePath;

/// Handle to a node stored in a [`NodeArena`](super::NodeArena).
///
/// A handle outlives its node harmlessly: once the node is freed the handle
/// resolves to nothing, even after the slot is reused.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("#{index}.{generation}")]
pub struct NodeId {
    pub(crate) index: usize,
    pub(crate) generation: u32,
}

impl NodeId {
    pub fn index(self) -> usize {
        self.index
    }
}

#[derive(Debug, Clone, PartialEq, Eq, IsVariant)]
pub enum NodeKind {
    /// Children are kept sorted by path, without duplicates.
    Directory { children: Vec<NodeId> },
    File { contents: Vec<u8> },
}

impl NodeKind {
    pub fn empty_directory() -> Self {
        NodeKind::Directory {
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) path: TreePath,
    pub(crate) parent: Option<NodeId>,
    pub(crate) kind: NodeKind,
}

impl Node {
    pub fn path(&self) -> &TreePath {
        &self.path
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    pub fn is_directory(&self) -> bool {
        self.kind.is_directory()
    }

    /// Children in path order; empty for files.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Directory { children } => children,
            NodeKind::File { .. } => &[],
        }
    }

    pub fn num_children(&self) -> usize {
        self.children().len()
    }

    pub fn contents(&self) -> Option<&[u8]> {
        match &self.kind {
            NodeKind::File { contents } => Some(contents),
            NodeKind::Directory { .. } => None,
        }
    }

    /// Length of the file payload, 0 for directories.
    pub fn content_length(&self) -> usize {
        self.contents().map_or(0, <[u8]>::len)
    }

    pub fn compare(&self, other: &Node) -> Ordering {
        self.path.cmp(&other.path)
    }
}
