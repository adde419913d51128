use std::collections::TryReserveError;

use snafu::{OptionExt, ResultExt, Snafu, ensure};
use tracing::trace;

use crate::error_kind::ErrorKind;
use crate::node::{Node, NodeId, NodeKind};
use crate::path::TreePath;

/// One arena cell. The generation is bumped each time the cell is freed, so
/// ids issued for an earlier occupant stop resolving.
#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    node: Option<Node>,
}

/// Slot storage for every node of one tree.
///
/// Freed slots are recycled; a `NodeId` only resolves while the node it was
/// issued for is alive.
#[derive(Debug, Default)]
pub struct NodeArena {
    slots: Vec<Slot>,
    vacant: Vec<usize>,
    live: usize,
    capacity: Option<usize>,
}

impl NodeArena {
    /// An arena that refuses to hold more than `capacity` live nodes, if set.
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.node.as_mut())
    }

    /// Drops every node at once. Slots stay allocated so that ids from
    /// before the clear never resolve again.
    pub fn clear(&mut self) {
        self.vacant.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.node.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.vacant.push(index);
        }
        self.live = 0;
    }

    /// Clears the arena and applies a new node limit.
    pub fn reset(&mut self, capacity: Option<usize>) {
        self.clear();
        self.capacity = capacity;
    }

    /// Creates a node and links it under `parent` at its sorted position.
    ///
    /// Without a parent the node becomes a detached root and must be one
    /// level deep. The duplicate check and the insertion index come from the
    /// same ordered search, so nothing can slip in between them.
    pub fn create(
        &mut self,
        path: TreePath,
        parent: Option<NodeId>,
        kind: NodeKind,
    ) -> Result<NodeId, NodeError> {
        let insert_at = match parent {
            Some(parent_id) => {
                let parent_node = self
                    .get(parent_id)
                    .context(UnknownNodeSnafu { id: parent_id })?;
                let parent_depth = parent_node.path.depth();

                ensure!(
                    path.shared_prefix_depth(&parent_node.path) >= parent_depth,
                    ConflictingParentSnafu {
                        path: path.to_string(),
                        parent: parent_node.path.to_string(),
                    }
                );
                ensure!(
                    path.depth() == parent_depth + 1,
                    NotDirectChildSnafu {
                        path: path.to_string(),
                        parent: parent_node.path.to_string(),
                    }
                );
                ensure!(
                    parent_node.is_directory(),
                    ParentIsFileSnafu {
                        parent: parent_node.path.to_string(),
                    }
                );

                match self.has_child(parent_id, &path) {
                    Ok(_) => {
                        return DuplicateChildSnafu {
                            path: path.to_string(),
                        }
                        .fail();
                    }
                    Err(index) => Some((parent_id, index)),
                }
            }
            None => {
                ensure!(
                    path.depth() == 1,
                    RootDepthSnafu {
                        path: path.to_string(),
                    }
                );
                None
            }
        };

        // Make room in the parent first: once the node is allocated,
        // linking it must not fail.
        if let Some((parent_id, _)) = insert_at {
            if let Some(NodeKind::Directory { children }) =
                self.get_mut(parent_id).map(|node| &mut node.kind)
            {
                children.try_reserve(1).context(OutOfMemorySnafu)?;
            }
        }

        let id = self.allocate(Node { path, parent, kind })?;

        if let Some((parent_id, index)) = insert_at {
            if let Some(NodeKind::Directory { children }) =
                self.get_mut(parent_id).map(|node| &mut node.kind)
            {
                children.insert(index, id);
            }
        }

        trace!("Created node {id} under {parent:?}");
        Ok(id)
    }

    /// Unlinks `id` from its parent and frees it with its whole subtree.
    ///
    /// Returns the number of nodes freed, 0 if `id` is not alive.
    pub fn destroy(&mut self, id: NodeId) -> usize {
        let Some(node) = self.get(id) else {
            return 0;
        };

        let link = node.parent.and_then(|parent_id| {
            self.has_child(parent_id, &node.path)
                .ok()
                .map(|index| (parent_id, index))
        });
        if let Some((parent_id, index)) = link {
            if let Some(NodeKind::Directory { children }) =
                self.get_mut(parent_id).map(|node| &mut node.kind)
            {
                children.remove(index);
            }
        }

        let freed = self.release(id);
        trace!("Destroyed node {id}, {freed} node(s) freed");
        freed
    }

    /// Ordered search of `parent`'s children for `path`.
    ///
    /// `Ok(index)` is the position of the matching child, `Err(index)` the
    /// position a child with that path would be inserted at. Files and
    /// unknown ids never have children and yield `Err(0)`.
    pub fn has_child(&self, parent: NodeId, path: &TreePath) -> Result<usize, usize> {
        let Some(parent_node) = self.get(parent) else {
            return Err(0);
        };
        match &parent_node.kind {
            NodeKind::Directory { children } => children.binary_search_by(|child| {
                // Live trees never hold dangling ids; sort them first if they occur.
                self.get(*child)
                    .map_or(std::cmp::Ordering::Less, |node| node.path.cmp(path))
            }),
            NodeKind::File { .. } => Err(0),
        }
    }

    pub fn get_child(&self, parent: NodeId, index: usize) -> Result<NodeId, NodeError> {
        let parent_node = self.get(parent).context(UnknownNodeSnafu { id: parent })?;
        match &parent_node.kind {
            NodeKind::Directory { children } => {
                children
                    .get(index)
                    .copied()
                    .context(ChildOutOfRangeSnafu {
                        parent: parent_node.path.to_string(),
                        index,
                        len: children.len(),
                    })
            }
            NodeKind::File { .. } => FileHasNoChildrenSnafu {
                path: parent_node.path.to_string(),
            }
            .fail(),
        }
    }

    pub fn num_children(&self, id: NodeId) -> usize {
        self.get(id).map_or(0, Node::num_children)
    }

    pub fn contents(&self, id: NodeId) -> Option<&[u8]> {
        self.get(id).and_then(Node::contents)
    }

    /// Stores a private copy of `new_contents` in the file `id` and hands
    /// the previous buffer back to the caller.
    pub fn replace_contents(
        &mut self,
        id: NodeId,
        new_contents: &[u8],
    ) -> Result<Vec<u8>, NodeError> {
        let copy = copy_contents(new_contents)?;
        let node = self.get_mut(id).context(UnknownNodeSnafu { id })?;
        match &mut node.kind {
            NodeKind::File { contents } => Ok(std::mem::replace(contents, copy)),
            NodeKind::Directory { .. } => NotAFileSnafu {
                path: node.path.to_string(),
            }
            .fail(),
        }
    }

    fn allocate(&mut self, node: Node) -> Result<NodeId, NodeError> {
        if let Some(capacity) = self.capacity {
            ensure!(self.live < capacity, ArenaFullSnafu { capacity });
        }

        let id = match self.vacant.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.node = Some(node);
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.try_reserve(1).context(OutOfMemorySnafu)?;
                self.slots.push(Slot {
                    generation: 0,
                    node: Some(node),
                });
                NodeId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        };
        self.live += 1;

        Ok(id)
    }

    /// Frees `id` and everything below it without touching its parent.
    ///
    /// Uses an explicit work list, so the depth of the subtree is bounded by
    /// memory rather than by the call stack.
    fn release(&mut self, id: NodeId) -> usize {
        let mut pending = vec![id];
        let mut freed = 0;

        while let Some(id) = pending.pop() {
            let Some(slot) = self
                .slots
                .get_mut(id.index)
                .filter(|slot| slot.generation == id.generation)
            else {
                continue;
            };
            let Some(node) = slot.node.take() else {
                continue;
            };
            slot.generation = slot.generation.wrapping_add(1);
            self.vacant.push(id.index);
            self.live -= 1;
            freed += 1;

            if let NodeKind::Directory { children } = node.kind {
                pending.extend(children);
            }
        }

        freed
    }
}

/// Copies `bytes` into freshly reserved storage of exactly their length.
pub(crate) fn copy_contents(bytes: &[u8]) -> Result<Vec<u8>, NodeError> {
    let mut copy = Vec::new();
    copy.try_reserve_exact(bytes.len())
        .context(OutOfMemorySnafu)?;
    copy.extend_from_slice(bytes);
    Ok(copy)
}

#[derive(Debug, Snafu)]
pub enum NodeError {
    #[snafu(display("'{parent}' is not an ancestor of '{path}'"))]
    ConflictingParent { path: String, parent: String },
    #[snafu(display("'{path}' is not a direct child of '{parent}'"))]
    NotDirectChild { path: String, parent: String },
    #[snafu(display("A node without a parent must be top-level, got '{path}'"))]
    RootDepth { path: String },
    #[snafu(display("'{parent}' is a file and cannot hold children"))]
    ParentIsFile { parent: String },
    #[snafu(display("'{path}' is already a child of its parent"))]
    DuplicateChild { path: String },
    #[snafu(display("'{parent}' has {len} children, no child at index {index}"))]
    ChildOutOfRange {
        parent: String,
        index: usize,
        len: usize,
    },
    #[snafu(display("'{path}' is a file and has no children"))]
    FileHasNoChildren { path: String },
    #[snafu(display("'{path}' is not a file"))]
    NotAFile { path: String },
    #[snafu(display("No live node with id {id}"))]
    UnknownNode { id: NodeId },
    #[snafu(display("Node capacity of {capacity} reached"))]
    ArenaFull { capacity: usize },
    #[snafu(display("Failed to allocate memory"))]
    OutOfMemory { source: TryReserveError },
}

impl NodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NodeError::ConflictingParent { .. } => ErrorKind::ConflictingPath,
            NodeError::NotDirectChild { .. }
            | NodeError::RootDepth { .. }
            | NodeError::ChildOutOfRange { .. }
            | NodeError::FileHasNoChildren { .. }
            | NodeError::UnknownNode { .. } => ErrorKind::NoSuchPath,
            NodeError::ParentIsFile { .. } => ErrorKind::NotADirectory,
            NodeError::DuplicateChild { .. } => ErrorKind::AlreadyInTree,
            NodeError::NotAFile { .. } => ErrorKind::NotAFile,
            NodeError::ArenaFull { .. } | NodeError::OutOfMemory { .. } => ErrorKind::MemoryError,
        }
    }
}
