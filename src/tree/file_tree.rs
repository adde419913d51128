use std::fmt;

use snafu::{OptionExt, ResultExt, ensure};
use tracing::{debug, trace, warn};

use crate::checker::{self, Violation};
use crate::node::{Node, NodeArena, NodeId, NodeKind, copy_contents};
use crate::path::TreePath;
use crate::tree::error::*;
use crate::tree::{Stat, TreeConfig, TreeError};

/// What the deepest node of an insertion becomes.
enum Leaf {
    Directory,
    File(Vec<u8>),
}

impl Leaf {
    fn into_kind(self) -> NodeKind {
        match self {
            Leaf::Directory => NodeKind::empty_directory(),
            Leaf::File(contents) => NodeKind::File { contents },
        }
    }
}

/// An in-memory hierarchy of directories and files.
///
/// The tree starts out uninitialized; [`init`](Self::init) must be called
/// before any other operation succeeds.
#[derive(Debug, Default)]
pub struct FileTree {
    initialized: bool,
    root: Option<NodeId>,
    count: usize,
    nodes: NodeArena,
    config: TreeConfig,
}

impl FileTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: TreeConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn init(&mut self) -> Result<(), TreeError> {
        ensure!(!self.initialized, AlreadyInitializedSnafu);

        self.nodes.reset(self.config.max_nodes);
        self.root = None;
        self.count = 0;
        self.initialized = true;

        debug!("Initialized file tree with {:?}", self.config);
        Ok(())
    }

    /// Frees every node and returns to the uninitialized state.
    pub fn destroy(&mut self) -> Result<(), TreeError> {
        ensure!(self.initialized, NotInitializedSnafu);

        if let Some(root) = self.root.take() {
            let freed = self.nodes.destroy(root);
            self.count -= freed;
            debug!("Destroyed file tree, {freed} node(s) freed");
        }
        self.nodes.clear();
        self.count = 0;
        self.initialized = false;

        self.debug_check();
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// The `index`-th child of the directory `parent`, in path order.
    pub fn child(&self, parent: NodeId, index: usize) -> Result<NodeId, TreeError> {
        self.nodes.get_child(parent, index).with_context(|_| NodeSnafu {
            path: self.path_of(parent),
        })
    }

    pub fn find_node(&self, path: &str) -> Result<&Node, TreeError> {
        let id = self.find_id(path)?;
        self.nodes.get(id).context(NoSuchPathSnafu { path })
    }

    pub fn insert_dir(&mut self, path: &str) -> Result<(), TreeError> {
        let created = self.insert(path, Leaf::Directory)?;
        debug!("Inserted directory '{path}', {created} new node(s)");
        Ok(())
    }

    /// Inserts a file holding a private copy of `contents`, creating any
    /// missing ancestors as directories.
    pub fn insert_file(&mut self, path: &str, contents: &[u8]) -> Result<(), TreeError> {
        ensure!(self.initialized, NotInitializedSnafu);
        let contents = copy_contents(contents).context(NodeSnafu { path })?;

        let created = self.insert(path, Leaf::File(contents))?;
        debug!("Inserted file '{path}', {created} new node(s)");
        Ok(())
    }

    pub fn rm_dir(&mut self, path: &str) -> Result<(), TreeError> {
        self.remove(path, false)
    }

    pub fn rm_file(&mut self, path: &str) -> Result<(), TreeError> {
        self.remove(path, true)
    }

    pub fn contains_dir(&self, path: &str) -> bool {
        self.find_node(path).is_ok_and(Node::is_directory)
    }

    pub fn contains_file(&self, path: &str) -> bool {
        self.find_node(path).is_ok_and(Node::is_file)
    }

    pub fn stat(&self, path: &str) -> Result<Stat, TreeError> {
        let node = self.find_node(path)?;
        Ok(match node.contents() {
            Some(contents) => Stat::File {
                size: contents.len(),
            },
            None => Stat::Directory,
        })
    }

    pub fn get_file_contents(&self, path: &str) -> Result<&[u8], TreeError> {
        self.find_node(path)?
            .contents()
            .context(NotAFileSnafu { path })
    }

    /// Swaps in a private copy of `new_contents` and returns the old buffer.
    pub fn replace_file_contents(
        &mut self,
        path: &str,
        new_contents: &[u8],
    ) -> Result<Vec<u8>, TreeError> {
        let id = self.find_id(path)?;
        ensure!(
            self.nodes.get(id).is_some_and(Node::is_file),
            NotAFileSnafu { path }
        );

        let previous = self
            .nodes
            .replace_contents(id, new_contents)
            .context(NodeSnafu { path })?;
        debug!(
            "Replaced contents of '{path}': {} -> {} byte(s)",
            previous.len(),
            new_contents.len()
        );

        self.debug_check();
        Ok(previous)
    }

    /// Validates every tree invariant, stopping at the first violation.
    pub fn check(&self) -> Result<(), Violation> {
        checker::tree_is_valid(self.initialized, self.root, self.count, &self.nodes)
    }

    /// Every node in listing order: a directory, then its files, then its
    /// subdirectories, each group sorted by path.
    pub fn entries(&self) -> Vec<&Node> {
        let mut entries = Vec::with_capacity(self.count);
        if let Some(root) = self.root {
            self.collect_entries(root, &mut entries);
        }
        entries
    }

    /// One path per line in [`entries`](Self::entries) order. Empty when
    /// the tree is uninitialized or has no nodes.
    pub fn listing(&self) -> String {
        let entries = self.entries();
        let total = entries.iter().map(|node| node.path().str_len() + 1).sum();

        let mut listing = String::with_capacity(total);
        for node in entries {
            listing.push_str(node.path().as_str());
            listing.push('\n');
        }
        listing
    }

    fn collect_entries<'a>(&'a self, root: NodeId, entries: &mut Vec<&'a Node>) {
        let mut pending = vec![root];
        while let Some(id) = pending.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            entries.push(node);

            entries.extend(
                node.children()
                    .iter()
                    .filter_map(|&child| self.nodes.get(child))
                    .filter(|child| child.is_file()),
            );
            // Reversed so the smallest subdirectory is popped first.
            pending.extend(
                node.children()
                    .iter()
                    .rev()
                    .copied()
                    .filter(|&child| self.nodes.get(child).is_some_and(Node::is_directory)),
            );
        }
    }

    /// Walks from the root towards `path` and returns the deepest node whose
    /// path is a prefix of it, or `None` for an empty tree.
    fn traverse_path(&self, path: &TreePath) -> Result<Option<NodeId>, TreeError> {
        let Some(root) = self.root else {
            return Ok(None);
        };

        let top = path.prefix(1).context(InvalidPathSnafu)?;
        let root_node = self.nodes.get(root).context(NoSuchPathSnafu {
            path: path.to_string(),
        })?;
        ensure!(
            root_node.path() == &top,
            ConflictingPathSnafu {
                path: path.to_string(),
                root: root_node.path().to_string(),
            }
        );

        let mut current = root;
        for level in 2..=path.depth() {
            let prefix = path.prefix(level).context(InvalidPathSnafu)?;
            match self.nodes.has_child(current, &prefix) {
                Ok(index) => {
                    current = self
                        .nodes
                        .get_child(current, index)
                        .context(NodeSnafu {
                            path: prefix.to_string(),
                        })?;
                    trace!("Matched '{prefix}'");
                }
                Err(_) => break,
            }
        }

        Ok(Some(current))
    }

    fn find_id(&self, pathname: &str) -> Result<NodeId, TreeError> {
        ensure!(self.initialized, NotInitializedSnafu);

        let path = TreePath::parse(pathname).context(InvalidPathSnafu)?;
        let found = self
            .traverse_path(&path)?
            .context(NoSuchPathSnafu { path: pathname })?;

        let exact = self
            .nodes
            .get(found)
            .is_some_and(|node| node.path() == &path);
        ensure!(exact, NoSuchPathSnafu { path: pathname });

        Ok(found)
    }

    /// Creates `pathname` and any missing ancestors. Returns the number of
    /// nodes created.
    fn insert(&mut self, pathname: &str, leaf: Leaf) -> Result<usize, TreeError> {
        ensure!(self.initialized, NotInitializedSnafu);

        let path = TreePath::parse(pathname).context(InvalidPathSnafu)?;
        let ancestor = self.traverse_path(&path)?;

        match ancestor.and_then(|id| self.nodes.get(id)) {
            Some(node) => {
                ensure!(node.path() != &path, AlreadyInTreeSnafu { path: pathname });
                ensure!(
                    node.is_directory(),
                    NotADirectorySnafu {
                        path: node.path().to_string(),
                    }
                );
            }
            None => {
                if let Some(root) = self.root.and_then(|id| self.nodes.get(id)) {
                    return ConflictingPathSnafu {
                        path: pathname,
                        root: root.path().to_string(),
                    }
                    .fail();
                }
            }
        }
        if matches!(leaf, Leaf::File(_)) {
            ensure!(path.depth() > 1, FileAtRootSnafu { path: pathname });
        }

        let (first_new, created) = self.build_missing(&path, ancestor, leaf)?;
        if self.root.is_none() {
            self.root = Some(first_new);
        }
        self.count += created;

        self.debug_check();
        Ok(created)
    }

    /// Creates every level of `path` below `ancestor`, one node at a time.
    /// On failure everything created so far is freed again.
    fn build_missing(
        &mut self,
        path: &TreePath,
        ancestor: Option<NodeId>,
        leaf: Leaf,
    ) -> Result<(NodeId, usize), TreeError> {
        let first_level = ancestor
            .and_then(|id| self.nodes.get(id))
            .map_or(1, |node| node.path().depth() + 1);
        let depth = path.depth();

        let mut leaf = Some(leaf);
        let mut parent = ancestor;
        let mut first_new = None;
        let mut created = 0;

        for level in first_level..=depth {
            let kind = if level == depth {
                leaf.take()
                    .map_or_else(NodeKind::empty_directory, Leaf::into_kind)
            } else {
                NodeKind::empty_directory()
            };

            match self.create_level(path, level, parent, kind) {
                Ok(id) => {
                    if first_new.is_none() {
                        first_new = Some(id);
                    }
                    parent = Some(id);
                    created += 1;
                }
                Err(error) => {
                    if let Some(first) = first_new {
                        let undone = self.nodes.destroy(first);
                        warn!("Rolled back {undone} node(s) while inserting '{path}': {error}");
                    }
                    return Err(error);
                }
            }
        }

        first_new
            .map(|first| (first, created))
            .context(AlreadyInTreeSnafu {
                path: path.to_string(),
            })
    }

    fn create_level(
        &mut self,
        path: &TreePath,
        level: usize,
        parent: Option<NodeId>,
        kind: NodeKind,
    ) -> Result<NodeId, TreeError> {
        let prefix = path.prefix(level).context(InvalidPathSnafu)?;
        let label = prefix.to_string();
        self.nodes
            .create(prefix, parent, kind)
            .context(NodeSnafu { path: label })
    }

    fn remove(&mut self, pathname: &str, expect_file: bool) -> Result<(), TreeError> {
        let id = self.find_id(pathname)?;
        let is_file = self.nodes.get(id).is_some_and(Node::is_file);
        match (expect_file, is_file) {
            (false, true) => return NotADirectorySnafu { path: pathname }.fail(),
            (true, false) => return NotAFileSnafu { path: pathname }.fail(),
            _ => {}
        }

        let freed = self.nodes.destroy(id);
        self.count -= freed;
        if self.count == 0 {
            self.root = None;
        }
        debug!("Removed '{pathname}', {freed} node(s) freed");

        self.debug_check();
        Ok(())
    }

    fn path_of(&self, id: NodeId) -> String {
        self.nodes
            .get(id)
            .map_or_else(|| id.to_string(), |node| node.path().to_string())
    }

    fn debug_check(&self) {
        debug_assert_eq!(self.check(), Ok(()));
    }
}

impl fmt::Display for FileTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in self.entries() {
            writeln!(f, "{}", node.path())?;
        }
        Ok(())
    }
}
