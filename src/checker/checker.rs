use std::cmp::Ordering;

use snafu::{OptionExt, Snafu, ensure};

use crate::node::{Node, NodeArena, NodeId};

/// Checks a single node against its parent.
///
/// The parent's path must be the longest proper prefix of the node's path.
pub fn node_is_valid(nodes: &NodeArena, id: Option<NodeId>) -> Result<(), Violation> {
    let id = id.context(NullNodeSnafu)?;
    let node = nodes.get(id).context(DanglingNodeSnafu { id })?;

    if let Some(parent_id) = node.parent() {
        let parent = nodes
            .get(parent_id)
            .context(DanglingParentSnafu {
                path: node.path().to_string(),
            })?;
        let depth = node.path().depth();

        ensure!(
            node.path().shared_prefix_depth(parent.path()) == depth - 1
                && parent.path().depth() == depth - 1,
            ParentChildPathsSnafu {
                parent: parent.path().to_string(),
                child: node.path().to_string(),
            }
        );
    }

    Ok(())
}

/// Pre-order walk of the subtree at `id`, counting every node visited.
///
/// Siblings are compared while their parent is visited. The walk keeps its
/// own stack, so arbitrarily deep trees are fine.
///
/// An absent node is trivially valid.
pub fn tree_check(
    nodes: &NodeArena,
    id: Option<NodeId>,
    counter: &mut usize,
) -> Result<(), Violation> {
    let mut pending: Vec<NodeId> = id.into_iter().collect();

    while let Some(id) = pending.pop() {
        node_is_valid(nodes, Some(id))?;
        *counter += 1;

        let node = nodes.get(id).context(DanglingNodeSnafu { id })?;
        let mut previous: Option<&Node> = None;
        for (index, &child_id) in node.children().iter().enumerate() {
            let child = nodes.get(child_id).context(MissingChildSnafu {
                parent: node.path().to_string(),
                index,
            })?;

            ensure!(
                child.parent() == Some(id),
                ParentLinkSnafu {
                    parent: node.path().to_string(),
                    child: child.path().to_string(),
                }
            );

            if let Some(previous) = previous {
                match child.compare(previous) {
                    Ordering::Less => {
                        return UnsortedChildrenSnafu {
                            parent: node.path().to_string(),
                        }
                        .fail();
                    }
                    Ordering::Equal => {
                        return DuplicateChildrenSnafu {
                            path: child.path().to_string(),
                        }
                        .fail();
                    }
                    Ordering::Greater => {}
                }
            }
            previous = Some(child);
        }

        pending.extend(node.children().iter().rev().copied());
    }

    Ok(())
}

/// Checks the top-level tree state, then every node reachable from `root`.
pub fn tree_is_valid(
    initialized: bool,
    root: Option<NodeId>,
    count: usize,
    nodes: &NodeArena,
) -> Result<(), Violation> {
    if !initialized {
        ensure!(count == 0, UninitializedCountSnafu { count });
        ensure!(root.is_none(), UninitializedRootSnafu);
        return Ok(());
    }

    match root {
        None => {
            ensure!(count == 0, EmptyTreeCountSnafu { count });
        }
        Some(root_id) => {
            ensure!(count != 0, RootWithoutCountSnafu);
            let root_node = nodes.get(root_id).context(DanglingNodeSnafu { id: root_id })?;
            ensure!(
                root_node.parent().is_none(),
                RootHasParentSnafu {
                    path: root_node.path().to_string(),
                }
            );
            ensure!(
                root_node.path().depth() == 1,
                RootNotTopLevelSnafu {
                    path: root_node.path().to_string(),
                }
            );
        }
    }

    let mut counted = 0;
    tree_check(nodes, root, &mut counted)?;
    ensure!(
        counted == count,
        CountMismatchSnafu {
            counted,
            recorded: count,
        }
    );

    Ok(())
}

#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
pub enum Violation {
    #[snafu(display("A node is missing"))]
    NullNode,
    #[snafu(display("Node id {id} does not refer to a live node"))]
    DanglingNode { id: NodeId },
    #[snafu(display("Parent of ({path}) is not a live node"))]
    DanglingParent { path: String },
    #[snafu(display("P-C nodes don't have P-C paths: ({parent}) ({child})"))]
    ParentChildPaths { parent: String, child: String },
    #[snafu(display("Child ({child}) does not point back to its parent ({parent})"))]
    ParentLink { parent: String, child: String },
    #[snafu(display("Child {index} of ({parent}) is not a live node"))]
    MissingChild { parent: String, index: usize },
    #[snafu(display("The children of ({parent}) are not in lexicographic order"))]
    UnsortedChildren { parent: String },
    #[snafu(display("There are duplicates of ({path}) among its parent's children"))]
    DuplicateChildren { path: String },
    #[snafu(display("Not initialized, but count is {count} instead of 0"))]
    UninitializedCount { count: usize },
    #[snafu(display("Not initialized, but the root is set"))]
    UninitializedRoot,
    #[snafu(display("Initialized without a root, but count is {count} instead of 0"))]
    EmptyTreeCount { count: usize },
    #[snafu(display("Initialized with a root, but count is 0"))]
    RootWithoutCount,
    #[snafu(display("Root ({path}) has a parent"))]
    RootHasParent { path: String },
    #[snafu(display("Root ({path}) is not top-level"))]
    RootNotTopLevel { path: String },
    #[snafu(display("Count is {recorded}, but {counted} node(s) are reachable from the root"))]
    CountMismatch { counted: usize, recorded: usize },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeKind;
    use crate::path::TreePath;

    fn path(s: &str) -> TreePath {
        TreePath::parse(s).expect("valid path")
    }

    /// a, a/b, a/b/f (file), a/c
    fn sample() -> (NodeArena, NodeId) {
        let mut nodes = NodeArena::new(None);
        let root = nodes
            .create(path("a"), None, NodeKind::empty_directory())
            .unwrap();
        let b = nodes
            .create(path("a/b"), Some(root), NodeKind::empty_directory())
            .unwrap();
        nodes
            .create(
                path("a/b/f"),
                Some(b),
                NodeKind::File {
                    contents: b"hi".to_vec(),
                },
            )
            .unwrap();
        nodes
            .create(path("a/c"), Some(root), NodeKind::empty_directory())
            .unwrap();
        (nodes, root)
    }

    #[test]
    fn well_formed_tree_is_valid() {
        let (nodes, root) = sample();
        assert_eq!(tree_is_valid(true, Some(root), 4, &nodes), Ok(()));

        let mut counter = 0;
        assert_eq!(tree_check(&nodes, Some(root), &mut counter), Ok(()));
        assert_eq!(counter, 4);
    }

    #[test]
    fn empty_states_are_valid() {
        let nodes = NodeArena::default();
        assert_eq!(tree_is_valid(false, None, 0, &nodes), Ok(()));
        assert_eq!(tree_is_valid(true, None, 0, &nodes), Ok(()));
    }

    #[test]
    fn uninitialized_tree_must_be_empty() {
        let (nodes, root) = sample();
        assert_eq!(
            tree_is_valid(false, None, 3, &nodes),
            Err(Violation::UninitializedCount { count: 3 })
        );
        assert_eq!(
            tree_is_valid(false, Some(root), 0, &nodes),
            Err(Violation::UninitializedRoot)
        );
    }

    #[test]
    fn count_must_match_reachable_nodes() {
        let (nodes, root) = sample();
        assert_eq!(
            tree_is_valid(true, Some(root), 5, &nodes),
            Err(Violation::CountMismatch {
                counted: 4,
                recorded: 5
            })
        );
        assert_eq!(
            tree_is_valid(true, Some(root), 0, &nodes),
            Err(Violation::RootWithoutCount)
        );
        assert_eq!(
            tree_is_valid(true, None, 2, &nodes),
            Err(Violation::EmptyTreeCount { count: 2 })
        );
    }

    #[test]
    fn null_node_is_invalid() {
        let nodes = NodeArena::default();
        assert_eq!(node_is_valid(&nodes, None), Err(Violation::NullNode));
        let mut counter = 0;
        assert_eq!(tree_check(&nodes, None, &mut counter), Ok(()));
        assert_eq!(counter, 0);
    }

    #[test]
    fn unsorted_children_are_detected() {
        let (mut nodes, root) = sample();
        if let Some(node) = nodes.get_mut(root) {
            if let NodeKind::Directory { children } = &mut node.kind {
                children.reverse();
            }
        }
        assert_eq!(
            tree_is_valid(true, Some(root), 4, &nodes),
            Err(Violation::UnsortedChildren {
                parent: "a".to_string()
            })
        );
    }

    #[test]
    fn duplicate_children_are_detected() {
        let (mut nodes, root) = sample();
        if let Some(node) = nodes.get_mut(root) {
            if let NodeKind::Directory { children } = &mut node.kind {
                children[1] = children[0];
            }
        }
        assert!(matches!(
            tree_is_valid(true, Some(root), 4, &nodes),
            Err(Violation::DuplicateChildren { .. })
        ));
    }

    #[test]
    fn mismatched_parent_paths_are_detected() {
        let (mut nodes, root) = sample();
        let c = nodes.get_child(root, 1).unwrap();
        if let Some(node) = nodes.get_mut(c) {
            node.path = path("x/c");
        }
        assert_eq!(
            node_is_valid(&nodes, Some(c)),
            Err(Violation::ParentChildPaths {
                parent: "a".to_string(),
                child: "x/c".to_string(),
            })
        );
        assert!(tree_is_valid(true, Some(root), 4, &nodes).is_err());
    }

    #[test]
    fn broken_back_reference_is_detected() {
        let (mut nodes, root) = sample();
        let b = nodes.get_child(root, 0).unwrap();
        let f = nodes.get_child(b, 0).unwrap();
        if let Some(node) = nodes.get_mut(f) {
            node.parent = Some(root);
        }
        assert!(tree_is_valid(true, Some(root), 4, &nodes).is_err());
    }

    #[test]
    fn very_deep_chain_is_checked() {
        let mut nodes = NodeArena::new(None);
        let root = nodes
            .create(path("a"), None, NodeKind::empty_directory())
            .unwrap();
        let mut parent = root;
        let mut current = String::from("a");
        for _ in 1..10_000 {
            current.push_str("/a");
            parent = nodes
                .create(path(&current), Some(parent), NodeKind::empty_directory())
                .unwrap();
        }

        assert_eq!(tree_is_valid(true, Some(root), 10_000, &nodes), Ok(()));
    }

    #[test]
    fn root_must_not_have_parent() {
        let (mut nodes, root) = sample();
        let b = nodes.get_child(root, 0).unwrap();
        if let Some(node) = nodes.get_mut(root) {
            node.parent = Some(b);
        }
        assert_eq!(
            tree_is_valid(true, Some(root), 4, &nodes),
            Err(Violation::RootHasParent {
                path: "a".to_string()
            })
        );
    }
}
