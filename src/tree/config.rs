/// Construction-time settings for a [`FileTree`](super::FileTree).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeConfig {
    /// Upper bound on live nodes. Insertions that would exceed it fail with
    /// a memory error and are rolled back.
    pub max_nodes: Option<usize>,
}

impl TreeConfig {
    pub fn with_max_nodes(max_nodes: usize) -> Self {
        Self {
            max_nodes: Some(max_nodes),
        }
    }
}
