use colored::Colorize;
use filetree::FileTree;

/// The tree listing with directories highlighted. Without colours the
/// output is exactly [`FileTree::listing`].
pub fn render_listing(tree: &FileTree) -> String {
    tree.entries()
        .into_iter()
        .map(|node| {
            let path = node.path().as_str();
            if node.is_directory() {
                format!("{}\n", path.blue().bold())
            } else {
                format!("{path}\n")
            }
        })
        .collect()
}

pub fn render_stat(tree: &FileTree, path: &str) -> String {
    match tree.stat(path) {
        Ok(stat) => format!("{path}: {stat}"),
        Err(e) => format!("{path}: {}", e.to_string().red()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FileTree {
        let mut tree = FileTree::new();
        tree.init().unwrap();
        tree.insert_file("a/b/f", b"hi").unwrap();
        tree.insert_file("a/g", b"").unwrap();
        tree
    }

    #[test]
    fn plain_rendering_matches_listing() {
        colored::control::set_override(false);
        let tree = sample();
        assert_eq!(render_listing(&tree), tree.listing());
        assert_eq!(render_stat(&tree, "a/b/f"), "a/b/f: file, 2 byte(s)");
        assert_eq!(render_stat(&tree, "a/b"), "a/b: directory");
        assert_eq!(render_stat(&tree, "a/x"), "a/x: 'a/x' is not in the tree");
    }

    #[test]
    fn empty_tree_renders_nothing() {
        let mut tree = FileTree::new();
        assert_eq!(render_listing(&tree), "");
        tree.init().unwrap();
        assert_eq!(render_listing(&tree), "");
    }
}
