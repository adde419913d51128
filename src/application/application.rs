use filetree::checker::Violation;
use filetree::manifest::{ManifestError, TreeManifest};
use filetree::{FileTree, TreeError};
use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info, warn};

use crate::application::RuntimeConfig;
use crate::render::{render_listing, render_stat};

pub struct Application;

impl Application {
    pub async fn run(runtime_config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let runtime_config: RuntimeConfig = runtime_config.into();
        let manifest = TreeManifest::read(&runtime_config.manifest)
            .await
            .context(ManifestSnafu)?;
        debug!("Loaded manifest: {:?}", manifest);

        let tree = Self::build_tree(&manifest)?;
        info!("Built tree with {} node(s)", tree.len());

        print!("{}", render_listing(&tree));
        for path in &runtime_config.stat_paths {
            println!("{}", render_stat(&tree, path));
        }

        Ok(())
    }

    /// Applies the manifest to a fresh tree and verifies the result.
    fn build_tree(manifest: &TreeManifest) -> Result<FileTree, ApplicationError> {
        let mut tree = FileTree::with_config(manifest.config.clone());
        tree.init().context(TreeSnafu)?;

        let failed = manifest.apply(&mut tree);
        if failed > 0 {
            warn!(
                "{} of {} manifest entries could not be applied",
                failed,
                manifest.entries.len()
            );
        }

        tree.check().context(InvariantSnafu)?;
        Ok(tree)
    }
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered while loading the manifest"))]
    ManifestError { source: ManifestError },
    #[snafu(display("Critical failure encountered while building the tree"))]
    TreeError { source: TreeError },
    #[snafu(display("The built tree is inconsistent"))]
    InvariantError { source: Violation },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn manifest_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        write!(file, "{contents}").expect("Failed to write to temp file");
        file
    }

    #[compio::test]
    async fn run_builds_tree_from_manifest() {
        let file = manifest_file("entries:\n  - dir: a/b\n  - file: a/b/f\n    contents: hi\n");
        let config = RuntimeConfig {
            manifest: file.path().to_path_buf(),
            stat_paths: vec!["a/b/f".into(), "missing".into()],
        };

        assert!(Application::run(config).await.is_ok());
    }

    #[compio::test]
    async fn run_fails_on_missing_manifest() {
        let config = RuntimeConfig {
            manifest: PathBuf::from("does/not/exist.yaml"),
            stat_paths: Vec::new(),
        };

        let result = Application::run(config).await;
        assert!(matches!(result, Err(ApplicationError::ManifestError { .. })));
    }

    #[test]
    fn build_tree_skips_failed_entries() {
        let manifest: TreeManifest = "limits:\n  maxNodes: 3\nentries:\n  - dir: a/b\n  - dir: a/c/d\n  - file: a/f\n"
            .try_into()
            .unwrap();

        let tree = Application::build_tree(&manifest).unwrap();
        assert_eq!(tree.listing(), "a\na/f\na/b\n");
    }
}
