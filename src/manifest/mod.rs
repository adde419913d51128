//! YAML manifests describing a tree to build.
//!
//! A manifest carries optional `limits` for the tree and an ordered list of
//! `entries`, each one a single tree operation.

mod manifest_entry;
mod tree_manifest;

pub use manifest_entry::ManifestEntry;
pub use tree_manifest::{ManifestError, TreeManifest};
