use std::path::Path;

use compio::fs;
use saphyr::{LoadableYamlNode, Yaml};
use snafu::prelude::*;
use tracing::{debug, warn};

use crate::manifest::ManifestEntry;
use crate::manifest::manifest_entry::key;
use crate::tree::{FileTree, TreeConfig};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeManifest {
    pub config: TreeConfig,
    pub entries: Vec<ManifestEntry>,
}

impl TreeManifest {
    pub async fn read(path: &Path) -> Result<Self, ManifestError> {
        debug!("Reading manifest file: {}", path.display());
        let bytes = fs::read(path).await.context(ReadSnafu {
            file_path: path.display().to_string(),
        })?;
        debug!("Successfully read manifest file: {} bytes", bytes.len());

        let contents = String::from_utf8(bytes).context(EncodingSnafu {
            file_path: path.display().to_string(),
        })?;
        contents.as_str().try_into()
    }

    /// Applies every entry in order. Failing entries are logged and skipped;
    /// returns how many failed.
    pub fn apply(&self, tree: &mut FileTree) -> usize {
        let mut failed = 0;
        for entry in &self.entries {
            if let Err(e) = entry.apply(tree) {
                warn!("Failed to apply manifest entry for '{}': {}", entry.path(), e);
                failed += 1;
            }
        }
        debug!(
            "Applied {} manifest entries, {} failed",
            self.entries.len(),
            failed
        );
        failed
    }

    fn parse_limits(limits: &Yaml) -> Result<TreeConfig, ManifestError> {
        let limits = limits.as_mapping().context(LimitsNotMapSnafu)?;
        let max_nodes = match limits.get(&key("maxNodes")) {
            None => None,
            Some(value) => {
                let max_nodes = value
                    .as_integer()
                    .and_then(|n| usize::try_from(n).ok())
                    .filter(|&n| n > 0)
                    .context(InvalidMaxNodesSnafu)?;
                Some(max_nodes)
            }
        };
        Ok(TreeConfig { max_nodes })
    }

    fn parse_entries(entries: &Yaml) -> Result<Vec<ManifestEntry>, ManifestError> {
        entries
            .as_sequence()
            .context(EntriesNotSequenceSnafu)?
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let mapping = entry.as_mapping().context(InvalidEntrySnafu {
                    index,
                    reason: "entry is not a map",
                })?;
                ManifestEntry::from_entry_yaml(mapping)
                    .map_err(|reason| ManifestError::InvalidEntry { index, reason })
            })
            .collect()
    }
}

impl TryFrom<&str> for TreeManifest {
    type Error = ManifestError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let documents = Yaml::load_from_str(contents).context(ParseSnafu)?;
        let document = documents.first().context(MalformedManifestSnafu)?;
        let top_level = document.as_mapping().context(TopLevelNotMapSnafu)?;

        let config = match top_level.get(&key("limits")) {
            Some(limits) => Self::parse_limits(limits)?,
            None => TreeConfig::default(),
        };
        let entries = match top_level.get(&key("entries")) {
            Some(entries) => Self::parse_entries(entries)?,
            None => Vec::new(),
        };

        Ok(TreeManifest { config, entries })
    }
}

#[derive(Debug, Snafu)]
pub enum ManifestError {
    #[snafu(display("Failed to read the manifest file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Manifest file {} is not valid UTF-8", file_path))]
    EncodingError {
        file_path: String,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Failed to parse the manifest"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Improperly formatted manifest"))]
    MalformedManifest,
    #[snafu(display("Top level of the manifest should be a map"))]
    TopLevelNotMap,
    #[snafu(display("Limits section should be a map"))]
    LimitsNotMap,
    #[snafu(display("maxNodes should be a positive integer"))]
    InvalidMaxNodes,
    #[snafu(display("Entries section should be a sequence"))]
    EntriesNotSequence,
    #[snafu(display("Entry {} is invalid: {}", index, reason))]
    InvalidEntry { index: usize, reason: &'static str },
}
