use std::borrow::Cow;

use hashlink::LinkedHashMap;
use saphyr::{Scalar, Yaml};
use tracing::debug;

use crate::tree::{FileTree, TreeError};

/// One tree operation read from a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestEntry {
    Dir { path: String },
    File { path: String, contents: Vec<u8> },
    Replace { path: String, contents: Vec<u8> },
    RmDir { path: String },
    RmFile { path: String },
}

/// The operation keys an entry can carry, exactly one per entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Dir,
    File,
    Replace,
    RmDir,
    RmFile,
}

impl Operation {
    const ALL: [Operation; 5] = [
        Operation::Dir,
        Operation::File,
        Operation::Replace,
        Operation::RmDir,
        Operation::RmFile,
    ];

    fn key(self) -> &'static str {
        match self {
            Operation::Dir => "dir",
            Operation::File => "file",
            Operation::Replace => "replace",
            Operation::RmDir => "rmDir",
            Operation::RmFile => "rmFile",
        }
    }

    fn takes_contents(self) -> bool {
        matches!(self, Operation::File | Operation::Replace)
    }
}

const CONTENTS_KEY: &str = "contents";

pub(super) fn key(name: &'static str) -> Yaml<'static> {
    Yaml::Value(Scalar::String(Cow::Borrowed(name)))
}

impl ManifestEntry {
    /// Parses a mapping such as `{ file: a/b, contents: "hi" }`.
    ///
    /// Exactly one operation key must be present and name a path. Only
    /// `file` and `replace` accept `contents`; no other keys are allowed.
    pub fn from_entry_yaml(entry: &LinkedHashMap<Yaml, Yaml>) -> Result<Self, &'static str> {
        let known = |name: &str| {
            name == CONTENTS_KEY || Operation::ALL.iter().any(|op| op.key() == name)
        };
        if !entry.keys().all(|k| k.as_str().is_some_and(known)) {
            return Err("unknown key");
        }

        let mut operations = Operation::ALL
            .into_iter()
            .filter_map(|op| entry.get(&key(op.key())).map(|value| (op, value)));

        let (operation, value) = operations.next().ok_or("no operation key")?;
        if operations.next().is_some() {
            return Err("more than one operation key");
        }

        let path = value
            .as_str()
            .ok_or("operation path is not a string")?
            .to_string();
        let contents = match entry.get(&key(CONTENTS_KEY)) {
            None => Vec::new(),
            Some(_) if !operation.takes_contents() => {
                return Err("contents given for an operation that takes none");
            }
            Some(contents) => contents
                .as_str()
                .ok_or("contents is not a string")?
                .as_bytes()
                .to_vec(),
        };

        debug!("Parsed manifest entry '{}' for '{path}'", operation.key());
        Ok(match operation {
            Operation::Dir => ManifestEntry::Dir { path },
            Operation::File => ManifestEntry::File { path, contents },
            Operation::Replace => ManifestEntry::Replace { path, contents },
            Operation::RmDir => ManifestEntry::RmDir { path },
            Operation::RmFile => ManifestEntry::RmFile { path },
        })
    }

    pub fn path(&self) -> &str {
        match self {
            ManifestEntry::Dir { path }
            | ManifestEntry::File { path, .. }
            | ManifestEntry::Replace { path, .. }
            | ManifestEntry::RmDir { path }
            | ManifestEntry::RmFile { path } => path,
        }
    }

    pub fn apply(&self, tree: &mut FileTree) -> Result<(), TreeError> {
        match self {
            ManifestEntry::Dir { path } => tree.insert_dir(path),
            ManifestEntry::File { path, contents } => tree.insert_file(path, contents),
            ManifestEntry::Replace { path, contents } => {
                tree.replace_file_contents(path, contents).map(|_| ())
            }
            ManifestEntry::RmDir { path } => tree.rm_dir(path),
            ManifestEntry::RmFile { path } => tree.rm_file(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_kind::ErrorKind;
    use rstest::*;
    use saphyr::LoadableYamlNode;

    fn parse(yaml: &str) -> Result<ManifestEntry, &'static str> {
        let documents = Yaml::load_from_str(yaml).expect("valid yaml");
        let mapping = documents[0].as_mapping().expect("mapping");
        ManifestEntry::from_entry_yaml(mapping)
    }

    #[rstest]
    #[case("dir: a/b", ManifestEntry::Dir { path: "a/b".into() })]
    #[case("rmDir: a", ManifestEntry::RmDir { path: "a".into() })]
    #[case("rmFile: a/f", ManifestEntry::RmFile { path: "a/f".into() })]
    #[case(
        "file: a/f\ncontents: hi",
        ManifestEntry::File { path: "a/f".into(), contents: b"hi".to_vec() }
    )]
    #[case("file: a/f", ManifestEntry::File { path: "a/f".into(), contents: Vec::new() })]
    #[case(
        "replace: a/f\ncontents: \"new\"",
        ManifestEntry::Replace { path: "a/f".into(), contents: b"new".to_vec() }
    )]
    fn parses_operations(#[case] yaml: &str, #[case] expected: ManifestEntry) {
        assert_eq!(parse(yaml), Ok(expected));
    }

    #[rstest]
    #[case("contents: hi")]
    #[case("dir: a\nfile: a/f")]
    #[case("dir: [a, b]")]
    #[case("file: a/f\ncontents: [1, 2]")]
    #[case("dir: a\ncontents: hi")]
    #[case("rmDir: a\ncontents: hi")]
    #[case("rmFile: a/f\ncontents: hi")]
    #[case("rmfile: a/f")]
    #[case("dir: a\nmode: 755")]
    fn rejects_invalid_entries(#[case] yaml: &str) {
        assert!(parse(yaml).is_err());
    }

    #[test]
    fn apply_runs_the_operation() {
        let mut tree = FileTree::new();
        tree.init().unwrap();

        ManifestEntry::File {
            path: "a/f".into(),
            contents: b"one".to_vec(),
        }
        .apply(&mut tree)
        .unwrap();
        ManifestEntry::Replace {
            path: "a/f".into(),
            contents: b"two".to_vec(),
        }
        .apply(&mut tree)
        .unwrap();
        assert_eq!(tree.get_file_contents("a/f").unwrap(), b"two");

        let error = ManifestEntry::RmDir { path: "a/f".into() }
            .apply(&mut tree)
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotADirectory);

        ManifestEntry::RmFile { path: "a/f".into() }
            .apply(&mut tree)
            .unwrap();
        assert_eq!(tree.len(), 1);
    }
}
