use std::cmp::Ordering;
use std::str::FromStr;

use derive_more::Display;
use snafu::{Snafu, ensure};

use crate::error_kind::ErrorKind;

pub const SEPARATOR: char = '/';

/// A slash-separated path with at least one non-empty component.
///
/// The rendered string is kept verbatim next to the offsets at which each
/// component ends, so prefixes and component views are plain slices.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash)]
#[display("{pathname}")]
pub struct TreePath {
    pathname: String,
    ends: Vec<usize>,
}

impl TreePath {
    pub fn parse(pathname: &str) -> Result<Self, PathError> {
        ensure!(
            !pathname.is_empty(),
            BadFormatSnafu {
                pathname,
                reason: "path is empty",
            }
        );

        let mut ends = Vec::new();
        let mut offset = 0;
        for component in pathname.split(SEPARATOR) {
            ensure!(
                !component.is_empty(),
                BadFormatSnafu {
                    pathname,
                    reason: "path contains an empty component",
                }
            );
            // Listings print one path per line.
            ensure!(
                !component.chars().any(char::is_control),
                BadFormatSnafu {
                    pathname,
                    reason: "path contains a control character",
                }
            );
            offset += component.len();
            ends.push(offset);
            offset += SEPARATOR.len_utf8();
        }

        Ok(Self {
            pathname: pathname.to_owned(),
            ends,
        })
    }

    /// Number of components; always at least 1.
    pub fn depth(&self) -> usize {
        self.ends.len()
    }

    pub fn as_str(&self) -> &str {
        &self.pathname
    }

    /// Length of the rendered string in bytes.
    pub fn str_len(&self) -> usize {
        self.pathname.len()
    }

    pub fn components(&self) -> impl Iterator<Item = &str> + '_ {
        self.ends.iter().scan(0, move |start, &end| {
            let component = &self.pathname[*start..end];
            *start = end + SEPARATOR.len_utf8();
            Some(component)
        })
    }

    /// Last component of the path.
    pub fn name(&self) -> &str {
        let start = match self.ends.len() {
            0 | 1 => 0,
            n => self.ends[n - 2] + SEPARATOR.len_utf8(),
        };
        &self.pathname[start..]
    }

    /// The first `depth` components as a new path.
    pub fn prefix(&self, depth: usize) -> Result<TreePath, PathError> {
        ensure!(
            depth >= 1 && depth <= self.depth(),
            PrefixOutOfRangeSnafu {
                pathname: self.pathname.clone(),
                depth: self.depth(),
                requested: depth,
            }
        );

        let end = self.ends[depth - 1];
        Ok(Self {
            pathname: self.pathname[..end].to_owned(),
            ends: self.ends[..depth].to_vec(),
        })
    }

    /// Number of leading components both paths have in common.
    pub fn shared_prefix_depth(&self, other: &TreePath) -> usize {
        self.components()
            .zip(other.components())
            .take_while(|(ours, theirs)| ours == theirs)
            .count()
    }

    /// Whether `ancestor` names this path or one of its ancestors.
    pub fn starts_with(&self, ancestor: &TreePath) -> bool {
        self.shared_prefix_depth(ancestor) == ancestor.depth()
    }
}

impl Ord for TreePath {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components().cmp(other.components())
    }
}

impl PartialOrd for TreePath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl FromStr for TreePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for TreePath {
    type Error = PathError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl AsRef<str> for TreePath {
    fn as_ref(&self) -> &str {
        &self.pathname
    }
}

#[derive(Debug, Snafu, Clone, PartialEq, Eq)]
pub enum PathError {
    #[snafu(display("Malformed path '{pathname}': {reason}"))]
    BadFormat {
        pathname: String,
        reason: &'static str,
    },
    #[snafu(display(
        "Path '{pathname}' has depth {depth}, no prefix of depth {requested} exists"
    ))]
    PrefixOutOfRange {
        pathname: String,
        depth: usize,
        requested: usize,
    },
}

impl PathError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PathError::BadFormat { .. } => ErrorKind::BadFormat,
            PathError::PrefixOutOfRange { .. } => ErrorKind::NoSuchPath,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::*;

    fn path(s: &str) -> TreePath {
        TreePath::parse(s).expect("valid path")
    }

    #[rstest]
    #[case("a", 1)]
    #[case("a/b", 2)]
    #[case("a/b/c", 3)]
    #[case("root/with spaces/ünïcode", 3)]
    fn parse_counts_components(#[case] input: &str, #[case] depth: usize) {
        let parsed = path(input);
        assert_eq!(parsed.depth(), depth);
        assert_eq!(parsed.to_string(), input);
        assert_eq!(parsed.str_len(), input.len());
    }

    #[rstest]
    #[case("")]
    #[case("/")]
    #[case("/a")]
    #[case("a/")]
    #[case("a//b")]
    #[case("a/b\nc")]
    #[case("a\r/b")]
    #[case("a/\tb")]
    fn parse_rejects_malformed_paths(#[case] input: &str) {
        let result = TreePath::parse(input);
        assert!(matches!(result, Err(PathError::BadFormat { .. })));
        assert_eq!(result.unwrap_err().kind(), ErrorKind::BadFormat);
    }

    #[test]
    fn components_and_name() {
        let parsed = path("usr/local/bin");
        assert_eq!(
            parsed.components().collect::<Vec<_>>(),
            vec!["usr", "local", "bin"]
        );
        assert_eq!(parsed.name(), "bin");
        assert_eq!(path("usr").name(), "usr");
    }

    #[test]
    fn prefix_yields_leading_components() {
        let parsed = path("a/bb/ccc");
        assert_eq!(parsed.prefix(1).unwrap(), path("a"));
        assert_eq!(parsed.prefix(2).unwrap(), path("a/bb"));
        assert_eq!(parsed.prefix(3).unwrap(), parsed);
        assert_eq!(parsed.prefix(2).unwrap().depth(), 2);
    }

    #[rstest]
    #[case(0)]
    #[case(4)]
    fn prefix_out_of_range(#[case] requested: usize) {
        let result = path("a/b/c").prefix(requested);
        assert!(matches!(
            result,
            Err(PathError::PrefixOutOfRange { depth: 3, .. })
        ));
        assert_eq!(result.unwrap_err().kind(), ErrorKind::NoSuchPath);
    }

    #[rstest]
    #[case("a/b/c", "a/b/d", 2)]
    #[case("a/b/c", "a/b", 2)]
    #[case("a", "b", 0)]
    #[case("a/b", "a/b", 2)]
    #[case("ab/c", "a/bc", 0)]
    fn shared_prefix_depth_counts_common_components(
        #[case] first: &str,
        #[case] second: &str,
        #[case] expected: usize,
    ) {
        assert_eq!(path(first).shared_prefix_depth(&path(second)), expected);
        assert_eq!(path(second).shared_prefix_depth(&path(first)), expected);
    }

    #[test]
    fn starts_with_requires_whole_components() {
        assert!(path("a/b/c").starts_with(&path("a/b")));
        assert!(path("a/b").starts_with(&path("a/b")));
        assert!(!path("a/bc").starts_with(&path("a/b")));
        assert!(!path("a").starts_with(&path("a/b")));
    }

    #[rstest]
    #[case("a", "b", Ordering::Less)]
    #[case("a", "a/b", Ordering::Less)]
    #[case("a/b", "a-c", Ordering::Less)]
    #[case("a/c", "a/b", Ordering::Greater)]
    #[case("x/y", "x/y", Ordering::Equal)]
    fn ordering_is_component_wise(
        #[case] first: &str,
        #[case] second: &str,
        #[case] expected: Ordering,
    ) {
        assert_eq!(path(first).cmp(&path(second)), expected);
    }

    #[test]
    fn from_str_matches_parse() {
        let parsed: TreePath = "a/b".parse().unwrap();
        assert_eq!(parsed, path("a/b"));
        assert!("a//b".parse::<TreePath>().is_err());
    }
}
