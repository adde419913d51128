use derive_more::{Display, IsVariant};

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, IsVariant)]
pub enum Stat {
    #[display("directory")]
    Directory,
    #[display("file, {size} byte(s)")]
    File { size: usize },
}

impl Stat {
    /// Content length for files.
    pub fn size(&self) -> Option<usize> {
        match self {
            Stat::File { size } => Some(*size),
            Stat::Directory => None,
        }
    }
}
