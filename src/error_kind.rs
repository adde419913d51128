use derive_more::Display;

/// Coarse classification shared by every error the tree can report.
///
/// Callers that only care about *what* went wrong (for example to map a
/// failure onto an exit code) match on this instead of the detailed error
/// enums, which also carry the offending path.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    #[display("tree is not initialized")]
    NotInitialized,
    #[display("tree is already initialized")]
    AlreadyInitialized,
    #[display("allocation failed")]
    MemoryError,
    #[display("malformed path")]
    BadFormat,
    #[display("no such path")]
    NoSuchPath,
    #[display("path conflicts with the tree root")]
    ConflictingPath,
    #[display("path is already in the tree")]
    AlreadyInTree,
    #[display("not a directory")]
    NotADirectory,
    #[display("not a file")]
    NotAFile,
}
