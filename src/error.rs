//! Error types for the mdds containers.

use thiserror::Error;

/// Error variants for container operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A row or span argument was outside the container's bounds, or a range
    /// was given with its start past its end.
    #[error("row out of range: {0}")]
    OutOfRange(usize),

    /// A typed element-block primitive was invoked on a block of a different
    /// category.  This indicates an internal invariant violation.
    #[error("cell type mismatch")]
    TypeMismatch,

    /// A structurally invalid argument, e.g. grouping vectors of differing
    /// lengths, or an unsorted key list for a packed trie.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// A specialized Result type for container operations.
pub type Result<T> = std::result::Result<T, Error>;
