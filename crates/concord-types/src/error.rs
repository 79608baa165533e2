//! Error types shared by every Concord crate.

use thiserror::Error;

/// Errors produced while building headers and rows.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("duplicate column in header: {0}")]
    DuplicateColumn(String),

    #[error("row width mismatch: header has {expected} columns, row has {actual}")]
    RowWidth { expected: usize, actual: usize },
}

/// Convenience alias for type construction results.
pub type TypeResult<T> = Result<T, TypeError>;

/// Errors raised by a row source. These are resource errors: they abort the
/// whole comparison instead of becoming a failed leaf.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The source produced data it could not turn into a row.
    #[error("cannot read row {row} from '{source_name}': {reason}")]
    Read {
        source_name: String,
        row: usize,
        reason: String,
    },

    /// A row was requested after the source had been closed.
    #[error("source '{0}' is already closed")]
    Closed(String),

    /// Header or row construction failed.
    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Convenience alias for row source results.
pub type SourceResult<T> = Result<T, SourceError>;
