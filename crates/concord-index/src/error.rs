//! Error types for the index crate.

use std::fmt;

/// Which side of a comparison a row or header belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    Expected,
    Actual,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expected => write!(f, "expected"),
            Self::Actual => write!(f, "actual"),
        }
    }
}

/// Errors that can occur while building keys.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexError {
    /// A declared key column is absent from a source header.
    #[error("{side} header has no key column '{column}'")]
    MissingKeyColumn { side: Side, column: String },

    /// A numeric key column holds a value that is not a number.
    #[error("value '{value}' of numeric key column '{column}' is not a number")]
    NonNumericKey { column: String, value: String },
}

/// Convenience alias for index results.
pub type IndexResult<T> = Result<T, IndexError>;
