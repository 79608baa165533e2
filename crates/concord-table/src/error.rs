//! Error types for the table crate.

use concord_index::IndexError;
use concord_types::{SourceError, TypeError};

/// Errors that stop a table comparison from running.
///
/// Cell-level expression errors never show up here; they become `error`
/// leaves in the result.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// A row source could not be read or closed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// A header lacks a declared key column.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// A header or row is malformed, e.g. duplicate columns after mapping.
    #[error(transparent)]
    Type(#[from] TypeError),

    /// The configuration is inconsistent.
    #[error("invalid table comparison configuration: {0}")]
    Config(String),

    /// The configuration text could not be parsed.
    #[error("failed to parse table comparison configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Convenience alias for table results.
pub type TableResult<T> = Result<T, TableError>;
