//! Error types for the matcher crate.

use thiserror::Error;

/// A malformed expected expression.
///
/// These are configuration errors: a comparator attaches them to the single
/// affected leaf as an `error` outcome and carries on with its siblings.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MatchError {
    #[error("parameters of function '{function}' are missing")]
    MissingParameters { function: &'static str },

    #[error("wrong number of parameters in function '{function}': got {actual}, expected {min}..={max}")]
    WrongArity {
        function: &'static str,
        actual: usize,
        min: usize,
        max: usize,
    },

    #[error("in function '{function}' value '{value}' is not valid for parameter #{position} ({parameter})")]
    InvalidParameter {
        function: &'static str,
        value: String,
        position: usize,
        parameter: &'static str,
    },

    #[error("in function '{function}' inclusion '{value}' is not one of none, includeLeft, includeRight, includeBoth")]
    InvalidInclusion { function: &'static str, value: String },

    #[error("in function '{function}' date format '{format}' is not supported: {reason}")]
    InvalidDateFormat {
        function: &'static str,
        format: String,
        reason: String,
    },

    #[error("in function '{function}' date '{value}' does not match format '{format}'")]
    InvalidDate {
        function: &'static str,
        value: String,
        format: String,
    },

    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Convenience alias for matcher results.
pub type MatchResult<T> = Result<T, MatchError>;
