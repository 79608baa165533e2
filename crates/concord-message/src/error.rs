//! Error types for the message crate.

use concord_matcher::MatchError;

/// Errors that stop a message comparison from running.
///
/// Field-level expression errors become `error` leaves instead.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// The expected message type could not be evaluated.
    #[error("error while comparing message types: {0}")]
    MessageType(#[source] MatchError),

    /// The configuration text could not be parsed.
    #[error("failed to parse message comparison configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

/// Convenience alias for message results.
pub type MessageResult<T> = Result<T, MessageError>;
