//! Structural comparison of tree-shaped messages for Concord.
//!
//! A message carries leaf fields and, per repeating-group type, an ordered
//! list of sub-messages. [`MessageComparator`] checks the leaf fields with
//! the expression language of `concord-matcher`, then pairs sub-messages by
//! their declared key fields and recurses into each pair.
//!
//! # Key Types
//!
//! - [`MessageComparator`] -- Compares an expected message against an actual one
//! - [`MessageCompareConfig`] -- Service fields, group key fields, extra group policy
//! - [`MessageDiff`] -- The result tree plus captured output fields

pub mod capture;
pub mod comparator;
pub mod config;
pub mod error;

pub use capture::{non_empty_fields, FieldList};
pub use comparator::{MessageComparator, MessageDiff, MESSAGE_CHECK_RESULT, REPEATING_GROUPS, TYPES_DONT_MATCH};
pub use config::MessageCompareConfig;
pub use error::{MessageError, MessageResult};
