//! Key-based alignment for Concord.
//!
//! Rows and sub-messages are paired by composite key: the actual side is
//! indexed once and every expected item claims the first unclaimed
//! candidate with an agreeing key.
//!
//! # Key Types
//!
//! - [`KeySpec`] -- Ordered key columns, plain or numeric (optionally with a precision)
//! - [`RowKey`] -- A row's key: hashed exact part plus approximate numeric parts
//! - [`KeyIndex`] -- Removal-on-match index, first match wins
//! - [`CandidatePool`] -- Arena of candidates marked consumed, for predicate matching
//! - [`DuplicateTracker`] -- Flags keys seen more than once in one source

pub mod duplicates;
pub mod error;
pub mod index;
pub mod key;
pub mod pool;

pub use duplicates::DuplicateTracker;
pub use error::{IndexError, IndexResult, Side};
pub use index::KeyIndex;
pub use key::{Key, KeyColumn, KeyPart, KeySpec, RowKey};
pub use pool::CandidatePool;
