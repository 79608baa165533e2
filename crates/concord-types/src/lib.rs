//! Foundation types for Concord.
//!
//! Every comparison in Concord consumes the data shapes defined here and
//! produces a [`DiffNode`] tree that an external report writer renders.
//!
//! # Key Types
//!
//! - [`DiffNode`] / [`FieldDiff`] / [`Outcome`] -- Nested comparison result
//! - [`Header`] / [`Row`] -- Ordered, duplicate-free columns and the rows sharing them
//! - [`RowSource`] / [`MemoryRowSource`] -- Lazily consumed stream of rows
//! - [`MessageView`] / [`Message`] -- Tree-shaped message with repeating groups
//! - [`ExtraPolicy`] -- What to do with unclaimed actual rows or groups

pub mod diff;
pub mod error;
pub mod message;
pub mod policy;
pub mod row;
pub mod source;

pub use diff::{DiffNode, FieldDiff, Outcome, OutcomeCounts};
pub use error::{SourceError, SourceResult, TypeError, TypeResult};
pub use message::{Message, MessageView, MSG_TYPE, SUB_MSG_SOURCE, SUB_MSG_TYPE};
pub use policy::ExtraPolicy;
pub use row::{Header, Row};
pub use source::{MemoryRowSource, RowSource};
