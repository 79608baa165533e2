//! Expected-value expressions for Concord.
//!
//! An expected value is either a plain literal, a sentinel token such as
//! `@{isNull}`, a function call such as `@{isBetween(2,4,'includeLeft')}` or
//! `{asNumber('500.1','10','1')}`, or text containing `{pattern('...')}`
//! markers. [`ValueMatcher`] judges one actual value against one expected
//! expression.
//!
//! # Key Types
//!
//! - [`ValueMatcher`] -- Evaluates expressions, builds diff leaves
//! - [`Expectation`] -- A parsed expected expression (tagged by function kind)
//! - [`MatchError`] -- The "parameters" error of a malformed expression

pub mod args;
pub mod date;
pub mod error;
pub mod expr;
pub mod matcher;
pub mod number;
pub mod pattern;

pub use error::{MatchError, MatchResult};
pub use expr::{DateCheck, Expectation, FunctionKind, Inclusion, NumberCheck, NumberEquality, Sentinel};
pub use matcher::{InfoIndication, ValueMatcher};
