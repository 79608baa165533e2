//! Tabular diff engine for Concord.
//!
//! Two row sources (expected and actual) are aligned either by position or
//! by composite key, every paired row is compared cell by cell through the
//! value matcher, and rows are classified as passed, failed, not found or
//! extra. Duplicate keys within one source can be flagged on request.
//!
//! # Key Types
//!
//! - [`TableComparator`] -- Runs a comparison under a [`TableCompareConfig`]
//! - [`TableDiff`] -- Result tree plus a [`TableSummary`] of row totals
//! - [`SourceGuard`] -- Closes an owned row source on every exit path
//! - [`TableError`] -- Resource and configuration errors that abort a run

pub mod cells;
pub mod config;
pub mod engine;
pub mod error;
pub mod guard;
pub mod mapping;
pub mod rows;

pub use cells::CellComparator;
pub use config::{ColumnMapping, NumericColumn, StoredRowLimits, TableCompareConfig};
pub use engine::{TableComparator, TableDiff, ROW_COUNT};
pub use error::{TableError, TableResult};
pub use guard::SourceGuard;
pub use mapping::HeaderMapping;
pub use rows::{
    RowComparison, RowOutcome, TableSummary, EXTRA_ROWS, FAILED_ROWS, NOTHING_TO_COMPARE,
    NOT_FOUND_ROWS, PASSED_ROWS,
};
