//! Row classification and assembly of the table result.

use concord_index::{DuplicateTracker, RowKey};
use concord_types::{DiffNode, FieldDiff, Outcome};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::StoredRowLimits;

pub const PASSED_ROWS: &str = "Passed rows";
pub const FAILED_ROWS: &str = "Failed rows";
pub const NOT_FOUND_ROWS: &str = "Not found rows";
pub const EXTRA_ROWS: &str = "Extra rows";

/// Comment of the result when neither source has rows.
pub const NOTHING_TO_COMPARE: &str = "Both datasets are empty. Nothing to compare.";

/// Class of a compared row; each class has its own result section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOutcome {
    Passed,
    Failed,
    /// Expected row without an actual partner.
    NotFound,
    /// Actual row no expected row claimed.
    Extra,
}

impl RowOutcome {
    pub fn section(&self) -> &'static str {
        match self {
            Self::Passed => PASSED_ROWS,
            Self::Failed => FAILED_ROWS,
            Self::NotFound => NOT_FOUND_ROWS,
            Self::Extra => EXTRA_ROWS,
        }
    }

    fn index(&self) -> usize {
        match self {
            Self::Passed => 0,
            Self::Failed => 1,
            Self::NotFound => 2,
            Self::Extra => 3,
        }
    }
}

/// The leaves of one compared row and its class.
#[derive(Clone, Debug)]
pub struct RowComparison {
    pub outcome: RowOutcome,
    pub fields: Vec<FieldDiff>,
}

impl RowComparison {
    /// A paired row: passed unless a leaf failed.
    pub fn paired(fields: Vec<FieldDiff>) -> Self {
        let outcome = if fields.iter().any(|f| f.outcome.is_failure()) {
            RowOutcome::Failed
        } else {
            RowOutcome::Passed
        };
        Self { outcome, fields }
    }

    pub fn unpaired(outcome: RowOutcome, fields: Vec<FieldDiff>) -> Self {
        Self { outcome, fields }
    }

    fn errors(&self) -> impl Iterator<Item = &FieldDiff> {
        self.fields.iter().filter(|f| f.outcome == Outcome::Error)
    }
}

/// Row totals per class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TableSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub not_found: usize,
    pub extra: usize,
    pub duplicates: usize,
}

impl TableSummary {
    fn record(&mut self, outcome: RowOutcome) {
        self.total += 1;
        match outcome {
            RowOutcome::Passed => self.passed += 1,
            RowOutcome::Failed => self.failed += 1,
            RowOutcome::NotFound => self.not_found += 1,
            RowOutcome::Extra => self.extra += 1,
        }
    }
}

struct Section {
    node: DiffNode,
    limit: Option<usize>,
}

impl Section {
    fn new(outcome: RowOutcome, limit: Option<usize>) -> Self {
        Self {
            node: DiffNode::named(outcome.section()),
            limit,
        }
    }

    fn add(&mut self, row: DiffNode) {
        if self.limit.map_or(true, |max| self.node.children().len() < max) {
            self.node.push_child(row);
        } else {
            self.node.omit_child(&row);
        }
    }
}

/// Collects row results into the four sections, in classification order.
pub struct TableResultBuilder {
    sections: [Section; 4],
    summary: TableSummary,
    duplicates: Option<DuplicateTracker>,
    root_fields: Vec<FieldDiff>,
    rows_read: usize,
}

impl TableResultBuilder {
    pub fn new(limits: &StoredRowLimits, check_duplicates: bool) -> Self {
        Self {
            sections: [
                Section::new(RowOutcome::Passed, limits.passed),
                Section::new(RowOutcome::Failed, limits.failed),
                Section::new(RowOutcome::NotFound, limits.not_found),
                Section::new(RowOutcome::Extra, limits.extra),
            ],
            summary: TableSummary::default(),
            duplicates: check_duplicates.then(DuplicateTracker::new),
            root_fields: Vec::new(),
            rows_read: 0,
        }
    }

    /// Count rows read from either source, classified or not.
    pub fn record_read(&mut self, rows: usize) {
        self.rows_read += rows;
    }

    /// Rows classified so far.
    pub fn rows(&self) -> usize {
        self.summary.total
    }

    /// A leaf on the result itself, such as a row count mismatch.
    pub fn push_root_field(&mut self, field: FieldDiff) {
        self.root_fields.push(field);
    }

    /// Record one row. `key` is the key of the row that represents this
    /// comparison: the expected row, or the actual row for extras.
    pub fn add(&mut self, comparison: RowComparison, key: Option<&RowKey>) {
        let number = self.summary.total + 1;
        let mut name = format!("Row #{number}");
        let mut outcome = comparison.outcome;
        let mut duplicate = false;

        if let (Some(tracker), Some(key)) = (self.duplicates.as_mut(), key) {
            if let Some(original) = tracker.observe(key, name.clone()) {
                name = format!("{name} (duplicate of {original})");
                duplicate = true;
                if outcome == RowOutcome::Passed {
                    outcome = RowOutcome::Failed;
                }
            }
        }

        for error in comparison.errors() {
            warn!(
                row = number,
                column = %error.name,
                error = error.error.as_deref().unwrap_or_default(),
                "comparison error"
            );
        }

        let mut node = DiffNode::named(name);
        for field in comparison.fields {
            node.push_field(field);
        }
        if duplicate {
            node.mark_failed();
            self.summary.duplicates += 1;
        }

        self.summary.record(outcome);
        self.sections[outcome.index()].add(node);
        self.report_progress();
    }

    /// Feed the key of a row left out of the result to the duplicate check.
    /// A repeated key counts as a duplicate; the row itself is not stored.
    pub fn observe_key(&mut self, key: &RowKey) {
        let Some(tracker) = self.duplicates.as_mut() else {
            return;
        };
        if let Some(original) = tracker.observe(key, format!("ignored row with key {key}")) {
            warn!(key = %key, original = %original, "duplicate key in ignored row");
            self.summary.duplicates += 1;
        }
    }

    fn report_progress(&self) {
        let n = self.summary.total;
        let milestone = (n <= 10_000 && n % 1_000 == 0)
            || (n <= 100_000 && n % 10_000 == 0)
            || (n <= 1_000_000 && n % 100_000 == 0)
            || n % 1_000_000 == 0;
        if milestone {
            debug!(rows = n, passed = self.summary.passed, "compared rows");
        }
    }

    /// Assemble the result. When neither source yielded a row the result is
    /// a passed node saying there was nothing to compare.
    pub fn finish(self) -> (DiffNode, TableSummary) {
        if self.rows_read == 0 && self.summary.total == 0 && self.root_fields.is_empty() {
            return (DiffNode::passed(NOTHING_TO_COMPARE), self.summary);
        }
        let mut root = DiffNode::new();
        for field in self.root_fields {
            root.push_field(field);
        }
        for section in self.sections {
            root.push_child(section.node);
        }
        (root, self.summary)
    }
}
