//! Per-cell comparison rules.

use std::collections::{BTreeMap, BTreeSet};

use concord_matcher::number::parse_decimal;
use concord_matcher::{InfoIndication, ValueMatcher};
use concord_types::{FieldDiff, Header, Outcome, Row};

use crate::config::{NumericColumn, TableCompareConfig};

/// Compares the cells of two paired rows.
#[derive(Clone, Debug)]
pub struct CellComparator {
    matcher: ValueMatcher,
    numeric: BTreeMap<String, NumericColumn>,
    ignore: BTreeSet<String>,
    info: BTreeSet<String>,
}

impl CellComparator {
    pub fn new(config: &TableCompareConfig) -> Self {
        Self {
            matcher: ValueMatcher::new(config.case_sensitive),
            numeric: config.numeric_columns.clone(),
            ignore: config.ignore_columns.clone(),
            info: config.info_columns.clone(),
        }
    }

    pub fn is_ignored(&self, column: &str) -> bool {
        self.ignore.contains(column)
    }

    /// Leaves for one pair of rows, in common-header order.
    ///
    /// A column the expected header lacks is shown as `info`. So are the
    /// configured info columns. Ignored columns produce no leaf.
    pub fn compare_rows(&self, common: &Header, expected: &Row, actual: &Row) -> Vec<FieldDiff> {
        common
            .iter()
            .filter(|column| !self.is_ignored(column))
            .map(|column| {
                let exp = expected.value(column);
                let act = actual.value(column);
                if !expected.has_column(column) || self.info.contains(column) {
                    FieldDiff::info(column, exp, act)
                } else {
                    self.compare_cell(column, exp, act)
                }
            })
            .collect()
    }

    /// Leaves for a row without a partner. Every scored cell is reported
    /// with `outcome`.
    pub fn unpaired_row(&self, common: &Header, row: &Row, is_expected: bool, outcome: Outcome) -> Vec<FieldDiff> {
        common
            .iter()
            .filter(|column| !self.is_ignored(column))
            .map(|column| {
                let value = row.value(column);
                let (exp, act) = if is_expected { (value, None) } else { (None, value) };
                let outcome = if self.info.contains(column) {
                    Outcome::Info
                } else {
                    outcome
                };
                FieldDiff::new(column, exp, act, outcome)
            })
            .collect()
    }

    /// One cell. Expressions always go through the matcher; numeric columns
    /// otherwise compare by decimal value within their precision.
    pub fn compare_cell(&self, column: &str, expected: Option<&str>, actual: Option<&str>) -> FieldDiff {
        if let (Some(numeric), Some(exp), Some(act)) = (self.numeric.get(column), expected, actual) {
            if !self.matcher.is_expression(exp) {
                if let (Some(e), Some(a)) = (parse_decimal(exp.trim()), parse_decimal(act.trim())) {
                    let tolerance = numeric.precision.unwrap_or_default();
                    let matched = e.checked_sub(a).is_some_and(|diff| diff.abs() <= tolerance);
                    return FieldDiff::new(column, expected, actual, Outcome::from_match(matched));
                }
            }
        }
        self.matcher
            .compare_field(column, expected, actual, InfoIndication::Never)
    }
}
