//! The tabular diff engine.
//!
//! Without key columns rows are paired by position: both sources are read
//! in lock-step and a length difference yields a "Row count" leaf once the
//! shorter source runs out. With key columns the actual source is indexed
//! once, the expected source is streamed, and every expected row claims the
//! first unclaimed actual row with an agreeing key. Unclaimed actual rows are
//! reported last, in source order.

use concord_index::{IndexError, KeyIndex, KeySpec, Side};
use concord_types::{DiffNode, ExtraPolicy, FieldDiff, Header, Outcome, Row, RowSource};
use serde::Serialize;
use tracing::debug;

use crate::cells::CellComparator;
use crate::config::TableCompareConfig;
use crate::error::TableResult;
use crate::guard::SourceGuard;
use crate::mapping::HeaderMapping;
use crate::rows::{RowComparison, RowOutcome, TableResultBuilder, TableSummary};

/// Name of the root leaf reporting a positional length mismatch.
pub const ROW_COUNT: &str = "Row count";

/// Result of a table comparison.
#[derive(Clone, Debug, Serialize)]
pub struct TableDiff {
    pub result: DiffNode,
    pub summary: TableSummary,
}

impl TableDiff {
    pub fn is_success(&self) -> bool {
        self.result.is_success()
    }
}

/// Compares two row sources under one configuration.
///
/// Holds no per-comparison state; one comparator may serve any number of
/// concurrent comparisons, each with its own sources.
#[derive(Clone, Debug)]
pub struct TableComparator {
    config: TableCompareConfig,
    cells: CellComparator,
    keys: KeySpec,
}

impl TableComparator {
    pub fn new(config: TableCompareConfig) -> TableResult<Self> {
        config.validate()?;
        Ok(Self {
            cells: CellComparator::new(&config),
            keys: config.key_spec(),
            config,
        })
    }

    pub fn config(&self) -> &TableCompareConfig {
        &self.config
    }

    /// Compare two sources supplied by the caller. The caller stays
    /// responsible for closing them.
    pub fn compare<E, A>(&self, expected: &mut E, actual: &mut A) -> TableResult<TableDiff>
    where
        E: RowSource + ?Sized,
        A: RowSource + ?Sized,
    {
        let headers = HeaderMapping::new(&self.config.column_mapping, expected.header(), actual.header())?;
        if self.config.is_keyed() {
            self.keys.check_header(headers.expected(), Side::Expected)?;
            self.keys.check_header(headers.actual(), Side::Actual)?;
        }

        debug!(
            expected = expected.name(),
            actual = actual.name(),
            keyed = self.config.is_keyed(),
            columns = headers.common().len(),
            "starting table comparison"
        );

        let mut builder = TableResultBuilder::new(&self.config.max_stored_rows, self.config.check_duplicates);
        if self.config.is_keyed() {
            self.compare_keyed(&headers, expected, actual, &mut builder)?;
        } else {
            self.compare_positional(&headers, expected, actual, &mut builder)?;
        }

        let (result, summary) = builder.finish();
        debug!(
            rows = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            not_found = summary.not_found,
            extra = summary.extra,
            "table comparison finished"
        );
        Ok(TableDiff { result, summary })
    }

    /// Compare two sources this call takes ownership of. Both are closed
    /// on every exit path.
    pub fn compare_owned<E, A>(&self, expected: E, actual: A) -> TableResult<TableDiff>
    where
        E: RowSource,
        A: RowSource,
    {
        let mut expected = SourceGuard::new(expected);
        let mut actual = SourceGuard::new(actual);
        let diff = self.compare(&mut *expected, &mut *actual)?;
        expected.close()?;
        actual.close()?;
        Ok(diff)
    }

    fn compare_positional<E, A>(
        &self,
        headers: &HeaderMapping,
        expected: &mut E,
        actual: &mut A,
        builder: &mut TableResultBuilder,
    ) -> TableResult<()>
    where
        E: RowSource + ?Sized,
        A: RowSource + ?Sized,
    {
        let common = headers.common();
        let (mut expected_rows, mut actual_rows) = (0usize, 0usize);
        loop {
            let exp = next_row(expected, headers, Side::Expected)?;
            let act = next_row(actual, headers, Side::Actual)?;
            expected_rows += usize::from(exp.is_some());
            actual_rows += usize::from(act.is_some());
            let comparison = match (exp, act) {
                (None, None) => break,
                (Some(e), Some(a)) => RowComparison::paired(self.cells.compare_rows(common, &e, &a)),
                (Some(e), None) => self.not_found(common, &e),
                (None, Some(a)) => match self.extra(common, &a, None) {
                    Some(comparison) => comparison,
                    None => continue,
                },
            };
            builder.add(comparison, None);
        }
        builder.record_read(expected_rows + actual_rows);

        if expected_rows != actual_rows {
            let outcome = if expected_rows > actual_rows {
                Outcome::Mismatch
            } else {
                match self.config.extra_policy {
                    ExtraPolicy::Fail => Outcome::Mismatch,
                    ExtraPolicy::Info => Outcome::Info,
                    ExtraPolicy::Ignore => return Ok(()),
                }
            };
            builder.push_root_field(FieldDiff::new(
                ROW_COUNT,
                Some(&expected_rows.to_string()),
                Some(&actual_rows.to_string()),
                outcome,
            ));
        }
        Ok(())
    }

    fn compare_keyed<E, A>(
        &self,
        headers: &HeaderMapping,
        expected: &mut E,
        actual: &mut A,
        builder: &mut TableResultBuilder,
    ) -> TableResult<()>
    where
        E: RowSource + ?Sized,
        A: RowSource + ?Sized,
    {
        let common = headers.common();

        let mut index = KeyIndex::new();
        let mut unkeyed = Vec::new();
        while let Some(row) = next_row(actual, headers, Side::Actual)? {
            match self.keys.row_key(&row) {
                Ok(key) => index.insert(key, row),
                Err(e) => unkeyed.push((row, e)),
            }
        }
        debug!(indexed = index.len(), unkeyed = unkeyed.len(), "indexed actual rows");
        builder.record_read(index.len() + unkeyed.len());

        while let Some(exp) = next_row(expected, headers, Side::Expected)? {
            builder.record_read(1);
            let key = match self.keys.row_key(&exp) {
                Ok(key) => key,
                Err(e) => {
                    let mut comparison = self.not_found(common, &exp);
                    comparison.outcome = RowOutcome::Failed;
                    comparison.fields.push(key_error(&e));
                    builder.add(comparison, None);
                    continue;
                }
            };
            let comparison = match index.take_match(&key) {
                Some((_, act)) => RowComparison::paired(self.cells.compare_rows(common, &exp, &act)),
                None => self.not_found(common, &exp),
            };
            builder.add(comparison, Some(&key));
        }

        for (key, act) in index.into_remaining() {
            match self.extra(common, &act, None) {
                Some(comparison) => builder.add(comparison, Some(&key)),
                None => builder.observe_key(&key),
            }
        }
        for (act, e) in unkeyed {
            if let Some(comparison) = self.extra(common, &act, Some(&e)) {
                builder.add(comparison, None);
            }
        }
        Ok(())
    }

    fn not_found(&self, common: &Header, row: &Row) -> RowComparison {
        RowComparison::unpaired(
            RowOutcome::NotFound,
            self.cells.unpaired_row(common, row, true, Outcome::Mismatch),
        )
    }

    /// `None` when extras are ignored.
    fn extra(&self, common: &Header, row: &Row, key_error_cause: Option<&IndexError>) -> Option<RowComparison> {
        let outcome = match self.config.extra_policy {
            ExtraPolicy::Ignore => return None,
            ExtraPolicy::Info => Outcome::Info,
            ExtraPolicy::Fail => Outcome::Mismatch,
        };
        let mut fields = self.cells.unpaired_row(common, row, false, outcome);
        if let Some(e) = key_error_cause {
            fields.push(key_error(e));
        }
        Some(RowComparison::unpaired(RowOutcome::Extra, fields))
    }
}

fn next_row<S>(source: &mut S, headers: &HeaderMapping, side: Side) -> TableResult<Option<Row>>
where
    S: RowSource + ?Sized,
{
    match source.next_row()? {
        Some(row) => Ok(Some(headers.map_row(row, side)?)),
        None => Ok(None),
    }
}

fn key_error(error: &IndexError) -> FieldDiff {
    let column = match error {
        IndexError::NonNumericKey { column, .. } => column.as_str(),
        IndexError::MissingKeyColumn { column, .. } => column.as_str(),
    };
    FieldDiff::error(format!("{column} (key)"), None, None, error.to_string())
}
