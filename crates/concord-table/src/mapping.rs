//! Source headers mapped onto comparison names.

use std::sync::Arc;

use concord_index::Side;
use concord_types::{Header, Row};

use crate::config::ColumnMapping;
use crate::error::TableResult;

/// Headers of both sides after renaming, and the common header.
#[derive(Clone, Debug)]
pub struct HeaderMapping {
    expected: Arc<Header>,
    actual: Arc<Header>,
    common: Arc<Header>,
    expected_renamed: bool,
    actual_renamed: bool,
}

impl HeaderMapping {
    /// Rename both source headers. The common header holds every expected
    /// column in order, followed by actual-only columns.
    pub fn new(
        mapping: &ColumnMapping,
        expected_source: &Arc<Header>,
        actual_source: &Arc<Header>,
    ) -> TableResult<Self> {
        let (expected, expected_renamed) = rename(mapping, expected_source, Side::Expected)?;
        let (actual, actual_renamed) = rename(mapping, actual_source, Side::Actual)?;
        let common = Arc::new(expected.union(&actual));
        Ok(Self {
            expected,
            actual,
            common,
            expected_renamed,
            actual_renamed,
        })
    }

    pub fn expected(&self) -> &Arc<Header> {
        &self.expected
    }

    pub fn actual(&self) -> &Arc<Header> {
        &self.actual
    }

    pub fn common(&self) -> &Arc<Header> {
        &self.common
    }

    pub fn header(&self, side: Side) -> &Arc<Header> {
        match side {
            Side::Expected => &self.expected,
            Side::Actual => &self.actual,
        }
    }

    /// Re-label a source row with the renamed header of its side.
    pub fn map_row(&self, row: Row, side: Side) -> TableResult<Row> {
        let renamed = match side {
            Side::Expected => self.expected_renamed,
            Side::Actual => self.actual_renamed,
        };
        if !renamed {
            return Ok(row);
        }
        Ok(row.with_header(Arc::clone(self.header(side)))?)
    }
}

fn rename(mapping: &ColumnMapping, source: &Arc<Header>, side: Side) -> TableResult<(Arc<Header>, bool)> {
    let renames = match side {
        Side::Expected => &mapping.expected,
        Side::Actual => &mapping.actual,
    };
    if !source.iter().any(|c| renames.contains_key(c)) {
        return Ok((Arc::clone(source), false));
    }
    let columns = source
        .iter()
        .map(|c| renames.get(c).map(String::as_str).unwrap_or(c));
    Ok((Arc::new(Header::new(columns)?), true))
}
