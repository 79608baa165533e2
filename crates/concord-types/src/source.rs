//! Row sources: the streaming input of the tabular comparator.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::{SourceError, SourceResult};
use crate::row::{Header, Row};

/// A lazily consumed stream of rows sharing one header.
///
/// Implementations (CSV files, database cursors, in-memory tables) live
/// outside the comparison core. A source is used by one caller at a time;
/// the party that opened it is responsible for closing it.
pub trait RowSource {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// The header shared by all rows of this source.
    fn header(&self) -> &Arc<Header>;

    /// Read the next row, or `None` once the source is exhausted.
    fn next_row(&mut self) -> SourceResult<Option<Row>>;

    /// Release underlying resources. Calling it twice is a no-op.
    fn close(&mut self) -> SourceResult<()>;
}

impl<S: RowSource + ?Sized> RowSource for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn header(&self) -> &Arc<Header> {
        (**self).header()
    }

    fn next_row(&mut self) -> SourceResult<Option<Row>> {
        (**self).next_row()
    }

    fn close(&mut self) -> SourceResult<()> {
        (**self).close()
    }
}

/// In-memory row source.
#[derive(Debug)]
pub struct MemoryRowSource {
    name: String,
    header: Arc<Header>,
    rows: VecDeque<Row>,
    closed: bool,
}

impl MemoryRowSource {
    /// Build a source from a header and raw cell values.
    pub fn new<I>(name: impl Into<String>, header: Header, rows: I) -> SourceResult<Self>
    where
        I: IntoIterator<Item = Vec<Option<String>>>,
    {
        let header = Arc::new(header);
        let rows = rows
            .into_iter()
            .map(|values| Row::new(Arc::clone(&header), values))
            .collect::<Result<VecDeque<_>, _>>()?;
        Ok(Self {
            name: name.into(),
            header,
            rows,
            closed: false,
        })
    }

    /// Build a source where every cell is present.
    pub fn from_strs(name: impl Into<String>, columns: &[&str], rows: &[&[&str]]) -> SourceResult<Self> {
        let header = Header::new(columns.iter().copied())?;
        let rows = rows
            .iter()
            .map(|r| r.iter().map(|v| Some(v.to_string())).collect::<Vec<_>>());
        Self::new(name, header, rows)
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Rows not yet consumed.
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl RowSource for MemoryRowSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn header(&self) -> &Arc<Header> {
        &self.header
    }

    fn next_row(&mut self) -> SourceResult<Option<Row>> {
        if self.closed {
            return Err(SourceError::Closed(self.name.clone()));
        }
        Ok(self.rows.pop_front())
    }

    fn close(&mut self) -> SourceResult<()> {
        if !self.closed {
            tracing::trace!(source = %self.name, "closing in-memory source");
            self.closed = true;
            self.rows.clear();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_in_order() {
        let mut src =
            MemoryRowSource::from_strs("exp", &["Id", "Qty"], &[&["1", "10"], &["2", "20"]]).unwrap();
        assert_eq!(src.remaining(), 2);
        let first = src.next_row().unwrap().unwrap();
        assert_eq!(first.value("Id"), Some("1"));
        let second = src.next_row().unwrap().unwrap();
        assert_eq!(second.value("Qty"), Some("20"));
        assert!(src.next_row().unwrap().is_none());
    }

    #[test]
    fn read_after_close_fails() {
        let mut src = MemoryRowSource::from_strs("act", &["Id"], &[&["1"]]).unwrap();
        src.close().unwrap();
        src.close().unwrap();
        assert!(src.is_closed());
        assert!(matches!(src.next_row(), Err(SourceError::Closed(name)) if name == "act"));
    }

    #[test]
    fn rejects_ragged_rows() {
        let header = Header::new(["A", "B"]).unwrap();
        let err = MemoryRowSource::new("x", header, vec![vec![Some("1".to_string())]]).unwrap_err();
        assert!(matches!(err, SourceError::Type(_)));
    }

    #[test]
    fn boxed_source_delegates() {
        let src = MemoryRowSource::from_strs("boxed", &["A"], &[&["1"]]).unwrap();
        let mut boxed: Box<dyn RowSource> = Box::new(src);
        assert_eq!(boxed.name(), "boxed");
        assert!(boxed.next_row().unwrap().is_some());
        boxed.close().unwrap();
    }
}
