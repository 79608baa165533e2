//! Table headers and rows.
//!
//! A [`Header`] is an ordered, duplicate-free set of column names shared by
//! every [`Row`] read from the same source. Cell values are optional: `None`
//! is an absent value (e.g. a database NULL), distinct from the empty string.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{TypeError, TypeResult};

/// Ordered, duplicate-free set of column names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
}

impl Header {
    /// Build a header, rejecting duplicate column names.
    pub fn new<I, S>(columns: I) -> TypeResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut header = Self {
            columns: Vec::new(),
            positions: HashMap::new(),
        };
        for column in columns {
            let column = column.into();
            if header.positions.contains_key(&column) {
                return Err(TypeError::DuplicateColumn(column));
            }
            header.positions.insert(column.clone(), header.columns.len());
            header.columns.push(column);
        }
        Ok(header)
    }

    /// Union of two headers: all columns of `self` in order, then the
    /// columns of `other` that `self` lacks.
    pub fn union(&self, other: &Header) -> Header {
        let mut columns = self.columns.clone();
        columns.extend(other.iter().filter(|c| !self.contains(c)).map(str::to_string));
        let positions = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Header { columns, positions }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.positions.contains_key(column)
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(column).copied()
    }

    pub fn column(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(String::as_str)
    }
}

/// One row of table data. Cheap to clone the header: it is shared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    header: Arc<Header>,
    values: Vec<Option<String>>,
}

impl Row {
    /// Build a row; the number of values must equal the header width.
    pub fn new(header: Arc<Header>, values: Vec<Option<String>>) -> TypeResult<Self> {
        if values.len() != header.len() {
            return Err(TypeError::RowWidth {
                expected: header.len(),
                actual: values.len(),
            });
        }
        Ok(Self { header, values })
    }

    /// Build a row from non-null string values.
    pub fn from_strs<S: AsRef<str>>(header: Arc<Header>, values: &[S]) -> TypeResult<Self> {
        let values = values.iter().map(|v| Some(v.as_ref().to_string())).collect();
        Self::new(header, values)
    }

    pub fn header(&self) -> &Arc<Header> {
        &self.header
    }

    /// Value of `column`; `None` if the column is unknown or the cell is absent.
    pub fn value(&self, column: &str) -> Option<&str> {
        self.header
            .position(column)
            .and_then(|i| self.values[i].as_deref())
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.header.contains(column)
    }

    pub fn values(&self) -> &[Option<String>] {
        &self.values
    }

    /// Re-label the row with a header of the same width (column renaming).
    pub fn with_header(self, header: Arc<Header>) -> TypeResult<Self> {
        Self::new(header, self.values)
    }
}
