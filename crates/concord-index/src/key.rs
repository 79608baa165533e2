//! Composite keys built from a row's declared key columns.
//!
//! Plain key columns compare as exact strings. Numeric key columns compare
//! by decimal value, so `1.0` and `1` are the same key. A numeric column with
//! a precision is kept out of the hashed primary key and checked afterwards
//! as an approximate part: two keys agree when every approximate part is
//! within its precision.

use std::fmt;
use std::sync::Arc;

use concord_matcher::number::parse_decimal;
use concord_types::{Header, Row};
use rust_decimal::Decimal;

use crate::error::{IndexError, IndexResult, Side};

/// A declared key column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyColumn {
    pub name: String,
    pub numeric: bool,
    pub precision: Option<Decimal>,
}

impl KeyColumn {
    pub fn text(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            numeric: false,
            precision: None,
        }
    }

    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            numeric: true,
            ..Self::text(name)
        }
    }

    pub fn with_precision(name: impl Into<String>, precision: Decimal) -> Self {
        Self {
            precision: Some(precision),
            ..Self::numeric(name)
        }
    }

    fn is_approximate(&self) -> bool {
        self.numeric && self.precision.is_some_and(|p| !p.is_zero())
    }
}

/// One value of a key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum KeyPart {
    Absent,
    Text(String),
    /// Normalized, so equal values hash equally.
    Number(Decimal),
}

impl fmt::Display for KeyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absent => write!(f, "null"),
            Self::Text(t) => write!(f, "{t}"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

/// The exact, hashable part of a row key.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Key(Vec<KeyPart>);

impl Key {
    pub fn parts(&self) -> &[KeyPart] {
        &self.0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ApproxPart {
    value: KeyPart,
    precision: Decimal,
}

impl ApproxPart {
    fn agrees(&self, other: &ApproxPart) -> bool {
        match (&self.value, &other.value) {
            (KeyPart::Number(a), KeyPart::Number(b)) => a
                .checked_sub(*b)
                .is_some_and(|diff| diff.abs() <= self.precision),
            (a, b) => a == b,
        }
    }
}

/// The full key of a row: exact part plus approximate numeric parts.
#[derive(Clone, Debug)]
pub struct RowKey {
    names: Arc<[String]>,
    primary: Key,
    approx: Vec<ApproxPart>,
}

impl RowKey {
    pub fn primary(&self) -> &Key {
        &self.primary
    }

    /// Whether two keys with equal primary parts also agree on every
    /// approximate part.
    pub fn agrees(&self, other: &RowKey) -> bool {
        self.primary == other.primary
            && self.approx.len() == other.approx.len()
            && self
                .approx
                .iter()
                .zip(&other.approx)
                .all(|(a, b)| a.agrees(b))
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values = self
            .primary
            .parts()
            .iter()
            .chain(self.approx.iter().map(|a| &a.value));
        for (i, (name, value)) in self.names.iter().zip(values).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        Ok(())
    }
}

/// The ordered list of key columns and how to build keys from them.
#[derive(Clone, Debug)]
pub struct KeySpec {
    exact: Vec<KeyColumn>,
    approx: Vec<KeyColumn>,
    names: Arc<[String]>,
}

impl KeySpec {
    pub fn new(columns: impl IntoIterator<Item = KeyColumn>) -> Self {
        let (approx, exact): (Vec<_>, Vec<_>) =
            columns.into_iter().partition(KeyColumn::is_approximate);
        let names = exact
            .iter()
            .chain(&approx)
            .map(|c| c.name.clone())
            .collect::<Vec<_>>()
            .into();
        Self {
            exact,
            approx,
            names,
        }
    }

    /// Key of plain string columns.
    pub fn text<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(names.into_iter().map(KeyColumn::text))
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Column names, exact columns first.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_key_column(&self, column: &str) -> bool {
        self.names.iter().any(|n| n == column)
    }

    /// Every key column must exist in the header.
    pub fn check_header(&self, header: &Header, side: Side) -> IndexResult<()> {
        match self.names.iter().find(|n| !header.contains(n)) {
            Some(column) => Err(IndexError::MissingKeyColumn {
                side,
                column: column.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Build a key by looking values up by column name.
    pub fn key_of<'v, F>(&self, lookup: F) -> IndexResult<RowKey>
    where
        F: Fn(&str) -> Option<&'v str>,
    {
        let mut parts = Vec::with_capacity(self.exact.len());
        for column in &self.exact {
            parts.push(key_part(column, lookup(column.name.as_str()))?);
        }
        let mut approx = Vec::with_capacity(self.approx.len());
        for column in &self.approx {
            approx.push(ApproxPart {
                value: key_part(column, lookup(column.name.as_str()))?,
                precision: column.precision.unwrap_or_default(),
            });
        }
        Ok(RowKey {
            names: Arc::clone(&self.names),
            primary: Key(parts),
            approx,
        })
    }

    pub fn row_key(&self, row: &Row) -> IndexResult<RowKey> {
        self.key_of(|column| row.value(column))
    }
}

fn key_part(column: &KeyColumn, value: Option<&str>) -> IndexResult<KeyPart> {
    let Some(value) = value else {
        return Ok(KeyPart::Absent);
    };
    if !column.numeric || value.is_empty() {
        return Ok(KeyPart::Text(value.to_string()));
    }
    parse_decimal(value.trim())
        .map(|d| KeyPart::Number(d.normalize()))
        .ok_or_else(|| IndexError::NonNumericKey {
            column: column.name.clone(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn row(columns: &[&str], values: &[&str]) -> Row {
        let header = Arc::new(Header::new(columns.iter().copied()).unwrap());
        Row::from_strs(header, values).unwrap()
    }

    #[test]
    fn text_keys_compare_as_strings() {
        let spec = KeySpec::text(["Id"]);
        let a = spec.row_key(&row(&["Id"], &["1"])).unwrap();
        let b = spec.row_key(&row(&["Id"], &["1.0"])).unwrap();
        assert_ne!(a.primary(), b.primary());
    }

    #[test]
    fn numeric_keys_compare_as_decimals() {
        let spec = KeySpec::new([KeyColumn::numeric("Id")]);
        let a = spec.row_key(&row(&["Id"], &["1"])).unwrap();
        let b = spec.row_key(&row(&["Id"], &["1.00"])).unwrap();
        assert_eq!(a.primary(), b.primary());
        assert!(a.agrees(&b));
    }

    #[test]
    fn non_numeric_value_in_numeric_key() {
        let spec = KeySpec::new([KeyColumn::numeric("Id")]);
        let err = spec.row_key(&row(&["Id"], &["abc"])).unwrap_err();
        assert!(matches!(err, IndexError::NonNumericKey { .. }));
    }

    #[test]
    fn precision_parts_checked_after_hashing() {
        let spec = KeySpec::new([
            KeyColumn::text("Account"),
            KeyColumn::with_precision("Price", Decimal::from_str("0.01").unwrap()),
        ]);
        let cols = ["Account", "Price"];
        let a = spec.row_key(&row(&cols, &["ACC1", "10.00"])).unwrap();
        let b = spec.row_key(&row(&cols, &["ACC1", "10.01"])).unwrap();
        let c = spec.row_key(&row(&cols, &["ACC1", "10.02"])).unwrap();
        assert_eq!(a.primary(), c.primary());
        assert!(a.agrees(&b));
        assert!(!a.agrees(&c));
    }

    #[test]
    fn precision_parts_at_decimal_limits() {
        let spec = KeySpec::new([KeyColumn::with_precision("Price", Decimal::ONE)]);
        let max = spec.row_key(&row(&["Price"], &["79228162514264337593543950335"])).unwrap();
        let min = spec.row_key(&row(&["Price"], &["-79228162514264337593543950335"])).unwrap();
        assert!(!max.agrees(&min));
        assert!(!min.agrees(&max));
        assert!(max.agrees(&max));
    }

    #[test]
    fn header_check_names_missing_column() {
        let spec = KeySpec::text(["Id", "Venue"]);
        let header = Header::new(["Id", "Qty"]).unwrap();
        assert_eq!(
            spec.check_header(&header, Side::Actual),
            Err(IndexError::MissingKeyColumn {
                side: Side::Actual,
                column: "Venue".into()
            })
        );
    }

    #[test]
    fn display_lists_columns() {
        let spec = KeySpec::text(["Id", "Venue"]);
        let key = spec.row_key(&row(&["Id", "Venue"], &["7", "XLON"])).unwrap();
        assert_eq!(key.to_string(), "Id=7, Venue=XLON");
    }
}
