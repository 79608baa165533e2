//! Configuration of a table comparison.
//!
//! All column names here are comparison (local) names, i.e. names after
//! [`ColumnMapping`] has been applied to each source header.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use concord_index::{KeyColumn, KeySpec};
use concord_types::ExtraPolicy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{TableError, TableResult};

/// Renames of source columns onto comparison names, per side.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    /// Expected source column name to local name.
    pub expected: BTreeMap<String, String>,
    /// Actual source column name to local name.
    pub actual: BTreeMap<String, String>,
}

impl ColumnMapping {
    /// Map `local` onto both an expected and an actual source name.
    pub fn with_column(
        mut self,
        local: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        let local = local.into();
        self.expected.insert(expected.into(), local.clone());
        self.actual.insert(actual.into(), local);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.expected.is_empty() && self.actual.is_empty()
    }
}

/// Per-column numeric comparison.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NumericColumn {
    /// Values match when `|expected - actual| <= precision`. Exact when absent.
    pub precision: Option<Decimal>,
}

impl NumericColumn {
    pub fn exact() -> Self {
        Self::default()
    }

    pub fn with_precision(precision: Decimal) -> Self {
        Self {
            precision: Some(precision),
        }
    }

    /// Parse the compact `Column` or `Column:precision` form.
    pub fn parse_spec(spec: &str) -> TableResult<(String, NumericColumn)> {
        let (name, precision) = match spec.split_once(':') {
            Some((name, precision)) => (name.trim(), Some(precision.trim())),
            None => (spec.trim(), None),
        };
        if name.is_empty() {
            return Err(TableError::Config(format!(
                "numeric column specification '{spec}' has no column name"
            )));
        }
        let precision = match precision {
            None | Some("") => None,
            Some(p) => Some(Decimal::from_str(p).map_err(|e| {
                TableError::Config(format!(
                    "precision '{p}' of numeric column '{name}' is not a number: {e}"
                ))
            })?),
        };
        Ok((name.to_string(), NumericColumn { precision }))
    }
}

/// How many rows each result section keeps. Every row is counted either
/// way; `None` keeps all of them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredRowLimits {
    pub passed: Option<usize>,
    pub failed: Option<usize>,
    pub not_found: Option<usize>,
    pub extra: Option<usize>,
}

/// Configuration of a table comparison.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableCompareConfig {
    /// Ordered key columns. Empty means positional comparison.
    pub key_columns: Vec<String>,
    pub numeric_columns: BTreeMap<String, NumericColumn>,
    pub column_mapping: ColumnMapping,
    /// Columns left out of the comparison entirely.
    pub ignore_columns: BTreeSet<String>,
    /// Columns shown for reference but never scored.
    pub info_columns: BTreeSet<String>,
    pub case_sensitive: bool,
    /// Flag rows whose key was already seen in the same source.
    pub check_duplicates: bool,
    /// Treatment of actual rows no expected row claimed.
    pub extra_policy: ExtraPolicy,
    pub max_stored_rows: StoredRowLimits,
}

impl Default for TableCompareConfig {
    fn default() -> Self {
        Self {
            key_columns: Vec::new(),
            numeric_columns: BTreeMap::new(),
            column_mapping: ColumnMapping::default(),
            ignore_columns: BTreeSet::new(),
            info_columns: BTreeSet::new(),
            case_sensitive: true,
            check_duplicates: false,
            extra_policy: ExtraPolicy::Fail,
            max_stored_rows: StoredRowLimits::default(),
        }
    }
}

impl TableCompareConfig {
    /// Keyed comparison over the given columns.
    pub fn keyed<I, S>(key_columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            key_columns: key_columns.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn from_toml_str(text: &str) -> TableResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn is_keyed(&self) -> bool {
        !self.key_columns.is_empty()
    }

    /// Check the settings for contradictions.
    pub fn validate(&self) -> TableResult<()> {
        let mut seen = BTreeSet::new();
        for key in &self.key_columns {
            if !seen.insert(key) {
                return Err(TableError::Config(format!("key column '{key}' is listed twice")));
            }
            if self.ignore_columns.contains(key) {
                return Err(TableError::Config(format!(
                    "key column '{key}' cannot be ignored"
                )));
            }
        }
        for (name, column) in &self.numeric_columns {
            if column.precision.is_some_and(|p| p.is_sign_negative()) {
                return Err(TableError::Config(format!(
                    "precision of numeric column '{name}' is negative"
                )));
            }
        }
        Ok(())
    }

    /// Key columns, numeric ones comparing by decimal value.
    pub fn key_spec(&self) -> KeySpec {
        KeySpec::new(self.key_columns.iter().map(|name| {
            match self.numeric_columns.get(name) {
                Some(NumericColumn {
                    precision: Some(p),
                }) => KeyColumn::with_precision(name.clone(), *p),
                Some(_) => KeyColumn::numeric(name.clone()),
                None => KeyColumn::text(name.clone()),
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TableCompareConfig::default();
        assert!(config.case_sensitive);
        assert!(!config.check_duplicates);
        assert_eq!(config.extra_policy, ExtraPolicy::Fail);
        assert!(!config.is_keyed());
    }

    #[test]
    fn parse_numeric_spec() {
        let (name, column) = NumericColumn::parse_spec("Price:0.01").unwrap();
        assert_eq!(name, "Price");
        assert_eq!(column.precision, Some(Decimal::new(1, 2)));

        let (name, column) = NumericColumn::parse_spec(" Qty ").unwrap();
        assert_eq!(name, "Qty");
        assert_eq!(column, NumericColumn::exact());

        assert!(NumericColumn::parse_spec("Price:abc").is_err());
        assert!(NumericColumn::parse_spec(":0.1").is_err());
    }

    #[test]
    fn from_toml() {
        let text = r#"
            key_columns = ["Account", "Price"]
            check_duplicates = true
            extra_policy = "info"
            ignore_columns = ["Timestamp"]

            [numeric_columns.Price]
            precision = "0.01"

            [numeric_columns.Qty]

            [column_mapping.actual]
            ACCOUNT_ID = "Account"

            [max_stored_rows]
            passed = 100
        "#;
        let config = TableCompareConfig::from_toml_str(text).unwrap();
        assert_eq!(config.key_columns, vec!["Account", "Price"]);
        assert!(config.check_duplicates);
        assert!(config.case_sensitive);
        assert_eq!(config.extra_policy, ExtraPolicy::Info);
        assert_eq!(
            config.numeric_columns["Price"].precision,
            Some(Decimal::new(1, 2))
        );
        assert_eq!(config.numeric_columns["Qty"], NumericColumn::exact());
        assert_eq!(config.column_mapping.actual["ACCOUNT_ID"], "Account");
        assert_eq!(config.max_stored_rows.passed, Some(100));
        assert_eq!(config.max_stored_rows.failed, None);
        assert_eq!(config.key_spec().names(), &["Account", "Price"]);
    }

    #[test]
    fn rejects_contradictions() {
        let text = r#"
            key_columns = ["Id"]
            ignore_columns = ["Id"]
        "#;
        assert!(matches!(
            TableCompareConfig::from_toml_str(text),
            Err(TableError::Config(_))
        ));
        assert!(matches!(
            TableCompareConfig::from_toml_str("key_columns = 5"),
            Err(TableError::ConfigParse(_))
        ));
    }
}
