//! The value matcher and the diff leaves it produces.

use concord_types::{FieldDiff, Outcome};
use tracing::trace;

use crate::error::MatchResult;
use crate::expr::{self, Expectation};

/// When an absent expected value is shown instead of checked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InfoIndication {
    /// Always check; an absent expected value matches only an absent actual.
    #[default]
    Never,
    /// Absent expected value yields an `info` leaf.
    Null,
    /// Absent or empty expected value yields an `info` leaf.
    NullOrEmpty,
}

/// Evaluates expected expressions against actual values.
///
/// Holds no state beyond its configuration, so one instance can be shared by
/// any number of concurrent comparisons.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValueMatcher {
    case_sensitive: bool,
}

impl Default for ValueMatcher {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ValueMatcher {
    pub fn new(case_sensitive: bool) -> Self {
        Self { case_sensitive }
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    /// Judge `actual` against `expected` with this matcher's case mode.
    pub fn matches(&self, expected: &str, actual: Option<&str>) -> MatchResult<bool> {
        self.matches_with_case(expected, actual, self.case_sensitive)
    }

    pub fn matches_with_case(
        &self,
        expected: &str,
        actual: Option<&str>,
        case_sensitive: bool,
    ) -> MatchResult<bool> {
        trace!(expected, actual, "checking actual value against expression");
        let expectation = Expectation::parse(expected)?;
        Ok(expectation.evaluate(actual, case_sensitive))
    }

    /// Whether `expected` needs the DSL rather than plain equality.
    pub fn is_expression(&self, expected: &str) -> bool {
        expr::is_expression(expected)
    }

    /// Compare one field and build its leaf. Evaluation errors become
    /// `error` leaves carrying the error text.
    pub fn compare_field(
        &self,
        name: &str,
        expected: Option<&str>,
        actual: Option<&str>,
        indication: InfoIndication,
    ) -> FieldDiff {
        let shown_only = match indication {
            InfoIndication::Never => false,
            InfoIndication::Null => expected.is_none(),
            InfoIndication::NullOrEmpty => expected.map_or(true, str::is_empty),
        };
        if shown_only {
            return FieldDiff::info(name, expected, actual);
        }
        let Some(exp) = expected else {
            return FieldDiff::new(name, None, actual, Outcome::from_match(actual.is_none()));
        };
        match self.matches(exp, actual) {
            Ok(matched) => FieldDiff::new(name, expected, actual, Outcome::from_match(matched)),
            Err(e) => FieldDiff::error(name, expected, actual, e.to_string()),
        }
    }

    /// Compare two plain value lists as multisets. Leaves are numbered from
    /// `1`, prefixed with `prefix`: first every expected value (matched or
    /// missing), then every actual value nobody claimed.
    pub fn compare_lists<E, A>(&self, prefix: &str, expected: &[E], actual: &[A]) -> Vec<FieldDiff>
    where
        E: AsRef<str>,
        A: AsRef<str>,
    {
        let mut remaining: Vec<&str> = actual.iter().map(AsRef::as_ref).collect();
        let mut leaves = Vec::with_capacity(expected.len() + actual.len());
        for exp in expected.iter().map(AsRef::as_ref) {
            let name = format!("{prefix}{}", leaves.len() + 1);
            match remaining.iter().position(|a| *a == exp) {
                Some(i) => {
                    remaining.remove(i);
                    leaves.push(FieldDiff::new(name, Some(exp), Some(exp), Outcome::Match));
                }
                None => leaves.push(FieldDiff::new(name, Some(exp), None, Outcome::Mismatch)),
            }
        }
        for act in remaining {
            let name = format!("{prefix}{}", leaves.len() + 1);
            leaves.push(FieldDiff::new(name, None, Some(act), Outcome::Mismatch));
        }
        leaves
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_case_modes() {
        let strict = ValueMatcher::default();
        assert!(strict.matches("Abc", Some("Abc")).unwrap());
        assert!(!strict.matches("Abc", Some("abc")).unwrap());
        assert!(!strict.matches("Abc", None).unwrap());

        let relaxed = ValueMatcher::new(false);
        assert!(relaxed.matches("Abc", Some("aBC")).unwrap());
        assert!(strict.matches_with_case("Abc", Some("aBC"), false).unwrap());
    }

    #[test]
    fn patterns_ignore_case_mode() {
        let relaxed = ValueMatcher::new(false);
        assert!(!relaxed.matches("{pattern('[A-Z]+')}", Some("abc")).unwrap());
    }

    #[test]
    fn compare_field_outcomes() {
        let m = ValueMatcher::default();
        let leaf = m.compare_field("Qty", Some("@{isGreaterThan(5)}"), Some("6"), InfoIndication::Never);
        assert_eq!(leaf.outcome, Outcome::Match);

        let leaf = m.compare_field("Qty", Some("@{isGreaterThan(a)}"), Some("6"), InfoIndication::Never);
        assert_eq!(leaf.outcome, Outcome::Error);
        assert!(leaf.error.unwrap().contains("isGreaterThan"));

        let leaf = m.compare_field("Qty", Some("5"), Some("6"), InfoIndication::Never);
        assert_eq!(leaf.outcome, Outcome::Mismatch);
    }

    #[test]
    fn info_indication() {
        let m = ValueMatcher::default();
        assert_eq!(
            m.compare_field("Note", None, Some("x"), InfoIndication::Null).outcome,
            Outcome::Info
        );
        assert_eq!(
            m.compare_field("Note", Some(""), Some("x"), InfoIndication::Null).outcome,
            Outcome::Mismatch
        );
        assert_eq!(
            m.compare_field("Note", Some(""), Some("x"), InfoIndication::NullOrEmpty).outcome,
            Outcome::Info
        );
        assert_eq!(
            m.compare_field("Note", None, None, InfoIndication::Never).outcome,
            Outcome::Match
        );
        assert_eq!(
            m.compare_field("Note", None, Some("x"), InfoIndication::Never).outcome,
            Outcome::Mismatch
        );
    }

    #[test]
    fn lists_are_multisets() {
        let m = ValueMatcher::default();
        let leaves = m.compare_lists("#", &["a", "b", "a"], &["a", "c", "a"]);
        let summary: Vec<_> = leaves
            .iter()
            .map(|l| (l.name.as_str(), l.outcome))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("#1", Outcome::Match),
                ("#2", Outcome::Mismatch),
                ("#3", Outcome::Match),
                ("#4", Outcome::Mismatch),
            ]
        );
        assert_eq!(leaves[3].actual.as_deref(), Some("c"));
    }

    #[test]
    fn shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ValueMatcher>();
    }
}
