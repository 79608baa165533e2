//! Argument lists of DSL function calls.
//!
//! Arguments are comma separated. Commas inside single quotes do not split.
//! Surrounding spaces and one pair of single quotes are stripped from each
//! argument; an empty optional argument counts as not given.

use rust_decimal::Decimal;

use crate::error::{MatchError, MatchResult};
use crate::expr::Inclusion;
use crate::number;

#[derive(Clone, Debug, PartialEq, Eq)]
struct Argument {
    text: String,
    quoted: bool,
}

/// Parsed arguments of one function call.
#[derive(Clone, Debug)]
pub struct Arguments {
    function: &'static str,
    items: Vec<Argument>,
}

impl Arguments {
    /// Split the text between the call's parentheses. `None` means the
    /// parentheses themselves were missing.
    pub fn parse(function: &'static str, raw: Option<&str>) -> MatchResult<Self> {
        let raw = match raw {
            Some(r) if !r.trim().is_empty() => r,
            _ => return Err(MatchError::MissingParameters { function }),
        };
        let items = split(raw)
            .into_iter()
            .map(|part| {
                let trimmed = part.trim();
                let quoted = trimmed.len() >= 2 && trimmed.starts_with('\'') && trimmed.ends_with('\'');
                let text = if quoted {
                    &trimmed[1..trimmed.len() - 1]
                } else {
                    trimmed
                };
                Argument {
                    text: text.to_string(),
                    quoted,
                }
            })
            .collect();
        Ok(Self { function, items })
    }

    pub fn function(&self) -> &'static str {
        self.function
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn check_arity(&self, min: usize, max: usize) -> MatchResult<()> {
        if (min..=max).contains(&self.items.len()) {
            Ok(())
        } else {
            Err(MatchError::WrongArity {
                function: self.function,
                actual: self.items.len(),
                min,
                max,
            })
        }
    }

    /// Argument text with quotes removed; `None` when absent or empty.
    pub fn text(&self, index: usize) -> Option<&str> {
        self.items
            .get(index)
            .map(|a| a.text.as_str())
            .filter(|t| !t.is_empty())
    }

    /// Whether the argument was written inside single quotes.
    pub fn is_quoted(&self, index: usize) -> bool {
        self.items.get(index).is_some_and(|a| a.quoted)
    }

    pub fn required_text(&self, index: usize, parameter: &'static str) -> MatchResult<&str> {
        self.text(index).ok_or_else(|| self.invalid(index, "", parameter))
    }

    pub fn decimal(&self, index: usize, parameter: &'static str) -> MatchResult<Option<Decimal>> {
        match self.text(index) {
            None => Ok(None),
            Some(t) => number::parse_decimal(t)
                .map(Some)
                .ok_or_else(|| self.invalid(index, t, parameter)),
        }
    }

    pub fn required_decimal(&self, index: usize, parameter: &'static str) -> MatchResult<Decimal> {
        self.decimal(index, parameter)?
            .ok_or_else(|| self.invalid(index, "", parameter))
    }

    pub fn integer(&self, index: usize, parameter: &'static str) -> MatchResult<Option<i64>> {
        match self.text(index) {
            None => Ok(None),
            Some(t) if number::is_integer(t) => t
                .parse::<i64>()
                .map(Some)
                .map_err(|_| self.invalid(index, t, parameter)),
            Some(t) => Err(self.invalid(index, t, parameter)),
        }
    }

    /// `true` or `false`, case-insensitive. Absent or empty reads as `true`.
    pub fn boolean(&self, index: usize, parameter: &'static str) -> MatchResult<bool> {
        match self.text(index) {
            None => Ok(true),
            Some(t) if t.eq_ignore_ascii_case("true") => Ok(true),
            Some(t) if t.eq_ignore_ascii_case("false") => Ok(false),
            Some(t) => Err(self.invalid(index, t, parameter)),
        }
    }

    /// Interval inclusion; absent means an open interval.
    pub fn inclusion(&self, index: usize) -> MatchResult<Inclusion> {
        match self.text(index) {
            None => Ok(Inclusion::default()),
            Some(t) => Inclusion::parse(t).ok_or_else(|| MatchError::InvalidInclusion {
                function: self.function,
                value: t.to_string(),
            }),
        }
    }

    fn invalid(&self, index: usize, value: &str, parameter: &'static str) -> MatchError {
        MatchError::InvalidParameter {
            function: self.function,
            value: value.to_string(),
            position: index + 1,
            parameter,
        }
    }
}

fn split(raw: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;
    for (i, c) in raw.char_indices() {
        match c {
            '\'' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                parts.push(&raw[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&raw[start..]);
    parts
}
