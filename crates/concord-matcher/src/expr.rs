//! Parsing expected expressions into [`Expectation`] values.
//!
//! Resolution order matters because token prefixes overlap:
//!
//! 1. `{pattern('...')}` anywhere in the text
//! 2. a known function call, `@{name(args)}` or `{name(args)}`, looked up in
//!    [`FUNCTIONS`] (timestamp, dates, numeric comparisons, `asNumber`
//!    family, negations)
//! 3. a sentinel token such as `@{isNull}` (trimmed, exact)
//! 4. literal equality
//!
//! Call syntax with an unknown function name falls through to a literal.

use std::fmt;

use chrono::NaiveDateTime;
use regex::Regex;
use rust_decimal::Decimal;
use tracing::warn;

use crate::args::Arguments;
use crate::date::DateFormat;
use crate::error::{MatchError, MatchResult};
use crate::number::{self, round_half_up};
use crate::pattern;

// ---------------------------------------------------------------------------
// Inclusion
// ---------------------------------------------------------------------------

/// Which bounds of an interval belong to it. Intervals are open by default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Inclusion {
    #[default]
    None,
    IncludeLeft,
    IncludeRight,
    IncludeBoth,
}

impl Inclusion {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "none" => Some(Self::None),
            "includeLeft" => Some(Self::IncludeLeft),
            "includeRight" => Some(Self::IncludeRight),
            "includeBoth" => Some(Self::IncludeBoth),
            _ => None,
        }
    }

    /// Whether `value` lies between `left` and `right` under this inclusion.
    pub fn admits<T: PartialOrd>(&self, value: &T, left: &T, right: &T) -> bool {
        let left_ok = match self {
            Self::IncludeLeft | Self::IncludeBoth => value >= left,
            _ => value > left,
        };
        let right_ok = match self {
            Self::IncludeRight | Self::IncludeBoth => value <= right,
            _ => value < right,
        };
        left_ok && right_ok
    }
}

impl fmt::Display for Inclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::IncludeLeft => write!(f, "includeLeft"),
            Self::IncludeRight => write!(f, "includeRight"),
            Self::IncludeBoth => write!(f, "includeBoth"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sentinels
// ---------------------------------------------------------------------------

/// Parameter-less tokens written as `@{token}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Sentinel {
    /// `isNull`, `isNotPresent`, `isNotSet`
    Null,
    /// `isNotNull`, `isPresent`, `isSet`
    NotNull,
    Empty,
    NotEmpty,
    /// `isNullOrEmpty`, `isNotPresentOrEmpty`, `isNotSetOrEmpty`
    NullOrEmpty,
    AnyValue,
    Number,
    Integer,
    Float,
}

const SENTINELS: &[(&str, Sentinel)] = &[
    ("@{isNull}", Sentinel::Null),
    ("@{isNotPresent}", Sentinel::Null),
    ("@{isNotSet}", Sentinel::Null),
    ("@{isNotNull}", Sentinel::NotNull),
    ("@{isPresent}", Sentinel::NotNull),
    ("@{isSet}", Sentinel::NotNull),
    ("@{isEmpty}", Sentinel::Empty),
    ("@{isNotEmpty}", Sentinel::NotEmpty),
    ("@{isNullOrEmpty}", Sentinel::NullOrEmpty),
    ("@{isNotPresentOrEmpty}", Sentinel::NullOrEmpty),
    ("@{isNotSetOrEmpty}", Sentinel::NullOrEmpty),
    ("@{isAnyValue}", Sentinel::AnyValue),
    ("@{isNumber}", Sentinel::Number),
    ("@{isInteger}", Sentinel::Integer),
    ("@{isFloat}", Sentinel::Float),
];

impl Sentinel {
    /// Look up a token; surrounding whitespace is ignored.
    pub fn lookup(expected: &str) -> Option<Self> {
        let token = expected.trim();
        SENTINELS.iter().find(|(t, _)| *t == token).map(|(_, s)| *s)
    }

    pub fn matches(&self, actual: Option<&str>) -> bool {
        match self {
            Self::Null => actual.is_none(),
            Self::NotNull => actual.is_some(),
            Self::Empty => actual == Some(""),
            Self::NotEmpty => actual.is_some_and(|a| !a.is_empty()),
            Self::NullOrEmpty => actual.map_or(true, str::is_empty),
            Self::AnyValue => true,
            Self::Number => actual.is_some_and(number::is_number),
            Self::Integer => actual.is_some_and(number::is_integer),
            Self::Float => actual.is_some_and(number::is_float),
        }
    }
}

// ---------------------------------------------------------------------------
// Function table
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    IsTimestamp,
    IsBeforeDate,
    IsAfterDate,
    IsBetweenDates,
    IsGreaterThan,
    IsGreaterOrEqual,
    IsLessThan,
    IsLessOrEqual,
    IsBetween,
    AsNumber,
    AsAbsNumber,
    IsNotEqualNumber,
    IsNotEqualText,
}

/// Name and parameter count bounds of one DSL function.
#[derive(Clone, Copy, Debug)]
pub struct FunctionSpec {
    pub name: &'static str,
    pub kind: FunctionKind,
    pub min: usize,
    pub max: usize,
}

const fn spec(name: &'static str, kind: FunctionKind, min: usize, max: usize) -> FunctionSpec {
    FunctionSpec { name, kind, min, max }
}

/// Known functions in precedence order.
pub const FUNCTIONS: &[FunctionSpec] = &[
    spec("isTimestamp", FunctionKind::IsTimestamp, 1, 1),
    spec("isBeforeDate", FunctionKind::IsBeforeDate, 2, 2),
    spec("isAfterDate", FunctionKind::IsAfterDate, 2, 2),
    spec("isBetweenDates", FunctionKind::IsBetweenDates, 3, 4),
    spec("isGreaterThan", FunctionKind::IsGreaterThan, 1, 1),
    spec("isGreaterOrEqual", FunctionKind::IsGreaterOrEqual, 1, 1),
    spec("isLessThan", FunctionKind::IsLessThan, 1, 1),
    spec("isLessOrEqual", FunctionKind::IsLessOrEqual, 1, 1),
    spec("isBetween", FunctionKind::IsBetween, 2, 3),
    spec("asNumber", FunctionKind::AsNumber, 1, 3),
    spec("asAbsNumber", FunctionKind::AsAbsNumber, 1, 3),
    spec("isNotEqualNumber", FunctionKind::IsNotEqualNumber, 1, 3),
    spec("isNotEqualText", FunctionKind::IsNotEqualText, 1, 3),
];

impl FunctionKind {
    pub fn spec(&self) -> &'static FunctionSpec {
        FUNCTIONS
            .iter()
            .find(|s| s.kind == *self)
            .unwrap_or(&FUNCTIONS[0])
    }

    pub fn name(&self) -> &'static str {
        self.spec().name
    }
}

/// A recognised function call: its table entry and the raw text between
/// the first `(` and the last `)`, if both are present.
struct Call<'a> {
    spec: &'static FunctionSpec,
    args: Option<&'a str>,
}

fn parse_call(expected: &str) -> Option<Call<'_>> {
    let text = expected.trim_start();
    let body = text
        .strip_prefix("@{")
        .or_else(|| text.strip_prefix('{'))?;
    let spec = FUNCTIONS.iter().find(|s| {
        body.strip_prefix(s.name)
            .is_some_and(|rest| rest.starts_with('('))
    })?;
    let args = match (text.find('('), text.rfind(')')) {
        (Some(open), Some(close)) if open < close => Some(&text[open + 1..close]),
        _ => None,
    };
    Some(Call { spec, args })
}

/// Whether the text uses the DSL at all, as opposed to plain equality.
pub fn is_expression(expected: &str) -> bool {
    pattern::contains_pattern(expected)
        || parse_call(expected).is_some()
        || Sentinel::lookup(expected).is_some()
}

// ---------------------------------------------------------------------------
// Expectations
// ---------------------------------------------------------------------------

/// Decimal equality as used by `asNumber`, `asAbsNumber` and
/// `isNotEqualNumber`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NumberEquality {
    pub expected: Decimal,
    /// Match requires `|expected - actual| < margin`.
    pub margin: Option<Decimal>,
    /// Both sides are rounded half-up to this scale first.
    pub scale: Option<i64>,
    /// Compare absolute values.
    pub absolute: bool,
}

impl NumberEquality {
    pub fn exact(expected: Decimal) -> Self {
        Self {
            expected,
            margin: None,
            scale: None,
            absolute: false,
        }
    }

    pub fn holds(&self, actual: Decimal) -> bool {
        let (mut expected, mut actual) = if self.absolute {
            (self.expected.abs(), actual.abs())
        } else {
            (self.expected, actual)
        };
        if let Some(scale) = self.scale {
            // A value that overflows when rounded cannot equal anything.
            match (round_half_up(expected, scale), round_half_up(actual, scale)) {
                (Some(e), Some(a)) => (expected, actual) = (e, a),
                _ => return false,
            }
        }
        match self.margin {
            None => expected == actual,
            Some(margin) => expected
                .checked_sub(actual)
                .is_some_and(|diff| diff.abs() < margin),
        }
    }

    fn from_args(args: &Arguments, absolute: bool) -> MatchResult<Self> {
        Ok(Self {
            expected: args.required_decimal(0, "expected value")?,
            margin: args.decimal(1, "margin of error")?,
            scale: args.integer(2, "scale")?,
            absolute,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NumberCheck {
    GreaterThan(Decimal),
    GreaterOrEqual(Decimal),
    LessThan(Decimal),
    LessOrEqual(Decimal),
    Between {
        left: Decimal,
        right: Decimal,
        inclusion: Inclusion,
    },
    Equal(NumberEquality),
}

impl NumberCheck {
    pub fn holds(&self, actual: Decimal) -> bool {
        match self {
            Self::GreaterThan(e) => actual > *e,
            Self::GreaterOrEqual(e) => actual >= *e,
            Self::LessThan(e) => actual < *e,
            Self::LessOrEqual(e) => actual <= *e,
            Self::Between {
                left,
                right,
                inclusion,
            } => inclusion.admits(&actual, left, right),
            Self::Equal(eq) => eq.holds(actual),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DateCheck {
    Before(NaiveDateTime),
    After(NaiveDateTime),
    Between {
        left: NaiveDateTime,
        right: NaiveDateTime,
        inclusion: Inclusion,
    },
}

impl DateCheck {
    pub fn holds(&self, actual: NaiveDateTime) -> bool {
        match self {
            Self::Before(e) => actual < *e,
            Self::After(e) => actual > *e,
            Self::Between {
                left,
                right,
                inclusion,
            } => inclusion.admits(&actual, left, right),
        }
    }
}

/// A parsed expected expression.
#[derive(Clone, Debug)]
pub enum Expectation {
    /// Anchored regex built from `{pattern('...')}` markers.
    Pattern(Regex),
    Timestamp(DateFormat),
    Date { check: DateCheck, format: DateFormat },
    Number(NumberCheck),
    NotEqualNumber(NumberEquality),
    NotEqualText {
        value: String,
        case_sensitive: bool,
        ignore_spaces: bool,
    },
    Sentinel(Sentinel),
    Literal(String),
}

impl Expectation {
    /// Parse an expected expression. Malformed function calls are errors.
    pub fn parse(expected: &str) -> MatchResult<Self> {
        if pattern::contains_pattern(expected) {
            return pattern::compile(expected).map(Self::Pattern);
        }
        if let Some(call) = parse_call(expected) {
            return Self::from_call(call);
        }
        if let Some(sentinel) = Sentinel::lookup(expected) {
            return Ok(Self::Sentinel(sentinel));
        }
        Ok(Self::Literal(expected.to_string()))
    }

    fn from_call(call: Call<'_>) -> MatchResult<Self> {
        let spec = call.spec;
        let args = Arguments::parse(spec.name, call.args)?;
        args.check_arity(spec.min, spec.max)?;

        let expectation = match spec.kind {
            FunctionKind::IsTimestamp => Self::Timestamp(date_format(&args, 0)?),
            FunctionKind::IsBeforeDate | FunctionKind::IsAfterDate => {
                let format = date_format(&args, 1)?;
                let date = expected_date(&args, 0, &format)?;
                let check = if spec.kind == FunctionKind::IsBeforeDate {
                    DateCheck::Before(date)
                } else {
                    DateCheck::After(date)
                };
                Self::Date { check, format }
            }
            FunctionKind::IsBetweenDates => {
                let format = date_format(&args, 2)?;
                let check = DateCheck::Between {
                    left: expected_date(&args, 0, &format)?,
                    right: expected_date(&args, 1, &format)?,
                    inclusion: args.inclusion(3)?,
                };
                Self::Date { check, format }
            }
            FunctionKind::IsGreaterThan => {
                Self::Number(NumberCheck::GreaterThan(args.required_decimal(0, "expected value")?))
            }
            FunctionKind::IsGreaterOrEqual => {
                Self::Number(NumberCheck::GreaterOrEqual(args.required_decimal(0, "expected value")?))
            }
            FunctionKind::IsLessThan => {
                Self::Number(NumberCheck::LessThan(args.required_decimal(0, "expected value")?))
            }
            FunctionKind::IsLessOrEqual => {
                Self::Number(NumberCheck::LessOrEqual(args.required_decimal(0, "expected value")?))
            }
            FunctionKind::IsBetween => Self::Number(NumberCheck::Between {
                left: args.required_decimal(0, "left bound")?,
                right: args.required_decimal(1, "right bound")?,
                inclusion: args.inclusion(2)?,
            }),
            FunctionKind::AsNumber => {
                Self::Number(NumberCheck::Equal(NumberEquality::from_args(&args, false)?))
            }
            FunctionKind::AsAbsNumber => {
                Self::Number(NumberCheck::Equal(NumberEquality::from_args(&args, true)?))
            }
            FunctionKind::IsNotEqualNumber => {
                Self::NotEqualNumber(NumberEquality::from_args(&args, false)?)
            }
            FunctionKind::IsNotEqualText => {
                if !args.is_quoted(0) {
                    return Err(MatchError::InvalidParameter {
                        function: spec.name,
                        value: args.text(0).unwrap_or_default().to_string(),
                        position: 1,
                        parameter: "expected value (must be quoted)",
                    });
                }
                Self::NotEqualText {
                    value: args.text(0).unwrap_or_default().to_string(),
                    case_sensitive: args.boolean(1, "case sensitive")?,
                    ignore_spaces: args.boolean(2, "ignore spaces")?,
                }
            }
        };
        Ok(expectation)
    }

    /// Judge an actual value. `case_sensitive` only affects literals.
    pub fn evaluate(&self, actual: Option<&str>, case_sensitive: bool) -> bool {
        match self {
            Self::Pattern(re) => re.is_match(actual.unwrap_or("")),
            Self::Timestamp(format) => actual.is_some_and(|a| format.parse_value(a).is_some()),
            Self::Date { check, format } => {
                let Some(value) = actual else {
                    return false;
                };
                match format.parse_value(value) {
                    Some(parsed) => check.holds(parsed),
                    None => {
                        warn!(actual = value, format = format.pattern(), "unparsable date in date check");
                        false
                    }
                }
            }
            Self::Number(check) => actual_decimal(actual).is_some_and(|a| check.holds(a)),
            Self::NotEqualNumber(eq) => actual_decimal(actual).is_some_and(|a| !eq.holds(a)),
            Self::NotEqualText {
                value,
                case_sensitive,
                ignore_spaces,
            } => {
                let Some(actual) = actual else {
                    return true;
                };
                let (mut e, mut a) = (value.clone(), actual.to_string());
                if !case_sensitive {
                    e = e.to_lowercase();
                    a = a.to_lowercase();
                }
                if *ignore_spaces {
                    e = e.trim().to_string();
                    a = a.trim().to_string();
                }
                e != a
            }
            Self::Sentinel(sentinel) => sentinel.matches(actual),
            Self::Literal(expected) => match actual {
                None => false,
                Some(a) if case_sensitive => expected == a,
                Some(a) => expected.to_lowercase() == a.to_lowercase(),
            },
        }
    }
}

fn actual_decimal(actual: Option<&str>) -> Option<Decimal> {
    actual.and_then(number::parse_decimal)
}

fn date_format(args: &Arguments, index: usize) -> MatchResult<DateFormat> {
    let pattern = args.required_text(index, "date format")?;
    DateFormat::parse(pattern).map_err(|reason| MatchError::InvalidDateFormat {
        function: args.function(),
        format: pattern.to_string(),
        reason,
    })
}

fn expected_date(args: &Arguments, index: usize, format: &DateFormat) -> MatchResult<NaiveDateTime> {
    let value = args.required_text(index, "date")?;
    format.parse_value(value).ok_or_else(|| MatchError::InvalidDate {
        function: args.function(),
        value: value.to_string(),
        format: format.pattern().to_string(),
    })
}
