//! Lexical number checks and decimal helpers.
//!
//! All arithmetic is done on [`Decimal`], never on floating point.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};

/// General numeric shape: decimal or scientific notation with an optional
/// trailing type qualifier, or a hexadecimal literal.
static NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?(?:0[xX][0-9a-fA-F]+|(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?[fFdDlL]?)$")
        .expect("static regex")
});

/// A decimal point (or comma) with digits on both sides.
static FLOAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?\d+[,.]\d+$").expect("static regex"));

static INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[+-]?\d+$").expect("static regex"));

pub fn is_number(value: &str) -> bool {
    NUMBER.is_match(value)
}

pub fn is_float(value: &str) -> bool {
    FLOAT.is_match(value)
}

pub fn is_integer(value: &str) -> bool {
    INTEGER.is_match(value)
}

/// A number whose last character is a digit, i.e. without a type qualifier
/// such as `f` or `L`.
pub fn is_number_without_qualifier(value: &str) -> bool {
    is_number(value) && value.ends_with(|c: char| c.is_ascii_digit())
}

/// Parse a number without qualifier. `None` for anything else, including
/// values outside the decimal range.
pub fn parse_decimal(value: &str) -> Option<Decimal> {
    if !is_number_without_qualifier(value) {
        return None;
    }
    let (negative, digits) = match value.as_bytes()[0] {
        b'-' => (true, &value[1..]),
        b'+' => (false, &value[1..]),
        _ => (false, value),
    };
    if digits.starts_with("0x") || digits.starts_with("0X") {
        return None;
    }
    let mut text = String::with_capacity(value.len() + 2);
    if negative {
        text.push('-');
    }
    if digits.starts_with('.') {
        text.push('0');
    }
    text.push_str(digits);

    if text.contains(['e', 'E']) {
        Decimal::from_scientific(&text).ok()
    } else {
        Decimal::from_str(&text).ok()
    }
}

/// Round half away from zero to `scale` decimal places. A negative scale
/// rounds to tens, hundreds, and so on. `None` when the rounded value no
/// longer fits a `Decimal`.
pub fn round_half_up(value: Decimal, scale: i64) -> Option<Decimal> {
    if scale >= 0 {
        let dp = u32::try_from(scale).unwrap_or(u32::MAX);
        return Some(value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero));
    }
    let mut factor = Decimal::ONE;
    for _ in 0..scale.unsigned_abs() {
        factor = match factor.checked_mul(Decimal::TEN) {
            Some(f) => f,
            None => return Some(Decimal::ZERO),
        };
    }
    value
        .checked_div(factor)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .checked_mul(factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn lexical_shapes() {
        assert!(is_number("12"));
        assert!(is_number("-12.5"));
        assert!(is_number("1e5"));
        assert!(is_number("12L"));
        assert!(is_number("0x1F"));
        assert!(!is_number("12a"));
        assert!(!is_number(""));

        assert!(is_float("1.5"));
        assert!(is_float("1,5"));
        assert!(!is_float("15"));

        assert!(is_integer("-15"));
        assert!(!is_integer("1.0"));
    }

    #[test]
    fn qualifiers_are_not_numbers() {
        assert!(!is_number_without_qualifier("10f"));
        assert!(!is_number_without_qualifier("10L"));
        assert!(!is_number_without_qualifier("10."));
        assert!(is_number_without_qualifier("10"));
        assert_eq!(parse_decimal("10f"), None);
    }

    #[test]
    fn parses_decimal_forms() {
        assert_eq!(parse_decimal("500.10"), Some(dec("500.1")));
        assert_eq!(parse_decimal("+7"), Some(dec("7")));
        assert_eq!(parse_decimal("-.5"), Some(dec("-0.5")));
        assert_eq!(parse_decimal("1.5e2"), Some(dec("150")));
        assert_eq!(parse_decimal("0x10"), None);
        assert_eq!(parse_decimal("abc"), None);
    }

    #[test]
    fn rounding_half_up() {
        assert_eq!(round_half_up(dec("2.45"), 1), Some(dec("2.5")));
        assert_eq!(round_half_up(dec("-2.45"), 1), Some(dec("-2.5")));
        assert_eq!(round_half_up(dec("2.44"), 1), Some(dec("2.4")));
        assert_eq!(round_half_up(dec("1250"), -2), Some(dec("1300")));
        assert_eq!(round_half_up(dec("1249"), -2), Some(dec("1200")));
    }

    #[test]
    fn rounding_past_decimal_range() {
        assert_eq!(round_half_up(Decimal::MAX, -1), None);
        assert_eq!(round_half_up(Decimal::MIN, -1), None);
        assert_eq!(round_half_up(Decimal::MAX, 0), Some(Decimal::MAX));
        assert_eq!(round_half_up(dec("123"), -40), Some(Decimal::ZERO));
    }
}
