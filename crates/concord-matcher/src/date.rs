//! Date/time formats written with the platform's pattern letters
//! (`yyyy-MM-dd HH:mm:ss.SSS`), translated to `chrono` format strings.
//!
//! Parsing is strict: every character of the value must be consumed and
//! every field must be in range.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// A translated date/time format.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateFormat {
    pattern: String,
    chrono: String,
}

impl DateFormat {
    /// Translate a pattern such as `dd.MM.yyyy'T'HH:mm`.
    pub fn parse(pattern: &str) -> Result<Self, String> {
        let mut chrono = String::with_capacity(pattern.len() * 2);
        let chars: Vec<char> = pattern.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if c == '\'' {
                // Quoted literal; '' is a literal quote.
                if chars.get(i + 1) == Some(&'\'') {
                    chrono.push('\'');
                    i += 2;
                    continue;
                }
                let mut j = i + 1;
                loop {
                    match chars.get(j) {
                        None => return Err("unterminated quoted literal".into()),
                        Some('\'') if chars.get(j + 1) == Some(&'\'') => {
                            chrono.push('\'');
                            j += 2;
                        }
                        Some('\'') => break,
                        Some(&lit) => {
                            push_literal(&mut chrono, lit);
                            j += 1;
                        }
                    }
                }
                i = j + 1;
                continue;
            }
            if !c.is_ascii_alphabetic() {
                push_literal(&mut chrono, c);
                i += 1;
                continue;
            }
            let run = chars[i..].iter().take_while(|&&x| x == c).count();
            chrono.push_str(&letter_spec(c, run)?);
            i += run;
        }
        Ok(Self {
            pattern: pattern.to_string(),
            chrono,
        })
    }

    /// The pattern as written by the user.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Parse a value. Date-only formats yield midnight; time-only formats
    /// yield a time on 1970-01-01.
    pub fn parse_value(&self, value: &str) -> Option<NaiveDateTime> {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, &self.chrono) {
            return Some(dt);
        }
        if let Ok(d) = NaiveDate::parse_from_str(value, &self.chrono) {
            return Some(d.and_time(NaiveTime::MIN));
        }
        if let Ok(t) = NaiveTime::parse_from_str(value, &self.chrono) {
            return Some(NaiveDate::default().and_time(t));
        }
        None
    }
}

fn push_literal(out: &mut String, c: char) {
    if c == '%' {
        out.push_str("%%");
    } else {
        out.push(c);
    }
}

fn letter_spec(letter: char, run: usize) -> Result<String, String> {
    let spec = match (letter, run) {
        ('y', 2) => "%y",
        ('y', _) => "%Y",
        ('M', 1 | 2) => "%m",
        ('M', 3) => "%b",
        ('M', _) => "%B",
        ('d', _) => "%d",
        ('H', _) => "%H",
        ('h', _) => "%I",
        ('m', _) => "%M",
        ('s', _) => "%S",
        ('S', 3) => "%3f",
        ('S', 6) => "%6f",
        ('S', 9) => "%9f",
        ('a', _) => "%p",
        ('E', 1..=3) => "%a",
        ('E', _) => "%A",
        ('Z', _) => "%z",
        ('X', _) => "%:z",
        _ => {
            return Err(format!(
                "pattern letter '{}' repeated {run} time(s) is not supported",
                letter
            ))
        }
    };
    Ok(spec.to_string())
}
