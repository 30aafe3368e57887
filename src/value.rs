//! Cell value coercion.
//!
//! [`CellValue`] converts a single text cell into a primitive value and back.
//! It is implemented here for the string, boolean, integer, floating-point,
//! `char`, and `chrono` date/time types; user types opt in by implementing it
//! and invoking [`cell_field!`](crate::cell_field).
//!
//! Date/time values use one fixed canonical format per type (see the
//! `*_FORMAT` constants); parsing accepts exactly that format.

use crate::error::CellError;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};

/// Canonical `NaiveDate` cell format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Canonical `NaiveDateTime` cell format.
pub const DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
/// Canonical `NaiveTime` cell format.
pub const TIME_FORMAT: &str = "%H:%M:%S%.f";

const TRUES: [&str; 5] = ["true", "t", "1", "yes", "y"];
const FALSES: [&str; 5] = ["false", "f", "0", "no", "n"];

/// A value with a textual projection into a single cell.
pub trait CellValue: Sized {
    /// Parse the (non-empty) cell text.
    fn from_cell(text: &str) -> Result<Self, CellError>;

    /// Render the value as cell text.
    fn to_cell(&self) -> String;

    /// Whether this is the type's zero value. Columns that only ever carry zero
    /// values are candidates for pruning on encode.
    fn is_zero(&self) -> bool;
}

/// Parse a boolean cell.
///
/// Accepts `true`, `t`, `1`, `yes`, `y` and `false`, `f`, `0`, `no`, `n`,
/// case-insensitively.
pub fn parse_bool(text: &str) -> Result<bool, CellError> {
    let s = text.trim().to_lowercase();
    if TRUES.contains(&s.as_str()) {
        return Ok(true);
    }
    if FALSES.contains(&s.as_str()) {
        return Ok(false);
    }
    Err(CellError::InvalidBool(text.to_string()))
}

impl CellValue for String {
    fn from_cell(text: &str) -> Result<Self, CellError> {
        Ok(text.to_string())
    }

    fn to_cell(&self) -> String {
        self.clone()
    }

    fn is_zero(&self) -> bool {
        self.is_empty()
    }
}

impl CellValue for bool {
    fn from_cell(text: &str) -> Result<Self, CellError> {
        parse_bool(text)
    }

    fn to_cell(&self) -> String {
        self.to_string()
    }

    fn is_zero(&self) -> bool {
        !*self
    }
}

impl CellValue for char {
    fn from_cell(text: &str) -> Result<Self, CellError> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(CellError::InvalidChar(text.to_string())),
        }
    }

    fn to_cell(&self) -> String {
        self.to_string()
    }

    fn is_zero(&self) -> bool {
        *self == '\0'
    }
}

macro_rules! int_cell_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl CellValue for $t {
                fn from_cell(text: &str) -> Result<Self, CellError> {
                    text.trim().parse::<$t>().map_err(|e| CellError::InvalidInt {
                        value: text.to_string(),
                        reason: e.to_string(),
                    })
                }

                fn to_cell(&self) -> String {
                    self.to_string()
                }

                fn is_zero(&self) -> bool {
                    *self == 0
                }
            }
        )*
    };
}

macro_rules! float_cell_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl CellValue for $t {
                fn from_cell(text: &str) -> Result<Self, CellError> {
                    text.trim().parse::<$t>().map_err(|e| CellError::InvalidFloat {
                        value: text.to_string(),
                        reason: e.to_string(),
                    })
                }

                fn to_cell(&self) -> String {
                    self.to_string()
                }

                fn is_zero(&self) -> bool {
                    *self == 0.0
                }
            }
        )*
    };
}

int_cell_value!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
float_cell_value!(f32, f64);

impl CellValue for NaiveDate {
    fn from_cell(text: &str) -> Result<Self, CellError> {
        NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).map_err(|_| CellError::InvalidDate {
            value: text.to_string(),
            expected: DATE_FORMAT,
        })
    }

    fn to_cell(&self) -> String {
        self.format(DATE_FORMAT).to_string()
    }

    fn is_zero(&self) -> bool {
        *self == DateTime::<Utc>::UNIX_EPOCH.date_naive()
    }
}

impl CellValue for NaiveDateTime {
    fn from_cell(text: &str) -> Result<Self, CellError> {
        NaiveDateTime::parse_from_str(text.trim(), DATE_TIME_FORMAT).map_err(|_| {
            CellError::InvalidDate {
                value: text.to_string(),
                expected: DATE_TIME_FORMAT,
            }
        })
    }

    fn to_cell(&self) -> String {
        self.format(DATE_TIME_FORMAT).to_string()
    }

    fn is_zero(&self) -> bool {
        *self == DateTime::<Utc>::UNIX_EPOCH.naive_utc()
    }
}

impl CellValue for NaiveTime {
    fn from_cell(text: &str) -> Result<Self, CellError> {
        NaiveTime::parse_from_str(text.trim(), TIME_FORMAT).map_err(|_| CellError::InvalidDate {
            value: text.to_string(),
            expected: TIME_FORMAT,
        })
    }

    fn to_cell(&self) -> String {
        self.format(TIME_FORMAT).to_string()
    }

    fn is_zero(&self) -> bool {
        self.num_seconds_from_midnight() == 0 && self.nanosecond() == 0
    }
}

impl CellValue for DateTime<FixedOffset> {
    fn from_cell(text: &str) -> Result<Self, CellError> {
        DateTime::parse_from_rfc3339(text.trim()).map_err(|_| CellError::InvalidDate {
            value: text.to_string(),
            expected: "RFC 3339",
        })
    }

    fn to_cell(&self) -> String {
        self.to_rfc3339()
    }

    fn is_zero(&self) -> bool {
        self.timestamp() == 0 && self.timestamp_subsec_nanos() == 0
    }
}

impl CellValue for DateTime<Utc> {
    fn from_cell(text: &str) -> Result<Self, CellError> {
        DateTime::<FixedOffset>::from_cell(text).map(|dt| dt.with_timezone(&Utc))
    }

    fn to_cell(&self) -> String {
        self.to_rfc3339()
    }

    fn is_zero(&self) -> bool {
        *self == DateTime::<Utc>::UNIX_EPOCH
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_accepts_the_usual_spellings() {
        for t in ["true", "T", "1", "Yes", "y"] {
            assert_eq!(parse_bool(t), Ok(true), "{t}");
        }
        for f in ["FALSE", "f", "0", "no", "N"] {
            assert_eq!(parse_bool(f), Ok(false), "{f}");
        }
        assert!(matches!(parse_bool("maybe"), Err(CellError::InvalidBool(_))));
    }

    #[test]
    fn integers_trim_and_reject_garbage() {
        assert_eq!(i32::from_cell(" 42 "), Ok(42));
        assert!(u8::from_cell("-1").is_err());
        assert!(u16::from_cell("70000").is_err());
        assert!(matches!(
            i64::from_cell("4.5"),
            Err(CellError::InvalidInt { .. })
        ));
    }

    #[test]
    fn floats_render_shortest_round_trip() {
        let v = f64::from_cell("0.1").unwrap();
        assert_eq!(v.to_cell(), "0.1");
        assert_eq!(f64::from_cell(&v.to_cell()), Ok(v));
        assert!(0.0f32.is_zero());
    }

    #[test]
    fn dates_use_canonical_formats() {
        let d = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(d.to_cell(), "2024-02-29");
        assert_eq!(NaiveDate::from_cell("2024-02-29"), Ok(d));
        assert!(NaiveDate::from_cell("29/02/2024").is_err());

        let dt = DateTime::<Utc>::from_cell("2024-01-02T03:04:05Z").unwrap();
        assert_eq!(dt.to_cell(), "2024-01-02T03:04:05+00:00");
        assert!(DateTime::<Utc>::UNIX_EPOCH.is_zero());
    }

    #[test]
    fn char_requires_exactly_one_character() {
        assert_eq!(char::from_cell("x"), Ok('x'));
        assert!(char::from_cell("xy").is_err());
    }
}
