//! Fixed-width interpretation of numeric date strings.
//!
//! Both the filename and the metadata parsers reduce their raw text to a run of
//! ASCII digits and classify it by length:
//!
//! | digits | meaning                                   |
//! |--------|-------------------------------------------|
//! | 14     | `YYYYMMDDHHMMSS`                          |
//! | 8      | `YYYYMMDD`, midnight                      |
//! | 13     | Unix epoch in milliseconds                |
//! | > 14   | first 14 digits read as `YYYYMMDDHHMMSS`  |
//!
//! Every other non-empty length is malformed.

use super::ParseError;
use crate::resolution::Zone;
use chrono::{DateTime, FixedOffset, NaiveDate};

/// Removes every character that is not an ASCII digit.
///
/// ```
/// use datetidy::parser::digits::extract_digits;
///
/// assert_eq!(extract_digits("IMG_20210305_141055"), "20210305141055");
/// assert_eq!(extract_digits("2019:12:31 23:59:00"), "20191231235900");
/// ```
pub fn extract_digits(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

/// Interprets a run of digits as a timestamp in `zone`.
///
/// # Errors
///
/// * [`ParseError::Unsupported`] when `digits` is empty (nothing to read).
/// * [`ParseError::Malformed`] for an unrecognised length or an impossible
///   calendar value.
pub fn parse_digit_run(digits: &str, zone: &Zone) -> Result<DateTime<FixedOffset>, ParseError> {
    if digits.is_empty() {
        return Err(ParseError::unsupported("no digits to interpret"));
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ParseError::malformed(format!("'{}' is not a digit run", digits)));
    }

    match digits.len() {
        8 => wall_clock(digits, false, zone),
        13 => epoch_millis(digits, zone),
        14 => wall_clock(digits, true, zone),
        n if n > 14 => wall_clock(&digits[..14], true, zone),
        n => Err(ParseError::malformed(format!(
            "{} digits ('{}') do not match a known date layout",
            n, digits
        ))),
    }
}

fn wall_clock(
    digits: &str,
    with_time: bool,
    zone: &Zone,
) -> Result<DateTime<FixedOffset>, ParseError> {
    let field = |range: std::ops::Range<usize>| -> u32 {
        // Callers only pass ASCII digits of the right length.
        digits[range].parse().unwrap_or(u32::MAX)
    };

    let year = field(0..4) as i32;
    let date = NaiveDate::from_ymd_opt(year, field(4..6), field(6..8))
        .ok_or_else(|| ParseError::malformed(format!("'{}' is not a calendar date", digits)))?;

    let naive = if with_time {
        date.and_hms_opt(field(8..10), field(10..12), field(12..14))
            .ok_or_else(|| ParseError::malformed(format!("'{}' is not a time of day", digits)))?
    } else {
        date.and_hms_opt(0, 0, 0)
            .ok_or_else(|| ParseError::malformed("midnight is not representable"))?
    };

    zone.localize(naive).ok_or_else(|| {
        ParseError::malformed(format!("'{}' does not exist in the configured timezone", digits))
    })
}

fn epoch_millis(digits: &str, zone: &Zone) -> Result<DateTime<FixedOffset>, ParseError> {
    let millis: i64 = digits
        .parse()
        .map_err(|_| ParseError::malformed(format!("'{}' is not an epoch timestamp", digits)))?;
    DateTime::from_timestamp_millis(millis)
        .map(|utc| zone.from_utc(utc))
        .ok_or_else(|| ParseError::malformed(format!("epoch {} is out of range", millis)))
}
