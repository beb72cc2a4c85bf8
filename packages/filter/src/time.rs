//! Decomposition of crash timestamps.
//!
//! Source timestamps are free text of the form `M/D/YYYY h:mm:ss AM|PM`
//! with no timezone. Parsing never panics; failures are reported as a
//! [`TimestampError`] so callers can tell "did not match" apart from
//! "could not be evaluated".

use chrono::{Datelike as _, NaiveDate};
use crash_map_crash_models::MINUTES_PER_DAY;

/// Why a timestamp could not be decomposed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimestampError {
    /// No timestamp value at all.
    #[error("timestamp is missing")]
    Missing,

    /// The timestamp is an empty string.
    #[error("timestamp is empty")]
    Empty,

    /// There is no space separating the date from the time.
    #[error("timestamp '{0}' has no time component")]
    MissingTimeComponent(String),

    /// The date portion is not a calendar date.
    #[error("invalid date '{0}'")]
    InvalidDate(String),

    /// The timestamp is not `date time meridiem`.
    #[error("expected 3 space-separated tokens, found {0}")]
    TokenCount(usize),

    /// The clock portion is not `H:MM[:SS]` on a 12-hour clock.
    #[error("invalid clock time '{0}'")]
    InvalidTime(String),

    /// The meridiem is neither `AM` nor `PM`.
    #[error("invalid meridiem '{0}'")]
    InvalidMeridiem(String),
}

/// Extracts the calendar year from a timestamp's date portion (everything
/// before the first space).
///
/// Accepts `M/D/YYYY`, and `YYYY-MM-DD` for exports that switched to ISO
/// dates.
///
/// # Errors
///
/// Returns [`TimestampError`] if the timestamp is missing, empty, has no
/// space, or the date portion does not parse.
pub fn extract_year<'a>(timestamp: impl Into<Option<&'a str>>) -> Result<i32, TimestampError> {
    let timestamp = timestamp.into().ok_or(TimestampError::Missing)?;
    if timestamp.is_empty() {
        return Err(TimestampError::Empty);
    }

    let (date, _) = timestamp
        .split_once(' ')
        .ok_or_else(|| TimestampError::MissingTimeComponent(timestamp.to_string()))?;

    NaiveDate::parse_from_str(date, "%m/%d/%Y")
        .or_else(|_| NaiveDate::parse_from_str(date, "%Y-%m-%d"))
        .map(|d| d.year())
        .map_err(|_| TimestampError::InvalidDate(date.to_string()))
}

/// Returns the minutes since midnight (`0..1440`) of a timestamp.
///
/// The timestamp must split on single spaces into exactly three tokens:
/// date, `H:MM[:SS]`, and meridiem. Seconds are ignored.
///
/// # Errors
///
/// Returns [`TimestampError`] if the token count is wrong or the clock or
/// meridiem does not parse.
pub fn minutes_since_midnight<'a>(
    timestamp: impl Into<Option<&'a str>>,
) -> Result<u16, TimestampError> {
    let timestamp = timestamp.into().ok_or(TimestampError::Missing)?;
    let tokens: Vec<&str> = timestamp.split(' ').collect();
    let [_, clock, meridiem] = tokens.as_slice() else {
        return Err(TimestampError::TokenCount(tokens.len()));
    };

    let (hour, minute) = parse_clock(clock)?;
    Ok(to_24_hour(hour, meridiem)? * 60 + minute)
}

/// Formats minutes since midnight as a 12-hour clock string, e.g.
/// `"6:15 PM"`. Values past the end of the day wrap around.
#[must_use]
pub fn format_time(minutes: u16) -> String {
    let minutes = minutes % MINUTES_PER_DAY;
    let hour = minutes / 60;
    let minute = minutes % 60;
    let meridiem = if hour >= 12 { "PM" } else { "AM" };
    let hour = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{hour}:{minute:02} {meridiem}")
}

/// Parses a 12-hour clock string such as `"6:15 PM"` (the output of
/// [`format_time`]) into minutes since midnight.
///
/// # Errors
///
/// Returns [`TimestampError`] if the text is not `H:MM[:SS] AM|PM`.
pub fn parse_time_of_day(text: &str) -> Result<u16, TimestampError> {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let [clock, meridiem] = tokens.as_slice() else {
        return Err(TimestampError::TokenCount(tokens.len()));
    };

    let (hour, minute) = parse_clock(clock)?;
    Ok(to_24_hour(hour, meridiem)? * 60 + minute)
}

/// Parses `H:MM[:SS]` into an hour (`0..=12`) and minute (`0..60`).
fn parse_clock(clock: &str) -> Result<(u16, u16), TimestampError> {
    let invalid = || TimestampError::InvalidTime(clock.to_string());

    let mut parts = clock.split(':');
    let hour: u16 = parts
        .next()
        .and_then(|h| h.parse().ok())
        .ok_or_else(invalid)?;
    let minute: u16 = parts
        .next()
        .and_then(|m| m.parse().ok())
        .ok_or_else(invalid)?;

    // At most a seconds component may follow.
    if parts.count() > 1 || hour > 12 || minute >= 60 {
        return Err(invalid());
    }

    Ok((hour, minute))
}

/// Converts a 12-hour clock hour to 24-hour form.
fn to_24_hour(hour: u16, meridiem: &str) -> Result<u16, TimestampError> {
    if meridiem.eq_ignore_ascii_case("PM") {
        Ok(if hour == 12 { hour } else { hour + 12 })
    } else if meridiem.eq_ignore_ascii_case("AM") {
        Ok(if hour == 12 { 0 } else { hour })
    } else {
        Err(TimestampError::InvalidMeridiem(meridiem.to_string()))
    }
}
