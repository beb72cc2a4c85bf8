//! Parsing filter criteria from their wire form.
//!
//! Query strings and CLI flags carry every selector as text: `"all"` for
//! the wildcard and `-1` for "any time of day".

use crash_map_crash_models::{FilterCriteria, MINUTES_PER_DAY, Selector};
use serde::Deserialize;

use crate::time::parse_time_of_day;

/// Wire value of the time-of-day control meaning "no constraint".
pub const ANY_TIME: &str = "-1";

/// Errors from parsing wire-form criteria.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CriteriaError {
    /// The year is neither `all` nor an integer.
    #[error("invalid year '{0}': expected an integer or 'all'")]
    InvalidYear(String),

    /// The time of day is neither minutes, `-1`, nor a clock label.
    #[error("invalid time '{0}': expected minutes since midnight, -1, or 'H:MM AM|PM'")]
    InvalidTime(String),

    /// Minutes since midnight outside `0..1440`.
    #[error("time {0} is out of range 0..1440")]
    TimeOutOfRange(i64),
}

/// Criteria as received over the wire. Absent fields are wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCriteria {
    /// Integer year or `all`.
    pub year: Option<String>,
    /// Minutes since midnight, `-1`, or `H:MM AM|PM`.
    pub time: Option<String>,
    /// Weather description or `all`.
    pub weather: Option<String>,
    /// Hit-and-run flag or `all`.
    pub hit_and_run: Option<String>,
    /// Lighting condition or `all`.
    pub illumination: Option<String>,
}

impl RawCriteria {
    /// Converts the wire form into typed [`FilterCriteria`].
    ///
    /// # Errors
    ///
    /// Returns [`CriteriaError`] if the year or time of day does not parse.
    pub fn parse(&self) -> Result<FilterCriteria, CriteriaError> {
        let year = match self.year.as_deref() {
            None => Selector::All,
            Some(year) => Selector::<i32>::parse(year.trim())
                .map_err(|_| CriteriaError::InvalidYear(year.to_string()))?,
        };

        let time_of_day = self.time.as_deref().map(parse_time).transpose()?.flatten();

        Ok(FilterCriteria::default()
            .with_year(year)
            .with_time_of_day(time_of_day)
            .with_weather(text_selector(self.weather.as_deref()))
            .with_hit_and_run(text_selector(self.hit_and_run.as_deref()))
            .with_illumination(text_selector(self.illumination.as_deref())))
    }
}

/// Parses a time-of-day control value. `None` means unconstrained.
///
/// # Errors
///
/// Returns [`CriteriaError`] for values that are not minutes since
/// midnight, `-1`, `all`, or a clock label.
pub fn parse_time(text: &str) -> Result<Option<u16>, CriteriaError> {
    let text = text.trim();
    if text.is_empty() || text == ANY_TIME || text.eq_ignore_ascii_case("all") {
        return Ok(None);
    }

    if let Ok(minutes) = text.parse::<i64>() {
        return u16::try_from(minutes)
            .ok()
            .filter(|m| *m < MINUTES_PER_DAY)
            .map(Some)
            .ok_or(CriteriaError::TimeOutOfRange(minutes));
    }

    parse_time_of_day(text)
        .map(Some)
        .map_err(|_| CriteriaError::InvalidTime(text.to_string()))
}

fn text_selector(value: Option<&str>) -> Selector<String> {
    let Some(value) = value else {
        return Selector::All;
    };
    let Ok(selector) = Selector::<String>::parse(value);
    selector
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_are_wildcards() {
        let criteria = RawCriteria::default().parse().unwrap();
        assert!(criteria.is_unconstrained());
    }

    #[test]
    fn parses_every_selector() {
        let raw = RawCriteria {
            year: Some("2021".to_string()),
            time: Some("900".to_string()),
            weather: Some("RAIN".to_string()),
            hit_and_run: Some("all".to_string()),
            illumination: Some(" DAYLIGHT ".to_string()),
        };
        let criteria = raw.parse().unwrap();
        assert_eq!(criteria.year, Selector::Only(2021));
        assert_eq!(criteria.time_of_day, Some(900));
        assert_eq!(criteria.weather, Selector::Only("RAIN".to_string()));
        assert!(criteria.hit_and_run.is_all());
        assert_eq!(criteria.illumination, Selector::Only(" DAYLIGHT ".to_string()));
    }

    #[test]
    fn text_selectors_keep_their_spelling() {
        let raw = RawCriteria {
            year: Some(" 2020 ".to_string()),
            weather: Some(" CLEAR ".to_string()),
            hit_and_run: Some(" ALL ".to_string()),
            ..RawCriteria::default()
        };
        let criteria = raw.parse().unwrap();
        assert_eq!(criteria.year, Selector::Only(2020));
        assert_eq!(criteria.weather, Selector::Only(" CLEAR ".to_string()));
        assert!(criteria.hit_and_run.is_all());
    }

    #[test]
    fn any_time_sentinel_is_unconstrained() {
        assert_eq!(parse_time("-1"), Ok(None));
        assert_eq!(parse_time("ALL"), Ok(None));
        assert_eq!(parse_time(""), Ok(None));
    }

    #[test]
    fn time_accepts_minutes_and_clock_labels() {
        assert_eq!(parse_time("0"), Ok(Some(0)));
        assert_eq!(parse_time("1439"), Ok(Some(1439)));
        assert_eq!(parse_time("6:15 PM"), Ok(Some(1095)));
    }

    #[test]
    fn rejects_bad_time_and_year() {
        assert_eq!(parse_time("1440"), Err(CriteriaError::TimeOutOfRange(1440)));
        assert_eq!(parse_time("-5"), Err(CriteriaError::TimeOutOfRange(-5)));
        assert!(matches!(
            parse_time("teatime"),
            Err(CriteriaError::InvalidTime(_))
        ));

        let raw = RawCriteria {
            year: Some("last year".to_string()),
            ..RawCriteria::default()
        };
        assert_eq!(
            raw.parse(),
            Err(CriteriaError::InvalidYear("last year".to_string()))
        );
    }

    #[test]
    fn deserializes_camel_case_query() {
        let raw: RawCriteria = serde_json::from_value(serde_json::json!({
            "year": "2019",
            "hitAndRun": "Y",
        }))
        .unwrap();
        assert_eq!(raw.year.as_deref(), Some("2019"));
        assert_eq!(raw.hit_and_run.as_deref(), Some("Y"));
        assert!(raw.weather.is_none());
    }
}
