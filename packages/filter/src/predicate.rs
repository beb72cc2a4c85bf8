//! The per-record filter predicate.

use crash_map_crash_models::{CrashRecord, FilterCriteria, Selector, TIME_WINDOW_MINUTES};

use crate::time::{TimestampError, extract_year, minutes_since_midnight};

/// A single selector of [`FilterCriteria`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    /// Calendar year.
    Year,
    /// Time-of-day window.
    TimeOfDay,
    /// Weather description.
    Weather,
    /// Hit-and-run flag.
    HitAndRun,
    /// Lighting condition.
    Illumination,
}

/// Why a record was left out of a filtered view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exclusion {
    /// The record has no timestamp, which excludes it from every view.
    MissingTimestamp,
    /// A timestamp-based criterion could not be evaluated.
    Unparseable(Criterion, TimestampError),
    /// The record's value does not satisfy the criterion.
    Rejected(Criterion),
}

/// Outcome of evaluating one record against one set of criteria.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Every criterion holds.
    Match,
    /// At least one criterion failed.
    Excluded(Exclusion),
}

/// Case-insensitive exact comparison.
fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

/// Evaluates `record` against every criterion.
///
/// A missing or blank timestamp excludes the record before any criterion is
/// looked at. Timestamp parsing only happens for criteria that need it, so
/// an unparseable timestamp still passes when year and time of day are
/// unconstrained.
#[must_use]
pub fn evaluate(record: &CrashRecord, criteria: &FilterCriteria) -> Evaluation {
    let Some(timestamp) = record.timestamp_text() else {
        return Evaluation::Excluded(Exclusion::MissingTimestamp);
    };

    if let Selector::Only(year) = criteria.year {
        match extract_year(timestamp) {
            Ok(y) if y == year => {}
            Ok(_) => return Evaluation::Excluded(Exclusion::Rejected(Criterion::Year)),
            Err(e) => {
                return Evaluation::Excluded(Exclusion::Unparseable(Criterion::Year, e));
            }
        }
    }

    if let Some(target) = criteria.time_of_day {
        match minutes_since_midnight(timestamp) {
            Ok(minutes) if minutes.abs_diff(target) <= TIME_WINDOW_MINUTES => {}
            Ok(_) => return Evaluation::Excluded(Exclusion::Rejected(Criterion::TimeOfDay)),
            Err(e) => {
                return Evaluation::Excluded(Exclusion::Unparseable(Criterion::TimeOfDay, e));
            }
        }
    }

    if !criteria
        .weather
        .matches_with(|w| eq_ignore_case(&record.weather, w))
    {
        return Evaluation::Excluded(Exclusion::Rejected(Criterion::Weather));
    }

    if !criteria
        .hit_and_run
        .matches_with(|h| eq_ignore_case(&record.hit_and_run, h))
    {
        return Evaluation::Excluded(Exclusion::Rejected(Criterion::HitAndRun));
    }

    if !criteria
        .illumination
        .matches_with(|i| eq_ignore_case(record.illumination.trim(), i.trim()))
    {
        return Evaluation::Excluded(Exclusion::Rejected(Criterion::Illumination));
    }

    Evaluation::Match
}

/// Returns `true` if `record` satisfies every criterion.
#[must_use]
pub fn matches(record: &CrashRecord, criteria: &FilterCriteria) -> bool {
    match evaluate(record, criteria) {
        Evaluation::Match => true,
        Evaluation::Excluded(Exclusion::Unparseable(criterion, e)) => {
            log::trace!("Excluding crash with unusable timestamp for {criterion:?}: {e}");
            false
        }
        Evaluation::Excluded(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crash(timestamp: &str) -> CrashRecord {
        CrashRecord {
            timestamp: Some(timestamp.to_string()),
            weather: "CLEAR".to_string(),
            hit_and_run: "N".to_string(),
            illumination: "DAYLIGHT".to_string(),
            ..CrashRecord::default()
        }
    }

    #[test]
    fn unconstrained_criteria_match_any_timestamped_record() {
        let criteria = FilterCriteria::default();
        assert!(matches(&crash("1/1/2021 2:00:00 PM"), &criteria));
        // Not parsed when nothing needs it.
        assert!(matches(&crash("garbage"), &criteria));
    }

    #[test]
    fn missing_timestamp_is_always_excluded() {
        let record = CrashRecord {
            weather: "CLEAR".to_string(),
            ..CrashRecord::default()
        };
        assert_eq!(
            evaluate(&record, &FilterCriteria::default()),
            Evaluation::Excluded(Exclusion::MissingTimestamp)
        );
        let criteria =
            FilterCriteria::default().with_weather(Selector::Only("CLEAR".to_string()));
        assert!(!matches(&record, &criteria));

        for blank in ["", "   "] {
            assert_eq!(
                evaluate(&crash(blank), &FilterCriteria::default()),
                Evaluation::Excluded(Exclusion::MissingTimestamp)
            );
        }
    }

    #[test]
    fn year_must_match() {
        let record = crash("3/4/2019 1:00:00 PM");
        assert!(matches(
            &record,
            &FilterCriteria::default().with_year(Selector::Only(2019))
        ));
        assert_eq!(
            evaluate(&record, &FilterCriteria::default().with_year(Selector::Only(2020))),
            Evaluation::Excluded(Exclusion::Rejected(Criterion::Year))
        );
    }

    #[test]
    fn time_window_is_inclusive_sixty_minutes() {
        let record = crash("1/1/2021 2:00:00 PM");
        let at = |minutes| FilterCriteria::default().with_time_of_day(Some(minutes));

        assert!(matches(&record, &at(900)));
        assert!(matches(&record, &at(780)));
        assert!(matches(&record, &at(840)));
        assert!(!matches(&record, &at(901)));
        assert!(!matches(&record, &at(779)));
    }

    #[test]
    fn time_window_does_not_wrap_midnight() {
        let record = crash("1/1/2021 11:30:00 PM");
        assert!(!matches(
            &record,
            &FilterCriteria::default().with_time_of_day(Some(15))
        ));
    }

    #[test]
    fn unparseable_timestamp_fails_time_criterion() {
        let record = crash("1/1/2021 2:00:00");
        assert_eq!(
            evaluate(&record, &FilterCriteria::default().with_time_of_day(Some(840))),
            Evaluation::Excluded(Exclusion::Unparseable(
                Criterion::TimeOfDay,
                TimestampError::TokenCount(2)
            ))
        );
    }

    #[test]
    fn text_criteria_are_case_insensitive() {
        let mut record = crash("1/1/2021 2:00:00 PM");
        record.weather = "clear".to_string();
        record.hit_and_run = "y".to_string();

        let criteria = FilterCriteria::default()
            .with_weather(Selector::Only("CLEAR".to_string()))
            .with_hit_and_run(Selector::Only("Y".to_string()));
        assert!(matches(&record, &criteria));

        let criteria = FilterCriteria::default().with_weather(Selector::Only("CLEAR ".to_string()));
        assert!(!matches(&record, &criteria), "weather is not trimmed");

        record.weather = "RAIN ".to_string();
        let criteria = FilterCriteria::default().with_weather(Selector::Only("rain ".to_string()));
        assert!(matches(&record, &criteria));
    }

    #[test]
    fn illumination_is_trimmed() {
        let mut record = crash("1/1/2021 2:00:00 PM");
        record.illumination = "  Dark - Lighted ".to_string();

        let criteria =
            FilterCriteria::default().with_illumination(Selector::Only("DARK - LIGHTED".to_string()));
        assert!(matches(&record, &criteria));

        let criteria = FilterCriteria::default().with_illumination(Selector::Only("DARK".to_string()));
        assert_eq!(
            evaluate(&record, &criteria),
            Evaluation::Excluded(Exclusion::Rejected(Criterion::Illumination))
        );
    }

    #[test]
    fn all_criteria_must_hold() {
        let record = crash("3/4/2019 1:00:00 PM");
        let criteria = FilterCriteria::default()
            .with_year(Selector::Only(2019))
            .with_time_of_day(Some(780))
            .with_weather(Selector::Only("clear".to_string()))
            .with_hit_and_run(Selector::Only("N".to_string()))
            .with_illumination(Selector::Only("daylight".to_string()));
        assert!(matches(&record, &criteria));

        let criteria = criteria.with_hit_and_run(Selector::Only("Y".to_string()));
        assert!(!matches(&record, &criteria));
    }
}
