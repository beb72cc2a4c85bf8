//! Distinct values used to populate the filter dropdowns.

use std::collections::{BTreeSet, HashSet};

use crash_map_crash_models::CrashRecord;
use serde::Serialize;

use crate::time::extract_year;

/// The selectable values for each dropdown, in display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOptions {
    /// Years present in the data, ascending.
    pub years: Vec<i32>,
    /// Distinct weather descriptions.
    pub weather: Vec<String>,
    /// Distinct hit-and-run flags.
    pub hit_and_run: Vec<String>,
    /// Distinct lighting conditions.
    pub illumination: Vec<String>,
}

impl FilterOptions {
    /// Collects the distinct values of every filterable field.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a CrashRecord>) -> Self {
        let mut years = BTreeSet::new();
        let mut weather = Distinct::verbatim();
        let mut hit_and_run = Distinct::verbatim();
        let mut illumination = Distinct::trimmed();

        for record in records {
            if let Ok(year) = extract_year(record.timestamp.as_deref()) {
                years.insert(year);
            }
            weather.push(&record.weather);
            hit_and_run.push(&record.hit_and_run);
            illumination.push(&record.illumination);
        }

        Self {
            years: years.into_iter().collect(),
            weather: weather.into_sorted(),
            hit_and_run: hit_and_run.into_sorted(),
            illumination: illumination.into_sorted(),
        }
    }
}

/// Case-insensitive distinct set that keeps the first spelling seen.
///
/// Values are kept in the form the predicate compares them in: only
/// illumination is trimmed there, so only illumination is trimmed here.
/// Blank values are never offered.
struct Distinct {
    trim: bool,
    seen: HashSet<String>,
    values: Vec<String>,
}

impl Distinct {
    fn verbatim() -> Self {
        Self {
            trim: false,
            seen: HashSet::new(),
            values: Vec::new(),
        }
    }

    fn trimmed() -> Self {
        Self {
            trim: true,
            ..Self::verbatim()
        }
    }

    fn push(&mut self, value: &str) {
        if value.trim().is_empty() {
            return;
        }
        let value = if self.trim { value.trim() } else { value };
        if self.seen.insert(value.to_lowercase()) {
            self.values.push(value.to_string());
        }
    }

    fn into_sorted(mut self) -> Vec<String> {
        self.values.sort_by_cached_key(|v| v.to_lowercase());
        self.values
    }
}

#[cfg(test)]
mod tests {
    use crash_map_crash_models::{FilterCriteria, Selector};

    use super::*;
    use crate::predicate::matches;

    fn crash(timestamp: &str, weather: &str, illumination: &str) -> CrashRecord {
        CrashRecord {
            timestamp: Some(timestamp.to_string()),
            weather: weather.to_string(),
            hit_and_run: "N".to_string(),
            illumination: illumination.to_string(),
            ..CrashRecord::default()
        }
    }

    #[test]
    fn collects_distinct_sorted_values() {
        let records = vec![
            crash("1/1/2021 1:00:00 AM", "RAIN", "DARK - LIGHTED"),
            crash("1/1/2019 1:00:00 AM", "CLEAR", " DAYLIGHT "),
            crash("1/1/2021 1:00:00 AM", "clear", "DAYLIGHT"),
            crash("bad", "", ""),
        ];
        let options = FilterOptions::from_records(&records);

        assert_eq!(options.years, vec![2019, 2021]);
        assert_eq!(options.weather, vec!["CLEAR", "RAIN"]);
        assert_eq!(options.hit_and_run, vec!["N"]);
        assert_eq!(options.illumination, vec!["DARK - LIGHTED", "DAYLIGHT"]);
    }

    #[test]
    fn every_offered_option_matches_a_record() {
        let mut padded = crash("2/2/2022 3:00:00 PM", "RAIN ", " DARK - NOT LIGHTED");
        padded.hit_and_run = "N ".to_string();
        let records = vec![
            padded,
            crash("1/1/2021 1:00:00 AM", "CLEAR", "DAYLIGHT"),
            crash("1/1/2021 1:00:00 AM", "   ", "  "),
        ];
        let options = FilterOptions::from_records(&records);

        assert_eq!(options.weather, vec!["CLEAR", "RAIN "]);
        assert_eq!(options.hit_and_run, vec!["N", "N "]);
        assert_eq!(options.illumination, vec!["DARK - NOT LIGHTED", "DAYLIGHT"]);

        let matching = |criteria: &FilterCriteria| {
            records.iter().filter(|r| matches(r, criteria)).count()
        };
        for year in &options.years {
            let criteria = FilterCriteria::default().with_year(Selector::Only(*year));
            assert!(matching(&criteria) > 0, "year {year}");
        }
        for value in &options.weather {
            let criteria = FilterCriteria::default().with_weather(Selector::Only(value.clone()));
            assert!(matching(&criteria) > 0, "weather {value:?}");
        }
        for value in &options.hit_and_run {
            let criteria =
                FilterCriteria::default().with_hit_and_run(Selector::Only(value.clone()));
            assert!(matching(&criteria) > 0, "hit and run {value:?}");
        }
        for value in &options.illumination {
            let criteria =
                FilterCriteria::default().with_illumination(Selector::Only(value.clone()));
            assert!(matching(&criteria) > 0, "illumination {value:?}");
        }
    }

    #[test]
    fn empty_records_give_empty_options() {
        let records: Vec<CrashRecord> = Vec::new();
        assert_eq!(FilterOptions::from_records(&records), FilterOptions::default());
    }
}
