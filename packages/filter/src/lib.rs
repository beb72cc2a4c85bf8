#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crash record filtering.
//!
//! Given resolved [`CrashRecord`]s and a [`FilterCriteria`], produces the
//! subset of records that satisfy every selector. Filtering is a full
//! linear scan per call; nothing is cached between calls.

pub mod criteria;
pub mod options;
pub mod predicate;
pub mod story;
pub mod summary;
pub mod time;

use crash_map_crash_models::{CrashRecord, FilterCriteria};
use crash_map_source::loader::Dataset;
use geojson::FeatureCollection;

pub use predicate::{evaluate, matches};

/// Returns the records that satisfy `criteria`, in input order.
#[must_use]
pub fn filter_records<'a>(
    records: &'a [CrashRecord],
    criteria: &FilterCriteria,
) -> Vec<&'a CrashRecord> {
    records.iter().filter(|r| matches(r, criteria)).collect()
}

/// Returns a copy of the dataset's collection containing only the features
/// whose records satisfy `criteria`.
///
/// Passing features are emitted unmodified and in their original order;
/// the collection's `bbox` and foreign members are kept.
#[must_use]
pub fn filter_dataset(dataset: &Dataset, criteria: &FilterCriteria) -> FeatureCollection {
    let source = dataset.collection();
    let features: Vec<_> = dataset
        .crashes()
        .filter(|(_, record)| matches(record, criteria))
        .map(|(feature, _)| feature.clone())
        .collect();

    log::debug!(
        "{}: {} of {} crashes match {criteria:?}",
        dataset.name(),
        features.len(),
        dataset.len()
    );

    FeatureCollection {
        bbox: source.bbox.clone(),
        features,
        foreign_members: source.foreign_members.clone(),
    }
}

/// Returns the records of `dataset` that satisfy `criteria`.
#[must_use]
pub fn filter_dataset_records<'a>(
    dataset: &'a Dataset,
    criteria: &FilterCriteria,
) -> Vec<&'a CrashRecord> {
    filter_records(dataset.records(), criteria)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crash_map_crash_models::{DatasetKind, Selector};
    use crash_map_source::schema::FieldSchema;
    use serde_json::json;

    fn collection() -> FeatureCollection {
        serde_json::from_value(json!({
            "type": "FeatureCollection",
            "bbox": [-87.0, 36.0, -86.5, 36.4],
            "features": [
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [-86.78, 36.16] },
                    "properties": {
                        "Date and Time": "1/1/2021 2:00:00 PM",
                        "Weather": "CLEAR",
                        "Number of Injuries": 1
                    }
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [-86.70, 36.10] },
                    "properties": {
                        "Date and Time": "5/9/2020 8:30:00 AM",
                        "Weather Description": "clear"
                    }
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [-86.75, 36.20] },
                    "properties": {
                        "Weather": "CLEAR"
                    }
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [-86.80, 36.12] },
                    "properties": {
                        "Date and Time": "7/4/2021 9:45:00 PM",
                        "Weather Description": "RAIN"
                    }
                }
            ]
        }))
        .unwrap()
    }

    fn dataset() -> Dataset {
        Dataset::from_collection(
            DatasetKind::AllIncidents,
            "test",
            collection(),
            &FieldSchema::nashville(),
        )
    }

    #[test]
    fn unconstrained_filter_keeps_every_timestamped_feature() {
        let dataset = dataset();
        let filtered = filter_dataset(&dataset, &FilterCriteria::default());

        let source = dataset.collection();
        let expected = vec![
            source.features[0].clone(),
            source.features[1].clone(),
            source.features[3].clone(),
        ];
        assert_eq!(filtered.features, expected);
        assert_eq!(filtered.bbox, source.bbox);
    }

    #[test]
    fn weather_matches_across_column_names() {
        let dataset = dataset();
        let criteria = FilterCriteria::default().with_weather(Selector::Only("CLEAR".to_string()));
        let matched = filter_dataset_records(&dataset, &criteria);
        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0].weather, "CLEAR");
        assert_eq!(matched[1].weather, "clear");
    }

    #[test]
    fn filter_preserves_order() {
        let dataset = dataset();
        let criteria = FilterCriteria::default().with_year(Selector::Only(2021));
        let filtered = filter_dataset(&dataset, &criteria);
        assert_eq!(filtered.features.len(), 2);
        assert_eq!(filtered.features[0], dataset.collection().features[0]);
        assert_eq!(filtered.features[1], dataset.collection().features[3]);
    }

    #[test]
    fn blank_timestamps_are_filtered_out() {
        let records = vec![
            CrashRecord {
                timestamp: Some(String::new()),
                ..CrashRecord::default()
            },
            CrashRecord {
                timestamp: Some("1/1/2021 1:00:00 AM".to_string()),
                ..CrashRecord::default()
            },
        ];
        let matched = filter_records(&records, &FilterCriteria::default());
        assert_eq!(matched, vec![&records[1]]);
    }

    #[test]
    fn filter_records_on_empty_input() {
        let records: Vec<CrashRecord> = Vec::new();
        assert!(filter_records(&records, &FilterCriteria::default()).is_empty());
    }
}
