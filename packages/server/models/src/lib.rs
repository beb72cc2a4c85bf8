#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the crash map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the domain types to allow independent evolution of the API
//! contract.

use crash_map_crash_models::{CrashSummary, DatasetKind, FilterCriteria, Selector};
use crash_map_filter::criteria::RawCriteria;
use crash_map_filter::options::FilterOptions;
use crash_map_filter::story::StoryStep;
use crash_map_source::schema::ResolutionReport;
use geojson::FeatureCollection;
use serde::{Deserialize, Serialize};

/// Server health.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Always `true` once the server is answering.
    pub healthy: bool,
    /// Server crate version.
    pub version: String,
}

/// A loaded dataset as listed by `/api/datasets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDataset {
    /// Dataset kind, used as the `dataset` query parameter.
    pub kind: DatasetKind,
    /// Human-readable name.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// Number of features loaded.
    pub feature_count: usize,
    /// Features that carry a timestamp and can therefore pass a filter.
    pub records_with_timestamp: usize,
    /// Which source column resolved each field, and how often.
    pub resolution: ResolutionReport,
}

/// Query parameters selecting a dataset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetQueryParams {
    /// `all_incidents` (default) or `injury_fatality`.
    pub dataset: Option<String>,
}

/// Query parameters for the crash and summary endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashQueryParams {
    /// `all_incidents` (default) or `injury_fatality`.
    pub dataset: Option<String>,
    /// The five filter selectors in wire form.
    #[serde(flatten)]
    pub criteria: RawCriteria,
}

/// Filter totals for one dataset and criteria.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSummary {
    /// Dataset that was filtered.
    pub dataset: DatasetKind,
    /// The criteria as parsed.
    pub criteria: FilterCriteria,
    /// Totals of the matching crashes.
    pub summary: CrashSummary,
    /// Display label of the time-of-day selector, e.g. `"6:15 PM"`.
    pub time_label: Option<String>,
}

/// Totals for one calendar year.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiYearSummary {
    /// Calendar year.
    pub year: i32,
    /// Totals for the year.
    #[serde(flatten)]
    pub summary: CrashSummary,
}

/// Per-year totals for a dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiYearSummaries {
    /// Dataset that was summarized.
    pub dataset: DatasetKind,
    /// One entry per year, ascending.
    pub years: Vec<ApiYearSummary>,
}

/// Dropdown values for a dataset.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOptions {
    /// Dataset the values were collected from.
    pub dataset: DatasetKind,
    /// Distinct values per selector.
    #[serde(flatten)]
    pub options: FilterOptions,
}

/// One entry of the story table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStoryStep {
    /// Scroll-step index.
    pub step: usize,
    /// Section heading.
    pub title: &'static str,
    /// Year the step selects.
    pub year: Selector<i32>,
    /// Dataset the step shows.
    pub dataset: DatasetKind,
}

impl ApiStoryStep {
    /// Builds the API form of the step at `index`.
    #[must_use]
    pub fn new(index: usize, step: &StoryStep) -> Self {
        Self {
            step: index,
            title: step.title,
            year: step.year.clone(),
            dataset: step.dataset,
        }
    }
}

/// The crashes visible while a story step is active.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStoryView {
    /// The active step.
    pub step: ApiStoryStep,
    /// Criteria after the step's year was applied.
    pub criteria: FilterCriteria,
    /// Totals of the visible crashes.
    pub summary: CrashSummary,
    /// The visible crashes.
    pub crashes: FeatureCollection,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}

impl ApiError {
    /// Wraps any displayable error.
    #[must_use]
    pub fn new(error: impl std::fmt::Display) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}
