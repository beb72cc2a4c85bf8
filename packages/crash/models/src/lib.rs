#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crash record, dataset, and filter criteria types.
//!
//! This crate defines the value types shared across the crash map
//! toolchain. Source GeoJSON properties are resolved into [`CrashRecord`]s
//! once at load time; every filter invocation receives a fresh, immutable
//! [`FilterCriteria`].

use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};
use strum_macros::{AsRefStr, Display, EnumString};

/// Number of minutes in a day. Valid time-of-day values are `0..MINUTES_PER_DAY`.
pub const MINUTES_PER_DAY: u16 = 1440;

/// Half-width of the time-of-day match window, in minutes.
pub const TIME_WINDOW_MINUTES: u16 = 60;

/// Which published crash dataset a record belongs to.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DatasetKind {
    /// Every reported traffic incident.
    #[default]
    AllIncidents,
    /// Only incidents with at least one injury or fatality.
    InjuryFatality,
}

impl DatasetKind {
    /// Returns a human-readable label for this dataset.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::AllIncidents => "All incidents",
            Self::InjuryFatality => "Injury & fatality incidents",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::AllIncidents, Self::InjuryFatality]
    }
}

/// A semantic crash attribute whose source column name varies between
/// dataset revisions.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SemanticField {
    /// `M/D/YYYY h:mm:ss AM|PM` wall-clock timestamp.
    Timestamp,
    /// Number of motor vehicles involved.
    VehicleCount,
    /// Number of injuries.
    InjuryCount,
    /// Number of fatalities.
    FatalityCount,
    /// Weather description.
    Weather,
    /// Hit-and-run flag (usually `Y`/`N`).
    HitAndRun,
    /// Lighting condition.
    Illumination,
}

impl SemanticField {
    /// Returns `true` for fields resolved as non-negative counts.
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::VehicleCount | Self::InjuryCount | Self::FatalityCount
        )
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Timestamp,
            Self::VehicleCount,
            Self::InjuryCount,
            Self::FatalityCount,
            Self::Weather,
            Self::HitAndRun,
            Self::Illumination,
        ]
    }
}

/// A traffic crash resolved from one GeoJSON feature.
///
/// Text fields that were absent in the source are empty strings and counts
/// are zero; only the timestamp keeps its absence, since a record without
/// one never passes a filter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashRecord {
    /// Raw `M/D/YYYY h:mm:ss AM|PM` text, if the source had one.
    pub timestamp: Option<String>,
    /// Vehicles involved.
    pub vehicle_count: u32,
    /// Injuries reported.
    pub injury_count: u32,
    /// Fatalities reported.
    pub fatality_count: u32,
    /// Weather description.
    pub weather: String,
    /// Hit-and-run flag.
    pub hit_and_run: String,
    /// Lighting condition.
    pub illumination: String,
    /// `[longitude, latitude]` of the feature's point geometry.
    pub location: Option<[f64; 2]>,
}

impl CrashRecord {
    /// Returns the timestamp text. Blank text counts as missing.
    #[must_use]
    pub fn timestamp_text(&self) -> Option<&str> {
        self.timestamp.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// A single filter selector: either the `"all"` wildcard or one concrete
/// value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Selector<T> {
    /// No constraint.
    #[default]
    All,
    /// Only records matching this value.
    Only(T),
}

impl<T> Selector<T> {
    /// Returns `true` if this selector is the wildcard.
    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Evaluates `predicate` against the concrete value. The wildcard
    /// always matches.
    pub fn matches_with(&self, predicate: impl FnOnce(&T) -> bool) -> bool {
        match self {
            Self::All => true,
            Self::Only(value) => predicate(value),
        }
    }
}

impl<T: FromStr> Selector<T> {
    /// Parses the wire form of a selector. `"all"` (any case, surrounding
    /// whitespace ignored) and blank input map to [`Selector::All`]. Any
    /// other value is parsed verbatim, so text selectors keep their
    /// whitespace.
    ///
    /// # Errors
    ///
    /// Returns the value type's parse error for anything else that fails
    /// to parse.
    pub fn parse(s: &str) -> Result<Self, T::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse().map(Self::Only)
    }
}

impl<T: fmt::Display> fmt::Display for Selector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(value) => value.fmt(f),
        }
    }
}

impl<T: fmt::Display> Serialize for Selector<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The complete set of user-selected filter values.
///
/// Built fresh for every interaction and passed by reference into the
/// filter; never shared as mutable state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Calendar year of the crash.
    pub year: Selector<i32>,
    /// Minutes since midnight (`0..1440`). `None` means no constraint.
    pub time_of_day: Option<u16>,
    /// Weather description, compared case-insensitively.
    pub weather: Selector<String>,
    /// Hit-and-run flag, compared case-insensitively.
    pub hit_and_run: Selector<String>,
    /// Lighting condition, compared case-insensitively after trimming.
    pub illumination: Selector<String>,
}

impl FilterCriteria {
    /// Returns criteria with the given year selector.
    #[must_use]
    pub fn with_year(mut self, year: Selector<i32>) -> Self {
        self.year = year;
        self
    }

    /// Returns criteria with the given time-of-day constraint.
    #[must_use]
    pub fn with_time_of_day(mut self, minutes: Option<u16>) -> Self {
        self.time_of_day = minutes;
        self
    }

    /// Returns criteria with the given weather selector.
    #[must_use]
    pub fn with_weather(mut self, weather: Selector<String>) -> Self {
        self.weather = weather;
        self
    }

    /// Returns criteria with the given hit-and-run selector.
    #[must_use]
    pub fn with_hit_and_run(mut self, hit_and_run: Selector<String>) -> Self {
        self.hit_and_run = hit_and_run;
        self
    }

    /// Returns criteria with the given illumination selector.
    #[must_use]
    pub fn with_illumination(mut self, illumination: Selector<String>) -> Self {
        self.illumination = illumination;
        self
    }

    /// Returns `true` when no selector constrains the result.
    #[must_use]
    pub const fn is_unconstrained(&self) -> bool {
        self.year.is_all()
            && self.time_of_day.is_none()
            && self.weather.is_all()
            && self.hit_and_run.is_all()
            && self.illumination.is_all()
    }
}

/// Totals over a collection of crashes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashSummary {
    /// Number of crashes.
    pub total: u64,
    /// Sum of injury counts.
    pub injuries: u64,
    /// Sum of fatality counts.
    pub fatalities: u64,
}

impl CrashSummary {
    /// Summary of a single crash.
    #[must_use]
    pub fn from_record(record: &CrashRecord) -> Self {
        Self {
            total: 1,
            injuries: u64::from(record.injury_count),
            fatalities: u64::from(record.fatality_count),
        }
    }
}

impl Add for CrashSummary {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            total: self.total + rhs.total,
            injuries: self.injuries + rhs.injuries,
            fatalities: self.fatalities + rhs.fatalities,
        }
    }
}

impl AddAssign for CrashSummary {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}
