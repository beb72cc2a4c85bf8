//! Declarative schema mapping from semantic crash fields to source
//! property names.
//!
//! The Nashville exports have renamed columns between revisions
//! (`Weather` vs `Weather Description`, `Hit and Run` vs
//! `Hit and Run Flag`, ...). Rather than hard-coding fallback chains at
//! every call site, a [`FieldSchema`] lists the candidate names for each
//! [`SemanticField`] once. Records are resolved through it a single time at
//! load, and a [`ResolutionReport`] records which candidates actually
//! matched so that a renamed column shows up in the logs instead of quietly
//! defaulting to zero or an empty string.

use std::collections::BTreeMap;

use crash_map_crash_models::{CrashRecord, SemanticField};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A `GeoJSON` feature's `properties` object.
pub type Properties = Map<String, Value>;

/// Ordered candidate property names for each semantic field.
///
/// Deserializes from a table keyed by the snake_case field name:
///
/// ```toml
/// [fields]
/// weather = ["Weather Description", "Weather"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<String, Vec<String>>")]
pub struct FieldSchema {
    fields: BTreeMap<SemanticField, Vec<String>>,
}

impl TryFrom<BTreeMap<String, Vec<String>>> for FieldSchema {
    type Error = String;

    fn try_from(table: BTreeMap<String, Vec<String>>) -> Result<Self, Self::Error> {
        let fields = table
            .into_iter()
            .map(|(key, names)| {
                key.parse::<SemanticField>()
                    .map(|field| (field, names))
                    .map_err(|_| format!("unknown semantic field '{key}'"))
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { fields })
    }
}

impl FieldSchema {
    /// The built-in schema covering every column spelling seen across
    /// revisions of the Nashville traffic accident export.
    #[must_use]
    pub fn nashville() -> Self {
        let table: &[(SemanticField, &[&str])] = &[
            (SemanticField::Timestamp, &["Date and Time"]),
            (SemanticField::VehicleCount, &["Number of Motor Vehicles"]),
            (SemanticField::InjuryCount, &["Number of Injuries"]),
            (SemanticField::FatalityCount, &["Number of Fatalities"]),
            (SemanticField::Weather, &["Weather Description", "Weather"]),
            (SemanticField::HitAndRun, &["Hit and Run", "Hit and Run Flag"]),
            (
                SemanticField::Illumination,
                &[
                    "Illumination Description",
                    "Illumination",
                    "IlluminationDescription",
                ],
            ),
        ];

        Self {
            fields: table
                .iter()
                .map(|(field, names)| {
                    (*field, names.iter().map(|n| (*n).to_string()).collect())
                })
                .collect(),
        }
    }

    /// Creates a schema from an explicit table.
    #[must_use]
    pub const fn new(fields: BTreeMap<SemanticField, Vec<String>>) -> Self {
        Self { fields }
    }

    /// Fills every semantic field this schema does not mention (or mentions
    /// with an empty list) from [`Self::nashville`].
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        for (field, names) in Self::nashville().fields {
            let entry = self.fields.entry(field).or_default();
            if entry.is_empty() {
                *entry = names;
            }
        }
        self
    }

    /// Returns the candidate names for `field`, in resolution order.
    #[must_use]
    pub fn candidates(&self, field: SemanticField) -> &[String] {
        self.fields.get(&field).map_or(&[][..], Vec::as_slice)
    }

    /// Resolves `field` against `properties`, returning the matching
    /// candidate name and its value.
    ///
    /// A candidate counts as present when the key exists and its value is
    /// not `null`.
    #[must_use]
    pub fn resolve<'a>(
        &'a self,
        properties: &'a Properties,
        field: SemanticField,
    ) -> Option<(&'a str, &'a Value)> {
        self.candidates(field).iter().find_map(|name| {
            properties
                .get(name)
                .filter(|v| !v.is_null())
                .map(|v| (name.as_str(), v))
        })
    }

    /// Resolves every semantic field of one feature into a [`CrashRecord`],
    /// noting each lookup in `report`.
    pub fn resolve_record(
        &self,
        properties: Option<&Properties>,
        location: Option<[f64; 2]>,
        report: &mut ResolutionReport,
    ) -> CrashRecord {
        report.records += 1;

        let empty = Properties::new();
        let properties = properties.unwrap_or(&empty);

        let mut lookup = |field: SemanticField| {
            let resolved = self.resolve(properties, field);
            report.note(field, resolved.map(|(name, _)| name));
            resolved.map(|(_, value)| value)
        };

        let timestamp = lookup(SemanticField::Timestamp)
            .map(value_to_text)
            .filter(|t| !t.trim().is_empty());
        let vehicle_count = lookup(SemanticField::VehicleCount).map_or(0, value_to_count);
        let injury_count = lookup(SemanticField::InjuryCount).map_or(0, value_to_count);
        let fatality_count = lookup(SemanticField::FatalityCount).map_or(0, value_to_count);
        let weather = lookup(SemanticField::Weather)
            .map(value_to_text)
            .unwrap_or_default();
        let hit_and_run = lookup(SemanticField::HitAndRun)
            .map(value_to_text)
            .unwrap_or_default();
        let illumination = lookup(SemanticField::Illumination)
            .map(value_to_text)
            .unwrap_or_default();

        CrashRecord {
            timestamp,
            vehicle_count,
            injury_count,
            fatality_count,
            weather,
            hit_and_run,
            illumination,
            location,
        }
    }
}

/// Renders a property value as text. Strings are taken verbatim; other
/// scalars use their JSON representation.
fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Reads a property value as a non-negative count. Numeric strings are
/// accepted; anything else unparseable is treated as zero.
fn value_to_count(value: &Value) -> u32 {
    let count = match value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .or_else(|| n.as_f64().and_then(integral_count)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u32>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral_count))
        }
        _ => None,
    };

    count.unwrap_or_else(|| {
        log::trace!("Unparseable count {value}, treating as 0");
        0
    })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn integral_count(v: f64) -> Option<u32> {
    (v.is_finite() && v >= 0.0 && v.fract() == 0.0 && v <= f64::from(u32::MAX))
        .then_some(v as u32)
}

/// Tally of which candidate names resolved each semantic field across a
/// dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionReport {
    /// Number of records resolved.
    pub records: u64,
    /// Per field, how many records matched through each candidate name.
    pub matched: BTreeMap<SemanticField, BTreeMap<String, u64>>,
    /// Per field, how many records had none of the candidates.
    pub missing: BTreeMap<SemanticField, u64>,
}

impl ResolutionReport {
    /// Records the outcome of one field lookup.
    pub fn note(&mut self, field: SemanticField, candidate: Option<&str>) {
        match candidate {
            Some(name) => {
                *self
                    .matched
                    .entry(field)
                    .or_default()
                    .entry(name.to_string())
                    .or_default() += 1;
            }
            None => *self.missing.entry(field).or_default() += 1,
        }
    }

    /// Number of records for which `field` resolved through any candidate.
    #[must_use]
    pub fn matched_count(&self, field: SemanticField) -> u64 {
        self.matched
            .get(&field)
            .map_or(0, |by_name| by_name.values().sum())
    }

    /// Number of records for which `field` did not resolve.
    #[must_use]
    pub fn missing_count(&self, field: SemanticField) -> u64 {
        self.missing.get(&field).copied().unwrap_or(0)
    }

    /// Fields that never resolved for any record of a non-empty dataset.
    #[must_use]
    pub fn unresolved_fields(&self) -> Vec<SemanticField> {
        if self.records == 0 {
            return Vec::new();
        }
        SemanticField::all()
            .iter()
            .copied()
            .filter(|f| self.matched_count(*f) == 0)
            .collect()
    }

    /// Logs which candidates matched for each field.
    pub fn log(&self, label: &str) {
        log::info!("{label}: resolved {} records", self.records);
        for field in SemanticField::all() {
            if let Some(by_name) = self.matched.get(field) {
                let names: Vec<String> = by_name
                    .iter()
                    .map(|(name, count)| format!("'{name}' x{count}"))
                    .collect();
                log::debug!("{label}: {field} <- {}", names.join(", "));
            }
            let missing = self.missing_count(*field);
            if missing > 0 {
                log::debug!("{label}: {field} missing in {missing} records");
            }
        }
        for field in self.unresolved_fields() {
            log::warn!("{label}: no candidate name matched field '{field}' in any record");
        }
    }
}
