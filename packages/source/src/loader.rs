//! Fetching, parsing, and resolving crash datasets.
//!
//! Every configured dataset is loaded concurrently by [`load_datasets`],
//! which only returns once all of them have completed. There is no retry
//! and no cancellation: a failed load fails the whole call.

use std::path::Path;
use std::sync::Arc;

use crash_map_crash_models::{CrashRecord, DatasetKind};
use geojson::{Feature, FeatureCollection, GeoJson};

use crate::SourceError;
use crate::dataset_def::{DatasetDefinition, DatasetLocation};
use crate::progress::ProgressCallback;
use crate::schema::{FieldSchema, ResolutionReport};

/// A loaded dataset: the original features plus their resolved records.
///
/// `records[i]` is always the resolution of `collection.features[i]`.
/// Neither is mutated after construction.
#[derive(Debug, Clone)]
pub struct Dataset {
    kind: DatasetKind,
    name: String,
    collection: FeatureCollection,
    records: Vec<CrashRecord>,
    report: ResolutionReport,
}

impl Dataset {
    /// Resolves every feature of `collection` through `schema` and logs the
    /// resulting [`ResolutionReport`].
    #[must_use]
    pub fn from_collection(
        kind: DatasetKind,
        name: impl Into<String>,
        collection: FeatureCollection,
        schema: &FieldSchema,
    ) -> Self {
        let name = name.into();
        let mut report = ResolutionReport::default();
        let records = collection
            .features
            .iter()
            .map(|feature| {
                schema.resolve_record(feature.properties.as_ref(), point_location(feature), &mut report)
            })
            .collect();

        report.log(&name);

        Self {
            kind,
            name,
            collection,
            records,
            report,
        }
    }

    /// Which dataset this is.
    #[must_use]
    pub const fn kind(&self) -> DatasetKind {
        self.kind
    }

    /// Human-readable dataset name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The original collection, exactly as loaded.
    #[must_use]
    pub const fn collection(&self) -> &FeatureCollection {
        &self.collection
    }

    /// Resolved records, in feature order.
    #[must_use]
    pub fn records(&self) -> &[CrashRecord] {
        &self.records
    }

    /// Pairs of original feature and resolved record, in feature order.
    pub fn crashes(&self) -> impl Iterator<Item = (&Feature, &CrashRecord)> {
        self.collection.features.iter().zip(&self.records)
    }

    /// Which candidate names resolved each field at load time.
    #[must_use]
    pub const fn report(&self) -> &ResolutionReport {
        &self.report
    }

    /// Number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the dataset has no features.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Extracts `[longitude, latitude]` from a point geometry.
fn point_location(feature: &Feature) -> Option<[f64; 2]> {
    match &feature.geometry.as_ref()?.value {
        geojson::Value::Point(coords) => Some([*coords.first()?, *coords.get(1)?]),
        _ => None,
    }
}

/// Parses a `GeoJSON` document that must be a `FeatureCollection`.
///
/// # Errors
///
/// Returns [`SourceError::GeoJson`] if the text is not valid `GeoJSON`, or
/// [`SourceError::NotFeatureCollection`] if it is a bare geometry or
/// feature.
pub fn parse_feature_collection(
    text: &str,
    location: &DatasetLocation,
) -> Result<FeatureCollection, SourceError> {
    match text.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => Ok(collection),
        GeoJson::Feature(_) | GeoJson::Geometry(_) => Err(SourceError::NotFeatureCollection {
            location: location.to_string(),
        }),
    }
}

/// Reads the raw document text from `location`.
async fn read_location(
    client: &reqwest::Client,
    location: &DatasetLocation,
) -> Result<String, SourceError> {
    match location {
        DatasetLocation::Url(url) => {
            let response = client.get(url).send().await?.error_for_status()?;
            Ok(response.text().await?)
        }
        DatasetLocation::File(path) => Ok(tokio::fs::read_to_string(path).await?),
    }
}

/// Loads a single dataset from `location`.
///
/// # Errors
///
/// Returns [`SourceError`] if the document cannot be read or is not a
/// `GeoJSON` `FeatureCollection`.
pub async fn load_dataset(
    client: &reqwest::Client,
    def: &DatasetDefinition,
    location: &DatasetLocation,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Dataset, SourceError> {
    log::info!("Loading {} from {location}", def.name);
    progress.set_message(format!("Loading {}", def.name));

    let text = read_location(client, location).await?;
    log::debug!("{}: read {} bytes", def.name, text.len());

    let collection = parse_feature_collection(&text, location)?;
    let dataset = Dataset::from_collection(def.kind, def.name.clone(), collection, def.schema());
    log::info!("Loaded {} features for {}", dataset.len(), def.name);

    progress.inc(1);
    Ok(dataset)
}

/// Loads every dataset in `defs` concurrently and waits for all of them.
///
/// When `data_dir` is set each dataset is read from its local file,
/// otherwise from its URL.
///
/// # Errors
///
/// Returns the first [`SourceError`] encountered; no partial result is
/// returned.
pub async fn load_datasets(
    defs: &[DatasetDefinition],
    data_dir: Option<&Path>,
    progress: Arc<dyn ProgressCallback>,
) -> Result<Vec<Dataset>, SourceError> {
    let locations: Vec<DatasetLocation> = defs.iter().map(|d| d.location(data_dir)).collect();
    load_datasets_from(defs, &locations, progress).await
}

/// Loads every dataset in `defs` from the matching entry of `locations`,
/// concurrently.
///
/// # Errors
///
/// Returns the first [`SourceError`] encountered.
///
/// # Panics
///
/// Panics if `defs` and `locations` differ in length.
pub async fn load_datasets_from(
    defs: &[DatasetDefinition],
    locations: &[DatasetLocation],
    progress: Arc<dyn ProgressCallback>,
) -> Result<Vec<Dataset>, SourceError> {
    assert_eq!(defs.len(), locations.len(), "one location per dataset");

    let client = reqwest::Client::builder()
        .user_agent(concat!("crash-map/", env!("CARGO_PKG_VERSION")))
        .build()?;

    progress.set_total(defs.len() as u64);

    let datasets = futures::future::try_join_all(
        defs.iter()
            .zip(locations)
            .map(|(def, location)| load_dataset(&client, def, location, &progress)),
    )
    .await?;

    progress.finish(format!("Loaded {} dataset(s)", datasets.len()));
    Ok(datasets)
}
