#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crash dataset definitions, field resolution, and GeoJSON loading.
//!
//! Each published dataset is described by a TOML [`DatasetDefinition`]
//! embedded at compile time. The definition carries a declarative
//! [`FieldSchema`] that maps every semantic crash attribute to the ordered
//! list of source property names it may appear under, so that column
//! renames between dataset revisions are handled in exactly one place.
//!
//! [`DatasetDefinition`]: dataset_def::DatasetDefinition
//! [`FieldSchema`]: schema::FieldSchema

pub mod dataset_def;
pub mod loader;
pub mod progress;
pub mod registry;
pub mod schema;

/// Errors that can occur while loading crash datasets.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not valid `GeoJSON`.
    #[error("GeoJSON parse error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The document parsed, but is not a `FeatureCollection`.
    #[error("{location} is not a GeoJSON FeatureCollection")]
    NotFeatureCollection {
        /// Where the document was loaded from.
        location: String,
    },

    /// A dataset definition could not be parsed.
    #[error("Invalid dataset definition: {0}")]
    Config(#[from] toml::de::Error),

    /// A dataset name did not match any registered dataset.
    #[error("Unknown dataset: {name}")]
    UnknownDataset {
        /// The name that was requested.
        name: String,
    },
}
