//! Config-driven crash dataset definition.
//!
//! A [`DatasetDefinition`] captures everything that differs between the
//! published crash exports: where to fetch them and which property names
//! hold each semantic field.

use std::fmt;
use std::path::{Path, PathBuf};

use crash_map_crash_models::DatasetKind;
use serde::Deserialize;

use crate::SourceError;
use crate::schema::FieldSchema;

/// A published crash dataset, loaded from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetDefinition {
    /// Which dataset this is.
    pub kind: DatasetKind,
    /// Human-readable name.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// Remote `GeoJSON` location.
    pub url: String,
    /// File name used when reading from a local data directory.
    pub filename: String,
    /// Candidate property names per semantic field. Fields left out fall
    /// back to [`FieldSchema::nashville`].
    #[serde(default)]
    pub fields: FieldSchema,
}

/// Where a dataset document is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetLocation {
    /// Fetched over HTTP(S).
    Url(String),
    /// Read from the local filesystem.
    File(PathBuf),
}

impl fmt::Display for DatasetLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Url(url) => f.write_str(url),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl DatasetDefinition {
    /// Returns the location to load this dataset from: `data_dir/filename`
    /// when a local data directory is configured, otherwise the remote URL.
    #[must_use]
    pub fn location(&self, data_dir: Option<&Path>) -> DatasetLocation {
        data_dir.map_or_else(
            || DatasetLocation::Url(self.url.clone()),
            |dir| DatasetLocation::File(dir.join(&self.filename)),
        )
    }

    /// Returns the complete field schema for this dataset.
    #[must_use]
    pub const fn schema(&self) -> &FieldSchema {
        &self.fields
    }
}

/// Parses a [`DatasetDefinition`] from a TOML string, filling unlisted
/// semantic fields with the built-in candidates.
///
/// # Errors
///
/// Returns [`SourceError::Config`] if the TOML is malformed or missing
/// required keys.
pub fn parse_dataset_toml(toml_str: &str) -> Result<DatasetDefinition, SourceError> {
    let mut def: DatasetDefinition = toml::from_str(toml_str)?;
    def.fields = def.fields.with_defaults();
    Ok(def)
}
