//! Dataset registry: loads every dataset definition from embedded TOML.
//!
//! Each `.toml` file in `packages/source/datasets/` is baked into the binary
//! at compile time via [`include_str!`].

use std::path::PathBuf;

use crash_map_crash_models::DatasetKind;

use crate::SourceError;
use crate::dataset_def::{DatasetDefinition, parse_dataset_toml};

/// Environment variable holding a comma-separated list of dataset kinds to
/// load. Unset or empty means every registered dataset.
pub const DATASETS_ENV: &str = "CRASH_MAP_DATASETS";

/// Environment variable naming a directory of local `GeoJSON` files to
/// read instead of fetching the dataset URLs.
pub const DATA_DIR_ENV: &str = "CRASH_MAP_DATA_DIR";

/// TOML configs embedded at compile time.
const DATASET_TOMLS: &[(&str, &str)] = &[
    ("all_incidents", include_str!("../datasets/all_incidents.toml")),
    (
        "injury_fatality",
        include_str!("../datasets/injury_fatality.toml"),
    ),
];

/// Returns all registered dataset definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (the configs are embedded, so
/// this is caught by the registry tests).
#[must_use]
pub fn all_datasets() -> Vec<DatasetDefinition> {
    DATASET_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_dataset_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Returns the definition for one dataset kind.
#[must_use]
pub fn dataset(kind: DatasetKind) -> Option<DatasetDefinition> {
    all_datasets().into_iter().find(|d| d.kind == kind)
}

/// Parses a comma-separated list of dataset kinds.
///
/// # Errors
///
/// Returns [`SourceError::UnknownDataset`] for the first name that is not a
/// registered dataset kind.
pub fn parse_dataset_list(list: &str) -> Result<Vec<DatasetKind>, SourceError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| {
            name.parse::<DatasetKind>()
                .map_err(|_| SourceError::UnknownDataset {
                    name: name.to_string(),
                })
        })
        .collect()
}

/// Returns the datasets selected by [`DATASETS_ENV`], or all of them when
/// the variable is unset.
///
/// # Errors
///
/// Returns [`SourceError::UnknownDataset`] if the variable names an
/// unregistered dataset.
pub fn enabled_datasets() -> Result<Vec<DatasetDefinition>, SourceError> {
    let all = all_datasets();
    let Ok(list) = std::env::var(DATASETS_ENV) else {
        return Ok(all);
    };
    let kinds = parse_dataset_list(&list)?;
    if kinds.is_empty() {
        return Ok(all);
    }
    log::info!("{DATASETS_ENV} selects {} dataset(s)", kinds.len());
    Ok(all.into_iter().filter(|d| kinds.contains(&d.kind)).collect())
}

/// Returns the local data directory from [`DATA_DIR_ENV`], if set and
/// non-empty.
#[must_use]
pub fn data_dir_from_env() -> Option<PathBuf> {
    std::env::var_os(DATA_DIR_ENV)
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldSchema;
    use crash_map_crash_models::SemanticField;

    #[test]
    fn loads_all_datasets() {
        let datasets = all_datasets();
        assert_eq!(datasets.len(), DatasetKind::all().len());
    }

    #[test]
    fn every_kind_is_registered_once() {
        for kind in DatasetKind::all() {
            let count = all_datasets().iter().filter(|d| d.kind == *kind).count();
            assert_eq!(count, 1, "{kind} registered {count} times");
        }
    }

    #[test]
    fn datasets_keep_every_known_candidate() {
        let builtin = FieldSchema::nashville();
        for def in &all_datasets() {
            for field in SemanticField::all() {
                let candidates = def.schema().candidates(*field);
                for name in builtin.candidates(*field) {
                    assert!(
                        candidates.contains(name),
                        "{}: {field} dropped candidate '{name}'",
                        def.kind
                    );
                }
            }
        }
    }

    #[test]
    fn all_datasets_have_required_fields() {
        for def in &all_datasets() {
            assert!(!def.name.is_empty(), "{}: name is empty", def.kind);
            assert!(def.url.starts_with("https://"), "{}: bad url", def.kind);
            assert!(
                std::path::Path::new(&def.filename)
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("geojson")),
                "{}: filename is not .geojson",
                def.kind
            );
        }
    }

    #[test]
    fn parses_dataset_lists() {
        assert_eq!(
            parse_dataset_list("injury_fatality, all_incidents").unwrap(),
            vec![DatasetKind::InjuryFatality, DatasetKind::AllIncidents]
        );
        assert!(parse_dataset_list("").unwrap().is_empty());
        assert!(matches!(
            parse_dataset_list("all_incidents,bogus"),
            Err(SourceError::UnknownDataset { name }) if name == "bogus"
        ));
    }
}
