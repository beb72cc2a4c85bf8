#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the crash map application.
//!
//! Loads every enabled crash dataset once at startup, concurrently, and
//! then answers filter, summary, dropdown and story requests against the
//! in-memory records. State is read-only after startup, so workers share
//! it through an `Arc` without locking. A pre-built frontend is served
//! from `app/dist` when that directory exists.

mod handlers;
pub mod interactive;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use crash_map_crash_models::DatasetKind;
use crash_map_filter::criteria::CriteriaError;
use crash_map_source::SourceError;
use crash_map_source::loader::{Dataset, load_datasets};
use crash_map_source::progress::null_progress;
use crash_map_source::registry::{data_dir_from_env, enabled_datasets};

/// Directory holding the built frontend.
const STATIC_DIR: &str = "app/dist";

/// Errors raised while starting the server or answering a request.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// A `dataset` parameter named no known dataset.
    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),

    /// The dataset exists but was not enabled at startup.
    #[error("Dataset {0} is not loaded")]
    NotLoaded(DatasetKind),

    /// A filter parameter did not parse.
    #[error(transparent)]
    Criteria(#[from] CriteriaError),

    /// Loading datasets failed.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Binding or running the HTTP server failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Loaded datasets, keyed by kind.
    pub datasets: Arc<BTreeMap<DatasetKind, Dataset>>,
}

impl AppState {
    /// Indexes loaded datasets by kind.
    #[must_use]
    pub fn new(datasets: impl IntoIterator<Item = Dataset>) -> Self {
        Self {
            datasets: Arc::new(datasets.into_iter().map(|d| (d.kind(), d)).collect()),
        }
    }

    /// Returns the dataset selected by a `dataset` query parameter.
    /// Absent or blank selects [`DatasetKind::AllIncidents`].
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::UnknownDataset`] if `name` is not a dataset
    /// kind, or [`ServerError::NotLoaded`] if it was not loaded.
    pub fn resolve_dataset(&self, name: Option<&str>) -> Result<&Dataset, ServerError> {
        let kind = match name.map(str::trim).filter(|n| !n.is_empty()) {
            None => DatasetKind::default(),
            Some(name) => name
                .parse()
                .map_err(|_| ServerError::UnknownDataset(name.to_string()))?,
        };
        self.dataset(kind)
    }

    /// Returns the loaded dataset of `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::NotLoaded`] if it was not loaded.
    pub fn dataset(&self, kind: DatasetKind) -> Result<&Dataset, ServerError> {
        self.datasets.get(&kind).ok_or(ServerError::NotLoaded(kind))
    }
}

/// Runtime settings for the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind.
    pub bind_addr: String,
    /// Port to bind.
    pub port: u16,
    /// Local directory to read datasets from instead of their URLs.
    pub data_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: None,
        }
    }
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `PORT` and `CRASH_MAP_DATA_DIR`, falling back to
    /// `127.0.0.1:8080` and remote URLs.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            data_dir: data_dir_from_env(),
        }
    }
}

/// Loads every enabled dataset concurrently and returns once all are in
/// memory.
///
/// # Errors
///
/// Returns [`ServerError::Source`] if any dataset fails to load.
pub async fn load_state(data_dir: Option<&Path>) -> Result<AppState, ServerError> {
    let defs = enabled_datasets()?;
    log::info!("Loading {} dataset(s)...", defs.len());
    let datasets = load_datasets(&defs, data_dir, null_progress()).await?;
    Ok(AppState::new(datasets))
}

/// Registers the `/api` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(handlers::health))
            .route("/datasets", web::get().to(handlers::datasets))
            .route("/crashes", web::get().to(handlers::crashes))
            .route("/summary", web::get().to(handlers::summary))
            .route("/summary/years", web::get().to(handlers::summary_years))
            .route("/options", web::get().to(handlers::options))
            .route("/story", web::get().to(handlers::story))
            .route("/story/{step}", web::get().to(handlers::story_step)),
    );
}

/// Serves `state` until the server is stopped.
///
/// # Errors
///
/// Returns an `std::io::Error` if the server fails to bind or encounters
/// a runtime error.
#[allow(clippy::future_not_send)]
pub async fn serve(state: AppState, bind_addr: &str, port: u16) -> std::io::Result<()> {
    let state = web::Data::new(state);
    let serve_static = Path::new(STATIC_DIR).is_dir();
    if !serve_static {
        log::info!("{STATIC_DIR} not found; serving the API only");
    }

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        let app = App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure);

        if serve_static {
            app.service(Files::new("/", STATIC_DIR).index_file("index.html"))
        } else {
            app
        }
    })
    .bind((bind_addr, port))?
    .run()
    .await
}

/// Starts the crash map API server with settings from the environment.
///
/// This is a regular async function; the caller is responsible for
/// providing the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns [`ServerError`] if a dataset fails to load or the server fails
/// to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> Result<(), ServerError> {
    run_server_with(ServerConfig::from_env()).await
}

/// Starts the crash map API server with explicit settings.
///
/// # Errors
///
/// Returns [`ServerError`] if a dataset fails to load or the server fails
/// to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server_with(config: ServerConfig) -> Result<(), ServerError> {
    if pretty_env_logger::try_init_custom_env("RUST_LOG").is_err() {
        log::debug!("Logger already initialized");
    }

    let state = load_state(config.data_dir.as_deref()).await?;
    serve(state, &config.bind_addr, config.port).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test::{TestRequest, call_service, init_service, read_body_json};
    use crash_map_source::schema::FieldSchema;
    use serde_json::{Value, json};

    fn dataset(kind: DatasetKind) -> Dataset {
        let collection = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [-86.78, 36.16] },
                    "properties": {
                        "Date and Time": "3/4/2019 1:00:00 PM",
                        "Weather Description": "CLEAR",
                        "Hit and Run": "N",
                        "Number of Injuries": 2
                    }
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [-86.70, 36.10] },
                    "properties": {
                        "Date and Time": "8/8/2020 6:15:00 PM",
                        "Weather": "RAIN",
                        "Hit and Run Flag": "Y",
                        "Number of Fatalities": 1
                    }
                },
                {
                    "type": "Feature",
                    "geometry": { "type": "Point", "coordinates": [-86.75, 36.20] },
                    "properties": { "Weather": "CLEAR" }
                }
            ]
        }))
        .unwrap();
        Dataset::from_collection(kind, kind.label(), collection, &FieldSchema::nashville())
    }

    fn state() -> AppState {
        AppState::new([dataset(DatasetKind::AllIncidents)])
    }

    macro_rules! get_json {
        ($uri:expr) => {{
            let app = init_service(
                App::new()
                    .app_data(web::Data::new(state()))
                    .configure(configure),
            )
            .await;
            let resp = call_service(&app, TestRequest::get().uri($uri).to_request()).await;
            let status = resp.status();
            let body: Value = read_body_json(resp).await;
            (status, body)
        }};
    }

    #[test]
    fn resolves_default_and_named_datasets() {
        let state = state();
        assert_eq!(
            state.resolve_dataset(None).unwrap().kind(),
            DatasetKind::AllIncidents
        );
        assert_eq!(
            state.resolve_dataset(Some(" ")).unwrap().kind(),
            DatasetKind::AllIncidents
        );
        assert!(matches!(
            state.resolve_dataset(Some("bogus")),
            Err(ServerError::UnknownDataset(_))
        ));
        assert!(matches!(
            state.resolve_dataset(Some("injury_fatality")),
            Err(ServerError::NotLoaded(DatasetKind::InjuryFatality))
        ));
    }

    #[actix_web::test]
    async fn health_reports_version() {
        let (status, body) = get_json!("/api/health");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["healthy"], true);
    }

    #[actix_web::test]
    async fn lists_loaded_datasets() {
        let (status, body) = get_json!("/api/datasets");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["kind"], "all_incidents");
        assert_eq!(body[0]["featureCount"], 3);
        assert_eq!(body[0]["recordsWithTimestamp"], 2);

        let resolution = &body[0]["resolution"];
        assert_eq!(resolution["records"], 3);
        assert_eq!(resolution["matched"]["weather"]["Weather"], 2);
        assert_eq!(resolution["matched"]["weather"]["Weather Description"], 1);
        assert_eq!(resolution["missing"]["timestamp"], 1);
    }

    #[actix_web::test]
    async fn unfiltered_crashes_drop_untimed_features() {
        let (status, body) = get_json!("/api/crashes");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["type"], "FeatureCollection");
        assert_eq!(body["features"].as_array().unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn filters_crashes_by_query() {
        let (status, body) = get_json!("/api/crashes?year=2020&weather=rain&hitAndRun=all&time=1095");
        assert_eq!(status, StatusCode::OK);
        let features = body["features"].as_array().unwrap();
        assert_eq!(features.len(), 1);
        assert_eq!(features[0]["properties"]["Weather"], "RAIN");
    }

    #[actix_web::test]
    async fn summarizes_filtered_crashes() {
        let (status, body) = get_json!("/api/summary?time=1095");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["summary"]["total"], 1);
        assert_eq!(body["summary"]["fatalities"], 1);
        assert_eq!(body["timeLabel"], "6:15 PM");
    }

    #[actix_web::test]
    async fn summarizes_by_year() {
        let (status, body) = get_json!("/api/summary/years");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["years"],
            json!([
                { "year": 2019, "total": 1, "injuries": 2, "fatalities": 0 },
                { "year": 2020, "total": 1, "injuries": 0, "fatalities": 1 },
            ])
        );
    }

    #[actix_web::test]
    async fn lists_dropdown_options() {
        let (status, body) = get_json!("/api/options");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["years"], json!([2019, 2020]));
        assert_eq!(body["weather"], json!(["CLEAR", "RAIN"]));
        assert_eq!(body["hitAndRun"], json!(["N", "Y"]));
    }

    #[actix_web::test]
    async fn rejects_bad_parameters() {
        let (status, body) = get_json!("/api/crashes?dataset=everything");
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("everything"));

        let (status, _) = get_json!("/api/summary?year=soon");
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = get_json!("/api/crashes?time=2000");
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn story_step_applies_its_year() {
        let (status, body) = get_json!("/api/story/1");
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["step"]["year"], "2019");
        assert_eq!(body["crashes"]["features"].as_array().unwrap().len(), 1);
        assert_eq!(body["summary"]["injuries"], 2);
    }

    #[actix_web::test]
    async fn unknown_story_step_is_not_found() {
        let (status, _) = get_json!("/api/story/99");
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn story_step_for_unloaded_dataset_is_not_found() {
        let last = crash_map_filter::story::STORY_STEPS.len() - 1;
        let (status, _) = get_json!(&format!("/api/story/{last}"));
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
