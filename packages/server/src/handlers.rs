//! HTTP handler functions for the crash map API.

use actix_web::{HttpResponse, web};
use crash_map_crash_models::FilterCriteria;
use crash_map_filter::criteria::RawCriteria;
use crash_map_filter::options::FilterOptions;
use crash_map_filter::story::{STORY_STEPS, story_step as lookup_step};
use crash_map_filter::summary::{summarize, summarize_by_year};
use crash_map_filter::time::format_time;
use crash_map_filter::{filter_dataset, filter_dataset_records};
use crash_map_server_models::{
    ApiDataset, ApiError, ApiHealth, ApiOptions, ApiStoryStep, ApiStoryView, ApiSummary,
    ApiYearSummaries, ApiYearSummary, CrashQueryParams, DatasetQueryParams,
};
use crash_map_source::loader::Dataset;
use crash_map_source::registry::dataset as dataset_definition;

use crate::{AppState, ServerError};

/// Maps an error to its JSON response.
fn error_response(e: &ServerError) -> HttpResponse {
    match e {
        ServerError::UnknownDataset(_) | ServerError::Criteria(_) => {
            HttpResponse::BadRequest().json(ApiError::new(e))
        }
        ServerError::NotLoaded(_) => HttpResponse::NotFound().json(ApiError::new(e)),
        ServerError::Source(_) | ServerError::Io(_) => {
            log::error!("Request failed: {e}");
            HttpResponse::InternalServerError().json(ApiError::new("Internal server error"))
        }
    }
}

/// Resolves the dataset and criteria of a crash query.
fn crash_query<'a>(
    state: &'a AppState,
    params: &CrashQueryParams,
) -> Result<(&'a Dataset, FilterCriteria), ServerError> {
    let dataset = state.resolve_dataset(params.dataset.as_deref())?;
    let criteria = params.criteria.parse()?;
    Ok((dataset, criteria))
}

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `GET /api/datasets`
///
/// Lists the loaded datasets.
pub async fn datasets(state: web::Data<AppState>) -> HttpResponse {
    let datasets: Vec<ApiDataset> = state
        .datasets
        .values()
        .map(|dataset| ApiDataset {
            kind: dataset.kind(),
            name: dataset.name().to_string(),
            description: dataset_definition(dataset.kind())
                .map(|def| def.description)
                .unwrap_or_default(),
            feature_count: dataset.len(),
            records_with_timestamp: dataset
                .records()
                .iter()
                .filter(|r| r.timestamp_text().is_some())
                .count(),
            resolution: dataset.report().clone(),
        })
        .collect();

    HttpResponse::Ok().json(datasets)
}

/// `GET /api/crashes`
///
/// Returns the matching features as a `GeoJSON` `FeatureCollection`.
pub async fn crashes(
    state: web::Data<AppState>,
    params: web::Query<CrashQueryParams>,
) -> HttpResponse {
    match crash_query(&state, &params) {
        Ok((dataset, criteria)) => HttpResponse::Ok().json(filter_dataset(dataset, &criteria)),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/summary`
///
/// Returns the totals of the matching crashes.
pub async fn summary(
    state: web::Data<AppState>,
    params: web::Query<CrashQueryParams>,
) -> HttpResponse {
    match crash_query(&state, &params) {
        Ok((dataset, criteria)) => {
            let summary = summarize(filter_dataset_records(dataset, &criteria));
            HttpResponse::Ok().json(ApiSummary {
                dataset: dataset.kind(),
                time_label: criteria.time_of_day.map(format_time),
                criteria,
                summary,
            })
        }
        Err(e) => error_response(&e),
    }
}

/// `GET /api/summary/years`
///
/// Returns totals per calendar year.
pub async fn summary_years(
    state: web::Data<AppState>,
    params: web::Query<DatasetQueryParams>,
) -> HttpResponse {
    match state.resolve_dataset(params.dataset.as_deref()) {
        Ok(dataset) => {
            let years = summarize_by_year(dataset.records())
                .into_iter()
                .map(|(year, summary)| ApiYearSummary { year, summary })
                .collect();
            HttpResponse::Ok().json(ApiYearSummaries {
                dataset: dataset.kind(),
                years,
            })
        }
        Err(e) => error_response(&e),
    }
}

/// `GET /api/options`
///
/// Returns the values offered by each filter dropdown.
pub async fn options(
    state: web::Data<AppState>,
    params: web::Query<DatasetQueryParams>,
) -> HttpResponse {
    match state.resolve_dataset(params.dataset.as_deref()) {
        Ok(dataset) => HttpResponse::Ok().json(ApiOptions {
            dataset: dataset.kind(),
            options: FilterOptions::from_records(dataset.records()),
        }),
        Err(e) => error_response(&e),
    }
}

/// `GET /api/story`
///
/// Returns the story table.
pub async fn story() -> HttpResponse {
    let steps: Vec<ApiStoryStep> = STORY_STEPS
        .iter()
        .enumerate()
        .map(|(i, step)| ApiStoryStep::new(i, step))
        .collect();
    HttpResponse::Ok().json(steps)
}

/// `GET /api/story/{step}`
///
/// Returns the crashes shown while a story step is active. The step
/// replaces the year selector and picks the dataset; the remaining query
/// selectors are kept.
pub async fn story_step(
    state: web::Data<AppState>,
    path: web::Path<usize>,
    params: web::Query<RawCriteria>,
) -> HttpResponse {
    let index = path.into_inner();
    let Some(step) = lookup_step(index) else {
        return HttpResponse::NotFound().json(ApiError::new(format!("No story step {index}")));
    };

    let view = params
        .parse()
        .map_err(ServerError::from)
        .and_then(|criteria| {
            let criteria = step.apply(&criteria);
            let dataset = state.dataset(step.dataset)?;
            Ok(ApiStoryView {
                step: ApiStoryStep::new(index, step),
                summary: summarize(filter_dataset_records(dataset, &criteria)),
                crashes: filter_dataset(dataset, &criteria),
                criteria,
            })
        });

    match view {
        Ok(view) => HttpResponse::Ok().json(view),
        Err(e) => error_response(&e),
    }
}
