//! HTTP handlers: query-string parsing, lookup execution and response shaping.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;

use geodude::cache::CacheStats;
use geodude::export::{to_csv_bytes, EXPORT_FILE_NAME};
use geodude::map::MapView;
use geodude::{execute, AddressQuery, Error, Lookup, LookupOutcome, PersonQuery, Record};

use crate::AppState;

/// Lookup error rendered as JSON; user mistakes map to 400
pub struct AppError(Error);

impl From<Error> for AppError {
    fn from(e: Error) -> Self {
        AppError(e)
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.0.is_user_error() {
            StatusCode::BAD_REQUEST
        } else {
            error!("Lookup failed: {}", self.0);
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

#[derive(Deserialize)]
pub struct IdParams {
    id: Option<i64>,
    #[serde(default)]
    format: OutputFormat,
}

#[derive(Deserialize)]
pub struct PersonParams {
    first_name: Option<String>,
    last_name: Option<String>,
    city: Option<String>,
    #[serde(default)]
    format: OutputFormat,
}

#[derive(Deserialize)]
pub struct AddressParams {
    street: Option<String>,
    city: Option<String>,
    #[serde(default)]
    format: OutputFormat,
}

#[derive(Deserialize)]
pub struct RadiusParams {
    /// "lat lon" or "lat, lon"
    coordinates: Option<String>,
    /// Meters; defaults to the configured radius
    radius: Option<f64>,
    #[serde(default)]
    format: OutputFormat,
}

#[derive(Serialize)]
struct LookupResponse {
    /// "ok" or "no_results"
    status: &'static str,
    count: usize,
    map: MapView,
    records: Vec<Record>,
}

impl From<LookupOutcome> for LookupResponse {
    fn from(outcome: LookupOutcome) -> Self {
        let map = MapView::from_outcome(&outcome);
        Self {
            status: if outcome.is_empty() { "no_results" } else { "ok" },
            count: outcome.records.len(),
            map,
            records: outcome.records,
        }
    }
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    store: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache: Option<CacheStats>,
}

/// Health check endpoint
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let healthy = state.store.inner().count().await.is_ok();

    Json(HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        store: healthy,
        cache: state.store.cache().map(|c| c.stats()),
    })
}

pub async fn id_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<IdParams>,
) -> Result<Response, AppError> {
    run(&state, Lookup::Id(params.id), params.format).await
}

pub async fn person_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PersonParams>,
) -> Result<Response, AppError> {
    let query = PersonQuery {
        first_name: params.first_name,
        last_name: params.last_name,
        city: params.city,
    };
    run(&state, Lookup::Person(query), params.format).await
}

pub async fn address_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AddressParams>,
) -> Result<Response, AppError> {
    let query = AddressQuery {
        street_name: params.street,
        city: params.city,
    };
    run(&state, Lookup::Address(query), params.format).await
}

pub async fn radius_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RadiusParams>,
) -> Result<Response, AppError> {
    let radius_m = state.config.query.radius(params.radius)?;
    let lookup = Lookup::Radius {
        coordinates: params.coordinates.unwrap_or_default(),
        radius_m,
    };
    run(&state, lookup, params.format).await
}

async fn run(state: &AppState, lookup: Lookup, format: OutputFormat) -> Result<Response, AppError> {
    let outcome = execute(&state.store, lookup).await?;

    match format {
        OutputFormat::Json => Ok(Json(LookupResponse::from(outcome)).into_response()),
        OutputFormat::Csv => {
            let body = to_csv_bytes(&outcome.records)?;
            let headers = [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
                ),
            ];
            Ok((headers, body).into_response())
        }
    }
}
