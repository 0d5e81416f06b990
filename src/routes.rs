//! HTTP surface

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, warn};

use crate::{
    database::Database,
    errors::SatTrackerError,
    models::{NewSatellite, SatellitePosition, SatelliteRecord, TrackedSatellite},
    position::PositionClient,
};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub database: Database,
    pub position_client: PositionClient,
    /// Identity reported alongside live positions
    pub tracked: TrackedSatellite,
    /// Records inserted when the store has no active satellites
    pub seed: Arc<Vec<NewSatellite>>,
}

#[derive(Serialize)]
pub struct SatellitesResponse {
    pub success: bool,
    pub satellites: Vec<SatelliteRecord>,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub success: bool,
    pub query: String,
    pub satellites: Vec<SatelliteRecord>,
}

#[derive(Serialize)]
pub struct PositionResponse {
    pub success: bool,
    pub satellite: TrackedSatellite,
    pub position: SatellitePosition,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

impl SatTrackerError {
    fn status_code(&self) -> StatusCode {
        match self {
            SatTrackerError::MissingSearchQuery
            | SatTrackerError::PassesUnavailable
            | SatTrackerError::InvalidNoradId(_)
            | SatTrackerError::InvalidRecord(_) => StatusCode::BAD_REQUEST,
            SatTrackerError::DuplicateNoradId(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SatTrackerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {:?}", self);
        } else {
            debug!("Request rejected: {}", self);
        }

        let body = ErrorResponse {
            success: false,
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// API routes, relative to the mount point
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/satellites", get(list_satellites))
        .route("/satellites/search", get(search_satellites))
        .route("/satellites/update-tle", post(update_tle))
        .route("/satellites/{id}/passes", post(satellite_passes))
        .route("/iss/position", get(iss_position))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// API routes mounted under `base_path`
pub fn app(state: AppState, base_path: &str) -> Router {
    let base_path = base_path.trim_end_matches('/');
    if base_path.is_empty() {
        router(state)
    } else {
        Router::new().nest(base_path, router(state))
    }
}

/// List active satellites, seeding the defaults into an empty store
pub async fn list_satellites(
    State(state): State<AppState>,
) -> Result<Json<SatellitesResponse>, SatTrackerError> {
    let satellites = state.database.seed_if_empty(&state.seed).await?;

    Ok(Json(SatellitesResponse {
        success: true,
        satellites,
    }))
}

/// Live position of the tracked satellite, proxied from upstream
pub async fn iss_position(
    State(state): State<AppState>,
) -> Result<Json<PositionResponse>, SatTrackerError> {
    let position = state.position_client.current_position().await?;

    Ok(Json(PositionResponse {
        success: true,
        satellite: state.tracked.clone(),
        position,
    }))
}

/// Pass prediction is not offered; any id is answered the same way
pub async fn satellite_passes() -> SatTrackerError {
    SatTrackerError::PassesUnavailable
}

/// Case-insensitive name search over active satellites
pub async fn search_satellites(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, SatTrackerError> {
    let query = params.q.as_deref().map(str::trim).unwrap_or_default();
    if query.is_empty() {
        return Err(SatTrackerError::MissingSearchQuery);
    }

    let satellites = state.database.search_active_by_name(query).await?;

    Ok(Json(SearchResponse {
        success: true,
        query: query.to_string(),
        satellites,
    }))
}

/// Element set refresh is acknowledged but not performed
pub async fn update_tle() -> Json<MessageResponse> {
    warn!("TLE update requested but not implemented");
    Json(MessageResponse {
        success: true,
        message: "TLE update not yet implemented".to_string(),
    })
}
