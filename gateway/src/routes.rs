//! HTTP handlers for the screening control surface.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;

use orbital_mechanics::ElementSet;
use satellite_catalog::{
    store::{merge_keep_latest, CatalogEntry},
    CatalogStore,
};

use crate::job::{JobStatus, ResultsResponse};
use crate::AppState;

pub async fn start_job(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.controller.start().await {
        Ok(run_id) => (
            StatusCode::ACCEPTED,
            Json(json!({ "status": "analysis started", "run_id": run_id })),
        ),
        Err(e) => (StatusCode::CONFLICT, Json(json!({ "error": e.to_string() }))),
    }
}

pub async fn stop_job(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.controller.stop().await {
        Ok(()) => (
            StatusCode::ACCEPTED,
            Json(json!({ "status": "analysis stopping" })),
        ),
        Err(e) => (StatusCode::CONFLICT, Json(json!({ "error": e.to_string() }))),
    }
}

pub async fn get_status(State(state): State<AppState>) -> Json<JobStatus> {
    Json(state.controller.status())
}

pub async fn get_results(State(state): State<AppState>) -> Json<ResultsResponse> {
    Json(state.controller.results().await)
}

#[derive(Serialize)]
pub struct SatellitesResponse {
    pub user: Vec<CatalogEntry>,
    pub catalog_count: usize,
    pub catalog: Vec<CatalogEntry>,
}

pub async fn list_satellites(
    State(state): State<AppState>,
) -> Result<Json<SatellitesResponse>, (StatusCode, Json<Value>)> {
    let user = CatalogStore::new(state.config.user_path())
        .load()
        .map_err(internal_error)?;
    let catalog = CatalogStore::new(state.config.catalog_path())
        .load()
        .map_err(internal_error)?;

    Ok(Json(SatellitesResponse {
        user,
        catalog_count: catalog.len(),
        catalog,
    }))
}

#[derive(Deserialize)]
pub struct UploadRequest {
    pub name: String,
    pub tle_line1: String,
    pub tle_line2: String,
}

/// Validate and persist a user element set. The TLE is parsed before
/// anything is written; malformed input is rejected outright.
pub async fn upload_satellite(
    State(state): State<AppState>,
    Json(request): Json<UploadRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if let Err(e) = ElementSet::from_tle(&request.name, &request.tle_line1, &request.tle_line2) {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": e.to_string() })),
        ));
    }

    let store = CatalogStore::new(state.config.user_path());
    let existing = store.load().map_err(internal_error)?;
    let merged = merge_keep_latest(
        existing,
        vec![CatalogEntry {
            name: request.name.clone(),
            tle_line1: request.tle_line1,
            tle_line2: request.tle_line2,
        }],
    );
    store.save(&merged).map_err(internal_error)?;

    info!("Stored user element set for {}", request.name);
    Ok(Json(json!({
        "status": "element set stored",
        "name": request.name,
        "user_count": merged.len(),
    })))
}

fn internal_error(e: impl std::fmt::Display) -> (StatusCode, Json<Value>) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": e.to_string() })),
    )
}
