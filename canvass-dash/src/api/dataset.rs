//! Dataset status, reload and upload endpoints
//!
//! Reload and upload run the loader chain without holding the dataset lock
//! and swap the normalized result in once it is ready.

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::extract::{ApiBytes, ApiQuery};
use crate::dataset::Dataset;
use crate::ingest::{LoadNotice, LoadedFrom, Upload};
use crate::{ApiError, ApiResult, AppState};

/// Loaded dataset description
#[derive(Debug, Serialize)]
pub struct DatasetResponse {
    pub source: LoadedFrom,
    pub notices: Vec<LoadNotice>,
    pub record_count: usize,
    pub loaded_at: DateTime<Utc>,
}

impl DatasetResponse {
    fn from_dataset(dataset: &Dataset) -> Self {
        Self {
            source: dataset.loaded_from.clone(),
            notices: dataset.notices.clone(),
            record_count: dataset.len(),
            loaded_at: dataset.loaded_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    #[serde(default = "default_filename")]
    pub filename: String,
}

fn default_filename() -> String {
    "upload.json".to_string()
}

/// GET /api/dataset
pub async fn get_dataset(State(state): State<AppState>) -> Json<DatasetResponse> {
    let dataset = state.dataset.read().await;
    Json(DatasetResponse::from_dataset(&dataset))
}

/// POST /api/dataset/reload
pub async fn reload_dataset(State(state): State<AppState>) -> Json<DatasetResponse> {
    info!("Reloading address dataset");
    let outcome = state.loader.load(None).await;
    Json(install(&state, Dataset::from_outcome(outcome)).await)
}

/// POST /api/dataset/upload?filename=
///
/// The upload is tried after the configured sources, so it is only used
/// when local files and remote candidates all fail.
pub async fn upload_dataset(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UploadQuery>,
    ApiBytes(body): ApiBytes,
) -> ApiResult<Json<DatasetResponse>> {
    if body.is_empty() {
        return Err(ApiError::BadRequest("upload body is empty".to_string()));
    }

    info!(filename = %query.filename, bytes = body.len(), "Reloading with uploaded file");
    let upload = Upload {
        filename: query.filename,
        bytes: body.to_vec(),
    };
    let outcome = state.loader.load(Some(&upload)).await;
    Ok(Json(install(&state, Dataset::from_outcome(outcome)).await))
}

async fn install(state: &AppState, dataset: Dataset) -> DatasetResponse {
    let response = DatasetResponse::from_dataset(&dataset);
    *state.dataset.write().await = dataset;
    response
}

/// Dataset routes; `upload_limit` caps the upload body in bytes
pub fn dataset_routes(upload_limit: usize) -> Router<AppState> {
    Router::new()
        .route("/api/dataset", get(get_dataset))
        .route("/api/dataset/reload", post(reload_dataset))
        .route(
            "/api/dataset/upload",
            post(upload_dataset).layer(DefaultBodyLimit::max(upload_limit)),
        )
}
