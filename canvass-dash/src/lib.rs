//! canvass-dash library interface
//!
//! Volunteer canvassing service: loads and normalizes the address set, then
//! serves per-volunteer sessions over HTTP.

pub mod api;
pub mod dataset;
pub mod error;
pub mod filter;
pub mod grouping;
pub mod ingest;
pub mod normalize;
pub mod pagination;
pub mod session;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::dataset::Dataset;
use crate::ingest::AddressLoader;
use crate::session::CanvassSession;

/// Upload body cap used when the config does not set one
pub const DEFAULT_UPLOAD_LIMIT: usize = 32 * 1024 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Normalized address set; replaced wholesale on reload
    pub dataset: Arc<RwLock<Dataset>>,
    /// Open canvassing sessions
    pub sessions: Arc<RwLock<HashMap<Uuid, CanvassSession>>>,
    /// Source chain used for reloads and uploads
    pub loader: Arc<AddressLoader>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    /// Largest accepted upload body, in bytes
    pub upload_limit_bytes: usize,
}

impl AppState {
    pub fn new(loader: AddressLoader, dataset: Dataset) -> Self {
        Self {
            dataset: Arc::new(RwLock::new(dataset)),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            loader: Arc::new(loader),
            startup_time: Utc::now(),
            upload_limit_bytes: DEFAULT_UPLOAD_LIMIT,
        }
    }

    pub fn with_upload_limit(mut self, bytes: usize) -> Self {
        self.upload_limit_bytes = bytes;
        self
    }

    /// Run the loader chain and build state from its outcome
    pub async fn bootstrap(loader: AddressLoader) -> Self {
        let outcome = loader.load(None).await;
        Self::new(loader, Dataset::from_outcome(outcome))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.upload_limit_bytes;
    Router::new()
        .merge(api::health_routes())
        .merge(api::buildinfo_routes())
        .merge(api::precinct_routes())
        .merge(api::dataset_routes(upload_limit))
        .merge(api::session_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
