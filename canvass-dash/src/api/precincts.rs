//! Static precinct table with loaded address counts

use axum::{extract::State, routing::get, Json, Router};
use canvass_common::precincts::{Precinct, PRECINCTS};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PrecinctEntry {
    #[serde(flatten)]
    pub precinct: Precinct,
    /// Addresses in the current dataset assigned to this precinct
    pub loaded_addresses: usize,
}

/// GET /api/precincts
pub async fn list_precincts(State(state): State<AppState>) -> Json<Vec<PrecinctEntry>> {
    let dataset = state.dataset.read().await;
    let entries = PRECINCTS
        .iter()
        .map(|p| PrecinctEntry {
            precinct: p.clone(),
            loaded_addresses: dataset.count_in_precinct(p.id),
        })
        .collect();
    Json(entries)
}

pub fn precinct_routes() -> Router<AppState> {
    Router::new().route("/api/precincts", get(list_precincts))
}
