//! Canvassing session endpoints
//!
//! Locks are always taken dataset first, then sessions.

use std::collections::HashSet;

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use canvass_common::{Address, Section};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath, ApiQuery};
use crate::filter::{AddressFilter, PropertyTypeFilter};
use crate::grouping::{group, GroupKind, GroupingMode};
use crate::pagination::calculate_pagination;
use crate::session::{CanvassSession, ContactReport, Interaction, SessionExport, SessionStats, SessionSummary};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct StartSessionRequest {
    pub volunteer: String,
    pub precinct: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SelectPrecinctRequest {
    pub precinct: String,
}

#[derive(Debug, Deserialize)]
pub struct SetVisitedRequest {
    pub visited: bool,
}

/// Query parameters for the address listing
///
/// Kept flat: `serde_urlencoded` cannot drive `#[serde(flatten)]`.
#[derive(Debug, Deserialize)]
pub struct AddressListQuery {
    pub query: Option<String>,
    #[serde(default = "default_true")]
    pub show_visited: bool,
    #[serde(default = "default_true")]
    pub show_not_visited: bool,
    #[serde(default)]
    pub property_type: PropertyTypeFilter,
    pub section: Option<String>,
    /// Overrides the session's selected precinct; `all` lifts it
    pub precinct: Option<String>,
    #[serde(default = "default_page")]
    pub page: usize,
    pub page_size: Option<usize>,
    pub group: Option<GroupingMode>,
}

fn default_true() -> bool {
    true
}

fn default_page() -> usize {
    1
}

impl AddressListQuery {
    fn to_filter(&self, session: &CanvassSession) -> ApiResult<AddressFilter> {
        let section = self
            .section
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<Section>)
            .transpose()?;

        let precinct = match self.precinct.as_deref().map(str::trim) {
            Some(p) if p.eq_ignore_ascii_case("all") => None,
            Some(p) if !p.is_empty() => Some(p.to_string()),
            _ => session.selected_precinct.clone(),
        };

        Ok(AddressFilter {
            query: self.query.clone(),
            show_visited: self.show_visited,
            show_not_visited: self.show_not_visited,
            property_type: self.property_type,
            section,
            precinct,
        })
    }
}

/// One listing row
#[derive(Debug, Serialize)]
pub struct AddressRow {
    #[serde(flatten)]
    pub address: Address,
    pub visited: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interaction: Option<Interaction>,
}

/// Display group over the whole filtered list
///
/// `count` is the full group size; `address_ids` holds only the members
/// present on the current page.
#[derive(Debug, Serialize)]
pub struct GroupView {
    pub label: String,
    pub kind: GroupKind,
    pub count: usize,
    pub address_ids: Vec<String>,
}

/// Address listing response with pagination metadata
#[derive(Debug, Serialize)]
pub struct AddressPage {
    pub total_results: usize,
    pub page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub rows: Vec<AddressRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<GroupView>>,
}

fn session_not_found(id: Uuid) -> ApiError {
    ApiError::NotFound(format!("session {}", id))
}

/// POST /api/sessions
pub async fn start_session(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<StartSessionRequest>,
) -> ApiResult<(StatusCode, Json<SessionSummary>)> {
    let volunteer = request.volunteer.trim();
    if volunteer.is_empty() {
        return Err(ApiError::BadRequest("volunteer name is required".to_string()));
    }

    let mut session = CanvassSession::new(volunteer);
    if let Some(precinct) = request.precinct.as_deref() {
        session.select_precinct(precinct)?;
    }
    let summary = session.summary();

    info!(session = %session.id, volunteer = %session.volunteer, "Session started");
    state.sessions.write().await.insert(session.id, session);
    Ok((StatusCode::CREATED, Json(summary)))
}

/// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<SessionSummary>> {
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or_else(|| session_not_found(id))?;
    Ok(Json(session.summary()))
}

/// DELETE /api/sessions/:id
pub async fn end_session(State(state): State<AppState>, ApiPath(id): ApiPath<Uuid>) -> ApiResult<StatusCode> {
    state
        .sessions
        .write()
        .await
        .remove(&id)
        .ok_or_else(|| session_not_found(id))?;
    info!(session = %id, "Session ended");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/sessions/:id/precinct
pub async fn select_precinct(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(request): ApiJson<SelectPrecinctRequest>,
) -> ApiResult<Json<SessionSummary>> {
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;
    session.select_precinct(request.precinct.trim())?;
    Ok(Json(session.summary()))
}

/// GET /api/sessions/:id/addresses
pub async fn list_addresses(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiQuery(query): ApiQuery<AddressListQuery>,
) -> ApiResult<Json<AddressPage>> {
    let dataset = state.dataset.read().await;
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or_else(|| session_not_found(id))?;

    let filter = query.to_filter(session)?;
    let matches = filter.apply(dataset.addresses(), &session.visited);

    let p = calculate_pagination(matches.len(), query.page, query.page_size);
    let page_rows = &matches[p.range(matches.len())];

    let groups = query.group.map(|mode| {
        let on_page: HashSet<&str> = page_rows.iter().map(|a| a.id()).collect();
        group(&matches, mode)
            .into_iter()
            .filter_map(|g| {
                let address_ids: Vec<String> = g
                    .members
                    .iter()
                    .map(|a| a.id())
                    .filter(|id| on_page.contains(id))
                    .map(str::to_string)
                    .collect();
                (!address_ids.is_empty()).then(|| GroupView {
                    label: g.label,
                    kind: g.kind,
                    count: g.members.len(),
                    address_ids,
                })
            })
            .collect()
    });

    let rows = page_rows
        .iter()
        .map(|&a| AddressRow {
            address: a.clone(),
            visited: session.visited.contains(a.id()),
            interaction: session.interactions.get(a.id()).cloned(),
        })
        .collect();

    Ok(Json(AddressPage {
        total_results: matches.len(),
        page: p.page,
        page_size: p.page_size,
        total_pages: p.total_pages,
        rows,
        groups,
    }))
}

/// POST /api/sessions/:id/contacts
pub async fn record_contact(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(report): ApiJson<ContactReport>,
) -> ApiResult<Json<Interaction>> {
    let dataset = state.dataset.read().await;
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;

    let interaction = session.record_contact(&dataset, report)?;
    Ok(Json(interaction.clone()))
}

/// PUT /api/sessions/:id/visited/:address_id
pub async fn set_visited(
    State(state): State<AppState>,
    ApiPath((id, address_id)): ApiPath<(Uuid, String)>,
    ApiJson(request): ApiJson<SetVisitedRequest>,
) -> ApiResult<Json<SessionSummary>> {
    let dataset = state.dataset.read().await;
    let mut sessions = state.sessions.write().await;
    let session = sessions.get_mut(&id).ok_or_else(|| session_not_found(id))?;

    session.set_visited(&dataset, &address_id, request.visited)?;
    Ok(Json(session.summary()))
}

/// GET /api/sessions/:id/stats
pub async fn session_stats(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<SessionStats>> {
    let dataset = state.dataset.read().await;
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or_else(|| session_not_found(id))?;
    Ok(Json(session.stats(&dataset)))
}

/// GET /api/sessions/:id/export
pub async fn export_session(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<SessionExport>> {
    let dataset = state.dataset.read().await;
    let sessions = state.sessions.read().await;
    let session = sessions.get(&id).ok_or_else(|| session_not_found(id))?;
    Ok(Json(session.export(&dataset)))
}

pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sessions", post(start_session))
        .route("/api/sessions/:id", get(get_session).delete(end_session))
        .route("/api/sessions/:id/precinct", put(select_precinct))
        .route("/api/sessions/:id/addresses", get(list_addresses))
        .route("/api/sessions/:id/contacts", post(record_contact))
        .route("/api/sessions/:id/visited/:address_id", put(set_visited))
        .route("/api/sessions/:id/stats", get(session_stats))
        .route("/api/sessions/:id/export", get(export_session))
}
