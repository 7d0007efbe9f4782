//! Incident API Routes
//!
//! New incidents are anchored on the credential service after they are
//! stored. The hash is attached only when anchoring succeeds.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tourist_registry::{Incident, IncidentFilter, IncidentPatch, IncidentStats, NewIncident};
use tracing::info;

use crate::error::{ApiError, ApiJson, ApiResult};
use crate::events::GatewayEvent;
use crate::AppState;

#[derive(Deserialize)]
pub struct IncidentQuery {
    pub status: Option<String>,
    pub severity: Option<String>,
}

#[derive(Deserialize)]
pub struct AssignRequest {
    pub officer: String,
}

#[derive(Serialize)]
pub struct IncidentsResponse {
    pub incidents: Vec<Incident>,
    pub summary: IncidentStats,
}

pub async fn list_incidents(
    State(state): State<AppState>,
    Query(query): Query<IncidentQuery>,
) -> ApiResult<Json<IncidentsResponse>> {
    let filter = IncidentFilter::from_query(query.status.as_deref(), query.severity.as_deref())?;
    let store = state.store.read().await;

    Ok(Json(IncidentsResponse {
        incidents: store.incidents.list(&filter).into_iter().cloned().collect(),
        summary: store.incidents.stats(),
    }))
}

/// Attach the anchor hash when the credential service accepts the incident
pub(crate) async fn anchor_incident(state: &AppState, incident: Incident) -> Incident {
    let outcome = state.clients.blockchain.anchor_incident(&incident).await;
    let hash = match outcome.vc_hash {
        Some(hash) if outcome.success => hash,
        _ => return incident,
    };

    let mut store = state.store.write().await;
    match store.incidents.set_blockchain_hash(&incident.incident_id, hash) {
        Ok(anchored) => anchored.clone(),
        Err(_) => incident,
    }
}

/// Report a new incident; reports always start Open
pub async fn create_incident(
    State(state): State<AppState>,
    ApiJson(mut req): ApiJson<NewIncident>,
) -> ApiResult<(StatusCode, Json<Incident>)> {
    req.incident_id = None;
    req.status = None;

    let incident = {
        let mut store = state.store.write().await;
        store.incidents.create(req)?
    };
    let incident = anchor_incident(&state, incident).await;

    info!(
        "Incident {} reported (anchored: {})",
        incident.incident_id,
        incident.blockchain_hash.is_some()
    );
    state
        .events
        .publish(GatewayEvent::IncidentCreated(incident.clone()));
    Ok((StatusCode::CREATED, Json(incident)))
}

pub async fn update_incident(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<IncidentPatch>,
) -> ApiResult<Json<Incident>> {
    let incident = {
        let mut store = state.store.write().await;
        store.incidents.update(&id, patch)?.clone()
    };

    state
        .events
        .publish(GatewayEvent::IncidentUpdated(incident.clone()));
    Ok(Json(incident))
}

/// Assign an officer; Open incidents move to In Progress
pub async fn assign_incident(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<AssignRequest>,
) -> ApiResult<Json<Incident>> {
    let officer = req.officer.trim();
    if officer.is_empty() {
        return Err(ApiError::BadRequest("officer is required".to_string()));
    }

    let incident = {
        let mut store = state.store.write().await;
        store.incidents.assign_officer(&id, officer)?.clone()
    };

    state
        .events
        .publish(GatewayEvent::IncidentUpdated(incident.clone()));
    Ok(Json(incident))
}

pub fn incident_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_incidents).post(create_incident))
        .route("/:id", put(update_incident))
        .route("/:id/assign", post(assign_incident))
        .with_state(state)
}
