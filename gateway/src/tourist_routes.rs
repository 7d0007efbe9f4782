//! Tourist API Routes

use axum::{
    extract::{Path, State},
    routing::{get, put},
    Json, Router,
};
use safety_scoring::TouristStatus;
use serde::{Deserialize, Serialize};
use tourist_registry::{Tourist, TouristSummary};

use crate::error::{ApiJson, ApiResult};
use crate::events::GatewayEvent;
use crate::AppState;

#[derive(Serialize)]
pub struct TouristsResponse {
    pub tourists: Vec<Tourist>,
    pub summary: TouristSummary,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyScoreUpdate {
    pub safety_score: f64,
}

/// All tourists, most recently updated first
pub async fn list_tourists(State(state): State<AppState>) -> Json<TouristsResponse> {
    let store = state.store.read().await;

    Json(TouristsResponse {
        tourists: store.tourists.list().into_iter().cloned().collect(),
        summary: store.tourists.summary(),
    })
}

pub async fn get_tourist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Tourist>> {
    let store = state.store.read().await;
    Ok(Json(store.tourists.get(&id)?.clone()))
}

/// Set a score manually; the status follows the new score
pub async fn update_safety_score(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<SafetyScoreUpdate>,
) -> ApiResult<Json<Tourist>> {
    let tourist = {
        let mut store = state.store.write().await;
        store.tourists.update_safety_score(&id, req.safety_score)?.clone()
    };

    state
        .events
        .publish(GatewayEvent::TouristUpdated(tourist.clone()));
    Ok(Json(tourist))
}

#[derive(Deserialize)]
pub struct StatusUpdate {
    pub status: TouristStatus,
}

/// Operator override; the only way out of emergency or inactive
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<StatusUpdate>,
) -> ApiResult<Json<Tourist>> {
    let tourist = {
        let mut store = state.store.write().await;
        store.tourists.set_status(&id, req.status)?.clone()
    };

    state
        .events
        .publish(GatewayEvent::TouristUpdated(tourist.clone()));
    Ok(Json(tourist))
}

pub fn tourist_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_tourists))
        .route("/:id", get(get_tourist))
        .route("/:id/safety-score", put(update_safety_score))
        .route("/:id/status", put(update_status))
        .with_state(state)
}
