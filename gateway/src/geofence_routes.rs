//! Geofence API Routes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use geofencing::{to_geojson, GeoPoint, Geofence, GeofenceCheck, GeofenceDraft};
use serde::Deserialize;

use crate::error::{ApiJson, ApiResult};
use crate::AppState;

#[derive(Deserialize)]
pub struct CheckRequest {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Deserialize)]
pub struct ActiveUpdate {
    pub active: bool,
}

/// Active fences
pub async fn list_geofences(State(state): State<AppState>) -> Json<Vec<Geofence>> {
    let store = state.store.read().await;
    Json(store.geofences.active().cloned().collect())
}

/// Active fences as a GeoJSON FeatureCollection
pub async fn geofences_geojson(State(state): State<AppState>) -> Json<serde_json::Value> {
    let store = state.store.read().await;
    Json(to_geojson(store.geofences.active()))
}

pub async fn restricted_geofences(State(state): State<AppState>) -> Json<Vec<Geofence>> {
    let store = state.store.read().await;
    Json(store.geofences.restricted_areas().cloned().collect())
}

/// Create a fence; malformed drafts are rejected with 400
pub async fn create_geofence(
    State(state): State<AppState>,
    ApiJson(draft): ApiJson<GeofenceDraft>,
) -> ApiResult<(StatusCode, Json<Geofence>)> {
    let mut store = state.store.write().await;
    let fence = store.geofences.create(draft)?;
    Ok((StatusCode::CREATED, Json(fence)))
}

pub async fn check_geofences(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CheckRequest>,
) -> ApiResult<Json<GeofenceCheck>> {
    let store = state.store.read().await;
    let check = store
        .geofences
        .check_violations(GeoPoint::new(req.lat, req.lng))?;
    Ok(Json(check))
}

/// Enable or disable a fence without deleting it
pub async fn set_geofence_active(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<ActiveUpdate>,
) -> ApiResult<Json<Geofence>> {
    let mut store = state.store.write().await;
    let fence = store.geofences.set_active(&id, req.active)?;
    Ok(Json(fence.clone()))
}

pub fn geofence_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_geofences).post(create_geofence))
        .route("/geojson", get(geofences_geojson))
        .route("/restricted", get(restricted_geofences))
        .route("/check", post(check_geofences))
        .route("/:id/active", put(set_geofence_active))
        .with_state(state)
}
