//! AI API Routes
//!
//! Proxies to the scoring and report services, plus metrics and alerts
//! computed from gateway state.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use safety_scoring::{analyze_behavior, BehaviorAnalysis, ScoreOutcome, ScoreRequest};
use serde::{Deserialize, Serialize};
use service_clients::{ReportOutcome, ReportRequest};

use crate::error::{ApiJson, ApiResult};
use crate::events::{AlertKind, AlertRecord};
use crate::AppState;

const DEFAULT_ALERT_LIMIT: usize = 10;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AiMetrics {
    pub avg_safety_score: i64,
    /// Tourists currently counted as high risk
    pub predicted_risks: usize,
    /// Geofence alerts in the alert log
    pub anomalies_detected: usize,
    pub panic_alerts: usize,
    pub open_incidents: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
pub struct AlertsQuery {
    pub limit: Option<usize>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorResponse {
    pub success: bool,
    pub tourist_id: String,
    pub patterns: BehaviorAnalysis,
    pub timestamp: DateTime<Utc>,
}

pub async fn safety_score(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ScoreRequest>,
) -> Json<ScoreOutcome> {
    Json(state.clients.safety_score.calculate(&req).await)
}

pub async fn generate_report(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<ReportRequest>,
) -> Json<ReportOutcome> {
    Json(state.clients.case_report.generate(&req).await)
}

pub async fn metrics(State(state): State<AppState>) -> Json<AiMetrics> {
    let store = state.store.read().await;
    let summary = store.tourists.summary();

    Json(AiMetrics {
        avg_safety_score: summary.average_safety_score,
        predicted_risks: store.tourists.high_risk().len(),
        anomalies_detected: store.alerts.count(AlertKind::Geofence),
        panic_alerts: store.alerts.count(AlertKind::Panic),
        open_incidents: store.incidents.stats().open,
        timestamp: Utc::now(),
    })
}

/// Recent alerts, newest first
pub async fn alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertsQuery>,
) -> Json<Vec<AlertRecord>> {
    let limit = query.limit.unwrap_or(DEFAULT_ALERT_LIMIT);
    let store = state.store.read().await;
    Json(store.alerts.recent(limit).into_iter().cloned().collect())
}

pub async fn behavior(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<BehaviorResponse>> {
    let store = state.store.read().await;
    let tourist = store.tourists.get(&id)?;

    Ok(Json(BehaviorResponse {
        success: true,
        tourist_id: tourist.tourist_id.clone(),
        patterns: analyze_behavior(tourist.safety_score, tourist.status),
        timestamp: Utc::now(),
    }))
}

pub fn ai_routes(state: AppState) -> Router {
    Router::new()
        .route("/safety-score", post(safety_score))
        .route("/generate-report", post(generate_report))
        .route("/metrics", get(metrics))
        .route("/alerts", get(alerts))
        .route("/behavior/:id", get(behavior))
        .with_state(state)
}
