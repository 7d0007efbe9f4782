//! Health, dashboard and blockchain routes

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use service_clients::{LogsOutcome, RevokeOutcome, VerifyOutcome};

use crate::error::ApiJson;
use crate::AppState;

const RECENT_ACTIVITY_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Online,
    Offline,
}

impl From<bool> for ServiceStatus {
    fn from(online: bool) -> Self {
        if online {
            Self::Online
        } else {
            Self::Offline
        }
    }
}

#[derive(Serialize)]
pub struct ServiceInfo {
    pub name: &'static str,
    pub status: ServiceStatus,
}

#[derive(Serialize)]
pub struct HealthResponse {
    /// "healthy" when every service is online, otherwise "degraded"
    pub overall: &'static str,
    pub services: Vec<ServiceInfo>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub active_tourists: usize,
    pub total_tourists: usize,
    pub open_incidents: usize,
    pub total_incidents: usize,
    pub resolved_incidents: usize,
    pub high_severity_incidents: usize,
    pub average_safety_score: i64,
    pub high_risk_tourists: usize,
    pub uptime_seconds: i64,
}

#[derive(Serialize)]
pub struct Activity {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeRequest {
    pub vc_hash: String,
}

/// Liveness
pub async fn liveness() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "travira-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Probe every external service
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let probes = state.clients.health().await;

    let services = vec![
        ServiceInfo {
            name: "Main API",
            status: ServiceStatus::Online,
        },
        ServiceInfo {
            name: "AI Safety Score",
            status: probes.safety_score.into(),
        },
        ServiceInfo {
            name: "AI Case Report",
            status: probes.case_report.into(),
        },
        ServiceInfo {
            name: "Document Store",
            status: ServiceStatus::Online,
        },
        ServiceInfo {
            name: "Blockchain",
            status: probes.blockchain.into(),
        },
    ];

    let overall = if services.iter().all(|s| s.status == ServiceStatus::Online) {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        overall,
        services,
        timestamp: Utc::now(),
    })
}

pub async fn dashboard_stats(State(state): State<AppState>) -> Json<DashboardStats> {
    let store = state.store.read().await;
    let tourists = store.tourists.summary();
    let incidents = store.incidents.stats();

    Json(DashboardStats {
        active_tourists: tourists.active,
        total_tourists: tourists.total,
        open_incidents: incidents.open,
        total_incidents: incidents.total,
        resolved_incidents: incidents.resolved,
        high_severity_incidents: incidents.high_severity,
        average_safety_score: tourists.average_safety_score,
        high_risk_tourists: tourists.high_risk,
        uptime_seconds: state.uptime_seconds(),
    })
}

/// Latest incidents as activity lines
pub async fn recent_activity(State(state): State<AppState>) -> Json<Vec<Activity>> {
    let store = state.store.read().await;
    let activity = store
        .incidents
        .recent(RECENT_ACTIVITY_LIMIT)
        .into_iter()
        .map(|incident| Activity {
            kind: "incident",
            message: format!("{} reported in {}", incident.kind.as_str(), incident.location),
            timestamp: incident.created_at,
        })
        .collect();

    Json(activity)
}

pub async fn blockchain_logs(State(state): State<AppState>) -> Json<LogsOutcome> {
    Json(state.clients.blockchain.logs().await)
}

pub async fn blockchain_verify(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Json<VerifyOutcome> {
    Json(state.clients.blockchain.verify(&hash).await)
}

/// Mark an anchored incident credential as invalid
pub async fn blockchain_revoke(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RevokeRequest>,
) -> Json<RevokeOutcome> {
    Json(state.clients.blockchain.revoke(&req.vc_hash).await)
}

pub fn system_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/dashboard/stats", get(dashboard_stats))
        .route("/dashboard/recent-activity", get(recent_activity))
        .route("/blockchain/logs", get(blockchain_logs))
        .route("/blockchain/verify/:hash", get(blockchain_verify))
        .route("/blockchain/revoke", post(blockchain_revoke))
        .with_state(state)
}
