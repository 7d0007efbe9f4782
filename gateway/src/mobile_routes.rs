//! Mobile API Routes
//!
//! Location updates run the full safety pipeline: geofence check, risk
//! multiplier, remote scoring and alerting. Callers identify themselves
//! with `userId` and an optional `username`.

use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use geofencing::{alert_message, risk_multiplier, should_send_alert, GeoPoint, GeofenceCheck};
use safety_scoring::{ScoreRequest, DEFAULT_SAFETY_SCORE};
use serde::{Deserialize, Serialize};
use tourist_registry::{NewTourist, PanicReport, Tourist};
use tracing::{info, warn};

use crate::error::{ApiError, ApiJson, ApiResult};
use crate::events::{AlertKind, AlertSeverity, GatewayEvent};
use crate::incident_routes::anchor_incident;
use crate::AppState;

const PANIC_CONFIRMATION: &str = "Emergency alert sent successfully! Help is on the way!";
const ESTIMATED_RESPONSE: &str = "5-10 minutes";

const SAFETY_TIPS: [&str; 4] = [
    "Stay in well-lit areas",
    "Keep your phone charged",
    "Share your location with family",
    "Use the panic button in emergencies",
];

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationUpdate {
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationResponse {
    pub success: bool,
    pub message: &'static str,
    pub tourist: Tourist,
    /// Present only when a restricted fence was entered
    pub geofence_check: Option<GeofenceCheck>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanicRequest {
    pub user_id: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PanicResponse {
    pub success: bool,
    pub incident_id: String,
    pub message: &'static str,
    pub estimated_response: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub user_id: String,
}

#[derive(Serialize)]
pub struct NearbyService {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub distance: &'static str,
    pub contact: &'static str,
}

#[derive(Serialize)]
#[serde(untagged)]
pub enum StatusResponse {
    #[serde(rename_all = "camelCase")]
    NotTracking {
        status: &'static str,
        message: &'static str,
        safety_score: f64,
        recommendations: Vec<&'static str>,
    },
    #[serde(rename_all = "camelCase")]
    Tracking {
        tourist: Tourist,
        safety_tips: Vec<&'static str>,
        nearby_services: Vec<NearbyService>,
    },
}

fn require_user(user_id: &str) -> ApiResult<&str> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::BadRequest("userId is required".to_string()));
    }
    Ok(user_id)
}

/// Last three characters of the user id, used when the caller is not tracked yet
fn fallback_tourist_id(user_id: &str) -> String {
    let chars: Vec<char> = user_id.chars().collect();
    let tail: String = chars[chars.len().saturating_sub(3)..].iter().collect();
    format!("T-{}", tail)
}

pub async fn update_location(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LocationUpdate>,
) -> ApiResult<Json<LocationResponse>> {
    let user_id = require_user(&req.user_id)?.to_string();
    let point = GeoPoint::new(req.lat, req.lng);
    point.validate()?;

    let (tourist_id, check) = {
        let mut store = state.store.write().await;

        let existing = store
            .tourists
            .find_by_user(&user_id)
            .map(|t| t.tourist_id.clone());

        let tourist_id = match existing {
            Some(id) => {
                store.tourists.update_location(&id, point, req.accuracy)?;
                id
            }
            None => {
                let name = req.username.clone().unwrap_or_else(|| user_id.clone());
                let mut new = NewTourist::tracked(&user_id, &name, point);
                new.safety_score = Some(DEFAULT_SAFETY_SCORE);
                new.accuracy = req.accuracy;
                new.last_updated = req.timestamp;
                store.tourists.register(new)?.tourist_id
            }
        };

        let check = store.geofences.check_violations(point)?;
        (tourist_id, check)
    };

    let risk = risk_multiplier(&check.violations);
    let request = ScoreRequest::new(f64::from(risk), 0)
        .with_telemetry(serde_json::json!({ "location": { "lat": req.lat, "lng": req.lng } }));
    let outcome = state.clients.safety_score.calculate(&request).await;

    let (tourist, alert) = {
        let mut store = state.store.write().await;
        let tourist = if outcome.success {
            store
                .tourists
                .update_safety_score(&tourist_id, outcome.safety_score)?
                .clone()
        } else {
            store.tourists.get(&tourist_id)?.clone()
        };

        let alert = if check.has_violations && should_send_alert(&check.violations) {
            let message = alert_message(&tourist.tourist_id, &check.violations);
            store.alerts.record(
                AlertKind::Geofence,
                AlertSeverity::from_risk(check.risk_score),
                &tourist.tourist_id,
                None,
                message.clone(),
            );
            Some(message)
        } else {
            None
        };

        (tourist, alert)
    };

    state
        .events
        .publish(GatewayEvent::TouristLocation(tourist.clone()));

    if let Some(alert) = alert {
        warn!("{}", alert);
        state.events.publish(GatewayEvent::GeofenceAlert {
            tourist: tourist.clone(),
            alert,
        });
    }

    Ok(Json(LocationResponse {
        success: true,
        message: "Location updated successfully",
        tourist,
        geofence_check: check.has_violations.then_some(check),
    }))
}

pub async fn panic_alert(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<PanicRequest>,
) -> ApiResult<Json<PanicResponse>> {
    let user_id = require_user(&req.user_id)?.to_string();

    let coordinates = match (req.lat, req.lng) {
        (Some(lat), Some(lng)) => {
            let point = GeoPoint::new(lat, lng);
            point.validate()?;
            Some(point)
        }
        _ => None,
    };

    let (incident, tracked_id) = {
        let mut store = state.store.write().await;
        let tracked = store.tourists.find_by_user(&user_id).cloned();

        let tourist_id = tracked
            .as_ref()
            .map(|t| t.tourist_id.clone())
            .unwrap_or_else(|| fallback_tourist_id(&user_id));
        let tourist_name = req
            .username
            .clone()
            .or_else(|| tracked.as_ref().map(|t| t.name.clone()))
            .unwrap_or_else(|| user_id.clone());

        let incident = store.incidents.create_panic(PanicReport {
            tourist_id,
            tourist_name,
            coordinates,
            message: req.message.clone(),
        })?;
        (incident, tracked.map(|t| t.tourist_id))
    };

    let incident = anchor_incident(&state, incident).await;

    let tourist = {
        let mut store = state.store.write().await;
        let tourist = match &tracked_id {
            Some(id) => Some(store.tourists.mark_emergency(id)?.clone()),
            None => None,
        };
        store.alerts.record(
            AlertKind::Panic,
            AlertSeverity::High,
            incident.tourist_id.as_deref().unwrap_or_default(),
            Some(&incident.incident_id),
            format!(
                "PANIC: {} at {}",
                incident.tourist.as_deref().unwrap_or_default(),
                incident.location
            ),
        );
        tourist
    };

    warn!(
        "PANIC ALERT: {} at {} ({})",
        user_id, incident.location, incident.incident_id
    );

    let incident_id = incident.incident_id.clone();
    state
        .events
        .publish(GatewayEvent::PanicAlert { incident, tourist });

    Ok(Json(PanicResponse {
        success: true,
        incident_id,
        message: PANIC_CONFIRMATION,
        estimated_response: ESTIMATED_RESPONSE,
    }))
}

pub async fn tourist_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> ApiResult<Json<StatusResponse>> {
    let user_id = require_user(&query.user_id)?;
    let store = state.store.read().await;

    let Some(tourist) = store.tourists.find_by_user(user_id) else {
        info!("Status requested by untracked user {}", user_id);
        return Ok(Json(StatusResponse::NotTracking {
            status: "not_tracking",
            message: "Location tracking not yet started",
            safety_score: DEFAULT_SAFETY_SCORE,
            recommendations: vec!["Enable location sharing for better safety monitoring"],
        }));
    };

    Ok(Json(StatusResponse::Tracking {
        tourist: tourist.clone(),
        safety_tips: SAFETY_TIPS.to_vec(),
        nearby_services: vec![
            NearbyService {
                kind: "police",
                distance: "0.5 km",
                contact: "100",
            },
            NearbyService {
                kind: "hospital",
                distance: "1.2 km",
                contact: "102",
            },
            NearbyService {
                kind: "tourist_help",
                distance: "0.8 km",
                contact: "1363",
            },
        ],
    }))
}

pub fn mobile_routes(state: AppState) -> Router {
    Router::new()
        .route("/location/update", post(update_location))
        .route("/panic/alert", post(panic_alert))
        .route("/tourist/status", get(tourist_status))
        .with_state(state)
}
