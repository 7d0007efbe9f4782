// Gateway API integration tests
//
// External services are either unreachable (fallback paths) or replaced
// by small in-process stubs.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
    routing::{get, post},
    Json, Router,
};
use geofencing::{GeoPoint, GeofenceDraft, GeofenceKind};
use serde_json::{json, Value};
use service_clients::{ServiceClients, ServiceEndpoints};
use tourist_registry::NewTourist;
use tower::ServiceExt; // for oneshot
use travira_gateway::{create_router, AppState, GatewayEvent, Store};

// Helper: base URL nothing listens on
async fn dead_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

// Helper: serve a stub service
async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn seeded_store() -> Store {
    let mut store = Store::default();

    store
        .geofences
        .create(
            GeofenceDraft::circle(
                "Restricted Military Area",
                GeofenceKind::RestrictedArea,
                GeoPoint::new(28.66, 77.25),
                1000.0,
            )
            .with_risk_level(9),
        )
        .unwrap();
    store
        .geofences
        .create(
            GeofenceDraft::circle(
                "India Gate Tourist Zone",
                GeofenceKind::TouristAttraction,
                GeoPoint::new(28.6129, 77.2295),
                400.0,
            )
            .with_risk_level(3)
            .with_alerts(false),
        )
        .unwrap();

    for (user, name, lat, lng, score) in [
        ("tourist1", "John Doe", 28.6139, 77.2090, 85.0),
        ("tourist2", "Jane Smith", 28.6129, 77.2295, 92.0),
        ("tourist3", "Bob Johnson", 28.6169, 77.2090, 67.0),
    ] {
        let mut new = NewTourist::tracked(user, name, GeoPoint::new(lat, lng));
        new.safety_score = Some(score);
        store.tourists.register(new).unwrap();
    }

    store
}

async fn test_state(endpoints: ServiceEndpoints) -> AppState {
    let clients = ServiceClients::new(&endpoints).unwrap();
    AppState::with_store(seeded_store(), clients)
}

async fn offline_state() -> AppState {
    let down = dead_url().await;
    test_state(ServiceEndpoints {
        safety_score_url: down.clone(),
        case_report_url: down.clone(),
        blockchain_url: down,
    })
    .await
}

// Helper: Parse JSON response
async fn json_response(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read response body");
    serde_json::from_slice(&body).expect("Failed to parse JSON")
}

async fn send(state: &AppState, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = create_router(state.clone()).oneshot(request).await.unwrap();
    let status = response.status();
    (status, json_response(response).await)
}

#[tokio::test]
async fn test_liveness() {
    let state = offline_state().await;
    let (status, body) = send(&state, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "travira-gateway");
}

#[tokio::test]
async fn test_list_and_get_tourists() {
    let state = offline_state().await;

    let (status, body) = send(&state, Method::GET, "/api/tourists", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tourists"].as_array().unwrap().len(), 3);
    assert_eq!(body["summary"]["total"], 3);
    assert_eq!(body["summary"]["highRisk"], 1);
    assert_eq!(body["summary"]["averageSafetyScore"], 81);

    let (status, body) = send(&state, Method::GET, "/api/tourists/T-002", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Jane Smith");

    let (status, body) = send(&state, Method::GET, "/api/tourists/T-999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Tourist not found");
}

#[tokio::test]
async fn test_manual_safety_score_update() {
    let state = offline_state().await;
    let mut events = state.events.subscribe();

    let (status, body) = send(
        &state,
        Method::PUT,
        "/api/tourists/T-001/safety-score",
        Some(json!({ "safetyScore": 42 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["safetyScore"], 42.0);
    assert_eq!(body["status"], "high-risk");

    let event = events.recv().await.unwrap();
    assert_eq!(event.name(), "tourist:updated");
}

#[tokio::test]
async fn test_incident_lifecycle_without_anchor() {
    let state = offline_state().await;

    let (status, created) = send(
        &state,
        Method::POST,
        "/api/incidents",
        Some(json!({
            "type": "Theft",
            "location": "Connaught Place",
            "severity": "Medium",
            "status": "Resolved",
            "description": "Wallet stolen near metro exit"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["status"], "Open");
    assert!(created.get("blockchainHash").is_none());
    let id = created["incidentId"].as_str().unwrap().to_string();

    let (status, updated) = send(
        &state,
        Method::PUT,
        &format!("/api/incidents/{}", id),
        Some(json!({ "status": "Resolved", "resolution": "Wallet recovered" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["status"], "Resolved");
    assert!(updated["resolvedAt"].is_string());

    let (status, list) = send(&state, Method::GET, "/api/incidents?status=Resolved&severity=all", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list["incidents"].as_array().unwrap().len(), 1);
    assert_eq!(list["summary"]["resolved"], 1);

    let (status, _) = send(&state, Method::GET, "/api/incidents?status=Pending", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &state,
        Method::PUT,
        "/api/incidents/INC-1999-001",
        Some(json!({ "status": "Closed" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Incident not found");
}

#[tokio::test]
async fn test_incident_anchored_on_blockchain() {
    let anchor = Router::new().route(
        "/anchor",
        post(|| async { Json(json!({ "message": "Credential anchored", "vcHash": "0xfeed", "expiry": 1 })) }),
    );
    let down = dead_url().await;
    let state = test_state(ServiceEndpoints {
        safety_score_url: down.clone(),
        case_report_url: down,
        blockchain_url: spawn(anchor).await,
    })
    .await;

    let (status, created) = send(
        &state,
        Method::POST,
        "/api/incidents",
        Some(json!({
            "type": "Medical Emergency",
            "location": "Red Fort",
            "severity": "High",
            "description": "Heat exhaustion"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["blockchainHash"], "0xfeed");
}

#[tokio::test]
async fn test_geofence_routes() {
    let state = offline_state().await;

    let (status, fences) = send(&state, Method::GET, "/api/geofences", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fences.as_array().unwrap().len(), 2);

    let (_, restricted) = send(&state, Method::GET, "/api/geofences/restricted", None).await;
    assert_eq!(restricted.as_array().unwrap().len(), 1);

    let (_, geojson) = send(&state, Method::GET, "/api/geofences/geojson", None).await;
    assert_eq!(geojson["type"], "FeatureCollection");

    let (status, body) = send(
        &state,
        Method::POST,
        "/api/geofences",
        Some(json!({ "name": "Bad", "type": "high_risk",
                     "geometry": { "type": "Point", "coordinates": [77.2, 28.6], "radius": -5 } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, created) = send(
        &state,
        Method::POST,
        "/api/geofences",
        Some(json!({ "name": "High Crime Area", "type": "high_risk", "riskLevel": 7,
                     "geometry": { "type": "Circle", "coordinates": [77.23, 28.64], "radius": 750 } })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["riskLevel"], 7);

    let (status, check) = send(
        &state,
        Method::POST,
        "/api/geofences/check",
        Some(json!({ "lat": 28.6601, "lng": 77.2502 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(check["hasViolations"], true);
    assert_eq!(check["riskScore"], 9);

    let (status, _) = send(
        &state,
        Method::POST,
        "/api/geofences/check",
        Some(json!({ "lat": 123.0, "lng": 77.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_location_update_with_remote_score() {
    let scoring = Router::new().route(
        "/calculate",
        post(|Json(body): Json<Value>| async move {
            let risk = body["geofence_risk"].as_f64().unwrap_or(1.0);
            Json(json!({ "safety_score": 100.0 - risk * 6.0 }))
        }),
    );
    let down = dead_url().await;
    let state = test_state(ServiceEndpoints {
        safety_score_url: spawn(scoring).await,
        case_report_url: down.clone(),
        blockchain_url: down,
    })
    .await;
    let mut events = state.events.subscribe();

    let (status, body) = send(
        &state,
        Method::POST,
        "/api/mobile/location/update",
        Some(json!({ "userId": "new-user-77", "username": "maya", "lat": 28.6601, "lng": 77.2502 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["tourist"]["touristId"], "T-004");
    assert_eq!(body["tourist"]["safetyScore"], 46.0);
    assert_eq!(body["tourist"]["status"], "high-risk");
    assert_eq!(body["geofenceCheck"]["violations"][0]["name"], "Restricted Military Area");

    let first = events.recv().await.unwrap();
    assert_eq!(first.name(), "tourist:location");
    let second = events.recv().await.unwrap();
    match second {
        GatewayEvent::GeofenceAlert { alert, .. } => {
            assert_eq!(
                alert,
                "ALERT: Tourist T-004 has entered Restricted Military Area (restricted_area). Risk Level: 9/10"
            );
        }
        other => panic!("unexpected event {}", other.name()),
    }

    let (_, alerts) = send(&state, Method::GET, "/api/ai/alerts", None).await;
    assert_eq!(alerts[0]["type"], "geofence");
    assert_eq!(alerts[0]["severity"], "high");

    let (_, metrics) = send(&state, Method::GET, "/api/ai/metrics", None).await;
    assert_eq!(metrics["anomaliesDetected"], 1);
}

#[tokio::test]
async fn test_location_update_fallback_keeps_score() {
    let state = offline_state().await;

    let (status, body) = send(
        &state,
        Method::POST,
        "/api/mobile/location/update",
        Some(json!({ "userId": "tourist1", "lat": 28.6135, "lng": 77.2095, "accuracy": 12.5 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tourist"]["touristId"], "T-001");
    assert_eq!(body["tourist"]["safetyScore"], 85.0);
    assert_eq!(body["tourist"]["accuracy"], 12.5);
    assert!(body["geofenceCheck"].is_null());

    let (status, _) = send(
        &state,
        Method::POST,
        "/api/mobile/location/update",
        Some(json!({ "userId": "tourist1", "lat": 28.6, "lng": 200.0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_panic_alert() {
    let state = offline_state().await;

    let (status, body) = send(
        &state,
        Method::POST,
        "/api/mobile/panic/alert",
        Some(json!({ "userId": "tourist2", "lat": 28.6129, "lng": 77.2295 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["incidentId"].as_str().unwrap().starts_with("PANIC-"));
    assert_eq!(body["estimatedResponse"], "5-10 minutes");

    let (_, tourist) = send(&state, Method::GET, "/api/tourists/T-002", None).await;
    assert_eq!(tourist["status"], "emergency");
    assert_eq!(tourist["safetyScore"], 0.0);

    let (_, incidents) = send(&state, Method::GET, "/api/incidents?severity=High", None).await;
    let incident = &incidents["incidents"][0];
    assert_eq!(incident["type"], "Emergency Alert");
    assert_eq!(incident["location"], "28.6129, 77.2295");
    assert_eq!(incident["assignedOfficer"], "Emergency Response Team");
    assert_eq!(incident["tourist"], "Jane Smith");

    let (_, activity) = send(&state, Method::GET, "/api/dashboard/recent-activity", None).await;
    assert_eq!(activity[0]["message"], "Emergency Alert reported in 28.6129, 77.2295");
}

#[tokio::test]
async fn test_tourist_status() {
    let state = offline_state().await;

    let (_, body) = send(&state, Method::GET, "/api/mobile/tourist/status?userId=stranger", None).await;
    assert_eq!(body["status"], "not_tracking");
    assert_eq!(body["safetyScore"], 85.0);

    let (_, body) = send(&state, Method::GET, "/api/mobile/tourist/status?userId=tourist3", None).await;
    assert_eq!(body["tourist"]["name"], "Bob Johnson");
    assert_eq!(body["nearbyServices"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_ai_proxies_fall_back() {
    let state = offline_state().await;

    let (status, body) = send(
        &state,
        Method::POST,
        "/api/ai/safety-score",
        Some(json!({ "geofenceRisk": 7, "anomalies": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert_eq!(body["safetyScore"], 59.0);

    let (_, report) = send(
        &state,
        Method::POST,
        "/api/ai/generate-report",
        Some(json!({ "touristId": "T-001", "type": "Theft" })),
    )
    .await;
    assert_eq!(report["success"], false);

    let (status, behavior) = send(&state, Method::GET, "/api/ai/behavior/T-003", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(behavior["patterns"]["movementPattern"], "normal");
}

#[tokio::test]
async fn test_health_and_dashboard() {
    let blockchain = Router::new().route("/", get(|| async { "ok" }));
    let down = dead_url().await;
    let state = test_state(ServiceEndpoints {
        safety_score_url: down.clone(),
        case_report_url: down,
        blockchain_url: spawn(blockchain).await,
    })
    .await;

    let (status, health) = send(&state, Method::GET, "/api/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["overall"], "degraded");
    let services = health["services"].as_array().unwrap();
    assert_eq!(services.len(), 5);
    assert!(services
        .iter()
        .any(|s| s["name"] == "Blockchain" && s["status"] == "online"));

    let (_, stats) = send(&state, Method::GET, "/api/dashboard/stats", None).await;
    assert_eq!(stats["totalTourists"], 3);
    assert_eq!(stats["activeTourists"], 3);
    assert_eq!(stats["highRiskTourists"], 1);
    assert_eq!(stats["openIncidents"], 0);

    let (_, logs) = send(&state, Method::GET, "/api/blockchain/logs", None).await;
    assert_eq!(logs["success"], false);
    assert_eq!(logs["logs"], json!([]));
}

#[tokio::test]
async fn test_operator_overrides() {
    let state = offline_state().await;

    send(
        &state,
        Method::POST,
        "/api/mobile/panic/alert",
        Some(json!({ "userId": "tourist1" })),
    )
    .await;
    let (_, tourist) = send(&state, Method::GET, "/api/tourists/T-001", None).await;
    assert_eq!(tourist["status"], "emergency");

    let (status, tourist) = send(
        &state,
        Method::PUT,
        "/api/tourists/T-001/status",
        Some(json!({ "status": "active" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tourist["status"], "active");

    let (status, created) = send(
        &state,
        Method::POST,
        "/api/incidents",
        Some(json!({ "type": "Lost Tourist", "location": "Chandni Chowk",
                     "severity": "Low", "description": "Separated from group" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["incidentId"].as_str().unwrap().to_string();

    let (status, _) = send(
        &state,
        Method::POST,
        &format!("/api/incidents/{}/assign", id),
        Some(json!({ "officer": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, assigned) = send(
        &state,
        Method::POST,
        &format!("/api/incidents/{}/assign", id),
        Some(json!({ "officer": "Officer Sharma" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["assignedOfficer"], "Officer Sharma");
    assert_eq!(assigned["status"], "In Progress");

    let (_, fences) = send(&state, Method::GET, "/api/geofences/restricted", None).await;
    let fence_id = fences[0]["id"].as_str().unwrap().to_string();
    let (status, fence) = send(
        &state,
        Method::PUT,
        &format!("/api/geofences/{}/active", fence_id),
        Some(json!({ "active": false })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fence["active"], false);

    let (_, fences) = send(&state, Method::GET, "/api/geofences", None).await;
    assert_eq!(fences.as_array().unwrap().len(), 1);

    let (status, _) = send(
        &state,
        Method::PUT,
        "/api/geofences/GF-missing/active",
        Some(json!({ "active": true })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, revoke) = send(
        &state,
        Method::POST,
        "/api/blockchain/revoke",
        Some(json!({ "vcHash": "0xfeed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(revoke["success"], false);
}

#[tokio::test]
async fn test_malformed_body_returns_json_error() {
    let state = offline_state().await;

    let (status, body) = send(
        &state,
        Method::POST,
        "/api/incidents",
        Some(json!({ "type": "Volcano", "location": "Red Fort",
                     "severity": "High", "description": "Ash cloud" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("type"));

    let (status, body) = send(
        &state,
        Method::POST,
        "/api/mobile/location/update",
        Some(json!({ "userId": "tourist1", "lat": "north" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, body) = send(
        &state,
        Method::POST,
        "/api/geofences",
        Some(json!({ "name": "No Shape", "type": "safe_zone" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (_, list) = send(&state, Method::GET, "/api/incidents", None).await;
    assert_eq!(list["incidents"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_event_stream_delivers_updates() {
    use futures::StreamExt;
    use std::time::Duration;

    let state = offline_state().await;

    let request = Request::builder()
        .uri("/api/events")
        .body(Body::empty())
        .unwrap();
    let response = create_router(state.clone()).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response.headers()["content-type"].to_str().unwrap().to_string();
    assert!(content_type.starts_with("text/event-stream"));
    let mut frames = response.into_body().into_data_stream();

    let (status, _) = send(
        &state,
        Method::PUT,
        "/api/tourists/T-001/safety-score",
        Some(json!({ "safetyScore": 42 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let frame = tokio::time::timeout(Duration::from_secs(5), frames.next())
        .await
        .expect("no event within 5s")
        .expect("event stream ended")
        .unwrap();
    let text = String::from_utf8(frame.to_vec()).unwrap();
    assert!(text.contains("event: tourist:updated"), "frame was {}", text);
    assert!(text.contains("\"touristId\":\"T-001\""), "frame was {}", text);
}

#[tokio::test]
async fn test_panic_from_untracked_user() {
    let state = offline_state().await;

    let (status, body) = send(
        &state,
        Method::POST,
        "/api/mobile/panic/alert",
        Some(json!({ "userId": "visitor_xyz", "lat": 28.6562, "lng": 77.2410 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    let incident_id = body["incidentId"].as_str().unwrap().to_string();

    let (_, incidents) = send(&state, Method::GET, "/api/incidents", None).await;
    let incident = incidents["incidents"]
        .as_array()
        .unwrap()
        .iter()
        .find(|i| i["incidentId"] == incident_id.as_str())
        .unwrap();
    assert_eq!(incident["touristId"], "T-xyz");
    assert_eq!(incident["tourist"], "visitor_xyz");

    let (_, tourists) = send(&state, Method::GET, "/api/tourists", None).await;
    assert_eq!(tourists["tourists"].as_array().unwrap().len(), 3);
    assert_eq!(tourists["summary"]["total"], 3);

    let (_, alerts) = send(&state, Method::GET, "/api/ai/alerts", None).await;
    assert_eq!(alerts[0]["type"], "panic");
    assert_eq!(alerts[0]["touristId"], "T-xyz");
}
