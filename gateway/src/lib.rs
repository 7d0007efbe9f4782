//! Travira Gateway
//!
//! REST API for the tourist safety dashboard and mobile app, backed by an
//! in-process store and fanning out to the scoring, report and credential
//! anchoring services.

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod ai_routes;
pub mod config;
pub mod error;
pub mod events;
pub mod geofence_routes;
pub mod incident_routes;
pub mod mobile_routes;
pub mod seed;
pub mod state;
pub mod system_routes;
pub mod tourist_routes;

pub use config::GatewayConfig;
pub use error::{ApiError, ApiJson, ApiResult};
pub use events::{EventBus, GatewayEvent};
pub use state::{AppState, Store};

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .nest("/tourists", tourist_routes::tourist_routes(state.clone()))
        .nest("/incidents", incident_routes::incident_routes(state.clone()))
        .nest("/ai", ai_routes::ai_routes(state.clone()))
        .nest("/geofences", geofence_routes::geofence_routes(state.clone()))
        .nest("/mobile", mobile_routes::mobile_routes(state.clone()))
        .merge(system_routes::system_routes(state.clone()))
        .merge(events::event_routes(state));

    Router::new()
        .route("/health", get(system_routes::liveness))
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
