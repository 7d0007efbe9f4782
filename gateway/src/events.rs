//! Real-time dashboard events
//!
//! Every state change the dashboard cares about is published on a broadcast
//! channel and streamed to subscribers as Server-Sent Events. Geofence and
//! panic alerts are also kept in a bounded log for `/api/ai/alerts`.

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tourist_registry::{Incident, Tourist};
use tracing::{debug, warn};

use crate::AppState;

pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum GatewayEvent {
    TouristUpdated(Tourist),
    TouristLocation(Tourist),
    IncidentCreated(Incident),
    IncidentUpdated(Incident),
    GeofenceAlert {
        tourist: Tourist,
        alert: String,
    },
    PanicAlert {
        incident: Incident,
        tourist: Option<Tourist>,
    },
}

impl GatewayEvent {
    /// SSE event name
    pub fn name(&self) -> &'static str {
        match self {
            Self::TouristUpdated(_) => "tourist:updated",
            Self::TouristLocation(_) => "tourist:location",
            Self::IncidentCreated(_) => "incident:created",
            Self::IncidentUpdated(_) => "incident:updated",
            Self::GeofenceAlert { .. } => "alert:geofence",
            Self::PanicAlert { .. } => "alert:panic",
        }
    }

    fn to_sse(&self) -> Event {
        let payload = serde_json::to_string(self).unwrap_or_else(|_| "{}".into());
        Event::default().event(self.name()).data(payload)
    }
}

/// Broadcast fan-out of gateway events
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<GatewayEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(EVENT_CHANNEL_CAPACITY)
    }
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish to current subscribers; events with no subscriber are dropped
    pub fn publish(&self, event: GatewayEvent) {
        let name = event.name();
        match self.sender.send(event) {
            Ok(receivers) => debug!("Published {} to {} subscribers", name, receivers),
            Err(_) => debug!("Published {} with no subscribers", name),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<GatewayEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    Geofence,
    Panic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
}

impl AlertSeverity {
    /// Severity of a geofence alert from the summed risk score
    pub fn from_risk(risk_score: u8) -> Self {
        match risk_score {
            8..=u8::MAX => Self::High,
            5..=7 => Self::Medium,
            _ => Self::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    pub id: u64,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub message: String,
    pub severity: AlertSeverity,
    pub tourist_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Bounded log of recent alerts; the oldest entry is evicted when full
#[derive(Debug)]
pub struct AlertLog {
    entries: VecDeque<AlertRecord>,
    capacity: usize,
    next_id: u64,
}

impl AlertLog {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            next_id: 1,
        }
    }

    pub fn record(
        &mut self,
        kind: AlertKind,
        severity: AlertSeverity,
        tourist_id: &str,
        incident_id: Option<&str>,
        message: String,
    ) -> AlertRecord {
        let record = AlertRecord {
            id: self.next_id,
            kind,
            message,
            severity,
            tourist_id: tourist_id.to_string(),
            incident_id: incident_id.map(str::to_string),
            timestamp: Utc::now(),
        };
        self.next_id += 1;

        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(record.clone());
        record
    }

    /// Newest first
    pub fn recent(&self, limit: usize) -> Vec<&AlertRecord> {
        self.entries.iter().rev().take(limit).collect()
    }

    pub fn count(&self, kind: AlertKind) -> usize {
        self.entries.iter().filter(|a| a.kind == kind).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Stream all gateway events to a dashboard client
pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.events.subscribe();
    debug!(
        "Dashboard subscribed to events ({} subscribers)",
        state.events.subscriber_count()
    );

    let stream = BroadcastStream::new(receiver).filter_map(|result| async move {
        match result {
            Ok(event) => Some(Ok(event.to_sse())),
            Err(e) => {
                warn!("Event subscriber lagged: {}", e);
                None
            }
        }
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

pub fn event_routes(state: AppState) -> Router {
    Router::new()
        .route("/events", get(stream_events))
        .with_state(state)
}
