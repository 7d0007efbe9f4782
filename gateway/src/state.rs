//! Shared gateway state

use chrono::{DateTime, Utc};
use geofencing::GeofenceRegistry;
use service_clients::{ClientError, ServiceClients};
use std::sync::Arc;
use tokio::sync::RwLock;
use tourist_registry::{IncidentRegistry, TouristRegistry};

use crate::config::{GatewayConfig, DEFAULT_ALERT_LOG_CAPACITY};
use crate::events::{AlertLog, EventBus};

/// In-process document store
#[derive(Debug)]
pub struct Store {
    pub tourists: TouristRegistry,
    pub incidents: IncidentRegistry,
    pub geofences: GeofenceRegistry,
    pub alerts: AlertLog,
}

impl Default for Store {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_LOG_CAPACITY)
    }
}

impl Store {
    pub fn new(alert_log_capacity: usize) -> Self {
        Self {
            tourists: TouristRegistry::new(),
            incidents: IncidentRegistry::new(),
            geofences: GeofenceRegistry::new(),
            alerts: AlertLog::new(alert_log_capacity),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RwLock<Store>>,
    pub clients: Arc<ServiceClients>,
    pub events: EventBus,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Empty store with clients for the configured endpoints
    pub fn new(config: &GatewayConfig) -> Result<Self, ClientError> {
        let clients = ServiceClients::new(&config.endpoints)?;
        Ok(Self::with_store(Store::new(config.alert_log_capacity), clients))
    }

    pub fn with_store(store: Store, clients: ServiceClients) -> Self {
        Self {
            store: Arc::new(RwLock::new(store)),
            clients: Arc::new(clients),
            events: EventBus::default(),
            started_at: Utc::now(),
        }
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}
