//! Credential anchoring service client
//!
//! Incidents and tourist activity are anchored as opaque credential strings.
//! The service hashes each credential and returns the hash with its expiry.

use crate::{
    probe, read_json, trim_base, ClientError, Result, ANCHOR_TIMEOUT, BLOCKCHAIN_HEALTH_TIMEOUT,
    QUERY_TIMEOUT,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tourist_registry::Incident;
use tracing::{debug, info, warn};

const SERVICE: &str = "blockchain";

/// Credential body anchored for an incident
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentCredential {
    pub incident_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub tourist_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub severity: String,
    pub location: String,
}

impl From<&Incident> for IncidentCredential {
    fn from(incident: &Incident) -> Self {
        Self {
            incident_id: incident.incident_id.clone(),
            kind: incident.kind.as_str().to_string(),
            tourist_id: incident.tourist_id.clone(),
            timestamp: incident.created_at,
            severity: format!("{:?}", incident.severity),
            location: incident.location.clone(),
        }
    }
}

/// Credential body anchored for a tourist activity
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityCredential {
    pub tourist_id: String,
    pub activity_type: String,
    pub location: String,
    pub timestamp: DateTime<Utc>,
    pub safety_score: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnchorBody {
    credential: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RevokeBody<'a> {
    vc_hash: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnchorResponse {
    vc_hash: String,
    #[serde(default)]
    expiry: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    message: Option<String>,
}

/// Credential status as reported by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialStatus {
    pub vc_hash: String,
    #[serde(default)]
    pub expiry: Option<i64>,
    #[serde(default)]
    pub revoked: bool,
}

/// One anchor or revoke entry from the service log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorLogEntry {
    pub vc_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<i64>,
    #[serde(default)]
    pub revoked: bool,
    #[serde(default)]
    pub action: String,
    /// Unix seconds
    #[serde(default)]
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vc_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<CredentialStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsOutcome {
    pub success: bool,
    pub logs: Vec<AnchorLogEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BlockchainClient {
    client: reqwest::Client,
    base_url: String,
}

impl BlockchainClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
        }
    }

    fn request_error(source: reqwest::Error) -> ClientError {
        ClientError::Request {
            service: SERVICE,
            source,
        }
    }

    async fn anchor<T: Serialize>(&self, credential: &T) -> Result<AnchorResponse> {
        let credential = serde_json::to_string(credential).map_err(|e| {
            ClientError::InvalidResponse {
                service: SERVICE,
                reason: format!("credential encoding failed: {}", e),
            }
        })?;

        let response = self
            .client
            .post(format!("{}/anchor", self.base_url))
            .timeout(ANCHOR_TIMEOUT)
            .json(&AnchorBody { credential })
            .send()
            .await
            .map_err(Self::request_error)?;

        read_json(SERVICE, response).await
    }

    fn anchor_outcome(result: Result<AnchorResponse>, label: &str) -> AnchorOutcome {
        let timestamp = Utc::now();
        match result {
            Ok(anchored) => {
                info!("{} anchored as {}", label, anchored.vc_hash);
                AnchorOutcome {
                    success: true,
                    vc_hash: Some(anchored.vc_hash),
                    expiry: anchored.expiry,
                    message: Some(format!("{} logged to blockchain", label)),
                    error: None,
                    timestamp,
                }
            }
            Err(e) => {
                warn!("Blockchain logging of {} failed: {}", label, e);
                AnchorOutcome {
                    success: false,
                    vc_hash: None,
                    expiry: None,
                    message: Some("Failed to log to blockchain".to_string()),
                    error: Some(e.to_string()),
                    timestamp,
                }
            }
        }
    }

    pub async fn anchor_incident(&self, incident: &Incident) -> AnchorOutcome {
        let credential = IncidentCredential::from(incident);
        Self::anchor_outcome(self.anchor(&credential).await, "Incident")
    }

    pub async fn anchor_activity(&self, activity: &ActivityCredential) -> AnchorOutcome {
        Self::anchor_outcome(self.anchor(activity).await, "Activity")
    }

    /// A credential verifies when it exists and is not revoked
    pub async fn verify(&self, vc_hash: &str) -> VerifyOutcome {
        let result = async {
            let response = self
                .client
                .get(format!("{}/status/{}", self.base_url, vc_hash))
                .timeout(QUERY_TIMEOUT)
                .send()
                .await
                .map_err(Self::request_error)?;
            read_json::<CredentialStatus>(SERVICE, response).await
        }
        .await;

        match result {
            Ok(status) => VerifyOutcome {
                success: true,
                verified: Some(!status.revoked),
                data: Some(status),
                error: None,
            },
            Err(e) => {
                warn!("Blockchain verification of {} failed: {}", vc_hash, e);
                VerifyOutcome {
                    success: false,
                    verified: None,
                    data: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    pub async fn revoke(&self, vc_hash: &str) -> RevokeOutcome {
        let result = async {
            let response = self
                .client
                .post(format!("{}/revoke", self.base_url))
                .timeout(ANCHOR_TIMEOUT)
                .json(&RevokeBody { vc_hash })
                .send()
                .await
                .map_err(Self::request_error)?;
            read_json::<MessageResponse>(SERVICE, response).await
        }
        .await;

        match result {
            Ok(body) => {
                info!("Credential {} revoked", vc_hash);
                RevokeOutcome {
                    success: true,
                    message: body.message,
                    error: None,
                    timestamp: Utc::now(),
                }
            }
            Err(e) => {
                warn!("Blockchain revocation of {} failed: {}", vc_hash, e);
                RevokeOutcome {
                    success: false,
                    message: None,
                    error: Some(e.to_string()),
                    timestamp: Utc::now(),
                }
            }
        }
    }

    /// Anchor log; empty when the service is unreachable
    pub async fn logs(&self) -> LogsOutcome {
        let result = async {
            let response = self
                .client
                .get(format!("{}/logs", self.base_url))
                .timeout(QUERY_TIMEOUT)
                .send()
                .await
                .map_err(Self::request_error)?;
            read_json::<Vec<AnchorLogEntry>>(SERVICE, response).await
        }
        .await;

        match result {
            Ok(logs) => {
                debug!("Fetched {} blockchain log entries", logs.len());
                LogsOutcome {
                    success: true,
                    logs,
                    error: None,
                    timestamp: Utc::now(),
                }
            }
            Err(e) => {
                warn!("Blockchain log fetch failed: {}", e);
                LogsOutcome {
                    success: false,
                    logs: Vec::new(),
                    error: Some(e.to_string()),
                    timestamp: Utc::now(),
                }
            }
        }
    }

    pub async fn health(&self) -> bool {
        probe(&self.client, &self.base_url, BLOCKCHAIN_HEALTH_TIMEOUT).await
    }
}
