//! External Service Clients
//!
//! HTTP clients for the services the gateway fans out to:
//!
//! | Service | Default URL | Calls |
//! |---------|-------------|-------|
//! | Safety score | `http://localhost:8001` | `POST /calculate` |
//! | Case report | `http://localhost:8002` | `POST /report` |
//! | Credential anchor | `http://localhost:4000` | `POST /anchor`, `POST /revoke`, `GET /status/{hash}`, `GET /logs` |
//!
//! Every call returns an outcome with a `success` flag. A failing service
//! degrades the response instead of failing the request that triggered it.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub mod blockchain;
pub mod case_report;
pub mod safety_score;

pub use blockchain::{
    ActivityCredential, AnchorLogEntry, AnchorOutcome, BlockchainClient, CredentialStatus,
    IncidentCredential, LogsOutcome, RevokeOutcome, VerifyOutcome,
};
pub use case_report::{CaseReportClient, ReportOutcome, ReportRequest};
pub use safety_score::SafetyScoreClient;

pub const DEFAULT_SAFETY_SCORE_URL: &str = "http://localhost:8001";
pub const DEFAULT_CASE_REPORT_URL: &str = "http://localhost:8002";
pub const DEFAULT_BLOCKCHAIN_URL: &str = "http://localhost:4000";

/// AI services may need to wake from sleep
pub const AI_TIMEOUT: Duration = Duration::from_secs(45);
pub const ANCHOR_TIMEOUT: Duration = Duration::from_secs(10);
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(5);
pub const BLOCKCHAIN_HEALTH_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request to {service} failed: {source}")]
    Request {
        service: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{service} returned status {status}")]
    Status { service: &'static str, status: u16 },
    #[error("Invalid response from {service}: {reason}")]
    InvalidResponse {
        service: &'static str,
        reason: String,
    },
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;

/// Base URLs of the external services
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEndpoints {
    pub safety_score_url: String,
    pub case_report_url: String,
    pub blockchain_url: String,
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            safety_score_url: DEFAULT_SAFETY_SCORE_URL.to_string(),
            case_report_url: DEFAULT_CASE_REPORT_URL.to_string(),
            blockchain_url: DEFAULT_BLOCKCHAIN_URL.to_string(),
        }
    }
}

/// All external clients sharing one connection pool
#[derive(Debug, Clone)]
pub struct ServiceClients {
    pub safety_score: SafetyScoreClient,
    pub case_report: CaseReportClient,
    pub blockchain: BlockchainClient,
}

impl ServiceClients {
    pub fn new(endpoints: &ServiceEndpoints) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(ClientError::Build)?;

        Ok(Self {
            safety_score: SafetyScoreClient::new(client.clone(), &endpoints.safety_score_url),
            case_report: CaseReportClient::new(client.clone(), &endpoints.case_report_url),
            blockchain: BlockchainClient::new(client, &endpoints.blockchain_url),
        })
    }

    /// Probe every service concurrently
    pub async fn health(&self) -> ServiceHealth {
        let (safety_score, case_report, blockchain) = futures::join!(
            self.safety_score.health(),
            self.case_report.health(),
            self.blockchain.health(),
        );

        ServiceHealth {
            safety_score,
            case_report,
            blockchain,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceHealth {
    pub safety_score: bool,
    pub case_report: bool,
    pub blockchain: bool,
}

pub(crate) fn trim_base(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}

pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    service: &'static str,
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::Status {
            service,
            status: status.as_u16(),
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ClientError::InvalidResponse {
            service,
            reason: e.to_string(),
        })
}

/// GET `{base}/` and report whether it answered 200
pub async fn probe(client: &reqwest::Client, base_url: &str, timeout: Duration) -> bool {
    let url = format!("{}/", trim_base(base_url));
    match client.get(&url).timeout(timeout).send().await {
        Ok(response) => response.status() == reqwest::StatusCode::OK,
        Err(e) => {
            debug!("Health probe {} failed: {}", url, e);
            false
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::Router;

    /// Serve `router` on an ephemeral local port and return its base URL
    pub async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// Base URL nothing listens on
    pub async fn dead_url() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::get, Router};

    #[test]
    fn test_default_endpoints() {
        let endpoints = ServiceEndpoints::default();
        assert_eq!(endpoints.safety_score_url, "http://localhost:8001");
        assert_eq!(endpoints.case_report_url, "http://localhost:8002");
        assert_eq!(endpoints.blockchain_url, "http://localhost:4000");
    }

    #[test]
    fn test_trim_base() {
        assert_eq!(trim_base("http://ai:8001/"), "http://ai:8001");
        assert_eq!(trim_base("http://ai:8001"), "http://ai:8001");
    }

    #[tokio::test]
    async fn test_probe() {
        let up = test_support::spawn(Router::new().route("/", get(|| async { "ok" }))).await;
        let down = test_support::dead_url().await;
        let client = reqwest::Client::new();

        assert!(probe(&client, &up, QUERY_TIMEOUT).await);
        assert!(!probe(&client, &down, QUERY_TIMEOUT).await);
    }

    #[tokio::test]
    async fn test_health_all_down() {
        let down = test_support::dead_url().await;
        let clients = ServiceClients::new(&ServiceEndpoints {
            safety_score_url: down.clone(),
            case_report_url: down.clone(),
            blockchain_url: down,
        })
        .unwrap();

        let health = clients.health().await;
        assert!(!health.safety_score && !health.case_report && !health.blockchain);
    }
}
