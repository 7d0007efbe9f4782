//! Case report service client
//!
//! The report service takes its fields as query parameters; the same fields
//! are also sent as a JSON body for deployments that read the body instead.

use crate::{probe, read_json, trim_base, ClientError, Result, AI_TIMEOUT};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

const SERVICE: &str = "case-report";

pub const DEFAULT_ALERT: &str = "Incident";
pub const DEFAULT_LAST_LOCATION: &str = "Unknown";

/// Report request as sent by the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    #[serde(default)]
    pub tourist_id: Option<String>,
    /// Incident type, used as the alert line; the dashboard form sends `alert`
    #[serde(default, rename = "type", alias = "alert")]
    pub alert: Option<String>,
    #[serde(default, rename = "location")]
    pub last_location: Option<String>,
}

#[derive(Debug, Serialize)]
struct ReportParams<'a> {
    tourist_id: &'a str,
    alert: &'a str,
    last_location: &'a str,
}

impl ReportRequest {
    fn params(&self) -> ReportParams<'_> {
        ReportParams {
            tourist_id: self.tourist_id.as_deref().unwrap_or_default(),
            alert: non_empty(self.alert.as_deref()).unwrap_or(DEFAULT_ALERT),
            last_location: non_empty(self.last_location.as_deref())
                .unwrap_or(DEFAULT_LAST_LOCATION),
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Deserialize)]
struct ReportResponse {
    status: String,
    file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ReportOutcome {
    fn failed(error: &ClientError) -> Self {
        Self {
            success: false,
            status: None,
            filename: None,
            report_id: None,
            error: Some(error.to_string()),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CaseReportClient {
    client: reqwest::Client,
    base_url: String,
}

impl CaseReportClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
        }
    }

    pub async fn generate(&self, request: &ReportRequest) -> ReportOutcome {
        match self.request_report(request).await {
            Ok(response) => {
                let now = Utc::now();
                info!("Case report generated: {}", response.file);
                ReportOutcome {
                    success: true,
                    status: Some(response.status),
                    filename: Some(response.file),
                    report_id: Some(format!("report_{}", now.timestamp_millis())),
                    error: None,
                    timestamp: now,
                }
            }
            Err(e) => {
                warn!("Case report service error: {}", e);
                ReportOutcome::failed(&e)
            }
        }
    }

    async fn request_report(&self, request: &ReportRequest) -> Result<ReportResponse> {
        let params = request.params();
        let response = self
            .client
            .post(format!("{}/report", self.base_url))
            .timeout(AI_TIMEOUT)
            .query(&params)
            .json(&params)
            .send()
            .await
            .map_err(|source| ClientError::Request {
                service: SERVICE,
                source,
            })?;

        read_json(SERVICE, response).await
    }

    pub async fn health(&self) -> bool {
        probe(&self.client, &self.base_url, AI_TIMEOUT).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{dead_url, spawn};
    use axum::{extract::Query, http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    #[test]
    fn test_params_defaults() {
        let request: ReportRequest = serde_json::from_str(r#"{"touristId": "T-002"}"#).unwrap();
        let params = request.params();
        assert_eq!(params.tourist_id, "T-002");
        assert_eq!(params.alert, DEFAULT_ALERT);
        assert_eq!(params.last_location, DEFAULT_LAST_LOCATION);

        let request: ReportRequest = serde_json::from_str(
            r#"{"touristId": "T-002", "type": "Theft", "location": "Connaught Place"}"#,
        )
        .unwrap();
        let params = request.params();
        assert_eq!(params.alert, "Theft");
        assert_eq!(params.last_location, "Connaught Place");

        let request: ReportRequest = serde_json::from_str(
            r#"{"touristId": "T-001", "alert": "Lost passport", "location": "Red Fort"}"#,
        )
        .unwrap();
        let params = request.params();
        assert_eq!(params.alert, "Lost passport");
        assert_eq!(params.last_location, "Red Fort");
    }

    #[tokio::test]
    async fn test_generate() {
        let router = Router::new().route(
            "/report",
            post(|Query(query): Query<HashMap<String, String>>| async move {
                let alert = query.get("alert").cloned().unwrap_or_default();
                Json(json!({ "status": "success", "file": format!("report_{}.pdf", alert) }))
            }),
        );
        let url = spawn(router).await;
        let client = CaseReportClient::new(reqwest::Client::new(), &url);

        let outcome = client
            .generate(&ReportRequest {
                tourist_id: Some("T-001".to_string()),
                alert: Some("Theft".to_string()),
                last_location: None,
            })
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.status.as_deref(), Some("success"));
        assert_eq!(outcome.filename.as_deref(), Some("report_Theft.pdf"));
        assert!(outcome.report_id.unwrap().starts_with("report_"));
    }

    #[tokio::test]
    async fn test_generate_failures() {
        let router = Router::new().route(
            "/report",
            post(|| async { (StatusCode::UNPROCESSABLE_ENTITY, Json(Value::Null)) }),
        );
        let url = spawn(router).await;
        let client = CaseReportClient::new(reqwest::Client::new(), &url);

        let outcome = client.generate(&ReportRequest::default()).await;
        assert!(!outcome.success);
        assert!(outcome.error.unwrap().contains("422"));

        let client = CaseReportClient::new(reqwest::Client::new(), &dead_url().await);
        let outcome = client.generate(&ReportRequest::default()).await;
        assert!(!outcome.success);
        assert!(outcome.report_id.is_none());
    }
}
