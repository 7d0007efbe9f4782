//! Safety score service client

use crate::{probe, read_json, trim_base, ClientError, Result, AI_TIMEOUT};
use safety_scoring::{ScoreOutcome, ScoreRequest, ScorerConfig};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

const SERVICE: &str = "safety-score";

#[derive(Debug, Serialize)]
struct CalculateBody {
    telemetry: serde_json::Value,
    geofence_risk: f64,
    anomalies: u32,
}

#[derive(Debug, Deserialize)]
struct CalculateResponse {
    safety_score: f64,
}

#[derive(Debug, Clone)]
pub struct SafetyScoreClient {
    client: reqwest::Client,
    base_url: String,
    fallback: ScorerConfig,
}

impl SafetyScoreClient {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: trim_base(base_url),
            fallback: ScorerConfig::default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Score via the remote service, falling back to the local model on any failure
    pub async fn calculate(&self, request: &ScoreRequest) -> ScoreOutcome {
        match self.request_score(request).await {
            Ok(score) => {
                debug!("Remote safety score {:.1}", score);
                ScoreOutcome::remote(score, request)
            }
            Err(e) => {
                warn!("Safety score service error: {}", e);
                ScoreOutcome::fallback(request, &self.fallback)
            }
        }
    }

    async fn request_score(&self, request: &ScoreRequest) -> Result<f64> {
        let body = CalculateBody {
            telemetry: request.telemetry_or_empty(),
            geofence_risk: request.effective_risk(),
            anomalies: request.anomalies,
        };

        let response = self
            .client
            .post(format!("{}/calculate", self.base_url))
            .timeout(AI_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(|source| ClientError::Request {
                service: SERVICE,
                source,
            })?;

        let parsed: CalculateResponse = read_json(SERVICE, response).await?;
        if !parsed.safety_score.is_finite() {
            return Err(ClientError::InvalidResponse {
                service: SERVICE,
                reason: format!("non-finite safety_score {}", parsed.safety_score),
            });
        }
        Ok(parsed.safety_score)
    }

    pub async fn health(&self) -> bool {
        probe(&self.client, &self.base_url, AI_TIMEOUT).await
    }
}
