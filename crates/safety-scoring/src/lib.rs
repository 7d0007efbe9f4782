//! Safety Scoring Library
//!
//! Composes tourist safety scores from geofence risk and anomaly counts.
//!
//! # Fallback Model
//!
//! ```text
//! Score = clamp(100 - 5·R - 3·A, 0, 100)
//! ```
//!
//! | Factor | Penalty | Description |
//! |--------|---------|-------------|
//! | R      | 5       | Geofence risk multiplier (1-10) |
//! | A      | 3       | Detected movement anomalies |
//!
//! The remote scoring service is authoritative when reachable; the fallback
//! model is used only when it is not.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

pub mod behavior;

pub use behavior::{analyze_behavior, BehaviorAnalysis};

/// Base score before penalties
pub const BASE_SCORE: f64 = 100.0;

/// Penalty per unit of geofence risk
pub const RISK_PENALTY: f64 = 5.0;

/// Penalty per detected anomaly
pub const ANOMALY_PENALTY: f64 = 3.0;

/// Score given to newly tracked tourists
pub const DEFAULT_SAFETY_SCORE: f64 = 85.0;

/// Tourists below this score are counted as high risk in summaries
pub const HIGH_RISK_SCORE: f64 = 70.0;

/// Tourists below this score are moved to the high-risk status
pub const CRITICAL_SCORE: f64 = 50.0;

/// Error attached to outcomes computed without the scoring service
pub const FALLBACK_ERROR: &str = "AI service unavailable - using fallback calculation";

/// Tourist monitoring status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TouristStatus {
    #[default]
    Active,
    HighRisk,
    Emergency,
    Inactive,
}

impl TouristStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::HighRisk => "high-risk",
            Self::Emergency => "emergency",
            Self::Inactive => "inactive",
        }
    }
}

impl fmt::Display for TouristStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_geofence_risk() -> f64 {
    1.0
}

/// Scoring input as sent by the dashboard and the location pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreRequest {
    #[serde(default)]
    pub telemetry: serde_json::Value,
    #[serde(default = "default_geofence_risk")]
    pub geofence_risk: f64,
    #[serde(default)]
    pub anomalies: u32,
}

impl Default for ScoreRequest {
    fn default() -> Self {
        Self {
            telemetry: serde_json::Value::Null,
            geofence_risk: default_geofence_risk(),
            anomalies: 0,
        }
    }
}

impl ScoreRequest {
    pub fn new(geofence_risk: f64, anomalies: u32) -> Self {
        Self {
            geofence_risk,
            anomalies,
            ..Self::default()
        }
    }

    pub fn with_telemetry(mut self, telemetry: serde_json::Value) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Zero, negative or non-finite risk is treated as the neutral multiplier 1
    pub fn effective_risk(&self) -> f64 {
        if self.geofence_risk.is_finite() && self.geofence_risk > 0.0 {
            self.geofence_risk
        } else {
            1.0
        }
    }

    /// Telemetry object, `{}` when absent
    pub fn telemetry_or_empty(&self) -> serde_json::Value {
        if self.telemetry.is_null() {
            serde_json::json!({})
        } else {
            self.telemetry.clone()
        }
    }

    pub fn factors(&self) -> ScoreFactors {
        ScoreFactors {
            geofence_risk: self.effective_risk(),
            anomalies: self.anomalies,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreFactors {
    pub geofence_risk: f64,
    pub anomalies: u32,
}

/// Outcome of a scoring attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreOutcome {
    /// False when the score came from the fallback model
    pub success: bool,
    pub safety_score: f64,
    pub factors: ScoreFactors,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ScoreOutcome {
    /// Score returned by the scoring service
    pub fn remote(safety_score: f64, request: &ScoreRequest) -> Self {
        Self {
            success: true,
            safety_score: clamp_score(safety_score),
            factors: request.factors(),
            error: None,
            timestamp: Utc::now(),
        }
    }

    /// Score computed locally because the service was unreachable
    pub fn fallback(request: &ScoreRequest, config: &ScorerConfig) -> Self {
        Self {
            success: false,
            safety_score: fallback_score(request, config),
            factors: request.factors(),
            error: Some(FALLBACK_ERROR.to_string()),
            timestamp: Utc::now(),
        }
    }
}

/// Scorer configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ScorerConfig {
    /// Starting score before penalties
    pub base: f64,
    /// Penalty per unit of geofence risk
    pub risk_penalty: f64,
    /// Penalty per anomaly
    pub anomaly_penalty: f64,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            base: BASE_SCORE,
            risk_penalty: RISK_PENALTY,
            anomaly_penalty: ANOMALY_PENALTY,
        }
    }
}

/// Local score used when the scoring service cannot be reached
pub fn fallback_score(request: &ScoreRequest, config: &ScorerConfig) -> f64 {
    let risk = request.effective_risk();
    let raw = config.base
        - risk * config.risk_penalty
        - f64::from(request.anomalies) * config.anomaly_penalty;

    let score = clamp_score(raw);
    debug!(
        "Fallback score {:.1} (risk={:.1}, anomalies={})",
        score, risk, request.anomalies
    );
    score
}

/// Clamp to 0..=100; NaN maps to 0
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, BASE_SCORE)
}

/// Status implied by a new score.
///
/// Emergency and inactive tourists keep their status until an operator
/// changes it.
pub fn status_for_score(score: f64, current: TouristStatus) -> TouristStatus {
    match current {
        TouristStatus::Emergency | TouristStatus::Inactive => current,
        _ if score < CRITICAL_SCORE => TouristStatus::HighRisk,
        _ => TouristStatus::Active,
    }
}

/// Whether a tourist counts toward high-risk totals
pub fn is_high_risk(score: f64, status: TouristStatus) -> bool {
    score < HIGH_RISK_SCORE
        || matches!(status, TouristStatus::HighRisk | TouristStatus::Emergency)
}
