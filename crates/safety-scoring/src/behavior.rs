//! Heuristic behaviour analysis

use crate::{TouristStatus, CRITICAL_SCORE};
use serde::{Deserialize, Serialize};

/// Anomaly points added for a score below the critical threshold
const LOW_SCORE_ANOMALY: u32 = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehaviorAnalysis {
    pub movement_pattern: String,
    pub risk_indicators: Vec<String>,
    pub anomaly_score: u32,
    pub recommendations: Vec<String>,
}

pub fn analyze_behavior(safety_score: f64, status: TouristStatus) -> BehaviorAnalysis {
    let mut analysis = BehaviorAnalysis {
        movement_pattern: "normal".to_string(),
        risk_indicators: Vec::new(),
        anomaly_score: 0,
        recommendations: Vec::new(),
    };

    if safety_score < CRITICAL_SCORE {
        analysis.risk_indicators.push("Low safety score".to_string());
        analysis.anomaly_score += LOW_SCORE_ANOMALY;
    }

    if status == TouristStatus::HighRisk {
        analysis.risk_indicators.push("High-risk status".to_string());
        analysis
            .recommendations
            .push("Immediate officer check-in recommended".to_string());
    }

    analysis
}
