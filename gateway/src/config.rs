//! Gateway configuration from environment variables

use service_clients::ServiceEndpoints;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_ALERT_LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct GatewayConfig {
    pub port: u16,
    pub endpoints: ServiceEndpoints,
    /// JSON seed file loaded at start-up
    pub seed_path: Option<PathBuf>,
    pub alert_log_capacity: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            endpoints: ServiceEndpoints::default(),
            seed_path: None,
            alert_log_capacity: DEFAULT_ALERT_LOG_CAPACITY,
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values keep defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = var("TRAVIRA_GATEWAY_PORT")
            .or_else(|| var("PORT"))
            .and_then(|p| match p.trim().parse() {
                Ok(port) => Some(port),
                Err(_) => {
                    tracing::warn!("Ignoring invalid port {:?}", p);
                    None
                }
            })
            .unwrap_or(defaults.port);

        let endpoints = ServiceEndpoints {
            safety_score_url: var("AI_SAFETY_SCORE_URL")
                .unwrap_or(defaults.endpoints.safety_score_url),
            case_report_url: var("AI_CASE_REPORT_URL")
                .unwrap_or(defaults.endpoints.case_report_url),
            blockchain_url: var("BLOCKCHAIN_API_URL").unwrap_or(defaults.endpoints.blockchain_url),
        };

        let alert_log_capacity = var("TRAVIRA_ALERT_LOG_CAPACITY")
            .and_then(|c| c.trim().parse().ok())
            .filter(|c: &usize| *c > 0)
            .unwrap_or(defaults.alert_log_capacity);

        Self {
            port,
            endpoints,
            seed_path: var("TRAVIRA_SEED_PATH").map(PathBuf::from),
            alert_log_capacity,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}
