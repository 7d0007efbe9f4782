//! Tracked tourists

use crate::{RegistryError, Result};
use chrono::{DateTime, Utc};
use geofencing::GeoPoint;
use safety_scoring::{
    clamp_score, is_high_risk, status_for_score, TouristStatus, DEFAULT_SAFETY_SCORE,
    HIGH_RISK_SCORE,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmergencyContact {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tourist {
    pub tourist_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub name: String,
    pub location: GeoPoint,
    pub safety_score: f64,
    pub status: TouristStatus,
    pub last_updated: DateTime<Utc>,
    pub accuracy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<EmergencyContact>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Tourist registration input. Missing fields take tracking defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTourist {
    #[serde(default)]
    pub tourist_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    pub name: String,
    pub location: Option<GeoPoint>,
    #[serde(default)]
    pub safety_score: Option<f64>,
    #[serde(default)]
    pub status: Option<TouristStatus>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub emergency_contact: Option<EmergencyContact>,
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl NewTourist {
    pub fn tracked(user_id: &str, name: &str, location: GeoPoint) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            name: name.to_string(),
            location: Some(location),
            ..Self::default()
        }
    }
}

/// Dashboard roll-up across all tourists
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TouristSummary {
    pub total: usize,
    pub active: usize,
    /// Tourists scoring below 70
    pub high_risk: usize,
    /// Rounded mean score, 0 when no tourists are tracked
    pub average_safety_score: i64,
}

#[derive(Debug, Default)]
pub struct TouristRegistry {
    tourists: Vec<Tourist>,
}

impl TouristRegistry {
    pub fn new() -> Self {
        Self {
            tourists: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.tourists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tourists.is_empty()
    }

    /// Next free `T-nnn` id, starting from count + 1
    fn next_id(&self) -> String {
        let mut n = self.tourists.len() + 1;
        loop {
            let id = format!("T-{:03}", n);
            if !self.tourists.iter().any(|t| t.tourist_id == id) {
                return id;
            }
            n += 1;
        }
    }

    pub fn register(&mut self, new: NewTourist) -> Result<Tourist> {
        let name = new.name.trim().to_string();
        if name.is_empty() {
            return Err(RegistryError::invalid("name", "must not be empty"));
        }

        let location = new
            .location
            .ok_or_else(|| RegistryError::invalid("location", "is required"))?;
        if !location.is_valid() {
            return Err(RegistryError::invalid(
                "location",
                format!("({}, {}) is out of range", location.lat, location.lng),
            ));
        }

        let tourist_id = match new.tourist_id {
            Some(id) if self.tourists.iter().any(|t| t.tourist_id == id) => {
                return Err(RegistryError::DuplicateId(id));
            }
            Some(id) => id,
            None => self.next_id(),
        };

        let now = Utc::now();
        let tourist = Tourist {
            tourist_id,
            user_id: new.user_id,
            name,
            location,
            safety_score: clamp_score(new.safety_score.unwrap_or(DEFAULT_SAFETY_SCORE)),
            status: new.status.unwrap_or_default(),
            last_updated: new.last_updated.unwrap_or(now),
            accuracy: new.accuracy.unwrap_or(0.0),
            device_id: new.device_id,
            emergency_contact: new.emergency_contact,
            created_at: now,
            updated_at: now,
        };

        info!("Registered tourist {} ({})", tourist.tourist_id, tourist.name);
        self.tourists.push(tourist.clone());
        Ok(tourist)
    }

    pub fn get(&self, tourist_id: &str) -> Result<&Tourist> {
        self.tourists
            .iter()
            .find(|t| t.tourist_id == tourist_id)
            .ok_or_else(|| RegistryError::TouristNotFound(tourist_id.to_string()))
    }

    fn get_mut(&mut self, tourist_id: &str) -> Result<&mut Tourist> {
        self.tourists
            .iter_mut()
            .find(|t| t.tourist_id == tourist_id)
            .ok_or_else(|| RegistryError::TouristNotFound(tourist_id.to_string()))
    }

    pub fn find_by_user(&self, user_id: &str) -> Option<&Tourist> {
        self.tourists
            .iter()
            .find(|t| t.user_id.as_deref() == Some(user_id))
    }

    /// All tourists, most recently updated first
    pub fn list(&self) -> Vec<&Tourist> {
        let mut tourists: Vec<&Tourist> = self.tourists.iter().collect();
        tourists.sort_by(|a, b| b.last_updated.cmp(&a.last_updated));
        tourists
    }

    pub fn update_location(
        &mut self,
        tourist_id: &str,
        location: GeoPoint,
        accuracy: Option<f64>,
    ) -> Result<&Tourist> {
        if !location.is_valid() {
            return Err(RegistryError::invalid(
                "location",
                format!("({}, {}) is out of range", location.lat, location.lng),
            ));
        }

        let tourist = self.get_mut(tourist_id)?;
        let now = Utc::now();
        tourist.location = location;
        tourist.accuracy = accuracy.unwrap_or(0.0);
        tourist.last_updated = now;
        tourist.updated_at = now;

        debug!(
            "Tourist {} moved to ({:.5}, {:.5})",
            tourist.tourist_id, location.lat, location.lng
        );
        Ok(tourist)
    }

    /// Store a clamped score and derive the status from it
    pub fn update_safety_score(&mut self, tourist_id: &str, score: f64) -> Result<&Tourist> {
        let tourist = self.get_mut(tourist_id)?;
        tourist.safety_score = clamp_score(score);
        tourist.status = status_for_score(tourist.safety_score, tourist.status);
        tourist.updated_at = Utc::now();

        debug!(
            "Tourist {} score {:.1} -> {}",
            tourist.tourist_id, tourist.safety_score, tourist.status
        );
        Ok(tourist)
    }

    /// Panic button: emergency status and zero score
    pub fn mark_emergency(&mut self, tourist_id: &str) -> Result<&Tourist> {
        let tourist = self.get_mut(tourist_id)?;
        tourist.status = TouristStatus::Emergency;
        tourist.safety_score = 0.0;
        tourist.updated_at = Utc::now();

        info!("Tourist {} marked as emergency", tourist.tourist_id);
        Ok(tourist)
    }

    pub fn set_status(&mut self, tourist_id: &str, status: TouristStatus) -> Result<&Tourist> {
        let tourist = self.get_mut(tourist_id)?;
        tourist.status = status;
        tourist.updated_at = Utc::now();
        Ok(tourist)
    }

    pub fn high_risk(&self) -> Vec<&Tourist> {
        self.tourists
            .iter()
            .filter(|t| is_high_risk(t.safety_score, t.status))
            .collect()
    }

    pub fn active_count(&self) -> usize {
        self.tourists
            .iter()
            .filter(|t| t.status == TouristStatus::Active)
            .count()
    }

    pub fn summary(&self) -> TouristSummary {
        let total = self.tourists.len();
        let average_safety_score = if total > 0 {
            let sum: f64 = self.tourists.iter().map(|t| t.safety_score).sum();
            (sum / total as f64).round() as i64
        } else {
            0
        };

        TouristSummary {
            total,
            active: self.active_count(),
            high_risk: self
                .tourists
                .iter()
                .filter(|t| t.safety_score < HIGH_RISK_SCORE)
                .count(),
            average_safety_score,
        }
    }
}
