//! Geofence registry, violation checks and alert generation

use crate::{
    GeoPoint, Geofence, GeofenceDraft, GeofenceError, GeofenceKind, Geometry, Result,
    MAX_RISK_LEVEL,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// A restricted fence the tourist is currently inside
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub geofence_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: GeofenceKind,
    pub risk_level: u8,
    pub alert_enabled: bool,
}

impl From<&Geofence> for Violation {
    fn from(fence: &Geofence) -> Self {
        Self {
            geofence_id: fence.id.clone(),
            name: fence.name.clone(),
            kind: fence.kind,
            risk_level: fence.risk_level,
            alert_enabled: fence.alert_enabled,
        }
    }
}

/// Result of checking one position against all active fences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceCheck {
    pub has_violations: bool,
    pub violations: Vec<Violation>,
    /// Sum of violated risk levels, capped at 10
    pub risk_score: u8,
    pub safe_zones: Vec<Geofence>,
    pub timestamp: DateTime<Utc>,
}

/// In-memory geofence store
#[derive(Debug, Default)]
pub struct GeofenceRegistry {
    fences: Vec<Geofence>,
}

impl GeofenceRegistry {
    pub fn new() -> Self {
        Self { fences: Vec::new() }
    }

    /// Validate a draft and store it
    pub fn create(&mut self, draft: GeofenceDraft) -> Result<Geofence> {
        let fence = draft.into_geofence()?;
        info!(
            "Created geofence {} ({}, risk {})",
            fence.name, fence.kind, fence.risk_level
        );
        self.fences.push(fence.clone());
        Ok(fence)
    }

    pub fn get(&self, id: &str) -> Result<&Geofence> {
        self.fences
            .iter()
            .find(|f| f.id == id)
            .ok_or_else(|| GeofenceError::NotFound(id.to_string()))
    }

    pub fn set_active(&mut self, id: &str, active: bool) -> Result<&Geofence> {
        let fence = self
            .fences
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| GeofenceError::NotFound(id.to_string()))?;

        fence.active = active;
        fence.updated_at = Utc::now();
        Ok(fence)
    }

    pub fn len(&self) -> usize {
        self.fences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fences.is_empty()
    }

    pub fn active(&self) -> impl Iterator<Item = &Geofence> {
        self.fences.iter().filter(|f| f.active)
    }

    /// Active restricted-area and high-risk fences
    pub fn restricted_areas(&self) -> impl Iterator<Item = &Geofence> {
        self.active().filter(|f| f.kind.is_restricted())
    }

    /// Active fences containing `point`
    pub fn containing(&self, point: GeoPoint) -> Vec<&Geofence> {
        self.active().filter(|f| f.contains(point)).collect()
    }

    /// Check a position against every active fence
    pub fn check_violations(&self, point: GeoPoint) -> Result<GeofenceCheck> {
        point.validate()?;

        let containing = self.containing(point);

        let violations: Vec<Violation> = containing
            .iter()
            .filter(|f| f.kind.is_restricted())
            .map(|f| Violation::from(*f))
            .collect();

        let summed: u32 = violations.iter().map(|v| u32::from(v.risk_level)).sum();
        let risk_score = summed.min(u32::from(MAX_RISK_LEVEL)) as u8;

        let safe_zones: Vec<Geofence> = containing
            .iter()
            .filter(|f| f.kind == GeofenceKind::SafeZone)
            .map(|f| (*f).clone())
            .collect();

        debug!(
            "Geofence check at ({:.5}, {:.5}): {} containing, {} violations, risk {}",
            point.lat,
            point.lng,
            containing.len(),
            violations.len(),
            risk_score
        );

        Ok(GeofenceCheck {
            has_violations: !violations.is_empty(),
            violations,
            risk_score,
            safe_zones,
            timestamp: Utc::now(),
        })
    }
}

impl FromIterator<Geofence> for GeofenceRegistry {
    fn from_iter<I: IntoIterator<Item = Geofence>>(iter: I) -> Self {
        Self {
            fences: iter.into_iter().collect(),
        }
    }
}

/// Risk multiplier fed to safety scoring (1 when nothing is violated)
pub fn risk_multiplier(violations: &[Violation]) -> u8 {
    violations
        .iter()
        .map(|v| v.risk_level)
        .max()
        .map(|max| max.min(MAX_RISK_LEVEL))
        .unwrap_or(1)
}

/// An alert goes out when any violated fence has alerts enabled
pub fn should_send_alert(violations: &[Violation]) -> bool {
    violations.iter().any(|v| v.alert_enabled)
}

/// Operator-facing alert line for the first violation
pub fn alert_message(tourist_id: &str, violations: &[Violation]) -> String {
    match violations.first() {
        Some(fence) => format!(
            "ALERT: Tourist {} has entered {} ({}). Risk Level: {}/10",
            tourist_id, fence.name, fence.kind, fence.risk_level
        ),
        None => String::new(),
    }
}

/// Export fences as a GeoJSON FeatureCollection
pub fn to_geojson<'a>(fences: impl IntoIterator<Item = &'a Geofence>) -> serde_json::Value {
    let features: Vec<serde_json::Value> = fences
        .into_iter()
        .map(|f| {
            let (geometry, radius_m) = match &f.geometry {
                Geometry::Point { coordinates, radius } => (
                    serde_json::json!({ "type": "Point", "coordinates": coordinates }),
                    Some(*radius),
                ),
                Geometry::Polygon { coordinates } => (
                    serde_json::json!({ "type": "Polygon", "coordinates": coordinates }),
                    None,
                ),
            };

            serde_json::json!({
                "type": "Feature",
                "id": f.id,
                "geometry": geometry,
                "properties": {
                    "name": f.name,
                    "type": f.kind.as_str(),
                    "riskLevel": f.risk_level,
                    "active": f.active,
                    "alertEnabled": f.alert_enabled,
                    "radius_m": radius_m
                }
            })
        })
        .collect();

    serde_json::json!({
        "type": "FeatureCollection",
        "features": features
    })
}
