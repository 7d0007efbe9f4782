//! Geofencing Library
//!
//! Geofence geometry, point containment and violation checks for the
//! Travira tourist-safety platform.
//!
//! # Geometry
//!
//! | Type    | Shape | Containment |
//! |---------|-------|-------------|
//! | Point   | circle of `radius` metres around `[lng, lat]` | Haversine distance `<= radius` |
//! | Polygon | outer ring plus optional holes | even-odd ray cast |
//!
//! # Violations
//!
//! Only `restricted_area` and `high_risk` fences count as violations.
//! The summed risk of all violated fences is capped at [`MAX_RISK_LEVEL`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use thiserror::Error;

pub mod geometry;
pub mod loader;
pub mod registry;

pub use registry::{
    alert_message, risk_multiplier, should_send_alert, to_geojson, GeofenceCheck,
    GeofenceRegistry, Violation,
};

/// Mean Earth radius in metres
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Upper bound for fence risk levels and summed risk scores
pub const MAX_RISK_LEVEL: u8 = 10;

/// Risk level assigned when a draft does not carry one
pub const DEFAULT_RISK_LEVEL: u8 = 5;

#[derive(Error, Debug)]
pub enum GeofenceError {
    #[error("Invalid coordinate: lat={lat}, lng={lng}")]
    InvalidCoordinate { lat: f64, lng: f64 },
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),
    #[error("Risk level must be between 1 and 10, got {0}")]
    InvalidRiskLevel(u8),
    #[error("Geofence name must not be empty")]
    EmptyName,
    #[error("Geofence not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GeofenceError>;

/// A WGS84 position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Build from a GeoJSON `[lng, lat]` position
    pub fn from_position(position: [f64; 2]) -> Self {
        Self {
            lat: position[1],
            lng: position[0],
        }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    pub fn validate(&self) -> Result<()> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(GeofenceError::InvalidCoordinate {
                lat: self.lat,
                lng: self.lng,
            })
        }
    }
}

/// Geofence classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeofenceKind {
    SafeZone,
    RestrictedArea,
    HighRisk,
    TouristAttraction,
    EmergencyZone,
}

impl GeofenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SafeZone => "safe_zone",
            Self::RestrictedArea => "restricted_area",
            Self::HighRisk => "high_risk",
            Self::TouristAttraction => "tourist_attraction",
            Self::EmergencyZone => "emergency_zone",
        }
    }

    /// Whether entering a fence of this kind is a violation
    pub fn is_restricted(&self) -> bool {
        matches!(self, Self::RestrictedArea | Self::HighRisk)
    }
}

impl fmt::Display for GeofenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fence shape. Positions follow GeoJSON order: `[lng, lat]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    /// Circle around a centre point, radius in metres
    #[serde(alias = "Circle")]
    Point {
        coordinates: [f64; 2],
        #[serde(default)]
        radius: f64,
    },
    /// First ring is the boundary, later rings are holes
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OperatingHours {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operating_hours: Option<OperatingHours>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_occupancy: Option<u32>,
}

/// A stored geofence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Geofence {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: GeofenceKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub geometry: Geometry,
    pub risk_level: u8,
    pub active: bool,
    pub alert_enabled: bool,
    #[serde(default)]
    pub metadata: GeofenceMetadata,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Geofence {
    /// Inactive fences never contain anything
    pub fn contains(&self, point: GeoPoint) -> bool {
        self.active && self.geometry.contains(point)
    }
}

/// Geofence as submitted by an operator, before ids and defaults are applied
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceDraft {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: GeofenceKind,
    #[serde(default)]
    pub description: Option<String>,
    pub geometry: Geometry,
    #[serde(default)]
    pub risk_level: Option<u8>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub alert_enabled: Option<bool>,
    #[serde(default)]
    pub metadata: GeofenceMetadata,
}

impl GeofenceDraft {
    /// Circular fence with default risk and flags
    pub fn circle(name: &str, kind: GeofenceKind, center: GeoPoint, radius_m: f64) -> Self {
        Self {
            name: name.to_string(),
            kind,
            description: None,
            geometry: Geometry::Point {
                coordinates: [center.lng, center.lat],
                radius: radius_m,
            },
            risk_level: None,
            active: None,
            alert_enabled: None,
            metadata: GeofenceMetadata::default(),
        }
    }

    pub fn with_risk_level(mut self, risk_level: u8) -> Self {
        self.risk_level = Some(risk_level);
        self
    }

    pub fn with_alerts(mut self, enabled: bool) -> Self {
        self.alert_enabled = Some(enabled);
        self
    }

    /// Check the draft and turn it into a stored fence
    pub fn into_geofence(self) -> Result<Geofence> {
        if self.name.trim().is_empty() {
            return Err(GeofenceError::EmptyName);
        }

        let risk_level = self.risk_level.unwrap_or(DEFAULT_RISK_LEVEL);
        if !(1..=MAX_RISK_LEVEL).contains(&risk_level) {
            return Err(GeofenceError::InvalidRiskLevel(risk_level));
        }

        self.geometry.validate()?;

        let now = Utc::now();
        Ok(Geofence {
            id: uuid::Uuid::new_v4().to_string(),
            name: self.name.trim().to_string(),
            kind: self.kind,
            description: self.description,
            geometry: self.geometry,
            risk_level,
            active: self.active.unwrap_or(true),
            alert_enabled: self.alert_enabled.unwrap_or(true),
            metadata: self.metadata,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Haversine distance between two points in metres
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1_rad = a.lat * PI / 180.0;
    let lat2_rad = b.lat * PI / 180.0;
    let dlat = (b.lat - a.lat) * PI / 180.0;
    let dlng = (b.lng - a.lng) * PI / 180.0;

    let h = (dlat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (dlng / 2.0).sin().powi(2);
    // rounding can push h past 1 for near-antipodal points
    let h = h.min(1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}
