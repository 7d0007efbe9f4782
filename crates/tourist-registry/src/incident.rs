//! Incident records

use crate::{RegistryError, Result};
use chrono::{DateTime, Datelike, Utc};
use geofencing::GeoPoint;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Officer assigned to panic incidents
pub const EMERGENCY_RESPONSE_TEAM: &str = "Emergency Response Team";

/// Description used when a panic report carries no message
pub const DEFAULT_PANIC_MESSAGE: &str = "Panic button activated - Emergency assistance required!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncidentKind {
    #[serde(rename = "Medical Emergency")]
    MedicalEmergency,
    #[serde(rename = "Lost Tourist")]
    LostTourist,
    #[serde(rename = "Emergency Alert")]
    EmergencyAlert,
    #[serde(rename = "Security Threat")]
    SecurityThreat,
    #[serde(rename = "Natural Disaster")]
    NaturalDisaster,
    Accident,
    Theft,
    Other,
}

impl IncidentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MedicalEmergency => "Medical Emergency",
            Self::LostTourist => "Lost Tourist",
            Self::EmergencyAlert => "Emergency Alert",
            Self::SecurityThreat => "Security Threat",
            Self::NaturalDisaster => "Natural Disaster",
            Self::Accident => "Accident",
            Self::Theft => "Theft",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn is_high(&self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IncidentStatus {
    #[default]
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
    Closed,
    Monitoring,
}

impl IncidentStatus {
    /// Open or In Progress
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::Open | Self::InProgress)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved | Self::Closed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub incident_id: String,
    #[serde(rename = "type")]
    pub kind: IncidentKind,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<GeoPoint>,
    pub severity: Severity,
    pub status: IncidentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tourist_id: Option<String>,
    /// Tourist display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tourist: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_officer: Option<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    /// Reported response time in minutes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    /// 1 = highest, 5 = lowest
    pub priority: u8,
    pub evidence_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blockchain_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Incident {
    /// Minutes between creation and resolution
    pub fn actual_response_minutes(&self) -> Option<i64> {
        self.resolved_at.map(|resolved| {
            let seconds = (resolved - self.created_at).num_seconds() as f64;
            (seconds / 60.0).round() as i64
        })
    }

    fn apply_status(&mut self, status: IncidentStatus, resolution: Option<String>) {
        self.status = status;
        if status.is_resolved() {
            self.resolved_at = Some(Utc::now());
            if resolution.is_some() {
                self.resolution = resolution;
            }
        }
    }
}

fn default_priority() -> u8 {
    3
}

fn validate_priority(priority: u8) -> Result<u8> {
    if (1..=5).contains(&priority) {
        Ok(priority)
    } else {
        Err(RegistryError::invalid(
            "priority",
            format!("must be between 1 and 5, got {}", priority),
        ))
    }
}

/// Incident report input
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIncident {
    #[serde(default)]
    pub incident_id: Option<String>,
    #[serde(rename = "type")]
    pub kind: IncidentKind,
    pub location: String,
    #[serde(default)]
    pub coordinates: Option<GeoPoint>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub status: Option<IncidentStatus>,
    #[serde(default)]
    pub tourist_id: Option<String>,
    #[serde(default)]
    pub tourist: Option<String>,
    #[serde(default)]
    pub assigned_officer: Option<String>,
    pub description: String,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub evidence_urls: Vec<String>,
}

impl NewIncident {
    pub fn new(kind: IncidentKind, location: &str, description: &str) -> Self {
        Self {
            incident_id: None,
            kind,
            location: location.to_string(),
            coordinates: None,
            severity: None,
            status: None,
            tourist_id: None,
            tourist: None,
            assigned_officer: None,
            description: description.to_string(),
            priority: default_priority(),
            evidence_urls: Vec::new(),
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_tourist(mut self, tourist_id: &str, name: &str) -> Self {
        self.tourist_id = Some(tourist_id.to_string());
        self.tourist = Some(name.to_string());
        self
    }
}

/// Panic button submission
#[derive(Debug, Clone, Default)]
pub struct PanicReport {
    pub tourist_id: String,
    pub tourist_name: String,
    pub coordinates: Option<GeoPoint>,
    pub message: Option<String>,
}

/// Partial incident update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentPatch {
    #[serde(default, rename = "type")]
    pub kind: Option<IncidentKind>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub coordinates: Option<GeoPoint>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub status: Option<IncidentStatus>,
    #[serde(default)]
    pub tourist_id: Option<String>,
    #[serde(default)]
    pub tourist: Option<String>,
    #[serde(default)]
    pub assigned_officer: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub response_time: Option<u32>,
    #[serde(default)]
    pub priority: Option<u8>,
    #[serde(default)]
    pub evidence_urls: Option<Vec<String>>,
}

/// List filter; `None` matches everything
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IncidentFilter {
    pub status: Option<IncidentStatus>,
    pub severity: Option<Severity>,
}

impl IncidentFilter {
    /// Parse dashboard query values; empty or `"all"` disables a filter
    pub fn from_query(status: Option<&str>, severity: Option<&str>) -> Result<Self> {
        Ok(Self {
            status: parse_filter_value(status, "status")?,
            severity: parse_filter_value(severity, "severity")?,
        })
    }

    fn matches(&self, incident: &Incident) -> bool {
        self.status.map_or(true, |s| incident.status == s)
            && self.severity.map_or(true, |s| incident.severity == s)
    }
}

fn parse_filter_value<T: serde::de::DeserializeOwned>(
    value: Option<&str>,
    field: &'static str,
) -> Result<Option<T>> {
    match value.map(str::trim) {
        None | Some("") | Some("all") => Ok(None),
        Some(raw) => serde_json::from_value(serde_json::Value::String(raw.to_string()))
            .map(Some)
            .map_err(|_| RegistryError::invalid(field, format!("unknown value '{}'", raw))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentStats {
    pub total: usize,
    /// Open or In Progress
    pub open: usize,
    /// Resolved or Closed
    pub resolved: usize,
    pub high_severity: usize,
}

#[derive(Debug, Default)]
pub struct IncidentRegistry {
    incidents: Vec<Incident>,
}

impl IncidentRegistry {
    pub fn new() -> Self {
        Self {
            incidents: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.incidents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.incidents.is_empty()
    }

    fn contains_id(&self, id: &str) -> bool {
        self.incidents.iter().any(|i| i.incident_id == id)
    }

    /// Next free `INC-{year}-nnn` id, starting from count + 1
    fn next_id(&self, year: i32) -> String {
        let mut n = self.incidents.len() + 1;
        loop {
            let id = format!("INC-{}-{:03}", year, n);
            if !self.contains_id(&id) {
                return id;
            }
            n += 1;
        }
    }

    /// Record a new incident
    pub fn create(&mut self, new: NewIncident) -> Result<Incident> {
        if new.description.trim().is_empty() {
            return Err(RegistryError::invalid("description", "must not be empty"));
        }
        if new.location.trim().is_empty() {
            return Err(RegistryError::invalid("location", "must not be empty"));
        }
        let priority = validate_priority(new.priority)?;

        let now = Utc::now();
        let incident_id = match new.incident_id {
            Some(id) if self.contains_id(&id) => return Err(RegistryError::DuplicateId(id)),
            Some(id) => id,
            None => self.next_id(now.year()),
        };

        let status = new.status.unwrap_or_default();
        let incident = Incident {
            incident_id,
            kind: new.kind,
            location: new.location,
            coordinates: new.coordinates,
            severity: new.severity.unwrap_or_default(),
            status,
            tourist_id: new.tourist_id,
            tourist: new.tourist,
            assigned_officer: new.assigned_officer,
            description: new.description,
            resolution: None,
            response_time: None,
            resolved_at: status.is_resolved().then_some(now),
            priority,
            evidence_urls: new.evidence_urls,
            blockchain_hash: None,
            created_at: now,
            updated_at: now,
        };

        info!(
            "Incident {} created: {} at {} ({:?})",
            incident.incident_id,
            incident.kind.as_str(),
            incident.location,
            incident.severity
        );
        self.incidents.push(incident.clone());
        Ok(incident)
    }

    /// Record a panic-button emergency
    pub fn create_panic(&mut self, report: PanicReport) -> Result<Incident> {
        let now = Utc::now();
        let mut millis = now.timestamp_millis();
        let mut incident_id = format!("PANIC-{}", millis);
        while self.contains_id(&incident_id) {
            millis += 1;
            incident_id = format!("PANIC-{}", millis);
        }

        let location = match report.coordinates {
            Some(p) => format!("{:.4}, {:.4}", p.lat, p.lng),
            None => "Unknown Location".to_string(),
        };

        let description = report
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_PANIC_MESSAGE.to_string());

        let mut new = NewIncident::new(IncidentKind::EmergencyAlert, &location, &description)
            .with_severity(Severity::High)
            .with_tourist(&report.tourist_id, &report.tourist_name);
        new.incident_id = Some(incident_id);
        new.coordinates = report.coordinates;
        new.assigned_officer = Some(EMERGENCY_RESPONSE_TEAM.to_string());

        self.create(new)
    }

    pub fn get(&self, incident_id: &str) -> Result<&Incident> {
        self.incidents
            .iter()
            .find(|i| i.incident_id == incident_id)
            .ok_or_else(|| RegistryError::IncidentNotFound(incident_id.to_string()))
    }

    fn get_mut(&mut self, incident_id: &str) -> Result<&mut Incident> {
        self.incidents
            .iter_mut()
            .find(|i| i.incident_id == incident_id)
            .ok_or_else(|| RegistryError::IncidentNotFound(incident_id.to_string()))
    }

    /// Apply a partial update
    pub fn update(&mut self, incident_id: &str, patch: IncidentPatch) -> Result<&Incident> {
        let priority = patch.priority.map(validate_priority).transpose()?;
        if patch.description.as_deref().is_some_and(|d| d.trim().is_empty()) {
            return Err(RegistryError::invalid("description", "must not be empty"));
        }

        let incident = self.get_mut(incident_id)?;

        if let Some(kind) = patch.kind {
            incident.kind = kind;
        }
        if let Some(location) = patch.location {
            incident.location = location;
        }
        if patch.coordinates.is_some() {
            incident.coordinates = patch.coordinates;
        }
        if let Some(severity) = patch.severity {
            incident.severity = severity;
        }
        if patch.tourist_id.is_some() {
            incident.tourist_id = patch.tourist_id;
        }
        if patch.tourist.is_some() {
            incident.tourist = patch.tourist;
        }
        if patch.assigned_officer.is_some() {
            incident.assigned_officer = patch.assigned_officer;
        }
        if let Some(description) = patch.description {
            incident.description = description;
        }
        if patch.response_time.is_some() {
            incident.response_time = patch.response_time;
        }
        if let Some(priority) = priority {
            incident.priority = priority;
        }
        if let Some(urls) = patch.evidence_urls {
            incident.evidence_urls = urls;
        }

        match patch.status {
            Some(status) => incident.apply_status(status, patch.resolution),
            None if patch.resolution.is_some() => incident.resolution = patch.resolution,
            None => {}
        }

        incident.updated_at = Utc::now();
        debug!("Incident {} updated", incident.incident_id);
        Ok(incident)
    }

    /// Resolved and Closed stamp `resolved_at` and keep the resolution note
    pub fn update_status(
        &mut self,
        incident_id: &str,
        status: IncidentStatus,
        resolution: Option<String>,
    ) -> Result<&Incident> {
        let incident = self.get_mut(incident_id)?;
        incident.apply_status(status, resolution);
        incident.updated_at = Utc::now();
        Ok(incident)
    }

    /// Assigning an officer moves an Open incident to In Progress
    pub fn assign_officer(&mut self, incident_id: &str, officer: &str) -> Result<&Incident> {
        let incident = self.get_mut(incident_id)?;
        incident.assigned_officer = Some(officer.to_string());
        if incident.status == IncidentStatus::Open {
            incident.status = IncidentStatus::InProgress;
        }
        incident.updated_at = Utc::now();
        Ok(incident)
    }

    pub fn set_blockchain_hash(&mut self, incident_id: &str, hash: String) -> Result<&Incident> {
        let incident = self.get_mut(incident_id)?;
        incident.blockchain_hash = Some(hash);
        incident.updated_at = Utc::now();
        Ok(incident)
    }

    /// Incidents newest first; equal timestamps keep reverse insertion order
    fn newest_first(&self) -> Vec<&Incident> {
        let mut incidents: Vec<&Incident> = self.incidents.iter().rev().collect();
        incidents.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        incidents
    }

    pub fn list(&self, filter: &IncidentFilter) -> Vec<&Incident> {
        self.newest_first()
            .into_iter()
            .filter(|i| filter.matches(i))
            .collect()
    }

    /// Open, In Progress and Monitoring incidents
    pub fn open(&self) -> Vec<&Incident> {
        self.newest_first()
            .into_iter()
            .filter(|i| i.status.is_unresolved() || i.status == IncidentStatus::Monitoring)
            .collect()
    }

    /// Unresolved High and Critical incidents
    pub fn high_severity(&self) -> Vec<&Incident> {
        self.newest_first()
            .into_iter()
            .filter(|i| i.severity.is_high() && i.status.is_unresolved())
            .collect()
    }

    pub fn recent(&self, limit: usize) -> Vec<&Incident> {
        self.newest_first().into_iter().take(limit).collect()
    }

    pub fn stats(&self) -> IncidentStats {
        IncidentStats {
            total: self.incidents.len(),
            open: self.incidents.iter().filter(|i| i.status.is_unresolved()).count(),
            resolved: self.incidents.iter().filter(|i| i.status.is_resolved()).count(),
            high_severity: self.incidents.iter().filter(|i| i.severity.is_high()).count(),
        }
    }
}
