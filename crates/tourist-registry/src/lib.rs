//! Tourist Registry
//!
//! In-memory records for tracked tourists and reported incidents,
//! with id assignment, status transitions and dashboard statistics.

use thiserror::Error;

pub mod incident;
pub mod tourist;

pub use incident::{
    Incident, IncidentFilter, IncidentKind, IncidentPatch, IncidentRegistry, IncidentStats,
    IncidentStatus, NewIncident, PanicReport, Severity,
};
pub use tourist::{EmergencyContact, NewTourist, Tourist, TouristRegistry, TouristSummary};

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Tourist not found: {0}")]
    TouristNotFound(String),
    #[error("Incident not found: {0}")]
    IncidentNotFound(String),
    #[error("Duplicate id: {0}")]
    DuplicateId(String),
    #[error("Invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl RegistryError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
