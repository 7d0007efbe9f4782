//! Start-up seed data
//!
//! The seed file is a JSON object with optional `geofences`, `tourists` and
//! `incidents` arrays. Entries that fail to parse or validate are skipped.

use geofencing::loader::drafts_into_registry;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use thiserror::Error;
use tourist_registry::{NewIncident, NewTourist};
use tracing::{info, warn};

use crate::state::Store;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid seed file: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub geofences: Vec<serde_json::Value>,
    #[serde(default)]
    pub tourists: Vec<serde_json::Value>,
    #[serde(default)]
    pub incidents: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    pub geofences: usize,
    pub tourists: usize,
    pub incidents: usize,
    pub skipped: usize,
}

pub fn load_seed(path: impl AsRef<Path>) -> Result<SeedData, SeedError> {
    let path = path.as_ref();
    info!("Loading seed data from {:?}", path);

    let file = File::open(path)?;
    Ok(serde_json::from_reader(BufReader::new(file))?)
}

/// Insert seed records into the store
pub fn apply_seed(store: &mut Store, seed: SeedData) -> SeedReport {
    let mut report = SeedReport::default();

    let fence_count = seed.geofences.len();
    let fences = drafts_into_registry(seed.geofences);
    report.geofences = fences.len();
    report.skipped += fence_count - fences.len();
    store.geofences = fences;

    for (i, value) in seed.tourists.into_iter().enumerate() {
        let result = serde_json::from_value::<NewTourist>(value)
            .map_err(|e| e.to_string())
            .and_then(|new| store.tourists.register(new).map_err(|e| e.to_string()));
        match result {
            Ok(_) => report.tourists += 1,
            Err(e) => {
                warn!("Skipping seed tourist #{}: {}", i, e);
                report.skipped += 1;
            }
        }
    }

    for (i, value) in seed.incidents.into_iter().enumerate() {
        let result = serde_json::from_value::<NewIncident>(value)
            .map_err(|e| e.to_string())
            .and_then(|new| store.incidents.create(new).map_err(|e| e.to_string()));
        match result {
            Ok(_) => report.incidents += 1,
            Err(e) => {
                warn!("Skipping seed incident #{}: {}", i, e);
                report.skipped += 1;
            }
        }
    }

    info!(
        "Seeded {} geofences, {} tourists, {} incidents ({} skipped)",
        report.geofences, report.tourists, report.incidents, report.skipped
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SEED: &str = r#"{
        "geofences": [
            {"name": "Restricted Military Area", "type": "restricted_area",
             "geometry": {"type": "Circle", "coordinates": [77.25, 28.66], "radius": 1000},
             "riskLevel": 9},
            {"name": "", "type": "safe_zone",
             "geometry": {"type": "Circle", "coordinates": [77.24, 28.65], "radius": 500}}
        ],
        "tourists": [
            {"touristId": "T-001", "userId": "tourist1", "name": "John Doe",
             "location": {"lat": 28.6139, "lng": 77.2090}, "safetyScore": 85, "status": "active"},
            {"touristId": "T-001", "name": "Duplicate", "location": {"lat": 1.0, "lng": 1.0}}
        ],
        "incidents": [
            {"incidentId": "INC-2024-001", "type": "Medical Emergency", "location": "Red Fort",
             "severity": "High", "status": "In Progress", "description": "Heat stroke"},
            {"type": "Unknown Kind", "location": "Nowhere", "description": "bad"}
        ]
    }"#;

    #[test]
    fn test_seed_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SEED.as_bytes()).unwrap();

        let seed = load_seed(file.path()).unwrap();
        let mut store = Store::default();
        let report = apply_seed(&mut store, seed);

        assert_eq!(
            report,
            SeedReport {
                geofences: 1,
                tourists: 1,
                incidents: 1,
                skipped: 3,
            }
        );
        assert!(store.tourists.find_by_user("tourist1").is_some());
        assert!(store.incidents.get("INC-2024-001").is_ok());
    }

    #[test]
    fn test_bundled_seed() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/seed.json");
        let mut store = Store::default();
        let report = apply_seed(&mut store, load_seed(path).unwrap());

        assert_eq!(report.geofences, 4);
        assert_eq!(report.tourists, 4);
        assert_eq!(report.incidents, 3);
        assert_eq!(report.skipped, 0);
        assert_eq!(store.geofences.restricted_areas().count(), 2);
    }

    #[test]
    fn test_missing_sections_default() {
        let seed: SeedData = serde_json::from_str("{}").unwrap();
        let report = apply_seed(&mut Store::default(), seed);
        assert_eq!(report, SeedReport::default());
    }

    #[test]
    fn test_unreadable_seed() {
        assert!(matches!(load_seed("/nonexistent/seed.json"), Err(SeedError::Io(_))));
    }
}
