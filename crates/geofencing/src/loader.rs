//! Geofence loading from JSON files

use crate::{GeofenceDraft, GeofenceRegistry, Result};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

/// Load geofences from a JSON array of drafts.
///
/// Entries that fail to parse or validate are skipped.
pub fn load_geofences(path: impl AsRef<Path>) -> Result<GeofenceRegistry> {
    let path = path.as_ref();
    info!("Loading geofences from {:?}", path);

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let raw: Vec<serde_json::Value> = serde_json::from_reader(reader)?;

    Ok(drafts_into_registry(raw))
}

/// Build a registry from untyped draft values, skipping bad entries
pub fn drafts_into_registry(raw: Vec<serde_json::Value>) -> GeofenceRegistry {
    let mut registry = GeofenceRegistry::new();
    let mut skipped = 0;

    for (i, value) in raw.into_iter().enumerate() {
        let draft: GeofenceDraft = match serde_json::from_value(value) {
            Ok(d) => d,
            Err(e) => {
                warn!("Skipping geofence #{}: {}", i, e);
                skipped += 1;
                continue;
            }
        };

        if let Err(e) = registry.create(draft) {
            warn!("Skipping geofence #{}: {}", i, e);
            skipped += 1;
        }
    }

    info!("Loaded {} geofences ({} skipped)", registry.len(), skipped);

    registry
}
