//! Immutable input snapshot and where it comes from.

use crate::error::{PlanError, PlanResult};
use crate::models::{Drone, DroneForServicePoint, DroneServicePoint, Region};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

pub const DRONES_FILE: &str = "drones.json";
pub const ROSTERS_FILE: &str = "drones-for-service-points.json";
pub const SERVICE_POINTS_FILE: &str = "service-points.json";
pub const REGIONS_FILE: &str = "restricted-areas.json";

/// Everything a planning call reads, fetched once and passed in whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub drones: Vec<Drone>,
    pub drones_for_service_points: Vec<DroneForServicePoint>,
    pub service_points: Vec<DroneServicePoint>,
    pub restricted_regions: Vec<Region>,
}

impl Snapshot {
    /// Validate regions and coordinates.
    /// Returns list of validation errors (empty = valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors: Vec<String> = self
            .restricted_regions
            .iter()
            .flat_map(|region| region.validate())
            .collect();

        for service_point in &self.service_points {
            if !service_point.location.is_valid() {
                errors.push(format!(
                    "Service point {} location {} is out of range",
                    service_point.id, service_point.location
                ));
            }
        }

        errors
    }

    pub fn drones_by_id(&self) -> HashMap<&str, &Drone> {
        self.drones
            .iter()
            .map(|drone| (drone.id.as_str(), drone))
            .collect()
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.restricted_regions.iter().find(|region| region.name == name)
    }
}

/// Source of planning snapshots.
pub trait SnapshotProvider {
    fn snapshot(&self) -> PlanResult<Snapshot>;
}

impl SnapshotProvider for Snapshot {
    fn snapshot(&self) -> PlanResult<Snapshot> {
        Ok(self.clone())
    }
}

/// Reads the four snapshot lists from JSON files in one directory.
#[derive(Debug, Clone)]
pub struct JsonDirSnapshot {
    dir: PathBuf,
}

impl JsonDirSnapshot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn read<T: DeserializeOwned>(&self, file: &str) -> PlanResult<T> {
        let path = self.dir.join(file);
        let raw = fs::read_to_string(&path)
            .map_err(|e| PlanError::Snapshot(format!("{}: {}", path.display(), e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| PlanError::Snapshot(format!("{}: {}", path.display(), e)))
    }
}

impl SnapshotProvider for JsonDirSnapshot {
    fn snapshot(&self) -> PlanResult<Snapshot> {
        let snapshot = Snapshot {
            drones: self.read(DRONES_FILE)?,
            drones_for_service_points: self.read(ROSTERS_FILE)?,
            service_points: self.read(SERVICE_POINTS_FILE)?,
            restricted_regions: self.read(REGIONS_FILE)?,
        };
        tracing::debug!(
            "Loaded snapshot from {}: {} drones, {} service points, {} regions",
            self.dir.display(),
            snapshot.drones.len(),
            snapshot.service_points.len(),
            snapshot.restricted_regions.len()
        );
        Ok(snapshot)
    }
}
