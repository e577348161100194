//! Core data models for medical-delivery planning.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Dispatch id used for the closing return-to-base leg and for service-point
/// route nodes.
pub const RETURN_LEG_ID: i32 = -1;

/// A 2D coordinate in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub lng: f64,
    pub lat: f64,
}

impl Position {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180].
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lng, self.lat)
    }
}

// ========== AIRSPACE ==========

/// A restricted-airspace polygon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub name: String,
    /// Closed ring - first vertex equals the last
    pub vertices: Vec<Position>,
}

impl Region {
    pub fn new(name: impl Into<String>, vertices: Vec<Position>) -> Self {
        Self {
            name: name.into(),
            vertices,
        }
    }

    /// Validate region shape.
    /// Returns list of validation errors (empty = valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.vertices.len() < 4 {
            errors.push(format!(
                "Region '{}' needs at least 4 vertices (closed triangle), got {}",
                self.name,
                self.vertices.len()
            ));
        }

        if let (Some(first), Some(last)) = (self.vertices.first(), self.vertices.last()) {
            if first != last {
                errors.push(format!("Region '{}' is not closed", self.name));
            }
        }

        if self.vertices.iter().any(|vertex| !vertex.is_valid()) {
            errors.push(format!("Region '{}' has out-of-range vertices", self.name));
        }

        errors
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }

    /// Consecutive vertex pairs forming the polygon boundary.
    pub fn edges(&self) -> impl Iterator<Item = (&Position, &Position)> {
        self.vertices.iter().zip(self.vertices.iter().skip(1))
    }
}

// ========== DRONES ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    #[serde(default)]
    pub cooling: bool,
    #[serde(default)]
    pub heating: bool,
    pub capacity: f64,
    pub max_moves: u32,
    pub cost_per_move: f64,
    pub cost_initial: f64,
    pub cost_final: f64,
}

impl Capabilities {
    /// Actual cost of a flight of `moves` steps.
    pub fn flight_cost(&self, moves: u32) -> f64 {
        self.cost_initial + self.cost_final + moves as f64 * self.cost_per_move
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drone {
    pub name: String,
    pub id: String,
    pub capability: Capabilities,
}

/// A drone home base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneServicePoint {
    pub name: String,
    pub id: i32,
    pub location: Position,
}

/// A recurring weekly window during which a drone is stationed and usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    /// Upper-case English day name, e.g. "MONDAY" (compared case-insensitively)
    pub day_of_week: String,
    pub from: NaiveTime,
    pub until: NaiveTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DroneAvailability {
    pub id: String,
    #[serde(default)]
    pub availability: Vec<Availability>,
}

/// Weekly roster of the drones stationed at one service point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroneForServicePoint {
    pub service_point_id: i32,
    #[serde(default)]
    pub drones: Vec<DroneAvailability>,
}

// ========== DISPATCH REQUESTS ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirements {
    pub capacity: f64,
    #[serde(default)]
    pub cooling: bool,
    #[serde(default)]
    pub heating: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cost: Option<f64>,
}

impl Requirements {
    pub fn thermal_need(&self) -> ThermalNeed {
        if self.cooling {
            ThermalNeed::Cooling
        } else if self.heating {
            ThermalNeed::Heating
        } else {
            ThermalNeed::Neutral
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThermalNeed {
    Cooling,
    Heating,
    Neutral,
}

/// One medicine delivery request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedDispatchRec {
    pub id: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
    pub requirements: Requirements,
    pub delivery: Position,
}

impl MedDispatchRec {
    /// Validate a single dispatch.
    /// Returns list of validation errors (empty = valid).
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let req = &self.requirements;

        if req.cooling && req.heating {
            errors.push(format!(
                "Dispatch {} cannot require both cooling and heating",
                self.id
            ));
        }
        if !req.capacity.is_finite() || req.capacity < 0.0 {
            errors.push(format!("Dispatch {} has invalid capacity", self.id));
        }
        if let Some(max_cost) = req.max_cost {
            if max_cost <= 0.0 {
                errors.push(format!("Dispatch {} max cost must be > 0", self.id));
            }
        }
        if !self.delivery.is_valid() {
            errors.push(format!(
                "Dispatch {} delivery {} is out of range",
                self.id, self.delivery
            ));
        }

        errors
    }
}

// ========== PLAN OUTPUT ==========

/// A routing node; id is the dispatch id or [`RETURN_LEG_ID`] for a service point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeliveryTarget {
    pub id: i32,
    pub position: Position,
}

/// One flight leg ending at a dispatch (or back at base when id is -1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub delivery_id: i32,
    pub flight_path: Vec<Position>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DronePath {
    pub drone_id: String,
    /// Last entry is always the return-to-base leg
    pub deliveries: Vec<Delivery>,
}

impl DronePath {
    /// Dispatch ids delivered by this flight, in delivery order.
    pub fn dispatch_ids(&self) -> Vec<i32> {
        self.deliveries
            .iter()
            .map(|delivery| delivery.delivery_id)
            .filter(|id| *id != RETURN_LEG_ID)
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPath {
    pub total_cost: f64,
    pub total_moves: u32,
    pub drone_paths: Vec<DronePath>,
}

impl DeliveryPath {
    pub fn empty() -> Self {
        Self {
            total_cost: 0.0,
            total_moves: 0,
            drone_paths: Vec::new(),
        }
    }

    /// Append another plan, summing totals.
    pub fn absorb(&mut self, other: DeliveryPath) {
        self.total_cost += other.total_cost;
        self.total_moves += other.total_moves;
        self.drone_paths.extend(other.drone_paths);
    }
}
