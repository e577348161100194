//! GeoJSON rendering of a planned batch for map viewers.

use crate::allocator::plan_route_with_config;
use crate::config::PlannerConfig;
use crate::error::PlanResult;
use crate::models::{DeliveryPath, MedDispatchRec, Position};
use crate::snapshot::Snapshot;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};

pub const DISPATCH_MARKER_COLOR: &str = "#648FFF";
pub const SERVICE_POINT_MARKER_COLOR: &str = "#FE6100";

fn coords(position: &Position) -> Vec<f64> {
    vec![position.lng, position.lat]
}

fn feature(value: Value, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn properties<const N: usize>(entries: [(&str, JsonValue); N]) -> JsonObject {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

/// Features for an already computed plan.
///
/// Emits one LineString per drone path, one Polygon per restricted region, one
/// Point per dispatch and one Point per service point.
pub fn plan_to_feature_collection(
    plan: &DeliveryPath,
    batch: &[MedDispatchRec],
    snapshot: &Snapshot,
) -> FeatureCollection {
    let mut features = Vec::new();

    for drone_path in &plan.drone_paths {
        let line: Vec<Vec<f64>> = drone_path
            .deliveries
            .iter()
            .flat_map(|delivery| delivery.flight_path.iter().map(coords))
            .collect();
        features.push(feature(
            Value::LineString(line),
            properties([("droneId", JsonValue::from(drone_path.drone_id.clone()))]),
        ));
    }

    for region in &snapshot.restricted_regions {
        let ring: Vec<Vec<f64>> = region.vertices.iter().map(coords).collect();
        features.push(feature(
            Value::Polygon(vec![ring]),
            properties([("name", JsonValue::from(region.name.clone()))]),
        ));
    }

    for rec in batch {
        features.push(feature(
            Value::Point(coords(&rec.delivery)),
            properties([
                ("id", JsonValue::from(rec.id)),
                ("marker-color", JsonValue::from(DISPATCH_MARKER_COLOR)),
            ]),
        ));
    }

    for service_point in &snapshot.service_points {
        features.push(feature(
            Value::Point(coords(&service_point.location)),
            properties([
                ("id", JsonValue::from(service_point.id)),
                ("name", JsonValue::from(service_point.name.clone())),
                ("marker-color", JsonValue::from(SERVICE_POINT_MARKER_COLOR)),
            ]),
        ));
    }

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn export_as_geojson(batch: &[MedDispatchRec], snapshot: &Snapshot) -> PlanResult<FeatureCollection> {
    export_as_geojson_with_config(batch, snapshot, &PlannerConfig::default())
}

/// Plan `batch` and render the result.
pub fn export_as_geojson_with_config(
    batch: &[MedDispatchRec],
    snapshot: &Snapshot,
    config: &PlannerConfig,
) -> PlanResult<FeatureCollection> {
    let plan = plan_route_with_config(batch, snapshot, config)?;
    Ok(plan_to_feature_collection(&plan, batch, snapshot))
}
