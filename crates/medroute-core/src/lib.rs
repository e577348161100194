pub mod allocator;
pub mod availability;
pub mod capability;
pub mod config;
pub mod cost;
pub mod drone_query;
pub mod error;
pub mod geojson_export;
pub mod geometry;
pub mod models;
pub mod path_planner;
pub mod route_builder;
pub mod snapshot;
pub mod telemetry;

pub use allocator::{
    batch_date, plan_route, plan_route_with_config, query_available_drone_ids, resolve_drones,
    validate_batch, SplitPolicy,
};
pub use availability::{AvailabilityResolution, DateWindow, ServicePointDrones};
pub use capability::{capable_drone_ids, BatchRequirements};
pub use config::PlannerConfig;
pub use cost::{estimate_cost_lower_bound, estimate_moves};
pub use drone_query::{
    drone_details, drones_with_cooling, query, query_as_path, AttributeValue, DroneAttribute,
    Operator, QueryCondition,
};
pub use error::{PlanError, PlanResult};
pub use geojson_export::{export_as_geojson, export_as_geojson_with_config};
pub use geometry::{distance, is_close_to, is_in_region, next_position, segments_intersect, STEP};
pub use models::{
    Availability, Capabilities, Delivery, DeliveryPath, DeliveryTarget, Drone, DroneAvailability,
    DroneForServicePoint, DronePath, DroneServicePoint, MedDispatchRec, Position, Region,
    Requirements, ThermalNeed, RETURN_LEG_ID,
};
pub use path_planner::{plan_path, plan_path_with_config, PlannedLeg};
pub use route_builder::{build_flight, order_targets, BuiltFlight};
pub use snapshot::{JsonDirSnapshot, Snapshot, SnapshotProvider};
pub use telemetry::{replay_frames, Departure, DroneStatus, RelayMessage, TelemetryEvent};
