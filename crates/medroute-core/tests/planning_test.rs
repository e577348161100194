//! End-to-end planning tests.
//!
//! Snapshots are built from JSON fixtures shaped like the live data feed.

use medroute_core::geometry::{is_in_region, segment_crosses_region};
use medroute_core::telemetry::{replay_frames, Departure, DroneStatus};
use medroute_core::{
    export_as_geojson, plan_route, plan_route_with_config, query_available_drone_ids,
    DeliveryPath, MedDispatchRec, PlanError, PlannerConfig, Snapshot, RETURN_LEG_ID,
};
use serde_json::{json, Value};
use std::collections::BTreeSet;

const APPLETON: (f64, f64) = (-3.1863580788986368, 55.94468066708487);

fn drone(id: &str, cooling: bool, heating: bool, capacity: f64, max_moves: u32) -> Value {
    json!({
        "name": format!("Drone {id}"),
        "id": id,
        "capability": {
            "cooling": cooling, "heating": heating, "capacity": capacity,
            "maxMoves": max_moves, "costPerMove": 0.01, "costInitial": 4.3, "costFinal": 6.5
        }
    })
}

fn all_week(id: &str) -> Value {
    let days = ["MONDAY", "TUESDAY", "WEDNESDAY", "THURSDAY", "FRIDAY"];
    json!({
        "id": id,
        "availability": days.iter()
            .map(|day| json!({ "dayOfWeek": day, "from": "00:00:00", "until": "23:59:59" }))
            .collect::<Vec<_>>()
    })
}

fn mondays(id: &str) -> Value {
    json!({ "id": id, "availability": [
        { "dayOfWeek": "MONDAY", "from": "08:00:00", "until": "18:00:00" }
    ]})
}

fn square(name: &str, lng: f64, lat: f64, half: f64) -> Value {
    json!({ "name": name, "vertices": [
        { "lng": lng - half, "lat": lat - half },
        { "lng": lng + half, "lat": lat - half },
        { "lng": lng + half, "lat": lat + half },
        { "lng": lng - half, "lat": lat + half },
        { "lng": lng - half, "lat": lat - half }
    ]})
}

/// Appleton Tower with two drones, Ocean Terminal with one.
fn edinburgh() -> Snapshot {
    serde_json::from_value(json!({
        "drones": [
            drone("1", true, false, 4.0, 2000),
            drone("2", false, true, 8.0, 2000),
            drone("3", false, false, 20.0, 1000)
        ],
        "dronesForServicePoints": [
            { "servicePointId": 1, "drones": [all_week("1"), mondays("2")] },
            { "servicePointId": 2, "drones": [all_week("3")] }
        ],
        "servicePoints": [
            { "name": "Appleton Tower", "id": 1,
              "location": { "lng": APPLETON.0, "lat": APPLETON.1 } },
            { "name": "Ocean Terminal", "id": 2,
              "location": { "lng": -3.17732, "lat": 55.98186 } }
        ],
        "restrictedRegions": []
    }))
    .unwrap()
}

/// One base at the origin and a single short-range drone.
fn origin_base(max_moves: u32, regions: Vec<Value>) -> Snapshot {
    serde_json::from_value(json!({
        "drones": [drone("short", false, false, 10.0, max_moves)],
        "dronesForServicePoints": [
            { "servicePointId": 1, "drones": [{ "id": "short", "availability": [] }] }
        ],
        "servicePoints": [
            { "name": "Origin", "id": 1, "location": { "lng": 0.0, "lat": 0.0 } }
        ],
        "restrictedRegions": regions
    }))
    .unwrap()
}

/// One base at the origin whose only drone pays exactly one unit per move.
fn metered_base() -> Snapshot {
    serde_json::from_value(json!({
        "drones": [{
            "name": "Metered", "id": "metered",
            "capability": {
                "cooling": false, "heating": false, "capacity": 10.0,
                "maxMoves": 2000, "costPerMove": 1.0, "costInitial": 0.0, "costFinal": 0.0
            }
        }],
        "dronesForServicePoints": [
            { "servicePointId": 1, "drones": [{ "id": "metered", "availability": [] }] }
        ],
        "servicePoints": [
            { "name": "Origin", "id": 1, "location": { "lng": 0.0, "lat": 0.0 } }
        ],
        "restrictedRegions": []
    }))
    .unwrap()
}

/// West base at the origin and east base 0.01 degrees away, one short-range drone each.
fn two_bases(max_moves: u32) -> Snapshot {
    serde_json::from_value(json!({
        "drones": [
            drone("west", false, false, 10.0, max_moves),
            drone("east", false, false, 10.0, max_moves)
        ],
        "dronesForServicePoints": [
            { "servicePointId": 1, "drones": [{ "id": "west", "availability": [] }] },
            { "servicePointId": 2, "drones": [{ "id": "east", "availability": [] }] }
        ],
        "servicePoints": [
            { "name": "West", "id": 1, "location": { "lng": 0.0, "lat": 0.0 } },
            { "name": "East", "id": 2, "location": { "lng": 0.01, "lat": 0.0 } }
        ],
        "restrictedRegions": []
    }))
    .unwrap()
}

fn dispatch(id: i32, date: Option<&str>, lng: f64, lat: f64, requirements: Value) -> MedDispatchRec {
    serde_json::from_value(json!({
        "id": id,
        "date": date,
        "time": date.map(|_| "10:30:00"),
        "requirements": requirements,
        "delivery": { "lng": lng, "lat": lat }
    }))
    .unwrap()
}

fn plain(capacity: f64) -> Value {
    json!({ "capacity": capacity })
}

fn delivered_ids(plan: &DeliveryPath) -> Vec<i32> {
    let mut ids: Vec<i32> = plan
        .drone_paths
        .iter()
        .flat_map(|path| path.dispatch_ids())
        .collect();
    ids.sort();
    ids
}

fn path_moves(plan: &DeliveryPath, index: usize) -> usize {
    plan.drone_paths[index]
        .deliveries
        .iter()
        .map(|delivery| delivery.flight_path.len() - 1)
        .sum()
}

/// Test that a small same-date batch is flown by one drone.
#[test]
fn test_single_drone_serves_whole_batch() {
    let snapshot = edinburgh();
    let monday = Some("2025-12-22");
    let batch = vec![
        dispatch(1, monday, -3.1855, 55.9449, plain(0.5)),
        dispatch(2, monday, -3.1850, 55.9452, plain(0.5)),
        dispatch(3, monday, -3.1870, 55.9440, plain(0.5)),
        dispatch(4, monday, -3.1880, 55.9455, plain(0.5)),
    ];

    let plan = plan_route(&batch, &snapshot).unwrap();

    assert_eq!(plan.drone_paths.len(), 1);
    assert!(plan.total_moves > 0);
    assert_eq!(plan.drone_paths[0].drone_id, "1");
    assert_eq!(delivered_ids(&plan), vec![1, 2, 3, 4]);
    assert_eq!(path_moves(&plan, 0), plan.total_moves as usize);

    let deliveries = &plan.drone_paths[0].deliveries;
    assert_eq!(deliveries.last().unwrap().delivery_id, RETURN_LEG_ID);
    let expected_cost = 4.3 + 6.5 + plan.total_moves as f64 * 0.01;
    assert!((plan.total_cost - expected_cost).abs() < 1e-9);
}

/// Test that a batch too long for one flight is split and every dispatch is
/// delivered exactly once.
#[test]
fn test_batch_exceeding_max_moves_is_split() {
    let snapshot = origin_base(60, vec![]);
    let batch = vec![
        dispatch(1, None, 0.0024, 0.0, plain(1.0)),
        dispatch(2, None, -0.0024, 0.0, plain(1.0)),
        dispatch(3, None, 0.0, 0.0024, plain(1.0)),
        dispatch(4, None, 0.0, -0.0024, plain(1.0)),
    ];

    let plan = plan_route(&batch, &snapshot).unwrap();

    assert!(plan.drone_paths.len() >= 2);
    assert_eq!(delivered_ids(&plan), vec![1, 2, 3, 4]);
    let mut summed = 0;
    for index in 0..plan.drone_paths.len() {
        let moves = path_moves(&plan, index);
        assert!(moves <= 60, "flight {index} took {moves} moves");
        summed += moves;
    }
    assert_eq!(summed, plan.total_moves as usize);
}

/// Test that flights never enter a restricted region in the way.
#[test]
fn test_route_avoids_restricted_region() {
    let snapshot = origin_base(2000, vec![square("Block", 0.00075, 0.0, 0.0003)]);
    let region = snapshot.restricted_regions[0].clone();
    let batch = vec![dispatch(1, None, 0.0015, 0.0, plain(1.0))];

    let plan = plan_route(&batch, &snapshot).unwrap();

    assert_eq!(plan.drone_paths.len(), 1);
    for delivery in &plan.drone_paths[0].deliveries {
        for position in &delivery.flight_path {
            assert!(!is_in_region(position, &region).unwrap());
        }
        for pair in delivery.flight_path.windows(2) {
            assert!(!segment_crosses_region(&pair[0], &pair[1], &region));
        }
    }
}

/// Test that an unreachable delivery fails the whole plan.
#[test]
fn test_walled_off_delivery_has_no_path() {
    let snapshot = origin_base(2000, vec![square("Cage", 0.002, 0.0, 0.0006)]);
    let batch = vec![
        dispatch(1, None, 0.0003, 0.0, plain(1.0)),
        dispatch(2, None, 0.002, 0.0, plain(1.0)),
    ];
    let config = PlannerConfig {
        max_expansions: 3_000,
    };

    let result = plan_route_with_config(&batch, &snapshot, &config);
    assert!(matches!(result, Err(PlanError::NoPathFound { .. })));
}

/// Test that cooling and heating dispatches go to different drones.
#[test]
fn test_mixed_thermal_batch_is_split_by_need() {
    let snapshot = edinburgh();
    let monday = Some("2025-12-22");
    let batch = vec![
        dispatch(1, monday, -3.1855, 55.9449, json!({ "capacity": 1.0, "cooling": true })),
        dispatch(2, monday, -3.1850, 55.9452, json!({ "capacity": 1.0, "heating": true })),
        dispatch(3, monday, -3.1856, 55.9450, plain(1.0)),
    ];

    let plan = plan_route(&batch, &snapshot).unwrap();

    assert_eq!(plan.drone_paths.len(), 2);
    assert_eq!(delivered_ids(&plan), vec![1, 2, 3]);
    for path in &plan.drone_paths {
        let ids = path.dispatch_ids();
        if ids.contains(&1) {
            assert_eq!(path.drone_id, "1");
            assert!(ids.contains(&3), "neutral dispatch joins the nearer group");
        } else {
            assert_eq!(path.drone_id, "2");
            assert_eq!(ids, vec![2]);
        }
    }
}

/// Test that a dispatch no drone can lift is infeasible.
#[test]
fn test_oversized_dispatch_is_infeasible() {
    let snapshot = edinburgh();
    let batch = vec![dispatch(1, Some("2025-12-22"), -3.1855, 55.9449, plain(50.0))];

    let result = plan_route(&batch, &snapshot);
    assert!(matches!(result, Err(PlanError::InfeasibleAllocation(_))));
}

/// Test that an unaffordable dispatch leaves no drone available.
#[test]
fn test_max_cost_prunes_every_drone() {
    let snapshot = edinburgh();
    let batch = vec![dispatch(
        1,
        Some("2025-12-22"),
        -3.1855,
        55.9449,
        json!({ "capacity": 1.0, "maxCost": 2.0 }),
    )];

    assert!(query_available_drone_ids(&batch, &snapshot).unwrap().is_empty());
    assert!(matches!(
        plan_route(&batch, &snapshot),
        Err(PlanError::InfeasibleAllocation(_))
    ));
}

/// Test that a batch passing the cost lower bound but too dear once planned
/// is split, and each half is flown on its own.
#[test]
fn test_planned_cost_over_max_cost_splits_batch() {
    let snapshot = metered_base();
    let batch = vec![
        dispatch(1, None, 0.003, 0.0, plain(1.0)),
        dispatch(2, None, 0.00029, 0.0, json!({ "capacity": 1.0, "maxCost": 10.0 })),
    ];

    assert_eq!(
        query_available_drone_ids(&batch, &snapshot).unwrap(),
        BTreeSet::from(["metered".to_string()])
    );

    let plan = plan_route(&batch, &snapshot).unwrap();

    assert_eq!(plan.drone_paths.len(), 2);
    assert_eq!(plan.drone_paths[0].dispatch_ids(), vec![1]);
    assert_eq!(plan.drone_paths[1].dispatch_ids(), vec![2]);
    assert!(path_moves(&plan, 1) <= 10);
    assert_eq!(delivered_ids(&plan), vec![1, 2]);
}

/// Test that a batch whose halves are each too dear on their own fails as
/// infeasible after splitting.
#[test]
fn test_planned_cost_over_max_cost_for_every_half_is_infeasible() {
    let snapshot = metered_base();
    let capped = json!({ "capacity": 1.0, "maxCost": 14.0 });
    let batch = vec![
        dispatch(1, None, 0.00149, 0.0, capped.clone()),
        dispatch(2, None, 0.0, 0.00149, capped),
    ];

    assert_eq!(query_available_drone_ids(&batch, &snapshot).unwrap().len(), 1);
    match plan_route(&batch, &snapshot) {
        Err(PlanError::InfeasibleAllocation(message)) => {
            assert!(message.contains("range and cost"), "{message}");
        }
        other => panic!("expected an infeasible allocation, got {other:?}"),
    }
}

/// Test that a batch out of range from one base is split towards the other
/// base, and the two flights deliver the batch exactly once.
#[test]
fn test_split_by_alternate_service_point() {
    let snapshot = two_bases(60);
    let batch = vec![
        dispatch(1, None, 0.0003, 0.0, plain(1.0)),
        dispatch(2, None, 0.0096, 0.0, plain(1.0)),
    ];

    let plan = plan_route(&batch, &snapshot).unwrap();

    assert_eq!(plan.drone_paths.len(), 2);
    let west = &plan.drone_paths[0];
    let east = &plan.drone_paths[1];
    assert_eq!(west.drone_id, "west");
    assert_eq!(west.dispatch_ids(), vec![1]);
    assert_eq!(east.drone_id, "east");
    assert_eq!(east.dispatch_ids(), vec![2]);
    assert_eq!(
        east.deliveries[0].flight_path[0],
        snapshot.service_points[1].location
    );
    assert_eq!(delivered_ids(&plan), vec![1, 2]);
}

/// Test that availability is intersected across every date in a query.
#[test]
fn test_available_drones_across_dates() {
    let snapshot = edinburgh();
    let monday = vec![dispatch(1, Some("2025-12-22"), -3.1855, 55.9449, plain(1.0))];
    let both = vec![
        dispatch(1, Some("2025-12-22"), -3.1855, 55.9449, plain(1.0)),
        dispatch(2, Some("2025-12-23"), -3.1855, 55.9449, plain(1.0)),
    ];

    let expected: BTreeSet<String> = ["1", "2", "3"].iter().map(|s| s.to_string()).collect();
    assert_eq!(query_available_drone_ids(&monday, &snapshot).unwrap(), expected);

    let expected: BTreeSet<String> = ["1", "3"].iter().map(|s| s.to_string()).collect();
    assert_eq!(query_available_drone_ids(&both, &snapshot).unwrap(), expected);

    assert!(matches!(
        plan_route(&both, &snapshot),
        Err(PlanError::InvalidInput(_))
    ));
}

/// Test that the exported collection carries every layer.
#[test]
fn test_geojson_export_layers() {
    let snapshot = origin_base(2000, vec![square("Block", 0.00075, 0.0, 0.0003)]);
    let batch = vec![
        dispatch(1, None, 0.0015, 0.0, plain(1.0)),
        dispatch(2, None, 0.0015, 0.0006, plain(1.0)),
    ];

    let collection = export_as_geojson(&batch, &snapshot).unwrap();
    // 1 flight + 1 region + 2 dispatches + 1 service point
    assert_eq!(collection.features.len(), 5);

    let json = serde_json::to_value(&collection).unwrap();
    assert_eq!(json["features"][0]["geometry"]["type"], "LineString");
    assert_eq!(json["features"][0]["geometry"]["coordinates"][0][0], 0.0);
    assert_eq!(json["features"][1]["geometry"]["type"], "Polygon");
    assert_eq!(json["features"][2]["properties"]["marker-color"], "#648FFF");
    assert_eq!(json["features"][4]["properties"]["name"], "Origin");
}

/// Test that a planned flight replays to completion.
#[test]
fn test_replay_of_planned_flight() {
    let snapshot = origin_base(2000, vec![]);
    let batch = vec![dispatch(1, None, 0.0015, 0.0, plain(1.0))];
    let plan = plan_route(&batch, &snapshot).unwrap();
    let path = &plan.drone_paths[0];

    let departure = Departure::for_path(
        path,
        &snapshot,
        "2025-12-22".parse().unwrap(),
        "09:00:00".parse().unwrap(),
    )
    .unwrap();
    assert_eq!(departure.service_point_id, 1);

    let frames = replay_frames(path, &departure, 1);
    let last = frames.last().unwrap();
    assert_eq!(last.status, DroneStatus::Idle);
    assert_eq!(frames.len(), plan.total_moves as usize + 2);
    assert_eq!(last.remaining_moves, 2000 - (plan.total_moves as i64 + 1));
}
