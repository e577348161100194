//! Admissible move/cost lower bounds used to prune drones before path planning.

use crate::availability::AvailabilityResolution;
use crate::error::PlanResult;
use crate::geometry::{distance, STEP};
use crate::models::{Capabilities, Drone, DroneServicePoint, MedDispatchRec, Position};
use std::collections::{BTreeSet, HashMap};

/// Straight-line move count; no lattice path can be shorter.
pub fn estimate_moves(a: &Position, b: &Position) -> PlanResult<u32> {
    Ok((distance(a, b)? / STEP).ceil() as u32)
}

/// Per-dispatch share of the cheapest possible flight of `moves` steps.
pub fn estimate_cost_lower_bound(moves: u32, capability: &Capabilities, deliveries: usize) -> f64 {
    capability.flight_cost(moves) / deliveries.max(1) as f64
}

/// Keep drones whose lower-bound cost, from every service point they are
/// stationed at, fits each dispatch's `maxCost`.
pub fn filter_by_cost_lower_bound(
    resolution: &AvailabilityResolution,
    batch: &[MedDispatchRec],
    service_points: &[DroneServicePoint],
    drones_by_id: &HashMap<&str, &Drone>,
) -> PlanResult<BTreeSet<String>> {
    let mut eligible = resolution.drones.clone();

    for rec in batch {
        let Some(max_cost) = rec.requirements.max_cost else {
            continue;
        };

        for service_point in service_points {
            let Some(stationed) = resolution.by_service_point.get(&service_point.id) else {
                continue;
            };
            let moves = estimate_moves(&service_point.location, &rec.delivery)?;

            for drone_id in stationed {
                let Some(drone) = drones_by_id.get(drone_id.as_str()) else {
                    eligible.remove(drone_id);
                    continue;
                };
                let lower_bound = estimate_cost_lower_bound(moves, &drone.capability, batch.len());
                if lower_bound > max_cost {
                    eligible.remove(drone_id);
                }
            }
        }

        if eligible.is_empty() {
            break;
        }
    }

    Ok(eligible)
}
