//! Delivery ordering and flight stitching for a single drone.

use crate::config::PlannerConfig;
use crate::cost::estimate_moves;
use crate::error::{PlanError, PlanResult};
use crate::geometry::euclidean;
use crate::models::{Delivery, DeliveryTarget, Position, Region, RETURN_LEG_ID};
use crate::path_planner::plan_path_with_config;

/// Every leg of one flight plus its move count (hovers included).
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltFlight {
    pub deliveries: Vec<Delivery>,
    pub total_moves: u32,
}

/// Greedy nearest-neighbour tour from `start`.
///
/// The first entry is the service point itself (id [`RETURN_LEG_ID`]); each
/// following entry is the unvisited target nearest to the previous one. Equal
/// distances keep input order.
pub fn order_targets(start: &Position, targets: &[DeliveryTarget]) -> PlanResult<Vec<DeliveryTarget>> {
    if targets.is_empty() {
        return Err(PlanError::invalid("No delivery targets to order"));
    }

    let mut route = Vec::with_capacity(targets.len() + 1);
    route.push(DeliveryTarget {
        id: RETURN_LEG_ID,
        position: *start,
    });
    let mut remaining: Vec<DeliveryTarget> = targets.to_vec();

    while !remaining.is_empty() {
        let last = route[route.len() - 1].position;
        let mut nearest = 0;
        let mut nearest_distance = f64::MAX;
        for (index, target) in remaining.iter().enumerate() {
            let d = euclidean(&last, &target.position);
            if d < nearest_distance {
                nearest_distance = d;
                nearest = index;
            }
        }
        route.push(remaining.remove(nearest));
    }

    Ok(route)
}

/// Lower-bound moves for an ordered route, including the closing return leg.
pub fn estimate_total_moves(route: &[DeliveryTarget]) -> PlanResult<u32> {
    let (Some(first), Some(last)) = (route.first(), route.last()) else {
        return Ok(0);
    };

    let mut moves = 0;
    for pair in route.windows(2) {
        moves += estimate_moves(&pair[0].position, &pair[1].position)?;
    }
    moves += estimate_moves(&last.position, &first.position)?;
    Ok(moves)
}

/// Plan every leg of an ordered route.
///
/// Legs chain from the previous leg's end. Each delivery leg repeats its final
/// position once (hover to deliver, one extra move); the return leg to
/// `route[0]` is tagged [`RETURN_LEG_ID`] and has no hover.
pub fn build_flight(
    route: &[DeliveryTarget],
    regions: &[Region],
    config: &PlannerConfig,
) -> PlanResult<BuiltFlight> {
    let Some(base) = route.first() else {
        return Err(PlanError::invalid("Cannot build a flight from an empty route"));
    };

    let mut deliveries = Vec::with_capacity(route.len());
    let mut total_moves = 0;
    let mut cursor = base.position;

    for target in &route[1..] {
        let leg = plan_path_with_config(&cursor, &target.position, regions, config)?;
        let mut flight_path = leg.positions;
        if let Some(end) = flight_path.last().copied() {
            flight_path.push(end);
            cursor = end;
        }
        total_moves += leg.moves + 1;
        deliveries.push(Delivery {
            delivery_id: target.id,
            flight_path,
        });
    }

    let home = plan_path_with_config(&cursor, &base.position, regions, config)?;
    total_moves += home.moves;
    deliveries.push(Delivery {
        delivery_id: RETURN_LEG_ID,
        flight_path: home.positions,
    });

    Ok(BuiltFlight {
        deliveries,
        total_moves,
    })
}
