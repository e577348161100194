//! Batch allocation: pick a base and a drone, split what one flight cannot serve.
//!
//! A batch is served by one drone when possible. Otherwise it is split (by
//! thermal need, then by alternate service point, then evenly) and each half
//! is allocated on its own. Halves are processed depth-first from an explicit
//! work-list, so the combined plan lists drone paths in split order.

use crate::availability::{date_windows, resolve_availability, AvailabilityResolution};
use crate::capability::{capable_drone_ids, mixes_thermal_needs};
use crate::config::PlannerConfig;
use crate::cost::filter_by_cost_lower_bound;
use crate::error::{PlanError, PlanResult};
use crate::geometry::{centroid, euclidean};
use crate::models::{
    DeliveryPath, DeliveryTarget, Drone, DronePath, DroneServicePoint, MedDispatchRec, Position,
    ThermalNeed,
};
use crate::route_builder::{build_flight, estimate_total_moves, order_targets};
use crate::snapshot::Snapshot;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

// ========== VALIDATION ==========

/// Reject empty batches and malformed dispatches.
pub fn validate_batch(batch: &[MedDispatchRec]) -> PlanResult<()> {
    if batch.is_empty() {
        return Err(PlanError::invalid("Dispatch batch is empty"));
    }
    let errors: Vec<String> = batch.iter().flat_map(|rec| rec.validate()).collect();
    if !errors.is_empty() {
        return Err(PlanError::invalid(errors.join("; ")));
    }
    Ok(())
}

/// The single date shared by every dated dispatch, if any.
///
/// # Errors
/// `InvalidInput` when two dispatches carry different dates.
pub fn batch_date(batch: &[MedDispatchRec]) -> PlanResult<Option<NaiveDate>> {
    let mut date = None;
    for rec in batch {
        match (date, rec.date) {
            (Some(seen), Some(current)) if seen != current => {
                return Err(PlanError::invalid(format!(
                    "Dispatches span several dates ({} and {})",
                    seen, current
                )));
            }
            (None, Some(current)) => date = Some(current),
            _ => {}
        }
    }
    Ok(date)
}

fn validate_snapshot(snapshot: &Snapshot) -> PlanResult<()> {
    let errors = snapshot.validate();
    if !errors.is_empty() {
        return Err(PlanError::invalid(errors.join("; ")));
    }
    Ok(())
}

// ========== DRONE RESOLUTION ==========

/// Capable, available and cost-eligible drones for `batch`, per service point.
pub fn resolve_drones(
    batch: &[MedDispatchRec],
    snapshot: &Snapshot,
) -> PlanResult<AvailabilityResolution> {
    let capable = capable_drone_ids(batch, &snapshot.drones)?;
    if capable.is_empty() {
        return Ok(AvailabilityResolution::default());
    }

    let windows = date_windows(batch);
    let mut resolution =
        resolve_availability(&capable, &windows, &snapshot.drones_for_service_points);
    if resolution.is_empty() {
        return Ok(resolution);
    }

    let eligible = filter_by_cost_lower_bound(
        &resolution,
        batch,
        &snapshot.service_points,
        &snapshot.drones_by_id(),
    )?;
    resolution.retain_drones(&eligible);

    tracing::debug!(
        "{} capable, {} available and affordable across {} service points",
        capable.len(),
        resolution.drones.len(),
        resolution.by_service_point.len()
    );
    Ok(resolution)
}

/// Ids of drones that could carry the whole batch, without planning a route.
///
/// Dispatches may span several dates; a drone must be available on each.
pub fn query_available_drone_ids(
    batch: &[MedDispatchRec],
    snapshot: &Snapshot,
) -> PlanResult<BTreeSet<String>> {
    validate_batch(batch)?;
    Ok(resolve_drones(batch, snapshot)?.drones)
}

/// Service point with the smallest summed distance to every delivery, among
/// those with at least one resolved drone.
pub fn choose_service_point<'a>(
    batch: &[MedDispatchRec],
    service_points: &'a [DroneServicePoint],
    resolution: &AvailabilityResolution,
) -> Option<&'a DroneServicePoint> {
    best_service_point(batch, service_points.iter().filter(|sp| {
        resolution
            .by_service_point
            .get(&sp.id)
            .is_some_and(|drones| !drones.is_empty())
    }))
}

fn best_service_point<'a, I>(batch: &[MedDispatchRec], candidates: I) -> Option<&'a DroneServicePoint>
where
    I: IntoIterator<Item = &'a DroneServicePoint>,
{
    let mut best: Option<(&DroneServicePoint, f64)> = None;
    for service_point in candidates {
        let total: f64 = batch
            .iter()
            .map(|rec| euclidean(&rec.delivery, &service_point.location))
            .sum();
        if best.map_or(true, |(_, shortest)| total < shortest) {
            best = Some((service_point, total));
        }
    }
    best.map(|(service_point, _)| service_point)
}

// ========== SPLIT POLICIES ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitPolicy {
    Thermal,
    AlternateServicePoint,
    Even,
}

impl fmt::Display for SplitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SplitPolicy::Thermal => "thermal need",
            SplitPolicy::AlternateServicePoint => "alternate service point",
            SplitPolicy::Even => "even size",
        };
        f.write_str(name)
    }
}

type Halves = (Vec<MedDispatchRec>, Vec<MedDispatchRec>);

/// Heating and cooling groups; neutral dispatches join the nearer thermal
/// centroid (heating on a tie). `None` unless the batch holds both needs.
pub fn split_by_thermal(batch: &[MedDispatchRec]) -> Option<Halves> {
    let mut heating = Vec::new();
    let mut cooling = Vec::new();
    let mut neutral = Vec::new();
    for rec in batch {
        match rec.requirements.thermal_need() {
            ThermalNeed::Heating => heating.push(rec.clone()),
            ThermalNeed::Cooling => cooling.push(rec.clone()),
            ThermalNeed::Neutral => neutral.push(rec.clone()),
        }
    }
    if heating.is_empty() || cooling.is_empty() {
        return None;
    }

    let heat_mid = centroid(heating.iter().map(|rec| &rec.delivery))?;
    let cool_mid = centroid(cooling.iter().map(|rec| &rec.delivery))?;
    for rec in neutral {
        if euclidean(&rec.delivery, &heat_mid) <= euclidean(&rec.delivery, &cool_mid) {
            heating.push(rec);
        } else {
            cooling.push(rec);
        }
    }
    Some((heating, cooling))
}

/// Partition around the alternate service point closer than `reference` to
/// the most dispatches. `None` if no point wins any dispatch or a side is empty.
pub fn split_by_alternate_service_point(
    batch: &[MedDispatchRec],
    reference: &Position,
    service_points: &[DroneServicePoint],
) -> Option<Halves> {
    let mut alternate: Option<&DroneServicePoint> = None;
    let mut max_count = 0;
    for service_point in service_points {
        if service_point.location == *reference {
            continue;
        }
        let closer = batch
            .iter()
            .filter(|rec| {
                euclidean(&rec.delivery, &service_point.location)
                    < euclidean(&rec.delivery, reference)
            })
            .count();
        if closer > max_count {
            max_count = closer;
            alternate = Some(service_point);
        }
    }
    let alternate = alternate?;

    let (near_reference, near_alternate): Halves = batch.iter().cloned().partition(|rec| {
        euclidean(&rec.delivery, reference) < euclidean(&rec.delivery, &alternate.location)
    });
    if near_reference.is_empty() || near_alternate.is_empty() {
        return None;
    }
    Some((near_reference, near_alternate))
}

/// First `ceil(n / 2)` dispatches, then the rest.
pub fn split_evenly(batch: &[MedDispatchRec]) -> Halves {
    let (first, second) = batch.split_at(batch.len().div_ceil(2));
    (first.to_vec(), second.to_vec())
}

// ========== ALLOCATION ==========

enum Attempt<'a> {
    Planned(DeliveryPath),
    Unserved {
        service_point: Option<&'a DroneServicePoint>,
        reason: &'static str,
    },
}

struct Allocator<'a> {
    snapshot: &'a Snapshot,
    drones_by_id: HashMap<&'a str, &'a Drone>,
    config: &'a PlannerConfig,
}

impl<'a> Allocator<'a> {
    fn new(snapshot: &'a Snapshot, config: &'a PlannerConfig) -> Self {
        Self {
            snapshot,
            drones_by_id: snapshot.drones_by_id(),
            config,
        }
    }

    fn allocate(&self, batch: Vec<MedDispatchRec>) -> PlanResult<DeliveryPath> {
        let mut plan = DeliveryPath::empty();
        let mut pending = vec![batch];

        while let Some(group) = pending.pop() {
            match self.try_single_drone(&group)? {
                Attempt::Planned(partial) => plan.absorb(partial),
                Attempt::Unserved {
                    service_point,
                    reason,
                } => {
                    if group.len() < 2 {
                        let id = group.first().map(|rec| rec.id).unwrap_or_default();
                        tracing::warn!("Dispatch {} cannot be served: {}", id, reason);
                        return Err(PlanError::infeasible(format!(
                            "Dispatch {} cannot be served: {}",
                            id, reason
                        )));
                    }

                    let (policy, first, second) = self.split(&group, service_point);
                    tracing::info!(
                        "Splitting {} dispatches by {} ({}): {} + {}",
                        group.len(),
                        policy,
                        reason,
                        first.len(),
                        second.len()
                    );
                    pending.push(second);
                    pending.push(first);
                }
            }
        }

        Ok(plan)
    }

    fn try_single_drone(&self, batch: &[MedDispatchRec]) -> PlanResult<Attempt<'a>> {
        let snapshot: &'a Snapshot = self.snapshot;
        if mixes_thermal_needs(batch) {
            return Ok(Attempt::Unserved {
                service_point: None,
                reason: "batch mixes cooling and heating",
            });
        }

        let resolution = resolve_drones(batch, snapshot)?;
        if resolution.is_empty() {
            return Ok(Attempt::Unserved {
                service_point: None,
                reason: "no capable, available and affordable drone",
            });
        }

        let service_point =
            choose_service_point(batch, &snapshot.service_points, &resolution).ok_or_else(
                || PlanError::infeasible("No service point with an available drone"),
            )?;
        let candidates = resolution
            .by_service_point
            .get(&service_point.id)
            .cloned()
            .unwrap_or_default();
        let drones: Vec<&Drone> = candidates
            .iter()
            .filter_map(|id| self.drones_by_id.get(id.as_str()).copied())
            .collect();

        let targets: Vec<DeliveryTarget> = batch
            .iter()
            .map(|rec| DeliveryTarget {
                id: rec.id,
                position: rec.delivery,
            })
            .collect();
        let route = order_targets(&service_point.location, &targets)?;
        let estimated = estimate_total_moves(&route)?;

        if !drones
            .iter()
            .any(|drone| drone.capability.max_moves >= estimated)
        {
            return Ok(Attempt::Unserved {
                service_point: Some(service_point),
                reason: "estimated moves exceed every drone's range",
            });
        }

        let flight = build_flight(&route, &snapshot.restricted_regions, self.config)?;
        let max_cost = batch
            .iter()
            .filter_map(|rec| rec.requirements.max_cost)
            .fold(f64::INFINITY, f64::min);

        for drone in drones {
            if drone.capability.max_moves < flight.total_moves {
                continue;
            }
            let cost = drone.capability.flight_cost(flight.total_moves);
            if cost / batch.len() as f64 <= max_cost {
                tracing::info!(
                    "Drone {} from service point {} takes {} dispatches ({} moves, cost {:.2})",
                    drone.id,
                    service_point.id,
                    batch.len(),
                    flight.total_moves,
                    cost
                );
                return Ok(Attempt::Planned(DeliveryPath {
                    total_cost: cost,
                    total_moves: flight.total_moves,
                    drone_paths: vec![DronePath {
                        drone_id: drone.id.clone(),
                        deliveries: flight.deliveries,
                    }],
                }));
            }
        }

        Ok(Attempt::Unserved {
            service_point: Some(service_point),
            reason: "no drone meets both range and cost",
        })
    }

    fn split(
        &self,
        batch: &[MedDispatchRec],
        chosen: Option<&DroneServicePoint>,
    ) -> (SplitPolicy, Vec<MedDispatchRec>, Vec<MedDispatchRec>) {
        if let Some((first, second)) = split_by_thermal(batch) {
            return (SplitPolicy::Thermal, first, second);
        }

        let service_points = &self.snapshot.service_points;
        let reference = chosen
            .or_else(|| best_service_point(batch, service_points))
            .map(|sp| sp.location);
        if let Some(reference) = reference {
            if let Some((first, second)) =
                split_by_alternate_service_point(batch, &reference, service_points)
            {
                return (SplitPolicy::AlternateServicePoint, first, second);
            }
        }

        let (first, second) = split_evenly(batch);
        (SplitPolicy::Even, first, second)
    }
}

/// Plan a single-date batch with the default [`PlannerConfig`].
pub fn plan_route(batch: &[MedDispatchRec], snapshot: &Snapshot) -> PlanResult<DeliveryPath> {
    plan_route_with_config(batch, snapshot, &PlannerConfig::default())
}

/// Plan flights serving every dispatch in `batch`.
///
/// Either every sub-batch is served or the whole call fails; a `NoPathFound`
/// from any leg is not retried.
pub fn plan_route_with_config(
    batch: &[MedDispatchRec],
    snapshot: &Snapshot,
    config: &PlannerConfig,
) -> PlanResult<DeliveryPath> {
    validate_batch(batch)?;
    batch_date(batch)?;
    validate_snapshot(snapshot)?;

    let plan = Allocator::new(snapshot, config).allocate(batch.to_vec())?;
    tracing::info!(
        "Planned {} dispatches with {} flights: {} moves, cost {:.2}",
        batch.len(),
        plan.drone_paths.len(),
        plan.total_moves,
        plan.total_cost
    );
    Ok(plan)
}
