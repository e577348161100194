//! Capacity and thermal capability filtering.

use crate::error::{PlanError, PlanResult};
use crate::models::{Drone, MedDispatchRec};
use std::collections::BTreeSet;

/// Aggregate needs of a whole batch flown by one drone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchRequirements {
    pub total_capacity: f64,
    pub cooling: bool,
    pub heating: bool,
}

impl BatchRequirements {
    /// Sum capacities and OR the thermal flags.
    ///
    /// # Errors
    /// `InvalidInput` when the batch needs both cooling and heating.
    pub fn from_batch(batch: &[MedDispatchRec]) -> PlanResult<Self> {
        let total_capacity = batch.iter().map(|rec| rec.requirements.capacity).sum();
        let cooling = batch.iter().any(|rec| rec.requirements.cooling);
        let heating = batch.iter().any(|rec| rec.requirements.heating);

        if cooling && heating {
            return Err(PlanError::invalid(
                "Cannot have both cooling and heating requests in one batch",
            ));
        }

        Ok(Self {
            total_capacity,
            cooling,
            heating,
        })
    }

    pub fn is_met_by(&self, drone: &Drone) -> bool {
        let capability = &drone.capability;
        if capability.capacity < self.total_capacity {
            return false;
        }
        if self.cooling {
            return capability.cooling;
        }
        if self.heating {
            return capability.heating;
        }
        true
    }
}

/// True if the batch mixes cooling and heating dispatches.
pub fn mixes_thermal_needs(batch: &[MedDispatchRec]) -> bool {
    batch.iter().any(|rec| rec.requirements.cooling)
        && batch.iter().any(|rec| rec.requirements.heating)
}

/// Ids of drones able to carry the whole batch at once.
pub fn capable_drone_ids(batch: &[MedDispatchRec], drones: &[Drone]) -> PlanResult<BTreeSet<String>> {
    let requirements = BatchRequirements::from_batch(batch)?;
    let capable: BTreeSet<String> = drones
        .iter()
        .filter(|drone| requirements.is_met_by(drone))
        .map(|drone| drone.id.clone())
        .collect();

    tracing::debug!(
        "Found {} capable drones for requirements (capacity {})",
        capable.len(),
        requirements.total_capacity
    );
    Ok(capable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Capabilities, Position, Requirements};

    fn drone(id: &str, capacity: f64, cooling: bool, heating: bool) -> Drone {
        Drone {
            name: format!("Drone {id}"),
            id: id.to_string(),
            capability: Capabilities {
                cooling,
                heating,
                capacity,
                max_moves: 1000,
                cost_per_move: 0.01,
                cost_initial: 1.0,
                cost_final: 1.0,
            },
        }
    }

    fn rec(id: i32, capacity: f64, cooling: bool, heating: bool) -> MedDispatchRec {
        MedDispatchRec {
            id,
            date: None,
            time: None,
            requirements: Requirements {
                capacity,
                cooling,
                heating,
                max_cost: None,
            },
            delivery: Position::new(-3.19, 55.94),
        }
    }

    #[test]
    fn capacity_is_summed_across_batch() {
        let drones = vec![drone("small", 3.0, false, false), drone("big", 8.0, false, false)];
        let batch = vec![rec(1, 2.0, false, false), rec(2, 2.0, false, false)];
        let ids = capable_drone_ids(&batch, &drones).unwrap();
        assert_eq!(ids.into_iter().collect::<Vec<_>>(), vec!["big".to_string()]);
    }

    #[test]
    fn thermal_need_filters_drones() {
        let drones = vec![
            drone("plain", 10.0, false, false),
            drone("cold", 10.0, true, false),
            drone("hot", 10.0, false, true),
        ];
        let cooled = capable_drone_ids(&[rec(1, 1.0, true, false)], &drones).unwrap();
        assert!(cooled.contains("cold") && cooled.len() == 1);

        let neutral = capable_drone_ids(&[rec(1, 1.0, false, false)], &drones).unwrap();
        assert_eq!(neutral.len(), 3);
    }

    #[test]
    fn mixed_thermal_batch_is_rejected() {
        let batch = vec![rec(1, 1.0, true, false), rec(2, 1.0, false, true)];
        assert!(mixes_thermal_needs(&batch));
        assert!(matches!(
            capable_drone_ids(&batch, &[]),
            Err(PlanError::InvalidInput(_))
        ));
    }
}
