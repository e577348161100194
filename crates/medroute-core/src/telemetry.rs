//! Telemetry records a simulator emits while flying a planned path.

use crate::drone_query::drone_details;
use crate::error::{PlanError, PlanResult};
use crate::models::{DronePath, Position, RETURN_LEG_ID};
use crate::snapshot::Snapshot;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DroneStatus {
    Idle,
    Flying,
    Error,
}

/// One tick of a simulated flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelemetryEvent {
    pub drone_id: String,
    /// `None` once the drone has landed
    pub position: Option<Position>,
    pub remaining_moves: i64,
    pub status: DroneStatus,
    pub service_point_id: i32,
    pub dispatch_id: i32,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

/// Reduced form forwarded to live viewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayMessage {
    pub drone_id: String,
    pub status: DroneStatus,
    pub position: Option<Position>,
    pub dispatch_id: i32,
    pub remaining_moves: i64,
}

impl From<&TelemetryEvent> for RelayMessage {
    fn from(event: &TelemetryEvent) -> Self {
        Self {
            drone_id: event.drone_id.clone(),
            status: event.status,
            position: event.position,
            dispatch_id: event.dispatch_id,
            remaining_moves: event.remaining_moves,
        }
    }
}

/// Where and when a flight starts, and the moves the drone has left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Departure {
    pub service_point_id: i32,
    pub remaining_moves: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl Departure {
    /// Departure of `path` from the service point at its first position, with
    /// the drone's full move budget.
    pub fn for_path(
        path: &DronePath,
        snapshot: &Snapshot,
        date: NaiveDate,
        time: NaiveTime,
    ) -> PlanResult<Self> {
        let drone = drone_details(&snapshot.drones, &path.drone_id)?;
        let start = path
            .deliveries
            .first()
            .and_then(|delivery| delivery.flight_path.first())
            .ok_or_else(|| PlanError::invalid(format!("Drone path {} is empty", path.drone_id)))?;
        let service_point = snapshot
            .service_points
            .iter()
            .find(|sp| sp.location == *start)
            .ok_or_else(|| {
                PlanError::invalid(format!("No service point at flight start {}", start))
            })?;

        Ok(Self {
            service_point_id: service_point.id,
            remaining_moves: drone.capability.max_moves as i64,
            date,
            time,
        })
    }
}

/// Positions in flight order, tagged with the dispatch each belongs to.
///
/// Every delivery after the first starts where the previous one ended, so its
/// first position is not a move and is skipped.
fn flight_positions(path: &DronePath) -> Vec<(i32, Position)> {
    path.deliveries
        .iter()
        .enumerate()
        .flat_map(|(index, delivery)| {
            let skip = usize::from(index > 0);
            delivery
                .flight_path
                .iter()
                .skip(skip)
                .map(move |position| (delivery.delivery_id, *position))
        })
        .collect()
}

/// Frames a simulator would emit for `path`, one per tick.
///
/// Tick k reports `remaining_moves - k` at `departure + k * seconds_per_tick`.
/// Frames are FLYING while positions remain; a frame whose move budget is
/// spent is reported as ERROR and ends the replay. A completed flight ends
/// with an IDLE frame without position.
pub fn replay_frames(
    path: &DronePath,
    departure: &Departure,
    seconds_per_tick: u32,
) -> Vec<TelemetryEvent> {
    let start = NaiveDateTime::new(departure.date, departure.time);
    let frame = |tick: usize, dispatch_id: i32, position: Option<Position>, status| {
        let clock = start + Duration::seconds(tick as i64 * seconds_per_tick as i64);
        TelemetryEvent {
            drone_id: path.drone_id.clone(),
            position,
            remaining_moves: departure.remaining_moves - tick as i64,
            status,
            service_point_id: departure.service_point_id,
            dispatch_id,
            date: clock.date(),
            time: clock.time(),
        }
    };

    let positions = flight_positions(path);
    let mut frames = Vec::with_capacity(positions.len() + 1);

    for (tick, (dispatch_id, position)) in positions.iter().enumerate() {
        if departure.remaining_moves - (tick as i64) <= 0 {
            tracing::warn!("Drone {} ran out of moves at tick {}", path.drone_id, tick);
            frames.push(frame(tick, *dispatch_id, Some(*position), DroneStatus::Error));
            return frames;
        }
        frames.push(frame(tick, *dispatch_id, Some(*position), DroneStatus::Flying));
    }

    let last_id = path
        .deliveries
        .last()
        .map(|delivery| delivery.delivery_id)
        .unwrap_or(RETURN_LEG_ID);
    frames.push(frame(positions.len(), last_id, None, DroneStatus::Idle));
    frames
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Delivery;

    fn p(lng: f64) -> Position {
        Position::new(lng, 0.0)
    }

    fn path() -> DronePath {
        DronePath {
            drone_id: "5".into(),
            deliveries: vec![
                Delivery {
                    delivery_id: 10,
                    flight_path: vec![p(0.0), p(1.0), p(1.0)],
                },
                Delivery {
                    delivery_id: RETURN_LEG_ID,
                    flight_path: vec![p(1.0), p(0.0)],
                },
            ],
        }
    }

    fn departure(remaining_moves: i64, time: &str) -> Departure {
        Departure {
            service_point_id: 2,
            remaining_moves,
            date: NaiveDate::from_ymd_opt(2025, 12, 22).unwrap(),
            time: NaiveTime::parse_from_str(time, "%H:%M:%S").unwrap(),
        }
    }

    #[test]
    fn replay_skips_leg_joins_and_ends_idle() {
        let frames = replay_frames(&path(), &departure(100, "09:00:00"), 30);
        assert_eq!(frames.len(), 5);

        let ids: Vec<i32> = frames.iter().map(|f| f.dispatch_id).collect();
        assert_eq!(ids, vec![10, 10, 10, RETURN_LEG_ID, RETURN_LEG_ID]);
        assert_eq!(frames[3].position, Some(p(0.0)));

        let last = frames.last().unwrap();
        assert_eq!(last.status, DroneStatus::Idle);
        assert_eq!(last.position, None);
        assert_eq!(last.remaining_moves, 96);
        assert_eq!(last.time, NaiveTime::from_hms_opt(9, 2, 0).unwrap());
        assert!(frames[..4].iter().all(|f| f.status == DroneStatus::Flying));
    }

    #[test]
    fn running_out_of_moves_stops_with_error() {
        let frames = replay_frames(&path(), &departure(2, "09:00:00"), 1);
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2].status, DroneStatus::Error);
        assert_eq!(frames[2].remaining_moves, 0);
        assert!(frames[2].position.is_some());
    }

    #[test]
    fn clock_rolls_over_midnight() {
        let frames = replay_frames(&path(), &departure(100, "23:59:30"), 20);
        assert_eq!(frames[1].date, NaiveDate::from_ymd_opt(2025, 12, 22).unwrap());
        assert_eq!(frames[2].date, NaiveDate::from_ymd_opt(2025, 12, 23).unwrap());
        assert_eq!(frames[2].time, NaiveTime::from_hms_opt(0, 0, 10).unwrap());
    }

    #[test]
    fn relay_message_keeps_viewer_fields() {
        let frames = replay_frames(&path(), &departure(100, "09:00:00"), 30);
        let message = RelayMessage::from(&frames[1]);
        assert_eq!(message.drone_id, "5");
        assert_eq!(message.remaining_moves, 99);
        assert_eq!(message.position, Some(p(1.0)));

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["status"], "FLYING");
        assert_eq!(json["dispatchId"], 10);
    }
}
