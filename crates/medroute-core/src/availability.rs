//! Weekly-roster availability across every date in a batch.

use crate::models::{Availability, DroneForServicePoint, MedDispatchRec};
use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use std::collections::{BTreeMap, BTreeSet};

/// Drone ids per service point id.
pub type ServicePointDrones = BTreeMap<i32, BTreeSet<String>>;

/// Day and time constraints derived from the dispatches sharing one date.
#[derive(Debug, Clone, PartialEq)]
pub struct DateWindow {
    pub date: Option<NaiveDate>,
    pub day_of_week: Option<Weekday>,
    /// Earliest and latest dispatch time on that date
    pub span: Option<(NaiveTime, NaiveTime)>,
}

impl DateWindow {
    pub fn is_unconstrained(&self) -> bool {
        self.day_of_week.is_none() && self.span.is_none()
    }

    /// A slot matches if its day agrees (case-insensitive) and it fully covers the span.
    pub fn is_covered_by(&self, slot: &Availability) -> bool {
        let day_ok = self
            .day_of_week
            .map(|day| slot.day_of_week.eq_ignore_ascii_case(weekday_name(day)))
            .unwrap_or(true);
        let time_ok = self
            .span
            .map(|(start, end)| slot.from <= start && slot.until >= end)
            .unwrap_or(true);
        day_ok && time_ok
    }
}

/// Upper-case English day name as used by the rosters.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MONDAY",
        Weekday::Tue => "TUESDAY",
        Weekday::Wed => "WEDNESDAY",
        Weekday::Thu => "THURSDAY",
        Weekday::Fri => "FRIDAY",
        Weekday::Sat => "SATURDAY",
        Weekday::Sun => "SUNDAY",
    }
}

/// One window per distinct date (undated dispatches form their own group),
/// ordered by date with the undated group first.
pub fn date_windows(batch: &[MedDispatchRec]) -> Vec<DateWindow> {
    let mut by_date: BTreeMap<Option<NaiveDate>, Vec<&MedDispatchRec>> = BTreeMap::new();
    for rec in batch {
        by_date.entry(rec.date).or_default().push(rec);
    }

    by_date
        .into_iter()
        .map(|(date, recs)| {
            let times = recs.iter().filter_map(|rec| rec.time);
            let span = times.fold(None, |acc: Option<(NaiveTime, NaiveTime)>, time| {
                Some(match acc {
                    None => (time, time),
                    Some((lo, hi)) => (lo.min(time), hi.max(time)),
                })
            });
            DateWindow {
                date,
                day_of_week: date.map(|d| d.weekday()),
                span,
            }
        })
        .collect()
}

/// Drones usable for every window, and where they are stationed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AvailabilityResolution {
    pub drones: BTreeSet<String>,
    pub by_service_point: ServicePointDrones,
}

impl AvailabilityResolution {
    pub fn is_empty(&self) -> bool {
        self.drones.is_empty()
    }

    /// Drop drones outside `keep`, and service points left without drones.
    pub fn retain_drones(&mut self, keep: &BTreeSet<String>) {
        self.drones.retain(|id| keep.contains(id));
        for drones in self.by_service_point.values_mut() {
            drones.retain(|id| keep.contains(id));
        }
        self.by_service_point.retain(|_, drones| !drones.is_empty());
    }
}

/// Drones from `capable` that are rostered for a single window, per service point.
pub fn available_for_window(
    capable: &BTreeSet<String>,
    window: &DateWindow,
    rosters: &[DroneForServicePoint],
) -> ServicePointDrones {
    let mut by_service_point = ServicePointDrones::new();

    for roster in rosters {
        for entry in &roster.drones {
            if !capable.contains(&entry.id) {
                continue;
            }
            let qualifies = window.is_unconstrained()
                || entry.availability.iter().any(|slot| window.is_covered_by(slot));
            if qualifies {
                by_service_point
                    .entry(roster.service_point_id)
                    .or_default()
                    .insert(entry.id.clone());
            }
        }
    }

    by_service_point
}

/// Intersect availability across every window.
///
/// Per-service-point sets are seeded by the first window and intersected with
/// each later one; a service point whose set empties is dropped. Any window
/// with no available drone yields an empty resolution.
pub fn resolve_availability(
    capable: &BTreeSet<String>,
    windows: &[DateWindow],
    rosters: &[DroneForServicePoint],
) -> AvailabilityResolution {
    let mut drones = capable.clone();
    let mut by_service_point: Option<ServicePointDrones> = None;

    for window in windows {
        let for_window = available_for_window(&drones, window, rosters);
        let available: BTreeSet<String> = for_window.values().flatten().cloned().collect();

        drones.retain(|id| available.contains(id));
        if drones.is_empty() {
            tracing::debug!("No drone available on {:?}", window.date);
            return AvailabilityResolution::default();
        }

        by_service_point = Some(match by_service_point {
            None => for_window,
            Some(mut previous) => {
                previous.retain(|sp_id, ids| match for_window.get(sp_id) {
                    Some(current) => {
                        ids.retain(|id| current.contains(id));
                        !ids.is_empty()
                    }
                    None => false,
                });
                previous
            }
        });
    }

    let mut resolution = AvailabilityResolution {
        drones,
        by_service_point: by_service_point.unwrap_or_default(),
    };
    let stationed: BTreeSet<String> = resolution
        .by_service_point
        .values()
        .flatten()
        .cloned()
        .collect();
    resolution.retain_drones(&stationed);
    resolution
}
