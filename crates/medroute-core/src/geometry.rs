//! Planar coordinate math on (lng, lat) degrees.
//!
//! Distances are plain Euclidean norms in degree space; the planner works on a
//! fixed-step lattice small enough that projection error does not matter.

use crate::error::{PlanError, PlanResult};
use crate::models::{Position, Region};

/// Lattice step length in degrees.
pub const STEP: f64 = 0.00015;

/// Allowed heading granularity for a single move.
pub const ANGLE_INCREMENT_DEG: f64 = 22.5;

/// Number of headings on the lattice (360 / 22.5).
pub const HEADING_COUNT: usize = 16;

/// Decimal places kept for lattice positions.
pub const COORD_DECIMALS: i32 = 6;

fn require_valid(position: &Position) -> PlanResult<()> {
    if position.is_valid() {
        Ok(())
    } else {
        Err(PlanError::invalid(format!(
            "Invalid coordinates: {} out of range",
            position
        )))
    }
}

fn require_valid_angle(angle_deg: f64) -> PlanResult<()> {
    if !angle_deg.is_finite()
        || angle_deg < 0.0
        || angle_deg >= 360.0
        || angle_deg % ANGLE_INCREMENT_DEG != 0.0
    {
        return Err(PlanError::invalid(format!(
            "Angle {} must be a multiple of {} degrees in [0, 360)",
            angle_deg, ANGLE_INCREMENT_DEG
        )));
    }
    Ok(())
}

/// Euclidean distance without range checks.
pub(crate) fn euclidean(a: &Position, b: &Position) -> f64 {
    let d_lng = a.lng - b.lng;
    let d_lat = a.lat - b.lat;
    (d_lng * d_lng + d_lat * d_lat).sqrt()
}

/// Euclidean distance between two validated positions.
pub fn distance(a: &Position, b: &Position) -> PlanResult<f64> {
    require_valid(a)?;
    require_valid(b)?;
    Ok(euclidean(a, b))
}

/// True when the two positions are strictly less than one [`STEP`] apart.
pub fn is_close_to(a: &Position, b: &Position) -> PlanResult<bool> {
    Ok(distance(a, b)? < STEP)
}

/// Move one [`STEP`] from `start` along `angle_deg` (0 = east, 90 = north).
///
/// # Errors
/// `InvalidInput` if `start` is out of range or the angle is not a
/// non-negative multiple of 22.5 below 360.
pub fn next_position(start: &Position, angle_deg: f64) -> PlanResult<Position> {
    require_valid(start)?;
    require_valid_angle(angle_deg)?;
    Ok(step_towards(start, angle_deg))
}

pub(crate) fn step_towards(start: &Position, angle_deg: f64) -> Position {
    let angle_rad = angle_deg.to_radians();
    Position::new(
        start.lng + STEP * angle_rad.cos(),
        start.lat + STEP * angle_rad.sin(),
    )
}

/// Round to [`COORD_DECIMALS`] places.
pub fn round_coord(value: f64) -> f64 {
    let scale = 10f64.powi(COORD_DECIMALS);
    (value * scale).round() / scale
}

pub fn round_position(position: &Position) -> Position {
    Position::new(round_coord(position.lng), round_coord(position.lat))
}

/// Even-odd ray cast. A point lying exactly on an edge counts as inside.
pub fn is_in_region(position: &Position, region: &Region) -> PlanResult<bool> {
    require_valid(position)?;
    Ok(contains(region, position))
}

pub(crate) fn contains(region: &Region, p: &Position) -> bool {
    let mut inside = false;
    for (v1, v2) in region.edges() {
        if point_on_edge(p, v1, v2) {
            return true;
        }
        if ray_crosses_edge(p, v1, v2) {
            inside = !inside;
        }
    }
    inside
}

fn ray_crosses_edge(p: &Position, v1: &Position, v2: &Position) -> bool {
    ((p.lat < v1.lat) != (p.lat < v2.lat))
        && (p.lng < v2.lng + (p.lat - v2.lat) * ((v1.lng - v2.lng) / (v1.lat - v2.lat)))
}

/// Exactly collinear with `a`-`b` and inside its bounding box.
pub fn point_on_edge(p: &Position, a: &Position, b: &Position) -> bool {
    if orient(a, b, p) != 0.0 {
        return false;
    }
    p.lng >= a.lng.min(b.lng)
        && p.lng <= a.lng.max(b.lng)
        && p.lat >= a.lat.min(b.lat)
        && p.lat <= a.lat.max(b.lat)
}

/// Twice the signed area of triangle (p, q, r).
fn orient(p: &Position, q: &Position, r: &Position) -> f64 {
    (q.lng - p.lng) * (r.lat - p.lat) - (q.lat - p.lat) * (r.lng - p.lng)
}

/// Proper crossing or collinear touching of segments a1-a2 and b1-b2.
/// Exact arithmetic only, no tolerance.
pub fn segments_intersect(a1: &Position, a2: &Position, b1: &Position, b2: &Position) -> bool {
    let o1 = orient(a1, a2, b1);
    let o2 = orient(a1, a2, b2);
    let o3 = orient(b1, b2, a1);
    let o4 = orient(b1, b2, a2);

    if ((o1 < 0.0) != (o2 < 0.0)) && ((o3 < 0.0) != (o4 < 0.0)) {
        return true;
    }

    (o1 == 0.0 && point_on_edge(b1, a1, a2))
        || (o2 == 0.0 && point_on_edge(b2, a1, a2))
        || (o3 == 0.0 && point_on_edge(a1, b1, b2))
        || (o4 == 0.0 && point_on_edge(a2, b1, b2))
}

/// True if the move `from` -> `to` touches or crosses the region boundary.
pub fn segment_crosses_region(from: &Position, to: &Position, region: &Region) -> bool {
    region
        .edges()
        .any(|(v1, v2)| segments_intersect(from, to, v1, v2))
}

/// Arithmetic mean of positions; `None` for an empty input.
pub fn centroid<'a, I>(positions: I) -> Option<Position>
where
    I: IntoIterator<Item = &'a Position>,
{
    let mut count = 0usize;
    let mut sum_lng = 0.0;
    let mut sum_lat = 0.0;
    for position in positions {
        count += 1;
        sum_lng += position.lng;
        sum_lat += position.lat;
    }
    if count == 0 {
        return None;
    }
    Some(Position::new(sum_lng / count as f64, sum_lat / count as f64))
}
