//! A* search on the fixed-step heading lattice.
//!
//! Every edge is exactly one [`STEP`] along one of the 16 allowed headings, so
//! g counts moves and the straight-line heuristic (in steps) is admissible and
//! consistent. Open-set ties are broken by lower heuristic, then by the
//! lexicographic lattice key (lng, then lat) to keep results reproducible.

use crate::config::PlannerConfig;
use crate::error::{PlanError, PlanResult};
use crate::geometry::{
    contains, euclidean, round_position, segment_crosses_region, step_towards,
    ANGLE_INCREMENT_DEG, COORD_DECIMALS, HEADING_COUNT, STEP,
};
use crate::models::{Position, Region};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Result of planning one leg.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedLeg {
    /// Starts at the requested start, ends within one step of the goal
    pub positions: Vec<Position>,
    pub moves: u32,
    pub nodes_visited: usize,
}

/// Lattice identity of a position after rounding to [`COORD_DECIMALS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct NodeKey {
    lng: i64,
    lat: i64,
}

impl NodeKey {
    fn of(position: &Position) -> Self {
        let scale = 10f64.powi(COORD_DECIMALS);
        Self {
            lng: (position.lng * scale).round() as i64,
            lat: (position.lat * scale).round() as i64,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    key: NodeKey,
    position: Position,
    g_score: u32,
    h_score: FloatOrd,
    f_score: FloatOrd,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_score
            .cmp(&other.f_score)
            .then_with(|| self.h_score.cmp(&other.h_score))
            .then_with(|| self.key.cmp(&other.key))
            .then_with(|| self.g_score.cmp(&other.g_score))
    }
}

fn heuristic(position: &Position, goal: &Position) -> f64 {
    euclidean(position, goal) / STEP
}

fn blocked(from: &Position, to: &Position, regions: &[Region]) -> bool {
    regions
        .iter()
        .any(|region| contains(region, to) || segment_crosses_region(from, to, region))
}

/// Lattice neighbours of `current` that neither lie in nor cross into a region.
pub(crate) fn neighbours(current: &Position, regions: &[Region]) -> Vec<Position> {
    (0..HEADING_COUNT)
        .map(|i| round_position(&step_towards(current, i as f64 * ANGLE_INCREMENT_DEG)))
        .filter(|next| next.is_valid() && !blocked(current, next, regions))
        .collect()
}

/// Plan a single leg with the default [`PlannerConfig`].
pub fn plan_path(start: &Position, goal: &Position, regions: &[Region]) -> PlanResult<PlannedLeg> {
    plan_path_with_config(start, goal, regions, &PlannerConfig::default())
}

/// Plan a single leg avoiding every region.
///
/// The search stops at the first expanded node strictly closer than one step
/// to `goal`.
///
/// # Errors
/// * `InvalidInput` if either endpoint is out of range
/// * `NoPathFound` if the frontier empties (or the expansion guard trips)
pub fn plan_path_with_config(
    start: &Position,
    goal: &Position,
    regions: &[Region],
    config: &PlannerConfig,
) -> PlanResult<PlannedLeg> {
    for endpoint in [start, goal] {
        if !endpoint.is_valid() {
            return Err(PlanError::invalid(format!(
                "Invalid coordinates: {} out of range",
                endpoint
            )));
        }
    }

    let start_key = NodeKey::of(start);
    let start_h = heuristic(start, goal);

    let mut open_set: BinaryHeap<Reverse<OpenNode>> = BinaryHeap::new();
    open_set.push(Reverse(OpenNode {
        key: start_key,
        position: *start,
        g_score: 0,
        h_score: FloatOrd(start_h),
        f_score: FloatOrd(start_h),
    }));
    let mut closed_set: HashSet<NodeKey> = HashSet::new();
    let mut g_score: HashMap<NodeKey, u32> = HashMap::new();
    let mut came_from: HashMap<NodeKey, NodeKey> = HashMap::new();
    let mut positions: HashMap<NodeKey, Position> = HashMap::new();
    g_score.insert(start_key, 0);
    positions.insert(start_key, *start);

    let mut final_key: Option<NodeKey> = None;
    let mut nodes_visited = 0usize;

    while let Some(Reverse(current)) = open_set.pop() {
        if closed_set.contains(&current.key) {
            continue;
        }
        let best_g = g_score.get(&current.key).copied().unwrap_or(u32::MAX);
        if current.g_score > best_g {
            continue;
        }

        nodes_visited += 1;

        if euclidean(&current.position, goal) < STEP {
            final_key = Some(current.key);
            break;
        }
        if nodes_visited >= config.max_expansions {
            tracing::warn!(
                "A* expansion limit {} reached between {} and {}",
                config.max_expansions,
                start,
                goal
            );
            break;
        }

        closed_set.insert(current.key);
        let tentative_g = best_g + 1;

        for next in neighbours(&current.position, regions) {
            let next_key = NodeKey::of(&next);
            if closed_set.contains(&next_key) {
                continue;
            }
            if tentative_g < g_score.get(&next_key).copied().unwrap_or(u32::MAX) {
                came_from.insert(next_key, current.key);
                g_score.insert(next_key, tentative_g);
                positions.insert(next_key, next);

                let h = heuristic(&next, goal);
                open_set.push(Reverse(OpenNode {
                    key: next_key,
                    position: next,
                    g_score: tentative_g,
                    h_score: FloatOrd(h),
                    f_score: FloatOrd(tentative_g as f64 + h),
                }));
            }
        }
    }

    let Some(final_key) = final_key else {
        tracing::warn!("No path found between {} and {}", start, goal);
        return Err(PlanError::NoPathFound {
            from: *start,
            to: *goal,
        });
    };

    let mut path = Vec::new();
    let mut current = Some(final_key);
    while let Some(key) = current {
        if let Some(position) = positions.get(&key) {
            path.push(*position);
        }
        current = if key == start_key {
            None
        } else {
            came_from.get(&key).copied()
        };
    }
    path.reverse();

    let moves = path.len().saturating_sub(1) as u32;
    tracing::debug!(
        "A* leg {} -> {}: {} moves, {} nodes visited",
        start,
        goal,
        moves,
        nodes_visited
    );

    Ok(PlannedLeg {
        positions: path,
        moves,
        nodes_visited,
    })
}
