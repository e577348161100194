//! Planner tuning knobs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Upper bound on A* node expansions per leg. The lattice is unbounded, so a
    /// walled-off goal would otherwise never exhaust the frontier.
    pub max_expansions: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_expansions: 1_000_000,
        }
    }
}
