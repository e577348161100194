//! CLI configuration from environment.

use medroute_core::PlannerConfig;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    pub snapshot_dir: PathBuf,
    pub max_expansions: Option<usize>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            snapshot_dir: env::var("MEDROUTE_SNAPSHOT_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./snapshot")),
            max_expansions: env::var("MEDROUTE_MAX_EXPANSIONS")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }

    pub fn planner(&self) -> PlannerConfig {
        let mut planner = PlannerConfig::default();
        if let Some(max_expansions) = self.max_expansions {
            planner.max_expansions = max_expansions;
        }
        planner
    }
}
