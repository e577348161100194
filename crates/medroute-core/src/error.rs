//! Error types shared by every planning operation.

use crate::models::Position;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PlanError {
    /// Malformed request data. Never retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No drone/service point combination can serve (part of) the batch.
    #[error("Infeasible allocation: {0}")]
    InfeasibleAllocation(String),

    /// A* exhausted its frontier between two positions.
    #[error("No path found between {from} and {to}")]
    NoPathFound { from: Position, to: Position },

    #[error("Drone not found: {0}")]
    DroneNotFound(String),

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

impl PlanError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    pub(crate) fn infeasible(reason: impl Into<String>) -> Self {
        Self::InfeasibleAllocation(reason.into())
    }
}

pub type PlanResult<T> = Result<T, PlanError>;
