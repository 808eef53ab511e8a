//! Error taxonomy for the scheduling core.
//!
//! Mirrors the propagation policy: per-chain failures are caught and logged by
//! the orchestrator, which proceeds with surviving chains; [`ScheduleError::InvalidInput`]
//! and [`ScheduleError::OptimizationFailed`] propagate to the caller. Unresolved
//! constraint conflicts are not represented here at all — they are recorded in
//! result metadata, never returned as an `Err`.

use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while building, evaluating, or optimizing a schedule.
#[derive(Error, Debug, Serialize, Clone)]
pub enum ScheduleError {
    /// Malformed input: unknown constraint kind, duplicate game id, a team
    /// referenced by a game that isn't in the schedule's team set, or similar.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A move or refinement pass produced a schedule violating a domain
    /// invariant (home == away, venue not owned by home team, date outside
    /// the season window, negative or overlapping rest gap). Always a bug in
    /// the caller or in this crate, never a user-correctable condition.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// A score component produced NaN or infinity, or a negative distance.
    #[error("scoring failure: {0}")]
    Scoring(String),

    /// All chains failed or exceeded their deadline with no usable result.
    #[error("optimization failed: {0}")]
    OptimizationFailed(String),
}

impl ScheduleError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        ScheduleError::InvalidInput(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        ScheduleError::InvariantViolation(msg.into())
    }

    pub fn scoring(msg: impl Into<String>) -> Self {
        ScheduleError::Scoring(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
