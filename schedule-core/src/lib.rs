//! # schedule-core: conference schedule optimization engine
//!
//! This crate is the optimization core for a 16-team multi-sport athletic
//! conference schedule: a typed constraint library, a parallel simulated
//! annealing optimizer, scoring and refinement, and a bounded constraint
//! evaluation cache.
//!
//! It is a library, not a service: persistence, rosters, HTTP/CLI front-ends,
//! and auth live outside this crate. Given the same inputs and `base_seed`,
//! [`optimize`] is deterministic.
//!
//! ## Quick example
//!
//! ```no_run
//! use schedule_core::{optimize, config::OptimizeOptions, chain::CancelToken};
//! use schedule_core::domain::Schedule;
//!
//! fn run(schedule: &Schedule) {
//!     let options = OptimizeOptions::default();
//!     let result = optimize(schedule, &[], &options, CancelToken::new(), None);
//!     match result {
//!         Ok(optimized) => println!("final score: {}", optimized.metadata.final_score),
//!         Err(e) => eprintln!("optimization failed: {e}"),
//!     }
//! }
//! ```

pub mod chain;
pub mod config;
pub mod constraints;
pub mod domain;
pub mod engine;
pub mod error;
pub mod moves;
pub mod orchestrator;
pub mod progress;
pub mod refinement;
pub mod scoring;

pub use config::OptimizeOptions;
pub use constraints::{Constraint, ConstraintKind};
pub use domain::Schedule;
pub use engine::{EvaluationResult, ValidationResult};
pub use error::{Result, ScheduleError};
pub use moves::Modification;
pub use progress::{ProgressCallback, ProgressEvent};

use chain::CancelToken;

/// `optimize(schedule, options) -> Schedule` (primary entry point).
pub fn optimize(
    schedule: &Schedule,
    constraints: &[Constraint],
    options: &OptimizeOptions,
    cancel_token: CancelToken,
    progress: Option<&ProgressCallback>,
) -> Result<Schedule> {
    orchestrator::optimize(schedule, constraints, options, cancel_token, progress)
}

/// `evaluate(constraints, schedule) -> EvaluationResult` — read-only evaluation.
/// Uncached: one-off evaluations don't benefit from the fingerprint cache,
/// which exists to amortize repeated evaluation inside a chain (§4.5).
pub fn evaluate(constraints: &[Constraint], schedule: &Schedule) -> Result<EvaluationResult> {
    let processed = engine::process(constraints, &schedule.sport, schedule.teams.len())?;
    Ok(engine::evaluate(&processed.effective_constraints, schedule, None))
}

/// `validate_modification(mod, constraints, schedule) -> ValidationResult`.
pub fn validate_modification(
    modification: &Modification,
    constraints: &[Constraint],
    schedule: &Schedule,
) -> Result<ValidationResult> {
    let processed = engine::process(constraints, &schedule.sport, schedule.teams.len())?;
    engine::validate_modification(modification, &processed.effective_constraints, schedule)
}

/// `template(name, params) -> [Constraint]` — constraint templating.
pub fn template(
    name: &str,
    params: &std::collections::HashMap<String, constraints::ConstraintParamValue>,
) -> Result<Vec<Constraint>> {
    constraints::templates::template(name, params)
}
