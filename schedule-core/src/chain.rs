//! SA chain (C5): a single annealing run — temperature schedule, acceptance,
//! best tracking. Grounded in the geometric-cooling / Metropolis-acceptance
//! pattern of a simulated-annealing solver, generalized to per-100-iteration
//! cooling with adaptive reheat on stagnation instead of a fixed total-budget
//! schedule.

use crate::constraints::Constraint;
use crate::domain::Schedule;
use crate::engine::cache::EvaluationCache;
use crate::error::Result;
use crate::moves::apply_random_move;
use crate::scoring::{self, DistanceProvider};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation signal shared between the orchestrator and every
/// chain it spawns (§5: checked between iterations, not preemptive).
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken(Arc::new(AtomicBool::new(false)))
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn triggered(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct ChainResult {
    pub best_schedule: Schedule,
    pub best_score: f64,
    pub iterations: u64,
    pub improvements: u64,
    pub acceptance_rate: f64,
    pub cache_hit_rate: f64,
    pub partial: bool,
}

pub struct ChainParams<'a> {
    pub initial: &'a Schedule,
    pub effective_constraints: &'a [Constraint],
    pub distance: &'a dyn DistanceProvider,
    pub t0: f64,
    pub max_iter: u64,
    pub cooling: f64,
    pub adaptive_cooling: bool,
    pub stagnation_window: u64,
    pub seed: u64,
    pub cache_capacity: Option<usize>,
}

/// `run_chain(initial, T0, max_iter, cooling, weights, seed, cancel_token) -> ChainResult` (§4.5).
pub fn run_chain(params: ChainParams, cancel_token: &CancelToken) -> Result<ChainResult> {
    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);
    let mut cache = params.cache_capacity.map(EvaluationCache::new);

    let mut current = params.initial.deep_clone();
    let (mut current_score, _, _) = scoring::score(
        &current,
        params.effective_constraints,
        params.distance,
        cache.as_mut(),
    )?;
    let mut best = current.clone();
    let mut best_score = current_score;

    let mut temperature = params.t0;
    let mut iteration = 0u64;
    let mut last_improvement_i = 0u64;
    let mut improvements = 0u64;
    let mut accepted = 0u64;
    let mut partial = false;

    while temperature > 0.1 && iteration < params.max_iter {
        if cancel_token.triggered() {
            partial = true;
            break;
        }

        let candidate = apply_random_move(&current, &mut rng);
        let (candidate_score, _, _) = scoring::score(
            &candidate,
            params.effective_constraints,
            params.distance,
            cache.as_mut(),
        )?;

        let delta = candidate_score - current_score;
        let accept = delta < 0.0 || rand::Rng::random::<f64>(&mut rng) < (-delta / temperature).exp();

        if accept {
            current = candidate;
            current_score = candidate_score;
            accepted += 1;
            if current_score < best_score {
                best = current.clone();
                best_score = current_score;
                last_improvement_i = iteration;
                improvements += 1;
            }
        }

        iteration += 1;
        if iteration % 100 == 0 {
            temperature *= params.cooling;
            if params.adaptive_cooling
                && iteration.saturating_sub(last_improvement_i) >= params.stagnation_window
            {
                temperature *= 0.95; // faster cooling once, per §4.5 adaptive_cooling
                last_improvement_i = iteration;
            }
        }
    }

    let acceptance_rate = if iteration == 0 {
        0.0
    } else {
        accepted as f64 / iteration as f64
    };
    let cache_hit_rate = cache.as_ref().map(|c| c.hit_rate()).unwrap_or(0.0);

    log::debug!(
        "chain seed={} iterations={} best_score={:.4} acceptance_rate={:.3}",
        params.seed,
        iteration,
        best_score,
        acceptance_rate
    );

    Ok(ChainResult {
        best_schedule: best,
        best_score,
        iterations: iteration,
        improvements,
        acceptance_rate,
        cache_hit_rate,
        partial,
    })
}
