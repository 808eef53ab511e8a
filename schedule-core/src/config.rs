//! Configuration (§6 Options). Plain serde struct-of-fields with defaults.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OptimizeOptions {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u64,
    #[serde(default = "default_initial_temperature")]
    pub initial_temperature: f64,
    #[serde(default = "default_cooling_rate")]
    pub cooling_rate: f64,
    /// `None` resolves to `min(8, logical cores)` at orchestration time.
    #[serde(default)]
    pub parallel_chains: Option<usize>,
    #[serde(default)]
    pub max_workers: Option<usize>,
    #[serde(default = "default_true")]
    pub adaptive_cooling: bool,
    #[serde(default = "default_true")]
    pub enable_cache: bool,
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
    /// `None` derives a seed from the system clock at call time, exactly once,
    /// outside the deterministic core (the core itself never reads the clock).
    #[serde(default)]
    pub base_seed: Option<u64>,
    #[serde(default = "default_per_chain_timeout_ms")]
    pub per_chain_timeout_ms: u64,
    #[serde(default = "default_diversity_threshold")]
    pub diversity_threshold: f64,
    #[serde(default = "default_refinement_passes")]
    pub refinement_passes: u32,
    /// Ensemble merge travel-adoption threshold (§4.6 step 5), kept tunable
    /// rather than hardcoded.
    #[serde(default = "default_ensemble_travel_threshold")]
    pub ensemble_travel_threshold: f64,
    #[serde(default = "default_stagnation_window")]
    pub stagnation_window: u64,
}

fn default_max_iterations() -> u64 {
    15_000
}
fn default_initial_temperature() -> f64 {
    100.0
}
fn default_cooling_rate() -> f64 {
    0.95
}
fn default_true() -> bool {
    true
}
fn default_cache_size() -> usize {
    10_000
}
fn default_per_chain_timeout_ms() -> u64 {
    300_000
}
fn default_diversity_threshold() -> f64 {
    0.1
}
fn default_refinement_passes() -> u32 {
    3
}
fn default_ensemble_travel_threshold() -> f64 {
    0.95
}
fn default_stagnation_window() -> u64 {
    500
}

impl Default for OptimizeOptions {
    fn default() -> Self {
        OptimizeOptions {
            max_iterations: default_max_iterations(),
            initial_temperature: default_initial_temperature(),
            cooling_rate: default_cooling_rate(),
            parallel_chains: None,
            max_workers: None,
            adaptive_cooling: default_true(),
            enable_cache: default_true(),
            cache_size: default_cache_size(),
            base_seed: None,
            per_chain_timeout_ms: default_per_chain_timeout_ms(),
            diversity_threshold: default_diversity_threshold(),
            refinement_passes: default_refinement_passes(),
            ensemble_travel_threshold: default_ensemble_travel_threshold(),
            stagnation_window: default_stagnation_window(),
        }
    }
}

impl OptimizeOptions {
    pub fn resolved_parallel_chains(&self) -> usize {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        self.parallel_chains.unwrap_or_else(|| cores.min(8)).max(1)
    }
}
