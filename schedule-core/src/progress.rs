//! Progress sink (§6, §9): a dependency-injected callback, not a pub/sub
//! emitter. The caller supplies it; this crate never installs one of its own.

#[derive(Debug, Clone)]
pub enum ProgressEvent {
    OptimizationStart { chains: usize, max_iterations: u64 },
    ChainDone { chain_index: usize, best_score: f64, iterations: u64 },
    RefinementDone { passes_run: u32, score: f64 },
    OptimizationComplete { final_score: f64, elapsed_ms: u64, partial: bool },
}

pub type ProgressCallback = Box<dyn Fn(&ProgressEvent) + Send + Sync>;

pub fn emit(callback: Option<&ProgressCallback>, event: ProgressEvent) {
    if let Some(cb) = callback {
        cb(&event);
    }
}
