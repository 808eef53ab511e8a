//! Parallel orchestrator (C6): forks chains, selects top-k, ensemble-merges,
//! runs the focused-polish chain, and applies final refinement.
//!
//! Fan-out uses native threads and channels (`std::thread::scope` +
//! `std::sync::mpsc`) rather than an async runtime or worker-pool retry
//! machinery, with only the per-chain deadline and cancellation signal
//! implemented here.

use crate::chain::{run_chain, CancelToken, ChainParams, ChainResult};
use crate::config::OptimizeOptions;
use crate::constraints::Constraint;
use crate::domain::Schedule;
use crate::engine;
use crate::error::{Result, ScheduleError};
use crate::progress::{emit, ProgressCallback, ProgressEvent};
use crate::refinement::refine_counted;
use crate::scoring::{self, DistanceProvider, HaversineDistance};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// Fraction of games differing in (date bucket, venue id, home team id)
/// between two equal-length schedules; `1.0` when lengths differ (§4.6).
pub fn diversity(a: &Schedule, b: &Schedule) -> f64 {
    if a.games.len() != b.games.len() {
        return 1.0;
    }
    if a.games.is_empty() {
        return 0.0;
    }
    let mut a_sorted = a.games.clone();
    let mut b_sorted = b.games.clone();
    a_sorted.sort_by(|x, y| x.id.cmp(&y.id));
    b_sorted.sort_by(|x, y| x.id.cmp(&y.id));
    let differing = a_sorted
        .iter()
        .zip(b_sorted.iter())
        .filter(|(x, y)| x.date != y.date || x.venue != y.venue || x.home != y.home)
        .count();
    differing as f64 / a.games.len() as f64
}

fn select_top_k(results: &[ChainResult], k_fraction: f64) -> Vec<usize> {
    let mut order: Vec<usize> = (0..results.len()).collect();
    order.sort_by(|&i, &j| results[i].best_score.partial_cmp(&results[j].best_score).unwrap());
    let k = ((results.len() as f64) * k_fraction).ceil().max(1.0).min(3.0) as usize;
    order.into_iter().take(k.max(1)).collect()
}

/// Adopts per-team improvements from `candidate` into `base`: travel pattern
/// if candidate's per-team travel is <= `travel_threshold` of base's, and
/// home/away reassignment if candidate's imbalance is strictly smaller.
fn ensemble_adopt(
    base: &mut Schedule,
    candidate: &Schedule,
    distance: &dyn DistanceProvider,
    travel_threshold: f64,
) {
    for team_id in base.teams.keys().cloned().collect::<Vec<_>>() {
        let base_travel = per_team_travel(base, &team_id, distance);
        let candidate_travel = per_team_travel(candidate, &team_id, distance);
        if base_travel > 0.0 && candidate_travel <= base_travel * travel_threshold {
            adopt_team_games(base, candidate, &team_id, /*dates_and_venues=*/ true);
        }

        let base_imbalance = per_team_imbalance(base, &team_id);
        let candidate_imbalance = per_team_imbalance(candidate, &team_id);
        if candidate_imbalance < base_imbalance {
            adopt_team_games(base, candidate, &team_id, /*dates_and_venues=*/ false);
        }
    }
}

fn per_team_travel(schedule: &Schedule, team_id: &str, distance: &dyn DistanceProvider) -> f64 {
    let Some(team) = schedule.teams.get(team_id) else {
        return 0.0;
    };
    let games = schedule.games_for_team(team_id);
    let mut prev = team.home_location;
    let mut total = 0.0;
    for g in &games {
        let venue_loc = schedule.venues.get(&g.venue).map(|v| v.location).unwrap_or(prev);
        total += distance.distance_miles(prev, venue_loc);
        prev = venue_loc;
    }
    total += distance.distance_miles(prev, team.home_location);
    total
}

fn per_team_imbalance(schedule: &Schedule, team_id: &str) -> f64 {
    let (home, away) = schedule.home_away_counts(team_id);
    let total = home + away;
    if total == 0 {
        return 0.0;
    }
    ((home as f64) - (total as f64 / 2.0)).abs()
}

/// Adopts `team_id`'s games from `candidate` into `base` by id. When
/// `dates_and_venues` is set, date and venue are adopted (travel pattern);
/// otherwise only home/away orientation is adopted.
fn adopt_team_games(base: &mut Schedule, candidate: &Schedule, team_id: &str, dates_and_venues: bool) {
    for candidate_game in &candidate.games {
        if candidate_game.home != team_id && candidate_game.away != team_id {
            continue;
        }
        if let Some(base_game) = base.games.iter_mut().find(|g| g.id == candidate_game.id) {
            if dates_and_venues {
                base_game.date = candidate_game.date;
                base_game.venue = candidate_game.venue.clone();
            } else {
                base_game.home = candidate_game.home.clone();
                base_game.away = candidate_game.away.clone();
            }
        }
    }
}

/// `optimize(schedule, options) -> Schedule` (§4.6).
pub fn optimize(
    schedule: &Schedule,
    constraints: &[Constraint],
    options: &OptimizeOptions,
    cancel_token: CancelToken,
    progress: Option<&ProgressCallback>,
) -> Result<Schedule> {
    let start = Instant::now();
    let distance: &dyn DistanceProvider = &HaversineDistance;

    let process_result = engine::process(constraints, &schedule.sport, schedule.teams.len())?;
    let effective_constraints = process_result.effective_constraints;

    let (initial_score, _, _) = scoring::score(schedule, &effective_constraints, distance, None)?;

    let base_seed = options.base_seed.unwrap_or(0);
    let n = options.resolved_parallel_chains();

    emit(
        progress,
        ProgressEvent::OptimizationStart {
            chains: n,
            max_iterations: options.max_iterations,
        },
    );

    let mut seed_rng = StdRng::seed_from_u64(base_seed);
    let chain_inputs: Vec<(u64, f64)> = (0..n)
        .map(|i| {
            let seed_i = base_seed ^ (i as u64);
            let u_i: f64 = seed_rng.random();
            let t0_i = options.initial_temperature * (0.8 + 0.4 * u_i);
            (seed_i, t0_i)
        })
        .collect();

    let max_iter_per_chain = (options.max_iterations / n as u64).max(1);
    let timeout = Duration::from_millis(options.per_chain_timeout_ms);
    let cache_capacity = if options.enable_cache {
        Some(options.cache_size)
    } else {
        None
    };

    let (tx, rx) = mpsc::channel::<(usize, Result<ChainResult>)>();

    let collected: Vec<Option<ChainResult>> = std::thread::scope(|scope| {
        for (chain_index, (seed_i, t0_i)) in chain_inputs.iter().enumerate() {
            let tx = tx.clone();
            let cancel_token = cancel_token.clone();
            let effective_constraints = &effective_constraints;
            let seed_i = *seed_i;
            let t0_i = *t0_i;
            scope.spawn(move || {
                let params = ChainParams {
                    initial: schedule,
                    effective_constraints,
                    distance,
                    t0: t0_i,
                    max_iter: max_iter_per_chain,
                    cooling: options.cooling_rate,
                    adaptive_cooling: options.adaptive_cooling,
                    stagnation_window: options.stagnation_window,
                    seed: seed_i,
                    cache_capacity,
                };
                let result = run_chain(params, &cancel_token);
                let _ = tx.send((chain_index, result));
            });
        }
        drop(tx);

        let mut collected: Vec<Option<ChainResult>> = (0..n).map(|_| None).collect();
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok((idx, Ok(chain_result))) => {
                    log::info!(
                        "chain {idx} done: score={:.4} iterations={}",
                        chain_result.best_score,
                        chain_result.iterations
                    );
                    emit(
                        progress,
                        ProgressEvent::ChainDone {
                            chain_index: idx,
                            best_score: chain_result.best_score,
                            iterations: chain_result.iterations,
                        },
                    );
                    collected[idx] = Some(chain_result);
                }
                Ok((idx, Err(e))) => {
                    log::warn!("chain {idx} failed: {e}");
                }
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    cancel_token.trigger();
                    break;
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }
        collected
    });

    let successful: Vec<ChainResult> = collected.into_iter().flatten().collect();
    if successful.is_empty() {
        return Err(ScheduleError::OptimizationFailed(
            "all chains failed or exceeded the per-chain deadline".to_string(),
        ));
    }

    let top_indices = select_top_k(&successful, 0.6);
    let mut candidates: Vec<&Schedule> = top_indices.iter().map(|&i| &successful[i].best_schedule).collect();

    // Optionally add one diverse candidate not already selected.
    if let Some((diverse_idx, _)) = successful
        .iter()
        .enumerate()
        .filter(|(i, _)| !top_indices.contains(i))
        .map(|(i, r)| {
            let best = &successful[top_indices[0]].best_schedule;
            (*i, diversity(best, &r.best_schedule))
        })
        .filter(|(_, d)| *d > options.diversity_threshold)
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
    {
        candidates.push(&successful[diverse_idx].best_schedule);
    }

    let mut ensemble = candidates[0].deep_clone();
    for candidate in candidates.iter().skip(1) {
        ensemble_adopt(&mut ensemble, *candidate, distance, options.ensemble_travel_threshold);
    }

    // Focused polish chain: one extra chain at T0*0.5, max_iter*0.2, cooling*1.1.
    let polish_seed = base_seed ^ 0xF0CA1;
    let polish_result = run_chain(
        ChainParams {
            initial: &ensemble,
            effective_constraints: &effective_constraints,
            distance,
            t0: options.initial_temperature * 0.5,
            max_iter: ((options.max_iterations as f64) * 0.2) as u64,
            cooling: (options.cooling_rate * 1.1).min(0.999),
            adaptive_cooling: options.adaptive_cooling,
            stagnation_window: options.stagnation_window,
            seed: polish_seed,
            cache_capacity,
        },
        &cancel_token,
    );

    let polished = match polish_result {
        Ok(result) => result.best_schedule,
        Err(e) => {
            log::warn!("focused polish chain failed, using ensemble directly: {e}");
            ensemble
        }
    };

    let mut refine_rng = ChaCha8Rng::seed_from_u64(base_seed ^ 0xA11CE);
    let (refined, passes_run) = match refine_counted(&polished, options.refinement_passes, &mut refine_rng) {
        Ok(r) => r,
        Err(e) => {
            log::warn!("refinement failed, rolling back to pre-refinement schedule: {e}");
            (polished, 0)
        }
    };

    let (final_score, _, _) = scoring::score(&refined, &effective_constraints, distance, None)?;
    emit(
        progress,
        ProgressEvent::RefinementDone {
            passes_run,
            score: final_score,
        },
    );

    let mut result = refined;
    result.metadata.final_score = final_score;
    result.metadata.initial_score = Some(initial_score);
    result.metadata.iterations = successful.iter().map(|r| r.iterations).sum();
    result.metadata.chain_scores = successful.iter().map(|r| r.best_score).collect();
    result.metadata.improvements = successful.iter().map(|r| r.improvements).sum();
    result.metadata.conflicts_unresolved = process_result
        .conflicts
        .iter()
        .filter(|c| c.resolved_by.is_none())
        .count() as u32;
    result.metadata.cache_hit_rate = if successful.is_empty() {
        0.0
    } else {
        successful.iter().map(|r| r.cache_hit_rate).sum::<f64>() / successful.len() as f64
    };
    result.metadata.elapsed_ms = start.elapsed().as_millis() as u64;
    result.metadata.partial = cancel_token.triggered() || successful.iter().any(|r| r.partial);

    emit(
        progress,
        ProgressEvent::OptimizationComplete {
            final_score,
            elapsed_ms: result.metadata.elapsed_ms,
            partial: result.metadata.partial,
        },
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Game, GameFlags, ScheduleMetadata, Team};
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn schedule_with(dates: &[&str]) -> Schedule {
        let mut teams = HashMap::new();
        teams.insert(
            "A".to_string(),
            Team {
                id: "A".into(),
                name: "A".into(),
                home_location: (0.0, 0.0),
                venues: vec!["VA".into()],
                primary_venue: "VA".into(),
                tags: vec![],
            },
        );
        teams.insert(
            "B".to_string(),
            Team {
                id: "B".into(),
                name: "B".into(),
                home_location: (1.0, 1.0),
                venues: vec!["VB".into()],
                primary_venue: "VB".into(),
                tags: vec![],
            },
        );
        let mut s = Schedule {
            id: "s".into(),
            sport: "basketball".into(),
            season_label: "2026".into(),
            teams,
            venues: HashMap::new(),
            games: vec![],
            season_window: None,
            games_per_team_target: None,
            metadata: ScheduleMetadata::default(),
        };
        for (i, d) in dates.iter().enumerate() {
            s.add_game(Game {
                id: format!("g{i}"),
                sport: "basketball".into(),
                home: "A".into(),
                away: "B".into(),
                venue: "VA".into(),
                date: NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap(),
                flags: GameFlags::default(),
            })
            .unwrap();
        }
        s
    }

    #[test]
    fn diversity_is_one_for_unequal_length() {
        let a = schedule_with(&["2026-01-01"]);
        let b = schedule_with(&["2026-01-01", "2026-01-10"]);
        assert_eq!(diversity(&a, &b), 1.0);
    }

    #[test]
    fn diversity_is_zero_for_identical_schedules() {
        let a = schedule_with(&["2026-01-01", "2026-01-10"]);
        let b = schedule_with(&["2026-01-01", "2026-01-10"]);
        assert_eq!(diversity(&a, &b), 0.0);
    }

    #[test]
    fn select_top_k_caps_between_one_and_three() {
        let make = |score: f64| ChainResult {
            best_schedule: schedule_with(&["2026-01-01"]),
            best_score: score,
            iterations: 10,
            improvements: 1,
            acceptance_rate: 0.5,
            cache_hit_rate: 0.0,
            partial: false,
        };
        let results = vec![make(3.0), make(1.0), make(2.0), make(5.0), make(0.5)];
        let top = select_top_k(&results, 0.6);
        assert!(top.len() >= 1 && top.len() <= 3);
        assert_eq!(results[top[0]].best_score, 0.5);
    }
}
