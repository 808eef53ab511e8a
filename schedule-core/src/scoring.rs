//! Scoring module (C7): travel, home/away balance, team rest, consecutive
//! home/away runs, plus the constraint-engine-delegated components.
//!
//! All arithmetic is 64-bit float; NaN/Inf in any component fails the whole
//! evaluation (`ScheduleError::Scoring`), never silently propagated.

use crate::constraints::Constraint;
use crate::domain::{Location, Schedule};
use crate::engine::cache::EvaluationCache;
use crate::engine::{self, EvaluationResult};
use crate::error::{Result, ScheduleError};

/// Earth radius in miles. Fixed project-wide per the open-question resolution
/// recorded alongside this module: miles, not kilometers.
const EARTH_RADIUS_MILES: f64 = 3958.8;

pub trait DistanceProvider: Send + Sync {
    fn distance_miles(&self, a: Location, b: Location) -> f64;
}

pub struct HaversineDistance;

impl DistanceProvider for HaversineDistance {
    fn distance_miles(&self, a: Location, b: Location) -> f64 {
        haversine_miles(a, b)
    }
}

pub fn haversine_miles(a: Location, b: Location) -> f64 {
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();
    EARTH_RADIUS_MILES * c
}

#[derive(Debug, Clone, Default)]
pub struct ScoreBreakdown {
    pub travel: f64,
    pub home_away_balance: f64,
    pub team_rest: f64,
    pub consecutive_home_away: f64,
    pub constraint_component: f64,
    pub total: f64,
}

fn check_finite(name: &str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(ScheduleError::scoring(format!("{name} produced non-finite value {value}")));
    }
    Ok(value)
}

fn travel_component(schedule: &Schedule, distance: &dyn DistanceProvider) -> Result<f64> {
    let team_count = schedule.teams.len().max(1);
    let mut total = 0.0;
    for (team_id, team) in &schedule.teams {
        let games = schedule.games_for_team(team_id);
        if games.is_empty() {
            continue;
        }
        let mut prev = team.home_location;
        for g in &games {
            let venue_loc = schedule
                .venues
                .get(&g.venue)
                .map(|v| v.location)
                .unwrap_or(team.home_location);
            let d = distance.distance_miles(prev, venue_loc);
            if d < 0.0 {
                return Err(ScheduleError::scoring(format!("negative distance for team {team_id}")));
            }
            total += d;
            prev = venue_loc;
        }
        total += distance.distance_miles(prev, team.home_location);
    }
    check_finite("travel", total / team_count as f64)
}

fn home_away_balance_component(schedule: &Schedule) -> Result<f64> {
    let team_count = schedule.teams.len().max(1);
    let mut total = 0.0;
    for team_id in schedule.team_ids() {
        let (home, away) = schedule.home_away_counts(team_id);
        let total_games = home + away;
        if total_games == 0 {
            continue;
        }
        let expected = total_games as f64 / 2.0;
        total += (home as f64 - expected).abs() / total_games as f64;
    }
    check_finite("home_away_balance", (total / team_count as f64) * 100.0)
}

fn team_rest_component(schedule: &Schedule) -> Result<f64> {
    let mut total = 0.0;
    for team_id in schedule.team_ids() {
        let games = schedule.games_for_team(team_id);
        for pair in games.windows(2) {
            let gap_days = (pair[1].date - pair[0].date).num_days() as f64;
            if gap_days < 0.0 {
                return Err(ScheduleError::invariant(format!(
                    "negative rest gap for team {team_id} between {} and {}",
                    pair[0].id, pair[1].id
                )));
            }
            if gap_days < 1.0 {
                total += (1.0 - gap_days) * 10.0;
            }
        }
    }
    check_finite("team_rest", total)
}

fn consecutive_home_away_component(schedule: &Schedule) -> Result<f64> {
    let mut total = 0.0;
    for team_id in schedule.team_ids() {
        let games = schedule.games_for_team(team_id);
        let mut run_len = 0u32;
        let mut run_is_home: Option<bool> = None;
        for g in &games {
            let is_home = g.home == *team_id;
            match run_is_home {
                Some(h) if h == is_home => run_len += 1,
                _ => {
                    if run_len > 3 {
                        total += (run_len - 3) as f64;
                    }
                    run_len = 1;
                    run_is_home = Some(is_home);
                }
            }
        }
        if run_len > 3 {
            total += (run_len - 3) as f64;
        }
    }
    check_finite("consecutive_home_away", total)
}

/// `score(schedule) = Σ_k w_k · component_k(schedule)`, weights taken from the
/// effective constraint set's aggregated weights per kind; lower is better.
pub fn score(
    schedule: &Schedule,
    effective_constraints: &[Constraint],
    distance: &dyn DistanceProvider,
    cache: Option<&mut EvaluationCache>,
) -> Result<(f64, ScoreBreakdown, EvaluationResult)> {
    use crate::constraints::ConstraintKind;

    let weight_for = |kind: ConstraintKind| -> f64 {
        effective_constraints
            .iter()
            .filter(|c| c.kind == kind)
            .map(|c| c.weight)
            .sum::<f64>()
            .max(0.01)
    };

    let travel = travel_component(schedule, distance)?;
    let home_away_balance = home_away_balance_component(schedule)?;
    let team_rest = team_rest_component(schedule)?;
    let consecutive_home_away = consecutive_home_away_component(schedule)?;

    let evaluation = engine::evaluate(effective_constraints, schedule, cache);
    let constraint_component = evaluation.total_score;

    let total = weight_for(ConstraintKind::TravelDistance) * travel
        + weight_for(ConstraintKind::HomeAwayBalance) * home_away_balance
        + weight_for(ConstraintKind::TeamRest) * team_rest
        + weight_for(ConstraintKind::ConsecutiveHomeGames) * consecutive_home_away
        + constraint_component;

    let total = check_finite("total", total)?;

    Ok((
        total,
        ScoreBreakdown {
            travel,
            home_away_balance,
            team_rest,
            consecutive_home_away,
            constraint_component,
            total,
        },
        evaluation,
    ))
}
