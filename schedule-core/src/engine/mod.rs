//! Constraint engine (C3): normalization, per-sport weighting, conflict
//! detection/resolution, evaluation, and the fingerprint cache.

pub mod cache;
pub mod conflict;

use crate::constraints::weights::sport_multiplier;
use crate::constraints::{stable_order_key, Constraint, ConstraintParamValue, Hardness};
use crate::domain::Schedule;
use crate::error::{Result, ScheduleError};
use crate::moves::Modification;
use cache::{fingerprint, EvaluationCache};
use conflict::{find_conflicts, resolve_conflict, ConflictRecord};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintStatus {
    Satisfied,
    Partial,
    Violated,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConstraintResult {
    pub constraint_id: String,
    pub status: ConstraintStatus,
    pub score: f64,
    pub weighted_score: f64,
    pub violations: Vec<String>,
    pub suggestions: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct EvaluationResult {
    pub per_constraint: Vec<ConstraintResult>,
    pub total_score: f64,
    pub overall_compliance: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ProcessResult {
    pub effective_constraints: Vec<Constraint>,
    pub conflicts: Vec<ConflictRecord>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ValidationResult {
    pub valid: bool,
    pub suggestions: Vec<String>,
}

/// `process(constraints, context) -> {effective_constraints, conflicts}` (§4.3).
pub fn process(constraints: &[Constraint], sport: &str, team_count: usize) -> Result<ProcessResult> {
    let mut effective: Vec<Constraint> = Vec::with_capacity(constraints.len());
    for c in constraints {
        let mut c = c.clone();
        let multiplier = sport_multiplier(sport, c.kind);
        c.weight *= multiplier;
        // Larger conferences strengthen logistics constraints (contextual adjustment).
        if c.category == "logistics" && team_count > 12 {
            c.weight *= 1.1;
        }
        effective.push(c);
    }

    let conflict_pairs = find_conflicts(&effective);
    let mut conflicts = Vec::with_capacity(conflict_pairs.len());
    for (i, j) in conflict_pairs {
        let resolution = resolve_conflict(&mut effective, i, j);
        conflicts.push(ConflictRecord {
            a_id: effective[i].id.clone(),
            b_id: effective[j].id.clone(),
            resolved_by: resolution,
        });
    }

    effective.sort_by_key(stable_order_key);

    Ok(ProcessResult {
        effective_constraints: effective,
        conflicts,
    })
}

fn evaluate_one(c: &Constraint, schedule: &Schedule) -> ConstraintResult {
    use crate::constraints::ConstraintKind::*;
    let (status, raw_score, violations) = match c.kind {
        TeamRest => evaluate_team_rest(c, schedule),
        ReligiousDayRestriction => evaluate_religious_day(c, schedule),
        HomeAwayBalance => evaluate_home_away_balance(schedule),
        VenueAvailability => evaluate_venue_availability(schedule),
        _ => (ConstraintStatus::Satisfied, 1.0, vec![]),
    };
    ConstraintResult {
        constraint_id: c.id.clone(),
        status,
        score: raw_score,
        weighted_score: raw_score * c.weight,
        violations,
        suggestions: vec![],
    }
}

fn param_number(c: &Constraint, key: &str, default: f64) -> f64 {
    match c.params.get(key) {
        Some(ConstraintParamValue::Number(n)) => *n,
        _ => default,
    }
}

fn evaluate_team_rest(c: &Constraint, schedule: &Schedule) -> (ConstraintStatus, f64, Vec<String>) {
    let min_days = param_number(c, "min_days", 1.0);
    let mut violations = vec![];
    for team_id in schedule.team_ids() {
        if !c.scope.applies_to(&schedule.sport, Some(team_id)) {
            continue;
        }
        let games = schedule.games_for_team(team_id);
        for pair in games.windows(2) {
            let gap = (pair[1].date - pair[0].date).num_days() as f64;
            if gap < min_days {
                violations.push(format!(
                    "{}: gap of {} days between {} and {}",
                    team_id, gap, pair[0].id, pair[1].id
                ));
            }
        }
    }
    let status = if violations.is_empty() {
        ConstraintStatus::Satisfied
    } else {
        ConstraintStatus::Violated
    };
    let score = if violations.is_empty() { 1.0 } else { 0.0 };
    (status, score, violations)
}

fn evaluate_religious_day(c: &Constraint, schedule: &Schedule) -> (ConstraintStatus, f64, Vec<String>) {
    use chrono::Datelike;
    let mut violations = vec![];
    for team_id in &c.scope.teams {
        if let Some(team) = schedule.teams.get(team_id) {
            if team.no_play_on_sunday() {
                for g in schedule.games_for_team(team_id) {
                    if g.date.weekday() == chrono::Weekday::Sun {
                        violations.push(format!("{} scheduled on Sunday {}", g.id, g.date));
                    }
                }
            }
        }
    }
    let status = if violations.is_empty() {
        ConstraintStatus::Satisfied
    } else {
        ConstraintStatus::Violated
    };
    (status, if violations.is_empty() { 1.0 } else { 0.0 }, violations)
}

fn evaluate_home_away_balance(schedule: &Schedule) -> (ConstraintStatus, f64, Vec<String>) {
    let mut worst = 0.0f64;
    let mut violations = vec![];
    for team_id in schedule.team_ids() {
        let (home, away) = schedule.home_away_counts(team_id);
        let total = home + away;
        if total == 0 {
            continue;
        }
        let expected = total as f64 / 2.0;
        let imbalance = (home as f64 - expected).abs() / total as f64;
        worst = worst.max(imbalance);
        if imbalance > 0.2 {
            violations.push(format!("{} imbalance {:.2}", team_id, imbalance));
        }
    }
    let score = (1.0 - worst).max(0.0);
    let status = if violations.is_empty() {
        ConstraintStatus::Satisfied
    } else {
        ConstraintStatus::Partial
    };
    (status, score, violations)
}

fn evaluate_venue_availability(schedule: &Schedule) -> (ConstraintStatus, f64, Vec<String>) {
    let mut violations = vec![];
    for g in &schedule.games {
        if g.flags.neutral_site {
            continue;
        }
        if let Some(home_team) = schedule.teams.get(&g.home) {
            if !home_team.venues.iter().any(|v| v == &g.venue) {
                violations.push(format!("{}: venue {} not owned by {}", g.id, g.venue, g.home));
            }
        }
    }
    let status = if violations.is_empty() {
        ConstraintStatus::Satisfied
    } else {
        ConstraintStatus::Violated
    };
    (status, if violations.is_empty() { 1.0 } else { 0.0 }, violations)
}

/// `evaluate(effective_constraints, schedule) -> EvaluationResult` (§4.3),
/// backed by the fingerprint cache when one is supplied.
pub fn evaluate(
    effective_constraints: &[Constraint],
    schedule: &Schedule,
    cache: Option<&mut EvaluationCache>,
) -> EvaluationResult {
    if let Some(cache) = cache {
        let key = fingerprint(effective_constraints, schedule);
        if let Some(hit) = cache.get(key) {
            return hit;
        }
        let result = evaluate_uncached(effective_constraints, schedule);
        cache.insert(key, result.clone());
        return result;
    }
    evaluate_uncached(effective_constraints, schedule)
}

fn evaluate_uncached(effective_constraints: &[Constraint], schedule: &Schedule) -> EvaluationResult {
    let per_constraint: Vec<ConstraintResult> = effective_constraints
        .iter()
        .map(|c| evaluate_one(c, schedule))
        .collect();

    let total_score: f64 = per_constraint.iter().map(|r| r.weighted_score).sum();

    let hard_total = effective_constraints
        .iter()
        .filter(|c| c.hardness == Hardness::Hard)
        .count();
    let hard_satisfied = effective_constraints
        .iter()
        .zip(per_constraint.iter())
        .filter(|(c, r)| c.hardness == Hardness::Hard && r.status == ConstraintStatus::Satisfied)
        .count();
    let overall_compliance = if hard_total == 0 {
        1.0
    } else {
        hard_satisfied as f64 / hard_total as f64
    };

    EvaluationResult {
        per_constraint,
        total_score,
        overall_compliance,
    }
}

/// `validate_modification(mod, active_constraints, current_schedule) -> ValidationResult`.
/// A modification is valid iff no hard constraint is violated strictly more
/// after applying it.
pub fn validate_modification(
    modification: &Modification,
    active_constraints: &[Constraint],
    current_schedule: &Schedule,
) -> Result<ValidationResult> {
    let before = evaluate_uncached(active_constraints, current_schedule);
    let mut candidate = current_schedule.deep_clone();
    modification
        .apply(&mut candidate)
        .map_err(|e| ScheduleError::invalid_input(format!("modification not applicable: {e}")))?;
    let after = evaluate_uncached(active_constraints, &candidate);

    let hard_violations_before = count_hard_violations(active_constraints, &before);
    let hard_violations_after = count_hard_violations(active_constraints, &after);

    let valid = hard_violations_after <= hard_violations_before;
    let mut suggestions = vec![];
    if !valid {
        suggestions.push("modification increases hard-constraint violations".to_string());
    }
    Ok(ValidationResult { valid, suggestions })
}

fn count_hard_violations(constraints: &[Constraint], eval: &EvaluationResult) -> usize {
    constraints
        .iter()
        .zip(eval.per_constraint.iter())
        .filter(|(c, r)| c.hardness == Hardness::Hard && r.status != ConstraintStatus::Satisfied)
        .count()
}
