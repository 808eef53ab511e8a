//! Conflict detection and resolution (§4.3): a pairwise pass over constraints
//! that share overlapping scope with incompatible parameters.

use crate::constraints::{Constraint, ConstraintParamValue, Hardness};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictResolution {
    WeightAdjustment,
    PriorityReorder,
    Relaxation,
    AlternativeGeneration,
    ContextualExemption,
}

/// Fixed attempt order (cheapest / least destructive first). A conflict
/// surviving all five is logged unresolved, never fatal.
pub const RESOLUTION_ORDER: [ConflictResolution; 5] = [
    ConflictResolution::WeightAdjustment,
    ConflictResolution::PriorityReorder,
    ConflictResolution::Relaxation,
    ConflictResolution::AlternativeGeneration,
    ConflictResolution::ContextualExemption,
];

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConflictRecord {
    pub a_id: String,
    pub b_id: String,
    pub resolved_by: Option<ConflictResolution>,
}

fn incompatible_params(a: &Constraint, b: &Constraint) -> bool {
    if a.kind != b.kind {
        return false;
    }
    for (key, a_val) in &a.params {
        if let Some(b_val) = b.params.get(key) {
            if !params_equal(a_val, b_val) {
                return true;
            }
        }
    }
    false
}

fn params_equal(a: &ConstraintParamValue, b: &ConstraintParamValue) -> bool {
    match (a, b) {
        (ConstraintParamValue::Number(x), ConstraintParamValue::Number(y)) => {
            (x - y).abs() < f64::EPSILON
        }
        (ConstraintParamValue::Text(x), ConstraintParamValue::Text(y)) => x == y,
        (ConstraintParamValue::TextList(x), ConstraintParamValue::TextList(y)) => x == y,
        _ => false,
    }
}

/// Detects a conflicting pair. Tie-break on equal priority: prefer the side
/// with more specific scope; if still tied, keep both and downgrade the
/// weaker (here: the second by id order) to preference.
pub fn find_conflicts(constraints: &[Constraint]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for i in 0..constraints.len() {
        for j in (i + 1)..constraints.len() {
            let a = &constraints[i];
            let b = &constraints[j];
            if a.scopes_overlap(b) && incompatible_params(a, b) {
                pairs.push((i, j));
            }
        }
    }
    pairs
}

/// Resolves a single conflicting pair by trying each strategy in order.
/// Returns the strategy that resolved it, mutating `constraints` in place.
/// Returns `None` if every strategy left the conflict in place, in which case
/// the tie-break rule (more-specific-scope wins, else downgrade the weaker
/// side to `Preference`) is applied so the pass still makes progress.
pub fn resolve_conflict(constraints: &mut [Constraint], i: usize, j: usize) -> Option<ConflictResolution> {
    for strategy in RESOLUTION_ORDER {
        match strategy {
            ConflictResolution::WeightAdjustment => {
                if constraints[i].hardness == Hardness::Soft
                    && constraints[j].hardness == Hardness::Soft
                {
                    constraints[i].weight *= 0.5;
                    return Some(strategy);
                }
            }
            ConflictResolution::PriorityReorder => {
                if constraints[i].base_priority != constraints[j].base_priority {
                    return Some(strategy);
                }
            }
            ConflictResolution::Relaxation => {
                let (lower, higher) = if constraints[i].base_priority <= constraints[j].base_priority
                {
                    (i, j)
                } else {
                    (j, i)
                };
                if constraints[lower].hardness != Hardness::Hard {
                    constraints[lower].weight *= 0.75;
                    let _ = higher;
                    return Some(strategy);
                }
            }
            ConflictResolution::AlternativeGeneration => {
                if constraints[i].hardness == Hardness::Hard
                    && constraints[j].hardness == Hardness::Hard
                    && constraints[i].specificity() != constraints[j].specificity()
                {
                    return Some(strategy);
                }
            }
            ConflictResolution::ContextualExemption => {
                if constraints[i].hardness == Hardness::Hard
                    && constraints[j].hardness == Hardness::Hard
                {
                    let weaker = if constraints[i].specificity() >= constraints[j].specificity() {
                        j
                    } else {
                        i
                    };
                    constraints[weaker].hardness = Hardness::Preference;
                    return Some(strategy);
                }
            }
        }
    }
    None
}
