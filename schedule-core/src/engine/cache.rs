//! Fingerprint cache (§4.3): bounded map from `fingerprint(constraints, schedule)`
//! to `EvaluationResult`, approximate-LRU (oldest insertion evicted over capacity).

use super::EvaluationResult;
use crate::constraints::{Constraint, ConstraintParamValue};
use crate::domain::Schedule;
use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};

pub type Fingerprint = u64;

/// Content hash of the constraint set (stable-sorted kind+weight+params) and
/// the schedule's games reduced to `(sport, home, away, date_bucket, venue)`.
pub fn fingerprint(constraints: &[Constraint], schedule: &Schedule) -> Fingerprint {
    let mut hasher = DefaultHasher::new();

    let mut sorted: Vec<&Constraint> = constraints.iter().collect();
    sorted.sort_by_key(|c| c.id.clone());
    for c in sorted {
        (c.kind as u8 as u64).hash(&mut hasher);
        c.weight.to_bits().hash(&mut hasher);
        let mut param_keys: Vec<&String> = c.params.keys().collect();
        param_keys.sort();
        for k in param_keys {
            k.hash(&mut hasher);
            match &c.params[k] {
                ConstraintParamValue::Number(n) => n.to_bits().hash(&mut hasher),
                ConstraintParamValue::Text(s) => s.hash(&mut hasher),
                ConstraintParamValue::TextList(v) => v.hash(&mut hasher),
            }
        }
    }

    let mut tuples: Vec<(String, String, String, String, String)> = schedule
        .games
        .iter()
        .map(|g| {
            (
                g.sport.clone(),
                g.home.clone(),
                g.away.clone(),
                g.date.to_string(),
                g.venue.clone(),
            )
        })
        .collect();
    tuples.sort();
    for t in tuples {
        t.hash(&mut hasher);
    }

    hasher.finish()
}

pub struct EvaluationCache {
    capacity: usize,
    entries: HashMap<Fingerprint, EvaluationResult>,
    insertion_order: VecDeque<Fingerprint>,
    hits: u64,
    misses: u64,
}

impl EvaluationCache {
    pub fn new(capacity: usize) -> Self {
        EvaluationCache {
            capacity,
            entries: HashMap::new(),
            insertion_order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    pub fn get(&mut self, key: Fingerprint) -> Option<EvaluationResult> {
        match self.entries.get(&key) {
            Some(v) => {
                self.hits += 1;
                Some(v.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: Fingerprint, value: EvaluationResult) {
        if !self.entries.contains_key(&key) {
            if self.entries.len() >= self.capacity {
                if let Some(oldest) = self.insertion_order.pop_front() {
                    self.entries.remove(&oldest);
                }
            }
            self.insertion_order.push_back(key);
        }
        self.entries.insert(key, value);
    }

    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
