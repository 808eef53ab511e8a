//! Constraint library (C2): the closed kind enumeration, per-sport weight
//! multipliers, and constraint templates.

pub mod templates;
pub mod weights;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Hardness {
    Hard,
    Soft,
    Preference,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    TeamRest,
    VenueAvailability,
    ReligiousDayRestriction,
    ChampionshipDates,
    SeriesStructure,
    WeatherWindow,
    TvBroadcastMandatory,
    TravelDistance,
    HomeAwayBalance,
    ConsecutiveHomeGames,
    ConsecutiveAwayGames,
    TvBroadcastPreferred,
    RivalryGame,
    WeekendDistribution,
    FanTravelPreference,
}

impl ConstraintKind {
    /// Default hardness, base priority (0-100), and category for this kind,
    /// per the closed table every implementer must support.
    pub fn defaults(self) -> (Hardness, u8, &'static str) {
        use ConstraintKind::*;
        use Hardness::*;
        match self {
            TeamRest => (Hard, 100, "scheduling"),
            VenueAvailability => (Hard, 95, "facilities"),
            ReligiousDayRestriction => (Hard, 90, "religious"),
            ChampionshipDates => (Hard, 80, "tournament"),
            SeriesStructure => (Hard, 95, "structure"),
            WeatherWindow => (Hard, 90, "temporal"),
            TvBroadcastMandatory => (Hard, 85, "media"),
            TravelDistance => (Soft, 70, "logistics"),
            HomeAwayBalance => (Soft, 65, "fairness"),
            ConsecutiveHomeGames => (Soft, 60, "balance"),
            ConsecutiveAwayGames => (Soft, 60, "balance"),
            TvBroadcastPreferred => (Soft, 55, "media"),
            RivalryGame => (Soft, 50, "tradition"),
            WeekendDistribution => (Soft, 45, "attendance"),
            FanTravelPreference => (Preference, 30, "fan_experience"),
        }
    }
}

/// Kind-specific parameters, keyed by name for simplicity: a flat map rather
/// than per-kind struct variants, since these kinds share more parameter
/// structure than they differ in it.
pub type ConstraintParams = HashMap<String, ConstraintParamValue>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum ConstraintParamValue {
    Number(f64),
    Text(String),
    TextList(Vec<String>),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConstraintScope {
    #[serde(default)]
    pub sports: Vec<String>,
    #[serde(default)]
    pub teams: Vec<String>,
}

impl ConstraintScope {
    pub fn all() -> Self {
        ConstraintScope {
            sports: vec![],
            teams: vec![],
        }
    }

    pub fn applies_to(&self, sport: &str, team_id: Option<&str>) -> bool {
        let sport_ok = self.sports.is_empty() || self.sports.iter().any(|s| s == sport);
        let team_ok = match team_id {
            None => true,
            Some(t) => self.teams.is_empty() || self.teams.iter().any(|s| s == t),
        };
        sport_ok && team_ok
    }

    fn specificity(&self) -> usize {
        (if self.sports.is_empty() { 0 } else { 1 }) + (if self.teams.is_empty() { 0 } else { 1 })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Constraint {
    pub id: String,
    pub kind: ConstraintKind,
    pub hardness: Hardness,
    pub base_priority: u8,
    pub category: String,
    pub weight: f64,
    #[serde(default)]
    pub params: ConstraintParams,
    pub scope: ConstraintScope,
}

impl Constraint {
    /// A constraint with every default from the closed kind table, ready for
    /// a caller to override `weight`/`params`/`scope` as needed.
    pub fn from_kind(id: impl Into<String>, kind: ConstraintKind, scope: ConstraintScope) -> Self {
        let (hardness, base_priority, category) = kind.defaults();
        Constraint {
            id: id.into(),
            kind,
            hardness,
            base_priority,
            category: category.to_string(),
            weight: 1.0,
            params: ConstraintParams::new(),
            scope,
        }
    }

    pub fn specificity(&self) -> usize {
        self.scope.specificity()
    }

    /// Overlapping scope between two constraints of the same kind, the
    /// precondition for a conflict (§4.3).
    pub fn scopes_overlap(&self, other: &Constraint) -> bool {
        let sport_overlap = self.scope.sports.is_empty()
            || other.scope.sports.is_empty()
            || self
                .scope
                .sports
                .iter()
                .any(|s| other.scope.sports.contains(s));
        let team_overlap = self.scope.teams.is_empty()
            || other.scope.teams.is_empty()
            || self
                .scope
                .teams
                .iter()
                .any(|t| other.scope.teams.contains(t));
        sport_overlap && team_overlap
    }
}

/// Stable ordering: (hardness, descending priority, ascending id).
pub fn stable_order_key(c: &Constraint) -> (Hardness, std::cmp::Reverse<u8>, String) {
    (c.hardness, std::cmp::Reverse(c.base_priority), c.id.clone())
}
