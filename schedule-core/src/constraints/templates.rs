//! Constraint templates (§4.2, §6 `template(name, params)`): pure functions
//! from `(name, params)` to a pre-configured constraint list.

use super::{Constraint, ConstraintKind, ConstraintParamValue, ConstraintScope};
use crate::error::{Result, ScheduleError};
use std::collections::HashMap;

fn text_list(params: &HashMap<String, ConstraintParamValue>, key: &str) -> Vec<String> {
    match params.get(key) {
        Some(ConstraintParamValue::TextList(v)) => v.clone(),
        Some(ConstraintParamValue::Text(s)) => vec![s.clone()],
        _ => vec![],
    }
}

/// `conference_round_robin`: TEAM_REST, VENUE_AVAILABILITY, HOME_AWAY_BALANCE,
/// TRAVEL_DISTANCE at table defaults, scoped to the given teams.
fn conference_round_robin(params: &HashMap<String, ConstraintParamValue>) -> Vec<Constraint> {
    let teams = text_list(params, "teams");
    let scope = ConstraintScope {
        sports: vec![],
        teams,
    };
    [
        ConstraintKind::TeamRest,
        ConstraintKind::VenueAvailability,
        ConstraintKind::HomeAwayBalance,
        ConstraintKind::TravelDistance,
    ]
    .into_iter()
    .enumerate()
    .map(|(i, kind)| {
        Constraint::from_kind(
            format!("conference_round_robin_{i}"),
            kind,
            scope.clone(),
        )
    })
    .collect()
}

/// `weekend_series`: a SERIES_STRUCTURE constraint (3 games, Fri/Sat/Sun) plus
/// a VENUE_AVAILABILITY constraint pinning all three games to one venue.
fn weekend_series(params: &HashMap<String, ConstraintParamValue>) -> Vec<Constraint> {
    let teams = text_list(params, "teams");
    let scope = ConstraintScope {
        sports: vec![],
        teams,
    };
    let mut series = Constraint::from_kind("weekend_series_structure", ConstraintKind::SeriesStructure, scope.clone());
    series.params.insert(
        "games_per_series".to_string(),
        ConstraintParamValue::Number(3.0),
    );
    series.params.insert(
        "days".to_string(),
        ConstraintParamValue::TextList(vec!["Fri".into(), "Sat".into(), "Sun".into()]),
    );
    let mut venue = Constraint::from_kind("weekend_series_venue", ConstraintKind::VenueAvailability, scope);
    venue.params.insert(
        "single_venue_per_series".to_string(),
        ConstraintParamValue::Number(1.0),
    );
    vec![series, venue]
}

/// `religious_day_restriction`: one constraint per team tagged
/// `TeamTag::NoPlayOnSunday` passed in via the `teams` param.
fn religious_day_restriction(params: &HashMap<String, ConstraintParamValue>) -> Vec<Constraint> {
    text_list(params, "teams")
        .into_iter()
        .enumerate()
        .map(|(i, team_id)| {
            let scope = ConstraintScope {
                sports: vec![],
                teams: vec![team_id],
            };
            Constraint::from_kind(
                format!("religious_day_restriction_{i}"),
                ConstraintKind::ReligiousDayRestriction,
                scope,
            )
        })
        .collect()
}

/// `template(name, params) -> [Constraint]` (§6).
pub fn template(name: &str, params: &HashMap<String, ConstraintParamValue>) -> Result<Vec<Constraint>> {
    match name {
        "conference_round_robin" => Ok(conference_round_robin(params)),
        "weekend_series" => Ok(weekend_series(params)),
        "religious_day_restriction" => Ok(religious_day_restriction(params)),
        other => Err(ScheduleError::invalid_input(format!(
            "unknown constraint template '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_template_is_invalid_input_not_panic() {
        let params = HashMap::new();
        let err = template("does_not_exist", &params).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidInput(_)));
    }

    #[test]
    fn weekend_series_produces_series_and_venue_constraints() {
        let mut params = HashMap::new();
        params.insert(
            "teams".to_string(),
            ConstraintParamValue::TextList(vec!["A".into(), "B".into()]),
        );
        let constraints = template("weekend_series", &params).unwrap();
        assert_eq!(constraints.len(), 2);
        assert!(constraints
            .iter()
            .any(|c| c.kind == ConstraintKind::SeriesStructure));
        assert!(constraints
            .iter()
            .any(|c| c.kind == ConstraintKind::VenueAvailability));
    }

    #[test]
    fn religious_day_restriction_one_per_team() {
        let mut params = HashMap::new();
        params.insert(
            "teams".to_string(),
            ConstraintParamValue::TextList(vec!["BYU".into()]),
        );
        let constraints = template("religious_day_restriction", &params).unwrap();
        assert_eq!(constraints.len(), 1);
        assert_eq!(constraints[0].scope.teams, vec!["BYU".to_string()]);
    }
}
