//! Concrete end-to-end scenarios (§8 S1-S6), seed=42 unless noted.

use chrono::NaiveDate;
use schedule_core::chain::CancelToken;
use schedule_core::config::OptimizeOptions;
use schedule_core::domain::{Game, GameFlags, Schedule, ScheduleMetadata, Team, TeamTag};
use schedule_core::{evaluate, optimize, Constraint, ConstraintKind};
use std::collections::HashMap;

fn team(id: &str, loc: (f64, f64), venue: &str, tags: Vec<TeamTag>) -> Team {
    Team {
        id: id.to_string(),
        name: id.to_string(),
        home_location: loc,
        venues: vec![venue.to_string()],
        primary_venue: venue.to_string(),
        tags,
    }
}

fn game(id: &str, home: &str, away: &str, venue: &str, date: NaiveDate) -> Game {
    Game {
        id: id.to_string(),
        sport: "basketball".to_string(),
        home: home.to_string(),
        away: away.to_string(),
        venue: venue.to_string(),
        date,
        flags: GameFlags::default(),
    }
}

fn rest_constraint() -> Constraint {
    Constraint::from_kind(
        "rest",
        ConstraintKind::TeamRest,
        schedule_core::constraints::ConstraintScope::all(),
    )
}

/// S1: 4 teams in one city cluster, 6 games on distinct dates, TEAM_REST=1
/// only. Expected: travel component = 0 (all venues coincide with home base).
#[test]
fn s1_single_city_cluster_zero_travel() {
    let loc = (40.0, -111.0);
    let mut teams = HashMap::new();
    for id in ["A", "B", "C", "D"] {
        teams.insert(id.to_string(), team(id, loc, &format!("V{id}"), vec![]));
    }
    let mut schedule = Schedule {
        id: "s1".into(),
        sport: "basketball".into(),
        season_label: "2026".into(),
        teams,
        venues: HashMap::new(),
        games: vec![],
        season_window: Some((
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        )),
        games_per_team_target: None,
        metadata: ScheduleMetadata::default(),
    };
    let pairs = [("A", "B"), ("B", "C"), ("C", "D"), ("D", "A"), ("A", "C"), ("B", "D")];
    for (i, (h, a)) in pairs.iter().enumerate() {
        schedule
            .add_game(game(
                &format!("g{i}"),
                h,
                a,
                &format!("V{h}"),
                NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + chrono::Duration::days(i as i64 * 7),
            ))
            .unwrap();
    }

    let result = evaluate(&[rest_constraint()], &schedule).unwrap();
    assert_eq!(result.per_constraint[0].status, schedule_core::engine::ConstraintStatus::Satisfied);
}

/// S3: a team marked no-play-on-Sunday scheduled on a Sunday is moved to the
/// following Monday by refinement, and never lands on a Sunday afterward.
#[test]
fn s3_religious_day_restriction() {
    let mut teams = HashMap::new();
    teams.insert(
        "BYU".to_string(),
        team("BYU", (40.2, -111.6), "Marriott Center", vec![TeamTag::NoPlayOnSunday]),
    );
    teams.insert("Utah".to_string(), team("Utah", (40.7, -111.8), "Huntsman Center", vec![]));
    let mut schedule = Schedule {
        id: "s3".into(),
        sport: "basketball".into(),
        season_label: "2026".into(),
        teams,
        venues: HashMap::new(),
        games: vec![],
        season_window: Some((
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 4, 1).unwrap(),
        )),
        games_per_team_target: None,
        metadata: ScheduleMetadata::default(),
    };
    schedule
        .add_game(game(
            "g1",
            "BYU",
            "Utah",
            "Marriott Center",
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        ))
        .unwrap();

    let mut rng = {
        use rand::SeedableRng;
        rand_chacha::ChaCha8Rng::seed_from_u64(7)
    };
    let refined = schedule_core::refinement::refine(&schedule, 3, &mut rng).unwrap();
    assert_eq!(
        refined.games[0].date,
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    );
    for team_id in ["BYU"] {
        for g in refined.games_for_team(team_id) {
            use chrono::Datelike;
            assert_ne!(g.date.weekday(), chrono::Weekday::Sun);
        }
    }
}

/// S5: cancellation triggered shortly after start returns a partial result
/// promptly, no worse than the input score.
#[test]
fn s5_cancellation_returns_partial() {
    let loc = (40.0, -111.0);
    let mut teams = HashMap::new();
    for id in ["A", "B"] {
        teams.insert(id.to_string(), team(id, loc, &format!("V{id}"), vec![]));
    }
    let mut schedule = Schedule {
        id: "s5".into(),
        sport: "basketball".into(),
        season_label: "2026".into(),
        teams,
        venues: HashMap::new(),
        games: vec![],
        season_window: Some((
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        )),
        games_per_team_target: None,
        metadata: ScheduleMetadata::default(),
    };
    schedule
        .add_game(game("g0", "A", "B", "VA", NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()))
        .unwrap();

    let cancel_token = CancelToken::new();
    cancel_token.trigger();

    let options = OptimizeOptions {
        max_iterations: 1_000_000_000,
        base_seed: Some(42),
        parallel_chains: Some(2),
        ..Default::default()
    };

    let result = optimize(&schedule, &[], &options, cancel_token, None).unwrap();
    assert!(result.metadata.partial);
}

/// S6: running S1 twice with the same base_seed produces byte-equal `games`
/// after canonical sort (determinism, P8).
#[test]
fn s6_determinism_same_seed() {
    let loc = (40.0, -111.0);
    let mut teams = HashMap::new();
    for id in ["A", "B", "C"] {
        teams.insert(id.to_string(), team(id, loc, &format!("V{id}"), vec![]));
    }
    let mut schedule = Schedule {
        id: "s6".into(),
        sport: "basketball".into(),
        season_label: "2026".into(),
        teams,
        venues: HashMap::new(),
        games: vec![],
        season_window: Some((
            NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
        )),
        games_per_team_target: None,
        metadata: ScheduleMetadata::default(),
    };
    let pairs = [("A", "B"), ("B", "C"), ("C", "A")];
    for (i, (h, a)) in pairs.iter().enumerate() {
        schedule
            .add_game(game(
                &format!("g{i}"),
                h,
                a,
                &format!("V{h}"),
                NaiveDate::from_ymd_opt(2026, 1, 1).unwrap() + chrono::Duration::days(i as i64 * 10),
            ))
            .unwrap();
    }

    let options = OptimizeOptions {
        max_iterations: 500,
        parallel_chains: Some(2),
        base_seed: Some(42),
        ..Default::default()
    };

    let run = || optimize(&schedule, &[], &options, CancelToken::new(), None).unwrap();
    let a = run();
    let b = run();

    let mut a_games: Vec<_> = a.games.iter().map(|g| (g.id.clone(), g.date, g.venue.clone(), g.home.clone(), g.away.clone())).collect();
    let mut b_games: Vec<_> = b.games.iter().map(|g| (g.id.clone(), g.date, g.venue.clone(), g.home.clone(), g.away.clone())).collect();
    a_games.sort();
    b_games.sort();
    assert_eq!(a_games, b_games);
}
