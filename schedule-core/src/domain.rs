//! Domain model (C1): `Team`, `Venue`, `Game`, `Schedule`, and the invariants
//! that every returned schedule must satisfy.

use crate::error::{Result, ScheduleError};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A geographic point, `(lat, lon)` in degrees.
pub type Location = (f64, f64);

/// Membership tags attached to a team that constraints and refinement consult.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub enum TeamTag {
    NoPlayOnSunday,
    TravelZone(String),
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub home_location: Location,
    pub venues: Vec<String>,
    pub primary_venue: String,
    #[serde(default)]
    pub tags: Vec<TeamTag>,
}

impl Team {
    pub fn no_play_on_sunday(&self) -> bool {
        self.tags.contains(&TeamTag::NoPlayOnSunday)
    }

    pub fn travel_zone(&self) -> Option<&str> {
        self.tags.iter().find_map(|t| match t {
            TeamTag::TravelZone(z) => Some(z.as_str()),
            _ => None,
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Venue {
    pub id: String,
    pub name: String,
    pub location: Location,
    pub capacity: u32,
    pub sports: Vec<String>,
    #[serde(default)]
    pub co_tenants: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct GameFlags {
    #[serde(default)]
    pub rivalry: bool,
    #[serde(default)]
    pub rivalry_late_season_preferred: bool,
    #[serde(default)]
    pub tv_window: Option<String>,
    /// Set once a neutral-site game is intentionally scheduled off the home
    /// team's venue list (exempts the venue-ownership invariant for this game).
    #[serde(default)]
    pub neutral_site: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Game {
    pub id: String,
    pub sport: String,
    pub home: String,
    pub away: String,
    pub venue: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub flags: GameFlags,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ScheduleMetadata {
    pub final_score: f64,
    pub initial_score: Option<f64>,
    pub iterations: u64,
    pub chain_scores: Vec<f64>,
    pub improvements: u64,
    pub conflicts_unresolved: u32,
    pub cache_hit_rate: f64,
    pub elapsed_ms: u64,
    pub partial: bool,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Schedule {
    pub id: String,
    pub sport: String,
    pub season_label: String,
    pub teams: HashMap<String, Team>,
    pub venues: HashMap<String, Venue>,
    pub games: Vec<Game>,
    pub season_window: Option<(NaiveDate, NaiveDate)>,
    pub games_per_team_target: Option<u32>,
    #[serde(default)]
    pub metadata: ScheduleMetadata,
}

impl Schedule {
    /// Deep copy of games; teams/venues are reference data shared by the
    /// optimizer across every clone made during a run.
    pub fn deep_clone(&self) -> Schedule {
        self.clone()
    }

    /// Appends `game` after validating every §3 invariant it touches.
    pub fn add_game(&mut self, game: Game) -> Result<()> {
        self.validate_game(&game)?;
        self.games.push(game);
        Ok(())
    }

    fn validate_game(&self, game: &Game) -> Result<()> {
        if game.home == game.away {
            return Err(ScheduleError::invariant(format!(
                "game {} has home == away ({})",
                game.id, game.home
            )));
        }
        let home_team = self.teams.get(&game.home).ok_or_else(|| {
            ScheduleError::invalid_input(format!(
                "game {} references unknown home team {}",
                game.id, game.home
            ))
        })?;
        if !self.teams.contains_key(&game.away) {
            return Err(ScheduleError::invalid_input(format!(
                "game {} references unknown away team {}",
                game.id, game.away
            )));
        }
        if !game.flags.neutral_site && !home_team.venues.iter().any(|v| v == &game.venue) {
            return Err(ScheduleError::invariant(format!(
                "game {} venue {} is not owned by home team {}",
                game.id, game.venue, game.home
            )));
        }
        if let Some((start, end)) = self.season_window {
            if game.date < start || game.date > end {
                return Err(ScheduleError::invariant(format!(
                    "game {} date {} outside season window [{}, {}]",
                    game.id, game.date, start, end
                )));
            }
        }
        Ok(())
    }

    /// Games involving `team_id`, sorted by date.
    pub fn games_for_team(&self, team_id: &str) -> Vec<&Game> {
        let mut games: Vec<&Game> = self
            .games
            .iter()
            .filter(|g| g.home == team_id || g.away == team_id)
            .collect();
        games.sort_by_key(|g| g.date);
        games
    }

    pub fn games_on(&self, date: NaiveDate) -> Vec<&Game> {
        self.games.iter().filter(|g| g.date == date).collect()
    }

    pub fn home_away_counts(&self, team_id: &str) -> (u32, u32) {
        let mut home = 0u32;
        let mut away = 0u32;
        for g in &self.games {
            if g.home == team_id {
                home += 1;
            } else if g.away == team_id {
                away += 1;
            }
        }
        (home, away)
    }

    pub fn team_ids(&self) -> impl Iterator<Item = &String> {
        self.teams.keys()
    }

    /// Validates every §3 invariant across the whole schedule, used after
    /// bulk construction (not on the hot per-move path, which validates
    /// incrementally via `add_game`/move application).
    pub fn validate_all(&self) -> Result<()> {
        for game in &self.games {
            self.validate_game(game)?;
        }
        if let Some(target) = self.games_per_team_target {
            for team_id in self.teams.keys() {
                let count = self.games_for_team(team_id).len() as u32;
                if count != target {
                    return Err(ScheduleError::invariant(format!(
                        "team {} has {} games, expected {}",
                        team_id, count, target
                    )));
                }
            }
        }
        Ok(())
    }
}
