//! Neighborhood operators (C4): the four move kinds, uniform selection, and
//! bounded-retry invariant-preserving application.

use crate::domain::Schedule;
use crate::error::{Result, ScheduleError};
use rand::Rng;

const MAX_RETRIES: u32 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    SwapDates,
    SwapHomeAway,
    ReassignDate,
    SwapVenues,
}

const ALL_KINDS: [MoveKind; 4] = [
    MoveKind::SwapDates,
    MoveKind::SwapHomeAway,
    MoveKind::ReassignDate,
    MoveKind::SwapVenues,
];

/// A concrete, game-index-addressed instance of one of the four move kinds.
/// Also doubles as the `mod` argument to `validate_modification` (§4.3).
#[derive(Debug, Clone)]
pub enum Modification {
    SwapDates(usize, usize),
    SwapHomeAway(usize),
    ReassignDate(usize, chrono::NaiveDate),
    SwapVenues(usize, usize),
}

impl Modification {
    /// Applies this modification to `schedule` in place, validating every
    /// invariant it touches. Callers that need a speculative check without
    /// committing should apply to a clone first (as `validate_modification` does).
    pub fn apply(&self, schedule: &mut Schedule) -> Result<()> {
        match *self {
            Modification::SwapDates(i, j) => {
                if i == j || i >= schedule.games.len() || j >= schedule.games.len() {
                    return Err(ScheduleError::invalid_input("SWAP_DATES: invalid game indices"));
                }
                let date_i = schedule.games[i].date;
                let date_j = schedule.games[j].date;
                schedule.games[i].date = date_j;
                schedule.games[j].date = date_i;
                validate_indices(schedule, &[i, j])
            }
            Modification::SwapHomeAway(i) => {
                if i >= schedule.games.len() {
                    return Err(ScheduleError::invalid_input("SWAP_HOME_AWAY: invalid game index"));
                }
                let old_home = schedule.games[i].home.clone();
                let new_home = schedule.games[i].away.clone();
                schedule.games[i].home = new_home.clone();
                schedule.games[i].away = old_home.clone();
                if let Some(team) = schedule.teams.get(&new_home) {
                    if schedule.games[i].venue == schedule.teams[&old_home].primary_venue {
                        schedule.games[i].venue = team.primary_venue.clone();
                    }
                }
                validate_indices(schedule, &[i])
            }
            Modification::ReassignDate(i, new_date) => {
                if i >= schedule.games.len() {
                    return Err(ScheduleError::invalid_input("REASSIGN_DATE: invalid game index"));
                }
                schedule.games[i].date = new_date;
                validate_indices(schedule, &[i])
            }
            Modification::SwapVenues(i, j) => {
                if i == j || i >= schedule.games.len() || j >= schedule.games.len() {
                    return Err(ScheduleError::invalid_input("SWAP_VENUES: invalid game indices"));
                }
                let venue_i = schedule.games[i].venue.clone();
                let venue_j = schedule.games[j].venue.clone();
                schedule.games[i].venue = venue_j;
                schedule.games[j].venue = venue_i;
                validate_indices(schedule, &[i, j])
            }
        }
    }
}

fn validate_indices(schedule: &Schedule, indices: &[usize]) -> Result<()> {
    for &idx in indices {
        let game = schedule.games[idx].clone();
        let mut probe = schedule.clone();
        probe.games.clear();
        probe.add_game(game)?;
    }
    Ok(())
}

/// Picks a uniformly random move kind and target game(s), applies it to a
/// clone of `schedule`, retrying up to `MAX_RETRIES` times on invariant
/// violation before aborting the move (returns the original schedule clone
/// unchanged when every retry fails).
pub fn apply_random_move<R: Rng + ?Sized>(schedule: &Schedule, rng: &mut R) -> Schedule {
    if schedule.games.is_empty() {
        return schedule.deep_clone();
    }
    for _ in 0..MAX_RETRIES {
        let kind = ALL_KINDS[rng.random_range(0..ALL_KINDS.len())];
        let modification = sample_modification(schedule, kind, rng);
        let mut candidate = schedule.deep_clone();
        if modification.apply(&mut candidate).is_ok() {
            return candidate;
        }
    }
    schedule.deep_clone()
}

fn sample_modification<R: Rng + ?Sized>(schedule: &Schedule, kind: MoveKind, rng: &mut R) -> Modification {
    let n = schedule.games.len();
    let random_index = |rng: &mut R| rng.random_range(0..n);
    let random_pair = |rng: &mut R| {
        let i = random_index(rng);
        let mut j = random_index(rng);
        while j == i && n > 1 {
            j = random_index(rng);
        }
        (i, j)
    };
    match kind {
        MoveKind::SwapDates => {
            let (i, j) = random_pair(rng);
            Modification::SwapDates(i, j)
        }
        MoveKind::SwapHomeAway => Modification::SwapHomeAway(random_index(rng)),
        MoveKind::ReassignDate => {
            let i = random_index(rng);
            let new_date = random_date_in_range(schedule, rng);
            Modification::ReassignDate(i, new_date)
        }
        MoveKind::SwapVenues => {
            let (i, j) = random_pair(rng);
            Modification::SwapVenues(i, j)
        }
    }
}

fn random_date_in_range<R: Rng + ?Sized>(schedule: &Schedule, rng: &mut R) -> chrono::NaiveDate {
    let (start, end) = match schedule.season_window {
        Some(window) => window,
        None => {
            let dates: Vec<_> = schedule.games.iter().map(|g| g.date).collect();
            let start = *dates.iter().min().unwrap();
            let end = *dates.iter().max().unwrap();
            (start, end)
        }
    };
    let span = (end - start).num_days().max(0);
    let offset = if span == 0 { 0 } else { rng.random_range(0..=span) };
    start + chrono::Duration::days(offset)
}
