//! Per-sport weight multipliers (§4.2).

use super::ConstraintKind;

/// Multiplier applied to a constraint's base weight when scoped to `sport`.
/// Unlisted (kind, sport) pairs default to `1.0`.
pub fn sport_multiplier(sport: &str, kind: ConstraintKind) -> f64 {
    use ConstraintKind::*;
    match (sport, kind) {
        ("football", TeamRest) => 1.5,
        ("football", TvBroadcastMandatory) => 1.8,
        ("football", TravelDistance) => 1.3,
        ("basketball", ConsecutiveAwayGames) => 1.4,
        ("baseball", WeatherWindow) | ("softball", WeatherWindow) => 2.0,
        ("baseball", SeriesStructure) | ("softball", SeriesStructure) => 1.6,
        ("baseball", TeamRest) | ("softball", TeamRest) => 0.8,
        _ => 1.0,
    }
}
