#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::Glicko2Config;

/// Strength estimate for one team within a tournament.
///
/// `rating_deviation` and `volatility` only move under the Glicko-2 model;
/// the Elo model leaves them at their starting values.
#[cfg_attr(feature = "python", pyclass(get_all, set_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamRatingState {
    pub team_name: String,
    pub rating: f64,
    pub rating_deviation: f64,
    pub volatility: f64,
    pub matches_played: u32,
}

impl TeamRatingState {
    /// Cold-start state at the configured baseline values.
    pub fn new(team_name: impl Into<String>, config: &Glicko2Config) -> Self {
        TeamRatingState {
            team_name: team_name.into(),
            rating: config.initial_rating,
            rating_deviation: config.initial_rd,
            volatility: config.initial_volatility,
            matches_played: 0,
        }
    }

    /// Cold-start state at 1500 / 350 / 0.06.
    pub fn baseline(team_name: impl Into<String>) -> Self {
        Self::new(team_name, &Glicko2Config::default())
    }

    /// Ranking row with the rating rounded to a whole number.
    pub fn to_team_rating(&self) -> TeamRating {
        TeamRating::new(self.team_name.clone(), self.rating.round())
    }
}

/// `{team, power_rating}` row of a ranking.
#[cfg_attr(feature = "python", pyclass(get_all, set_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TeamRating {
    pub team: String,
    pub power_rating: f64,
}

impl TeamRating {
    pub fn new(team: impl Into<String>, power_rating: f64) -> Self {
        TeamRating {
            team: team.into(),
            power_rating,
        }
    }
}
