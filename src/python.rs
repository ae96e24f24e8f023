use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::bracket;
use crate::config::{EloConfig, Glicko2Config, SimulationConfig};
use crate::constants::{
    BASELINE_RATING, BASELINE_RD, BASELINE_VOLATILITY, DEFAULT_BATCH_SIZE, DEFAULT_ITERATIONS,
};
use crate::elo::EloMov;
use crate::error::EngineError;
use crate::glicko2::Glicko2;
use crate::matches::{MatchResult, MatchStatus, Side};
use crate::metrics::{EnrichedRating, RatingTier};
use crate::ratings::RatingModel;
use crate::simulation::{Forecast, MonteCarloSimulator};
use crate::team::{TeamRating, TeamRatingState};
use crate::win_prob::{self, MatchupPrediction};

impl From<EngineError> for PyErr {
    fn from(err: EngineError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

#[pymethods]
impl TeamRatingState {
    #[new]
    #[pyo3(signature = (team_name, rating = BASELINE_RATING, rating_deviation = BASELINE_RD, volatility = BASELINE_VOLATILITY, matches_played = 0))]
    fn py_new(
        team_name: String,
        rating: f64,
        rating_deviation: f64,
        volatility: f64,
        matches_played: u32,
    ) -> Self {
        TeamRatingState {
            team_name,
            rating,
            rating_deviation,
            volatility,
            matches_played,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "TeamRatingState({:?}, rating={}, rd={}, volatility={}, matches={})",
            self.team_name, self.rating, self.rating_deviation, self.volatility, self.matches_played
        )
    }
}

#[pymethods]
impl TeamRating {
    #[new]
    fn py_new(team: String, power_rating: f64) -> Self {
        TeamRating::new(team, power_rating)
    }

    fn __repr__(&self) -> String {
        format!("TeamRating({:?}, {})", self.team, self.power_rating)
    }
}

#[pymethods]
impl MatchResult {
    #[new]
    #[pyo3(signature = (team_a = None, team_b = None, score_a = None, score_b = None, winner = None, status = "pending", round_name = None, match_index = 0))]
    #[allow(clippy::too_many_arguments)]
    fn py_new(
        team_a: Option<String>,
        team_b: Option<String>,
        score_a: Option<u32>,
        score_b: Option<u32>,
        winner: Option<String>,
        status: &str,
        round_name: Option<String>,
        match_index: i64,
    ) -> Self {
        let status = if status == "finished" {
            MatchStatus::Finished
        } else {
            MatchStatus::Pending
        };
        MatchResult {
            team_a,
            team_b,
            score_a,
            score_b,
            winner,
            status,
            round_name,
            match_index,
        }
    }

    fn __repr__(&self) -> String {
        format!(
            "MatchResult(#{}, {:?} vs {:?}, {:?})",
            self.match_index, self.team_a, self.team_b, self.status
        )
    }
}

#[pymethods]
impl Forecast {
    fn __repr__(&self) -> String {
        format!(
            "Forecast({:?}, semis={}%, finals={}%, title={}%)",
            self.team, self.make_semis, self.make_finals, self.win_championship
        )
    }
}

#[pymethods]
impl EnrichedRating {
    #[getter]
    fn tier_label(&self) -> &'static str {
        self.tier.label()
    }
}

fn model_for(name: &str) -> PyResult<Box<dyn RatingModel + Send + Sync>> {
    match name {
        "elo" => Ok(Box::new(EloMov::new(EloConfig::default()))),
        "glicko2" => Ok(Box::new(Glicko2::new(Glicko2Config::default()))),
        "glicko2-canonical" => Ok(Box::new(Glicko2::canonical(Glicko2Config::default()))),
        other => Err(PyValueError::new_err(format!("unknown rating model: {other}"))),
    }
}

/// Replay a match history and return the ranking, optionally enriched with
/// dominance, clutch and giant-killer fields.
#[pyfunction]
#[pyo3(signature = (matches, model = "elo", enrich = false))]
fn power_rankings(
    py: Python<'_>,
    matches: Vec<MatchResult>,
    model: &str,
    enrich: bool,
) -> PyResult<PyObject> {
    let model = model_for(model)?;
    let ranking = crate::ratings::rank_history(model.as_ref(), &matches);
    if enrich {
        Ok(crate::metrics::enrich(&matches, &ranking).into_py(py))
    } else {
        Ok(ranking.into_py(py))
    }
}

/// Single-match Glicko-2 update. `winner` is `"team_a"`, `"team_b"` or a team name.
#[pyfunction]
fn glicko2_update(
    state_a: TeamRatingState,
    state_b: TeamRatingState,
    winner: &str,
) -> PyResult<(TeamRatingState, TeamRatingState)> {
    let side = if winner == "team_a" || winner == state_a.team_name {
        Side::A
    } else if winner == "team_b" || winner == state_b.team_name {
        Side::B
    } else {
        return Err(PyValueError::new_err(format!("winner {winner:?} played neither side")));
    };
    Ok(Glicko2::new(Glicko2Config::default()).update(&state_a, &state_b, side))
}

/// Knockout forecast for the top eight of a sorted ranking.
#[pyfunction]
#[pyo3(signature = (teams, iterations = DEFAULT_ITERATIONS, seed = None))]
fn simulate(
    py: Python<'_>,
    teams: Vec<TeamRating>,
    iterations: usize,
    seed: Option<u64>,
) -> PyResult<Vec<Forecast>> {
    let config = SimulationConfig {
        iterations,
        seed,
        batch_size: DEFAULT_BATCH_SIZE,
    };
    let forecast = py.allow_threads(|| MonteCarloSimulator::new().simulate_parallel(&teams, &config))?;
    Ok(forecast)
}

/// Tournament graph as a JSON document.
#[pyfunction]
#[pyo3(signature = (total_teams, num_groups, advancing_per_group, playoff_style = "standard"))]
fn build_bracket(
    total_teams: usize,
    num_groups: usize,
    advancing_per_group: usize,
    playoff_style: &str,
) -> PyResult<String> {
    let graph = bracket::build(total_teams, num_groups, advancing_per_group, playoff_style)?;
    Ok(graph.to_json()?)
}

#[pyfunction]
fn predict_matchup(team_a: TeamRating, team_b: TeamRating) -> MatchupPrediction {
    win_prob::predict_matchup(&team_a, &team_b)
}

#[pymodule]
fn tourney_oracle(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Classes
    m.add_class::<TeamRatingState>()?;
    m.add_class::<TeamRating>()?;
    m.add_class::<MatchResult>()?;
    m.add_class::<MatchStatus>()?;
    m.add_class::<EnrichedRating>()?;
    m.add_class::<RatingTier>()?;
    m.add_class::<Forecast>()?;
    m.add_class::<MatchupPrediction>()?;

    // Functions
    m.add_function(wrap_pyfunction!(power_rankings, m)?)?;
    m.add_function(wrap_pyfunction!(glicko2_update, m)?)?;
    m.add_function(wrap_pyfunction!(simulate, m)?)?;
    m.add_function(wrap_pyfunction!(build_bracket, m)?)?;
    m.add_function(wrap_pyfunction!(predict_matchup, m)?)?;

    // Constants
    m.add("BASELINE_RATING", BASELINE_RATING)?;
    m.add("BASELINE_RD", BASELINE_RD)?;
    m.add("BASELINE_VOLATILITY", BASELINE_VOLATILITY)?;

    Ok(())
}
