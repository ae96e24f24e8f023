//! Tourney Oracle - rating, forecasting and bracket generation for
//! 21-point knockout tournaments.
//!
//! Ratings come from two interchangeable models (margin-of-victory Elo and
//! Glicko-2). Rankings feed a Monte Carlo knockout forecast, and the bracket
//! generator turns a tournament configuration into a match graph. Python
//! bindings are available behind the `python` feature.

pub mod bracket;
pub mod config;
pub mod constants;
pub mod elo;
pub mod error;
pub mod game_transform;
pub mod glicko2;
pub mod matches;
pub mod metrics;
pub mod ratings;
pub mod simulation;
pub mod team;
pub mod win_prob;

#[cfg(feature = "python")]
mod python;

pub use bracket::{
    BracketConfig, BracketEdge, BracketGraphGenerator, BracketMetadata, BracketNode, EdgeKind,
    PlayoffStyle, ScheduleGraph, Stage, TournamentGraph,
};
pub use config::{EloConfig, EngineConfig, Glicko2Config, SimulationConfig};
pub use elo::EloMov;
pub use error::{EngineError, Result};
pub use glicko2::{FrozenVolatility, Glicko2, IterativeVolatility, VolatilityPolicy};
pub use matches::{MatchResult, MatchStatus, ScoredMatch, Side};
pub use metrics::{enrich, EnrichedRating, RatingTier};
pub use ratings::{rank_history, RatingBook, RatingModel};
pub use simulation::{sampling_margin, Forecast, MonteCarloSimulator};
pub use team::{TeamRating, TeamRatingState};
pub use win_prob::{
    calculate_win_prob, decimal_odds, predict_matchup, predict_scoreline, win_probability_matrix,
    MatchupPrediction,
};
