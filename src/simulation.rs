#[cfg(feature = "python")]
use pyo3::prelude::*;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::config::SimulationConfig;
use crate::constants::SIMULATION_BRACKET_SIZE;
use crate::error::{EngineError, Result};
use crate::game_transform::{play_bracket, seeding_order};
use crate::team::TeamRating;
use crate::win_prob::round_to;

/// Stage-advancement forecast for one team.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub team: String,
    pub power_rating: f64,
    /// Percent of iterations reaching the semifinals
    pub make_semis: f64,
    /// Percent of iterations reaching the final
    pub make_finals: f64,
    /// Percent of iterations winning the title
    pub win_championship: f64,
}

/// Per-team count of iterations in which the team won a game of each round.
#[derive(Clone, Debug, PartialEq)]
pub struct StageTally {
    counts: Vec<Vec<u64>>,
}

impl StageTally {
    pub fn new(teams: usize, rounds: usize) -> Self {
        StageTally {
            counts: vec![vec![0; rounds]; teams],
        }
    }

    pub fn record(&mut self, round: usize, team: usize) {
        self.counts[team][round] += 1;
    }

    pub fn count(&self, team: usize, round: usize) -> u64 {
        self.counts[team][round]
    }

    /// Sum another batch into this one.
    pub fn merge(mut self, other: StageTally) -> StageTally {
        for (mine, theirs) in self.counts.iter_mut().zip(other.counts) {
            for (m, t) in mine.iter_mut().zip(theirs) {
                *m += t;
            }
        }
        self
    }
}

/// Knockout simulator over the top seeds of a ranking.
///
/// The bracket is seeded 1v8, 4v5, 2v7, 3v6 and every game is one draw
/// against the logistic win probability.
#[derive(Debug, Clone, Copy)]
pub struct MonteCarloSimulator {
    bracket_size: usize,
}

impl Default for MonteCarloSimulator {
    fn default() -> Self {
        MonteCarloSimulator {
            bracket_size: SIMULATION_BRACKET_SIZE,
        }
    }
}

impl MonteCarloSimulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `iterations` brackets drawing from `rng`.
    ///
    /// # Arguments
    /// * `teams` - Ranking sorted best first; only the first eight are entered
    /// * `iterations` - Number of brackets to play
    /// * `rng` - Source of every game draw
    ///
    /// # Returns
    /// One forecast per entrant, sorted by championship percentage
    pub fn simulate<R: Rng>(
        &self,
        teams: &[TeamRating],
        iterations: usize,
        rng: &mut R,
    ) -> Result<Vec<Forecast>> {
        let entrants = self.entrants(teams, iterations)?;
        tracing::debug!(teams = entrants.len(), iterations, "running knockout simulation");

        let tally = self.run_batch(entrants, iterations, rng);
        Ok(self.forecast(entrants, &tally, iterations))
    }

    /// Split the iterations into batches on the rayon pool.
    ///
    /// Each batch gets its own `ChaCha8Rng` seeded from a master stream, so a
    /// fixed `config.seed` reproduces the same forecast on any thread count.
    pub fn simulate_parallel(
        &self,
        teams: &[TeamRating],
        config: &SimulationConfig,
    ) -> Result<Vec<Forecast>> {
        let iterations = config.iterations;
        let entrants = self.entrants(teams, iterations)?;
        let batch_size = config.batch_size.max(1);

        let mut master = match config.seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None => ChaCha8Rng::from_entropy(),
        };
        let batches: Vec<(u64, usize)> = (0..iterations)
            .step_by(batch_size)
            .map(|start| (master.gen::<u64>(), batch_size.min(iterations - start)))
            .collect();
        tracing::debug!(
            teams = entrants.len(),
            iterations,
            batches = batches.len(),
            "running parallel knockout simulation"
        );

        let rounds = self.rounds();
        let tally = batches
            .into_par_iter()
            .map(|(seed, n)| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                let tally = self.run_batch(entrants, n, &mut rng);
                tracing::trace!(seed, iterations = n, "batch finished");
                tally
            })
            .reduce(|| StageTally::new(entrants.len(), rounds), StageTally::merge);

        Ok(self.forecast(entrants, &tally, iterations))
    }

    fn rounds(&self) -> usize {
        self.bracket_size.trailing_zeros() as usize
    }

    fn entrants<'a>(&self, teams: &'a [TeamRating], iterations: usize) -> Result<&'a [TeamRating]> {
        if teams.len() < self.bracket_size {
            return Err(EngineError::InsufficientTeams {
                required: self.bracket_size,
                found: teams.len(),
            });
        }
        if iterations == 0 {
            return Err(EngineError::InvalidIterations);
        }
        Ok(&teams[..self.bracket_size])
    }

    fn run_batch<R: Rng>(&self, entrants: &[TeamRating], iterations: usize, rng: &mut R) -> StageTally {
        let ratings: Vec<f64> = entrants.iter().map(|t| t.power_rating).collect();
        let slots = seeding_order(self.bracket_size);
        let mut tally = StageTally::new(entrants.len(), self.rounds());

        for _ in 0..iterations {
            play_bracket(&slots, &ratings, rng, &mut |round, team| tally.record(round, team));
        }

        tally
    }

    fn forecast(&self, entrants: &[TeamRating], tally: &StageTally, iterations: usize) -> Vec<Forecast> {
        let rounds = self.rounds();
        let percent = |team: usize, round: usize| {
            round_to(tally.count(team, round) as f64 / iterations as f64 * 100.0, 1)
        };

        let mut forecast: Vec<Forecast> = entrants
            .iter()
            .enumerate()
            .map(|(i, team)| Forecast {
                team: team.team.clone(),
                power_rating: team.power_rating,
                make_semis: percent(i, rounds - 3),
                make_finals: percent(i, rounds - 2),
                win_championship: percent(i, rounds - 1),
            })
            .collect();

        forecast.sort_by(|a, b| b.win_championship.total_cmp(&a.win_championship));
        forecast
    }
}

/// Half-width of the normal-approximation confidence interval around a
/// forecast percentage.
pub fn sampling_margin(percent: f64, iterations: usize, confidence: f64) -> Result<f64> {
    if !(confidence > 0.0 && confidence < 1.0) {
        return Err(EngineError::InvalidConfidence(confidence));
    }
    if iterations == 0 {
        return Err(EngineError::InvalidIterations);
    }
    let normal = Normal::new(0.0, 1.0).map_err(|_| EngineError::InvalidConfidence(confidence))?;
    let z = normal.inverse_cdf(1.0 - (1.0 - confidence) / 2.0);
    let p = (percent / 100.0).clamp(0.0, 1.0);

    Ok(z * (p * (1.0 - p) / iterations as f64).sqrt() * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_field(n: usize) -> Vec<TeamRating> {
        (0..n)
            .map(|i| TeamRating::new(format!("Team{}", i + 1), 1650.0 - 25.0 * i as f64))
            .collect()
    }

    #[test]
    fn test_insufficient_teams() {
        let sim = MonteCarloSimulator::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let err = sim.simulate(&make_field(7), 100, &mut rng).unwrap_err();
        assert_eq!(err, EngineError::InsufficientTeams { required: 8, found: 7 });
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let sim = MonteCarloSimulator::new();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            sim.simulate(&make_field(8), 0, &mut rng).unwrap_err(),
            EngineError::InvalidIterations
        );
    }

    #[test]
    fn test_only_top_eight_enter() {
        let sim = MonteCarloSimulator::new();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let forecast = sim.simulate(&make_field(12), 200, &mut rng).unwrap();
        assert_eq!(forecast.len(), 8);
        assert!(forecast.iter().all(|f| f.team != "Team9"));
    }

    #[test]
    fn test_percentages_are_consistent() {
        let sim = MonteCarloSimulator::new();
        let mut rng = ChaCha8Rng::seed_from_u64(2024);
        let forecast = sim.simulate(&make_field(8), 10_000, &mut rng).unwrap();

        let semis: f64 = forecast.iter().map(|f| f.make_semis).sum();
        let finals: f64 = forecast.iter().map(|f| f.make_finals).sum();
        let titles: f64 = forecast.iter().map(|f| f.win_championship).sum();
        assert!((semis - 400.0).abs() < 0.5, "semis sum {}", semis);
        assert!((finals - 200.0).abs() < 0.5, "finals sum {}", finals);
        assert!((titles - 100.0).abs() < 2.0, "title sum {}", titles);

        for f in &forecast {
            assert!(f.make_semis >= f.make_finals);
            assert!(f.make_finals >= f.win_championship);
        }
    }

    #[test]
    fn test_sorted_by_championship() {
        let sim = MonteCarloSimulator::new();
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let forecast = sim.simulate(&make_field(8), 5_000, &mut rng).unwrap();
        for pair in forecast.windows(2) {
            assert!(pair[0].win_championship >= pair[1].win_championship);
        }
        assert_eq!(forecast[0].team, "Team1");
    }

    #[test]
    fn test_equal_teams_tie_in_input_order() {
        // A single iteration leaves seven teams tied at 0.0; they must keep
        // input order.
        let field: Vec<TeamRating> = (0..8)
            .map(|i| TeamRating::new(format!("Team{}", i + 1), 1500.0))
            .collect();
        let sim = MonteCarloSimulator::new();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let forecast = sim.simulate(&field, 1, &mut rng).unwrap();

        assert_eq!(forecast[0].win_championship, 100.0);
        let rest: Vec<&str> = forecast[1..].iter().map(|f| f.team.as_str()).collect();
        let mut expected: Vec<&str> = field.iter().map(|t| t.team.as_str()).collect();
        expected.retain(|name| *name != forecast[0].team);
        assert_eq!(rest, expected);
    }

    #[test]
    fn test_dominant_seed() {
        let mut field = make_field(8);
        field[0].power_rating = 2400.0;
        let sim = MonteCarloSimulator::new();
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let forecast = sim.simulate(&field, 2_000, &mut rng).unwrap();
        assert_eq!(forecast[0].team, "Team1");
        assert!(forecast[0].win_championship > 90.0);
    }

    #[test]
    fn test_seeded_runs_reproduce() {
        let sim = MonteCarloSimulator::new();
        let field = make_field(8);
        let a = sim.simulate(&field, 1_000, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        let b = sim.simulate(&field, 1_000, &mut ChaCha8Rng::seed_from_u64(42)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_parallel_reproducible_and_consistent() {
        let sim = MonteCarloSimulator::new();
        let field = make_field(8);
        let config = SimulationConfig {
            iterations: 4_500,
            seed: Some(17),
            batch_size: 1_000,
        };

        let a = sim.simulate_parallel(&field, &config).unwrap();
        let b = sim.simulate_parallel(&field, &config).unwrap();
        assert_eq!(a, b);

        let titles: f64 = a.iter().map(|f| f.win_championship).sum();
        assert!((titles - 100.0).abs() < 2.0);
    }

    #[test]
    fn test_parallel_insufficient_teams() {
        let sim = MonteCarloSimulator::new();
        let config = SimulationConfig::default();
        assert!(matches!(
            sim.simulate_parallel(&make_field(3), &config),
            Err(EngineError::InsufficientTeams { found: 3, .. })
        ));
    }

    #[test]
    fn test_tally_merge() {
        let mut a = StageTally::new(2, 3);
        let mut b = StageTally::new(2, 3);
        a.record(0, 1);
        b.record(0, 1);
        b.record(2, 0);
        let merged = a.merge(b);
        assert_eq!(merged.count(1, 0), 2);
        assert_eq!(merged.count(0, 2), 1);
    }

    #[test]
    fn test_sampling_margin() {
        let margin = sampling_margin(50.0, 10_000, 0.95).unwrap();
        assert!((margin - 0.98).abs() < 0.01, "got {}", margin);
        assert_eq!(sampling_margin(0.0, 100, 0.95).unwrap(), 0.0);
        assert_eq!(
            sampling_margin(50.0, 100, 1.0),
            Err(EngineError::InvalidConfidence(1.0))
        );
        assert!(matches!(
            sampling_margin(50.0, 100, f64::NAN),
            Err(EngineError::InvalidConfidence(_))
        ));
        assert_eq!(sampling_margin(50.0, 0, 0.95), Err(EngineError::InvalidIterations));
    }
}
