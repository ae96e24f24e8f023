use std::f64::consts::PI;

use crate::config::Glicko2Config;
use crate::constants::{BASELINE_RATING, GLICKO2_SCALE, VARIANCE_SENTINEL};
use crate::matches::{MatchResult, ScoredMatch, Side};
use crate::ratings::{rank_history, RatingModel};
use crate::team::{TeamRating, TeamRatingState};
use crate::win_prob::round_to;

/// A rating expressed on the internal Glicko-2 scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scaled {
    pub mu: f64,
    pub phi: f64,
}

impl Scaled {
    pub fn from_rating(rating: f64, rd: f64) -> Self {
        Scaled {
            mu: (rating - BASELINE_RATING) / GLICKO2_SCALE,
            phi: rd / GLICKO2_SCALE,
        }
    }

    pub fn from_state(state: &TeamRatingState) -> Self {
        Self::from_rating(state.rating, state.rating_deviation)
    }

    /// Back to `(rating, rd)`, both rounded to 2 decimals.
    pub fn to_rating(self) -> (f64, f64) {
        (
            round_to(self.mu * GLICKO2_SCALE + BASELINE_RATING, 2),
            round_to(self.phi * GLICKO2_SCALE, 2),
        )
    }
}

fn g(phi: f64) -> f64 {
    1.0 / (1.0 + 3.0 * phi * phi / (PI * PI)).sqrt()
}

/// Expected score of `mu` against an opponent at `mu_opp` with deviation `phi_opp`.
pub fn expected_score(mu: f64, mu_opp: f64, phi_opp: f64) -> f64 {
    1.0 / (1.0 + (-g(phi_opp) * (mu - mu_opp)).exp())
}

/// Quantities of one single-match period handed to a volatility policy.
#[derive(Debug, Clone, Copy)]
pub struct PeriodStats {
    pub phi: f64,
    pub sigma: f64,
    /// Estimated variance of the rating from the game outcome
    pub variance: f64,
    /// Estimated improvement `v · g(φ_opp) · (s − E)`
    pub delta: f64,
}

/// Chooses the post-match volatility σ'.
pub trait VolatilityPolicy {
    fn next_volatility(&self, stats: &PeriodStats) -> f64;
}

/// σ' = σ; volatility stays at its initial value.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrozenVolatility;

impl VolatilityPolicy for FrozenVolatility {
    fn next_volatility(&self, stats: &PeriodStats) -> f64 {
        stats.sigma
    }
}

/// Glickman's step 5: solve for σ' with the Illinois variant of regula falsi.
#[derive(Debug, Clone, Copy)]
pub struct IterativeVolatility {
    pub tau: f64,
    pub tolerance: f64,
}

impl Default for IterativeVolatility {
    fn default() -> Self {
        Self::from_config(&Glicko2Config::default())
    }
}

impl IterativeVolatility {
    const MAX_ITERATIONS: usize = 100;

    pub fn from_config(config: &Glicko2Config) -> Self {
        IterativeVolatility {
            tau: config.tau,
            tolerance: config.convergence_tolerance,
        }
    }
}

impl VolatilityPolicy for IterativeVolatility {
    fn next_volatility(&self, stats: &PeriodStats) -> f64 {
        let PeriodStats { phi, sigma, variance: v, delta } = *stats;
        let phi_sq = phi * phi;
        let tau_sq = self.tau * self.tau;
        let a = (sigma * sigma).ln();

        let f = |x: f64| {
            let ex = x.exp();
            let denom = phi_sq + v + ex;
            ex * (delta * delta - phi_sq - v - ex) / (2.0 * denom * denom) - (x - a) / tau_sq
        };

        let mut big_a = a;
        let mut big_b = if delta * delta > phi_sq + v {
            (delta * delta - phi_sq - v).ln()
        } else {
            let mut k = 1.0;
            while f(a - k * self.tau) < 0.0 {
                k += 1.0;
            }
            a - k * self.tau
        };

        let mut f_a = f(big_a);
        let mut f_b = f(big_b);
        let mut iterations = 0;
        while (big_b - big_a).abs() > self.tolerance && iterations < Self::MAX_ITERATIONS {
            let big_c = big_a + (big_a - big_b) * f_a / (f_b - f_a);
            let f_c = f(big_c);
            if f_c * f_b <= 0.0 {
                big_a = big_b;
                f_a = f_b;
            } else {
                f_a /= 2.0;
            }
            big_b = big_c;
            f_b = f_c;
            iterations += 1;
        }

        (big_a / 2.0).exp()
    }
}

/// Glicko-2 with every finished match treated as its own rating period.
///
/// Volatility handling is left to the [`VolatilityPolicy`].
#[derive(Debug, Clone, Copy)]
pub struct Glicko2<P = FrozenVolatility> {
    config: Glicko2Config,
    policy: P,
}

impl Glicko2<FrozenVolatility> {
    pub fn new(config: Glicko2Config) -> Self {
        Glicko2 {
            config,
            policy: FrozenVolatility,
        }
    }
}

impl Default for Glicko2<FrozenVolatility> {
    fn default() -> Self {
        Self::new(Glicko2Config::default())
    }
}

impl Glicko2<IterativeVolatility> {
    /// Canonical Glicko-2 with volatility re-estimated after every match.
    pub fn canonical(config: Glicko2Config) -> Self {
        Glicko2 {
            config,
            policy: IterativeVolatility::from_config(&config),
        }
    }
}

impl<P: VolatilityPolicy> Glicko2<P> {
    pub fn with_policy(config: Glicko2Config, policy: P) -> Self {
        Glicko2 { config, policy }
    }

    pub fn config(&self) -> &Glicko2Config {
        &self.config
    }

    /// Update both teams after one match won by `winner`.
    ///
    /// Both sides are computed from the pre-match states.
    pub fn update(
        &self,
        team_a: &TeamRatingState,
        team_b: &TeamRatingState,
        winner: Side,
    ) -> (TeamRatingState, TeamRatingState) {
        let (outcome_a, outcome_b) = match winner {
            Side::A => (1.0, 0.0),
            Side::B => (0.0, 1.0),
        };
        (
            self.update_side(team_a, team_b, outcome_a),
            self.update_side(team_b, team_a, outcome_b),
        )
    }

    /// Ranking from the full finished-match history.
    pub fn power_rankings(&self, matches: &[MatchResult]) -> Vec<TeamRating> {
        rank_history(self, matches)
    }

    fn update_side(
        &self,
        state: &TeamRatingState,
        opponent: &TeamRatingState,
        outcome: f64,
    ) -> TeamRatingState {
        let own = Scaled::from_state(state);
        let opp = Scaled::from_state(opponent);

        let g_opp = g(opp.phi);
        let expected = expected_score(own.mu, opp.mu, opp.phi);

        let v_denominator = g_opp * g_opp * expected * (1.0 - expected);
        let variance = if v_denominator > 0.0 {
            1.0 / v_denominator
        } else {
            VARIANCE_SENTINEL
        };

        let sigma = self.policy.next_volatility(&PeriodStats {
            phi: own.phi,
            sigma: state.volatility,
            variance,
            delta: variance * g_opp * (outcome - expected),
        });

        let phi_star = (own.phi * own.phi + sigma * sigma).sqrt();
        let phi_new = 1.0 / (1.0 / (phi_star * phi_star) + 1.0 / variance).sqrt();
        let mu_new = own.mu + phi_new * phi_new * g_opp * (outcome - expected);

        let (rating, rating_deviation) = Scaled { mu: mu_new, phi: phi_new }.to_rating();
        TeamRatingState {
            team_name: state.team_name.clone(),
            rating,
            rating_deviation,
            volatility: sigma,
            matches_played: state.matches_played + 1,
        }
    }
}

impl<P: VolatilityPolicy> RatingModel for Glicko2<P> {
    fn initial_state(&self, team_name: &str) -> TeamRatingState {
        TeamRatingState::new(team_name, &self.config)
    }

    fn rate(
        &self,
        state_a: &TeamRatingState,
        state_b: &TeamRatingState,
        scored: &ScoredMatch<'_>,
    ) -> (TeamRatingState, TeamRatingState) {
        self.update(state_a, state_b, scored.winner)
    }
}
