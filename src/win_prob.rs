#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};

use crate::constants::{ELO_DIVISOR, GAME_POINTS};
use crate::team::TeamRating;

/// Calculate win probability for team A against team B.
///
/// Logistic Elo curve: `1 / (1 + 10^((R_b - R_a) / 400))`.
///
/// # Arguments
/// * `rating_a` - Power rating of team A
/// * `rating_b` - Power rating of team B
///
/// # Returns
/// Probability that team A wins (0.0 to 1.0)
pub fn calculate_win_prob(rating_a: f64, rating_b: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((rating_b - rating_a) / ELO_DIVISOR))
}

/// Decimal payout odds for an outcome of probability `prob`.
pub fn decimal_odds(prob: f64) -> f64 {
    round_to(1.0 / prob, 2)
}

/// Expected scoreline of a 21-point game given team A's win probability.
///
/// The favourite reaches 21; the underdog's tally shrinks with its chance of
/// winning and is capped below deuce territory.
pub fn predict_scoreline(prob_a: f64) -> (u32, u32) {
    let underdog = |p: f64| -> u32 {
        let points = (GAME_POINTS as f64 * p * 1.8).floor();
        points.clamp(0.0, (GAME_POINTS - 2) as f64) as u32
    };
    if prob_a > 0.5 {
        (GAME_POINTS, underdog(1.0 - prob_a))
    } else {
        (underdog(prob_a), GAME_POINTS)
    }
}

/// Head-to-head forecast for a single fixture.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchupPrediction {
    pub team_a: String,
    pub team_b: String,
    pub win_prob_a: f64,
    pub win_prob_b: f64,
    pub odds_a: f64,
    pub odds_b: f64,
    pub expected_score_a: u32,
    pub expected_score_b: u32,
}

pub fn predict_matchup(team_a: &TeamRating, team_b: &TeamRating) -> MatchupPrediction {
    let win_prob_a = calculate_win_prob(team_a.power_rating, team_b.power_rating);
    let win_prob_b = 1.0 - win_prob_a;
    let (expected_score_a, expected_score_b) = predict_scoreline(win_prob_a);

    MatchupPrediction {
        team_a: team_a.team.clone(),
        team_b: team_b.team.clone(),
        win_prob_a,
        win_prob_b,
        odds_a: decimal_odds(win_prob_a),
        odds_b: decimal_odds(win_prob_b),
        expected_score_a,
        expected_score_b,
    }
}

/// All-vs-all win probabilities; `matrix[i][j]` is row team `i` beating
/// column team `j`, with 0.5 on the diagonal.
pub fn win_probability_matrix(teams: &[TeamRating]) -> Vec<Vec<f64>> {
    teams
        .iter()
        .enumerate()
        .map(|(i, row)| {
            teams
                .iter()
                .enumerate()
                .map(|(j, col)| {
                    if i == j {
                        0.5
                    } else {
                        calculate_win_prob(row.power_rating, col.power_rating)
                    }
                })
                .collect()
        })
        .collect()
}

pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_equal_teams_50_50() {
        assert_eq!(calculate_win_prob(1500.0, 1500.0), 0.5);
    }

    #[test]
    fn test_better_team_favored() {
        let prob = calculate_win_prob(1600.0, 1400.0);
        assert!(prob > 0.75, "200 points should be a clear favourite, got {}", prob);
        assert!(prob < 1.0);
    }

    #[test]
    fn test_400_points_is_ten_to_one() {
        let prob = calculate_win_prob(1900.0, 1500.0);
        assert!((prob - 10.0 / 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_scoreline() {
        assert_eq!(predict_scoreline(0.5), (18, 21));
        assert_eq!(predict_scoreline(0.75), (21, 9));
        assert_eq!(predict_scoreline(0.25), (9, 21));
        assert_eq!(predict_scoreline(0.99), (21, 0));
    }

    #[test]
    fn test_predict_matchup() {
        let a = TeamRating::new("Falcons", 1600.0);
        let b = TeamRating::new("Rockets", 1400.0);
        let prediction = predict_matchup(&a, &b);

        assert!((prediction.win_prob_a + prediction.win_prob_b - 1.0).abs() < 1e-12);
        assert_eq!(prediction.expected_score_a, 21);
        assert!(prediction.expected_score_b < 21);
        assert!(prediction.odds_a < 2.0);
        assert!(prediction.odds_b > 2.0);
        assert_eq!(prediction.odds_a, decimal_odds(prediction.win_prob_a));
    }

    #[test]
    fn test_matrix_shape() {
        let teams = vec![
            TeamRating::new("A", 1550.0),
            TeamRating::new("B", 1500.0),
            TeamRating::new("C", 1450.0),
        ];
        let matrix = win_probability_matrix(&teams);
        assert_eq!(matrix.len(), 3);
        for i in 0..3 {
            assert_eq!(matrix[i][i], 0.5);
            for j in 0..3 {
                assert!((matrix[i][j] + matrix[j][i] - 1.0).abs() < 1e-12);
            }
        }
        assert!(matrix[0][2] > matrix[0][1]);
    }

    proptest! {
        #[test]
        fn prop_symmetric(a in 1000.0f64..2000.0, b in 1000.0f64..2000.0) {
            let p1 = calculate_win_prob(a, b);
            let p2 = calculate_win_prob(b, a);
            prop_assert!((p1 + p2 - 1.0).abs() < 1e-10);
            prop_assert!(p1 > 0.0 && p1 < 1.0);
        }
    }
}
