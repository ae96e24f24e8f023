#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::{CLUTCH_MARGIN, GIANT_KILLER_CEILING, TIER_A, TIER_B, TIER_S};
use crate::matches::{MatchResult, Side};
use crate::team::TeamRating;
use crate::win_prob::round_to;

#[cfg_attr(feature = "python", pyclass(eq, eq_int))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatingTier {
    /// Favourite
    S,
    /// Contender
    A,
    /// Mid-table
    B,
    /// Underdog
    C,
}

impl RatingTier {
    pub fn from_rating(rating: f64) -> Self {
        if rating >= TIER_S {
            RatingTier::S
        } else if rating >= TIER_A {
            RatingTier::A
        } else if rating >= TIER_B {
            RatingTier::B
        } else {
            RatingTier::C
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RatingTier::S => "favourite",
            RatingTier::A => "contender",
            RatingTier::B => "mid-table",
            RatingTier::C => "underdog",
        }
    }
}

/// Raw per-team counters.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScoringTally {
    pub points_scored: u64,
    pub points_conceded: u64,
    pub clutch_games: u32,
    pub clutch_wins: u32,
}

impl ScoringTally {
    /// Points scored over points conceded, the denominator floored at 1.
    pub fn dominance_quotient(&self) -> f64 {
        round_to(
            self.points_scored as f64 / self.points_conceded.max(1) as f64,
            2,
        )
    }

    /// Percentage of clutch games won, 0.0 without any clutch games.
    pub fn clutch_win_rate(&self) -> f64 {
        if self.clutch_games == 0 {
            return 0.0;
        }
        round_to(self.clutch_wins as f64 / self.clutch_games as f64 * 100.0, 1)
    }
}

pub fn is_clutch(margin: u32) -> bool {
    margin <= CLUTCH_MARGIN
}

pub fn is_giant_killer(dominance_quotient: f64, rating: f64) -> bool {
    dominance_quotient > 1.0 && rating.round() < GIANT_KILLER_CEILING
}

/// Accumulate scoring tallies over every rateable match.
pub fn scoring_tallies(matches: &[MatchResult]) -> HashMap<String, ScoringTally> {
    let mut tallies: HashMap<String, ScoringTally> = HashMap::new();

    for scored in matches.iter().filter_map(MatchResult::scored) {
        let clutch = is_clutch(scored.margin());
        for side in [Side::A, Side::B] {
            let tally = tallies.entry(scored.team(side).to_string()).or_default();
            tally.points_scored += scored.points(side) as u64;
            tally.points_conceded += scored.points(side.opponent()) as u64;
            if clutch {
                tally.clutch_games += 1;
                if scored.winner == side {
                    tally.clutch_wins += 1;
                }
            }
        }
    }

    tallies
}

/// Ranking row with enrichment fields.
#[cfg_attr(feature = "python", pyclass(get_all))]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRating {
    pub team: String,
    pub power_rating: f64,
    pub dominance_quotient: f64,
    pub clutch_win_rate: f64,
    pub giant_killer: bool,
    pub tier: RatingTier,
}

/// Attach metrics to each ranking row, preserving the ranking order.
///
/// # Arguments
/// * `matches` - Full match history; unrateable records are ignored
/// * `rankings` - Ranking rows, already sorted
///
/// # Returns
/// One enriched row per ranking row. Teams without a scored match get a
/// dominance quotient of 1.0 and a clutch win rate of 0.0
pub fn enrich(matches: &[MatchResult], rankings: &[TeamRating]) -> Vec<EnrichedRating> {
    let tallies = scoring_tallies(matches);
    tracing::debug!(teams = rankings.len(), tallied = tallies.len(), "enriching rankings");

    rankings
        .iter()
        .map(|row| {
            let (dominance_quotient, clutch_win_rate) = match tallies.get(&row.team) {
                Some(tally) => (tally.dominance_quotient(), tally.clutch_win_rate()),
                None => (1.0, 0.0),
            };
            EnrichedRating {
                team: row.team.clone(),
                power_rating: row.power_rating,
                dominance_quotient,
                clutch_win_rate,
                giant_killer: is_giant_killer(dominance_quotient, row.power_rating),
                tier: RatingTier::from_rating(row.power_rating),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elo::EloMov;

    #[test]
    fn test_giant_killer_flag() {
        assert!(is_giant_killer(1.2, 1500.0));
        assert!(!is_giant_killer(1.2, 1600.0));
        assert!(!is_giant_killer(1.0, 1500.0));
        // 1549.6 rounds up to the ceiling
        assert!(!is_giant_killer(1.2, 1549.6));
    }

    #[test]
    fn test_tiers() {
        assert_eq!(RatingTier::from_rating(1550.0), RatingTier::S);
        assert_eq!(RatingTier::from_rating(1520.0), RatingTier::A);
        assert_eq!(RatingTier::from_rating(1485.0), RatingTier::B);
        assert_eq!(RatingTier::from_rating(1400.0), RatingTier::C);
        assert_eq!(RatingTier::C.label(), "underdog");
    }

    #[test]
    fn test_tallies() {
        let matches = vec![
            MatchResult::finished(1, "A", "B", 21, 19, "A"),
            MatchResult::finished(2, "A", "C", 9, 21, "C"),
            MatchResult::finished(3, "B", "C", 22, 20, "B"),
        ];
        let tallies = scoring_tallies(&matches);

        let a = &tallies["A"];
        assert_eq!(a.points_scored, 30);
        assert_eq!(a.points_conceded, 40);
        assert_eq!(a.dominance_quotient(), 0.75);
        assert_eq!(a.clutch_games, 1);
        assert_eq!(a.clutch_win_rate(), 100.0);

        let b = &tallies["B"];
        assert_eq!(b.clutch_games, 2);
        assert_eq!(b.clutch_wins, 1);
        assert_eq!(b.clutch_win_rate(), 50.0);
    }

    #[test]
    fn test_clutch_rate_one_decimal() {
        let tally = ScoringTally {
            clutch_games: 3,
            clutch_wins: 1,
            ..Default::default()
        };
        assert_eq!(tally.clutch_win_rate(), 33.3);
    }

    #[test]
    fn test_shutout_floors_denominator() {
        let tally = ScoringTally {
            points_scored: 21,
            points_conceded: 0,
            ..Default::default()
        };
        assert_eq!(tally.dominance_quotient(), 21.0);
    }

    #[test]
    fn test_enrich_ranking() {
        let matches = vec![
            MatchResult::finished(1, "A", "B", 21, 10, "A"),
            MatchResult::finished(2, "B", "C", 21, 19, "B"),
        ];
        let mut rankings = EloMov::default().power_rankings(&matches);
        rankings.push(TeamRating::new("Idle", 1500.0));

        let enriched = enrich(&matches, &rankings);
        assert_eq!(enriched.len(), 4);
        assert_eq!(enriched[0].team, "A");
        assert_eq!(enriched[0].dominance_quotient, 2.1);
        assert_eq!(enriched[0].clutch_win_rate, 0.0);
        // 1532 is still below the ceiling
        assert!(enriched[0].giant_killer);

        let idle = enriched.iter().find(|r| r.team == "Idle").unwrap();
        assert_eq!(idle.dominance_quotient, 1.0);
        assert_eq!(idle.clutch_win_rate, 0.0);
        assert!(!idle.giant_killer);
        assert_eq!(idle.tier, RatingTier::B);
    }
}
