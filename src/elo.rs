use crate::config::{EloConfig, Glicko2Config};
use crate::matches::{MatchResult, ScoredMatch, Side};
use crate::ratings::{rank_history, RatingBook, RatingModel};
use crate::team::{TeamRating, TeamRatingState};
use crate::win_prob::calculate_win_prob;

/// Margin-of-victory weighted Elo.
///
/// K is scaled by `ln(margin + 1) * mov_scale`; ratings are rounded to whole
/// points after every match.
#[derive(Debug, Clone, Copy, Default)]
pub struct EloMov {
    config: EloConfig,
}

impl EloMov {
    pub fn new(config: EloConfig) -> Self {
        EloMov { config }
    }

    pub fn config(&self) -> &EloConfig {
        &self.config
    }

    /// Expected score of a team rated `rating` against one rated `opponent`.
    pub fn expected_score(&self, rating: f64, opponent: f64) -> f64 {
        calculate_win_prob(rating, opponent)
    }

    /// 1.0 for a level score, `ln(margin + 1) * mov_scale` otherwise.
    pub fn mov_multiplier(&self, margin: u32) -> f64 {
        if margin == 0 {
            1.0
        } else {
            (margin as f64 + 1.0).ln() * self.config.mov_scale
        }
    }

    /// Apply one match to `ratings`, cold-starting unseen teams.
    ///
    /// # Arguments
    /// * `ratings` - Current state of every team seen so far
    /// * `record` - The match to apply
    ///
    /// # Returns
    /// `false`, with `ratings` untouched, when the record is not rateable
    pub fn update(&self, ratings: &mut RatingBook, record: &MatchResult) -> bool {
        ratings.apply(self, record)
    }

    /// Ranking from the full finished-match history.
    pub fn power_rankings(&self, matches: &[MatchResult]) -> Vec<TeamRating> {
        rank_history(self, matches)
    }

    fn rate_side(&self, state: &TeamRatingState, opponent: f64, actual: f64, k: f64) -> TeamRatingState {
        let expected = self.expected_score(state.rating, opponent);
        TeamRatingState {
            rating: (state.rating + k * (actual - expected)).round(),
            matches_played: state.matches_played + 1,
            ..state.clone()
        }
    }
}

impl RatingModel for EloMov {
    fn initial_state(&self, team_name: &str) -> TeamRatingState {
        let defaults = Glicko2Config {
            initial_rating: self.config.initial_rating,
            ..Glicko2Config::default()
        };
        TeamRatingState::new(team_name, &defaults)
    }

    fn rate(
        &self,
        state_a: &TeamRatingState,
        state_b: &TeamRatingState,
        scored: &ScoredMatch<'_>,
    ) -> (TeamRatingState, TeamRatingState) {
        let k = self.config.k_factor * self.mov_multiplier(scored.margin());
        (
            self.rate_side(state_a, state_b.rating, scored.outcome(Side::A), k),
            self.rate_side(state_b, state_a.rating, scored.outcome(Side::B), k),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_expected_score_even() {
        let elo = EloMov::default();
        assert_eq!(elo.expected_score(1500.0, 1500.0), 0.5);
    }

    #[test]
    fn test_mov_multiplier() {
        let elo = EloMov::default();
        assert_eq!(elo.mov_multiplier(0), 1.0);
        assert!((elo.mov_multiplier(11) - 12f64.ln() * 0.8).abs() < 1e-12);
        assert!((elo.mov_multiplier(11) - 1.9879).abs() < 1e-4);
    }

    #[test]
    fn test_worked_example() {
        let elo = EloMov::default();
        let mut book = RatingBook::new();
        assert!(elo.update(&mut book, &MatchResult::finished(1, "A", "B", 21, 10, "A")));

        assert_eq!(book.rating("A"), Some(1532.0));
        assert_eq!(book.rating("B"), Some(1468.0));
        assert_eq!(book.get("A").unwrap().matches_played, 1);
    }

    #[test]
    fn test_level_score_uses_unit_multiplier() {
        let elo = EloMov::default();
        let mut book = RatingBook::new();
        elo.update(&mut book, &MatchResult::finished(1, "A", "B", 20, 20, "B"));

        // K = 32, expected 0.5 on both sides
        assert_eq!(book.rating("B"), Some(1516.0));
        assert_eq!(book.rating("A"), Some(1484.0));
    }

    #[test]
    fn test_upset_moves_more_than_expected_win() {
        let elo = EloMov::default();
        let mut book = RatingBook::new();
        let mut strong = TeamRatingState::baseline("Strong");
        strong.rating = 1700.0;
        book.insert(strong);
        book.insert(TeamRatingState::baseline("Weak"));

        let mut favourite = book.clone();
        elo.update(&mut favourite, &MatchResult::finished(1, "Strong", "Weak", 21, 15, "Strong"));
        elo.update(&mut book, &MatchResult::finished(1, "Strong", "Weak", 15, 21, "Weak"));

        let favourite_gain = favourite.rating("Strong").unwrap() - 1700.0;
        let upset_gain = book.rating("Weak").unwrap() - 1500.0;
        assert!(upset_gain > favourite_gain);
    }

    #[test]
    fn test_power_rankings_chronological() {
        let elo = EloMov::default();
        // Out of order on purpose: index 1 must be rated first
        let matches = vec![
            MatchResult::finished(2, "A", "C", 21, 19, "C"),
            MatchResult::finished(1, "A", "B", 21, 10, "A"),
        ];
        let ranking = elo.power_rankings(&matches);
        assert_eq!(ranking.len(), 3);

        let mut book = RatingBook::new();
        elo.update(&mut book, &matches[1]);
        elo.update(&mut book, &matches[0]);
        for row in &ranking {
            assert_eq!(Some(row.power_rating), book.rating(&row.team));
        }
        for pair in ranking.windows(2) {
            assert!(pair[0].power_rating >= pair[1].power_rating);
        }
    }

    #[test]
    fn test_malformed_history_is_empty_ranking() {
        let elo = EloMov::default();
        let mut record = MatchResult::finished(1, "A", "TBD", 21, 10, "A");
        assert!(elo.power_rankings(&[record.clone()]).is_empty());
        record.team_b = Some("B".to_string());
        record.score_a = None;
        assert!(elo.power_rankings(&[record]).is_empty());
    }

    proptest! {
        #[test]
        fn prop_mov_increasing_for_decided_margins(margin in 1u32..200) {
            let elo = EloMov::default();
            prop_assert!(elo.mov_multiplier(margin + 1) > elo.mov_multiplier(margin));
        }

        #[test]
        fn prop_winner_never_loses_points(
            ra in 1200.0f64..1800.0,
            rb in 1200.0f64..1800.0,
            sa in 0u32..30,
            sb in 0u32..30,
        ) {
            let elo = EloMov::default();
            let mut book = RatingBook::new();
            let mut a = TeamRatingState::baseline("A");
            a.rating = ra.round();
            let mut b = TeamRatingState::baseline("B");
            b.rating = rb.round();
            book.insert(a);
            book.insert(b);

            elo.update(&mut book, &MatchResult::finished(1, "A", "B", sa, sb, "A"));
            prop_assert!(book.rating("A").unwrap() >= ra.round());
            prop_assert!(book.rating("B").unwrap() <= rb.round());
        }
    }
}
