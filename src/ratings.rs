use std::collections::HashMap;

use crate::matches::{chronological, MatchResult, ScoredMatch, Side};
use crate::team::{TeamRating, TeamRatingState};

/// A strategy that turns one finished match into new states for both teams.
pub trait RatingModel {
    /// State given to a team on its first finished match.
    fn initial_state(&self, team_name: &str) -> TeamRatingState;

    /// Rate a match from the pre-match states of side A and side B.
    ///
    /// Both results are derived from the same snapshot; neither side sees the
    /// other's post-match state.
    fn rate(
        &self,
        state_a: &TeamRatingState,
        state_b: &TeamRatingState,
        scored: &ScoredMatch<'_>,
    ) -> (TeamRatingState, TeamRatingState);
}

/// One [`TeamRatingState`] per team, kept in the order teams were first seen.
#[derive(Clone, Debug, Default)]
pub struct RatingBook {
    order: Vec<String>,
    states: HashMap<String, TeamRatingState>,
}

impl RatingBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the book from previously stored states, keeping their order.
    pub fn from_states(states: impl IntoIterator<Item = TeamRatingState>) -> Self {
        let mut book = Self::new();
        for state in states {
            book.insert(state);
        }
        book
    }

    /// Replay a whole history in `match_index` order.
    pub fn replay<M: RatingModel + ?Sized>(model: &M, matches: &[MatchResult]) -> Self {
        let mut book = Self::new();
        let rateable = chronological(matches);
        for scored in &rateable {
            book.apply_scored(model, scored);
        }
        tracing::debug!(
            matches = matches.len(),
            rated = rateable.len(),
            teams = book.len(),
            "replayed match history"
        );
        book
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, team_name: &str) -> Option<&TeamRatingState> {
        self.states.get(team_name)
    }

    pub fn rating(&self, team_name: &str) -> Option<f64> {
        self.get(team_name).map(|s| s.rating)
    }

    /// States in first-encounter order.
    pub fn states(&self) -> impl Iterator<Item = &TeamRatingState> + '_ {
        self.order.iter().filter_map(|name| self.states.get(name))
    }

    /// Insert or replace a team's state.
    pub fn insert(&mut self, state: TeamRatingState) {
        if !self.states.contains_key(&state.team_name) {
            self.order.push(state.team_name.clone());
        }
        self.states.insert(state.team_name.clone(), state);
    }

    /// Apply one match record. Returns `false` (leaving the book untouched)
    /// when the record is not rateable.
    pub fn apply<M: RatingModel + ?Sized>(&mut self, model: &M, record: &MatchResult) -> bool {
        match record.scored() {
            Some(scored) => {
                self.apply_scored(model, &scored);
                true
            }
            None => {
                tracing::trace!(match_index = record.match_index, "skipping malformed match");
                false
            }
        }
    }

    pub fn apply_scored<M: RatingModel + ?Sized>(&mut self, model: &M, scored: &ScoredMatch<'_>) {
        let state_a = self.state_or_initial(model, scored.team(Side::A));
        let state_b = self.state_or_initial(model, scored.team(Side::B));

        let (new_a, new_b) = model.rate(&state_a, &state_b, scored);
        self.insert(new_a);
        self.insert(new_b);
    }

    fn state_or_initial<M: RatingModel + ?Sized>(&self, model: &M, name: &str) -> TeamRatingState {
        self.states
            .get(name)
            .cloned()
            .unwrap_or_else(|| model.initial_state(name))
    }

    /// Ranking rows sorted by rating, highest first. Equal ratings keep
    /// first-encounter order.
    pub fn ranked(&self) -> Vec<TeamRating> {
        let mut states: Vec<&TeamRatingState> = self.states().collect();
        states.sort_by(|a, b| b.rating.total_cmp(&a.rating));
        states.into_iter().map(TeamRatingState::to_team_rating).collect()
    }
}

/// Replay `matches` with `model` and return the ranking.
pub fn rank_history<M: RatingModel + ?Sized>(model: &M, matches: &[MatchResult]) -> Vec<TeamRating> {
    RatingBook::replay(model, matches).ranked()
}
