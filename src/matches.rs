#[cfg(feature = "python")]
use pyo3::prelude::*;
use serde::{Deserialize, Serialize};

/// Participant label used for slots that are not decided yet.
pub const PLACEHOLDER_TEAM: &str = "TBD";

#[cfg_attr(feature = "python", pyclass(eq, eq_int))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Pending,
    Finished,
}

/// One side of a two-team match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// A match record as stored by the persistence layer.
///
/// Any field may be missing; only [`MatchResult::scored`] decides whether the
/// record can move ratings.
#[cfg_attr(feature = "python", pyclass(get_all, set_all))]
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchResult {
    pub team_a: Option<String>,
    pub team_b: Option<String>,
    pub score_a: Option<u32>,
    pub score_b: Option<u32>,
    pub winner: Option<String>,
    pub status: MatchStatus,
    pub round_name: Option<String>,
    /// Chronological position within the tournament
    pub match_index: i64,
}

/// Borrowed view of a finished match that passed validation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScoredMatch<'a> {
    pub team_a: &'a str,
    pub team_b: &'a str,
    pub score_a: u32,
    pub score_b: u32,
    pub winner: Side,
}

impl MatchResult {
    /// Finished match between two known teams.
    pub fn finished(
        match_index: i64,
        team_a: &str,
        team_b: &str,
        score_a: u32,
        score_b: u32,
        winner: &str,
    ) -> Self {
        MatchResult {
            team_a: Some(team_a.to_string()),
            team_b: Some(team_b.to_string()),
            score_a: Some(score_a),
            score_b: Some(score_b),
            winner: Some(winner.to_string()),
            status: MatchStatus::Finished,
            round_name: None,
            match_index,
        }
    }

    /// Validate the record for rating purposes.
    ///
    /// Returns `None` unless the match is finished, both participants are
    /// real teams, both scores are present and the winner is one of the two
    /// participants.
    pub fn scored(&self) -> Option<ScoredMatch<'_>> {
        if self.status != MatchStatus::Finished {
            return None;
        }
        let team_a = known_team(self.team_a.as_deref())?;
        let team_b = known_team(self.team_b.as_deref())?;
        if team_a == team_b {
            return None;
        }
        let winner = match self.winner.as_deref()? {
            w if w == team_a => Side::A,
            w if w == team_b => Side::B,
            _ => return None,
        };
        Some(ScoredMatch {
            team_a,
            team_b,
            score_a: self.score_a?,
            score_b: self.score_b?,
            winner,
        })
    }
}

fn known_team(name: Option<&str>) -> Option<&str> {
    let name = name?;
    if name.is_empty() || name == PLACEHOLDER_TEAM {
        None
    } else {
        Some(name)
    }
}

impl ScoredMatch<'_> {
    pub fn margin(&self) -> u32 {
        self.score_a.abs_diff(self.score_b)
    }

    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::A => self.team_a,
            Side::B => self.team_b,
        }
    }

    pub fn points(&self, side: Side) -> u32 {
        match side {
            Side::A => self.score_a,
            Side::B => self.score_b,
        }
    }

    /// 1.0 for the winner, 0.0 for the loser.
    pub fn outcome(&self, side: Side) -> f64 {
        if self.winner == side {
            1.0
        } else {
            0.0
        }
    }
}

/// Rateable matches in chronological order.
///
/// The sort is stable, so records sharing a `match_index` keep their input
/// order.
pub fn chronological(matches: &[MatchResult]) -> Vec<ScoredMatch<'_>> {
    let mut ordered: Vec<&MatchResult> = matches.iter().collect();
    ordered.sort_by_key(|m| m.match_index);

    ordered
        .into_iter()
        .filter_map(|m| {
            let scored = m.scored();
            if scored.is_none() {
                tracing::trace!(match_index = m.match_index, "skipping malformed match");
            }
            scored
        })
        .collect()
}
