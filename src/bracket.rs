use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};

use crate::error::{EngineError, Result};

pub const FINAL_ID: &str = "Final-M1";
pub const BRONZE_ID: &str = "Bronze-M1";
pub const QUALIFIER_1_ID: &str = "Q1";
pub const ELIMINATOR_ID: &str = "Elim-1";
pub const QUALIFIER_2_ID: &str = "Q2";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Groups,
    Knockouts,
    Playoffs,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PlayoffStyle {
    #[default]
    Standard,
    /// Page playoff for the final four
    Ipl,
}

impl PlayoffStyle {
    /// Exactly `"ipl"` selects the page playoff; anything else is standard.
    pub fn parse(style: &str) -> Self {
        if style == "ipl" {
            PlayoffStyle::Ipl
        } else {
            PlayoffStyle::Standard
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayoffStyle::Standard => "standard",
            PlayoffStyle::Ipl => "ipl",
        }
    }
}

impl From<&str> for PlayoffStyle {
    fn from(style: &str) -> Self {
        Self::parse(style)
    }
}

impl From<String> for PlayoffStyle {
    fn from(style: String) -> Self {
        Self::parse(&style)
    }
}

impl From<PlayoffStyle> for String {
    fn from(style: PlayoffStyle) -> Self {
        style.as_str().to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BracketNode {
    pub match_id: String,
    pub stage: Stage,
    pub round: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub group: Option<String>,
    pub participant_a: String,
    pub participant_b: String,
    pub next_match_id: Option<String>,
}

impl BracketNode {
    fn knockout(match_id: impl Into<String>, stage: Stage, round: impl Into<String>) -> Self {
        BracketNode {
            match_id: match_id.into(),
            stage,
            round: round.into(),
            group: None,
            participant_a: String::new(),
            participant_b: String::new(),
            next_match_id: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    Winner,
    Loser,
}

impl EdgeKind {
    fn label(self, match_id: &str) -> String {
        match self {
            EdgeKind::Winner => format!("Winner of {match_id}"),
            EdgeKind::Loser => format!("Loser of {match_id}"),
        }
    }
}

/// The winner or loser of `from` plays in `to`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BracketEdge {
    pub from: String,
    pub to: String,
    pub kind: EdgeKind,
}

/// Flat tournament configuration as supplied by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BracketConfig {
    pub total_teams: usize,
    pub num_groups: usize,
    pub advancing_per_group: usize,
    #[serde(default)]
    pub playoff_style: PlayoffStyle,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BracketMetadata {
    pub total_teams: usize,
    pub groups: usize,
    pub teams_per_group: usize,
    /// Teams left out of group scheduling by the floor division
    pub unscheduled_teams: usize,
    pub advancing_total: usize,
    pub bracket_size: usize,
    pub byes: usize,
    pub playoff_style: PlayoffStyle,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleGraph {
    pub group_stage: Vec<BracketNode>,
    pub knockout_stage: Vec<BracketNode>,
    pub edges: Vec<BracketEdge>,
}

impl ScheduleGraph {
    pub fn node(&self, match_id: &str) -> Option<&BracketNode> {
        self.knockout_stage.iter().find(|n| n.match_id == match_id)
    }

    /// Knockout nodes nothing feeds forward from.
    pub fn terminal_nodes(&self) -> Vec<&BracketNode> {
        self.knockout_stage
            .iter()
            .filter(|n| !self.edges.iter().any(|e| e.from == n.match_id))
            .collect()
    }

    /// Kahn's algorithm over the edge list.
    pub fn is_acyclic(&self) -> bool {
        let index: HashMap<&str, usize> = self
            .knockout_stage
            .iter()
            .enumerate()
            .map(|(i, n)| (n.match_id.as_str(), i))
            .collect();
        let mut indegree = vec![0usize; self.knockout_stage.len()];
        let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); self.knockout_stage.len()];
        for edge in &self.edges {
            let (Some(&from), Some(&to)) = (index.get(edge.from.as_str()), index.get(edge.to.as_str()))
            else {
                return false;
            };
            outgoing[from].push(to);
            indegree[to] += 1;
        }

        let mut ready: VecDeque<usize> = (0..indegree.len()).filter(|&i| indegree[i] == 0).collect();
        let mut visited = 0;
        while let Some(i) = ready.pop_front() {
            visited += 1;
            for &to in &outgoing[i] {
                indegree[to] -= 1;
                if indegree[to] == 0 {
                    ready.push_back(to);
                }
            }
        }
        visited == self.knockout_stage.len()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TournamentGraph {
    pub metadata: BracketMetadata,
    pub schedule_graph: ScheduleGraph,
}

impl TournamentGraph {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| EngineError::Serialization(e.to_string()))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
    A,
    B,
}

/// Knockout nodes plus index-based feeds.
#[derive(Default)]
struct Arena {
    nodes: Vec<BracketNode>,
    edges: Vec<(usize, usize, EdgeKind)>,
}

impl Arena {
    fn push(&mut self, node: BracketNode) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn set_literal(&mut self, to: usize, slot: Slot, label: String) {
        match slot {
            Slot::A => self.nodes[to].participant_a = label,
            Slot::B => self.nodes[to].participant_b = label,
        }
    }

    /// Route the winner or loser of `from` into `slot` of `to`.
    fn feed(&mut self, from: usize, to: usize, slot: Slot, kind: EdgeKind) {
        let label = kind.label(&self.nodes[from].match_id);
        self.set_literal(to, slot, label);
        if kind == EdgeKind::Winner {
            self.nodes[from].next_match_id = Some(self.nodes[to].match_id.clone());
        }
        self.edges.push((from, to, kind));
    }

    fn place(&mut self, entrant: &Entrant, to: usize, slot: Slot) {
        match entrant {
            Entrant::Seed(label) => self.set_literal(to, slot, label.clone()),
            Entrant::WinnerOf(from) => self.feed(*from, to, slot, EdgeKind::Winner),
        }
    }

    fn into_parts(self) -> (Vec<BracketNode>, Vec<BracketEdge>) {
        let edges = self
            .edges
            .iter()
            .map(|&(from, to, kind)| BracketEdge {
                from: self.nodes[from].match_id.clone(),
                to: self.nodes[to].match_id.clone(),
                kind,
            })
            .collect();
        (self.nodes, edges)
    }
}

/// Occupant of a Round-2 slot.
enum Entrant {
    Seed(String),
    WinnerOf(usize),
}

/// Builds the match graph for a group stage followed by a knockout stage.
///
/// Nodes name their feeders with plain-text labels ("Winner of R1-M2",
/// "Loser of Q1") and point forward through `next_match_id`; every feed is
/// also recorded as a [`BracketEdge`]. The knockout stage is padded to the
/// next power of two with byes for the top seeds. With the `ipl` style the
/// last four matches feed a page playoff instead of semifinals.
pub struct BracketGraphGenerator {
    config: BracketConfig,
    teams_per_group: usize,
    total_advancing: usize,
}

impl BracketGraphGenerator {
    /// Validate the configuration.
    ///
    /// Rejects zero groups, zero advancing teams, and more advancing teams per
    /// group than a group holds. An uneven split is accepted: the remainder is
    /// left out of group scheduling and reported in the metadata.
    pub fn new(config: BracketConfig) -> Result<Self> {
        if config.num_groups == 0 {
            return Err(EngineError::ConfigurationMismatch(
                "num_groups must be at least 1".into(),
            ));
        }
        if config.advancing_per_group == 0 {
            return Err(EngineError::ConfigurationMismatch(
                "advancing_per_group must be at least 1".into(),
            ));
        }
        let teams_per_group = config.total_teams / config.num_groups;
        if config.advancing_per_group > teams_per_group {
            return Err(EngineError::ConfigurationMismatch(format!(
                "{} teams advance per group but groups only hold {} teams",
                config.advancing_per_group, teams_per_group
            )));
        }

        let unscheduled = config.total_teams % config.num_groups;
        if unscheduled > 0 {
            tracing::warn!(
                total_teams = config.total_teams,
                num_groups = config.num_groups,
                unscheduled,
                "teams do not divide evenly into groups, remainder left unscheduled"
            );
        }

        Ok(BracketGraphGenerator {
            total_advancing: config.num_groups * config.advancing_per_group,
            teams_per_group,
            config,
        })
    }

    fn bracket_size(&self) -> usize {
        self.total_advancing.next_power_of_two()
    }

    fn byes(&self) -> usize {
        self.bracket_size() - self.total_advancing
    }

    pub fn build(&self) -> TournamentGraph {
        let group_stage = if self.config.num_groups > 1 {
            self.generate_groups()
        } else {
            Vec::new()
        };
        let (knockout_stage, edges) = self.generate_knockout();
        tracing::debug!(
            group_matches = group_stage.len(),
            knockout_matches = knockout_stage.len(),
            style = self.config.playoff_style.as_str(),
            "built tournament graph"
        );

        TournamentGraph {
            metadata: BracketMetadata {
                total_teams: self.config.total_teams,
                groups: self.config.num_groups,
                teams_per_group: self.teams_per_group,
                unscheduled_teams: self.config.total_teams % self.config.num_groups,
                advancing_total: self.total_advancing,
                bracket_size: self.bracket_size(),
                byes: self.byes(),
                playoff_style: self.config.playoff_style,
            },
            schedule_graph: ScheduleGraph {
                group_stage,
                knockout_stage,
                edges,
            },
        }
    }

    /// Full round robin inside every pool.
    pub fn generate_groups(&self) -> Vec<BracketNode> {
        let mut matches = Vec::new();

        for group_idx in 0..self.config.num_groups {
            let group = group_label(group_idx);
            let slots: Vec<String> = (1..=self.teams_per_group)
                .map(|i| format!("Pool {group} - Slot {i}"))
                .collect();

            let mut n = 0;
            for (i, team_a) in slots.iter().enumerate() {
                for team_b in &slots[i + 1..] {
                    n += 1;
                    matches.push(BracketNode {
                        match_id: format!("G{group}-M{n}"),
                        stage: Stage::Groups,
                        round: format!("Group {group}"),
                        group: Some(group.clone()),
                        participant_a: team_a.clone(),
                        participant_b: team_b.clone(),
                        next_match_id: None,
                    });
                }
            }
        }

        matches
    }

    /// Knockout nodes in construction order, plus the feed edges.
    pub fn generate_knockout(&self) -> (Vec<BracketNode>, Vec<BracketEdge>) {
        let mut arena = Arena::default();
        let bracket_size = self.bracket_size();
        let byes = self.byes();

        let seeds: Vec<String> = (1..=self.total_advancing).map(|i| format!("Seed {i}")).collect();
        let (bye_seeds, playing) = seeds.split_at(byes);

        // Round 1: highest remaining seed against lowest
        let round_1: Vec<usize> = (0..playing.len() / 2)
            .map(|i| {
                let mut node = BracketNode::knockout(
                    format!("R1-M{}", i + 1),
                    Stage::Knockouts,
                    "Round 1 (Wildcard)",
                );
                node.participant_a = playing[i].clone();
                node.participant_b = playing[playing.len() - 1 - i].clone();
                arena.push(node)
            })
            .collect();

        // Round 2: bye seeds first, then Round-1 winners; first meets last
        let entrants: Vec<Entrant> = bye_seeds
            .iter()
            .map(|s| Entrant::Seed(s.clone()))
            .chain(round_1.iter().map(|&m| Entrant::WinnerOf(m)))
            .collect();
        let round_2: Vec<usize> = (0..bracket_size / 4)
            .map(|i| {
                let to = arena.push(BracketNode::knockout(
                    format!("R2-M{}", i + 1),
                    Stage::Knockouts,
                    "Round 2",
                ));
                arena.place(&entrants[i], to, Slot::A);
                arena.place(&entrants[entrants.len() - 1 - i], to, Slot::B);
                to
            })
            .collect();

        let mut current = round_2;
        let mut round_num = 3;
        while current.len() > 1 {
            if current.len() == 4 && self.config.playoff_style == PlayoffStyle::Ipl {
                page_playoff(&mut arena, &current);
                break;
            }

            let is_final = current.len() == 2;
            let next: Vec<usize> = current
                .chunks(2)
                .enumerate()
                .map(|(k, pair)| {
                    let node = if is_final {
                        BracketNode::knockout(FINAL_ID, Stage::Knockouts, "Final Match")
                    } else {
                        BracketNode::knockout(
                            format!("R{round_num}-M{}", k + 1),
                            Stage::Knockouts,
                            format!("Round {round_num}"),
                        )
                    };
                    let to = arena.push(node);
                    arena.feed(pair[0], to, Slot::A, EdgeKind::Winner);
                    arena.feed(pair[1], to, Slot::B, EdgeKind::Winner);
                    to
                })
                .collect();

            if is_final && self.config.playoff_style == PlayoffStyle::Standard {
                let bronze = arena.push(BracketNode::knockout(
                    BRONZE_ID,
                    Stage::Knockouts,
                    "3rd Place Match",
                ));
                arena.feed(current[0], bronze, Slot::A, EdgeKind::Loser);
                arena.feed(current[1], bronze, Slot::B, EdgeKind::Loser);
            }

            current = next;
            round_num += 1;
        }

        arena.into_parts()
    }
}

/// Q1 and the Eliminator take the last four winners; the Q1 loser gets a
/// second chance against the Eliminator winner in Q2.
fn page_playoff(arena: &mut Arena, feeders: &[usize]) {
    let q1 = arena.push(BracketNode::knockout(QUALIFIER_1_ID, Stage::Playoffs, "Q1 & Eliminator"));
    let elim = arena.push(BracketNode::knockout(ELIMINATOR_ID, Stage::Playoffs, "Q1 & Eliminator"));
    let q2 = arena.push(BracketNode::knockout(QUALIFIER_2_ID, Stage::Playoffs, "Qualifier 2"));
    let last = arena.push(BracketNode::knockout(FINAL_ID, Stage::Playoffs, "Championship Final"));

    arena.feed(feeders[0], q1, Slot::A, EdgeKind::Winner);
    arena.feed(feeders[1], q1, Slot::B, EdgeKind::Winner);
    arena.feed(feeders[2], elim, Slot::A, EdgeKind::Winner);
    arena.feed(feeders[3], elim, Slot::B, EdgeKind::Winner);
    arena.feed(q1, q2, Slot::A, EdgeKind::Loser);
    arena.feed(elim, q2, Slot::B, EdgeKind::Winner);
    arena.feed(q1, last, Slot::A, EdgeKind::Winner);
    arena.feed(q2, last, Slot::B, EdgeKind::Winner);
}

/// A, B, ..., Z, AA, AB, ...
fn group_label(mut idx: usize) -> String {
    let mut label = String::new();
    loop {
        label.insert(0, (b'A' + (idx % 26) as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }
    label
}

/// Validate and build in one call.
///
/// # Arguments
/// * `total_teams` - Teams entered in the tournament
/// * `num_groups` - Group count; 1 skips the group stage
/// * `advancing_per_group` - Teams each group sends to the knockouts
/// * `playoff_style` - `"ipl"` for the page playoff, anything else standard
///
/// # Returns
/// The tournament graph, or `ConfigurationMismatch` for an unusable config
pub fn build(
    total_teams: usize,
    num_groups: usize,
    advancing_per_group: usize,
    playoff_style: &str,
) -> Result<TournamentGraph> {
    let generator = BracketGraphGenerator::new(BracketConfig {
        total_teams,
        num_groups,
        advancing_per_group,
        playoff_style: PlayoffStyle::parse(playoff_style),
    })?;
    Ok(generator.build())
}
