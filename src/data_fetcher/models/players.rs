use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Canonical stat keys shared by every provider formatter and the scoring weights
pub mod stat_keys {
    pub const GAMES_PLAYED: &str = "games_played";
    pub const GOALS: &str = "goals";
    pub const ASSISTS: &str = "assists";
    pub const POINTS: &str = "points";
    pub const PLUS_MINUS: &str = "plus_minus";
    pub const PENALTY_MINUTES: &str = "penalty_minutes";
    pub const POWER_PLAY_GOALS: &str = "power_play_goals";
    pub const SHOTS: &str = "shots";
    pub const HITS: &str = "hits";
    pub const BLOCKS: &str = "blocks";
    pub const WINS: &str = "wins";
    pub const SAVES: &str = "saves";
    pub const SHUTOUTS: &str = "shutouts";
    pub const GOALS_AGAINST_AVERAGE: &str = "goals_against_average";
    pub const SAVE_PERCENTAGE: &str = "save_percentage";
}

/// Roster position after normalization
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    C,
    LW,
    RW,
    D,
    G,
    /// Codes the mapping does not know are kept verbatim
    Other(String),
}

impl Position {
    /// Maps an NHL position code (`C`, `L`, `R`, `D`, `G`) to a roster position
    pub fn from_code(code: &str) -> Self {
        match code {
            "C" => Position::C,
            "L" | "LW" => Position::LW,
            "R" | "RW" => Position::RW,
            "D" => Position::D,
            "G" => Position::G,
            other => Position::Other(other.to_string()),
        }
    }

    pub fn is_goalie(&self) -> bool {
        matches!(self, Position::G)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Position::C => f.write_str("C"),
            Position::LW => f.write_str("LW"),
            Position::RW => f.write_str("RW"),
            Position::D => f.write_str("D"),
            Position::G => f.write_str("G"),
            Position::Other(code) => f.write_str(code),
        }
    }
}

/// Stat key to value mapping
pub type StatLine = BTreeMap<String, f64>;

/// The canonical player shape every formatter produces and all merge logic consumes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPlayer {
    pub id: String,
    pub name: String,
    pub team: String,
    pub position: Position,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sweater_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_in_inches: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_in_pounds: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shoots: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headshot: Option<String>,
    #[serde(default)]
    pub season_stats: StatLine,
}

impl NormalizedPlayer {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        team: impl Into<String>,
        position: Position,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            team: team.into(),
            position,
            sweater_number: None,
            height_in_inches: None,
            weight_in_pounds: None,
            shoots: None,
            headshot: None,
            season_stats: StatLine::new(),
        }
    }

    /// Returns a stat value, treating a missing key as zero
    pub fn stat(&self, key: &str) -> f64 {
        self.season_stats.get(key).copied().unwrap_or(0.0)
    }
}
