//! Normalized fantasy league shapes.
//!
//! The fantasy provider answers with deeply nested collection objects; the
//! parser in `processors::fantasy_parsing` turns those into these types.

use super::players::{NormalizedPlayer, Position, StatLine};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FantasyLeague {
    pub league_key: String,
    pub name: String,
    pub season: Option<String>,
    pub num_teams: Option<u32>,
    pub scoring_type: Option<String>,
    pub current_week: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterSlot {
    pub position: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatCategory {
    pub stat_id: u32,
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueSettings {
    pub league_key: String,
    pub draft_type: Option<String>,
    pub scoring_type: Option<String>,
    pub max_teams: Option<u32>,
    pub roster_slots: Vec<RosterSlot>,
    pub stat_categories: Vec<StatCategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FantasyTeam {
    pub team_key: String,
    pub name: String,
    pub manager: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingsEntry {
    pub team_key: String,
    pub name: String,
    pub rank: Option<u32>,
    pub wins: u32,
    pub losses: u32,
    pub ties: u32,
    pub points_for: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FantasyPlayer {
    pub player_key: String,
    pub name: String,
    pub team_abbrev: Option<String>,
    pub position: Position,
    pub eligible_positions: Vec<String>,
    pub status: Option<String>,
    pub percent_owned: Option<f64>,
    #[serde(default)]
    pub stats: StatLine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchupTeam {
    pub team_key: String,
    pub name: String,
    pub points: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matchup {
    pub week: Option<u32>,
    pub status: Option<String>,
    pub teams: Vec<MatchupTeam>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPlayer {
    pub player_key: String,
    pub name: String,
    pub kind: Option<String>,
    pub source_team: Option<String>,
    pub destination_team: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub transaction_key: String,
    pub kind: String,
    pub status: Option<String>,
    pub timestamp: Option<i64>,
    pub players: Vec<TransactionPlayer>,
}

/// Result of the stats/fantasy fan-out for one player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedPlayerData {
    pub stats: Option<NormalizedPlayer>,
    pub fantasy: Option<FantasyPlayer>,
    /// Season points under the default weights, when stats were available
    pub fantasy_points: Option<f64>,
    /// Ownership percentage reported by the fantasy provider, zero when unknown
    pub ownership: f64,
}
