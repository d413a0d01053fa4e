//! NHL stats API payloads and the normalized shapes built from them.
//!
//! Raw types mirror the upstream JSON (camelCase, optional fields where the API
//! omits them). They never leave the client; callers only see the normalized
//! types at the bottom of this file.

use super::common::{LocalizedName, id_from_string_or_number};
use super::players::NormalizedPlayer;
use serde::{Deserialize, Serialize};

// Raw payloads

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TeamsResponse {
    #[serde(default)]
    pub data: Vec<RawTeam>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTeam {
    pub id: Option<u32>,
    pub full_name: String,
    pub tri_code: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StandingsResponse {
    #[serde(default)]
    pub standings: Vec<RawStanding>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStanding {
    pub team_abbrev: LocalizedName,
    pub team_name: LocalizedName,
    pub conference_name: Option<String>,
    pub division_name: Option<String>,
    #[serde(default)]
    pub games_played: u32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub ot_losses: u32,
    #[serde(default)]
    pub points: u32,
    #[serde(default)]
    pub goal_for: u32,
    #[serde(default)]
    pub goal_against: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerLanding {
    pub player_id: u64,
    pub first_name: LocalizedName,
    pub last_name: LocalizedName,
    pub current_team_abbrev: Option<String>,
    pub position: String,
    pub sweater_number: Option<u32>,
    pub height_in_inches: Option<u32>,
    pub weight_in_pounds: Option<u32>,
    pub shoots_catches: Option<String>,
    pub headshot: Option<String>,
    #[serde(default)]
    pub season_totals: Vec<RawSeasonTotals>,
}

/// One row of a player's career table
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSeasonTotals {
    #[serde(default)]
    pub season: u32,
    #[serde(default)]
    pub game_type_id: u8,
    #[serde(default)]
    pub league_abbrev: String,
    pub games_played: Option<f64>,
    pub goals: Option<f64>,
    pub assists: Option<f64>,
    pub points: Option<f64>,
    pub plus_minus: Option<f64>,
    pub pim: Option<f64>,
    pub shots: Option<f64>,
    pub power_play_goals: Option<f64>,
    pub hits: Option<f64>,
    pub blocked_shots: Option<f64>,
    pub wins: Option<f64>,
    pub shutouts: Option<f64>,
    pub goals_against_avg: Option<f64>,
    pub save_pctg: Option<f64>,
    pub shots_against: Option<f64>,
    pub goals_against: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RosterResponse {
    #[serde(default)]
    pub forwards: Vec<RawRosterPlayer>,
    #[serde(default)]
    pub defensemen: Vec<RawRosterPlayer>,
    #[serde(default)]
    pub goalies: Vec<RawRosterPlayer>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRosterPlayer {
    pub id: u64,
    pub first_name: LocalizedName,
    pub last_name: LocalizedName,
    pub sweater_number: Option<u32>,
    pub position_code: Option<String>,
    pub shoots_catches: Option<String>,
    pub height_in_inches: Option<u32>,
    pub weight_in_pounds: Option<u32>,
    pub headshot: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardResponse {
    pub current_date: Option<String>,
    #[serde(default)]
    pub games: Vec<RawGame>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClubScheduleResponse {
    #[serde(default)]
    pub games: Vec<RawGame>,
}

/// Game shape shared by the scoreboard, club schedule and gamecenter endpoints
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawGame {
    pub id: u64,
    #[serde(default)]
    pub game_state: String,
    pub game_date: Option<String>,
    #[serde(rename = "startTimeUTC")]
    pub start_time_utc: Option<String>,
    pub venue: Option<LocalizedName>,
    pub away_team: RawGameTeam,
    pub home_team: RawGameTeam,
    pub period_descriptor: Option<RawPeriodDescriptor>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawGameTeam {
    pub abbrev: String,
    pub score: Option<u32>,
    pub sog: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawPeriodDescriptor {
    pub number: Option<u32>,
    pub period_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSearchPlayer {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub player_id: String,
    pub name: String,
    pub position_code: Option<String>,
    pub team_abbrev: Option<String>,
    pub sweater_number: Option<u32>,
    pub height_in_inches: Option<u32>,
    pub weight_in_pounds: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ClubStatsResponse {
    pub season: Option<String>,
    #[serde(default)]
    pub skaters: Vec<RawClubSkater>,
    #[serde(default)]
    pub goalies: Vec<RawClubGoalie>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawClubSkater {
    pub player_id: u64,
    pub first_name: LocalizedName,
    pub last_name: LocalizedName,
    pub position_code: Option<String>,
    pub headshot: Option<String>,
    pub games_played: Option<f64>,
    pub goals: Option<f64>,
    pub assists: Option<f64>,
    pub points: Option<f64>,
    pub plus_minus: Option<f64>,
    pub penalty_minutes: Option<f64>,
    pub power_play_goals: Option<f64>,
    pub shots: Option<f64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RawClubGoalie {
    pub player_id: u64,
    pub first_name: LocalizedName,
    pub last_name: LocalizedName,
    pub headshot: Option<String>,
    pub games_played: Option<f64>,
    pub wins: Option<f64>,
    pub shutouts: Option<f64>,
    pub saves: Option<f64>,
    pub goals_against_average: Option<f64>,
    pub save_percentage: Option<f64>,
}

// Normalized shapes

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub abbrev: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub division: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingsRow {
    pub team_abbrev: String,
    pub team_name: String,
    pub conference: Option<String>,
    pub division: Option<String>,
    pub games_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub ot_losses: u32,
    pub points: u32,
    pub goal_differential: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamScore {
    pub abbrev: String,
    pub score: Option<u32>,
    pub shots: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    pub id: u64,
    pub state: String,
    pub date: Option<String>,
    pub start_time_utc: Option<String>,
    pub venue: Option<String>,
    pub period: Option<u32>,
    pub home: TeamScore,
    pub away: TeamScore,
}

impl GameSummary {
    /// `LIVE` and `CRIT` (late close game) are the in-progress states
    pub fn is_live(&self) -> bool {
        matches!(self.state.as_str(), "LIVE" | "CRIT")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub date: Option<String>,
    pub games: Vec<GameSummary>,
}

impl Scoreboard {
    pub fn live_games(&self) -> impl Iterator<Item = &GameSummary> {
        self.games.iter().filter(|game| game.is_live())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClubStats {
    pub team: String,
    pub season: Option<String>,
    pub skaters: Vec<NormalizedPlayer>,
    pub goalies: Vec<NormalizedPlayer>,
}
