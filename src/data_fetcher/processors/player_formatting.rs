//! Conversion of NHL stats payloads into the normalized model

use tracing::debug;

use crate::constants::find_team;
use crate::data_fetcher::models::nhl::{
    ClubStatsResponse, PlayerLanding, RawClubGoalie, RawClubSkater, RawGame, RawRosterPlayer,
    RawSearchPlayer, RawSeasonTotals, RawStanding, RawTeam, RosterResponse, ScoreboardResponse,
};
use crate::data_fetcher::models::{
    ClubStats, GameSummary, LocalizedName, NormalizedPlayer, Position, Scoreboard, StandingsRow,
    StatLine, Team, TeamScore, stat_keys,
};

const NHL_LEAGUE: &str = "NHL";
const REGULAR_SEASON: u8 = 2;

/// Joins first and last name, tolerating either half being blank
pub fn full_name(first: &LocalizedName, last: &LocalizedName) -> String {
    format!("{} {}", first.as_str(), last.as_str())
        .trim()
        .to_string()
}

fn insert_stat(stats: &mut StatLine, key: &str, value: Option<f64>) {
    if let Some(value) = value {
        stats.insert(key.to_string(), value);
    }
}

pub fn format_roster_player(raw: &RawRosterPlayer, team: &str, position: Position) -> NormalizedPlayer {
    NormalizedPlayer {
        sweater_number: raw.sweater_number,
        height_in_inches: raw.height_in_inches,
        weight_in_pounds: raw.weight_in_pounds,
        shoots: raw.shoots_catches.clone(),
        headshot: raw.headshot.clone(),
        ..NormalizedPlayer::new(
            raw.id.to_string(),
            full_name(&raw.first_name, &raw.last_name),
            team,
            position,
        )
    }
}

/// Flattens the three positional groups of a roster into one list tagged with `team`.
///
/// Forwards take their position from the roster's position code; a forward
/// without a code is kept as the generic `F`.
pub fn flatten_roster(team: &str, roster: &RosterResponse) -> Vec<NormalizedPlayer> {
    let forwards = roster.forwards.iter().map(|player| {
        let position = Position::from_code(player.position_code.as_deref().unwrap_or("F"));
        format_roster_player(player, team, position)
    });
    let defensemen = roster
        .defensemen
        .iter()
        .map(|player| format_roster_player(player, team, Position::D));
    let goalies = roster
        .goalies
        .iter()
        .map(|player| format_roster_player(player, team, Position::G));

    forwards.chain(defensemen).chain(goalies).collect()
}

pub fn season_stats_from_totals(totals: &RawSeasonTotals) -> StatLine {
    let mut stats = StatLine::new();
    insert_stat(&mut stats, stat_keys::GAMES_PLAYED, totals.games_played);
    insert_stat(&mut stats, stat_keys::GOALS, totals.goals);
    insert_stat(&mut stats, stat_keys::ASSISTS, totals.assists);
    insert_stat(&mut stats, stat_keys::POINTS, totals.points);
    insert_stat(&mut stats, stat_keys::PLUS_MINUS, totals.plus_minus);
    insert_stat(&mut stats, stat_keys::PENALTY_MINUTES, totals.pim);
    insert_stat(&mut stats, stat_keys::POWER_PLAY_GOALS, totals.power_play_goals);
    insert_stat(&mut stats, stat_keys::SHOTS, totals.shots);
    insert_stat(&mut stats, stat_keys::HITS, totals.hits);
    insert_stat(&mut stats, stat_keys::BLOCKS, totals.blocked_shots);
    insert_stat(&mut stats, stat_keys::WINS, totals.wins);
    insert_stat(&mut stats, stat_keys::SHUTOUTS, totals.shutouts);
    insert_stat(&mut stats, stat_keys::GOALS_AGAINST_AVERAGE, totals.goals_against_avg);
    insert_stat(&mut stats, stat_keys::SAVE_PERCENTAGE, totals.save_pctg);
    if let (Some(shots_against), Some(goals_against)) = (totals.shots_against, totals.goals_against)
    {
        stats.insert(stat_keys::SAVES.to_string(), shots_against - goals_against);
    }
    stats
}

/// Most recent NHL regular-season row of a career table
pub fn latest_regular_season(totals: &[RawSeasonTotals]) -> Option<&RawSeasonTotals> {
    totals
        .iter()
        .filter(|row| row.league_abbrev == NHL_LEAGUE && row.game_type_id == REGULAR_SEASON)
        .max_by_key(|row| row.season)
}

pub fn format_player_landing(landing: &PlayerLanding) -> NormalizedPlayer {
    let season_stats = match latest_regular_season(&landing.season_totals) {
        Some(row) => season_stats_from_totals(row),
        None => {
            debug!(
                "No NHL regular season totals for player {}",
                landing.player_id
            );
            StatLine::new()
        }
    };

    NormalizedPlayer {
        sweater_number: landing.sweater_number,
        height_in_inches: landing.height_in_inches,
        weight_in_pounds: landing.weight_in_pounds,
        shoots: landing.shoots_catches.clone(),
        headshot: landing.headshot.clone(),
        season_stats,
        ..NormalizedPlayer::new(
            landing.player_id.to_string(),
            full_name(&landing.first_name, &landing.last_name),
            landing.current_team_abbrev.clone().unwrap_or_default(),
            Position::from_code(&landing.position),
        )
    }
}

pub fn format_search_player(raw: &RawSearchPlayer) -> NormalizedPlayer {
    NormalizedPlayer {
        sweater_number: raw.sweater_number,
        height_in_inches: raw.height_in_inches,
        weight_in_pounds: raw.weight_in_pounds,
        ..NormalizedPlayer::new(
            raw.player_id.clone(),
            raw.name.trim(),
            raw.team_abbrev.clone().unwrap_or_default(),
            Position::from_code(raw.position_code.as_deref().unwrap_or_default()),
        )
    }
}

fn format_club_skater(team: &str, raw: &RawClubSkater) -> NormalizedPlayer {
    let mut player = NormalizedPlayer::new(
        raw.player_id.to_string(),
        full_name(&raw.first_name, &raw.last_name),
        team,
        Position::from_code(raw.position_code.as_deref().unwrap_or("F")),
    );
    player.headshot = raw.headshot.clone();
    let stats = &mut player.season_stats;
    insert_stat(stats, stat_keys::GAMES_PLAYED, raw.games_played);
    insert_stat(stats, stat_keys::GOALS, raw.goals);
    insert_stat(stats, stat_keys::ASSISTS, raw.assists);
    insert_stat(stats, stat_keys::POINTS, raw.points);
    insert_stat(stats, stat_keys::PLUS_MINUS, raw.plus_minus);
    insert_stat(stats, stat_keys::PENALTY_MINUTES, raw.penalty_minutes);
    insert_stat(stats, stat_keys::POWER_PLAY_GOALS, raw.power_play_goals);
    insert_stat(stats, stat_keys::SHOTS, raw.shots);
    player
}

fn format_club_goalie(team: &str, raw: &RawClubGoalie) -> NormalizedPlayer {
    let mut player = NormalizedPlayer::new(
        raw.player_id.to_string(),
        full_name(&raw.first_name, &raw.last_name),
        team,
        Position::G,
    );
    player.headshot = raw.headshot.clone();
    let stats = &mut player.season_stats;
    insert_stat(stats, stat_keys::GAMES_PLAYED, raw.games_played);
    insert_stat(stats, stat_keys::WINS, raw.wins);
    insert_stat(stats, stat_keys::SHUTOUTS, raw.shutouts);
    insert_stat(stats, stat_keys::SAVES, raw.saves);
    insert_stat(stats, stat_keys::GOALS_AGAINST_AVERAGE, raw.goals_against_average);
    insert_stat(stats, stat_keys::SAVE_PERCENTAGE, raw.save_percentage);
    player
}

pub fn format_club_stats(team: &str, raw: &ClubStatsResponse) -> ClubStats {
    ClubStats {
        team: team.to_string(),
        season: raw.season.clone(),
        skaters: raw.skaters.iter().map(|s| format_club_skater(team, s)).collect(),
        goalies: raw.goalies.iter().map(|g| format_club_goalie(team, g)).collect(),
    }
}

/// Team list entry, with conference and division filled from the static table
pub fn format_team(raw: &RawTeam) -> Team {
    let info = find_team(&raw.tri_code);
    Team {
        abbrev: raw.tri_code.clone(),
        name: raw.full_name.clone(),
        id: raw.id,
        conference: info.map(|t| t.conference.to_string()),
        division: info.map(|t| t.division.to_string()),
    }
}

pub fn format_standing(raw: &RawStanding) -> StandingsRow {
    StandingsRow {
        team_abbrev: raw.team_abbrev.as_str().to_string(),
        team_name: raw.team_name.as_str().to_string(),
        conference: raw.conference_name.clone(),
        division: raw.division_name.clone(),
        games_played: raw.games_played,
        wins: raw.wins,
        losses: raw.losses,
        ot_losses: raw.ot_losses,
        points: raw.points,
        goal_differential: i64::from(raw.goal_for) - i64::from(raw.goal_against),
    }
}

pub fn format_game(raw: &RawGame) -> GameSummary {
    GameSummary {
        id: raw.id,
        state: raw.game_state.clone(),
        date: raw.game_date.clone(),
        start_time_utc: raw.start_time_utc.clone(),
        venue: raw.venue.as_ref().map(|v| v.as_str().to_string()),
        period: raw.period_descriptor.as_ref().and_then(|p| p.number),
        home: TeamScore {
            abbrev: raw.home_team.abbrev.clone(),
            score: raw.home_team.score,
            shots: raw.home_team.sog,
        },
        away: TeamScore {
            abbrev: raw.away_team.abbrev.clone(),
            score: raw.away_team.score,
            shots: raw.away_team.sog,
        },
    }
}

pub fn format_scoreboard(raw: &ScoreboardResponse) -> Scoreboard {
    Scoreboard {
        date: raw.current_date.clone(),
        games: raw.games.iter().map(format_game).collect(),
    }
}
