//! URL building utilities for provider endpoints
//!
//! Path parameters that come from callers (team abbreviations, search text)
//! are percent-encoded where the upstream accepts free text.

/// Builds the NHL team list URL.
///
/// # Example
/// ```
/// use rinkside::data_fetcher::api::build_teams_url;
///
/// assert_eq!(build_teams_url("https://api.example.com/v1"), "https://api.example.com/v1/teams");
/// ```
pub fn build_teams_url(base: &str) -> String {
    format!("{base}/teams")
}

pub fn build_standings_url(base: &str) -> String {
    format!("{base}/standings/now")
}

pub fn build_player_landing_url(base: &str, player_id: &str) -> String {
    format!("{base}/player/{player_id}/landing")
}

/// Builds the current roster URL for a team.
///
/// # Example
/// ```
/// use rinkside::data_fetcher::api::build_roster_url;
///
/// let url = build_roster_url("https://api.example.com/v1", "TOR");
/// assert_eq!(url, "https://api.example.com/v1/roster/TOR/current");
/// ```
pub fn build_roster_url(base: &str, team_abbrev: &str) -> String {
    format!("{base}/roster/{team_abbrev}/current")
}

pub fn build_team_schedule_url(base: &str, team_abbrev: &str) -> String {
    format!("{base}/club-schedule/{team_abbrev}/week/now")
}

pub fn build_scoreboard_url(base: &str) -> String {
    format!("{base}/score/now")
}

pub fn build_game_center_url(base: &str, game_id: u64) -> String {
    format!("{base}/gamecenter/{game_id}/landing")
}

/// Builds the player search URL.
///
/// # Example
/// ```
/// use rinkside::data_fetcher::api::build_player_search_url;
///
/// let url = build_player_search_url("https://api.example.com/v1", "mc david", 20);
/// assert_eq!(url, "https://api.example.com/v1/search/player?q=mc%20david&limit=20");
/// ```
pub fn build_player_search_url(base: &str, query: &str, limit: usize) -> String {
    format!(
        "{base}/search/player?q={}&limit={limit}",
        percent_encode(query)
    )
}

pub fn build_team_stats_url(base: &str, team_abbrev: &str) -> String {
    format!("{base}/club-stats/{team_abbrev}/now")
}

// Fantasy resources. Keys are opaque strings such as `453.l.12345`; filters are
// `;param=value` matrix segments appended to the collection they apply to.

pub fn build_user_leagues_path() -> String {
    "/users;use_login=1/leagues".to_string()
}

pub fn build_league_settings_path(league_key: &str) -> String {
    format!("/league/{league_key}/settings")
}

pub fn build_league_standings_path(league_key: &str) -> String {
    format!("/league/{league_key}/standings")
}

pub fn build_league_teams_path(league_key: &str) -> String {
    format!("/league/{league_key}/teams")
}

pub fn build_team_roster_path(team_key: &str) -> String {
    format!("/team/{team_key}/roster")
}

/// Builds the league-scoped player stats path.
///
/// # Example
/// ```
/// use rinkside::data_fetcher::api::build_player_stats_path;
///
/// let keys = vec!["453.p.6743".to_string(), "453.p.7109".to_string()];
/// assert_eq!(
///     build_player_stats_path("453.l.1", &keys, "season"),
///     "/league/453.l.1/players;player_keys=453.p.6743,453.p.7109/stats;type=season"
/// );
/// ```
pub fn build_player_stats_path(league_key: &str, player_keys: &[String], stat_type: &str) -> String {
    format!(
        "/league/{league_key}/players;player_keys={}/stats;type={stat_type}",
        player_keys.join(",")
    )
}

pub fn build_free_agents_path(league_key: &str, position: Option<&str>, count: u32) -> String {
    let mut path = format!("/league/{league_key}/players;status=A;count={count}");
    if let Some(position) = position {
        path.push_str(&format!(";position={position}"));
    }
    path
}

pub fn build_transactions_path(league_key: &str, transaction_type: Option<&str>) -> String {
    let mut path = format!("/league/{league_key}/transactions");
    if let Some(kind) = transaction_type {
        path.push_str(&format!(";type={kind}"));
    }
    path
}

pub fn build_matchups_path(league_key: &str, week: Option<u32>) -> String {
    let mut path = format!("/league/{league_key}/scoreboard");
    if let Some(week) = week {
        path.push_str(&format!(";week={week}"));
    }
    path
}

// News sources

pub fn build_rotowire_news_url(base: &str) -> String {
    format!("{base}/nhl/news")
}

pub fn build_rotowire_player_news_url(base: &str, player_id: &str) -> String {
    format!("{base}/nhl/players/{player_id}/news")
}

pub fn build_rotowire_injuries_url(base: &str) -> String {
    format!("{base}/nhl/injuries")
}

pub fn build_espn_news_url(base: &str) -> String {
    format!("{base}/news")
}

pub fn build_espn_athlete_news_url(base: &str, player_id: &str) -> String {
    format!("{base}/athletes/{player_id}/news")
}

pub fn build_news_search_url(base: &str) -> String {
    format!("{base}/everything")
}

/// Percent-encodes everything outside the RFC 3986 unreserved set
fn percent_encode(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{byte:02X}")),
        }
    }
    encoded
}
