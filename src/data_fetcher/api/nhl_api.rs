//! NHL stats API client

use futures::future::join_all;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::fetch_utils::{RetryPolicy, Upstream, fetch_json};
use super::urls::{
    build_game_center_url, build_player_landing_url, build_player_search_url, build_roster_url,
    build_scoreboard_url, build_standings_url, build_team_schedule_url, build_team_stats_url,
    build_teams_url,
};
use crate::constants::NHL_TEAMS;
use crate::data_fetcher::models::nhl::{
    ClubScheduleResponse, ClubStatsResponse, PlayerLanding, RawGame, RawSearchPlayer,
    RosterResponse, ScoreboardResponse, StandingsResponse, TeamsResponse,
};
use crate::data_fetcher::models::{
    ClubStats, GameSummary, NormalizedPlayer, Provider, Scoreboard, StandingsRow, Team,
};
use crate::data_fetcher::processors::player_formatting::{
    flatten_roster, format_club_stats, format_game, format_player_landing, format_scoreboard,
    format_search_player, format_standing, format_team,
};
use crate::data_fetcher::rate_limiter::RateLimiter;
use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct NhlClient {
    client: Client,
    base_url: String,
    retry: RetryPolicy,
    limiter: Arc<RateLimiter>,
}

impl NhlClient {
    /// Every request, retries included, is charged to `limiter`'s NHL budget
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        retry: RetryPolicy,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            retry,
            limiter,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get<T: DeserializeOwned>(&self, resource: &str, url: String) -> Result<T, AppError> {
        debug!("Fetching NHL {resource} from {url}");
        fetch_json(
            || self.client.get(&url),
            &url,
            &self.retry,
            Upstream::metered(Provider::Nhl, resource, &self.limiter),
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn get_teams(&self) -> Result<Vec<Team>, AppError> {
        let response: TeamsResponse = self.get("teams", build_teams_url(&self.base_url)).await?;
        Ok(response.data.iter().map(format_team).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_standings(&self) -> Result<Vec<StandingsRow>, AppError> {
        let response: StandingsResponse = self
            .get("standings", build_standings_url(&self.base_url))
            .await?;
        Ok(response.standings.iter().map(format_standing).collect())
    }

    /// Player bio plus the latest NHL regular-season totals
    #[instrument(skip(self))]
    pub async fn get_player_stats(&self, player_id: &str) -> Result<NormalizedPlayer, AppError> {
        let landing: PlayerLanding = self
            .get(
                &format!("player/{player_id}"),
                build_player_landing_url(&self.base_url, player_id),
            )
            .await?;
        Ok(format_player_landing(&landing))
    }

    #[instrument(skip(self))]
    pub async fn get_team_roster(&self, team_abbrev: &str) -> Result<Vec<NormalizedPlayer>, AppError> {
        let roster: RosterResponse = self
            .get(
                &format!("roster/{team_abbrev}"),
                build_roster_url(&self.base_url, team_abbrev),
            )
            .await?;
        Ok(flatten_roster(team_abbrev, &roster))
    }

    /// Games of the current week for one club
    #[instrument(skip(self))]
    pub async fn get_team_schedule(&self, team_abbrev: &str) -> Result<Vec<GameSummary>, AppError> {
        let schedule: ClubScheduleResponse = self
            .get(
                &format!("club-schedule/{team_abbrev}"),
                build_team_schedule_url(&self.base_url, team_abbrev),
            )
            .await?;
        Ok(schedule.games.iter().map(format_game).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_live_scoreboard(&self) -> Result<Scoreboard, AppError> {
        let response: ScoreboardResponse = self
            .get("scoreboard", build_scoreboard_url(&self.base_url))
            .await?;
        Ok(format_scoreboard(&response))
    }

    #[instrument(skip(self))]
    pub async fn get_game_center(&self, game_id: u64) -> Result<GameSummary, AppError> {
        let game: RawGame = self
            .get(
                &format!("gamecenter/{game_id}"),
                build_game_center_url(&self.base_url, game_id),
            )
            .await?;
        Ok(format_game(&game))
    }

    #[instrument(skip(self))]
    pub async fn search_players(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<NormalizedPlayer>, AppError> {
        let results: Vec<RawSearchPlayer> = self
            .get(
                "search/player",
                build_player_search_url(&self.base_url, query, limit),
            )
            .await?;
        Ok(results.iter().map(format_search_player).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_team_stats(&self, team_abbrev: &str) -> Result<ClubStats, AppError> {
        let stats: ClubStatsResponse = self
            .get(
                &format!("club-stats/{team_abbrev}"),
                build_team_stats_url(&self.base_url, team_abbrev),
            )
            .await?;
        Ok(format_club_stats(team_abbrev, &stats))
    }

    /// Fetches every club's roster concurrently and flattens them into one list.
    ///
    /// Each roster request takes its own rate-limit permit. A team whose roster
    /// fails is logged and skipped; the call only fails when no team succeeds.
    #[instrument(skip(self))]
    pub async fn get_all_players(&self) -> Result<Vec<NormalizedPlayer>, AppError> {
        let fetches = NHL_TEAMS
            .iter()
            .map(|team| self.get_team_roster(team.abbrev));
        let results = join_all(fetches).await;

        let mut players = Vec::new();
        let mut failed_teams = Vec::new();
        let mut last_error = None;
        for (team, result) in NHL_TEAMS.iter().zip(results) {
            match result {
                Ok(roster) => players.extend(roster),
                Err(e) => {
                    warn!("Skipping roster for {}: {e}", team.abbrev);
                    failed_teams.push(team.abbrev);
                    last_error = Some(e);
                }
            }
        }

        if failed_teams.len() == NHL_TEAMS.len()
            && let Some(error) = last_error
        {
            return Err(error);
        }
        if !failed_teams.is_empty() {
            warn!(
                "Player list is partial, {} of {} rosters failed: {}",
                failed_teams.len(),
                NHL_TEAMS.len(),
                failed_teams.join(", ")
            );
        }
        info!("Fetched {} players across {} teams", players.len(), NHL_TEAMS.len() - failed_teams.len());
        Ok(players)
    }
}

/// Static team list for presentation fallbacks
pub fn fallback_teams() -> Vec<Team> {
    NHL_TEAMS
        .iter()
        .map(|team| Team {
            abbrev: team.abbrev.to_string(),
            name: team.name.to_string(),
            id: None,
            conference: Some(team.conference.to_string()),
            division: Some(team.division.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_fetcher::api::http_client::create_test_http_client;
    use crate::data_fetcher::models::Position;
    use crate::error::FetchFailure;
    use serde_json::json;
    use wiremock::matchers::{method, path, path_regex, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> NhlClient {
        client_with_limiter(server, Arc::new(RateLimiter::new(100, 30, true)))
    }

    fn client_with_limiter(server: &MockServer, limiter: Arc<RateLimiter>) -> NhlClient {
        NhlClient::new(create_test_http_client(), server.uri(), RetryPolicy::none(), limiter)
    }

    fn roster_body(id: u64) -> serde_json::Value {
        json!({
            "forwards": [
                {"id": id, "firstName": {"default": "Top"}, "lastName": {"default": "Line"}, "positionCode": "C"}
            ],
            "defensemen": [],
            "goalies": []
        })
    }

    #[tokio::test]
    async fn test_team_roster_is_flattened_and_tagged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/roster/EDM/current"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "forwards": [
                    {"id": 8478402, "firstName": {"default": "Connor"}, "lastName": {"default": "McDavid"}, "positionCode": "C", "sweaterNumber": 97},
                    {"id": 8477934, "firstName": {"default": "Leon"}, "lastName": {"default": "Draisaitl"}, "positionCode": "L"},
                    {"id": 8479999, "firstName": {"default": "Zach"}, "lastName": {"default": "Hyman"}, "positionCode": "R"}
                ],
                "defensemen": [
                    {"id": 8480803, "firstName": {"default": "Evan"}, "lastName": {"default": "Bouchard"}, "positionCode": "D"}
                ],
                "goalies": [
                    {"id": 8479973, "firstName": {"default": "Stuart"}, "lastName": {"default": "Skinner"}, "positionCode": "G"}
                ]
            })))
            .mount(&server)
            .await;

        let players = client_for(&server).get_team_roster("EDM").await.unwrap();

        let positions: Vec<Position> = players.iter().map(|p| p.position.clone()).collect();
        assert_eq!(
            positions,
            vec![Position::C, Position::LW, Position::RW, Position::D, Position::G]
        );
        assert!(players.iter().all(|p| p.team == "EDM"));
        assert_eq!(players[0].name, "Connor McDavid");
        assert_eq!(players[0].sweater_number, Some(97));
    }

    #[tokio::test]
    async fn test_all_players_tolerates_one_failed_team() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/roster/TOR/current"))
            .respond_with(ResponseTemplate::new(500))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/roster/[A-Z]{3}/current$"))
            .respond_with(ResponseTemplate::new(200).set_body_json(roster_body(1)))
            .mount(&server)
            .await;

        let limiter = Arc::new(RateLimiter::new(100, 30, true));
        let players = client_with_limiter(&server, limiter.clone())
            .get_all_players()
            .await
            .unwrap();

        assert_eq!(players.len(), 31);
        assert!(players.iter().all(|p| p.team != "TOR"));
        let nhl = limiter
            .status()
            .await
            .into_iter()
            .find(|s| s.provider == Provider::Nhl)
            .unwrap();
        assert_eq!(nhl.used, 32);
    }

    #[tokio::test]
    async fn test_all_players_fails_when_every_team_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = client_for(&server).get_all_players().await;

        assert!(matches!(
            result,
            Err(AppError::Provider {
                provider: Provider::Nhl,
                cause: FetchFailure::ServiceUnavailable { status: 503, .. },
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_not_found_propagates_as_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/player/1/landing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let error = client_for(&server).get_player_stats("1").await.unwrap_err();
        assert!(error.is_not_found());
        match error {
            AppError::Provider { resource, .. } => assert_eq!(resource, "player/1"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_search_players_passes_query_and_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/player"))
            .and(query_param("q", "mcdavid"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"playerId": "8478402", "name": "Connor McDavid", "positionCode": "C", "teamAbbrev": "EDM"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let players = client_for(&server).search_players("mcdavid", 5).await.unwrap();
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].id, "8478402");
        assert_eq!(players[0].team, "EDM");
    }

    #[tokio::test]
    async fn test_teams_are_enriched_from_static_table() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/teams"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": 10, "fullName": "Toronto Maple Leafs", "triCode": "TOR"}]
            })))
            .mount(&server)
            .await;

        let teams = client_for(&server).get_teams().await.unwrap();
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].id, Some(10));
        assert!(teams[0].division.is_some());
    }

    #[test]
    fn test_fallback_teams_cover_the_league() {
        let teams = fallback_teams();
        assert_eq!(teams.len(), 32);
        assert!(teams.iter().any(|t| t.abbrev == "SEA"));
    }
}
