//! Fantasy league provider client.
//!
//! Every call carries the current bearer token. A 401 triggers exactly one
//! refresh and one replay; a second 401 ends the session.

use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, instrument, warn};

use super::fetch_utils::{RetryPolicy, Upstream, fetch_json};
use super::oauth::TokenManager;
use super::urls::{
    build_free_agents_path, build_league_settings_path, build_league_standings_path,
    build_league_teams_path, build_matchups_path, build_player_stats_path, build_team_roster_path,
    build_transactions_path, build_user_leagues_path,
};
use crate::data_fetcher::models::{
    FantasyLeague, FantasyPlayer, FantasyTeam, LeagueSettings, Matchup, Provider, StandingsEntry,
    Transaction,
};
use crate::data_fetcher::processors::fantasy_parsing::{
    MissingNode, parse_league_players, parse_league_settings, parse_league_standings,
    parse_league_teams, parse_matchups, parse_team_roster, parse_transactions, parse_user_leagues,
};
use crate::data_fetcher::rate_limiter::RateLimiter;
use crate::error::{AppError, FetchFailure};

/// Default page size for free agent listings
pub const DEFAULT_FREE_AGENT_COUNT: u32 = 50;

#[derive(Clone)]
pub struct FantasyClient {
    client: Client,
    base_url: String,
    tokens: Arc<TokenManager>,
    retry: RetryPolicy,
    limiter: Arc<RateLimiter>,
}

impl FantasyClient {
    /// Every request, retries and 401 replays included, is charged to
    /// `limiter`'s fantasy budget
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        tokens: Arc<TokenManager>,
        retry: RetryPolicy,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
            retry,
            limiter,
        }
    }

    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    async fn send(&self, resource: &str, url: &str, access_token: &str) -> Result<Value, AppError> {
        fetch_json(
            || {
                self.client
                    .get(url)
                    .query(&[("format", "json")])
                    .bearer_auth(access_token)
            },
            url,
            &self.retry,
            Upstream::metered(Provider::Fantasy, resource, &self.limiter),
        )
        .await
    }

    /// Authenticated GET returning the raw document for the resource parsers
    #[instrument(skip(self))]
    async fn get_json(&self, resource: &str, path: &str) -> Result<Value, AppError> {
        let access_token = self.tokens.access_token().ok_or(AppError::NotAuthenticated {
            provider: Provider::Fantasy,
        })?;
        let url = format!("{}{}", self.base_url, path);

        match self.send(resource, &url, &access_token).await {
            Err(e) if is_unauthorized(&e) => {
                warn!("Fantasy API rejected the access token for {resource}, refreshing");
                let refreshed = self.tokens.refresh_if_current(Some(&access_token)).await?;

                match self.send(resource, &url, &refreshed).await {
                    Err(e) if is_unauthorized(&e) => {
                        error!("Refreshed token rejected for {resource}, ending fantasy session");
                        self.tokens.clear_tokens()?;
                        Err(AppError::ReauthenticationRequired)
                    }
                    other => other,
                }
            }
            other => other,
        }
    }

    async fn get_parsed<T>(
        &self,
        resource: &str,
        path: String,
        parse: fn(&Value) -> Result<T, MissingNode>,
    ) -> Result<T, AppError> {
        let document = self.get_json(resource, &path).await?;
        parse(&document).map_err(|missing| {
            error!("Unexpected fantasy payload for {resource}: {missing}");
            AppError::provider(
                Provider::Fantasy,
                resource,
                FetchFailure::UnexpectedStructure {
                    message: missing.to_string(),
                    url: format!("{}{}", self.base_url, path),
                },
            )
        })
    }

    pub async fn get_user_leagues(&self) -> Result<Vec<FantasyLeague>, AppError> {
        self.get_parsed("user/leagues", build_user_leagues_path(), parse_user_leagues)
            .await
    }

    pub async fn get_league_settings(&self, league_key: &str) -> Result<LeagueSettings, AppError> {
        self.get_parsed(
            &format!("league/{league_key}/settings"),
            build_league_settings_path(league_key),
            parse_league_settings,
        )
        .await
    }

    pub async fn get_league_standings(
        &self,
        league_key: &str,
    ) -> Result<Vec<StandingsEntry>, AppError> {
        self.get_parsed(
            &format!("league/{league_key}/standings"),
            build_league_standings_path(league_key),
            parse_league_standings,
        )
        .await
    }

    pub async fn get_league_teams(&self, league_key: &str) -> Result<Vec<FantasyTeam>, AppError> {
        self.get_parsed(
            &format!("league/{league_key}/teams"),
            build_league_teams_path(league_key),
            parse_league_teams,
        )
        .await
    }

    pub async fn get_team_roster(&self, team_key: &str) -> Result<Vec<FantasyPlayer>, AppError> {
        self.get_parsed(
            &format!("team/{team_key}/roster"),
            build_team_roster_path(team_key),
            parse_team_roster,
        )
        .await
    }

    /// Stats for specific players; `stat_type` is `season`, `lastweek`, ...
    pub async fn get_player_stats(
        &self,
        league_key: &str,
        player_keys: &[String],
        stat_type: &str,
    ) -> Result<Vec<FantasyPlayer>, AppError> {
        self.get_parsed(
            &format!("league/{league_key}/players/stats"),
            build_player_stats_path(league_key, player_keys, stat_type),
            parse_league_players,
        )
        .await
    }

    pub async fn get_free_agents(
        &self,
        league_key: &str,
        position: Option<&str>,
        count: u32,
    ) -> Result<Vec<FantasyPlayer>, AppError> {
        self.get_parsed(
            &format!("league/{league_key}/free-agents"),
            build_free_agents_path(league_key, position, count),
            parse_league_players,
        )
        .await
    }

    pub async fn get_transactions(
        &self,
        league_key: &str,
        transaction_type: Option<&str>,
    ) -> Result<Vec<Transaction>, AppError> {
        self.get_parsed(
            &format!("league/{league_key}/transactions"),
            build_transactions_path(league_key, transaction_type),
            parse_transactions,
        )
        .await
    }

    pub async fn get_matchups(
        &self,
        league_key: &str,
        week: Option<u32>,
    ) -> Result<Vec<Matchup>, AppError> {
        self.get_parsed(
            &format!("league/{league_key}/scoreboard"),
            build_matchups_path(league_key, week),
            parse_matchups,
        )
        .await
    }

    /// Cheap authenticated round trip. `Ok(false)` means the session is gone.
    pub async fn validate_token(&self) -> Result<bool, AppError> {
        match self.get_user_leagues().await {
            Ok(_) => Ok(true),
            Err(e) if e.requires_login() => {
                debug!("Fantasy session is not valid: {e}");
                Ok(false)
            }
            Err(AppError::Auth(message)) => {
                debug!("Fantasy session refresh failed: {message}");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

fn is_unauthorized(error: &AppError) -> bool {
    matches!(
        error,
        AppError::Provider {
            cause: FetchFailure::Unauthorized { .. },
            ..
        }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FantasyConfig;
    use crate::constants::storage_keys;
    use crate::data_fetcher::api::http_client::create_test_http_client;
    use crate::storage::{KeyValueStore, MemoryStore};
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn tokens_for(server: &MockServer, store: Arc<MemoryStore>) -> Arc<TokenManager> {
        let config = FantasyConfig {
            api_base: server.uri(),
            token_url: format!("{}/oauth2/get_token", server.uri()),
            client_id: Some("client-123".to_string()),
            client_secret: Some("secret".to_string()),
            ..FantasyConfig::default()
        };
        Arc::new(TokenManager::new(create_test_http_client(), config, store))
    }

    fn signed_in_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store.set(storage_keys::FANTASY_ACCESS_TOKEN, "old-access").unwrap();
        store.set(storage_keys::FANTASY_REFRESH_TOKEN, "refresh-1").unwrap();
        store
    }

    fn client_for(server: &MockServer, tokens: Arc<TokenManager>) -> FantasyClient {
        client_with_limiter(server, tokens, Arc::new(RateLimiter::default()))
    }

    fn client_with_limiter(
        server: &MockServer,
        tokens: Arc<TokenManager>,
        limiter: Arc<RateLimiter>,
    ) -> FantasyClient {
        FantasyClient::new(
            create_test_http_client(),
            server.uri(),
            tokens,
            RetryPolicy::none(),
            limiter,
        )
    }

    fn free_agents_body() -> Value {
        json!({
            "fantasy_content": {
                "league": [
                    {"league_key": "453.l.1"},
                    {"players": {
                        "0": {"player": [[
                            {"player_key": "453.p.6743"},
                            {"name": {"full": "Connor McDavid"}},
                            {"editorial_team_abbr": "Edm"},
                            {"display_position": "C"}
                        ]]},
                        "count": 1
                    }}
                ]
            }
        })
    }

    #[tokio::test]
    async fn test_requests_carry_bearer_and_format() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/league/453.l.1/players;status=A;count=25;position=C"))
            .and(query_param("format", "json"))
            .and(header("authorization", "Bearer old-access"))
            .respond_with(ResponseTemplate::new(200).set_body_json(free_agents_body()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, tokens_for(&server, signed_in_store()));
        let players = client
            .get_free_agents("453.l.1", Some("C"), 25)
            .await
            .unwrap();

        assert_eq!(players.len(), 1);
        assert_eq!(players[0].player_key, "453.p.6743");
        assert_eq!(players[0].team_abbrev.as_deref(), Some("EDM"));
    }

    #[tokio::test]
    async fn test_unauthorized_triggers_one_refresh_and_one_replay() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/league/453.l.1/teams"))
            .and(header("authorization", "Bearer old-access"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/oauth2/get_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "new-access",
                "refresh_token": "refresh-2"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/league/453.l.1/teams"))
            .and(header("authorization", "Bearer new-access"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "fantasy_content": {
                    "league": [
                        {"league_key": "453.l.1"},
                        {"teams": {
                            "0": {"team": [[{"team_key": "453.l.1.t.1"}, {"name": "Top Shelf"}]]},
                            "count": 1
                        }}
                    ]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let store = signed_in_store();
        let limiter = Arc::new(RateLimiter::default());
        let client = client_with_limiter(&server, tokens_for(&server, store.clone()), limiter.clone());
        let teams = client.get_league_teams("453.l.1").await.unwrap();

        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].name, "Top Shelf");
        // The replay is a second upstream request and takes its own permit
        let fantasy = limiter
            .status()
            .await
            .into_iter()
            .find(|s| s.provider == Provider::Fantasy)
            .unwrap();
        assert_eq!(fantasy.used, 2);
        assert_eq!(
            store.get(storage_keys::FANTASY_ACCESS_TOKEN).unwrap().as_deref(),
            Some("new-access")
        );
    }

    #[tokio::test]
    async fn test_second_unauthorized_clears_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/league/453.l.1/settings"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/oauth2/get_token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access_token": "new-access"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let store = signed_in_store();
        let tokens = tokens_for(&server, store.clone());
        let client = client_for(&server, tokens.clone());
        let result = client.get_league_settings("453.l.1").await;

        assert!(matches!(result, Err(AppError::ReauthenticationRequired)));
        assert!(!tokens.is_authenticated());
        assert_eq!(store.get(storage_keys::FANTASY_ACCESS_TOKEN).unwrap(), None);
        assert_eq!(store.get(storage_keys::FANTASY_REFRESH_TOKEN).unwrap(), None);
    }

    #[tokio::test]
    async fn test_unauthenticated_call_fails_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server, tokens_for(&server, Arc::new(MemoryStore::new())));
        let result = client.get_user_leagues().await;
        assert!(matches!(
            result,
            Err(AppError::NotAuthenticated {
                provider: Provider::Fantasy
            })
        ));
        assert!(!client.validate_token().await.unwrap());
    }

    #[tokio::test]
    async fn test_payload_without_content_is_unexpected_structure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/league/453.l.1/standings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "nope"})))
            .mount(&server)
            .await;

        let client = client_for(&server, tokens_for(&server, signed_in_store()));
        let result = client.get_league_standings("453.l.1").await;
        assert!(matches!(
            result,
            Err(AppError::Provider {
                provider: Provider::Fantasy,
                cause: FetchFailure::UnexpectedStructure { .. },
                ..
            })
        ));
    }
}
