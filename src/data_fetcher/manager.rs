//! The aggregation façade consumers talk to.
//!
//! Every read follows the same chain for its key: cache lookup, then the
//! provider call, then the cache write. The provider clients take a rate limit
//! permit before each upstream attempt. Cache keys encode every parameter that
//! changes the result.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::constants::cache_ttl;
use crate::data_fetcher::api::{
    AuthStatus, FantasyClient, NewsClient, NhlClient, RetryPolicy, TokenManager,
    create_http_client_with_timeout, fallback_teams,
};
use crate::data_fetcher::cache::{CacheDuration, CacheStats, SweeperHandle, TtlCache};
use crate::data_fetcher::models::{
    ClubStats, CombinedPlayerData, FantasyLeague, FantasyPlayer, FantasyTeam, GameSummary,
    LeagueSettings, Matchup, NewsItem, NewsQuery, NormalizedPlayer, Provider, Scoreboard,
    StandingsEntry, StandingsRow, StatLine, Team, Transaction,
};
use crate::data_fetcher::news_pipeline::NewsPipeline;
use crate::data_fetcher::processors::{FantasyScoringWeights, calculate_fantasy_points};
use crate::data_fetcher::rate_limiter::{RateLimitStatus, RateLimiter};
use crate::error::AppError;
use crate::storage::KeyValueStore;

type CachedValue = Arc<dyn Any + Send + Sync>;

/// Stat type used for the fantasy half of combined lookups
const SEASON_STATS: &str = "season";
const FANTASY_KEY_PREFIX: &str = "fantasy:";

/// Builds a cache key from a namespace and the parameters of a request.
/// `:` and `%` inside parameters are escaped so distinct inputs never collide.
pub fn cache_key(namespace: &str, params: &[&str]) -> String {
    let mut key = namespace.to_string();
    for param in params {
        key.push(':');
        key.push_str(&param.replace('%', "%25").replace(':', "%3A"));
    }
    key
}

/// Fantasy player key for a stats-provider player id, e.g. `453.p.8478402`
pub fn fantasy_player_key(league_key: &str, player_id: &str) -> String {
    let game = league_key.split(".l.").next().unwrap_or(league_key);
    format!("{game}.p.{player_id}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Error,
    NotAuthenticated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderHealth {
    pub status: HealthStatus,
    pub latency_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderHealth {
    fn from_probe<T>(started: Instant, result: Result<T, AppError>) -> Self {
        match result {
            Ok(_) => Self {
                status: HealthStatus::Healthy,
                latency_ms: started.elapsed().as_millis() as u64,
                error: None,
            },
            Err(e) => Self {
                status: HealthStatus::Error,
                latency_ms: 0,
                error: Some(e.to_string()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub nhl: ProviderHealth,
    pub fantasy: ProviderHealth,
    pub news: ProviderHealth,
    pub cache: CacheStats,
    pub checked_at: DateTime<Utc>,
}

pub struct ApiManager {
    config: Config,
    cache: Arc<TtlCache<CachedValue>>,
    limiter: Arc<RateLimiter>,
    nhl: NhlClient,
    fantasy: FantasyClient,
    tokens: Arc<TokenManager>,
    news: NewsPipeline,
    sweeper: Mutex<Option<SweeperHandle>>,
}

impl ApiManager {
    /// Builds every shared component and starts the cache sweep.
    /// Must be called from within a tokio runtime.
    pub fn start(config: Config, store: Arc<dyn KeyValueStore>) -> Result<Arc<Self>, AppError> {
        config.validate()?;

        let client = create_http_client_with_timeout(config.http_timeout_seconds)?;
        let retry = RetryPolicy::with_max_retries(config.http_max_retries);
        let limiter = Arc::new(RateLimiter::from_config(&config.rate_limits));

        let tokens = Arc::new(TokenManager::new(
            client.clone(),
            config.fantasy.clone(),
            store,
        ));
        let nhl = NhlClient::new(
            client.clone(),
            config.nhl_api_base.clone(),
            retry,
            limiter.clone(),
        );
        let fantasy = FantasyClient::new(
            client.clone(),
            config.fantasy.api_base.clone(),
            tokens.clone(),
            retry,
            limiter.clone(),
        );
        let news = NewsPipeline::new(NewsClient::new(client, config.news.clone(), retry));

        let cache = Arc::new(TtlCache::new(config.cache_capacity));
        let sweeper = cache.spawn_sweeper(Duration::from_secs(cache_ttl::SWEEP_INTERVAL_SECONDS));

        info!(
            "API manager started (cache capacity {}, fantasy session: {})",
            config.cache_capacity,
            tokens.is_authenticated()
        );
        Ok(Arc::new(Self {
            config,
            cache,
            limiter,
            nhl,
            fantasy,
            tokens,
            news,
            sweeper: Mutex::new(Some(sweeper)),
        }))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Stops the cache sweep. Further calls still work but expired entries are
    /// only dropped when read.
    pub async fn shutdown(&self) {
        if let Some(sweeper) = self.sweeper.lock().await.take() {
            sweeper.shutdown().await;
            info!("API manager shut down");
        }
    }

    /// Cache lookup, else run `fetch` and store the result under `key`.
    /// Clients charge the rate limiter per upstream attempt, so nothing is
    /// metered here.
    async fn cached<T, F, Fut>(&self, key: &str, tier: CacheDuration, fetch: F) -> Result<T, AppError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let value = self
            .cache
            .get_or_fetch(key, tier.ttl(), || async move {
                let value = fetch().await?;
                Ok(Arc::new(value) as CachedValue)
            })
            .await
            .map_err(|e| {
                warn!("Fetch for cache key {key} failed: {e}");
                e.into_upstream()
            })?;

        value
            .downcast_ref::<T>()
            .cloned()
            .ok_or_else(|| AppError::CacheTypeMismatch {
                key: key.to_string(),
            })
    }

    fn require_fantasy_session(&self) -> Result<(), AppError> {
        if self.tokens.is_authenticated() {
            Ok(())
        } else {
            Err(AppError::NotAuthenticated {
                provider: Provider::Fantasy,
            })
        }
    }

    // NHL stats

    pub async fn get_nhl_teams(&self) -> Result<Vec<Team>, AppError> {
        self.cached(&cache_key("nhl:teams", &[]), CacheDuration::Long, || {
            self.nhl.get_teams()
        })
        .await
    }

    /// Team directory for display. Falls back to the static reference table
    /// when the stats API cannot be reached; never use it where stats must be
    /// authoritative.
    pub async fn get_nhl_teams_or_fallback(&self) -> Vec<Team> {
        match self.get_nhl_teams().await {
            Ok(teams) => teams,
            Err(e) => {
                warn!("Team list unavailable, using static reference data: {e}");
                fallback_teams()
            }
        }
    }

    pub async fn get_nhl_standings(&self) -> Result<Vec<StandingsRow>, AppError> {
        self.cached(
            &cache_key("nhl:standings", &[]),
            CacheDuration::Medium,
            || self.nhl.get_standings(),
        )
        .await
    }

    pub async fn get_nhl_player_stats(&self, player_id: &str) -> Result<NormalizedPlayer, AppError> {
        self.cached(
            &cache_key("nhl:player", &[player_id]),
            CacheDuration::Medium,
            || self.nhl.get_player_stats(player_id),
        )
        .await
    }

    pub async fn get_nhl_team_roster(&self, team_abbrev: &str) -> Result<Vec<NormalizedPlayer>, AppError> {
        self.cached(
            &cache_key("nhl:roster", &[team_abbrev]),
            CacheDuration::Medium,
            || self.nhl.get_team_roster(team_abbrev),
        )
        .await
    }

    pub async fn get_nhl_team_schedule(&self, team_abbrev: &str) -> Result<Vec<GameSummary>, AppError> {
        self.cached(
            &cache_key("nhl:schedule", &[team_abbrev]),
            CacheDuration::Medium,
            || self.nhl.get_team_schedule(team_abbrev),
        )
        .await
    }

    pub async fn get_nhl_live_scoreboard(&self) -> Result<Scoreboard, AppError> {
        self.cached(
            &cache_key("nhl:scoreboard", &[]),
            CacheDuration::Short,
            || self.nhl.get_live_scoreboard(),
        )
        .await
    }

    pub async fn get_nhl_game_center(&self, game_id: u64) -> Result<GameSummary, AppError> {
        self.cached(
            &cache_key("nhl:gamecenter", &[&game_id.to_string()]),
            CacheDuration::Short,
            || self.nhl.get_game_center(game_id),
        )
        .await
    }

    pub async fn search_nhl_players(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<NormalizedPlayer>, AppError> {
        self.cached(
            &cache_key("nhl:search", &[query, &limit.to_string()]),
            CacheDuration::Medium,
            || self.nhl.search_players(query, limit),
        )
        .await
    }

    pub async fn get_nhl_team_stats(&self, team_abbrev: &str) -> Result<ClubStats, AppError> {
        self.cached(
            &cache_key("nhl:team-stats", &[team_abbrev]),
            CacheDuration::Medium,
            || self.nhl.get_team_stats(team_abbrev),
        )
        .await
    }

    /// Every rostered player. Each team's roster request takes its own permit.
    pub async fn get_all_nhl_players(&self) -> Result<Vec<NormalizedPlayer>, AppError> {
        self.cached(&cache_key("nhl:all-players", &[]), CacheDuration::Long, || {
            self.nhl.get_all_players()
        })
        .await
    }

    // Fantasy league

    pub async fn get_fantasy_user_leagues(&self) -> Result<Vec<FantasyLeague>, AppError> {
        self.require_fantasy_session()?;
        self.cached(
            &cache_key("fantasy:leagues", &[]),
            CacheDuration::Medium,
            || self.fantasy.get_user_leagues(),
        )
        .await
    }

    pub async fn get_fantasy_league_settings(&self, league_key: &str) -> Result<LeagueSettings, AppError> {
        self.require_fantasy_session()?;
        self.cached(
            &cache_key("fantasy:settings", &[league_key]),
            CacheDuration::Long,
            || self.fantasy.get_league_settings(league_key),
        )
        .await
    }

    pub async fn get_fantasy_league_standings(
        &self,
        league_key: &str,
    ) -> Result<Vec<StandingsEntry>, AppError> {
        self.require_fantasy_session()?;
        self.cached(
            &cache_key("fantasy:standings", &[league_key]),
            CacheDuration::Medium,
            || self.fantasy.get_league_standings(league_key),
        )
        .await
    }

    pub async fn get_fantasy_league_teams(&self, league_key: &str) -> Result<Vec<FantasyTeam>, AppError> {
        self.require_fantasy_session()?;
        self.cached(
            &cache_key("fantasy:teams", &[league_key]),
            CacheDuration::Long,
            || self.fantasy.get_league_teams(league_key),
        )
        .await
    }

    pub async fn get_fantasy_team_roster(&self, team_key: &str) -> Result<Vec<FantasyPlayer>, AppError> {
        self.require_fantasy_session()?;
        self.cached(
            &cache_key("fantasy:roster", &[team_key]),
            CacheDuration::Short,
            || self.fantasy.get_team_roster(team_key),
        )
        .await
    }

    pub async fn get_fantasy_player_stats(
        &self,
        league_key: &str,
        player_keys: &[String],
        stat_type: &str,
    ) -> Result<Vec<FantasyPlayer>, AppError> {
        self.require_fantasy_session()?;
        let keys = player_keys.join(",");
        self.cached(
            &cache_key("fantasy:player-stats", &[league_key, &keys, stat_type]),
            CacheDuration::Medium,
            || self.fantasy.get_player_stats(league_key, player_keys, stat_type),
        )
        .await
    }

    pub async fn get_fantasy_free_agents(
        &self,
        league_key: &str,
        position: Option<&str>,
        count: u32,
    ) -> Result<Vec<FantasyPlayer>, AppError> {
        self.require_fantasy_session()?;
        self.cached(
            &cache_key(
                "fantasy:free-agents",
                &[league_key, position.unwrap_or("all"), &count.to_string()],
            ),
            CacheDuration::Short,
            || self.fantasy.get_free_agents(league_key, position, count),
        )
        .await
    }

    pub async fn get_fantasy_matchups(
        &self,
        league_key: &str,
        week: Option<u32>,
    ) -> Result<Vec<Matchup>, AppError> {
        self.require_fantasy_session()?;
        let week_param = week.map_or_else(|| "current".to_string(), |w| w.to_string());
        self.cached(
            &cache_key("fantasy:matchups", &[league_key, &week_param]),
            CacheDuration::Short,
            || self.fantasy.get_matchups(league_key, week),
        )
        .await
    }

    pub async fn get_fantasy_transactions(
        &self,
        league_key: &str,
        transaction_type: Option<&str>,
    ) -> Result<Vec<Transaction>, AppError> {
        self.require_fantasy_session()?;
        self.cached(
            &cache_key(
                "fantasy:transactions",
                &[league_key, transaction_type.unwrap_or("all")],
            ),
            CacheDuration::Short,
            || self.fantasy.get_transactions(league_key, transaction_type),
        )
        .await
    }

    // News

    pub async fn get_latest_news(&self, query: &NewsQuery) -> Result<Vec<NewsItem>, AppError> {
        let limit = query.limit.to_string();
        let news_type = query.news_type.map_or("all", |t| t.as_str());
        let team = query.team.as_deref().unwrap_or("all").to_ascii_uppercase();
        self.cached(
            &cache_key("news:latest", &[&limit, news_type, &team]),
            CacheDuration::Short,
            || async { Ok(self.news.latest_news(query).await) },
        )
        .await
    }

    pub async fn get_player_news(
        &self,
        player_id: &str,
        player_name: &str,
        limit: usize,
    ) -> Result<Vec<NewsItem>, AppError> {
        self.cached(
            &cache_key("news:player", &[player_id, player_name, &limit.to_string()]),
            CacheDuration::Short,
            || async { Ok(self.news.player_news(player_id, player_name, limit).await) },
        )
        .await
    }

    // Cross-provider

    /// Stats and fantasy views of one player, fetched concurrently.
    ///
    /// The fantasy branch only runs with a session and a configured default
    /// league. Fails only when no branch produced data.
    #[instrument(skip(self))]
    pub async fn get_combined_player_data(&self, player_id: &str) -> Result<CombinedPlayerData, AppError> {
        let fantasy_branch = async {
            let Some(league_key) = self.config.fantasy.default_league_key.as_deref() else {
                return Ok(None);
            };
            if !self.tokens.is_authenticated() {
                return Ok(None);
            }
            let keys = [fantasy_player_key(league_key, player_id)];
            let players = self
                .get_fantasy_player_stats(league_key, &keys, SEASON_STATS)
                .await?;
            Ok::<_, AppError>(players.into_iter().next())
        };
        let (stats, fantasy) = tokio::join!(self.get_nhl_player_stats(player_id), fantasy_branch);

        let fantasy = match fantasy {
            Ok(player) => player,
            Err(e) => {
                warn!("Fantasy half of combined data for {player_id} failed: {e}");
                None
            }
        };
        let stats = match stats {
            Ok(player) => Some(player),
            Err(e) if fantasy.is_some() => {
                warn!("Stats half of combined data for {player_id} failed: {e}");
                None
            }
            Err(e) => return Err(e),
        };

        let fantasy_points = stats
            .as_ref()
            .map(|player| &player.season_stats)
            .or(fantasy.as_ref().map(|player| &player.stats))
            .map(|line| calculate_fantasy_points(line, None));
        let ownership = fantasy
            .as_ref()
            .and_then(|player| player.percent_owned)
            .unwrap_or(0.0);

        Ok(CombinedPlayerData {
            stats,
            fantasy,
            fantasy_points,
            ownership,
        })
    }

    pub fn calculate_fantasy_points(
        &self,
        stats: &StatLine,
        weights: Option<&FantasyScoringWeights>,
    ) -> f64 {
        calculate_fantasy_points(stats, weights)
    }

    // Cache and limiter introspection

    /// Drops every key matching `pattern`, returning how many were removed
    pub async fn invalidate_cache(&self, pattern: &str) -> Result<usize, AppError> {
        let regex = Regex::new(pattern).map_err(|e| {
            AppError::config_error(format!("Invalid cache pattern '{pattern}': {e}"))
        })?;
        let removed = self.cache.invalidate_pattern(&regex).await;
        debug!("Invalidated {removed} cache entries matching {pattern}");
        Ok(removed)
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }

    pub async fn get_cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    pub async fn get_rate_limit_status(&self) -> Vec<RateLimitStatus> {
        self.limiter.status().await
    }

    /// Probes each provider directly, bypassing the cache
    pub async fn health_check(&self) -> HealthReport {
        let nhl_probe = async {
            let started = Instant::now();
            ProviderHealth::from_probe(started, self.nhl.get_teams().await)
        };
        let fantasy_probe = async {
            if !self.tokens.is_authenticated() {
                return ProviderHealth {
                    status: HealthStatus::NotAuthenticated,
                    latency_ms: 0,
                    error: None,
                };
            }
            let started = Instant::now();
            ProviderHealth::from_probe(started, self.fantasy.get_user_leagues().await)
        };
        let news_probe = async {
            let started = Instant::now();
            ProviderHealth::from_probe(started, self.news.client().get_espn_news(1).await)
        };

        let (nhl, fantasy, news) = tokio::join!(nhl_probe, fantasy_probe, news_probe);
        HealthReport {
            nhl,
            fantasy,
            news,
            cache: self.cache.stats().await,
            checked_at: Utc::now(),
        }
    }

    // Fantasy session

    pub fn fantasy_authorization_url(&self) -> Result<String, AppError> {
        self.tokens.authorization_url()
    }

    pub async fn complete_fantasy_login(&self, code: &str, state: Option<&str>) -> Result<(), AppError> {
        self.tokens.complete_callback(code, state).await
    }

    /// Ends the session and drops every cached fantasy response
    pub async fn fantasy_logout(&self) -> Result<(), AppError> {
        self.tokens.logout()?;
        self.invalidate_cache(&format!("^{FANTASY_KEY_PREFIX}")).await?;
        Ok(())
    }

    pub fn is_fantasy_authenticated(&self) -> bool {
        self.tokens.is_authenticated()
    }

    pub fn fantasy_auth_status(&self) -> AuthStatus {
        self.tokens.status()
    }

    pub async fn validate_fantasy_session(&self) -> Result<bool, AppError> {
        if !self.tokens.is_authenticated() {
            return Ok(false);
        }
        self.fantasy.validate_token().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_fetcher::models::stat_keys;

    #[test]
    fn test_cache_key_encodes_every_parameter() {
        assert_eq!(cache_key("nhl:teams", &[]), "nhl:teams");
        assert_eq!(
            cache_key("nhl:search", &["mcdavid", "20"]),
            "nhl:search:mcdavid:20"
        );
        assert_ne!(
            cache_key("nhl:search", &["mcdavid", "20"]),
            cache_key("nhl:search", &["mcdavid", "5"])
        );
        // A separator inside a parameter cannot forge another key
        assert_ne!(
            cache_key("nhl:search", &["a:b", "c"]),
            cache_key("nhl:search", &["a", "b:c"])
        );
        assert_eq!(cache_key("x", &["50%:"]), "x:50%25%3A");
    }

    #[test]
    fn test_fantasy_player_key_uses_game_prefix() {
        assert_eq!(fantasy_player_key("453.l.12345", "8478402"), "453.p.8478402");
        assert_eq!(fantasy_player_key("nhl", "1"), "nhl.p.1");
    }

    #[tokio::test]
    async fn test_points_pass_through() {
        let manager = ApiManager::start(
            Config::default(),
            Arc::new(crate::storage::MemoryStore::new()),
        )
        .unwrap();
        let stats: StatLine = [(stat_keys::GOALS.to_string(), 1.0)].into_iter().collect();
        assert_eq!(manager.calculate_fantasy_points(&stats, None), 6.0);
        manager.shutdown().await;
    }
}
