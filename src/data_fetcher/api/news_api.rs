//! Clients for the news and injury feeds.
//!
//! Sources without a configured API key are skipped: they contribute no items
//! instead of failing the whole feed.

use reqwest::Client;
use tracing::{debug, instrument};

use super::fetch_utils::{RetryPolicy, Upstream, fetch_json};
use super::urls::{
    build_espn_athlete_news_url, build_espn_news_url, build_news_search_url,
    build_rotowire_injuries_url, build_rotowire_news_url, build_rotowire_player_news_url,
};
use crate::config::NewsConfig;
use crate::data_fetcher::models::news::{
    EspnNewsResponse, NewsSearchResponse, RotowireInjuryResponse, RotowireNewsResponse,
};
use crate::data_fetcher::models::{NewsItem, Provider};
use crate::data_fetcher::processors::news_formatting::{
    format_espn_news, format_injury_report, format_news_search, format_rotowire_news,
};
use crate::error::AppError;

const NEWS_API_KEY_HEADER: &str = "X-Api-Key";
const SEARCH_PAGE_SIZE: &str = "10";

#[derive(Debug, Clone)]
pub struct NewsClient {
    client: Client,
    config: NewsConfig,
    retry: RetryPolicy,
}

impl NewsClient {
    pub fn new(client: Client, config: NewsConfig, retry: RetryPolicy) -> Self {
        Self {
            client,
            config,
            retry,
        }
    }

    fn rotowire_key(&self) -> Option<&str> {
        self.config
            .rotowire_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
    }

    async fn get_rotowire<T: serde::de::DeserializeOwned>(
        &self,
        resource: &str,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, AppError> {
        let Some(key) = self.rotowire_key() else {
            debug!("Rotowire API key not configured, skipping {resource}");
            return Ok(None);
        };
        fetch_json(
            || self.client.get(url).query(query).bearer_auth(key),
            url,
            &self.retry,
            Upstream::unmetered(Provider::News, resource),
        )
        .await
        .map(Some)
    }

    #[instrument(skip(self))]
    pub async fn get_rotowire_news(&self, limit: usize) -> Result<Vec<NewsItem>, AppError> {
        let url = build_rotowire_news_url(&self.config.rotowire_api_base);
        let query = [("limit", limit.to_string()), ("sport", "nhl".to_string())];
        let response: Option<RotowireNewsResponse> =
            self.get_rotowire("rotowire/news", &url, &query).await?;
        Ok(response.map(|r| format_rotowire_news(&r)).unwrap_or_default())
    }

    #[instrument(skip(self))]
    pub async fn get_rotowire_player_news(&self, player_id: &str) -> Result<Vec<NewsItem>, AppError> {
        let url = build_rotowire_player_news_url(&self.config.rotowire_api_base, player_id);
        let response: Option<RotowireNewsResponse> = self
            .get_rotowire(&format!("rotowire/players/{player_id}/news"), &url, &[])
            .await?;
        Ok(response.map(|r| format_rotowire_news(&r)).unwrap_or_default())
    }

    #[instrument(skip(self))]
    pub async fn get_injury_report(&self) -> Result<Vec<NewsItem>, AppError> {
        let url = build_rotowire_injuries_url(&self.config.rotowire_api_base);
        let response: Option<RotowireInjuryResponse> =
            self.get_rotowire("rotowire/injuries", &url, &[]).await?;
        Ok(response.map(|r| format_injury_report(&r)).unwrap_or_default())
    }

    #[instrument(skip(self))]
    pub async fn get_espn_news(&self, limit: usize) -> Result<Vec<NewsItem>, AppError> {
        let url = build_espn_news_url(&self.config.espn_api_base);
        let limit = limit.to_string();
        let response: EspnNewsResponse = fetch_json(
            || self.client.get(&url).query(&[("limit", limit.as_str())]),
            &url,
            &self.retry,
            Upstream::unmetered(Provider::News, "espn/news"),
        )
        .await?;
        Ok(format_espn_news(&response))
    }

    #[instrument(skip(self))]
    pub async fn get_espn_athlete_news(&self, player_id: &str) -> Result<Vec<NewsItem>, AppError> {
        let url = build_espn_athlete_news_url(&self.config.espn_api_base, player_id);
        let resource = format!("espn/athletes/{player_id}");
        let response: EspnNewsResponse = fetch_json(
            || self.client.get(&url),
            &url,
            &self.retry,
            Upstream::unmetered(Provider::News, &resource),
        )
        .await?;
        Ok(format_espn_news(&response))
    }

    /// Keyword search for a player across general hockey coverage
    #[instrument(skip(self))]
    pub async fn search_news_for_player(&self, player_name: &str) -> Result<Vec<NewsItem>, AppError> {
        let Some(key) = self
            .config
            .news_api_key
            .as_deref()
            .filter(|key| !key.is_empty())
        else {
            debug!("News search API key not configured, skipping search");
            return Ok(Vec::new());
        };

        let url = build_news_search_url(&self.config.news_api_base);
        let query = format!("\"{player_name}\" AND (NHL OR hockey)");
        let params = [
            ("q", query.as_str()),
            ("language", "en"),
            ("sortBy", "publishedAt"),
            ("pageSize", SEARCH_PAGE_SIZE),
        ];
        let response: NewsSearchResponse = fetch_json(
            || {
                self.client
                    .get(&url)
                    .query(&params)
                    .header(NEWS_API_KEY_HEADER, key)
            },
            &url,
            &self.retry,
            Upstream::unmetered(Provider::News, "search/everything"),
        )
        .await?;
        Ok(format_news_search(&response, player_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_fetcher::api::http_client::create_test_http_client;
    use crate::data_fetcher::models::NewsType;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer, keys: bool) -> NewsConfig {
        NewsConfig {
            rotowire_api_base: server.uri(),
            rotowire_api_key: keys.then(|| "roto-key".to_string()),
            espn_api_base: server.uri(),
            news_api_base: server.uri(),
            news_api_key: keys.then(|| "search-key".to_string()),
        }
    }

    fn client_for(server: &MockServer, keys: bool) -> NewsClient {
        NewsClient::new(
            create_test_http_client(),
            config_for(server, keys),
            RetryPolicy::none(),
        )
    }

    #[tokio::test]
    async fn test_rotowire_uses_bearer_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/nhl/news"))
            .and(header("authorization", "Bearer roto-key"))
            .and(query_param("limit", "20"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "news": [{"id": 1, "headline": "Forward activated off IR", "summary": ""}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let items = client_for(&server, true).get_rotowire_news(20).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "rotowire_1");
        assert_eq!(items[0].news_type, NewsType::Injury);
    }

    #[tokio::test]
    async fn test_keyless_sources_are_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server, false);
        assert!(client.get_rotowire_news(10).await.unwrap().is_empty());
        assert!(client.get_injury_report().await.unwrap().is_empty());
        assert!(client.search_news_for_player("Connor McDavid").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_sends_quoted_name_and_api_key_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/everything"))
            .and(query_param("q", "\"Connor McDavid\" AND (NHL OR hockey)"))
            .and(query_param("pageSize", "10"))
            .and(header("x-api-key", "search-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "articles": [{
                    "title": "McDavid reaches milestone",
                    "url": "https://news.example/a/mcdavid-milestone",
                    "source": {"name": "Wire"}
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let items = client_for(&server, true)
            .search_news_for_player("Connor McDavid")
            .await
            .unwrap();
        assert_eq!(items[0].id, "newsapi_mcdavid-milestone");
        assert_eq!(items[0].news_type, NewsType::Milestone);
    }

    #[tokio::test]
    async fn test_espn_failure_is_news_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/news"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let result = client_for(&server, true).get_espn_news(10).await;
        assert!(matches!(
            result,
            Err(AppError::Provider {
                provider: Provider::News,
                ..
            })
        ));
    }
}
