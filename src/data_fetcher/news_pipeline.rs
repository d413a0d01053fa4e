//! Multi-source news feed: concurrent fan-out, merge, dedup, sort and cap

use tracing::{debug, info, instrument, warn};

use crate::data_fetcher::api::NewsClient;
use crate::data_fetcher::fallback::fallback_news;
use crate::data_fetcher::models::{NewsItem, NewsQuery};
use crate::data_fetcher::processors::deduplicate_news;
use crate::error::AppError;

/// Items requested from each league-wide source regardless of the caller's cap,
/// so filtering still has something to choose from
const SOURCE_FETCH_LIMIT: usize = 20;

#[derive(Debug, Clone)]
pub struct NewsPipeline {
    client: NewsClient,
}

impl NewsPipeline {
    pub fn new(client: NewsClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &NewsClient {
        &self.client
    }

    /// League-wide feed from Rotowire, ESPN and the injury report
    #[instrument(skip(self))]
    pub async fn latest_news(&self, query: &NewsQuery) -> Vec<NewsItem> {
        let per_source = query.limit.max(SOURCE_FETCH_LIMIT);
        let (rotowire, espn, injuries) = tokio::join!(
            self.client.get_rotowire_news(per_source),
            self.client.get_espn_news(per_source),
            self.client.get_injury_report(),
        );

        let merged = merge_branches([
            ("rotowire", rotowire),
            ("espn", espn),
            ("injury report", injuries),
        ]);
        finalize(merged, query)
    }

    /// Stories about one player from Rotowire, ESPN and keyword search
    #[instrument(skip(self))]
    pub async fn player_news(&self, player_id: &str, player_name: &str, limit: usize) -> Vec<NewsItem> {
        let (rotowire, espn, search) = tokio::join!(
            self.client.get_rotowire_player_news(player_id),
            self.client.get_espn_athlete_news(player_id),
            self.client.search_news_for_player(player_name),
        );

        let merged = merge_branches([
            ("rotowire player", rotowire),
            ("espn athlete", espn),
            ("search", search),
        ]);
        finalize(merged, &NewsQuery::with_limit(limit))
    }
}

/// Concatenates the successful branches in order; failed ones are logged and skipped
fn merge_branches<const N: usize>(
    branches: [(&str, Result<Vec<NewsItem>, AppError>); N],
) -> Vec<NewsItem> {
    let mut merged = Vec::new();
    for (source, result) in branches {
        match result {
            Ok(items) => {
                debug!("{} items from {source}", items.len());
                merged.extend(items);
            }
            Err(e) => warn!("News source {source} failed: {e}"),
        }
    }
    merged
}

/// Fallback when empty, then dedup, newest first, filter and cap
pub fn finalize(items: Vec<NewsItem>, query: &NewsQuery) -> Vec<NewsItem> {
    let items = if items.is_empty() {
        info!("No news from any source, serving fallback stories");
        fallback_news()
    } else {
        items
    };

    let mut unique = deduplicate_news(items);
    // Stable, so equal timestamps keep fan-out order
    unique.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    unique
        .into_iter()
        .filter(|item| query.matches(item))
        .take(query.limit)
        .collect()
}
