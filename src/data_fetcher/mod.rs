pub mod api;
pub mod cache;
pub mod fallback;
pub mod manager;
pub mod models;
pub mod news_pipeline;
pub mod processors;
pub mod rate_limiter;
pub mod refresh;

pub use manager::{ApiManager, HealthReport, HealthStatus, ProviderHealth, cache_key};
pub use news_pipeline::NewsPipeline;
pub use rate_limiter::{RateLimitStatus, RateLimiter};
pub use refresh::{
    DEFAULT_NEWS_INTERVAL, DEFAULT_SCOREBOARD_INTERVAL, PollerHandle, RefreshMessage, spawn_live_scoreboard_poller,
    spawn_news_poller,
};
