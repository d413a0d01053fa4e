//! Fantasy hockey data layer
//!
//! Cached, rate-limited aggregation over an NHL stats API, a Yahoo-style fantasy
//! league API (OAuth 2.0) and several hockey news feeds. Consumers hold an
//! `Arc<ApiManager>` and call its typed operations; caching, request budgets,
//! token refresh and multi-source merging happen behind it.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rinkside::{ApiManager, AppError, Config, MemoryStore, NewsQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), AppError> {
//!     let config = Config::load().await?;
//!     let manager = ApiManager::start(config, Arc::new(MemoryStore::new()))?;
//!
//!     let teams = manager.get_nhl_teams().await?;
//!     println!("{} teams", teams.len());
//!
//!     for item in manager.get_latest_news(&NewsQuery::with_limit(5)).await? {
//!         println!("[{}] {}", item.news_type, item.title);
//!     }
//!
//!     manager.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod constants;
pub mod data_fetcher;
pub mod error;
pub mod session;
pub mod storage;

// Re-export commonly used types for convenience
pub use config::Config;
pub use data_fetcher::api::{AuthStatus, TokenManager};
pub use data_fetcher::cache::{CacheDuration, CacheStats, TtlCache};
pub use data_fetcher::models::{
    CombinedPlayerData, FantasyLeague, FantasyPlayer, NewsItem, NewsQuery, NewsType,
    NormalizedPlayer, Position, Provider, Scoreboard, StandingsRow, Team,
};
pub use data_fetcher::{
    ApiManager, HealthReport, HealthStatus, PollerHandle, RateLimitStatus, RefreshMessage,
};
pub use error::{AppError, FetchFailure};
pub use session::{LocalSession, SessionUser};
pub use storage::{FileStore, KeyValueStore, MemoryStore};

/// Current version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
