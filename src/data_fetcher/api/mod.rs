pub mod fantasy_api;
pub mod fetch_utils;
pub mod http_client;
pub mod news_api;
pub mod nhl_api;
pub mod oauth;
pub mod urls;

// Re-export URL utilities
pub use urls::*;
// Re-export HTTP client utilities
pub use http_client::create_http_client_with_timeout;
// Re-export provider clients
pub use fantasy_api::FantasyClient;
pub use fetch_utils::RetryPolicy;
pub use news_api::NewsClient;
pub use nhl_api::{NhlClient, fallback_teams};
pub use oauth::{AuthStatus, ProviderToken, TokenManager};
