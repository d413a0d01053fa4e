//! Application-wide constants and configuration values
//!
//! This module centralizes the magic numbers of the data layer: cache duration
//! tiers, per-provider request budgets, timer intervals and the static team table.

/// Default timeout for HTTP requests in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 10;

/// Maximum number of idle connections per host in the HTTP client pool
pub const HTTP_POOL_MAX_IDLE_PER_HOST: usize = 32;

/// Default capacity of the shared response cache
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

/// Cache duration tiers in seconds. These are the only durations the
/// aggregation layer hands to the cache.
pub mod cache_ttl {
    /// Live or volatile data: scoreboards, rosters, free agents (5 minutes)
    pub const SHORT_SECONDS: u64 = 5 * 60;

    /// Semi-stable data: standings, player stats, searches (30 minutes)
    pub const MEDIUM_SECONDS: u64 = 30 * 60;

    /// Near-static reference data: team lists, league settings (2 hours)
    pub const LONG_SECONDS: u64 = 2 * 60 * 60;

    /// Interval of the background sweep that physically drops expired entries.
    /// Expiry is enforced on read, the sweep only reclaims memory.
    pub const SWEEP_INTERVAL_SECONDS: u64 = 60;
}

/// Per-provider request budgets
pub mod rate_limits {
    /// Length of one budget window in seconds
    pub const WINDOW_SECONDS: u64 = 60;

    /// Requests per window for the NHL stats API
    pub const NHL_REQUESTS_PER_MINUTE: u32 = 60;

    /// Requests per window for the fantasy provider API
    pub const FANTASY_REQUESTS_PER_MINUTE: u32 = 30;
}

/// Background polling intervals in seconds
pub mod polling {
    /// Live scoreboard refresh
    pub const LIVE_SCOREBOARD_SECONDS: u64 = 30;

    /// News feed refresh (10 minutes)
    pub const NEWS_SECONDS: u64 = 10 * 60;
}

/// Retry configuration for transient upstream failures
pub mod retry {
    /// Maximum number of retry attempts for API calls
    pub const MAX_ATTEMPTS: u32 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const BASE_DELAY_MS: u64 = 250;

    /// Longest `Retry-After` wait honored before retrying (seconds)
    pub const MAX_RETRY_AFTER_SECONDS: u64 = 10;
}

/// Default upstream endpoints
pub mod endpoints {
    pub const NHL_API_BASE: &str = "https://api-web.nhle.com/v1";
    pub const FANTASY_API_BASE: &str = "https://fantasysports.yahooapis.com/fantasy/v2";
    pub const FANTASY_AUTH_URL: &str = "https://api.login.yahoo.com/oauth2/request_auth";
    pub const FANTASY_TOKEN_URL: &str = "https://api.login.yahoo.com/oauth2/get_token";
    pub const FANTASY_REDIRECT_URI: &str = "http://localhost:3000/auth/callback";
    pub const FANTASY_SCOPE: &str = "fspt-r fspt-w";
    pub const ROTOWIRE_API_BASE: &str = "https://api.rotowire.com/v1";
    pub const ESPN_API_BASE: &str = "https://site.api.espn.com/apis/site/v2/sports/hockey/nhl";
    pub const NEWS_API_BASE: &str = "https://newsapi.org/v2";
}

/// Keys used in the durable key-value store
pub mod storage_keys {
    pub const FANTASY_ACCESS_TOKEN: &str = "fantasy_access_token";
    pub const FANTASY_REFRESH_TOKEN: &str = "fantasy_refresh_token";
    pub const SESSION_TOKEN: &str = "rinkside_session_token";
    pub const SESSION_USER: &str = "rinkside_session_user";
}

/// Environment variable names
pub mod env_vars {
    pub const NHL_API_BASE: &str = "RINKSIDE_NHL_API_BASE";
    pub const LOG_FILE: &str = "RINKSIDE_LOG_FILE";
    pub const HTTP_TIMEOUT: &str = "RINKSIDE_HTTP_TIMEOUT";
    pub const FANTASY_CLIENT_ID: &str = "RINKSIDE_FANTASY_CLIENT_ID";
    pub const FANTASY_CLIENT_SECRET: &str = "RINKSIDE_FANTASY_CLIENT_SECRET";
    pub const FANTASY_REDIRECT_URI: &str = "RINKSIDE_FANTASY_REDIRECT_URI";
    pub const ROTOWIRE_API_KEY: &str = "RINKSIDE_ROTOWIRE_API_KEY";
    pub const NEWS_API_KEY: &str = "RINKSIDE_NEWS_API_KEY";
    pub const STORAGE_PATH: &str = "RINKSIDE_STORAGE_PATH";
}

/// Static reference data for one NHL club
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamInfo {
    pub abbrev: &'static str,
    pub name: &'static str,
    pub conference: &'static str,
    pub division: &'static str,
}

const fn team(
    abbrev: &'static str,
    name: &'static str,
    conference: &'static str,
    division: &'static str,
) -> TeamInfo {
    TeamInfo {
        abbrev,
        name,
        conference,
        division,
    }
}

/// All 32 clubs, ordered by abbreviation. Drives the all-players roster fan-out
/// and team extraction from news text.
pub static NHL_TEAMS: [TeamInfo; 32] = [
    team("ANA", "Anaheim Ducks", "Western", "Pacific"),
    team("BOS", "Boston Bruins", "Eastern", "Atlantic"),
    team("BUF", "Buffalo Sabres", "Eastern", "Atlantic"),
    team("CAR", "Carolina Hurricanes", "Eastern", "Metropolitan"),
    team("CBJ", "Columbus Blue Jackets", "Eastern", "Metropolitan"),
    team("CGY", "Calgary Flames", "Western", "Pacific"),
    team("CHI", "Chicago Blackhawks", "Western", "Central"),
    team("COL", "Colorado Avalanche", "Western", "Central"),
    team("DAL", "Dallas Stars", "Western", "Central"),
    team("DET", "Detroit Red Wings", "Eastern", "Atlantic"),
    team("EDM", "Edmonton Oilers", "Western", "Pacific"),
    team("FLA", "Florida Panthers", "Eastern", "Atlantic"),
    team("LAK", "Los Angeles Kings", "Western", "Pacific"),
    team("MIN", "Minnesota Wild", "Western", "Central"),
    team("MTL", "Montreal Canadiens", "Eastern", "Atlantic"),
    team("NJD", "New Jersey Devils", "Eastern", "Metropolitan"),
    team("NSH", "Nashville Predators", "Western", "Central"),
    team("NYI", "New York Islanders", "Eastern", "Metropolitan"),
    team("NYR", "New York Rangers", "Eastern", "Metropolitan"),
    team("OTT", "Ottawa Senators", "Eastern", "Atlantic"),
    team("PHI", "Philadelphia Flyers", "Eastern", "Metropolitan"),
    team("PIT", "Pittsburgh Penguins", "Eastern", "Metropolitan"),
    team("SEA", "Seattle Kraken", "Western", "Pacific"),
    team("SJS", "San Jose Sharks", "Western", "Pacific"),
    team("STL", "St. Louis Blues", "Western", "Central"),
    team("TBL", "Tampa Bay Lightning", "Eastern", "Atlantic"),
    team("TOR", "Toronto Maple Leafs", "Eastern", "Atlantic"),
    team("UTA", "Utah Hockey Club", "Western", "Central"),
    team("VAN", "Vancouver Canucks", "Western", "Pacific"),
    team("VGK", "Vegas Golden Knights", "Western", "Pacific"),
    team("WPG", "Winnipeg Jets", "Western", "Central"),
    team("WSH", "Washington Capitals", "Eastern", "Metropolitan"),
];

/// Looks up a club by its three-letter abbreviation (case-insensitive)
pub fn find_team(abbrev: &str) -> Option<&'static TeamInfo> {
    NHL_TEAMS
        .iter()
        .find(|team| team.abbrev.eq_ignore_ascii_case(abbrev))
}
