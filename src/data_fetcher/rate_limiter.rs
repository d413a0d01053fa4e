//! Per-provider request budgets over fixed 60 second windows.
//!
//! Windows are opened on first use and their boundaries then advance every
//! `WINDOW_SECONDS` whether or not traffic arrives; the counter is brought up
//! to date under the lock before every check, so an idle provider always
//! starts from a fresh window.

use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::RateLimitConfig;
use crate::constants::rate_limits;
use crate::data_fetcher::models::Provider;
use crate::error::AppError;

/// Request counter for one provider's current window
#[derive(Debug, Clone)]
pub struct RateWindow {
    pub provider: Provider,
    pub request_count: u32,
    pub window_reset_at: Instant,
}

impl RateWindow {
    fn open(provider: Provider, now: Instant) -> Self {
        Self {
            provider,
            request_count: 0,
            window_reset_at: now + window_length(),
        }
    }

    /// Rolls the window forward by whole periods once its boundary has passed
    fn advance(&mut self, now: Instant) {
        if now < self.window_reset_at {
            return;
        }
        let length = window_length();
        let overdue = now.duration_since(self.window_reset_at);
        let periods = (overdue.as_nanos() / length.as_nanos()) as u32 + 1;
        self.window_reset_at += length * periods;
        self.request_count = 0;
        debug!(
            "Rate window reset: provider={}, periods={periods}",
            self.provider
        );
    }
}

fn window_length() -> Duration {
    Duration::from_secs(rate_limits::WINDOW_SECONDS)
}

/// Usage snapshot reported by [`RateLimiter::status`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RateLimitStatus {
    pub provider: Provider,
    pub used: u32,
    pub limit: u32,
    pub resets_in_seconds: u64,
}

#[derive(Debug)]
pub struct RateLimiter {
    budgets: HashMap<Provider, u32>,
    delay_when_exhausted: bool,
    windows: Mutex<HashMap<Provider, RateWindow>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(
            rate_limits::NHL_REQUESTS_PER_MINUTE,
            rate_limits::FANTASY_REQUESTS_PER_MINUTE,
            true,
        )
    }
}

impl RateLimiter {
    pub fn new(nhl_per_minute: u32, fantasy_per_minute: u32, delay_when_exhausted: bool) -> Self {
        let budgets = HashMap::from([
            (Provider::Nhl, nhl_per_minute),
            (Provider::Fantasy, fantasy_per_minute),
        ]);
        Self {
            budgets,
            delay_when_exhausted,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.nhl_per_minute,
            config.fantasy_per_minute,
            config.delay_when_exhausted,
        )
    }

    /// News feeds are not metered
    pub fn budget_for(&self, provider: Provider) -> Option<u32> {
        self.budgets.get(&provider).copied()
    }

    /// Takes one request slot from `provider`'s current window.
    ///
    /// When the window is exhausted the caller is suspended until the boundary,
    /// or gets [`AppError::RateLimitExceeded`] if delaying is disabled.
    pub async fn acquire(&self, provider: Provider) -> Result<(), AppError> {
        let Some(budget) = self.budget_for(provider) else {
            return Ok(());
        };

        loop {
            let wait = {
                let mut windows = self.windows.lock().await;
                let now = Instant::now();
                let window = windows
                    .entry(provider)
                    .or_insert_with(|| RateWindow::open(provider, now));
                window.advance(now);

                if window.request_count < budget {
                    window.request_count += 1;
                    return Ok(());
                }
                window.window_reset_at.duration_since(now)
            };

            if !self.delay_when_exhausted {
                warn!("Rate limit reached for {provider}, rejecting request");
                return Err(AppError::RateLimitExceeded {
                    provider,
                    retry_after: wait,
                });
            }

            info!(
                "Rate limit reached for {provider}, waiting {}ms",
                wait.as_millis()
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Current usage for every metered provider
    pub async fn status(&self) -> Vec<RateLimitStatus> {
        let mut windows = self.windows.lock().await;
        let now = Instant::now();
        let mut providers: Vec<Provider> = self.budgets.keys().copied().collect();
        providers.sort();

        providers
            .into_iter()
            .map(|provider| {
                let limit = self.budgets[&provider];
                let window = windows
                    .entry(provider)
                    .or_insert_with(|| RateWindow::open(provider, now));
                window.advance(now);
                RateLimitStatus {
                    provider,
                    used: window.request_count,
                    limit,
                    resets_in_seconds: window.window_reset_at.duration_since(now).as_secs(),
                }
            })
            .collect()
    }
}
