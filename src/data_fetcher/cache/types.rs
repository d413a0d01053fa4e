//! Cache data structures with TTL support

use std::time::Duration;
use tokio::time::Instant;

use crate::constants::cache_ttl;

/// Expiry tiers used by the aggregation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheDuration {
    /// Live and volatile data (scoreboards, news)
    Short,
    /// Semi-stable data (standings, player stats, fantasy views)
    Medium,
    /// Near-static reference data (team lists, league settings)
    Long,
}

impl CacheDuration {
    pub fn ttl(&self) -> Duration {
        match self {
            CacheDuration::Short => Duration::from_secs(cache_ttl::SHORT_SECONDS),
            CacheDuration::Medium => Duration::from_secs(cache_ttl::MEDIUM_SECONDS),
            CacheDuration::Long => Duration::from_secs(cache_ttl::LONG_SECONDS),
        }
    }
}

impl From<CacheDuration> for Duration {
    fn from(tier: CacheDuration) -> Self {
        tier.ttl()
    }
}

/// A cached value together with its creation time and lifetime
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: Instant,
    pub ttl: Duration,
}

impl<V> CacheEntry<V> {
    pub fn new(value: V, ttl: Duration) -> Self {
        Self {
            value,
            created_at: Instant::now(),
            ttl,
        }
    }

    /// Visible while `now - created_at <= ttl`
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.ttl
    }

    pub fn time_until_expiry(&self) -> Duration {
        self.ttl.saturating_sub(self.created_at.elapsed())
    }
}

/// Snapshot of cache occupancy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
    pub capacity: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers_are_ordered() {
        assert_eq!(CacheDuration::Short.ttl(), Duration::from_secs(300));
        assert_eq!(CacheDuration::Medium.ttl(), Duration::from_secs(1800));
        assert_eq!(CacheDuration::Long.ttl(), Duration::from_secs(7200));
        assert!(CacheDuration::Short.ttl() < CacheDuration::Medium.ttl());
        assert!(CacheDuration::Medium.ttl() < CacheDuration::Long.ttl());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entry_visible_through_exact_ttl() {
        let entry = CacheEntry::new("value", Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(!entry.is_expired());
        assert_eq!(entry.time_until_expiry(), Duration::ZERO);

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(entry.is_expired());
    }
}
