use lru::LruCache;
use regex::Regex;
use std::collections::HashMap;
use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, RwLock, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, trace};

use super::types::{CacheEntry, CacheStats};
use crate::constants::DEFAULT_CACHE_CAPACITY;
use crate::error::AppError;

/// Key-value store with per-entry expiry.
///
/// Entries live in an LRU so a runaway key space stays bounded by `capacity`.
/// Expired entries are logically absent the moment their TTL elapses; they are
/// physically removed when observed by a reader or by the periodic sweep.
///
/// Concurrent misses for the same key are collapsed: only the first caller of
/// [`TtlCache::get_or_fetch`] runs its producer, later callers wait for it and
/// read the stored result.
pub struct TtlCache<V> {
    entries: RwLock<LruCache<String, CacheEntry<V>>>,
    in_flight: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl<V> Default for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RwLock::new(LruCache::new(capacity)),
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the live value for `key`, deleting the entry if it has expired.
    pub async fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.write().await;

        let expired = match entries.get(key) {
            Some(entry) if !entry.is_expired() => {
                trace!("Cache hit: key={key}");
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            entries.pop(key);
            debug!("Cache entry expired on read: key={key}");
        } else {
            trace!("Cache miss: key={key}");
        }
        None
    }

    /// Stores `value` under `key`, replacing any previous entry and restarting its clock.
    pub async fn set(&self, key: &str, value: V, ttl: Duration) {
        let mut entries = self.entries.write().await;
        entries.put(key.to_string(), CacheEntry::new(value, ttl));
        debug!("Cached key={key}, ttl={ttl:?}, size={}", entries.len());
    }

    /// Returns the cached value or runs `producer` once to fill it.
    ///
    /// A producer failure is returned as [`AppError::Fetch`] and leaves the key
    /// unset. Callers that were waiting on a failed leader run their own
    /// producer instead of inheriting the error.
    #[instrument(skip(self, producer), fields(key = %key))]
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        producer: F,
    ) -> Result<V, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, AppError>>,
    {
        if let Some(value) = self.get(key).await {
            return Ok(value);
        }

        let gate = self.flight_gate(key);
        let guard = gate.lock().await;

        let outcome = match self.get(key).await {
            Some(value) => {
                debug!("Joined in-flight fetch: key={key}");
                Ok(value)
            }
            None => match producer().await {
                Ok(value) => {
                    self.set(key, value.clone(), ttl).await;
                    Ok(value)
                }
                Err(source) => {
                    debug!("Producer failed, key left unset: key={key}, error={source}");
                    Err(AppError::Fetch {
                        key: key.to_string(),
                        source: Box::new(source),
                    })
                }
            },
        };

        drop(guard);
        self.release_gate(key, gate);
        outcome
    }

    pub async fn invalidate(&self, key: &str) -> bool {
        self.entries.write().await.pop(key).is_some()
    }

    /// Deletes every key matched by `pattern` and returns how many were removed.
    pub async fn invalidate_pattern(&self, pattern: &Regex) -> usize {
        let mut entries = self.entries.write().await;
        let doomed: Vec<String> = entries
            .iter()
            .filter(|(key, _)| pattern.is_match(key))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
        info!(
            "Invalidated {} cache entries matching '{}'",
            doomed.len(),
            pattern.as_str()
        );
        doomed.len()
    }

    /// Removes all expired entries and returns how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        if !expired.is_empty() {
            debug!("Sweep removed {} expired cache entries", expired.len());
        }
        expired.len()
    }

    pub async fn clear(&self) {
        let mut entries = self.entries.write().await;
        let count = entries.len();
        entries.clear();
        info!("Cleared {count} cache entries");
    }

    pub async fn stats(&self) -> CacheStats {
        let entries = self.entries.read().await;
        let expired = entries.iter().filter(|(_, entry)| entry.is_expired()).count();
        CacheStats {
            total: entries.len(),
            valid: entries.len() - expired,
            expired,
            capacity: entries.cap().get(),
        }
    }

    /// Starts the periodic sweep. The task holds only a weak reference, so it
    /// also ends on its own once the cache is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> SweeperHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let cache: Weak<Self> = Arc::downgrade(self);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick fires immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(cache) = cache.upgrade() else { break };
                        cache.purge_expired().await;
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            debug!("Cache sweeper stopped");
        });

        SweeperHandle { shutdown_tx, task }
    }

    fn flight_gate(&self, key: &str) -> Arc<AsyncMutex<()>> {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        in_flight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    fn release_gate(&self, key: &str, gate: Arc<AsyncMutex<()>>) {
        drop(gate);
        let mut in_flight = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if in_flight
            .get(key)
            .is_some_and(|gate| Arc::strong_count(gate) == 1)
        {
            in_flight.remove(key);
        }
    }
}

/// Stops the background sweep started by [`TtlCache::spawn_sweeper`]
pub struct SweeperHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        let _ = self.task.await;
    }
}
