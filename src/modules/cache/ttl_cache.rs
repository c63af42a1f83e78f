//! TTL cache for slowly-changing lookups
//!
//! Process-wide key → (value, captured_at) map with read-time expiry and a
//! periodic background sweep. Reads and the sweep share the same age rule: a
//! value older than the TTL is never returned to a caller, even if the sweep
//! has not removed it yet. The cache never fetches on its own; a miss always
//! sends the caller back to the source.

use dashmap::DashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Default TTL for cached lookups (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_millis(300_000);
/// Default background sweep period (1 minute)
pub const DEFAULT_SWEEP_PERIOD: Duration = Duration::from_millis(60_000);
const DEFAULT_MAX_ENTRIES: usize = 1000;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    captured_at: Instant,
}

impl<V> CacheEntry<V> {
    fn new(value: V) -> Self {
        Self {
            value,
            captured_at: Instant::now(),
        }
    }

    /// The single age rule shared by reads and the sweep.
    fn is_expired(&self, ttl: Duration) -> bool {
        self.captured_at.elapsed() >= ttl
    }
}

/// Cache statistics for monitoring
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
    pub swept: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}

/// Concurrent TTL cache with background sweep
#[derive(Debug)]
pub struct TtlCache<V> {
    entries: Arc<DashMap<String, CacheEntry<V>>>,
    ttl: Duration,
    sweep_period: Duration,
    max_entries: usize,
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    swept: Arc<AtomicU64>,
    sweep_started: Arc<AtomicBool>,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration, sweep_period: Duration, max_entries: usize) -> Self {
        let cache = Self {
            entries: Arc::new(DashMap::new()),
            ttl,
            sweep_period,
            max_entries,
            hits: Arc::new(AtomicU64::new(0)),
            misses: Arc::new(AtomicU64::new(0)),
            swept: Arc::new(AtomicU64::new(0)),
            sweep_started: Arc::new(AtomicBool::new(false)),
        };

        // Start the sweep right away when a runtime is available; otherwise
        // it starts lazily on the first cache operation.
        if tokio::runtime::Handle::try_current().is_ok() {
            cache.ensure_sweep_started();
        }

        cache
    }

    /// Return the cached value for `key` if it has not exceeded the TTL.
    pub fn get(&self, key: &str) -> Option<V> {
        self.ensure_sweep_started();

        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired(self.ttl) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit for key: {}", key);
                return Some(entry.value.clone());
            }
            drop(entry);
            self.entries.remove(key);
            debug!("Removed expired cache entry for key: {}", key);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!("Cache miss for key: {}", key);
        None
    }

    /// Store a fresh snapshot under `key`. Last write wins.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.ensure_sweep_started();

        if self.entries.len() >= self.max_entries {
            self.evict_oldest();
        }

        self.entries.insert(key.into(), CacheEntry::new(value));
    }

    /// Drop a single entry. Returns whether it existed.
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Drop every entry (e.g. after sign-out).
    pub fn invalidate_all(&self) {
        self.entries.clear();
        info!("Cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
            swept: self.swept.load(Ordering::Relaxed),
        }
    }

    /// Ensure the sweep task is running (idempotent).
    fn ensure_sweep_started(&self) {
        if tokio::runtime::Handle::try_current().is_err() {
            return;
        }
        if self
            .sweep_started
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return;
        }

        self.spawn_sweep_task();
        debug!("Background sweep task started");
    }

    fn spawn_sweep_task(&self) {
        let entries = Arc::clone(&self.entries);
        let swept = Arc::clone(&self.swept);
        let ttl = self.ttl;
        let sweep_period = self.sweep_period;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(sweep_period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // the first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;

                let expired_keys: Vec<String> = entries
                    .iter()
                    .filter(|entry| entry.value().is_expired(ttl))
                    .map(|entry| entry.key().clone())
                    .collect();

                let expired_count = expired_keys.len();
                for key in expired_keys {
                    entries.remove(&key);
                }

                if expired_count > 0 {
                    swept.fetch_add(expired_count as u64, Ordering::Relaxed);
                    debug!("Swept {} expired cache entries", expired_count);
                }
            }
        });
    }

    /// Evict oldest entries when the cache is full.
    fn evict_oldest(&self) {
        let current_size = self.entries.len();
        if current_size < self.max_entries {
            return;
        }

        let mut by_age: Vec<(String, Instant)> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().captured_at))
            .collect();
        by_age.sort_by_key(|(_, captured_at)| *captured_at);

        // trim back to 90% of capacity
        let target_size = (self.max_entries * 9) / 10;
        let to_evict = current_size.saturating_sub(target_size).max(1);

        for (key, _) in by_age.into_iter().take(to_evict) {
            self.entries.remove(&key);
        }

        debug!(
            "Evicted {} old cache entries (was {}, now {})",
            to_evict,
            current_size,
            self.entries.len()
        );
    }
}

impl<V> Default for TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_SWEEP_PERIOD, DEFAULT_MAX_ENTRIES)
    }
}
