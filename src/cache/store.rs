//! TTL cache storage.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::Duration;

use lru::LruCache;
use metrics::counter;
use tokio::time::Instant;
use tracing::debug;

use super::config::CacheConfig;
use super::lock::mutex_lock;

const SOURCE: &str = "cache::store";

/// Far-future horizon used when `now + ttl` would overflow.
const MAX_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// A stored value with its absolute expiry.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub expires_at: Instant,
}

impl<V> CacheEntry<V> {
    /// Dead once the current time exceeds `expires_at`.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// Outcome of a cache lookup.
///
/// A miss is its own variant so a cached `None`, `false` or empty list is
/// never confused with an absent entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup<V> {
    Hit(V),
    Miss,
}

impl<V> CacheLookup<V> {
    pub fn is_miss(&self) -> bool {
        matches!(self, Self::Miss)
    }
}

/// String-keyed TTL cache bounded by LRU capacity.
pub struct TtlCache<V> {
    name: &'static str,
    enabled: bool,
    entries: Mutex<LruCache<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    /// Create a cache; `name` labels its log lines and metrics.
    pub fn new(name: &'static str, config: &CacheConfig) -> Self {
        Self {
            name,
            enabled: config.enabled,
            entries: Mutex::new(LruCache::new(config.capacity_non_zero())),
        }
    }

    pub fn with_capacity(name: &'static str, capacity: NonZeroUsize) -> Self {
        Self {
            name,
            enabled: true,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, key: &str) -> CacheLookup<V> {
        if !self.enabled {
            return CacheLookup::Miss;
        }

        let now = Instant::now();
        let mut entries = mutex_lock(&self.entries, SOURCE, "get");
        let state = entries
            .get(key)
            .map(|entry| (!entry.is_expired_at(now)).then(|| entry.value.clone()));

        match state {
            Some(Some(value)) => {
                counter!("namngam_cache_hit_total", "cache" => self.name).increment(1);
                CacheLookup::Hit(value)
            }
            Some(None) => {
                entries.pop(key);
                counter!("namngam_cache_miss_total", "cache" => self.name).increment(1);
                CacheLookup::Miss
            }
            None => {
                counter!("namngam_cache_miss_total", "cache" => self.name).increment(1);
                CacheLookup::Miss
            }
        }
    }

    /// Store `value` under `key` for `ttl`, replacing any existing entry.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        if !self.enabled {
            return;
        }

        let key = key.into();
        let now = Instant::now();
        let expires_at = now
            .checked_add(ttl)
            .unwrap_or_else(|| now + MAX_TTL.min(ttl));
        let entry = CacheEntry { value, expires_at };

        let mut entries = mutex_lock(&self.entries, SOURCE, "set");
        if let Some((evicted, _)) = entries.push(key.clone(), entry)
            && evicted != key
        {
            counter!("namngam_cache_evict_total", "cache" => self.name).increment(1);
            debug!(
                target = "namngam::cache",
                cache = self.name,
                evicted = %evicted,
                "evicted least recently used entry"
            );
        }
    }

    /// Remove `key` regardless of its expiry. Returns whether an entry existed.
    pub fn delete(&self, key: &str) -> bool {
        mutex_lock(&self.entries, SOURCE, "delete")
            .pop(key)
            .is_some()
    }

    /// Remove every key starting with `prefix`. Returns the number removed.
    pub fn delete_prefix(&self, prefix: &str) -> usize {
        let mut entries = mutex_lock(&self.entries, SOURCE, "delete_prefix");
        let doomed: Vec<String> = entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            entries.pop(key.as_str());
        }
        doomed.len()
    }

    /// Drop every expired entry. Returns the number removed.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = mutex_lock(&self.entries, SOURCE, "sweep_expired");
        let expired: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key.as_str());
        }
        expired.len()
    }

    pub fn clear(&self) {
        mutex_lock(&self.entries, SOURCE, "clear").clear();
    }

    /// Stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        mutex_lock(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read-through lookup.
    ///
    /// On a hit the cached value is returned and `compute` is not called. On
    /// a miss `compute` runs once; a successful result is stored for `ttl`
    /// and returned, a failure is returned unchanged and nothing is stored.
    /// Concurrent misses for one key may each run `compute`.
    pub async fn get_or_compute<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        compute: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let CacheLookup::Hit(value) = self.get(key) {
            return Ok(value);
        }

        let value = compute().await?;
        self.set(key, value.clone(), ttl);
        Ok(value)
    }
}
