use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

struct Entry<V> {
    value: V,
    fetched_at: DateTime<Utc>,
}

/// Keyed cache with a freshness window: a fetched value is served for `ttl`
/// and re-fetched afterwards. The clock is injected so expiry is testable
/// without sleeping. A poisoned lock degrades lookups to always-miss rather
/// than failing them.
pub struct TtlCache<K, V> {
    entries: RwLock<HashMap<K, Entry<V>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        TtlCache {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    pub fn with_system_clock(ttl: Duration) -> Self {
        Self::new(ttl, Arc::new(SystemClock))
    }

    /// Serve the cached value while it is fresh, otherwise run `fetch` and
    /// cache its result. A failed fetch caches nothing, so the next lookup
    /// tries again.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: K, fetch: F) -> Result<(V, CacheStatus), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.fresh(&key) {
            return Ok((value, CacheStatus::Hit));
        }
        let value = fetch().await?;
        self.insert(key, value.clone());
        Ok((value, CacheStatus::Miss))
    }

    /// Write-through: a caller that just stored the authoritative value
    /// pushes it here so readers see it without waiting out the old entry.
    pub fn insert(&self, key: K, value: V) {
        let fetched_at = self.clock.now();
        if let Ok(mut entries) = self.entries.write() {
            entries.insert(key, Entry { value, fetched_at });
        }
    }

    fn fresh(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().ok()?;
        let entry = entries.get(key)?;
        let age = self.clock.now().signed_duration_since(entry.fetched_at);
        (age < self.ttl).then(|| entry.value.clone())
    }
}
