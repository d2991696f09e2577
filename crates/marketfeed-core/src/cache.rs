//! In-memory TTL caching for source responses.
//!
//! Entries past their expiry are *stale*, not gone: they stay readable in
//! allow-stale mode until [`CacheStore::evict_expired`] removes them. That
//! is what lets a rate-limited source keep serving its last known value.

use std::collections::{BTreeMap, HashMap};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::clock::{Clock, SystemClock};

/// Default time-to-live applied when a write does not carry its own.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Longest time-to-live an entry can carry; longer requests are clamped.
pub const MAX_TTL: Duration = Duration::from_secs(10 * 365 * 24 * 60 * 60);

/// Canonical cache key for a fetch operation.
///
/// Positional arguments keep their order; keyword arguments are sorted by
/// name, so `kwarg("b", ..).kwarg("a", ..)` and the reverse produce the
/// same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    operation: String,
    args: Vec<String>,
    kwargs: BTreeMap<String, String>,
}

impl CacheKey {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            args: Vec::new(),
            kwargs: BTreeMap::new(),
        }
    }

    pub fn arg(mut self, value: impl ToString) -> Self {
        self.args.push(value.to_string());
        self
    }

    pub fn args<I, T>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        self.args.extend(values.into_iter().map(|value| value.to_string()));
        self
    }

    pub fn kwarg(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.kwargs.insert(name.into(), value.to_string());
        self
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl Display for CacheKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.operation)?;
        for arg in &self.args {
            write!(f, "|{arg}")?;
        }
        for (name, value) in &self.kwargs {
            write!(f, "|{name}={value}")?;
        }
        Ok(())
    }
}

impl From<CacheKey> for String {
    fn from(value: CacheKey) -> Self {
        value.to_string()
    }
}

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_stale(&self, now: Instant) -> bool {
        self.expires_at < now
    }
}

#[derive(Debug)]
struct CacheInner<V> {
    map: HashMap<String, CacheEntry<V>>,
    default_ttl: Duration,
}

impl<V: Clone> CacheInner<V> {
    fn new(default_ttl: Duration) -> Self {
        Self {
            map: HashMap::new(),
            default_ttl,
        }
    }

    fn fresh(&self, key: &str, now: Instant) -> Option<V> {
        self.map
            .get(key)
            .filter(|entry| !entry.is_stale(now))
            .map(|entry| entry.value.clone())
    }

    fn any(&self, key: &str) -> Option<V> {
        self.map.get(key).map(|entry| entry.value.clone())
    }

    fn put(&mut self, key: String, value: V, ttl_override: Option<Duration>, now: Instant) {
        let ttl = ttl_override.unwrap_or(self.default_ttl).min(MAX_TTL);
        self.map.insert(
            key,
            CacheEntry {
                value,
                created_at: now,
                expires_at: now.checked_add(ttl).unwrap_or(now),
            },
        );
    }

    fn evict_expired(&mut self, now: Instant) -> usize {
        let before = self.map.len();
        self.map.retain(|_, entry| !entry.is_stale(now));
        before - self.map.len()
    }
}

/// Entry timing exposed for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryTiming {
    pub created_at: Instant,
    pub expires_at: Instant,
}

/// Thread-safe in-memory cache of fetched values.
///
/// A single lock guards every read-modify-write of the map. Fresh-only reads
/// take the write lock because they evict.
#[derive(Debug, Clone)]
pub struct CacheStore<V> {
    inner: Arc<RwLock<CacheInner<V>>>,
    clock: Arc<dyn Clock>,
}

impl<V: Clone + Send + Sync> CacheStore<V> {
    /// Create a new cache store with a default TTL and the system clock.
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(CacheInner::new(default_ttl))),
            clock,
        }
    }

    /// Create a cache store with a default TTL of 5 minutes.
    pub fn with_default_ttl() -> Self {
        Self::new(DEFAULT_TTL)
    }

    /// Look up a value.
    ///
    /// With `allow_stale == false` every stale entry in the store is evicted
    /// first and the value is returned only if fresh. With
    /// `allow_stale == true` the value is returned whatever its age and
    /// nothing is evicted.
    pub async fn get(&self, key: &str, allow_stale: bool) -> Option<V> {
        if allow_stale {
            return self.inner.read().await.any(key);
        }

        let now = self.clock.now();
        let mut store = self.inner.write().await;
        store.evict_expired(now);
        store.fresh(key, now)
    }

    /// Fresh-only lookup that leaves stale entries in place.
    pub async fn peek_fresh(&self, key: &str) -> Option<V> {
        let now = self.clock.now();
        self.inner.read().await.fresh(key, now)
    }

    /// Store a value, replacing any previous entry for the key.
    ///
    /// If `ttl_override` is provided, it will be used instead of the default TTL.
    pub async fn set(&self, key: impl Into<String>, value: V, ttl_override: Option<Duration>) {
        let now = self.clock.now();
        self.inner
            .write()
            .await
            .put(key.into(), value, ttl_override, now);
    }

    /// Remove every stale entry. Returns how many were removed.
    pub async fn evict_expired(&self) -> usize {
        let now = self.clock.now();
        self.inner.write().await.evict_expired(now)
    }

    /// Clear all entries from the cache.
    pub async fn clear(&self) {
        self.inner.write().await.map.clear();
    }

    /// Number of entries, stale ones included.
    pub async fn len(&self) -> usize {
        self.inner.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.map.is_empty()
    }

    /// Whether an entry exists for the key, fresh or stale.
    pub async fn contains_key(&self, key: &str) -> bool {
        self.inner.read().await.map.contains_key(key)
    }

    pub async fn timing(&self, key: &str) -> Option<EntryTiming> {
        self.inner.read().await.map.get(key).map(|entry| EntryTiming {
            created_at: entry.created_at,
            expires_at: entry.expires_at,
        })
    }

    pub async fn default_ttl(&self) -> Duration {
        self.inner.read().await.default_ttl
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn store(ttl_secs: u64) -> (CacheStore<f64>, ManualClock) {
        let clock = ManualClock::new();
        let cache = CacheStore::with_clock(Duration::from_secs(ttl_secs), Arc::new(clock.clone()));
        (cache, clock)
    }

    #[tokio::test]
    async fn test_cache_store_basic_operations() {
        let (cache, _clock) = store(60);

        assert!(cache.get("key1", false).await.is_none());

        cache.set("key1", 1.0, None).await;
        assert_eq!(cache.get("key1", false).await, Some(1.0));

        cache.set("key1", 2.0, None).await;
        assert_eq!(cache.get("key1", false).await, Some(2.0));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_fresh_read_evicts_stale_entries() {
        let (cache, clock) = store(5);
        cache.set("old", 1.0, None).await;
        cache.set("young", 2.0, Some(Duration::from_secs(60))).await;

        clock.advance(Duration::from_secs(6));

        assert!(cache.get("old", false).await.is_none());
        assert!(!cache.contains_key("old").await);
        assert_eq!(cache.get("young", false).await, Some(2.0));
    }

    #[tokio::test]
    async fn test_stale_read_returns_expired_value_without_evicting() {
        let (cache, clock) = store(5);
        cache.set("quote|AAPL", 100.0, None).await;

        clock.advance(Duration::from_secs(6));

        assert_eq!(cache.get("quote|AAPL", true).await, Some(100.0));
        assert!(cache.contains_key("quote|AAPL").await);
        assert!(cache.peek_fresh("quote|AAPL").await.is_none());
        assert!(cache.contains_key("quote|AAPL").await);
    }

    #[tokio::test]
    async fn test_entry_is_fresh_until_its_expiry_instant() {
        let (cache, clock) = store(5);
        cache.set("key", 1.0, None).await;

        clock.advance(Duration::from_secs(5));
        assert_eq!(cache.peek_fresh("key").await, Some(1.0));

        clock.advance(Duration::from_millis(1));
        assert!(cache.peek_fresh("key").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_ttl_override() {
        let (cache, clock) = store(60);
        cache.set("key1", 1.0, Some(Duration::from_secs(1))).await;

        let timing = cache.timing("key1").await.expect("entry exists");
        assert_eq!(timing.expires_at - timing.created_at, Duration::from_secs(1));

        clock.advance(Duration::from_secs(2));
        assert!(cache.get("key1", false).await.is_none());
    }

    #[tokio::test]
    async fn test_oversized_ttl_is_clamped() {
        let (cache, clock) = store(60);
        cache.set("key", 1.0, Some(Duration::MAX)).await;

        let timing = cache.timing("key").await.expect("entry exists");
        assert_eq!(timing.expires_at - timing.created_at, MAX_TTL);

        clock.advance(Duration::from_secs(365 * 24 * 60 * 60));
        assert_eq!(cache.peek_fresh("key").await, Some(1.0));
    }

    #[tokio::test]
    async fn test_evict_expired_is_precise_and_idempotent() {
        let (cache, clock) = store(60);
        cache.set("a", 1.0, Some(Duration::from_secs(1))).await;
        cache.set("b", 2.0, None).await;

        clock.advance(Duration::from_secs(2));

        assert_eq!(cache.evict_expired().await, 1);
        assert_eq!(cache.evict_expired().await, 0);
        assert!(!cache.contains_key("a").await);
        assert!(cache.contains_key("b").await);
    }

    #[tokio::test]
    async fn test_cache_clear_all() {
        let (cache, _clock) = store(60);
        cache.set("key1", 1.0, None).await;
        cache.set("key2", 2.0, None).await;

        assert_eq!(cache.len().await, 2);
        cache.clear().await;
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn test_default_ttl_is_five_minutes() {
        let cache: CacheStore<f64> = CacheStore::with_default_ttl();
        assert_eq!(cache.default_ttl().await, Duration::from_secs(300));
    }

    #[test]
    fn cache_key_ignores_keyword_order() {
        let first = CacheKey::new("get_stock_price")
            .arg("AAPL")
            .kwarg("range", "1d")
            .kwarg("interval", "1d");
        let second = CacheKey::new("get_stock_price")
            .arg("AAPL")
            .kwarg("interval", "1d")
            .kwarg("range", "1d");

        assert_eq!(first.to_string(), second.to_string());
        assert_eq!(first.to_string(), "get_stock_price|AAPL|interval=1d|range=1d");
    }

    #[test]
    fn cache_key_distinguishes_positional_arguments() {
        let first = CacheKey::new("method").args(["arg1", "arg2"]);
        let second = CacheKey::new("method").args(["arg1", "arg3"]);

        assert_ne!(first.to_string(), second.to_string());
    }
}
