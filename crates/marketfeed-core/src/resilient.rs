//! Stale-fallback execution of source fetches.
//!
//! [`ResilientExecutor`] puts a [`CacheStore`] in front of an arbitrary
//! fetch. Fresh hits skip the fetch; successful fetches refresh the entry;
//! rate-limited fetches degrade to whatever the cache still holds, however
//! old; any other failure propagates.
//!
//! Eviction ordering matters here. The fresh-hit path never evicts, and the
//! success path evicts only after writing, so a stale entry survives until
//! a fetch for *some* key succeeds. Evicting earlier would throw away the
//! value a rate-limited call is about to need.

use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::{CacheStore, DEFAULT_TTL};
use crate::clock::{Clock, SystemClock};
use crate::data_source::SourceError;
use crate::rate_limit::RateLimitClassifier;

/// Where a resolved value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOrigin {
    /// Served from a fresh cache entry; no fetch happened.
    Fresh,
    /// Fetched just now and written to the cache.
    Fetched,
    /// The fetch was rate limited and a stale entry was served.
    Stale,
    /// The fetch was rate limited and nothing was cached.
    Unavailable,
}

/// Value plus its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<V> {
    pub value: Option<V>,
    pub origin: CacheOrigin,
}

/// Cache-backed executor implementing stale fallback on rate limiting.
#[derive(Debug, Clone)]
pub struct ResilientExecutor<V> {
    cache: CacheStore<V>,
    classifier: RateLimitClassifier,
}

impl<V> ResilientExecutor<V>
where
    V: Clone + Send + Sync + Debug,
{
    pub fn new(cache: CacheStore<V>, classifier: RateLimitClassifier) -> Self {
        Self { cache, classifier }
    }

    /// Executor with its own store using `default_ttl` and the system clock.
    pub fn with_ttl(default_ttl: Duration) -> Self {
        Self::with_clock(default_ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(default_ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self::new(
            CacheStore::with_clock(default_ttl, clock),
            RateLimitClassifier::default(),
        )
    }

    pub fn with_classifier(mut self, classifier: RateLimitClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn cache(&self) -> &CacheStore<V> {
        &self.cache
    }

    pub fn classifier(&self) -> &RateLimitClassifier {
        &self.classifier
    }

    /// Runs `fetch` behind the cache and returns the value.
    ///
    /// `Ok(None)` means the call was rate limited and nothing was cached for
    /// `key`. A value the fetch legitimately reported as empty is returned
    /// as `Ok(Some(empty))`.
    ///
    /// # Errors
    ///
    /// Returns the fetch's own error, unchanged, for failures that are not
    /// rate limiting. The cache is not touched in that case.
    pub async fn execute<F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        fetch: F,
    ) -> Result<Option<V>, SourceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, SourceError>>,
    {
        self.resolve(key, ttl, fetch)
            .await
            .map(|resolved| resolved.value)
    }

    /// Same as [`execute`](Self::execute) but reports the value's origin.
    pub async fn resolve<F, Fut>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        fetch: F,
    ) -> Result<Resolved<V>, SourceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, SourceError>>,
    {
        if let Some(value) = self.cache.peek_fresh(key).await {
            debug!(key, "cache hit");
            return Ok(Resolved {
                value: Some(value),
                origin: CacheOrigin::Fresh,
            });
        }

        match fetch().await {
            Ok(value) => {
                self.cache.set(key, value.clone(), ttl).await;
                let evicted = self.cache.evict_expired().await;
                debug!(key, evicted, "fetched and cached");
                Ok(Resolved {
                    value: Some(value),
                    origin: CacheOrigin::Fetched,
                })
            }
            Err(error) if self.classifier.classify(&error) => {
                let cached = self.cache.get(key, true).await;
                let origin = if cached.is_some() {
                    CacheOrigin::Stale
                } else {
                    CacheOrigin::Unavailable
                };
                warn!(key, %error, served_stale = cached.is_some(), "rate limited");
                Ok(Resolved {
                    value: cached,
                    origin,
                })
            }
            Err(error) => {
                debug!(key, %error, "hard failure");
                Err(error)
            }
        }
    }
}

impl<V> Default for ResilientExecutor<V>
where
    V: Clone + Send + Sync + Debug,
{
    fn default() -> Self {
        Self::with_ttl(DEFAULT_TTL)
    }
}
