//! Behavior-driven tests for the cache and stale-fallback executor
//!
//! These tests describe what a caller observes over time: when a fetch is
//! skipped, when an expired value is still served, and when a failure is
//! allowed through.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use marketfeed_core::{
    CacheOrigin, CacheStore, ManualClock, RateLimitClassifier, ResilientExecutor, SourceError,
    SourceErrorKind,
};

fn executor_with_ttl(ttl: Duration) -> (ResilientExecutor<f64>, ManualClock) {
    let clock = ManualClock::new();
    let executor = ResilientExecutor::with_clock(ttl, Arc::new(clock.clone()));
    (executor, clock)
}

// =============================================================================
// Stale fallback timeline
// =============================================================================

#[tokio::test]
async fn expired_quote_is_served_when_the_provider_rate_limits() {
    // Given: A 5 second cache holding AAPL at 100.0 from t=0
    let (executor, clock) = executor_with_ttl(Duration::from_secs(5));
    let fetches = AtomicUsize::new(0);
    let calls = &fetches;
    executor
        .execute("AAPL", None, || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(100.0)
        })
        .await
        .expect("seed fetch succeeds");

    // When: The value is read again at t=3
    clock.set_elapsed(Duration::from_secs(3));
    let fresh = executor
        .execute("AAPL", None, || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(999.0)
        })
        .await
        .expect("fresh read");

    // Then: The cached value is returned without fetching
    assert_eq!(fresh, Some(100.0));
    assert_eq!(fetches.load(Ordering::SeqCst), 1, "fresh hit must not fetch");

    // When: At t=6 the provider answers with a rate-limit failure
    clock.set_elapsed(Duration::from_secs(6));
    let resolved = executor
        .resolve("AAPL", None, || async {
            Err(SourceError::unavailable("429 rate limit"))
        })
        .await
        .expect("rate limiting is absorbed");

    // Then: The expired value is served unchanged
    assert_eq!(resolved.value, Some(100.0));
    assert_eq!(resolved.origin, CacheOrigin::Stale);

    // And: The entry survives for the next throttled call
    assert!(executor.cache().contains_key("AAPL").await);
}

#[tokio::test]
async fn rate_limit_with_empty_cache_yields_absent_not_error() {
    // Given: Nothing has ever been cached for MSFT
    let (executor, _clock) = executor_with_ttl(Duration::from_secs(5));

    // When: The provider reports "Too Many Requests"
    let value = executor
        .execute("MSFT", None, || async {
            Err(SourceError::unavailable("HTTP 503: Too Many Requests"))
        })
        .await;

    // Then: The caller gets an absent value instead of an error
    assert_eq!(value, Ok(None));
}

#[tokio::test]
async fn hard_failure_is_not_masked_by_a_stale_value() {
    // Given: An expired entry for AAPL
    let (executor, clock) = executor_with_ttl(Duration::from_secs(5));
    executor
        .execute("AAPL", None, || async { Ok(100.0) })
        .await
        .expect("seed");
    clock.advance(Duration::from_secs(30));

    // When: The provider fails with a non rate-limit error
    let error = executor
        .execute("AAPL", None, || async {
            Err(SourceError::unavailable("connection refused"))
        })
        .await
        .expect_err("hard failures propagate");

    // Then: The error reaches the caller and the stale entry is untouched
    assert_eq!(error.kind(), SourceErrorKind::Unavailable);
    assert_eq!(executor.cache().get("AAPL", true).await, Some(100.0));
}

#[tokio::test]
async fn typed_rate_limit_errors_fall_back_without_matching_text() {
    // Given: A cached value that has expired
    let (executor, clock) = executor_with_ttl(Duration::from_secs(1));
    executor
        .execute("NVDA", None, || async { Ok(480.0) })
        .await
        .expect("seed");
    clock.advance(Duration::from_secs(2));

    // When: A local quota refuses the call with a typed rate-limit error
    let value = executor
        .execute("NVDA", None, || async {
            Err(SourceError::rate_limited("quota exhausted"))
        })
        .await
        .expect("absorbed");

    // Then: The stale value is served
    assert_eq!(value, Some(480.0));
}

#[tokio::test]
async fn custom_pattern_extends_rate_limit_detection() {
    // Given: A classifier taught one provider-specific throttle message
    let clock = ManualClock::new();
    let cache = CacheStore::with_clock(Duration::from_secs(1), Arc::new(clock.clone()));
    let classifier = RateLimitClassifier::default().with_pattern("call frequency");
    let executor = ResilientExecutor::new(cache, classifier);
    executor
        .execute("IBM", None, || async { Ok(140.0) })
        .await
        .expect("seed");
    clock.advance(Duration::from_secs(5));

    // When: The provider answers with that message
    let value = executor
        .execute("IBM", None, || async {
            Err(SourceError::malformed(
                "Our standard API call frequency is 5 calls per minute",
            ))
        })
        .await
        .expect("recognized as rate limiting");

    // Then: The stale value is served
    assert_eq!(value, Some(140.0));
}

// =============================================================================
// Cache housekeeping
// =============================================================================

#[tokio::test]
async fn eviction_removes_only_expired_entries() {
    // Given: Entry A expires at t=5, entry B at t=60
    let clock = ManualClock::new();
    let cache: CacheStore<f64> =
        CacheStore::with_clock(Duration::from_secs(5), Arc::new(clock.clone()));
    cache.set("A", 1.0, None).await;
    cache.set("B", 2.0, Some(Duration::from_secs(60))).await;

    // When: Eviction runs at t=10
    clock.set_elapsed(Duration::from_secs(10));
    let evicted = cache.evict_expired().await;

    // Then: Only A is gone
    assert_eq!(evicted, 1);
    assert!(!cache.contains_key("A").await);
    assert_eq!(cache.get("B", false).await, Some(2.0));
}

#[tokio::test]
async fn successful_fetch_sweeps_other_expired_entries() {
    // Given: An expired entry for one key
    let (executor, clock) = executor_with_ttl(Duration::from_secs(5));
    executor
        .execute("old", None, || async { Ok(1.0) })
        .await
        .expect("seed");
    clock.advance(Duration::from_secs(6));

    // When: A fetch for another key succeeds
    executor
        .execute("new", None, || async { Ok(2.0) })
        .await
        .expect("fetch");

    // Then: The expired entry has been swept and the new one kept
    assert!(!executor.cache().contains_key("old").await);
    assert!(executor.cache().contains_key("new").await);
    assert_eq!(executor.cache().len().await, 1);
}
