//! Concrete data sources.
//!
//! Each network-backed source owns its [`ResilientExecutor`]s, built from a
//! [`CachePolicy`], so cache lifetimes and rate-limit handling are per
//! provider while the stale-fallback algorithm lives in one place.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::data_source::SourceError;
use crate::rate_limit::RateLimitClassifier;
use crate::resilient::ResilientExecutor;
use crate::{CacheStore, ValidationError};

mod alphavantage;
mod newsapi;
mod sentiment;
mod synthetic;
mod yahoo;

pub use alphavantage::{AlphaVantageSource, ALPHA_VANTAGE_REQUESTS_PER_MINUTE};
pub use newsapi::{NewsApiSource, NEWSAPI_DEFAULT_TTL};
pub use sentiment::extract_impact;
pub use synthetic::SyntheticMarket;
pub use yahoo::{YahooFinanceSource, YAHOO_DEFAULT_TTL};

/// Cache lifetime, classifier and clock used to build a source's executors.
#[derive(Debug, Clone)]
pub struct CachePolicy {
    pub ttl: Duration,
    pub classifier: RateLimitClassifier,
    pub clock: Arc<dyn Clock>,
}

impl CachePolicy {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            classifier: RateLimitClassifier::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_classifier(mut self, classifier: RateLimitClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Fresh executor with its own store.
    pub fn executor<V>(&self) -> ResilientExecutor<V>
    where
        V: Clone + Send + Sync + Debug,
    {
        ResilientExecutor::new(
            CacheStore::with_clock(self.ttl, Arc::clone(&self.clock)),
            self.classifier.clone(),
        )
    }
}

fn validation_to_error(error: ValidationError) -> SourceError {
    SourceError::malformed(error.to_string())
}
