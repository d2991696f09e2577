//! Ordered provider fallback.
//!
//! A [`ProviderChain`] owns a priority-ordered list of interchangeable
//! sources plus a fallback generator. Single-item queries walk the list
//! until a provider produces a value; batch queries ask only the first
//! provider and fill the gaps from the generator. Neither path can fail:
//! the generator is the terminal state.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::data_source::{DataSource, SourceError};

/// Upper bound on one provider attempt when none is configured.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(15);

/// Produces a value for an id no provider could serve.
pub trait FallbackGenerator<V>: Send + Sync {
    fn generate(&self, id: &str) -> V;
}

impl<V, F> FallbackGenerator<V> for F
where
    F: Fn(&str) -> V + Send + Sync,
{
    fn generate(&self, id: &str) -> V {
        self(id)
    }
}

/// Who produced a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum ServedBy {
    Provider(String),
    Fallback,
}

impl ServedBy {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback)
    }
}

/// What happened when one provider was tried.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Served,
    Empty,
    Failed(SourceError),
    TimedOut(Duration),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderAttempt {
    pub provider: String,
    pub outcome: AttemptOutcome,
}

/// Resolved single-item query.
#[derive(Debug, Clone)]
pub struct ChainResolution<V> {
    pub data: V,
    pub served_by: ServedBy,
    pub attempts: Vec<ProviderAttempt>,
    pub latency_ms: u64,
}

impl<V> ChainResolution<V> {
    /// Names of the providers tried, in order.
    pub fn source_chain(&self) -> Vec<&str> {
        self.attempts
            .iter()
            .map(|attempt| attempt.provider.as_str())
            .collect()
    }
}

/// Resolved batch query. `items` and `served_by` align with the requested ids.
#[derive(Debug, Clone)]
pub struct BatchResolution<V> {
    pub items: Vec<V>,
    pub served_by: Vec<ServedBy>,
    pub attempt: Option<ProviderAttempt>,
    pub latency_ms: u64,
}

impl<V> BatchResolution<V> {
    pub fn generated_count(&self) -> usize {
        self.served_by
            .iter()
            .filter(|served_by| served_by.is_fallback())
            .count()
    }
}

/// Active providers of a chain, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainSummary {
    pub provider_names_used: Vec<String>,
    pub has_real_data: bool,
}

/// Priority-ordered fallback over homogeneous sources.
pub struct ProviderChain<V> {
    providers: Vec<Arc<dyn DataSource<Item = V>>>,
    generator: Arc<dyn FallbackGenerator<V>>,
    provider_timeout: Duration,
}

impl<V> Debug for ProviderChain<V>
where
    V: Clone + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.providers.iter().map(|provider| provider.name()).collect();
        f.debug_struct("ProviderChain")
            .field("providers", &names)
            .field("provider_timeout", &self.provider_timeout)
            .finish_non_exhaustive()
    }
}

impl<V> ProviderChain<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Empty chain; every query is served by `generator` until a provider
    /// is added.
    pub fn new(generator: impl FallbackGenerator<V> + 'static) -> Self {
        Self {
            providers: Vec::new(),
            generator: Arc::new(generator),
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, provider_timeout: Duration) -> Self {
        self.provider_timeout = provider_timeout;
        self
    }

    /// Adds each provider in order, skipping unavailable ones.
    pub fn with_providers<I>(mut self, providers: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn DataSource<Item = V>>>,
    {
        for provider in providers {
            self.add_provider(provider);
        }
        self
    }

    /// Appends `provider` at the lowest priority if it reports itself
    /// available. Availability is not checked again later.
    pub fn add_provider(&mut self, provider: Arc<dyn DataSource<Item = V>>) -> bool {
        if !provider.is_available() {
            debug!(provider = provider.name(), "provider unavailable, not registered");
            return false;
        }

        debug!(
            provider = provider.name(),
            priority = self.providers.len(),
            "provider registered"
        );
        self.providers.push(provider);
        true
    }

    pub fn provider_names(&self) -> Vec<String> {
        self.providers
            .iter()
            .map(|provider| provider.name().to_owned())
            .collect()
    }

    pub fn has_real_data(&self) -> bool {
        !self.providers.is_empty()
    }

    pub fn provider_timeout(&self) -> Duration {
        self.provider_timeout
    }

    pub fn summary(&self) -> ChainSummary {
        ChainSummary {
            provider_names_used: self.provider_names(),
            has_real_data: self.has_real_data(),
        }
    }

    /// Value for `id` from the first provider that has one, else generated.
    pub async fn query(&self, id: &str) -> V {
        self.resolve(id).await.data
    }

    /// One value per id, same order and length as `ids`.
    pub async fn query_many(&self, ids: &[String]) -> Vec<V> {
        self.resolve_many(ids).await.items
    }

    pub async fn resolve(&self, id: &str) -> ChainResolution<V> {
        let started = Instant::now();
        let mut attempts = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            let name = provider.name().to_owned();
            let outcome =
                tokio::time::timeout(self.provider_timeout, provider.fetch_one(id)).await;

            match outcome {
                Ok(Ok(Some(data))) => {
                    debug!(provider = %name, id, "provider served");
                    attempts.push(ProviderAttempt {
                        provider: name.clone(),
                        outcome: AttemptOutcome::Served,
                    });
                    return ChainResolution {
                        data,
                        served_by: ServedBy::Provider(name),
                        attempts,
                        latency_ms: elapsed_ms(started),
                    };
                }
                Ok(Ok(None)) => {
                    debug!(provider = %name, id, "provider had nothing");
                    attempts.push(ProviderAttempt {
                        provider: name,
                        outcome: AttemptOutcome::Empty,
                    });
                }
                Ok(Err(error)) => {
                    warn!(provider = %name, id, %error, "provider failed, trying next");
                    attempts.push(ProviderAttempt {
                        provider: name,
                        outcome: AttemptOutcome::Failed(error),
                    });
                }
                Err(_) => {
                    warn!(
                        provider = %name,
                        id,
                        timeout_ms = duration_ms(self.provider_timeout),
                        "provider timed out, trying next"
                    );
                    attempts.push(ProviderAttempt {
                        provider: name,
                        outcome: AttemptOutcome::TimedOut(self.provider_timeout),
                    });
                }
            }
        }

        info!(id, tried = attempts.len(), "serving generated value");
        ChainResolution {
            data: self.generator.generate(id),
            served_by: ServedBy::Fallback,
            attempts,
            latency_ms: elapsed_ms(started),
        }
    }

    pub async fn resolve_many(&self, ids: &[String]) -> BatchResolution<V> {
        let started = Instant::now();

        let Some(provider) = self.providers.first() else {
            info!(count = ids.len(), "no providers, generating batch");
            return self.generated_batch(ids, None, started);
        };

        let name = provider.name().to_owned();
        let outcome = tokio::time::timeout(self.provider_timeout, provider.fetch_many(ids)).await;

        let found = match outcome {
            Ok(Ok(found)) => found,
            Ok(Err(error)) => {
                warn!(provider = %name, %error, "batch failed, generating batch");
                let attempt = ProviderAttempt {
                    provider: name,
                    outcome: AttemptOutcome::Failed(error),
                };
                return self.generated_batch(ids, Some(attempt), started);
            }
            Err(_) => {
                warn!(provider = %name, "batch timed out, generating batch");
                let attempt = ProviderAttempt {
                    provider: name,
                    outcome: AttemptOutcome::TimedOut(self.provider_timeout),
                };
                return self.generated_batch(ids, Some(attempt), started);
            }
        };

        let mut items = Vec::with_capacity(ids.len());
        let mut served_by = Vec::with_capacity(ids.len());
        for id in ids {
            match found.get(id) {
                Some(value) => {
                    items.push(value.clone());
                    served_by.push(ServedBy::Provider(name.clone()));
                }
                None => {
                    items.push(self.generator.generate(id));
                    served_by.push(ServedBy::Fallback);
                }
            }
        }

        let outcome = if found.is_empty() {
            AttemptOutcome::Empty
        } else {
            AttemptOutcome::Served
        };
        let resolution = BatchResolution {
            items,
            served_by,
            attempt: Some(ProviderAttempt {
                provider: name,
                outcome,
            }),
            latency_ms: elapsed_ms(started),
        };
        debug!(
            requested = ids.len(),
            generated = resolution.generated_count(),
            "batch resolved"
        );
        resolution
    }

    fn generated_batch(
        &self,
        ids: &[String],
        attempt: Option<ProviderAttempt>,
        started: Instant,
    ) -> BatchResolution<V> {
        BatchResolution {
            items: ids.iter().map(|id| self.generator.generate(id)).collect(),
            served_by: vec![ServedBy::Fallback; ids.len()],
            attempt,
            latency_ms: elapsed_ms(started),
        }
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    duration_ms(started.elapsed())
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::{ItemMap, SourceFuture};

    struct Fixed {
        name: &'static str,
        available: bool,
        value: Option<u32>,
    }

    impl DataSource for Fixed {
        type Item = u32;

        fn name(&self) -> &str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn fetch_one<'a>(&'a self, _id: &'a str) -> SourceFuture<'a, Option<u32>> {
            Box::pin(async move { Ok(self.value) })
        }

        fn fetch_many<'a>(&'a self, ids: &'a [String]) -> SourceFuture<'a, ItemMap<u32>> {
            Box::pin(async move {
                Ok(self
                    .value
                    .map(|value| ids.iter().map(|id| (id.clone(), value)).collect())
                    .unwrap_or_default())
            })
        }
    }

    fn fixed(name: &'static str, value: Option<u32>) -> Arc<dyn DataSource<Item = u32>> {
        Arc::new(Fixed {
            name,
            available: true,
            value,
        })
    }

    #[tokio::test]
    async fn empty_chain_generates() {
        let chain = ProviderChain::new(|id: &str| id.len() as u32);

        let resolution = chain.resolve("MSFT").await;

        assert_eq!(resolution.data, 4);
        assert!(resolution.served_by.is_fallback());
        assert!(resolution.attempts.is_empty());
        assert!(!chain.summary().has_real_data);
    }

    #[tokio::test]
    async fn empty_provider_falls_through_to_next() {
        let chain = ProviderChain::new(|_: &str| 0_u32)
            .with_providers([fixed("first", None), fixed("second", Some(7))]);

        let resolution = chain.resolve("AAPL").await;

        assert_eq!(resolution.data, 7);
        assert_eq!(resolution.served_by, ServedBy::Provider(String::from("second")));
        assert_eq!(resolution.source_chain(), ["first", "second"]);
        assert_eq!(resolution.attempts[0].outcome, AttemptOutcome::Empty);
    }

    #[test]
    fn unavailable_provider_is_discarded() {
        let mut chain = ProviderChain::new(|_: &str| 0_u32);

        let added = chain.add_provider(Arc::new(Fixed {
            name: "keyless",
            available: false,
            value: Some(1),
        }));

        assert!(!added);
        assert!(chain.add_provider(fixed("open", Some(1))));
        assert_eq!(chain.provider_names(), ["open"]);
        assert_eq!(
            chain.summary(),
            ChainSummary {
                provider_names_used: vec![String::from("open")],
                has_real_data: true,
            }
        );
    }

    #[tokio::test]
    async fn batch_without_providers_is_fully_generated() {
        let chain = ProviderChain::new(|id: &str| id.len() as u32);
        let ids = vec![String::from("A"), String::from("BB")];

        let resolution = chain.resolve_many(&ids).await;

        assert_eq!(resolution.items, [1, 2]);
        assert_eq!(resolution.generated_count(), 2);
        assert!(resolution.attempt.is_none());
    }

    #[tokio::test]
    async fn batch_uses_only_the_first_provider() {
        let chain = ProviderChain::new(|_: &str| 0_u32)
            .with_providers([fixed("first", None), fixed("second", Some(9))]);
        let ids = vec![String::from("AAPL")];

        let items = chain.query_many(&ids).await;

        assert_eq!(items, [0]);
    }

    #[tokio::test]
    async fn duplicate_ids_are_each_resolved() {
        let chain = ProviderChain::new(|_: &str| 0_u32).with_providers([fixed("first", Some(3))]);
        let ids = vec![String::from("AAPL"), String::from("AAPL")];

        assert_eq!(chain.query_many(&ids).await, [3, 3]);
    }

    #[test]
    fn debug_lists_provider_names() {
        let chain = ProviderChain::new(|_: &str| 0_u32)
            .with_providers([fixed("first", None), fixed("second", Some(1))]);

        let rendered = format!("{chain:?}");

        assert!(rendered.starts_with("ProviderChain"));
        assert!(rendered.contains(r#"["first", "second"]"#));
    }

    #[test]
    fn millisecond_conversion_saturates() {
        assert_eq!(duration_ms(Duration::from_millis(1500)), 1500);
        assert_eq!(duration_ms(Duration::MAX), u64::MAX);
    }
}
