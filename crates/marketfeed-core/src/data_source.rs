//! Data source contract and failure types.
//!
//! Every quote or headline backend implements [`DataSource`]. The chain and
//! the resilient executor only ever see this contract, so a scraper, an
//! authenticated API and an in-process fake are interchangeable.
//!
//! # Contract
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`name`](DataSource::name) | Stable provider name shown in summaries |
//! | [`is_available`](DataSource::is_available) | Credentials/reachability, checked once at registration |
//! | [`fetch_one`](DataSource::fetch_one) | One item; `Ok(None)` when the id is simply not found |
//! | [`fetch_many`](DataSource::fetch_many) | Many items; omitted ids are implicit "not found" |

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by source methods.
pub type SourceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SourceError>> + Send + 'a>>;

/// Batch result keyed by the requested id.
pub type ItemMap<V> = HashMap<String, V>;

/// Failure classification carried by a [`SourceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceErrorKind {
    /// The source (or a local quota) refused the call for now.
    RateLimited,
    /// Transport failure, timeout or non-success status.
    Unavailable,
    /// The response could not be decoded.
    Malformed,
    Internal,
}

impl SourceErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RateLimited => "rate_limited",
            Self::Unavailable => "unavailable",
            Self::Malformed => "malformed",
            Self::Internal => "internal",
        }
    }
}

/// Structured source error used by the executor and the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError {
    kind: SourceErrorKind,
    message: String,
}

impl SourceError {
    pub fn new(kind: SourceErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::RateLimited, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Unavailable, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Malformed, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(SourceErrorKind::Internal, message)
    }

    pub const fn kind(&self) -> SourceErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> String {
        format!("source.{}", self.kind.as_str())
    }
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for SourceError {}

/// Source adapter contract.
///
/// Implementations must be `Send + Sync`; the chain keeps them behind
/// `Arc<dyn DataSource<Item = V>>`.
pub trait DataSource: Send + Sync {
    /// Value produced for a single id.
    type Item: Clone + Send + Sync + 'static;

    /// Returns the provider name used in summaries and logs.
    fn name(&self) -> &str;

    /// Whether the source can be used at all (API key present, etc.).
    ///
    /// Must not perform I/O; the chain calls it once at registration.
    fn is_available(&self) -> bool;

    /// Fetches one item.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] when the call failed. A missing item is
    /// `Ok(None)`, not an error.
    fn fetch_one<'a>(&'a self, id: &'a str) -> SourceFuture<'a, Option<Self::Item>>;

    /// Fetches several items at once. The map holds only resolved ids.
    fn fetch_many<'a>(&'a self, ids: &'a [String]) -> SourceFuture<'a, ItemMap<Self::Item>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_code() {
        let error = SourceError::rate_limited("yahoo returned status 429");
        assert_eq!(
            error.to_string(),
            "yahoo returned status 429 (source.rate_limited)"
        );
        assert_eq!(error.kind(), SourceErrorKind::RateLimited);
    }
}
