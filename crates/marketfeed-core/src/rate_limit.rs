//! Rate-limit classification of fetch failures.
//!
//! Transports surface throttling in very different ways: a status code in a
//! message, a JSON notice, a typed error. The classifier accepts either a
//! typed [`SourceError`] or any displayable failure and decides whether it
//! is transient rate limiting or a hard failure.

use std::fmt::Display;

use crate::data_source::{SourceError, SourceErrorKind};

/// Substrings treated as rate-limit signals when no patterns are configured.
pub const DEFAULT_RATE_LIMIT_PATTERNS: [&str; 4] = [
    "429",
    "rate limit exceeded",
    "too many requests",
    "rate limited",
];

/// Case-insensitive substring classifier for rate-limit failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitClassifier {
    patterns: Vec<String>,
}

impl Default for RateLimitClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_RATE_LIMIT_PATTERNS)
    }
}

impl RateLimitClassifier {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut classifier = Self {
            patterns: Vec::new(),
        };
        for pattern in patterns {
            classifier.push_pattern(pattern.as_ref());
        }
        classifier
    }

    /// Adds a pattern on top of the existing ones.
    pub fn with_pattern(mut self, pattern: impl AsRef<str>) -> Self {
        self.push_pattern(pattern.as_ref());
        self
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Classifies any failure by its text.
    pub fn is_rate_limited(&self, failure: &dyn Display) -> bool {
        let text = failure.to_string().to_lowercase();
        self.patterns.iter().any(|pattern| text.contains(pattern))
    }

    /// Classifies a source error, trusting a self-reported rate-limit kind
    /// before falling back to text matching.
    pub fn classify(&self, error: &SourceError) -> bool {
        error.kind() == SourceErrorKind::RateLimited || self.is_rate_limited(&error.message())
    }

    fn push_pattern(&mut self, pattern: &str) {
        let normalized = pattern.trim().to_lowercase();
        if !normalized.is_empty() && !self.patterns.contains(&normalized) {
            self.patterns.push(normalized);
        }
    }
}
