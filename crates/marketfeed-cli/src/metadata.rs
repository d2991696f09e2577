use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Request identifier (UUID v4) attached to every response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for RequestId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Response metadata describing where the data came from.
///
/// `source_chain` lists every provider tried, in order, with `default` last
/// when the synthetic generator had to fill in.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    pub request_id: RequestId,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    pub source_chain: Vec<String>,
    pub latency_ms: u64,
    /// Number of values produced by the synthetic generator.
    pub generated_count: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Metadata {
    pub fn new(source_chain: Vec<String>, latency_ms: u64, generated_count: usize) -> Self {
        Self {
            request_id: RequestId::new_v4(),
            generated_at: OffsetDateTime::now_utc(),
            source_chain,
            latency_ms,
            generated_count,
            warnings: Vec::new(),
        }
    }

    pub fn push_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// Top-level JSON document printed by every command.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope<T> {
    pub meta: Metadata,
    pub data: T,
}
