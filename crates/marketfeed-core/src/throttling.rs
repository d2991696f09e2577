//! Client-side request quotas.
//!
//! Some providers publish a hard request budget (Alpha Vantage's free tier
//! allows 5 calls per minute). Checking it locally turns an exhausted
//! budget into a typed rate-limit failure before any request is sent, so
//! the executor can serve stale data instead of burning a call.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::{Clock as _, DefaultClock};
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

use crate::data_source::SourceError;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Per-window request budget with burst, shared by clones.
#[derive(Clone)]
pub struct RequestQuota {
    limiter: Arc<DirectRateLimiter>,
    clock: DefaultClock,
    label: String,
}

impl std::fmt::Debug for RequestQuota {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestQuota")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

impl RequestQuota {
    /// Allows `limit` requests per `window`, all of them usable as a burst.
    pub fn new(label: impl Into<String>, window: Duration, limit: u32) -> Self {
        Self {
            limiter: Arc::new(RateLimiter::direct(quota_from_window(window, limit))),
            clock: DefaultClock::default(),
            label: label.into(),
        }
    }

    pub fn per_minute(label: impl Into<String>, limit: u32) -> Self {
        Self::new(label, Duration::from_secs(60), limit)
    }

    /// Takes one unit of budget.
    ///
    /// # Errors
    ///
    /// Returns a rate-limited [`SourceError`] naming the wait until the next
    /// unit frees up.
    pub fn acquire(&self) -> Result<(), SourceError> {
        self.limiter.check().map_err(|not_until| {
            let wait = not_until.wait_time_from(self.clock.now());
            SourceError::rate_limited(format!(
                "{} request quota exhausted, next slot in {}ms",
                self.label,
                wait.as_millis()
            ))
        })
    }
}

fn quota_from_window(window: Duration, limit: u32) -> Quota {
    let burst = NonZeroU32::new(limit.max(1)).unwrap_or(NonZeroU32::MIN);
    let seconds_per_cell = (window.as_secs_f64() / f64::from(burst.get())).max(0.001);

    Quota::with_period(Duration::from_secs_f64(seconds_per_cell))
        .map(|quota| quota.allow_burst(burst))
        .unwrap_or_else(|| Quota::per_minute(burst))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data_source::SourceErrorKind;

    #[test]
    fn refuses_once_the_burst_is_spent() {
        let quota = RequestQuota::per_minute("alpha_vantage", 2);

        assert!(quota.acquire().is_ok());
        assert!(quota.acquire().is_ok());

        let error = quota.acquire().expect_err("third request exceeds the quota");
        assert_eq!(error.kind(), SourceErrorKind::RateLimited);
        assert!(error.message().starts_with("alpha_vantage request quota exhausted"));
    }

    #[test]
    fn clones_share_the_budget() {
        let quota = RequestQuota::per_minute("shared", 1);
        let clone = quota.clone();

        assert!(quota.acquire().is_ok());
        assert!(clone.acquire().is_err());
    }

    #[test]
    fn zero_limit_is_treated_as_one() {
        let quota = RequestQuota::per_minute("tiny", 0);
        assert!(quota.acquire().is_ok());
        assert!(quota.acquire().is_err());
    }
}
