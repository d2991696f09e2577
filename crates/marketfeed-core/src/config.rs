//! Feed configuration.
//!
//! # Environment Variables
//!
//! | Setting | Primary Env Var | Fallback Env Var |
//! |---------|-----------------|------------------|
//! | Country | `MARKETFEED_COUNTRY` | - |
//! | Watchlist | `MARKETFEED_WATCHLIST` (comma separated) | - |
//! | Real data | `MARKETFEED_USE_REAL_DATA` | - |
//! | Alpha Vantage key | `MARKETFEED_ALPHA_VANTAGE_API_KEY` | `ALPHA_VANTAGE_API_KEY` |
//! | NewsAPI key | `MARKETFEED_NEWSAPI_KEY` | `NEWSAPI_KEY` |
//! | Cache TTL | `MARKETFEED_CACHE_TTL_SECS` | - |
//! | Provider timeout | `MARKETFEED_PROVIDER_TIMEOUT_MS` | - |
//! | Extra rate-limit patterns | `MARKETFEED_RATE_LIMIT_PATTERNS` (comma separated) | - |

use std::env;
use std::time::Duration;

use crate::cache::MAX_TTL;
use crate::chain::DEFAULT_PROVIDER_TIMEOUT;
use crate::{validate_country_code, ConfigError, Symbol, DEFAULT_COUNTRY};

/// Settings used to assemble a [`MarketFeed`](crate::MarketFeed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    /// Uppercase 2-letter country code selecting the market profile.
    pub country: String,
    /// Replaces the market's default watchlist when set.
    pub watchlist: Option<Vec<Symbol>>,
    /// When false only the synthetic market serves data.
    pub use_real_data: bool,
    pub alpha_vantage_api_key: Option<String>,
    pub newsapi_key: Option<String>,
    /// Overrides every source's own cache lifetime when set.
    pub cache_ttl: Option<Duration>,
    pub provider_timeout: Duration,
    /// Added on top of the default rate-limit patterns.
    pub rate_limit_patterns: Vec<String>,
    /// Seeds the synthetic market for reproducible output.
    pub synthetic_seed: Option<u64>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            country: String::from(DEFAULT_COUNTRY),
            watchlist: None,
            use_real_data: true,
            alpha_vantage_api_key: None,
            newsapi_key: None,
            cache_ttl: None,
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            rate_limit_patterns: Vec::new(),
            synthetic_seed: None,
        }
    }
}

impl FeedConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Synthetic-only configuration: no network sources are registered.
    pub fn offline() -> Self {
        Self {
            use_real_data: false,
            ..Self::default()
        }
    }

    /// Reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its
    /// value. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(country) = read("MARKETFEED_COUNTRY") {
            config.country = validate_country_code(&country)?;
        }
        if let Some(watchlist) = read("MARKETFEED_WATCHLIST") {
            config.watchlist = Some(Symbol::parse_list(&watchlist)?);
        }
        if let Some(flag) = read("MARKETFEED_USE_REAL_DATA") {
            config.use_real_data = parse_flag("MARKETFEED_USE_REAL_DATA", &flag)?;
        }

        config.alpha_vantage_api_key =
            read("MARKETFEED_ALPHA_VANTAGE_API_KEY").or_else(|| read("ALPHA_VANTAGE_API_KEY"));
        config.newsapi_key = read("MARKETFEED_NEWSAPI_KEY").or_else(|| read("NEWSAPI_KEY"));

        if let Some(secs) = read("MARKETFEED_CACHE_TTL_SECS") {
            let secs = parse_number("MARKETFEED_CACHE_TTL_SECS", "seconds", &secs)?;
            config.cache_ttl = Some(Duration::from_secs(secs));
        }
        if let Some(millis) = read("MARKETFEED_PROVIDER_TIMEOUT_MS") {
            let millis = parse_number("MARKETFEED_PROVIDER_TIMEOUT_MS", "milliseconds", &millis)?;
            config.provider_timeout = Duration::from_millis(millis);
        }
        if let Some(patterns) = read("MARKETFEED_RATE_LIMIT_PATTERNS") {
            config.rate_limit_patterns = patterns
                .split(',')
                .map(str::trim)
                .filter(|pattern| !pattern.is_empty())
                .map(str::to_owned)
                .collect();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_country(mut self, country: &str) -> Result<Self, ConfigError> {
        self.country = validate_country_code(country)?;
        Ok(self)
    }

    pub fn with_watchlist(mut self, watchlist: Vec<Symbol>) -> Self {
        self.watchlist = Some(watchlist);
        self
    }

    pub fn with_real_data(mut self, use_real_data: bool) -> Self {
        self.use_real_data = use_real_data;
        self
    }

    pub fn with_alpha_vantage_key(mut self, key: impl Into<String>) -> Self {
        self.alpha_vantage_api_key = Some(key.into());
        self
    }

    pub fn with_newsapi_key(mut self, key: impl Into<String>) -> Self {
        self.newsapi_key = Some(key.into());
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    pub fn with_rate_limit_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.rate_limit_patterns.push(pattern.into());
        self
    }

    pub fn with_synthetic_seed(mut self, seed: u64) -> Self {
        self.synthetic_seed = Some(seed);
        self
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_ttl == Some(Duration::ZERO) {
            return Err(ConfigError::ZeroDuration { field: "cache_ttl" });
        }
        if self.cache_ttl.is_some_and(|ttl| ttl > MAX_TTL) {
            return Err(ConfigError::DurationTooLarge {
                field: "cache_ttl",
                max_secs: MAX_TTL.as_secs(),
            });
        }
        if self.provider_timeout.is_zero() {
            return Err(ConfigError::ZeroDuration {
                field: "provider_timeout",
            });
        }
        Ok(())
    }
}

fn parse_number(name: &'static str, unit: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidNumber {
            name,
            unit,
            value: value.to_owned(),
        })
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: value.to_owned(),
        }),
    }
}
