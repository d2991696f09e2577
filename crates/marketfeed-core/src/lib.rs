//! # Marketfeed Core
//!
//! Resilient quote and headline aggregation over unreliable free-tier
//! market-data providers.
//!
//! ## Overview
//!
//! This crate keeps a market dashboard supplied with data no matter how the
//! upstream APIs behave:
//!
//! - **TTL cache** whose expired entries stay readable as a stale fallback
//! - **Rate-limit classification** of provider failures
//! - **Resilient executor** that serves stale data when a provider throttles
//! - **Provider chains** with ordered fallback and per-provider timeouts
//! - **Synthetic market** that fills every gap with plausible values
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Yahoo Finance, Alpha Vantage, NewsAPI and the synthetic market |
//! | [`cache`] | TTL cache store with stale reads |
//! | [`chain`] | Ordered provider fallback with a default generator |
//! | [`clock`] | Time source abstraction for cache expiry |
//! | [`config`] | Feed configuration and environment loading |
//! | [`data_source`] | Data source trait and structured errors |
//! | [`domain`] | Domain models (Quote, NewsItem, Symbol, MarketProfile) |
//! | [`error`] | Core error types |
//! | [`feed`] | Consumer facade over the quote and news chains |
//! | [`http_client`] | HTTP client abstraction |
//! | [`rate_limit`] | Rate-limit classification |
//! | [`resilient`] | Cache-first execution with stale fallback |
//! | [`throttling`] | Client-side request quotas |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use marketfeed_core::{FeedConfig, MarketFeed};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let feed = MarketFeed::from_config(&FeedConfig::from_env()?)?;
//!
//!     // Always a quote: real when a provider answers, synthetic otherwise
//!     let quote = feed.stock("AAPL").await?;
//!     println!("AAPL price: ${:.2}", quote.price);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / User     │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │  Market Feed    │────▶│ Synthetic Market │
//! └────────┬────────┘     └──────────────────┘
//!          │                        ▲
//!          ▼                        │ default
//! ┌─────────────────┐               │
//! │ Provider Chain  │───────────────┘
//! └────────┬────────┘
//!          │ in priority order
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Data Source     │────▶│ Resilient        │
//! │ (Adapter Trait) │     │ Executor + Cache │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ HTTP Client     │
//! │ (reqwest)       │
//! └─────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! Sources report structured errors; the chain absorbs them and moves on:
//!
//! ```rust
//! use marketfeed_core::{SourceError, SourceErrorKind};
//!
//! fn handle_error(error: SourceError) {
//!     match error.kind() {
//!         SourceErrorKind::RateLimited => {
//!             // Stale cache or next provider
//!         }
//!         SourceErrorKind::Unavailable => {
//!             // Next provider
//!         }
//!         _ => {}
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - API keys are read from configuration or environment variables and never logged
//! - All HTTP requests use TLS via reqwest
//! - Tickers and country codes are validated before any request is made

pub mod adapters;
pub mod cache;
pub mod chain;
pub mod clock;
pub mod config;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod feed;
pub mod http_client;
pub mod rate_limit;
pub mod resilient;
pub mod throttling;

// Adapter implementations
pub use adapters::{
    extract_impact, AlphaVantageSource, CachePolicy, NewsApiSource, SyntheticMarket,
    YahooFinanceSource,
};

// Caching
pub use cache::{CacheKey, CacheStore, EntryTiming, DEFAULT_TTL, MAX_TTL};

// Provider chains
pub use chain::{
    AttemptOutcome, BatchResolution, ChainResolution, ChainSummary, FallbackGenerator,
    ProviderAttempt, ProviderChain, ServedBy, DEFAULT_PROVIDER_TIMEOUT,
};

// Time
pub use clock::{Clock, ManualClock, SystemClock};

// Configuration
pub use config::FeedConfig;

// Data source trait and types
pub use data_source::{DataSource, ItemMap, SourceError, SourceErrorKind, SourceFuture};

// Domain models
pub use domain::{
    validate_country_code, Direction, MarketProfile, NewsItem, Quote, Symbol, DEFAULT_COUNTRY,
};

// Error types
pub use error::{ConfigError, CoreError, ValidationError};

// Facade
pub use feed::{FeedSummary, MarketFeed, ProviderNames};

// HTTP client types
pub use http_client::{
    CannedHttpClient, HttpAuth, HttpClient, HttpError, HttpErrorKind, HttpRequest, HttpResponse,
    ReqwestHttpClient,
};

// Rate limiting
pub use rate_limit::{RateLimitClassifier, DEFAULT_RATE_LIMIT_PATTERNS};
pub use resilient::{CacheOrigin, ResilientExecutor, Resolved};
pub use throttling::RequestQuota;
