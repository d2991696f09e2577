//! Consumer-facing facade over the quote and news chains.

use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::adapters::{
    AlphaVantageSource, CachePolicy, NewsApiSource, SyntheticMarket, YahooFinanceSource,
    NEWSAPI_DEFAULT_TTL, YAHOO_DEFAULT_TTL,
};
use crate::cache::DEFAULT_TTL;
use crate::chain::{BatchResolution, ChainResolution, ProviderChain};
use crate::clock::{Clock, SystemClock};
use crate::data_source::DataSource;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::rate_limit::RateLimitClassifier;
use crate::{CoreError, FeedConfig, MarketProfile, NewsItem, Quote, Symbol, ValidationError};

/// Provider names per chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderNames {
    pub financial: Vec<String>,
    pub news: Vec<String>,
}

/// Market and provider overview for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedSummary {
    pub country: String,
    pub country_name: String,
    pub currency: String,
    pub indexes: Vec<String>,
    pub watchlist_size: usize,
    pub fallback_market: bool,
    pub providers: ProviderNames,
    pub has_real_data: bool,
}

/// Reliable read path for quotes and headlines of one market.
///
/// Every read returns data: real when some provider has it, synthetic
/// otherwise.
#[derive(Debug)]
pub struct MarketFeed {
    profile: MarketProfile,
    quotes: ProviderChain<Quote>,
    news: ProviderChain<Vec<NewsItem>>,
}

impl MarketFeed {
    /// Feed talking to the real providers over reqwest.
    pub fn from_config(config: &FeedConfig) -> Result<Self, CoreError> {
        Self::with_http_client(config, Arc::new(ReqwestHttpClient::new()))
    }

    pub fn with_http_client(
        config: &FeedConfig,
        http_client: Arc<dyn HttpClient>,
    ) -> Result<Self, CoreError> {
        Self::with_clock(config, http_client, Arc::new(SystemClock))
    }

    /// Full assembly with an explicit clock for every source cache.
    pub fn with_clock(
        config: &FeedConfig,
        http_client: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, CoreError> {
        config.validate()?;

        let mut profile = MarketProfile::for_country(&config.country)?;
        if let Some(watchlist) = &config.watchlist {
            profile.watchlist = watchlist.clone();
        }

        let synthetic = match config.synthetic_seed {
            Some(seed) => SyntheticMarket::with_seed(profile.clone(), seed),
            None => SyntheticMarket::new(profile.clone()),
        };
        let quote_market = synthetic.clone();
        let mut quotes = ProviderChain::new(move |symbol: &str| quote_market.quote(symbol))
            .with_timeout(config.provider_timeout);
        let news_market = synthetic;
        let mut news = ProviderChain::new(move |_: &str| news_market.news())
            .with_timeout(config.provider_timeout);

        if config.use_real_data {
            let classifier = config
                .rate_limit_patterns
                .iter()
                .fold(RateLimitClassifier::default(), |classifier, pattern| {
                    classifier.with_pattern(pattern)
                });
            let policy = |default_ttl| {
                CachePolicy::new(config.cache_ttl.unwrap_or(default_ttl))
                    .with_classifier(classifier.clone())
                    .with_clock(Arc::clone(&clock))
            };

            quotes.add_provider(Arc::new(YahooFinanceSource::with_cache_policy(
                Arc::clone(&http_client),
                policy(YAHOO_DEFAULT_TTL),
            )));
            quotes.add_provider(Arc::new(AlphaVantageSource::with_cache_policy(
                Arc::clone(&http_client),
                config.alpha_vantage_api_key.clone(),
                policy(DEFAULT_TTL),
            )));
            news.add_provider(Arc::new(
                NewsApiSource::with_cache_policy(
                    Arc::clone(&http_client),
                    config.newsapi_key.clone(),
                    policy(NEWSAPI_DEFAULT_TTL),
                )
                .with_watchlist(profile.watchlist.clone()),
            ));
        }

        debug!(
            country = %profile.country,
            financial = ?quotes.provider_names(),
            news = ?news.provider_names(),
            "market feed assembled"
        );
        Ok(Self {
            profile,
            quotes,
            news,
        })
    }

    /// Synthetic-only feed for `country`.
    pub fn offline(country: &str) -> Result<Self, CoreError> {
        let config = FeedConfig::offline().with_country(country)?;
        Self::with_http_client(&config, Arc::new(ReqwestHttpClient::new()))
    }

    pub fn profile(&self) -> &MarketProfile {
        &self.profile
    }

    pub fn watchlist(&self) -> &[Symbol] {
        &self.profile.watchlist
    }

    pub fn quote_chain(&self) -> &ProviderChain<Quote> {
        &self.quotes
    }

    pub fn news_chain(&self) -> &ProviderChain<Vec<NewsItem>> {
        &self.news
    }

    /// Registers a quote source at the lowest priority.
    pub fn add_quote_source(&mut self, source: Arc<dyn DataSource<Item = Quote>>) -> bool {
        self.quotes.add_provider(source)
    }

    /// Registers a news source at the lowest priority.
    pub fn add_news_source(&mut self, source: Arc<dyn DataSource<Item = Vec<NewsItem>>>) -> bool {
        self.news.add_provider(source)
    }

    /// Quote for one symbol.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] when `symbol` is not a valid ticker.
    pub async fn stock(&self, symbol: &str) -> Result<Quote, ValidationError> {
        Ok(self.stock_report(symbol).await?.data)
    }

    pub async fn stock_report(
        &self,
        symbol: &str,
    ) -> Result<ChainResolution<Quote>, ValidationError> {
        let symbol = Symbol::parse(symbol)?;
        Ok(self.quotes.resolve(symbol.as_str()).await)
    }

    /// Quotes for the whole watchlist, in watchlist order.
    pub async fn stocks(&self) -> Vec<Quote> {
        self.stocks_report(&self.profile.watchlist).await.items
    }

    /// Quotes for `symbols`, in the given order.
    pub async fn stocks_for(&self, symbols: &[Symbol]) -> Vec<Quote> {
        self.stocks_report(symbols).await.items
    }

    pub async fn stocks_report(&self, symbols: &[Symbol]) -> BatchResolution<Quote> {
        let ids: Vec<String> = symbols.iter().map(|symbol| symbol.to_string()).collect();
        self.quotes.resolve_many(&ids).await
    }

    /// Headlines for the feed's market.
    pub async fn news(&self) -> Vec<NewsItem> {
        self.news_report().await.data
    }

    pub async fn news_report(&self) -> ChainResolution<Vec<NewsItem>> {
        self.news.resolve(&self.profile.country).await
    }

    pub fn summary(&self) -> FeedSummary {
        let financial = self.quotes.summary();
        let news = self.news.summary();

        FeedSummary {
            country: self.profile.country.clone(),
            country_name: self.profile.country_name.clone(),
            currency: self.profile.currency.clone(),
            indexes: self.profile.indexes.clone(),
            watchlist_size: self.profile.watchlist.len(),
            fallback_market: self.profile.fallback,
            has_real_data: financial.has_real_data || news.has_real_data,
            providers: ProviderNames {
                financial: financial.provider_names_used,
                news: news.provider_names_used,
            },
        }
    }
}
