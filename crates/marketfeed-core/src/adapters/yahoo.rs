use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use super::{validation_to_error, CachePolicy};
use crate::cache::CacheKey;
use crate::data_source::{DataSource, ItemMap, SourceError, SourceFuture};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::resilient::ResilientExecutor;
use crate::Quote;

/// Cache lifetime for Yahoo quotes.
pub const YAHOO_DEFAULT_TTL: Duration = Duration::from_secs(180);

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const BATCH_TIMEOUT: Duration = Duration::from_secs(15);
const EXPLANATION: &str = "Real-time data from Yahoo Finance";

/// Keyless quotes from Yahoo's chart endpoint.
///
/// Status 429 is reported as rate limiting so the executor can fall back
/// to cached quotes; any other non-success status means "not found".
/// Batches go out as one comma-joined request and degrade to per-symbol
/// lookups when that request is refused for a reason other than rate
/// limiting.
#[derive(Clone)]
pub struct YahooFinanceSource {
    http_client: Arc<dyn HttpClient>,
    base_url: String,
    quotes: ResilientExecutor<Option<Quote>>,
    batches: ResilientExecutor<ItemMap<Quote>>,
}

impl YahooFinanceSource {
    pub fn new(http_client: Arc<dyn HttpClient>) -> Self {
        Self::with_cache_policy(http_client, CachePolicy::new(YAHOO_DEFAULT_TTL))
    }

    pub fn with_cache_policy(http_client: Arc<dyn HttpClient>, policy: CachePolicy) -> Self {
        Self {
            http_client,
            base_url: String::from(CHART_URL),
            quotes: policy.executor(),
            batches: policy.executor(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    pub fn quote_executor(&self) -> &ResilientExecutor<Option<Quote>> {
        &self.quotes
    }

    pub fn batch_executor(&self) -> &ResilientExecutor<ItemMap<Quote>> {
        &self.batches
    }

    async fn cached_quote(&self, symbol: &str) -> Result<Option<Quote>, SourceError> {
        let key = CacheKey::new("get_stock_price").arg(symbol).to_string();
        let cached = self
            .quotes
            .execute(&key, None, || self.fetch_quote(symbol))
            .await?;
        Ok(cached.flatten())
    }

    async fn cached_batch(&self, symbols: &[String]) -> Result<ItemMap<Quote>, SourceError> {
        let key = CacheKey::new("get_multiple_stocks")
            .args(symbols)
            .to_string();
        let cached = self
            .batches
            .execute(&key, None, || self.fetch_batch(symbols))
            .await?;
        Ok(cached.unwrap_or_default())
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Option<Quote>, SourceError> {
        let request = chart_request(&self.base_url, &urlencoding::encode(symbol));
        let response = self.http_client.execute(request).await?;

        if response.is_rate_limited() {
            return Err(rate_limited(&response));
        }
        if !response.is_success() {
            debug!(symbol, status = response.status, "yahoo has no quote");
            return Ok(None);
        }

        let payload: ChartResponse = response.json()?;
        payload
            .results()
            .next()
            .and_then(|result| parse_meta(Some(symbol), result.meta))
            .transpose()
    }

    async fn fetch_batch(&self, symbols: &[String]) -> Result<ItemMap<Quote>, SourceError> {
        if symbols.is_empty() {
            return Ok(ItemMap::new());
        }

        let joined = symbols
            .iter()
            .map(|symbol| urlencoding::encode(symbol).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        let request = chart_request(&self.base_url, &joined).with_timeout(BATCH_TIMEOUT);

        let payload = match self.http_client.execute(request).await {
            Ok(response) if response.is_rate_limited() => return Err(rate_limited(&response)),
            Ok(response) if response.is_success() => response.json::<ChartResponse>().ok(),
            Ok(response) => {
                debug!(status = response.status, "yahoo batch refused");
                None
            }
            Err(error) => {
                debug!(%error, "yahoo batch transport failure");
                None
            }
        };

        match payload {
            Some(payload) => Ok(payload
                .results()
                .filter_map(|result| parse_meta(None, result.meta))
                .filter_map(Result::ok)
                .map(|quote| (quote.symbol.clone(), quote))
                .collect()),
            None => Ok(self.fetch_individually(symbols).await),
        }
    }

    async fn fetch_individually(&self, symbols: &[String]) -> ItemMap<Quote> {
        let mut found = ItemMap::new();
        for symbol in symbols {
            match self.cached_quote(symbol).await {
                Ok(Some(quote)) => {
                    found.insert(symbol.clone(), quote);
                }
                Ok(None) => {}
                Err(error) => debug!(symbol = %symbol, %error, "yahoo single lookup failed"),
            }
        }
        found
    }
}

impl DataSource for YahooFinanceSource {
    type Item = Quote;

    fn name(&self) -> &str {
        "yahoo"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn fetch_one<'a>(&'a self, id: &'a str) -> SourceFuture<'a, Option<Quote>> {
        Box::pin(self.cached_quote(id))
    }

    fn fetch_many<'a>(&'a self, ids: &'a [String]) -> SourceFuture<'a, ItemMap<Quote>> {
        Box::pin(self.cached_batch(ids))
    }
}

fn chart_request(base_url: &str, path: &str) -> HttpRequest {
    HttpRequest::get(format!("{base_url}/{path}"))
        .with_query("interval", "1d")
        .with_query("range", "1d")
}

fn rate_limited(response: &HttpResponse) -> SourceError {
    SourceError::rate_limited(format!("yahoo returned status {}", response.status))
}

/// Builds a quote from chart metadata. `None` when the payload carries no
/// usable price or no symbol to key it by.
fn parse_meta(requested: Option<&str>, meta: ChartMeta) -> Option<Result<Quote, SourceError>> {
    let price = meta.regular_market_price?;
    let symbol = meta.symbol.as_deref().or(requested)?;
    let previous_close = meta
        .previous_close
        .or(meta.chart_previous_close)
        .unwrap_or(price);

    Some(
        Quote::from_previous_close(symbol, price, previous_close, EXPLANATION)
            .map_err(validation_to_error),
    )
}

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartBody,
}

impl ChartResponse {
    fn results(self) -> impl Iterator<Item = ChartResult> {
        self.chart.result.unwrap_or_default().into_iter()
    }
}

#[derive(Debug, Deserialize)]
struct ChartBody {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    regular_market_price: Option<f64>,
    #[serde(default)]
    previous_close: Option<f64>,
    #[serde(default)]
    chart_previous_close: Option<f64>,
}
