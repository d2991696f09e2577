use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use super::{validation_to_error, CachePolicy};
use crate::cache::{CacheKey, DEFAULT_TTL};
use crate::data_source::{DataSource, ItemMap, SourceError, SourceFuture};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::resilient::ResilientExecutor;
use crate::throttling::RequestQuota;
use crate::Quote;

/// Free-tier request budget.
pub const ALPHA_VANTAGE_REQUESTS_PER_MINUTE: u32 = 5;

const QUERY_URL: &str = "https://www.alphavantage.co/query";
const EXPLANATION: &str = "Real-time data from Alpha Vantage";

/// `GLOBAL_QUOTE` lookups against Alpha Vantage.
///
/// Only available with an API key. The service answers throttled calls
/// with HTTP 200 and a "Note"/"Information" notice instead of a status
/// code, so those notices are reported as rate limiting. There is no batch
/// endpoint; batches are per-symbol lookups sharing the single-quote cache.
#[derive(Clone)]
pub struct AlphaVantageSource {
    http_client: Arc<dyn HttpClient>,
    api_key: Option<String>,
    base_url: String,
    quota: RequestQuota,
    quotes: ResilientExecutor<Option<Quote>>,
}

impl AlphaVantageSource {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        Self::with_cache_policy(http_client, api_key, CachePolicy::new(DEFAULT_TTL))
    }

    pub fn with_cache_policy(
        http_client: Arc<dyn HttpClient>,
        api_key: Option<String>,
        policy: CachePolicy,
    ) -> Self {
        let policy = CachePolicy {
            classifier: policy.classifier.clone().with_pattern("call frequency"),
            ..policy
        };
        Self {
            http_client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: String::from(QUERY_URL),
            quota: RequestQuota::per_minute("alphavantage", ALPHA_VANTAGE_REQUESTS_PER_MINUTE),
            quotes: policy.executor(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_quota(mut self, quota: RequestQuota) -> Self {
        self.quota = quota;
        self
    }

    pub fn quote_executor(&self) -> &ResilientExecutor<Option<Quote>> {
        &self.quotes
    }

    async fn cached_quote(&self, symbol: &str) -> Result<Option<Quote>, SourceError> {
        let key = CacheKey::new("get_stock_price").arg(symbol).to_string();
        let cached = self
            .quotes
            .execute(&key, None, || self.fetch_quote(symbol))
            .await?;
        Ok(cached.flatten())
    }

    async fn fetch_quote(&self, symbol: &str) -> Result<Option<Quote>, SourceError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(None);
        };
        self.quota.acquire()?;

        let request = HttpRequest::get(self.base_url.as_str())
            .with_query("function", "GLOBAL_QUOTE")
            .with_query("symbol", symbol)
            .with_auth(&HttpAuth::QueryParam {
                name: String::from("apikey"),
                value: api_key.to_owned(),
            });
        let response = self.http_client.execute(request).await?;

        if response.is_rate_limited() {
            return Err(SourceError::rate_limited(format!(
                "alphavantage returned status {}",
                response.status
            )));
        }
        if !response.is_success() {
            debug!(symbol, status = response.status, "alphavantage has no quote");
            return Ok(None);
        }

        let payload: GlobalQuoteResponse = response.json()?;
        if let Some(notice) = payload.note.or(payload.information) {
            return Err(SourceError::rate_limited(notice));
        }
        if let Some(message) = payload.error_message {
            debug!(symbol, %message, "alphavantage rejected symbol");
            return Ok(None);
        }

        payload
            .global_quote
            .map(|data| parse_global_quote(symbol, data))
            .transpose()
            .map(Option::flatten)
    }

    async fn collect_quotes(&self, symbols: &[String]) -> Result<ItemMap<Quote>, SourceError> {
        let mut found = ItemMap::new();
        for symbol in symbols {
            match self.cached_quote(symbol).await {
                Ok(Some(quote)) => {
                    found.insert(symbol.clone(), quote);
                }
                Ok(None) => {}
                Err(error) => debug!(symbol = %symbol, %error, "alphavantage lookup failed"),
            }
        }
        Ok(found)
    }
}

impl DataSource for AlphaVantageSource {
    type Item = Quote;

    fn name(&self) -> &str {
        "alphavantage"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn fetch_one<'a>(&'a self, id: &'a str) -> SourceFuture<'a, Option<Quote>> {
        Box::pin(self.cached_quote(id))
    }

    fn fetch_many<'a>(&'a self, ids: &'a [String]) -> SourceFuture<'a, ItemMap<Quote>> {
        Box::pin(self.collect_quotes(ids))
    }
}

/// `None` when the quote object is empty, which is how the service reports
/// an unknown symbol.
fn parse_global_quote(
    requested: &str,
    data: GlobalQuoteData,
) -> Result<Option<Quote>, SourceError> {
    let Some(price) = data.price.as_deref() else {
        return Ok(None);
    };

    let price = parse_number("05. price", price)?;
    let change = data
        .change
        .as_deref()
        .map(|value| parse_number("09. change", value))
        .transpose()?
        .unwrap_or(0.0);
    let change_percent = data
        .change_percent
        .as_deref()
        .map(|value| parse_number("10. change percent", value.trim_end_matches('%')))
        .transpose()?
        .unwrap_or(0.0);
    let symbol = data.symbol.as_deref().unwrap_or(requested);

    Quote::new(symbol, price, change, change_percent, EXPLANATION)
        .map(Some)
        .map_err(validation_to_error)
}

fn parse_number(field: &str, value: &str) -> Result<f64, SourceError> {
    value.trim().parse::<f64>().map_err(|_| {
        SourceError::malformed(format!("alphavantage field '{field}' is not a number: '{value}'"))
    })
}

#[derive(Debug, Deserialize)]
struct GlobalQuoteResponse {
    #[serde(rename = "Global Quote", default)]
    global_quote: Option<GlobalQuoteData>,
    #[serde(rename = "Note", default)]
    note: Option<String>,
    #[serde(rename = "Information", default)]
    information: Option<String>,
    #[serde(rename = "Error Message", default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GlobalQuoteData {
    #[serde(rename = "01. symbol", default)]
    symbol: Option<String>,
    #[serde(rename = "05. price", default)]
    price: Option<String>,
    #[serde(rename = "09. change", default)]
    change: Option<String>,
    #[serde(rename = "10. change percent", default)]
    change_percent: Option<String>,
}
