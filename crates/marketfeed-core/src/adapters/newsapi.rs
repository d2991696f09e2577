use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use super::{extract_impact, CachePolicy};
use crate::cache::CacheKey;
use crate::data_source::{DataSource, ItemMap, SourceError, SourceFuture};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest};
use crate::resilient::ResilientExecutor;
use crate::{NewsItem, Symbol};

/// Cache lifetime for headline lists.
pub const NEWSAPI_DEFAULT_TTL: Duration = Duration::from_secs(600);

const BASE_URL: &str = "https://newsapi.org/v2";
const SEARCH_QUERY: &str = "stock market OR finance OR earnings";
const PAGE_SIZE: &str = "10";
const MAX_ARTICLES: usize = 5;
const MAX_HEADLINE_CHARS: usize = 100;
const MAX_EXPLANATION_CHARS: usize = 200;

/// Financial headlines from NewsAPI's `/v2/everything`, keyed by country code.
///
/// Known countries restrict the search to local financial outlets. Each
/// headline is tagged with the watched symbols it mentions.
#[derive(Clone)]
pub struct NewsApiSource {
    http_client: Arc<dyn HttpClient>,
    api_key: Option<String>,
    base_url: String,
    watchlist: Vec<Symbol>,
    headlines: ResilientExecutor<Option<Vec<NewsItem>>>,
}

impl NewsApiSource {
    pub fn new(http_client: Arc<dyn HttpClient>, api_key: Option<String>) -> Self {
        Self::with_cache_policy(http_client, api_key, CachePolicy::new(NEWSAPI_DEFAULT_TTL))
    }

    pub fn with_cache_policy(
        http_client: Arc<dyn HttpClient>,
        api_key: Option<String>,
        policy: CachePolicy,
    ) -> Self {
        Self {
            http_client,
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: String::from(BASE_URL),
            watchlist: Vec::new(),
            headlines: policy.executor(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    /// Symbols whose mentions are tagged with an impact direction.
    pub fn with_watchlist(mut self, watchlist: Vec<Symbol>) -> Self {
        self.watchlist = watchlist;
        self
    }

    pub fn headline_executor(&self) -> &ResilientExecutor<Option<Vec<NewsItem>>> {
        &self.headlines
    }

    async fn cached_headlines(&self, country: &str) -> Result<Option<Vec<NewsItem>>, SourceError> {
        let key = CacheKey::new("get_market_news")
            .arg(country)
            .args(&self.watchlist)
            .to_string();
        let cached = self
            .headlines
            .execute(&key, None, || self.fetch_headlines(country))
            .await?;
        Ok(cached.flatten())
    }

    async fn fetch_headlines(&self, country: &str) -> Result<Option<Vec<NewsItem>>, SourceError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(None);
        };

        let mut request = HttpRequest::get(format!("{}/everything", self.base_url))
            .with_query("q", SEARCH_QUERY)
            .with_query("language", "en")
            .with_query("sortBy", "publishedAt")
            .with_query("pageSize", PAGE_SIZE)
            .with_auth(&HttpAuth::Header {
                name: String::from("X-Api-Key"),
                value: api_key.to_owned(),
            });
        if let Some(domains) = country_domains(country) {
            request = request.with_query("domains", domains);
        }

        let response = self.http_client.execute(request).await?;
        if response.is_rate_limited() {
            return Err(SourceError::rate_limited(format!(
                "newsapi returned status {}",
                response.status
            )));
        }

        let payload: EverythingResponse = match response.json() {
            Ok(payload) => payload,
            Err(error) if response.is_success() => return Err(error),
            Err(_) => {
                debug!(country, status = response.status, "newsapi refused request");
                return Ok(None);
            }
        };

        if payload.status == "error" {
            let code = payload.code.unwrap_or_default();
            let message = payload.message.unwrap_or_default();
            if code == "rateLimited" {
                return Err(SourceError::rate_limited(format!("newsapi {code}: {message}")));
            }
            debug!(country, %code, %message, "newsapi error response");
            return Ok(None);
        }

        let items: Vec<NewsItem> = payload
            .articles
            .into_iter()
            .take(MAX_ARTICLES)
            .filter_map(|article| self.to_news_item(article))
            .collect();

        Ok((!items.is_empty()).then_some(items))
    }

    fn to_news_item(&self, article: Article) -> Option<NewsItem> {
        let headline = article.title.filter(|title| !title.trim().is_empty())?;
        let description = article
            .description
            .filter(|description| !description.trim().is_empty())?;

        let impact = extract_impact(&format!("{headline} {description}"), &self.watchlist);
        let mut item = NewsItem::new(
            truncate_chars(&headline, MAX_HEADLINE_CHARS),
            truncate_chars(&description, MAX_EXPLANATION_CHARS),
        )
        .ok()?;
        item.impact = impact;
        Some(item)
    }

    async fn collect_headlines(
        &self,
        countries: &[String],
    ) -> Result<ItemMap<Vec<NewsItem>>, SourceError> {
        let mut found = ItemMap::new();
        for country in countries {
            match self.cached_headlines(country).await {
                Ok(Some(items)) => {
                    found.insert(country.clone(), items);
                }
                Ok(None) => {}
                Err(error) => debug!(country = %country, %error, "newsapi lookup failed"),
            }
        }
        Ok(found)
    }
}

impl DataSource for NewsApiSource {
    type Item = Vec<NewsItem>;

    fn name(&self) -> &str {
        "newsapi"
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }

    fn fetch_one<'a>(&'a self, id: &'a str) -> SourceFuture<'a, Option<Vec<NewsItem>>> {
        Box::pin(self.cached_headlines(id))
    }

    fn fetch_many<'a>(&'a self, ids: &'a [String]) -> SourceFuture<'a, ItemMap<Vec<NewsItem>>> {
        Box::pin(self.collect_headlines(ids))
    }
}

fn country_domains(country: &str) -> Option<&'static str> {
    match country {
        "US" => Some("wsj.com,bloomberg.com,cnbc.com"),
        "GB" => Some("bbc.co.uk,ft.com"),
        "CA" => Some("bnn.ca,theglobeandmail.com"),
        _ => None,
    }
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[derive(Debug, Deserialize)]
struct EverythingResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::http_client::{CannedHttpClient, HttpResponse};
    use crate::Direction;

    const BASE: &str = "https://newsapi.test/v2";

    fn source(client: &CannedHttpClient) -> NewsApiSource {
        let policy =
            CachePolicy::new(NEWSAPI_DEFAULT_TTL).with_clock(Arc::new(ManualClock::new()));
        NewsApiSource::with_cache_policy(
            Arc::new(client.clone()),
            Some(String::from("news-key")),
            policy,
        )
        .with_base_url(BASE)
        .with_watchlist(Symbol::parse_list("AAPL,NVDA").expect("symbols"))
    }

    fn articles(count: usize) -> String {
        let articles = (0..count)
            .map(|index| {
                format!(r#"{{"title":"Headline {index}","description":"Description {index}"}}"#)
            })
            .collect::<Vec<_>>()
            .join(",");
        format!(r#"{{"status":"ok","articles":[{articles}]}}"#)
    }

    #[test]
    fn unavailable_without_key() {
        let source = NewsApiSource::new(Arc::new(CannedHttpClient::new()), None);
        assert!(!source.is_available());
    }

    #[tokio::test]
    async fn keeps_at_most_five_complete_articles() {
        let client = CannedHttpClient::new()
            .respond(format!("{BASE}/everything"), HttpResponse::ok_json(articles(8)));
        let news = source(&client);

        let items = news
            .fetch_one("FR")
            .await
            .expect("fetch succeeds")
            .expect("headlines present");

        assert_eq!(items.len(), 5);
        assert_eq!(items[0].headline, "Headline 0");
        let request = &client.requests()[0];
        assert_eq!(
            request.headers.get("x-api-key").map(String::as_str),
            Some("news-key")
        );
        assert!(!request.full_url().contains("domains="));
    }

    #[tokio::test]
    async fn known_country_filters_by_domain() {
        let client = CannedHttpClient::new()
            .respond(format!("{BASE}/everything"), HttpResponse::ok_json(articles(1)));
        let news = source(&client);

        news.fetch_one("GB").await.expect("fetch succeeds");

        assert!(client.requests()[0]
            .full_url()
            .ends_with("&domains=bbc.co.uk%2Cft.com"));
    }

    #[tokio::test]
    async fn truncates_and_tags_impact() {
        let long_title = format!("NVDA surges {}", "x".repeat(200));
        let body = format!(
            r#"{{"status":"ok","articles":[{{"title":"{long_title}","description":"Chip demand"}},{{"title":"No description","description":""}}]}}"#
        );
        let client = CannedHttpClient::new()
            .respond(format!("{BASE}/everything"), HttpResponse::ok_json(body));
        let news = source(&client);

        let items = news
            .fetch_one("US")
            .await
            .expect("fetch succeeds")
            .expect("headlines present");

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].headline.chars().count(), 100);
        assert_eq!(items[0].impact.get("NVDA"), Some(&Direction::Up));
    }

    #[tokio::test]
    async fn no_articles_means_not_found() {
        let client = CannedHttpClient::new()
            .respond(format!("{BASE}/everything"), HttpResponse::ok_json(articles(0)));
        let news = source(&client);

        assert_eq!(news.fetch_one("US").await.expect("not an error"), None);
    }

    #[tokio::test]
    async fn rate_limited_error_code_without_cache_yields_nothing() {
        let client = CannedHttpClient::new().respond(
            format!("{BASE}/everything"),
            HttpResponse::new(
                429,
                r#"{"status":"error","code":"rateLimited","message":"You have made too many requests recently."}"#,
            ),
        );
        let news = source(&client);

        assert_eq!(news.fetch_one("US").await.expect("absorbed"), None);
    }

    #[tokio::test]
    async fn error_status_body_is_not_found() {
        let client = CannedHttpClient::new().respond(
            format!("{BASE}/everything"),
            HttpResponse::new(
                401,
                r#"{"status":"error","code":"apiKeyInvalid","message":"Your API key is invalid."}"#,
            ),
        );
        let news = source(&client);

        assert_eq!(news.fetch_one("US").await.expect("not an error"), None);
    }
}
