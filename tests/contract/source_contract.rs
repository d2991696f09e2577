use std::sync::Arc;

use marketfeed_core::{
    AlphaVantageSource, CannedHttpClient, DataSource, HttpClient, HttpError, HttpErrorKind,
    HttpResponse, NewsApiSource, Quote, YahooFinanceSource,
};

const YAHOO_BASE: &str = "https://contract.test/yahoo";
const ALPHA_BASE: &str = "https://contract.test/alpha";
const NEWS_BASE: &str = "https://contract.test/news";

struct QuoteCase {
    name: &'static str,
    source: Arc<dyn DataSource<Item = Quote>>,
}

fn quote_cases(client: &CannedHttpClient) -> Vec<QuoteCase> {
    let http: Arc<dyn HttpClient> = Arc::new(client.clone());
    vec![
        QuoteCase {
            name: "yahoo",
            source: Arc::new(YahooFinanceSource::new(Arc::clone(&http)).with_base_url(YAHOO_BASE)),
        },
        QuoteCase {
            name: "alphavantage",
            source: Arc::new(
                AlphaVantageSource::new(http, Some(String::from("contract-key")))
                    .with_base_url(ALPHA_BASE),
            ),
        },
    ]
}

fn requested(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| (*id).to_owned()).collect()
}

#[test]
fn quote_sources_report_stable_names_and_availability() {
    let client = CannedHttpClient::new();

    for case in quote_cases(&client) {
        assert_eq!(case.source.name(), case.name);
        assert!(
            case.source.is_available(),
            "source '{}' should be available",
            case.name
        );
    }
}

#[tokio::test]
async fn unknown_symbol_is_not_found_rather_than_an_error() {
    let client = CannedHttpClient::new();

    for case in quote_cases(&client) {
        let outcome = case.source.fetch_one("NOPE").await;
        assert_eq!(
            outcome,
            Ok(None),
            "source '{}': unknown symbol",
            case.name
        );
    }
}

#[tokio::test]
async fn batch_of_unknown_symbols_is_an_empty_map() {
    let client = CannedHttpClient::new();
    let ids = requested(&["NOPE", "NADA"]);

    for case in quote_cases(&client) {
        let found = case
            .source
            .fetch_many(&ids)
            .await
            .unwrap_or_else(|error| panic!("source '{}' batch failed: {error}", case.name));
        assert!(found.is_empty(), "source '{}': batch should be empty", case.name);
    }
}

#[tokio::test]
async fn throttled_source_without_cache_yields_nothing() {
    let client = CannedHttpClient::new()
        .respond(YAHOO_BASE, HttpResponse::new(429, "Too Many Requests"))
        .respond(ALPHA_BASE, HttpResponse::new(429, "Too Many Requests"));

    for case in quote_cases(&client) {
        let outcome = case.source.fetch_one("AAPL").await;
        assert_eq!(outcome, Ok(None), "source '{}': rate limit absorbed", case.name);
    }
}

#[tokio::test]
async fn transport_failure_is_reported_as_unavailable() {
    let client = CannedHttpClient::new()
        .fail(
            YAHOO_BASE,
            HttpError::new(HttpErrorKind::Connect, "connection refused"),
        )
        .fail(
            ALPHA_BASE,
            HttpError::new(HttpErrorKind::Connect, "connection refused"),
        );

    for case in quote_cases(&client) {
        let error = case
            .source
            .fetch_one("AAPL")
            .await
            .expect_err("transport failures are hard failures");
        assert_eq!(error.code(), "source.unavailable", "source '{}'", case.name);
    }
}

#[tokio::test]
async fn batch_only_contains_requested_symbols() {
    let yahoo_batch = r#"{"chart":{"result":[
        {"meta":{"symbol":"AAPL","regularMarketPrice":190.0,"previousClose":188.0}}
    ],"error":null}}"#;
    let alpha_quote = r#"{"Global Quote":{"01. symbol":"AAPL","05. price":"190.0000","09. change":"2.0000","10. change percent":"1.0638%"}}"#;
    let client = CannedHttpClient::new()
        .respond(YAHOO_BASE, HttpResponse::ok_json(yahoo_batch))
        .respond(
            format!("{ALPHA_BASE}?function=GLOBAL_QUOTE&symbol=AAPL&"),
            HttpResponse::ok_json(alpha_quote),
        );
    let ids = requested(&["AAPL", "MSFT"]);

    for case in quote_cases(&client) {
        let found = case
            .source
            .fetch_many(&ids)
            .await
            .unwrap_or_else(|error| panic!("source '{}' batch failed: {error}", case.name));

        assert!(
            found.keys().all(|symbol| ids.contains(symbol)),
            "source '{}': unexpected keys {:?}",
            case.name,
            found.keys().collect::<Vec<_>>()
        );
        assert_eq!(found["AAPL"].price, 190.0, "source '{}'", case.name);
    }
}

#[tokio::test]
async fn news_source_follows_the_same_contract() {
    let http: Arc<dyn HttpClient> = Arc::new(CannedHttpClient::new());
    let keyless = NewsApiSource::new(Arc::clone(&http), None);
    let keyed = NewsApiSource::new(http, Some(String::from("contract-key"))).with_base_url(NEWS_BASE);

    assert_eq!(keyed.name(), "newsapi");
    assert!(!keyless.is_available());
    assert!(keyed.is_available());
    assert_eq!(keyed.fetch_one("US").await, Ok(None));
    assert!(keyed
        .fetch_many(&requested(&["US", "GB"]))
        .await
        .expect("batch")
        .is_empty());
}
