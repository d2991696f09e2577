use serde::Serialize;

use marketfeed_core::{MarketFeed, Quote};

use crate::error::CliError;

use super::{served_label, CommandResult};

#[derive(Debug, Serialize)]
struct WatchlistEntry<'a> {
    served_by: &'a str,
    #[serde(flatten)]
    quote: &'a Quote,
}

#[derive(Debug, Serialize)]
struct WatchlistResponseData<'a> {
    country: &'a str,
    currency: &'a str,
    indexes: &'a [String],
    quotes: Vec<WatchlistEntry<'a>>,
}

pub async fn run(feed: &MarketFeed) -> Result<CommandResult, CliError> {
    let resolution = feed.stocks_report(feed.watchlist()).await;
    let generated_count = resolution.generated_count();
    let profile = feed.profile();

    let quotes = resolution
        .items
        .iter()
        .zip(&resolution.served_by)
        .map(|(quote, served_by)| WatchlistEntry {
            served_by: served_label(served_by),
            quote,
        })
        .collect();
    let data = serde_json::to_value(WatchlistResponseData {
        country: &profile.country,
        currency: &profile.currency,
        indexes: &profile.indexes,
        quotes,
    })?;

    Ok(CommandResult::ok(data)
        .with_attempts(resolution.attempt.iter(), generated_count > 0)
        .with_latency(resolution.latency_ms)
        .with_generated(generated_count))
}
