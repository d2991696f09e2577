use serde::Serialize;

use marketfeed_core::{MarketFeed, NewsItem};

use crate::error::CliError;

use super::{served_label, CommandResult};

#[derive(Debug, Serialize)]
struct NewsResponseData<'a> {
    country: &'a str,
    served_by: &'a str,
    headlines: &'a [NewsItem],
}

pub async fn run(feed: &MarketFeed) -> Result<CommandResult, CliError> {
    let resolution = feed.news_report().await;
    let generated = resolution.served_by.is_fallback();

    let data = serde_json::to_value(NewsResponseData {
        country: &feed.profile().country,
        served_by: served_label(&resolution.served_by),
        headlines: &resolution.data,
    })?;

    Ok(CommandResult::ok(data)
        .with_attempts(&resolution.attempts, generated)
        .with_latency(resolution.latency_ms)
        .with_generated(usize::from(generated)))
}
