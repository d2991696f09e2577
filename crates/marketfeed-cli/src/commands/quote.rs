use serde::Serialize;

use marketfeed_core::{MarketFeed, Quote, Symbol};

use crate::cli::QuoteArgs;
use crate::error::CliError;

use super::{served_label, CommandResult};

#[derive(Debug, Serialize)]
struct QuoteEntry<'a> {
    served_by: &'a str,
    #[serde(flatten)]
    quote: Quote,
}

#[derive(Debug, Serialize)]
struct QuoteResponseData<'a> {
    quotes: Vec<QuoteEntry<'a>>,
}

pub async fn run(args: &QuoteArgs, feed: &MarketFeed) -> Result<CommandResult, CliError> {
    let symbols = args
        .symbols
        .iter()
        .map(|raw| Symbol::parse(raw))
        .collect::<Result<Vec<_>, _>>()?;

    // A single symbol walks the whole chain; several go through the batch path.
    if let [symbol] = symbols.as_slice() {
        let resolution = feed.stock_report(symbol.as_str()).await?;
        let generated = resolution.served_by.is_fallback();
        let data = serde_json::to_value(QuoteResponseData {
            quotes: vec![QuoteEntry {
                served_by: served_label(&resolution.served_by),
                quote: resolution.data.clone(),
            }],
        })?;

        return Ok(CommandResult::ok(data)
            .with_attempts(&resolution.attempts, generated)
            .with_latency(resolution.latency_ms)
            .with_generated(usize::from(generated)));
    }

    let resolution = feed.stocks_report(&symbols).await;
    let generated_count = resolution.generated_count();
    let quotes = resolution
        .items
        .iter()
        .zip(&resolution.served_by)
        .map(|(quote, served_by)| QuoteEntry {
            served_by: served_label(served_by),
            quote: quote.clone(),
        })
        .collect();
    let data = serde_json::to_value(QuoteResponseData { quotes })?;

    Ok(CommandResult::ok(data)
        .with_attempts(resolution.attempt.iter(), generated_count > 0)
        .with_latency(resolution.latency_ms)
        .with_generated(generated_count))
}
