use marketfeed_core::MarketFeed;

use crate::error::CliError;

use super::CommandResult;

pub fn run(feed: &MarketFeed) -> Result<CommandResult, CliError> {
    let summary = feed.summary();

    let mut warnings = Vec::new();
    if !summary.has_real_data {
        warnings.push(String::from(
            "no network providers registered; every value is synthetic",
        ));
    }
    if summary.fallback_market {
        warnings.push(format!(
            "{} has no dedicated market profile; using the global watchlist",
            summary.country
        ));
    }

    let data = serde_json::to_value(summary)?;
    Ok(CommandResult::ok(data).with_warnings(warnings))
}
