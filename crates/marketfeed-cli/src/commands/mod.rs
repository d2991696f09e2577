mod news;
mod quote;
mod sources;
mod watchlist;

use std::time::Duration;

use marketfeed_core::{AttemptOutcome, FeedConfig, MarketFeed, ProviderAttempt, ServedBy, Symbol};
use serde_json::Value;
use tracing::debug;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::metadata::{Envelope, Metadata};

/// Name reported in `source_chain` for synthetic values.
const GENERATED_SOURCE: &str = "default";

pub struct CommandResult {
    pub data: Value,
    pub warnings: Vec<String>,
    pub latency_ms: u64,
    pub source_chain: Vec<String>,
    pub generated_count: usize,
}

impl CommandResult {
    pub fn ok(data: Value) -> Self {
        Self {
            data,
            warnings: Vec::new(),
            latency_ms: 0,
            source_chain: Vec::new(),
            generated_count: 0,
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_generated(mut self, generated_count: usize) -> Self {
        self.generated_count = generated_count;
        self
    }

    /// Records the attempts and, when anything was generated, the
    /// synthetic source at the end of the chain.
    pub fn with_attempts<'a>(
        mut self,
        attempts: impl IntoIterator<Item = &'a ProviderAttempt>,
        generated: bool,
    ) -> Self {
        for attempt in attempts {
            self.source_chain.push(attempt.provider.clone());
            if let Some(warning) = attempt_warning(attempt) {
                self.warnings.push(warning);
            }
        }
        if generated {
            self.source_chain.push(String::from(GENERATED_SOURCE));
        }
        self
    }
}

pub async fn run(cli: &Cli) -> Result<Envelope<Value>, CliError> {
    let mut config = build_config(cli)?;
    if let Command::Watchlist(args) = &cli.command {
        if let Some(symbols) = &args.symbols {
            config = config.with_watchlist(Symbol::parse_list(symbols)?);
        }
    }
    let feed = MarketFeed::from_config(&config)?;
    debug!(country = %feed.profile().country, "feed ready");

    let result = match &cli.command {
        Command::Quote(args) => quote::run(args, &feed).await?,
        Command::Watchlist(_) => watchlist::run(&feed).await?,
        Command::News => news::run(&feed).await?,
        Command::Sources => sources::run(&feed)?,
    };

    let CommandResult {
        data,
        warnings,
        latency_ms,
        source_chain,
        generated_count,
    } = result;

    if cli.strict && generated_count > 0 {
        return Err(CliError::StrictModeViolation { generated_count });
    }

    let mut meta = Metadata::new(source_chain, latency_ms, generated_count);
    for warning in warnings {
        meta.push_warning(warning);
    }

    Ok(Envelope { meta, data })
}

/// Environment first, then command-line overrides.
fn build_config(cli: &Cli) -> Result<FeedConfig, CliError> {
    let mut config = FeedConfig::from_env()?;

    if let Some(country) = &cli.country {
        config = config.with_country(country)?;
    }
    if cli.mock {
        config = config.with_real_data(false);
    }
    if let Some(seed) = cli.seed {
        config = config.with_synthetic_seed(seed);
    }
    if let Some(secs) = cli.ttl_secs {
        config = config.with_cache_ttl(Duration::from_secs(secs));
    }
    if let Some(millis) = cli.timeout_ms {
        config = config.with_provider_timeout(Duration::from_millis(millis));
    }

    config.validate()?;
    Ok(config)
}

fn attempt_warning(attempt: &ProviderAttempt) -> Option<String> {
    match &attempt.outcome {
        AttemptOutcome::Served | AttemptOutcome::Empty => None,
        AttemptOutcome::Failed(error) => Some(format!(
            "{} failed ({}): {}",
            attempt.provider,
            error.code(),
            error.message()
        )),
        AttemptOutcome::TimedOut(timeout) => Some(format!(
            "{} timed out after {}ms",
            attempt.provider,
            timeout.as_millis()
        )),
    }
}

fn served_label(served_by: &ServedBy) -> &str {
    match served_by {
        ServedBy::Provider(name) => name.as_str(),
        ServedBy::Fallback => GENERATED_SOURCE,
    }
}
