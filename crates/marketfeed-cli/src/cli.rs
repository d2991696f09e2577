//! CLI argument definitions for marketfeed.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `quote` | Quote one or more symbols |
//! | `watchlist` | Quote the market's whole watchlist |
//! | `news` | Financial headlines for the market |
//! | `sources` | Registered providers and market profile |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--format` | `json` | Output format (json, table) |
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--country` | environment or `US` | Market country code |
//! | `--mock` | `false` | Serve synthetic data only |
//! | `--ttl-secs` | per provider | Cache lifetime override |
//! | `--timeout-ms` | `15000` | Per-provider timeout |
//! | `--strict` | `false` | Fail when any value is synthetic |
//!
//! # Examples
//!
//! ```bash
//! marketfeed quote AAPL MSFT --pretty
//! marketfeed watchlist --country GB --format table
//! marketfeed news --mock --seed 7
//! ```

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Market quotes and headlines that keep flowing when providers do not.
#[derive(Debug, Parser)]
#[command(
    name = "marketfeed",
    author,
    version,
    about = "Resilient market quotes and headlines",
    long_about = "marketfeed aggregates free-tier market data providers behind a cache with \
stale fallback. When every provider fails, plausible synthetic values are served instead.\n\
\n\
Use 'marketfeed <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Output format for results.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Market country code (2 letters), overriding MARKETFEED_COUNTRY.
    #[arg(long, global = true)]
    pub country: Option<String>,

    /// Skip every network provider and serve synthetic data.
    #[arg(long, global = true, default_value_t = false)]
    pub mock: bool,

    /// Seed for reproducible synthetic data.
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Cache lifetime in seconds for every provider.
    #[arg(long, global = true)]
    pub ttl_secs: Option<u64>,

    /// Per-provider timeout in milliseconds.
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// Exit with code 5 when any returned value is synthetic.
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    /// Diagnostic log format on stderr. Filter with RUST_LOG.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON object output.
    Json,
    /// Human-readable summary.
    Table,
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Available CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Quote one or more symbols.
    ///
    /// # Examples
    ///
    ///   marketfeed quote AAPL
    ///   marketfeed quote SHOP.TO RY.TO --country CA
    Quote(QuoteArgs),

    /// Quote every symbol on the market's watchlist.
    Watchlist(WatchlistArgs),

    /// Financial headlines with per-symbol impact.
    News,

    /// Registered providers and the market profile.
    Sources,
}

/// Arguments for the `quote` command.
#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// One or more market symbols (e.g., AAPL, MSFT, VOD.L).
    #[arg(required = true, num_args = 1..)]
    pub symbols: Vec<String>,
}

/// Arguments for the `watchlist` command.
#[derive(Debug, Args)]
pub struct WatchlistArgs {
    /// Comma-separated symbols replacing the market's default watchlist.
    #[arg(long)]
    pub symbols: Option<String>,
}
