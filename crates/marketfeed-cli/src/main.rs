mod cli;
mod commands;
mod error;
mod metadata;
mod output;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::{Cli, LogFormat};
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    match run(&cli).await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Text => registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init(),
    }
}

async fn run(cli: &Cli) -> Result<ExitCode, CliError> {
    let envelope = commands::run(cli).await?;
    output::render(&envelope, cli.format, cli.pretty)?;
    Ok(ExitCode::SUCCESS)
}
