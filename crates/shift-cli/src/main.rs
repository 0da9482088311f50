//! shift CLI
//!
//! Command-line interface for applying, reverting and scaffolding SQL schema
//! migrations.

use clap::Parser;
use std::process::ExitCode;

mod cli;
mod commands;
mod output;

use cli::Cli;
use output::{CommandResult, OutputFormat};

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.json);

    let format = OutputFormat::from_json_flag(cli.json);
    match cli.execute().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let result: CommandResult<()> = CommandResult::failure(format!("{e:#}"));
            if let Err(print_err) = result.print(format) {
                eprintln!("{e:#} ({print_err})");
            }
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing/logging based on verbosity and format.
///
/// Events go to stderr so command output on stdout stays parseable.
fn init_tracing(verbose: u8, json: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    let subscriber = tracing_subscriber::registry().with(filter);

    if json {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(verbose > 1)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
