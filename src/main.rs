//! # Botline - order dispatch simulation
//!
//! Hires a starting pool of bots, plays a random mix of hires, retirements
//! and order submissions against the dispatcher, then waits for every
//! accepted order to finish and prints a summary.
//!
//! Logs go to stderr so `--json` output on stdout stays machine readable.
//! Set `RUST_LOG=debug` to see every assignment pass.

#![forbid(unsafe_code)]
#![forbid(clippy::unwrap_used)]
#![forbid(clippy::panic)]
#![deny(clippy::expect_used)]

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use botline::cli::Cli;
use botline::simulation;

#[tokio::main]
async fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();

    init_tracing();

    info!("START ORDER MANAGEMENT SYSTEM");

    let settings = cli
        .settings()
        .context("Failed to resolve settings from flags and config file")?;

    let summary = simulation::run(&settings, cli.seed, cli.drain())
        .await
        .context("Simulation failed")?;

    if cli.json {
        let json =
            serde_json::to_string_pretty(&summary).context("Failed to serialise summary")?;
        println!("{json}");
    } else {
        println!("\n{summary}");
    }

    info!("Finished in {:?}", start_time.elapsed());
    Ok(())
}

/// Initialize tracing subscriber with environment filter.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
