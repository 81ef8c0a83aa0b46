//! CLI argument definitions using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::PathBuf;

use botline_core::Result;
use clap::Parser;

use crate::simulation::{Drain, Settings};

/// Botline - order dispatch simulation
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "botline")]
#[command(version)]
#[command(about = "Simulates a pool of cooking bots serving normal and VIP orders")]
#[command(
    long_about = "Botline hires a starting pool of bots, plays a random mix of hires, retirements and order submissions against the dispatcher, waits for every accepted order to finish and prints a summary."
)]
pub struct Cli {
    /// Bots hired before the random calls start
    #[arg(long)]
    pub initial_bots: Option<usize>,

    /// Processing time per order in milliseconds
    #[arg(long)]
    pub processing_ms: Option<u64>,

    /// Seed for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,

    /// Skip real-time waiting and jump straight to the last completion
    #[arg(long, default_value_t = false)]
    pub fast: bool,

    /// Print the summary as JSON
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// TOML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Resolve the settings for this run: file values first, then flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be loaded or the
    /// resulting settings are invalid.
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };

        if let Some(initial_bots) = self.initial_bots {
            settings.simulation.initial_bots = initial_bots;
        }
        if let Some(processing_ms) = self.processing_ms {
            settings.dispatch.processing_ms = processing_ms;
        }

        settings.validate()?;
        Ok(settings)
    }

    #[must_use]
    pub const fn drain(&self) -> Drain {
        if self.fast {
            Drain::Instant
        } else {
            Drain::Realtime
        }
    }
}
