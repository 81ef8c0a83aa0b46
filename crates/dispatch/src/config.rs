//! Configuration for the dispatch engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Configuration for the dispatch engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Time a bot needs to process one order, in milliseconds.
    #[serde(default = "default_processing_ms")]
    pub processing_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            processing_ms: default_processing_ms(),
        }
    }
}

impl DispatchConfig {
    /// Create a new dispatch config with defaults.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            processing_ms: 10_000,
        }
    }

    /// Set the processing time per order.
    #[must_use]
    pub const fn with_processing_ms(mut self, processing_ms: u64) -> Self {
        self.processing_ms = processing_ms;
        self
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if the processing time is zero.
    pub fn validate(&self) -> Result<()> {
        if self.processing_ms == 0 {
            return Err(Error::invalid_config(
                "processing_ms must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Delay between assigning an order and completing it.
    #[must_use]
    pub const fn processing_time(&self) -> Duration {
        Duration::from_millis(self.processing_ms)
    }
}

fn default_processing_ms() -> u64 {
    10_000 // 10 seconds
}
