#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # Botline
//!
//! Order dispatch for a pool of cooking bots, with VIP priority.
//!
//! This library re-exports the workspace crates and hosts the load
//! simulation driven by the `botline` binary.

pub use botline_core;
pub use dispatch;

pub mod cli;
pub mod simulation;

pub use simulation::{Drain, Settings, SimulationConfig, Summary};
