//! # Dispatch
//!
//! Matches orders to a pool of interchangeable bots.
//!
//! - [`PendingQueue`]: VIP orders ahead of normal orders, FIFO within a class
//! - [`BotRegistry`]: hire appends, retire pops the most recent bot
//! - [`CompletionTimers`]: cancellable per-assignment completion timers
//! - [`Dispatch`]: the engine tying them together on a virtual clock
//! - [`RealtimeExecutor`]: drives the virtual clock from tokio time
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use dispatch::{Dispatch, DispatchConfig};
//!
//! let mut dispatch = Dispatch::new(DispatchConfig::default())?;
//! dispatch.hire();
//! let order = dispatch.submit_vip(None)?;
//!
//! let completed = dispatch.advance(Duration::from_secs(10));
//! assert_eq!(completed, vec![order]);
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::expect_used)]

mod config;
mod dispatcher;
mod queue;
mod registry;
mod timers;
mod types;

pub use botline_core::{Error, Result};
pub use config::DispatchConfig;
pub use dispatcher::{Assignment, Dispatch};
pub use queue::PendingQueue;
pub use registry::{BotIdSource, BotRegistry, SequentialIdSource, UuidIdSource};
pub use timers::{
    CompletionTimer, CompletionTimers, ExecutorConfig, RealtimeExecutor, SharedDispatch, TimerId,
};
pub use types::{Bot, BotId, BotStatus, Order, OrderId, OrderKind, OrderStatus};
