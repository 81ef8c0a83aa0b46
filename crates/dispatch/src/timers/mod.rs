//! Completion timers for in-flight orders.
//!
//! Every assignment schedules one timer that completes the order after the
//! configured processing time. Timers run against the dispatcher's virtual
//! clock, which is advanced either explicitly or by the realtime executor.
//!
//! # Key Types
//!
//! - `CompletionTimer`: when and for which bot/order a completion fires
//! - `CompletionTimers`: schedules, cancels and pops due timers
//! - `RealtimeExecutor`: advances a shared dispatcher with tokio time

mod executor;
mod scheduler;

pub use executor::{ExecutorConfig, RealtimeExecutor, SharedDispatch};
pub use scheduler::{CompletionTimer, CompletionTimers, TimerId};
