//! Drives a shared dispatcher's virtual clock from tokio time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify, RwLock};
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, info};

use crate::dispatcher::Dispatch;

/// A dispatcher shared between the executor and its callers.
///
/// Every operation, including timer firing, runs while holding the lock,
/// so the engine only ever sees one caller at a time.
pub type SharedDispatch = Arc<Mutex<Dispatch>>;

/// Configuration for the realtime executor.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Tick interval for polling timers.
    pub tick_interval_ms: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunMode {
    UntilStopped,
    UntilIdle,
}

/// Fires completion timers as wall-clock time passes.
///
/// The executor maps tokio time onto the dispatcher's virtual clock at each
/// tick, so the engine clock trails real time by at most one tick.
#[derive(Debug)]
pub struct RealtimeExecutor {
    config: ExecutorConfig,
    dispatch: SharedDispatch,
    running: Arc<RwLock<bool>>,
    /// Holds a stop request until a run loop observes it.
    shutdown: Arc<Notify>,
}

impl RealtimeExecutor {
    /// Create a new executor for `dispatch`.
    #[must_use]
    pub fn new(config: ExecutorConfig, dispatch: SharedDispatch) -> Self {
        Self {
            config,
            dispatch,
            running: Arc::new(RwLock::new(false)),
            shutdown: Arc::new(Notify::new()),
        }
    }

    /// Handle to the shared dispatcher.
    #[must_use]
    pub fn dispatch(&self) -> SharedDispatch {
        Arc::clone(&self.dispatch)
    }

    /// Run until `stop()` is called.
    ///
    /// Returns the number of orders completed while running.
    pub async fn start(&self) -> usize {
        self.run(RunMode::UntilStopped).await
    }

    /// Run until no order is in flight, or `stop()` is called.
    ///
    /// Returns the number of orders completed while running.
    pub async fn drain(&self) -> usize {
        self.run(RunMode::UntilIdle).await
    }

    /// Stop the executor.
    ///
    /// A request made before the run loop starts is kept, so that run ends
    /// at its first tick.
    pub fn stop(&self) {
        self.shutdown.notify_one();
    }

    /// Check if the executor is running.
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    async fn run(&self, mode: RunMode) -> usize {
        {
            let mut running = self.running.write().await;
            if *running {
                return 0;
            }
            *running = true;
        }

        info!(?mode, "Realtime executor starting");

        let origin = Instant::now();
        let base = self.dispatch.lock().await.now();
        let mut ticker = interval(Duration::from_millis(self.config.tick_interval_ms.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut completed = 0usize;

        loop {
            tokio::select! {
                biased;
                () = self.shutdown.notified() => break,
                _ = ticker.tick() => {}
            }

            let mut dispatch = self.dispatch.lock().await;
            let fired = dispatch.advance_to(base.saturating_add(origin.elapsed()));
            if !fired.is_empty() {
                debug!(count = fired.len(), at = ?dispatch.now(), "Completions fired");
            }
            completed = completed.saturating_add(fired.len());

            if mode == RunMode::UntilIdle && dispatch.in_flight() == 0 {
                break;
            }
        }

        *self.running.write().await = false;
        info!(completed, "Realtime executor stopped");
        completed
    }
}
