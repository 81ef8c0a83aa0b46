//! The dispatch engine: order submission, bot assignment and completion.
//!
//! One [`Dispatch`] value owns the bot registry, the pending queue, the
//! completed log and the completion timers. Every operation runs to the end
//! before the next one starts; completion timers fire only when the virtual
//! clock is advanced, so hires, retirements and submissions can interleave
//! with in-flight work.

use std::time::Duration;

use botline_core::{OptionExt, ResultExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::DispatchConfig;
use crate::queue::PendingQueue;
use crate::registry::{BotIdSource, BotRegistry, UuidIdSource};
use crate::timers::{CompletionTimer, CompletionTimers};
use crate::types::{Bot, BotId, BotStatus, Order, OrderId};
use crate::{Error, Result};

/// One order handed to one bot during an assignment pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub bot_id: BotId,
    pub order_id: OrderId,
}

/// Matches pending orders to idle bots.
#[derive(Debug)]
pub struct Dispatch {
    config: DispatchConfig,
    registry: BotRegistry,
    pending: PendingQueue,
    completed: Vec<Order>,
    timers: CompletionTimers,
    /// Virtual time since the engine was created.
    clock: Duration,
    next_order_number: u64,
}

impl Dispatch {
    /// Create an engine with random bot ids.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if the configuration is invalid.
    pub fn new(config: DispatchConfig) -> Result<Self> {
        Self::with_id_source(config, Box::new(UuidIdSource))
    }

    /// Create an engine drawing bot ids from `ids`.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if the configuration is invalid.
    pub fn with_id_source(config: DispatchConfig, ids: Box<dyn BotIdSource>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            registry: BotRegistry::new(ids),
            pending: PendingQueue::new(),
            completed: Vec::new(),
            timers: CompletionTimers::new(),
            clock: Duration::ZERO,
            next_order_number: 1,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Current virtual time.
    #[must_use]
    pub const fn now(&self) -> Duration {
        self.clock
    }

    // ------------------------------------------------------------------
    // Bots
    // ------------------------------------------------------------------

    /// Hire a bot and let it pick up pending work.
    pub fn hire(&mut self) -> BotId {
        let bot_id = self.registry.hire();
        info!(bot_id = %bot_id, bots = self.registry.len(), "New bot added");
        self.assign_pending();
        bot_id
    }

    /// Retire the most recently hired bot.
    ///
    /// An in-flight order has its completion timer cancelled and goes back
    /// to the pending queue under its original id and priority. Returns
    /// `None` when there is no bot to retire.
    pub fn retire(&mut self) -> Option<BotId> {
        let mut bot = self.registry.pop()?;
        let bot_id = bot.id();
        info!(bot_id = %bot_id, bots = self.registry.len(), "Last bot deleted");

        if let Some(task) = bot.release() {
            self.timers.cancel(&task.timer);
            info!(
                bot_id = %bot_id,
                order_id = %task.order.id(),
                "Returning in-flight order to the pending queue"
            );
            self.enqueue(task.order);
        }

        Some(bot_id)
    }

    /// All bots, or only those with the given status, in hiring order.
    #[must_use]
    pub fn bots(&self, status: Option<BotStatus>) -> Vec<&Bot> {
        self.registry.query(status)
    }

    #[must_use]
    pub fn bot(&self, bot_id: &BotId) -> Option<&Bot> {
        self.registry.get(bot_id)
    }

    #[must_use]
    pub fn bot_count(&self) -> usize {
        self.registry.len()
    }

    // ------------------------------------------------------------------
    // Orders
    // ------------------------------------------------------------------

    /// Submit a normal order, or re-submit `order`.
    ///
    /// A re-submitted order is queued by its own priority class.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` if a supplied order cannot be
    /// re-submitted (see [`Dispatch::check_resubmission`]).
    pub fn submit_normal(&mut self, order: Option<Order>) -> Result<OrderId> {
        self.submit(order, false)
    }

    /// Submit a VIP order, or re-submit `order`.
    ///
    /// A re-submitted order is queued by its own priority class.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` if a supplied order cannot be
    /// re-submitted (see [`Dispatch::check_resubmission`]).
    pub fn submit_vip(&mut self, order: Option<Order>) -> Result<OrderId> {
        self.submit(order, true)
    }

    fn submit(&mut self, order: Option<Order>, is_vip: bool) -> Result<OrderId> {
        let order = match order {
            Some(order) => {
                self.check_resubmission(&order)?;
                order
            }
            None => self.allocate(is_vip),
        };
        Ok(self.enqueue(order))
    }

    /// Check that `order` may go back into the pending queue.
    ///
    /// It must have been issued by this engine, must not be complete, and
    /// must not already sit in the queue, on a bot or in the completed log.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidState` describing the first violated rule.
    pub fn check_resubmission(&self, order: &Order) -> Result<()> {
        let id = order.id();
        let reason = if order.is_complete() {
            Some("is already complete")
        } else if id.number() == 0 || id.number() >= self.next_order_number {
            Some("was not issued by this dispatcher")
        } else if self.pending.contains(id) {
            Some("is already pending")
        } else if self.registry.holding(id).is_some() {
            Some("is assigned to a bot")
        } else if self.completed.iter().any(|done| done.id() == id) {
            Some("is in the completed log")
        } else {
            None
        };

        match reason {
            Some(reason) => {
                warn!(order_id = %id, reason, "Re-submission rejected");
                Err(Error::invalid_state(format!("order {id} {reason}")))
            }
            None => Ok(()),
        }
    }

    fn allocate(&mut self, is_vip: bool) -> Order {
        let id = OrderId::new(self.next_order_number);
        self.next_order_number = self.next_order_number.saturating_add(1);
        Order::new(id, is_vip)
    }

    fn enqueue(&mut self, order: Order) -> OrderId {
        let order_id = order.id();
        let kind = order.kind();
        let position = self.pending.insert(order);
        info!(
            order_id = %order_id,
            kind = kind.label(),
            position,
            at = ?self.clock,
            "Order submitted"
        );
        self.assign_pending();
        order_id
    }

    /// Hand queued orders to idle bots.
    ///
    /// A single pass over the bots that are idle when the pass starts, in
    /// hiring order: each takes the head of the queue until the queue runs
    /// dry. Every assignment schedules a completion after the configured
    /// processing time.
    pub fn assign_pending(&mut self) -> Vec<Assignment> {
        if self.pending.is_empty() {
            debug!("No pending orders to assign");
            return Vec::new();
        }

        let Self {
            config,
            registry,
            pending,
            timers,
            clock,
            ..
        } = self;
        let now = *clock;
        let execute_at = now.saturating_add(config.processing_time());
        let mut assignments = Vec::new();

        for bot in registry.iter_mut().filter(|bot| bot.is_idle()) {
            let Some(order) = pending.pop_front() else {
                break;
            };
            let assignment = Assignment {
                bot_id: bot.id(),
                order_id: order.id(),
            };
            let timer = timers.schedule(assignment.bot_id, assignment.order_id, execute_at);
            info!(
                order_id = %assignment.order_id,
                bot_id = %assignment.bot_id,
                at = ?now,
                pending = pending.len(),
                "Order assigned"
            );
            bot.assign(order, timer);
            assignments.push(assignment);
        }

        if assignments.is_empty() {
            debug!(pending = self.pending.len(), "No idle bots available");
        }
        assignments
    }

    /// Complete the order held by `bot_id`, free the bot and reassign.
    ///
    /// # Errors
    ///
    /// Returns `Error::BotNotFound` for an unknown bot and
    /// `Error::InvalidState` if the bot has no assigned order.
    pub fn complete_order(&mut self, bot_id: BotId) -> Result<OrderId> {
        let bot = self.registry.get_mut(&bot_id).or_bot_not_found(bot_id)?;
        let Some(task) = bot.release() else {
            warn!(bot_id = %bot_id, "Completion requested for an idle bot");
            return Err(Error::invalid_state(format!(
                "bot {bot_id} has no assigned order"
            )));
        };

        // Manual completion ahead of the timer must not leave it armed.
        self.timers.cancel(&task.timer);

        let mut order = task.order;
        order.mark_complete();
        let order_id = order.id();
        info!(
            order_id = %order_id,
            bot_id = %bot_id,
            at = ?self.clock,
            "Order has been marked as completed"
        );
        self.completed.push(order);

        self.assign_pending();
        Ok(order_id)
    }

    /// Orders waiting for a bot, head first.
    #[must_use]
    pub fn pending_orders(&self) -> Vec<&Order> {
        self.pending.iter().collect()
    }

    /// Completed orders in completion order.
    #[must_use]
    pub fn completed_orders(&self) -> &[Order] {
        &self.completed
    }

    // ------------------------------------------------------------------
    // Clock
    // ------------------------------------------------------------------

    /// Number of orders currently being processed.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.timers.pending_count()
    }

    /// Virtual time of the next completion, if any order is in flight.
    #[must_use]
    pub fn next_due(&self) -> Option<Duration> {
        self.timers.peek_next()
    }

    /// Move the clock forward by `by`, firing every completion in between.
    ///
    /// Returns the completed order ids in completion order.
    pub fn advance(&mut self, by: Duration) -> Vec<OrderId> {
        self.advance_to(self.clock.saturating_add(by))
    }

    /// Move the clock forward to `target`, firing every completion up to it.
    ///
    /// Each completion runs at its own due time, so work picked up by the
    /// freed bot is timed from that moment. A target in the past is a no-op.
    pub fn advance_to(&mut self, target: Duration) -> Vec<OrderId> {
        let mut completed = Vec::new();

        while let Some(timer) = self.timers.pop_due(target) {
            self.clock = self.clock.max(timer.execute_at());
            if let Some(order_id) = self.fire(&timer) {
                completed.push(order_id);
            }
        }

        self.clock = self.clock.max(target);
        completed
    }

    /// Advance until no order is in flight.
    pub fn run_until_idle(&mut self) -> Vec<OrderId> {
        let mut completed = Vec::new();
        while let Some(next) = self.next_due() {
            completed.extend(self.advance_to(next));
        }
        completed
    }

    fn fire(&mut self, timer: &CompletionTimer) -> Option<OrderId> {
        let current = self
            .registry
            .get(&timer.bot_id())
            .and_then(Bot::completion)
            .is_some_and(|handle| handle == timer.id());
        if !current {
            debug!(timer_id = %timer.id(), order_id = %timer.order_id(), "Discarding stale timer");
            return None;
        }

        self.complete_order(timer.bot_id()).into_option_logged()
    }
}
