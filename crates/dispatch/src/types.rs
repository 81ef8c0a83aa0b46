//! Bots, orders and their identifiers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::timers::TimerId;

/// Opaque unique identifier for a bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BotId(Uuid);

impl BotId {
    /// Create a new random bot ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from a UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for BotId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sequence-derived order identifier, shared by normal and VIP orders.
///
/// Displayed zero-padded, e.g. `#00042`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(u64);

impl OrderId {
    /// Create an order ID from its sequence number.
    #[must_use]
    pub const fn new(number: u64) -> Self {
        Self(number)
    }

    /// Get the sequence number.
    #[must_use]
    pub const fn number(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:05}", self.0)
    }
}

/// Whether a bot is working.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BotStatus {
    /// No assigned order.
    Idle,
    /// Processing an assigned order.
    Busy,
}

/// Lifecycle of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    /// Waiting in the queue or being processed.
    Pending,
    /// Processed by a bot.
    Complete,
}

/// Priority class of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderKind {
    Normal,
    Vip,
}

impl OrderKind {
    /// Label used in logs and reports.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Vip => "VIP",
        }
    }
}

/// A unit of work submitted to the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    id: OrderId,
    status: OrderStatus,
    is_vip: bool,
}

impl Order {
    /// Create a pending order.
    ///
    /// Orders are normally allocated by the dispatcher; building one by hand
    /// is only meaningful for re-submitting an order the dispatcher issued.
    #[must_use]
    pub const fn new(id: OrderId, is_vip: bool) -> Self {
        Self {
            id,
            status: OrderStatus::Pending,
            is_vip,
        }
    }

    #[must_use]
    pub const fn id(&self) -> OrderId {
        self.id
    }

    #[must_use]
    pub const fn status(&self) -> OrderStatus {
        self.status
    }

    #[must_use]
    pub const fn is_vip(&self) -> bool {
        self.is_vip
    }

    #[must_use]
    pub const fn kind(&self) -> OrderKind {
        if self.is_vip {
            OrderKind::Vip
        } else {
            OrderKind::Normal
        }
    }

    #[must_use]
    pub const fn is_complete(&self) -> bool {
        matches!(self.status, OrderStatus::Complete)
    }

    pub(crate) fn mark_complete(&mut self) {
        self.status = OrderStatus::Complete;
    }
}

/// An order in progress together with the timer that will complete it.
#[derive(Debug, Clone)]
pub(crate) struct Task {
    pub(crate) order: Order,
    pub(crate) timer: TimerId,
}

/// A worker that processes one order at a time.
///
/// Busy exactly when it holds a task, so the order and the completion
/// handle are always present together.
#[derive(Debug, Clone)]
pub struct Bot {
    id: BotId,
    task: Option<Task>,
}

impl Bot {
    /// Create an idle bot.
    #[must_use]
    pub const fn new(id: BotId) -> Self {
        Self { id, task: None }
    }

    #[must_use]
    pub const fn id(&self) -> BotId {
        self.id
    }

    #[must_use]
    pub const fn status(&self) -> BotStatus {
        if self.task.is_some() {
            BotStatus::Busy
        } else {
            BotStatus::Idle
        }
    }

    #[must_use]
    pub const fn is_idle(&self) -> bool {
        self.task.is_none()
    }

    /// The order the bot is working on, if any.
    #[must_use]
    pub fn assigned_order(&self) -> Option<&Order> {
        self.task.as_ref().map(|task| &task.order)
    }

    /// Handle of the pending completion timer, if any.
    #[must_use]
    pub fn completion(&self) -> Option<&TimerId> {
        self.task.as_ref().map(|task| &task.timer)
    }

    pub(crate) fn assign(&mut self, order: Order, timer: TimerId) {
        self.task = Some(Task { order, timer });
    }

    pub(crate) fn release(&mut self) -> Option<Task> {
        self.task.take()
    }
}
