//! Priority-aware queue of orders waiting for a bot.

use std::collections::VecDeque;

use crate::types::{Order, OrderId};

/// Orders waiting for an idle bot.
///
/// VIP orders always precede normal orders. Within a class, orders keep
/// their submission order, which is also their id order, so an order that
/// comes back from a retired bot slots in where it was originally submitted.
#[derive(Debug, Default)]
pub struct PendingQueue {
    orders: VecDeque<Order>,
}

impl PendingQueue {
    /// Create an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            orders: VecDeque::new(),
        }
    }

    /// Get the current number of queued orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Check if the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Insert an order according to its own priority class.
    ///
    /// Returns the position it was placed at.
    pub fn insert(&mut self, order: Order) -> usize {
        let position = self
            .orders
            .iter()
            .position(|queued| precedes(&order, queued))
            .unwrap_or(self.orders.len());
        self.orders.insert(position, order);
        position
    }

    /// Remove and return the order at the head of the queue.
    pub fn pop_front(&mut self) -> Option<Order> {
        self.orders.pop_front()
    }

    /// Check whether an order is queued.
    #[must_use]
    pub fn contains(&self, id: OrderId) -> bool {
        self.orders.iter().any(|order| order.id() == id)
    }

    /// Iterate over queued orders from head to tail.
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.orders.iter()
    }
}

/// Whether `order` belongs ahead of `queued`.
fn precedes(order: &Order, queued: &Order) -> bool {
    match (order.is_vip(), queued.is_vip()) {
        (true, false) => true,
        (false, true) => false,
        _ => order.id() < queued.id(),
    }
}
