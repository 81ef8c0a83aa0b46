//! Timer scheduling and cancellation.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{BotId, OrderId};

/// Heap entry: execute time, then scheduling sequence for stable ties.
type TimerQueue = BinaryHeap<Reverse<(Duration, u64, TimerId)>>;

/// Unique identifier for a timer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(String);

impl TimerId {
    /// Create a new unique timer ID.
    #[must_use]
    pub fn new() -> Self {
        Self(format!("timer-{}", Uuid::new_v4()))
    }
}

impl Default for TimerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TimerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A scheduled completion of one bot's order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionTimer {
    id: TimerId,
    bot_id: BotId,
    order_id: OrderId,
    execute_at: Duration,
}

impl CompletionTimer {
    #[must_use]
    pub const fn id(&self) -> &TimerId {
        &self.id
    }

    #[must_use]
    pub const fn bot_id(&self) -> BotId {
        self.bot_id
    }

    #[must_use]
    pub const fn order_id(&self) -> OrderId {
        self.order_id
    }

    /// Virtual time at which the timer fires.
    #[must_use]
    pub const fn execute_at(&self) -> Duration {
        self.execute_at
    }
}

/// Schedules and manages completion timers.
///
/// Only pending timers are kept. Cancelling removes the timer, so a
/// cancelled timer can never be returned by [`CompletionTimers::pop_due`].
/// The heap head is always a pending timer (or the heap is empty).
#[derive(Debug, Default)]
pub struct CompletionTimers {
    /// Pending timers indexed by ID
    timers: HashMap<TimerId, CompletionTimer>,
    /// Priority queue of timer IDs by execution time
    queue: TimerQueue,
    next_sequence: u64,
}

impl CompletionTimers {
    /// Create an empty scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule the completion of `order_id` on `bot_id` at `execute_at`.
    pub fn schedule(&mut self, bot_id: BotId, order_id: OrderId, execute_at: Duration) -> TimerId {
        let id = TimerId::new();
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);

        self.queue.push(Reverse((execute_at, sequence, id.clone())));
        self.timers.insert(
            id.clone(),
            CompletionTimer {
                id: id.clone(),
                bot_id,
                order_id,
                execute_at,
            },
        );

        id
    }

    /// Cancel a timer.
    ///
    /// Returns `false` if the timer is unknown or already fired.
    pub fn cancel(&mut self, timer_id: &TimerId) -> bool {
        let removed = self.timers.remove(timer_id).is_some();
        if removed {
            self.prune();
        }
        removed
    }

    /// Pop the earliest timer due at or before `now`.
    ///
    /// Timers with the same execute time come out in scheduling order.
    pub fn pop_due(&mut self, now: Duration) -> Option<CompletionTimer> {
        let Reverse((execute_at, _, _)) = self.queue.peek()?;
        if *execute_at > now {
            return None;
        }

        let Reverse((_, _, timer_id)) = self.queue.pop()?;
        let timer = self.timers.remove(&timer_id);
        self.prune();
        timer
    }

    /// Get the execute time of the next pending timer.
    #[must_use]
    pub fn peek_next(&self) -> Option<Duration> {
        self.queue.peek().map(|Reverse((execute_at, _, _))| *execute_at)
    }

    /// Get the number of pending timers.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.timers.len()
    }

    /// Drop heap entries left behind by cancelled timers until the head is live.
    fn prune(&mut self) {
        while let Some(Reverse((_, _, head))) = self.queue.peek() {
            if self.timers.contains_key(head) {
                break;
            }
            self.queue.pop();
        }
    }

    #[cfg(test)]
    fn heap_len(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[test]
    fn test_timer_id_display() {
        let id = TimerId::new();
        assert!(id.to_string().starts_with("timer-"));
    }

    #[test]
    fn test_scheduler_schedule() {
        let mut timers = CompletionTimers::new();
        timers.schedule(BotId::new(), OrderId::new(1), secs(10));

        assert_eq!(timers.pending_count(), 1);
        assert_eq!(timers.peek_next(), Some(secs(10)));
    }

    #[test]
    fn test_pop_due_respects_time() {
        let mut timers = CompletionTimers::new();
        let bot = BotId::new();
        timers.schedule(bot, OrderId::new(1), secs(10));

        assert!(timers.pop_due(secs(9)).is_none());
        let fired = timers.pop_due(secs(10));
        assert!(fired.is_some());
        let fired = fired.map(|t| (t.bot_id(), t.order_id(), t.execute_at()));
        assert_eq!(fired, Some((bot, OrderId::new(1), secs(10))));
        assert_eq!(timers.pending_count(), 0);
    }

    #[test]
    fn test_pop_due_orders_by_time_then_sequence() {
        let mut timers = CompletionTimers::new();
        let bot = BotId::new();
        timers.schedule(bot, OrderId::new(1), secs(20));
        timers.schedule(bot, OrderId::new(2), secs(10));
        timers.schedule(bot, OrderId::new(3), secs(10));

        let mut fired = Vec::new();
        while let Some(timer) = timers.pop_due(secs(30)) {
            fired.push(timer.order_id().number());
        }
        assert_eq!(fired, vec![2, 3, 1]);
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let mut timers = CompletionTimers::new();
        let id = timers.schedule(BotId::new(), OrderId::new(1), secs(10));

        assert!(timers.cancel(&id));
        assert!(!timers.cancel(&id));
        assert_eq!(timers.pending_count(), 0);
        assert!(timers.pop_due(secs(100)).is_none());
        assert!(timers.peek_next().is_none());
    }

    #[test]
    fn test_peek_next_skips_cancelled_head() {
        let mut timers = CompletionTimers::new();
        let bot = BotId::new();
        let early = timers.schedule(bot, OrderId::new(1), secs(10));
        let middle = timers.schedule(bot, OrderId::new(2), secs(20));
        timers.schedule(bot, OrderId::new(3), secs(30));

        // Cancelling below the head leaves its entry until it surfaces.
        assert!(timers.cancel(&middle));
        assert_eq!(timers.peek_next(), Some(secs(10)));
        assert_eq!(timers.heap_len(), 3);

        assert!(timers.cancel(&early));
        assert_eq!(timers.peek_next(), Some(secs(30)));
        assert_eq!(timers.heap_len(), 1);

        let fired = timers.pop_due(secs(30)).map(|t| t.order_id());
        assert_eq!(fired, Some(OrderId::new(3)));
        assert_eq!(timers.heap_len(), 0);
    }

    #[test]
    fn test_pop_due_prunes_cancelled_successor() {
        let mut timers = CompletionTimers::new();
        let bot = BotId::new();
        timers.schedule(bot, OrderId::new(1), secs(10));
        let next = timers.schedule(bot, OrderId::new(2), secs(20));
        timers.schedule(bot, OrderId::new(3), secs(40));
        timers.cancel(&next);

        assert!(timers.pop_due(secs(10)).is_some());
        assert_eq!(timers.peek_next(), Some(secs(40)));
        assert!(timers.pop_due(secs(39)).is_none());
    }

    #[test]
    fn test_cancel_after_fire_is_noop() {
        let mut timers = CompletionTimers::new();
        let id = timers.schedule(BotId::new(), OrderId::new(1), secs(1));
        assert!(timers.pop_due(secs(1)).is_some());
        assert!(!timers.cancel(&id));
    }
}
