//! Bot registry and bot identifier sources.

use std::fmt;

use uuid::Uuid;

use crate::types::{Bot, BotId, BotStatus, OrderId};

/// Source of opaque, unique bot identifiers.
pub trait BotIdSource: Send + fmt::Debug {
    /// Produce the identifier for the next hired bot.
    fn next_id(&mut self) -> BotId;
}

/// Random UUID v4 identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdSource;

impl BotIdSource for UuidIdSource {
    fn next_id(&mut self) -> BotId {
        BotId::new()
    }
}

/// Deterministic identifiers (`00000000-0000-0000-0000-000000000001`, ...).
///
/// Useful for reproducible simulations and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialIdSource {
    next: u128,
}

impl SequentialIdSource {
    #[must_use]
    pub const fn new() -> Self {
        Self { next: 0 }
    }
}

impl BotIdSource for SequentialIdSource {
    fn next_id(&mut self) -> BotId {
        self.next = self.next.wrapping_add(1);
        BotId::from_uuid(Uuid::from_u128(self.next))
    }
}

/// Owns every bot, in hiring order.
#[derive(Debug)]
pub struct BotRegistry {
    bots: Vec<Bot>,
    ids: Box<dyn BotIdSource>,
}

impl Default for BotRegistry {
    fn default() -> Self {
        Self::new(Box::new(UuidIdSource))
    }
}

impl BotRegistry {
    /// Create an empty registry drawing ids from `ids`.
    #[must_use]
    pub fn new(ids: Box<dyn BotIdSource>) -> Self {
        Self {
            bots: Vec::new(),
            ids,
        }
    }

    /// Append a new idle bot and return its id.
    pub fn hire(&mut self) -> BotId {
        let id = self.ids.next_id();
        self.bots.push(Bot::new(id));
        id
    }

    /// Remove the most recently hired bot.
    pub fn pop(&mut self) -> Option<Bot> {
        self.bots.pop()
    }

    #[must_use]
    pub fn get(&self, id: &BotId) -> Option<&Bot> {
        self.bots.iter().find(|bot| bot.id() == *id)
    }

    pub fn get_mut(&mut self, id: &BotId) -> Option<&mut Bot> {
        self.bots.iter_mut().find(|bot| bot.id() == *id)
    }

    /// The bot currently working on `order_id`, if any.
    #[must_use]
    pub fn holding(&self, order_id: OrderId) -> Option<&Bot> {
        self.bots
            .iter()
            .find(|bot| bot.assigned_order().is_some_and(|order| order.id() == order_id))
    }

    /// All bots, or those with the given status, in hiring order.
    #[must_use]
    pub fn query(&self, status: Option<BotStatus>) -> Vec<&Bot> {
        self.bots
            .iter()
            .filter(|bot| status.is_none_or(|wanted| bot.status() == wanted))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Bot> {
        self.bots.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Bot> {
        self.bots.iter_mut()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bots.is_empty()
    }
}
