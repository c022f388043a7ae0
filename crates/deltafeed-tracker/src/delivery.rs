//! Delivery tracker: per-consumer fan-out of admitted items
//!
//! Each admitted item is tracked until every registered consumer has
//! received it, then purged. A consumer that announces readiness again is
//! treated as never having received anything.

use deltafeed_domain::{ConsumerId, Item, ItemId};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// An admitted item and the consumers it has been sent to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedItem {
    /// Identity assigned at admission
    pub id: ItemId,
    /// Consumers that already received the item
    pub delivered_to: BTreeSet<ConsumerId>,
    /// The item itself
    pub payload: Item,
}

impl TrackedItem {
    fn new(payload: Item) -> Self {
        Self {
            id: ItemId::new(),
            delivered_to: BTreeSet::new(),
            payload,
        }
    }

    /// Whether every consumer in `consumers` has received this item
    pub fn delivered_to_all(&self, consumers: &[ConsumerId]) -> bool {
        consumers.iter().all(|c| self.delivered_to.contains(c))
    }
}

/// Items owed to one consumer in one delivery cycle
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumerBatch {
    /// Recipient
    pub consumer_id: ConsumerId,
    /// Items in admission order
    pub items: Vec<Item>,
}

/// Point-in-time view of the tracker
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverySnapshot {
    /// Registered consumers in registration order
    pub consumers: Vec<ConsumerId>,
    /// Items not yet delivered to every consumer
    pub items: Vec<TrackedItem>,
}

/// Tracks which admitted items each registered consumer still needs
#[derive(Debug, Clone, Default)]
pub struct DeliveryTracker {
    consumers: Vec<ConsumerId>,
    items: Vec<TrackedItem>,
}

impl DeliveryTracker {
    /// Create an empty tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `consumer`, clearing any record of what it was sent
    ///
    /// Returns `true` when the consumer was not registered before.
    pub fn register_consumer(&mut self, consumer: ConsumerId) -> bool {
        for item in &mut self.items {
            item.delivered_to.remove(&consumer);
        }

        if self.consumers.contains(&consumer) {
            debug!(consumer = %consumer, "Consumer rejoined, delivery records cleared");
            false
        } else {
            debug!(consumer = %consumer, "Consumer registered");
            self.consumers.push(consumer);
            true
        }
    }

    /// Registered consumers in registration order
    pub fn consumers(&self) -> &[ConsumerId] {
        &self.consumers
    }

    /// Start tracking a newly admitted item
    pub fn admit(&mut self, item: Item) -> ItemId {
        let tracked = TrackedItem::new(item);
        let id = tracked.id;
        self.items.push(tracked);
        id
    }

    /// Tracked items in admission order
    pub fn items(&self) -> &[TrackedItem] {
        &self.items
    }

    /// Number of tracked items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is tracked
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Build one batch per consumer that is owed at least one item
    ///
    /// Every item placed in a batch is marked as delivered to that consumer.
    /// Batches are returned in consumer registration order.
    pub fn build_batches(&mut self) -> Vec<ConsumerBatch> {
        let mut owed: HashMap<&ConsumerId, Vec<Item>> = HashMap::new();

        for tracked in &mut self.items {
            for consumer in &self.consumers {
                if tracked.delivered_to.insert(consumer.clone()) {
                    owed.entry(consumer).or_default().push(tracked.payload.clone());
                }
            }
        }

        self.consumers
            .iter()
            .filter_map(|consumer| {
                owed.remove(consumer).map(|items| ConsumerBatch {
                    consumer_id: consumer.clone(),
                    items,
                })
            })
            .collect()
    }

    /// Drop items every registered consumer has received
    ///
    /// Nothing is purged while no consumer is registered. Returns the number
    /// of items removed.
    pub fn purge_delivered(&mut self) -> usize {
        if self.consumers.is_empty() {
            return 0;
        }
        let before = self.items.len();
        let consumers = &self.consumers;
        self.items.retain(|item| !item.delivered_to_all(consumers));
        before - self.items.len()
    }

    /// Forget all tracked items; registered consumers are kept
    pub fn clear_items(&mut self) {
        self.items.clear();
    }

    /// Snapshot of consumers and tracked items
    pub fn snapshot(&self) -> DeliverySnapshot {
        DeliverySnapshot {
            consumers: self.consumers.clone(),
            items: self.items.clone(),
        }
    }
}
