//! In-memory collection

use super::{lock, Subscribers};
use crate::ports::{Collection, EventSink, Notification, Subscription};
use crate::types::{JsonValue, SyncOrigin};
use std::sync::Mutex;

/// A collection backed by a `Vec`
#[derive(Debug, Default)]
pub struct MemoryCollection {
    items: Mutex<Vec<JsonValue>>,
    subscribers: Subscribers,
}

impl MemoryCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a collection holding `items`
    pub fn with_items(items: Vec<JsonValue>) -> Self {
        Self {
            items: Mutex::new(items),
            subscribers: Subscribers::default(),
        }
    }

    /// Copy of the current items
    pub fn items(&self) -> Vec<JsonValue> {
        lock(&self.items).clone()
    }

    /// Append items without notifying
    pub fn extend(&self, items: impl IntoIterator<Item = JsonValue>) {
        lock(&self.items).extend(items);
    }

    /// Replace the items without notifying
    pub fn replace(&self, items: Vec<JsonValue>) {
        *lock(&self.items) = items;
    }

    /// Replace the items and announce a reset
    pub fn reset(&self, items: Vec<JsonValue>) {
        self.replace(items);
        self.subscribers.notify(&Notification::Reset);
    }

    /// Announce a collection-level sync
    pub fn notify_synced(&self, response: JsonValue) {
        self.subscribers.notify(&Notification::synced(response));
    }

    /// Announce a sync of a single item
    pub fn notify_item_synced(&self, response: JsonValue) {
        self.subscribers.notify(&Notification::Synced {
            origin: SyncOrigin::Item,
            response,
        });
    }

    /// Number of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl Collection for MemoryCollection {
    fn len(&self) -> usize {
        lock(&self.items).len()
    }

    fn last_item(&self) -> Option<JsonValue> {
        lock(&self.items).last().cloned()
    }

    fn subscribe(&self, sink: EventSink) -> Subscription {
        self.subscribers.add(sink)
    }
}
