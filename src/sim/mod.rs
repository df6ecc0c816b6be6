//! In-memory adapters
//!
//! Port implementations that hold everything in memory: a collection, a
//! backend serving pages out of a fixed dataset, and a viewport whose
//! content grows with the collection. The CLI `simulate` command runs on
//! these, and so do the tests.

mod backend;
mod collection;
mod viewport;

pub use backend::MemoryBackend;
pub use collection::MemoryCollection;
pub use viewport::SimulatedViewport;

use crate::ports::{EventSink, Notification, Subscription};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Registered sinks with removable entries
#[derive(Debug, Clone, Default)]
pub(crate) struct Subscribers {
    inner: Arc<Mutex<SubscriberList>>,
}

#[derive(Debug, Default)]
struct SubscriberList {
    next_id: u64,
    sinks: Vec<(u64, EventSink)>,
}

impl Subscribers {
    /// Register a sink; the returned subscription removes it again
    pub(crate) fn add(&self, sink: EventSink) -> Subscription {
        let id = {
            let mut list = lock(&self.inner);
            let id = list.next_id;
            list.next_id += 1;
            list.sinks.push((id, sink));
            id
        };

        let inner = Arc::clone(&self.inner);
        Subscription::new(move || {
            lock(&inner).sinks.retain(|(sid, _)| *sid != id);
        })
    }

    /// Deliver to every registered sink
    pub(crate) fn notify(&self, notification: &Notification) {
        // Deliver outside the lock so sinks may subscribe or unsubscribe
        let sinks: Vec<EventSink> = lock(&self.inner)
            .sinks
            .iter()
            .map(|(_, sink)| sink.clone())
            .collect();
        for sink in sinks {
            sink.notify(notification.clone());
        }
    }

    /// Number of registered sinks
    pub(crate) fn len(&self) -> usize {
        lock(&self.inner).sinks.len()
    }
}

/// Lock a mutex, recovering the data if a holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
