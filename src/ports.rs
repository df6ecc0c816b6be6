//! Ports consumed by the pagination core
//!
//! The controller never touches UI elements, network clients or storage
//! directly. It reads numbers and items through these traits, and the
//! runtime receives notifications through an [`EventSink`] handed to each
//! port when it subscribes.

use crate::error::Result;
use crate::types::{JsonValue, ParameterMap, SyncOrigin};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Notifications
// ============================================================================

/// Something happened in the outside world that the pager cares about
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// The scroll container scrolled
    Scroll,
    /// The window or scroll container changed size
    Resize,
    /// The collection was replaced wholesale; pagination starts over
    Reset,
    /// The collection finished a sync with the data source
    Synced {
        /// Which object the sync was raised for
        origin: SyncOrigin,
        /// Raw response of the sync
        response: JsonValue,
    },
}

impl Notification {
    /// Create a collection-level sync notification
    pub fn synced(response: JsonValue) -> Self {
        Self::Synced {
            origin: SyncOrigin::Collection,
            response,
        }
    }
}

/// Delivers notifications from a port into the pager
///
/// `notify` returns false once the receiving side is gone.
#[derive(Clone)]
pub struct EventSink {
    deliver: Arc<dyn Fn(Notification) -> bool + Send + Sync>,
}

impl EventSink {
    /// Create a sink from a delivery function
    pub fn new(deliver: impl Fn(Notification) -> bool + Send + Sync + 'static) -> Self {
        Self {
            deliver: Arc::new(deliver),
        }
    }

    /// Deliver a notification
    pub fn notify(&self, notification: Notification) -> bool {
        (self.deliver)(notification)
    }

    /// Deliver a scroll notification
    pub fn scroll(&self) -> bool {
        self.notify(Notification::Scroll)
    }

    /// Deliver a resize notification
    pub fn resize(&self) -> bool {
        self.notify(Notification::Resize)
    }
}

impl fmt::Debug for EventSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink").finish()
    }
}

/// Handle returned by `subscribe`; releasing it detaches the sink
///
/// Dropping the handle also unsubscribes.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Create a subscription that runs `cancel` when released
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to release
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Detach now
    pub fn unsubscribe(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

// ============================================================================
// Viewport Ports
// ============================================================================

/// The scrollable container
pub trait ScrollSource: Send + Sync {
    /// Distance scrolled from the top
    fn scroll_offset(&self) -> Result<f64>;

    /// Visible height of the container
    fn viewport_size(&self) -> Result<f64>;

    /// Start delivering [`Notification::Scroll`] and [`Notification::Resize`]
    fn subscribe(&self, sink: EventSink) -> Subscription;
}

/// The element holding the rendered items
pub trait ContentMeasure: Send + Sync {
    /// Trailing edge of the content relative to the scroll container
    fn content_extent(&self) -> Result<f64>;

    /// Whether the content is mounted inside a scroll container
    fn is_attached(&self) -> bool {
        true
    }
}

// ============================================================================
// Data Ports
// ============================================================================

/// The collection that fetched items are stored into
pub trait Collection: Send + Sync {
    /// Number of items currently held
    fn len(&self) -> usize;

    /// True when no items are held
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The last item, used to derive a cursor key
    fn last_item(&self) -> Option<JsonValue>;

    /// Start delivering [`Notification::Reset`] and [`Notification::Synced`]
    fn subscribe(&self, sink: EventSink) -> Subscription;
}

/// Parameters for one page fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchRequest {
    /// Pagination and extra parameters
    pub params: ParameterMap,
    /// Replace the collection contents instead of appending
    pub remove: bool,
}

/// Result of one page fetch
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FetchResponse {
    /// Items returned for this page
    pub items: Vec<JsonValue>,
    /// The raw response body
    pub raw: JsonValue,
}

impl FetchResponse {
    /// Create a response from items, with the items array as raw body
    pub fn from_items(items: Vec<JsonValue>) -> Self {
        let raw = JsonValue::Array(items.clone());
        Self { items, raw }
    }

    /// Create a response from a raw body; a top-level array becomes the items
    pub fn from_raw(raw: JsonValue) -> Self {
        let items = match &raw {
            JsonValue::Array(items) => items.clone(),
            _ => Vec::new(),
        };
        Self { items, raw }
    }

    /// Create a response with an explicit raw body
    pub fn with_raw(items: Vec<JsonValue>, raw: JsonValue) -> Self {
        Self { items, raw }
    }
}

/// Performs page fetches
///
/// Implementations store the returned items into the backing collection
/// before resolving. Timeouts are the implementation's concern.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Fetch one page
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse>;
}
