//! Simulated scroll container

use super::{lock, MemoryCollection, Subscribers};
use crate::error::{Error, Result};
use crate::ports::{Collection, ContentMeasure, EventSink, Notification, ScrollSource, Subscription};
use std::sync::{Arc, Mutex};

#[derive(Debug)]
struct ViewportState {
    scroll_offset: f64,
    viewport_size: f64,
    content: ContentSize,
    attached: bool,
    measurable: bool,
}

#[derive(Debug)]
enum ContentSize {
    Fixed(f64),
    PerItem {
        collection: Arc<MemoryCollection>,
        item_height: f64,
    },
}

/// A scroll container with fixed-height rows
///
/// Scrolling is clamped the way a real container clamps it: never above
/// the top, never past `content - viewport`.
#[derive(Debug)]
pub struct SimulatedViewport {
    state: Mutex<ViewportState>,
    subscribers: Subscribers,
}

impl SimulatedViewport {
    /// Viewport with a fixed content extent
    pub fn new(viewport_size: f64, content_extent: f64) -> Self {
        Self::with_content(viewport_size, ContentSize::Fixed(content_extent))
    }

    /// Viewport whose content is `collection.len() * item_height` tall
    pub fn tracking(collection: Arc<MemoryCollection>, item_height: f64, viewport_size: f64) -> Self {
        Self::with_content(
            viewport_size,
            ContentSize::PerItem {
                collection,
                item_height,
            },
        )
    }

    fn with_content(viewport_size: f64, content: ContentSize) -> Self {
        Self {
            state: Mutex::new(ViewportState {
                scroll_offset: 0.0,
                viewport_size,
                content,
                attached: true,
                measurable: true,
            }),
            subscribers: Subscribers::default(),
        }
    }

    /// Scroll to an absolute offset and announce it
    pub fn scroll_to(&self, offset: f64) {
        {
            let mut state = lock(&self.state);
            let max = (content_extent(&state) - state.viewport_size).max(0.0);
            state.scroll_offset = offset.clamp(0.0, max);
        }
        self.subscribers.notify(&Notification::Scroll);
    }

    /// Scroll by a relative amount and announce it
    pub fn scroll_by(&self, delta: f64) {
        let current = lock(&self.state).scroll_offset;
        self.scroll_to(current + delta);
    }

    /// Scroll to the end of the content and announce it
    pub fn scroll_to_end(&self) {
        self.scroll_to(f64::MAX);
    }

    /// Change the viewport height and announce a resize
    pub fn resize(&self, viewport_size: f64) {
        lock(&self.state).viewport_size = viewport_size;
        self.subscribers.notify(&Notification::Resize);
    }

    /// Override the content extent (fixed-content viewports only)
    pub fn set_content_extent(&self, extent: f64) {
        lock(&self.state).content = ContentSize::Fixed(extent);
    }

    /// Set the scroll offset without clamping or announcing
    pub fn set_scroll_offset(&self, offset: f64) {
        lock(&self.state).scroll_offset = offset;
    }

    /// Mark the content as detached from the scroll container
    pub fn detach(&self) {
        lock(&self.state).attached = false;
    }

    /// Make every measurement fail
    pub fn set_measurable(&self, measurable: bool) {
        lock(&self.state).measurable = measurable;
    }

    /// Current scroll offset
    pub fn offset(&self) -> f64 {
        lock(&self.state).scroll_offset
    }

    /// Number of active subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn measure<T>(&self, read: impl FnOnce(&ViewportState) -> T) -> Result<T> {
        let state = lock(&self.state);
        if !state.measurable {
            return Err(Error::measurement("viewport is not measurable"));
        }
        Ok(read(&state))
    }
}

fn content_extent(state: &ViewportState) -> f64 {
    match &state.content {
        ContentSize::Fixed(extent) => *extent,
        ContentSize::PerItem {
            collection,
            item_height,
        } => collection.len() as f64 * item_height,
    }
}

impl ScrollSource for SimulatedViewport {
    fn scroll_offset(&self) -> Result<f64> {
        self.measure(|state| state.scroll_offset)
    }

    fn viewport_size(&self) -> Result<f64> {
        self.measure(|state| state.viewport_size)
    }

    fn subscribe(&self, sink: EventSink) -> Subscription {
        self.subscribers.add(sink)
    }
}

impl ContentMeasure for SimulatedViewport {
    fn content_extent(&self) -> Result<f64> {
        self.measure(content_extent)
    }

    fn is_attached(&self) -> bool {
        lock(&self.state).attached
    }
}
