//! In-memory data source

use super::{lock, MemoryCollection};
use crate::error::{Error, Result};
use crate::pagination::{extract_path_value, ParamNames};
use crate::ports::{Collection, DataSource, FetchRequest, FetchResponse};
use crate::types::JsonValue;
use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Serves pages out of a fixed dataset and stores them into a collection
///
/// The page window is taken from the request: the item after the `until`
/// key when present, else the offset, else the one-based page number, else
/// the end of the collection. The raw response is
/// `{"items": [...], "has_more": bool, "total": n}`.
#[derive(Debug)]
pub struct MemoryBackend {
    collection: Arc<MemoryCollection>,
    dataset: Vec<JsonValue>,
    names: ParamNames,
    key_field: String,
    default_limit: usize,
    latency: Duration,
    emit_sync: bool,
    failures_left: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    requests: Mutex<Vec<FetchRequest>>,
}

impl MemoryBackend {
    /// Serve `dataset` into `collection`
    pub fn new(collection: Arc<MemoryCollection>, dataset: Vec<JsonValue>) -> Self {
        Self {
            collection,
            dataset,
            names: ParamNames::default(),
            key_field: "id".to_string(),
            default_limit: 10,
            latency: Duration::ZERO,
            emit_sync: false,
            failures_left: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Parameter names to read the page window from
    #[must_use]
    pub fn with_param_names(mut self, names: ParamNames) -> Self {
        self.names = names;
        self
    }

    /// Field holding each item's key
    #[must_use]
    pub fn with_key_field(mut self, field: impl Into<String>) -> Self {
        self.key_field = field.into();
        self
    }

    /// Page size used when the request carries none
    #[must_use]
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit;
        self
    }

    /// Delay before each response
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Announce a collection sync after storing each page
    #[must_use]
    pub fn with_sync_notifications(mut self) -> Self {
        self.emit_sync = true;
        self
    }

    /// Fail the next `count` fetches
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<FetchRequest> {
        lock(&self.requests).clone()
    }

    /// Number of requests received so far
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Highest number of requests that were ever outstanding at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn window(&self, request: &FetchRequest) -> (usize, usize) {
        let param = |name: &Option<String>| {
            name.as_ref()
                .and_then(|n| request.params.get(n))
                .and_then(JsonValue::as_u64)
                .map(|v| v as usize)
        };

        let limit = param(&self.names.page_size).unwrap_or(self.default_limit);

        let until = self
            .names
            .until
            .as_ref()
            .and_then(|name| request.params.get(name));
        let start = if let Some(until) = until {
            self.dataset
                .iter()
                .position(|item| extract_path_value(item, &self.key_field).as_ref() == Some(until))
                .map_or(self.dataset.len(), |idx| idx + 1)
        } else if let Some(offset) = param(&self.names.offset) {
            offset
        } else if let Some(page) = param(&self.names.page) {
            page.saturating_sub(1) * limit
        } else {
            self.collection.len()
        };

        (start.min(self.dataset.len()), limit)
    }

    fn take_failure(&self) -> bool {
        self.failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl DataSource for MemoryBackend {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse> {
        let outstanding = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(outstanding, Ordering::SeqCst);
        lock(&self.requests).push(request.clone());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.take_failure() {
            return Err(Error::fetch("simulated failure"));
        }

        let (start, limit) = self.window(&request);
        let end = start.saturating_add(limit).min(self.dataset.len());
        let items = self.dataset[start..end].to_vec();
        let raw = json!({
            "items": items,
            "has_more": end < self.dataset.len(),
            "total": self.dataset.len(),
        });

        if request.remove {
            self.collection.replace(items.clone());
        } else {
            self.collection.extend(items.iter().cloned());
        }
        if self.emit_sync {
            self.collection.notify_synced(raw.clone());
        }

        Ok(FetchResponse::with_raw(items, raw))
    }
}
