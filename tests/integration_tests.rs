//! Integration tests using in-memory adapters
//!
//! Tests the full flow: notifications → pager task → spawned fetch →
//! settlement → deferred re-check, on tokio's paused clock.

use infiniscroll::config::PagerConfig;
use async_trait::async_trait;
use infiniscroll::ports::{Collection, DataSource, FetchRequest, FetchResponse};
use infiniscroll::runtime::{Callbacks, Pager, PagerHandle, PagerPorts};
use infiniscroll::sim::{MemoryBackend, MemoryCollection, SimulatedViewport};
use infiniscroll::{Error, JsonValue, Phase};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const ITEM_HEIGHT: f64 = 40.0;
const VIEWPORT: f64 = 600.0;

/// Collection, viewport and backend wired together
///
/// Rows are 40px tall in a 600px viewport with the default 400px buffer,
/// so the viewport wants content taller than 1000px.
struct Fixture {
    collection: Arc<MemoryCollection>,
    viewport: Arc<SimulatedViewport>,
    backend: Arc<MemoryBackend>,
}

impl Fixture {
    fn new(total: u64, preloaded: u64) -> Self {
        Self::with_backend(total, preloaded, |backend| backend)
    }

    fn with_backend(
        total: u64,
        preloaded: u64,
        configure: impl FnOnce(MemoryBackend) -> MemoryBackend,
    ) -> Self {
        let collection = Arc::new(MemoryCollection::with_items(rows(0, preloaded)));
        let viewport = Arc::new(SimulatedViewport::tracking(
            Arc::clone(&collection),
            ITEM_HEIGHT,
            VIEWPORT,
        ));
        let backend = Arc::new(configure(MemoryBackend::new(
            Arc::clone(&collection),
            rows(0, total),
        )));
        Self {
            collection,
            viewport,
            backend,
        }
    }

    fn ports(&self) -> PagerPorts {
        PagerPorts::new(
            self.viewport.clone(),
            self.viewport.clone(),
            self.collection.clone(),
            self.backend.clone(),
        )
    }

    fn skips(&self) -> Vec<JsonValue> {
        self.backend
            .requests()
            .iter()
            .map(|request| request.params.get("_skip").cloned().unwrap_or_default())
            .collect()
    }
}

#[derive(Clone, Default)]
struct Counters {
    successes: Arc<AtomicUsize>,
    errors: Arc<AtomicUsize>,
}

impl Counters {
    fn callbacks(&self) -> Callbacks {
        let successes = Arc::clone(&self.successes);
        let errors = Arc::clone(&self.errors);
        Callbacks::new()
            .on_success(move |_| {
                successes.fetch_add(1, Ordering::SeqCst);
            })
            .on_error(move |_| {
                errors.fetch_add(1, Ordering::SeqCst);
            })
    }

    fn successes(&self) -> usize {
        self.successes.load(Ordering::SeqCst)
    }

    fn errors(&self) -> usize {
        self.errors.load(Ordering::SeqCst)
    }
}

/// Panics on its first fetch, then serves pages from the inner backend
struct PanicsOnce {
    inner: Arc<MemoryBackend>,
    calls: AtomicUsize,
}

#[async_trait]
impl DataSource for PanicsOnce {
    async fn fetch(&self, request: FetchRequest) -> infiniscroll::Result<FetchResponse> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("data source blew up");
        }
        self.inner.fetch(request).await
    }
}

fn rows(start: u64, count: u64) -> Vec<JsonValue> {
    (start..start + count).map(|id| json!({"id": id})).collect()
}

/// Let every queued event, fetch and timer run out
async fn idle() {
    tokio::time::sleep(Duration::from_secs(5)).await;
}

fn spawn(fixture: &Fixture, config: PagerConfig, counters: &Counters) -> PagerHandle {
    Pager::spawn(config, fixture.ports(), counters.callbacks()).unwrap()
}

// ============================================================================
// Filling and Scrolling
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_fills_short_viewport_page_by_page() {
    let fixture = Fixture::new(100, 10);
    let counters = Counters::default();
    let handle = spawn(&fixture, PagerConfig::default(), &counters);

    idle().await;

    // 400px → 800px → 1200px, which is past the 1000px threshold
    assert_eq!(fixture.collection.len(), 30);
    assert_eq!(fixture.skips(), vec![json!(10), json!(20)]);
    assert_eq!(counters.successes(), 2);
    assert_eq!(fixture.backend.max_in_flight(), 1);

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.page, 3);
    assert_eq!(snapshot.phase, Phase::Idle);
    assert!(snapshot.enabled);

    handle.destroy().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_scroll_to_end_until_exhausted() {
    let fixture = Fixture::new(35, 10);
    let counters = Counters::default();
    let handle = spawn(&fixture, PagerConfig::default(), &counters);

    for _ in 0..10 {
        idle().await;
        if !handle.snapshot().await.unwrap().enabled {
            break;
        }
        fixture.viewport.scroll_to_end();
    }

    let snapshot = handle.snapshot().await.unwrap();
    assert!(!snapshot.enabled);
    assert_eq!(snapshot.page, 4);
    assert_eq!(fixture.collection.len(), 35);
    assert_eq!(fixture.backend.request_count(), 3);

    // Further scrolling does nothing once exhausted
    fixture.viewport.scroll_to(0.0);
    fixture.viewport.scroll_to_end();
    idle().await;
    assert_eq!(fixture.backend.request_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_scroll_burst_keeps_single_flight() {
    let fixture = Fixture::with_backend(1000, 10, |backend| {
        backend.with_latency(Duration::from_millis(100))
    });
    let counters = Counters::default();
    let handle = spawn(&fixture, PagerConfig::default(), &counters);
    idle().await;
    assert_eq!(fixture.collection.len(), 30);

    for _ in 0..60 {
        fixture.viewport.scroll_by(10.0);
    }
    idle().await;

    assert_eq!(fixture.backend.max_in_flight(), 1);
    let skips: Vec<u64> = fixture
        .skips()
        .iter()
        .filter_map(JsonValue::as_u64)
        .collect();
    assert!(skips.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(skips.len(), fixture.backend.request_count());

    handle.destroy().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_resize_burst_is_coalesced() {
    let collection = Arc::new(MemoryCollection::with_items(rows(0, 10)));
    let viewport = Arc::new(SimulatedViewport::new(500.0, 2000.0));
    let backend = Arc::new(MemoryBackend::new(Arc::clone(&collection), rows(0, 15)));
    let ports = PagerPorts::new(
        viewport.clone(),
        viewport.clone(),
        collection.clone(),
        backend.clone(),
    );
    let handle = Pager::spawn(PagerConfig::default(), ports, Callbacks::new()).unwrap();
    idle().await;
    assert_eq!(backend.request_count(), 0);

    // Every one of these heights would already need more content
    for _ in 0..5 {
        viewport.resize(1700.0);
        handle.snapshot().await.unwrap();
        tokio::time::advance(Duration::from_millis(100)).await;
    }
    handle.snapshot().await.unwrap();
    assert_eq!(backend.request_count(), 0);

    tokio::time::advance(Duration::from_millis(250)).await;
    idle().await;
    assert_eq!(backend.request_count(), 1);

    handle.destroy().await.unwrap();
}

// ============================================================================
// Failures and Lifecycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_failed_fetch_retries_on_next_scroll() {
    let fixture = Fixture::new(100, 10);
    fixture.backend.fail_next(1);
    let counters = Counters::default();
    let handle = spawn(&fixture, PagerConfig::default(), &counters);

    idle().await;
    assert_eq!(counters.errors(), 1);
    assert_eq!(counters.successes(), 0);

    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.enabled);
    assert!(!snapshot.in_flight);
    assert_eq!(snapshot.page, 1);

    fixture.viewport.scroll_to(0.0);
    idle().await;

    assert_eq!(counters.successes(), 2);
    assert_eq!(fixture.collection.len(), 30);
    assert_eq!(fixture.skips(), vec![json!(10), json!(10), json!(20)]);
}

#[tokio::test(start_paused = true)]
async fn test_panicking_fetch_settles_once_and_retries() {
    let fixture = Fixture::new(100, 10);
    let source = Arc::new(PanicsOnce {
        inner: Arc::clone(&fixture.backend),
        calls: AtomicUsize::new(0),
    });
    let ports = PagerPorts::new(
        fixture.viewport.clone(),
        fixture.viewport.clone(),
        fixture.collection.clone(),
        source.clone(),
    );

    let errors = Arc::new(AtomicUsize::new(0));
    let retryable = Arc::new(AtomicBool::new(false));
    let successes = Arc::new(AtomicUsize::new(0));
    let callbacks = {
        let errors = Arc::clone(&errors);
        let retryable = Arc::clone(&retryable);
        let successes = Arc::clone(&successes);
        Callbacks::new()
            .on_success(move |_| {
                successes.fetch_add(1, Ordering::SeqCst);
            })
            .on_error(move |err| {
                errors.fetch_add(1, Ordering::SeqCst);
                retryable.store(
                    matches!(err, Error::Fetch { .. }) && err.is_retryable(),
                    Ordering::SeqCst,
                );
            })
    };
    let handle = Pager::spawn(PagerConfig::default(), ports, callbacks).unwrap();

    idle().await;
    assert_eq!(errors.load(Ordering::SeqCst), 1);
    assert!(retryable.load(Ordering::SeqCst));
    assert_eq!(successes.load(Ordering::SeqCst), 0);

    let snapshot = handle.snapshot().await.unwrap();
    assert!(!snapshot.in_flight);
    assert!(snapshot.enabled);
    assert_eq!(snapshot.page, 1);

    fixture.viewport.scroll_to(0.0);
    idle().await;

    assert_eq!(errors.load(Ordering::SeqCst), 1);
    assert_eq!(successes.load(Ordering::SeqCst), 2);
    assert_eq!(source.calls.load(Ordering::SeqCst), 3);
    assert_eq!(fixture.skips(), vec![json!(10), json!(20)]);
    assert_eq!(handle.snapshot().await.unwrap().page, 3);

    handle.destroy().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_dropped_handles_leave_pager_running() {
    let fixture = Fixture::new(100, 10);
    let counters = Counters::default();
    let handle = spawn(&fixture, PagerConfig::default(), &counters);
    idle().await;
    let before = fixture.backend.request_count();
    drop(handle);

    assert_eq!(fixture.viewport.subscriber_count(), 1);
    assert_eq!(fixture.collection.subscriber_count(), 1);

    fixture.viewport.scroll_to_end();
    idle().await;
    assert!(fixture.backend.request_count() > before);
    assert_eq!(fixture.viewport.subscriber_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_settlement_after_destroy_is_ignored() {
    let fixture = Fixture::with_backend(100, 10, |backend| {
        backend.with_latency(Duration::from_millis(500))
    });
    let counters = Counters::default();
    let handle = spawn(&fixture, PagerConfig::default(), &counters);

    assert!(handle.snapshot().await.unwrap().in_flight);
    handle.destroy().await.unwrap();
    assert!(handle.is_destroyed());
    assert_eq!(fixture.viewport.subscriber_count(), 0);
    assert_eq!(fixture.collection.subscriber_count(), 0);

    idle().await;

    // The data source still stored its page, but the pager saw nothing
    assert_eq!(fixture.collection.len(), 20);
    assert_eq!(counters.successes(), 0);
    assert_eq!(fixture.backend.request_count(), 1);

    assert!(handle.destroy().await.is_ok());
    assert!(matches!(handle.check(), Err(Error::Destroyed)));
    assert!(matches!(handle.snapshot().await, Err(Error::Destroyed)));
}

#[tokio::test(start_paused = true)]
async fn test_collection_reset_restarts_pagination() {
    let fixture = Fixture::new(100, 10);
    let counters = Counters::default();
    let handle = spawn(&fixture, PagerConfig::default(), &counters);
    idle().await;
    assert_eq!(fixture.collection.len(), 30);

    fixture.collection.reset(rows(0, 10));
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.page, 1);
    assert!(snapshot.enabled);
    assert!(snapshot.last_known_scroll_extent.abs() < f64::EPSILON);

    handle.check().unwrap();
    idle().await;
    assert_eq!(fixture.collection.len(), 30);
    assert_eq!(
        fixture.skips(),
        vec![json!(10), json!(20), json!(10), json!(20)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_strict_external_sync_resumes_fetching() {
    let fixture = Fixture::new(100, 7);
    let mut config = PagerConfig::default();
    config.strict = true;
    config.page_size = Some(10);
    let counters = Counters::default();
    let handle = spawn(&fixture, config, &counters);

    idle().await;
    assert!(!handle.snapshot().await.unwrap().enabled);
    assert_eq!(fixture.backend.request_count(), 0);

    // Another component completes the first page and announces it
    fixture.collection.extend(rows(7, 3));
    fixture.collection.notify_synced(json!([]));
    idle().await;

    assert_eq!(fixture.skips().first(), Some(&json!(10)));
    assert_eq!(fixture.collection.len(), 30);
    assert!(handle.snapshot().await.unwrap().enabled);
}

#[tokio::test(start_paused = true)]
async fn test_replace_scroll_source_moves_subscription() {
    let fixture = Fixture::new(100, 10);
    let counters = Counters::default();
    let handle = spawn(&fixture, PagerConfig::default(), &counters);
    idle().await;
    let before = fixture.backend.request_count();

    let other = Arc::new(SimulatedViewport::tracking(
        Arc::clone(&fixture.collection),
        ITEM_HEIGHT,
        VIEWPORT,
    ));
    handle.replace_scroll_source(other.clone()).unwrap();
    handle.snapshot().await.unwrap();
    assert_eq!(fixture.viewport.subscriber_count(), 0);
    assert_eq!(other.subscriber_count(), 1);

    other.scroll_to_end();
    idle().await;
    assert!(fixture.backend.request_count() > before);
}

#[tokio::test]
async fn test_detached_content_fails_without_subscribing() {
    let fixture = Fixture::new(100, 10);
    fixture.viewport.detach();

    let result = Pager::spawn(PagerConfig::default(), fixture.ports(), Callbacks::new());
    assert!(matches!(result, Err(Error::Detached)));
    assert_eq!(fixture.viewport.subscriber_count(), 0);
    assert_eq!(fixture.collection.subscriber_count(), 0);
}

// ============================================================================
// Configuration
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_yaml_config_page_numbers_and_has_more_flag() {
    let config = PagerConfig::from_yaml_str(
        r"
buffer_pixels: 400
page_size: 10
has_more_field: has_more
params:
  page_size: per_page
  offset: null
  page: page
",
    )
    .unwrap();
    let names = config.params.clone();
    let fixture = Fixture::with_backend(25, 10, |backend| {
        backend.with_param_names(names).with_sync_notifications()
    });
    let counters = Counters::default();
    let handle = spawn(&fixture, config, &counters);

    for _ in 0..5 {
        idle().await;
        fixture.viewport.scroll_to_end();
    }
    idle().await;

    let pages: Vec<JsonValue> = fixture
        .backend
        .requests()
        .iter()
        .map(|request| request.params["page"].clone())
        .collect();
    assert_eq!(pages, vec![json!(2), json!(3)]);
    assert_eq!(
        fixture.backend.requests()[0].params.get("per_page"),
        Some(&json!(10))
    );
    assert_eq!(fixture.collection.len(), 25);
    assert!(!handle.snapshot().await.unwrap().enabled);
}
