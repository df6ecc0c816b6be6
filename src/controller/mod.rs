//! Pagination controller
//!
//! The state machine at the center of the crate. It turns scroll, resize
//! and collection notifications into fetch decisions and keeps the cursor
//! and the request gate consistent.
//!
//! # Overview
//!
//! The controller is synchronous and never performs a fetch itself. When a
//! fetch should happen it returns a [`FetchTicket`]; whoever drives the
//! controller (normally [`crate::runtime::Pager`]) performs the fetch and
//! reports back through [`PaginationController::on_fetch_settled`].
//!
//! ```text
//!            on_scroll / on_resize / recheck
//!   ┌──────┐ ───────────────────────────────▶ ┌───────────────┐
//!   │ Idle │                                  │ AwaitingFetch │
//!   └──────┘ ◀─────────────────────────────── └───────────────┘
//!      ▲         on_fetch_settled / on_reset          │
//!      └──────────────────────────────────────────────┘
//! ```

mod types;

pub use types::{FetchTicket, PagerSnapshot, Phase, Settlement, SyncAction};

use crate::config::PagerOptions;
use crate::error::{Error, Result};
use crate::gate::RequestGate;
use crate::geometry::{self, ViewportGeometry};
use crate::pagination::{
    ExhaustionPolicy, PageContext, PaginationState, ParamBuilder, SyncVerdict,
};
use crate::ports::{Collection, ContentMeasure, FetchResponse, ScrollSource};
use crate::types::{JsonValue, RequestId, SyncOrigin};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What caused an evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Trigger {
    /// User scroll; subject to the scroll direction guard
    Scroll,
    /// Viewport resize; clears the scroll baseline first
    Resize,
    /// Follow-up check after a load or sync; no direction guard
    Recheck,
}

/// Scroll-triggered pagination state machine
pub struct PaginationController {
    options: PagerOptions,
    builder: ParamBuilder,
    policy: Arc<dyn ExhaustionPolicy>,
    state: PaginationState,
    gate: RequestGate,
    phase: Phase,
    next_request: RequestId,
    scroll: Arc<dyn ScrollSource>,
    content: Arc<dyn ContentMeasure>,
    collection: Arc<dyn Collection>,
}

impl PaginationController {
    /// Create a controller
    ///
    /// Fails on invalid configuration or when the content is not attached
    /// to a scroll container.
    pub fn new(
        options: impl Into<PagerOptions>,
        scroll: Arc<dyn ScrollSource>,
        content: Arc<dyn ContentMeasure>,
        collection: Arc<dyn Collection>,
    ) -> Result<Self> {
        let options = options.into();
        options.validate()?;

        if !content.is_attached() {
            warn!("Pager initialized with content that is not attached to a scroll container");
            return Err(Error::Detached);
        }

        let page_size = options.resolve_page_size(collection.len());
        let builder = options.param_builder(page_size);
        let policy = options.policy();
        let state =
            PaginationState::new(builder.cursor_kind(), options.config.initial_pages, page_size);

        debug!(
            "Pager created: page_size={}, cursor={:?}, policy={}",
            page_size,
            builder.cursor_kind(),
            policy.name()
        );

        Ok(Self {
            options,
            builder,
            policy,
            state,
            gate: RequestGate::new(),
            phase: Phase::Idle,
            next_request: RequestId(1),
            scroll,
            content,
            collection,
        })
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Pagination state
    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    /// Request gate
    pub fn gate(&self) -> &RequestGate {
        &self.gate
    }

    /// Options this controller was built with
    pub fn options(&self) -> &PagerOptions {
        &self.options
    }

    /// Read-only view of the state
    pub fn snapshot(&self) -> PagerSnapshot {
        PagerSnapshot {
            phase: self.phase,
            cursor_kind: self.state.cursor.kind(),
            page: self.state.cursor.page(),
            key: self.state.cursor.key().cloned(),
            page_size: self.state.page_size,
            enabled: self.gate.is_enabled(),
            in_flight: self.gate.is_in_flight(),
            last_known_scroll_extent: self.state.last_known_scroll_extent,
        }
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// The collection was reset: start a fresh pagination sequence
    ///
    /// A request still outstanding becomes stale and its settlement is
    /// ignored.
    pub fn on_reset(&mut self) {
        if self.phase.is_destroyed() {
            return;
        }
        if let Phase::AwaitingFetch { request } = self.phase {
            debug!("Reset while {} is outstanding; it will be ignored", request);
        }
        self.state.reset();
        self.gate.reset();
        self.phase = Phase::Idle;
    }

    /// The scroll container scrolled
    pub fn on_scroll(&mut self) -> Option<FetchTicket> {
        self.evaluate(Trigger::Scroll)
    }

    /// The viewport changed size (already coalesced by the caller)
    pub fn on_resize(&mut self) -> Option<FetchTicket> {
        self.evaluate(Trigger::Resize)
    }

    /// Check again after a load or sync, without the direction guard
    pub fn recheck(&mut self) -> Option<FetchTicket> {
        self.evaluate(Trigger::Recheck)
    }

    /// Report the outcome of the request behind a ticket
    pub fn on_fetch_settled(
        &mut self,
        request: RequestId,
        outcome: &Result<FetchResponse>,
    ) -> Settlement {
        match self.phase {
            Phase::AwaitingFetch { request: current } if current == request => {}
            Phase::Destroyed => {
                debug!("Ignoring settlement of {} after destroy", request);
                return Settlement::Ignored;
            }
            _ => {
                debug!("Ignoring stale settlement of {}", request);
                return Settlement::Ignored;
            }
        }

        self.phase = Phase::Idle;

        match outcome {
            Ok(response) => {
                let last_key = self.builder.key_accessor().and_then(|accessor| {
                    self.collection
                        .last_item()
                        .and_then(|item| accessor.key_of(&item))
                });
                self.state.cursor.advance(last_key);

                let has_more = self
                    .policy
                    .has_more_after_fetch(&self.page_context(), response);
                self.gate.release(has_more);

                let page = self.state.cursor.page();
                debug!(
                    "Loaded {} item(s) for {}, pages={}",
                    response.items.len(),
                    request,
                    page
                );
                if !has_more {
                    info!("Pagination exhausted after {} page(s)", page);
                }

                Settlement::Loaded {
                    page,
                    exhausted: !has_more,
                }
            }
            Err(err) => {
                self.gate.release(true);
                warn!("Fetch {} failed: {}", request, err);
                Settlement::Failed
            }
        }
    }

    /// The collection synced on its own (not necessarily by our request)
    pub fn on_collection_synced(&mut self, origin: SyncOrigin, response: &JsonValue) -> SyncAction {
        if self.phase.is_destroyed() || origin != SyncOrigin::Collection {
            return SyncAction::Ignored;
        }

        let response = FetchResponse::from_raw(response.clone());
        let verdict = self
            .policy
            .on_external_sync(&self.page_context(), &response);
        match verdict {
            SyncVerdict::Enable => self.gate.enable(),
            SyncVerdict::Disable => {
                debug!("Collection sync reports no more pages");
                self.gate.disable();
            }
            SyncVerdict::Keep => {}
        }

        SyncAction::Applied {
            verdict,
            recheck: self.phase.is_idle() && self.gate.is_enabled(),
        }
    }

    /// Measure a different scroll container from now on
    pub fn replace_scroll_source(&mut self, scroll: Arc<dyn ScrollSource>) {
        if self.phase.is_destroyed() {
            return;
        }
        self.scroll = scroll;
        self.state.last_known_scroll_extent = 0.0;
    }

    /// Tear down; later calls are no-ops
    pub fn destroy(&mut self) {
        if !self.phase.is_destroyed() {
            debug!("Pager destroyed at page {}", self.state.cursor.page());
        }
        self.phase = Phase::Destroyed;
    }

    // ========================================================================
    // Evaluation
    // ========================================================================

    fn evaluate(&mut self, trigger: Trigger) -> Option<FetchTicket> {
        if self.phase.is_destroyed() {
            return None;
        }

        let extent = match self.measure_scroll_extent() {
            Ok(extent) => extent,
            Err(err) => {
                debug!("Skipping {:?} check: {}", trigger, err);
                return None;
            }
        };

        if trigger == Trigger::Resize {
            self.state.last_known_scroll_extent = 0.0;
        }

        let toward_end =
            trigger == Trigger::Recheck || extent >= self.state.last_known_scroll_extent;
        let ticket = if toward_end { self.try_issue() } else { None };

        self.state.last_known_scroll_extent = extent;
        ticket
    }

    fn try_issue(&mut self) -> Option<FetchTicket> {
        if !self.phase.is_idle() || !self.gate.can_acquire() {
            return None;
        }

        if !self.policy.admits(&self.page_context()) {
            info!(
                "Collection holds {} item(s), expected {}; stopping pagination",
                self.collection.len(),
                self.state.expected_len()
            );
            self.gate.disable();
            return None;
        }

        if !self.needs_more_content() {
            return None;
        }

        if !self.gate.try_acquire() {
            return None;
        }

        let Some(params) = self.builder.build(&self.state.cursor, self.collection.as_ref()) else {
            debug!("No cursor key available; skipping fetch");
            self.gate.release(true);
            return None;
        };

        let request = self.next_request;
        self.next_request = request.next();
        self.phase = Phase::AwaitingFetch { request };

        let page = self.state.cursor.page();
        debug!("Issuing fetch {} for page {}", request, page + 1);

        Some(FetchTicket {
            request,
            page,
            params,
            remove: self.options.config.remove,
        })
    }

    fn needs_more_content(&self) -> bool {
        match self.measure_geometry() {
            Ok(geometry) => geometry.needs_more(self.options.config.buffer_pixels),
            Err(err) => {
                debug!("Geometry unavailable, not fetching: {}", err);
                false
            }
        }
    }

    fn measure_geometry(&self) -> Result<ViewportGeometry> {
        Ok(ViewportGeometry::new(
            self.scroll.scroll_offset()?,
            self.scroll.viewport_size()?,
            self.content.content_extent()?,
        ))
    }

    fn measure_scroll_extent(&self) -> Result<f64> {
        let offset = self.scroll.scroll_offset()?;
        let viewport = self.scroll.viewport_size()?;
        Ok(geometry::scroll_extent(offset, viewport))
    }

    fn page_context(&self) -> PageContext<'_> {
        PageContext {
            collection: self.collection.as_ref(),
            cursor: &self.state.cursor,
            page_size: self.state.page_size,
        }
    }
}

impl fmt::Debug for PaginationController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginationController")
            .field("phase", &self.phase)
            .field("state", &self.state)
            .field("gate", &self.gate)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
