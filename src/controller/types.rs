//! Controller types
//!
//! Phases, tickets and outcomes exchanged between the controller and the
//! runtime that drives it.

use crate::pagination::{CursorKind, SyncVerdict};
use crate::ports::FetchRequest;
use crate::types::{JsonValue, ParameterMap, RequestId};
use serde::Serialize;

/// Where the controller is in the request lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum Phase {
    /// No request outstanding
    Idle,
    /// A request was admitted and handed to the data source
    AwaitingFetch {
        /// The outstanding request
        request: RequestId,
    },
    /// Torn down; every further call is a no-op
    Destroyed,
}

impl Phase {
    /// Check if idle
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Check if destroyed
    pub fn is_destroyed(&self) -> bool {
        matches!(self, Self::Destroyed)
    }
}

/// Permission to perform exactly one fetch
///
/// Every ticket must be answered with exactly one
/// `PaginationController::on_fetch_settled` carrying the same id.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    /// Identifies the request
    pub request: RequestId,
    /// Pages loaded when the request was issued
    pub page: u32,
    /// Parameters for the data source
    pub params: ParameterMap,
    /// Replace instead of append
    pub remove: bool,
}

impl FetchTicket {
    /// The request handed to the data source
    pub fn to_request(&self) -> FetchRequest {
        FetchRequest {
            params: self.params.clone(),
            remove: self.remove,
        }
    }
}

/// What a settlement did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Not the outstanding request, or the controller is destroyed
    Ignored,
    /// A page was loaded
    Loaded {
        /// Pages loaded after this one
        page: u32,
        /// The data source has no more pages
        exhausted: bool,
    },
    /// The fetch failed; fetching stays enabled
    Failed,
}

/// What an external sync did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncAction {
    /// Not a collection-level sync, or the controller is destroyed
    Ignored,
    /// The exhaustion strategy was consulted
    Applied {
        /// Gate change requested by the strategy
        verdict: SyncVerdict,
        /// A deferred re-check should be queued
        recheck: bool,
    },
}

impl SyncAction {
    /// Whether the runtime should queue a re-check
    pub fn wants_recheck(&self) -> bool {
        matches!(self, Self::Applied { recheck: true, .. })
    }
}

/// Read-only view of the controller state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagerSnapshot {
    /// Lifecycle phase
    pub phase: Phase,
    /// Cursor kind
    pub cursor_kind: CursorKind,
    /// Pages loaded so far
    pub page: u32,
    /// Last item key (key mode)
    pub key: Option<JsonValue>,
    /// Items per page
    pub page_size: u32,
    /// Fetching allowed (not exhausted)
    pub enabled: bool,
    /// A request is outstanding
    pub in_flight: bool,
    /// Last observed scroll extent
    pub last_known_scroll_extent: f64,
}
