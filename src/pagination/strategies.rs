//! Exhaustion strategies
//!
//! Each strategy decides when the data source has run out of pages. The
//! controller consults the strategy in three places: before admitting a
//! fetch, after a fetch settles, and when the collection syncs on its own.

use super::types::{extract_path_value, Cursor};
use crate::ports::{Collection, FetchResponse};
use crate::types::JsonValue;
use std::fmt;
use std::sync::Arc;

/// Predicate deciding whether more pages exist after a response
pub type HasMoreFn = Arc<dyn Fn(&dyn Collection, &FetchResponse) -> bool + Send + Sync>;

/// What the strategy saw
pub struct PageContext<'a> {
    /// The backing collection
    pub collection: &'a dyn Collection,
    /// Cursor after any advance for the current fetch
    pub cursor: &'a Cursor,
    /// Items per page
    pub page_size: u32,
}

impl PageContext<'_> {
    /// True when every loaded page came back full
    pub fn pages_full(&self) -> bool {
        self.collection.len() as u64 >= self.cursor.offset(self.page_size)
    }
}

/// How an external sync changes the gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncVerdict {
    /// Allow fetching again
    Enable,
    /// Stop fetching
    Disable,
    /// Leave the gate as it is
    Keep,
}

/// Strategy for detecting exhaustion
pub trait ExhaustionPolicy: Send + Sync + fmt::Debug {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Checked before admitting a fetch; false disables the gate
    fn admits(&self, _ctx: &PageContext<'_>) -> bool {
        true
    }

    /// Checked after a successful fetch; false disables the gate
    fn has_more_after_fetch(&self, ctx: &PageContext<'_>, response: &FetchResponse) -> bool;

    /// Checked when the collection syncs without this pager asking
    fn on_external_sync(&self, ctx: &PageContext<'_>, response: &FetchResponse) -> SyncVerdict;
}

// ============================================================================
// Strict
// ============================================================================

/// Exhaustion from the collection size alone
///
/// Pagination is over once `collection.len() < page * page_size`, i.e. some
/// loaded page came back short. Any collection sync re-enables fetching and
/// the size check before the next admission decides again.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictPolicy;

impl ExhaustionPolicy for StrictPolicy {
    fn name(&self) -> &'static str {
        "strict"
    }

    fn admits(&self, ctx: &PageContext<'_>) -> bool {
        ctx.pages_full()
    }

    fn has_more_after_fetch(&self, ctx: &PageContext<'_>, _response: &FetchResponse) -> bool {
        ctx.pages_full()
    }

    fn on_external_sync(&self, _ctx: &PageContext<'_>, _response: &FetchResponse) -> SyncVerdict {
        SyncVerdict::Enable
    }
}

// ============================================================================
// Lenient
// ============================================================================

/// Exhaustion from the response
///
/// Uses the caller's predicate when one is given, otherwise treats a page
/// shorter than `page_size` as the last one. Only an explicit predicate is
/// consulted for external syncs.
#[derive(Clone, Default)]
pub struct LenientPolicy {
    predicate: Option<HasMoreFn>,
}

impl LenientPolicy {
    /// Short-page detection
    pub fn new() -> Self {
        Self { predicate: None }
    }

    /// Use an explicit predicate
    pub fn with_predicate(predicate: HasMoreFn) -> Self {
        Self {
            predicate: Some(predicate),
        }
    }

    /// Whether an explicit predicate is configured
    pub fn has_predicate(&self) -> bool {
        self.predicate.is_some()
    }
}

impl ExhaustionPolicy for LenientPolicy {
    fn name(&self) -> &'static str {
        "lenient"
    }

    fn has_more_after_fetch(&self, ctx: &PageContext<'_>, response: &FetchResponse) -> bool {
        match &self.predicate {
            Some(predicate) => predicate(ctx.collection, response),
            None => response.items.len() as u64 >= u64::from(ctx.page_size),
        }
    }

    fn on_external_sync(&self, ctx: &PageContext<'_>, response: &FetchResponse) -> SyncVerdict {
        match &self.predicate {
            Some(predicate) if !predicate(ctx.collection, response) => SyncVerdict::Disable,
            _ => SyncVerdict::Keep,
        }
    }
}

impl fmt::Debug for LenientPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LenientPolicy")
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

// ============================================================================
// Predicates
// ============================================================================

/// Ready-made [`HasMoreFn`] predicates
pub struct HasMore;

impl HasMore {
    /// Read a boolean flag from the raw response (e.g. `has_more`)
    ///
    /// A missing or non-boolean flag means no more pages.
    pub fn field(path: impl Into<String>) -> HasMoreFn {
        let path = path.into();
        Arc::new(move |_collection, response| {
            matches!(
                extract_path_value(&response.raw, &path),
                Some(JsonValue::Bool(true))
            )
        })
    }

    /// More pages while the response returned at least one item
    pub fn non_empty() -> HasMoreFn {
        Arc::new(|_collection, response| !response.items.is_empty())
    }

    /// More pages while the collection holds fewer than `total` items
    pub fn below_total(total: usize) -> HasMoreFn {
        Arc::new(move |collection, _response| collection.len() < total)
    }
}
