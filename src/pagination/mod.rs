//! Pagination module
//!
//! Supports: Page Number, Offset, Last-Item Key
//!
//! # Overview
//!
//! The pagination module holds the cursor state the controller advances,
//! the builder that turns the cursor into request parameters, and the
//! strategies that decide when the data source is exhausted.

mod params;
mod strategies;
mod types;

pub use params::{DynamicParamsFn, ParamBuilder};
pub use strategies::{
    ExhaustionPolicy, HasMore, HasMoreFn, LenientPolicy, PageContext, StrictPolicy, SyncVerdict,
};
pub use types::{
    extract_path_value, Cursor, CursorKind, KeyAccessor, KeyFn, PaginationState, ParamNames,
};
