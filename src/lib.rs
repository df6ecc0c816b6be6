// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::needless_pass_by_value)]

//! # infiniscroll
//!
//! Scroll-triggered pagination: watch a scrollable viewport, decide when the
//! rendered content is close enough to its end to need another page, and
//! keep at most one page request in flight until the data source runs dry.
//!
//! ## Features
//!
//! - **Geometry check**: fetch once the content's trailing edge is within a buffer
//! - **Single flight**: one outstanding request, guarded by a request gate
//! - **Cursor modes**: page number, offset, or key of the last loaded item
//! - **Exhaustion strategies**: strict (collection size) or lenient (response)
//! - **Ports**: scroll source, content measure, collection and data source traits
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use infiniscroll::{Callbacks, Pager, PagerConfig, PagerPorts, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = PagerConfig::from_file("pager.yaml")?;
//!     let ports = PagerPorts::new(viewport.clone(), viewport, collection, source);
//!
//!     let pager = Pager::spawn(config, ports, Callbacks::new())?;
//!     // Scroll notifications now drive fetches
//!
//!     pager.destroy().await
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      runtime::Pager                          │
//! │   event queue → controller → FetchTicket → spawned fetch     │
//! └──────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬─────────────────────┐
//! │ Geometry │   Gate    │  Pagination   │        Ports        │
//! ├──────────┼───────────┼───────────────┼─────────────────────┤
//! │ Buffer   │ Enabled   │ Cursor        │ ScrollSource        │
//! │ Extent   │ In flight │ Params        │ ContentMeasure      │
//! │          │           │ Exhaustion    │ Collection          │
//! │          │           │               │ DataSource          │
//! └──────────┴───────────┴───────────────┴─────────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Viewport geometry
pub mod geometry;

/// Request admission control
pub mod gate;

/// Cursor, parameters and exhaustion strategies
pub mod pagination;

/// Pagination state machine
pub mod controller;

/// Traits for the outside world
pub mod ports;

/// Configuration
pub mod config;

/// Async event loop
pub mod runtime;

/// In-memory adapters
pub mod sim;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{PagerConfig, PagerOptions};
pub use controller::{FetchTicket, PagerSnapshot, PaginationController, Phase, Settlement};
pub use ports::{
    Collection, ContentMeasure, DataSource, EventSink, FetchRequest, FetchResponse, Notification,
    ScrollSource, Subscription,
};
pub use runtime::{Callbacks, Pager, PagerHandle, PagerPorts};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
