//! Runtime types

use crate::controller::PagerSnapshot;
use crate::error::{Error, Result};
use crate::ports::{Collection, ContentMeasure, DataSource, FetchResponse, Notification, ScrollSource};
use crate::types::RequestId;
use std::fmt;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Success callback
pub type SuccessFn = Arc<dyn Fn(&FetchResponse) + Send + Sync>;

/// Error callback
pub type ErrorFn = Arc<dyn Fn(&Error) + Send + Sync>;

/// Hooks invoked after a fetch settles
///
/// Both run on the pager task after the controller has applied the
/// outcome. Stale settlements and settlements after destroy invoke nothing.
#[derive(Clone, Default)]
pub struct Callbacks {
    on_success: Option<SuccessFn>,
    on_error: Option<ErrorFn>,
}

impl Callbacks {
    /// No callbacks
    pub fn new() -> Self {
        Self::default()
    }

    /// Called with the response of every successful fetch
    #[must_use]
    pub fn on_success(mut self, f: impl Fn(&FetchResponse) + Send + Sync + 'static) -> Self {
        self.on_success = Some(Arc::new(f));
        self
    }

    /// Called with the error of every failed fetch
    #[must_use]
    pub fn on_error(mut self, f: impl Fn(&Error) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub(crate) fn success(&self, response: &FetchResponse) {
        if let Some(f) = &self.on_success {
            f(response);
        }
    }

    pub(crate) fn error(&self, err: &Error) {
        if let Some(f) = &self.on_error {
            f(err);
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callbacks")
            .field("on_success", &self.on_success.is_some())
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

/// The adapters a pager runs against
#[derive(Clone)]
pub struct PagerPorts {
    /// Scroll container
    pub scroll: Arc<dyn ScrollSource>,
    /// Content measurement
    pub content: Arc<dyn ContentMeasure>,
    /// Backing collection
    pub collection: Arc<dyn Collection>,
    /// Performs fetches
    pub source: Arc<dyn DataSource>,
}

impl PagerPorts {
    /// Bundle the adapters
    pub fn new(
        scroll: Arc<dyn ScrollSource>,
        content: Arc<dyn ContentMeasure>,
        collection: Arc<dyn Collection>,
        source: Arc<dyn DataSource>,
    ) -> Self {
        Self {
            scroll,
            content,
            collection,
            source,
        }
    }
}

impl fmt::Debug for PagerPorts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PagerPorts").finish_non_exhaustive()
    }
}

/// One item on the pager queue
pub(crate) enum Event {
    /// From a port subscription or the handle
    Notify(Notification),
    /// A spawned fetch finished
    Settled {
        request: RequestId,
        outcome: Result<FetchResponse>,
    },
    /// Deferred check after a load or sync
    Recheck,
    /// From the handle
    Command(Command),
}

pub(crate) enum Command {
    Check,
    Reset,
    ReplaceScrollSource(Arc<dyn ScrollSource>),
    Snapshot(oneshot::Sender<PagerSnapshot>),
    Destroy(oneshot::Sender<()>),
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Notify(notification) => f.debug_tuple("Notify").field(notification).finish(),
            Self::Settled { request, outcome } => f
                .debug_struct("Settled")
                .field("request", request)
                .field("ok", &outcome.is_ok())
                .finish(),
            Self::Recheck => f.write_str("Recheck"),
            Self::Command(command) => f.debug_tuple("Command").field(command).finish(),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Check => "Check",
            Self::Reset => "Reset",
            Self::ReplaceScrollSource(_) => "ReplaceScrollSource",
            Self::Snapshot(_) => "Snapshot",
            Self::Destroy(_) => "Destroy",
        };
        f.write_str(name)
    }
}
