//! Pager runtime
//!
//! Drives a [`PaginationController`] on a single tokio task.
//!
//! # Overview
//!
//! Everything that can change the controller arrives on one unbounded
//! queue: port notifications, fetch completions, deferred re-checks and
//! commands from [`PagerHandle`]. The task owns the controller and handles
//! one queue item at a time, so no locking is involved.
//!
//! - Fetches run in their own task and post `Settled` back to the queue,
//!   exactly once per ticket.
//! - After a page loads, the follow-up check is queued as a separate item
//!   rather than run inline.
//! - Resize notifications are coalesced with a trailing-edge window before
//!   they reach the controller.
//!
//! ```rust,ignore
//! let handle = Pager::spawn(config, ports, Callbacks::new())?;
//! // ... the user scrolls ...
//! handle.destroy().await?;
//! ```

mod debounce;
mod types;

pub use types::{Callbacks, ErrorFn, PagerPorts, SuccessFn};

use crate::config::PagerOptions;
use crate::controller::{FetchTicket, PagerSnapshot, PaginationController, Settlement};
use crate::error::{Error, Result};
use crate::ports::{DataSource, EventSink, Notification, ScrollSource, Subscription};
use debounce::Debouncer;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, trace, warn};
use types::{Command, Event};

/// The pager task
///
/// Created through [`Pager::spawn`]; all interaction afterwards goes
/// through the returned [`PagerHandle`].
pub struct Pager {
    controller: PaginationController,
    source: Arc<dyn DataSource>,
    callbacks: Callbacks,
    tx: mpsc::UnboundedSender<Event>,
    rx: mpsc::UnboundedReceiver<Event>,
    resize: Debouncer,
    scroll_subscription: Option<Subscription>,
    collection_subscription: Option<Subscription>,
}

impl Pager {
    /// Build a controller over `ports`, subscribe to them and start the task
    ///
    /// Must be called from within a tokio runtime. On error nothing is
    /// subscribed and no task is started. A first check is queued right
    /// away so a viewport that is already short gets filled.
    pub fn spawn(
        options: impl Into<PagerOptions>,
        ports: PagerPorts,
        callbacks: Callbacks,
    ) -> Result<PagerHandle> {
        let options = options.into();
        let window = options.config.resize_debounce();
        let controller = PaginationController::new(
            options,
            Arc::clone(&ports.scroll),
            ports.content,
            Arc::clone(&ports.collection),
        )?;

        let (tx, rx) = mpsc::unbounded_channel();
        let scroll_subscription = ports.scroll.subscribe(sink(&tx));
        let collection_subscription = ports.collection.subscribe(sink(&tx));

        let pager = Self {
            controller,
            source: ports.source,
            callbacks,
            tx: tx.clone(),
            rx,
            resize: Debouncer::new(window),
            scroll_subscription: Some(scroll_subscription),
            collection_subscription: Some(collection_subscription),
        };

        let handle = PagerHandle { tx };
        handle.send(Command::Check)?;
        tokio::spawn(pager.run());

        debug!("Pager started (resize window {:?})", window);
        Ok(handle)
    }

    async fn run(mut self) {
        loop {
            let event = tokio::select! {
                event = self.rx.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
                () = self.resize.elapsed() => {
                    let ticket = self.controller.on_resize();
                    self.dispatch(ticket);
                    continue;
                }
            };

            trace!("Pager event: {:?}", event);
            if !self.handle(event) {
                break;
            }
        }
        debug!("Pager task stopped");
    }

    /// Apply one queue item; false stops the loop
    fn handle(&mut self, event: Event) -> bool {
        match event {
            Event::Notify(notification) => self.on_notification(notification),
            Event::Settled { request, outcome } => {
                match self.controller.on_fetch_settled(request, &outcome) {
                    Settlement::Ignored => {}
                    Settlement::Loaded { exhausted, .. } => {
                        if let Ok(response) = &outcome {
                            self.callbacks.success(response);
                        }
                        if !exhausted {
                            self.post(Event::Recheck);
                        }
                    }
                    Settlement::Failed => {
                        if let Err(err) = &outcome {
                            if !err.is_retryable() {
                                warn!("Fetch {} failed and will not succeed on retry: {}", request, err);
                            }
                            self.callbacks.error(err);
                        }
                    }
                }
            }
            Event::Recheck => {
                let ticket = self.controller.recheck();
                self.dispatch(ticket);
            }
            Event::Command(command) => return self.on_command(command),
        }
        true
    }

    fn on_notification(&mut self, notification: Notification) {
        match notification {
            Notification::Scroll => {
                let ticket = self.controller.on_scroll();
                self.dispatch(ticket);
            }
            Notification::Resize => self.resize.trigger(),
            Notification::Reset => self.controller.on_reset(),
            Notification::Synced { origin, response } => {
                let action = self.controller.on_collection_synced(origin, &response);
                if action.wants_recheck() {
                    self.post(Event::Recheck);
                }
            }
        }
    }

    fn on_command(&mut self, command: Command) -> bool {
        match command {
            Command::Check => {
                let ticket = self.controller.recheck();
                self.dispatch(ticket);
            }
            Command::Reset => self.controller.on_reset(),
            Command::ReplaceScrollSource(scroll) => {
                if let Some(old) = self.scroll_subscription.take() {
                    old.unsubscribe();
                }
                self.scroll_subscription = Some(scroll.subscribe(sink(&self.tx)));
                self.controller.replace_scroll_source(scroll);
            }
            Command::Snapshot(reply) => {
                let _ = reply.send(self.controller.snapshot());
            }
            Command::Destroy(ack) => {
                self.shutdown();
                let _ = ack.send(());
                return false;
            }
        }
        true
    }

    fn shutdown(&mut self) {
        if let Some(subscription) = self.scroll_subscription.take() {
            subscription.unsubscribe();
        }
        if let Some(subscription) = self.collection_subscription.take() {
            subscription.unsubscribe();
        }
        self.resize.cancel();
        self.controller.destroy();
        self.rx.close();
    }

    fn post(&self, event: Event) {
        // Only fails once the loop has stopped
        let _ = self.tx.send(event);
    }

    fn dispatch(&self, ticket: Option<FetchTicket>) {
        let Some(ticket) = ticket else {
            return;
        };

        let source = Arc::clone(&self.source);
        let tx = self.tx.clone();
        let request = ticket.to_request();
        let id = ticket.request;

        tokio::spawn(async move {
            let fetch = tokio::spawn(async move { source.fetch(request).await });
            let outcome = match fetch.await {
                Ok(outcome) => outcome,
                Err(err) => {
                    warn!("Fetch task {} did not complete: {}", id, err);
                    Err(Error::fetch(format!("fetch task did not complete: {err}")))
                }
            };
            // The queue is closed after destroy; the result is dropped
            let _ = tx.send(Event::Settled {
                request: id,
                outcome,
            });
        });
    }
}

fn sink(tx: &mpsc::UnboundedSender<Event>) -> EventSink {
    let tx = tx.clone();
    EventSink::new(move |notification| tx.send(Event::Notify(notification)).is_ok())
}

/// Handle to a running pager
///
/// Cheap to clone. Dropping every handle does not stop the pager: the task
/// keeps its own sender for re-checks and fetch results, so it runs on its
/// subscriptions until the runtime shuts down. Call [`PagerHandle::destroy`]
/// before the last handle goes away, or the task and its subscriptions leak.
#[derive(Clone)]
pub struct PagerHandle {
    tx: mpsc::UnboundedSender<Event>,
}

impl PagerHandle {
    fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(Event::Command(command))
            .map_err(|_| Error::Destroyed)
    }

    /// Queue a check without the scroll direction guard
    pub fn check(&self) -> Result<()> {
        self.send(Command::Check)
    }

    /// Start a fresh pagination sequence
    pub fn reset(&self) -> Result<()> {
        self.send(Command::Reset)
    }

    /// Measure and listen to a different scroll container
    pub fn replace_scroll_source(&self, scroll: Arc<dyn ScrollSource>) -> Result<()> {
        self.send(Command::ReplaceScrollSource(scroll))
    }

    /// Inject a notification as if a port had delivered it
    pub fn notify(&self, notification: Notification) -> Result<()> {
        self.tx
            .send(Event::Notify(notification))
            .map_err(|_| Error::Destroyed)
    }

    /// A sink feeding this pager, for ports subscribed by hand
    pub fn sink(&self) -> EventSink {
        sink(&self.tx)
    }

    /// Current controller state
    ///
    /// Answered in queue order, after everything queued before it.
    pub async fn snapshot(&self) -> Result<PagerSnapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Snapshot(reply))?;
        rx.await.map_err(|_| Error::Destroyed)
    }

    /// Unsubscribe from every port and stop the task
    ///
    /// Idempotent. Fetches still running complete into a closed queue and
    /// are ignored.
    pub async fn destroy(&self) -> Result<()> {
        let (ack, rx) = oneshot::channel();
        if self.send(Command::Destroy(ack)).is_err() {
            return Ok(());
        }
        // A concurrent destroy may stop the loop first
        let _ = rx.await;
        Ok(())
    }

    /// Whether the pager task has stopped
    pub fn is_destroyed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl std::fmt::Debug for PagerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PagerHandle")
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}
