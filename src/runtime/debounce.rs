//! Trailing-edge debouncer

use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Coalesces bursts of triggers into one firing after a quiet window
///
/// Every `trigger` pushes the deadline out to `now + window`. `elapsed`
/// resolves once the deadline passes and disarms the debouncer; when
/// nothing is armed it never resolves, so it can sit in a `select!` arm.
#[derive(Debug)]
pub(crate) struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub(crate) fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Arm, or re-arm from now
    pub(crate) fn trigger(&mut self) {
        self.deadline = Some(Instant::now() + self.window);
    }

    pub(crate) fn cancel(&mut self) {
        self.deadline = None;
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Wait for the armed deadline
    ///
    /// Cancel safe: dropping the future before it resolves keeps the
    /// deadline armed.
    pub(crate) async fn elapsed(&mut self) {
        match self.deadline {
            Some(deadline) => {
                sleep_until(deadline).await;
                self.deadline = None;
            }
            None => std::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{advance, timeout};

    #[tokio::test(start_paused = true)]
    async fn test_fires_after_window() {
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        debouncer.trigger();
        assert!(debouncer.is_pending());

        let start = Instant::now();
        debouncer.elapsed().await;
        assert_eq!(start.elapsed(), Duration::from_millis(300));
        assert!(!debouncer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retrigger_extends_deadline() {
        let mut debouncer = Debouncer::new(Duration::from_millis(300));
        let start = Instant::now();

        debouncer.trigger();
        advance(Duration::from_millis(200)).await;
        debouncer.trigger();
        advance(Duration::from_millis(200)).await;
        debouncer.trigger();

        debouncer.elapsed().await;
        assert_eq!(start.elapsed(), Duration::from_millis(700));
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_never_fires() {
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        assert!(timeout(Duration::from_secs(5), debouncer.elapsed())
            .await
            .is_err());

        debouncer.trigger();
        debouncer.cancel();
        assert!(timeout(Duration::from_secs(5), debouncer.elapsed())
            .await
            .is_err());
    }
}
