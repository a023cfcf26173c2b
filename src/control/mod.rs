//! Operator control over a running crawl
//!
//! A [`ControlState`] is created per crawl run and cloned into every worker.
//! Pause only keeps new fetches from starting; stop is terminal and is
//! observed at every suspension point through a cancellation token.

mod commands;

pub use commands::{spawn_signal_listener, spawn_stdin_listener, ControlCommand};

use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

/// Shared pause/stop state for one crawl run
#[derive(Debug, Clone)]
pub struct ControlState {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    paused: watch::Sender<bool>,
    cancel: CancellationToken,
}

impl ControlState {
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                paused,
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Pauses the crawl, returning whether the state changed
    pub fn pause(&self) -> bool {
        if self.is_stopped() {
            return false;
        }
        !self.inner.paused.send_replace(true)
    }

    /// Resumes the crawl, returning whether the state changed
    pub fn resume(&self) -> bool {
        self.inner.paused.send_replace(false)
    }

    /// Stops the crawl. Idempotent.
    pub fn stop(&self) {
        self.inner.cancel.cancel();
    }

    pub fn is_paused(&self) -> bool {
        *self.inner.paused.borrow()
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Token cancelled when the crawl is stopped
    pub fn cancelled(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    /// Applies an operator command
    pub fn apply(&self, command: ControlCommand) {
        match command {
            ControlCommand::Pause => {
                if self.pause() {
                    tracing::info!("Crawl paused; in-flight fetches will finish");
                }
            }
            ControlCommand::Resume => {
                if self.resume() {
                    tracing::info!("Crawl resumed");
                }
            }
            ControlCommand::Stop => {
                if !self.is_stopped() {
                    tracing::info!("Stop requested; draining pending saves");
                }
                self.stop();
            }
        }
    }

    /// Waits until the crawl is not paused
    ///
    /// No lock is held while waiting.
    ///
    /// # Returns
    ///
    /// * `true` - The crawl is running
    /// * `false` - The crawl was stopped
    pub async fn wait_while_paused(&self) -> bool {
        let mut rx = self.inner.paused.subscribe();
        loop {
            if self.is_stopped() {
                return false;
            }
            if !*rx.borrow_and_update() {
                return true;
            }
            tokio::select! {
                _ = self.inner.cancel.cancelled() => return false,
                changed = rx.changed() => {
                    if changed.is_err() {
                        return !self.is_stopped();
                    }
                }
            }
        }
    }
}

impl Default for ControlState {
    fn default() -> Self {
        Self::new()
    }
}
