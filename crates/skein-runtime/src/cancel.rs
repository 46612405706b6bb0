//! Cooperative cancellation for in-flight runs.
//!
//! A cancellation signal is only observed at the coordinator's single
//! suspension point per poll iteration. A tool handler that has started
//! always completes before cancellation takes effect, so a
//! `requires_action` run is never left half-answered.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

#[derive(Debug, Default)]
pub(crate) struct CancelState {
    requested: AtomicBool,
    notify: Notify,
}

impl CancelState {
    pub(crate) fn is_requested(&self) -> bool {
        self.requested.load(Ordering::Acquire)
    }

    /// Wake the poll loop if it is currently parked at its wait point
    pub(crate) async fn notified(&self) {
        self.notify.notified().await;
    }
}

/// Handle for requesting cancellation of a run being awaited.
///
/// Cloneable and cheap; any clone may signal. The request is idempotent.
#[derive(Debug, Clone)]
pub struct RunCanceller {
    state: Arc<CancelState>,
}

impl RunCanceller {
    pub(crate) fn new(state: Arc<CancelState>) -> Self {
        Self { state }
    }

    /// Request cancellation.
    ///
    /// Honored at the next wait boundary of `await_completion`, never
    /// mid-tool-invocation. The coordinator then asks the remote service to
    /// cancel the run.
    pub fn cancel(&self) {
        self.state.requested.store(true, Ordering::Release);
        self.state.notify.notify_waiters();
    }

    /// Check whether cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.state.is_requested()
    }
}
