//! Run lifecycle events and the observer hook.
//!
//! The coordinator reports its progress through [`EventSink`] without
//! depending on any telemetry implementation. A sink that forwards events to
//! a monitoring service, a test recorder, and a no-op are all equally valid
//! subscribers.

use serde::{Deserialize, Serialize};

use crate::identifiers::{RunId, ThreadId, ToolCallId, ToolName};
use crate::run::RunStatus;

/// An event emitted by the coordinator during a run's lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunEvent {
    /// A run was created on the remote service
    RunStarted { run_id: RunId, thread_id: ThreadId },

    /// A status poll completed
    StatusPolled {
        run_id: RunId,
        status: RunStatus,
        poll: u32,
    },

    /// A tool call was dispatched to a registered handler
    ToolDispatched {
        run_id: RunId,
        tool_call_id: ToolCallId,
        name: ToolName,
    },

    /// A complete batch of tool outputs was submitted
    OutputsSubmitted { run_id: RunId, count: usize },

    /// The run reached a terminal state
    RunFinished { run_id: RunId, status: RunStatus },
}

/// Observer for coordinator run events.
///
/// Sinks must not block: they are invoked inline from the polling loop.
/// Failures inside a sink are the sink's problem; the coordinator neither
/// catches nor reports them.
pub trait EventSink: Send + Sync {
    /// Receive one lifecycle event
    fn on_event(&self, event: &RunEvent);
}

/// A sink that discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn on_event(&self, _event: &RunEvent) {}
}
