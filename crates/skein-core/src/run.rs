//! Run types: the finite-state object driven by the coordinator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identifiers::{AssistantId, RunId, ThreadId};
use crate::tool::ToolCall;

/// One execution attempt of an assistant against a thread's current state.
///
/// A run is created by the coordinator and mutated only by the remote
/// service. The coordinator never writes `status` directly; it reads it via
/// polling and influences it only through tool-output submission or
/// cancellation, both of which transition state remotely.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Unique identifier for the run
    pub id: RunId,

    /// Thread this run executes against
    pub thread_id: ThreadId,

    /// Assistant driving the run
    pub assistant_id: AssistantId,

    /// Current status as last reported by the service
    pub status: RunStatus,

    /// Pending tool calls, present only while status is `requires_action`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_action: Option<RequiredAction>,

    /// Error detail reported by the service for failed runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<RunError>,

    /// When the run was created
    pub created_at: DateTime<Utc>,
}

impl Run {
    /// Check if the run is in a terminal state
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Check if the run is waiting on locally executed tool calls
    pub fn requires_action(&self) -> bool {
        self.status == RunStatus::RequiresAction
    }
}

/// Run status reported by the remote service.
///
/// The full lifecycle:
///
/// ```text
/// queued -> in_progress -> completed          (terminal, success)
/// queued -> in_progress -> requires_action -> in_progress -> ... -> completed
/// queued -> in_progress -> failed             (terminal, error)
/// queued -> in_progress -> cancelled          (terminal, user cancel)
/// queued -> in_progress -> expired            (terminal, service-side timeout)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Accepted by the service, not yet executing
    Queued,

    /// Actively executing
    InProgress,

    /// Waiting for the caller to execute tool calls and submit outputs
    RequiresAction,

    /// Finished successfully
    Completed,

    /// Finished with a service-reported error
    Failed,

    /// Cancelled on caller request
    Cancelled,

    /// Abandoned by the service after its own deadline
    Expired,
}

impl RunStatus {
    /// Check if this status represents a terminal state.
    ///
    /// Terminal states are final; no further automatic transition occurs.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled | RunStatus::Expired
        )
    }

    /// Check if this status means the run is still being worked on remotely
    /// and the coordinator should keep waiting.
    pub fn is_active(self) -> bool {
        matches!(self, RunStatus::Queued | RunStatus::InProgress)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Queued => write!(f, "queued"),
            RunStatus::InProgress => write!(f, "in_progress"),
            RunStatus::RequiresAction => write!(f, "requires_action"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
            RunStatus::Cancelled => write!(f, "cancelled"),
            RunStatus::Expired => write!(f, "expired"),
        }
    }
}

/// The batch of tool calls a `requires_action` run is blocked on.
///
/// By service contract the batch is non-empty; the coordinator treats an
/// empty batch as a contract violation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequiredAction {
    /// Tool calls that must all be answered before the run resumes
    pub tool_calls: Vec<ToolCall>,
}

impl RequiredAction {
    /// Create a new required action batch
    pub fn new(tool_calls: Vec<ToolCall>) -> Self {
        Self { tool_calls }
    }
}

/// Structured error detail attached to a failed run by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunError {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable description
    pub message: String,
}

/// The record returned once a run reaches a terminal state.
///
/// Retrying a terminal run is always the caller's decision (start a new
/// run); the coordinator never retries terminal states itself.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalRun {
    /// The run that terminated
    pub run_id: RunId,

    /// Thread the run executed against
    pub thread_id: ThreadId,

    /// The terminal status that was reached
    pub status: RunStatus,

    /// Error detail, populated for `failed` runs
    pub error: Option<RunError>,
}

impl TerminalRun {
    /// Build a terminal record from a run known to be terminal.
    ///
    /// Returns `None` if the run is still active or requires action.
    pub fn from_run(run: &Run) -> Option<Self> {
        if !run.is_terminal() {
            return None;
        }
        Some(Self {
            run_id: run.id.clone(),
            thread_id: run.thread_id.clone(),
            status: run.status,
            error: run.last_error.clone(),
        })
    }

    /// Check if the run finished successfully
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }
}
