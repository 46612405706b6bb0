//! Coordinator error taxonomy.
//!
//! Every failure mode of a coordinated run maps to exactly one variant
//! here, and all of them surface to the immediate caller of
//! `await_completion` / `start_run` / `register_tool`. The coordinator
//! itself never logs beyond its event hook and tracing spans.

use std::time::Duration;

use crate::identifiers::{IdValidationError, ToolCallId, ToolName};
use crate::service::{ReferenceKind, ServiceError};

/// Result type for coordinator operations
pub type CoordinatorResult<T> = Result<T, CoordinatorError>;

/// Errors surfaced by the run coordinator
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// A thread/assistant/run reference is unknown to the remote service.
    /// Not retried; surfaced immediately.
    #[error("unknown {kind} reference '{reference}'")]
    InvalidReference {
        kind: ReferenceKind,
        reference: String,
    },

    /// The registry has no handler for one or more requested tool names.
    /// The dispatch batch aborts atomically: nothing was submitted, and the
    /// run remains in `requires_action` remotely until the caller registers
    /// the missing handlers and awaits again.
    #[error("no tool handler registered for: {}", join_names(.missing))]
    UnresolvedToolCalls { missing: Vec<ToolName> },

    /// A registered handler failed during invocation. Aborts the dispatch
    /// batch; no partial submission.
    #[error("tool handler '{name}' failed for call {tool_call_id}: {message}")]
    ToolHandler {
        tool_call_id: ToolCallId,
        name: ToolName,
        message: String,
    },

    /// A transient remote failure survived the bounded retry budget.
    #[error("remote call still failing after {attempts} attempt(s)")]
    Remote {
        attempts: u32,
        #[source]
        source: ServiceError,
    },

    /// The wall-clock budget elapsed while the run was non-terminal. The
    /// remote run is left running; cancellation happens only on explicit
    /// caller request.
    #[error("run did not reach a terminal state within {}", fmt_budget(.budget))]
    Timeout { budget: Duration },

    /// The remote service violated its contract (e.g. a `requires_action`
    /// run without pending tool calls).
    #[error("service contract violation: {message}")]
    Contract { message: String },

    /// An identifier failed validation before reaching the service.
    #[error("invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdValidationError),
}

impl CoordinatorError {
    /// Create a contract violation error
    pub fn contract(message: impl Into<String>) -> Self {
        Self::Contract {
            message: message.into(),
        }
    }

    /// Map a service error that was not (or no longer) worth retrying.
    ///
    /// `attempts` records how many times the call was tried; it is 1 for
    /// errors that never qualify for retry.
    pub fn from_service(error: ServiceError, attempts: u32) -> Self {
        match error {
            ServiceError::UnknownReference { kind, reference } => {
                Self::InvalidReference { kind, reference }
            }
            ServiceError::Contract { message } => Self::Contract { message },
            other => Self::Remote {
                attempts,
                source: other,
            },
        }
    }

    /// Check if the condition is recoverable by the caller without starting
    /// a new run (timeout: await again; unresolved tools: register and
    /// await again).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoordinatorError::Timeout { .. } | CoordinatorError::UnresolvedToolCalls { .. }
        )
    }
}

fn join_names(names: &[ToolName]) -> String {
    names
        .iter()
        .map(|n| n.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn fmt_budget(budget: &Duration) -> String {
    humantime::format_duration(*budget).to_string()
}
