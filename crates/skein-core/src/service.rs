//! The transport-agnostic interface to the remote conversation service.
//!
//! The coordinator is a pure client of this trait. A real deployment binds
//! it to whatever RPC the remote service exposes; tests bind it to a
//! scripted in-memory implementation. Transport, authentication, and wire
//! schema validation all live behind this seam.

use async_trait::async_trait;

use crate::identifiers::{AssistantId, MessageId, RunId, ThreadId};
use crate::message::{Message, Role, Thread};
use crate::run::Run;
use crate::tool::ToolOutput;

/// Result type for conversation service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors reported by the remote conversation service
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A thread/assistant/run reference is unknown to the service
    #[error("unknown {kind} reference: {reference}")]
    UnknownReference {
        kind: ReferenceKind,
        reference: String,
    },

    /// Transport-level failure; the call may succeed if repeated
    #[error("transient service failure: {message}")]
    Transient { message: String },

    /// The service violated its own contract
    #[error("service contract violation: {message}")]
    Contract { message: String },

    /// A payload failed to encode or decode
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ServiceError {
    /// Create an unknown-reference error
    pub fn unknown_reference(kind: ReferenceKind, reference: impl Into<String>) -> Self {
        Self::UnknownReference {
            kind,
            reference: reference.into(),
        }
    }

    /// Create a transient transport error
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Create a contract violation error
    pub fn contract(message: impl Into<String>) -> Self {
        Self::Contract {
            message: message.into(),
        }
    }

    /// Check if repeating the failed call could succeed.
    ///
    /// Only transient transport failures qualify; unknown references and
    /// contract violations never do.
    pub fn is_transient(&self) -> bool {
        matches!(self, ServiceError::Transient { .. })
    }
}

/// The kind of reference a service rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Thread,
    Assistant,
    Run,
    Message,
}

impl std::fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReferenceKind::Thread => write!(f, "thread"),
            ReferenceKind::Assistant => write!(f, "assistant"),
            ReferenceKind::Run => write!(f, "run"),
            ReferenceKind::Message => write!(f, "message"),
        }
    }
}

/// Logical operations of the remote conversation service.
///
/// All mutation of run state happens on the service side; the client only
/// observes. `retrieve_run` must be free of side effects so repeated polls
/// without intervening remote change return identical records.
#[async_trait]
pub trait ConversationService: Send + Sync {
    /// Create a new, empty thread
    async fn create_thread(&self) -> ServiceResult<Thread>;

    /// Append a message to a thread
    async fn create_message(
        &self,
        thread: &ThreadId,
        role: Role,
        content: &str,
    ) -> ServiceResult<Message>;

    /// List a thread's messages in the service's native order
    /// (reverse-chronological: newest first), optionally starting after a
    /// cursor message.
    ///
    /// Presentation ordering is the coordinator's concern, not the
    /// service's.
    async fn list_messages(
        &self,
        thread: &ThreadId,
        after: Option<&MessageId>,
    ) -> ServiceResult<Vec<Message>>;

    /// Create a run of an assistant against a thread; the returned record
    /// has status `queued`
    async fn create_run(&self, thread: &ThreadId, assistant: &AssistantId) -> ServiceResult<Run>;

    /// Fetch the current state of a run (idempotent, no side effects)
    async fn retrieve_run(&self, thread: &ThreadId, run: &RunId) -> ServiceResult<Run>;

    /// Submit a complete batch of tool outputs for a `requires_action` run
    /// and return the resumed run record
    async fn submit_tool_outputs(
        &self,
        thread: &ThreadId,
        run: &RunId,
        outputs: Vec<ToolOutput>,
    ) -> ServiceResult<Run>;

    /// Request cancellation of a run and return the resulting record
    async fn cancel_run(&self, thread: &ThreadId, run: &RunId) -> ServiceResult<Run>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_errors_are_transient() {
        assert!(ServiceError::transient("connection reset").is_transient());
        assert!(!ServiceError::unknown_reference(ReferenceKind::Thread, "thread_x").is_transient());
        assert!(!ServiceError::contract("empty required_action").is_transient());
    }

    #[test]
    fn unknown_reference_names_the_kind() {
        let err = ServiceError::unknown_reference(ReferenceKind::Assistant, "asst_missing");
        assert_eq!(
            err.to_string(),
            "unknown assistant reference: asst_missing"
        );
    }
}
