//! # Skein
//!
//! Skein is a client-side run coordinator for conversational assistant
//! services. It owns the lifecycle of a run against an external
//! conversation service: submitting input, polling for completion,
//! dispatching requested tool calls to locally registered handlers,
//! submitting their outputs, and resuming polling until a terminal state is
//! reached.
//!
//! ## Core Components
//!
//! - **[`RunCoordinator`]**: drives the run state machine and tool dispatch
//! - **[`ConversationService`]**: the transport-agnostic seam behind which
//!   the remote service lives
//! - **[`ToolHandler`]**: local logic invoked for `requires_action` tool
//!   calls
//! - **[`InMemoryToolRegistry`]**: name-to-handler mapping with
//!   reader/writer locking
//! - **[`EventSink`]**: observability hook for run lifecycle events
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use serde_json::json;
//! use skein::{
//!     ExecutionResult, MessageOrder, RunCoordinator, ToolArguments, ToolHandler,
//! };
//!
//! struct QuizTool;
//!
//! impl ToolHandler for QuizTool {
//!     fn name(&self) -> &str {
//!         "display_quiz"
//!     }
//!
//!     fn call(&self, arguments: ToolArguments) -> ExecutionResult {
//!         match arguments.require_str("title") {
//!             Ok(title) => ExecutionResult::success(json!({ "displayed": title })),
//!             Err(e) => ExecutionResult::failure(e.to_string()),
//!         }
//!     }
//! }
//!
//! # async fn demo(service: impl skein::ConversationService, assistant: skein::AssistantId)
//! #     -> Result<(), Box<dyn std::error::Error>> {
//! let coordinator = RunCoordinator::new(service);
//! coordinator.register_tool(Arc::new(QuizTool))?;
//!
//! let thread = coordinator.create_thread().await?;
//! coordinator.post_message(&thread.id, "Quiz me on arithmetic").await?;
//!
//! let handle = coordinator.start_run(&thread.id, &assistant).await?;
//! let terminal = coordinator.await_completion(&handle).await?;
//! assert!(terminal.is_completed());
//!
//! for message in coordinator.list_messages(&thread.id, MessageOrder::Ascending).await? {
//!     println!("[{}] {}", message.role, message.content);
//! }
//! # Ok(())
//! # }
//! ```

pub use skein_core::{
    ArgumentError, AssistantId, ConversationService, CoordinatorError, CoordinatorResult,
    EventSink, ExecutionResult, IdValidationError, Message, MessageId, NullSink, ReferenceKind,
    RequiredAction, Role, Run, RunError, RunEvent, RunId, RunStatus, ServiceError, ServiceResult,
    TerminalRun, Thread, ThreadId, ToolArguments, ToolCall, ToolCallId, ToolHandler, ToolName,
    ToolOutput,
};
pub use skein_runtime::{
    ConfigError, CoordinatorConfig, MessageOrder, RetryPolicy, RunCanceller, RunCoordinator,
    RunHandle, normalize_order,
};
pub use skein_tools::{InMemoryToolRegistry, ToolRegistry};

/// Testing utilities, re-exported with the `testing` feature
#[cfg(feature = "testing")]
pub use skein_testing;
