//! # Skein Core
//!
//! Core types and traits for the Skein run coordinator.
//! This crate provides the data model of a conversational run (threads,
//! messages, runs, tool calls) together with the [`ConversationService`]
//! seam behind which the remote service lives and the [`ToolHandler`] trait
//! for locally registered tools.

pub mod error;
pub mod event;
pub mod identifiers;
pub mod message;
pub mod run;
pub mod service;
pub mod tool;

pub use error::{CoordinatorError, CoordinatorResult};
pub use event::{EventSink, NullSink, RunEvent};
pub use identifiers::{
    AssistantId, IdValidationError, IdValidator, MessageId, RunId, ThreadId, ToolCallId, ToolName,
};
pub use message::{Message, Role, Thread};
pub use run::{RequiredAction, Run, RunError, RunStatus, TerminalRun};
pub use service::{ConversationService, ReferenceKind, ServiceError, ServiceResult};
pub use tool::{ArgumentError, ExecutionResult, ToolArguments, ToolCall, ToolHandler, ToolOutput};
