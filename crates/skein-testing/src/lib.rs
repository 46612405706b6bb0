//! # Skein Testing
//!
//! Testing utilities for the Skein run coordinator: a scripted in-memory
//! conversation service, mock tool handlers with call tracking, and an
//! event recorder. Everything here is deterministic so coordinator behavior
//! can be asserted call by call.

pub mod mock_service;
pub mod mock_tools;
pub mod recording;

pub use mock_service::{RunScript, RunStep, ScriptedConversationService};
pub use mock_tools::MockToolHandler;
pub use recording::RecordingSink;
