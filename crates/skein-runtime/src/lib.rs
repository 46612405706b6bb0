//! # Skein Runtime
//!
//! The polling run coordinator: owns the lifecycle of conversational runs
//! against an external conversation service by submitting input, polling
//! for completion, dispatching `requires_action` tool calls to locally
//! registered handlers, submitting their outputs, and resuming polling
//! until a terminal state is reached.
//!
//! ## Scheduling model
//!
//! Cooperative, on tokio: [`RunCoordinator::await_completion`] suspends at
//! exactly one point per poll iteration (the poll wait), so many runs
//! interleave on one runtime. Cancellation is cooperative and observed only
//! at that wait boundary; a tool handler, once started, always completes
//! before cancellation takes effect.

pub mod cancel;
pub mod config;
pub mod coordinator;
pub mod order;

pub use cancel::RunCanceller;
pub use config::{ConfigError, CoordinatorConfig, RetryPolicy};
pub use coordinator::{RunCoordinator, RunHandle};
pub use order::{MessageOrder, normalize_order};
