//! # Skein Tools
//!
//! Tool registry for the Skein run coordinator: the mapping from tool names
//! to locally registered [`ToolHandler`](skein_core::ToolHandler)
//! implementations, with the read-mostly locking discipline the coordinator
//! relies on during `requires_action` dispatch.

pub mod registry;

pub use registry::{InMemoryToolRegistry, ToolRegistry};
