//! # Mock Tool Handlers
//!
//! Mock tool implementations that return predictable responses, with call
//! tracking for asserting exactly how a dispatch batch was executed.

use std::sync::{Arc, Mutex};

use serde_json::Value;
use skein_core::{ExecutionResult, ToolArguments, ToolHandler};

/// A mock tool handler that returns a configured response and records every
/// invocation
#[derive(Debug, Clone)]
pub struct MockToolHandler {
    name: String,
    response: ExecutionResult,
    call_count: Arc<Mutex<usize>>,
    call_history: Arc<Mutex<Vec<ToolArguments>>>,
}

impl MockToolHandler {
    /// Create a mock tool that succeeds with `null` output
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            response: ExecutionResult::success(Value::Null),
            call_count: Arc::new(Mutex::new(0)),
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the success value returned on every call
    pub fn with_response(mut self, output: Value) -> Self {
        self.response = ExecutionResult::success(output);
        self
    }

    /// Make every call fail with the given error
    pub fn with_failure(mut self, error: impl Into<String>) -> Self {
        self.response = ExecutionResult::failure(error);
        self
    }

    /// Number of times this handler has been invoked
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().expect("mock lock poisoned")
    }

    /// The arguments of every invocation, in call order
    pub fn call_history(&self) -> Vec<ToolArguments> {
        self.call_history
            .lock()
            .expect("mock lock poisoned")
            .clone()
    }

    /// Check if the handler was invoked with the given arguments
    pub fn was_called_with(&self, arguments: &ToolArguments) -> bool {
        self.call_history
            .lock()
            .expect("mock lock poisoned")
            .contains(arguments)
    }

    /// Reset call count and history
    pub fn reset(&self) {
        *self.call_count.lock().expect("mock lock poisoned") = 0;
        self.call_history
            .lock()
            .expect("mock lock poisoned")
            .clear();
    }
}

impl ToolHandler for MockToolHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "mock tool handler"
    }

    fn call(&self, arguments: ToolArguments) -> ExecutionResult {
        *self.call_count.lock().expect("mock lock poisoned") += 1;
        self.call_history
            .lock()
            .expect("mock lock poisoned")
            .push(arguments);
        self.response.clone()
    }
}
