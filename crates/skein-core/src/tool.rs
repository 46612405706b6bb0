//! Tool handler trait and the structured types that cross the dispatch
//! boundary.
//!
//! The remote service hands the coordinator dynamically-typed JSON payloads.
//! Locally they are represented as [`ToolArguments`], an explicit structured
//! value with typed accessors, so malformed arguments fail at the dispatch
//! boundary instead of deep inside a handler.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::identifiers::{ToolCallId, ToolName};

/// Structured arguments passed to a tool handler.
///
/// Always a JSON object; anything else from the service is rejected when the
/// tool call is decoded, before any handler runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct ToolArguments(serde_json::Map<String, Value>);

impl ToolArguments {
    /// Create an empty argument set
    pub fn empty() -> Self {
        Self(serde_json::Map::new())
    }

    /// Build arguments from a JSON value, requiring an object
    ///
    /// # Returns
    ///
    /// `Ok(ToolArguments)` for a JSON object, `Err(ArgumentError)` otherwise
    pub fn from_value(value: Value) -> Result<Self, ArgumentError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ArgumentError::NotAnObject {
                found: json_type_name(&other),
            }),
        }
    }

    /// Parse arguments from a JSON-encoded string
    ///
    /// Transports that deliver arguments as serialized JSON decode through
    /// this before the dispatch boundary.
    pub fn from_json_str(raw: &str) -> Result<Self, ArgumentError> {
        let value: Value =
            serde_json::from_str(raw).map_err(|e| ArgumentError::Malformed(e.to_string()))?;
        Self::from_value(value)
    }

    /// Insert an argument, replacing any existing value under the key
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Builder-style insert for test and call-site construction
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.insert(key, value);
        self
    }

    /// Get a raw argument value by key
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Get a required string argument
    pub fn require_str(&self, key: &str) -> Result<&str, ArgumentError> {
        let value = self.require(key)?;
        value.as_str().ok_or_else(|| ArgumentError::WrongType {
            field: key.to_string(),
            expected: "string",
            found: json_type_name(value),
        })
    }

    /// Get a required integer argument
    pub fn require_i64(&self, key: &str) -> Result<i64, ArgumentError> {
        let value = self.require(key)?;
        value.as_i64().ok_or_else(|| ArgumentError::WrongType {
            field: key.to_string(),
            expected: "integer",
            found: json_type_name(value),
        })
    }

    /// Get a required array argument
    pub fn require_array(&self, key: &str) -> Result<&Vec<Value>, ArgumentError> {
        let value = self.require(key)?;
        value.as_array().ok_or_else(|| ArgumentError::WrongType {
            field: key.to_string(),
            expected: "array",
            found: json_type_name(value),
        })
    }

    /// Number of top-level arguments
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if no arguments were supplied
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn require(&self, key: &str) -> Result<&Value, ArgumentError> {
        self.0.get(key).ok_or_else(|| ArgumentError::MissingField {
            field: key.to_string(),
        })
    }
}

impl From<ToolArguments> for Value {
    fn from(arguments: ToolArguments) -> Self {
        Value::Object(arguments.0)
    }
}

impl TryFrom<Value> for ToolArguments {
    type Error = ArgumentError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_value(value)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Errors raised when tool arguments fail structural checks
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArgumentError {
    /// The payload was not a JSON object
    #[error("tool arguments must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },

    /// The payload was not valid JSON at all
    #[error("tool arguments are not valid JSON: {0}")]
    Malformed(String),

    /// A required field is absent
    #[error("missing required argument '{field}'")]
    MissingField { field: String },

    /// A field is present with the wrong type
    #[error("argument '{field}' should be {expected}, found {found}")]
    WrongType {
        field: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// A request, surfaced via run status, for the caller to execute named local
/// logic and return a result.
///
/// Consumed exactly once: each call id is answered by exactly one output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier the output must echo back
    pub id: ToolCallId,

    /// Registry name of the requested tool
    pub name: ToolName,

    /// Structured arguments for the handler
    pub arguments: ToolArguments,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(id: ToolCallId, name: ToolName, arguments: ToolArguments) -> Self {
        Self {
            id,
            name,
            arguments,
        }
    }
}

/// One answered tool call, ready for batch submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// The call this output answers
    pub tool_call_id: ToolCallId,

    /// The handler's return value, JSON-encoded
    pub output: String,
}

impl ToolOutput {
    /// Encode a handler's return value as the output for a call id
    pub fn from_value(tool_call_id: ToolCallId, value: &Value) -> Self {
        Self {
            tool_call_id,
            output: value.to_string(),
        }
    }
}

/// The result of executing a tool handler.
///
/// Either successful execution with a JSON output or failed execution with
/// an error message. A failure aborts the whole dispatch batch; nothing is
/// submitted for any call in it.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// Handler executed successfully with the given output.
    Success { output: Value },

    /// Handler execution failed.
    Failure { error: String },
}

impl ExecutionResult {
    /// Create a successful execution result
    pub fn success(output: Value) -> Self {
        ExecutionResult::Success { output }
    }

    /// Create a failed execution result
    pub fn failure(error: impl Into<String>) -> Self {
        ExecutionResult::Failure {
            error: error.into(),
        }
    }

    /// Check if the execution was successful
    pub fn is_success(&self) -> bool {
        matches!(self, ExecutionResult::Success { .. })
    }

    /// Convert to a Result type for easier error handling
    pub fn into_result(self) -> Result<Value, String> {
        match self {
            ExecutionResult::Success { output } => Ok(output),
            ExecutionResult::Failure { error } => Err(error),
        }
    }
}

/// Trait defining local logic the coordinator can dispatch tool calls to.
///
/// Handlers are registered by name before a run starts. During a
/// `requires_action` batch the coordinator invokes handlers synchronously,
/// once per call id; the same handler may run several times in one batch
/// when the service requests its name more than once.
///
/// # Example
///
/// ```rust
/// use skein_core::tool::{ExecutionResult, ToolArguments, ToolHandler};
/// use serde_json::json;
///
/// struct QuizTool;
///
/// impl ToolHandler for QuizTool {
///     fn name(&self) -> &str {
///         "display_quiz"
///     }
///
///     fn call(&self, arguments: ToolArguments) -> ExecutionResult {
///         match arguments.require_str("title") {
///             Ok(title) => ExecutionResult::success(json!({ "shown": title })),
///             Err(e) => ExecutionResult::failure(e.to_string()),
///         }
///     }
/// }
/// ```
pub trait ToolHandler: Send + Sync {
    /// Returns the unique name this handler is dispatched under.
    fn name(&self) -> &str;

    /// Returns a human-readable description of the handler.
    fn description(&self) -> &str {
        ""
    }

    /// Execute the handler with the provided arguments.
    ///
    /// Handlers run to completion once started; cancellation is only
    /// observed between poll iterations, never mid-invocation.
    fn call(&self, arguments: ToolArguments) -> ExecutionResult;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn arguments_require_object() {
        assert!(ToolArguments::from_value(json!({"title": "T"})).is_ok());

        let err = ToolArguments::from_value(json!([1, 2])).unwrap_err();
        assert_eq!(err, ArgumentError::NotAnObject { found: "array" });
    }

    #[test]
    fn arguments_from_json_str() {
        let args = ToolArguments::from_json_str(r#"{"title":"T","count":3}"#).unwrap();
        assert_eq!(args.require_str("title").unwrap(), "T");
        assert_eq!(args.require_i64("count").unwrap(), 3);

        assert!(ToolArguments::from_json_str("not json").is_err());
    }

    #[test]
    fn typed_accessors_catch_mismatches() {
        let args = ToolArguments::empty()
            .with("title", json!("T"))
            .with("questions", json!([{"q": "2+2?"}]));

        assert_eq!(args.require_str("title").unwrap(), "T");
        assert_eq!(args.require_array("questions").unwrap().len(), 1);

        assert_eq!(
            args.require_i64("title").unwrap_err(),
            ArgumentError::WrongType {
                field: "title".to_string(),
                expected: "integer",
                found: "string",
            }
        );
        assert_eq!(
            args.require_str("missing").unwrap_err(),
            ArgumentError::MissingField {
                field: "missing".to_string(),
            }
        );
    }

    #[test]
    fn tool_output_json_encodes_value() {
        let output = ToolOutput::from_value(
            ToolCallId::new_unchecked("call_1"),
            &json!({"correct": true}),
        );
        assert_eq!(output.output, r#"{"correct":true}"#);
    }

    #[test]
    fn execution_result_into_result() {
        assert_eq!(
            ExecutionResult::success(json!(4)).into_result(),
            Ok(json!(4))
        );
        assert_eq!(
            ExecutionResult::failure("boom").into_result(),
            Err("boom".to_string())
        );
    }
}
