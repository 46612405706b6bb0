//! Unified identifier types for the Skein coordinator
//!
//! This module provides validated, type-safe identifiers used throughout all
//! Skein crates. All identifiers enforce consistent validation rules and
//! provide compile-time type safety to prevent mixing different identifier
//! types.
//!
//! # Design Principles
//!
//! 1. **Parse-Don't-Validate**: All identifiers use `parse()` constructors that
//!    return `Result` instead of panicking on invalid input
//! 2. **Newtype Pattern**: Each identifier type is a distinct newtype preventing
//!    accidental mixing (can't pass `RunId` where `ThreadId` is expected)
//! 3. **Zero-Cost Abstractions**: Identifiers compile down to their underlying
//!    `String` representation with no runtime overhead
//! 4. **Consistent Validation**: All identifiers share the same validation rules
//!    for predictable behavior across the framework
//!
//! # Examples
//!
//! ```rust
//! use skein_core::identifiers::{ThreadId, RunId, ToolName};
//!
//! // Valid identifiers
//! let thread = ThreadId::parse("thread_abc123").unwrap();
//! let run = RunId::parse("run_xyz789").unwrap();
//! let tool = ToolName::parse("display_quiz").unwrap();
//!
//! // Invalid identifiers
//! assert!(ThreadId::parse("").is_err());            // Empty
//! assert!(ThreadId::parse("  thread  ").is_err());  // Whitespace
//! assert!(RunId::parse("run/123").is_err());        // Invalid char
//!
//! // Type safety - won't compile!
//! // fn poll(id: RunId) { }
//! // poll(thread);  // Compile error: expected RunId, found ThreadId
//! ```

mod validation;

pub use validation::{IdValidationError, IdValidator, MAX_ID_LENGTH};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reference to a server-held conversation thread
///
/// Threads are owned by the remote conversation service; the coordinator
/// only ever holds this reference and passes it back on every call.
///
/// # Examples
///
/// ```rust
/// use skein_core::identifiers::ThreadId;
///
/// // Create from validated string
/// let id = ThreadId::parse("thread_abc123").unwrap();
/// assert_eq!(id.as_str(), "thread_abc123");
///
/// // FromStr trait support
/// let id: ThreadId = "thread_xyz".parse().unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ThreadId(String);

impl ThreadId {
    /// Parse and validate a thread reference from a string
    ///
    /// Returns an error if the string violates validation rules (empty,
    /// too long, contains invalid characters, etc.)
    pub fn parse(id: impl AsRef<str>) -> Result<Self, IdValidationError> {
        IdValidator::validate(id.as_ref()).map(|s| Self(s.to_string()))
    }

    /// Get the thread reference as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create a thread reference without validation (for testing only)
    ///
    /// # Safety
    ///
    /// This bypasses all validation checks. Only use this in tests or when
    /// the input is guaranteed to be valid. For all user input, use `parse()`.
    #[doc(hidden)]
    pub fn new_unchecked(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ThreadId {
    type Err = IdValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<ThreadId> for String {
    fn from(id: ThreadId) -> Self {
        id.0
    }
}

impl TryFrom<String> for ThreadId {
    type Error = IdValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

/// Reference to one execution attempt of an assistant against a thread
///
/// Runs are created by the coordinator but owned and advanced by the remote
/// service; the coordinator observes them through polling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RunId(String);

impl RunId {
    /// Parse and validate a run reference from a string
    pub fn parse(id: impl AsRef<str>) -> Result<Self, IdValidationError> {
        IdValidator::validate(id.as_ref()).map(|s| Self(s.to_string()))
    }

    /// Get the run reference as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create a run reference without validation (for testing only)
    #[doc(hidden)]
    pub fn new_unchecked(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RunId {
    type Err = IdValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<RunId> for String {
    fn from(id: RunId) -> Self {
        id.0
    }
}

impl TryFrom<String> for RunId {
    type Error = IdValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

/// Reference to an assistant configured on the remote service
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssistantId(String);

impl AssistantId {
    /// Parse and validate an assistant reference from a string
    pub fn parse(id: impl AsRef<str>) -> Result<Self, IdValidationError> {
        IdValidator::validate(id.as_ref()).map(|s| Self(s.to_string()))
    }

    /// Get the assistant reference as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create an assistant reference without validation (for testing only)
    #[doc(hidden)]
    pub fn new_unchecked(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for AssistantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AssistantId {
    type Err = IdValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<AssistantId> for String {
    fn from(id: AssistantId) -> Self {
        id.0
    }
}

impl TryFrom<String> for AssistantId {
    type Error = IdValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

/// Identifier of a message within a thread
///
/// Besides identity, message ids participate in ordering: ties on
/// `created_at` are broken by comparing ids, which keeps the normalized
/// message order deterministic.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MessageId(String);

impl MessageId {
    /// Parse and validate a message identifier from a string
    pub fn parse(id: impl AsRef<str>) -> Result<Self, IdValidationError> {
        IdValidator::validate(id.as_ref()).map(|s| Self(s.to_string()))
    }

    /// Get the message identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create a message identifier without validation (for testing only)
    #[doc(hidden)]
    pub fn new_unchecked(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = IdValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<MessageId> for String {
    fn from(id: MessageId) -> Self {
        id.0
    }
}

impl TryFrom<String> for MessageId {
    type Error = IdValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

/// Identifier of a single tool call requested by a run
///
/// Every call id in a `requires_action` batch must be answered by exactly
/// one output carrying the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ToolCallId(String);

impl ToolCallId {
    /// Parse and validate a tool call identifier from a string
    pub fn parse(id: impl AsRef<str>) -> Result<Self, IdValidationError> {
        IdValidator::validate(id.as_ref()).map(|s| Self(s.to_string()))
    }

    /// Get the tool call identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create a tool call identifier without validation (for testing only)
    #[doc(hidden)]
    pub fn new_unchecked(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for ToolCallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ToolCallId {
    type Err = IdValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<ToolCallId> for String {
    fn from(id: ToolCallId) -> Self {
        id.0
    }
}

impl TryFrom<String> for ToolCallId {
    type Error = IdValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}

/// Name a tool handler is registered under
///
/// Tool names route `requires_action` dispatch. Names are unique within a
/// registry; registering a second handler under the same name replaces the
/// first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ToolName(String);

impl ToolName {
    /// Parse and validate a tool name from a string
    pub fn parse(name: impl AsRef<str>) -> Result<Self, IdValidationError> {
        IdValidator::validate(name.as_ref()).map(|s| Self(s.to_string()))
    }

    /// Get the tool name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create a tool name without validation (for testing only)
    #[doc(hidden)]
    pub fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ToolName {
    type Err = IdValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<ToolName> for String {
    fn from(name: ToolName) -> Self {
        name.0
    }
}

impl TryFrom<String> for ToolName {
    type Error = IdValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(s)
    }
}
