//! Thread and message types for the conversation protocol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identifiers::{MessageId, ThreadId};

/// A server-held conversation thread.
///
/// The remote service owns the thread and its message log; the coordinator
/// holds only the reference. The record is returned by `create_thread` so
/// callers can keep the creation timestamp alongside the id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    /// Unique identifier for the thread
    pub id: ThreadId,

    /// When the thread was created
    pub created_at: DateTime<Utc>,
}

impl Thread {
    /// Create a new thread record
    pub fn new(id: ThreadId, created_at: DateTime<Utc>) -> Self {
        Self { id, created_at }
    }
}

/// A message appended to a thread's conversation log.
///
/// Messages are immutable once created. The remote service delivers them
/// newest-first; ordering for presentation is the coordinator's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier for the message
    pub id: MessageId,

    /// Role of the message author
    pub role: Role,

    /// Text content of the message
    pub content: String,

    /// When the message was created
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a new message record
    pub fn new(
        id: MessageId,
        role: Role,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            created_at,
        }
    }

    /// Check whether this message was authored by the user
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    /// Check whether this message was authored by the assistant
    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

/// Role of a message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Message submitted by the caller on behalf of a user
    User,

    /// Message produced by the assistant
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serializes_to_wire_names() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
    }

    #[test]
    fn message_role_predicates() {
        let msg = Message::new(
            MessageId::new_unchecked("msg_1"),
            Role::User,
            "2+2?",
            Utc::now(),
        );
        assert!(msg.is_user());
        assert!(!msg.is_assistant());
    }
}
