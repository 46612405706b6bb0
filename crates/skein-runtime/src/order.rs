//! Message-order normalization.
//!
//! The remote service delivers messages newest-first. Presentation order is
//! a pure, deterministic transform over that delivery: a stable sort by
//! `created_at` with ties broken by message id.

use skein_core::Message;

/// Caller-chosen presentation order for a thread's messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MessageOrder {
    /// Chronological, oldest first (display order)
    #[default]
    Ascending,

    /// Reverse-chronological, mirroring the remote service's native order
    Descending,
}

/// Normalize a message sequence into the requested order.
///
/// Stateless and deterministic: equal timestamps are ordered by id, so the
/// same input always yields the same output regardless of delivery order.
pub fn normalize_order(mut messages: Vec<Message>, order: MessageOrder) -> Vec<Message> {
    messages.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    if order == MessageOrder::Descending {
        messages.reverse();
    }
    messages
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use skein_core::{MessageId, Role};

    fn base() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn message(id: &str, offset_secs: i64) -> Message {
        Message::new(
            MessageId::new_unchecked(id),
            Role::User,
            format!("body of {id}"),
            base() + Duration::seconds(offset_secs),
        )
    }

    #[test]
    fn ascending_reverses_native_delivery() {
        // Native delivery order: newest first
        let native = vec![message("msg_3", 3), message("msg_2", 2), message("msg_1", 1)];

        let ordered = normalize_order(native, MessageOrder::Ascending);
        let ids: Vec<&str> = ordered.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["msg_1", "msg_2", "msg_3"]);
    }

    #[test]
    fn descending_mirrors_remote_default() {
        let native = vec![message("msg_3", 3), message("msg_2", 2), message("msg_1", 1)];

        let ordered = normalize_order(native, MessageOrder::Descending);
        let ids: Vec<&str> = ordered.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["msg_3", "msg_2", "msg_1"]);
    }

    #[test]
    fn equal_timestamps_break_ties_by_id() {
        let native = vec![message("msg_b", 0), message("msg_a", 0), message("msg_c", 0)];

        let ordered = normalize_order(native, MessageOrder::Ascending);
        let ids: Vec<&str> = ordered.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["msg_a", "msg_b", "msg_c"]);
    }

    #[test]
    fn normalization_is_idempotent() {
        let native = vec![message("msg_2", 2), message("msg_1", 1)];

        let once = normalize_order(native, MessageOrder::Ascending);
        let twice = normalize_order(once.clone(), MessageOrder::Ascending);
        assert_eq!(once, twice);
    }
}
