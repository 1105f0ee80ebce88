//! Chat message types.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content shown while an ask request is in flight.
pub const THINKING_INDICATOR: &str = "Thinking...";

/// Identifier of a message within one session.
///
/// Assigned by the [`ConversationStore`](crate::store::ConversationStore);
/// [`MessageId::UNASSIGNED`] marks a message that has not been stored yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl MessageId {
    pub const UNASSIGNED: Self = Self(0);

    pub fn is_assigned(self) -> bool {
        self != Self::UNASSIGNED
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Role in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Visitor asking questions.
    User,
    /// Backend answer (markdown).
    Assistant,
}

/// A single message in a conversation.
///
/// Fields are read-only outside the engine so a stored message's role and
/// content cannot change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub(crate) id: MessageId,
    role: Role,
    content: String,
    timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    is_loading: bool,
}

impl Message {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content.into(), false)
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content.into(), false)
    }

    /// Create the transient assistant entry shown while waiting for a reply.
    pub fn placeholder() -> Self {
        Self::new(Role::Assistant, THINKING_INDICATOR.into(), true)
    }

    fn new(role: Role, content: String, is_loading: bool) -> Self {
        Self {
            id: MessageId::UNASSIGNED,
            role,
            content,
            timestamp: Utc::now(),
            is_loading,
        }
    }

    /// Request a specific id; the store keeps it only if it is free.
    #[must_use]
    pub fn with_id(mut self, id: MessageId) -> Self {
        self.id = id;
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    /// Local wall-clock time as `HH:MM`.
    pub fn format_time(&self) -> String {
        self.timestamp.with_timezone(&Local).format("%H:%M").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let user_msg = Message::user("Hello");
        assert_eq!(user_msg.role(), Role::User);
        assert_eq!(user_msg.content(), "Hello");
        assert!(!user_msg.is_loading());
        assert!(!user_msg.id().is_assigned());

        let placeholder = Message::placeholder();
        assert!(placeholder.is_assistant());
        assert!(placeholder.is_loading());
        assert_eq!(placeholder.content(), THINKING_INDICATOR);
    }

    #[test]
    fn test_format_time_is_hours_and_minutes() {
        let formatted = Message::assistant("hi").format_time();
        assert_eq!(formatted.len(), 5);
        assert_eq!(formatted.as_bytes()[2], b':');
    }

    #[test]
    fn test_serialized_shape() {
        let msg = Message::assistant("Olaf knows Rust.").with_id(MessageId(7));
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["role"], "assistant");
        assert!(json.get("is_loading").is_none());

        let json = serde_json::to_value(Message::placeholder()).unwrap();
        assert_eq!(json["is_loading"], true);
    }
}
