//! Backend reply envelopes.
//!
//! The question endpoints answer in one of two shapes:
//!
//! - status envelope: `{"status": "success"|"error", "data": {"answer": ..}, "message": ..}`
//! - chat envelope: `{"response": ..}`
//!
//! [`BackendReply`] is discriminated by the presence of `status`, then of
//! `response`. Objects with neither key are kept as [`BackendReply::Unrecognized`]
//! so the caller can tell them apart from a real envelope. [`Reply`] is the
//! normalized form the ask client turns into a message.

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::config::Backend;

/// Substring (matched case-insensitively) marking the soft reindexing failure.
const REINDEXING_MARKER: &str = "reindexing";

/// Raw reply as sent by either backend generation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BackendReply {
    /// Has a `status` field.
    Status(StatusEnvelope),
    /// Has a `response` field, possibly `null`.
    Chat(ChatEnvelope),
    /// A JSON object carrying neither key, e.g. a framework error page.
    Unrecognized(Map<String, Value>),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusEnvelope {
    pub status: String,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatEnvelope {
    #[serde(deserialize_with = "present")]
    pub response: Option<String>,
}

/// Like the default `Option` handling, but the key itself is required.
fn present<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer)
}

/// Normalized reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Successful status envelope with a non-empty answer.
    Answer(String),
    /// The knowledge base is being rebuilt; informational, not an error.
    Reindexing,
    /// Error status or malformed success, with the backend's message if any.
    Failure(Option<String>),
    /// Chat envelope, with its `response` if any.
    Chat(Option<String>),
}

impl BackendReply {
    /// Parse a reply body.
    pub fn parse(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Collapse the envelope into a [`Reply`].
    ///
    /// An unrecognized object gets the empty reply of the configured backend.
    pub fn normalize(self, backend: Backend) -> Reply {
        match self {
            Self::Status(envelope) => envelope.normalize(),
            Self::Chat(envelope) => Reply::Chat(non_empty(envelope.response)),
            Self::Unrecognized(_) => match backend {
                Backend::Ask => Reply::Failure(None),
                Backend::Chat => Reply::Chat(None),
            },
        }
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Unrecognized(_))
    }
}

impl StatusEnvelope {
    fn normalize(self) -> Reply {
        let message = non_empty(self.message);
        match self.status.as_str() {
            "error" if message.as_deref().is_some_and(is_reindexing) => Reply::Reindexing,
            "success" => match self.data.as_ref().and_then(answer_of) {
                Some(answer) => Reply::Answer(answer),
                None => Reply::Failure(message),
            },
            _ => Reply::Failure(message),
        }
    }
}

fn answer_of(data: &Value) -> Option<String> {
    data.get("answer")
        .and_then(Value::as_str)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
}

fn non_empty(text: Option<String>) -> Option<String> {
    text.filter(|t| !t.trim().is_empty())
}

/// Whether a backend message reports the reindexing condition.
pub fn is_reindexing(message: &str) -> bool {
    message.to_lowercase().contains(REINDEXING_MARKER)
}
