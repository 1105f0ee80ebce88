//! Ask/chat client.
//!
//! Posts one question to the configured endpoint and turns whatever comes
//! back (answer, soft failure, backend error, transport failure) into a
//! single assistant message. Nothing escapes as an error.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::config::{Backend, Config};
use crate::reply::{BackendReply, Reply};
use crate::transport::{Transport, TransportError};

/// Shown when the backend reports it is rebuilding its index.
pub const REINDEXING_NOTICE: &str =
    "⏳ The system is currently reindexing the knowledge base. Please try again in a few moments.";

/// Shown when the request could not be completed or understood.
pub const UNAVAILABLE_NOTICE: &str = "⚠️ The system is temporarily unavailable. This may be due to \
reindexing the knowledge base. Please try again in a few moments.";

/// Fallback for status-envelope errors without a message.
pub const GENERIC_FAILURE: &str = "Sorry, something went wrong.";

/// Fallback for chat envelopes without a response.
pub const CHAT_FALLBACK: &str = "I couldn't process that query.";

/// How an ask settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    /// The backend answered.
    Answer,
    /// Soft failure: the knowledge base is reindexing.
    Reindexing,
    /// The backend reported an error (or sent a malformed success).
    BackendError,
    /// Transport or parse failure.
    Unavailable,
}

/// Result of one ask: the assistant message to append, plus the recorded
/// error for transport/parse failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskOutcome {
    pub kind: OutcomeKind,
    pub content: String,
    pub error: Option<String>,
}

impl AskOutcome {
    pub fn from_reply(reply: Reply) -> Self {
        let (kind, content) = match reply {
            Reply::Answer(answer) => (OutcomeKind::Answer, answer),
            Reply::Reindexing => (OutcomeKind::Reindexing, REINDEXING_NOTICE.to_string()),
            Reply::Failure(message) => (
                OutcomeKind::BackendError,
                message.unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            ),
            Reply::Chat(response) => (
                OutcomeKind::Answer,
                response.unwrap_or_else(|| CHAT_FALLBACK.to_string()),
            ),
        };
        Self {
            kind,
            content,
            error: None,
        }
    }

    pub fn unavailable(error: impl Into<String>) -> Self {
        Self {
            kind: OutcomeKind::Unavailable,
            content: UNAVAILABLE_NOTICE.to_string(),
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Backend liveness as reported by the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub url: String,
    pub http_status: u16,
    pub status: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.http_status == 200 && self.status.as_deref() == Some("healthy")
    }
}

/// Client for the question endpoints.
#[derive(Clone)]
pub struct AskClient {
    transport: Arc<dyn Transport>,
    backend: Backend,
    url: String,
    health_url: String,
}

impl AskClient {
    pub fn new(transport: Arc<dyn Transport>, config: &Config) -> Self {
        Self {
            transport,
            backend: config.backend,
            url: config.endpoint_url(config.question_endpoint()),
            health_url: config.endpoint_url(&config.health_endpoint),
        }
    }

    /// Endpoint the question is posted to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Ask one question. Always settles with a message to show.
    pub async fn ask(&self, query: &str) -> AskOutcome {
        info!(url = %self.url, chars = query.chars().count(), "dispatching question");
        let body = json!({ "query": query });

        let reply = match self.transport.post_json(&self.url, &body).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "question request failed");
                return AskOutcome::unavailable(e.to_string());
            }
        };

        let outcome = match BackendReply::parse(&reply.body) {
            Ok(parsed) if reply.is_success() || parsed.is_recognized() => {
                AskOutcome::from_reply(parsed.normalize(self.backend))
            }
            Err(e) if reply.is_success() => {
                warn!(error = %e, "unparseable reply");
                AskOutcome::unavailable(format!("invalid reply from backend: {e}"))
            }
            Ok(_) | Err(_) => {
                warn!(status = reply.status, "backend returned an error status");
                AskOutcome::unavailable(format!("backend returned HTTP {}", reply.status))
            }
        };

        info!(kind = ?outcome.kind, status = reply.status, "question settled");
        outcome
    }

    /// Query the backend's health endpoint.
    pub async fn health(&self) -> Result<HealthStatus, TransportError> {
        let reply = self.transport.get(&self.health_url).await?;
        let status = serde_json::from_slice::<serde_json::Value>(&reply.body)
            .ok()
            .and_then(|v| v.get("status").and_then(|s| s.as_str()).map(str::to_string));
        Ok(HealthStatus {
            url: self.health_url.clone(),
            http_status: reply.status,
            status,
        })
    }
}
