//! HTTP transport for the backend.
//!
//! [`Transport`] is the seam between the clients and the network so the ask
//! and TTS flows can be exercised against in-memory fakes.

use serde_json::Value;

use crate::config::Config;

/// Header carrying the backend's status word on TTS replies.
pub const API_STATUS_HEADER: &str = "x-api-status";
/// Header carrying the backend's human-readable message on TTS replies.
pub const API_MESSAGE_HEADER: &str = "x-api-message";

/// A fully read HTTP response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub content_type: Option<String>,
    pub api_status: Option<String>,
    pub api_message: Option<String>,
    pub body: Vec<u8>,
}

impl HttpReply {
    /// Build a JSON reply (used by tests and fakes).
    pub fn json(status: u16, body: &Value) -> Self {
        Self {
            status,
            content_type: Some("application/json".into()),
            body: body.to_string().into_bytes(),
            ..Self::default()
        }
    }

    /// Build a binary reply with the given content type.
    pub fn bytes(status: u16, content_type: &str, body: Vec<u8>) -> Self {
        Self {
            status,
            content_type: Some(content_type.into()),
            body,
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Errors raised before a response could be read.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// Connection, TLS, or protocol failure.
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// The request exceeded the configured timeout.
    #[error("request to {url} timed out")]
    Timeout { url: String },
}

/// Provider-neutral async HTTP seam. Enables mocking in tests.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// POST a JSON body to `url` and read the whole response.
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpReply, TransportError>;

    /// GET `url` and read the whole response.
    async fn get(&self, url: &str) -> Result<HttpReply, TransportError>;
}

/// [`Transport`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| TransportError::ClientBuild(e.to_string()))?;
        Ok(Self { http })
    }

    async fn read(url: &str, response: reqwest::Response) -> Result<HttpReply, TransportError> {
        let status = response.status().as_u16();
        let headers = response.headers();
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header(reqwest::header::CONTENT_TYPE.as_str());
        let api_status = header(API_STATUS_HEADER);
        let api_message = header(API_MESSAGE_HEADER);

        let body = response
            .bytes()
            .await
            .map_err(|e| request_error(url, &e))?
            .to_vec();

        Ok(HttpReply {
            status,
            content_type,
            api_status,
            api_message,
            body,
        })
    }
}

fn request_error(url: &str, err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout { url: url.to_string() }
    } else {
        TransportError::Request {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, url: &str, body: &Value) -> Result<HttpReply, TransportError> {
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| request_error(url, &e))?;
        Self::read(url, response).await
    }

    async fn get(&self, url: &str) -> Result<HttpReply, TransportError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| request_error(url, &e))?;
        Self::read(url, response).await
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! Scripted in-memory transport.

    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Records every request and answers from a queue of scripted replies.
    #[derive(Default)]
    pub struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<HttpReply, TransportError>>>,
        pub requests: Mutex<Vec<(String, Option<Value>)>>,
    }

    impl ScriptedTransport {
        pub fn new(replies: Vec<Result<HttpReply, TransportError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        pub fn replying_json(status: u16, body: Value) -> Self {
            Self::new(vec![Ok(HttpReply::json(status, &body))])
        }

        pub fn failing() -> Self {
            Self::new(vec![Err(TransportError::Request {
                url: "http://test/api".into(),
                reason: "connection refused".into(),
            })])
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        fn next(&self) -> Result<HttpReply, TransportError> {
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Timeout { url: "unscripted".into() }))
        }
    }

    #[async_trait::async_trait]
    impl Transport for ScriptedTransport {
        async fn post_json(&self, url: &str, body: &Value) -> Result<HttpReply, TransportError> {
            self.requests
                .lock()
                .unwrap()
                .push((url.to_string(), Some(body.clone())));
            self.next()
        }

        async fn get(&self, url: &str) -> Result<HttpReply, TransportError> {
            self.requests.lock().unwrap().push((url.to_string(), None));
            self.next()
        }
    }
}
