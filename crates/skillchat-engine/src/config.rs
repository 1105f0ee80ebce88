//! Configuration types for the skillchat engine.
//!
//! This module defines the configuration schema: backend endpoints,
//! the ask/chat variant, scroll tuning, HTTP timeouts and the audio player.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Base URL used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";
/// Question endpoint returning the `{status, data, message}` envelope.
pub const ASK_ENDPOINT: &str = "/api/ask";
/// Question endpoint returning the `{response}` envelope.
pub const CHAT_ENDPOINT: &str = "/api/chat";
/// Text-to-speech endpoint returning audio bytes.
pub const TTS_ENDPOINT: &str = "/api/tts";
/// Backend liveness endpoint.
pub const HEALTH_ENDPOINT: &str = "/health";
/// Distance from the bottom beyond which auto-scroll counts as suppressed.
pub const SCROLL_THRESHOLD_PX: u32 = 100;
/// Delay before a scheduled scroll-to-bottom runs, letting layout settle.
pub const SCROLL_SETTLE_DELAY_MS: u64 = 100;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Greeting seeded into every new conversation.
pub const DEFAULT_GREETING: &str = "Hello! I'm Olaf's AI assistant. I can help you learn about \
Olaf's skills, experience, and qualifications. What would you like to know?";

/// Main configuration for skillchat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Scheme and host of the backend, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Which question endpoint to talk to.
    #[serde(default)]
    pub backend: Backend,

    #[serde(default = "default_ask_endpoint")]
    pub ask_endpoint: String,

    #[serde(default = "default_chat_endpoint")]
    pub chat_endpoint: String,

    #[serde(default = "default_tts_endpoint")]
    pub tts_endpoint: String,

    #[serde(default = "default_health_endpoint")]
    pub health_endpoint: String,

    /// Whether a "Thinking..." placeholder is shown while a request is in flight.
    #[serde(default = "default_placeholder")]
    pub placeholder: bool,

    #[serde(default = "default_scroll_threshold_px")]
    pub scroll_threshold_px: u32,

    #[serde(default = "default_scroll_settle_delay_ms")]
    pub scroll_settle_delay_ms: u64,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Command and arguments used to play synthesized audio.
    ///
    /// A `{file}` argument is replaced by the audio path; otherwise the path
    /// is appended. When unset, a known player is looked up on PATH.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_command: Option<Vec<String>>,

    /// First assistant message of every conversation.
    #[serde(default = "default_greeting")]
    pub greeting: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.into()
}

fn default_ask_endpoint() -> String {
    ASK_ENDPOINT.into()
}

fn default_chat_endpoint() -> String {
    CHAT_ENDPOINT.into()
}

fn default_tts_endpoint() -> String {
    TTS_ENDPOINT.into()
}

fn default_health_endpoint() -> String {
    HEALTH_ENDPOINT.into()
}

fn default_placeholder() -> bool {
    true
}

fn default_scroll_threshold_px() -> u32 {
    SCROLL_THRESHOLD_PX
}

fn default_scroll_settle_delay_ms() -> u64 {
    SCROLL_SETTLE_DELAY_MS
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_greeting() -> String {
    DEFAULT_GREETING.into()
}

/// Question endpoint variant.
///
/// Both variants accept either response shape; the variant only picks the
/// endpoint the question is posted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// `POST /api/ask`, replies with `{status, data: {answer}, message}`.
    #[default]
    Ask,
    /// `POST /api/chat`, replies with `{response}`.
    Chat,
}

impl Backend {
    /// Parse a backend name as used on the command line and in the environment.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ask" => Ok(Self::Ask),
            "chat" => Ok(Self::Chat),
            other => Err(ConfigError::Invalid(format!(
                "unknown backend '{other}' (expected 'ask' or 'chat')"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ask => "ask",
            Self::Chat => "chat",
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Load configuration from a file, falling back to defaults if it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }

    /// Apply overrides from `SKILLCHAT_*` environment variables.
    ///
    /// - `SKILLCHAT_BASE_URL`
    /// - `SKILLCHAT_BACKEND`: `ask` or `chat`
    /// - `SKILLCHAT_PLAYER`: whitespace-separated player argv
    /// - `SKILLCHAT_REQUEST_TIMEOUT_SECS`, `SKILLCHAT_CONNECT_TIMEOUT_SECS`
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(url) = lookup("SKILLCHAT_BASE_URL") {
            self.set_base_url(&url);
        }
        if let Some(backend) = lookup("SKILLCHAT_BACKEND") {
            self.backend = Backend::parse(&backend)?;
        }
        if let Some(player) = lookup("SKILLCHAT_PLAYER") {
            let argv: Vec<String> = player.split_whitespace().map(String::from).collect();
            if !argv.is_empty() {
                self.player_command = Some(argv);
            }
        }
        if let Some(secs) = lookup("SKILLCHAT_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = parse_secs("SKILLCHAT_REQUEST_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = lookup("SKILLCHAT_CONNECT_TIMEOUT_SECS") {
            self.connect_timeout_secs = parse_secs("SKILLCHAT_CONNECT_TIMEOUT_SECS", &secs)?;
        }
        Ok(())
    }

    /// Set the base URL, dropping any trailing slash.
    pub fn set_base_url(&mut self, url: &str) {
        self.base_url = url.trim().trim_end_matches('/').to_string();
    }

    /// Join the base URL with an endpoint path.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            return endpoint.to_string();
        }
        let base = self.base_url.trim_end_matches('/');
        if endpoint.starts_with('/') {
            format!("{base}{endpoint}")
        } else {
            format!("{base}/{endpoint}")
        }
    }

    /// Endpoint path for the configured question backend.
    pub fn question_endpoint(&self) -> &str {
        match self.backend {
            Backend::Ask => &self.ask_endpoint,
            Backend::Chat => &self.chat_endpoint,
        }
    }

    pub fn scroll_settle_delay(&self) -> Duration {
        Duration::from_millis(self.scroll_settle_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

fn parse_secs(key: &str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::Invalid(format!("{key} must be a whole number of seconds, got '{raw}'")))
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            backend: Backend::default(),
            ask_endpoint: default_ask_endpoint(),
            chat_endpoint: default_chat_endpoint(),
            tts_endpoint: default_tts_endpoint(),
            health_endpoint: default_health_endpoint(),
            placeholder: default_placeholder(),
            scroll_threshold_px: default_scroll_threshold_px(),
            scroll_settle_delay_ms: default_scroll_settle_delay_ms(),
            request_timeout_secs: default_request_timeout(),
            connect_timeout_secs: default_connect_timeout(),
            player_command: None,
            greeting: default_greeting(),
        }
    }
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),

    /// A value was present but unusable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
