//! skillchat-engine: Headless core of the skillchat assistant
//!
//! This crate provides everything the chat widget needs apart from drawing:
//! - Configuration
//! - The conversation store and chat session (input controller)
//! - Ask/chat and text-to-speech clients over an HTTP transport
//! - Scroll coordination with deferred tasks

pub mod ask;
pub mod config;
pub mod message;
pub mod reply;
pub mod scroll;
pub mod session;
pub mod store;
pub mod transport;
pub mod tts;

// Re-export commonly used types
pub use ask::{AskClient, AskOutcome, HealthStatus, OutcomeKind};
pub use config::{Backend, Config, ConfigError};
pub use message::{Message, MessageId, Role};
pub use reply::{BackendReply, Reply};
pub use scroll::{DeferredTask, Scheduler, ScrollCoordinator, TimerQueue, Viewport};
pub use session::{ChatSession, PendingAsk, UiState};
pub use store::ConversationStore;
pub use transport::{HttpReply, HttpTransport, Transport, TransportError};
pub use tts::{
    discover_player, player_for, AudioClip, AudioPlayer, CommandPlayer, MissingPlayer,
    PlaybackError, SpeakJob, TtsClient, TtsControl, TtsControls, TtsError, TtsNotice, TtsOutcome,
};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_version() {
        let version = engine_version();
        assert!(!version.is_empty());
        assert!(version.starts_with("0."));
    }
}
