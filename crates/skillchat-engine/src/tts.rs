//! Text-to-speech playback.
//!
//! - [`TtsClient`] fetches synthesized audio and hands it to an [`AudioPlayer`]
//! - [`CommandPlayer`] plays a clip through an external player process
//! - [`TtsControls`] tracks the per-message "Listen" control state

use std::collections::{HashMap, VecDeque};
use std::process::Stdio;
use std::sync::Arc;

use serde_json::json;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::message::MessageId;
use crate::transport::{HttpReply, Transport, TransportError};

/// Notice shown when audio was fetched but could not be played.
pub const PLAYBACK_FAILED_NOTICE: &str = "Audio playback failed.";

/// Placeholder in a player argv replaced by the audio file path.
pub const FILE_PLACEHOLDER: &str = "{file}";

/// Players tried, in order, when none is configured.
const KNOWN_PLAYERS: &[(&str, &[&str])] = &[
    ("paplay", &[]),
    ("aplay", &["-q"]),
    ("afplay", &[]),
    ("ffplay", &["-nodisp", "-autoexit", "-loglevel", "quiet"]),
];

/// Synthesized audio as returned by the TTS endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    /// `X-API-Status` header, if the backend sent one.
    pub api_status: Option<String>,
    /// `X-API-Message` header, if the backend sent one.
    pub api_message: Option<String>,
}

impl AudioClip {
    pub fn from_reply(reply: HttpReply) -> Self {
        Self {
            bytes: reply.body,
            content_type: reply.content_type,
            api_status: reply.api_status,
            api_message: reply.api_message,
        }
    }

    /// File extension (with dot) matching the content type.
    pub fn extension(&self) -> &'static str {
        let mime = self
            .content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(str::trim)
            .unwrap_or_default();
        match mime {
            "audio/mpeg" | "audio/mp3" => ".mp3",
            "audio/ogg" => ".ogg",
            "audio/flac" => ".flac",
            _ => ".wav",
        }
    }
}

/// Errors from playing a clip.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    /// The clip has no audio data.
    #[error("audio clip is empty")]
    EmptyAudio,

    /// No player configured and none found on PATH.
    #[error("no audio player found (tried paplay, aplay, afplay, ffplay)")]
    NoPlayer,

    /// I/O error preparing the temporary audio file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to spawn the player process.
    #[error("failed to spawn player '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The player exited unsuccessfully.
    #[error("player exited with code {code:?}: {stderr}")]
    Player { code: Option<i32>, stderr: String },
}

/// Errors from a TTS request.
#[derive(Debug, thiserror::Error)]
pub enum TtsError {
    /// The request never produced a response.
    #[error("TTS request failed: {0}")]
    Request(#[from] TransportError),

    /// The endpoint answered with a non-success status.
    #[error("TTS request failed: {status}{}", .message.as_deref().map(|m| format!(" ({m})")).unwrap_or_default())]
    Status { status: u16, message: Option<String> },

    /// Audio arrived but could not be played.
    #[error("{PLAYBACK_FAILED_NOTICE} {0}")]
    Playback(#[from] PlaybackError),

    /// The task running the request died before reporting back.
    #[error("TTS task failed: {0}")]
    Task(String),
}

impl TtsError {
    /// Short user-facing notice.
    pub fn notice(&self) -> String {
        match self {
            Self::Playback(_) => PLAYBACK_FAILED_NOTICE.to_string(),
            other => other.to_string(),
        }
    }
}

/// Plays audio clips. Implementations must not return before playback ends.
#[async_trait::async_trait]
pub trait AudioPlayer: Send + Sync {
    async fn play(&self, clip: &AudioClip) -> Result<(), PlaybackError>;
}

/// Find the first known audio player on PATH.
pub fn discover_player() -> Option<Vec<String>> {
    KNOWN_PLAYERS.iter().find_map(|(name, args)| {
        which::which(name).ok().map(|path| {
            let mut argv = vec![path.display().to_string()];
            argv.extend(args.iter().map(|a| (*a).to_string()));
            argv
        })
    })
}

/// [`AudioPlayer`] that runs an external command on a temporary file.
///
/// The temporary file lives for exactly one playback.
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    argv: Vec<String>,
}

impl CommandPlayer {
    pub fn new(argv: Vec<String>) -> Result<Self, PlaybackError> {
        if argv.first().is_none_or(|cmd| cmd.trim().is_empty()) {
            return Err(PlaybackError::NoPlayer);
        }
        Ok(Self { argv })
    }

    /// Use the configured player command, or discover one.
    pub fn from_config(config: &Config) -> Result<Self, PlaybackError> {
        match &config.player_command {
            Some(argv) => Self::new(argv.clone()),
            None => discover_player().ok_or(PlaybackError::NoPlayer).and_then(Self::new),
        }
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    /// Arguments for playing `path`, substituting [`FILE_PLACEHOLDER`] or appending.
    fn args_for(&self, path: &str) -> Vec<String> {
        let mut substituted = false;
        let mut args: Vec<String> = self.argv[1..]
            .iter()
            .map(|arg| {
                if arg.contains(FILE_PLACEHOLDER) {
                    substituted = true;
                    arg.replace(FILE_PLACEHOLDER, path)
                } else {
                    arg.clone()
                }
            })
            .collect();
        if !substituted {
            args.push(path.to_string());
        }
        args
    }
}

#[async_trait::async_trait]
impl AudioPlayer for CommandPlayer {
    async fn play(&self, clip: &AudioClip) -> Result<(), PlaybackError> {
        if clip.bytes.is_empty() {
            return Err(PlaybackError::EmptyAudio);
        }

        let file = tempfile::Builder::new()
            .prefix("skillchat-")
            .suffix(clip.extension())
            .tempfile()?;
        tokio::fs::write(file.path(), &clip.bytes).await?;

        let path = file.path().display().to_string();
        let mut cmd = Command::new(&self.argv[0]);
        cmd.args(self.args_for(&path))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(player = %self.argv[0], file = %path, "starting playback");
        let output = cmd.output().await.map_err(|source| PlaybackError::Spawn {
            command: self.argv[0].clone(),
            source,
        })?;

        // `file` is removed here, whatever the player's exit status.
        drop(file);

        if output.status.success() {
            Ok(())
        } else {
            Err(PlaybackError::Player {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

/// [`AudioPlayer`] used when no player is available; every playback fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingPlayer;

#[async_trait::async_trait]
impl AudioPlayer for MissingPlayer {
    async fn play(&self, _clip: &AudioClip) -> Result<(), PlaybackError> {
        Err(PlaybackError::NoPlayer)
    }
}

/// The configured or discovered player, falling back to [`MissingPlayer`].
pub fn player_for(config: &Config) -> Arc<dyn AudioPlayer> {
    match CommandPlayer::from_config(config) {
        Ok(player) => Arc::new(player),
        Err(err) => {
            warn!(error = %err, "audio playback disabled");
            Arc::new(MissingPlayer)
        }
    }
}

/// How a speak request settled.
#[derive(Debug)]
pub enum TtsOutcome {
    /// Audio was fetched and played to the end.
    Played,
    /// Nothing to say; no request was made.
    Skipped,
    Failed(TtsError),
}

impl TtsOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Client for the TTS endpoint.
#[derive(Clone)]
pub struct TtsClient {
    transport: Arc<dyn Transport>,
    player: Arc<dyn AudioPlayer>,
    url: String,
}

impl TtsClient {
    pub fn new(transport: Arc<dyn Transport>, player: Arc<dyn AudioPlayer>, config: &Config) -> Self {
        Self {
            transport,
            player,
            url: config.endpoint_url(&config.tts_endpoint),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch synthesized audio for `text` without playing it.
    pub async fn synthesize(&self, text: &str) -> Result<AudioClip, TtsError> {
        info!(url = %self.url, chars = text.chars().count(), "requesting speech");
        let reply = self
            .transport
            .post_json(&self.url, &json!({ "text": text }))
            .await?;

        if !reply.is_success() {
            let message = error_message(&reply);
            warn!(status = reply.status, message = ?message, "speech request rejected");
            return Err(TtsError::Status {
                status: reply.status,
                message,
            });
        }

        let clip = AudioClip::from_reply(reply);
        debug!(
            bytes = clip.bytes.len(),
            content_type = ?clip.content_type,
            api_message = ?clip.api_message,
            "received audio"
        );
        Ok(clip)
    }

    /// Fetch and play `text`. Never returns an error; failures are in the outcome.
    pub async fn speak(&self, text: &str) -> TtsOutcome {
        if text.trim().is_empty() {
            return TtsOutcome::Skipped;
        }

        let clip = match self.synthesize(text).await {
            Ok(clip) => clip,
            Err(e) => return TtsOutcome::Failed(e),
        };

        match self.player.play(&clip).await {
            Ok(()) => TtsOutcome::Played,
            Err(e) => {
                warn!(error = %e, "audio playback failed");
                TtsOutcome::Failed(TtsError::Playback(e))
            }
        }
    }
}

/// Best-effort `message` from an error body.
fn error_message(reply: &HttpReply) -> Option<String> {
    serde_json::from_slice::<serde_json::Value>(&reply.body)
        .ok()?
        .get("message")?
        .as_str()
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
}

/// State of one message's "Listen" control.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TtsControl {
    /// A request or playback is running; further presses are ignored.
    pub in_flight: bool,
    /// Failure notice from the last attempt.
    pub notice: Option<String>,
}

/// A speak request admitted by [`TtsControls::begin`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeakJob {
    pub message_id: MessageId,
    pub text: String,
}

/// A failure notice raised by a control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtsNotice {
    pub message_id: MessageId,
    pub text: String,
}

/// Listen controls keyed by message id.
///
/// Each control guards itself only; different messages may play at once.
#[derive(Debug, Default)]
pub struct TtsControls {
    controls: HashMap<MessageId, TtsControl>,
    notices: VecDeque<TtsNotice>,
}

impl TtsControls {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a speak request for `id`.
    ///
    /// Returns `None` when `text` is blank or the control is already in flight.
    pub fn begin(&mut self, id: MessageId, text: &str) -> Option<SpeakJob> {
        if text.trim().is_empty() {
            return None;
        }
        let control = self.controls.entry(id).or_default();
        if control.in_flight {
            debug!(message = %id, "listen ignored, already in flight");
            return None;
        }
        control.in_flight = true;
        control.notice = None;
        Some(SpeakJob {
            message_id: id,
            text: text.to_string(),
        })
    }

    /// Settle a job. The guard is always released; failures raise one notice.
    pub fn finish(&mut self, job: &SpeakJob, outcome: &TtsOutcome) {
        let Some(control) = self.controls.get_mut(&job.message_id) else {
            debug!(message = %job.message_id, "listen finished for a cleared message");
            return;
        };
        control.in_flight = false;
        if let TtsOutcome::Failed(err) = outcome {
            let text = err.notice();
            control.notice = Some(text.clone());
            self.notices.push_back(TtsNotice {
                message_id: job.message_id,
                text,
            });
        }
    }

    pub fn is_in_flight(&self, id: MessageId) -> bool {
        self.controls.get(&id).is_some_and(|c| c.in_flight)
    }

    pub fn control(&self, id: MessageId) -> Option<&TtsControl> {
        self.controls.get(&id)
    }

    /// Number of controls with a request or playback running.
    pub fn active_count(&self) -> usize {
        self.controls.values().filter(|c| c.in_flight).count()
    }

    /// Drain notices raised since the last call.
    pub fn take_notices(&mut self) -> Vec<TtsNotice> {
        self.notices.drain(..).collect()
    }

    pub fn clear(&mut self) {
        self.controls.clear();
        self.notices.clear();
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory players.

    use super::*;
    use std::sync::Mutex;

    /// Records clips; fails every playback when `fail` is set.
    #[derive(Default)]
    pub struct RecordingPlayer {
        pub fail: bool,
        pub played: Mutex<Vec<AudioClip>>,
    }

    impl RecordingPlayer {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub fn play_count(&self) -> usize {
            self.played.lock().unwrap().len()
        }
    }

    #[async_trait::async_trait]
    impl AudioPlayer for RecordingPlayer {
        async fn play(&self, clip: &AudioClip) -> Result<(), PlaybackError> {
            self.played.lock().unwrap().push(clip.clone());
            if self.fail {
                Err(PlaybackError::Player {
                    code: Some(1),
                    stderr: "device busy".into(),
                })
            } else {
                Ok(())
            }
        }
    }
}
