//! Chat session: the input controller.
//!
//! A [`ChatSession`] owns the conversation store, the draft, the busy flag,
//! the scroll coordinator and the listen controls. All mutation goes through
//! it so every store change is seen by the scroll coordinator.
//!
//! Requests themselves run elsewhere. [`ChatSession::submit`] hands back a
//! [`PendingAsk`] ticket; whoever runs the request calls
//! [`ChatSession::settle`] with the outcome.

use std::time::Duration;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ask::{AskClient, AskOutcome};
use crate::config::Config;
use crate::message::{Message, MessageId};
use crate::scroll::{ScrollCoordinator, TimerQueue, Viewport};
use crate::store::ConversationStore;
use crate::tts::{SpeakJob, TtsControls, TtsNotice, TtsOutcome};

/// Input-side state shown by the front-end.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    /// Text in the input box.
    pub draft: String,
    /// An ask request is in flight; submits are ignored.
    pub busy: bool,
    /// Recorded transport or parse failure from the last settled request.
    pub last_error: Option<String>,
    /// Input focus should return to the text box.
    pub focus_requested: bool,
}

/// Ticket for an accepted submit, settled exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingAsk {
    pub query: String,
    pub placeholder: Option<MessageId>,
    generation: u64,
}

/// One conversation and its input state.
#[derive(Debug)]
pub struct ChatSession {
    id: Uuid,
    store: ConversationStore,
    ui: UiState,
    scroll: ScrollCoordinator,
    timers: TimerQueue,
    tts: TtsControls,
    placeholder: bool,
    greeting: String,
    /// Bumped on reset; tickets from older generations are stale.
    generation: u64,
}

impl ChatSession {
    /// Start a session seeded with the greeting.
    pub fn new(config: &Config) -> Self {
        let mut session = Self {
            id: Uuid::new_v4(),
            store: ConversationStore::new(),
            ui: UiState::default(),
            scroll: ScrollCoordinator::from_config(config),
            timers: TimerQueue::new(),
            tts: TtsControls::new(),
            placeholder: config.placeholder,
            greeting: config.greeting.clone(),
            generation: 0,
        };
        session.seed();
        debug!(session = %session.id, "session started");
        session
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn store(&self) -> &ConversationStore {
        &self.store
    }

    pub fn messages(&self) -> &[Message] {
        self.store.all()
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn is_busy(&self) -> bool {
        self.ui.busy
    }

    pub fn last_error(&self) -> Option<&str> {
        self.ui.last_error.as_deref()
    }

    pub fn draft(&self) -> &str {
        &self.ui.draft
    }

    pub fn set_draft(&mut self, draft: impl Into<String>) {
        self.ui.draft = draft.into();
    }

    /// Accept a question, or do nothing.
    ///
    /// Blank input and submits while busy are ignored. An accepted submit
    /// appends the user message (and the placeholder, when enabled), clears
    /// the draft and marks the session busy.
    pub fn submit(&mut self, raw: &str) -> Option<PendingAsk> {
        let query = raw.trim();
        if query.is_empty() {
            debug!(session = %self.id, "ignoring blank submit");
            return None;
        }
        if self.ui.busy {
            debug!(session = %self.id, "ignoring submit while a request is in flight");
            return None;
        }

        self.ui.last_error = None;
        self.append(Message::user(query));
        self.ui.draft.clear();
        self.ui.busy = true;

        let placeholder = if self.placeholder {
            Some(self.append(Message::placeholder()))
        } else {
            None
        };
        info!(session = %self.id, chars = query.chars().count(), "question submitted");

        Some(PendingAsk {
            query: query.to_string(),
            placeholder,
            generation: self.generation,
        })
    }

    /// Submit the current draft.
    pub fn submit_draft(&mut self) -> Option<PendingAsk> {
        let draft = self.ui.draft.clone();
        self.submit(&draft)
    }

    /// Apply the outcome of a request, returning the appended message's id.
    ///
    /// Tickets issued before the last [`reset`](Self::reset) are dropped.
    pub fn settle(&mut self, pending: PendingAsk, outcome: AskOutcome) -> Option<MessageId> {
        if pending.generation != self.generation {
            debug!(session = %self.id, "dropping reply for a reset conversation");
            self.ui.busy = false;
            return None;
        }

        if let Some(placeholder) = pending.placeholder {
            self.remove(placeholder);
        }
        let id = self.append(Message::assistant(outcome.content));

        if let Some(error) = outcome.error {
            warn!(session = %self.id, error = %error, "request failed");
            self.ui.last_error = Some(error);
        }
        self.ui.busy = false;
        self.ui.focus_requested = true;
        Some(id)
    }

    /// Submit, ask and settle in one go.
    pub async fn send(&mut self, raw: &str, client: &AskClient) -> Option<MessageId> {
        let pending = self.submit(raw)?;
        let outcome = client.ask(&pending.query).await;
        self.settle(pending, outcome)
    }

    /// The request behind `pending` will never settle, e.g. its task was aborted.
    ///
    /// Drops its placeholder if the conversation still shows it and frees
    /// the input for the next question. Nothing is appended.
    pub fn abandon(&mut self, pending: PendingAsk) {
        if pending.generation == self.generation {
            if let Some(placeholder) = pending.placeholder {
                self.remove(placeholder);
            }
        }
        self.ui.busy = false;
        debug!(session = %self.id, "request abandoned");
    }

    /// Start over from the greeting. In-flight replies are discarded.
    ///
    /// A request still in flight keeps the session busy until its ticket is
    /// settled or abandoned, so two questions are never outstanding at once.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.store.clear();
        self.ui = UiState {
            busy: self.ui.busy,
            ..UiState::default()
        };
        self.tts.clear();
        self.timers.clear();
        self.seed();
        info!(session = %self.id, generation = self.generation, "conversation reset");
    }

    /// Returns `true` once after a request settles.
    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.ui.focus_requested)
    }

    pub fn scroll(&self) -> &ScrollCoordinator {
        &self.scroll
    }

    /// Geometry updates and manual scrolling from the front-end.
    pub fn scroll_mut(&mut self) -> &mut ScrollCoordinator {
        &mut self.scroll
    }

    pub fn on_viewport_scrolled(&mut self, viewport: Viewport) {
        self.scroll.on_viewport_scrolled(viewport);
    }

    pub fn auto_scroll_suppressed(&self) -> bool {
        self.scroll.auto_scroll_suppressed()
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    /// Advance the deferred-task clock and run whatever came due.
    pub fn advance_timers(&mut self, elapsed: Duration) -> usize {
        let due = self.timers.advance(elapsed);
        let ran = due.len();
        for task in due {
            self.scroll.run(task);
        }
        ran
    }

    /// Start a listen for a stored assistant message.
    ///
    /// Returns `None` for unknown ids, user messages, placeholders, empty
    /// content, or a control that is already playing.
    pub fn begin_speak(&mut self, id: MessageId) -> Option<SpeakJob> {
        let message = self.store.get(id)?;
        if !message.is_assistant() || message.is_loading() {
            return None;
        }
        let text = message.content().to_string();
        self.tts.begin(id, &text)
    }

    pub fn finish_speak(&mut self, job: &SpeakJob, outcome: &TtsOutcome) {
        self.tts.finish(job, outcome);
    }

    pub fn tts(&self) -> &TtsControls {
        &self.tts
    }

    pub fn take_tts_notices(&mut self) -> Vec<TtsNotice> {
        self.tts.take_notices()
    }

    fn seed(&mut self) {
        if !self.greeting.trim().is_empty() {
            let greeting = Message::assistant(self.greeting.clone());
            self.append(greeting);
        }
    }

    fn append(&mut self, message: Message) -> MessageId {
        let id = self.store.append(message);
        self.scroll.on_store_mutated(&mut self.timers);
        id
    }

    fn remove(&mut self, id: MessageId) {
        if self.store.remove_by_id(id).is_some() {
            self.scroll.on_store_mutated(&mut self.timers);
        } else {
            debug!(session = %self.id, message = %id, "placeholder already gone");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ask::{OutcomeKind, REINDEXING_NOTICE, UNAVAILABLE_NOTICE};
    use crate::message::{Role, THINKING_INDICATOR};
    use crate::transport::fake::ScriptedTransport;
    use crate::transport::HttpReply;
    use crate::tts::fake::RecordingPlayer;
    use crate::tts::{TtsClient, PLAYBACK_FAILED_NOTICE};
    use serde_json::json;
    use std::sync::Arc;

    fn config() -> Config {
        Config {
            base_url: "http://test".into(),
            ..Config::default()
        }
    }

    fn answer(text: &str) -> AskOutcome {
        AskOutcome {
            kind: OutcomeKind::Answer,
            content: text.into(),
            error: None,
        }
    }

    #[test]
    fn test_new_session_has_greeting() {
        let session = ChatSession::new(&config());
        assert_eq!(session.messages().len(), 1);
        assert!(session.messages()[0].is_assistant());
        assert!(!session.is_busy());
    }

    #[test]
    fn test_blank_submit_is_noop() {
        let mut session = ChatSession::new(&config());
        session.set_draft("   ");
        assert!(session.submit_draft().is_none());
        assert!(session.submit("\n\t").is_none());
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.draft(), "   ");
        assert!(!session.is_busy());
    }

    #[test]
    fn test_submit_while_busy_is_noop() {
        let mut session = ChatSession::new(&config());
        let pending = session.submit("first").unwrap();
        let count = session.messages().len();

        session.set_draft("second");
        assert!(session.submit_draft().is_none());
        assert_eq!(session.messages().len(), count);
        assert_eq!(session.draft(), "second");

        session.settle(pending, answer("ok"));
        assert!(session.submit_draft().is_some());
    }

    #[test]
    fn test_submit_appends_trimmed_user_message_and_placeholder() {
        let mut session = ChatSession::new(&config());
        session.set_draft("  hello there  ");
        let pending = session.submit_draft().unwrap();

        assert_eq!(pending.query, "hello there");
        assert_eq!(session.draft(), "");
        assert!(session.is_busy());

        let messages = session.messages();
        assert_eq!(messages[1].role(), Role::User);
        assert_eq!(messages[1].content(), "hello there");
        assert!(messages[2].is_loading());
        assert_eq!(messages[2].content(), THINKING_INDICATOR);
        assert_eq!(pending.placeholder, Some(messages[2].id()));
    }

    #[test]
    fn test_placeholder_can_be_disabled() {
        let mut session = ChatSession::new(&Config {
            placeholder: false,
            ..config()
        });
        let pending = session.submit("q").unwrap();
        assert_eq!(pending.placeholder, None);
        assert_eq!(session.store().placeholder_count(), 0);

        session.settle(pending, answer("a"));
        assert_eq!(session.messages().len(), 3);
    }

    #[test]
    fn test_no_placeholder_survives_settlement() {
        let mut session = ChatSession::new(&config());
        let pending = session.submit("q").unwrap();
        assert_eq!(session.store().placeholder_count(), 1);

        let id = session.settle(pending, answer("a")).unwrap();
        assert_eq!(session.store().placeholder_count(), 0);
        assert_eq!(session.messages().last().map(Message::id), Some(id));
        assert_eq!(session.messages().len(), 3);
    }

    #[test]
    fn test_settle_tolerates_missing_placeholder() {
        let mut session = ChatSession::new(&config());
        let mut pending = session.submit("q").unwrap();
        pending.placeholder = Some(MessageId(999));

        assert!(session.settle(pending, answer("a")).is_some());
        assert!(!session.is_busy());
    }

    #[test]
    fn test_settle_after_reset_is_ignored() {
        let mut session = ChatSession::new(&config());
        let pending = session.submit("q").unwrap();
        session.reset();

        assert!(session.settle(pending, answer("late")).is_none());
        assert_eq!(session.messages().len(), 1);
        assert!(!session.is_busy());
    }

    #[test]
    fn test_reset_keeps_in_flight_request_exclusive() {
        let mut session = ChatSession::new(&config());
        let first = session.submit("first").unwrap();
        session.reset();

        assert!(session.is_busy());
        assert!(session.submit("second").is_none());
        assert_eq!(session.messages().len(), 1);

        assert!(session.settle(first, answer("late")).is_none());
        assert!(!session.is_busy());
        assert!(session.submit("second").is_some());
    }

    #[test]
    fn test_abandon_after_reset_frees_input() {
        let mut session = ChatSession::new(&config());
        let first = session.submit("first").unwrap();
        session.reset();

        session.abandon(first);
        assert!(!session.is_busy());
        assert_eq!(session.messages().len(), 1);
        assert!(session.submit("second").is_some());
    }

    #[test]
    fn test_abandon_removes_placeholder() {
        let mut session = ChatSession::new(&config());
        let pending = session.submit("q").unwrap();
        session.abandon(pending);

        assert_eq!(session.store().placeholder_count(), 0);
        assert_eq!(session.messages().len(), 2);
        assert!(!session.is_busy());
        assert!(!session.take_focus_request());
    }

    #[test]
    fn test_focus_requested_once_after_settle() {
        let mut session = ChatSession::new(&config());
        let pending = session.submit("q").unwrap();
        assert!(!session.take_focus_request());

        session.settle(pending, answer("a"));
        assert!(session.take_focus_request());
        assert!(!session.take_focus_request());
    }

    #[tokio::test]
    async fn test_olaf_question_round_trip() {
        let transport = Arc::new(ScriptedTransport::replying_json(
            200,
            json!({"status": "success", "data": {"answer": "Olaf knows X, Y, Z."}}),
        ));
        let client = AskClient::new(transport.clone(), &config());
        let mut session = ChatSession::new(&config());

        session.set_draft("What are Olaf's skills?");
        let draft = session.draft().to_string();
        session.send(&draft, &client).await.unwrap();

        let messages = session.messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].content(), "What are Olaf's skills?");
        assert_eq!(messages[2].content(), "Olaf knows X, Y, Z.");
        assert!(messages[2].is_assistant());
        assert_eq!(session.store().placeholder_count(), 0);
        assert!(!session.is_busy());
        assert_eq!(session.draft(), "");
        assert_eq!(session.last_error(), None);
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_reindexing_appends_notice_once() {
        let transport = Arc::new(ScriptedTransport::replying_json(
            200,
            json!({"status": "error", "message": "Index is reindexing"}),
        ));
        let client = AskClient::new(transport, &config());
        let mut session = ChatSession::new(&config());

        session.send("hi", &client).await;

        let notices = session
            .messages()
            .iter()
            .filter(|m| m.content() == REINDEXING_NOTICE)
            .count();
        assert_eq!(notices, 1);
        assert_eq!(session.messages().len(), 3);
        assert_eq!(session.last_error(), None);
    }

    #[tokio::test]
    async fn test_transport_failure_sets_last_error() {
        let client = AskClient::new(Arc::new(ScriptedTransport::failing()), &config());
        let mut session = ChatSession::new(&config());

        session.send("hi", &client).await;

        assert_eq!(session.messages().last().map(Message::content), Some(UNAVAILABLE_NOTICE));
        assert!(session.last_error().is_some());
        assert!(!session.is_busy());

        // The next accepted submit clears it.
        session.submit("again").unwrap();
        assert_eq!(session.last_error(), None);
    }

    #[test]
    fn test_every_mutation_schedules_scroll() {
        let mut session = ChatSession::new(&config());
        session.scroll_mut().set_client_height(400);
        session.scroll_mut().set_content_height(3000);
        session.on_viewport_scrolled(Viewport {
            scroll_top: 0,
            scroll_height: 3000,
            client_height: 400,
        });
        assert!(session.auto_scroll_suppressed());

        // Drop the greeting's pending scroll.
        session.advance_timers(Duration::from_secs(1));
        session.on_viewport_scrolled(Viewport {
            scroll_top: 0,
            scroll_height: 3000,
            client_height: 400,
        });

        let pending = session.submit("q").unwrap();
        assert_eq!(session.timers().len(), 2);
        session.settle(pending, answer("a"));
        assert_eq!(session.timers().len(), 4);

        assert_eq!(session.advance_timers(Duration::from_millis(100)), 4);
        assert!(!session.auto_scroll_suppressed());
        assert!(session.scroll().viewport().is_at_bottom());
    }

    #[tokio::test]
    async fn test_playback_failure_releases_guard_with_one_notice() {
        let transport = Arc::new(ScriptedTransport::new(vec![Ok(HttpReply::bytes(
            200,
            "audio/wav",
            b"RIFF".to_vec(),
        ))]));
        let player = Arc::new(RecordingPlayer::failing());
        let tts = TtsClient::new(transport, player.clone(), &config());
        let mut session = ChatSession::new(&config());
        let greeting = session.messages()[0].id();

        let job = session.begin_speak(greeting).unwrap();
        assert!(session.begin_speak(greeting).is_none());

        let outcome = tts.speak(&job.text).await;
        session.finish_speak(&job, &outcome);

        assert!(!session.tts().is_in_flight(greeting));
        let notices = session.take_tts_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].text, PLAYBACK_FAILED_NOTICE);
        assert!(session.take_tts_notices().is_empty());
        assert_eq!(player.play_count(), 1);
    }

    #[test]
    fn test_speak_rejects_user_messages_and_placeholders() {
        let mut session = ChatSession::new(&config());
        session.submit("q").unwrap();
        let user = session.messages()[1].id();
        let placeholder = session.messages()[2].id();

        assert!(session.begin_speak(user).is_none());
        assert!(session.begin_speak(placeholder).is_none());
        assert!(session.begin_speak(MessageId(12_345)).is_none());
    }

    #[test]
    fn test_reset_restores_greeting() {
        let mut session = ChatSession::new(&config());
        let pending = session.submit("q").unwrap();
        session.settle(pending, answer("a"));
        session.reset();

        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.ui(), &UiState::default());
    }
}
