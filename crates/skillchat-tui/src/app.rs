//! Application state and update logic for the chat TUI.
//!
//! All conversation mutation happens here, on the UI loop. Network work is
//! described by [`Command`]s that the loop runs and feeds back through
//! [`App::apply_reply`] and [`App::apply_speech`].

use crossterm::event::{KeyEvent, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use skillchat_engine::{
    AskOutcome, ChatSession, Config, MessageId, PendingAsk, SpeakJob, TtsOutcome,
};
use std::collections::VecDeque;
use std::time::Duration;
use tracing::debug;

use crate::conversation::{ConversationLayout, ConversationView, ROW_HEIGHT_PX};
use crate::event::{key_to_action, Action};
use crate::screens::chat::chat_layout;
use crate::theme::Theme;
use crate::widgets::TextInputState;

/// Ticks a notice stays visible (about 4 seconds at 4 Hz).
const NOTICE_TICKS: usize = 16;

/// Rows moved per mouse wheel step.
const WHEEL_ROWS: i64 = 3;

/// Most draft lines shown before the input box scrolls.
const MAX_INPUT_LINES: u16 = 5;

/// Which area receives key presses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Input,
    Messages,
}

/// Network work requested by a key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(PendingAsk),
    Speak(SpeakJob),
    /// Abort in-flight ask requests and hand their tickets to [`App::cancel_ask`].
    CancelAsks,
}

/// Transient footer message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
    expires_at: usize,
}

/// Application state.
#[derive(Debug)]
pub struct App {
    pub session: ChatSession,
    pub input: TextInputState,
    pub focus: Focus,
    /// Selected message while the message list has focus.
    pub selected: Option<MessageId>,
    pub theme: Theme,
    pub backend: String,
    pub base_url: String,
    pub should_quit: bool,
    pub show_help: bool,
    /// Tick counter for animations.
    pub tick: usize,
    pub notice: Option<Notice>,
    /// Notices waiting for the current one to expire.
    queued_notices: VecDeque<(String, bool)>,
    /// Layout from the last [`App::sync_layout`].
    pub layout: ConversationLayout,
}

impl App {
    pub fn new(config: &Config, theme: Theme) -> Self {
        Self {
            session: ChatSession::new(config),
            input: TextInputState::new(),
            focus: Focus::Input,
            selected: None,
            theme,
            backend: config.backend.as_str().to_string(),
            base_url: config.base_url.clone(),
            should_quit: false,
            show_help: false,
            tick: 0,
            notice: None,
            queued_notices: VecDeque::new(),
            layout: ConversationLayout::default(),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        self.handle_action(key_to_action(key, self.focus))
    }

    pub fn handle_action(&mut self, action: Action) -> Option<Command> {
        // Any key closes the help overlay.
        if self.show_help {
            self.show_help = false;
            return None;
        }

        match action {
            Action::Quit => self.should_quit = true,
            Action::Help => self.show_help = true,
            Action::Reset => return self.reset(),
            Action::ToggleFocus => self.toggle_focus(),
            Action::PageUp => self.scroll_page(-1),
            Action::PageDown => self.scroll_page(1),

            Action::Submit => return self.submit(),
            Action::Newline => self.edit(|input| input.insert('\n')),
            Action::Insert(c) => self.edit(|input| input.insert(c)),
            Action::Backspace => self.edit(TextInputState::backspace),
            Action::Delete => self.edit(TextInputState::delete),
            Action::Left => self.input.move_left(),
            Action::Right => self.input.move_right(),
            Action::Home => self.input.move_home(),
            Action::End => self.input.move_end(),
            Action::HistoryPrev => self.edit(TextInputState::history_prev),
            Action::HistoryNext => self.edit(TextInputState::history_next),

            Action::SelectPrev => self.move_selection(-1),
            Action::SelectNext => self.move_selection(1),
            Action::Listen => {
                let id = self.selected?;
                let job = self.session.begin_speak(id);
                if job.is_none() {
                    debug!(message = %id, "listen not started");
                }
                return job.map(Command::Speak);
            }
            Action::JumpToBottom => self.session.scroll_mut().scroll_to_bottom(),
            Action::None => {}
        }
        None
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) {
        let step = WHEEL_ROWS * i64::from(ROW_HEIGHT_PX);
        match mouse.kind {
            MouseEventKind::ScrollUp => self.session.scroll_mut().scroll_by(-step),
            MouseEventKind::ScrollDown => self.session.scroll_mut().scroll_by(step),
            _ => {}
        }
    }

    /// Settle a finished ask request.
    pub fn apply_reply(&mut self, pending: PendingAsk, outcome: AskOutcome) {
        if self.session.settle(pending, outcome).is_none() {
            return;
        }
        if let Some(error) = self.session.last_error().map(str::to_string) {
            self.set_notice(format!("Request failed: {error}"), true);
        }
    }

    /// Drop an ask request whose task was aborted.
    pub fn cancel_ask(&mut self, pending: PendingAsk) {
        self.session.abandon(pending);
    }

    /// Settle a finished speak request.
    pub fn apply_speech(&mut self, job: &SpeakJob, outcome: &TtsOutcome) {
        self.session.finish_speak(job, outcome);
    }

    /// Per-frame bookkeeping: run due deferred tasks and pick up session signals.
    pub fn advance(&mut self, elapsed: Duration) {
        self.session.advance_timers(elapsed);

        for notice in self.session.take_tts_notices() {
            self.queued_notices.push_back((notice.text, true));
        }
        self.show_queued_notice();
        if self.session.take_focus_request() {
            self.focus = Focus::Input;
            self.selected = None;
        }
    }

    /// Animation tick; also expires notices.
    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
        if self
            .notice
            .as_ref()
            .is_some_and(|n| self.tick >= n.expires_at)
        {
            self.notice = None;
        }
        self.show_queued_notice();
    }

    /// Lay out the conversation for `area` and report geometry to the session.
    pub fn sync_layout(&mut self, area: Rect) {
        let areas = chat_layout(area, self.input_rows());
        let width = ConversationView::inner_width(areas.messages.width);
        let height = ConversationView::inner_height(areas.messages.height);

        self.layout = ConversationLayout::build(
            self.session.messages(),
            width,
            &self.theme,
            self.selected,
            self.session.tts(),
            self.tick,
        );

        let scroll = self.session.scroll_mut();
        scroll.set_client_height(u32::from(height) * ROW_HEIGHT_PX);
        scroll.set_content_height(rows_to_px(self.layout.height()));
    }

    /// First visible conversation row.
    pub fn scroll_offset(&self) -> usize {
        let top = self.session.scroll().viewport().scroll_top / ROW_HEIGHT_PX;
        usize::try_from(top).unwrap_or(usize::MAX)
    }

    /// Height of the input box including borders.
    pub fn input_rows(&self) -> u16 {
        let lines = self.input.content().split('\n').count();
        u16::try_from(lines).unwrap_or(u16::MAX).clamp(1, MAX_INPUT_LINES) + 2
    }

    pub fn set_notice(&mut self, text: impl Into<String>, is_error: bool) {
        self.notice = Some(Notice {
            text: text.into(),
            is_error,
            expires_at: self.tick + NOTICE_TICKS,
        });
    }

    fn show_queued_notice(&mut self) {
        if self.notice.is_some() {
            return;
        }
        if let Some((text, is_error)) = self.queued_notices.pop_front() {
            self.set_notice(text, is_error);
        }
    }

    fn submit(&mut self) -> Option<Command> {
        self.session.set_draft(self.input.content());
        let pending = self.session.submit_draft()?;
        self.input.commit();
        Some(Command::Ask(pending))
    }

    fn edit(&mut self, f: impl FnOnce(&mut TextInputState)) {
        f(&mut self.input);
        self.session.set_draft(self.input.content());
    }

    fn reset(&mut self) -> Option<Command> {
        let was_busy = self.session.is_busy();
        self.session.reset();
        self.input.clear();
        self.session.set_draft("");
        self.selected = None;
        self.focus = Focus::Input;
        self.queued_notices.clear();
        self.set_notice("Conversation cleared.", false);
        was_busy.then_some(Command::CancelAsks)
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input => Focus::Messages,
            Focus::Messages => Focus::Input,
        };
        if self.focus == Focus::Messages {
            if self.selected.is_none() {
                self.selected = self.speakable().last().copied();
            }
        } else {
            self.selected = None;
        }
    }

    /// Assistant replies that can be listened to, oldest first.
    fn speakable(&self) -> Vec<MessageId> {
        self.session
            .messages()
            .iter()
            .filter(|m| m.is_assistant() && !m.is_loading())
            .map(skillchat_engine::Message::id)
            .collect()
    }

    fn move_selection(&mut self, delta: isize) {
        let ids = self.speakable();
        if ids.is_empty() {
            self.selected = None;
            return;
        }
        let next = match self.selected.and_then(|id| ids.iter().position(|&i| i == id)) {
            Some(pos) => pos.saturating_add_signed(delta).min(ids.len() - 1),
            None => ids.len() - 1,
        };
        self.selected = Some(ids[next]);
        self.reveal(ids[next]);
    }

    /// Scroll just enough to show a message.
    fn reveal(&mut self, id: MessageId) {
        let Some(rows) = self.layout.rows_of(id) else {
            return;
        };
        let viewport = self.session.scroll().viewport();
        let top = rows_to_px(rows.start);
        let bottom = rows_to_px(rows.start + rows.len);

        let delta = if top < viewport.scroll_top {
            i64::from(top) - i64::from(viewport.scroll_top)
        } else if bottom > viewport.scroll_top + viewport.client_height {
            i64::from(bottom) - i64::from(viewport.scroll_top + viewport.client_height)
        } else {
            0
        };
        if delta != 0 {
            self.session.scroll_mut().scroll_by(delta);
        }
    }

    fn scroll_page(&mut self, direction: i64) {
        let page = self.session.scroll().viewport().client_height;
        let page = i64::from(page.saturating_sub(ROW_HEIGHT_PX).max(ROW_HEIGHT_PX));
        self.session.scroll_mut().scroll_by(direction * page);
    }
}

fn rows_to_px(rows: usize) -> u32 {
    u32::try_from(rows)
        .unwrap_or(u32::MAX)
        .saturating_mul(ROW_HEIGHT_PX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::create_test_app;
    use crossterm::event::{KeyCode, KeyModifiers};
    use skillchat_engine::{OutcomeKind, TtsError};

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_action(Action::Insert(c));
        }
    }

    fn answer(content: &str) -> AskOutcome {
        AskOutcome {
            kind: OutcomeKind::Answer,
            content: content.to_string(),
            error: None,
        }
    }

    #[test]
    fn test_submit_returns_ask_and_clears_input() {
        let mut app = create_test_app();
        type_text(&mut app, "  What are Olaf's skills?  ");
        assert_eq!(app.session.draft(), "  What are Olaf's skills?  ");

        let Some(Command::Ask(pending)) = app.handle_action(Action::Submit) else {
            panic!("expected an ask command");
        };
        assert_eq!(pending.query, "What are Olaf's skills?");
        assert!(app.input.is_empty());
        assert!(app.session.is_busy());
        assert_eq!(app.session.messages().len(), 3);
    }

    #[test]
    fn test_blank_and_busy_submits_do_nothing() {
        let mut app = create_test_app();
        type_text(&mut app, "   ");
        assert!(app.handle_action(Action::Submit).is_none());
        assert_eq!(app.session.messages().len(), 1);

        app.input.clear();
        type_text(&mut app, "first");
        assert!(app.handle_action(Action::Submit).is_some());
        type_text(&mut app, "second");
        assert!(app.handle_action(Action::Submit).is_none());
        assert_eq!(app.input.content(), "second");
    }

    #[test]
    fn test_reply_returns_focus_to_input() {
        let mut app = create_test_app();
        type_text(&mut app, "Hi");
        let Some(Command::Ask(pending)) = app.handle_action(Action::Submit) else {
            panic!("expected an ask command");
        };
        app.handle_action(Action::ToggleFocus);
        assert_eq!(app.focus, Focus::Messages);

        app.apply_reply(pending, answer("Hello!"));
        app.advance(Duration::ZERO);
        assert_eq!(app.focus, Focus::Input);
        assert!(!app.session.is_busy());
        assert_eq!(app.session.messages().last().unwrap().content(), "Hello!");
    }

    #[test]
    fn test_failed_reply_sets_error_notice() {
        let mut app = create_test_app();
        type_text(&mut app, "Hi");
        let Some(Command::Ask(pending)) = app.handle_action(Action::Submit) else {
            panic!("expected an ask command");
        };
        app.apply_reply(pending, AskOutcome::unavailable("connection refused"));

        let notice = app.notice.as_ref().unwrap();
        assert!(notice.is_error);
        assert!(notice.text.contains("connection refused"));
    }

    #[test]
    fn test_listen_on_selected_assistant_message() {
        let mut app = create_test_app();
        app.handle_action(Action::ToggleFocus);
        let greeting = app.session.messages()[0].id();
        assert_eq!(app.selected, Some(greeting));

        let Some(Command::Speak(job)) = app.handle_action(Action::Listen) else {
            panic!("expected a speak command");
        };
        assert_eq!(job.message_id, greeting);
        // Guarded while in flight.
        assert!(app.handle_action(Action::Listen).is_none());

        app.apply_speech(
            &job,
            &TtsOutcome::Failed(TtsError::Status {
                status: 500,
                message: None,
            }),
        );
        app.advance(Duration::ZERO);
        assert!(app.notice.as_ref().is_some_and(|n| n.is_error));
        assert!(app.handle_action(Action::Listen).is_some());
    }

    #[test]
    fn test_keys_route_by_focus() {
        let mut app = create_test_app();
        app.handle_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE));
        assert_eq!(app.input.content(), "q");
        assert!(!app.should_quit);

        app.handle_key(KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE));
        app.handle_key(KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE));
        assert!(app.should_quit);
    }

    #[test]
    fn test_help_closes_on_any_key() {
        let mut app = create_test_app();
        app.handle_action(Action::Help);
        assert!(app.show_help);
        app.handle_action(Action::Quit);
        assert!(!app.show_help);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_reset_restores_greeting() {
        let mut app = create_test_app();
        type_text(&mut app, "Hi");
        app.handle_action(Action::Submit);
        type_text(&mut app, "draft");
        app.handle_action(Action::Reset);

        assert_eq!(app.session.messages().len(), 1);
        assert!(app.input.is_empty());
        assert!(app.notice.is_some());
    }

    #[test]
    fn test_reset_while_asking_cancels_before_next_submit() {
        let mut app = create_test_app();
        type_text(&mut app, "first");
        let Some(Command::Ask(first)) = app.handle_action(Action::Submit) else {
            panic!("expected an ask command");
        };

        assert_eq!(app.handle_action(Action::Reset), Some(Command::CancelAsks));
        type_text(&mut app, "second");
        assert!(app.handle_action(Action::Submit).is_none());

        app.cancel_ask(first);
        assert!(!app.session.is_busy());
        assert!(matches!(
            app.handle_action(Action::Submit),
            Some(Command::Ask(pending)) if pending.query == "second"
        ));
    }

    #[test]
    fn test_idle_reset_needs_no_cancel() {
        let mut app = create_test_app();
        assert!(app.handle_action(Action::Reset).is_none());
    }

    #[test]
    fn test_listen_failures_are_queued() {
        let mut app = create_test_app();
        let greeting = app.session.messages()[0].id();
        let job = app.session.begin_speak(greeting).unwrap();

        type_text(&mut app, "q");
        let Some(Command::Ask(pending)) = app.handle_action(Action::Submit) else {
            panic!("expected an ask command");
        };
        app.apply_reply(pending, answer("second reply"));
        let reply = app.session.messages().last().unwrap().id();
        let second = app.session.begin_speak(reply).unwrap();

        let failed = |status| TtsOutcome::Failed(TtsError::Status { status, message: None });
        app.notice = None;
        app.apply_speech(&job, &failed(500));
        app.apply_speech(&second, &failed(502));
        app.advance(Duration::ZERO);

        let first_text = app.notice.as_ref().map(|n| n.text.clone()).unwrap();
        assert!(first_text.contains("500"));

        for _ in 0..NOTICE_TICKS {
            app.tick();
        }
        let second_text = app.notice.as_ref().map(|n| n.text.clone()).unwrap();
        assert!(second_text.contains("502"));

        for _ in 0..NOTICE_TICKS {
            app.tick();
        }
        assert!(app.notice.is_none());
    }

    #[test]
    fn test_scroll_follows_new_messages_after_settle_delay() {
        let mut app = create_test_app();
        let area = Rect::new(0, 0, 60, 12);
        for i in 0..6 {
            type_text(&mut app, &format!("question {i}"));
            let Some(Command::Ask(pending)) = app.handle_action(Action::Submit) else {
                panic!("expected an ask command");
            };
            app.apply_reply(pending, answer("answer"));
        }
        app.sync_layout(area);
        assert_eq!(app.scroll_offset(), 0);

        app.advance(Duration::from_millis(100));
        let viewport = app.session.scroll().viewport();
        assert!(viewport.is_at_bottom());
        assert!(app.scroll_offset() > 0);
        assert!(!app.session.auto_scroll_suppressed());
    }

    #[test]
    fn test_scrolling_up_suppresses_auto_scroll() {
        let mut app = create_test_app();
        let area = Rect::new(0, 0, 60, 12);
        for i in 0..6 {
            type_text(&mut app, &format!("question {i}"));
            let Some(Command::Ask(pending)) = app.handle_action(Action::Submit) else {
                panic!("expected an ask command");
            };
            app.apply_reply(pending, answer("answer"));
        }
        app.sync_layout(area);
        app.advance(Duration::from_millis(100));

        // 3 rows of 16px is within the 100px threshold; 9 rows is not.
        app.handle_mouse(MouseEvent {
            kind: MouseEventKind::ScrollUp,
            column: 0,
            row: 0,
            modifiers: KeyModifiers::NONE,
        });
        assert!(!app.session.auto_scroll_suppressed());
        app.handle_action(Action::PageUp);
        assert!(app.session.auto_scroll_suppressed());

        app.handle_action(Action::JumpToBottom);
        assert!(!app.session.auto_scroll_suppressed());
    }

    #[test]
    fn test_notice_expires() {
        let mut app = create_test_app();
        app.set_notice("hello", false);
        for _ in 0..NOTICE_TICKS {
            assert!(app.notice.is_some());
            app.tick();
        }
        assert!(app.notice.is_none());
    }

    #[test]
    fn test_input_rows_grow_with_draft() {
        let mut app = create_test_app();
        assert_eq!(app.input_rows(), 3);
        type_text(&mut app, "a\nb\nc");
        assert_eq!(app.input_rows(), 5);
        type_text(&mut app, "\nd\ne\nf\ng");
        assert_eq!(app.input_rows(), MAX_INPUT_LINES + 2);
    }
}
