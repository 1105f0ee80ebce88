//! Event handling for the chat TUI.

use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyModifiers, MouseEvent};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::app::Focus;

/// Events that can occur in the TUI.
#[derive(Debug, Clone)]
pub enum Event {
    Key(KeyEvent),
    Mouse(MouseEvent),
    /// No input within one tick; drives animation and deferred tasks.
    Tick,
    Resize(u16, u16),
}

/// Polls crossterm on a blocking thread and forwards events.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    _tx: mpsc::UnboundedSender<Event>,
}

impl EventHandler {
    pub fn new(tick_rate_ms: u64) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let tx_clone = tx.clone();

        // crossterm reads block, so poll off the runtime.
        std::thread::spawn(move || {
            let tick_rate = Duration::from_millis(tick_rate_ms);
            loop {
                let event = if event::poll(tick_rate).unwrap_or(false) {
                    match event::read() {
                        Ok(CrosstermEvent::Key(key)) => Some(Event::Key(key)),
                        Ok(CrosstermEvent::Mouse(mouse)) => Some(Event::Mouse(mouse)),
                        Ok(CrosstermEvent::Resize(w, h)) => Some(Event::Resize(w, h)),
                        _ => None,
                    }
                } else {
                    Some(Event::Tick)
                };
                if let Some(e) = event {
                    if tx_clone.send(e).is_err() {
                        break;
                    }
                }
            }
        });

        Self { rx, _tx: tx }
    }

    /// Get the next event, waiting at most one tick.
    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    Help,
    Reset,
    ToggleFocus,

    // Input focus
    Submit,
    Newline,
    Insert(char),
    Backspace,
    Delete,
    Left,
    Right,
    Home,
    End,
    HistoryPrev,
    HistoryNext,

    // Message focus
    SelectPrev,
    SelectNext,
    Listen,
    JumpToBottom,

    PageUp,
    PageDown,
    None,
}

/// Map a key press to an action for the focused area.
pub fn key_to_action(key: KeyEvent, focus: Focus) -> Action {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    if ctrl {
        return match key.code {
            KeyCode::Char('c') => Action::Quit,
            KeyCode::Char('r') => Action::Reset,
            // Ctrl+J is what terminals without enhanced keys send for Ctrl+Enter.
            KeyCode::Char('j') | KeyCode::Enter if focus == Focus::Input => Action::Newline,
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Esc => Action::Quit,
        KeyCode::F(1) => Action::Help,
        KeyCode::Tab | KeyCode::BackTab => Action::ToggleFocus,
        KeyCode::PageUp => Action::PageUp,
        KeyCode::PageDown => Action::PageDown,
        _ => match focus {
            Focus::Input => input_action(key.code, alt),
            Focus::Messages => message_action(key.code),
        },
    }
}

fn input_action(code: KeyCode, alt: bool) -> Action {
    match code {
        KeyCode::Enter if alt => Action::Newline,
        KeyCode::Enter => Action::Submit,
        KeyCode::Char(c) => Action::Insert(c),
        KeyCode::Backspace => Action::Backspace,
        KeyCode::Delete => Action::Delete,
        KeyCode::Left => Action::Left,
        KeyCode::Right => Action::Right,
        KeyCode::Home => Action::Home,
        KeyCode::End => Action::End,
        KeyCode::Up => Action::HistoryPrev,
        KeyCode::Down => Action::HistoryNext,
        _ => Action::None,
    }
}

fn message_action(code: KeyCode) -> Action {
    match code {
        KeyCode::Up | KeyCode::Char('k') => Action::SelectPrev,
        KeyCode::Down | KeyCode::Char('j') => Action::SelectNext,
        KeyCode::Enter | KeyCode::Char('l') => Action::Listen,
        KeyCode::End | KeyCode::Char('G') => Action::JumpToBottom,
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Char('?') => Action::Help,
        _ => Action::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_enter_submits_and_modified_enter_inserts_newline() {
        assert_eq!(key_to_action(key(KeyCode::Enter), Focus::Input), Action::Submit);
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Enter, KeyModifiers::CONTROL), Focus::Input),
            Action::Newline
        );
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Enter, KeyModifiers::ALT), Focus::Input),
            Action::Newline
        );
        assert_eq!(
            key_to_action(KeyEvent::new(KeyCode::Char('j'), KeyModifiers::CONTROL), Focus::Input),
            Action::Newline
        );
    }

    #[test]
    fn test_letters_type_in_input_but_navigate_messages() {
        assert_eq!(key_to_action(key(KeyCode::Char('q')), Focus::Input), Action::Insert('q'));
        assert_eq!(key_to_action(key(KeyCode::Char('q')), Focus::Messages), Action::Quit);
        assert_eq!(key_to_action(key(KeyCode::Char('l')), Focus::Messages), Action::Listen);
        assert_eq!(key_to_action(key(KeyCode::Up), Focus::Messages), Action::SelectPrev);
        assert_eq!(key_to_action(key(KeyCode::Up), Focus::Input), Action::HistoryPrev);
    }

    #[test]
    fn test_global_keys() {
        let ctrl = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL);
        assert_eq!(key_to_action(ctrl('c'), Focus::Input), Action::Quit);
        assert_eq!(key_to_action(ctrl('r'), Focus::Messages), Action::Reset);
        assert_eq!(key_to_action(key(KeyCode::Tab), Focus::Input), Action::ToggleFocus);
        assert_eq!(key_to_action(key(KeyCode::Esc), Focus::Messages), Action::Quit);
        assert_eq!(key_to_action(ctrl('j'), Focus::Messages), Action::None);
    }
}
