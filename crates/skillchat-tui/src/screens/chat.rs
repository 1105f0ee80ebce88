//! The chat screen: status bar, conversation, input box and footer.

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    widgets::Widget,
};

use crate::app::{App, Focus};
use crate::conversation::{input_placeholder, ConversationView};
use crate::screens::Screen;
use crate::widgets::{hints_for_focus, FooterHints, InputBar, StatusBar, StatusBarContent};

/// Smallest usable terminal.
pub const MIN_WIDTH: u16 = 40;
pub const MIN_HEIGHT: u16 = 12;

/// Areas of the chat screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChatAreas {
    pub header: Rect,
    pub messages: Rect,
    pub input: Rect,
    pub footer: Rect,
}

/// Split `area` for an input box `input_rows` tall.
pub fn chat_layout(area: Rect, input_rows: u16) -> ChatAreas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(input_rows),
            Constraint::Length(1),
        ])
        .split(area);
    ChatAreas {
        header: chunks[0],
        messages: chunks[1],
        input: chunks[2],
        footer: chunks[3],
    }
}

pub struct ChatScreen;

impl Screen for ChatScreen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer) {
        let theme = &app.theme;

        if area.width < MIN_WIDTH || area.height < MIN_HEIGHT {
            StatusBar::new(&StatusBarContent::too_small(), theme).render(area, buf);
            return;
        }

        let areas = chat_layout(area, app.input_rows());
        let busy = app.session.is_busy();

        let mut status = StatusBarContent::ready(&app.backend, &app.base_url);
        if busy {
            status.state = "Thinking".into();
        }
        let playing = app.session.tts().active_count();
        if playing > 0 {
            status.activity = Some(format!("{playing} playing"));
        }
        StatusBar::new(&status, theme)
            .busy(busy)
            .render(areas.header, buf);

        ConversationView::new(&app.layout, theme)
            .offset(app.scroll_offset())
            .suppressed(app.session.auto_scroll_suppressed())
            .focused(app.focus == Focus::Messages)
            .render(areas.messages, buf);

        InputBar::new(&app.input, theme)
            .focused(app.focus == Focus::Input)
            .placeholder(input_placeholder(busy, app.focus))
            .render(areas.input, buf);

        let hints = hints_for_focus(app.focus, busy);
        let mut footer = FooterHints::new(&hints, theme).focus(app.focus);
        if let Some(notice) = &app.notice {
            footer = footer.notice(&notice.text, notice.is_error);
        }
        footer.render(areas.footer, buf);
    }
}
