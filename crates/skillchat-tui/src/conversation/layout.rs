//! Message layout.
//!
//! Turns the stored messages into the exact lines the view draws, so the
//! scroll geometry reported to the engine matches what is on screen.

use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
};
use skillchat_engine::message::THINKING_INDICATOR;
use skillchat_engine::{Message, MessageId, Role, TtsControls};

use crate::text::{render_markdown, wrap_text};
use crate::theme::Theme;

/// Nominal pixel height of one terminal row, for scroll geometry.
pub const ROW_HEIGHT_PX: u32 = 16;

/// Body indent under a message header.
const INDENT: &str = "  ";

/// Rows occupied by one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRows {
    pub id: MessageId,
    pub start: usize,
    pub len: usize,
}

/// Laid-out conversation at a given width.
#[derive(Debug, Default)]
pub struct ConversationLayout {
    lines: Vec<Line<'static>>,
    rows: Vec<MessageRows>,
}

impl ConversationLayout {
    /// Lay out `messages` for a view `width` cells wide.
    pub fn build(
        messages: &[Message],
        width: u16,
        theme: &Theme,
        selected: Option<MessageId>,
        tts: &TtsControls,
        tick: usize,
    ) -> Self {
        let body_width = usize::from(width).saturating_sub(INDENT.len());
        let mut layout = Self::default();

        for message in messages {
            let start = layout.lines.len();
            let is_selected = selected == Some(message.id());

            layout.lines.push(header(message, theme, is_selected, tts));
            for line in body(message, body_width, theme, tick) {
                let mut spans = vec![Span::raw(INDENT)];
                spans.extend(line.spans);
                layout.lines.push(Line::from(spans));
            }
            if let Some(notice) = tts.control(message.id()).and_then(|c| c.notice.as_deref()) {
                layout.lines.push(Line::from(vec![
                    Span::raw(INDENT),
                    Span::styled(format!("⚠ {notice}"), Style::default().fg(theme.error)),
                ]));
            }
            layout.lines.push(Line::default());

            layout.rows.push(MessageRows {
                id: message.id(),
                start,
                len: layout.lines.len() - start,
            });
        }
        layout
    }

    /// Total height in rows.
    pub fn height(&self) -> usize {
        self.lines.len()
    }

    pub fn lines(&self) -> &[Line<'static>] {
        &self.lines
    }

    pub fn rows_of(&self, id: MessageId) -> Option<MessageRows> {
        self.rows.iter().find(|r| r.id == id).copied()
    }

    /// Up to `height` lines starting at row `offset`.
    pub fn window(&self, offset: usize, height: usize) -> &[Line<'static>] {
        let start = offset.min(self.lines.len());
        let end = start.saturating_add(height).min(self.lines.len());
        &self.lines[start..end]
    }
}

fn header(message: &Message, theme: &Theme, selected: bool, tts: &TtsControls) -> Line<'static> {
    let (label, color) = match message.role() {
        Role::User => ("You", theme.user),
        Role::Assistant => ("Assistant", theme.assistant),
    };

    let mut spans = vec![
        Span::styled(
            if selected { "▶ " } else { "  " },
            Style::default().fg(theme.primary),
        ),
        Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        Span::styled(
            format!(" · {}", message.format_time()),
            Style::default().fg(theme.muted),
        ),
    ];

    if message.is_assistant() && !message.is_loading() {
        if tts.is_in_flight(message.id()) {
            spans.push(Span::styled("  [Playing…]", Style::default().fg(theme.warning)));
        } else if selected {
            spans.push(Span::styled("  [Listen]", Style::default().fg(theme.info)));
        }
    }
    Line::from(spans)
}

fn body(message: &Message, width: usize, theme: &Theme, tick: usize) -> Vec<Line<'static>> {
    if message.is_loading() {
        let dots = ".".repeat(tick % 3 + 1);
        let base = THINKING_INDICATOR.trim_end_matches('.');
        return vec![Line::from(Span::styled(
            format!("{base}{dots}"),
            Style::default()
                .fg(theme.muted)
                .add_modifier(Modifier::ITALIC),
        ))];
    }

    match message.role() {
        Role::Assistant => render_markdown(message.content(), width, theme),
        Role::User => wrap_text(message.content(), width)
            .into_iter()
            .map(|row| Line::from(Span::styled(row, Style::default().fg(theme.text))))
            .collect(),
    }
}
