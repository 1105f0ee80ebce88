//! Footer status bar widget.
//!
//! Format: `Input │ notice                 [Enter] send │ [Tab] focus`

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::app::Focus;
use crate::text::truncate_to_width;
use crate::theme::Theme;

/// A single keybinding hint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyHint {
    /// The key or key combination (e.g., "Tab", "Ctrl+R").
    pub key: String,
    /// The action description (e.g., "focus", "reset").
    pub action: String,
}

impl KeyHint {
    pub fn new(key: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            action: action.into(),
        }
    }
}

/// Footer bar widget.
pub struct FooterHints<'a> {
    hints: &'a [KeyHint],
    theme: &'a Theme,
    focus: Option<Focus>,
    notice: Option<(&'a str, bool)>,
}

impl<'a> FooterHints<'a> {
    pub fn new(hints: &'a [KeyHint], theme: &'a Theme) -> Self {
        Self {
            hints,
            theme,
            focus: None,
            notice: None,
        }
    }

    #[must_use]
    pub fn focus(mut self, focus: Focus) -> Self {
        self.focus = Some(focus);
        self
    }

    /// Transient notice shown after the focus name.
    #[must_use]
    pub fn notice(mut self, text: &'a str, is_error: bool) -> Self {
        self.notice = Some((text, is_error));
        self
    }
}

impl Widget for FooterHints<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let muted = Style::default().fg(self.theme.muted);
        let mut right_spans = Vec::new();
        for (i, hint) in self.hints.iter().enumerate() {
            if i > 0 {
                right_spans.push(Span::styled(" │ ", muted));
            }
            right_spans.push(Span::styled("[", muted));
            right_spans.push(Span::styled(
                hint.key.as_str(),
                Style::default().fg(self.theme.primary),
            ));
            right_spans.push(Span::styled("] ", muted));
            right_spans.push(Span::styled(
                hint.action.as_str(),
                Style::default().fg(self.theme.subtext),
            ));
        }
        let right_width: usize = right_spans.iter().map(|s| s.content.width()).sum();
        let total_width = usize::from(area.width);

        let mut left_spans = Vec::new();
        if let Some(focus) = self.focus {
            let name = match focus {
                Focus::Input => "Input",
                Focus::Messages => "Messages",
            };
            left_spans.push(Span::styled(name, Style::default().fg(self.theme.primary)));
        }

        if let Some((text, is_error)) = self.notice {
            if !left_spans.is_empty() {
                left_spans.push(Span::styled(" │ ", muted));
            }
            let used: usize = left_spans.iter().map(|s| s.content.width()).sum();
            // Notices win over hints when space is short.
            let fit = total_width.saturating_sub(used + right_width + 1);
            let room = if fit >= 24 {
                fit
            } else {
                total_width.saturating_sub(used)
            };
            let color = if is_error {
                self.theme.error
            } else {
                self.theme.info
            };
            left_spans.push(Span::styled(
                truncate_to_width(text, room),
                Style::default().fg(color),
            ));
        }

        let left_width: usize = left_spans.iter().map(|s| s.content.width()).sum();
        if left_width + right_width <= total_width {
            let padding = total_width - left_width - right_width;
            left_spans.push(Span::raw(" ".repeat(padding)));
            left_spans.extend(right_spans);
        }

        Paragraph::new(Line::from(left_spans))
            .style(Style::default().bg(self.theme.surface))
            .render(area, buf);
    }
}

/// Hints for the focused area.
#[must_use]
pub fn hints_for_focus(focus: Focus, busy: bool) -> Vec<KeyHint> {
    let mut hints = Vec::new();
    match focus {
        Focus::Input => {
            if !busy {
                hints.push(KeyHint::new("Enter", "send"));
            }
            hints.push(KeyHint::new("Ctrl+J", "newline"));
        }
        Focus::Messages => {
            hints.push(KeyHint::new("j/k", "select"));
            hints.push(KeyHint::new("Enter", "listen"));
        }
    }
    hints.push(KeyHint::new("Tab", "focus"));
    hints.push(KeyHint::new("Ctrl+R", "reset"));
    hints.push(KeyHint::new("F1", "help"));
    hints
}
