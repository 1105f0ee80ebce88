//! Conversation view widget.
//!
//! Draws a window of a [`ConversationLayout`] inside a bordered block.
//!
//! ```text
//! ┌ Conversation ───────────────────────┐
//! │  Assistant · 14:02                  │
//! │  Hello! I'm Olaf's AI assistant...  │
//! │                                     │
//! │▶ You · 14:03                        │
//! │  What are Olaf's skills?            │
//! │        ↓ New messages below         │
//! └─────────────────────────────────────┘
//! ```

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::theme::Theme;

use super::layout::ConversationLayout;

/// Shown on the bottom row while auto-scroll is suppressed.
pub const NEW_MESSAGES_INDICATOR: &str = "↓ New messages below";

pub struct ConversationView<'a> {
    layout: &'a ConversationLayout,
    theme: &'a Theme,
    offset: usize,
    suppressed: bool,
    focused: bool,
}

impl<'a> ConversationView<'a> {
    pub fn new(layout: &'a ConversationLayout, theme: &'a Theme) -> Self {
        Self {
            layout,
            theme,
            offset: 0,
            suppressed: false,
            focused: false,
        }
    }

    /// First visible row.
    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    /// Whether the reader has scrolled away from the bottom.
    #[must_use]
    pub fn suppressed(mut self, suppressed: bool) -> Self {
        self.suppressed = suppressed;
        self
    }

    #[must_use]
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Inner height for an outer area of `height` rows.
    pub fn inner_height(height: u16) -> u16 {
        height.saturating_sub(2)
    }

    /// Inner width for an outer area of `width` cells.
    pub fn inner_width(width: u16) -> u16 {
        width.saturating_sub(2)
    }
}

impl Widget for ConversationView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let border_style = if self.focused {
            Style::default().fg(self.theme.border_focused)
        } else {
            Style::default().fg(self.theme.border)
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled(
                " Conversation ",
                Style::default().fg(self.theme.subtext),
            ));
        let inner = block.inner(area);
        block.render(area, buf);

        if inner.height == 0 || inner.width == 0 {
            return;
        }

        let visible = self.layout.window(self.offset, usize::from(inner.height));
        Paragraph::new(visible.to_vec()).render(inner, buf);

        if self.suppressed {
            let row = Rect::new(inner.x, inner.y + inner.height - 1, inner.width, 1);
            Paragraph::new(Line::from(Span::styled(
                NEW_MESSAGES_INDICATOR,
                Style::default()
                    .fg(self.theme.info)
                    .add_modifier(Modifier::BOLD),
            )))
            .alignment(Alignment::Center)
            .style(Style::default().bg(self.theme.surface))
            .render(row, buf);
        }
    }
}
