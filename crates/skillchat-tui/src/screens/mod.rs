//! Screen definitions for the chat TUI.

pub mod chat;

use crate::app::App;
use crate::theme::Theme;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    widgets::{Block, Borders, Clear, Paragraph, Widget},
};

/// Trait for screens that can be rendered.
pub trait Screen {
    fn render(&self, app: &App, area: Rect, buf: &mut Buffer);
}

/// Draw the whole UI for one frame.
pub fn render_app(app: &App, area: Rect, buf: &mut Buffer) {
    chat::ChatScreen.render(app, area, buf);
    if app.show_help {
        render_help_overlay(area, buf, &app.theme);
    }
}

const HELP_TEXT: &str = r"
  Input
    Enter             Send question
    Ctrl+J / Alt+Enter  New line
    Up / Down         Previous questions

  Messages
    j/k or Up/Down    Select reply
    Enter or l        Listen
    G or End          Jump to newest

  Anywhere
    Tab               Switch focus
    PgUp / PgDn       Scroll
    Ctrl+R            New conversation
    Esc / Ctrl+C      Quit

  [Press any key to close]
";

/// Render the help overlay.
pub fn render_help_overlay(area: Rect, buf: &mut Buffer, theme: &Theme) {
    let width = 50.min(area.width.saturating_sub(4));
    let height = 22.min(area.height.saturating_sub(2));
    let overlay_area = centered_fixed(width, height, area);

    Clear.render(overlay_area, buf);

    let block = Block::default()
        .title(" Help ")
        .title_style(Style::default().fg(theme.primary))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border_focused))
        .style(Style::default().bg(theme.base).fg(theme.text));

    Paragraph::new(HELP_TEXT).block(block).render(overlay_area, buf);
}

/// Create a centered rect with fixed dimensions.
pub fn centered_fixed(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
