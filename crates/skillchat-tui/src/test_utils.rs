//! Test utilities for skillchat-tui rendering tests.

use crate::app::App;
use crate::screens::render_app;
use crate::theme::Theme;
use ratatui::{buffer::Buffer, layout::Rect};
use skillchat_engine::Config;

/// Default terminal width for tests.
pub const TEST_WIDTH: u16 = 80;

/// Default terminal height for tests.
pub const TEST_HEIGHT: u16 = 24;

/// Greeting used by test apps.
pub const TEST_GREETING: &str = "Hello! Ask me about Olaf.";

/// Create a test app with a short greeting and default settings.
pub fn create_test_app() -> App {
    let config = Config {
        greeting: TEST_GREETING.to_string(),
        ..Config::default()
    };
    App::new(&config, Theme::default())
}

/// Convert a buffer to text, one line per row with trailing spaces trimmed.
pub fn buffer_to_string(buffer: &Buffer) -> String {
    let area = buffer.area;
    let mut result = String::new();

    for y in area.y..area.y + area.height {
        for x in area.x..area.x + area.width {
            if let Some(cell) = buffer.cell((x, y)) {
                result.push_str(cell.symbol());
            }
        }
        while result.ends_with(' ') {
            result.pop();
        }
        result.push('\n');
    }

    if result.ends_with('\n') {
        result.pop();
    }
    result
}

/// Lay out and render the app at the default size.
pub fn render_app_to_string(app: &mut App) -> String {
    render_app_to_string_sized(app, TEST_WIDTH, TEST_HEIGHT)
}

/// Lay out and render the app at a custom size.
pub fn render_app_to_string_sized(app: &mut App, width: u16, height: u16) -> String {
    let area = Rect::new(0, 0, width, height);
    app.sync_layout(area);
    let mut buffer = Buffer::empty(area);
    render_app(app, area, &mut buffer);
    buffer_to_string(&buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_app() {
        let app = create_test_app();
        assert_eq!(app.session.messages().len(), 1);
        assert_eq!(app.session.messages()[0].content(), TEST_GREETING);
    }

    #[test]
    fn test_buffer_to_string() {
        let area = Rect::new(0, 0, 10, 3);
        let mut buffer = Buffer::empty(area);
        buffer.set_string(0, 0, "Hello", ratatui::style::Style::default());
        buffer.set_string(0, 1, "World", ratatui::style::Style::default());

        assert_eq!(buffer_to_string(&buffer), "Hello\nWorld\n");
    }
}
