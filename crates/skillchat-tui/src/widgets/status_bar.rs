//! Status bar widget for the top of the TUI.
//!
//! Format: `● State │ Title │ backend │ url │ activity │ → hint`

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Paragraph, Widget},
};

use crate::theme::Theme;

/// Status bar content.
#[derive(Debug, Clone, Default)]
pub struct StatusBarContent {
    /// Request state (e.g., "Ready", "Thinking").
    pub state: String,
    pub title: String,
    /// Backend variant (e.g., "ask", "chat").
    pub backend: Option<String>,
    /// Base URL of the backend.
    pub endpoint: Option<String>,
    /// Background work (e.g., "1 playing").
    pub activity: Option<String>,
    pub hint: Option<String>,
}

impl StatusBarContent {
    /// Content for an idle session.
    pub fn ready(backend: &str, endpoint: &str) -> Self {
        Self {
            state: "Ready".into(),
            title: "Olaf's assistant".into(),
            backend: Some(backend.into()),
            endpoint: Some(endpoint.into()),
            activity: None,
            hint: None,
        }
    }

    /// Create a "terminal too small" warning.
    pub fn too_small() -> Self {
        Self {
            state: "Warning".into(),
            title: "Terminal too small".into(),
            hint: Some("Resize to at least 40x12".into()),
            ..Self::default()
        }
    }
}

/// Status bar widget.
pub struct StatusBar<'a> {
    content: &'a StatusBarContent,
    theme: &'a Theme,
    busy: bool,
}

impl<'a> StatusBar<'a> {
    pub fn new(content: &'a StatusBarContent, theme: &'a Theme) -> Self {
        Self {
            content,
            theme,
            busy: false,
        }
    }

    /// Color the state dot as in flight.
    #[must_use]
    pub fn busy(mut self, busy: bool) -> Self {
        self.busy = busy;
        self
    }
}

impl Widget for StatusBar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let dot = if self.busy {
            self.theme.warning
        } else {
            self.theme.primary
        };
        let separator = || Span::styled(" │ ", Style::default().fg(self.theme.muted));

        let mut spans = vec![
            Span::styled("● ", Style::default().fg(dot)),
            Span::styled(&self.content.state, Style::default().fg(self.theme.text)),
            separator(),
            Span::styled(&self.content.title, Style::default().fg(self.theme.text)),
        ];

        if let Some(ref backend) = self.content.backend {
            spans.push(separator());
            spans.push(Span::styled(backend, Style::default().fg(self.theme.subtext)));
        }

        if let Some(ref endpoint) = self.content.endpoint {
            spans.push(separator());
            spans.push(Span::styled(endpoint, Style::default().fg(self.theme.subtext)));
        }

        if let Some(ref activity) = self.content.activity {
            spans.push(separator());
            spans.push(Span::styled(activity, Style::default().fg(self.theme.info)));
        }

        if let Some(ref hint) = self.content.hint {
            spans.push(separator());
            spans.push(Span::styled(
                format!("→ {hint}"),
                Style::default().fg(self.theme.secondary),
            ));
        }

        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(self.theme.surface))
            .render(area, buf);
    }
}
