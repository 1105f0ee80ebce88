//! Markdown rendering using pulldown-cmark.
//!
//! Raw HTML (block or inline) is dropped rather than shown, so backend
//! replies cannot inject markup or escape sequences into the terminal.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::Style,
    text::{Line, Span},
};

use crate::theme::Theme;

use super::styles::MarkdownStyles;
use super::wrap::wrap_lines;

/// Render markdown to styled lines no wider than `width` (0 disables wrapping).
pub fn render_markdown(input: &str, width: usize, theme: &Theme) -> Vec<Line<'static>> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_TABLES);

    let parser = Parser::new_ext(input, options);
    let mut renderer = MarkdownRenderer::new(MarkdownStyles::from_theme(theme));
    renderer.run(parser);

    let mut lines = renderer.lines;
    while lines.last().is_some_and(|l| l.spans.is_empty()) {
        lines.pop();
    }
    wrap_lines(lines, width)
}

struct MarkdownRenderer {
    lines: Vec<Line<'static>>,
    styles: MarkdownStyles,
    /// Active inline styles, innermost last.
    style_stack: Vec<Style>,
    current_spans: Vec<Span<'static>>,
    /// One entry per open list: next number for ordered lists.
    lists: Vec<Option<u64>>,
    in_code_block: bool,
    in_blockquote: bool,
    pending_list_marker: Option<String>,
    task_checkbox: Option<bool>,
    /// Destination of the open link, shown after its text.
    link_dest: Option<String>,
    link_text: String,
    /// Cells already emitted in the current table row.
    table_cells: usize,
}

impl MarkdownRenderer {
    fn new(styles: MarkdownStyles) -> Self {
        Self {
            lines: Vec::new(),
            styles,
            style_stack: Vec::new(),
            current_spans: Vec::new(),
            lists: Vec::new(),
            in_code_block: false,
            in_blockquote: false,
            pending_list_marker: None,
            task_checkbox: None,
            link_dest: None,
            link_text: String::new(),
            table_cells: 0,
        }
    }

    fn run<'a>(&mut self, parser: impl Iterator<Item = Event<'a>>) {
        for event in parser {
            self.handle_event(event);
        }
        self.flush_line();
    }

    #[allow(clippy::too_many_lines)]
    fn handle_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                self.flush_line();
                let style = self.heading_style(level);
                self.style_stack.push(style);
            }
            Event::End(TagEnd::Heading(_)) => {
                self.flush_line();
                self.style_stack.pop();
                self.blank_line();
            }

            Event::Start(Tag::Emphasis) => self.style_stack.push(self.styles.emphasis),
            Event::Start(Tag::Strong) => self.style_stack.push(self.styles.strong),
            Event::Start(Tag::Strikethrough) => self.style_stack.push(self.styles.strikethrough),
            Event::End(TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough) => {
                self.style_stack.pop();
            }

            Event::Start(Tag::Link { dest_url, .. }) => {
                self.style_stack.push(self.styles.link);
                self.link_dest = Some(dest_url.into_string());
                self.link_text.clear();
            }
            Event::End(TagEnd::Link) => {
                self.style_stack.pop();
                if let Some(dest) = self.link_dest.take() {
                    if !dest.is_empty() && dest != self.link_text {
                        self.current_spans
                            .push(Span::styled(format!(" ({dest})"), self.styles.list_marker));
                    }
                }
            }

            Event::Start(Tag::Image { .. }) => {
                self.current_spans
                    .push(Span::styled("[image: ", self.styles.list_marker));
            }
            Event::End(TagEnd::Image) => {
                self.current_spans.push(Span::styled("]", self.styles.list_marker));
            }

            Event::Start(Tag::CodeBlock(_)) => {
                self.flush_line();
                self.in_code_block = true;
            }
            Event::End(TagEnd::CodeBlock) => {
                self.flush_line();
                self.in_code_block = false;
                self.blank_line();
            }

            Event::Start(Tag::List(start)) => {
                self.flush_line();
                self.lists.push(start);
            }
            Event::End(TagEnd::List(_)) => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }
            Event::Start(Tag::Item) => {
                self.flush_line();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{indent}{n}. ");
                        *n += 1;
                        marker
                    }
                    _ => format!("{indent}• "),
                };
                self.pending_list_marker = Some(marker);
            }
            Event::End(TagEnd::Item) => {
                self.flush_line();
                self.task_checkbox = None;
            }
            Event::TaskListMarker(checked) => {
                self.task_checkbox = Some(checked);
            }

            Event::Start(Tag::BlockQuote) => {
                self.flush_line();
                self.in_blockquote = true;
            }
            Event::End(TagEnd::BlockQuote) => {
                self.flush_line();
                self.in_blockquote = false;
                self.blank_line();
            }

            Event::Start(Tag::TableRow | Tag::TableHead) => {
                self.flush_line();
                self.table_cells = 0;
            }
            Event::Start(Tag::TableCell) => {
                if self.table_cells > 0 {
                    self.current_spans.push(Span::styled(" │ ", self.styles.rule));
                }
                self.table_cells += 1;
            }
            Event::End(TagEnd::TableHead) => {
                self.flush_line();
                self.lines
                    .push(Line::from(Span::styled("─".repeat(24), self.styles.rule)));
            }
            Event::End(TagEnd::TableRow) => self.flush_line(),
            Event::End(TagEnd::Table) => self.blank_line(),

            Event::End(TagEnd::Paragraph) => {
                self.flush_line();
                // Tight list items close their paragraph without a gap.
                if self.lists.is_empty() {
                    self.blank_line();
                }
            }

            Event::Text(text) => self.add_text(&text),
            Event::Code(code) => {
                self.prefix_line();
                self.current_spans
                    .push(Span::styled(format!("`{code}`"), self.styles.code));
            }

            Event::SoftBreak => self.add_text(" "),
            Event::HardBreak => self.flush_line(),

            Event::Rule => {
                self.flush_line();
                self.lines
                    .push(Line::from(Span::styled("─".repeat(24), self.styles.rule)));
                self.blank_line();
            }

            // Dropped.
            Event::Html(_) | Event::InlineHtml(_) => {}

            Event::Start(
                Tag::Paragraph
                | Tag::Table(_)
                | Tag::FootnoteDefinition(_)
                | Tag::MetadataBlock(_)
                | Tag::HtmlBlock,
            )
            | Event::End(
                TagEnd::TableCell
                | TagEnd::FootnoteDefinition
                | TagEnd::MetadataBlock(_)
                | TagEnd::HtmlBlock,
            )
            | Event::FootnoteReference(_) => {}
        }
    }

    fn add_text(&mut self, text: &str) {
        if self.in_code_block {
            for line in text.lines() {
                let indent = "  ".repeat(self.lists.len());
                self.current_spans.push(Span::styled(
                    format!("{indent}  {line}"),
                    self.styles.code_block,
                ));
                self.flush_line();
            }
            return;
        }

        if self.link_dest.is_some() {
            self.link_text.push_str(text);
        }
        self.prefix_line();
        let style = self.current_style();
        self.current_spans.push(Span::styled(text.to_string(), style));
    }

    /// Emit list marker, checkbox and quote prefix before the first span.
    fn prefix_line(&mut self) {
        if let Some(marker) = self.pending_list_marker.take() {
            self.current_spans
                .push(Span::styled(marker, self.styles.list_marker));
            if let Some(checked) = self.task_checkbox.take() {
                let checkbox = if checked { "[x] " } else { "[ ] " };
                self.current_spans
                    .push(Span::styled(checkbox, self.styles.list_marker));
            }
        }
        if self.in_blockquote && self.current_spans.is_empty() {
            self.current_spans
                .push(Span::styled("│ ", self.styles.blockquote));
        }
    }

    fn current_style(&self) -> Style {
        let base = if self.in_blockquote {
            self.styles.text.patch(self.styles.blockquote)
        } else {
            self.styles.text
        };
        self.style_stack.iter().fold(base, |style, s| style.patch(*s))
    }

    fn heading_style(&self, level: HeadingLevel) -> Style {
        match level {
            HeadingLevel::H1 => self.styles.h1,
            HeadingLevel::H2 => self.styles.h2,
            _ => self.styles.h3,
        }
    }

    fn flush_line(&mut self) {
        if !self.current_spans.is_empty() {
            let spans = std::mem::take(&mut self.current_spans);
            self.lines.push(Line::from(spans));
        }
    }

    /// Push a separating blank line, never two in a row.
    fn blank_line(&mut self) {
        if self.lines.last().is_some_and(|l| !l.spans.is_empty()) {
            self.lines.push(Line::default());
        }
    }
}
