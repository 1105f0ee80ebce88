//! Width-aware wrapping for plain and styled text.
//!
//! Widths are terminal cells (CJK and most emoji take two).

use ratatui::style::Style;
use ratatui::text::{Line, Span};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Wrap plain text to `width` cells, keeping explicit newlines.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return text.split('\n').map(str::to_string).collect();
    }
    text.split('\n')
        .flat_map(|paragraph| {
            if paragraph.trim().is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(paragraph, width)
                    .into_iter()
                    .map(std::borrow::Cow::into_owned)
                    .collect()
            }
        })
        .collect()
}

/// Wrap styled lines to `width` cells, keeping each span's style.
pub fn wrap_lines(lines: Vec<Line<'static>>, width: usize) -> Vec<Line<'static>> {
    if width == 0 {
        return lines;
    }
    lines
        .into_iter()
        .flat_map(|line| wrap_line(line, width))
        .collect()
}

/// Truncate to `max_width` cells, appending "..." when cut.
pub fn truncate_to_width(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let target = max_width.saturating_sub(3);
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > target {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push_str("...");
    out
}

/// A run of same-styled text that is either all whitespace or none.
struct Piece {
    text: String,
    style: Style,
    space: bool,
}

fn pieces(line: &Line<'static>) -> Vec<Piece> {
    let mut out: Vec<Piece> = Vec::new();
    for span in &line.spans {
        let style = line.style.patch(span.style);
        for ch in span.content.chars() {
            let space = ch.is_whitespace();
            match out.last_mut() {
                Some(p) if p.space == space && p.style == style => p.text.push(ch),
                _ => out.push(Piece {
                    text: ch.to_string(),
                    style,
                    space,
                }),
            }
        }
    }
    out
}

/// Greedy word wrap. Words wider than `width` are split by character.
fn wrap_line(line: Line<'static>, width: usize) -> Vec<Line<'static>> {
    if line.width() <= width {
        return vec![line];
    }

    let mut rows: Vec<Vec<Span<'static>>> = vec![Vec::new()];
    let mut used = 0;

    // Group pieces into words: a word is consecutive non-space pieces
    // (possibly with different styles) followed by any trailing space.
    let mut word: Vec<Piece> = Vec::new();
    let mut trailing: Vec<Piece> = Vec::new();
    let mut words: Vec<(Vec<Piece>, Vec<Piece>)> = Vec::new();
    for piece in pieces(&line) {
        if piece.space {
            trailing.push(piece);
        } else {
            if !trailing.is_empty() {
                words.push((std::mem::take(&mut word), std::mem::take(&mut trailing)));
            }
            word.push(piece);
        }
    }
    if !word.is_empty() || !trailing.is_empty() {
        words.push((word, trailing));
    }

    for (word, space) in words {
        let word_width: usize = word.iter().map(|p| p.text.width()).sum();

        if used > 0 && used + word_width > width {
            rows.push(Vec::new());
            used = 0;
        }

        for piece in word {
            if used + piece.text.width() <= width {
                used += piece.text.width();
                push_span(&mut rows, piece.text, piece.style);
                continue;
            }
            // Split an overlong word across rows.
            let mut chunk = String::new();
            for ch in piece.text.chars() {
                let w = ch.width().unwrap_or(0);
                if used + w > width && used > 0 {
                    push_span(&mut rows, std::mem::take(&mut chunk), piece.style);
                    rows.push(Vec::new());
                    used = 0;
                }
                chunk.push(ch);
                used += w;
            }
            push_span(&mut rows, chunk, piece.style);
        }

        // Spaces that would overflow are dropped at the wrap point.
        for piece in space {
            let w = piece.text.width();
            if used + w <= width {
                used += w;
                push_span(&mut rows, piece.text, piece.style);
            }
        }
    }

    rows.into_iter()
        .map(|spans| {
            let mut spans = spans;
            trim_trailing_space(&mut spans);
            Line::from(spans)
        })
        .collect()
}

fn push_span(rows: &mut [Vec<Span<'static>>], text: String, style: Style) {
    if text.is_empty() {
        return;
    }
    if let Some(row) = rows.last_mut() {
        match row.last_mut() {
            Some(last) if last.style == style => last.content.to_mut().push_str(&text),
            _ => row.push(Span::styled(text, style)),
        }
    }
}

fn trim_trailing_space(spans: &mut Vec<Span<'static>>) {
    while let Some(last) = spans.last_mut() {
        let trimmed = last.content.trim_end().len();
        if trimmed == 0 {
            spans.pop();
        } else {
            last.content.to_mut().truncate(trimmed);
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::style::Color;

    fn text_of(line: &Line<'_>) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_wrap_text_keeps_newlines() {
        let lines = wrap_text("first line\n\nsecond", 40);
        assert_eq!(lines, vec!["first line", "", "second"]);
    }

    #[test]
    fn test_wrap_text_long() {
        let lines = wrap_text("Hello world this is a long line", 10);
        assert!(lines.len() > 1);
        assert!(lines.iter().all(|l| l.width() <= 10));
    }

    #[test]
    fn test_wrap_line_short_is_untouched() {
        let wrapped = wrap_line(Line::from("Short"), 20);
        assert_eq!(wrapped.len(), 1);
    }

    #[test]
    fn test_wrap_line_breaks_on_words_and_keeps_style() {
        let red = Style::default().fg(Color::Red);
        let blue = Style::default().fg(Color::Blue);
        let line = Line::from(vec![
            Span::styled("Olaf knows ", red),
            Span::styled("Rust and Python", blue),
        ]);
        let wrapped = wrap_line(line, 12);

        let texts: Vec<String> = wrapped.iter().map(text_of).collect();
        assert_eq!(texts, vec!["Olaf knows", "Rust and", "Python"]);
        assert_eq!(wrapped[0].spans[0].style, red);
        assert_eq!(wrapped[1].spans[0].style, blue);
    }

    #[test]
    fn test_wrap_line_splits_overlong_word() {
        let wrapped = wrap_line(Line::from("abcdefghij"), 4);
        let texts: Vec<String> = wrapped.iter().map(text_of).collect();
        assert_eq!(texts, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_line_wide_chars() {
        let wrapped = wrap_line(Line::from("你好世界"), 5);
        assert!(wrapped.iter().all(|l| l.width() <= 5));
        let all: String = wrapped.iter().map(text_of).collect();
        assert_eq!(all, "你好世界");
    }

    #[test]
    fn test_truncate_to_width() {
        assert_eq!(truncate_to_width("hello", 10), "hello");
        assert_eq!(truncate_to_width("hello world", 8), "hello...");
        assert_eq!(truncate_to_width("hello", 2), "...");
    }
}
