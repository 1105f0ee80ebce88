//! State-aware placeholder text for the input box.

use crate::app::Focus;

/// Placeholder shown in the empty input box.
#[must_use]
pub fn input_placeholder(busy: bool, focus: Focus) -> &'static str {
    match (busy, focus) {
        (true, _) => "Waiting for the answer...",
        (false, Focus::Messages) => "Press Tab to ask a question...",
        (false, Focus::Input) => "Ask about Olaf's skills, experience, or projects...",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_wins_over_focus() {
        assert_eq!(
            input_placeholder(true, Focus::Input),
            input_placeholder(true, Focus::Messages)
        );
    }

    #[test]
    fn test_idle_placeholders_differ_by_focus() {
        assert_ne!(
            input_placeholder(false, Focus::Input),
            input_placeholder(false, Focus::Messages)
        );
        assert!(input_placeholder(false, Focus::Input).starts_with("Ask"));
    }
}
