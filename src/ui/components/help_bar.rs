//! Contextual help bar component.
//!
//! Shows the keys that act on the form in its current state.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::ui::theme::theme;

const FORM_HINTS: &str = "[type] search  [Tab] next field  [Esc] quit";
const DROPDOWN_HINTS: &str = "[↑/↓] move  [Enter/Tab] choose  [click] pick  [Esc] cancel";

/// Get the hint text for the form state.
pub fn hints(dropdown_open: bool) -> &'static str {
    if dropdown_open {
        DROPDOWN_HINTS
    } else {
        FORM_HINTS
    }
}

/// Render a one-line help bar.
pub fn render_help_bar(frame: &mut Frame, area: Rect, dropdown_open: bool) {
    let line = Line::from(parse_hints_to_spans(hints(dropdown_open)));
    frame.render_widget(Paragraph::new(line), area);
}

/// Split hint text into spans, styling bracketed keys.
fn parse_hints_to_spans(hints: &str) -> Vec<Span<'static>> {
    let t = theme();
    let mut spans = Vec::new();
    let mut current = String::new();

    for c in hints.chars() {
        match c {
            '[' => {
                if !current.is_empty() {
                    spans.push(Span::styled(
                        std::mem::take(&mut current),
                        Style::default().fg(t.muted),
                    ));
                }
                current.push(c);
            }
            ']' if current.starts_with('[') => {
                current.push(c);
                spans.push(Span::styled(
                    std::mem::take(&mut current),
                    Style::default().fg(t.accent),
                ));
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() {
        spans.push(Span::styled(current, Style::default().fg(t.muted)));
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hints_splits_keys() {
        let spans = parse_hints_to_spans("[Tab] next  [Esc] quit");
        let texts: Vec<&str> = spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(texts, vec!["[Tab]", " next  ", "[Esc]", " quit"]);
        assert_eq!(spans[0].style.fg, Some(theme().accent));
    }

    #[test]
    fn test_parse_hints_plain_text() {
        assert_eq!(parse_hints_to_spans("just text").len(), 1);
        assert!(parse_hints_to_spans("").is_empty());
    }

    #[test]
    fn test_hints_follow_dropdown_state() {
        assert!(hints(true).contains("cancel"));
        assert!(hints(false).contains("quit"));
    }
}
