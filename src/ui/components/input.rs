//! Text input component.
//!
//! A single-line editor with a char-indexed cursor, so multi-byte names
//! such as "Kraków" edit correctly.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Position, Rect},
    style::{Modifier, Style},
    text::Span,
    widgets::{block::Title, Block, Borders, Paragraph},
    Frame,
};

use crate::ui::theme::theme;

/// A text input widget.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    value: String,
    /// Cursor position in chars.
    cursor: usize,
    placeholder: String,
}

impl TextInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the placeholder text.
    pub fn set_placeholder(&mut self, placeholder: impl Into<String>) {
        self.placeholder = placeholder.into();
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    /// Set the value and move the cursor to the end.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.cursor = self.char_len();
    }

    pub fn clear(&mut self) {
        self.value.clear();
        self.cursor = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn char_len(&self) -> usize {
        self.value.chars().count()
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    /// Handle keyboard input.
    ///
    /// Returns true if the value changed.
    pub fn handle_input(&mut self, key: KeyEvent) -> bool {
        match (key.code, key.modifiers) {
            (KeyCode::Char(c), KeyModifiers::NONE | KeyModifiers::SHIFT) => {
                let at = self.byte_index(self.cursor);
                self.value.insert(at, c);
                self.cursor += 1;
                true
            }
            (KeyCode::Backspace, _) => {
                if self.cursor == 0 {
                    return false;
                }
                self.cursor -= 1;
                let at = self.byte_index(self.cursor);
                self.value.remove(at);
                true
            }
            (KeyCode::Delete, _) => {
                if self.cursor >= self.char_len() {
                    return false;
                }
                let at = self.byte_index(self.cursor);
                self.value.remove(at);
                true
            }
            (KeyCode::Left, KeyModifiers::NONE) => {
                self.cursor = self.cursor.saturating_sub(1);
                false
            }
            (KeyCode::Right, KeyModifiers::NONE) => {
                self.cursor = (self.cursor + 1).min(self.char_len());
                false
            }
            (KeyCode::Home, _) | (KeyCode::Char('a'), KeyModifiers::CONTROL) => {
                self.cursor = 0;
                false
            }
            (KeyCode::End, _) | (KeyCode::Char('e'), KeyModifiers::CONTROL) => {
                self.cursor = self.char_len();
                false
            }
            (KeyCode::Char('u'), KeyModifiers::CONTROL) => {
                if self.value.is_empty() {
                    return false;
                }
                self.clear();
                true
            }
            (KeyCode::Char('w'), KeyModifiers::CONTROL) => {
                if self.cursor == 0 {
                    return false;
                }
                let end = self.byte_index(self.cursor);
                let start = self.value[..end]
                    .trim_end()
                    .rfind(char::is_whitespace)
                    .map(|i| i + 1)
                    .unwrap_or(0);
                self.value.replace_range(start..end, "");
                self.cursor = self.value[..start].chars().count();
                true
            }
            _ => false,
        }
    }

    /// Render the field with a label and an optional status marker in the
    /// top-right border (e.g. a spinner frame).
    pub fn render_with_label(
        &self,
        frame: &mut Frame,
        area: Rect,
        label: &str,
        status: &str,
        focused: bool,
    ) {
        let t = theme();
        let showing_placeholder = self.value.is_empty() && !self.placeholder.is_empty();
        let display = if showing_placeholder {
            self.placeholder.as_str()
        } else {
            self.value.as_str()
        };

        let style = if showing_placeholder {
            Style::default().fg(t.muted)
        } else if focused {
            Style::default().fg(t.border_focused)
        } else {
            Style::default().fg(t.fg)
        };
        let border_style = Style::default().fg(if focused { t.border_focused } else { t.border });
        let title_style = if focused {
            Style::default()
                .fg(t.border_focused)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(t.fg)
        };

        let mut block = Block::default()
            .title(Span::styled(format!(" {} ", label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);
        if !status.is_empty() {
            block = block.title(
                Title::from(Span::styled(format!(" {} ", status), Style::default().fg(t.accent)))
                    .alignment(Alignment::Right),
            );
        }

        frame.render_widget(Paragraph::new(display).style(style).block(block), area);

        if focused {
            let cursor_x = area.x + 1 + self.cursor as u16;
            if cursor_x < area.x + area.width.saturating_sub(1) {
                frame.set_cursor_position(Position::new(cursor_x, area.y + 1));
            }
        }
    }
}
