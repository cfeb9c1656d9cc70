//! Theme and styling configuration.

use std::sync::OnceLock;

use ratatui::style::Color;

static THEME: OnceLock<Theme> = OnceLock::new();

/// Color theme for the form.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Primary foreground color.
    pub fg: Color,
    /// Primary background color.
    pub bg: Color,
    /// Highlight color for the focused row.
    pub accent: Color,
    /// Secondary text, hints and placeholders.
    pub muted: Color,
    /// Border of unfocused fields.
    pub border: Color,
    /// Border of the focused field and its dropdown.
    pub border_focused: Color,
    /// Committed values.
    pub value: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            fg: Color::White,
            bg: Color::Black,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            border: Color::DarkGray,
            border_focused: Color::Yellow,
            value: Color::Green,
        }
    }
}

/// Get the process theme.
pub fn theme() -> &'static Theme {
    THEME.get_or_init(Theme::default)
}
