//! Key binding definitions.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Logical shortcuts a typeahead subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shortcut {
    /// Move the highlight up.
    MoveUp,
    /// Move the highlight down.
    MoveDown,
    /// Cancel the dropdown.
    Escape,
    /// Commit with Enter.
    Enter,
    /// Commit with Tab.
    Tab,
}

impl Shortcut {
    /// Every shortcut a typeahead control subscribes to.
    pub const ALL: [Shortcut; 5] = [
        Shortcut::MoveUp,
        Shortcut::MoveDown,
        Shortcut::Escape,
        Shortcut::Enter,
        Shortcut::Tab,
    ];

    /// Map a key event to a shortcut.
    pub fn from_key(key: &KeyEvent) -> Option<Self> {
        match (key.code, key.modifiers) {
            (KeyCode::Up, KeyModifiers::NONE) => Some(Shortcut::MoveUp),
            (KeyCode::Down, KeyModifiers::NONE) => Some(Shortcut::MoveDown),
            (KeyCode::Esc, _) => Some(Shortcut::Escape),
            (KeyCode::Enter, KeyModifiers::NONE) => Some(Shortcut::Enter),
            (KeyCode::Tab, KeyModifiers::NONE) => Some(Shortcut::Tab),
            _ => None,
        }
    }

    /// Get the display name of the shortcut.
    pub fn display(&self) -> &'static str {
        match self {
            Shortcut::MoveUp => "Up",
            Shortcut::MoveDown => "Down",
            Shortcut::Escape => "Esc",
            Shortcut::Enter => "Enter",
            Shortcut::Tab => "Tab",
        }
    }
}

/// Keys a host grid must leave alone while a dropdown is open.
pub const KEYS_CONSUMED_WHILE_OPEN: [KeyCode; 8] = [
    KeyCode::Enter,
    KeyCode::Tab,
    KeyCode::Left,
    KeyCode::Right,
    KeyCode::Up,
    KeyCode::Down,
    KeyCode::PageDown,
    KeyCode::PageUp,
];
