//! Event handling for the application.
//!
//! This module polls terminal input, maps keys to shortcuts and routes them
//! through the shared subscription registry.

mod dispatch;
mod handler;
mod keys;

use crossterm::event::KeyEvent;

pub use dispatch::{HandlerId, ShortcutRegistry, HOST_PRIORITY, TYPEAHEAD_PRIORITY};
pub use handler::EventHandler;
pub use keys::{Shortcut, KEYS_CONSUMED_WHILE_OPEN};

/// Application events produced by the [`EventHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A key was pressed.
    Key(KeyEvent),
    /// The left mouse button was pressed at a terminal cell.
    Click {
        /// Column of the click.
        column: u16,
        /// Row of the click.
        row: u16,
    },
    /// The terminal was resized.
    Resize(u16, u16),
    /// No input arrived within the tick rate.
    Tick,
}
