//! Reusable UI components.

mod dropdown;
mod help_bar;
mod input;
mod loading;

pub use dropdown::{render_dropdown, DropdownLayout, RowContent};
pub use help_bar::render_help_bar;
pub use input::TextInput;
pub use loading::InlineLoader;
