//! User interface components.
//!
//! Rendering only reads control state. Placement feedback (the dropdown
//! direction) flows back to the host through [`DropdownLayout`].

mod components;
pub mod theme;

pub use components::{
    render_dropdown, render_help_bar, DropdownLayout, InlineLoader, RowContent, TextInput,
};
pub use theme::{theme, Theme};
