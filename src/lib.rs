//! typeahead - a keyboard-driven typeahead control for terminal forms.
//!
//! The control in [`typeahead`] owns the search flow, dropdown navigation
//! and commit protocol of one text field. [`app`] hosts two of them in a
//! small ratatui form backed by the in-process [`catalog`].

pub mod app;
pub mod catalog;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod typeahead;
pub mod ui;

pub use crate::error::{Result, TypeaheadError};
pub use crate::typeahead::{Typeahead, TypeaheadBuilder};
