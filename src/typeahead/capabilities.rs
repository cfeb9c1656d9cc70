//! Capabilities a typeahead control consumes from its host.
//!
//! The control never knows the concrete shape of an item. It searches through
//! a [`SearchSource`], reports outcomes through the selection callback and,
//! when configured, previews items through a [`Preview`].

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crossterm::event::KeyCode;
use thiserror::Error;

use super::session::FocusTarget;

/// Errors a search source may report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    /// The backend failed to answer the query.
    #[error("Search backend error: {0}")]
    Backend(String),

    /// The backend could not be reached.
    #[error("Search backend unavailable")]
    Unavailable,
}

/// Future returned by a [`SearchSource`].
pub type LookupFuture<T> = Pin<Box<dyn Future<Output = Result<Vec<T>, LookupError>> + Send>>;

/// The lookup function backing a typeahead.
pub trait SearchSource<T>: Send + Sync {
    /// Search for items matching `query`.
    fn search(&self, query: String) -> LookupFuture<T>;
}

impl<T, F, Fut> SearchSource<T> for F
where
    F: Fn(String) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<T>, LookupError>> + Send + 'static,
{
    fn search(&self, query: String) -> LookupFuture<T> {
        Box::pin(self(query))
    }
}

/// Shows candidates in the field while the user navigates the list.
pub trait Preview<T> {
    /// Format an item as field text.
    fn format(&self, item: &T) -> String;

    /// Called with the focused item, or `None` when the preview is dropped.
    fn on_preview(&mut self, item: Option<&T>);

    /// Called with the new field text on every edit.
    fn on_edit(&mut self, _text: &str) {}
}

/// A [`Preview`] that only formats, ignoring notifications.
pub struct FormatPreview<F>(pub F);

impl<T, F> Preview<T> for FormatPreview<F>
where
    F: Fn(&T) -> String,
{
    fn format(&self, item: &T) -> String {
        (self.0)(item)
    }

    fn on_preview(&mut self, _item: Option<&T>) {}
}

/// Moves input focus for the presentation layer.
pub trait FocusHost {
    /// Move focus to `target`. Rows also carry their row id, which is unique
    /// across sessions.
    ///
    /// Returns `false` when the target does not exist (for example a row that
    /// has not been drawn yet), in which case the navigation step is dropped.
    fn focus(&mut self, target: FocusTarget, row_id: Option<&str>) -> bool;
}

/// Callback invoked with the chosen item, or `None` to clear the value.
pub type SelectCallback<T> = Box<dyn FnMut(Option<T>)>;

/// Callback telling a host container which keys the control is consuming.
pub type IgnoredKeysCallback = Box<dyn FnMut(&[KeyCode])>;

/// The validated set of capabilities a control runs with.
pub struct Capabilities<T> {
    pub(super) search: Arc<dyn SearchSource<T>>,
    pub(super) on_select: SelectCallback<T>,
    pub(super) preview: Option<Box<dyn Preview<T>>>,
    pub(super) allow_clear: bool,
    pub(super) on_advance_focus: Option<Box<dyn FnMut()>>,
    pub(super) set_ignored_keys: Option<IgnoredKeysCallback>,
    pub(super) focus_host: Option<Box<dyn FocusHost>>,
}

impl<T> Capabilities<T> {
    pub(super) fn select(&mut self, item: Option<T>) {
        (self.on_select)(item);
    }

    pub(super) fn report_ignored_keys(&mut self, keys: &[KeyCode]) {
        if let Some(callback) = self.set_ignored_keys.as_mut() {
            callback(keys);
        }
    }

    pub(super) fn advance_focus(&mut self) {
        if let Some(callback) = self.on_advance_focus.as_mut() {
            callback();
        }
    }

    /// Move focus; an unconfigured host always succeeds.
    pub(super) fn move_focus(&mut self, target: FocusTarget, row_id: Option<&str>) -> bool {
        match self.focus_host.as_mut() {
            Some(host) => host.focus(target, row_id),
            None => true,
        }
    }
}

impl<T> fmt::Debug for Capabilities<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Capabilities")
            .field("preview", &self.preview.is_some())
            .field("allow_clear", &self.allow_clear)
            .field("on_advance_focus", &self.on_advance_focus.is_some())
            .field("set_ignored_keys", &self.set_ignored_keys.is_some())
            .field("focus_host", &self.focus_host.is_some())
            .finish()
    }
}
