//! Interaction state for one typeahead control.
//!
//! A [`Session`] is created when the control is built and lives until it is
//! dropped. It is only mutated through the navigation, flow and finalization
//! transitions implemented on [`super::Typeahead`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::flow::Ticket;

/// Counter used for generated session ids.
static NEXT_SESSION: AtomicU64 = AtomicU64::new(1);

/// Identifier of a typeahead session.
///
/// Lookups, row ids and shortcut subscriptions are all tagged with it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Create a session id from a caller-supplied value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a process-unique session id.
    pub fn generate() -> Self {
        let n = NEXT_SESSION.fetch_add(1, Ordering::Relaxed);
        Self(format!("typeahead{}", n))
    }

    /// Get the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where logical focus is inside the control.
///
/// `Field` is the sentinel meaning "no row highlighted, focus is in the
/// text field".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusTarget {
    /// The text field holds focus.
    #[default]
    Field,
    /// The candidate row at this index holds focus.
    Row(usize),
}

impl FocusTarget {
    /// Get the focused row index, if a row is focused.
    pub fn row(self) -> Option<usize> {
        match self {
            FocusTarget::Field => None,
            FocusTarget::Row(index) => Some(index),
        }
    }
}

/// Which side of the field the dropdown is drawn on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DropdownDirection {
    /// The dropdown renders above the field, so "next" is physically up.
    pub above: bool,
}

impl DropdownDirection {
    /// Dropdown drawn below the field.
    pub const BELOW: Self = Self { above: false };
    /// Dropdown drawn above the field.
    pub const ABOVE: Self = Self { above: true };
}

/// The query text whose results are currently held, with the ticket of the
/// lookup that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedQuery {
    /// Ticket of the lookup that delivered the current candidates.
    pub ticket: Ticket,
    /// Text that lookup was issued for.
    pub query: String,
}

/// The complete interaction state for one control instance.
#[derive(Debug, Clone)]
pub struct Session<T> {
    id: SessionId,
    pub(super) query_text: String,
    pub(super) last_issued: Option<IssuedQuery>,
    pub(super) candidates: Vec<T>,
    pub(super) visible: bool,
    pub(super) focus: FocusTarget,
    pub(super) direction: DropdownDirection,
    pub(super) saved_query_text: Option<String>,
    pub(super) mounted: bool,
}

impl<T> Session<T> {
    /// Create a hidden, unmounted session with the given field text.
    pub fn new(id: SessionId, initial_text: impl Into<String>) -> Self {
        Self {
            id,
            query_text: initial_text.into(),
            last_issued: None,
            candidates: Vec::new(),
            visible: false,
            focus: FocusTarget::Field,
            direction: DropdownDirection::BELOW,
            saved_query_text: None,
            mounted: false,
        }
    }

    /// Get the session id.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Get the current field text.
    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    /// Get the query the current candidates were looked up for.
    pub fn last_issued_query(&self) -> Option<&str> {
        self.last_issued.as_ref().map(|issued| issued.query.as_str())
    }

    /// Get the versioned record of the last delivered lookup.
    pub fn last_issued(&self) -> Option<&IssuedQuery> {
        self.last_issued.as_ref()
    }

    /// Get the candidate list.
    pub fn candidates(&self) -> &[T] {
        &self.candidates
    }

    /// Check if the candidate list is shown.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Get the logical focus.
    pub fn focus(&self) -> FocusTarget {
        self.focus
    }

    /// Get the focused row index, `None` when focus is in the field.
    pub fn focused_index(&self) -> Option<usize> {
        self.focus.row()
    }

    /// Get the item in the focused row.
    pub fn focused_item(&self) -> Option<&T> {
        self.focused_index().and_then(|index| self.candidates.get(index))
    }

    /// Get the dropdown direction.
    pub fn direction(&self) -> DropdownDirection {
        self.direction
    }

    /// Get the text saved before navigation started, if any.
    pub fn saved_query_text(&self) -> Option<&str> {
        self.saved_query_text.as_deref()
    }

    /// Check if the control is mounted.
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Check whether the field text has diverged from the last lookup.
    ///
    /// A previewed candidate counts as field text, so committing while a
    /// preview is shown searches for the previewed string.
    pub fn is_stale(&self) -> bool {
        self.last_issued_query() != Some(self.query_text.as_str())
    }

    /// Id of the row at `index`, unique across sessions.
    pub fn row_id(&self, index: usize) -> String {
        format!("{}_{}", self.id, index)
    }

    /// Replace the candidates and reset focus to the field.
    pub(super) fn set_candidates(&mut self, ticket: Ticket, query: String, candidates: Vec<T>) {
        self.candidates = candidates;
        self.last_issued = Some(IssuedQuery { ticket, query });
        self.focus = FocusTarget::Field;
    }

    /// Clear the field and the candidate list.
    pub(super) fn clear_field(&mut self) {
        self.query_text.clear();
        self.candidates.clear();
        self.saved_query_text = None;
        self.focus = FocusTarget::Field;
    }
}
