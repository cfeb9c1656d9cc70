//! Navigation transitions: edit, move, escape, click and refocus.
//!
//! The control is `Idle` while hidden, `Open` once the dropdown is shown and
//! `Navigating` while a row holds logical focus. Moves only act on the
//! candidate list that is already present, so they keep working while a
//! lookup is outstanding.

use tracing::trace;

use super::flow::LookupPurpose;
use super::session::FocusTarget;
use super::Typeahead;

impl<T: Clone + Send + 'static> Typeahead<T> {
    /// The field text changed.
    ///
    /// Issues a lookup for the new text and opens the dropdown shell right
    /// away, before any result arrives.
    pub fn edit(&mut self, text: impl Into<String>) {
        let text = text.into();
        if let Some(preview) = self.caps.preview.as_mut() {
            preview.on_edit(&text);
        }

        self.session.query_text = text.clone();
        self.session.saved_query_text = None;
        self.session.focus = FocusTarget::Field;

        self.issue(text, LookupPurpose::Search);
        self.open();
    }

    /// The Down key, honoring the dropdown direction.
    pub fn key_down(&mut self) -> bool {
        if self.session.direction.above {
            self.move_up()
        } else {
            self.move_down()
        }
    }

    /// The Up key, honoring the dropdown direction.
    pub fn key_up(&mut self) -> bool {
        if self.session.direction.above {
            self.move_down()
        } else {
            self.move_up()
        }
    }

    /// Move the highlight one row further into the list.
    ///
    /// Stays on the last row once it is reached. Returns `false` when the
    /// dropdown is hidden or empty.
    pub fn move_down(&mut self) -> bool {
        if !self.session.visible || self.session.candidates.is_empty() {
            return false;
        }

        let last = self.session.candidates.len() - 1;
        let next = match self.session.focus {
            FocusTarget::Field => 0,
            FocusTarget::Row(index) => (index + 1).min(last),
        };
        if self.session.focus != FocusTarget::Row(next) {
            self.land_on(next);
        }
        true
    }

    /// Move the highlight one row back toward the field.
    ///
    /// Moving up from the first row returns focus to the field and keeps the
    /// dropdown open. Returns `false` when the dropdown is hidden or empty.
    pub fn move_up(&mut self) -> bool {
        if !self.session.visible || self.session.candidates.is_empty() {
            return false;
        }

        match self.session.focus {
            FocusTarget::Row(0) => {
                if self.move_focus(FocusTarget::Field) {
                    self.session.focus = FocusTarget::Field;
                }
            }
            FocusTarget::Row(index) => self.land_on(index - 1),
            FocusTarget::Field => {}
        }
        true
    }

    /// Cancel the dropdown.
    ///
    /// Restores the text typed before navigation began and drops the preview.
    /// Returns `false` when the dropdown was not open.
    pub fn escape(&mut self) -> bool {
        if !self.session.visible {
            return false;
        }

        self.close();
        if let Some(saved) = self.session.saved_query_text.take() {
            self.session.query_text = saved;
        }
        if let Some(preview) = self.caps.preview.as_mut() {
            preview.on_preview(None);
        }
        self.session.focus = FocusTarget::Field;
        self.move_focus(FocusTarget::Field);
        true
    }

    /// A row was clicked.
    ///
    /// Selects the row's item directly, clears the field and closes the
    /// dropdown. Returns `false` if no such row is shown.
    pub fn click_row(&mut self, index: usize) -> bool {
        if !self.session.visible {
            return false;
        }
        let Some(item) = self.session.candidates.get(index).cloned() else {
            trace!(session = %self.session.id(), index, "Click on missing row ignored");
            return false;
        };

        self.close();
        self.session.clear_field();
        self.caps.select(Some(item));
        true
    }

    /// The field regained focus.
    ///
    /// Reshows cached results without a new lookup when the field has text
    /// and candidates from earlier.
    pub fn focus_gained(&mut self) -> bool {
        if self.session.visible
            || self.session.query_text.is_empty()
            || self.session.candidates.is_empty()
        {
            return false;
        }
        self.open();
        self.session.visible
    }

    /// Ask the focus host to move focus, naming rows by their row id.
    fn move_focus(&mut self, target: FocusTarget) -> bool {
        let row_id = target.row().map(|index| self.session.row_id(index));
        self.caps.move_focus(target, row_id.as_deref())
    }

    /// Focus landed on a row: move focus there and apply the preview.
    fn land_on(&mut self, index: usize) {
        if !self.move_focus(FocusTarget::Row(index)) {
            trace!(session = %self.session.id(), index, "Focus target missing, step ignored");
            return;
        }
        self.session.focus = FocusTarget::Row(index);

        if let Some(preview) = self.caps.preview.as_mut() {
            let item = &self.session.candidates[index];
            let text = preview.format(item);
            if self.session.saved_query_text.is_none() {
                self.session.saved_query_text =
                    Some(std::mem::replace(&mut self.session.query_text, text));
            } else {
                self.session.query_text = text;
            }
            self.session.visible = true;
            preview.on_preview(Some(item));
        }
    }
}
