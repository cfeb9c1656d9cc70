//! The typeahead interaction core.
//!
//! A [`Typeahead`] couples three pieces:
//!
//! - the search flow ([`flow`]), which keeps at most one effective lookup per
//!   session and drops superseded results,
//! - the navigation state machine ([`navigation`]), which owns visibility,
//!   the focused row, previews and the dropdown direction,
//! - the finalization protocol ([`finalize`]), which turns Tab/Enter into
//!   exactly one selection, a clear, or nothing.
//!
//! The control renders nothing. Hosts read its state to draw the field and
//! the list, feed it keys and lookup outcomes, and receive selections through
//! the callbacks registered on the [`TypeaheadBuilder`].

pub mod capabilities;
mod finalize;
pub mod flow;
mod navigation;
pub mod session;

use std::sync::Arc;

use crossterm::event::KeyCode;
use tracing::{debug, trace, warn};

use crate::error::{Result, TypeaheadError};
use crate::events::{HandlerId, Shortcut, ShortcutRegistry, KEYS_CONSUMED_WHILE_OPEN, TYPEAHEAD_PRIORITY};

pub use capabilities::{
    Capabilities, FocusHost, FormatPreview, LookupError, LookupFuture, Preview, SearchSource,
};
pub use flow::{create_lookup_channel, FlowController, LookupOutcome, LookupPurpose, Ticket};
pub use session::{DropdownDirection, FocusTarget, IssuedQuery, Session, SessionId};

/// Builder that validates a control's capabilities.
pub struct TypeaheadBuilder<T> {
    session_id: Option<SessionId>,
    initial_text: String,
    search: Option<Arc<dyn SearchSource<T>>>,
    on_select: Option<capabilities::SelectCallback<T>>,
    preview: Option<Box<dyn Preview<T>>>,
    allow_clear: bool,
    on_advance_focus: Option<Box<dyn FnMut()>>,
    set_ignored_keys: Option<capabilities::IgnoredKeysCallback>,
    focus_host: Option<Box<dyn FocusHost>>,
}

impl<T: Clone + Send + 'static> TypeaheadBuilder<T> {
    /// Start building a control.
    pub fn new() -> Self {
        Self {
            session_id: None,
            initial_text: String::new(),
            search: None,
            on_select: None,
            preview: None,
            allow_clear: false,
            on_advance_focus: None,
            set_ignored_keys: None,
            focus_host: None,
        }
    }

    /// Use a caller-supplied session id instead of a generated one.
    pub fn session_id(mut self, id: SessionId) -> Self {
        self.session_id = Some(id);
        self
    }

    /// Set the initial field text.
    pub fn initial_text(mut self, text: impl Into<String>) -> Self {
        self.initial_text = text.into();
        self
    }

    /// Set the lookup function. Required.
    pub fn search<S>(mut self, source: S) -> Self
    where
        S: SearchSource<T> + 'static,
    {
        self.search = Some(Arc::new(source));
        self
    }

    /// Set a shared lookup function. Required unless [`search`](Self::search) is used.
    pub fn search_shared(mut self, source: Arc<dyn SearchSource<T>>) -> Self {
        self.search = Some(source);
        self
    }

    /// Set the selection callback. Required.
    pub fn on_select(mut self, callback: impl FnMut(Option<T>) + 'static) -> Self {
        self.on_select = Some(Box::new(callback));
        self
    }

    /// Preview focused candidates in the field.
    pub fn preview(mut self, preview: impl Preview<T> + 'static) -> Self {
        self.preview = Some(Box::new(preview));
        self
    }

    /// Allow committing an empty field to clear the value.
    pub fn allow_clear(mut self, allow: bool) -> Self {
        self.allow_clear = allow;
        self
    }

    /// Called after a stale commit resolved to a selection.
    pub fn on_advance_focus(mut self, callback: impl FnMut() + 'static) -> Self {
        self.on_advance_focus = Some(Box::new(callback));
        self
    }

    /// Tell a host container which keys the open dropdown consumes.
    pub fn set_ignored_keys(mut self, callback: impl FnMut(&[KeyCode]) + 'static) -> Self {
        self.set_ignored_keys = Some(Box::new(callback));
        self
    }

    /// Route focus commands to the presentation layer.
    pub fn focus_host(mut self, host: impl FocusHost + 'static) -> Self {
        self.focus_host = Some(Box::new(host));
        self
    }

    /// Validate the capabilities and create the control.
    ///
    /// # Errors
    ///
    /// Returns `TypeaheadError::ContractViolation` when the search source or
    /// the selection callback is missing, or the session id is empty.
    pub fn build(
        self,
        flow: FlowController<T>,
        shortcuts: ShortcutRegistry,
    ) -> Result<Typeahead<T>> {
        let search = self
            .search
            .ok_or_else(|| TypeaheadError::contract("search"))?;
        let on_select = self
            .on_select
            .ok_or_else(|| TypeaheadError::contract("on_select"))?;
        let id = match self.session_id {
            Some(id) if id.as_str().is_empty() => {
                return Err(TypeaheadError::contract("session_id"));
            }
            Some(id) => id,
            None => SessionId::generate(),
        };

        let handler = shortcuts.register_handler();
        debug!(session = %id, ?handler, "Created typeahead");

        Ok(Typeahead {
            session: Session::new(id, self.initial_text),
            caps: Capabilities {
                search,
                on_select,
                preview: self.preview,
                allow_clear: self.allow_clear,
                on_advance_focus: self.on_advance_focus,
                set_ignored_keys: self.set_ignored_keys,
                focus_host: self.focus_host,
            },
            flow,
            shortcuts,
            handler,
        })
    }
}

impl<T: Clone + Send + 'static> Default for TypeaheadBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// A typeahead selection control.
pub struct Typeahead<T: Clone + Send + 'static> {
    session: Session<T>,
    caps: Capabilities<T>,
    flow: FlowController<T>,
    shortcuts: ShortcutRegistry,
    handler: HandlerId,
}

impl<T: Clone + Send + 'static> Typeahead<T> {
    /// Start building a control.
    pub fn builder() -> TypeaheadBuilder<T> {
        TypeaheadBuilder::new()
    }

    /// Get the session state.
    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    /// Get the session id.
    pub fn id(&self) -> &SessionId {
        self.session.id()
    }

    /// Get the stable handler identity used for shortcut subscriptions.
    pub fn handler_id(&self) -> HandlerId {
        self.handler
    }

    /// Get the current field text.
    pub fn query_text(&self) -> &str {
        self.session.query_text()
    }

    /// Get the candidate list.
    pub fn candidates(&self) -> &[T] {
        self.session.candidates()
    }

    /// Check if the dropdown is open.
    pub fn is_visible(&self) -> bool {
        self.session.is_visible()
    }

    /// Check if the dropdown has rows to draw.
    pub fn shows_rows(&self) -> bool {
        self.session.is_visible() && !self.session.candidates().is_empty()
    }

    /// Get the focused row index.
    pub fn focused_index(&self) -> Option<usize> {
        self.session.focused_index()
    }

    /// Get the dropdown direction.
    pub fn direction(&self) -> DropdownDirection {
        self.session.direction()
    }

    /// Check if a lookup is outstanding.
    pub fn is_loading(&self) -> bool {
        self.flow.is_pending(self.session.id())
    }

    /// Check if the control is mounted.
    pub fn is_mounted(&self) -> bool {
        self.session.is_mounted()
    }

    /// Check if clearing the value is allowed.
    pub fn allows_clear(&self) -> bool {
        self.caps.allow_clear
    }

    /// Mount the control and subscribe its shortcuts.
    pub fn mount(&mut self) {
        if self.session.mounted {
            return;
        }
        self.session.mounted = true;
        for shortcut in Shortcut::ALL {
            self.shortcuts
                .subscribe(shortcut, self.handler, TYPEAHEAD_PRIORITY);
        }
        debug!(session = %self.session.id(), "Mounted typeahead");
    }

    /// Unmount the control.
    ///
    /// Drops any outstanding lookup, releases the shortcut subscriptions and
    /// resets the host's ignored keys.
    pub fn unmount(&mut self) {
        if !self.session.mounted {
            return;
        }
        self.session.mounted = false;
        self.session.visible = false;
        self.flow.discard(self.session.id());
        let removed = self.shortcuts.unsubscribe_all(self.handler);
        self.caps.report_ignored_keys(&[]);
        debug!(session = %self.session.id(), removed, "Unmounted typeahead");
    }

    /// Record where the renderer placed the dropdown.
    pub fn set_direction(&mut self, direction: DropdownDirection) {
        if self.session.direction != direction {
            trace!(session = %self.session.id(), above = direction.above, "Dropdown direction changed");
            self.session.direction = direction;
        }
    }

    /// Replace the field text from the host without issuing a lookup.
    pub fn sync_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text != self.session.query_text {
            self.session.query_text = text;
        }
    }

    /// Route a shortcut to the matching transition.
    ///
    /// Returns `true` when the key was consumed and lower-priority handlers
    /// should not see it.
    pub fn handle_shortcut(&mut self, shortcut: Shortcut) -> bool {
        match shortcut {
            Shortcut::MoveUp => self.key_up(),
            Shortcut::MoveDown => self.key_down(),
            Shortcut::Escape => self.escape(),
            Shortcut::Enter | Shortcut::Tab => self.commit(),
        }
    }

    /// Apply a lookup outcome delivered by the main loop.
    ///
    /// Outcomes of other sessions, superseded lookups and lookups that
    /// finish after unmount are ignored. Returns `true` if state changed.
    pub fn apply_outcome(&mut self, outcome: LookupOutcome<T>) -> bool {
        if &outcome.session_id != self.session.id() || !self.flow.accept(&outcome) {
            return false;
        }
        if !self.session.mounted {
            return false;
        }

        match outcome.purpose {
            LookupPurpose::Search => self.deliver_search(outcome),
            LookupPurpose::Commit => self.deliver_commit(outcome),
        }
        true
    }

    /// Close the dropdown. Closing a closed dropdown does nothing.
    ///
    /// An outstanding lookup stays live: its result is stored when it lands
    /// but does not reopen the dropdown.
    pub fn close(&mut self) {
        if !self.session.mounted || !self.session.visible {
            return;
        }
        self.session.visible = false;
        self.session.focus = FocusTarget::Field;
        self.caps.report_ignored_keys(&[]);
        debug!(session = %self.session.id(), "Closed dropdown");
    }

    /// Open the dropdown if the control is mounted.
    fn open(&mut self) {
        if !self.session.mounted || self.session.visible {
            return;
        }
        self.session.visible = true;
        self.caps.report_ignored_keys(&KEYS_CONSUMED_WHILE_OPEN);
        debug!(session = %self.session.id(), "Opened dropdown");
    }

    fn issue(&mut self, query: String, purpose: LookupPurpose) -> Ticket {
        self.flow.issue(
            self.session.id(),
            query,
            purpose,
            Arc::clone(&self.caps.search),
        )
    }

    fn deliver_search(&mut self, outcome: LookupOutcome<T>) {
        match outcome.result {
            Ok(items) => {
                debug!(
                    session = %self.session.id(),
                    query = %outcome.query,
                    count = items.len(),
                    "Applying lookup result"
                );
                self.session.set_candidates(outcome.ticket, outcome.query, items);
                if !self.session.visible {
                    trace!(session = %self.session.id(), "Stored result while closed");
                }
            }
            Err(e) => self.lookup_failed(&outcome.query, e),
        }
    }

    /// A failed lookup yields nothing. Earlier results stay shown, but an
    /// open dropdown with nothing to show and nothing pending is closed.
    fn lookup_failed(&mut self, query: &str, error: LookupError) {
        let err = TypeaheadError::from(error);
        warn!(
            session = %self.session.id(),
            query = %query,
            recoverable = err.is_recoverable(),
            error = %err,
            "Lookup failed"
        );
        if self.session.candidates.is_empty() && !self.flow.is_pending(self.session.id()) {
            self.close();
        }
    }
}

impl<T: Clone + Send + 'static> Drop for Typeahead<T> {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl<T: Clone + Send + 'static> std::fmt::Debug for Typeahead<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Typeahead")
            .field("id", self.session.id())
            .field("query_text", &self.session.query_text())
            .field("candidates", &self.session.candidates().len())
            .field("visible", &self.session.is_visible())
            .field("focus", &self.session.focus())
            .field("caps", &self.caps)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared fixtures for the typeahead tests.

    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use tokio::sync::{mpsc, oneshot};

    use super::*;

    /// A search source whose answers are released by the test.
    #[derive(Clone, Default)]
    pub struct GatedSource {
        pending: Arc<std::sync::Mutex<HashMap<String, Vec<oneshot::Sender<Result<Vec<String>, LookupError>>>>>>,
        pub issued: Arc<std::sync::Mutex<Vec<String>>>,
    }

    impl GatedSource {
        /// Answer the oldest outstanding lookup for `query`.
        pub fn answer(&self, query: &str, result: Result<Vec<&str>, LookupError>) {
            let sender = self
                .pending
                .lock()
                .unwrap()
                .get_mut(query)
                .and_then(|senders| {
                    if senders.is_empty() {
                        None
                    } else {
                        Some(senders.remove(0))
                    }
                })
                .unwrap_or_else(|| panic!("no lookup outstanding for {:?}", query));
            let result = result.map(|items| items.into_iter().map(String::from).collect());
            sender.send(result).unwrap();
        }

        pub fn issued(&self) -> Vec<String> {
            self.issued.lock().unwrap().clone()
        }
    }

    impl SearchSource<String> for GatedSource {
        fn search(&self, query: String) -> LookupFuture<String> {
            let (tx, rx) = oneshot::channel();
            self.pending
                .lock()
                .unwrap()
                .entry(query.clone())
                .or_default()
                .push(tx);
            self.issued.lock().unwrap().push(query);
            Box::pin(async move { rx.await.unwrap_or(Err(LookupError::Unavailable)) })
        }
    }

    /// Everything a test needs to drive one control.
    pub struct Harness {
        pub typeahead: Typeahead<String>,
        pub rx: mpsc::UnboundedReceiver<LookupOutcome<String>>,
        pub source: GatedSource,
        pub shortcuts: ShortcutRegistry,
        pub selections: Rc<RefCell<Vec<Option<String>>>>,
        pub ignored: Rc<RefCell<Vec<Vec<KeyCode>>>>,
        pub previews: Rc<RefCell<Vec<Option<String>>>>,
        pub edits: Rc<RefCell<Vec<String>>>,
        pub advances: Rc<RefCell<usize>>,
    }

    /// Preview recording every notification.
    pub struct RecordingPreview {
        pub previews: Rc<RefCell<Vec<Option<String>>>>,
        pub edits: Rc<RefCell<Vec<String>>>,
    }

    impl Preview<String> for RecordingPreview {
        fn format(&self, item: &String) -> String {
            item.to_uppercase()
        }

        fn on_preview(&mut self, item: Option<&String>) {
            self.previews.borrow_mut().push(item.cloned());
        }

        fn on_edit(&mut self, text: &str) {
            self.edits.borrow_mut().push(text.to_string());
        }
    }

    /// Options for [`harness`].
    #[derive(Clone, Copy)]
    pub struct Options {
        pub preview: bool,
        pub allow_clear: bool,
    }

    impl Default for Options {
        fn default() -> Self {
            Self {
                preview: false,
                allow_clear: true,
            }
        }
    }

    pub fn harness(options: Options) -> Harness {
        let (rx, flow) = create_lookup_channel::<String>();
        let shortcuts = ShortcutRegistry::new();
        let source = GatedSource::default();
        let selections = Rc::new(RefCell::new(Vec::new()));
        let ignored = Rc::new(RefCell::new(Vec::new()));
        let previews = Rc::new(RefCell::new(Vec::new()));
        let edits = Rc::new(RefCell::new(Vec::new()));
        let advances = Rc::new(RefCell::new(0));

        let mut builder = Typeahead::<String>::builder()
            .session_id(SessionId::new("city"))
            .search(source.clone())
            .allow_clear(options.allow_clear)
            .on_select({
                let selections = Rc::clone(&selections);
                move |item| selections.borrow_mut().push(item)
            })
            .set_ignored_keys({
                let ignored = Rc::clone(&ignored);
                move |keys: &[KeyCode]| ignored.borrow_mut().push(keys.to_vec())
            })
            .on_advance_focus({
                let advances = Rc::clone(&advances);
                move || *advances.borrow_mut() += 1
            });
        if options.preview {
            builder = builder.preview(RecordingPreview {
                previews: Rc::clone(&previews),
                edits: Rc::clone(&edits),
            });
        }

        let mut typeahead = builder.build(flow, shortcuts.clone()).unwrap();
        typeahead.mount();

        Harness {
            typeahead,
            rx,
            source,
            shortcuts,
            selections,
            ignored,
            previews,
            edits,
            advances,
        }
    }

    impl Harness {
        /// Answer the lookup for `query` and apply whatever arrives next.
        pub async fn resolve(&mut self, query: &str, items: &[&str]) -> bool {
            self.source.answer(query, Ok(items.to_vec()));
            let outcome = self.rx.recv().await.unwrap();
            self.typeahead.apply_outcome(outcome)
        }

        /// Type `text` and apply its results.
        pub async fn type_and_resolve(&mut self, text: &str, items: &[&str]) {
            self.typeahead.edit(text);
            assert!(self.resolve(text, items).await);
        }

        pub fn selections(&self) -> Vec<Option<String>> {
            self.selections.borrow().clone()
        }
    }
}
