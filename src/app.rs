//! Demo form application state and update loop.
//!
//! The form holds two typeahead fields backed by the catalog. Keys are routed
//! through the shared shortcut registry: the focused field's control sits at
//! typeahead priority, and the form's own handler sits below it and only sees
//! keys the control leaves alone. Control callbacks land in an outbox that is
//! drained after every update.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

use crate::catalog::{Catalog, Places, Record};
use crate::config::Settings;
use crate::error::Result;
use crate::events::{Event, HandlerId, Shortcut, ShortcutRegistry, HOST_PRIORITY};
use crate::typeahead::{
    create_lookup_channel, FocusHost, FocusTarget, LookupOutcome, Preview, Typeahead,
};
use crate::ui::{render_dropdown, render_help_bar, theme, DropdownLayout, InlineLoader, TextInput};

/// Callback results queued by the controls.
#[derive(Debug, Clone, PartialEq)]
enum FormEvent {
    Selected { field: usize, item: Option<Record> },
    AdvanceFocus { field: usize },
    Previewing { field: usize, item: Option<Record> },
}

type Outbox = Rc<RefCell<VecDeque<FormEvent>>>;

/// Preview that reports the previewed record to the form.
struct FormPreview {
    field: usize,
    outbox: Outbox,
}

impl Preview<Record> for FormPreview {
    fn format(&self, item: &Record) -> String {
        item.name.clone()
    }

    fn on_preview(&mut self, item: Option<&Record>) {
        self.outbox.borrow_mut().push_back(FormEvent::Previewing {
            field: self.field,
            item: item.cloned(),
        });
    }

    fn on_edit(&mut self, _text: &str) {
        self.outbox.borrow_mut().push_back(FormEvent::Previewing {
            field: self.field,
            item: None,
        });
    }
}

/// Focus host backed by the row ids drawn in the last frame.
struct DrawnRows(Rc<RefCell<Vec<String>>>);

impl FocusHost for DrawnRows {
    fn focus(&mut self, target: FocusTarget, row_id: Option<&str>) -> bool {
        match (target, row_id) {
            (FocusTarget::Field, _) => true,
            (FocusTarget::Row(_), Some(id)) => self.0.borrow().iter().any(|drawn| drawn == id),
            (FocusTarget::Row(_), None) => false,
        }
    }
}

/// One labelled field on the form.
struct FieldSlot {
    label: &'static str,
    input: TextInput,
    typeahead: Typeahead<Record>,
    value: Option<Record>,
    previewing: Option<Record>,
    /// Keys the open dropdown claims; the form leaves these alone.
    ignored_keys: Rc<RefCell<Vec<KeyCode>>>,
    drawn_rows: Rc<RefCell<Vec<String>>>,
    area: Rect,
    dropdown: Option<DropdownLayout>,
}

impl FieldSlot {
    /// Mirror the control's text into the input widget.
    fn sync_input(&mut self) {
        if self.input.value() != self.typeahead.query_text() {
            self.input.set_value(self.typeahead.query_text());
        }
    }
}

/// The demo form.
pub struct App {
    fields: Vec<FieldSlot>,
    focused: usize,
    outbox: Outbox,
    shortcuts: ShortcutRegistry,
    host_handler: HandlerId,
    lookups: mpsc::UnboundedReceiver<LookupOutcome<Record>>,
    loader: InlineLoader,
    settings: Settings,
    should_quit: bool,
}

impl App {
    /// Build the form over `places`.
    ///
    /// # Errors
    ///
    /// Fails if a field's control cannot be built.
    pub fn new(settings: Settings, places: Places) -> Result<Self> {
        let (lookups, flow) = create_lookup_channel::<Record>();
        let shortcuts = ShortcutRegistry::new();
        let outbox: Outbox = Rc::new(RefCell::new(VecDeque::new()));
        let latency = Duration::from_millis(settings.latency_ms);

        let sources = [
            ("Country", "Type a country...", Catalog::new("countries", places.countries)),
            ("City", "Type a city...", Catalog::new("cities", places.cities)),
        ];

        let mut fields = Vec::with_capacity(sources.len());
        for (field, (label, placeholder, catalog)) in sources.into_iter().enumerate() {
            let catalog = catalog
                .with_latency(latency)
                .with_max_results(settings.max_results);
            debug!(field = label, records = catalog.len(), "Field catalog ready");
            let drawn_rows = Rc::new(RefCell::new(Vec::new()));
            let ignored_keys = Rc::new(RefCell::new(Vec::new()));

            let mut builder = Typeahead::<Record>::builder()
                .search(catalog)
                .allow_clear(settings.allow_clear)
                .focus_host(DrawnRows(Rc::clone(&drawn_rows)))
                .on_select({
                    let outbox = Rc::clone(&outbox);
                    move |item| {
                        outbox
                            .borrow_mut()
                            .push_back(FormEvent::Selected { field, item })
                    }
                })
                .set_ignored_keys({
                    let ignored_keys = Rc::clone(&ignored_keys);
                    move |keys: &[KeyCode]| *ignored_keys.borrow_mut() = keys.to_vec()
                });
            if settings.preview {
                builder = builder.preview(FormPreview {
                    field,
                    outbox: Rc::clone(&outbox),
                });
            }
            if settings.advance_on_commit {
                let outbox = Rc::clone(&outbox);
                builder = builder.on_advance_focus(move || {
                    outbox
                        .borrow_mut()
                        .push_back(FormEvent::AdvanceFocus { field })
                });
            }

            let mut typeahead = builder.build(flow.clone(), shortcuts.clone())?;
            typeahead.mount();

            let mut input = TextInput::new();
            input.set_placeholder(placeholder);

            fields.push(FieldSlot {
                label,
                input,
                typeahead,
                value: None,
                previewing: None,
                ignored_keys,
                drawn_rows,
                area: Rect::default(),
                dropdown: None,
            });
        }

        let host_handler = shortcuts.register_handler();
        for shortcut in Shortcut::ALL {
            shortcuts.subscribe(shortcut, host_handler, HOST_PRIORITY);
        }
        debug!(fields = fields.len(), "Created form");

        Ok(Self {
            fields,
            focused: 0,
            outbox,
            shortcuts,
            host_handler,
            lookups,
            loader: InlineLoader::new(),
            settings,
            should_quit: false,
        })
    }

    /// Returns whether the application should quit.
    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Index of the focused field.
    pub fn focused_field(&self) -> usize {
        self.focused
    }

    /// Committed value of a field.
    pub fn value(&self, field: usize) -> Option<&Record> {
        self.fields.get(field).and_then(|slot| slot.value.as_ref())
    }

    /// Current text of a field.
    pub fn field_text(&self, field: usize) -> &str {
        self.fields
            .get(field)
            .map(|slot| slot.input.value())
            .unwrap_or_default()
    }

    /// Update the form with an input event.
    pub fn update(&mut self, event: Event) {
        match event {
            Event::Key(key) => {
                trace!(key = ?key.code, modifiers = ?key.modifiers, "Key event");
                self.handle_key_event(key);
            }
            Event::Click { column, row } => self.handle_click(column, row),
            Event::Resize(width, height) => {
                trace!(width, height, "Terminal resize event");
            }
            Event::Tick => self.loader.tick(),
        }
        self.drain_outbox();
    }

    /// Apply every lookup outcome that has arrived.
    pub fn poll_lookups(&mut self) {
        while let Ok(outcome) = self.lookups.try_recv() {
            self.apply_lookup(outcome);
        }
        self.drain_outbox();
    }

    fn apply_lookup(&mut self, outcome: LookupOutcome<Record>) {
        let Some(slot) = self
            .fields
            .iter_mut()
            .find(|slot| slot.typeahead.id() == &outcome.session_id)
        else {
            trace!(session = %outcome.session_id, "Lookup for unknown field dropped");
            return;
        };
        if slot.typeahead.apply_outcome(outcome) {
            slot.sync_input();
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            info!("Quit requested");
            self.should_quit = true;
            return;
        }

        if let Some(shortcut) = Shortcut::from_key(&key) {
            self.dispatch_shortcut(shortcut);
            return;
        }

        let slot = &mut self.fields[self.focused];
        if slot.input.handle_input(key) {
            slot.typeahead.edit(slot.input.value());
        }
    }

    fn dispatch_shortcut(&mut self, shortcut: Shortcut) {
        let host = self.host_handler;
        let focused = self.focused;
        let mut host_action = None;
        let fields = &mut self.fields;

        let consumed = self.shortcuts.dispatch(shortcut, |handler| {
            if handler == host {
                return match host_shortcut(shortcut, &fields[focused].ignored_keys.borrow()) {
                    Some(action) => {
                        host_action = Some(action);
                        true
                    }
                    None => false,
                };
            }
            let slot = &mut fields[focused];
            handler == slot.typeahead.handler_id() && slot.typeahead.handle_shortcut(shortcut)
        });
        trace!(?shortcut, ?consumed, "Dispatched shortcut");

        self.fields[focused].sync_input();
        match host_action {
            Some(HostAction::Next) => self.focus_field((focused + 1) % self.fields.len()),
            Some(HostAction::Previous) => {
                self.focus_field((focused + self.fields.len() - 1) % self.fields.len())
            }
            Some(HostAction::Quit) => {
                info!("Quit requested");
                self.should_quit = true;
            }
            None => {}
        }
    }

    fn handle_click(&mut self, column: u16, row: u16) {
        let focused = self.focused;
        let hit = self.fields[focused]
            .dropdown
            .and_then(|layout| layout.row_at(column, row));
        if let Some(index) = hit {
            let slot = &mut self.fields[focused];
            if slot.typeahead.click_row(index) {
                slot.sync_input();
            }
            return;
        }

        let target = self.fields.iter().position(|slot| {
            column >= slot.area.x
                && column < slot.area.right()
                && row >= slot.area.y
                && row < slot.area.bottom()
        });
        if let Some(field) = target {
            self.focus_field(field);
        }
    }

    /// Move form focus to `field`, cancelling the old field's dropdown.
    fn focus_field(&mut self, field: usize) {
        if field == self.focused || field >= self.fields.len() {
            return;
        }
        let old = &mut self.fields[self.focused];
        old.typeahead.escape();
        old.sync_input();

        self.focused = field;
        self.fields[field].typeahead.focus_gained();
        debug!(field = self.fields[field].label, "Focused field");
    }

    fn drain_outbox(&mut self) {
        loop {
            let Some(event) = self.outbox.borrow_mut().pop_front() else {
                break;
            };
            match event {
                FormEvent::Selected { field, item } => {
                    info!(
                        field = self.fields[field].label,
                        value = item.as_ref().map(|r| r.name.as_str()).unwrap_or("<none>"),
                        "Value selected"
                    );
                    let slot = &mut self.fields[field];
                    slot.value = item;
                    slot.previewing = None;
                }
                FormEvent::AdvanceFocus { field } => {
                    if field == self.focused {
                        self.focus_field((field + 1) % self.fields.len());
                    }
                }
                FormEvent::Previewing { field, item } => self.fields[field].previewing = item,
            }
        }
    }

    /// Render the form.
    pub fn view(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Length(3), // Country
                Constraint::Min(3),    // Values
                Constraint::Length(3), // City
                Constraint::Length(1), // Help
            ])
            .split(area);

        self.render_header(frame, chunks[0]);
        self.fields[0].area = chunks[1];
        self.fields[1].area = chunks[3];
        for field in 0..self.fields.len() {
            self.render_field(frame, field);
        }
        self.render_values(frame, chunks[2]);

        let open = self.fields[self.focused].typeahead.is_visible();
        render_help_bar(frame, chunks[4], open);

        // Dropdown last so it overlays the form
        for field in 0..self.fields.len() {
            self.render_dropdown(frame, field, area);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let t = theme();
        let title = Paragraph::new("Typeahead")
            .style(Style::default().fg(t.accent))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::BOTTOM)
                    .border_style(Style::default().fg(t.border)),
            );
        frame.render_widget(title, area);
    }

    fn render_field(&self, frame: &mut Frame, field: usize) {
        let slot = &self.fields[field];
        let typeahead = &slot.typeahead;
        let status = if typeahead.is_loading() {
            self.loader.frame(true)
        } else if typeahead.is_visible() && typeahead.candidates().is_empty() {
            "no matches"
        } else {
            ""
        };
        slot.input
            .render_with_label(frame, slot.area, slot.label, status, field == self.focused);
    }

    fn render_values(&self, frame: &mut Frame, area: Rect) {
        let t = theme();
        let mut lines = Vec::new();
        for slot in &self.fields {
            let value = match &slot.value {
                Some(record) => match &record.detail {
                    Some(detail) => format!("{} ({})", record.name, detail),
                    None => record.name.clone(),
                },
                None => "-".to_string(),
            };
            lines.push(Line::from(vec![
                Span::styled(format!(" {}: ", slot.label), Style::default().fg(t.muted)),
                Span::styled(value, Style::default().fg(t.value).add_modifier(Modifier::BOLD)),
            ]));
        }
        if let Some(record) = &self.fields[self.focused].previewing {
            lines.push(Line::from(Span::styled(
                format!(" Previewing {}", record.name),
                Style::default().fg(t.muted),
            )));
        }
        frame.render_widget(Paragraph::new(lines), area);
    }

    fn render_dropdown(&mut self, frame: &mut Frame, field: usize, screen: Rect) {
        let max_rows = self.settings.max_visible_rows;
        let slot = &mut self.fields[field];
        let typeahead = &slot.typeahead;

        slot.dropdown = if typeahead.shows_rows() {
            DropdownLayout::place(
                slot.area,
                screen,
                typeahead.candidates().len(),
                max_rows,
                typeahead.focused_index(),
            )
        } else {
            None
        };

        match slot.dropdown {
            Some(layout) => {
                render_dropdown(frame, &layout, typeahead.candidates(), typeahead.focused_index());
                let session = typeahead.session();
                *slot.drawn_rows.borrow_mut() =
                    (0..session.candidates().len()).map(|index| session.row_id(index)).collect();
                slot.typeahead.set_direction(layout.direction);
            }
            None => slot.drawn_rows.borrow_mut().clear(),
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.shortcuts.unsubscribe_all(self.host_handler);
    }
}

/// What the form does with a key no control consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostAction {
    Next,
    Previous,
    Quit,
}

fn host_shortcut(shortcut: Shortcut, ignored: &[KeyCode]) -> Option<HostAction> {
    let key = match shortcut {
        Shortcut::MoveUp => KeyCode::Up,
        Shortcut::MoveDown => KeyCode::Down,
        Shortcut::Escape => KeyCode::Esc,
        Shortcut::Enter => KeyCode::Enter,
        Shortcut::Tab => KeyCode::Tab,
    };
    if ignored.contains(&key) {
        return None;
    }
    match shortcut {
        Shortcut::Tab | Shortcut::MoveDown => Some(HostAction::Next),
        Shortcut::MoveUp => Some(HostAction::Previous),
        Shortcut::Escape => Some(HostAction::Quit),
        Shortcut::Enter => None,
    }
}
