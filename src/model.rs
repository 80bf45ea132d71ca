use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, trace};

use crate::domain::{HELP_TEXT, Message, TVConfig, TVError};
use crate::filter::FilterField;
use crate::inputter::{InputResult, Inputter};
use crate::record::VehicleCode;
use crate::sort::{Column, cell_text};
use crate::source::{LoadEvent, Loader, RecordSource};
use crate::table::{TableView, ViewState};

#[derive(Debug, PartialEq)]
pub enum Status {
    READY,
    QUITTING,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Modus {
    TABLE,
    RECORD,
    POPUP,
    FILTERINPUT(FilterField),
    FACETPICK(FilterField),
}

/// Selection inside the facet picker. Index 0 is the "any" entry that
/// clears the filter.
#[derive(Debug, Default, Clone)]
pub struct FacetPicker {
    pub options: Vec<String>,
    pub selected: usize,
}

pub struct Model {
    config: TVConfig,
    source: Arc<dyn RecordSource>,
    pub status: Status,
    modus: Modus,
    previous_modus: Modus,
    table: TableView,
    input: Inputter,
    last_input: InputResult,
    filter_before_edit: String,
    picker: FacetPicker,
    clipboard: Option<Clipboard>,
    status_message: String,
    last_status_message_update: Instant,
}

impl Model {
    pub fn init(config: &TVConfig, source: Arc<dyn RecordSource>) -> Self {
        let clipboard = match Clipboard::new() {
            Ok(c) => Some(c),
            Err(e) => {
                debug!("Clipboard not available: {e:?}");
                None
            }
        };
        Self {
            config: config.clone(),
            source,
            status: Status::READY,
            modus: Modus::TABLE,
            previous_modus: Modus::TABLE,
            table: TableView::on_create(config),
            input: Inputter::default(),
            last_input: InputResult::default(),
            filter_before_edit: String::new(),
            picker: FacetPicker::default(),
            clipboard,
            status_message: "Started vtv!".to_string(),
            last_status_message_update: Instant::now(),
        }
    }

    /// Called once the terminal is up; arms sorting and pagination and
    /// starts the fetch.
    pub fn ready(&mut self) {
        self.table.on_ready();
        self.load();
    }

    pub fn dispose(&mut self) {
        self.table.on_dispose();
    }

    fn load(&mut self) {
        let name = self.source.describe();
        info!("Loading vehicles from {name}");
        let loader = Loader::spawn(Arc::clone(&self.source));
        self.table.subscribe(loader, name);
        self.set_status_message("Loading ...");
    }

    /// Turns a finished fetch into a message for `update`.
    pub fn poll_loader(&mut self) -> Option<Message> {
        match self.table.poll_loader()? {
            LoadEvent::Loaded { records, millis } => Some(Message::Loaded(records, millis)),
            LoadEvent::Failed(e) => Some(Message::LoadFailed(e)),
        }
    }

    pub fn raw_keyevents(&self) -> bool {
        matches!(self.modus, Modus::FILTERINPUT(_))
    }

    pub fn quit(&mut self) {
        self.status = Status::QUITTING;
    }

    pub fn update(&mut self, message: Message) -> Result<(), TVError> {
        trace!("Update: Modus {:?}, Message {:?}", self.modus, message);
        match message {
            Message::Loaded(records, millis) => {
                self.loaded(records, millis);
                return Ok(());
            }
            Message::LoadFailed(e) => {
                error!("Loading failed: {e}");
                self.table.fail(&e);
                self.set_status_message(format!("Error: {e} (r to retry)"));
                return Ok(());
            }
            Message::Quit if !self.raw_keyevents() => {
                self.quit();
                return Ok(());
            }
            _ => {}
        }

        match self.modus {
            Modus::TABLE => match message {
                Message::Help => self.show_help(),
                Message::MoveUp => self.table.move_selection_up(),
                Message::MoveDown => self.table.move_selection_down(),
                Message::MoveLeft => self.table.move_selection_left(),
                Message::MoveRight => self.table.move_selection_right(),
                Message::NextPage => self.table.next_page(),
                Message::PrevPage => self.table.prev_page(),
                Message::FirstPage => self.table.first_page(),
                Message::LastPage => self.table.last_page(),
                Message::CyclePageSize => {
                    self.table.cycle_page_size();
                    self.set_status_message(format!("{} rows per page", self.table.page_size()));
                }
                Message::ToggleSort => self.toggle_sort(),
                Message::EditFilter(field) => self.enter_filter_input(field),
                Message::PickFacet(field) => self.enter_facet_pick(field),
                Message::ClearFilters => {
                    self.table.replace_filter(Default::default());
                    self.set_status_message("Filters cleared");
                }
                Message::CopyRow => self.copy_row(),
                Message::CopyCell => self.copy_cell(),
                Message::Reload => self.reload(),
                Message::Enter => self.enter_record_view(),
                _ => (),
            },
            Modus::RECORD => match message {
                Message::Help => self.show_help(),
                Message::MoveUp | Message::MoveLeft => self.table.move_selection_up(),
                Message::MoveDown | Message::MoveRight => self.table.move_selection_down(),
                Message::CopyRow => self.copy_row(),
                Message::Enter | Message::Exit => self.back_to_table(),
                _ => (),
            },
            Modus::POPUP => {
                if let Message::Exit | Message::Enter | Message::Help = message {
                    trace!("Close popup ...");
                    self.modus = self.previous_modus;
                    self.previous_modus = Modus::POPUP;
                }
            }
            Modus::FACETPICK(field) => match message {
                Message::MoveUp => {
                    self.picker.selected = self.picker.selected.saturating_sub(1);
                }
                Message::MoveDown => {
                    if self.picker.selected < self.picker.options.len() {
                        self.picker.selected += 1;
                    }
                }
                Message::FirstPage => self.picker.selected = 0,
                Message::LastPage => self.picker.selected = self.picker.options.len(),
                Message::Enter => self.pick_facet(field),
                Message::Exit => self.back_to_table(),
                _ => (),
            },
            Modus::FILTERINPUT(field) => {
                if let Message::RawKey(key) = message {
                    self.raw_input(field, key)
                }
            }
        }
        Ok(())
    }

    // -------------------- Control handling functions ---------------------- //

    fn loaded(&mut self, records: Vec<VehicleCode>, millis: u128) {
        let count = records.len();
        self.table.load(records);
        self.set_status_message(format!("Loaded {count} vehicles in {millis}ms ..."));
    }

    fn reload(&mut self) {
        if self.table.is_loading() {
            self.set_status_message("Still loading ...");
            return;
        }
        self.load();
    }

    fn back_to_table(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::TABLE;
    }

    fn show_help(&mut self) {
        self.previous_modus = self.modus;
        self.modus = Modus::POPUP;
    }

    fn toggle_sort(&mut self) {
        let column = self.table.selected_column();
        self.table.toggle_sort(column);
        let message = match self.table.sort() {
            Some(sort) => format!("Sorted by {} {}", column.label(), sort.indicator()),
            None => "Unsorted".to_string(),
        };
        self.set_status_message(message);
    }

    fn enter_record_view(&mut self) {
        if self.table.selected_record().is_some() {
            self.previous_modus = self.modus;
            self.modus = Modus::RECORD;
        }
    }

    fn enter_filter_input(&mut self, field: FilterField) {
        trace!("Editing filter {field:?} ...");
        self.previous_modus = self.modus;
        self.modus = Modus::FILTERINPUT(field);
        self.filter_before_edit = self.table.filter().get(field).to_string();
        self.input.set(&self.filter_before_edit);
        self.last_input = self.input.get();
    }

    fn raw_input(&mut self, field: FilterField, key: KeyEvent) {
        self.last_input = self.input.read(key);
        if self.last_input.canceled {
            let original = std::mem::take(&mut self.filter_before_edit);
            self.table.set_filter(field, original);
        } else if self.last_input.changed {
            // Every keystroke re-filters, like a reactive form input.
            self.table.set_filter(field, self.last_input.input.clone());
        }
        if self.last_input.finished {
            self.modus = self.previous_modus;
            self.previous_modus = Modus::FILTERINPUT(field);
            self.set_status_message(format!(
                "{} of {} vehicles match",
                self.table.filtered_len(),
                self.table.total_len()
            ));
        }
    }

    fn enter_facet_pick(&mut self, field: FilterField) {
        let options = self.table.facets().for_field(field).to_vec();
        if options.is_empty() {
            self.set_status_message(format!("No {} values to pick from", field.label()));
            return;
        }
        let current = self.table.filter().get(field);
        let selected = options
            .iter()
            .position(|o| o == current)
            .map(|i| i + 1)
            .unwrap_or(0);
        self.picker = FacetPicker { options, selected };
        self.previous_modus = self.modus;
        self.modus = Modus::FACETPICK(field);
    }

    fn pick_facet(&mut self, field: FilterField) {
        let value = match self.picker.selected {
            0 => String::new(),
            i => self.picker.options.get(i - 1).cloned().unwrap_or_default(),
        };
        debug!("Picked {field:?} = {value:?}");
        self.table.set_filter(field, value);
        self.back_to_table();
    }

    fn wrap_cell_content(c: &str) -> String {
        let needs_escaping = c.chars().any(|c| c == '"');
        let needs_wrapping = c.chars().any(|c| c == ' ' || c == '\t' || c == ',');
        let mut out = String::from(c);

        if needs_escaping {
            out = out.replace('"', "\"\"");
        }
        if needs_wrapping || needs_escaping {
            out = format!("\"{out}\"");
        }
        out
    }

    pub fn row_as_csv(record: &VehicleCode) -> String {
        Column::ALL
            .iter()
            .map(|c| Model::wrap_cell_content(&cell_text(record, *c)))
            .collect::<Vec<String>>()
            .join(",")
    }

    fn copy_row(&mut self) {
        let Some(record) = self.table.selected_record() else {
            return;
        };
        let content = Model::row_as_csv(record);
        self.copy_to_clipboard(content, "row");
    }

    fn copy_cell(&mut self) {
        let Some(record) = self.table.selected_record() else {
            return;
        };
        let content = cell_text(record, self.table.selected_column());
        self.copy_to_clipboard(content, "cell");
    }

    fn copy_to_clipboard(&mut self, content: String, what: &str) {
        trace!("Copy {what}: {content}");
        let result = match self.clipboard.as_mut() {
            Some(clipboard) => clipboard.set_text(content).map_err(|e| format!("{e}")),
            None => Err("no clipboard available".to_string()),
        };
        match result {
            Ok(_) => self.set_status_message(format!("Copied {what} to clipboard.")),
            Err(e) => {
                debug!("Error copying to clipboard: {e}");
                self.set_status_message(format!("Copy failed: {e}"));
            }
        }
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        self.last_status_message_update = Instant::now();
    }

    // -------------------- Accessors for the ui ---------------------- //

    pub fn table(&self) -> &TableView {
        &self.table
    }

    pub fn modus(&self) -> Modus {
        self.modus
    }

    pub fn view_state(&self) -> &ViewState {
        self.table.state()
    }

    pub fn input(&self) -> &InputResult {
        &self.last_input
    }

    pub fn picker(&self) -> &FacetPicker {
        &self.picker
    }

    pub fn help_text(&self) -> &'static str {
        HELP_TEXT
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn status_message_age(&self) -> std::time::Duration {
        self.last_status_message_update.elapsed()
    }

    pub fn max_column_width(&self) -> usize {
        self.config.max_column_width
    }
}
