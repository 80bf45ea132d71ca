use rayon::prelude::*;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::domain::{TVConfig, TVError};
use crate::facets::FacetLists;
use crate::filter::{FilterField, FilterState, matches};
use crate::record::VehicleCode;
use crate::sort::{Column, SortState, sort_rows};
use crate::source::{LoadEvent, Loader};

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Empty,
    Loaded,
    Failed(String),
    Destroyed,
}

/// The vehicle table: full record set, the filter/sort/page pipeline on top
/// of it and the selection inside the current page.
///
/// Lifecycle is `on_create` -> `on_ready` -> `on_dispose`. Records arrive
/// through `load` (or `fail`) once the fetch resolves.
pub struct TableView {
    name: String,
    state: ViewState,
    records: Arc<Vec<VehicleCode>>,
    facets: FacetLists,
    filter: FilterState,
    sort: Option<SortState>,
    rows: Arc<Vec<usize>>, // Filtered and sorted indices into records
    page: usize,
    page_size: usize,
    page_sizes: Vec<usize>,
    armed: bool,
    loader: Option<Loader>,
    pub curser_row: usize,
    pub curser_column: usize,
}

impl TableView {
    pub fn on_create(config: &TVConfig) -> Self {
        let page_size = config.page_size.max(1);
        TableView {
            name: String::new(),
            state: ViewState::Empty,
            records: Arc::new(Vec::new()),
            facets: FacetLists::default(),
            filter: config.initial_filter.clone(),
            sort: None,
            rows: Arc::new(Vec::new()),
            page: 0,
            page_size,
            page_sizes: config.page_sizes.clone(),
            armed: false,
            loader: None,
            curser_row: 0,
            curser_column: 0,
        }
    }

    /// Activates sorting and pagination.
    pub fn on_ready(&mut self) {
        if self.is_destroyed() {
            return;
        }
        self.armed = true;
        self.refresh();
    }

    /// Releases the loader subscription and the record set. Afterwards the
    /// view ignores every operation.
    pub fn on_dispose(&mut self) {
        if let Some(mut loader) = self.loader.take() {
            loader.release();
        }
        self.records = Arc::new(Vec::new());
        self.rows = Arc::new(Vec::new());
        self.facets = FacetLists::default();
        self.state = ViewState::Destroyed;
        debug!("Table view {} disposed", self.name);
    }

    pub fn subscribe(&mut self, loader: Loader, name: impl Into<String>) {
        if self.is_destroyed() {
            return;
        }
        self.name = name.into();
        if let ViewState::Failed(_) = self.state {
            self.state = ViewState::Empty;
        }
        self.loader = Some(loader);
    }

    pub fn poll_loader(&mut self) -> Option<LoadEvent> {
        let event = self.loader.as_mut()?.poll();
        if event.is_some() {
            self.loader = None;
        }
        event
    }

    pub fn is_loading(&self) -> bool {
        self.loader.as_ref().is_some_and(|l| l.is_pending())
    }

    pub fn load(&mut self, records: Vec<VehicleCode>) {
        if self.is_destroyed() {
            return;
        }
        info!("Table view {} loaded {} records", self.name, records.len());
        self.facets = FacetLists::collect(&records);
        self.records = Arc::new(records);
        self.state = ViewState::Loaded;
        self.page = 0;
        self.curser_row = 0;
        self.refresh();
    }

    pub fn fail(&mut self, error: &TVError) {
        if self.is_destroyed() {
            return;
        }
        warn!("Table view {} failed to load: {error}", self.name);
        // A reload failing keeps the records that are already shown.
        if self.state != ViewState::Loaded {
            self.state = ViewState::Failed(error.to_string());
        }
    }

    pub fn set_filter(&mut self, field: FilterField, value: impl Into<String>) {
        let next = self.filter.with(field, value);
        self.replace_filter(next);
    }

    /// Swaps in a new filter snapshot and re-evaluates every record.
    /// Pagination goes back to the first page.
    pub fn replace_filter(&mut self, filter: FilterState) {
        if self.is_destroyed() {
            return;
        }
        self.filter = filter;
        self.page = 0;
        self.curser_row = 0;
        self.refresh();
    }

    pub fn toggle_sort(&mut self, column: Column) {
        self.set_sort(SortState::cycle(self.sort, column));
    }

    pub fn set_sort(&mut self, sort: Option<SortState>) {
        if self.is_destroyed() || !self.armed {
            return;
        }
        self.sort = sort;
        self.refresh();
    }

    fn refresh(&mut self) {
        if self.state != ViewState::Loaded {
            return;
        }
        let start_time = Instant::now();
        let records = &self.records;
        let filter = &self.filter;

        let mut rows: Vec<usize> = (0..records.len())
            .into_par_iter()
            .filter(|&idx| matches(&records[idx], filter))
            .collect();

        if self.armed
            && let Some(sort) = self.sort
        {
            sort_rows(records, &mut rows, sort);
        }

        trace!(
            "Filter {:?} kept {}/{} rows in {}ms",
            self.filter,
            rows.len(),
            records.len(),
            start_time.elapsed().as_millis()
        );
        self.rows = Arc::new(rows);
        self.clamp_page();
    }

    fn clamp_page(&mut self) {
        self.page = std::cmp::min(self.page, self.page_count() - 1);
        let on_page = self.page_range().len();
        self.curser_row = std::cmp::min(self.curser_row, on_page.saturating_sub(1));
    }

    // -------------------- Pagination ---------------------- //

    pub fn page_count(&self) -> usize {
        if !self.armed {
            return 1;
        }
        std::cmp::max(1, self.rows.len().div_ceil(self.page_size))
    }

    fn page_range(&self) -> std::ops::Range<usize> {
        if !self.armed {
            return 0..self.rows.len();
        }
        let begin = std::cmp::min(self.page * self.page_size, self.rows.len());
        let end = std::cmp::min(begin + self.page_size, self.rows.len());
        begin..end
    }

    fn goto_page(&mut self, page: usize) {
        if self.is_destroyed() || !self.armed {
            return;
        }
        self.page = std::cmp::min(page, self.page_count() - 1);
        self.curser_row = 0;
    }

    pub fn next_page(&mut self) {
        self.goto_page(self.page + 1);
    }

    pub fn prev_page(&mut self) {
        self.goto_page(self.page.saturating_sub(1));
    }

    pub fn first_page(&mut self) {
        self.goto_page(0);
    }

    pub fn last_page(&mut self) {
        self.goto_page(self.page_count() - 1);
    }

    /// Steps through the configured page sizes, keeping the first visible
    /// record on screen.
    pub fn cycle_page_size(&mut self) {
        if self.is_destroyed() || self.page_sizes.is_empty() {
            return;
        }
        let first_row = self.page * self.page_size;
        let next = self
            .page_sizes
            .iter()
            .position(|&s| s == self.page_size)
            .map(|i| (i + 1) % self.page_sizes.len())
            .unwrap_or(0);
        self.page_size = self.page_sizes[next].max(1);
        self.page = first_row / self.page_size;
        self.curser_row = 0;
        self.clamp_page();
    }

    // -------------------- Selection ---------------------- //

    pub fn move_selection_up(&mut self) {
        self.curser_row = self.curser_row.saturating_sub(1);
    }

    pub fn move_selection_down(&mut self) {
        let on_page = self.page_range().len();
        if self.curser_row + 1 < on_page {
            self.curser_row += 1;
        }
    }

    pub fn move_selection_left(&mut self) {
        self.curser_column = self.curser_column.saturating_sub(1);
    }

    pub fn move_selection_right(&mut self) {
        if self.curser_column + 1 < Column::ALL.len() {
            self.curser_column += 1;
        }
    }

    pub fn selected_column(&self) -> Column {
        Column::at(self.curser_column).unwrap_or(Column::Vehicle)
    }

    pub fn selected_record(&self) -> Option<&VehicleCode> {
        let range = self.page_range();
        let idx = self.rows.get(range.start + self.curser_row)?;
        self.records.get(*idx)
    }

    // -------------------- Accessors ---------------------- //

    /// Records on the current page, in display order.
    pub fn visible(&self) -> Vec<&VehicleCode> {
        self.rows[self.page_range()]
            .iter()
            .map(|&idx| &self.records[idx])
            .collect()
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn is_destroyed(&self) -> bool {
        self.state == ViewState::Destroyed
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn facets(&self) -> &FacetLists {
        &self.facets
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn sort(&self) -> Option<SortState> {
        self.sort
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn filtered_len(&self) -> usize {
        self.rows.len()
    }

    pub fn total_len(&self) -> usize {
        self.records.len()
    }

    /// Absolute position of the selected row among the filtered rows.
    pub fn selected_position(&self) -> usize {
        self.page_range().start + self.curser_row
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Named;
    use crate::record::tests::record;
    use crate::sort::Direction;
    use crate::source::tests::StaticSource;
    use std::time::Duration;

    fn ready_view(records: Vec<VehicleCode>, page_size: usize) -> TableView {
        let config = TVConfig::default().with_page_size(page_size);
        let mut view = TableView::on_create(&config);
        view.on_ready();
        view.load(records);
        view
    }

    fn names(view: &TableView) -> Vec<&str> {
        view.visible()
            .iter()
            .map(|r| r.vehicle_name().unwrap_or(""))
            .collect()
    }

    fn numbered(n: usize) -> Vec<VehicleCode> {
        (0..n).map(|i| record(&format!("V{i:02}"), None)).collect()
    }

    #[test]
    fn starts_empty() {
        let view = TableView::on_create(&TVConfig::default());
        assert_eq!(view.state(), &ViewState::Empty);
        assert!(view.visible().is_empty());
        assert_eq!(view.page_count(), 1);
        assert!(view.selected_record().is_none());
    }

    #[test]
    fn organization_filter_keeps_original_order() {
        let mut first = record("Truck1", Some("Acme"));
        first.code1c = Some("1".to_string());
        let records = vec![
            first,
            record("Van2", Some("Acme")),
            record("Bus3", Some("Zenith")),
        ];
        let mut view = ready_view(records, 10);
        view.set_filter(FilterField::Organization, "acme");
        assert_eq!(names(&view), vec!["Truck1", "Van2"]);
        assert_eq!(view.filtered_len(), 2);
        assert_eq!(view.total_len(), 3);
    }

    #[test]
    fn facets_follow_full_set_not_filter() {
        let mut view = ready_view(
            vec![record("1", Some("Acme")), record("2", Some("Zenith"))],
            10,
        );
        view.set_filter(FilterField::Organization, "zen");
        assert_eq!(view.facets().organizations, vec!["Acme", "Zenith"]);
    }

    #[test]
    fn filter_change_resets_to_first_page() {
        let mut view = ready_view(numbered(25), 10);
        view.next_page();
        view.next_page();
        assert_eq!(view.page(), 2);
        view.set_filter(FilterField::Global, "v");
        assert_eq!(view.page(), 0);
        assert_eq!(names(&view)[0], "V00");
    }

    #[test]
    fn paginates_and_clamps() {
        let mut view = ready_view(numbered(25), 10);
        assert_eq!(view.page_count(), 3);
        view.last_page();
        assert_eq!(names(&view), vec!["V20", "V21", "V22", "V23", "V24"]);
        view.next_page();
        assert_eq!(view.page(), 2);
        view.prev_page();
        view.prev_page();
        view.prev_page();
        assert_eq!(view.page(), 0);
        assert_eq!(view.visible().len(), 10);
    }

    #[test]
    fn no_matches_still_has_one_page() {
        let mut view = ready_view(numbered(5), 2);
        view.set_filter(FilterField::Global, "nothing like this");
        assert_eq!(view.page_count(), 1);
        assert!(view.visible().is_empty());
        assert!(view.selected_record().is_none());
    }

    #[test]
    fn cycling_page_size_keeps_position() {
        let mut view = ready_view(numbered(60), 10);
        view.goto_page(3);
        view.cycle_page_size();
        assert_eq!(view.page_size(), 25);
        assert_eq!(view.page(), 1);
        assert_eq!(names(&view)[0], "V25");
    }

    #[test]
    fn sorting_applies_after_filter() {
        let mut view = ready_view(
            vec![
                record("B", Some("Acme")),
                record("C", Some("Zenith")),
                record("A", Some("Acme")),
            ],
            10,
        );
        view.set_filter(FilterField::Organization, "acme");
        view.toggle_sort(Column::Vehicle);
        assert_eq!(names(&view), vec!["A", "B"]);
        view.toggle_sort(Column::Vehicle);
        assert_eq!(
            view.sort(),
            Some(SortState {
                column: Column::Vehicle,
                direction: Direction::Descending
            })
        );
        assert_eq!(names(&view), vec!["B", "A"]);
        view.toggle_sort(Column::Vehicle);
        assert_eq!(view.sort(), None);
        assert_eq!(names(&view), vec!["B", "A"]);
    }

    #[test]
    fn sort_and_paging_wait_for_ready() {
        let mut view = TableView::on_create(&TVConfig::default().with_page_size(2));
        view.load(vec![record("B", None), record("A", None), record("C", None)]);
        view.toggle_sort(Column::Vehicle);
        assert_eq!(view.sort(), None);
        assert_eq!(names(&view), vec!["B", "A", "C"]);

        view.on_ready();
        assert_eq!(names(&view), vec!["B", "A"]);
        view.toggle_sort(Column::Vehicle);
        assert_eq!(names(&view), vec!["A", "B"]);
    }

    #[test]
    fn initial_filter_applies_on_load() {
        let config = TVConfig::default()
            .with_initial_filter(FilterState::default().with(FilterField::Global, "acme"));
        let mut view = TableView::on_create(&config);
        view.on_ready();
        view.load(vec![record("1", Some("Acme")), record("2", None)]);
        assert_eq!(names(&view), vec!["1"]);
    }

    #[test]
    fn failure_is_an_explicit_state() {
        let mut view = TableView::on_create(&TVConfig::default());
        view.fail(&TVError::FileNotFound);
        assert!(matches!(view.state(), ViewState::Failed(_)));

        view.load(vec![record("1", None)]);
        assert_eq!(view.state(), &ViewState::Loaded);

        view.fail(&TVError::FileNotFound);
        assert_eq!(view.state(), &ViewState::Loaded);
        assert_eq!(view.visible().len(), 1);
    }

    #[test]
    fn reload_replaces_whole_set() {
        let mut view = ready_view(vec![record("1", Some("Acme"))], 10);
        let mut other = record("2", Some("Zenith"));
        other.vehicle.department = Some(Named::new("Ops"));
        view.load(vec![other]);
        assert_eq!(names(&view), vec!["2"]);
        assert_eq!(view.facets().organizations, vec!["Zenith"]);
        assert_eq!(view.facets().departments, vec!["Ops"]);
    }

    #[test]
    fn disposed_view_ignores_everything() {
        let mut view = ready_view(numbered(3), 10);
        view.on_dispose();
        assert_eq!(view.state(), &ViewState::Destroyed);
        view.load(numbered(5));
        view.set_filter(FilterField::Global, "x");
        view.on_ready();
        assert_eq!(view.state(), &ViewState::Destroyed);
        assert!(view.visible().is_empty());
        assert_eq!(view.filter(), &FilterState::default());
    }

    #[test]
    fn selection_stays_inside_page() {
        let mut view = ready_view(numbered(3), 2);
        view.move_selection_down();
        view.move_selection_down();
        assert_eq!(view.curser_row, 1);
        assert_eq!(view.selected_record().and_then(|r| r.vehicle_name()), Some("V01"));
        view.next_page();
        assert_eq!(view.curser_row, 0);
        assert_eq!(view.selected_position(), 2);
        for _ in 0..10 {
            view.move_selection_right();
        }
        assert_eq!(view.selected_column(), Column::Drivers);
    }

    #[test]
    fn loader_subscription_feeds_the_view() {
        let mut view = TableView::on_create(&TVConfig::default());
        view.on_ready();
        let loader = Loader::spawn(Arc::new(StaticSource(numbered(4))));
        view.subscribe(loader, "static");
        let mut event = None;
        for _ in 0..500 {
            event = view.poll_loader();
            if event.is_some() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        match event {
            Some(LoadEvent::Loaded { records, .. }) => view.load(records),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(view.visible().len(), 4);
        assert!(!view.is_loading());
    }

    #[test]
    fn dispose_before_load_drops_subscription() {
        let mut view = TableView::on_create(&TVConfig::default());
        view.subscribe(
            Loader::spawn(Arc::new(StaticSource(numbered(4)))),
            "static",
        );
        view.on_dispose();
        assert!(view.poll_loader().is_none());
        assert!(!view.is_loading());
    }
}
