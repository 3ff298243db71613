use chrono::{DateTime, Utc};

use crate::filter::{self, SortKey, ViewFilter};
use crate::model::{EventRecord, RefreshState};
use crate::selection::Selection;

/// The one owner of everything both surfaces share: the latest refresh
/// result, the selection and the list filter. The filtered list is cached
/// here and rebuilt whenever the records or the filter change.
#[derive(Debug)]
pub struct DashboardState {
    refresh: RefreshState,
    selection: Selection,
    filter: ViewFilter,
    visible: Vec<EventRecord>,
    last_success: Option<DateTime<Utc>>,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self {
            refresh: RefreshState::Loading,
            selection: Selection::default(),
            filter: ViewFilter::default(),
            visible: Vec::new(),
            last_success: None,
        }
    }
}

impl DashboardState {
    pub fn refresh_state(&self) -> &RefreshState {
        &self.refresh
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn filter(&self) -> &ViewFilter {
        &self.filter
    }

    /// All records of the current collection, unfiltered. This is what the
    /// map draws.
    pub fn records(&self) -> &[EventRecord] {
        self.refresh.records()
    }

    /// Filtered and sorted records for the list.
    pub fn visible(&self) -> &[EventRecord] {
        &self.visible
    }

    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.last_success
    }

    /// The selected record, if its id is part of the current collection.
    pub fn selected_record(&self) -> Option<&EventRecord> {
        self.selection
            .current()
            .and_then(|id| self.refresh.find(id))
    }

    pub fn begin_refresh(&mut self) {
        self.set_refresh(RefreshState::Loading);
    }

    /// Replace the refresh result wholesale. The selection survives even if
    /// its id disappeared.
    pub fn finish_refresh(&mut self, state: RefreshState) {
        if matches!(state, RefreshState::Ready(_)) {
            self.last_success = Some(Utc::now());
        }
        self.set_refresh(state);
    }

    /// Select by id, ignoring ids the current collection does not contain.
    pub fn select_id(&mut self, id: &str) -> bool {
        match self.refresh.find(id) {
            Some(record) => {
                self.selection.select(record);
                true
            }
            None => false,
        }
    }

    /// Move the selection one row down (`step > 0`) or up in the list.
    /// Without a visible selection the first (or last) row is picked.
    pub fn step_list_selection(&mut self, step: isize) {
        let target = step_index(&self.visible, &self.selection, step);
        if let Some(index) = target {
            let id = self.visible[index].id.clone();
            self.selection.select_id(&id);
        }
    }

    /// Same as [`Self::step_list_selection`] but over the unfiltered
    /// collection in feed order, as the map sees it.
    pub fn step_map_selection(&mut self, step: isize) {
        let records = self.refresh.records();
        let target = step_index(records, &self.selection, step);
        if let Some(index) = target {
            let id = records[index].id.clone();
            self.selection.select_id(&id);
        }
    }

    pub fn set_filter(&mut self, filter: ViewFilter) {
        if filter != self.filter {
            tracing::debug!(
                min_magnitude = filter.min_magnitude,
                sort = filter.sort_key.label(),
                "list filter changed"
            );
            self.filter = filter;
            self.recompute_visible();
        }
    }

    pub fn raise_min_magnitude(&mut self) {
        self.set_filter(self.filter.raised());
    }

    pub fn lower_min_magnitude(&mut self) {
        self.set_filter(self.filter.lowered());
    }

    pub fn set_sort_key(&mut self, sort_key: SortKey) {
        self.set_filter(self.filter.with_sort_key(sort_key));
    }

    /// Row of the selected record in the filtered list, if it is shown.
    pub fn selected_visible_index(&self) -> Option<usize> {
        self.visible
            .iter()
            .position(|record| self.selection.is_selected(record))
    }

    fn set_refresh(&mut self, state: RefreshState) {
        self.refresh = state;
        self.recompute_visible();
    }

    fn recompute_visible(&mut self) {
        self.visible = filter::apply(self.refresh.records(), &self.filter);
    }
}

fn step_index(records: &[EventRecord], selection: &Selection, step: isize) -> Option<usize> {
    if records.is_empty() {
        return None;
    }
    let last = records.len() - 1;
    let current = records
        .iter()
        .position(|record| selection.is_selected(record));

    Some(match current {
        Some(index) if step >= 0 => index.saturating_add(step.unsigned_abs()).min(last),
        Some(index) => index.saturating_sub(step.unsigned_abs()),
        None if step >= 0 => 0,
        None => last,
    })
}
