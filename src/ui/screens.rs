//! Per-kind record screen state behind the students and teachers tables.

use crate::error::AdminError;
use crate::filter::RecordFilter;
use crate::form::{FormBridge, Submission};
use crate::models::{KindConfig, Record, RecordId};
use crate::store::RecordStore;

/// Progress of the one-time load for a record screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LoadState {
    Idle,
    Loading { ticket: u64 },
    Loaded,
    Failed(String),
}

/// Per-kind record screen: the store, the active filter, the derived visible
/// list, the cursor, and the add/edit form.
pub(crate) struct RecordScreen {
    pub(crate) config: KindConfig,
    pub(crate) store: RecordStore,
    pub(crate) filter: RecordFilter,
    pub(crate) visible: Vec<RecordId>,
    pub(crate) selected: usize,
    pub(crate) form: FormBridge,
    pub(crate) load: LoadState,
}

impl RecordScreen {
    pub(crate) fn new(config: KindConfig) -> Self {
        Self {
            config,
            store: RecordStore::new(),
            filter: RecordFilter::new(),
            visible: Vec::new(),
            selected: 0,
            form: FormBridge::new(),
            load: LoadState::Idle,
        }
    }

    /// Drop everything held in memory, as a page reload would.
    pub(crate) fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }

    /// Recompute the visible list from the store. Called after every change
    /// to the records, the category, or the search term.
    pub(crate) fn apply_filter(&mut self) {
        self.visible = self
            .filter
            .apply(self.store.records())
            .into_iter()
            .map(|record| record.id.clone())
            .collect();
        self.ensure_in_bounds();
    }

    pub(crate) fn visible_records(&self) -> Vec<&Record> {
        self.visible
            .iter()
            .filter_map(|id| self.store.get(id))
            .collect()
    }

    pub(crate) fn current_record(&self) -> Option<&Record> {
        self.visible
            .get(self.selected)
            .and_then(|id| self.store.get(id))
    }

    pub(crate) fn set_search(&mut self, search: String) {
        self.filter.set_search(search);
        self.apply_filter();
    }

    /// Advance the category filter: all → first → ... → last → all.
    pub(crate) fn cycle_category(&mut self) -> Option<String> {
        let values = &self.config.categories;
        let next = match self.filter.category() {
            None => values.first().cloned(),
            Some(current) => values
                .iter()
                .position(|value| value == current)
                .and_then(|idx| values.get(idx + 1))
                .cloned(),
        };
        self.filter.set_category(next.clone());
        self.apply_filter();
        next
    }

    pub(crate) fn clear_category(&mut self) {
        self.filter.clear_category();
        self.apply_filter();
    }

    /// Mark a load as in flight. Only one load may run at a time.
    pub(crate) fn begin_load(&mut self, ticket: u64) -> Result<(), AdminError> {
        if matches!(self.load, LoadState::Loading { .. }) {
            return Err(AdminError::Busy);
        }
        self.load = LoadState::Loading { ticket };
        Ok(())
    }

    pub(crate) fn is_loading(&self) -> bool {
        matches!(self.load, LoadState::Loading { .. })
    }

    /// Apply a load result. Returns `None` when the result belongs to a
    /// request this screen no longer waits for.
    pub(crate) fn finish_load(
        &mut self,
        ticket: u64,
        result: Result<Vec<Record>, AdminError>,
    ) -> Option<Result<usize, AdminError>> {
        if self.load != (LoadState::Loading { ticket }) {
            return None;
        }
        let outcome = match result {
            Ok(records) => {
                self.store.load(records);
                self.load = LoadState::Loaded;
                Ok(self.store.len())
            }
            Err(err) => {
                self.store.load(Vec::new());
                self.load = LoadState::Failed(err.to_string());
                Err(err)
            }
        };
        self.apply_filter();
        Some(outcome)
    }

    pub(crate) fn submit_form(&mut self) -> Result<Submission, AdminError> {
        let submission = self.form.submit(&mut self.store, &self.config)?;
        self.apply_filter();
        self.focus(&submission.record().id);
        Ok(submission)
    }

    pub(crate) fn delete(&mut self, id: RecordId) -> Result<Record, AdminError> {
        let removed = self.store.delete(id)?;
        self.apply_filter();
        Ok(removed)
    }

    /// Move the cursor onto `id` if it is visible.
    pub(crate) fn focus(&mut self, id: &RecordId) {
        if let Some(idx) = self.visible.iter().position(|visible| visible == id) {
            self.selected = idx;
        }
    }

    pub(crate) fn move_selection(&mut self, offset: isize) {
        if self.visible.is_empty() {
            return;
        }
        let len = self.visible.len() as isize;
        let new = (self.selected as isize + offset).clamp(0, len - 1);
        self.selected = new as usize;
    }

    pub(crate) fn select_first(&mut self) {
        self.selected = 0;
    }

    pub(crate) fn select_last(&mut self) {
        self.selected = self.visible.len().saturating_sub(1);
    }

    pub(crate) fn ensure_in_bounds(&mut self) {
        if self.visible.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.visible.len() {
            self.selected = self.visible.len() - 1;
        }
    }
}
