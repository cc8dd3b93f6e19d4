use std::path::Path;

use crate::data::aggregate::DashboardViews;
use crate::data::filter::{self, FilterOutcome, FilterSelection, SortKey, TOP_N_MAX, TOP_N_MIN};
use crate::data::loader;
use crate::data::model::{CategoricalField, Dataset, Table};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Loaded dataset (None until a file is loaded).
    pub dataset: Option<Dataset>,

    /// What the user picked in the sidebar and ranking controls.
    pub selection: FilterSelection,

    /// Filtered table and cascaded option lists from the last run.
    pub outcome: Option<FilterOutcome>,

    /// Charts, tables and metrics derived from `outcome`.
    pub views: Option<DashboardViews>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    /// Ingest a newly loaded dataset with a fresh selection.
    pub fn set_dataset(&mut self, dataset: Dataset) {
        if dataset.is_empty() {
            log::warn!("Loaded dataset has no listings");
        }
        self.selection = FilterSelection::default();
        self.outcome = None;
        self.dataset = Some(dataset);
        self.status_message = None;
        self.refresh();
    }

    /// Load `path` and make it the current dataset.
    pub fn load_path(&mut self, path: &Path) -> anyhow::Result<()> {
        let dataset = loader::load_file(path)?;
        self.set_dataset(dataset);
        Ok(())
    }

    /// Re-run the filter pipeline and every view from scratch. Controls whose
    /// options moved since the last run fall back to their defaults.
    pub fn refresh(&mut self) {
        let Some(ds) = &self.dataset else {
            return;
        };
        let previous = self.outcome.as_ref().map(|o| &o.options);
        let outcome = filter::apply_tracking(&Table::full(ds), &mut self.selection, previous);
        let views =
            DashboardViews::compute(&outcome.table, self.selection.sort_key, self.selection.top_n);
        if outcome.table.is_empty() {
            log::debug!("No listings pass the filters");
        } else {
            log::debug!("{} of {} listings pass the filters", outcome.table.len(), ds.len());
        }

        self.outcome = Some(outcome);
        self.views = Some(views);
    }

    /// Options currently offered for `field`.
    pub fn options(&self, field: CategoricalField) -> &[String] {
        self.outcome
            .as_ref()
            .map(|o| o.options.for_field(field))
            .unwrap_or_default()
    }

    /// Toggle a single value in a multi-select control.
    pub fn toggle_filter_value(&mut self, field: CategoricalField, value: &str) {
        let options = self.options(field).to_vec();
        self.selection.choice_mut(field).toggle(value, &options);
        self.refresh();
    }

    /// Select every option of a control.
    pub fn select_all(&mut self, field: CategoricalField) {
        *self.selection.choice_mut(field) = filter::Choice::All;
        self.refresh();
    }

    /// Deselect every option of a control.
    pub fn select_none(&mut self, field: CategoricalField) {
        self.selection.choice_mut(field).select_none();
        self.refresh();
    }

    pub fn set_year_range(&mut self, range: Option<(i32, i32)>) {
        self.selection.year_range = range;
        self.refresh();
    }

    pub fn set_top_n(&mut self, n: usize) {
        self.selection.top_n = n.clamp(TOP_N_MIN, TOP_N_MAX);
        self.refresh();
    }

    pub fn set_sort_key(&mut self, key: SortKey) {
        self.selection.sort_key = key;
        self.refresh();
    }

    /// Number of (visible, total) listings.
    pub fn counts(&self) -> Option<(usize, usize)> {
        let ds = self.dataset.as_ref()?;
        let visible = self.outcome.as_ref().map_or(0, |o| o.table.len());
        Some((visible, ds.len()))
    }
}
