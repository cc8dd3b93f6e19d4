use std::collections::BTreeSet;

use super::model::{CategoricalField, Table};

/// Smallest / largest / default number of rows in the top-N ranking.
pub const TOP_N_MIN: usize = 5;
pub const TOP_N_MAX: usize = 20;
pub const TOP_N_DEFAULT: usize = 10;

// ---------------------------------------------------------------------------
// Choice – the state of one multi-select control
// ---------------------------------------------------------------------------

/// Which values of a categorical field are selected.
///
/// `All` tracks whatever options the cascade currently offers, so a fresh
/// selection keeps selecting everything as upstream filters change.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Choice {
    #[default]
    All,
    Only(BTreeSet<String>),
}

impl Choice {
    /// Whether a row value passes this choice. Nulls never pass.
    pub fn admits(&self, value: Option<&str>) -> bool {
        match (self, value) {
            (_, None) => false,
            (Choice::All, Some(_)) => true,
            (Choice::Only(selected), Some(v)) => selected.contains(v),
        }
    }

    /// Whether `value` is shown as ticked in the control.
    pub fn is_selected(&self, value: &str) -> bool {
        self.admits(Some(value))
    }

    /// Number of `options` currently ticked.
    pub fn count_selected(&self, options: &[String]) -> usize {
        options.iter().filter(|o| self.is_selected(o)).count()
    }

    /// Flip a single value. Leaving `All` materialises the current options.
    pub fn toggle(&mut self, value: &str, options: &[String]) {
        if let Choice::All = self {
            *self = Choice::Only(options.iter().cloned().collect());
        }
        if let Choice::Only(selected) = self {
            if !selected.remove(value) {
                selected.insert(value.to_string());
            }
        }
    }

    pub fn select_none(&mut self) {
        *self = Choice::Only(BTreeSet::new());
    }
}

// ---------------------------------------------------------------------------
// Sort key for the ranking view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Popularity,
    Msrp,
}

impl SortKey {
    pub const ALL: [SortKey; 2] = [SortKey::Popularity, SortKey::Msrp];

    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Popularity => "Popularity",
            SortKey::Msrp => "MSRP",
        }
    }
}

// ---------------------------------------------------------------------------
// FilterSelection – everything the user picked in the controls
// ---------------------------------------------------------------------------

/// Per-session control state, passed explicitly into the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSelection {
    pub makes: Choice,
    pub models: Choice,
    pub transmissions: Choice,
    pub fuel_types: Choice,
    /// Inclusive year bounds; `None` means the full range present.
    pub year_range: Option<(i32, i32)>,
    pub top_n: usize,
    pub sort_key: SortKey,
}

impl Default for FilterSelection {
    fn default() -> Self {
        Self {
            makes: Choice::All,
            models: Choice::All,
            transmissions: Choice::All,
            fuel_types: Choice::All,
            year_range: None,
            top_n: TOP_N_DEFAULT,
            sort_key: SortKey::default(),
        }
    }
}

impl FilterSelection {
    pub fn choice(&self, field: CategoricalField) -> &Choice {
        match field {
            CategoricalField::Make => &self.makes,
            CategoricalField::Model => &self.models,
            CategoricalField::Transmission => &self.transmissions,
            CategoricalField::FuelType => &self.fuel_types,
        }
    }

    pub fn choice_mut(&mut self, field: CategoricalField) -> &mut Choice {
        match field {
            CategoricalField::Make => &mut self.makes,
            CategoricalField::Model => &mut self.models,
            CategoricalField::Transmission => &mut self.transmissions,
            CategoricalField::FuelType => &mut self.fuel_types,
        }
    }

    /// Put `field`, every later control and the year range back to their
    /// defaults.
    pub fn reset_from(&mut self, field: CategoricalField) {
        for later in CategoricalField::CASCADE.into_iter().skip_while(|&f| f != field) {
            *self.choice_mut(later) = Choice::All;
        }
        self.year_range = None;
    }
}

// ---------------------------------------------------------------------------
// Pipeline steps
// ---------------------------------------------------------------------------

/// Inclusive min/max Year present in a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearBounds {
    pub min: i32,
    pub max: i32,
}

impl YearBounds {
    /// Clamp a requested range into these bounds. The result may be reversed
    /// (lo > hi), in which case no row matches.
    pub fn clamp(&self, (lo, hi): (i32, i32)) -> (i32, i32) {
        (lo.max(self.min), hi.min(self.max))
    }
}

/// Sorted, unique, non-null values of `field` in `table`.
pub fn distinct_values(table: &Table, field: CategoricalField) -> Vec<String> {
    table
        .iter()
        .filter_map(|l| field.value(l))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Keep rows whose `field` value is admitted by `choice`.
pub fn narrow(table: &Table, field: CategoricalField, choice: &Choice) -> Table {
    table.narrow(|l| choice.admits(field.value(l)))
}

/// Min/max non-null Year, `None` for a table without years.
pub fn year_bounds(table: &Table) -> Option<YearBounds> {
    let mut years = table.iter().filter_map(|l| l.year);
    let first = years.next()?;
    let (min, max) = years.fold((first, first), |(lo, hi), y| (lo.min(y), hi.max(y)));
    Some(YearBounds { min, max })
}

/// Keep rows whose Year lies in `range` (clamped to `bounds`), inclusive.
pub fn narrow_years(table: &Table, range: Option<(i32, i32)>, bounds: Option<YearBounds>) -> Table {
    let Some(bounds) = bounds else {
        return table.narrow(|_| false);
    };
    let (lo, hi) = bounds.clamp(range.unwrap_or((bounds.min, bounds.max)));
    table.narrow(|l| l.year.is_some_and(|y| lo <= y && y <= hi))
}

// ---------------------------------------------------------------------------
// Full cascade
// ---------------------------------------------------------------------------

/// Options offered by each control, computed from the rows that survived
/// every preceding step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOptions {
    pub makes: Vec<String>,
    pub models: Vec<String>,
    pub transmissions: Vec<String>,
    pub fuel_types: Vec<String>,
    pub years: Option<YearBounds>,
}

impl FilterOptions {
    pub fn for_field(&self, field: CategoricalField) -> &[String] {
        match field {
            CategoricalField::Make => &self.makes,
            CategoricalField::Model => &self.models,
            CategoricalField::Transmission => &self.transmissions,
            CategoricalField::FuelType => &self.fuel_types,
        }
    }

    fn for_field_mut(&mut self, field: CategoricalField) -> &mut Vec<String> {
        match field {
            CategoricalField::Make => &mut self.makes,
            CategoricalField::Model => &mut self.models,
            CategoricalField::Transmission => &mut self.transmissions,
            CategoricalField::FuelType => &mut self.fuel_types,
        }
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub table: Table,
    pub options: FilterOptions,
}

/// Run Make → Model → Transmission → Fuel → Year over `table`.
///
/// Each step derives its option list from the previous step's output, then
/// narrows by the user's choice for that field.
pub fn apply(table: &Table, selection: &FilterSelection) -> FilterOutcome {
    let mut options = FilterOptions::default();
    let mut current = table.clone();

    for field in CategoricalField::CASCADE {
        *options.for_field_mut(field) = distinct_values(&current, field);
        current = narrow(&current, field, selection.choice(field));
        log::debug!("{field}: {} options, {} rows left", options.for_field(field).len(), current.len());
    }

    options.years = year_bounds(&current);
    let table = narrow_years(&current, selection.year_range, options.years);

    FilterOutcome { table, options }
}

/// Like [`apply`], but a control whose option list moved since `previous`
/// is reset together with everything after it.
pub fn apply_tracking(
    table: &Table,
    selection: &mut FilterSelection,
    previous: Option<&FilterOptions>,
) -> FilterOutcome {
    let outcome = apply(table, selection);
    let Some(previous) = previous else {
        return outcome;
    };

    let moved = CategoricalField::CASCADE
        .into_iter()
        .find(|&f| previous.for_field(f) != outcome.options.for_field(f));
    if let Some(field) = moved {
        log::debug!("{field} options changed, resetting it and later filters");
        selection.reset_from(field);
        return apply(table, selection);
    }
    if previous.years != outcome.options.years && selection.year_range.is_some() {
        log::debug!("Year bounds changed, resetting year range");
        selection.year_range = None;
        return apply(table, selection);
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::*;
    use crate::data::model::{Dataset, Listing};

    fn only(values: &[&str]) -> Choice {
        Choice::Only(values.iter().map(|v| v.to_string()).collect())
    }

    #[test]
    fn default_selection_is_identity() {
        let ds = sample_dataset();
        let full = Table::full(&ds);
        let out = apply(&full, &FilterSelection::default());

        assert_eq!(out.table, full);
        assert_eq!(out.options.makes, vec!["Audi", "BMW", "Honda", "Tesla"]);
        assert_eq!(out.options.years, Some(YearBounds { min: 2009, max: 2017 }));
    }

    #[test]
    fn model_options_follow_selected_makes() {
        let ds = sample_dataset();
        let selection = FilterSelection {
            makes: only(&["Honda", "Tesla"]),
            ..Default::default()
        };
        let out = apply(&Table::full(&ds), &selection);

        assert_eq!(out.options.makes.len(), 4);
        assert_eq!(out.options.models, vec!["Accord", "Civic", "Model S"]);
        assert_eq!(
            out.options.transmissions,
            vec!["AUTOMATIC", "DIRECT_DRIVE", "MANUAL"]
        );
        assert_eq!(out.table.row_indices(), &[4, 5, 6]);
    }

    #[test]
    fn transmission_options_follow_selected_models() {
        let ds = sample_dataset();
        let selection = FilterSelection {
            models: only(&["Civic", "M3"]),
            ..Default::default()
        };
        let out = apply(&Table::full(&ds), &selection);

        assert_eq!(out.options.transmissions, vec!["AUTOMATIC", "MANUAL"]);
        assert_eq!(
            out.options.fuel_types,
            vec!["premium unleaded (required)", "regular unleaded"]
        );
        assert_eq!(out.options.years, Some(YearBounds { min: 2015, max: 2017 }));
    }

    #[test]
    fn year_range_is_inclusive_and_clamped() {
        let ds = sample_dataset();
        let selection = FilterSelection {
            year_range: Some((1990, 2014)),
            ..Default::default()
        };
        let out = apply(&Table::full(&ds), &selection);
        assert_eq!(out.table.row_indices(), &[0, 2, 5]);

        let reversed = FilterSelection {
            year_range: Some((2016, 2011)),
            ..Default::default()
        };
        assert!(apply(&Table::full(&ds), &reversed).table.is_empty());
    }

    #[test]
    fn empty_choice_empties_every_later_step() {
        let ds = sample_dataset();
        let mut selection = FilterSelection::default();
        selection.makes.select_none();
        let out = apply(&Table::full(&ds), &selection);

        assert!(out.table.is_empty());
        assert!(out.options.models.is_empty());
        assert!(out.options.transmissions.is_empty());
        assert!(out.options.fuel_types.is_empty());
        assert_eq!(out.options.years, None);
    }

    #[test]
    fn nulls_are_never_options_nor_matches() {
        let mut rows = vec![listing("Ford", "F-150", 2015, "AUTOMATIC", "flex-fuel", 30000.0, 5657.0)];
        rows.push(Listing {
            make: Some("Ford".into()),
            model: None,
            year: Some(2015),
            ..Default::default()
        });
        rows.push(Listing {
            make: None,
            model: Some("Ghost".into()),
            year: Some(2015),
            ..Default::default()
        });
        let ds = Dataset::from_listings(rows);
        let out = apply(&Table::full(&ds), &FilterSelection::default());

        assert_eq!(out.options.makes, vec!["Ford"]);
        assert_eq!(out.options.models, vec!["F-150"]);
        assert_eq!(out.table.row_indices(), &[0]);
    }

    #[test]
    fn toggle_leaves_all_for_explicit_set() {
        let options: Vec<String> = vec!["A".into(), "B".into(), "C".into()];
        let mut choice = Choice::All;
        choice.toggle("B", &options);
        assert_eq!(choice, only(&["A", "C"]));
        assert_eq!(choice.count_selected(&options), 2);

        choice.toggle("B", &options);
        assert_eq!(choice, only(&["A", "B", "C"]));
    }

    #[test]
    fn reapplying_a_selection_is_a_fixed_point() {
        let ds = sample_dataset();
        let selection = FilterSelection {
            makes: only(&["BMW", "Audi", "Honda"]),
            fuel_types: only(&["premium unleaded (required)", "regular unleaded"]),
            year_range: Some((2010, 2016)),
            ..Default::default()
        };
        let once = apply(&Table::full(&ds), &selection).table;
        let twice = apply(&once, &selection).table;
        assert_eq!(once, twice);
    }

    #[test]
    fn reset_from_clears_field_and_everything_after() {
        let mut selection = FilterSelection {
            makes: only(&["BMW"]),
            models: only(&["M3"]),
            fuel_types: only(&["electric"]),
            year_range: Some((2010, 2012)),
            top_n: 7,
            ..Default::default()
        };
        selection.reset_from(CategoricalField::Model);

        assert_eq!(selection.makes, only(&["BMW"]));
        assert_eq!(selection.models, Choice::All);
        assert_eq!(selection.fuel_types, Choice::All);
        assert_eq!(selection.year_range, None);
        assert_eq!(selection.top_n, 7);
    }

    #[test]
    fn moved_options_reset_stale_downstream_choices() {
        let ds = sample_dataset();
        let full = Table::full(&ds);
        let mut selection = FilterSelection {
            makes: only(&["Audi", "BMW", "Honda"]),
            models: only(&["1 Series", "A4", "R8", "Civic", "Accord"]),
            ..Default::default()
        };
        let before = apply(&full, &selection).options;

        selection.makes = Choice::All;
        let out = apply_tracking(&full, &mut selection, Some(&before));

        assert_eq!(selection.models, Choice::All);
        assert_eq!(out.table, full);
    }

    #[test]
    fn unchanged_options_keep_downstream_choices() {
        let ds = sample_dataset();
        let full = Table::full(&ds);
        let mut selection = FilterSelection {
            models: only(&["Civic", "Accord"]),
            ..Default::default()
        };
        let before = apply(&full, &selection).options;

        selection.fuel_types = only(&["regular unleaded"]);
        let out = apply_tracking(&full, &mut selection, Some(&before));

        assert_eq!(selection.models, only(&["Civic", "Accord"]));
        assert_eq!(out.table.row_indices(), &[4, 5]);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        const MAKES: [&str; 3] = ["Audi", "BMW", "Kia"];
        const MODELS: [&str; 4] = ["A", "B", "C", "D"];
        const GEARS: [&str; 2] = ["MANUAL", "AUTOMATIC"];
        const FUELS: [&str; 2] = ["diesel", "electric"];

        fn arb_listing() -> impl Strategy<Value = Listing> {
            (
                proptest::option::of(0..MAKES.len()),
                proptest::option::of(0..MODELS.len()),
                proptest::option::of(1990..2020i32),
                0..GEARS.len(),
                0..FUELS.len(),
            )
                .prop_map(|(make, model, year, gear, fuel)| Listing {
                    make: make.map(|i| MAKES[i].to_string()),
                    model: model.map(|i| MODELS[i].to_string()),
                    year,
                    transmission: Some(GEARS[gear].to_string()),
                    fuel_type: Some(FUELS[fuel].to_string()),
                    ..Default::default()
                })
        }

        fn arb_choice(universe: &'static [&'static str]) -> impl Strategy<Value = Choice> {
            prop_oneof![
                Just(Choice::All),
                proptest::sample::subsequence(universe.to_vec(), 0..=universe.len()).prop_map(
                    |vals| Choice::Only(vals.into_iter().map(str::to_string).collect())
                ),
            ]
        }

        fn arb_selection() -> impl Strategy<Value = FilterSelection> {
            (
                arb_choice(&MAKES),
                arb_choice(&MODELS),
                arb_choice(&GEARS),
                arb_choice(&FUELS),
                proptest::option::of((1985..2025i32, 1985..2025i32)),
            )
                .prop_map(|(makes, models, transmissions, fuel_types, year_range)| {
                    FilterSelection {
                        makes,
                        models,
                        transmissions,
                        fuel_types,
                        year_range,
                        ..Default::default()
                    }
                })
        }

        proptest! {
            #[test]
            fn filtered_rows_are_a_subset_without_duplicates(
                rows in proptest::collection::vec(arb_listing(), 0..40),
                selection in arb_selection(),
            ) {
                let ds = Dataset::from_listings(rows);
                let out = apply(&Table::full(&ds), &selection).table;
                let idx = out.row_indices();
                prop_assert!(idx.windows(2).all(|w| w[0] < w[1]));
                prop_assert!(idx.iter().all(|&i| i < ds.len()));
            }

            #[test]
            fn model_options_are_models_of_selected_makes(
                rows in proptest::collection::vec(arb_listing(), 0..40),
                makes in arb_choice(&MAKES),
            ) {
                let ds = Dataset::from_listings(rows);
                let selection = FilterSelection { makes: makes.clone(), ..Default::default() };
                let out = apply(&Table::full(&ds), &selection);

                let expected: BTreeSet<String> = ds
                    .iter()
                    .filter(|l| makes.admits(l.make.as_deref()))
                    .filter_map(|l| l.model.clone())
                    .collect();
                prop_assert_eq!(out.options.models, expected.into_iter().collect::<Vec<_>>());
            }

            #[test]
            fn filtering_is_idempotent(
                rows in proptest::collection::vec(arb_listing(), 0..40),
                selection in arb_selection(),
            ) {
                let ds = Dataset::from_listings(rows);
                let once = apply(&Table::full(&ds), &selection).table;
                let twice = apply(&once, &selection).table;
                prop_assert_eq!(once, twice);
            }
        }
    }
}
