use eframe::egui::{self, Color32, RichText, ScrollArea, Slider, Ui};

use crate::data::model::CategoricalField;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – cascading filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
///
/// Controls are drawn in cascade order; each one lists only the options that
/// survive the controls above it.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filter Cars");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for field in CategoricalField::CASCADE {
                multi_select(ui, state, field);
            }
            ui.separator();
            year_range(ui, state);
        });
}

fn multi_select(ui: &mut Ui, state: &mut AppState, field: CategoricalField) {
    // Clone what we need so we can mutate state inside the closures.
    let options = state.options(field).to_vec();
    let choice = state.selection.choice(field).clone();

    let n_selected = choice.count_selected(&options);
    let header_text = format!("Select {}  ({n_selected}/{})", field.label(), options.len());

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(field.column())
        .default_open(field == CategoricalField::Make)
        .show(ui, |ui: &mut Ui| {
            if options.is_empty() {
                ui.weak("No options left");
                return;
            }

            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(field);
                }
                if ui.small_button("None").clicked() {
                    state.select_none(field);
                }
            });

            for value in &options {
                let mut checked = choice.is_selected(value);
                if ui.checkbox(&mut checked, value.as_str()).changed() {
                    state.toggle_filter_value(field, value);
                }
            }
        });
}

fn year_range(ui: &mut Ui, state: &mut AppState) {
    ui.strong("Select Year Range");

    let bounds = state.outcome.as_ref().and_then(|o| o.options.years);
    let Some(bounds) = bounds else {
        ui.weak("No years available");
        return;
    };

    let (mut lo, mut hi) = bounds.clamp(
        state
            .selection
            .year_range
            .unwrap_or((bounds.min, bounds.max)),
    );
    let from = ui.add(Slider::new(&mut lo, bounds.min..=bounds.max).text("From"));
    let to = ui.add(Slider::new(&mut hi, bounds.min..=bounds.max).text("To"));

    if from.changed() || to.changed() {
        // Keep the pair ordered, moving whichever end the user did not drag.
        if lo > hi {
            if from.changed() {
                hi = lo;
            } else {
                lo = hi;
            }
        }
        state.set_year_range(Some((lo, hi)));
    }

    if ui.small_button("Full range").clicked() {
        state.set_year_range(None);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some((visible, total)) = state.counts() {
            ui.label(format!("{total} cars loaded, {visible} match the filters"));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open car listings")
        .add_filter("Supported files", &["parquet", "pq", "json", "csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .add_filter("CSV", &["csv"])
        .pick_file();

    if let Some(path) = file {
        if let Err(e) = state.load_path(&path) {
            log::error!("Failed to load file: {e:#}");
            state.status_message = Some(format!("Error: {e:#}"));
        }
    }
}
