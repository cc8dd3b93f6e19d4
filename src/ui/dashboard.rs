use eframe::egui::{ScrollArea, Slider, Ui};

use crate::data::aggregate::SummaryMetrics;
use crate::data::filter::{SortKey, TOP_N_MAX, TOP_N_MIN};
use crate::state::AppState;
use crate::ui::{charts, tables};

// ---------------------------------------------------------------------------
// Central panel: tables, charts and metrics for the filtered listings
// ---------------------------------------------------------------------------

pub fn central_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Tiger Auto - Car Price Estimator");

    let (Some(outcome), Some(views)) = (&state.outcome, &state.views) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a file to explore listings  (File → Open…)");
        });
        return;
    };

    let mut top_n = state.selection.top_n;
    let mut sort_key = state.selection.sort_key;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.add_space(8.0);
            ui.heading("Filtered Cars");
            tables::listings_table(ui, &outcome.table);

            ui.separator();
            ui.heading("Popularity Score by Car Brand");
            charts::brand_popularity(ui, &views.brand_popularity);

            ui.separator();
            ui.heading("MSRP Distribution");
            charts::price_histogram(ui, &views.price_histogram);

            ui.separator();
            ui.heading("Price Ranges by Market Category");
            charts::category_boxes(ui, &views.category_boxes);

            ui.separator();
            ui.heading("Summary Statistics for Filtered Cars");
            metric_cards(ui, &views.summary);

            ui.separator();
            ui.heading("Top Cars by Popularity or Price");
            ui.add(Slider::new(&mut top_n, TOP_N_MIN..=TOP_N_MAX).text("Select top N cars"));
            ui.horizontal(|ui: &mut Ui| {
                ui.label("Sort by:");
                for key in SortKey::ALL {
                    ui.radio_value(&mut sort_key, key, key.label());
                }
            });
            tables::ranking_table(ui, &views.top);
        });

    if top_n != state.selection.top_n {
        state.set_top_n(top_n);
    }
    if sort_key != state.selection.sort_key {
        state.set_sort_key(sort_key);
    }
}

fn metric_cards(ui: &mut Ui, summary: &SummaryMetrics) {
    ui.columns(5, |cols: &mut [Ui]| {
        for (col, (label, value)) in cols.iter_mut().zip(summary.cards()) {
            col.vertical(|ui: &mut Ui| {
                ui.label(label);
                ui.heading(value);
            });
        }
    });
}
