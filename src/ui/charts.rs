use eframe::egui::{Color32, Stroke, Ui};
use egui_plot::{Bar, BarChart, BoxElem, BoxPlot, BoxSpread, GridMark, Plot};

use crate::color::{generate_palette, MAGMA, VIRIDIS};
use crate::data::aggregate::{format_currency, thousands_label, CategoryBox, PriceHistogram, PRICE_CAP};

const ROW_HEIGHT: f32 = 24.0;

/// Height for a chart with one row per category.
fn rows_height(n: usize) -> f32 {
    (n as f32 * ROW_HEIGHT).clamp(220.0, 900.0)
}

/// Tick label for categorical axes where item `i` sits at `n - 1 - i`
/// (first item on top).
fn category_formatter(names: Vec<String>) -> impl Fn(GridMark, &std::ops::RangeInclusive<f64>) -> String {
    move |mark, _range| {
        let pos = mark.value.round();
        if (mark.value - pos).abs() > 1e-6 || pos < 0.0 {
            return String::new();
        }
        let from_top = names.len() as i64 - 1 - pos as i64;
        usize::try_from(from_top)
            .ok()
            .and_then(|i| names.get(i).cloned())
            .unwrap_or_default()
    }
}

fn no_data(ui: &mut Ui) {
    ui.weak("No data for the current filters.");
}

// ---------------------------------------------------------------------------
// Popularity score by brand (horizontal bars)
// ---------------------------------------------------------------------------

pub fn brand_popularity(ui: &mut Ui, popularity: &[(String, f64)]) {
    if popularity.is_empty() {
        no_data(ui);
        return;
    }

    let n = popularity.len();
    let colors = generate_palette(VIRIDIS, n);
    let bars: Vec<Bar> = popularity
        .iter()
        .zip(colors)
        .enumerate()
        .map(|(i, ((make, score), color))| {
            Bar::new((n - 1 - i) as f64, *score)
                .name(make)
                .fill(color)
        })
        .collect();
    let names = popularity.iter().map(|(m, _)| m.clone()).collect();

    Plot::new("brand_popularity")
        .height(rows_height(n))
        .x_axis_label("Popularity Score")
        .y_axis_label("Car Brand")
        .y_axis_formatter(category_formatter(names))
        .include_x(0.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).horizontal().width(0.8));
        });
}

// ---------------------------------------------------------------------------
// MSRP distribution (histogram)
// ---------------------------------------------------------------------------

pub fn price_histogram(ui: &mut Ui, histogram: &PriceHistogram) {
    if histogram.is_empty() {
        no_data(ui);
        return;
    }

    let width = histogram.bin_width();
    let labels = histogram.edge_labels();
    let bars: Vec<Bar> = histogram
        .edges
        .windows(2)
        .zip(labels.windows(2))
        .zip(&histogram.counts)
        .map(|((edge, label), &count)| {
            Bar::new((edge[0] + edge[1]) / 2.0, count as f64)
                .width(width)
                .name(format!("{} – {}", label[0], label[1]))
                .fill(Color32::from_rgb(76, 114, 176))
                .stroke(Stroke::new(1.0, Color32::WHITE))
        })
        .collect();

    Plot::new("price_histogram")
        .height(320.0)
        .x_axis_label("Price (USD)")
        .y_axis_label("Count")
        .x_axis_formatter(|mark, _range| thousands_label(mark.value))
        .include_x(0.0)
        .include_x(PRICE_CAP)
        .include_y(0.0)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars));
        });
}

// ---------------------------------------------------------------------------
// Price ranges by market category (horizontal box plot)
// ---------------------------------------------------------------------------

pub fn category_boxes(ui: &mut Ui, boxes: &[CategoryBox]) {
    if boxes.is_empty() {
        no_data(ui);
        return;
    }

    let n = boxes.len();
    let colors = generate_palette(MAGMA, n);
    let elems: Vec<BoxElem> = boxes
        .iter()
        .zip(colors)
        .enumerate()
        .map(|(i, (b, color))| {
            // Outliers are flagged in the stats but not drawn.
            let spread = BoxSpread::new(b.lower_whisker, b.q1, b.median, b.q3, b.upper_whisker);
            BoxElem::new((n - 1 - i) as f64, spread)
                .name(format!(
                    "{}: {} cars, range {} – {}, {} outliers hidden",
                    b.category,
                    b.count,
                    format_currency(Some(b.min)),
                    format_currency(Some(b.max)),
                    b.outliers
                ))
                .fill(color.gamma_multiply(0.8))
                .stroke(Stroke::new(1.0, Color32::DARK_GRAY))
                .box_width(0.6)
        })
        .collect();
    let names = boxes.iter().map(|b| b.category.clone()).collect();

    Plot::new("category_boxes")
        .height(rows_height(n))
        .x_axis_label("Price (USD)")
        .y_axis_label("Market Category")
        .x_axis_formatter(|mark, _range| format_currency(Some(mark.value)))
        .y_axis_formatter(category_formatter(names))
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.box_plot(BoxPlot::new(elems).horizontal());
        });
}
