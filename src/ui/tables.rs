use eframe::egui::{Align, Layout, Ui};
use egui_extras::{Column, TableBuilder};

use crate::data::aggregate::RankedListing;
use crate::data::model::{
    Table, ALL_COLUMNS, COL_ENGINE_HP, COL_MAKE, COL_MODEL, COL_MSRP, COL_POPULARITY, COL_YEAR,
};

const ROW_HEIGHT: f32 = 18.0;
const HEADER_HEIGHT: f32 = 22.0;

fn table_builder(ui: &mut Ui, n_columns: usize, max_height: f32) -> TableBuilder<'_> {
    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(Layout::left_to_right(Align::Center))
        .column(Column::auto().at_least(40.0))
        .columns(Column::auto().at_least(60.0), n_columns)
        .min_scrolled_height(0.0)
        .max_scroll_height(max_height)
}

/// Every column of every listing that passes the filters.
pub fn listings_table(ui: &mut Ui, table: &Table) {
    ui.push_id("listings_table", |ui: &mut Ui| {
        table_builder(ui, ALL_COLUMNS.len(), 360.0)
            .header(HEADER_HEIGHT, |mut header| {
                header.col(|ui| {
                    ui.strong("#");
                });
                for name in ALL_COLUMNS {
                    header.col(|ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, table.len(), |mut row| {
                    let i = row.index();
                    let Some(listing) = table.get(i) else {
                        return;
                    };
                    row.col(|ui| {
                        ui.label(i.to_string());
                    });
                    for name in ALL_COLUMNS {
                        row.col(|ui| {
                            ui.label(listing.cell(name));
                        });
                    }
                });
            });
    });
}

/// Header labels of the ranking table.
pub const RANKING_COLUMNS: [&str; 6] =
    [COL_MAKE, COL_MODEL, COL_YEAR, COL_MSRP, COL_ENGINE_HP, COL_POPULARITY];

/// Cell text for one ranked row, in [`RANKING_COLUMNS`] order.
pub fn ranking_cells(r: &RankedListing) -> [String; 6] {
    fn num(v: Option<f64>) -> String {
        v.map(|v| format!("{v}")).unwrap_or_default()
    }
    [
        r.make.clone().unwrap_or_default(),
        r.model.clone().unwrap_or_default(),
        r.year.map(|y| y.to_string()).unwrap_or_default(),
        num(r.msrp),
        num(r.engine_hp),
        num(r.popularity),
    ]
}

/// The top-N ranking, numbered from 0 like the listings table.
pub fn ranking_table(ui: &mut Ui, rows: &[RankedListing]) {
    ui.push_id("ranking_table", |ui: &mut Ui| {
        table_builder(ui, RANKING_COLUMNS.len(), 420.0)
            .header(HEADER_HEIGHT, |mut header| {
                header.col(|ui| {
                    ui.strong("#");
                });
                for name in RANKING_COLUMNS {
                    header.col(|ui| {
                        ui.strong(name);
                    });
                }
            })
            .body(|body| {
                body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                    let i = row.index();
                    row.col(|ui| {
                        ui.label(i.to_string());
                    });
                    for cell in ranking_cells(&rows[i]) {
                        row.col(|ui| {
                            ui.label(cell);
                        });
                    }
                });
            });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranking_cells_blank_missing_values() {
        let r = RankedListing {
            make: Some("Audi".into()),
            model: Some("R8".into()),
            year: Some(2016),
            msrp: Some(162900.0),
            engine_hp: None,
            popularity: Some(3105.0),
        };
        assert_eq!(
            ranking_cells(&r),
            ["Audi", "R8", "2016", "162900", "", "3105"].map(String::from)
        );
    }
}
