mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use anyhow::Context;
use app::TigerAutoApp;
use clap::Parser;
use eframe::egui;
use state::AppState;

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = config::Cli::parse();

    let mut state = AppState::default();
    if let Some(path) = &cli.data {
        state
            .load_path(path)
            .context("could not open the dataset given on the command line")?;
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([cli.width, cli.height])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Tiger Auto – Car Price Estimator",
        options,
        Box::new(|_cc| Ok(Box::new(TigerAutoApp::new(state)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
