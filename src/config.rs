use std::path::PathBuf;

use clap::Parser;

/// Command line options.
#[derive(Debug, Parser)]
#[command(name = "tiger-auto", version, about = "Interactive car listings dashboard")]
pub struct Cli {
    /// Listings file to open at startup (.parquet, .json or .csv).
    #[arg(value_name = "FILE", env = "TIGER_AUTO_DATA")]
    pub data: Option<PathBuf>,

    /// Initial window width in points.
    #[arg(long, default_value_t = 1400.0)]
    pub width: f32,

    /// Initial window height in points.
    #[arg(long, default_value_t = 900.0)]
    pub height: f32,
}
