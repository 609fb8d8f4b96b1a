use std::path::PathBuf;

use clap::Parser;

/// Runs the cattle telemetry behavioral reconstruction core over a day's
/// raw records and prints the resulting `DayResult` as JSON.
#[derive(Debug, Parser)]
#[command(name = "pastvina", version, about)]
pub struct Cli {
    /// JSON file or directory of JSON files, each a `RawRecord` array.
    #[arg(short = 'i', long = "input", value_name = "FILE_OR_DIR")]
    pub input: PathBuf,

    /// TOML file overriding any `EngineConfig` threshold.
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the resulting `DayResult` JSON here instead of stdout.
    #[arg(short = 'o', long = "out", value_name = "FILE")]
    pub out: Option<PathBuf>,

    /// Date label attached to the result (`ddmmyy`).
    #[arg(long = "date")]
    pub date_str: Option<String>,

    /// Dataset label for diagnostics.
    #[arg(long = "dataset")]
    pub dataset_name: Option<String>,

    /// Suppress per-phase progress logging.
    #[arg(short = 'q', long = "quiet", action = clap::ArgAction::SetTrue)]
    pub quiet: bool,
}
