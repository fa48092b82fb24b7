//! CLI argument definitions for equindex.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `compute` | Fetch market data and compute the index over a date range |
//! | `report composition` | Export constituent weights as of a date |
//! | `report performance` | Export the full index time series |
//! | `serve` | Run the local dashboard |
//!
//! # Examples
//!
//! ```bash
//! # Compute a month of index values
//! equindex compute --start 2025-01-02 --end 2025-02-07
//!
//! # Same, but offline with synthetic data
//! equindex compute --start 2025-01-02 --end 2025-02-07 --mock
//!
//! # Export reports
//! equindex report performance --format excel
//! equindex report composition --date 2025-01-31 --format pdf
//!
//! # Browse the results
//! equindex serve --port 8080
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Equal-weighted top-100 index tracker
///
/// Fetches daily closes and shares outstanding for a universe of tickers,
/// maintains an equal-weighted index over the top 100 by market cap, and
/// exposes the stored results through reports and a local dashboard.
#[derive(Debug, Parser)]
#[command(
    name = "equindex",
    author,
    version,
    about = "Equal-weighted top-100 index tracker"
)]
pub struct Cli {
    /// Path to the store database file.
    ///
    /// Defaults to `$EQUINDEX_HOME/data/equindex.duckdb`.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch market data and compute index values for a date range.
    ///
    /// Non-trading days and tickers with missing data are skipped and
    /// logged; the run only fails on store or transport-setup errors.
    Compute(ComputeArgs),

    /// Export stored index data to PDF or Excel.
    #[command(subcommand)]
    Report(ReportCommand),

    /// Serve the dashboard on a local port.
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
pub struct ComputeArgs {
    /// First date of the range (YYYY-MM-DD).
    #[arg(long)]
    pub start: String,

    /// Last date of the range, inclusive. Defaults to --start.
    #[arg(long)]
    pub end: Option<String>,

    /// Universe file, one ticker per line.
    ///
    /// Defaults to `$EQUINDEX_HOME/universe.txt`.
    #[arg(long)]
    pub universe: Option<PathBuf>,

    /// Number of constituents selected by market cap.
    #[arg(long, default_value_t = 100)]
    pub top: usize,

    /// Reuse stored quarterly shares instead of refreshing them first.
    #[arg(long, default_value_t = false)]
    pub skip_shares_refresh: bool,

    /// Use deterministic synthetic market data instead of the network.
    #[arg(long, default_value_t = false)]
    pub mock: bool,
}

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    /// Export constituent weights as of a date.
    Composition(CompositionArgs),
    /// Export the full index time series.
    Performance(PerformanceArgs),
}

#[derive(Debug, Args)]
pub struct CompositionArgs {
    /// Date the composition is taken as of (YYYY-MM-DD).
    #[arg(long)]
    pub date: String,

    /// Output format: pdf or excel.
    #[arg(long)]
    pub format: String,

    /// Output file name, without extension.
    #[arg(long, default_value = "index_composition")]
    pub out: String,
}

#[derive(Debug, Args)]
pub struct PerformanceArgs {
    /// Output format: pdf or excel.
    #[arg(long)]
    pub format: String,

    /// Output file name, without extension.
    #[arg(long, default_value = "index_performance")]
    pub out: String,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Local port to bind on 127.0.0.1.
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
}
