//! # Equindex Report
//!
//! Document exports over the stored index data: composition as of a date,
//! and the full performance series, to PDF or Excel.
//!
//! Pure read + format. Everything exported here was computed and persisted
//! beforehand; an empty result set is an error and no file is written.

mod error;
mod excel;
mod exporter;
mod format;
mod frame;
mod pdf;

pub use error::ReportError;
pub use exporter::StatsExporter;
pub use format::ReportFormat;
pub use frame::{Cell, Frame};
