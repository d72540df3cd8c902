//! Run records and report persistence.
//!
//! A finished run is kept as a [`ProbeRecord`]; saving renders it to a plain
//! text report, and loading reads that text back verbatim for display.

mod record;
mod report;

pub use record::ProbeRecord;
pub use report::{is_valid_filename, render_report, ReportStore, TextReportStore};
