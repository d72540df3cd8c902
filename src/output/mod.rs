//! Output formatting module.
//!
//! Provides formatters for plain text, JSON, and CSV output of probe runs,
//! plus the themed building blocks used by the interactive menu.

mod csv_format;
mod json_format;
mod plain;
mod theme;

pub use csv_format::write_csv;
pub use json_format::write_json;
pub use plain::{
    banner_lines, center, print_error, print_success, print_warning, ratio_cells,
    write_banner, write_failure, write_header, write_menu, write_message, write_outcomes,
    write_plain, write_ratio_bar, write_statistics, write_success, RATIO_BAR_WIDTH,
};
pub use theme::{Palette, RenderContext, Theme};

use crate::cli::OutputFormat;
use crate::storage::ProbeRecord;
use std::io::{self, Write};

/// Format and write a run according to the specified format.
pub fn write_results<W: Write>(
    out: &mut W,
    ctx: &RenderContext,
    record: &ProbeRecord,
    format: OutputFormat,
) -> io::Result<()> {
    match format {
        OutputFormat::Plain => write_plain(out, ctx, record),
        OutputFormat::Json => write_json(out, record),
        OutputFormat::Csv => write_csv(out, record),
    }
}

/// Format and print a run to stdout.
pub fn print_results(
    ctx: &RenderContext,
    record: &ProbeRecord,
    format: OutputFormat,
) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_results(&mut out, ctx, record, format)
}
