//! Load subcommand implementation.
//!
//! Prints a saved report exactly as it was written.

use crate::cli::AppContext;
use crate::error::CliResult;
use crate::output;
use crate::storage::ReportStore;
use clap::Parser;
use std::io::{self, Write};

/// Print a previously saved report.
#[derive(Parser, Debug)]
pub struct LoadCommand {
    /// Report file name, relative to the report directory
    #[arg(value_name = "FILE")]
    pub file: String,
}

impl LoadCommand {
    /// Execute the load command.
    pub fn execute(&self, app: &AppContext) -> CliResult<()> {
        let content = app.store().load(&self.file)?;

        let stdout = io::stdout();
        let mut out = stdout.lock();
        if !app.quiet {
            output::write_banner(&mut out, &app.render, "Saved ping results")?;
        }
        out.write_all(content.as_bytes())?;
        out.flush()?;
        Ok(())
    }
}
