//! Interactive menu.
//!
//! Start ping / Load previous results / Change theme / Exit. Failures inside
//! an action are reported and the menu is shown again; closing the input
//! ends the session.

use crate::cli::{execute_run, AppContext, Prompter};
use crate::error::{CliError, CliResult, StorageError};
use crate::output::{self, Theme};
use crate::probe::BoxedTransport;
use crate::storage::{is_valid_filename, ProbeRecord, ReportStore};
use crate::types::{is_valid_host, AttemptCount, Host, PayloadSize};
use std::io::{self, BufRead, Write};
use tracing::debug;

const OPTIONS: [&str; 4] = ["Start ping", "Load previous results", "Change theme", "Exit"];

enum Step {
    Continue,
    Exit,
}

/// Menu session over an input and an output stream.
pub struct Menu<'a, R, W> {
    app: &'a mut AppContext,
    prompter: Prompter<R, W>,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(app: &'a mut AppContext, input: R, output: W) -> Self {
        let palette = app.render.palette().clone();
        Self {
            app,
            prompter: Prompter::new(input, output, palette),
        }
    }

    /// Show the menu until the user exits or input ends.
    ///
    /// `open` is called once per ping to get a fresh transport.
    pub async fn run<F>(&mut self, mut open: F) -> CliResult<()>
    where
        F: FnMut() -> CliResult<BoxedTransport>,
    {
        loop {
            match self.step(&mut open).await {
                Ok(Step::Continue) => {}
                Ok(Step::Exit) => return Ok(()),
                Err(e) if is_eof(&e) => {
                    debug!("Input closed, leaving menu");
                    writeln!(self.prompter.output())?;
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn step<F>(&mut self, open: &mut F) -> CliResult<Step>
    where
        F: FnMut() -> CliResult<BoxedTransport>,
    {
        output::write_header(self.prompter.output(), &self.app.render, "PING PONG")?;
        output::write_menu(self.prompter.output(), &self.app.render, &OPTIONS)?;

        let choice = self.prompter.input("Choose an option")?;
        match choice.trim() {
            "1" => self.start_ping(open).await?,
            "2" => self.load_results()?,
            "3" => self.change_theme()?,
            "4" => {
                self.message("Exiting...")?;
                return Ok(Step::Exit);
            }
            _ => self.failure("Invalid choice!")?,
        }
        Ok(Step::Continue)
    }

    async fn start_ping<F>(&mut self, open: &mut F) -> CliResult<()>
    where
        F: FnMut() -> CliResult<BoxedTransport>,
    {
        output::write_header(self.prompter.output(), &self.app.render, "PING OPERATION")?;

        let host = self.prompter.valid_input(
            "Enter IP address or domain name",
            is_valid_host,
            "Invalid IP address or domain name. Try again.",
        )?;
        let default_attempts = self.app.settings.attempts().get();
        let attempts = self.prompter.number(
            &format!("Number of attempts (default {})", default_attempts),
            AttemptCount::MIN..=u32::MAX,
            default_attempts,
        )?;
        let default_size = self.app.settings.payload_size().get();
        let size = self.prompter.number(
            &format!("Payload size in bytes (default {})", default_size),
            PayloadSize::MIN..=PayloadSize::MAX,
            default_size,
        )?;

        let request = self.app.request(
            Host::parse(&host)?,
            AttemptCount::new(attempts)?,
            PayloadSize::new(size)?,
        );

        let transport = match open() {
            Ok(transport) => transport,
            Err(e) => {
                self.failure(&format!("Cannot start ping: {}", e))?;
                return Ok(());
            }
        };

        output::write_banner(
            self.prompter.output(),
            &self.app.render,
            &format!("Pinging {} with {} bytes of data", host, size),
        )?;
        let record = execute_run(transport.as_ref(), &request, true).await;
        drop(transport);

        output::write_plain(self.prompter.output(), &self.app.render, &record)?;

        writeln!(self.prompter.output())?;
        if self.prompter.yes_no("Save the results?")? {
            self.save_results(&record)?;
        }
        Ok(())
    }

    fn save_results(&mut self, record: &ProbeRecord) -> CliResult<()> {
        let name = self.prompter.valid_input(
            "Enter file name (e.g. pingresults.txt)",
            is_valid_filename,
            "Invalid file name. Try again.",
        )?;
        let store = self.app.store();

        let exists = match store.exists(&name) {
            Ok(exists) => exists,
            Err(e) => {
                self.failure(&format!("Error while saving: {}", e))?;
                return Ok(());
            }
        };
        if exists
            && !self
                .prompter
                .yes_no("A file with this name already exists. Overwrite it?")?
        {
            self.message("Save cancelled.")?;
            return Ok(());
        }

        match store.save(&name, record) {
            Ok(_) => self.success("Results saved.")?,
            Err(e) => self.failure(&format!("Error while saving: {}", e))?,
        }
        Ok(())
    }

    fn load_results(&mut self) -> CliResult<()> {
        output::write_header(self.prompter.output(), &self.app.render, "LOAD RESULTS")?;
        let name = self.prompter.input("Enter file name to load")?;

        match self.app.store().load(&name) {
            Ok(content) => {
                output::write_banner(
                    self.prompter.output(),
                    &self.app.render,
                    "Saved ping results",
                )?;
                let out = self.prompter.output();
                out.write_all(content.as_bytes())?;
                if !content.ends_with('\n') {
                    writeln!(out)?;
                }
            }
            Err(StorageError::ReportNotFound(_)) => self.failure("File not found.")?,
            Err(e) => self.failure(&format!("Error while loading: {}", e))?,
        }
        Ok(())
    }

    fn change_theme(&mut self) -> CliResult<()> {
        output::write_header(self.prompter.output(), &self.app.render, "THEME SELECTOR")?;
        for (i, theme) in Theme::NAMED.iter().enumerate() {
            self.message(&format!("{}. {}", i + 1, theme))?;
        }

        let choice = self
            .prompter
            .number("Choose a theme", 1..=Theme::NAMED.len(), 1)?;
        let theme = Theme::NAMED[choice - 1];

        if let Err(e) = self.app.change_theme(theme) {
            self.failure(&format!("Theme not saved: {}", e))?;
        }
        self.prompter.set_palette(self.app.render.palette().clone());
        self.success(&format!("Theme changed to {}!", theme))?;
        Ok(())
    }

    fn message(&mut self, msg: &str) -> io::Result<()> {
        output::write_message(self.prompter.output(), &self.app.render, msg)
    }

    fn success(&mut self, msg: &str) -> io::Result<()> {
        output::write_success(self.prompter.output(), &self.app.render, msg)
    }

    fn failure(&mut self, msg: &str) -> io::Result<()> {
        output::write_failure(self.prompter.output(), &self.app.render, msg)
    }
}

fn is_eof(err: &CliError) -> bool {
    matches!(err, CliError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof)
}
