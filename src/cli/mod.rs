//! CLI subcommand definitions and handlers.
//!
//! Implements a subcommand architecture:
//! - `pingpong probe <host>` - Probe a host and print the results
//! - `pingpong load <file>` - Print a saved report
//! - `pingpong menu` - Interactive menu (also the default)

mod load;
mod menu;
mod probe;
mod prompt;

pub use load::LoadCommand;
pub use menu::Menu;
pub use probe::{execute_run, open_transport, ProbeCommand};
pub use prompt::Prompter;

use crate::config::{AppSettings, Paths};
use crate::error::CliResult;
use crate::output::{self, RenderContext, Theme};
use crate::probe::ProbeRequest;
use crate::storage::TextReportStore;
use crate::types::{AttemptCount, Host, PayloadSize};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, warn};

/// pingpong - host reachability prober.
///
/// Sends ICMP echo requests to a host, reports per-attempt results and
/// latency statistics, and saves reports as plain text.
#[derive(Parser, Debug)]
#[command(name = "pingpong")]
#[command(author = "HueCodes <huecodes@proton.me>")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ping a host and keep the results", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to custom configuration file
    #[arg(long, global = true, value_name = "PATH", env = "PINGPONG_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory reports are saved to and loaded from
    #[arg(long, global = true, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Color theme
    #[arg(long, global = true, value_enum)]
    pub theme: Option<Theme>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe a host with ICMP echo requests
    #[command(alias = "p")]
    Probe(ProbeCommand),

    /// Print a previously saved report
    #[command(alias = "l")]
    Load(LoadCommand),

    /// Start the interactive menu
    #[command(alias = "m")]
    Menu,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// Settings and display state shared by every command.
#[derive(Debug)]
pub struct AppContext {
    pub settings: AppSettings,
    /// Where settings changes are written; `None` without a config location.
    pub settings_path: Option<PathBuf>,
    pub render: RenderContext,
    pub report_dir: PathBuf,
    pub quiet: bool,
}

impl AppContext {
    /// Build the context from parsed arguments and the settings file.
    pub fn from_cli(cli: &Cli) -> CliResult<Self> {
        let settings_path = match &cli.config {
            Some(path) => Some(path.clone()),
            None => match Paths::resolve() {
                Ok(paths) => Some(paths.settings_file()),
                Err(e) => {
                    warn!("Settings unavailable, using defaults: {}", e);
                    None
                }
            },
        };

        let settings = match &settings_path {
            Some(path) => AppSettings::load_from(path)?,
            None => AppSettings::default(),
        };
        debug!(?settings_path, ?settings, "Loaded settings");

        Ok(Self::new(settings, settings_path, cli))
    }

    /// Combine settings with command-line overrides.
    pub fn new(settings: AppSettings, settings_path: Option<PathBuf>, cli: &Cli) -> Self {
        let theme = cli.theme.unwrap_or(settings.theme);
        let report_dir = cli
            .output_dir
            .clone()
            .or_else(|| settings.report_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."));

        Self {
            render: RenderContext::new(theme),
            settings,
            settings_path,
            report_dir,
            quiet: cli.quiet,
        }
    }

    /// Report store rooted at the configured directory.
    pub fn store(&self) -> TextReportStore {
        TextReportStore::new(&self.report_dir)
    }

    /// A request using the configured interval.
    pub fn request(&self, host: Host, attempts: AttemptCount, size: PayloadSize) -> ProbeRequest {
        ProbeRequest::new(host, attempts, size).with_interval(self.settings.interval())
    }

    /// Switch theme and remember it in the settings file.
    pub fn change_theme(&mut self, theme: Theme) -> CliResult<()> {
        self.render.set_theme(theme);
        self.settings.theme = theme;

        match &self.settings_path {
            Some(path) => self.settings.save_to(path)?,
            None => {
                output::print_warning("No settings location; theme applies to this session only.")
            }
        }
        Ok(())
    }
}
