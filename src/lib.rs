//! # pingpong - host reachability prober
//!
//! Sends a fixed number of ICMP echo requests to one host, classifies every
//! attempt, derives loss and latency statistics, and saves human-readable
//! reports.
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use pingpong::probe::{summarize, IcmpTransport, ProbeRequest, ProbeRunner};
//! use pingpong::types::{AttemptCount, Host, PayloadSize};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let transport = IcmpTransport::open()?;
//!     let request = ProbeRequest::new(
//!         Host::parse("192.168.1.1")?,
//!         AttemptCount::default(),
//!         PayloadSize::default(),
//!     );
//!
//!     let outcomes = ProbeRunner::new(&transport).run(&request).await;
//!     let stats = summarize(&outcomes);
//!     println!("{}/{} replies", stats.succeeded, stats.total);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Validated newtypes for hosts and probe parameters
//! - [`probe`] - The runner, statistics, and the `EchoTransport` seam
//! - [`storage`] - Run records and text reports
//! - [`config`] - XDG settings
//! - [`output`] - Themes and plain/JSON/CSV formatting
//! - [`cli`] - Subcommands and the interactive menu
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod probe;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, ProbeError};
pub use probe::{summarize, EchoTransport, ProbeOutcome, ProbeRequest, ProbeRunner, ProbeStatistics};
pub use types::{is_valid_host, AttemptCount, Host, PayloadSize, RunId};
