//! Probe subcommand implementation.
//!
//! Handles the `pingpong probe <host>` command and the run flow shared with
//! the interactive menu.

use crate::cli::{AppContext, OutputFormat};
use crate::error::{CliResult, ProbeError, StorageError};
use crate::output;
use crate::probe::{EchoTransport, IcmpTransport, ProbeRequest, ProbeRunner};
use crate::storage::{is_valid_filename, ProbeRecord, ReportStore};
use crate::types::{AttemptCount, Host, PayloadSize};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::info;

/// Probe a host with ICMP echo requests.
#[derive(Parser, Debug)]
pub struct ProbeCommand {
    /// Target IPv4 address or domain name
    ///
    /// Examples:
    ///   192.168.1.1        IPv4 address
    ///   example.com        Domain name
    #[arg(value_name = "HOST")]
    pub host: String,

    /// Number of echo requests to send [default: from settings, 4]
    #[arg(short = 'n', long = "count", value_parser = clap::value_parser!(u32).range(1..))]
    pub count: Option<u32>,

    /// Payload size in bytes, 1-65500 [default: from settings, 32]
    #[arg(short = 'l', long = "size", value_parser = clap::value_parser!(u16).range(1..=65500))]
    pub size: Option<u16>,

    /// Pause between attempts in milliseconds [default: from settings, 500]
    #[arg(short = 'i', long = "interval", value_name = "MS")]
    pub interval: Option<u64>,

    /// Output format for results
    #[arg(short, long, value_enum, default_value = "plain")]
    pub output: OutputFormat,

    /// Save a text report under this file name
    #[arg(short, long, value_name = "FILE")]
    pub save: Option<String>,

    /// Overwrite an existing report without asking
    #[arg(short, long, requires = "save")]
    pub force: bool,
}

impl ProbeCommand {
    /// Execute the probe command.
    pub async fn execute(&self, app: &AppContext) -> CliResult<()> {
        let host = Host::parse(&self.host)?;
        let attempts = match self.count {
            Some(n) => AttemptCount::new(n)?,
            None => app.settings.attempts(),
        };
        let size = match self.size {
            Some(n) => PayloadSize::new(n)?,
            None => app.settings.payload_size(),
        };

        let mut request = app.request(host, attempts, size);
        if let Some(ms) = self.interval {
            request = request.with_interval(Duration::from_millis(ms));
        }

        // Refuse a bad save target before spending time on the run.
        let store = app.store();
        if let Some(ref name) = self.save {
            if !is_valid_filename(name) {
                return Err(StorageError::InvalidFilename(name.clone()).into());
            }
            if !self.force && store.exists(name)? {
                return Err(StorageError::AlreadyExists(store.dir().join(name)).into());
            }
        }

        let plain = self.output == OutputFormat::Plain && !app.quiet;
        if plain {
            let mut stdout = std::io::stdout();
            output::write_banner(
                &mut stdout,
                &app.render,
                &format!("Pinging {} with {} bytes of data", request.host(), size),
            )?;
        }

        let transport = open_transport()?;
        let record = execute_run(&transport, &request, plain).await;

        output::print_results(&app.render, &record, self.output)?;

        if let Some(ref name) = self.save {
            let path = store.save(name, &record)?;
            if plain {
                output::print_success(&format!("Report saved to {}", path.display()));
            }
        }

        Ok(())
    }
}

/// Run a request to completion and wrap the outcomes in a record.
pub async fn execute_run<T: EchoTransport + ?Sized>(
    transport: &T,
    request: &ProbeRequest,
    show_progress: bool,
) -> ProbeRecord {
    let record = ProbeRecord::new(request);

    let runner = ProbeRunner::new(transport);
    let runner = if show_progress {
        runner.with_progress(progress_bar(request.attempts().get() as u64))
    } else {
        runner
    };

    let outcomes = runner.run(request).await;
    let record = record.finalize(outcomes);
    info!(run = %record.id, summary = %record.summary(), "Run recorded");
    record
}

/// Open the native ICMP transport, explaining privilege problems.
pub fn open_transport() -> CliResult<IcmpTransport> {
    IcmpTransport::open().map_err(|e| {
        if let Some(hint) = privilege_hint(&e) {
            output::print_warning(hint);
        }
        e.into()
    })
}

/// Advice for setup failures caused by missing privileges.
fn privilege_hint(err: &ProbeError) -> Option<&'static str> {
    match err {
        ProbeError::PermissionDenied(_) | ProbeError::NoCapability(_) if !is_root() => Some(
            "ICMP sockets need elevated privileges. Run with sudo, grant CAP_NET_RAW \
             (setcap cap_net_raw+ep), or widen net.ipv4.ping_group_range.",
        ),
        _ => None,
    }
}

fn progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("=>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar());
    pb.set_style(style);
    pb
}

/// Check if running with root/admin privileges.
fn is_root() -> bool {
    #[cfg(unix)]
    {
        unsafe { libc::geteuid() == 0 }
    }
    #[cfg(not(unix))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeResult;
    use crate::probe::{EchoReply, EchoRequest};
    use async_trait::async_trait;
    use std::net::IpAddr;

    struct AlwaysReplies;

    #[async_trait]
    impl EchoTransport for AlwaysReplies {
        async fn resolve(&self, host: &str) -> ProbeResult<IpAddr> {
            host.parse().map_err(|e| ProbeError::resolution(host, e))
        }

        async fn echo(&self, request: EchoRequest<'_>) -> ProbeResult<EchoReply> {
            Ok(EchoReply::success(
                request.target,
                request.payload.len(),
                Duration::from_millis(request.sequence as u64),
            ))
        }

        fn name(&self) -> &'static str {
            "always"
        }
    }

    #[tokio::test]
    async fn test_execute_run_builds_record() {
        let request = ProbeRequest::new(
            Host::parse("198.51.100.4").unwrap(),
            AttemptCount::new(3).unwrap(),
            PayloadSize::new(16).unwrap(),
        )
        .with_interval(Duration::ZERO);

        let record = execute_run(&AlwaysReplies, &request, false).await;
        assert_eq!(record.target, "198.51.100.4");
        assert_eq!(record.outcomes.len(), 3);
        assert_eq!(record.outcomes[2].detail, "Reply from 198.51.100.4: bytes=16 time=3ms");
        assert_eq!(record.statistics().lost, 0);
    }

    #[test]
    fn test_privilege_hint_only_for_setup_failures() {
        assert!(privilege_hint(&ProbeError::Timeout(Duration::from_secs(1))).is_none());
        if !is_root() {
            assert!(privilege_hint(&ProbeError::PermissionDenied("raw".into())).is_some());
        }
    }
}
