//! Tracing subscriber setup. Diagnostics go to stderr, never stdout.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default filter for the given verbosity flags.
fn default_directive(verbose: bool, quiet: bool) -> &'static str {
    if verbose {
        "warn,pingpong=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    }
}

/// Initialize structured logging on stderr.
///
/// `RUST_LOG` takes precedence over the flags. Examples:
/// - `RUST_LOG=pingpong=trace` - Every ICMP message the transport sees
/// - `RUST_LOG=info` - One summary line per run
pub fn init_logging(verbose: bool, quiet: bool) {
    let _ = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet))),
        )
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_line_number(verbose),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false, false), "warn");
        assert_eq!(default_directive(true, false), "warn,pingpong=debug");
        assert_eq!(default_directive(false, true), "error");
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_logging(false, true);
        init_logging(true, false);
    }
}
