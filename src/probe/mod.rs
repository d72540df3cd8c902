//! Probe module - runs echo attempts and reduces them to statistics.
//!
//! A run is strictly sequential: attempt `n` is sent only after attempt
//! `n - 1` has produced an outcome, and every outcome is kept in send order.
//!
//! - [`ProbeRunner`] drives the attempts through an [`EchoTransport`]
//! - [`summarize`] derives [`ProbeStatistics`] from the outcomes
//! - [`IcmpTransport`] is the native ICMP echo implementation

pub mod icmp;
pub mod runner;
pub mod stats;
pub mod traits;

pub use icmp::IcmpTransport;
pub use runner::{ProbeOutcome, ProbeRunner};
pub use stats::{summarize, LatencyStats, ProbeStatistics};
pub use traits::{BoxedTransport, EchoReply, EchoRequest, EchoStatus, EchoTransport};

use crate::types::{AttemptCount, Host, PayloadSize};
use std::time::Duration;

/// Per-attempt reply timeout.
pub const ECHO_TIMEOUT: Duration = Duration::from_millis(1000);

/// Default pause between consecutive attempts.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// Parameters of one probe run.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    host: Host,
    attempts: AttemptCount,
    payload_size: PayloadSize,
    timeout: Duration,
    interval: Duration,
}

impl ProbeRequest {
    /// Create a request with the fixed echo timeout and default interval.
    pub fn new(host: Host, attempts: AttemptCount, payload_size: PayloadSize) -> Self {
        Self {
            host,
            attempts,
            payload_size,
            timeout: ECHO_TIMEOUT,
            interval: DEFAULT_INTERVAL,
        }
    }

    /// Set the pause between attempts.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Target host.
    pub fn host(&self) -> &Host {
        &self.host
    }

    /// Number of attempts.
    pub fn attempts(&self) -> AttemptCount {
        self.attempts
    }

    /// Payload size.
    pub fn payload_size(&self) -> PayloadSize {
        self.payload_size
    }

    /// Per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Pause between attempts.
    pub fn interval(&self) -> Duration {
        self.interval
    }
}
