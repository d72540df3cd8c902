//! Echo transport abstraction.
//!
//! Defines the "resolve a host, send one echo, get a reply or a fault"
//! capability the runner depends on, so the ICMP implementation can be
//! swapped for scripted transports in tests.

use crate::error::ProbeResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

/// Status carried by a reply to an echo request.
///
/// Anything other than [`EchoStatus::Success`] means a reply arrived but the
/// target was not confirmed reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EchoStatus {
    /// Echo reply received from the target.
    Success,
    /// A router reported the destination network unreachable.
    NetworkUnreachable,
    /// A router reported the destination host unreachable.
    HostUnreachable,
    /// The destination does not speak the protocol.
    ProtocolUnreachable,
    /// Destination unreachable with another code.
    DestinationUnreachable(u8),
    /// The packet's TTL expired in transit.
    TtlExpired,
    /// A router rejected a header field.
    ParameterProblem,
}

impl EchoStatus {
    /// Check if the status confirms reachability.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for EchoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::NetworkUnreachable => write!(f, "destination network unreachable"),
            Self::HostUnreachable => write!(f, "destination host unreachable"),
            Self::ProtocolUnreachable => write!(f, "destination protocol unreachable"),
            Self::DestinationUnreachable(code) => {
                write!(f, "destination unreachable (code {})", code)
            }
            Self::TtlExpired => write!(f, "TTL expired in transit"),
            Self::ParameterProblem => write!(f, "parameter problem"),
        }
    }
}

/// One echo request as handed to a transport.
#[derive(Debug, Clone, Copy)]
pub struct EchoRequest<'a> {
    /// Address returned by [`EchoTransport::resolve`] for this attempt.
    pub target: IpAddr,
    /// Sequence number of this attempt within the run.
    pub sequence: u16,
    /// Payload shared by every attempt of the run.
    pub payload: &'a [u8],
    /// How long to wait for a reply.
    pub timeout: Duration,
}

/// What came back for an echo request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoReply {
    /// Address the reply (or error report) came from.
    pub address: IpAddr,
    /// Payload bytes echoed back.
    pub bytes: usize,
    /// Time from send to receipt.
    pub round_trip: Duration,
    /// TTL of the reply, when the socket exposes it.
    pub ttl: Option<u8>,
    /// Reply classification.
    pub status: EchoStatus,
}

impl EchoReply {
    /// A successful echo reply.
    pub fn success(address: IpAddr, bytes: usize, round_trip: Duration) -> Self {
        Self {
            address,
            bytes,
            round_trip,
            ttl: None,
            status: EchoStatus::Success,
        }
    }

    /// A reply reporting a non-success condition.
    pub fn with_status(address: IpAddr, status: EchoStatus, round_trip: Duration) -> Self {
        Self {
            address,
            bytes: 0,
            round_trip,
            ttl: None,
            status,
        }
    }

    /// Set the TTL.
    pub fn with_ttl(mut self, ttl: Option<u8>) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Trait for echo transport implementations.
///
/// Each attempt resolves first, then sends exactly one request. Only
/// [`EchoTransport::echo`] is bounded by the reply timeout. Implementations
/// must not retry.
///
/// # Example
///
/// ```ignore
/// use pingpong::probe::{EchoRequest, EchoTransport};
///
/// async fn once<T: EchoTransport>(transport: &T, payload: &[u8]) {
///     let Ok(target) = transport.resolve("example.com").await else {
///         return;
///     };
///     let request = EchoRequest {
///         target,
///         sequence: 1,
///         payload,
///         timeout: std::time::Duration::from_secs(1),
///     };
///     let _ = transport.echo(request).await;
/// }
/// ```
#[async_trait]
pub trait EchoTransport: Send + Sync {
    /// Resolve a validated host to the address an attempt is sent to.
    async fn resolve(&self, host: &str) -> ProbeResult<IpAddr>;

    /// Send one echo request and wait for the matching reply.
    ///
    /// Must return by `request.timeout`; the runner abandons the call shortly
    /// after that.
    async fn echo(&self, request: EchoRequest<'_>) -> ProbeResult<EchoReply>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// A boxed transport for dynamic dispatch.
pub type BoxedTransport = Box<dyn EchoTransport>;
