//! Native ICMP echo transport.
//!
//! Sends echo requests over `socket2` ICMP sockets. A raw socket is tried
//! first; without `CAP_NET_RAW` the unprivileged datagram ("ping") socket is
//! used instead. The socket I/O is blocking and runs on the blocking pool so
//! the measured round trip is not skewed by the async scheduler. Every
//! exchange ends by a deadline fixed when the attempt starts, and a socket
//! serves one exchange at a time, so an abandoned attempt can never consume
//! the reply meant for the next one.

use crate::error::{ProbeError, ProbeResult};
use crate::probe::traits::{EchoReply, EchoRequest, EchoStatus, EchoTransport};
use async_trait::async_trait;
use pnet::packet::icmp::echo_reply::EchoReplyPacket;
use pnet::packet::icmp::echo_request::{EchoRequestPacket, MutableEchoRequestPacket};
use pnet::packet::icmp::{self, IcmpCode, IcmpPacket, IcmpTypes};
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::Packet;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io;
use std::mem::MaybeUninit;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// Size of an ICMP echo header (type, code, checksum, identifier, sequence).
const ICMP_HEADER_LEN: usize = 8;

/// Size of a fixed IPv6 header.
const IPV6_HEADER_LEN: usize = 40;

/// Large enough for the biggest payload plus IP and ICMP headers.
const RECV_BUFFER_LEN: usize = 65_536;

const ICMPV6_DEST_UNREACHABLE: u8 = 1;
const ICMPV6_TIME_EXCEEDED: u8 = 3;
const ICMPV6_PARAM_PROBLEM: u8 = 4;
const ICMPV6_ECHO_REQUEST: u8 = 128;
const ICMPV6_ECHO_REPLY: u8 = 129;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SocketKind {
    Raw,
    Dgram,
}

/// An open ICMP socket for one address family.
#[derive(Debug)]
struct IcmpSocket {
    socket: Socket,
    kind: SocketKind,
    busy: Mutex<()>,
}

impl IcmpSocket {
    fn open(domain: Domain, protocol: Protocol) -> io::Result<Self> {
        match Socket::new(domain, Type::RAW, Some(protocol)) {
            Ok(socket) => Ok(Self {
                socket,
                kind: SocketKind::Raw,
                busy: Mutex::new(()),
            }),
            Err(e) => {
                debug!(error = %e, "Raw ICMP socket unavailable, trying datagram socket");
                let socket = Socket::new(domain, Type::DGRAM, Some(protocol))?;
                Ok(Self {
                    socket,
                    kind: SocketKind::Dgram,
                    busy: Mutex::new(()),
                })
            }
        }
    }

    /// Send one packet and wait, until `deadline`, for the reply that
    /// answers it. `timeout` is only used to report a timeout.
    fn exchange(
        &self,
        target: IpAddr,
        packet: &[u8],
        identifier: u16,
        sequence: u16,
        deadline: Instant,
        timeout: Duration,
    ) -> ProbeResult<EchoReply> {
        let _exclusive = self
            .busy
            .lock()
            .map_err(|_| ProbeError::Socket("ICMP socket lock poisoned".to_string()))?;
        if Instant::now() >= deadline {
            return Err(ProbeError::Timeout(timeout));
        }

        let destination = SockAddr::from(SocketAddr::new(target, 0));
        let start = Instant::now();

        self.socket
            .send_to(packet, &destination)
            .map_err(|e| classify_io_error(e, target, timeout))?;

        let mut buf = vec![MaybeUninit::<u8>::uninit(); RECV_BUFFER_LEN];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(ProbeError::Timeout(timeout));
            }
            self.socket
                .set_read_timeout(Some(remaining))
                .map_err(|e| ProbeError::Socket(format!("failed to set read timeout: {}", e)))?;

            let (len, from) = self
                .socket
                .recv_from(&mut buf)
                .map_err(|e| classify_io_error(e, target, timeout))?;
            let round_trip = start.elapsed();

            // SAFETY: recv_from initialized the first `len` bytes
            let datagram: &[u8] =
                unsafe { std::slice::from_raw_parts(buf.as_ptr() as *const u8, len) };

            let Some(from) = from.as_socket().map(|addr| addr.ip()) else {
                continue;
            };
            let parsed = match target {
                IpAddr::V4(_) => parse_v4(datagram),
                IpAddr::V6(_) => parse_v6(datagram),
            };

            match parsed {
                Some(received) if self.answers(&received, from, target, identifier, sequence) => {
                    let reply = if received.status.is_success() {
                        EchoReply::success(from, received.bytes, round_trip)
                    } else {
                        EchoReply::with_status(from, received.status, round_trip)
                    };
                    return Ok(reply.with_ttl(received.ttl));
                }
                _ => trace!(%from, len, "Ignoring unrelated ICMP message"),
            }
        }
    }

    fn answers(
        &self,
        received: &Received,
        from: IpAddr,
        target: IpAddr,
        identifier: u16,
        sequence: u16,
    ) -> bool {
        if received.sequence != sequence {
            return false;
        }
        // Datagram sockets get their identifier rewritten by the kernel.
        if self.kind == SocketKind::Raw && received.identifier != identifier {
            return false;
        }
        !received.status.is_success() || from == target
    }
}

/// An ICMP message parsed far enough to match it against a request.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Received {
    status: EchoStatus,
    identifier: u16,
    sequence: u16,
    bytes: usize,
    ttl: Option<u8>,
}

/// ICMP echo transport backed by OS sockets.
///
/// Sockets are opened once per transport and closed when it is dropped.
pub struct IcmpTransport {
    v4: Option<Arc<IcmpSocket>>,
    v6: Option<Arc<IcmpSocket>>,
    resolver: TokioAsyncResolver,
    identifier: u16,
}

impl IcmpTransport {
    /// Open ICMP sockets for IPv4 and, when available, IPv6.
    ///
    /// Fails with [`ProbeError::PermissionDenied`] or
    /// [`ProbeError::NoCapability`] when no ICMP socket can be opened at all.
    pub fn open() -> ProbeResult<Self> {
        let v4 = IcmpSocket::open(Domain::IPV4, Protocol::ICMPV4);
        let v6 = IcmpSocket::open(Domain::IPV6, Protocol::ICMPV6);

        let (v4, v6) = match (v4, v6) {
            (Err(e), Err(_)) => {
                return Err(if e.kind() == io::ErrorKind::PermissionDenied {
                    ProbeError::PermissionDenied(format!("cannot open ICMP socket: {}", e))
                } else {
                    ProbeError::NoCapability(e.to_string())
                });
            }
            (v4, v6) => (v4.ok(), v6.ok()),
        };

        if let Some(ref socket) = v4 {
            debug!(kind = ?socket.kind, "Opened IPv4 ICMP socket");
        }
        if let Some(ref socket) = v6 {
            debug!(kind = ?socket.kind, "Opened IPv6 ICMP socket");
        }

        Ok(Self {
            v4: v4.map(Arc::new),
            v6: v6.map(Arc::new),
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()),
            identifier: rand::random(),
        })
    }

    /// Whether the transport can reach the given family.
    fn supports(&self, ip: &IpAddr) -> bool {
        match ip {
            IpAddr::V4(_) => self.v4.is_some(),
            IpAddr::V6(_) => self.v6.is_some(),
        }
    }

    fn socket_for(&self, ip: IpAddr) -> ProbeResult<Arc<IcmpSocket>> {
        let socket = match ip {
            IpAddr::V4(_) => self.v4.as_ref(),
            IpAddr::V6(_) => self.v6.as_ref(),
        };
        socket.cloned().ok_or_else(|| {
            ProbeError::NoCapability(format!("no ICMP socket available for {}", ip))
        })
    }
}

#[async_trait]
impl EchoTransport for IcmpTransport {
    /// Resolve a host, preferring an address family with an open socket.
    async fn resolve(&self, host: &str) -> ProbeResult<IpAddr> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(ip);
        }

        let response = self
            .resolver
            .lookup_ip(host)
            .await
            .map_err(|e| ProbeError::resolution(host, e))?;

        let ips: Vec<IpAddr> = response.iter().collect();
        ips.iter()
            .find(|ip| self.supports(ip))
            .or_else(|| ips.first())
            .copied()
            .ok_or_else(|| ProbeError::resolution(host, "no addresses found"))
    }

    async fn echo(&self, request: EchoRequest<'_>) -> ProbeResult<EchoReply> {
        let deadline = Instant::now() + request.timeout;
        let target = request.target;
        let socket = self.socket_for(target)?;

        let packet = match target {
            IpAddr::V4(_) => build_echo_v4(self.identifier, request.sequence, request.payload)?,
            IpAddr::V6(_) => build_echo_v6(self.identifier, request.sequence, request.payload),
        };

        let identifier = self.identifier;
        let sequence = request.sequence;
        let timeout = request.timeout;
        trace!(%target, sequence, len = packet.len(), "Sending echo request");

        tokio::task::spawn_blocking(move || {
            socket.exchange(target, &packet, identifier, sequence, deadline, timeout)
        })
        .await
        .map_err(|e| ProbeError::Socket(format!("echo task failed: {}", e)))?
    }

    fn name(&self) -> &'static str {
        "icmp"
    }
}

/// Map an OS error from send/recv to a probe fault.
fn classify_io_error(e: io::Error, target: IpAddr, timeout: Duration) -> ProbeError {
    match e.raw_os_error() {
        Some(libc::EHOSTUNREACH) => return ProbeError::HostUnreachable(target.to_string()),
        Some(libc::ENETUNREACH) => return ProbeError::NetworkUnreachable(target.to_string()),
        _ => {}
    }
    match e.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => ProbeError::Timeout(timeout),
        io::ErrorKind::PermissionDenied => ProbeError::PermissionDenied(e.to_string()),
        _ => ProbeError::Socket(e.to_string()),
    }
}

/// Build an ICMPv4 echo request with its checksum filled in.
fn build_echo_v4(identifier: u16, sequence: u16, payload: &[u8]) -> ProbeResult<Vec<u8>> {
    let mut buf = vec![0u8; ICMP_HEADER_LEN + payload.len()];
    let mut packet = MutableEchoRequestPacket::new(&mut buf)
        .ok_or_else(|| ProbeError::InvalidPacket("echo request buffer too small".to_string()))?;

    packet.set_icmp_type(IcmpTypes::EchoRequest);
    packet.set_icmp_code(IcmpCode::new(0));
    packet.set_identifier(identifier);
    packet.set_sequence_number(sequence);
    packet.set_payload(payload);

    let header = IcmpPacket::new(packet.packet())
        .ok_or_else(|| ProbeError::InvalidPacket("echo request too short".to_string()))?;
    let checksum = icmp::checksum(&header);
    packet.set_checksum(checksum);

    Ok(buf)
}

/// Build an ICMPv6 echo request. The kernel computes the checksum.
fn build_echo_v6(identifier: u16, sequence: u16, payload: &[u8]) -> Vec<u8> {
    let mut packet = Vec::with_capacity(ICMP_HEADER_LEN + payload.len());
    packet.extend_from_slice(&[ICMPV6_ECHO_REQUEST, 0, 0, 0]);
    packet.extend_from_slice(&identifier.to_be_bytes());
    packet.extend_from_slice(&sequence.to_be_bytes());
    packet.extend_from_slice(payload);
    packet
}

/// Parse an ICMPv4 message, with or without a leading IPv4 header.
fn parse_v4(datagram: &[u8]) -> Option<Received> {
    let (message, ttl) = if datagram.first()? >> 4 == 4 {
        let ip = Ipv4Packet::new(datagram)?;
        let header_len = ip.get_header_length() as usize * 4;
        (datagram.get(header_len..)?, Some(ip.get_ttl()))
    } else {
        (datagram, None)
    };

    let header = IcmpPacket::new(message)?;
    let code = header.get_icmp_code().0;
    let status = match header.get_icmp_type() {
        IcmpTypes::EchoReply => {
            let reply = EchoReplyPacket::new(message)?;
            return Some(Received {
                status: EchoStatus::Success,
                identifier: reply.get_identifier(),
                sequence: reply.get_sequence_number(),
                bytes: message.len() - ICMP_HEADER_LEN,
                ttl,
            });
        }
        IcmpTypes::DestinationUnreachable => match code {
            0 => EchoStatus::NetworkUnreachable,
            1 => EchoStatus::HostUnreachable,
            2 => EchoStatus::ProtocolUnreachable,
            other => EchoStatus::DestinationUnreachable(other),
        },
        IcmpTypes::TimeExceeded => EchoStatus::TtlExpired,
        IcmpTypes::ParameterProblem => EchoStatus::ParameterProblem,
        _ => return None,
    };

    // Error messages quote the offending IP header and the first 8 bytes
    // of our echo request.
    let quoted = message.get(ICMP_HEADER_LEN..)?;
    let quoted_ip = Ipv4Packet::new(quoted)?;
    let quoted_echo = quoted.get(quoted_ip.get_header_length() as usize * 4..)?;
    let original = EchoRequestPacket::new(quoted_echo)?;
    if original.get_icmp_type() != IcmpTypes::EchoRequest {
        return None;
    }

    Some(Received {
        status,
        identifier: original.get_identifier(),
        sequence: original.get_sequence_number(),
        bytes: 0,
        ttl,
    })
}

/// Parse an ICMPv6 message. IPv6 sockets never deliver the IP header.
fn parse_v6(message: &[u8]) -> Option<Received> {
    let kind = *message.first()?;
    let code = *message.get(1)?;
    let status = match kind {
        ICMPV6_ECHO_REPLY => {
            return Some(Received {
                status: EchoStatus::Success,
                identifier: read_u16(message, 4)?,
                sequence: read_u16(message, 6)?,
                bytes: message.len() - ICMP_HEADER_LEN,
                ttl: None,
            });
        }
        ICMPV6_DEST_UNREACHABLE => match code {
            0 => EchoStatus::NetworkUnreachable,
            3 => EchoStatus::HostUnreachable,
            other => EchoStatus::DestinationUnreachable(other),
        },
        ICMPV6_TIME_EXCEEDED => EchoStatus::TtlExpired,
        ICMPV6_PARAM_PROBLEM => EchoStatus::ParameterProblem,
        _ => return None,
    };

    let original = message.get(ICMP_HEADER_LEN + IPV6_HEADER_LEN..)?;
    if *original.first()? != ICMPV6_ECHO_REQUEST {
        return None;
    }

    Some(Received {
        status,
        identifier: read_u16(original, 4)?,
        sequence: read_u16(original, 6)?,
        bytes: 0,
        ttl: None,
    })
}

fn read_u16(bytes: &[u8], offset: usize) -> Option<u16> {
    let pair = bytes.get(offset..offset + 2)?;
    Some(u16::from_be_bytes([pair[0], pair[1]]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    const LOOPBACK: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
    const ECHO: [u8; 8] = [8, 0, 0, 0, 0, 1, 0, 1];

    /// A UDP socket standing in for an ICMP one; these exchanges never send.
    fn stand_in_socket() -> IcmpSocket {
        IcmpSocket {
            socket: Socket::new(Domain::IPV4, Type::DGRAM, None).unwrap(),
            kind: SocketKind::Dgram,
            busy: Mutex::new(()),
        }
    }

    /// Minimal IPv4 header (no options) for a given TTL and protocol ICMP.
    fn ipv4_header(ttl: u8) -> Vec<u8> {
        vec![
            0x45, 0, 0, 0, 0, 0, 0, 0, ttl, 1, 0, 0, 10, 0, 0, 1, 10, 0, 0, 2,
        ]
    }

    fn echo_reply_v4(identifier: u16, sequence: u16, payload: &[u8]) -> Vec<u8> {
        let mut packet = build_echo_v4(identifier, sequence, payload).unwrap();
        packet[0] = 0;
        packet
    }

    #[test]
    fn test_build_echo_v4_layout_and_checksum() {
        let packet = build_echo_v4(0x1234, 7, &[0xAB; 4]).unwrap();
        assert_eq!(packet.len(), 12);
        assert_eq!(packet[0], 8);
        assert_eq!(packet[1], 0);
        assert_eq!(&packet[4..6], &[0x12, 0x34]);
        assert_eq!(&packet[6..8], &[0, 7]);
        assert_eq!(&packet[8..], &[0xAB; 4]);

        // A correct checksum makes the one's complement sum come out to zero.
        let mut sum: u32 = packet
            .chunks(2)
            .map(|c| u16::from_be_bytes([c[0], *c.get(1).unwrap_or(&0)]) as u32)
            .sum();
        while sum >> 16 != 0 {
            sum = (sum & 0xFFFF) + (sum >> 16);
        }
        assert_eq!(sum, 0xFFFF);
    }

    #[test]
    fn test_build_echo_v6_layout() {
        let packet = build_echo_v6(0xBEEF, 3, b"hi");
        assert_eq!(packet, vec![128, 0, 0, 0, 0xBE, 0xEF, 0, 3, b'h', b'i']);
    }

    #[test]
    fn test_parse_v4_reply_without_ip_header() {
        let received = parse_v4(&echo_reply_v4(9, 2, &[0; 32])).unwrap();
        assert_eq!(received.status, EchoStatus::Success);
        assert_eq!(received.identifier, 9);
        assert_eq!(received.sequence, 2);
        assert_eq!(received.bytes, 32);
        assert_eq!(received.ttl, None);
    }

    #[test]
    fn test_parse_v4_reply_with_ip_header_reads_ttl() {
        let mut datagram = ipv4_header(57);
        datagram.extend(echo_reply_v4(9, 4, &[1; 16]));
        let received = parse_v4(&datagram).unwrap();
        assert_eq!(received.ttl, Some(57));
        assert_eq!(received.sequence, 4);
        assert_eq!(received.bytes, 16);
    }

    #[test]
    fn test_parse_v4_host_unreachable_quotes_request() {
        let mut datagram = ipv4_header(250);
        datagram.extend_from_slice(&[3, 1, 0, 0, 0, 0, 0, 0]);
        datagram.extend(ipv4_header(1));
        datagram.extend(build_echo_v4(0x4242, 5, &[]).unwrap());

        let received = parse_v4(&datagram).unwrap();
        assert_eq!(received.status, EchoStatus::HostUnreachable);
        assert_eq!(received.identifier, 0x4242);
        assert_eq!(received.sequence, 5);
    }

    #[test]
    fn test_parse_v4_ignores_echo_requests() {
        assert!(parse_v4(&build_echo_v4(1, 1, &[0; 8]).unwrap()).is_none());
        assert!(parse_v4(&[]).is_none());
        assert!(parse_v4(&[0, 0, 0]).is_none());
    }

    #[test]
    fn test_parse_v6_reply_and_time_exceeded() {
        let mut reply = build_echo_v6(7, 11, &[0; 10]);
        reply[0] = ICMPV6_ECHO_REPLY;
        let received = parse_v6(&reply).unwrap();
        assert_eq!(received.status, EchoStatus::Success);
        assert_eq!(received.sequence, 11);
        assert_eq!(received.bytes, 10);

        let mut error = vec![ICMPV6_TIME_EXCEEDED, 0, 0, 0, 0, 0, 0, 0];
        error.extend_from_slice(&[0; IPV6_HEADER_LEN]);
        error.extend(build_echo_v6(7, 12, &[]));
        let received = parse_v6(&error).unwrap();
        assert_eq!(received.status, EchoStatus::TtlExpired);
        assert_eq!(received.identifier, 7);
        assert_eq!(received.sequence, 12);
    }

    #[test]
    fn test_classify_io_error() {
        let target: IpAddr = "192.0.2.1".parse().unwrap();
        let timeout = Duration::from_millis(1000);

        let err = classify_io_error(
            io::Error::from_raw_os_error(libc::EHOSTUNREACH),
            target,
            timeout,
        );
        assert!(matches!(err, ProbeError::HostUnreachable(_)));

        let err = classify_io_error(io::Error::from(io::ErrorKind::WouldBlock), target, timeout);
        assert!(err.is_timeout());

        let err = classify_io_error(
            io::Error::from(io::ErrorKind::PermissionDenied),
            target,
            timeout,
        );
        assert!(matches!(err, ProbeError::PermissionDenied(_)));
    }

    #[test]
    fn test_exchange_past_deadline_fails_without_sending() {
        let socket = stand_in_socket();
        let timeout = Duration::from_millis(50);
        let result = socket.exchange(LOOPBACK, &ECHO, 1, 1, Instant::now(), timeout);
        assert_eq!(result, Err(ProbeError::Timeout(timeout)));
    }

    #[test]
    fn test_exchange_on_busy_socket_gives_up_at_its_deadline() {
        let socket = Arc::new(stand_in_socket());
        let held = socket.busy.lock().unwrap();
        let timeout = Duration::from_millis(30);
        let deadline = Instant::now() + timeout;

        let waiter = {
            let socket = Arc::clone(&socket);
            std::thread::spawn(move || socket.exchange(LOOPBACK, &ECHO, 1, 2, deadline, timeout))
        };
        std::thread::sleep(Duration::from_millis(60));
        drop(held);

        assert_eq!(waiter.join().unwrap(), Err(ProbeError::Timeout(timeout)));
    }
}
