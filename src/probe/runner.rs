//! Sequential probe execution.
//!
//! Each attempt resolves the host, is sent once, waited on for at most the
//! request timeout, and classified. Resolution time does not count against
//! the reply timeout. A fault in one attempt becomes a failed outcome and the run
//! moves on; nothing a transport does can end a run early.

use crate::error::{ProbeError, ProbeResult};
use crate::probe::traits::{EchoReply, EchoRequest, EchoTransport};
use crate::probe::ProbeRequest;
use crate::types::{Host, PayloadSize};
use indicatif::ProgressBar;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, info};

/// Slack granted to a transport past the echo timeout before the runner
/// abandons the attempt itself.
const TIMEOUT_GRACE: Duration = Duration::from_millis(250);

/// Longest a single name lookup may take before the attempt is failed.
const RESOLVE_LIMIT: Duration = Duration::from_secs(10);

/// Outcome of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeOutcome {
    /// 1-based attempt number.
    pub attempt: u32,
    /// Whether a successful echo reply arrived in time.
    pub succeeded: bool,
    /// Round-trip time in milliseconds; `0` when the attempt failed.
    pub round_trip_ms: u64,
    /// TTL of the reply when the transport reported one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u8>,
    /// Human-readable classification.
    pub detail: String,
}

impl ProbeOutcome {
    /// Outcome for a successful echo reply.
    pub fn success(attempt: u32, reply: &EchoReply) -> Self {
        let round_trip_ms = reply.round_trip.as_millis() as u64;
        let mut detail = format!(
            "Reply from {}: bytes={} time={}ms",
            reply.address, reply.bytes, round_trip_ms
        );
        if let Some(ttl) = reply.ttl {
            detail.push_str(&format!(" TTL={}", ttl));
        }

        Self {
            attempt,
            succeeded: true,
            round_trip_ms,
            ttl: reply.ttl,
            detail,
        }
    }

    /// Outcome for a failed attempt.
    pub fn failure(attempt: u32, detail: impl Into<String>) -> Self {
        Self {
            attempt,
            succeeded: false,
            round_trip_ms: 0,
            ttl: None,
            detail: detail.into(),
        }
    }

    /// Classify whatever the transport returned for one attempt.
    pub fn from_result(attempt: u32, result: ProbeResult<EchoReply>) -> Self {
        match result {
            Ok(reply) if reply.status.is_success() => Self::success(attempt, &reply),
            Ok(reply) => Self::failure(attempt, format!("Error: {}", reply.status)),
            Err(e) => Self::failure(attempt, format!("Failed: {}", e)),
        }
    }
}

/// Runs the attempts of a probe against one transport.
///
/// The transport is borrowed for the run only; callers open a fresh one per
/// run so socket handles are released when the run ends.
pub struct ProbeRunner<'t, T: ?Sized> {
    transport: &'t T,
    progress: Option<ProgressBar>,
}

impl<'t, T: EchoTransport + ?Sized> ProbeRunner<'t, T> {
    /// Create a runner over a transport.
    pub fn new(transport: &'t T) -> Self {
        Self {
            transport,
            progress: None,
        }
    }

    /// Report per-attempt progress on a progress bar.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Execute every attempt of the request, in order.
    ///
    /// Always returns exactly `request.attempts()` outcomes.
    pub async fn run(&self, request: &ProbeRequest) -> Vec<ProbeOutcome> {
        let attempts = request.attempts().get();
        let payload = generate_payload(request.payload_size());
        let mut outcomes = Vec::new();

        debug!(
            transport = self.transport.name(),
            host = %request.host(),
            attempts,
            payload_size = payload.len(),
            "Starting probe run"
        );

        for attempt in 1..=attempts {
            if attempt > 1 && !request.interval().is_zero() {
                tokio::time::sleep(request.interval()).await;
            }

            let outcome = match self.resolve(request.host()).await {
                Ok(target) => {
                    let echo = EchoRequest {
                        target,
                        // Sequence numbers wrap on runs longer than 65535 attempts.
                        sequence: attempt as u16,
                        payload: &payload,
                        timeout: request.timeout(),
                    };
                    self.attempt(attempt, echo).await
                }
                Err(e) => ProbeOutcome::from_result(attempt, Err(e)),
            };
            debug!(
                attempt,
                succeeded = outcome.succeeded,
                round_trip_ms = outcome.round_trip_ms,
                detail = %outcome.detail,
                "Attempt completed"
            );

            if let Some(ref pb) = self.progress {
                pb.inc(1);
                pb.set_message(if outcome.succeeded {
                    format!("reply in {}ms", outcome.round_trip_ms)
                } else {
                    "no reply".to_string()
                });
            }

            outcomes.push(outcome);
        }

        if let Some(ref pb) = self.progress {
            pb.finish_and_clear();
        }

        info!(
            host = %request.host(),
            sent = outcomes.len(),
            received = outcomes.iter().filter(|o| o.succeeded).count(),
            "Probe run finished"
        );

        outcomes
    }

    async fn resolve(&self, host: &Host) -> ProbeResult<IpAddr> {
        match tokio::time::timeout(RESOLVE_LIMIT, self.transport.resolve(host.as_str())).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::resolution(
                host.as_str(),
                format!("no answer within {} s", RESOLVE_LIMIT.as_secs()),
            )),
        }
    }

    /// Send one echo and classify the result.
    async fn attempt(&self, attempt: u32, echo: EchoRequest<'_>) -> ProbeOutcome {
        let limit = echo.timeout + TIMEOUT_GRACE;
        let result = match tokio::time::timeout(limit, self.transport.echo(echo)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout(echo.timeout)),
        };

        ProbeOutcome::from_result(attempt, result)
    }
}

/// Fill a payload buffer with random filler bytes.
fn generate_payload(size: PayloadSize) -> Vec<u8> {
    let mut payload = vec![0u8; size.as_usize()];
    rand::thread_rng().fill_bytes(&mut payload);
    payload
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::traits::EchoStatus;
    use crate::types::{AttemptCount, Host};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::net::Ipv4Addr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Instant;

    const TARGET: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1));

    /// Transport that replays a fixed script and records what it was sent.
    struct ScriptedTransport {
        script: Mutex<VecDeque<ProbeResult<EchoReply>>>,
        seen: Mutex<Vec<(u16, Vec<u8>)>>,
    }

    impl ScriptedTransport {
        fn new(script: Vec<ProbeResult<EchoReply>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl EchoTransport for ScriptedTransport {
        async fn resolve(&self, _host: &str) -> ProbeResult<IpAddr> {
            Ok(TARGET)
        }

        async fn echo(&self, request: EchoRequest<'_>) -> ProbeResult<EchoReply> {
            self.seen
                .lock()
                .unwrap()
                .push((request.sequence, request.payload.to_vec()));
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(ProbeError::Timeout(request.timeout)))
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    /// Transport that never answers.
    #[derive(Default)]
    struct HangingTransport {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EchoTransport for HangingTransport {
        async fn resolve(&self, _host: &str) -> ProbeResult<IpAddr> {
            Ok(TARGET)
        }

        async fn echo(&self, _request: EchoRequest<'_>) -> ProbeResult<EchoReply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(ProbeError::Socket("unreachable code".to_string()))
        }

        fn name(&self) -> &'static str {
            "hanging"
        }
    }

    /// Transport with a slow name lookup in front of a slow reply.
    struct SlowLookup {
        lookup: Duration,
        lookup_result: ProbeResult<IpAddr>,
        reply_after: Duration,
    }

    #[async_trait]
    impl EchoTransport for SlowLookup {
        async fn resolve(&self, _host: &str) -> ProbeResult<IpAddr> {
            tokio::time::sleep(self.lookup).await;
            self.lookup_result.clone()
        }

        async fn echo(&self, request: EchoRequest<'_>) -> ProbeResult<EchoReply> {
            tokio::time::sleep(self.reply_after).await;
            Ok(EchoReply::success(
                request.target,
                request.payload.len(),
                self.reply_after,
            ))
        }

        fn name(&self) -> &'static str {
            "slow-lookup"
        }
    }

    /// Transport that records when each echo was sent.
    #[derive(Default)]
    struct ClockedTransport {
        sent_at: Mutex<Vec<Instant>>,
    }

    #[async_trait]
    impl EchoTransport for ClockedTransport {
        async fn resolve(&self, _host: &str) -> ProbeResult<IpAddr> {
            Ok(TARGET)
        }

        async fn echo(&self, request: EchoRequest<'_>) -> ProbeResult<EchoReply> {
            self.sent_at.lock().unwrap().push(Instant::now());
            Ok(EchoReply::success(
                request.target,
                request.payload.len(),
                Duration::from_millis(1),
            ))
        }

        fn name(&self) -> &'static str {
            "clocked"
        }
    }

    fn request(attempts: u32, size: u16) -> ProbeRequest {
        ProbeRequest::new(
            Host::parse("192.0.2.1").unwrap(),
            AttemptCount::new(attempts).unwrap(),
            PayloadSize::new(size).unwrap(),
        )
        .with_interval(Duration::ZERO)
    }

    fn reply(ms: u64) -> ProbeResult<EchoReply> {
        Ok(EchoReply::success(TARGET, 32, Duration::from_millis(ms)).with_ttl(Some(57)))
    }

    #[test]
    fn test_success_detail() {
        let outcome = ProbeOutcome::from_result(1, reply(12));
        assert!(outcome.succeeded);
        assert_eq!(outcome.round_trip_ms, 12);
        assert_eq!(outcome.detail, "Reply from 192.0.2.1: bytes=32 time=12ms TTL=57");
    }

    #[test]
    fn test_success_without_ttl_omits_it() {
        let result = Ok(EchoReply::success(TARGET, 64, Duration::from_millis(3)));
        let outcome = ProbeOutcome::from_result(2, result);
        assert_eq!(outcome.ttl, None);
        assert_eq!(outcome.detail, "Reply from 192.0.2.1: bytes=64 time=3ms");
    }

    #[test]
    fn test_status_failure_detail() {
        let result = Ok(EchoReply::with_status(
            TARGET,
            EchoStatus::HostUnreachable,
            Duration::from_millis(4),
        ));
        let outcome = ProbeOutcome::from_result(1, result);
        assert!(!outcome.succeeded);
        assert_eq!(outcome.round_trip_ms, 0);
        assert_eq!(outcome.detail, "Error: destination host unreachable");
    }

    #[test]
    fn test_fault_detail() {
        let outcome =
            ProbeOutcome::from_result(3, Err(ProbeError::Timeout(Duration::from_millis(1000))));
        assert!(!outcome.succeeded);
        assert_eq!(outcome.attempt, 3);
        assert!(outcome.detail.contains("timeout"));
    }

    #[tokio::test]
    async fn test_run_returns_one_outcome_per_attempt_in_order() {
        let transport = ScriptedTransport::new(vec![reply(10), reply(20), reply(30)]);
        let outcomes = ProbeRunner::new(&transport).run(&request(3, 32)).await;

        assert_eq!(outcomes.len(), 3);
        let attempts: Vec<u32> = outcomes.iter().map(|o| o.attempt).collect();
        assert_eq!(attempts, vec![1, 2, 3]);
        let rtts: Vec<u64> = outcomes.iter().map(|o| o.round_trip_ms).collect();
        assert_eq!(rtts, vec![10, 20, 30]);

        let seen = transport.seen.lock().unwrap();
        let sequences: Vec<u16> = seen.iter().map(|(seq, _)| *seq).collect();
        assert_eq!(sequences, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_run_continues_after_faults() {
        let transport = ScriptedTransport::new(vec![
            Err(ProbeError::resolution("192.0.2.1", "temporary failure")),
            reply(15),
            Err(ProbeError::PermissionDenied("socket".to_string())),
            reply(25),
        ]);
        let outcomes = ProbeRunner::new(&transport).run(&request(4, 32)).await;

        let flags: Vec<bool> = outcomes.iter().map(|o| o.succeeded).collect();
        assert_eq!(flags, vec![false, true, false, true]);
        assert!(outcomes[0].detail.contains("name resolution failed"));
        assert_eq!(outcomes[0].round_trip_ms, 0);
    }

    #[tokio::test]
    async fn test_payload_generated_once_and_reused() {
        let transport = ScriptedTransport::new(vec![reply(1), reply(2), reply(3)]);
        ProbeRunner::new(&transport).run(&request(3, 100)).await;

        let seen = transport.seen.lock().unwrap();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen[0].1.len(), 100);
        assert!(seen.iter().all(|(_, payload)| payload == &seen[0].1));
    }

    #[tokio::test]
    async fn test_hanging_transport_times_out() {
        let request = request(2, 8).with_timeout(Duration::from_millis(20));
        let transport = HangingTransport::default();
        let outcomes = ProbeRunner::new(&transport).run(&request).await;

        assert_eq!(outcomes.len(), 2);
        assert_eq!(transport.calls.load(Ordering::SeqCst), 2);
        assert!(outcomes.iter().all(|o| !o.succeeded));
        assert!(outcomes.iter().all(|o| o.detail.contains("timeout")));
    }

    #[tokio::test]
    async fn test_slow_failed_lookup_is_a_resolution_failure() {
        let transport = SlowLookup {
            lookup: Duration::from_millis(300),
            lookup_result: Err(ProbeError::resolution("192.0.2.1", "server failure")),
            reply_after: Duration::ZERO,
        };
        let request = request(1, 8).with_timeout(Duration::from_millis(100));
        let outcomes = ProbeRunner::new(&transport).run(&request).await;

        assert!(!outcomes[0].succeeded);
        assert!(outcomes[0].detail.contains("name resolution failed"));
        assert!(!outcomes[0].detail.contains("timeout"));
    }

    #[tokio::test]
    async fn test_lookup_time_not_charged_to_reply_timeout() {
        let transport = SlowLookup {
            lookup: Duration::from_millis(250),
            lookup_result: Ok(TARGET),
            reply_after: Duration::from_millis(100),
        };
        let request = request(2, 8).with_timeout(Duration::from_millis(200));
        let outcomes = ProbeRunner::new(&transport).run(&request).await;

        assert!(outcomes.iter().all(|o| o.succeeded));
        assert_eq!(outcomes[1].round_trip_ms, 100);
    }

    #[tokio::test]
    async fn test_interval_applies_between_attempts_only() {
        let interval = Duration::from_millis(60);
        let transport = ClockedTransport::default();
        let request = request(3, 8).with_interval(interval);

        let started = Instant::now();
        ProbeRunner::new(&transport).run(&request).await;

        let sent_at = transport.sent_at.lock().unwrap();
        assert_eq!(sent_at.len(), 3);
        assert!(sent_at[0].duration_since(started) < interval);
        for pair in sent_at.windows(2) {
            assert!(pair[1].duration_since(pair[0]) >= interval);
        }
    }

    #[tokio::test]
    async fn test_huge_attempt_count_starts_immediately() {
        let request = ProbeRequest::new(
            Host::parse("192.0.2.1").unwrap(),
            AttemptCount::new(u32::MAX).unwrap(),
            PayloadSize::new(8).unwrap(),
        )
        .with_interval(Duration::ZERO);
        let transport = HangingTransport::default();

        let runner = ProbeRunner::new(&transport);
        let run = runner.run(&request);
        let cancelled = tokio::time::timeout(Duration::from_millis(100), run).await;

        assert!(cancelled.is_err());
        assert_eq!(transport.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_runner_accepts_trait_objects() {
        let transport: Box<dyn EchoTransport> = Box::new(ScriptedTransport::new(vec![reply(7)]));
        let outcomes = ProbeRunner::new(transport.as_ref()).run(&request(1, 1)).await;
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].succeeded);
    }
}
