//! Aggregate statistics over a completed run.

use crate::probe::runner::ProbeOutcome;
use serde::Serialize;

/// Round-trip statistics over the successful attempts of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LatencyStats {
    pub min_ms: u64,
    pub max_ms: u64,
    pub mean_ms: f64,
}

/// Summary of a run's outcomes.
///
/// Derived on demand and never stored alongside the outcomes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeStatistics {
    pub total: usize,
    pub succeeded: usize,
    pub lost: usize,
    /// `None` when the run had no attempts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loss_percent: Option<f64>,
    /// `None` when no attempt succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency: Option<LatencyStats>,
}

impl ProbeStatistics {
    /// Percentage of attempts that succeeded.
    pub fn success_percent(&self) -> Option<f64> {
        self.loss_percent.map(|loss| 100.0 - loss)
    }
}

/// Reduce a run's outcomes to statistics.
pub fn summarize(outcomes: &[ProbeOutcome]) -> ProbeStatistics {
    let total = outcomes.len();
    let rtts: Vec<u64> = outcomes
        .iter()
        .filter(|o| o.succeeded)
        .map(|o| o.round_trip_ms)
        .collect();
    let succeeded = rtts.len();
    let lost = total - succeeded;

    let loss_percent = if total == 0 {
        None
    } else {
        Some(lost as f64 / total as f64 * 100.0)
    };

    let latency = match (rtts.iter().min(), rtts.iter().max()) {
        (Some(&min_ms), Some(&max_ms)) => Some(LatencyStats {
            min_ms,
            max_ms,
            mean_ms: rtts.iter().sum::<u64>() as f64 / succeeded as f64,
        }),
        _ => None,
    };

    ProbeStatistics {
        total,
        succeeded,
        lost,
        loss_percent,
        latency,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(attempt: u32, ms: u64) -> ProbeOutcome {
        ProbeOutcome {
            attempt,
            succeeded: true,
            round_trip_ms: ms,
            ttl: None,
            detail: format!("Reply from 10.0.0.1: bytes=32 time={}ms", ms),
        }
    }

    fn lost(attempt: u32) -> ProbeOutcome {
        ProbeOutcome::failure(attempt, "Failed: timeout: no reply within 1000 ms")
    }

    #[test]
    fn test_all_succeeded() {
        let outcomes = vec![ok(1, 10), ok(2, 20), ok(3, 30), ok(4, 40)];
        let stats = summarize(&outcomes);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.succeeded, 4);
        assert_eq!(stats.lost, 0);
        assert_eq!(stats.loss_percent, Some(0.0));

        let latency = stats.latency.unwrap();
        assert_eq!(latency.min_ms, 10);
        assert_eq!(latency.max_ms, 40);
        assert_eq!(latency.mean_ms, 25.0);
        assert!(latency.min_ms as f64 <= latency.mean_ms);
        assert!(latency.mean_ms <= latency.max_ms as f64);
    }

    #[test]
    fn test_mixed_outcomes() {
        let outcomes = vec![ok(1, 20), lost(2), ok(3, 30), ok(4, 40)];
        let stats = summarize(&outcomes);

        assert_eq!(stats.lost, 1);
        assert_eq!(stats.loss_percent, Some(25.0));
        assert_eq!(stats.success_percent(), Some(75.0));

        let latency = stats.latency.unwrap();
        assert_eq!(latency.min_ms, 20);
        assert_eq!(latency.max_ms, 40);
        assert_eq!(latency.mean_ms, 30.0);
    }

    #[test]
    fn test_all_lost_has_no_latency() {
        let outcomes: Vec<_> = (1..=4).map(lost).collect();
        let stats = summarize(&outcomes);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.succeeded, 0);
        assert_eq!(stats.lost, 4);
        assert_eq!(stats.loss_percent, Some(100.0));
        assert!(stats.latency.is_none());
    }

    #[test]
    fn test_empty_run() {
        let stats = summarize(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.loss_percent, None);
        assert_eq!(stats.success_percent(), None);
        assert!(stats.latency.is_none());
    }

    #[test]
    fn test_summarize_is_pure() {
        let outcomes = vec![ok(1, 5), lost(2), ok(3, 9)];
        assert_eq!(summarize(&outcomes), summarize(&outcomes));
        assert_eq!(outcomes.len(), 3);
    }

    #[test]
    fn test_latency_omitted_from_json_when_absent() {
        let json = serde_json::to_value(summarize(&[lost(1)])).unwrap();
        assert!(json.get("latency").is_none());
        assert_eq!(json["loss_percent"], 100.0);
    }
}
