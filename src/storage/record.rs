//! The record of one completed probe run.

use crate::probe::{summarize, ProbeOutcome, ProbeRequest, ProbeStatistics};
use crate::types::RunId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A probe run and its outcomes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeRecord {
    /// Unique identifier for this run.
    pub id: RunId,
    /// When the run was started.
    pub started_at: DateTime<Utc>,
    /// When the last attempt finished.
    pub completed_at: DateTime<Utc>,
    /// Target host as entered.
    pub target: String,
    /// Requested number of attempts.
    pub attempts: u32,
    /// Payload size in bytes.
    pub payload_size: u16,
    /// Per-attempt outcomes in send order.
    pub outcomes: Vec<ProbeOutcome>,
}

impl ProbeRecord {
    /// Start a record for a request.
    pub fn new(request: &ProbeRequest) -> Self {
        let now = Utc::now();
        Self {
            id: RunId::new(),
            started_at: now,
            completed_at: now,
            target: request.host().to_string(),
            attempts: request.attempts().get(),
            payload_size: request.payload_size().get(),
            outcomes: Vec::new(),
        }
    }

    /// Attach the outcomes of the finished run.
    pub fn finalize(mut self, outcomes: Vec<ProbeOutcome>) -> Self {
        self.completed_at = Utc::now();
        self.outcomes = outcomes;
        self
    }

    /// Statistics over the outcomes, computed on each call.
    pub fn statistics(&self) -> ProbeStatistics {
        summarize(&self.outcomes)
    }

    /// Get a short summary of the run.
    pub fn summary(&self) -> String {
        let stats = self.statistics();
        format!(
            "{} [{}] - {}/{} replies",
            self.target,
            self.id.short(),
            stats.succeeded,
            stats.total
        )
    }
}
