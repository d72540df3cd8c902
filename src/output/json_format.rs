//! JSON output formatting.

use crate::probe::ProbeStatistics;
use crate::storage::ProbeRecord;
use serde::Serialize;
use std::io::{self, Write};

/// A record plus its derived statistics.
#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(flatten)]
    record: &'a ProbeRecord,
    statistics: ProbeStatistics,
}

/// Write a run as pretty-printed JSON.
pub fn write_json<W: Write>(mut out: W, record: &ProbeRecord) -> io::Result<()> {
    let report = JsonReport {
        record,
        statistics: record.statistics(),
    };
    serde_json::to_writer_pretty(&mut out, &report)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::{ProbeOutcome, ProbeRequest};
    use crate::types::{AttemptCount, Host, PayloadSize};

    #[test]
    fn test_json_includes_statistics() {
        let request = ProbeRequest::new(
            Host::parse("example.org").unwrap(),
            AttemptCount::new(2).unwrap(),
            PayloadSize::default(),
        );
        let outcomes = vec![
            ProbeOutcome {
                attempt: 1,
                succeeded: true,
                round_trip_ms: 18,
                ttl: Some(55),
                detail: "Reply from 203.0.113.9: bytes=32 time=18ms TTL=55".to_string(),
            },
            ProbeOutcome::failure(2, "Failed: timeout: no reply within 1000 ms"),
        ];
        let record = ProbeRecord::new(&request).finalize(outcomes);

        let mut buf = Vec::new();
        write_json(&mut buf, &record).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["target"], "example.org");
        assert_eq!(value["outcomes"].as_array().unwrap().len(), 2);
        assert_eq!(value["outcomes"][0]["ttl"], 55);
        assert!(value["outcomes"][1].get("ttl").is_none());
        assert_eq!(value["statistics"]["lost"], 1);
        assert_eq!(value["statistics"]["loss_percent"], 50.0);
        assert_eq!(value["statistics"]["latency"]["max_ms"], 18);
    }
}
