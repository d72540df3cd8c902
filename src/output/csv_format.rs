//! CSV output formatting.

use crate::storage::ProbeRecord;
use std::io::{self, Write};

/// Write one row per attempt.
pub fn write_csv<W: Write>(out: W, record: &ProbeRecord) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    let run_id = record.id.to_string();

    wtr.write_record([
        "run_id",
        "target",
        "attempt",
        "succeeded",
        "round_trip_ms",
        "ttl",
        "detail",
    ])?;

    for outcome in &record.outcomes {
        let attempt = outcome.attempt.to_string();
        let round_trip = outcome.round_trip_ms.to_string();
        let ttl = outcome.ttl.map_or(String::new(), |t| t.to_string());

        wtr.write_record([
            run_id.as_str(),
            record.target.as_str(),
            attempt.as_str(),
            if outcome.succeeded { "true" } else { "false" },
            round_trip.as_str(),
            ttl.as_str(),
            outcome.detail.as_str(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
