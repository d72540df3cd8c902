//! Plain text reports.
//!
//! Layout, one item per line:
//!
//! ```text
//! === Ping results for example.com - 2026-10-19 14:03:11 ===
//! Lost: 1/4 (25.0% loss)
//! Average round-trip: 30.00ms
//!
//! Reply from 93.184.216.34: bytes=32 time=20ms TTL=56
//! Failed: timeout: no reply within 1000 ms
//! ...
//! ```
//!
//! The average line is present only when at least one attempt succeeded.

use crate::error::{StorageError, StorageResult};
use crate::storage::ProbeRecord;
use chrono::Local;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Characters that are never allowed in a report file name.
const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Render a record as report text.
pub fn render_report(record: &ProbeRecord) -> String {
    let stats = record.statistics();
    let generated = record.completed_at.with_timezone(&Local);

    let mut out = format!(
        "=== Ping results for {} - {} ===\n",
        record.target,
        generated.format("%Y-%m-%d %H:%M:%S")
    );

    match stats.loss_percent {
        Some(pct) => out.push_str(&format!(
            "Lost: {}/{} ({:.1}% loss)\n",
            stats.lost, stats.total, pct
        )),
        None => out.push_str("No attempts were made.\n"),
    }

    if let Some(latency) = stats.latency {
        out.push_str(&format!("Average round-trip: {:.2}ms\n", latency.mean_ms));
    }

    out.push('\n');
    for outcome in &record.outcomes {
        out.push_str(&outcome.detail);
        out.push('\n');
    }

    out
}

/// Check whether a report file name is acceptable.
///
/// Rejects blank names, path separators, reserved characters and control
/// characters.
pub fn is_valid_filename(name: &str) -> bool {
    !name.trim().is_empty()
        && name != "."
        && name != ".."
        && !name
            .chars()
            .any(|c| RESERVED_CHARS.contains(&c) || c.is_control())
}

/// Persistence of text reports.
pub trait ReportStore {
    /// Whether a report with this name already exists.
    fn exists(&self, name: &str) -> StorageResult<bool>;

    /// Write a report, replacing any existing file. Returns where it went.
    fn save(&self, name: &str, record: &ProbeRecord) -> StorageResult<PathBuf>;

    /// Read a report back as raw text.
    fn load(&self, name: &str) -> StorageResult<String>;
}

/// Reports stored as text files in one directory.
#[derive(Debug, Clone)]
pub struct TextReportStore {
    dir: PathBuf,
}

impl TextReportStore {
    /// Create a store rooted at a directory.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory reports are resolved against.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> StorageResult<PathBuf> {
        if !is_valid_filename(name) {
            return Err(StorageError::InvalidFilename(name.to_string()));
        }
        Ok(self.dir.join(name))
    }
}

impl ReportStore for TextReportStore {
    fn exists(&self, name: &str) -> StorageResult<bool> {
        Ok(self.path_for(name)?.is_file())
    }

    fn save(&self, name: &str, record: &ProbeRecord) -> StorageResult<PathBuf> {
        let path = self.path_for(name)?;

        fs::create_dir_all(&self.dir).map_err(|e| StorageError::SaveFailed {
            path: self.dir.clone(),
            reason: e.to_string(),
        })?;
        fs::write(&path, render_report(record)).map_err(|e| StorageError::SaveFailed {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        debug!(path = %path.display(), run = %record.id, "Saved report");
        Ok(path)
    }

    fn load(&self, name: &str) -> StorageResult<String> {
        let path = self.dir.join(name);

        fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => StorageError::ReportNotFound(path.clone()),
            _ => StorageError::LoadFailed {
                path: path.clone(),
                reason: e.to_string(),
            },
        })
    }
}
