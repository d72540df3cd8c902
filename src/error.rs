//! Error types for pingpong.
//!
//! Uses `thiserror` for ergonomic error definitions. Each layer owns one
//! enum; the CLI layer wraps the others.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Faults raised by an echo transport.
///
/// Inside a run these never escape an attempt: the runner turns them into
/// failed outcomes. Only [`ProbeError::NoCapability`] and
/// [`ProbeError::PermissionDenied`] raised while opening a transport abort a
/// run, and only that run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("timeout: no reply within {} ms", .0.as_millis())]
    Timeout(Duration),

    #[error("name resolution failed for '{host}': {reason}")]
    Resolution { host: String, reason: String },

    #[error("destination host unreachable: {0}")]
    HostUnreachable(String),

    #[error("destination network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("socket error: {0}")]
    Socket(String),

    #[error("invalid packet: {0}")]
    InvalidPacket(String),

    #[error("no usable ICMP capability: {0}")]
    NoCapability(String),
}

impl ProbeError {
    /// Build a resolution error for a host.
    pub fn resolution(host: impl Into<String>, reason: impl ToString) -> Self {
        Self::Resolution {
            host: host.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Result type alias for probe operations.
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Report persistence errors.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("report not found: {}", .0.display())]
    ReportNotFound(PathBuf),

    #[error("invalid file name: '{0}'")]
    InvalidFilename(String),

    #[error("failed to save report to {}: {reason}", .path.display())]
    SaveFailed { path: PathBuf, reason: String },

    #[error("failed to load report from {}: {reason}", .path.display())]
    LoadFailed { path: PathBuf, reason: String },

    #[error("report already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine a home directory for configuration")]
    DirectoryNotFound,

    #[error("failed to read {}: {reason}", .path.display())]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write {}: {reason}", .path.display())]
    WriteFailed { path: PathBuf, reason: String },

    #[error("invalid settings format: {0}")]
    InvalidFormat(String),

    #[error("invalid setting: {0}")]
    InvalidValue(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors surfaced by CLI commands.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Host(#[from] crate::types::HostError),

    #[error(transparent)]
    Param(#[from] crate::types::ParamError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
