//! Application settings and paths.
//!
//! Manages the XDG-compliant settings path and persisted preferences.

use crate::error::{ConfigError, ConfigResult};
use crate::output::Theme;
use crate::types::{AttemptCount, PayloadSize};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Longest accepted pause between attempts.
const MAX_INTERVAL_MS: u64 = 60_000;

/// Application directory paths following XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/pingpong)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Resolve paths using XDG directories.
    ///
    /// Nothing is created on disk; directories are made when first written.
    pub fn resolve() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "pingpong", "pingpong")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Application-wide settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Attempts per run when none is given.
    pub default_attempts: u32,
    /// Payload size in bytes when none is given.
    pub default_payload_size: u16,
    /// Pause between attempts in milliseconds.
    pub interval_ms: u64,
    /// Display theme.
    pub theme: Theme,
    /// Where reports are saved and loaded. Current directory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_dir: Option<PathBuf>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_attempts: AttemptCount::DEFAULT.get(),
            default_payload_size: PayloadSize::DEFAULT.get(),
            interval_ms: 500,
            theme: Theme::default(),
            report_dir: None,
        }
    }
}

impl AppSettings {
    /// Load settings from a specific file.
    ///
    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings: Self =
            serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Save settings to a specific file, creating its directory.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Reject values no probe could run with.
    pub fn validate(&self) -> ConfigResult<()> {
        AttemptCount::new(self.default_attempts)
            .map_err(|e| ConfigError::InvalidValue(format!("default_attempts: {}", e)))?;
        PayloadSize::new(self.default_payload_size)
            .map_err(|e| ConfigError::InvalidValue(format!("default_payload_size: {}", e)))?;

        if self.interval_ms > MAX_INTERVAL_MS {
            return Err(ConfigError::InvalidValue(format!(
                "interval_ms: {} exceeds {}",
                self.interval_ms, MAX_INTERVAL_MS
            )));
        }

        Ok(())
    }

    /// Default attempt count, falling back when the stored value is invalid.
    pub fn attempts(&self) -> AttemptCount {
        AttemptCount::new(self.default_attempts).unwrap_or_default()
    }

    /// Default payload size, falling back when the stored value is invalid.
    pub fn payload_size(&self) -> PayloadSize {
        PayloadSize::new(self.default_payload_size).unwrap_or_default()
    }

    /// Pause between attempts.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}
