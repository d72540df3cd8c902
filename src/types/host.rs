//! Probe target host with loose syntax validation.
//!
//! Accepts:
//! - Dotted-quad IPv4 addresses ("192.168.1.1")
//! - Domain-shaped names ("example.com")
//!
//! Validation is a shape check only. Whether the name resolves is decided per
//! attempt by the echo transport.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A probe target that passed [`is_valid_host`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Host(String);

impl Host {
    /// Validate and wrap a host string.
    pub fn parse(s: &str) -> Result<Self, HostError> {
        if s.trim().is_empty() {
            return Err(HostError::Empty);
        }
        if !is_valid_host(s) {
            return Err(HostError::InvalidFormat(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    /// Get the host as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Host {
    type Err = HostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Host {
    type Error = HostError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Host> for String {
    fn from(host: Host) -> Self {
        host.0
    }
}

/// Error type for host validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("host cannot be empty")]
    Empty,
    #[error("invalid IP address or domain name: '{0}'")]
    InvalidFormat(String),
}

/// Check whether a string looks like a probe target.
///
/// Rules:
/// - empty, whitespace-only, or containing a space: rejected
/// - four dot-separated integer segments: accepted only if each is 0-255
/// - otherwise: accepted if it contains a '.' and the first '.' is neither
///   the first nor the last character
pub fn is_valid_host(input: &str) -> bool {
    if input.trim().is_empty() || input.contains(' ') {
        return false;
    }

    match parse_dotted_quad(input) {
        Some(valid) => valid,
        None => match input.find('.') {
            Some(idx) => idx != 0 && idx != input.len() - 1,
            None => false,
        },
    }
}

/// Classify a string as an IPv4 literal.
///
/// Returns `None` when the string is not shaped like a dotted quad at all,
/// `Some(false)` when it is all-numeric but not a legal address (a segment
/// out of range), and `Some(true)` for a legal address.
fn parse_dotted_quad(input: &str) -> Option<bool> {
    let parts: Vec<&str> = input.split('.').collect();
    if parts.len() != 4 {
        return None;
    }

    let mut in_range = true;
    for part in parts {
        match part.parse::<i64>() {
            Ok(n) => in_range &= (0..=255).contains(&n),
            Err(_) => return None,
        }
    }

    Some(in_range)
}
