//! Probe parameter newtypes with validation.
//!
//! `AttemptCount` is always at least one; `PayloadSize` always fits in a
//! single unfragmented echo request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of echo attempts in a run (1 or more).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct AttemptCount(u32);

impl AttemptCount {
    /// Minimum attempt count.
    pub const MIN: u32 = 1;
    /// Default attempt count.
    pub const DEFAULT: Self = Self(4);

    /// Create an attempt count, rejecting zero.
    pub fn new(count: u32) -> Result<Self, ParamError> {
        if count < Self::MIN {
            Err(ParamError::ZeroAttempts)
        } else {
            Ok(Self(count))
        }
    }

    /// Get the raw count.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl Default for AttemptCount {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for AttemptCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for AttemptCount {
    type Error = ParamError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AttemptCount> for u32 {
    fn from(count: AttemptCount) -> Self {
        count.0
    }
}

impl FromStr for AttemptCount {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u32 = s
            .trim()
            .parse()
            .map_err(|_| ParamError::InvalidFormat(s.to_string()))?;
        Self::new(n)
    }
}

/// Echo payload size in bytes (1-65500).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct PayloadSize(u16);

impl PayloadSize {
    /// Minimum payload size.
    pub const MIN: u16 = 1;
    /// Largest payload the echo transport accepts without fragmenting.
    pub const MAX: u16 = 65500;
    /// Default payload size.
    pub const DEFAULT: Self = Self(32);

    /// Create a payload size, rejecting values outside 1-65500.
    pub fn new(size: u16) -> Result<Self, ParamError> {
        if (Self::MIN..=Self::MAX).contains(&size) {
            Ok(Self(size))
        } else {
            Err(ParamError::PayloadOutOfRange(size))
        }
    }

    /// Get the size in bytes.
    #[inline]
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Get the size as a buffer length.
    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl Default for PayloadSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for PayloadSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for PayloadSize {
    type Error = ParamError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PayloadSize> for u16 {
    fn from(size: PayloadSize) -> Self {
        size.0
    }
}

impl FromStr for PayloadSize {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u16 = s
            .trim()
            .parse()
            .map_err(|_| ParamError::InvalidFormat(s.to_string()))?;
        Self::new(n)
    }
}

/// Error type for probe parameter validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParamError {
    #[error("attempt count must be at least 1")]
    ZeroAttempts,
    #[error("payload size {0} is out of valid range (1-65500)")]
    PayloadOutOfRange(u16),
    #[error("invalid number: {0}")]
    InvalidFormat(String),
}
