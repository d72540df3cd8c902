//! Core type definitions using newtype patterns for type safety.
//!
//! Probe inputs are validated once at the edge so the engine never sees an
//! empty host, a zero attempt count, or an oversized payload.

mod host;
mod params;
mod run_id;

pub use host::{is_valid_host, Host, HostError};
pub use params::{AttemptCount, ParamError, PayloadSize};
pub use run_id::RunId;
