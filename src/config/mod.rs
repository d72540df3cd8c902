//! Configuration management for pingpong.
//!
//! Provides XDG-compliant settings storage for probe defaults, the display
//! theme and where reports are kept.

mod settings;

pub use settings::{AppSettings, Paths};
