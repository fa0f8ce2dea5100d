//! Data models for the harness.
//!
//! - [`HarnessSettings`]: timeouts, poll cadence and output naming loaded
//!   from `Harness Settings.yaml`
//! - [`SignatureProfile`] / [`ProfileRotation`]: the signature profiles of
//!   the application under test and their per-run round-robin selection

pub mod config;
pub mod profile;

pub use config::{HarnessSettings, HarnessTimeouts};
pub use profile::{ProfileRotation, SignatureProfile};
