//! Rain-gauge firmware library.
//!
//! Exposes the measurement core for integration testing. All
//! ESP-IDF-specific code is guarded by `#[cfg(target_os = "espidf")]`
//! within each module, so the crate builds and tests on the host with
//! `--no-default-features`.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod sensors;
pub mod telemetry;
