//! Application core: measurement logic with no direct I/O.
//!
//! The [`control::ControlLoop`] polls the rain gauge, drives flow
//! measurement and feeds the telemetry log. All hardware access goes
//! through the **port traits** in [`ports`], keeping this layer testable
//! without real peripherals.

pub mod control;
pub mod events;
pub mod ports;
