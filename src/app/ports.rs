//! Port traits: the hexagonal boundary between the measurement core and
//! the hardware.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ControlLoop (domain)
//! ```
//!
//! Driven adapters (I2C bus, periodic timer, event sinks) implement these
//! traits. The [`ControlLoop`](super::control::ControlLoop) consumes them
//! via generics, so the loop runs against mocks on the host.

use crate::error::BusFault;
use crate::sensors::Sample;
use crate::sensors::rainfall::FirmwareVersion;

// ───────────────────────────────────────────────────────────────
// Register bus (driven adapter: domain → I2C)
// ───────────────────────────────────────────────────────────────

/// Register-addressed access to a single device on a shared bus.
///
/// A read writes the register address and then reads `buf.len()` bytes in
/// one transaction. A write sends the register address followed by `data`.
pub trait RegisterBus {
    fn read_bytes(&mut self, register: u8, buf: &mut [u8]) -> Result<(), BusFault>;

    fn write_bytes(&mut self, register: u8, data: &[u8]) -> Result<(), BusFault>;
}

// ───────────────────────────────────────────────────────────────
// Rain sensor (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Telemetry reads the control loop needs from the gauge.
///
/// None of these fail: a transport fault yields [`Sample::Defaulted`].
pub trait RainSensor {
    fn read_firmware_version(&mut self) -> Sample<FirmwareVersion>;

    fn read_working_time_hours(&mut self) -> Sample<f64>;

    fn read_cumulative_rainfall_mm(&mut self) -> Sample<f64>;

    /// Rainfall over the trailing `window_hours`. Windows above 24 h read
    /// as zero without touching the bus.
    fn read_windowed_rainfall_mm(&mut self, window_hours: u8) -> Sample<f64>;

    fn read_raw_tip_count(&mut self) -> Sample<u32>;
}

// ───────────────────────────────────────────────────────────────
// Flow timer (driven adapter: domain → periodic estimator)
// ───────────────────────────────────────────────────────────────

/// Drives the flow estimator at its fixed period.
///
/// Adapters log their own start/stop failures; the loop only tracks the
/// requested state.
pub trait FlowTimer {
    fn start(&mut self);

    fn stop(&mut self);

    fn is_running(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
