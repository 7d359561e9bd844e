//! Outbound application events.
//!
//! The [`ControlLoop`](super::control::ControlLoop) emits these through the
//! [`EventSink`](super::ports::EventSink) port. Today the only sink writes
//! them to the serial log.

use crate::error::{BusFault, Error};
use crate::sensors::flow::FlowState;
use crate::sensors::rainfall::{FirmwareVersion, SensorReading};

/// Structured events emitted by the measurement core.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// The control loop took its initial sample and is about to poll.
    Started {
        window_hours: u8,
        firmware: FirmwareVersion,
        initial_windowed_mm: f64,
    },

    /// Identity check failed at boot; the loop runs against whatever
    /// answers on the bus.
    SensorUnverified(Error),

    /// One poll completed and was appended to the telemetry log.
    Reading { reading: SensorReading, flow: FlowState },

    /// Windowed rainfall changed: pulse counting and the flow timer are on.
    FlowArmed,

    /// Windowed rainfall held steady: counting stopped.
    FlowDisarmed { discarded_pulses: u32 },

    /// A register read failed and zero was used in its place.
    SampleDefaulted { quantity: &'static str, fault: BusFault },
}

