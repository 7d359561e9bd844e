//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the ESP-IDF
//! logger (UART / USB-CDC in production, stderr on the host).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started {
                window_hours,
                firmware,
                initial_windowed_mm,
            } => {
                info!(
                    "START | fw={} | window={}h | baseline={:.4}mm",
                    firmware, window_hours, initial_windowed_mm
                );
            }
            AppEvent::SensorUnverified(e) => {
                warn!("SENSOR | unverified: {}", e);
            }
            AppEvent::Reading { reading, flow } => {
                info!(
                    "READ | rain={:.4}mm | window={:.4}mm | tips={} | up={:.2}h | \
                     flow={:.2}L/min | vol={:.3}L",
                    reading.cumulative_rainfall_mm,
                    reading.hourly_rainfall_mm,
                    reading.raw_tip_count,
                    reading.working_time_hours,
                    flow.flow_rate_l_per_min,
                    flow.total_volume_l,
                );
            }
            AppEvent::FlowArmed => {
                info!("FLOW | armed");
            }
            AppEvent::FlowDisarmed { discarded_pulses } => {
                info!("FLOW | disarmed, discarded {} pulses", discarded_pulses);
            }
            AppEvent::SampleDefaulted { quantity, fault } => {
                warn!("SENSOR | {} defaulted: {}", quantity, fault);
            }
        }
    }
}
