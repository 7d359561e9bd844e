//! Shared telemetry state.
//!
//! [`Telemetry`] pairs the bounded log with the shared [`FlowState`]. The
//! control loop is the only writer of sensor data; the HTTP server reads
//! snapshots and triggers resets.
//!
//! Lock order is always log, then flow. `record` samples the flow state
//! while holding the log lock, so a save that races a reset can never
//! store a pre-reset volume after the reset completed.
//!
//! [`FlowState`]: crate::sensors::flow::FlowState

pub mod history;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::sensors::flow::{FlowState, SharedFlow};

pub use self::history::{LOG_CAPACITY, LogEntry, TelemetryLog, TelemetrySnapshot};

pub struct Telemetry {
    log: Mutex<TelemetryLog>,
    flow: Arc<SharedFlow>,
}

impl Telemetry {
    pub fn new(flow: Arc<SharedFlow>) -> Self {
        Self {
            log: Mutex::new(TelemetryLog::new()),
            flow,
        }
    }

    fn lock(&self) -> MutexGuard<'_, TelemetryLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one poll using the live flow state. Returns the flow state
    /// that was stored.
    pub fn record(
        &self,
        cumulative_mm: f64,
        windowed_mm: f64,
        tips: u32,
        working_time_hours: f64,
    ) -> FlowState {
        let mut log = self.lock();
        let flow = self.flow.snapshot();
        log.save(
            cumulative_mm,
            windowed_mm,
            flow.total_volume_l,
            flow.flow_rate_l_per_min,
            tips,
            working_time_hours,
        );
        flow
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        self.lock().snapshot()
    }

    /// Clear every series and zero the integrated volume as one step.
    /// Flow rate and the armed state are left alone.
    pub fn reset(&self) {
        let mut log = self.lock();
        log.reset();
        self.flow.reset_volume();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
