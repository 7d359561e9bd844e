//! Flow-rate and volume estimation from the pulse accumulator.
//!
//! Runs once per tick (1 s in the reference cadence). Each tick drains the
//! accumulator, converts the pulse count to L/min through the sensor's
//! calibration factor and integrates one second of that rate into the
//! running volume:
//!
//! ```text
//! flow_rate    = pulses / calibration_factor      (L/min)
//! total_volume += flow_rate / 60                  (L)
//! ```
//!
//! The estimator is the only writer of [`FlowState`]. Readers go through
//! [`SharedFlow::snapshot`] and always see both fields from the same tick.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::debug;
use serde::Serialize;

use super::pulse::PulseAccumulator;

/// Instantaneous flow rate and the volume integrated since the last reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FlowState {
    pub flow_rate_l_per_min: f64,
    pub total_volume_l: f64,
}

/// [`FlowState`] shared between the estimator tick and its readers.
#[derive(Debug, Default)]
pub struct SharedFlow {
    state: Mutex<FlowState>,
}

impl SharedFlow {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FlowState> {
        // The state is two plain floats; a panicked writer cannot leave it
        // half-updated in a way that matters more than losing one tick.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Consistent copy of both fields.
    pub fn snapshot(&self) -> FlowState {
        *self.lock()
    }

    /// Zero the integrated volume. The instantaneous rate is left alone.
    pub fn reset_volume(&self) {
        self.lock().total_volume_l = 0.0;
    }

    fn apply_tick(&self, flow_rate_l_per_min: f64) -> FlowState {
        let mut state = self.lock();
        state.flow_rate_l_per_min = flow_rate_l_per_min;
        state.total_volume_l += flow_rate_l_per_min / 60.0;
        *state
    }
}

/// Periodic consumer of the pulse accumulator.
pub struct FlowEstimator<'a> {
    pulses: &'a PulseAccumulator,
    flow: Arc<SharedFlow>,
    calibration_factor: f64,
}

impl<'a> FlowEstimator<'a> {
    pub fn new(pulses: &'a PulseAccumulator, flow: Arc<SharedFlow>, calibration_factor: f64) -> Self {
        Self {
            pulses,
            flow,
            calibration_factor,
        }
    }

    /// One estimator period: drain, convert, integrate.
    pub fn tick(&self) -> FlowState {
        let count = self.pulses.drain();
        let flow_rate = f64::from(count) / self.calibration_factor;
        let state = self.flow.apply_tick(flow_rate);
        debug!(
            "Flow: {} pulses -> {:.2} L/min, total {:.3} L",
            count, state.flow_rate_l_per_min, state.total_volume_l
        );
        state
    }
}
