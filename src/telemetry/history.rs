//! Bounded telemetry history.
//!
//! Four parallel series (cumulative rainfall, hourly delta, total volume,
//! flow rate) stored as one FIFO of [`LogEntry`] so they can never drift
//! out of lockstep. Tip count and working time are scalars: only the
//! latest value is kept.

use heapless::Deque;
use serde::Serialize;

/// Entries retained before the oldest is evicted.
pub const LOG_CAPACITY: usize = 10;

/// One saved poll.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LogEntry {
    pub cumulative_rainfall_mm: f64,
    /// Raw windowed sample for the first entry after a reset, otherwise the
    /// change since the previous sample. May be negative.
    pub hourly_rainfall_delta_mm: f64,
    pub total_volume_l: f64,
    pub flow_rate_l_per_min: f64,
}

/// Immutable copy of the log, shaped for the `/readings` JSON body.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelemetrySnapshot {
    pub rainfall: heapless::Vec<f64, LOG_CAPACITY>,
    pub hour_rainfall: heapless::Vec<f64, LOG_CAPACITY>,
    pub total_volume: heapless::Vec<f64, LOG_CAPACITY>,
    pub flow_rate: heapless::Vec<f64, LOG_CAPACITY>,
    pub tips: u32,
    pub working_time: f64,
}

#[derive(Debug, Default)]
pub struct TelemetryLog {
    entries: Deque<LogEntry, LOG_CAPACITY>,
    /// Last raw windowed sample, the base for the next delta.
    prev_windowed_mm: Option<f64>,
    tips: u32,
    working_time_hours: f64,
}

impl TelemetryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one poll, evicting the oldest entry when full.
    pub fn save(
        &mut self,
        cumulative_mm: f64,
        windowed_mm: f64,
        total_volume_l: f64,
        flow_rate_l_per_min: f64,
        tips: u32,
        working_time_hours: f64,
    ) {
        let delta = match self.prev_windowed_mm {
            Some(prev) => windowed_mm - prev,
            None => windowed_mm,
        };
        self.prev_windowed_mm = Some(windowed_mm);

        if self.entries.is_full() {
            self.entries.pop_front();
        }
        // Cannot fail: a slot was freed above when full.
        let _ = self.entries.push_back(LogEntry {
            cumulative_rainfall_mm: cumulative_mm,
            hourly_rainfall_delta_mm: delta,
            total_volume_l,
            flow_rate_l_per_min,
        });

        self.tips = tips;
        self.working_time_hours = working_time_hours;
    }

    /// Drop every entry. The scalars keep their last values until the next
    /// save overwrites them.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.prev_windowed_mm = None;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tips(&self) -> u32 {
        self.tips
    }

    pub fn working_time_hours(&self) -> f64 {
        self.working_time_hours
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let mut snap = TelemetrySnapshot {
            tips: self.tips,
            working_time: self.working_time_hours,
            ..TelemetrySnapshot::default()
        };
        // Each series has the same capacity as the deque.
        for e in self.entries.iter() {
            let _ = snap.rainfall.push(e.cumulative_rainfall_mm);
            let _ = snap.hour_rainfall.push(e.hourly_rainfall_delta_mm);
            let _ = snap.total_volume.push(e.total_volume_l);
            let _ = snap.flow_rate.push(e.flow_rate_l_per_min);
        }
        snap
    }
}
