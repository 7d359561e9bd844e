//! Measurement control loop: the domain core.
//!
//! ```text
//!  RainSensor ──▶ ┌──────────────────┐ ──▶ EventSink
//!                 │   ControlLoop     │
//!   FlowTimer ◀── │  arm · save      │ ──▶ Telemetry
//!                 └──────────────────┘
//! ```
//!
//! Every poll reads the windowed rainfall, cumulative rainfall, tip count
//! and working time, then compares the windowed value with the previous
//! poll. A change means rain is falling: pulse counting is armed and the
//! flow timer runs. No change disarms both and throws away any residual
//! pulses. The poll is then appended to the telemetry log together with
//! the live flow state.

use std::sync::Arc;
use std::time::Duration;

use log::info;

use crate::config::SystemConfig;
use crate::sensors::Sample;
use crate::sensors::pulse::PulseAccumulator;
use crate::sensors::rainfall::{FirmwareVersion, SensorReading};
use crate::telemetry::Telemetry;

use super::events::AppEvent;
use super::ports::{EventSink, FlowTimer, RainSensor};

pub struct ControlLoop<'a, S, T, E> {
    sensor: S,
    timer: T,
    pulses: &'a PulseAccumulator,
    telemetry: Arc<Telemetry>,
    sink: E,
    window_hours: u8,
    poll_interval: Duration,
    prev_windowed_mm: Option<f64>,
    firmware: FirmwareVersion,
}

impl<'a, S: RainSensor, T: FlowTimer, E: EventSink> ControlLoop<'a, S, T, E> {
    pub fn new(
        config: &SystemConfig,
        sensor: S,
        timer: T,
        pulses: &'a PulseAccumulator,
        telemetry: Arc<Telemetry>,
        sink: E,
    ) -> Self {
        Self {
            sensor,
            timer,
            pulses,
            telemetry,
            sink,
            window_hours: config.rain_window_hours,
            poll_interval: Duration::from_millis(u64::from(config.poll_interval_ms)),
            prev_windowed_mm: None,
            firmware: FirmwareVersion::default(),
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Take the baseline windowed sample and read the firmware version.
    ///
    /// Without a baseline the first poll has nothing to compare against
    /// and counts as "no change".
    pub fn prime(&mut self) {
        let firmware = self.sample("firmware_version", |s| s.read_firmware_version());
        let windowed = self.read_windowed();
        self.firmware = firmware;
        self.prev_windowed_mm = Some(windowed);
        self.sink.emit(&AppEvent::Started {
            window_hours: self.window_hours,
            firmware,
            initial_windowed_mm: windowed,
        });
    }

    /// One poll. Returns the reading that was logged.
    pub fn step(&mut self) -> SensorReading {
        let windowed = self.read_windowed();
        let cumulative = self.sample("cumulative_rainfall", |s| s.read_cumulative_rainfall_mm());
        let tips = self.sample("raw_tip_count", |s| s.read_raw_tip_count());
        let working = self.sample("working_time", |s| s.read_working_time_hours());

        let changed = self.prev_windowed_mm.is_some_and(|prev| prev != windowed);
        if changed {
            self.arm();
        } else {
            self.disarm();
        }
        self.prev_windowed_mm = Some(windowed);

        let working_rounded = round_hundredths(working);
        let flow = self
            .telemetry
            .record(cumulative, windowed, tips, working_rounded);

        let reading = SensorReading {
            cumulative_rainfall_mm: cumulative,
            hourly_rainfall_mm: windowed,
            raw_tip_count: tips,
            working_time_hours: working_rounded,
            firmware_version: self.firmware,
        };
        self.sink.emit(&AppEvent::Reading { reading, flow });
        reading
    }

    /// Prime, then poll forever at the configured interval.
    pub fn run(&mut self) -> ! {
        self.prime();
        info!(
            "Control: polling every {} ms ({} h window)",
            self.poll_interval.as_millis(),
            self.window_hours
        );
        loop {
            self.step();
            std::thread::sleep(self.poll_interval);
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Whether the last poll left flow measurement armed.
    pub fn is_measuring(&self) -> bool {
        self.pulses.is_armed()
    }

    pub fn firmware(&self) -> FirmwareVersion {
        self.firmware
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn sink(&self) -> &E {
        &self.sink
    }

    // ── Internals ─────────────────────────────────────────────

    fn read_windowed(&mut self) -> f64 {
        let window = self.window_hours;
        self.sample("windowed_rainfall", |s| s.read_windowed_rainfall_mm(window))
    }

    fn sample<V: Default>(&mut self, quantity: &'static str, read: impl FnOnce(&mut S) -> Sample<V>) -> V {
        let sample = read(&mut self.sensor);
        if let Some(fault) = sample.fault() {
            self.sink.emit(&AppEvent::SampleDefaulted { quantity, fault });
        }
        sample.value()
    }

    fn arm(&mut self) {
        let was_armed = self.pulses.is_armed();
        self.pulses.arm();
        if !self.timer.is_running() {
            self.timer.start();
        }
        if !was_armed {
            self.sink.emit(&AppEvent::FlowArmed);
        }
    }

    fn disarm(&mut self) {
        let was_armed = self.pulses.is_armed();
        let discarded_pulses = self.pulses.disarm();
        if self.timer.is_running() {
            self.timer.stop();
        }
        if was_armed {
            self.sink.emit(&AppEvent::FlowDisarmed { discarded_pulses });
        }
    }
}

/// Round to two decimal places, half away from zero.
pub fn round_hundredths(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
