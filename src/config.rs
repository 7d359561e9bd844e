//! System configuration parameters
//!
//! All tunable parameters for the rain-gauge firmware. The compiled-in
//! defaults reproduce the reference cadence: a 3 s poll, a 1 s flow tick
//! and a 7.5 pulses/(L/min) flow-sensor calibration.

use serde::{Deserialize, Serialize};

use crate::adapters::wifi;
use crate::error::{Error, Result};

/// Core system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Sensor bus ---
    /// 7-bit I2C address of the rain gauge
    pub i2c_address: u8,
    /// I2C bus clock (Hz)
    pub i2c_freq_hz: u32,
    /// Trailing window (hours) polled for the hourly series
    pub rain_window_hours: u8,

    // --- Flow ---
    /// Pulses per second produced by 1 L/min of flow
    pub calibration_factor: f64,

    // --- Timing ---
    /// Control loop poll interval (milliseconds)
    pub poll_interval_ms: u32,
    /// Flow estimator tick period (milliseconds)
    pub flow_tick_ms: u32,

    // --- Network ---
    /// Access point SSID
    pub ap_ssid: String,
    /// Access point WPA2 password (empty = open network)
    pub ap_password: String,
    /// Listening port of the telemetry server
    pub http_port: u16,
    /// Bytes read from a client before the request is dispatched
    pub request_buffer_len: usize,
    /// Per-connection socket read/write timeout (milliseconds)
    pub http_io_timeout_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Sensor bus
            i2c_address: crate::sensors::registers::DEFAULT_ADDRESS,
            i2c_freq_hz: 400_000,
            rain_window_hours: 1,

            // Flow
            calibration_factor: 7.5,

            // Timing
            poll_interval_ms: 3000,
            flow_tick_ms: 1000,

            // Network
            ap_ssid: String::from("RainfallMonitor"),
            ap_password: String::from("rainfall123"),
            http_port: 8080,
            request_buffer_len: 1024,
            http_io_timeout_ms: 5000,
        }
    }
}

impl SystemConfig {
    /// Reject values the firmware cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.i2c_address > 0x7F {
            return Err(Error::Config("i2c_address must be a 7-bit address"));
        }
        if self.rain_window_hours == 0 || self.rain_window_hours > 24 {
            return Err(Error::Config("rain_window_hours must be within 1-24"));
        }
        if self.calibration_factor.is_nan() || self.calibration_factor <= 0.0 {
            return Err(Error::Config("calibration_factor must be positive"));
        }
        if self.poll_interval_ms == 0 || self.flow_tick_ms == 0 {
            return Err(Error::Config("intervals must be non-zero"));
        }
        if self.request_buffer_len == 0 {
            return Err(Error::Config("request_buffer_len must be non-zero"));
        }
        if self.http_io_timeout_ms == 0 {
            return Err(Error::Config("http_io_timeout_ms must be non-zero"));
        }
        wifi::validate_credentials(&self.ap_ssid, &self.ap_password)?;
        Ok(())
    }
}
