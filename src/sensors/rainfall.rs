//! I2C tipping-bucket rain-gauge driver.
//!
//! Owns every detail of the register layout: identity bit-packing, nibble
//! versions and the fixed-point rainfall encoding. The bus itself is reached
//! only through the [`RegisterBus`] port, so the driver runs unchanged
//! against the ESP-IDF I2C peripheral or a host-side mock.
//!
//! ## Fault policy
//!
//! - [`read_identity`](RainfallSensor::read_identity) is a go/no-go gate and
//!   reports every failure.
//! - Every telemetry read returns a [`Sample`]: a transport fault substitutes
//!   zero so a single flaky transaction cannot stall the control loop.

use core::fmt;

use embedded_hal::delay::DelayNs;
use log::{debug, info};

use super::Sample;
use super::registers::{
    EXPECTED_PRODUCT_ID, EXPECTED_VENDOR_ID, MAX_WINDOW_HOURS, PID_VID_LEN, RAINFALL_SCALE,
    REG_BASE_RAINFALL, REG_CUMULATIVE_RAINFALL, REG_PID_VID, REG_RAIN_HOUR, REG_RAW_DATA,
    REG_SYS_TIME, REG_TIME_RAINFALL, REG_VERSION, WINDOW_SETTLE_MS,
};
use crate::app::ports::{RainSensor, RegisterBus};
use crate::error::{BusFault, Result, SensorError};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Vendor / product pair reported by the PID/VID register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorIdentity {
    /// 14 significant bits.
    pub vendor_id: u16,
    /// 18 significant bits.
    pub product_id: u32,
}

impl SensorIdentity {
    pub const EXPECTED: Self = Self {
        vendor_id: EXPECTED_VENDOR_ID,
        product_id: EXPECTED_PRODUCT_ID,
    };

    /// Unpack the 4-byte PID/VID register.
    ///
    /// The two high product-ID bits live in bits 7:6 of byte 3 and land at
    /// bits 17:16; bits 5:0 of the same byte are the vendor ID's high bits.
    pub fn from_register(raw: [u8; PID_VID_LEN]) -> Self {
        let product_id =
            u32::from(raw[0]) | (u32::from(raw[1]) << 8) | ((u32::from(raw[3]) & 0xC0) << 10);
        let vendor_id = u16::from(raw[2]) | ((u16::from(raw[3]) & 0x3F) << 8);
        Self { vendor_id, product_id }
    }

    /// Inverse of [`from_register`](Self::from_register) for in-range IDs.
    pub fn to_register(self) -> [u8; PID_VID_LEN] {
        [
            (self.product_id & 0xFF) as u8,
            ((self.product_id >> 8) & 0xFF) as u8,
            (self.vendor_id & 0xFF) as u8,
            (((self.product_id >> 10) & 0xC0) as u8) | (((self.vendor_id >> 8) & 0x3F) as u8),
        ]
    }

    pub fn is_expected(&self) -> bool {
        *self == Self::EXPECTED
    }
}

// ---------------------------------------------------------------------------
// Firmware version
// ---------------------------------------------------------------------------

/// Four-nibble firmware version, displayed as `major.minor.patch.build`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FirmwareVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
    pub build: u8,
}

impl FirmwareVersion {
    pub fn from_raw(raw: u16) -> Self {
        Self {
            major: (raw >> 12) as u8,
            minor: ((raw >> 8) & 0x0F) as u8,
            patch: ((raw >> 4) & 0x0F) as u8,
            build: (raw & 0x0F) as u8,
        }
    }

    pub fn as_tuple(self) -> (u8, u8, u8, u8) {
        (self.major, self.minor, self.patch, self.build)
    }
}

impl fmt::Display for FirmwareVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.major, self.minor, self.patch, self.build)
    }
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

/// One full poll of the gauge.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorReading {
    pub cumulative_rainfall_mm: f64,
    pub hourly_rainfall_mm: f64,
    pub raw_tip_count: u32,
    pub working_time_hours: f64,
    pub firmware_version: FirmwareVersion,
}

/// Convert a raw fixed-point rainfall register to millimetres.
pub fn rainfall_mm(raw: u32) -> f64 {
    f64::from(raw) / RAINFALL_SCALE
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Rain-gauge driver over any [`RegisterBus`].
pub struct RainfallSensor<B, D> {
    bus: B,
    delay: D,
    identity: Option<SensorIdentity>,
}

impl<B: RegisterBus, D: DelayNs> RainfallSensor<B, D> {
    pub fn new(bus: B, delay: D) -> Self {
        Self {
            bus,
            delay,
            identity: None,
        }
    }

    /// Verify the device and cache its identity.
    ///
    /// Called once at startup. A failure leaves the driver usable; the
    /// caller decides whether to proceed with an unverified sensor.
    pub fn begin(&mut self) -> Result<SensorIdentity> {
        let id = self.read_identity()?;
        self.identity = Some(id);
        info!(
            "Rain gauge: verified (vid=0x{:04X}, pid=0x{:05X})",
            id.vendor_id, id.product_id
        );
        Ok(id)
    }

    /// Identity cached by a successful [`begin`](Self::begin).
    pub fn identity(&self) -> Option<SensorIdentity> {
        self.identity
    }

    /// Read and validate the PID/VID register.
    pub fn read_identity(&mut self) -> Result<SensorIdentity> {
        let mut raw = [0u8; PID_VID_LEN];
        self.bus.read_bytes(REG_PID_VID, &mut raw)?;
        let id = SensorIdentity::from_register(raw);
        if !id.is_expected() {
            return Err(SensorError::IdentityMismatch(id).into());
        }
        Ok(id)
    }

    /// Write the base-rainfall calibration (millimetres).
    ///
    /// The value is truncated to a fixed-point integer and only its low 16
    /// bits fit the register.
    pub fn set_base_rainfall(&mut self, value_mm: f64) -> core::result::Result<(), BusFault> {
        let raw = (value_mm * RAINFALL_SCALE) as i64 as u16;
        debug!("Rain gauge: base rainfall {} mm (raw {})", value_mm, raw);
        self.bus.write_bytes(REG_BASE_RAINFALL, &raw.to_le_bytes())
    }

    /// Give the bus and delay back (used by tests to inspect the mock).
    pub fn release(self) -> (B, D) {
        (self.bus, self.delay)
    }

    fn read_u16(&mut self, register: u8) -> core::result::Result<u16, BusFault> {
        let mut raw = [0u8; 2];
        self.bus.read_bytes(register, &mut raw)?;
        Ok(u16::from_le_bytes(raw))
    }

    fn read_u32(&mut self, register: u8) -> core::result::Result<u32, BusFault> {
        let mut raw = [0u8; 4];
        self.bus.read_bytes(register, &mut raw)?;
        Ok(u32::from_le_bytes(raw))
    }

    fn select_and_read_window(&mut self, window_hours: u8) -> core::result::Result<u32, BusFault> {
        self.bus.write_bytes(REG_RAIN_HOUR, &[window_hours])?;
        self.delay.delay_ms(WINDOW_SETTLE_MS);
        self.read_u32(REG_TIME_RAINFALL)
    }
}

impl<B: RegisterBus, D: DelayNs> RainSensor for RainfallSensor<B, D> {
    fn read_firmware_version(&mut self) -> Sample<FirmwareVersion> {
        Sample::from(self.read_u16(REG_VERSION)).map(FirmwareVersion::from_raw)
    }

    fn read_working_time_hours(&mut self) -> Sample<f64> {
        Sample::from(self.read_u16(REG_SYS_TIME)).map(|minutes| f64::from(minutes) / 60.0)
    }

    fn read_cumulative_rainfall_mm(&mut self) -> Sample<f64> {
        Sample::from(self.read_u32(REG_CUMULATIVE_RAINFALL)).map(rainfall_mm)
    }

    fn read_windowed_rainfall_mm(&mut self, window_hours: u8) -> Sample<f64> {
        if window_hours > MAX_WINDOW_HOURS {
            return Sample::Fresh(0.0);
        }
        Sample::from(self.select_and_read_window(window_hours)).map(rainfall_mm)
    }

    fn read_raw_tip_count(&mut self) -> Sample<u32> {
        Sample::from(self.read_u32(REG_RAW_DATA))
    }
}
