//! GPIO / peripheral pin assignments for the rain-gauge board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers. The I2C pins are consumed through the typed
//! `esp_idf_hal` peripherals in `main.rs`; keep them in sync with these
//! constants.

// ---------------------------------------------------------------------------
// I²C bus (rain gauge)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 21;
pub const I2C_SCL_GPIO: i32 = 22;

// ---------------------------------------------------------------------------
// Sensors: digital / pulse
// ---------------------------------------------------------------------------

/// Hall-effect flow sensor, pulse output, rising-edge interrupt.
pub const FLOW_PULSE_GPIO: i32 = 4;
