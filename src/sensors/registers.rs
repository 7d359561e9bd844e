//! Register map of the I2C tipping-bucket rain gauge.
//!
//! All multi-byte registers are little-endian. Rainfall registers hold
//! fixed-point millimetres scaled by [`RAINFALL_SCALE`].

// ---------------------------------------------------------------------------
// Bus
// ---------------------------------------------------------------------------

/// Default 7-bit I2C address of the gauge.
pub const DEFAULT_ADDRESS: u8 = 0x1D;

// ---------------------------------------------------------------------------
// Registers (address, width in bytes)
// ---------------------------------------------------------------------------

/// Product ID (bytes 0-1, plus bits 7:6 of byte 3) and vendor ID (byte 2,
/// plus bits 5:0 of byte 3).
pub const REG_PID_VID: u8 = 0x00;
pub const PID_VID_LEN: usize = 4;

/// Firmware version, one nibble per field, major in the top nibble.
pub const REG_VERSION: u8 = 0x0A;
pub const VERSION_LEN: usize = 2;

/// Rainfall over the window selected through [`REG_RAIN_HOUR`].
pub const REG_TIME_RAINFALL: u8 = 0x0C;
pub const TIME_RAINFALL_LEN: usize = 4;

/// Rainfall accumulated since power-up (plus the base value).
pub const REG_CUMULATIVE_RAINFALL: u8 = 0x10;
pub const CUMULATIVE_RAINFALL_LEN: usize = 4;

/// Raw tipping-bucket count.
pub const REG_RAW_DATA: u8 = 0x14;
pub const RAW_DATA_LEN: usize = 4;

/// Device working time in minutes.
pub const REG_SYS_TIME: u8 = 0x18;
pub const SYS_TIME_LEN: usize = 2;

/// Window selector (hours) for [`REG_TIME_RAINFALL`]; write-only, 1 byte.
pub const REG_RAIN_HOUR: u8 = 0x26;

/// Base rainfall calibration; write-only, 2 bytes.
pub const REG_BASE_RAINFALL: u8 = 0x28;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

pub const EXPECTED_VENDOR_ID: u16 = 0x3343;
pub const EXPECTED_PRODUCT_ID: u32 = 0x100C0;

// ---------------------------------------------------------------------------
// Protocol constants
// ---------------------------------------------------------------------------

/// Fixed-point divisor for every rainfall register.
pub const RAINFALL_SCALE: f64 = 10_000.0;

/// Longest trailing window the device accepts (hours).
pub const MAX_WINDOW_HOURS: u8 = 24;

/// Delay after writing the window selector before the rainfall register
/// reflects the new window.
pub const WINDOW_SETTLE_MS: u32 = 50;
