//! Unified error types for the rain-gauge firmware.
//!
//! A single `Error` enum that every subsystem can convert into, keeping the
//! startup path and the control loop's error handling uniform. All variants
//! are `Copy` so they can be carried inside [`AppEvent`](crate::app::events::AppEvent)s
//! and [`Sample`](crate::sensors::Sample)s without allocation.

use core::fmt;

use embedded_hal::i2c::ErrorKind;

use crate::sensors::rainfall::SensorIdentity;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation in the firmware funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A register transaction failed at the transport level.
    Bus(BusFault),
    /// The sensor answered but failed validation.
    Sensor(SensorError),
    /// A communication subsystem failed.
    Comms(CommsError),
    /// Peripheral initialisation failed.
    Init(&'static str),
    /// Configuration is invalid.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bus(e) => write!(f, "bus: {e}"),
            Self::Sensor(e) => write!(f, "sensor: {e}"),
            Self::Comms(e) => write!(f, "comms: {e}"),
            Self::Init(msg) => write!(f, "init: {msg}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Bus faults
// ---------------------------------------------------------------------------

/// Direction of the register transaction that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusOp {
    Read,
    Write,
}

/// A failed register transaction: which register, which direction, and the
/// transport's classification of the failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusFault {
    pub register: u8,
    pub op: BusOp,
    pub kind: ErrorKind,
}

impl BusFault {
    pub const fn read(register: u8, kind: ErrorKind) -> Self {
        Self { register, op: BusOp::Read, kind }
    }

    pub const fn write(register: u8, kind: ErrorKind) -> Self {
        Self { register, op: BusOp::Write, kind }
    }
}

impl fmt::Display for BusFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.op {
            BusOp::Read => "read",
            BusOp::Write => "write",
        };
        write!(f, "{} of register 0x{:02X} failed ({})", op, self.register, self.kind)
    }
}

impl From<BusFault> for Error {
    fn from(e: BusFault) -> Self {
        Self::Bus(e)
    }
}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// The PID/VID register decoded to an identity other than the expected one.
    IdentityMismatch(SensorIdentity),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IdentityMismatch(id) => write!(
                f,
                "unexpected device identity (vid=0x{:04X}, pid=0x{:05X})",
                id.vendor_id, id.product_id
            ),
        }
    }
}

impl From<SensorError> for Error {
    fn from(e: SensorError) -> Self {
        Self::Sensor(e)
    }
}

// ---------------------------------------------------------------------------
// Communications errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommsError {
    AccessPointFailed,
    BindFailed,
    InvalidSsid,
    InvalidPassword,
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessPointFailed => write!(f, "WiFi access point bring-up failed"),
            Self::BindFailed => write!(f, "HTTP listener bind failed"),
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => {
                write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)")
            }
        }
    }
}

impl From<CommsError> for Error {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
