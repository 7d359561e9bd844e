//! Sensor subsystem: the I2C rain-gauge driver and the pulse-driven flow
//! measurement path.
//!
//! ```text
//!   RegisterBus ──▶ RainfallSensor ──▶ ControlLoop
//!   GPIO edge ──▶ PulseAccumulator ──▶ FlowEstimator ──▶ SharedFlow
//! ```

pub mod flow;
pub mod pulse;
pub mod rainfall;
pub mod registers;

use crate::error::BusFault;

/// Outcome of a non-critical register read.
///
/// Reads that only feed telemetry never fail the caller: a transport fault
/// substitutes the type's zero value and keeps the fault so the caller can
/// log it. Validation failures (identity) use `Result` instead.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sample<T> {
    /// The bus transaction succeeded.
    Fresh(T),
    /// The bus transaction failed; the zero value stands in.
    Defaulted(BusFault),
}

impl<T: Default> Sample<T> {
    /// The reading, or the zero value after a fault.
    pub fn value(self) -> T {
        match self {
            Self::Fresh(v) => v,
            Self::Defaulted(_) => T::default(),
        }
    }
}

impl<T> Sample<T> {
    pub fn fault(&self) -> Option<BusFault> {
        match self {
            Self::Fresh(_) => None,
            Self::Defaulted(f) => Some(*f),
        }
    }

    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Sample<U> {
        match self {
            Self::Fresh(v) => Sample::Fresh(f(v)),
            Self::Defaulted(e) => Sample::Defaulted(e),
        }
    }
}

impl<T> From<Result<T, BusFault>> for Sample<T> {
    fn from(r: Result<T, BusFault>) -> Self {
        match r {
            Ok(v) => Self::Fresh(v),
            Err(e) => Self::Defaulted(e),
        }
    }
}
