//! Edge-triggered pulse accumulator for the hall-effect flow sensor.
//!
//! The GPIO ISR increments the counter on each rising edge; the flow
//! estimator drains it once per tick. An edge that lands in the middle of
//! a drain is counted exactly once: either in this drain or the next.
//!
//! Counting is gated by an armed flag owned by the control loop. Edges
//! that arrive while disarmed are ignored. The flag and the count share
//! one atomic word (flag in bit 31), so an edge on one core can never be
//! counted after `disarm` on the other core has cleared the count.

use core::sync::atomic::{AtomicU32, Ordering};

const ARMED: u32 = 1 << 31;
const COUNT_MASK: u32 = ARMED - 1;

/// Process-wide accumulator wired to the flow GPIO.
/// `static` because ISR callbacks in ESP-IDF cannot capture closures.
pub static FLOW_PULSES: PulseAccumulator = PulseAccumulator::new();

/// Called from the GPIO ISR on each rising edge.
pub fn flow_isr_handler() {
    FLOW_PULSES.on_edge();
}

pub struct PulseAccumulator {
    /// Bit 31: armed. Bits 0-30: pulses since the last drain (saturating).
    state: AtomicU32,
}

impl Default for PulseAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl PulseAccumulator {
    /// A disarmed accumulator with no pending pulses.
    pub const fn new() -> Self {
        Self {
            state: AtomicU32::new(0),
        }
    }

    /// Edge callback. Lock-free, safe to call from interrupt context.
    ///
    /// The armed check and the increment are one compare-and-swap.
    pub fn on_edge(&self) {
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |s| {
                (s & ARMED != 0).then(|| ARMED | (s & COUNT_MASK).saturating_add(1).min(COUNT_MASK))
            });
    }

    /// Start counting edges.
    pub fn arm(&self) {
        self.state.fetch_or(ARMED, Ordering::AcqRel);
    }

    /// Stop counting and discard any residual pulses. Returns how many
    /// pulses were discarded.
    pub fn disarm(&self) -> u32 {
        self.state.swap(0, Ordering::AcqRel) & COUNT_MASK
    }

    pub fn is_armed(&self) -> bool {
        self.state.load(Ordering::Acquire) & ARMED != 0
    }

    /// Atomically take every pulse counted since the previous drain.
    pub fn drain(&self) -> u32 {
        self.state.fetch_and(ARMED, Ordering::AcqRel) & COUNT_MASK
    }

    /// Pulses counted but not yet drained.
    pub fn pending(&self) -> u32 {
        self.state.load(Ordering::Acquire) & COUNT_MASK
    }
}
