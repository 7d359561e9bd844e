//! Mock hardware for integration tests.
//!
//! `MockGauge` emulates the rain gauge at the I2C transaction level, so the
//! real [`I2cRegisterBus`] and [`RainfallSensor`] run on top of it. Tests
//! keep a [`GaugeHandle`] to change register contents between polls.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::Arc;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation, SevenBitAddress};

use raingauge::adapters::i2c_bus::I2cRegisterBus;
use raingauge::app::control::ControlLoop;
use raingauge::app::events::AppEvent;
use raingauge::app::ports::{EventSink, FlowTimer};
use raingauge::config::SystemConfig;
use raingauge::sensors::flow::SharedFlow;
use raingauge::sensors::pulse::PulseAccumulator;
use raingauge::sensors::rainfall::{RainfallSensor, SensorIdentity};
use raingauge::sensors::registers::{
    DEFAULT_ADDRESS, REG_CUMULATIVE_RAINFALL, REG_PID_VID, REG_RAIN_HOUR, REG_RAW_DATA,
    REG_SYS_TIME, REG_TIME_RAINFALL, REG_VERSION,
};
use raingauge::telemetry::Telemetry;

// ── Gauge state ───────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct GaugeRegs {
    pub regs: HashMap<u8, Vec<u8>>,
    /// Windowed rainfall (raw fixed-point) per selected window.
    pub windows: HashMap<u8, u32>,
    pub selected_window: Option<u8>,
    pub nack: bool,
}

#[derive(Debug, Clone, Default)]
pub struct GaugeHandle(Rc<RefCell<GaugeRegs>>);

#[allow(dead_code)]
impl GaugeHandle {
    /// A gauge reporting the expected identity and firmware 1.0.0.0.
    pub fn healthy() -> Self {
        let h = Self::default();
        h.set(REG_PID_VID, &SensorIdentity::EXPECTED.to_register());
        h.set(REG_VERSION, &0x1000u16.to_le_bytes());
        h
    }

    pub fn set(&self, register: u8, bytes: &[u8]) {
        self.0.borrow_mut().regs.insert(register, bytes.to_vec());
    }

    pub fn get(&self, register: u8) -> Option<Vec<u8>> {
        self.0.borrow().regs.get(&register).cloned()
    }

    pub fn set_cumulative_mm(&self, mm: f64) {
        self.set(REG_CUMULATIVE_RAINFALL, &((mm * 10_000.0).round() as u32).to_le_bytes());
    }

    pub fn set_window_mm(&self, hours: u8, mm: f64) {
        self.0
            .borrow_mut()
            .windows
            .insert(hours, (mm * 10_000.0).round() as u32);
    }

    pub fn set_tips(&self, tips: u32) {
        self.set(REG_RAW_DATA, &tips.to_le_bytes());
    }

    pub fn set_working_minutes(&self, minutes: u16) {
        self.set(REG_SYS_TIME, &minutes.to_le_bytes());
    }

    pub fn set_nack(&self, nack: bool) {
        self.0.borrow_mut().nack = nack;
    }

    pub fn selected_window(&self) -> Option<u8> {
        self.0.borrow().selected_window
    }
}

// ── MockGauge (embedded-hal I2C device) ───────────────────────

#[derive(Debug)]
pub struct Nack;

impl embedded_hal::i2c::Error for Nack {
    fn kind(&self) -> ErrorKind {
        ErrorKind::NoAcknowledge(NoAcknowledgeSource::Data)
    }
}

pub struct MockGauge {
    state: GaugeHandle,
}

impl MockGauge {
    pub fn new(state: GaugeHandle) -> Self {
        Self { state }
    }
}

impl ErrorType for MockGauge {
    type Error = Nack;
}

impl I2c<SevenBitAddress> for MockGauge {
    fn transaction(&mut self, address: u8, operations: &mut [Operation<'_>]) -> Result<(), Nack> {
        let mut st = self.state.0.borrow_mut();
        if st.nack || address != DEFAULT_ADDRESS {
            return Err(Nack);
        }

        let mut pointer: Option<u8> = None;
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    let Some((&reg, payload)) = bytes.split_first() else {
                        continue;
                    };
                    pointer = Some(reg);
                    if reg == REG_RAIN_HOUR {
                        st.selected_window = payload.first().copied();
                    } else if !payload.is_empty() {
                        st.regs.insert(reg, payload.to_vec());
                    }
                }
                Operation::Read(buf) => {
                    let reg = pointer.unwrap_or(0);
                    let data = if reg == REG_TIME_RAINFALL {
                        let raw = st
                            .selected_window
                            .and_then(|w| st.windows.get(&w).copied())
                            .unwrap_or(0);
                        raw.to_le_bytes().to_vec()
                    } else {
                        st.regs.get(&reg).cloned().unwrap_or_default()
                    };
                    for (i, b) in buf.iter_mut().enumerate() {
                        *b = data.get(i).copied().unwrap_or(0);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Delay that returns immediately.
pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

pub type MockSensor = RainfallSensor<I2cRegisterBus<MockGauge>, NoDelay>;

pub fn sensor(gauge: &GaugeHandle) -> MockSensor {
    RainfallSensor::new(
        I2cRegisterBus::new(MockGauge::new(gauge.clone()), DEFAULT_ADDRESS),
        NoDelay,
    )
}

// ── RecordingTimer ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCall {
    Start,
    Stop,
}

#[derive(Debug, Default)]
pub struct RecordingTimer {
    pub calls: Vec<TimerCall>,
    running: bool,
}

impl FlowTimer for RecordingTimer {
    fn start(&mut self) {
        self.calls.push(TimerCall::Start);
        self.running = true;
    }

    fn stop(&mut self) {
        self.calls.push(TimerCall::Stop);
        self.running = false;
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

pub struct Rig<'a> {
    pub gauge: GaugeHandle,
    pub flow: Arc<SharedFlow>,
    pub telemetry: Arc<Telemetry>,
    pub control: ControlLoop<'a, MockSensor, RecordingTimer, RecordingSink>,
}

/// Wire a control loop over a healthy mock gauge.
pub fn rig(pulses: &PulseAccumulator) -> Rig<'_> {
    let gauge = GaugeHandle::healthy();
    let flow = Arc::new(SharedFlow::new());
    let telemetry = Arc::new(Telemetry::new(Arc::clone(&flow)));
    let control = ControlLoop::new(
        &SystemConfig::default(),
        sensor(&gauge),
        RecordingTimer::default(),
        pulses,
        Arc::clone(&telemetry),
        RecordingSink::default(),
    );
    Rig {
        gauge,
        flow,
        telemetry,
        control,
    }
}
