//! Rain-gauge firmware: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  I2cRegisterBus   EspFlowTimer   LogEventSink   WiFi AP      │
//! │  (RegisterBus)    (FlowTimer)    (EventSink)    HTTP server  │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ───────────────────    │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  ControlLoop · RainfallSensor · FlowEstimator           │  │
//! │  │  PulseAccumulator (ISR) · Telemetry                     │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::units::Hertz;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{error, info, warn};

use raingauge::adapters::flow_timer::EspFlowTimer;
use raingauge::adapters::http::TelemetryServer;
use raingauge::adapters::i2c_bus::I2cRegisterBus;
use raingauge::adapters::log_sink::LogEventSink;
use raingauge::adapters::wifi;
use raingauge::app::control::ControlLoop;
use raingauge::app::events::AppEvent;
use raingauge::app::ports::EventSink;
use raingauge::config::SystemConfig;
use raingauge::drivers::{isr, task_pin};
use raingauge::error::{CommsError, Error};
use raingauge::sensors::flow::{FlowEstimator, SharedFlow};
use raingauge::sensors::pulse::FLOW_PULSES;
use raingauge::sensors::rainfall::RainfallSensor;
use raingauge::telemetry::Telemetry;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Rain gauge v{}                     ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = SystemConfig::default();
    config.validate()?;

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take().ok();

    // ── 2. Rain gauge on I2C0 ─────────────────────────────────
    let i2c_cfg = I2cConfig::new().baudrate(Hertz(config.i2c_freq_hz));
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21,
        peripherals.pins.gpio22,
        &i2c_cfg,
    )?;
    let mut sensor = RainfallSensor::new(I2cRegisterBus::new(i2c, config.i2c_address), FreeRtos);

    let mut sink = LogEventSink::new();
    match sensor.begin() {
        Ok(id) => info!(
            "Sensor: vendor 0x{:04X}, product 0x{:05X}",
            id.vendor_id, id.product_id
        ),
        Err(e) => sink.emit(&AppEvent::SensorUnverified(e)),
    }

    // ── 3. Flow measurement ───────────────────────────────────
    let flow = Arc::new(SharedFlow::new());
    let telemetry = Arc::new(Telemetry::new(Arc::clone(&flow)));

    let estimator: &'static FlowEstimator<'static> = Box::leak(Box::new(FlowEstimator::new(
        &FLOW_PULSES,
        Arc::clone(&flow),
        config.calibration_factor,
    )));
    let timer = EspFlowTimer::new(estimator, config.flow_tick_ms)?;
    if let Err(e) = isr::install_flow_isr() {
        error!("Flow ISR install failed: {}, volume will stay at zero", e);
    }

    // ── 4. Access point + telemetry server ────────────────────
    let _wifi = wifi::start_access_point(peripherals.modem, sysloop, nvs, &config)?;

    let server = TelemetryServer::bind(
        config.http_port,
        Arc::clone(&telemetry),
        config.request_buffer_len,
        Duration::from_millis(u64::from(config.http_io_timeout_ms)),
    )
    .map_err(|e| {
        warn!("HTTP bind failed: {}", e);
        Error::Comms(CommsError::BindFailed)
    })?;
    task_pin::spawn_on_core(task_pin::HTTP_TASK, move || {
        server.run();
    })?;

    // ── 5. Control loop (never returns) ───────────────────────
    let mut control = ControlLoop::new(&config, sensor, timer, &FLOW_PULSES, telemetry, sink);
    control.run()
}
