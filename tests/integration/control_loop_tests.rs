//! Integration tests for the ControlLoop → Telemetry pipeline over the mock
//! gauge, including flow arming and the reset path.

use std::sync::Arc;

use raingauge::app::events::AppEvent;
use raingauge::sensors::flow::FlowEstimator;
use raingauge::sensors::pulse::PulseAccumulator;
use raingauge::sensors::registers::{REG_BASE_RAINFALL, REG_PID_VID};

use crate::mock_hw::{GaugeHandle, TimerCall, rig, sensor};

// ── End to end: one poll lands in the snapshot ────────────────

#[test]
fn single_poll_is_visible_in_snapshot() {
    let pulses = PulseAccumulator::new();
    let mut r = rig(&pulses);
    r.gauge.set_cumulative_mm(12.3456);
    r.gauge.set_window_mm(1, 1.23);
    r.gauge.set_tips(7);
    r.gauge.set_working_minutes(150);

    r.control.prime();
    let reading = r.control.step();

    assert_eq!(reading.raw_tip_count, 7);
    assert_eq!(reading.firmware_version.to_string(), "1.0.0.0");
    assert_eq!(r.gauge.selected_window(), Some(1));

    let snap = r.telemetry.snapshot();
    assert_eq!(snap.rainfall.as_slice(), &[12.3456]);
    assert_eq!(snap.hour_rainfall.as_slice(), &[1.23]);
    assert_eq!(snap.tips, 7);
    assert_eq!(snap.working_time, 2.5);
    assert_eq!(snap.total_volume.as_slice(), &[0.0]);
    assert_eq!(snap.flow_rate.as_slice(), &[0.0]);
}

#[test]
fn hourly_series_stores_deltas_after_first_entry() {
    let pulses = PulseAccumulator::new();
    let mut r = rig(&pulses);
    r.control.prime();

    for mm in [0.5, 0.8, 0.3] {
        r.gauge.set_window_mm(1, mm);
        r.control.step();
    }
    let snap = r.telemetry.snapshot();
    let got: Vec<f64> = snap.hour_rainfall.iter().map(|v| (v * 1e4).round() / 1e4).collect();
    assert_eq!(got, vec![0.5, 0.3, -0.5]);
}

// ── Arm / disarm ──────────────────────────────────────────────

#[test]
fn changing_window_arms_and_steady_window_disarms() {
    let pulses = PulseAccumulator::new();
    let mut r = rig(&pulses);
    r.gauge.set_window_mm(1, 0.0);
    r.control.prime();

    // Unchanged: stays idle, timer never touched.
    r.control.step();
    assert!(!r.control.is_measuring());
    assert!(r.control.timer().calls.is_empty());

    // Rain: arm + start.
    r.gauge.set_window_mm(1, 0.2);
    r.control.step();
    assert!(r.control.is_measuring());
    assert_eq!(r.control.timer().calls, vec![TimerCall::Start]);

    // Still raining: no second start.
    r.gauge.set_window_mm(1, 0.4);
    r.control.step();
    assert_eq!(r.control.timer().calls, vec![TimerCall::Start]);

    // Edges while armed, then steady: disarm discards them.
    for _ in 0..9 {
        pulses.on_edge();
    }
    r.control.step();
    assert!(!r.control.is_measuring());
    assert_eq!(r.control.timer().calls, vec![TimerCall::Start, TimerCall::Stop]);
    assert_eq!(pulses.pending(), 0);

    let sink = r.control.sink();
    assert_eq!(sink.count(|e| matches!(e, AppEvent::FlowArmed)), 1);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::FlowDisarmed { discarded_pulses: 9 })),
        1
    );
}

#[test]
fn logged_flow_matches_estimator_state() {
    let pulses = PulseAccumulator::new();
    let mut r = rig(&pulses);
    let estimator = FlowEstimator::new(&pulses, Arc::clone(&r.flow), 7.5);
    r.control.prime();

    r.gauge.set_window_mm(1, 0.1);
    r.control.step();
    for _ in 0..45 {
        pulses.on_edge();
    }
    estimator.tick(); // 6 L/min

    r.gauge.set_window_mm(1, 0.2);
    r.control.step();

    let snap = r.telemetry.snapshot();
    assert_eq!(snap.flow_rate.len(), 2);
    assert!((snap.flow_rate[1] - 6.0).abs() < 1e-12);
    assert!((snap.total_volume[1] - 0.1).abs() < 1e-12);
}

// ── Faults ────────────────────────────────────────────────────

#[test]
fn bus_fault_defaults_readings_and_keeps_running() {
    let pulses = PulseAccumulator::new();
    let mut r = rig(&pulses);
    r.gauge.set_cumulative_mm(3.0);
    r.control.prime();

    r.gauge.set_nack(true);
    let reading = r.control.step();
    assert_eq!(reading.cumulative_rainfall_mm, 0.0);
    assert_eq!(reading.raw_tip_count, 0);
    assert_eq!(r.telemetry.len(), 1);

    let defaulted = r
        .control
        .sink()
        .count(|e| matches!(e, AppEvent::SampleDefaulted { .. }));
    assert_eq!(defaulted, 4);

    r.gauge.set_nack(false);
    let reading = r.control.step();
    assert_eq!(reading.cumulative_rainfall_mm, 3.0);
}

#[test]
fn begin_rejects_foreign_device() {
    let gauge = GaugeHandle::healthy();
    gauge.set(REG_PID_VID, &[0x00, 0x00, 0x00, 0x00]);
    let mut s = sensor(&gauge);
    assert!(s.begin().is_err());
    assert_eq!(s.identity(), None);
}

#[test]
fn base_rainfall_write_reaches_device() {
    let gauge = GaugeHandle::healthy();
    let mut s = sensor(&gauge);
    assert!(s.set_base_rainfall(1.23456).is_ok());
    assert_eq!(gauge.get(REG_BASE_RAINFALL), Some(vec![0x39, 0x30]));
    gauge.set_nack(true);
    assert!(s.set_base_rainfall(1.0).is_err());
}

// ── Reset ─────────────────────────────────────────────────────

#[test]
fn reset_clears_log_and_zeroes_volume() {
    let pulses = PulseAccumulator::new();
    let mut r = rig(&pulses);
    let estimator = FlowEstimator::new(&pulses, Arc::clone(&r.flow), 7.5);
    r.control.prime();

    r.gauge.set_window_mm(1, 1.0);
    r.control.step();
    // 18 900 pulses / 7.5 = 2520 L/min; one tick adds 42 L.
    for _ in 0..18_900 {
        pulses.on_edge();
    }
    estimator.tick();
    for i in 0..4 {
        r.gauge.set_window_mm(1, 2.0 + f64::from(i));
        r.control.step();
    }
    assert_eq!(r.telemetry.len(), 5);
    assert_eq!(r.flow.snapshot().total_volume_l, 42.0);

    r.telemetry.reset();

    assert!(r.telemetry.is_empty());
    let snap = r.telemetry.snapshot();
    assert!(snap.rainfall.is_empty());
    assert!(snap.hour_rainfall.is_empty());
    assert!(snap.total_volume.is_empty());
    assert!(snap.flow_rate.is_empty());
    assert_eq!(r.flow.snapshot().total_volume_l, 0.0);
    // Armed state and flow rate survive a reset.
    assert!(r.control.is_measuring());
    assert_eq!(r.flow.snapshot().flow_rate_l_per_min, 2520.0);

    // The next poll starts a fresh delta series.
    r.gauge.set_window_mm(1, 9.0);
    r.control.step();
    assert_eq!(r.telemetry.snapshot().hour_rainfall.as_slice(), &[9.0]);
}
