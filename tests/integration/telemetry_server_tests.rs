//! Integration tests for the telemetry HTTP server over a loopback socket.

use std::io::{Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::{Duration, Instant};

use raingauge::adapters::http::{HttpError, Route, TelemetryServer};
use raingauge::sensors::flow::{FlowEstimator, SharedFlow};
use raingauge::sensors::pulse::PulseAccumulator;
use raingauge::telemetry::Telemetry;

const IO_TIMEOUT: Duration = Duration::from_millis(200);

fn server(telemetry: &Arc<Telemetry>) -> TelemetryServer {
    TelemetryServer::bind(0, Arc::clone(telemetry), 1024, IO_TIMEOUT).unwrap()
}

/// Send one raw request and return (route served, full response).
fn exchange(server: &TelemetryServer, request: &str) -> (Route, String) {
    let port = server.local_addr().unwrap().port();
    std::thread::scope(|s| {
        let handle = s.spawn(|| server.serve_one());

        let mut client = TcpStream::connect(("127.0.0.1", port)).unwrap();
        client.write_all(request.as_bytes()).unwrap();
        let mut response = String::new();
        client.read_to_string(&mut response).unwrap();

        let route = handle.join().unwrap().unwrap();
        (route, response)
    })
}

fn body(response: &str) -> &str {
    response.split_once("\n\n").map(|(_, b)| b).unwrap()
}

#[test]
fn get_readings_returns_exact_json_document() {
    let telemetry = Arc::new(Telemetry::new(Arc::new(SharedFlow::new())));
    telemetry.record(12.3456, 1.23, 7, 2.5);
    let srv = server(&telemetry);

    let (route, resp) = exchange(&srv, "GET /readings HTTP/1.1\r\nHost: 192.168.4.1\r\n\r\n");
    assert_eq!(route, Route::Readings);
    assert!(resp.starts_with("HTTP/1.1 200 OK\nContent-Type: application/json\nConnection: close\n\n"));
    assert_eq!(
        body(&resp),
        r#"{"rainfall":[12.3456],"hour_rainfall":[1.23],"total_volume":[0.0],"flow_rate":[0.0],"tips":7,"working_time":2.5}"#
    );
}

#[test]
fn post_reset_empties_series_and_volume() {
    static PULSES: PulseAccumulator = PulseAccumulator::new();
    let flow = Arc::new(SharedFlow::new());
    let telemetry = Arc::new(Telemetry::new(Arc::clone(&flow)));
    let estimator = FlowEstimator::new(&PULSES, Arc::clone(&flow), 7.5);

    PULSES.arm();
    for _ in 0..18_900 {
        PULSES.on_edge();
    }
    estimator.tick();
    for i in 0..5 {
        telemetry.record(f64::from(i), 0.1, 3, 1.0);
    }
    assert_eq!(flow.snapshot().total_volume_l, 42.0);

    let srv = server(&telemetry);
    let (route, resp) = exchange(&srv, "POST /reset HTTP/1.1\r\nContent-Length: 0\r\n\r\n");
    assert_eq!(route, Route::Reset);
    assert!(resp.contains("Content-Type: text/plain\n"));
    assert_eq!(body(&resp), "Reset successful");

    let (_, resp) = exchange(&srv, "GET /readings HTTP/1.1\r\n\r\n");
    let v: serde_json::Value = serde_json::from_str(body(&resp)).unwrap();
    for key in ["rainfall", "hour_rainfall", "total_volume", "flow_rate"] {
        assert_eq!(v[key], serde_json::json!([]), "{key} should be empty");
    }
    assert_eq!(flow.snapshot().total_volume_l, 0.0);
}

#[test]
fn other_paths_get_the_dashboard() {
    let telemetry = Arc::new(Telemetry::new(Arc::new(SharedFlow::new())));
    let srv = server(&telemetry);

    let (route, resp) = exchange(&srv, "GET / HTTP/1.1\r\n\r\n");
    assert_eq!(route, Route::Dashboard);
    assert!(resp.starts_with("HTTP/1.1 200 OK\nContent-Type: text/html\nConnection: close\n\n"));
    assert!(body(&resp).contains("<!DOCTYPE html>"));
}

#[test]
fn server_survives_a_silent_client() {
    let telemetry = Arc::new(Telemetry::new(Arc::new(SharedFlow::new())));
    let srv = server(&telemetry);
    let port = srv.local_addr().unwrap().port();

    std::thread::scope(|s| {
        let handle = s.spawn(|| srv.serve_one());
        drop(TcpStream::connect(("127.0.0.1", port)).unwrap());
        assert!(handle.join().unwrap().is_err());
    });

    let (route, _) = exchange(&srv, "GET /readings HTTP/1.1\r\n\r\n");
    assert_eq!(route, Route::Readings);
}

#[test]
fn idle_client_times_out_and_next_request_is_served() {
    let telemetry = Arc::new(Telemetry::new(Arc::new(SharedFlow::new())));
    telemetry.record(3.0, 0.5, 2, 1.0);
    let srv = server(&telemetry);
    let port = srv.local_addr().unwrap().port();

    std::thread::scope(|s| {
        let handle = s.spawn(|| (srv.serve_one(), srv.serve_one()));

        // Connected first and never sends a byte.
        let idle = TcpStream::connect(("127.0.0.1", port)).unwrap();

        let started = Instant::now();
        let mut client = TcpStream::connect(("127.0.0.1", port)).unwrap();
        client.set_read_timeout(Some(Duration::from_secs(5))).unwrap();
        client.write_all(b"GET /readings HTTP/1.1\r\n\r\n").unwrap();
        let mut response = String::new();
        client.read_to_string(&mut response).unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));

        let (first, second) = handle.join().unwrap();
        assert!(matches!(first, Err(HttpError::Io(_))));
        assert_eq!(second.unwrap(), Route::Readings);
        assert!(body(&response).starts_with(r#"{"rainfall":[3.0]"#));
        drop(idle);
    });
}
