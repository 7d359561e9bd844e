//! Telemetry HTTP server.
//!
//! A minimal blocking HTTP/1.1 responder on `std::net` (lwIP on target).
//! One connection at a time: read a single request chunk, route it by
//! substring, write the response and close. Every accepted socket gets a
//! read and write timeout, so a client that connects and goes quiet costs
//! the server at most one timeout before the next connection is accepted.
//!
//! | Request contains | Response                         | Content-Type       |
//! |------------------|----------------------------------|--------------------|
//! | `GET /readings`  | JSON [`TelemetrySnapshot`]       | `application/json` |
//! | `POST /reset`    | `Reset successful`               | `text/plain`       |
//! | anything else    | dashboard page                   | `text/html`        |
//!
//! Handlers take what they need from [`Telemetry`] under its lock and
//! serialize after releasing it, so no lock is held across a send.

use core::fmt;
use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::telemetry::{Telemetry, TelemetrySnapshot};

/// Body returned by `POST /reset`.
pub const RESET_BODY: &str = "Reset successful";

/// Static dashboard served for every unmatched route.
pub const DASHBOARD_HTML: &str = include_str!("dashboard.html");

// ───────────────────────────────────────────────────────────────
// Error type
// ───────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum HttpError {
    /// Socket read or write failed or timed out.
    Io(io::Error),
    /// Snapshot could not be rendered as JSON.
    Encode(serde_json::Error),
    /// Client closed before sending anything.
    EmptyRequest,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "socket I/O: {}", e),
            Self::Encode(e) => write!(f, "JSON encode: {}", e),
            Self::EmptyRequest => write!(f, "empty request"),
        }
    }
}

impl std::error::Error for HttpError {}

impl From<io::Error> for HttpError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for HttpError {
    fn from(e: serde_json::Error) -> Self {
        Self::Encode(e)
    }
}

// ───────────────────────────────────────────────────────────────
// Routing
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Readings,
    Reset,
    Dashboard,
}

impl Route {
    /// Substring match over the raw request, readings checked first.
    pub fn from_request(request: &str) -> Self {
        if request.contains("GET /readings") {
            Self::Readings
        } else if request.contains("POST /reset") {
            Self::Reset
        } else {
            Self::Dashboard
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Readings => "application/json",
            Self::Reset => "text/plain",
            Self::Dashboard => "text/html",
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Handlers
// ───────────────────────────────────────────────────────────────

/// JSON body for `GET /readings`.
pub fn handle_get_readings(telemetry: &Telemetry) -> Result<String, serde_json::Error> {
    let snapshot: TelemetrySnapshot = telemetry.snapshot();
    serde_json::to_string(&snapshot)
}

/// Clear the log and zero the volume. Returns the plain-text body.
pub fn handle_reset(telemetry: &Telemetry) -> &'static str {
    telemetry.reset();
    info!("HTTP: telemetry reset");
    RESET_BODY
}

fn write_response<W: Write>(out: &mut W, content_type: &str, body: &[u8]) -> io::Result<()> {
    // Header lines end in a bare LF.
    write!(
        out,
        "HTTP/1.1 200 OK\nContent-Type: {}\nConnection: close\n\n",
        content_type
    )?;
    out.write_all(body)?;
    out.flush()
}

/// Serve one request on an accepted connection.
///
/// Reads a single chunk of at most `buf_len` bytes; requests are tiny and
/// only the request line matters for routing.
pub fn handle_connection<S: Read + Write>(
    stream: &mut S,
    telemetry: &Telemetry,
    buf_len: usize,
) -> Result<Route, HttpError> {
    let mut buf = vec![0u8; buf_len];
    let n = stream.read(&mut buf)?;
    if n == 0 {
        return Err(HttpError::EmptyRequest);
    }
    let request = String::from_utf8_lossy(&buf[..n]);
    let route = Route::from_request(&request);
    debug!("HTTP: {:?}", route);

    match route {
        Route::Readings => {
            let body = handle_get_readings(telemetry)?;
            write_response(stream, route.content_type(), body.as_bytes())?;
        }
        Route::Reset => {
            let body = handle_reset(telemetry);
            write_response(stream, route.content_type(), body.as_bytes())?;
        }
        Route::Dashboard => {
            write_response(stream, route.content_type(), DASHBOARD_HTML.as_bytes())?;
        }
    }
    Ok(route)
}

// ───────────────────────────────────────────────────────────────
// Server
// ───────────────────────────────────────────────────────────────

pub struct TelemetryServer {
    listener: TcpListener,
    telemetry: Arc<Telemetry>,
    buf_len: usize,
    io_timeout: Duration,
}

impl TelemetryServer {
    /// Bind `0.0.0.0:<port>`. Port `0` lets the OS pick (host tests).
    ///
    /// `io_timeout` bounds each socket read and write; it must be non-zero.
    pub fn bind(
        port: u16,
        telemetry: Arc<Telemetry>,
        buf_len: usize,
        io_timeout: Duration,
    ) -> io::Result<Self> {
        let listener = TcpListener::bind(SocketAddr::from(([0, 0, 0, 0], port)))?;
        info!(
            "HTTP: listening on port {} ({} ms I/O timeout)",
            port,
            io_timeout.as_millis()
        );
        Ok(Self {
            listener,
            telemetry,
            buf_len,
            io_timeout,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept and serve one connection. The socket is closed on return.
    pub fn serve_one(&self) -> Result<Route, HttpError> {
        let (mut stream, peer) = self.listener.accept()?;
        debug!("HTTP: connection from {}", peer);
        stream.set_read_timeout(Some(self.io_timeout))?;
        stream.set_write_timeout(Some(self.io_timeout))?;
        handle_connection(&mut stream, &self.telemetry, self.buf_len)
    }

    /// Serve forever. Per-connection failures are logged and skipped.
    pub fn run(&self) -> ! {
        loop {
            if let Err(e) = self.serve_one() {
                warn!("HTTP: request failed: {}", e);
            }
        }
    }
}
