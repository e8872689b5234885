//! Minimal HTTP control surface for a running animation.
//!
//! `POST /play`, `/pause`, `/toggle`, `/reset` drive the controller;
//! `GET /state` and `GET /field` read it. Each connection gets its own
//! thread with read and write deadlines, and is closed after one response.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use fieldsim_core::adapter::flatten_column_major;
use fieldsim_core::{AnimationHandle, Field, FieldStats, RenderError, Renderer};
use serde_json::{json, Value};
use tracing::{debug, info, warn};

const IO_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_LINE: u64 = 8 * 1024;
const MAX_HEADERS: usize = 64;

/// Render callback for the served animation: the browser pulls frames via
/// `GET /field`, so each frame is only logged.
pub struct FrameLog;

impl Renderer for FrameLog {
    fn update(&mut self, field: &Field) -> Result<(), RenderError> {
        let st = FieldStats::of(field);
        if !st.is_finite() {
            warn!("field contains non-finite samples");
        }
        debug!(min = st.min, max = st.max, mean = st.mean, "frame");
        Ok(())
    }
}

/// Server-side state shared by all connections.
pub struct Host<'a, R> {
    handle: &'a AnimationHandle<R>,
    // last render failure, kept until a run starts cleanly again
    last_error: Mutex<Option<String>>,
    stop: AtomicBool,
}

pub fn serve<R>(handle: &AnimationHandle<R>, port: u16) -> Result<()> {
    let listener =
        TcpListener::bind(("0.0.0.0", port)).with_context(|| format!("binding 0.0.0.0:{port}"))?;
    info!(port, "listening");
    Host::new(handle).serve_on(&listener);
    Ok(())
}

impl<'a, R> Host<'a, R> {
    pub fn new(handle: &'a AnimationHandle<R>) -> Self {
        Self {
            handle,
            last_error: Mutex::new(None),
            stop: AtomicBool::new(false),
        }
    }

    /// Makes `serve_on` return after the next accepted connection.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn serve_on(&self, listener: &TcpListener) {
        thread::scope(|s| {
            for stream in listener.incoming() {
                if self.stop.load(Ordering::SeqCst) {
                    break;
                }
                let stream = match stream {
                    Ok(stream) => stream,
                    Err(err) => {
                        warn!(error = %err, "accept failed");
                        continue;
                    }
                };
                s.spawn(move || {
                    if let Err(err) = self.handle_connection(stream) {
                        warn!(error = %err, "request failed");
                    }
                });
            }
        });
    }

    fn handle_connection(&self, stream: TcpStream) -> Result<()> {
        stream.set_read_timeout(Some(IO_TIMEOUT))?;
        stream.set_write_timeout(Some(IO_TIMEOUT))?;
        let mut reader = BufReader::new(stream.try_clone()?);

        let Some(request_line) = read_line(&mut reader)? else {
            return respond(stream, 400, &json!({ "error": "bad request" }));
        };
        // drain headers; bodies are not used
        for _ in 0..MAX_HEADERS {
            match read_line(&mut reader)? {
                Some(line) if !line.trim_end().is_empty() => {}
                _ => break,
            }
        }

        let mut parts = request_line.split_whitespace();
        let method = parts.next().unwrap_or("");
        let path = parts.next().unwrap_or("");
        let (status, body) = self.route(method, path);
        debug!(method, path, status, "request");
        respond(stream, status, &body)
    }

    pub fn route(&self, method: &str, path: &str) -> (u16, Value) {
        let handle = self.handle;
        match (method, path) {
            ("POST", "/play") => {
                self.collect_errors();
                let running = handle.play();
                if running {
                    self.set_error(None);
                }
                (200, json!({ "running": running }))
            }
            ("POST", "/pause") => (200, json!({ "running": handle.pause() })),
            ("POST", "/toggle") => (200, json!({ "running": handle.toggle() })),
            ("POST", "/reset") => {
                self.collect_errors();
                let running = handle.reset();
                match handle.present() {
                    Ok(()) => {
                        self.set_error(None);
                        (200, json!({ "running": running }))
                    }
                    Err(err) => {
                        let error = err.to_string();
                        self.set_error(Some(error.clone()));
                        (500, json!({ "running": running, "error": error }))
                    }
                }
            }
            ("GET", "/state") => match handle.snapshot() {
                Some(snap) => {
                    let error = self.collect_errors();
                    (
                        200,
                        json!({ "running": snap.running, "frames": snap.frames, "error": error }),
                    )
                }
                None => unavailable(),
            },
            ("GET", "/field") => match handle.snapshot() {
                Some(snap) => {
                    let (nx, ny) = snap.field.dim();
                    let data = flatten_column_major(&snap.field);
                    (200, json!({ "nx": nx, "ny": ny, "data": data }))
                }
                None => unavailable(),
            },
            (_, "/play" | "/pause" | "/toggle" | "/reset" | "/state" | "/field") => {
                (405, json!({ "error": "method not allowed" }))
            }
            _ => (404, json!({ "error": "not found" })),
        }
    }

    /// Moves queued render failures into host state and returns the latest.
    fn collect_errors(&self) -> Option<String> {
        let mut last = self.last_error.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(err) = self.handle.errors().try_iter().last() {
            *last = Some(err.to_string());
        }
        last.clone()
    }

    fn set_error(&self, error: Option<String>) {
        *self.last_error.lock().unwrap_or_else(|e| e.into_inner()) = error;
    }
}

/// One CRLF-terminated line, or `None` at EOF or past `MAX_LINE` bytes.
fn read_line(reader: &mut impl BufRead) -> std::io::Result<Option<String>> {
    let mut line = String::new();
    reader.by_ref().take(MAX_LINE).read_line(&mut line)?;
    Ok(line.ends_with('\n').then_some(line))
}

fn unavailable() -> (u16, Value) {
    (503, json!({ "error": "animation stopped" }))
}

fn respond(mut stream: TcpStream, status: u16, body: &Value) -> Result<()> {
    let reason = match status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        503 => "Service Unavailable",
        _ => "Internal Server Error",
    };
    let body = body.to_string();
    write!(
        stream,
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Access-Control-Allow-Origin: *\r\n\
         Connection: close\r\n\r\n{body}",
        body.len()
    )?;
    stream.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldsim_core::{AnimationController, AnimationLoop, Region, Simulation, SimulationParams};
    use std::io::Cursor;
    use std::net::SocketAddr;
    use std::time::Instant;

    fn params() -> SimulationParams {
        SimulationParams {
            nx: 6,
            ny: 4,
            init_region: Region::new(1, 3, 1, 3),
            tick_interval_ms: 1000,
            ..Default::default()
        }
    }

    fn handle() -> AnimationHandle<FrameLog> {
        let ctl = AnimationController::new(Simulation::new(params()).unwrap(), FrameLog);
        AnimationLoop::spawn(ctl).unwrap()
    }

    fn send(addr: SocketAddr, raw: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.set_read_timeout(Some(Duration::from_secs(3))).unwrap();
        stream.write_all(raw.as_bytes()).unwrap();
        let mut out = String::new();
        stream.read_to_string(&mut out).unwrap();
        out
    }

    fn body(response: &str) -> Value {
        let (_, body) = response.split_once("\r\n\r\n").unwrap();
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn control_routes_report_running_flag() {
        let h = handle();
        let host = Host::new(&h);
        assert_eq!(host.route("POST", "/play"), (200, json!({ "running": true })));
        assert_eq!(host.route("POST", "/toggle"), (200, json!({ "running": false })));
        assert_eq!(host.route("POST", "/play").1["running"], true);
        assert_eq!(host.route("POST", "/pause").1["running"], false);
        assert_eq!(host.route("POST", "/reset"), (200, json!({ "running": false })));
    }

    #[test]
    fn state_and_field() {
        let h = handle();
        let host = Host::new(&h);
        let (status, state) = host.route("GET", "/state");
        assert_eq!(status, 200);
        assert_eq!(state["running"], false);
        assert_eq!(state["frames"], 0);
        assert!(state["error"].is_null());

        let (status, field) = host.route("GET", "/field");
        assert_eq!(status, 200);
        assert_eq!(field["nx"], 6);
        assert_eq!(field["ny"], 4);
        let data = field["data"].as_array().unwrap();
        assert_eq!(data.len(), 24);
        // cell (1, 1) sits at 1 + 1 * 6
        assert_eq!(data[7], 10.0);
        assert_eq!(data[0], 0.0);
    }

    #[test]
    fn unknown_routes() {
        let h = handle();
        let host = Host::new(&h);
        assert_eq!(host.route("GET", "/play").0, 405);
        assert_eq!(host.route("GET", "/nope").0, 404);
    }

    #[test]
    fn render_failure_stays_visible_until_recovery() {
        let mut broken = true;
        let flaky = move |_: &Field| {
            if broken {
                broken = false;
                Err(RenderError::new("boom"))
            } else {
                Ok(())
            }
        };
        let params = SimulationParams {
            tick_interval_ms: 5,
            ..params()
        };
        let ctl = AnimationController::new(Simulation::new(params).unwrap(), flaky);
        let h = AnimationLoop::spawn(ctl).unwrap();
        let host = Host::new(&h);

        assert_eq!(host.route("POST", "/play").1["running"], true);
        let deadline = Instant::now() + Duration::from_secs(2);
        while h.running() {
            assert!(Instant::now() < deadline, "render failure did not stop the loop");
            thread::sleep(Duration::from_millis(5));
        }

        for _ in 0..2 {
            let (_, state) = host.route("GET", "/state");
            assert_eq!(state["running"], false);
            assert_eq!(state["error"], "render failed: boom");
        }

        assert_eq!(host.route("POST", "/reset"), (200, json!({ "running": false })));
        assert!(host.route("GET", "/state").1["error"].is_null());
    }

    #[test]
    fn serves_raw_http_while_another_client_idles() {
        let h = handle();
        let host = Host::new(&h);
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        thread::scope(|s| {
            s.spawn(|| host.serve_on(&listener));

            // connected but never sends a request line
            let idle = TcpStream::connect(addr).unwrap();

            let response = send(addr, "POST /play HTTP/1.1\r\nHost: local\r\n\r\n");
            let (head, text) = response.split_once("\r\n\r\n").unwrap();
            assert!(head.starts_with("HTTP/1.1 200 OK\r\n"), "{head}");
            assert!(head.contains("Content-Type: application/json"));
            assert!(head.contains(&format!("Content-Length: {}", text.len())));
            assert_eq!(body(&response), json!({ "running": true }));

            let response = send(addr, "GET /state HTTP/1.1\r\n\r\n");
            assert_eq!(body(&response)["running"], true);

            let response = send(addr, "DELETE /field HTTP/1.1\r\n\r\n");
            assert!(response.starts_with("HTTP/1.1 405 Method Not Allowed\r\n"));

            drop(idle);
            host.stop();
            // wake the accept loop so it sees the stop flag
            let _ = TcpStream::connect(addr);
        });
    }

    #[test]
    fn request_lines_are_capped() {
        let mut ok = Cursor::new("GET /state HTTP/1.1\r\nHost: x\r\n");
        assert_eq!(read_line(&mut ok).unwrap().as_deref(), Some("GET /state HTTP/1.1\r\n"));
        assert_eq!(read_line(&mut ok).unwrap().as_deref(), Some("Host: x\r\n"));
        assert_eq!(read_line(&mut ok).unwrap(), None);

        let long = format!("GET /{} HTTP/1.1\r\n", "x".repeat(MAX_LINE as usize));
        assert_eq!(read_line(&mut Cursor::new(long)).unwrap(), None);
    }
}
