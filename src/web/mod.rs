//! Embedded web dashboard for copilot-dash.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - The single-page dashboard (navigation bar, panel sidebar, charts, chat)
//! - JSON API endpoints that read and drive the [`DashboardShell`]
//!
//! Launched via `copilot-dash serve` (default: `http://127.0.0.1:9747`).
//!
//! The server thread owns the shell. Between requests, and at least every
//! [`POLL_INTERVAL`], it polls the shell so that chart and chat results from
//! worker threads are applied without any locking.

mod api;
mod frontend;

use std::io::Cursor;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::cancel::CancelToken;
use crate::dashboard::DashboardShell;

/// Upper bound on how long a finished fetch waits before it is applied.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

pub(crate) type HttpResponse = Response<Cursor<Vec<u8>>>;

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

/// A bound dashboard server.
pub struct DashboardServer {
    server: Server,
}

impl DashboardServer {
    /// Bind the listening socket. Use port `0` for an ephemeral port.
    pub fn bind(addr: &str) -> Result<Self> {
        let server = Server::http(addr)
            .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;
        Ok(Self { server })
    }

    /// The address actually bound.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Mount the dashboard and serve requests until `stop` is cancelled.
    ///
    /// Requests are handled sequentially. A failing handler produces a 500
    /// response; it never stops the loop.
    pub fn run(&self, shell: &mut DashboardShell, stop: &CancelToken) -> Result<()> {
        shell.mount();

        while !stop.is_cancelled() {
            shell.poll();

            let Some(request) = self
                .server
                .recv_timeout(POLL_INTERVAL)
                .context("failed to receive HTTP request")?
            else {
                continue;
            };

            shell.poll();
            handle_request(request, shell);
        }

        Ok(())
    }
}

/// Start the web dashboard server on the given address.
///
/// Blocks the current thread until the process is interrupted.
pub fn serve(addr: &str, shell: &mut DashboardShell, open: bool) -> Result<()> {
    let server = DashboardServer::bind(addr)?;

    let url = match server.local_addr() {
        Some(bound) => format!("http://{bound}"),
        None => format!("http://{addr}"),
    };
    println!("copilot-dash running at {url}");
    println!("Press Ctrl+C to stop.\n");

    if open {
        // Best-effort; the URL is printed above either way.
        let _ = open_browser(&url);
    }

    server.run(shell, &CancelToken::new())
}

fn handle_request(mut request: Request, shell: &mut DashboardShell) {
    let method = request.method().clone();
    let url = request.url().to_string();

    // Read body up-front for methods that carry one
    let body = if matches!(method, Method::Put | Method::Post | Method::Patch) {
        let mut buf = String::new();
        let _ = request.as_reader().read_to_string(&mut buf);
        Some(buf)
    } else {
        None
    };

    let response = match dispatch(shell, &method, &url, body.as_deref()) {
        Ok(resp) => resp,
        Err(e) => error_response(500, &e.to_string()),
    };
    let _ = request.respond(response);

    // Brief access log
    println!(
        "{} {} {}",
        method,
        url,
        chrono::Local::now().format("%H:%M:%S")
    );
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch an incoming request to the appropriate handler.
pub(crate) fn dispatch(
    shell: &mut DashboardShell,
    method: &Method,
    url: &str,
    body: Option<&str>,
) -> Result<HttpResponse> {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);

    match (method, path) {
        // Frontend
        (&Method::Get, "/") | (&Method::Get, "/index.html") => Ok(serve_frontend()),

        // API: dashboard state
        (&Method::Get, "/api/dashboard") => api::get_dashboard(shell),
        (&Method::Post, "/api/select") => api::post_select(shell, body.unwrap_or("{}")),
        (&Method::Post, "/api/question") => api::post_question(shell, body.unwrap_or("{}")),
        (&Method::Post, "/api/ask") => api::post_ask(shell, body.unwrap_or("{}")),
        (&Method::Get, p) if p.starts_with("/api/series/") => {
            api::get_series(shell, &p["/api/series/".len()..])
        }

        // API: health
        (&Method::Get, "/api/health") => api::get_health(shell),

        // 404
        _ => Ok(not_found()),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

/// Serve the embedded single-page frontend.
fn serve_frontend() -> HttpResponse {
    Response::from_data(frontend::INDEX_HTML.as_bytes().to_vec())
        .with_header(content_type_html())
        .with_status_code(StatusCode(200))
}

/// 404 response.
fn not_found() -> HttpResponse {
    error_response(404, "not found")
}

/// JSON error body `{"error": "..."}` with the given status.
pub(crate) fn error_response(status: u16, message: &str) -> HttpResponse {
    let body = serde_json::json!({ "error": message }).to_string();
    Response::from_data(body.into_bytes())
        .with_header(content_type_json())
        .with_status_code(StatusCode(status))
}

/// JSON content type header.
pub(crate) fn content_type_json() -> Header {
    Header::from_bytes("Content-Type", "application/json; charset=utf-8").unwrap()
}

/// HTML content type header.
fn content_type_html() -> Header {
    Header::from_bytes("Content-Type", "text/html; charset=utf-8").unwrap()
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
