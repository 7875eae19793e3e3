//! Chart panels: one descriptor, one fetch per mount, one line chart.
//!
//! A [`ChartPanel`] starts [`PanelState::Unmounted`]. [`ChartPanel::mount`]
//! spawns a single background fetch and moves to `Loading`; the result is
//! applied by [`ChartPanel::poll`] (non-blocking) or [`ChartPanel::wait`] on
//! the thread that owns the panel. Until a series arrives, and after a
//! failed fetch, the panel renders its title only. Failures go to the event
//! log and stderr, never to the page.

pub mod render;

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use colored::Colorize;
use serde::Serialize;

use crate::cancel::CancelToken;
use crate::error::FetchResult;
use crate::events::{EventKind, EventLog, EventLogEntry};
use crate::panels::PanelDescriptor;
use crate::series::{Series, SeriesSource};

use render::ChartLabels;

/// Default SVG canvas size used by the dashboard.
pub const SVG_WIDTH: u32 = 720;
pub const SVG_HEIGHT: u32 = 380;

/// Lifecycle of a chart panel.
#[derive(Debug, Clone, PartialEq)]
pub enum PanelState {
    Unmounted,
    Loading,
    Ready(Series),
    /// Fetch failed; the reason is kept for diagnostics only.
    Failed(String),
}

/// Coarse state name for serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelStatus {
    Unmounted,
    Loading,
    Ready,
    Failed,
}

impl PanelState {
    pub fn status(&self) -> PanelStatus {
        match self {
            Self::Unmounted => PanelStatus::Unmounted,
            Self::Loading => PanelStatus::Loading,
            Self::Ready(_) => PanelStatus::Ready,
            Self::Failed(_) => PanelStatus::Failed,
        }
    }
}

/// An in-flight fetch owned by its panel.
#[derive(Debug)]
struct PendingFetch {
    cancel: CancelToken,
    rx: Receiver<FetchResult<Series>>,
    started: Instant,
}

/// A titled line chart backed by exactly one fetch per mount.
#[derive(Debug)]
pub struct ChartPanel {
    descriptor: PanelDescriptor,
    state: PanelState,
    pending: Option<PendingFetch>,
    log: EventLog,
}

impl ChartPanel {
    pub fn new(descriptor: PanelDescriptor, log: EventLog) -> Self {
        Self {
            descriptor,
            state: PanelState::Unmounted,
            pending: None,
            log,
        }
    }

    pub fn descriptor(&self) -> &PanelDescriptor {
        &self.descriptor
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn series(&self) -> Option<&Series> {
        match &self.state {
            PanelState::Ready(series) => Some(series),
            _ => None,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.state != PanelState::Unmounted
    }

    /// Start the panel's single fetch. Returns `false` (and does nothing) if
    /// the panel is already mounted.
    pub fn mount(&mut self, source: Arc<dyn SeriesSource>) -> bool {
        if self.is_mounted() {
            return false;
        }

        let cancel = CancelToken::new();
        let (tx, rx) = mpsc::channel();
        let worker_cancel = cancel.clone();
        let descriptor = self.descriptor.clone();

        let spawned = thread::Builder::new()
            .name(format!("fetch-{}", descriptor.id))
            .spawn(move || {
                let result = source.fetch_series(
                    descriptor.endpoint,
                    descriptor.x_field,
                    descriptor.y_field,
                    &worker_cancel,
                );
                if worker_cancel.is_cancelled() {
                    return;
                }
                // The receiver is gone if the panel was dropped meanwhile.
                let _ = tx.send(result);
            });

        match spawned {
            Ok(_) => {
                self.state = PanelState::Loading;
                self.pending = Some(PendingFetch {
                    cancel,
                    rx,
                    started: Instant::now(),
                });
            }
            Err(e) => self.fail(format!("failed to spawn fetch worker: {e}"), None),
        }
        true
    }

    /// Tear the panel down: cancel any in-flight fetch and drop the series.
    pub fn unmount(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.cancel.cancel();
        }
        self.state = PanelState::Unmounted;
    }

    /// Apply a completed fetch, if any. Never blocks. Returns whether the
    /// state changed.
    pub fn poll(&mut self) -> bool {
        let Some(pending) = &self.pending else {
            return false;
        };
        match pending.rx.try_recv() {
            Ok(result) => {
                self.complete(result);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => {
                self.worker_lost();
                true
            }
        }
    }

    /// Block up to `timeout` for the in-flight fetch. Returns `true` once the
    /// panel has settled (ready or failed), `false` on timeout.
    pub fn wait(&mut self, timeout: Duration) -> bool {
        let Some(pending) = &self.pending else {
            return !matches!(self.state, PanelState::Loading);
        };
        match pending.rx.recv_timeout(timeout) {
            Ok(result) => {
                self.complete(result);
                true
            }
            Err(RecvTimeoutError::Timeout) => false,
            Err(RecvTimeoutError::Disconnected) => {
                self.worker_lost();
                true
            }
        }
    }

    fn complete(&mut self, result: FetchResult<Series>) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        let latency_ms = u64::try_from(pending.started.elapsed().as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(series) => {
                self.log.record(
                    &EventLogEntry::new(EventKind::PanelFetch, self.descriptor.id.as_str(), true)
                        .with_latency(latency_ms)
                        .with_detail(format!("{} points", series.len())),
                );
                self.state = PanelState::Ready(series);
            }
            Err(e) => self.fail(e.to_string(), Some(latency_ms)),
        }
    }

    fn worker_lost(&mut self) {
        self.pending = None;
        self.fail("fetch worker exited without a result".to_string(), None);
    }

    fn fail(&mut self, reason: String, latency_ms: Option<u64>) {
        eprintln!(
            "{} failed to load chart data for {}: {}",
            "warning:".yellow().bold(),
            self.descriptor.id,
            reason
        );
        let mut entry = EventLogEntry::new(EventKind::PanelFetch, self.descriptor.id.as_str(), false)
            .with_detail(reason.clone());
        entry.latency_ms = latency_ms;
        self.log.record(&entry);
        self.state = PanelState::Failed(reason);
    }

    fn labels(&self) -> ChartLabels<'_> {
        ChartLabels {
            title: self.descriptor.title,
            x_label: self.descriptor.x_field,
            y_label: self.descriptor.y_label,
        }
    }

    /// The chart as SVG, once a series has arrived.
    pub fn chart_svg(&self) -> Option<String> {
        let series = self.series()?;
        match render::line_chart_svg(series, self.labels(), SVG_WIDTH, SVG_HEIGHT) {
            Ok(svg) => Some(svg),
            Err(e) => {
                eprintln!(
                    "{} failed to draw panel '{}': {:#}",
                    "warning:".yellow().bold(),
                    self.descriptor.id,
                    e
                );
                None
            }
        }
    }

    /// Panel card markup: the title always, the chart only when ready.
    pub fn render_html(&self) -> String {
        let mut html = format!(
            r#"<div class="widget-card" data-panel="{}"><h3>{}</h3>"#,
            self.descriptor.id,
            escape_html(self.descriptor.title)
        );
        if let Some(svg) = self.chart_svg() {
            html.push_str(&svg);
        }
        html.push_str("</div>");
        html
    }

    /// Terminal rendering: the title always, the chart only when ready.
    pub fn render_text(&self, width: usize, height: usize) -> Vec<String> {
        match self.series() {
            Some(series) => render::line_chart_text(series, self.labels(), width, height),
            None => vec![self.descriptor.title.to_string()],
        }
    }
}

/// Escape text for HTML content or attribute values.
fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

impl Drop for ChartPanel {
    fn drop(&mut self) {
        if let Some(pending) = &self.pending {
            pending.cancel.cancel();
        }
    }
}
