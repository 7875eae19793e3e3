use std::fs::{self, OpenOptions, create_dir_all};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::schema::LoggingConfig;

// ---------------------------------------------------------------------------
// Event log entry (JSONL)
// ---------------------------------------------------------------------------

/// What kind of outbound call an entry describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PanelFetch,
    ChatSubmit,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(match self {
            Self::PanelFetch => "panel_fetch",
            Self::ChatSubmit => "chat_submit",
        })
    }
}

/// A single entry in the operational event log (`~/.copilot-dash/events.jsonl`).
///
/// Chart fetch failures are only ever reported here and on stderr; the page
/// itself keeps showing the panel title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub timestamp: String,
    pub kind: EventKind,
    /// Panel id for fetches, endpoint URL for chat submits.
    pub target: String,
    #[serde(default = "default_true")]
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub latency_ms: Option<u64>,
    /// Error text or a short summary (e.g. point count).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub detail: Option<String>,
}

fn default_true() -> bool {
    true
}

impl EventLogEntry {
    pub fn new(kind: EventKind, target: impl Into<String>, success: bool) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            kind,
            target: target.into(),
            success,
            latency_ms: None,
            detail: None,
        }
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

// ---------------------------------------------------------------------------
// EventLog
// ---------------------------------------------------------------------------

/// Append-only JSONL sink. Writes are best-effort and never fail the caller.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    path: Option<PathBuf>,
}

impl EventLog {
    pub fn from_config(config: &LoggingConfig) -> Self {
        if !config.enabled {
            return Self::disabled();
        }
        Self {
            path: expand_home(&config.path),
        }
    }

    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append an entry. I/O errors are swallowed.
    pub fn record(&self, entry: &EventLogEntry) {
        let _ = self.append(entry);
    }

    fn append(&self, entry: &EventLogEntry) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let json = serde_json::to_string(entry)?;
        writeln!(file, "{json}")?;

        Ok(())
    }

    /// Read every entry back. Malformed lines are skipped; a missing file
    /// yields an empty vec.
    pub fn read_all(&self) -> Vec<EventLogEntry> {
        let Some(path) = &self.path else {
            return Vec::new();
        };

        let Ok(file) = fs::File::open(path) else {
            return Vec::new();
        };

        BufReader::new(file)
            .lines()
            .map_while(Result::ok)
            .filter_map(|line| serde_json::from_str::<EventLogEntry>(&line).ok())
            .collect()
    }

    /// The last `limit` entries, oldest first.
    pub fn read_recent(&self, limit: usize) -> Vec<EventLogEntry> {
        let mut entries = self.read_all();
        let skip = entries.len().saturating_sub(limit);
        entries.drain(..skip);
        entries
    }
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &str) -> Option<PathBuf> {
    if path == "~" {
        return dirs::home_dir();
    }
    match path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(path)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_log(name: &str) -> EventLog {
        let path = std::env::temp_dir()
            .join(format!("copilot-dash-events-{}-{name}", std::process::id()))
            .join("events.jsonl");
        let _ = fs::remove_file(&path);
        EventLog::at_path(path)
    }

    #[test]
    fn record_and_read_back() {
        let log = temp_log("roundtrip");
        log.record(&EventLogEntry::new(EventKind::PanelFetch, "gdp", true).with_latency(12));
        log.record(
            &EventLogEntry::new(EventKind::ChatSubmit, "http://h/chat", false)
                .with_detail("connection refused"),
        );

        let entries = log.read_all();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, EventKind::PanelFetch);
        assert_eq!(entries[0].latency_ms, Some(12));
        assert!(!entries[1].success);
        assert_eq!(entries[1].detail.as_deref(), Some("connection refused"));
    }

    #[test]
    fn read_recent_keeps_tail() {
        let log = temp_log("recent");
        for i in 0..5 {
            log.record(&EventLogEntry::new(EventKind::PanelFetch, format!("p{i}"), true));
        }
        let recent = log.read_recent(2);
        let targets: Vec<&str> = recent.iter().map(|e| e.target.as_str()).collect();
        assert_eq!(targets, vec!["p3", "p4"]);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let log = temp_log("malformed");
        log.record(&EventLogEntry::new(EventKind::PanelFetch, "co2", true));
        let path = log.path().unwrap().to_path_buf();
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "not json").unwrap();
        assert_eq!(log.read_all().len(), 1);
    }

    #[test]
    fn disabled_log_is_silent() {
        let log = EventLog::disabled();
        log.record(&EventLogEntry::new(EventKind::PanelFetch, "gdp", true));
        assert!(log.read_all().is_empty());
        assert!(log.path().is_none());
    }

    #[test]
    fn from_config_respects_enabled_flag() {
        let config = LoggingConfig {
            enabled: false,
            ..LoggingConfig::default()
        };
        assert!(EventLog::from_config(&config).path().is_none());
    }

    #[test]
    fn expand_home_handles_plain_paths() {
        assert_eq!(
            expand_home("/var/log/events.jsonl"),
            Some(PathBuf::from("/var/log/events.jsonl"))
        );
    }

    #[test]
    fn kind_serializes_snake_case() {
        let entry = EventLogEntry::new(EventKind::ChatSubmit, "x", true);
        let json = serde_json::to_string(&entry).unwrap();
        assert!(json.contains("\"kind\":\"chat_submit\""));
        assert!(!json.contains("latency_ms"));
    }
}
