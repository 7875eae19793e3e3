/// Configuration schema and defaults for copilot-dash.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[api]`, `[server]`, `[dashboard]`, and `[logging]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use serde::{Deserialize, Serialize};

use crate::panels::PanelId;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level copilot-dash configuration.
///
/// Maps directly to the `~/.copilot-dash/config.toml` and
/// `.copilot-dash.toml` file schemas. All sections and fields are optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    pub api: ApiConfig,
    pub server: ServerConfig,
    pub dashboard: DashboardConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [api]
// ---------------------------------------------------------------------------

/// Where the data and chat endpoints live.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL every endpoint path is resolved against.
    pub base_url: String,
    /// Path of the question/answer endpoint.
    pub chat_path: String,
    /// Per-request timeout in milliseconds. `0` keeps the transport default.
    pub timeout_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            chat_path: "/chat".to_string(),
            timeout_ms: 0,
        }
    }
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// Local dashboard server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address for `copilot-dash serve`.
    pub addr: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [dashboard]
// ---------------------------------------------------------------------------

/// Dashboard composition settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Panel shown when the dashboard starts: `gdp`, `co2` or `agri`.
    pub initial_panel: PanelId,
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Event log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Whether fetch and chat events are written to the log.
    pub enabled: bool,
    /// Path to the JSONL event log. `~` is expanded to the home directory.
    pub path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "~/.copilot-dash/events.jsonl".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Annotated default file
// ---------------------------------------------------------------------------

impl DashConfig {
    /// The annotated default config written by `copilot-dash config init`.
    pub fn default_toml() -> String {
        r#"# copilot-dash Configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (COPILOT_DASH_*)
#   2. Project config (.copilot-dash.toml in current directory)
#   3. User global config (~/.copilot-dash/config.toml)
#   4. Built-in defaults

[api]
base_url = "http://127.0.0.1:8000"   # backend serving /chat and /api/*
chat_path = "/chat"
timeout_ms = 0                       # 0 = transport default

[server]
addr = "127.0.0.1:9747"
open_browser = true

[dashboard]
initial_panel = "gdp"                # gdp | co2 | agri

[logging]
enabled = true
path = "~/.copilot-dash/events.jsonl"
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
