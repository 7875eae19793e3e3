//! CLI command implementations for copilot-dash.
//!
//! Provides subcommand handlers for:
//! - `copilot-dash serve`: host the dashboard locally
//! - `copilot-dash chart <panel>`: fetch one panel and draw it in the terminal
//! - `copilot-dash ask "question"`: one chat submit cycle
//! - `copilot-dash panels`: list the built-in panels and their endpoints
//! - `copilot-dash health`: check config, backend endpoints, event log
//! - `copilot-dash events`: show recent fetch and chat events
//! - `copilot-dash config show|init|set|reset`: configuration management

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use colored::Colorize;

use crate::cancel::CancelToken;
use crate::chart::{ChartPanel, PanelState};
use crate::chat::{ChatPanel, ChatPhase, HttpChatBackend};
use crate::client::ApiClient;
use crate::config;
use crate::dashboard::DashboardShell;
use crate::events::{EventLog, EventLogEntry};
use crate::panels::{PanelDescriptor, PanelId};
use crate::series::{HttpSeriesFetcher, SeriesSource};
use crate::web;

/// How often a blocking command re-checks its worker.
const WAIT_SLICE: Duration = Duration::from_millis(250);

/// Output format for data commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            _ => Self::Table,
        }
    }
}

// ---------------------------------------------------------------------------
// copilot-dash serve
// ---------------------------------------------------------------------------

/// Host the dashboard until interrupted.
pub fn run_serve(addr: Option<String>, no_open: bool) -> Result<()> {
    let cfg = config::load();
    let addr = addr.unwrap_or_else(|| cfg.server.addr.clone());
    let mut shell = DashboardShell::from_config(&cfg);
    web::serve(&addr, &mut shell, cfg.server.open_browser && !no_open)
}

// ---------------------------------------------------------------------------
// copilot-dash chart
// ---------------------------------------------------------------------------

/// Fetch a single panel's series and print it.
pub fn run_chart(panel: &str, format: OutputFormat, width: usize, height: usize) -> Result<()> {
    let id: PanelId = panel.parse()?;
    let cfg = config::load();
    let client = ApiClient::from_config(&cfg.api);

    let mut chart = ChartPanel::new(
        PanelDescriptor::builtin(id),
        EventLog::from_config(&cfg.logging),
    );
    chart.mount(Arc::new(HttpSeriesFetcher::new(client)));
    while !chart.wait(WAIT_SLICE) {}

    match (chart.state(), format) {
        (PanelState::Ready(series), OutputFormat::Json) => {
            let value = serde_json::json!({
                "panel": id,
                "title": chart.descriptor().title,
                "data": series.points,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        (PanelState::Ready(_), OutputFormat::Table) => {
            for line in chart.render_text(width, height) {
                println!("{line}");
            }
        }
        (PanelState::Failed(reason), _) => {
            // The panel stays on its title; the reason was already reported.
            println!("{}", chart.descriptor().title.bold());
            anyhow::bail!("no data for {id}: {reason}");
        }
        (state, _) => anyhow::bail!("panel {id} did not settle: {:?}", state.status()),
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// copilot-dash ask
// ---------------------------------------------------------------------------

/// Submit one question and print the displayed response.
pub fn run_ask(question: &str) -> Result<()> {
    let cfg = config::load();
    let client = ApiClient::from_config(&cfg.api);
    let backend = Arc::new(HttpChatBackend::new(client, &cfg.api.chat_path));

    let mut chat = ChatPanel::new(EventLog::from_config(&cfg.logging));
    chat.set_question(question);
    chat.submit(backend);

    println!("{}", "Waiting for answer…".dimmed());
    while !chat.wait(WAIT_SLICE) {}

    let response = chat.last_response().unwrap_or_default();
    match chat.phase() {
        ChatPhase::Errored => println!("{}", response.red()),
        _ => println!("{response}"),
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// copilot-dash panels
// ---------------------------------------------------------------------------

/// List the built-in panels.
pub fn run_panels() -> Result<()> {
    let cfg = config::load();
    let client = ApiClient::from_config(&cfg.api);

    println!("{}", "Dashboard Panels".bold().cyan());
    println!("{}", "=".repeat(60));
    println!("  {:<6} {:<14} {}", "Id", "Sidebar", "Endpoint");
    println!("  {}", "-".repeat(58));

    for descriptor in PanelDescriptor::all() {
        let marker = if descriptor.id == cfg.dashboard.initial_panel {
            "*".green().bold()
        } else {
            " ".normal()
        };
        println!(
            "{} {:<6} {:<14} {}",
            marker,
            descriptor.id,
            format!("{} {}", descriptor.id.icon(), descriptor.id.sidebar_label()),
            client.endpoint_url(descriptor.endpoint).dimmed()
        );
        println!(
            "         {} ({} → {})",
            descriptor.title,
            descriptor.x_field,
            descriptor.y_field
        );
    }

    println!();
    println!("  {} initial panel", "*".green().bold());
    Ok(())
}

// ---------------------------------------------------------------------------
// copilot-dash health
// ---------------------------------------------------------------------------

/// Check config, backend reachability and the event log.
///
/// Each panel endpoint is fetched once. The chat endpoint is only reported,
/// never called.
pub fn run_health() -> Result<()> {
    println!("{}", "copilot-dash Health Check".bold().cyan());
    println!("{}", "=".repeat(40));

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let cfg = config::load();
    print_health_item(
        "Global config",
        global_exists,
        if global_exists {
            "~/.copilot-dash/config.toml found"
        } else {
            "not found (run `copilot-dash config init` to create)"
        },
    );
    print_health_item(
        "Project config",
        project_exists,
        if project_exists {
            ".copilot-dash.toml found"
        } else {
            "none (optional)"
        },
    );

    let client = ApiClient::from_config(&cfg.api);
    print_health_item("Backend", true, client.base_url());

    let fetcher = HttpSeriesFetcher::new(client.clone());
    let cancel = CancelToken::new();
    for descriptor in PanelDescriptor::all() {
        let result = fetcher.fetch_series(
            descriptor.endpoint,
            descriptor.x_field,
            descriptor.y_field,
            &cancel,
        );
        let name = format!("Panel {}", descriptor.id);
        match result {
            Ok(series) => print_health_item(&name, true, &format!("{} points", series.len())),
            Err(e) => print_health_item(&name, false, &format!("{} error: {e}", e.kind())),
        }
    }

    print_health_item(
        "Chat endpoint",
        true,
        &format!("{} (not called)", client.endpoint_url(&cfg.api.chat_path)),
    );

    let log = EventLog::from_config(&cfg.logging);
    match log.path() {
        None => print_health_item("Event log", false, "disabled"),
        Some(path) if path.exists() => print_health_item(
            "Event log",
            true,
            &format!("{} entries", log.read_all().len()),
        ),
        Some(_) => print_health_item("Event log", true, "no log file yet"),
    }

    Ok(())
}

fn print_health_item(name: &str, ok: bool, detail: &str) {
    let status = if ok {
        "✓".green().bold()
    } else {
        "✗".red().bold()
    };
    println!("  {} {:<25} {}", status, name, detail.dimmed());
}

// ---------------------------------------------------------------------------
// copilot-dash events
// ---------------------------------------------------------------------------

/// Show the most recent event log entries.
pub fn run_events(limit: usize, format: OutputFormat) -> Result<()> {
    let cfg = config::load();
    let log = EventLog::from_config(&cfg.logging);
    let entries = log.read_recent(limit);

    if entries.is_empty() {
        println!(
            "{}",
            "No events yet. Run `copilot-dash serve` or `copilot-dash chart` first.".yellow()
        );
        return Ok(());
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Table => print_events_table(&entries),
    }

    Ok(())
}

fn print_events_table(entries: &[EventLogEntry]) {
    println!("{}", "Recent Events".bold().cyan());
    println!("{}", "=".repeat(72));
    println!(
        "  {:<20} {:<12} {:<8} {:>8}  Detail",
        "Time", "Kind", "Target", "Latency"
    );
    println!("  {}", "-".repeat(70));

    for entry in entries {
        let time = chrono::DateTime::parse_from_rfc3339(&entry.timestamp)
            .map(|t| t.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|_| truncate(&entry.timestamp, 19));
        let latency = entry
            .latency_ms
            .map(|ms| format!("{ms}ms"))
            .unwrap_or_else(|| "-".to_string());
        let line = format!(
            "  {:<20} {:<12} {:<8} {:>8}  {}",
            time,
            entry.kind,
            truncate(&entry.target, 8),
            latency,
            truncate(entry.detail.as_deref().unwrap_or(""), 30),
        );

        if entry.success {
            println!("{line}");
        } else {
            println!("{}", line.red());
        }
    }
}

// ---------------------------------------------------------------------------
// copilot-dash config show | init | set | reset
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective copilot-dash Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    let project_exists = config::project_config_file()
        .map(|p| p.exists())
        .unwrap_or(false);
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source("~/.copilot-dash/config.toml", global_exists);
    print_source(".copilot-dash.toml", project_exists);
    println!(
        "  {} {}",
        "·".dimmed(),
        "COPILOT_DASH_* environment variables".dimmed()
    );

    Ok(())
}

fn print_source(name: &str, exists: bool) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!(
            "  {} {}",
            "·".dimmed(),
            format!("{name} (not found)").dimmed()
        );
    }
}

/// Initialize a default config file at `~/.copilot-dash/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Edit the file to point at your backend.".dimmed());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

/// Reset configuration to defaults.
pub fn run_config_reset() -> Result<()> {
    let path = config::reset_config()?;
    println!(
        "{} Config reset to defaults at {}",
        "✓".green().bold(),
        path.display()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
