use anyhow::Result;
use clap::{Parser, Subcommand};

use copilot_dash::cli;

#[derive(Debug, Parser)]
#[command(name = "copilot-dash")]
#[command(about = "Web Copilot data dashboard: GDP, CO₂ and land-use charts with a question box")]
struct App {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Serve the dashboard on a local address
    Serve {
        /// Listen address (default from config: 127.0.0.1:9747)
        #[arg(long)]
        addr: Option<String>,
        /// Don't open the dashboard in a browser
        #[arg(long)]
        no_open: bool,
    },
    /// Fetch one panel's series and draw it in the terminal
    Chart {
        /// Panel: gdp, co2 or agri
        panel: String,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
        /// Plot width in columns
        #[arg(long, default_value = "60")]
        width: usize,
        /// Plot height in rows
        #[arg(long, default_value = "12")]
        height: usize,
    },
    /// Ask the copilot a question and print the answer
    Ask {
        /// The question (words are joined with spaces)
        #[arg(trailing_var_arg = true, required = true)]
        question: Vec<String>,
    },
    /// List the dashboard panels and their endpoints
    Panels,
    /// Check config, backend endpoints and the event log
    Health,
    /// Show recent fetch and chat events
    Events {
        /// Number of entries to show
        #[arg(long, default_value = "20")]
        limit: usize,
        /// Output format: table (default), json
        #[arg(long, default_value = "table")]
        format: String,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Show the effective configuration
    Show,
    /// Write the default config to ~/.copilot-dash/config.toml
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Set a dotted key, e.g. `api.base_url http://10.0.0.5:8000`
    Set { key: String, value: String },
    /// Reset the global config to defaults
    Reset,
}

fn main() -> Result<()> {
    let app = App::parse();

    match app.command {
        Commands::Serve { addr, no_open } => cli::run_serve(addr, no_open),
        Commands::Chart {
            panel,
            format,
            width,
            height,
        } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_chart(&panel, fmt, width, height)
        }
        Commands::Ask { question } => cli::run_ask(&question.join(" ")),
        Commands::Panels => cli::run_panels(),
        Commands::Health => cli::run_health(),
        Commands::Events { limit, format } => {
            let fmt = cli::OutputFormat::from_str_opt(Some(&format));
            cli::run_events(limit, fmt)
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => cli::run_config_show(),
            ConfigAction::Init { force } => cli::run_config_init(force),
            ConfigAction::Set { key, value } => cli::run_config_set(&key, &value),
            ConfigAction::Reset => cli::run_config_reset(),
        },
    }
}
