//! ==============================================================================
//! main.rs - hydroponic dashboard entry point
//! ==============================================================================
//!
//! purpose:
//!     runs the dashboard against a sensor/lamp controller. `serve` (the
//!     default) keeps a live page: it loads everything once, polls on a timer
//!     and serves the rendered page locally. the other subcommands run a
//!     single refresh-cycle operation and print the result.
//!
//! relationships:
//!     - reads: config/dashboard.toml (config.rs)
//!     - uses: cycle.rs (RefreshCycle), source.rs (HttpDataSource)
//!     - renders with: page.rs + web.rs (serve), console.rs (one-shot)
//!
//! architecture:
//!
//!     ┌────────────────────────────────────────────────────────┐
//!     │                 dashboard (this binary)                │
//!     │  ┌─────────────┐  ┌─────────────┐  ┌────────────────┐  │
//!     │  │ poll timer  │  │ web view    │  │ ctrl-c watcher │  │
//!     │  │ (30s cycle) │  │ (port 3000) │  │ (stop polling) │  │
//!     │  └──────┬──────┘  └──────┬──────┘  └───────┬────────┘  │
//!     │         └────────────────┼─────────────────┘           │
//!     │                  ┌───────┴──────┐                      │
//!     │                  │ RefreshCycle │ <- cycle.rs          │
//!     │                  └───────┬──────┘                      │
//!     └──────────────────────────┼─────────────────────────────┘
//!                                │ http (reqwest)
//!                    ┌───────────┴───────────┐
//!                    ▼                       ▼
//!             ┌─────────────┐         ┌─────────────┐
//!             │ /hardware/* │         │   /api/*    │
//!             └─────────────┘         └─────────────┘
//!
//! ==============================================================================

use hydroponic_dashboard::config::DashboardConfig;
use hydroponic_dashboard::console::ConsoleRenderer;
use hydroponic_dashboard::domain::{LampId, LampSwitch};
use hydroponic_dashboard::page::PageRenderer;
use hydroponic_dashboard::web::{self, WebState};
use hydroponic_dashboard::{logging, CycleSettings, DataSource, HttpDataSource, RefreshCycle};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "hydroponic-dashboard", version, about = "Polling dashboard for a hydroponic sensor/lamp controller")]
struct Cli {
    /// config file (default: config/dashboard.toml, then ../config/dashboard.toml)
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// controller base url, overrides server.base_url
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// poll continuously and serve the rendered page (default)
    Serve,
    #[command(flatten)]
    Once(OneShot),
}

/// single refresh-cycle operations, printed to the terminal
#[derive(Subcommand)]
enum OneShot {
    /// read the current values once
    Snapshot,
    /// list every lamp
    Lamps,
    /// switch one lamp on or off
    Lamp { id: String, status: LampSwitch },
    /// send a raw control command
    Control { device_id: String, action: String, channel: String },
    /// show the controller's serial link
    ComStatus,
    /// summarise the history charts for a range
    History {
        #[arg(long)]
        range: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // step 1: load configuration
    let mut config = match &cli.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::load_or_default(),
    };
    if let Some(base_url) = cli.base_url {
        config.server.base_url = base_url;
        config.validate()?;
    }

    // step 2: logging
    logging::init_logging(&config.logging);

    // step 3: the controller
    let source: Arc<dyn DataSource> = Arc::new(HttpDataSource::new(&config.server, config.endpoints.clone())?);
    let settings = CycleSettings::from_config(&config);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&config, source, settings).await,
        Command::Once(command) => run_once(command, source, settings).await,
    }
}

async fn serve(config: &DashboardConfig, source: Arc<dyn DataSource>, settings: CycleSettings) -> Result<()> {
    println!("===========================================================");
    println!("  Hydroponic Dashboard");
    println!("===========================================================");
    config.print_summary();

    let page = Arc::new(PageRenderer::new(config.logging.show_sensor_data));
    let cycle = RefreshCycle::new(source, page.clone(), settings);

    // web view first, so a slow controller does not hold up the page
    if config.web.enabled {
        let bind = config.web.bind.clone();
        let state = WebState { cycle: cycle.clone(), page: page.clone() };
        tokio::spawn(async move {
            if let Err(e) = web::run_server(&bind, state).await {
                tracing::error!("[WEB] Web server error: {:#}", e);
            }
        });
    }

    // a stalled initial read must not hold up ctrl-c
    let starter = cycle.clone();
    tokio::spawn(async move { starter.start().await });

    tokio::signal::ctrl_c().await?;
    println!();
    cycle.stop().await;
    Ok(())
}

async fn run_once(command: OneShot, source: Arc<dyn DataSource>, settings: CycleSettings) -> Result<()> {
    let cycle = RefreshCycle::new(source, Arc::new(ConsoleRenderer::new()), settings);

    match command {
        OneShot::Snapshot => cycle.load_snapshot().await?,
        OneShot::Lamps => {
            cycle.fetch_lamp_status().await?;
        }
        OneShot::Lamp { id, status } => cycle.update_lamp_status(&LampId(id), status).await?,
        OneShot::Control { device_id, action, channel } => {
            cycle.control_device(&device_id, &action, &channel).await?
        }
        OneShot::ComStatus => {
            cycle.fetch_connection_status().await?;
        }
        OneShot::History { range } => {
            let range = range.unwrap_or(cycle.selected_range().await);
            cycle.select_range(&range).await?
        }
    }
    Ok(())
}
