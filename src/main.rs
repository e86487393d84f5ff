//! SSE relay host.
//!
//! # Architecture Overview
//!
//! ```text
//!                       ┌──────────────────────────────────────────────┐
//!                       │                  SSE RELAY                   │
//!   Client Request      │  ┌────────┐   ┌─────────┐   ┌────────────┐   │
//!   ────────────────────┼─▶│  http  │──▶│ routing │──▶│   relay    │───┼──▶ Backend
//!                       │  │ server │   │ matcher │   │  handler   │   │    (GET)
//!                       │  └───┬────┘   └─────────┘   └─────┬──────┘   │
//!                       │      │ no match                   │          │
//!                       │      ▼                            ▼          │
//!                       │  next handler              ┌────────────┐    │
//!   Client Response     │                            │  session   │◀───┼─── event
//!   ◀───────────────────┼────────────────────────────│ line → frame│   │    stream
//!                       │                            └────────────┘    │
//!                       │  config · observability · lifecycle          │
//!                       └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use sse_relay::config::{load_config, HostConfig};
use sse_relay::lifecycle::startup;
use sse_relay::observability::logging;

#[derive(Parser)]
#[command(name = "sse-relay")]
#[command(about = "Relays Server-Sent Events from a backend to clients", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override the log level.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => HostConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }

    logging::init(&config.observability)?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.listener.bind_address,
        connect_timeout_secs = config.timeouts.connect_secs,
        "sse-relay starting"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
