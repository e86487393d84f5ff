//! Startup orchestration.
//!
//! # Responsibilities
//! - Install the metrics exporter when enabled
//! - Bind the listener
//! - Build the server (backend client + relay activation)
//! - Serve until a signal arrives, then shut down in order

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::BuildError;
use tokio::net::TcpListener;

use crate::config::HostConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::metrics;

/// Fatal startup and serving errors.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),

    #[error("failed to install metrics exporter: {0}")]
    Metrics(#[from] BuildError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to build backend client: {0}")]
    Client(#[from] reqwest::Error),

    #[error("failed to listen for shutdown signals: {0}")]
    Signal(#[source] io::Error),

    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}

/// Run the host until SIGINT/SIGTERM.
pub async fn run(config: HostConfig) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        let addr: SocketAddr = config
            .observability
            .metrics_address
            .parse()
            .map_err(|_| StartupError::MetricsAddress(config.observability.metrics_address.clone()))?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;

    let shutdown = Shutdown::new();
    let server = HttpServer::new(&config, shutdown.token())?;
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    let signal = signals::wait_for_signal().await;
    match &signal {
        Ok(name) => tracing::info!(signal = %name, "Shutdown signal received"),
        Err(e) => tracing::error!(error = %e, "Signal handling failed, shutting down"),
    }
    shutdown.trigger();

    let grace = Duration::from_secs(config.timeouts.shutdown_grace_secs);
    match tokio::time::timeout(grace, &mut server_task).await {
        Ok(Ok(result)) => result.map_err(StartupError::Serve)?,
        Ok(Err(e)) => tracing::error!(error = %e, "Server task aborted"),
        Err(_) => {
            tracing::warn!(grace_secs = grace.as_secs(), "Connections still open after grace period, aborting");
            server_task.abort();
        }
    }

    signal.map(|_| ()).map_err(StartupError::Signal)
}
