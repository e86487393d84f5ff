//! Structured logging.
//!
//! # Responsibilities
//! - Define the leveled `Logger` capability handed to the relay
//! - Provide a no-op default and a `tracing`-backed implementation
//! - Initialize the tracing subscriber for the standalone host
//!
//! # Design Decisions
//! - Logging is fire-and-forget: no method returns an error
//! - `critical` and `fatal` map onto `tracing::error!` with a severity field;
//!   `fatal` never terminates the process
//! - `RUST_LOG` overrides the configured level

use std::fmt;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, ObservabilityConfig};

/// Leveled logging capability.
pub trait Logger: Send + Sync {
    fn debug(&self, args: fmt::Arguments<'_>);
    fn info(&self, args: fmt::Arguments<'_>);
    fn warning(&self, args: fmt::Arguments<'_>);
    fn error(&self, args: fmt::Arguments<'_>);
    fn critical(&self, args: fmt::Arguments<'_>);
    fn fatal(&self, args: fmt::Arguments<'_>);
}

/// Logger shared by every relay session.
pub type SharedLogger = Arc<dyn Logger>;

/// Discards everything. Used when no logger is injected.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn debug(&self, _: fmt::Arguments<'_>) {}
    fn info(&self, _: fmt::Arguments<'_>) {}
    fn warning(&self, _: fmt::Arguments<'_>) {}
    fn error(&self, _: fmt::Arguments<'_>) {}
    fn critical(&self, _: fmt::Arguments<'_>) {}
    fn fatal(&self, _: fmt::Arguments<'_>) {}
}

/// Forwards to the `tracing` macros under the `sse_relay::relay` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(target: "sse_relay::relay", "{}", args);
    }

    fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(target: "sse_relay::relay", "{}", args);
    }

    fn warning(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(target: "sse_relay::relay", "{}", args);
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(target: "sse_relay::relay", "{}", args);
    }

    fn critical(&self, args: fmt::Arguments<'_>) {
        tracing::error!(target: "sse_relay::relay", severity = "critical", "{}", args);
    }

    fn fatal(&self, args: fmt::Arguments<'_>) {
        tracing::error!(target: "sse_relay::relay", severity = "fatal", "{}", args);
    }
}

/// Initialize the global tracing subscriber.
pub fn init(config: &ObservabilityConfig) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "sse_relay={level},tower_http={level}",
            level = config.log_level
        ))
    });

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    }
}
