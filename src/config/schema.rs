//! Configuration schema definitions.
//!
//! `HostConfig` is what the standalone host reads from disk. The relay itself
//! only ever sees the validated [`RouteConfig`].

use serde::{Deserialize, Serialize};

use crate::relay::session::MAX_LINE_BYTES;
use crate::routing::PathTemplate;

/// Raw activation mapping, keyed by handler name.
pub type ExtraConfig = serde_json::Map<String, serde_json::Value>;

/// Root configuration for the standalone host.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HostConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Size limits applied to relayed streams.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Per-handler activation mappings (see [`crate::config::HANDLER_NAME`]).
    pub extra_config: ExtraConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
///
/// There is deliberately no request timeout: relayed streams are unbounded.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Backend connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// How long open streams get to finish after a shutdown signal.
    pub shutdown_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            shutdown_grace_secs: 10,
        }
    }
}

/// Size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Longest backend line accepted, terminator included. Longer lines end
    /// the stream.
    pub max_line_bytes: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_line_bytes: MAX_LINE_BYTES,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// Human readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Validated relay route. Built only by [`crate::config::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteConfig {
    /// Endpoint template the relay owns (e.g. `/sse/{id}`).
    pub endpoint: PathTemplate,

    /// Backend path pattern with a literal `{id}` placeholder.
    pub backend_url_pattern: String,

    /// Absolute backend base URI, used verbatim as the URL prefix.
    pub backend_host: String,
}
