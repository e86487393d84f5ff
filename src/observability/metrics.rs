//! Metrics collection and exposition.
//!
//! # Metrics
//! - `sse_relay_sessions_total` (counter): finished sessions by outcome
//! - `sse_relay_lines_total` (counter): lines forwarded to clients
//! - `sse_relay_bytes_total` (counter): bytes forwarded to clients
//! - `sse_relay_session_duration_seconds` (histogram): session lifetime
//! - `sse_relay_active_sessions` (gauge): sessions currently streaming

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

const SESSIONS_TOTAL: &str = "sse_relay_sessions_total";
const LINES_TOTAL: &str = "sse_relay_lines_total";
const BYTES_TOTAL: &str = "sse_relay_bytes_total";
const SESSION_DURATION: &str = "sse_relay_session_duration_seconds";
const ACTIVE_SESSIONS: &str = "sse_relay_active_sessions";

/// Install the Prometheus exporter with its own HTTP listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;

    describe_counter!(SESSIONS_TOTAL, "Relay sessions by terminal outcome");
    describe_counter!(LINES_TOTAL, "Lines forwarded from backends to clients");
    describe_counter!(BYTES_TOTAL, "Bytes forwarded from backends to clients");
    describe_histogram!(SESSION_DURATION, "Relay session lifetime in seconds");
    describe_gauge!(ACTIVE_SESSIONS, "Relay sessions currently streaming");

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn session_opened() {
    gauge!(ACTIVE_SESSIONS).increment(1.0);
}

pub fn session_closed(outcome: &'static str, started: Instant) {
    gauge!(ACTIVE_SESSIONS).decrement(1.0);
    record_outcome(outcome, started);
}

/// Record a session that never reached the streaming state.
pub fn record_outcome(outcome: &'static str, started: Instant) {
    counter!(SESSIONS_TOTAL, "outcome" => outcome).increment(1);
    histogram!(SESSION_DURATION, "outcome" => outcome).record(started.elapsed().as_secs_f64());
}

pub fn line_relayed(len: usize) {
    counter!(LINES_TOTAL).increment(1);
    counter!(BYTES_TOTAL).increment(len as u64);
}
