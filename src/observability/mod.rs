//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Relay sessions produce:
//!     → logging.rs (Logger capability, backed by tracing in the host)
//!     → metrics.rs (session counters, line counters, durations)
//!
//! Consumers:
//!     → Log aggregation (stdout, pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - The relay never reaches for a global logger; it is handed one
//! - Metrics are cheap (atomic increments) and no-ops until an exporter is installed
//! - Request ID flows through the tower-http trace span

pub mod logging;
pub mod metrics;

pub use logging::{Logger, NoopLogger, SharedLogger, TracingLogger};
