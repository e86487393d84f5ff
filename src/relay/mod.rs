//! Streaming relay subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request
//!     → handler.rs (resolve path → backend URL, or pass through)
//!     → outbound GET (shared reqwest client)
//!         ✗ connect failure → 502, no stream headers
//!     → session.rs (line reader over the backend body)
//!     → one body frame per line → client
//! ```
//!
//! # Design Decisions
//! - Config and logger are injected once; nothing global, nothing mutable
//! - No retries: every failure ends the session and the client reconnects
//! - Sessions observe a cancellation token alongside every backend read

pub mod error;
pub mod handler;
pub mod session;

pub use error::RelayError;
pub use handler::{Dispatch, SseRelay, BACKEND_UNREACHABLE};
pub use session::{CloseReason, RelaySession, SessionState, MAX_LINE_BYTES};
