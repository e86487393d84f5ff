//! HTTP host adapter.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum, request ID + trace layers)
//!     → relay middleware: SseRelay::handle
//!         → Relayed: SSE response (or 502)
//!         → PassThrough: next handler, request untouched
//!     → response.rs (stream headers, error responses)
//!     → client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use server::{mount, HttpServer};
