//! Relay error kinds.
//!
//! None of these reach the client as a structured error. `BackendUnreachable`
//! becomes a plain 502; the others only end the stream.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("failed to connect to downstream SSE server {url}: {source}")]
    BackendUnreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("error reading from SSE server: {0}")]
    BackendRead(#[source] io::Error),

    #[error("line from SSE server exceeds {limit} bytes")]
    LineTooLong { limit: u64 },
}
