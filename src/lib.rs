//! Server-Sent Events relay.
//!
//! Intercepts requests whose path matches an endpoint template such as
//! `/sse/{id}`, rewrites them into a backend URL and streams the backend's
//! event stream back one line at a time.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod relay;
pub mod routing;

pub use config::{HostConfig, RouteConfig};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use relay::{Dispatch, SseRelay};
