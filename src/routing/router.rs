//! Route resolution.
//!
//! # Responsibilities
//! - Decide whether the relay owns a request path
//! - Build the backend URL for owned paths
//!
//! # Design Decisions
//! - Only the first `{id}` placeholder of the pattern is substituted
//! - The captured value is inserted verbatim (no re-encoding)
//! - Explicit NoMatch rather than silent default

use crate::config::RouteConfig;
use crate::routing::matcher::WILDCARD;

/// Result of resolving a request path against the relay's route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch {
    /// The relay owns this path.
    Owned { variable: String, backend_url: String },
    /// Not ours; hand the request to the next handler.
    NoMatch,
}

/// Instantiate `<backend_host><pattern>` with the first `{id}` replaced.
pub fn build_backend_url(backend_host: &str, pattern: &str, variable: &str) -> String {
    format!("{}{}", backend_host, pattern.replacen(WILDCARD, variable, 1))
}

/// Resolve a request path against a validated route.
pub fn resolve(config: &RouteConfig, path: &str) -> RouteMatch {
    let result = config.endpoint.matches(path);
    if !result.matched {
        return RouteMatch::NoMatch;
    }

    let backend_url = build_backend_url(
        &config.backend_host,
        &config.backend_url_pattern,
        &result.variable,
    );
    RouteMatch::Owned {
        variable: result.variable,
        backend_url,
    }
}
