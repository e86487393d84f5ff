//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → matcher.rs (segment-wise template match, capture `{id}`)
//!     → router.rs (instantiate backend URL from the captured value)
//!     → Return: Owned(backend URL) or NoMatch (pass through)
//! ```
//!
//! # Design Decisions
//! - Template compiled once at activation, immutable at runtime
//! - No regex in hot path
//! - Deterministic: same path always resolves to the same backend URL

pub mod matcher;
pub mod router;

pub use matcher::{match_path, MatchResult, PathTemplate, TemplateError, WILDCARD};
pub use router::{build_backend_url, resolve, RouteMatch};
