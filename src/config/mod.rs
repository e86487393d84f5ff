//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize into HostConfig)
//!     → HostConfig.extra_config (activation mapping)
//!     → validation.rs (required fields, backend host, template)
//!     → RouteConfig (validated, immutable)
//!     → shared via Arc with every relay session
//! ```
//!
//! # Design Decisions
//! - RouteConfig is validated once at activation, never per request
//! - All host fields have defaults to allow minimal configs
//! - An invalid activation mapping disables the relay, not the host

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, LoadError};
pub use schema::{
    ExtraConfig, HostConfig, LimitsConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    RouteConfig, TimeoutConfig,
};
pub use validation::{validate, ConfigError, HANDLER_NAME};
