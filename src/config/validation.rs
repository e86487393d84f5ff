//! Activation config validation.
//!
//! # Responsibilities
//! - Locate the handler's namespace in the activation mapping
//! - Require `endpoint`, `backend_url_pattern` and `backend_host` as non-empty strings
//! - Require `backend_host` to be an absolute URI (scheme + host)
//! - Compile the endpoint template
//!
//! # Design Decisions
//! - Validation is a pure function: ExtraConfig → Result<RouteConfig, ConfigError>
//! - Runs exactly once, at activation time
//! - First failing check wins

use serde_json::Value;
use url::Url;

use crate::config::schema::{ExtraConfig, RouteConfig};
use crate::routing::{PathTemplate, TemplateError};

/// Key of the relay's namespace inside the activation mapping.
pub const HANDLER_NAME: &str = "sse-relay";

const ENDPOINT: &str = "endpoint";
const BACKEND_URL_PATTERN: &str = "backend_url_pattern";
const BACKEND_HOST: &str = "backend_host";

/// Activation errors. All of them leave the relay inactive.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration not found: {0}")]
    ConfigurationMissing(String),

    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    #[error("invalid backend_host URL: {0:?}")]
    InvalidBackendHost(String),

    #[error(transparent)]
    AmbiguousTemplate(#[from] TemplateError),
}

/// Validate the activation mapping and build the relay's route.
pub fn validate(extra: &ExtraConfig) -> Result<RouteConfig, ConfigError> {
    let section = match extra.get(HANDLER_NAME) {
        Some(Value::Object(section)) => section,
        Some(_) => {
            return Err(ConfigError::ConfigurationMissing(format!(
                "{HANDLER_NAME} is not a mapping"
            )))
        }
        None => {
            return Err(ConfigError::ConfigurationMissing(format!(
                "no {HANDLER_NAME} section"
            )))
        }
    };

    let endpoint = string_field(section, ENDPOINT)?;
    let backend_url_pattern = string_field(section, BACKEND_URL_PATTERN)?;
    let backend_host = string_field(section, BACKEND_HOST)?;

    for (name, value) in [
        (ENDPOINT, endpoint),
        (BACKEND_URL_PATTERN, backend_url_pattern),
        (BACKEND_HOST, backend_host),
    ] {
        if value.is_empty() {
            return Err(ConfigError::EmptyField(name));
        }
    }

    if !is_absolute_uri(backend_host) {
        return Err(ConfigError::InvalidBackendHost(backend_host.to_string()));
    }

    let endpoint = PathTemplate::parse(endpoint)?;

    Ok(RouteConfig {
        endpoint,
        backend_url_pattern: backend_url_pattern.to_string(),
        backend_host: backend_host.to_string(),
    })
}

fn string_field<'a>(
    section: &'a serde_json::Map<String, Value>,
    name: &'static str,
) -> Result<&'a str, ConfigError> {
    section.get(name).and_then(Value::as_str).ok_or_else(|| {
        ConfigError::ConfigurationMissing(format!("missing required string value {name}"))
    })
}

fn is_absolute_uri(raw: &str) -> bool {
    Url::parse(raw).map(|url| url.has_host()).unwrap_or(false)
}
