//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::schema::HostConfig;

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Load the host configuration from a TOML file.
///
/// The activation mapping under `extra_config` is not validated here; that
/// happens when the relay is activated so a bad mapping only disables the
/// relay.
pub fn load_config(path: &Path) -> Result<HostConfig, LoadError> {
    let content = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a TOML document into a [`HostConfig`].
pub fn parse_config(content: &str) -> Result<HostConfig, toml::de::Error> {
    toml::from_str(content)
}
