//! Loading [`EngineConfig`] from JSON files.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use trellis_engine::EngineConfig;

/// Environment variable naming the configuration file.
pub const CONFIG_ENV: &str = "TRELLIS_CONFIG";

/// Errors that can occur while loading the engine configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// The file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// The file is not valid configuration JSON.
    #[error("invalid configuration in {path}: {source}")]
    Parse {
        /// The file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// Reads the configuration from a JSON file. Missing fields take their defaults.
///
/// # Errors
///
/// Fails when the file cannot be read or parsed.
pub fn load(path: impl AsRef<Path>) -> Result<EngineConfig, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!(path = %path.display(), "loaded engine configuration");
    Ok(config)
}

/// Reads the file named by [`CONFIG_ENV`], or returns the defaults when the
/// variable is unset.
///
/// # Errors
///
/// Fails when the named file cannot be read or parsed.
pub fn from_env() -> Result<EngineConfig, ConfigError> {
    match std::env::var_os(CONFIG_ENV) {
        Some(path) => load(PathBuf::from(path)),
        None => Ok(EngineConfig::default()),
    }
}
