//! Errors raised while assembling the client configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while loading or validating config.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config layer could not be read from disk.
    #[error("cannot read config layer {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A layer is not valid JSON5.
    #[error("config layer {layer} is not valid JSON5: {source}")]
    Syntax {
        layer: String,
        #[source]
        source: json5::Error,
    },
    /// The merged layers do not decode into the config model.
    #[error("merged config does not match the client schema: {0}")]
    Schema(#[from] serde_json::Error),
    /// A key is unknown or holds the wrong kind of value.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
    /// The tutor backend address is not an http(s) URL.
    #[error("backend url from {origin} must start with http:// or https://, got {value:?}")]
    InvalidBaseUrl { origin: String, value: String },
    /// Requests would time out immediately.
    #[error("backend.timeout_secs must be greater than zero")]
    ZeroTimeout,
    /// Tutor requests need a language code.
    #[error("tutor.language must not be empty")]
    MissingLanguage,
}

impl ConfigError {
    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn syntax(layer: impl Into<String>, source: json5::Error) -> Self {
        ConfigError::Syntax {
            layer: layer.into(),
            source,
        }
    }
}

/// Check that a backend address is an http(s) URL.
pub(crate) fn ensure_http_url(origin: &str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidBaseUrl {
            origin: origin.to_string(),
            value: value.to_string(),
        })
    }
}
