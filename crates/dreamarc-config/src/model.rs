//! Configuration schema for the DreamARC client.

use crate::ConfigError;
use crate::error::ensure_http_url;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable that overrides `backend.base_url`.
pub const API_BASE_ENV: &str = "DREAMARC_API_BASE";

/// Root config for the DreamARC client.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct DreamarcConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub tutor: TutorConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

impl DreamarcConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> DreamarcConfigBuilder {
        DreamarcConfigBuilder::new()
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_env_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides using an explicit variable lookup.
    ///
    /// A blank value is ignored; anything else must be an http(s) URL.
    pub fn apply_env_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base) = lookup(API_BASE_ENV).filter(|value| !value.trim().is_empty()) {
            let base = base.trim();
            ensure_http_url(API_BASE_ENV, base)?;
            log::debug!("backend base url overridden from {API_BASE_ENV}");
            self.backend.base_url = base.to_string();
        }
        Ok(())
    }
}

/// Builder for assembling a `DreamarcConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct DreamarcConfigBuilder {
    config: DreamarcConfig,
}

impl DreamarcConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: DreamarcConfig::default(),
        }
    }

    /// Point the client at a different backend.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.backend.base_url = base_url.into();
        self
    }

    pub fn backend(mut self, backend: BackendConfig) -> Self {
        self.config.backend = backend;
        self
    }

    pub fn session(mut self, session: SessionConfig) -> Self {
        self.config.session = session;
        self
    }

    pub fn tutor(mut self, tutor: TutorConfig) -> Self {
        self.config.tutor = tutor;
        self
    }

    pub fn speech(mut self, speech: SpeechConfig) -> Self {
        self.config.speech = speech;
        self
    }

    pub fn build(self) -> DreamarcConfig {
        self.config
    }
}

/// Remote backend settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    "https://dreamarc-1.onrender.com".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Where the signed-in session is kept between runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    #[serde(default = "default_session_enabled")]
    pub enabled: bool,
    /// Session file; defaults to `~/.dreamarc/session.json`.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            enabled: default_session_enabled(),
            path: None,
        }
    }
}

impl SessionConfig {
    /// Resolve the session file path, falling back to the user home.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        if let Some(path) = self.path.as_ref() {
            return Some(PathBuf::from(path));
        }
        directories::UserDirs::new()
            .map(|dirs| dirs.home_dir().join(".dreamarc").join("session.json"))
    }
}

fn default_session_enabled() -> bool {
    true
}

/// Tutor conversation defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TutorConfig {
    #[serde(default = "default_persona")]
    pub default_persona: String,
    /// Language code forwarded with each tutor request.
    #[serde(default = "default_language")]
    pub language: String,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            default_persona: default_persona(),
            language: default_language(),
        }
    }
}

fn default_persona() -> String {
    "samie".to_string()
}

fn default_language() -> String {
    "en".to_string()
}

/// Speech output settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SpeechConfig {
    /// File that receives synthesized audio. Speech is unavailable when unset.
    #[serde(default)]
    pub output_path: Option<String>,
}
