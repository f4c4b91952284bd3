//! Configuration model and layered config loading for the DreamARC client.
//!
//! Layers are JSON5 files validated against a fixed key schema and merged
//! from system-wide defaults up to runtime overrides.

mod error;
mod loader;
mod model;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Layered config types and loader options.
pub use loader::{ConfigLayer, ConfigLayerSource, LayeredConfig, LayeredConfigOptions};
/// Configuration schema models.
pub use model::*;
