//! Public SDK surface for DreamARC.
//!
//! This crate re-exports the client building blocks and provides a small
//! initialization helper to keep consumer setup consistent.

/// Re-export for convenience.
pub use dreamarc_config as config;
pub use dreamarc_core as core;
/// Re-export for convenience.
pub use dreamarc_protocol as protocol;

pub use dreamarc_core::{Tutor, TurnCompletion, extract_directives, sanitize_for_speech};

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// This is a no-op if the feature is not enabled. Binaries are still expected
/// to call this early in startup to ensure log output is wired up.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::builder()
            .format_timestamp_millis()
            .parse_default_env()
            .try_init();
    }
}
