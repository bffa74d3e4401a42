//! App-wide constants.
//!
//! Centralises the tool name, the config-location environment variable
//! and the recognised config file extensions.

/// Display name of the demo binary (lowercase).
pub const APP_NAME: &str = "layerconf";

/// Crate version, as reported by `--version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ── Environment variable names ──────────────────────────────────────

/// Environment variable the demo binary consults for a config file path
/// when `--config` is not given.
pub const ENV_CONFIG: &str = "LAYERCONF_CONFIG";

// ── Config file extensions ──────────────────────────────────────────

pub const EXT_JSON: &str = "json";
pub const EXT_YAML: &str = "yaml";
pub const EXT_YML: &str = "yml";
