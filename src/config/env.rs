//! Environment variable overrides for configuration.
//!
//! Supports overriding config values with environment variables:
//! - `WATBRIDGE_RELAY_CHANNEL` - Relay channel name
//! - `WATBRIDGE_DOWNLOAD_DIR` - Media download directory
//! - `WATBRIDGE_DB_PATH` - SQLite store path
//! - `WATBRIDGE_RELAY_SPOOL` - Relay spool file

use std::env;

use crate::config::types::Config;

/// Environment variable prefix for all config overrides.
const ENV_PREFIX: &str = "WATBRIDGE";

/// Apply environment variable overrides to a config.
pub fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(channel) = env::var(format!("{}_RELAY_CHANNEL", ENV_PREFIX)) {
        config.bridge.relay_channel = channel;
    }
    if let Ok(dir) = env::var(format!("{}_DOWNLOAD_DIR", ENV_PREFIX)) {
        config.bridge.download_dir = dir;
    }
    if let Ok(path) = env::var(format!("{}_DB_PATH", ENV_PREFIX)) {
        config.store.path = Some(path);
    }
    if let Ok(spool) = env::var(format!("{}_RELAY_SPOOL", ENV_PREFIX)) {
        config.relay.spool = Some(spool);
    }

    config
}

/// Get the config file path from environment or use default.
///
/// Checks `WATBRIDGE_CONFIG`, otherwise returns "wat-bridge.conf".
pub fn get_config_path() -> String {
    env::var(format!("{}_CONFIG", ENV_PREFIX)).unwrap_or_else(|_| "wat-bridge.conf".to_string())
}
