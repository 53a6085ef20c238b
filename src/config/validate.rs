//! Configuration validation.
//!
//! Validates configuration values and provides helpful error messages.

use std::collections::HashSet;

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Validate a configuration and return detailed errors.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.bridge.relay_channel.trim().is_empty() {
        errors.push("bridge.relay_channel is required".to_string());
    }
    if config.bridge.download_dir.trim().is_empty() {
        errors.push("bridge.download_dir is required".to_string());
    }

    if let Some(ref path) = config.store.path {
        if path.trim().is_empty() {
            errors.push("store.path must not be empty (omit it for an in-memory store)".to_string());
        }
        if config.relay.spool.as_deref() == Some(path.as_str()) {
            errors.push(format!(
                "relay.spool and store.path point to the same file '{}'",
                path
            ));
        }
    }

    for (i, id) in config.store.blacklist.iter().enumerate() {
        if id.trim().is_empty() {
            errors.push(format!("store.blacklist[{}] is empty", i));
        }
    }

    let mut linked = HashSet::new();
    for (i, link) in config.store.links.iter().enumerate() {
        if link.wa.trim().is_empty() {
            errors.push(format!("store.links[{}].wa is empty", i));
        } else if !linked.insert(link.wa.as_str()) {
            errors.push(format!("store.links[{}]: '{}' is linked twice", i, link.wa));
        }
        if link.tg.trim().is_empty() {
            errors.push(format!("store.links[{}].tg is empty", i));
        }
        if link.wa.contains('@') {
            errors.push(format!(
                "store.links[{}].wa must be a bare id without '@' suffix",
                i
            ));
        }
    }

    if let Some(ref spool) = config.relay.spool {
        if spool.trim().is_empty() {
            errors.push("relay.spool must not be empty (omit it to log relays)".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError {
            message: errors.join("\n"),
        })
    }
}
