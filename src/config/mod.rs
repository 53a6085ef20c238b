//! Configuration parsing and types.

pub mod env;
pub mod parser;
pub mod types;
pub mod validate;

use std::path::Path;

use tracing::warn;

use crate::common::error::ConfigError;

pub use parser::load_config;
pub use types::*;

/// Load the config file (falling back to defaults when it does not exist),
/// apply environment overrides and validate the result.
pub fn load_and_validate(path: &str) -> Result<Config, ConfigError> {
    let config = if Path::new(path).exists() {
        load_config(path)?
    } else {
        warn!("Config file {} not found, using defaults", path);
        Config::default()
    };

    let config = env::apply_env_overrides(config);
    validate::validate_config(&config)?;
    Ok(config)
}
