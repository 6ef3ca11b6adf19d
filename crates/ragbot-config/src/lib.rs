//! ragbot configuration.
//!
//! TOML file with serde defaults for every section, followed by
//! environment overrides and validation.

pub mod env;
pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::RagbotConfig;

use std::path::Path;

use ragbot_common::ConfigError;

/// Load config from `path` (or the platform default), apply environment
/// overrides, and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<RagbotConfig, ConfigError> {
    let mut config = match path {
        Some(path) => toml_loader::load_from_path(path)?,
        None => toml_loader::load_default()?,
    };

    env::apply_env_overrides(&mut config);
    validation::validate(&config)?;
    Ok(config)
}
