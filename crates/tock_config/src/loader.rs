//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::SimConfig;
use std::path::Path;

/// Name of the configuration file looked up in a project directory.
pub const CONFIG_FILE_NAME: &str = "tock.toml";

/// Loads and validates `<project_dir>/tock.toml`.
///
/// A missing file is not an error: the defaults are returned.
pub fn load_config(project_dir: &Path) -> Result<SimConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        return Ok(SimConfig::default());
    }
    let content =
        std::fs::read_to_string(&config_path).map_err(|source| ConfigError::IoError {
            path: config_path.clone(),
            source,
        })?;
    load_config_from_str(&content)
}

/// Parses and validates a `tock.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<SimConfig, ConfigError> {
    let config: SimConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    config.validate()?;
    Ok(config)
}
