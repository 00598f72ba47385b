//! Parsing and validation of `tock.toml` simulation settings.
//!
//! This crate reads the optional configuration file and produces a
//! strongly-typed [`SimConfig`]. Every section and key has a default, so an
//! empty file (or no file) yields [`SimConfig::default`].

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::{ConfigError, InvalidSetting};
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use types::*;
