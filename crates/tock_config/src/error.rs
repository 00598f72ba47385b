//! Errors raised while reading `tock.toml` or checking its settings.

use std::io;
use std::path::PathBuf;

/// A kernel setting outside the range the simulator can run with.
///
/// Returned by [`SimConfig::validate`](crate::SimConfig::validate), which
/// both the loader and `Simulator::with_config` call, so a hand-built
/// configuration is held to the same rules as one read from disk.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("`{key}` {requirement}")]
pub struct InvalidSetting {
    /// Dotted key of the setting, e.g. `sim.reset_cycles`.
    pub key: &'static str,
    /// What the value must satisfy.
    pub requirement: &'static str,
}

/// Errors that can occur when loading a `tock.toml` file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("cannot read `{}`: {source}", .path.display())]
    IoError {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying I/O failure.
        source: io::Error,
    },

    /// The file is not valid TOML, or names an unknown section, key or
    /// enum value.
    #[error("malformed tock.toml: {0}")]
    ParseError(String),

    /// The file parsed but a setting is out of range.
    #[error("invalid tock.toml: {0}")]
    ValidationError(#[from] InvalidSetting),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn invalid_setting_names_the_key() {
        let err = InvalidSetting {
            key: "sim.reset_cycles",
            requirement: "must be at least 1",
        };
        assert_eq!(err.to_string(), "`sim.reset_cycles` must be at least 1");
        assert_eq!(
            ConfigError::from(err).to_string(),
            "invalid tock.toml: `sim.reset_cycles` must be at least 1"
        );
    }

    #[test]
    fn parse_error_is_prefixed() {
        let err = ConfigError::ParseError("unknown variant `random`".to_string());
        assert_eq!(err.to_string(), "malformed tock.toml: unknown variant `random`");
    }

    #[test]
    fn read_failure_keeps_path_and_cause() {
        let err = ConfigError::IoError {
            path: PathBuf::from("proj/tock.toml"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "cannot read `proj/tock.toml`: denied");
        assert!(err.source().is_some());
    }
}
