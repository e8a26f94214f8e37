//! Configuration loading from YAML files and environment overrides.
//!
//! # Design
//! - The file is optional; missing fields fall back to `defaults.rs`.
//! - Environment lookups go through a closure so tests never touch the process env.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};
use crate::model::{LogFormatSetting, PstashConfig};
use crate::validate::parse_buffer_size;

/// Overrides the crash-record source directory.
pub const ENV_SOURCE_DIR: &str = "PSTASH_SOURCE_DIR";
/// Overrides the destination log path.
pub const ENV_LOG_PATH: &str = "PSTASH_LOG_PATH";
/// Overrides the transfer buffer size.
pub const ENV_BUFFER_SIZE: &str = "PSTASH_BUFFER_SIZE";
/// Overrides the log level.
pub const ENV_LOG_LEVEL: &str = "PSTASH_LOG_LEVEL";
/// Overrides the log format.
pub const ENV_LOG_FORMAT: &str = "PSTASH_LOG_FORMAT";

impl PstashConfig {
    /// Parse a configuration document from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid YAML for
    /// this schema.
    pub fn from_yaml_file(path: &Path) -> ConfigResult<Self> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn from_yaml_str(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Load the optional file, apply environment overrides, then validate.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded, an override is malformed
    /// or the merged configuration fails validation.
    pub fn load<F>(path: Option<&Path>, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self::layered(path, lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Merge the optional file with environment overrides without validating,
    /// so callers can apply further layers before [`PstashConfig::validate`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be loaded or an override is malformed.
    pub fn layered<F>(path: Option<&Path>, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => {
                debug!(path = %path.display(), "loading configuration file");
                Self::from_yaml_file(path)?
            }
            None => Self::default(),
        };
        config.apply_env_overrides(lookup)?;
        Ok(config)
    }

    /// Apply `PSTASH_*` overrides supplied by `lookup`.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer size or log format override is malformed.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = non_empty(lookup(ENV_SOURCE_DIR)) {
            self.source_dir = PathBuf::from(value);
        }
        if let Some(value) = non_empty(lookup(ENV_LOG_PATH)) {
            self.log_path = PathBuf::from(value);
        }
        if let Some(value) = non_empty(lookup(ENV_BUFFER_SIZE)) {
            self.buffer_size = parse_buffer_size(&value)?;
        }
        if let Some(value) = non_empty(lookup(ENV_LOG_LEVEL)) {
            self.log_level = value;
        }
        if let Some(value) = non_empty(lookup(ENV_LOG_FORMAT)) {
            self.log_format = Some(value.parse::<LogFormatSetting>()?);
        }
        Ok(())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
