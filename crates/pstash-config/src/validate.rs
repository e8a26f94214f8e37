//! Validation helpers for configuration documents.

use std::path::Path;

use crate::defaults::{MAX_BUFFER_SIZE, MIN_BUFFER_SIZE};
use crate::error::{ConfigError, ConfigResult};
use crate::model::PstashConfig;

impl PstashConfig {
    /// Check paths and sizes before handing the configuration to the engine.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidField`] for the first field that fails.
    pub fn validate(&self) -> ConfigResult<()> {
        ensure_absolute("source_dir", &self.source_dir)?;
        ensure_absolute("log_path", &self.log_path)?;
        if self.log_path.starts_with(&self.source_dir) {
            return Err(ConfigError::invalid(
                "log_path",
                Some(self.log_path.display().to_string()),
                "must not live inside the source directory",
            ));
        }
        parse_buffer_size_bounds(self.buffer_size)?;
        if self
            .panic_marker
            .as_deref()
            .is_some_and(|marker| marker.trim().is_empty())
        {
            return Err(ConfigError::invalid(
                "panic_marker",
                None,
                "must not be blank when set",
            ));
        }
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::invalid("log_level", None, "must not be empty"));
        }
        Ok(())
    }
}

fn ensure_absolute(field: &'static str, path: &Path) -> ConfigResult<()> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::invalid(field, None, "must not be empty"));
    }
    if !path.is_absolute() {
        return Err(ConfigError::invalid(
            field,
            Some(path.display().to_string()),
            "must be an absolute path",
        ));
    }
    Ok(())
}

pub(crate) fn parse_buffer_size(value: &str) -> ConfigResult<usize> {
    let size = value.trim().parse::<usize>().map_err(|_| {
        ConfigError::invalid("buffer_size", Some(value.to_string()), "must be an integer")
    })?;
    parse_buffer_size_bounds(size)
}

fn parse_buffer_size_bounds(size: usize) -> ConfigResult<usize> {
    if (MIN_BUFFER_SIZE..=MAX_BUFFER_SIZE).contains(&size) {
        Ok(size)
    } else {
        Err(ConfigError::invalid(
            "buffer_size",
            Some(size.to_string()),
            "must be between 512 bytes and 1 MiB",
        ))
    }
}
