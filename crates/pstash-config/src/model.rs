//! Typed configuration models.
//!
//! # Design
//! - Pure data carriers; loading lives in `loader.rs`, checks in `validate.rs`.
//! - `TransferPaths` is the narrow view handed to the transfer engine.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::ConfigError;

/// Complete configuration for the `pstash` tooling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PstashConfig {
    /// Directory holding the platform's crash records.
    pub source_dir: PathBuf,
    /// Append-only log receiving the crash records.
    pub log_path: PathBuf,
    /// Size in bytes of the shared transfer buffer.
    pub buffer_size: usize,
    /// Optional marker line emitted when a fault is observed.
    pub panic_marker: Option<String>,
    /// Log level used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Log output format; inferred from the build when absent.
    pub log_format: Option<LogFormatSetting>,
}

impl Default for PstashConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from(defaults::SOURCE_DIR),
            log_path: PathBuf::from(defaults::LOG_PATH),
            buffer_size: defaults::BUFFER_SIZE,
            panic_marker: None,
            log_level: defaults::LOG_LEVEL.to_string(),
            log_format: None,
        }
    }
}

impl PstashConfig {
    /// Paths and sizes consumed by the transfer engine.
    #[must_use]
    pub fn transfer_paths(&self) -> TransferPaths {
        TransferPaths {
            source_dir: self.source_dir.clone(),
            log_path: self.log_path.clone(),
            buffer_size: self.buffer_size,
        }
    }
}

/// Log format selection as written in configuration files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormatSetting {
    /// Structured JSON lines.
    Json,
    /// Human-readable output.
    Pretty,
}

impl LogFormatSetting {
    /// Render the format as its lowercase string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
        }
    }
}

impl FromStr for LogFormatSetting {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            _ => Err(ConfigError::invalid(
                "log_format",
                Some(value.to_string()),
                "must be 'json' or 'pretty'",
            )),
        }
    }
}

/// Source directory, destination log and buffer size for one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPaths {
    /// Directory enumerated for crash records.
    pub source_dir: PathBuf,
    /// Log file the records are appended to.
    pub log_path: PathBuf,
    /// Size in bytes of the shared transfer buffer.
    pub buffer_size: usize,
}

impl TransferPaths {
    /// Build transfer paths with the default buffer size.
    #[must_use]
    pub fn new(source_dir: impl AsRef<Path>, log_path: impl AsRef<Path>) -> Self {
        Self {
            source_dir: source_dir.as_ref().to_path_buf(),
            log_path: log_path.as_ref().to_path_buf(),
            buffer_size: defaults::BUFFER_SIZE,
        }
    }

    /// Override the transfer buffer size.
    #[must_use]
    pub const fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }
}

impl Default for TransferPaths {
    fn default() -> Self {
        Self::new(defaults::SOURCE_DIR, defaults::LOG_PATH)
    }
}
