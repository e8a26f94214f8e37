//! Subscriber installation for the `pstash` binary.
//!
//! # Design
//! - One fmt layer, JSON or human-readable, filtered per layer by `EnvFilter`.
//! - Output goes to stderr; stdout carries command results.
//! - A single startup event records the build and the effective settings.

use std::io;

use pstash_config::LogFormatSetting;
use tracing::info;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Result, TelemetryError};

/// Level used when neither `RUST_LOG` nor configuration provide one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Settings for the process-wide subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoggingConfig<'a> {
    /// Filter directive used when `RUST_LOG` is unset (e.g. `info`, `pstash_engine=debug`).
    pub level: &'a str,
    /// Output format.
    pub format: LogFormat,
    /// Build identifier reported in the startup event.
    pub build_sha: &'a str,
}

/// Output format of the fmt layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event.
    Json,
    /// Human-readable lines.
    Pretty,
}

impl LogFormat {
    /// Pretty for debug builds, JSON otherwise.
    #[must_use]
    pub const fn infer() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }

    /// Format chosen by configuration, or [`LogFormat::infer`] when unset.
    #[must_use]
    pub fn resolve(setting: Option<LogFormatSetting>) -> Self {
        setting.map_or_else(Self::infer, Self::from)
    }

    /// Lowercase name reported in the startup event.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pretty => "pretty",
        }
    }
}

impl From<LogFormatSetting> for LogFormat {
    fn from(setting: LogFormatSetting) -> Self {
        match setting {
            LogFormatSetting::Json => Self::Json,
            LogFormatSetting::Pretty => Self::Pretty,
        }
    }
}

/// Install the global subscriber writing to stderr and emit the startup event.
///
/// `RUST_LOG` takes precedence over `config.level`.
///
/// # Errors
///
/// Returns [`TelemetryError::SubscriberInstall`] when a global subscriber is
/// already installed.
pub fn init_logging(config: &LoggingConfig<'_>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.level));
    tracing_subscriber::registry()
        .with(output_layer(config.format, filter, io::stderr))
        .try_init()
        .map_err(|source| TelemetryError::SubscriberInstall {
            format: config.format,
            source,
        })?;
    announce(config);
    Ok(())
}

fn output_layer<W>(
    format: LogFormat,
    filter: EnvFilter,
    writer: W,
) -> Box<dyn Layer<Registry> + Send + Sync>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_writer(writer)
            .with_target(false)
            .with_filter(filter)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .with_writer(writer)
            .with_target(false)
            .with_filter(filter)
            .boxed(),
    }
}

fn announce(config: &LoggingConfig<'_>) {
    info!(
        build_sha = %config.build_sha,
        version = env!("CARGO_PKG_VERSION"),
        level = %config.level,
        format = config.format.as_str(),
        "logging initialised"
    );
}
