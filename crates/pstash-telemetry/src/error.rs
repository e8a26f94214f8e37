//! Telemetry errors.

use std::error::Error;
use std::fmt;

use tracing_subscriber::util::TryInitError;

use crate::init::LogFormat;

/// Result alias for telemetry operations.
pub type Result<T> = std::result::Result<T, TelemetryError>;

/// Failures while setting up logging.
#[derive(Debug)]
pub enum TelemetryError {
    /// A global subscriber was already installed.
    SubscriberInstall {
        /// Format of the subscriber that could not be installed.
        format: LogFormat,
        /// Error reported by `tracing-subscriber`.
        source: TryInitError,
    },
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubscriberInstall { format, .. } => {
                write!(f, "failed to install {} log subscriber", format.as_str())
            }
        }
    }
}

impl Error for TelemetryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SubscriberInstall { source, .. } => Some(source),
        }
    }
}
