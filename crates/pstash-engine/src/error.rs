//! # Design
//!
//! - One variant per failure point of the transfer so callers can tell where it stopped.
//! - Carry the path and underlying IO error; messages stay constant.
//! - Map every variant onto a negative errno-style status for the fault boundary.

use std::io;
use std::path::PathBuf;

use nix::errno::Errno;
use thiserror::Error;

/// Result type for crash-record transfers.
pub type TransferResult<T> = Result<T, TransferError>;

/// Errors produced while moving crash records into the persistent log.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The destination log could not be created or opened for append.
    #[error("failed to open panic log")]
    DestinationOpen {
        /// Destination log path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The crash-record directory could not be resolved or opened.
    #[error("failed to open pstore directory")]
    SourceOpen {
        /// Crash-record directory path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A fixed-size buffer could not be allocated.
    #[error("failed to allocate transfer memory")]
    Allocation {
        /// Which buffer failed.
        what: &'static str,
        /// Requested size in bytes.
        size: usize,
    },
    /// Reading the next directory entry failed.
    #[error("failed to enumerate pstore directory")]
    Enumeration {
        /// Crash-record directory path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// A single crash-record file could not be opened.
    #[error("failed to open pstore record")]
    Open {
        /// Crash-record file path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// Reading a crash-record file failed before end of data.
    #[error("failed to read pstore record")]
    Read {
        /// Crash-record file path.
        path: PathBuf,
        /// Underlying IO error.
        source: io::Error,
    },
    /// The destination accepted fewer bytes than were read.
    #[error("short write to panic log")]
    ShortWrite {
        /// Crash-record file whose bytes were being appended.
        path: PathBuf,
        /// Bytes handed to the destination.
        requested: usize,
        /// Bytes the destination accepted.
        written: usize,
        /// Underlying IO error when the write failed outright.
        source: Option<io::Error>,
    },
}

impl TransferError {
    pub(crate) fn destination_open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::DestinationOpen {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn source_open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::SourceOpen {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn enumeration(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Enumeration {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Short label for the failure point, used in structured logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::DestinationOpen { .. } => "destination_open",
            Self::SourceOpen { .. } => "source_open",
            Self::Allocation { .. } => "allocation",
            Self::Enumeration { .. } => "enumeration",
            Self::Open { .. } => "open",
            Self::Read { .. } => "read",
            Self::ShortWrite { .. } => "short_write",
        }
    }

    /// Negative errno-style status reported across the fault boundary.
    ///
    /// IO failures report their OS error code, falling back to `EIO` when the
    /// error carries none.
    #[must_use]
    pub fn status_code(&self) -> i32 {
        match self {
            Self::DestinationOpen { source, .. }
            | Self::SourceOpen { source, .. }
            | Self::Enumeration { source, .. }
            | Self::Open { source, .. }
            | Self::Read { source, .. } => -source.raw_os_error().unwrap_or(Errno::EIO as i32),
            Self::Allocation { .. } => -(Errno::ENOMEM as i32),
            Self::ShortWrite { .. } => -(Errno::EIO as i32),
        }
    }
}
