//! Per-entry handling: filter to regular files, open, copy, close.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::copier::copy_stream;
use crate::error::{TransferError, TransferResult};
use crate::store::{DirEntryRecord, RecordStore};

/// What happened to one directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisitOutcome {
    /// The entry was not a regular file and contributed nothing.
    Skipped,
    /// The entry's bytes were appended to the log.
    Copied {
        /// Bytes appended for this entry.
        bytes: u64,
    },
}

/// Copies directory entries into the shared log using the shared buffer.
///
/// The log and buffer stay owned by the caller and are only borrowed here.
pub struct EntryVisitor<'a, S: RecordStore> {
    store: &'a S,
    source_dir: &'a Path,
    destination: &'a mut S::Log,
    buffer: &'a mut [u8],
}

impl<'a, S: RecordStore> EntryVisitor<'a, S> {
    /// Bind a visitor to the open log and transfer buffer.
    #[must_use]
    pub const fn new(
        store: &'a S,
        source_dir: &'a Path,
        destination: &'a mut S::Log,
        buffer: &'a mut [u8],
    ) -> Self {
        Self {
            store,
            source_dir,
            destination,
            buffer,
        }
    }

    /// Copy `entry` into the log when it is a regular file.
    ///
    /// # Errors
    ///
    /// Returns an allocation, open, read or short-write error for the entry.
    /// The record file is closed before this returns in every case.
    pub fn visit(&mut self, entry: &DirEntryRecord) -> TransferResult<VisitOutcome> {
        if !entry.is_regular() {
            debug!(name = ?entry.name(), kind = ?entry.kind, "skipping non-regular pstore entry");
            return Ok(VisitOutcome::Skipped);
        }

        let path = record_path(self.source_dir, entry.name())?;
        let mut record = self
            .store
            .open_record(&path)
            .map_err(|source| TransferError::open(&path, source))?;

        info!(path = %path.display(), "processing pstore file");

        let bytes = copy_stream(&mut record, &mut *self.destination, &mut *self.buffer, &path)?;
        Ok(VisitOutcome::Copied { bytes })
    }
}

/// Join `<dir>/<name>` into a buffer reserved up front.
fn record_path(dir: &Path, name: &OsStr) -> TransferResult<PathBuf> {
    let size = dir
        .as_os_str()
        .len()
        .saturating_add(name.len())
        .saturating_add(1);
    let mut path = PathBuf::new();
    path.try_reserve_exact(size)
        .map_err(|_| TransferError::Allocation {
            what: "record path",
            size,
        })?;
    path.push(dir);
    path.push(name);
    Ok(path)
}
