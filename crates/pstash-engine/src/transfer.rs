//! Transfer orchestration: one complete pstore-to-log run.
//!
//! # Design
//! - Acquire the log, then the directory, then the buffer; each is a scoped owner.
//! - Locals drop in reverse order, so teardown is buffer, directory, log on every path.
//! - Stop at the first failing entry; bytes already appended stay in the log.

use pstash_config::TransferPaths;
use tracing::{error, info};

use crate::error::{TransferError, TransferResult};
use crate::store::{LocalStore, RecordStore};
use crate::visitor::{EntryVisitor, VisitOutcome};

/// Counters describing one completed transfer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferReport {
    /// Directory entries yielded by the enumeration.
    pub entries_seen: u64,
    /// Regular files appended to the log.
    pub files_copied: u64,
    /// Non-regular entries that were skipped.
    pub entries_skipped: u64,
    /// Total bytes appended to the log.
    pub bytes_appended: u64,
}

/// Runs pstore-to-log transfers against a [`RecordStore`].
#[derive(Debug, Clone)]
pub struct PstoreTransfer<S = LocalStore> {
    paths: TransferPaths,
    store: S,
}

impl PstoreTransfer<LocalStore> {
    /// Transfer between local filesystem paths.
    #[must_use]
    pub const fn new(paths: TransferPaths) -> Self {
        Self::with_store(paths, LocalStore)
    }
}

impl<S: RecordStore> PstoreTransfer<S> {
    /// Transfer through a caller-supplied store.
    #[must_use]
    pub const fn with_store(paths: TransferPaths, store: S) -> Self {
        Self { paths, store }
    }

    /// Paths this transfer reads from and appends to.
    #[must_use]
    pub const fn paths(&self) -> &TransferPaths {
        &self.paths
    }

    /// Store used for every acquisition.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Append every regular file in the source directory to the log.
    ///
    /// # Errors
    ///
    /// Returns the first failure encountered. Every resource acquired before
    /// the failure has been released by the time this returns.
    pub fn run(&self) -> TransferResult<TransferReport> {
        let result = self.execute();
        match &result {
            Ok(report) => info!(
                source_dir = %self.paths.source_dir.display(),
                log_path = %self.paths.log_path.display(),
                files = report.files_copied,
                skipped = report.entries_skipped,
                bytes = report.bytes_appended,
                "pstore transfer completed"
            ),
            Err(err) => error!(
                kind = err.kind(),
                status = err.status_code(),
                error = ?err,
                "pstore transfer failed"
            ),
        }
        result
    }

    /// Run once and collapse the outcome into a status code: `0` on success,
    /// a negative errno-style value on failure.
    #[must_use]
    pub fn run_status(&self) -> i32 {
        self.run().map_or_else(|err| err.status_code(), |_| 0)
    }

    fn execute(&self) -> TransferResult<TransferReport> {
        let paths = &self.paths;

        let mut log = self
            .store
            .open_log(&paths.log_path)
            .map_err(|source| TransferError::destination_open(&paths.log_path, source))?;
        info!(log_path = %paths.log_path.display(), "opened panic log");

        let mut entries = self
            .store
            .open_dir(&paths.source_dir)
            .map_err(|source| TransferError::source_open(&paths.source_dir, source))?;
        info!(source_dir = %paths.source_dir.display(), "opened pstore directory");

        let mut buffer = allocate_buffer(paths.buffer_size)?;

        let mut visitor = EntryVisitor::new(&self.store, &paths.source_dir, &mut log, &mut buffer);
        let mut report = TransferReport::default();
        for entry in entries.by_ref() {
            let entry =
                entry.map_err(|source| TransferError::enumeration(&paths.source_dir, source))?;
            report.entries_seen += 1;
            match visitor.visit(&entry) {
                Ok(VisitOutcome::Skipped) => report.entries_skipped += 1,
                Ok(VisitOutcome::Copied { bytes }) => {
                    report.files_copied += 1;
                    report.bytes_appended += bytes;
                }
                Err(err) => {
                    error!(
                        name = ?entry.name(),
                        appended = report.bytes_appended,
                        "stopping pstore enumeration"
                    );
                    return Err(err);
                }
            }
        }
        Ok(report)
    }
}

fn allocate_buffer(size: usize) -> TransferResult<Vec<u8>> {
    let failure = TransferError::Allocation {
        what: "transfer buffer",
        size,
    };
    if size == 0 {
        return Err(failure);
    }
    let mut buffer: Vec<u8> = Vec::new();
    if buffer.try_reserve_exact(size).is_err() {
        return Err(failure);
    }
    buffer.resize(size, 0);
    Ok(buffer)
}

/// Run one transfer over the local filesystem.
///
/// # Errors
///
/// Returns the first failure encountered; see [`PstoreTransfer::run`].
pub fn transfer_pstore(paths: &TransferPaths) -> TransferResult<TransferReport> {
    PstoreTransfer::new(paths.clone()).run()
}

/// Fault-boundary entry point: transfer and return `0` or a negative status.
#[must_use]
pub fn write_panic_log(paths: &TransferPaths) -> i32 {
    PstoreTransfer::new(paths.clone()).run_status()
}
