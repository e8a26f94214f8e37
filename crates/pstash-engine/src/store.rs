//! Filesystem seam for the transfer engine.
//!
//! # Design
//! - The engine only needs three acquisitions: the log, the directory and one record.
//! - Every handle closes on drop, so scoped ownership is the release discipline.
//! - Directory enumeration is a lazy, single-pass iterator in storage order.

use std::ffi::{OsStr, OsString};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

#[cfg(unix)]
use std::os::unix::fs::{DirEntryExt, OpenOptionsExt};

/// Permission bits used when the log is created.
pub const LOG_FILE_MODE: u32 = 0o644;

/// Type tag of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file; the only kind that is copied.
    Regular,
    /// Subdirectory, including `.` and `..` when a store yields them.
    Directory,
    /// Symbolic link; never followed.
    Symlink,
    /// Sockets, devices, fifos and anything unrecognised.
    Other,
}

impl EntryKind {
    fn from_file_type(file_type: fs::FileType) -> Self {
        if file_type.is_file() {
            Self::Regular
        } else if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_symlink() {
            Self::Symlink
        } else {
            Self::Other
        }
    }
}

/// One record yielded while enumerating the crash-record directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryRecord {
    /// Entry name relative to the directory.
    pub name: OsString,
    /// Position of the entry within the enumeration.
    pub offset: u64,
    /// Inode-like identifier, `0` where the platform has none.
    pub ino: u64,
    /// Type tag.
    pub kind: EntryKind,
}

impl DirEntryRecord {
    /// Build a record from its parts.
    #[must_use]
    pub fn new(name: impl Into<OsString>, offset: u64, ino: u64, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            offset,
            ino,
            kind,
        }
    }

    /// Entry name.
    #[must_use]
    pub fn name(&self) -> &OsStr {
        &self.name
    }

    /// Length of the entry name in bytes.
    #[must_use]
    pub fn name_len(&self) -> usize {
        self.name.len()
    }

    /// Whether the entry is a regular file.
    #[must_use]
    pub fn is_regular(&self) -> bool {
        self.kind == EntryKind::Regular
    }
}

/// Acquisitions the transfer engine performs against a filesystem.
pub trait RecordStore {
    /// Append handle for the destination log.
    type Log: Write;
    /// Lazy enumeration of the crash-record directory.
    type Dir: Iterator<Item = io::Result<DirEntryRecord>>;
    /// Read handle for one crash record.
    type Record: Read;

    /// Open the log for append, creating it when absent. Never truncates.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error when the log cannot be opened.
    fn open_log(&self, path: &Path) -> io::Result<Self::Log>;

    /// Open the crash-record directory for enumeration.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error when the directory cannot be opened.
    fn open_dir(&self, path: &Path) -> io::Result<Self::Dir>;

    /// Open one crash record read-only.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error when the record cannot be opened.
    fn open_record(&self, path: &Path) -> io::Result<Self::Record>;
}

/// Store backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

impl RecordStore for LocalStore {
    type Log = File;
    type Dir = LocalDir;
    type Record = File;

    fn open_log(&self, path: &Path) -> io::Result<File> {
        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        options.mode(LOG_FILE_MODE);
        options.open(path)
    }

    fn open_dir(&self, path: &Path) -> io::Result<LocalDir> {
        Ok(LocalDir {
            inner: fs::read_dir(path)?,
            offset: 0,
        })
    }

    fn open_record(&self, path: &Path) -> io::Result<File> {
        File::open(path)
    }
}

/// Directory handle produced by [`LocalStore`]; closed when dropped.
#[derive(Debug)]
pub struct LocalDir {
    inner: fs::ReadDir,
    offset: u64,
}

impl Iterator for LocalDir {
    type Item = io::Result<DirEntryRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = match self.inner.next()? {
            Ok(entry) => entry,
            Err(err) => return Some(Err(err)),
        };
        let offset = self.offset;
        self.offset += 1;
        // file_type does not follow symlinks.
        let kind = match entry.file_type() {
            Ok(file_type) => EntryKind::from_file_type(file_type),
            Err(err) => return Some(Err(err)),
        };
        #[cfg(unix)]
        let ino = entry.ino();
        #[cfg(not(unix))]
        let ino = 0;
        Some(Ok(DirEntryRecord::new(entry.file_name(), offset, ino, kind)))
    }
}
