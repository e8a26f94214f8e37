//! Temporary pstore trees and byte patterns.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pstash_config::TransferPaths;
use tempfile::TempDir;

/// Deterministic payload of `len` bytes that differs per `seed`.
///
/// Bytes cycle through a prime-length alphabet so chunk boundaries of
/// power-of-two buffers never line up with the pattern.
#[must_use]
pub fn pattern(seed: u8, len: usize) -> Vec<u8> {
    (0..len)
        .map(|index| {
            let offset = u8::try_from(index % 251).unwrap_or(0);
            seed.wrapping_add(offset)
        })
        .collect()
}

/// Temporary directory holding a `pstore/` source and a `panic.log` target.
pub struct PstoreFixture {
    temp: TempDir,
    source_dir: PathBuf,
    log_path: PathBuf,
}

impl PstoreFixture {
    /// Create the temporary tree with an empty source directory and no log.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directory cannot be created.
    pub fn new() -> Result<Self> {
        let temp = tempfile::Builder::new()
            .prefix("pstash-")
            .tempdir()
            .context("failed to create temporary directory")?;
        let source_dir = temp.path().join("pstore");
        fs::create_dir(&source_dir)
            .with_context(|| format!("failed to create {}", source_dir.display()))?;
        let log_path = temp.path().join("panic.log");
        Ok(Self {
            temp,
            source_dir,
            log_path,
        })
    }

    /// Root of the temporary tree.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Crash-record directory.
    #[must_use]
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Destination log path.
    #[must_use]
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Transfer paths pointing at this fixture.
    #[must_use]
    pub fn paths(&self) -> TransferPaths {
        TransferPaths::new(&self.source_dir, &self.log_path)
    }

    /// Write a crash record with the given contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_record(&self, name: &str, contents: &[u8]) -> Result<PathBuf> {
        let path = self.source_dir.join(name);
        fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Create a subdirectory inside the source directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn create_subdir(&self, name: &str) -> Result<PathBuf> {
        let path = self.source_dir.join(name);
        fs::create_dir_all(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        Ok(path)
    }

    /// Create a symlink named `name` inside the source directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the link cannot be created.
    #[cfg(unix)]
    pub fn create_symlink(&self, name: &str, target: &Path) -> Result<PathBuf> {
        let path = self.source_dir.join(name);
        std::os::unix::fs::symlink(target, &path)
            .with_context(|| format!("failed to link {}", path.display()))?;
        Ok(path)
    }

    /// Seed the log with content from a previous boot.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be written.
    pub fn seed_log(&self, contents: &[u8]) -> Result<()> {
        fs::write(&self.log_path, contents)
            .with_context(|| format!("failed to seed {}", self.log_path.display()))
    }

    /// Current log contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be read.
    pub fn read_log(&self) -> Result<Vec<u8>> {
        fs::read(&self.log_path)
            .with_context(|| format!("failed to read {}", self.log_path.display()))
    }

    /// Names of the source directory's entries in storage order.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub fn storage_order(&self) -> Result<Vec<String>> {
        fs::read_dir(&self.source_dir)
            .with_context(|| format!("failed to list {}", self.source_dir.display()))?
            .map(|entry| {
                entry
                    .map(|entry| entry.file_name().to_string_lossy().into_owned())
                    .context("failed to read directory entry")
            })
            .collect()
    }
}
