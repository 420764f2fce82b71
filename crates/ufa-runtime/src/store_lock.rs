//! # Store Process Locking
//!
//! Keeps two runtimes from serving the same store file. The file-backed store
//! rewrites its snapshot on every put, so a second writer would silently
//! discard the first one's updates.
//!
//! Uses `fs2` (flock on Unix, LockFile on Windows) on a sibling `<store>.lock`.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

/// Errors from store locking.
#[derive(Debug, Error)]
pub enum LockError {
    /// Lock file could not be created.
    #[error("failed to create lock file {path}: {source}")]
    CreateFailed {
        /// Lock file path.
        path: PathBuf,
        /// Underlying error.
        source: io::Error,
    },

    /// Another process holds the lock.
    #[error("store already in use ({})", .path.display())]
    AlreadyLocked {
        /// PID recorded by the holder, if readable.
        pid: Option<u32>,
        /// Lock file path.
        path: PathBuf,
    },

    /// PID could not be written to the lock file.
    #[error("failed to write PID to lock file: {0}")]
    WriteFailed(io::Error),
}

/// Exclusive lock on a store file, released on drop.
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Lock file path for `store_path`.
    #[must_use]
    pub fn lock_path(store_path: &Path) -> PathBuf {
        let mut name = store_path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Take the lock for `store_path` without blocking.
    pub fn acquire(store_path: &Path) -> Result<Self, LockError> {
        let path = Self::lock_path(store_path);

        // Not truncated before locking: the holder's PID must stay readable.
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::CreateFailed {
                path: path.clone(),
                source,
            })?;

        if file.try_lock_exclusive().is_err() {
            let pid = std::fs::read_to_string(&path)
                .ok()
                .and_then(|s| s.trim().parse().ok());
            return Err(LockError::AlreadyLocked { pid, path });
        }

        file.set_len(0).map_err(LockError::WriteFailed)?;
        writeln!(file, "{}", std::process::id()).map_err(LockError::WriteFailed)?;
        file.sync_all().map_err(LockError::WriteFailed)?;

        Ok(Self { file, path })
    }

    /// Path of the lock file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        let _ = std::fs::remove_file(&self.path);
    }
}
