//! # Data Directory Lock
//!
//! Uses `fs2` for cross-platform file locking (flock on Unix, LockFile on
//! Windows). One importer process per data directory: two writers on the
//! same chain would race each other's checkpoints.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Lock acquisition failures.
#[derive(Debug, Error)]
pub enum LockError {
    /// Lock file could not be created.
    #[error("Failed to create lock file {path}: {source}")]
    CreateFailed {
        /// Lock file path.
        path: PathBuf,
        /// Cause.
        source: io::Error,
    },

    /// Another process holds the lock.
    #[error("Data directory already in use{} ({})", pid.map(|p| format!(" by process {}", p)).unwrap_or_default(), path.display())]
    AlreadyLocked {
        /// Holder's PID, if readable.
        pid: Option<u32>,
        /// Lock file path.
        path: PathBuf,
    },

    /// Writing the PID failed.
    #[error("Failed to write PID to lock file: {0}")]
    WriteFailed(io::Error),
}

/// Exclusive lock on the data directory, released on drop.
#[derive(Debug)]
pub struct DataDirLock {
    file: File,
    path: PathBuf,
}

impl DataDirLock {
    /// Lock file name
    const LOCK_FILE: &'static str = "LOCK";

    /// Acquire the lock, retrying with backoff until `timeout` elapses.
    ///
    /// # Errors
    ///
    /// Returns `LockError::AlreadyLocked` if another process still holds the
    /// lock when the timeout expires.
    pub fn acquire(data_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let deadline = Instant::now() + timeout;
        let path = data_dir.join(Self::LOCK_FILE);
        let mut retry_delay = Duration::from_millis(50);

        loop {
            let mut file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .read(true)
                .write(true)
                .open(&path)
                .map_err(|source| LockError::CreateFailed {
                    path: path.clone(),
                    source,
                })?;

            if file.try_lock_exclusive().is_ok() {
                file.set_len(0).map_err(LockError::WriteFailed)?;
                writeln!(file, "{}", std::process::id()).map_err(LockError::WriteFailed)?;
                file.sync_all().map_err(LockError::WriteFailed)?;
                return Ok(Self { file, path });
            }
            drop(file);

            if Instant::now() >= deadline {
                return Err(LockError::AlreadyLocked {
                    pid: Self::read_existing_pid(&path),
                    path,
                });
            }

            // Exponential backoff capped at 500ms
            std::thread::sleep(retry_delay);
            retry_delay = (retry_delay * 2).min(Duration::from_millis(500));
        }
    }

    /// Path to the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_existing_pid(path: &Path) -> Option<u32> {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| s.trim().parse().ok())
    }
}

impl Drop for DataDirLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_contains_pid() {
        let dir = tempfile::tempdir().unwrap();

        let lock = DataDirLock::acquire(dir.path(), Duration::ZERO).unwrap();
        let content = std::fs::read_to_string(lock.path()).unwrap();
        assert_eq!(content.trim().parse::<u32>().unwrap(), std::process::id());
    }

    #[test]
    fn test_double_lock_fails() {
        let dir = tempfile::tempdir().unwrap();

        let _held = DataDirLock::acquire(dir.path(), Duration::ZERO).unwrap();
        let result = DataDirLock::acquire(dir.path(), Duration::from_millis(60));

        match result {
            Err(LockError::AlreadyLocked { pid, .. }) => {
                assert_eq!(pid, Some(std::process::id()))
            }
            other => panic!("expected AlreadyLocked, got {:?}", other),
        }
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();

        {
            let _lock = DataDirLock::acquire(dir.path(), Duration::ZERO).unwrap();
        }
        assert!(!dir.path().join("LOCK").exists());
        assert!(DataDirLock::acquire(dir.path(), Duration::ZERO).is_ok());
    }
}
