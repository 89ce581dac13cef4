//! # Filesystem Object Store
//!
//! Serves a mirrored bucket from a local directory: key `a/b/c` is the file
//! `{root}/a/b/c`. Listing covers one directory level, which matches the
//! `{stream}/{node}/{file}` layout.

use async_trait::async_trait;
use mn_05_downloader::{StorageClient, StorageError};
use std::io;
use std::path::{Component, Path, PathBuf};

/// Object store rooted at a local directory.
#[derive(Clone, Debug)]
pub struct FileSystemStorage {
    root: PathBuf,
}

impl FileSystemStorage {
    /// Serve objects below `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Bucket root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a key to a path, refusing anything that could leave the root.
    fn resolve(&self, key: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(key);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !safe {
            return Err(StorageError::Denied(key.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

fn map_io(key: &str, error: io::Error) -> StorageError {
    match error.kind() {
        io::ErrorKind::NotFound => StorageError::NotFound(key.to_string()),
        io::ErrorKind::PermissionDenied => StorageError::Denied(key.to_string()),
        _ => StorageError::Io(format!("{}: {}", key, error)),
    }
}

#[async_trait]
impl StorageClient for FileSystemStorage {
    async fn list(
        &self,
        prefix: &str,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<String>, StorageError> {
        // Directory part of the prefix, with its trailing slash.
        let directory = match prefix.rfind('/') {
            Some(index) => &prefix[..=index],
            None => "",
        };
        let path = if directory.is_empty() {
            self.root.clone()
        } else {
            self.resolve(directory.trim_end_matches('/'))?
        };

        let mut entries = match tokio::fs::read_dir(&path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(map_io(prefix, e)),
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(|e| map_io(prefix, e))? {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if !is_file {
                continue;
            }
            let key = format!("{}{}", directory, name);
            if key.starts_with(prefix) && after.map_or(true, |after| key.as_str() > after) {
                keys.push(key);
            }
        }

        keys.sort_unstable();
        keys.truncate(limit);
        Ok(keys)
    }

    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.resolve(key)?;
        tokio::fs::read(&path).await.map_err(|e| map_io(key, e))
    }
}
