//! # File Checkpoint Store
//!
//! One JSON file per stream, replaced atomically (write, fsync, rename).

use async_trait::async_trait;
use mn_05_downloader::{CheckpointError, CheckpointStore};
use shared_types::{LastValidCheckpoint, StreamType};
use std::io;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Checkpoints stored as `{dir}/{stream}.json`.
#[derive(Clone, Debug)]
pub struct FileCheckpointStore {
    dir: PathBuf,
}

impl FileCheckpointStore {
    /// Store checkpoints below `dir`; created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// File holding `stream`'s checkpoint.
    pub fn path(&self, stream: StreamType) -> PathBuf {
        self.dir.join(format!("{}.json", stream.label()))
    }

    async fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
        let tmp = path.with_extension("json.tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.sync_all().await?;
        drop(file);
        tokio::fs::rename(&tmp, path).await
    }
}

fn io_error(path: &Path, error: io::Error) -> CheckpointError {
    CheckpointError::Io(format!("{}: {}", path.display(), error))
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn load(
        &self,
        stream: StreamType,
    ) -> Result<Option<LastValidCheckpoint>, CheckpointError> {
        let path = self.path(stream);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(&path, e)),
        };

        let checkpoint: LastValidCheckpoint = serde_json::from_slice(&bytes)
            .map_err(|e| CheckpointError::Corrupt(format!("{}: {}", path.display(), e)))?;
        if checkpoint.stream_type() != stream {
            return Err(CheckpointError::Corrupt(format!(
                "{} holds a {} checkpoint",
                path.display(),
                checkpoint.stream_type().label()
            )));
        }
        Ok(Some(checkpoint))
    }

    async fn save(&self, checkpoint: &LastValidCheckpoint) -> Result<(), CheckpointError> {
        let path = self.path(checkpoint.stream_type());
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| io_error(&self.dir, e))?;

        let bytes = serde_json::to_vec_pretty(checkpoint)
            .map_err(|e| CheckpointError::Corrupt(e.to_string()))?;
        Self::write_atomic(&path, &bytes)
            .await
            .map_err(|e| io_error(&path, e))?;

        debug!(file = %checkpoint.file_name, "[runtime] Checkpoint saved");
        Ok(())
    }
}
