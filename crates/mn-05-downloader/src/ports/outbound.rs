//! # Outbound Ports

use crate::domain::entities::{AcceptedFile, CycleReport, HaltReason};
use crate::domain::errors::{CheckpointError, StorageError};
use async_trait::async_trait;
use shared_types::{LastValidCheckpoint, StreamType};

/// Object storage - outbound port.
///
/// Keys are `/`-separated paths compared as byte strings.
#[async_trait]
pub trait StorageClient: Send + Sync {
    /// Up to `limit` keys starting with `prefix` and sorting strictly after
    /// `after`, in ascending order.
    async fn list(
        &self,
        prefix: &str,
        after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<String>, StorageError>;

    /// Full contents of one object.
    async fn fetch(&self, key: &str) -> Result<Vec<u8>, StorageError>;
}

/// Durable per-stream checkpoint - outbound port.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// The stored checkpoint, or `None` before the first accepted file.
    async fn load(&self, stream: StreamType)
        -> Result<Option<LastValidCheckpoint>, CheckpointError>;

    /// Replace the stream's checkpoint. Must be durable on return.
    async fn save(&self, checkpoint: &LastValidCheckpoint) -> Result<(), CheckpointError>;
}

/// Status callbacks to the surrounding service - outbound port.
///
/// Called on the cycle's task; implementations must not block.
pub trait StreamListener: Send + Sync {
    /// A file was persisted and the checkpoint moved past it.
    fn on_file_accepted(&self, _stream: StreamType, _file: &AcceptedFile) {}

    /// The cycle stopped at a file it could not accept.
    fn on_halt(&self, _stream: StreamType, _reason: &HaltReason) {}

    /// A cycle finished, whatever the outcome.
    fn on_cycle_complete(&self, _report: &CycleReport) {}
}

/// Listener that ignores every callback.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopListener;

impl StreamListener for NoopListener {}
