//! # Inbound Ports

use crate::domain::entities::CycleReport;
use crate::domain::errors::DownloaderError;
use async_trait::async_trait;
use shared_types::{LastValidCheckpoint, StreamType};
use tokio::sync::watch;

/// Downloader API - inbound port.
#[async_trait]
pub trait DownloaderApi: Send + Sync {
    /// Stream this downloader follows.
    fn stream_type(&self) -> StreamType;

    /// Run one cycle starting from `checkpoint`.
    ///
    /// The returned report carries the checkpoint to pass to the next
    /// cycle. `shutdown` is checked between candidate files.
    async fn run_cycle(
        &self,
        checkpoint: Option<LastValidCheckpoint>,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<CycleReport, DownloaderError>;

    /// Run one cycle from the stored checkpoint.
    async fn download(
        &self,
        shutdown: &watch::Receiver<bool>,
    ) -> Result<CycleReport, DownloaderError>;
}
