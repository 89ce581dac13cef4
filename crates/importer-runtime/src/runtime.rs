//! # Importer Runtime
//!
//! Owns the data directory and one download loop per enabled stream.
//!
//! ## Startup Sequence
//!
//! 1. Create the data directory and take its lock
//! 2. Load the initial address book, then any refresh saved by a previous run
//! 3. Register metrics
//! 4. Spawn a loop per enabled stream
//!
//! ## Stream Loop
//!
//! ```text
//! ┌─→ download ─→ accepted files and completed? ──yes──┐
//! │                      │ no                           │
//! │                      ↓                              │
//! │        sleep(poll_interval) or shutdown             │
//! └──────────────────────┴──────────────────────────────┘
//! ```
//!
//! A loop that keeps accepting files runs back to back until it catches
//! up; an idle or halted loop waits one poll interval. Errors are logged
//! and retried on the next tick, never fatal.

use crate::adapters::{
    AddressBookPersister, DataDirLock, FileCheckpointStore, FileSystemStorage,
    JsonLinesPersister, MetricsListener, RefreshStateFile,
};
use crate::config::ImporterConfig;
use anyhow::{Context, Result};
use mirror_telemetry::encode_metrics;
use mn_01_address_book::{AddressBookConfig, AddressBookService};
use mn_05_downloader::{CycleOutcome, Downloader, DownloaderApi};
use mn_06_stream_parser::StreamFileParser;
use parking_lot::Mutex;
use shared_types::{StreamFilename, StreamType};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// How long startup waits for another importer to release the data dir.
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Downloader as wired by the runtime.
pub type StreamDownloader = Downloader<FileSystemStorage, AddressBookService>;

/// The importer process.
pub struct ImporterRuntime {
    config: ImporterConfig,
    address_book: Arc<AddressBookService>,
    refresh_state: RefreshStateFile,
    refreshed_as_of: Option<StreamFilename>,
    storage: Arc<FileSystemStorage>,
    checkpoints: Arc<FileCheckpointStore>,
    listener: Arc<MetricsListener>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    lock: DataDirLock,
}

impl ImporterRuntime {
    /// Prepare the runtime. Nothing runs until `start`.
    pub fn new(config: ImporterConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir).with_context(|| {
            format!("Failed to create data dir {}", config.data_dir.display())
        })?;
        let lock = DataDirLock::acquire(&config.data_dir, LOCK_TIMEOUT)
            .context("Failed to lock data dir")?;

        let address_book = Arc::new(AddressBookService::new(AddressBookConfig::default()));
        let bytes = std::fs::read(&config.address_book).with_context(|| {
            format!(
                "Failed to read address book {}",
                config.address_book.display()
            )
        })?;
        address_book
            .load(&bytes)
            .context("Failed to decode address book")?;
        let refresh_state = RefreshStateFile::new(config.address_book_state_file());
        let refreshed_as_of = refresh_state
            .restore(&address_book)
            .context("Failed to restore address book state")?;

        let listener = Arc::new(MetricsListener::register().context("Failed to register metrics")?);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            storage: Arc::new(FileSystemStorage::new(&config.bucket_dir)),
            checkpoints: Arc::new(FileCheckpointStore::new(config.checkpoint_dir())),
            config,
            address_book,
            refresh_state,
            refreshed_as_of,
            listener,
            shutdown_tx,
            shutdown_rx,
            tasks: Mutex::new(Vec::new()),
            lock,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &ImporterConfig {
        &self.config
    }

    /// The shared address book.
    pub fn address_book(&self) -> &Arc<AddressBookService> {
        &self.address_book
    }

    /// Wire a downloader for `stream`.
    pub fn build_downloader(&self, stream: StreamType) -> Result<StreamDownloader> {
        let settings = self.config.settings(stream);
        let persister = AddressBookPersister::new(
            JsonLinesPersister::new(self.config.output_dir()),
            Arc::clone(&self.address_book),
        )
        .with_state_file(self.refresh_state.clone(), self.refreshed_as_of);
        let parser = StreamFileParser::new(settings.parser.clone(), Arc::new(persister));
        let downloader = Downloader::new(
            settings.downloader_config(stream),
            Arc::clone(&self.storage),
            Arc::clone(&self.address_book),
            Arc::new(parser),
            self.checkpoints.clone(),
        )
        .with_context(|| format!("Failed to build {} downloader", stream.label()))?;
        Ok(downloader.with_listener(self.listener.clone()))
    }

    /// Spawn a loop for every enabled stream.
    pub fn start(&self) -> Result<()> {
        info!("===========================================");
        info!("  Mirror Importer v{}", crate::VERSION);
        info!("===========================================");
        info!(
            data_dir = %self.config.data_dir.display(),
            bucket_dir = %self.config.bucket_dir.display(),
            lock = %self.lock.path().display(),
            "[runtime] Starting"
        );

        let mut tasks = self.tasks.lock();
        for stream in self.config.enabled_streams() {
            let downloader = self.build_downloader(stream)?;
            let poll_interval = self.config.settings(stream).poll_interval();
            let shutdown = self.shutdown_rx.clone();
            let metrics_file = self.config.metrics_file.clone();
            tasks.push(tokio::spawn(run_stream_loop(
                Arc::new(downloader),
                poll_interval,
                shutdown,
                metrics_file,
            )));
        }
        info!(streams = tasks.len(), "[runtime] Stream loops running");
        Ok(())
    }

    /// Signal every loop to stop and wait up to the grace period.
    ///
    /// A loop mid-file finishes that file first; the checkpoint is never
    /// left ahead of persisted data.
    pub async fn shutdown(&self) {
        info!("[runtime] Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("[runtime] Failed to send shutdown signal: {}", e);
        }

        let tasks = std::mem::take(&mut *self.tasks.lock());
        let join = async {
            for task in tasks {
                if let Err(e) = task.await {
                    error!("[runtime] Stream loop panicked: {}", e);
                }
            }
        };
        if tokio::time::timeout(self.config.shutdown_grace(), join)
            .await
            .is_err()
        {
            warn!(
                grace_ms = self.config.shutdown_grace_ms,
                "[runtime] Stream loops did not stop within grace period"
            );
        }
        info!("[runtime] Shutdown complete");
    }
}

/// Drive one stream until shutdown.
pub async fn run_stream_loop(
    downloader: Arc<dyn DownloaderApi>,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
    metrics_file: Option<PathBuf>,
) {
    let stream = downloader.stream_type();
    info!(stream = %stream, "[runtime] Stream loop started");

    while !*shutdown.borrow() {
        let busy = match downloader.download(&shutdown).await {
            Ok(report) => {
                debug!(
                    stream = %stream,
                    accepted = report.accepted.len(),
                    outcome = report.outcome.as_str(),
                    "[runtime] Cycle finished"
                );
                report.outcome == CycleOutcome::Completed && !report.accepted.is_empty()
            }
            Err(e) => {
                error!(stream = %stream, error = %e, "[runtime] Cycle failed");
                false
            }
        };

        if let Some(path) = &metrics_file {
            if let Err(e) = write_metrics(path, stream).await {
                warn!(path = %path.display(), error = %e, "[runtime] Failed to write metrics");
            }
        }

        if busy {
            continue;
        }
        tokio::select! {
            _ = tokio::time::sleep(poll_interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            }
        }
    }

    info!(stream = %stream, "[runtime] Stream loop stopped");
}

async fn write_metrics(path: &Path, stream: StreamType) -> Result<()> {
    let text = encode_metrics()?;
    let tmp = path.with_extension(format!("{}.tmp", stream.label()));
    tokio::fs::write(&tmp, text).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
