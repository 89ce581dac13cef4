//! # Mirror Importer
//!
//! Follows the record, event and balance streams published by consensus
//! nodes and persists every file that passes signature and hash chain
//! verification.
//!
//! ## Startup Sequence
//!
//! 1. Initialize telemetry (`MIRROR_LOG_LEVEL`, `MIRROR_JSON_LOGS`, ...)
//! 2. Load configuration (`MIRROR_CONFIG` file, then `MIRROR_*` overrides)
//! 3. Lock the data directory and load the address book
//! 4. Start one loop per enabled stream
//! 5. Wait for Ctrl+C, then shut down within the grace period

use anyhow::{Context, Result};
use importer_runtime::{ImporterConfig, ImporterRuntime};
use mirror_telemetry::{init_telemetry, TelemetryConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(&TelemetryConfig::from_env())
        .context("Failed to initialize telemetry")?;

    let config = ImporterConfig::from_env().context("Failed to load configuration")?;
    let runtime = ImporterRuntime::new(config)?;
    runtime.start()?;

    info!("Importer is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    runtime.shutdown().await;
    Ok(())
}
