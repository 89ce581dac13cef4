//! # Mirror Telemetry
//!
//! Logging and metrics for the mirror importer.
//!
//! ## Components
//!
//! - **Logging**: `tracing-subscriber` with an `EnvFilter`, human readable or
//!   JSON output
//! - **Metrics**: Prometheus counters, gauges and histograms in a private
//!   registry, rendered in the text exposition format
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mirror_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(&TelemetryConfig::from_env())?;
//!     // ...
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MIRROR_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `MIRROR_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `MIRROR_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `MIRROR_SERVICE_NAME` | `mirror-importer` | Service name in the startup log |

#![warn(missing_docs)]
#![warn(clippy::all)]

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::init_logging;
pub use metrics::{
    encode_metrics, observe_cycle, record_accepted_file, record_halt, register_metrics,
    MetricsHandle, CHAIN_VERDICTS, CHECKPOINT_TIMESTAMP, CYCLE_DURATION, FILES_ACCEPTED,
    HALTS, RECORDS_PERSISTED,
};

use thiserror::Error;

/// Telemetry initialisation errors.
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// The log filter or subscriber could not be installed.
    #[error("Failed to initialise logging: {0}")]
    LoggingInit(String),

    /// A metric could not be registered or encoded.
    #[error("Failed to initialise Prometheus metrics: {0}")]
    MetricsInit(String),
}

/// Install logging and register metrics.
///
/// Hold the returned guard for the lifetime of the process.
pub fn init_telemetry(config: &TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    init_logging(config)?;

    tracing::info!(
        service = %config.service_name,
        log_level = %config.log_level,
        json_logs = config.json_logs,
        "Telemetry initialised"
    );

    Ok(TelemetryGuard { _metrics: metrics })
}

/// Keeps telemetry alive; logs on drop.
pub struct TelemetryGuard {
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry...");
    }
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
