//! Prometheus metrics for the importer.
//!
//! All metrics follow the naming convention: `mn_<area>_<metric>_<unit>`
//! and carry a `stream` label (`record`, `event`, `balance`).

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Importer metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // DOWNLOADER METRICS (Subsystem 5)
    // =========================================================================

    /// Files that passed every stage
    pub static ref FILES_ACCEPTED: CounterVec = CounterVec::new(
        Opts::new("mn_downloader_files_accepted_total", "Stream files accepted"),
        &["stream"]
    ).expect("metric creation failed");

    /// Hash chain verdicts of accepted files
    pub static ref CHAIN_VERDICTS: CounterVec = CounterVec::new(
        Opts::new("mn_downloader_chain_verdicts_total", "Hash chain verdicts of accepted files"),
        &["stream", "verdict"]  // verdict: genesis/continuous/bypassed
    ).expect("metric creation failed");

    /// Cycles that stopped on a file
    pub static ref HALTS: CounterVec = CounterVec::new(
        Opts::new("mn_downloader_halts_total", "Cycles halted on a candidate file"),
        &["stream", "reason"]
    ).expect("metric creation failed");

    /// Consensus time of the last valid file, in seconds
    pub static ref CHECKPOINT_TIMESTAMP: GaugeVec = GaugeVec::new(
        Opts::new("mn_downloader_checkpoint_timestamp_seconds", "Consensus start of the last valid file"),
        &["stream"]
    ).expect("metric creation failed");

    /// Cycle wall time
    pub static ref CYCLE_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new("mn_downloader_cycle_duration_seconds", "Time spent per download cycle")
            .buckets(exponential_buckets(0.001, 2.0, 16).expect("valid buckets")),
        &["stream", "outcome"]  // outcome: completed/halted/cancelled
    ).expect("metric creation failed");

    // =========================================================================
    // PARSER METRICS (Subsystem 6)
    // =========================================================================

    /// Records handed to the persister and committed
    pub static ref RECORDS_PERSISTED: CounterVec = CounterVec::new(
        Opts::new("mn_parser_records_persisted_total", "Records committed"),
        &["stream"]
    ).expect("metric creation failed");
}

/// Proof that the metrics are registered.
#[derive(Debug)]
pub struct MetricsHandle {
    _private: (),
}

/// Register all metrics with the importer registry. Safe to call repeatedly.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(FILES_ACCEPTED.clone()),
        Box::new(CHAIN_VERDICTS.clone()),
        Box::new(HALTS.clone()),
        Box::new(CHECKPOINT_TIMESTAMP.clone()),
        Box::new(CYCLE_DURATION.clone()),
        Box::new(RECORDS_PERSISTED.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle { _private: () })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}

/// Record one accepted file.
pub fn record_accepted_file(stream: &str, verdict: &str, records: u64, checkpoint_seconds: f64) {
    FILES_ACCEPTED.with_label_values(&[stream]).inc();
    CHAIN_VERDICTS.with_label_values(&[stream, verdict]).inc();
    RECORDS_PERSISTED
        .with_label_values(&[stream])
        .inc_by(records as f64);
    CHECKPOINT_TIMESTAMP
        .with_label_values(&[stream])
        .set(checkpoint_seconds);
}

/// Record a halted cycle.
pub fn record_halt(stream: &str, reason: &str) {
    HALTS.with_label_values(&[stream, reason]).inc();
}

/// Record a finished cycle.
pub fn observe_cycle(stream: &str, outcome: &str, seconds: f64) {
    CYCLE_DURATION
        .with_label_values(&[stream, outcome])
        .observe(seconds);
}
