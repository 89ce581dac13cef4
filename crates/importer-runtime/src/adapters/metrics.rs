//! Listener feeding downloader callbacks into the importer metrics.

use mirror_telemetry::{
    observe_cycle, record_accepted_file, record_halt, register_metrics, MetricsHandle,
    TelemetryError,
};
use mn_05_downloader::{AcceptedFile, CycleReport, HaltReason, StreamListener};
use shared_types::StreamType;

/// `StreamListener` that updates the Prometheus collectors.
#[derive(Debug)]
pub struct MetricsListener {
    _handle: MetricsHandle,
}

impl MetricsListener {
    /// Register the collectors and build the listener.
    pub fn register() -> Result<Self, TelemetryError> {
        Ok(Self {
            _handle: register_metrics()?,
        })
    }
}

impl StreamListener for MetricsListener {
    fn on_file_accepted(&self, stream: StreamType, file: &AcceptedFile) {
        record_accepted_file(
            stream.label(),
            file.verdict.as_str(),
            file.records,
            file.name.timestamp().seconds() as f64,
        );
    }

    fn on_halt(&self, stream: StreamType, reason: &HaltReason) {
        record_halt(stream.label(), reason.as_str());
    }

    fn on_cycle_complete(&self, report: &CycleReport) {
        observe_cycle(
            report.stream_type.label(),
            report.outcome.as_str(),
            report.elapsed.as_secs_f64(),
        );
    }
}
