use std::time::Duration;
use tracing::debug;

/// Injected recorder for export telemetry. An instance is handed to the
/// orchestrator at construction; nothing here may affect pipeline
/// correctness. Implementations must tolerate being called from a worker
/// thread when the export is streamed.
pub trait ExportMetrics {
    fn item_exported(&self);
    fn revision_exported(&self, item_id: i64);
    fn revision_error(&self, item_id: i64);
    fn item_duration(&self, duration: Duration);
    fn revision_duration(&self, item_id: i64, duration: Duration);
    fn run_duration(&self, duration: Duration);
}

/// Discards everything.
pub struct NoopMetrics;

impl ExportMetrics for NoopMetrics {
    fn item_exported(&self) {}
    fn revision_exported(&self, _item_id: i64) {}
    fn revision_error(&self, _item_id: i64) {}
    fn item_duration(&self, _duration: Duration) {}
    fn revision_duration(&self, _item_id: i64, _duration: Duration) {}
    fn run_duration(&self, _duration: Duration) {}
}

/// Emits every measurement as a debug-level trace event.
pub struct TracingMetrics;

impl ExportMetrics for TracingMetrics {
    fn item_exported(&self) {
        debug!("work item exported");
    }

    fn revision_exported(&self, item_id: i64) {
        debug!(item_id, "revision exported");
    }

    fn revision_error(&self, item_id: i64) {
        debug!(item_id, "revision error");
    }

    fn item_duration(&self, duration: Duration) {
        debug!(ms = duration.as_millis() as u64, "work item processed");
    }

    fn revision_duration(&self, item_id: i64, duration: Duration) {
        debug!(item_id, ms = duration.as_millis() as u64, "revision processed");
    }

    fn run_duration(&self, duration: Duration) {
        debug!(ms = duration.as_millis() as u64, "export run finished");
    }
}
