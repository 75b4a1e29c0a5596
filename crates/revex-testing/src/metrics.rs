//! Recording metrics fake.

use revex_runtime::ExportMetrics;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counts every recorder call; duration values are discarded, only the
/// fact that they were recorded is kept.
#[derive(Default)]
pub struct RecordingMetrics {
    items_exported: AtomicU64,
    revisions_exported: AtomicU64,
    revision_errors: AtomicU64,
    item_durations: AtomicU64,
    revision_durations: AtomicU64,
    run_durations: AtomicU64,
}

impl RecordingMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items_exported(&self) -> u64 {
        self.items_exported.load(Ordering::SeqCst)
    }

    pub fn revisions_exported(&self) -> u64 {
        self.revisions_exported.load(Ordering::SeqCst)
    }

    pub fn revision_errors(&self) -> u64 {
        self.revision_errors.load(Ordering::SeqCst)
    }

    pub fn item_durations(&self) -> u64 {
        self.item_durations.load(Ordering::SeqCst)
    }

    pub fn revision_durations(&self) -> u64 {
        self.revision_durations.load(Ordering::SeqCst)
    }

    pub fn run_durations(&self) -> u64 {
        self.run_durations.load(Ordering::SeqCst)
    }
}

impl ExportMetrics for RecordingMetrics {
    fn item_exported(&self) {
        self.items_exported.fetch_add(1, Ordering::SeqCst);
    }

    fn revision_exported(&self, _item_id: i64) {
        self.revisions_exported.fetch_add(1, Ordering::SeqCst);
    }

    fn revision_error(&self, _item_id: i64) {
        self.revision_errors.fetch_add(1, Ordering::SeqCst);
    }

    fn item_duration(&self, _duration: Duration) {
        self.item_durations.fetch_add(1, Ordering::SeqCst);
    }

    fn revision_duration(&self, _item_id: i64, _duration: Duration) {
        self.revision_durations.fetch_add(1, Ordering::SeqCst);
    }

    fn run_duration(&self, _duration: Duration) {
        self.run_durations.fetch_add(1, Ordering::SeqCst);
    }
}
