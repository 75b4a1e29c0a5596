use chrono::{DateTime, Duration, Utc};

/// Where in the backward walk a given item was found. Purely observational:
/// attached to items and progress events for rendering and diagnostics,
/// never consulted by the pipeline itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkDescriptor {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub window_size: Duration,
    /// Increments once per emitted (non-retried) window.
    pub query_index: u32,
    pub item_index: usize,
    pub items_in_chunk: usize,
}

/// Running-total snapshot emitted by the chunker's count mode, one per
/// accepted window.
#[derive(Debug, Clone, PartialEq)]
pub struct CountSnapshot {
    pub running_total: u64,
    pub window_count: u64,
    pub window_size: Duration,
}
