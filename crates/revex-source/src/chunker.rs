use crate::query::ItemQuery;
use crate::source::WorkItemSource;
use chrono::{DateTime, Duration, Utc};
use revex_types::{ChunkDescriptor, CountSnapshot, WorkItem};
use std::collections::VecDeque;
use std::fmt;
use tracing::warn;

// NOTE: Windowing Rationale
//
// The remote system exposes no stable cursor and caps every query at a hard
// result ceiling. The only stable predicate is the item creation timestamp,
// so pagination is a backward walk over creation-date windows: newest window
// first, each window sized adaptively. An oversized or failing window is
// halved and retried against the same end date; an accepted window advances
// the end date and regrows the window toward the observed item density.
// A zero-count window means there is no older data and the walk ends.

/// Tuning for the adaptive window walk. The floor bounds the shrink loop:
/// halving below it stops the walk with a fatal error instead of retrying
/// forever against a perpetually failing or oversized predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkerConfig {
    pub initial_window: Duration,
    pub window_growth: Duration,
    pub growth_ceiling: Duration,
    pub window_floor: Duration,
    pub max_items_per_query: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            initial_window: Duration::days(120),
            window_growth: Duration::days(1),
            growth_ceiling: Duration::days(30),
            window_floor: Duration::days(1),
            max_items_per_query: 20_000,
        }
    }
}

/// Why the last shrink happened. Oversized results and query failures share
/// the corrective action but not the diagnosis.
#[derive(Debug)]
pub enum ShrinkReason {
    Oversized { count: usize, ceiling: usize },
    QueryFailed { message: String },
}

#[derive(Debug)]
pub enum ChunkError {
    /// Halving the window would cross the configured floor. Carries the
    /// reason for the shrink that hit the floor.
    WindowFloorReached {
        window: Duration,
        floor: Duration,
        reason: ShrinkReason,
    },
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkError::WindowFloorReached {
                window,
                floor,
                reason,
            } => {
                write!(
                    f,
                    "window of {} hours cannot shrink below the {} hour floor: ",
                    window.num_hours(),
                    floor.num_hours()
                )?;
                match reason {
                    ShrinkReason::Oversized { count, ceiling } => {
                        write!(f, "query returned {} items (ceiling {})", count, ceiling)
                    }
                    ShrinkReason::QueryFailed { message } => {
                        write!(f, "query failed: {}", message)
                    }
                }
            }
        }
    }
}

impl std::error::Error for ChunkError {}

/// A work item stamped with the window it was found in.
#[derive(Debug, Clone)]
pub struct ChunkedWorkItem {
    pub item: WorkItem,
    pub chunk: ChunkDescriptor,
}

struct WindowState {
    end_date: DateTime<Utc>,
    window: Duration,
    query_index: u32,
    config: ChunkerConfig,
}

impl WindowState {
    fn new(config: ChunkerConfig, until: DateTime<Utc>) -> Self {
        let window = config.initial_window.max(config.window_floor);
        Self {
            end_date: until,
            window,
            query_index: 0,
            config,
        }
    }

    fn window_start(&self) -> DateTime<Utc> {
        self.end_date - self.window
    }

    fn shrink(&mut self, reason: ShrinkReason) -> Result<(), ChunkError> {
        let halved = self.window / 2;
        if halved < self.config.window_floor {
            return Err(ChunkError::WindowFloorReached {
                window: self.window,
                floor: self.config.window_floor,
                reason,
            });
        }
        self.window = halved;
        Ok(())
    }

    /// Move past an accepted window: walk the end date back, regrow the
    /// window toward the growth ceiling, bump the sequence index.
    fn advance(&mut self) {
        self.end_date = self.end_date - self.window;
        if self.window < self.config.growth_ceiling {
            self.window = (self.window + self.config.window_growth).min(self.config.growth_ceiling);
        }
        self.query_index += 1;
    }
}

/// Count mode: lazy running totals, no items materialized. Retried windows
/// contribute nothing, so the final total matches what enumerate mode
/// yields over the same data.
pub fn count_by_created_window<'a>(
    source: &'a dyn WorkItemSource,
    query: &'a ItemQuery,
    config: ChunkerConfig,
    until: DateTime<Utc>,
) -> CountChunks<'a> {
    CountChunks {
        source,
        query,
        state: WindowState::new(config, until),
        running_total: 0,
        done: false,
    }
}

/// Enumerate mode: lazy (item, chunk descriptor) pairs, strictly newest
/// window first, source order preserved within a window.
pub fn items_by_created_window<'a>(
    source: &'a dyn WorkItemSource,
    query: &'a ItemQuery,
    config: ChunkerConfig,
    until: DateTime<Utc>,
) -> ItemChunks<'a> {
    ItemChunks {
        source,
        query,
        state: WindowState::new(config, until),
        pending: VecDeque::new(),
        done: false,
    }
}

pub struct CountChunks<'a> {
    source: &'a dyn WorkItemSource,
    query: &'a ItemQuery,
    state: WindowState,
    running_total: u64,
    done: bool,
}

impl Iterator for CountChunks<'_> {
    type Item = Result<CountSnapshot, ChunkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let start = self.state.window_start();
            let windowed = self.query.windowed(start, self.state.end_date);
            match self.source.count(&windowed) {
                Ok(count) if count >= self.state.config.max_items_per_query => {
                    let reason = ShrinkReason::Oversized {
                        count,
                        ceiling: self.state.config.max_items_per_query,
                    };
                    if let Err(err) = self.state.shrink(reason) {
                        self.done = true;
                        return Some(Err(err));
                    }
                }
                Ok(0) => {
                    self.done = true;
                    return None;
                }
                Ok(count) => {
                    self.running_total += count as u64;
                    let snapshot = CountSnapshot {
                        running_total: self.running_total,
                        window_count: count as u64,
                        window_size: self.state.window,
                    };
                    self.state.advance();
                    return Some(Ok(snapshot));
                }
                Err(err) => {
                    warn!(error = %err, "windowed count query failed, shrinking window");
                    let reason = ShrinkReason::QueryFailed {
                        message: err.to_string(),
                    };
                    if let Err(floor) = self.state.shrink(reason) {
                        self.done = true;
                        return Some(Err(floor));
                    }
                }
            }
        }
    }
}

pub struct ItemChunks<'a> {
    source: &'a dyn WorkItemSource,
    query: &'a ItemQuery,
    state: WindowState,
    pending: VecDeque<ChunkedWorkItem>,
    done: bool,
}

impl Iterator for ItemChunks<'_> {
    type Item = Result<ChunkedWorkItem, ChunkError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.pending.pop_front() {
                return Some(Ok(entry));
            }
            if self.done {
                return None;
            }

            let start = self.state.window_start();
            let windowed = self.query.windowed(start, self.state.end_date);
            match self.source.fetch(&windowed) {
                Ok(items) => {
                    if items.len() >= self.state.config.max_items_per_query {
                        let reason = ShrinkReason::Oversized {
                            count: items.len(),
                            ceiling: self.state.config.max_items_per_query,
                        };
                        if let Err(err) = self.state.shrink(reason) {
                            self.done = true;
                            return Some(Err(err));
                        }
                        continue;
                    }
                    if items.is_empty() {
                        self.done = true;
                        continue;
                    }

                    let items_in_chunk = items.len();
                    let window_end = self.state.end_date;
                    let window_size = self.state.window;
                    let query_index = self.state.query_index;
                    for (item_index, item) in items.into_iter().enumerate() {
                        self.pending.push_back(ChunkedWorkItem {
                            item,
                            chunk: ChunkDescriptor {
                                window_start: start,
                                window_end,
                                window_size,
                                query_index,
                                item_index,
                                items_in_chunk,
                            },
                        });
                    }
                    self.state.advance();
                }
                Err(err) => {
                    warn!(error = %err, "windowed item query failed, shrinking window");
                    let reason = ShrinkReason::QueryFailed {
                        message: err.to_string(),
                    };
                    if let Err(floor) = self.state.shrink(reason) {
                        self.done = true;
                        return Some(Err(floor));
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::WindowedQuery;
    use anyhow::bail;
    use chrono::TimeZone;
    use std::cell::Cell;

    struct FakeSource {
        items: Vec<WorkItem>,
        /// Windows at or above this size pretend to hit the result ceiling.
        oversize_at: Option<Duration>,
        ceiling: usize,
        fail_next: Cell<usize>,
    }

    impl FakeSource {
        fn with_items(items: Vec<WorkItem>) -> Self {
            Self {
                items,
                oversize_at: None,
                ceiling: 20_000,
                fail_next: Cell::new(0),
            }
        }

        fn in_window(&self, query: &WindowedQuery) -> Vec<WorkItem> {
            self.items
                .iter()
                .filter(|item| query.contains(item.created_date))
                .cloned()
                .collect()
        }

        fn oversized(&self, query: &WindowedQuery) -> bool {
            self.oversize_at
                .is_some_and(|threshold| query.window_size() >= threshold)
        }

        fn maybe_fail(&self) -> anyhow::Result<()> {
            let remaining = self.fail_next.get();
            if remaining > 0 {
                self.fail_next.set(remaining - 1);
                bail!("connection reset");
            }
            Ok(())
        }
    }

    impl WorkItemSource for FakeSource {
        fn count(&self, query: &WindowedQuery) -> anyhow::Result<usize> {
            self.maybe_fail()?;
            if self.oversized(query) {
                return Ok(self.ceiling);
            }
            Ok(self.in_window(query).len())
        }

        fn fetch(&self, query: &WindowedQuery) -> anyhow::Result<Vec<WorkItem>> {
            self.maybe_fail()?;
            if self.oversized(query) {
                let padding = (0..self.ceiling)
                    .map(|i| item(-(i as i64 + 1), query.created_from))
                    .collect();
                return Ok(padding);
            }
            Ok(self.in_window(query))
        }
    }

    fn until() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn item(id: i64, created: DateTime<Utc>) -> WorkItem {
        WorkItem {
            id,
            created_date: created,
            revisions: Vec::new(),
        }
    }

    fn items_days_ago(days: &[i64]) -> Vec<WorkItem> {
        days.iter()
            .enumerate()
            .map(|(i, days)| item(i as i64 + 1, until() - Duration::days(*days)))
            .collect()
    }

    fn config(initial_days: i64) -> ChunkerConfig {
        ChunkerConfig {
            initial_window: Duration::days(initial_days),
            ..ChunkerConfig::default()
        }
    }

    #[test]
    fn test_empty_source_terminates_immediately() {
        let source = FakeSource::with_items(Vec::new());
        let query = ItemQuery::for_project("p");

        let mut counts = count_by_created_window(&source, &query, config(30), until());
        assert!(counts.next().is_none());

        let mut items = items_by_created_window(&source, &query, config(30), until());
        assert!(items.next().is_none());
    }

    #[test]
    fn test_count_total_matches_enumerated_items() {
        let source = FakeSource::with_items(items_days_ago(&[1, 2, 40, 45, 70, 100]));
        let query = ItemQuery::for_project("p");

        let final_total = count_by_created_window(&source, &query, config(30), until())
            .map(|snapshot| snapshot.unwrap().running_total)
            .last()
            .unwrap();

        let enumerated: Vec<_> = items_by_created_window(&source, &query, config(30), until())
            .map(|entry| entry.unwrap())
            .collect();

        assert_eq!(final_total, enumerated.len() as u64);
        assert_eq!(final_total, 6);
    }

    #[test]
    fn test_windows_walk_backward_in_time() {
        let source = FakeSource::with_items(items_days_ago(&[1, 40, 70]));
        let query = ItemQuery::for_project("p");

        let entries: Vec<_> = items_by_created_window(&source, &query, config(30), until())
            .map(|entry| entry.unwrap())
            .collect();

        assert_eq!(entries.len(), 3);
        // One item per window here, so windows and items both run newest
        // to oldest, and windows tile with no overlap.
        for pair in entries.windows(2) {
            assert!(pair[1].chunk.window_end <= pair[0].chunk.window_start);
            assert!(pair[1].chunk.query_index > pair[0].chunk.query_index);
        }
        assert_eq!(entries[0].item.id, 1);
        assert_eq!(entries[2].item.id, 3);
    }

    #[test]
    fn test_descriptor_positions_within_chunk() {
        let source = FakeSource::with_items(items_days_ago(&[1, 2, 3]));
        let query = ItemQuery::for_project("p");

        let entries: Vec<_> = items_by_created_window(&source, &query, config(30), until())
            .map(|entry| entry.unwrap())
            .collect();

        assert_eq!(entries.len(), 3);
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.chunk.item_index, i);
            assert_eq!(entry.chunk.items_in_chunk, 3);
            assert_eq!(entry.chunk.query_index, 0);
        }
    }

    #[test]
    fn test_transient_failures_shrink_and_recover() {
        let source = FakeSource {
            fail_next: Cell::new(2),
            ..FakeSource::with_items(items_days_ago(&[1, 2, 12]))
        };
        let query = ItemQuery::for_project("p");

        let entries: Vec<_> = items_by_created_window(&source, &query, config(30), until())
            .map(|entry| entry.unwrap())
            .collect();

        assert_eq!(entries.len(), 3);
        // Two failures halved 30 days twice before the first accepted window.
        assert!(entries[0].chunk.window_size <= Duration::days(8));
    }

    #[test]
    fn test_failed_count_windows_do_not_inflate_totals() {
        let source = FakeSource {
            fail_next: Cell::new(2),
            ..FakeSource::with_items(items_days_ago(&[1, 2, 12]))
        };
        let query = ItemQuery::for_project("p");

        let final_total = count_by_created_window(&source, &query, config(30), until())
            .map(|snapshot| snapshot.unwrap().running_total)
            .last()
            .unwrap();

        assert_eq!(final_total, 3);
    }

    #[test]
    fn test_oversized_windows_converge_below_threshold() {
        let threshold = Duration::days(8);
        let source = FakeSource {
            oversize_at: Some(threshold),
            ceiling: 10,
            ..FakeSource::with_items(items_days_ago(&[1, 2, 3, 5, 9, 11]))
        };
        let query = ItemQuery::for_project("p");

        let cfg = ChunkerConfig {
            max_items_per_query: 10,
            ..config(30)
        };
        let entries: Vec<_> = items_by_created_window(&source, &query, cfg, until())
            .map(|entry| entry.unwrap())
            .collect();

        // Every emitted page came from a window below the threshold, and
        // every item was still found.
        assert!(entries.iter().all(|e| e.chunk.window_size < threshold));
        let mut ids: Vec<i64> = entries.iter().map(|e| e.item.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_persistent_failure_hits_window_floor() {
        let source = FakeSource {
            fail_next: Cell::new(usize::MAX),
            ..FakeSource::with_items(items_days_ago(&[1]))
        };
        let query = ItemQuery::for_project("p");

        let mut items = items_by_created_window(&source, &query, config(30), until());
        let err = items.next().unwrap().unwrap_err();
        match err {
            ChunkError::WindowFloorReached { reason, .. } => {
                assert!(matches!(reason, ShrinkReason::QueryFailed { .. }));
            }
        }
        assert!(items.next().is_none());
    }

    #[test]
    fn test_perpetually_oversized_predicate_hits_window_floor() {
        let source = FakeSource {
            oversize_at: Some(Duration::hours(1)),
            ceiling: 10,
            ..FakeSource::with_items(items_days_ago(&[1]))
        };
        let query = ItemQuery::for_project("p");

        let cfg = ChunkerConfig {
            max_items_per_query: 10,
            ..config(30)
        };
        let err = count_by_created_window(&source, &query, cfg, until())
            .next()
            .unwrap()
            .unwrap_err();
        match err {
            ChunkError::WindowFloorReached { reason, .. } => {
                assert!(matches!(reason, ShrinkReason::Oversized { ceiling: 10, .. }));
            }
        }
    }
}
