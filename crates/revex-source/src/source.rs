use crate::query::WindowedQuery;
use anyhow::Result;
use revex_types::WorkItem;

/// The remote query boundary. One abstraction, two shapes: a count of
/// matching items, or the items themselves with full revision history.
/// Either call can fail; the chunker owns the retry policy.
///
/// Implementations must apply the query's creation-date window and preserve
/// their natural result order within it.
pub trait WorkItemSource {
    fn count(&self, query: &WindowedQuery) -> Result<usize>;
    fn fetch(&self, query: &WindowedQuery) -> Result<Vec<WorkItem>>;
}
