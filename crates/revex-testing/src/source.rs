//! Scripted in-memory work item source.

use anyhow::{Result, bail};
use revex_source::{WindowedQuery, WorkItemSource};
use revex_types::WorkItem;
use std::sync::Mutex;

/// A `WorkItemSource` over a fixed item set, with optional failure
/// injection and a query log. Send + Sync so streamed exports can use it.
pub struct ScriptedSource {
    items: Vec<WorkItem>,
    fail_next: Mutex<usize>,
    queries: Mutex<Vec<WindowedQuery>>,
}

impl ScriptedSource {
    pub fn new(items: Vec<WorkItem>) -> Self {
        Self {
            items,
            fail_next: Mutex::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Fail the next `count` queries (count or fetch) before recovering.
    pub fn failing_next(self, count: usize) -> Self {
        *self.fail_next.lock().unwrap() = count;
        self
    }

    /// Every window the source has been asked about, in order.
    pub fn recorded_queries(&self) -> Vec<WindowedQuery> {
        self.queries.lock().unwrap().clone()
    }

    fn record(&self, query: &WindowedQuery) -> Result<()> {
        self.queries.lock().unwrap().push(query.clone());
        let mut remaining = self.fail_next.lock().unwrap();
        if *remaining > 0 {
            *remaining -= 1;
            bail!("scripted query failure");
        }
        Ok(())
    }

    fn in_window(&self, query: &WindowedQuery) -> Vec<WorkItem> {
        self.items
            .iter()
            .filter(|item| query.contains(item.created_date))
            .cloned()
            .collect()
    }
}

impl WorkItemSource for ScriptedSource {
    fn count(&self, query: &WindowedQuery) -> Result<usize> {
        self.record(query)?;
        Ok(self.in_window(query).len())
    }

    fn fetch(&self, query: &WindowedQuery) -> Result<Vec<WorkItem>> {
        self.record(query)?;
        Ok(self.in_window(query))
    }
}
