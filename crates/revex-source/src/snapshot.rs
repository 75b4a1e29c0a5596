use crate::query::WindowedQuery;
use crate::source::WorkItemSource;
use anyhow::{Context, Result};
use revex_types::WorkItem;
use std::fs;
use std::path::Path;

/// A `WorkItemSource` over a JSONL capture of work items, one item per
/// line. Serves offline replay and drives the export pipeline in tests and
/// the CLI without a live remote system.
#[derive(Debug)]
pub struct SnapshotSource {
    items: Vec<WorkItem>,
}

impl SnapshotSource {
    pub fn new(items: Vec<WorkItem>) -> Self {
        Self { items }
    }

    pub fn from_jsonl(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;

        let mut items = Vec::new();
        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let item: WorkItem = serde_json::from_str(line).with_context(|| {
                format!(
                    "Failed to parse work item on line {} of {}",
                    number + 1,
                    path.display()
                )
            })?;
            items.push(item);
        }

        Ok(Self::new(items))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl WorkItemSource for SnapshotSource {
    fn count(&self, query: &WindowedQuery) -> Result<usize> {
        Ok(self
            .items
            .iter()
            .filter(|item| query.contains(item.created_date))
            .count())
    }

    fn fetch(&self, query: &WindowedQuery) -> Result<Vec<WorkItem>> {
        Ok(self
            .items
            .iter()
            .filter(|item| query.contains(item.created_date))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ItemQuery;
    use chrono::{Duration, TimeZone, Utc};
    use std::io::Write;

    #[test]
    fn test_snapshot_parses_and_filters_by_window() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"id":1,"created_date":"2024-05-30T10:00:00Z","revisions":[]}}"#
        )
        .unwrap();
        writeln!(file).unwrap();
        writeln!(
            file,
            r#"{{"id":2,"created_date":"2024-01-15T10:00:00Z","revisions":[]}}"#
        )
        .unwrap();

        let source = SnapshotSource::from_jsonl(file.path()).unwrap();
        assert_eq!(source.len(), 2);

        let until = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let window = ItemQuery::for_project("p").windowed(until - Duration::days(30), until);
        assert_eq!(source.count(&window).unwrap(), 1);
        assert_eq!(source.fetch(&window).unwrap()[0].id, 1);
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"id":1,"created_date":"2024-05-30T10:00:00Z","revisions":[]}}"#
        )
        .unwrap();
        writeln!(file, "not json").unwrap();

        let err = SnapshotSource::from_jsonl(file.path()).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
