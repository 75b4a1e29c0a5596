use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use std::path::Path;

// NOTE: Ledger Design
//
// One SQLite file per storage root, two tables. Watermarks record the
// highest fully persisted revision index per item and only ever move
// forward; the monotonicity guard lives in the UPDATE's WHERE clause, so a
// redundant or stale call is a no-op rather than a correctness hazard.
// Query counts are keyed by the literal query text - no normalization, no
// expiry, last write wins. Cross-call locking is deliberately absent: the
// orchestrator is single-threaded and each call is one atomic statement.

#[derive(Debug, Clone)]
pub struct WatermarkRecord {
    pub item_id: i64,
    pub revision_index: i64,
    pub updated_at: Option<String>,
}

pub struct Ledger {
    conn: Connection,
}

impl Ledger {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open ledger: {}", db_path.display()))?;

        let ledger = Self { conn };
        ledger.init_schema()?;
        Ok(ledger)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let ledger = Self { conn };
        ledger.init_schema()?;
        Ok(ledger)
    }

    /// Idempotent; runs on every open.
    pub fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS watermarks (
                item_id INTEGER PRIMARY KEY,
                revision_index INTEGER NOT NULL,
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP
            );

            CREATE TABLE IF NOT EXISTS query_counts (
                query TEXT PRIMARY KEY,
                item_count INTEGER NOT NULL,
                updated_at TEXT DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )?;

        Ok(())
    }

    /// Record `revision_index` as persisted for `item_id`, unless an equal
    /// or higher index is already recorded.
    pub fn update_watermark(&self, item_id: i64, revision_index: u32) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO watermarks (item_id, revision_index)
            VALUES (?1, ?2)
            ON CONFLICT(item_id) DO UPDATE SET
                revision_index = excluded.revision_index,
                updated_at = CURRENT_TIMESTAMP
            WHERE excluded.revision_index > watermarks.revision_index
            "#,
            params![item_id, i64::from(revision_index)],
        )?;

        Ok(())
    }

    pub fn watermark(&self, item_id: i64) -> Result<Option<i64>> {
        let result = self
            .conn
            .query_row(
                "SELECT revision_index FROM watermarks WHERE item_id = ?1",
                [item_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(result)
    }

    /// Absent watermark means no revision has ever been recorded, so every
    /// index answers false.
    pub fn is_revision_processed(&self, item_id: i64, revision_index: u32) -> Result<bool> {
        Ok(self
            .watermark(item_id)?
            .is_some_and(|stored| stored >= i64::from(revision_index)))
    }

    pub fn update_query_count(&self, query: &str, count: i64) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO query_counts (query, item_count)
            VALUES (?1, ?2)
            ON CONFLICT(query) DO UPDATE SET
                item_count = ?2,
                updated_at = CURRENT_TIMESTAMP
            "#,
            params![query, count],
        )?;

        Ok(())
    }

    pub fn query_count(&self, query: &str) -> Result<Option<i64>> {
        let result = self
            .conn
            .query_row(
                "SELECT item_count FROM query_counts WHERE query = ?1",
                [query],
                |row| row.get(0),
            )
            .optional()?;

        Ok(result)
    }

    pub fn watermarks(&self) -> Result<Vec<WatermarkRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT item_id, revision_index, updated_at
            FROM watermarks
            ORDER BY item_id
            "#,
        )?;

        let records = stmt
            .query_map([], |row| {
                Ok(WatermarkRecord {
                    item_id: row.get(0)?,
                    revision_index: row.get(1)?,
                    updated_at: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_initialization_is_idempotent() {
        let ledger = Ledger::open_in_memory().unwrap();
        ledger.init_schema().unwrap();

        assert_eq!(ledger.watermarks().unwrap().len(), 0);
    }

    #[test]
    fn test_watermark_absent_for_unknown_item() {
        let ledger = Ledger::open_in_memory().unwrap();

        assert_eq!(ledger.watermark(42).unwrap(), None);
        assert!(!ledger.is_revision_processed(42, 0).unwrap());
    }

    #[test]
    fn test_watermark_is_monotonic() {
        let ledger = Ledger::open_in_memory().unwrap();

        ledger.update_watermark(7, 5).unwrap();
        assert_eq!(ledger.watermark(7).unwrap(), Some(5));

        // Lower index is a no-op.
        ledger.update_watermark(7, 3).unwrap();
        assert_eq!(ledger.watermark(7).unwrap(), Some(5));

        ledger.update_watermark(7, 9).unwrap();
        assert_eq!(ledger.watermark(7).unwrap(), Some(9));
    }

    #[test]
    fn test_redundant_update_is_safe() {
        let ledger = Ledger::open_in_memory().unwrap();

        ledger.update_watermark(7, 4).unwrap();
        ledger.update_watermark(7, 4).unwrap();

        assert_eq!(ledger.watermark(7).unwrap(), Some(4));
    }

    #[test]
    fn test_is_revision_processed_compares_against_watermark() {
        let ledger = Ledger::open_in_memory().unwrap();
        ledger.update_watermark(7, 4).unwrap();

        assert!(ledger.is_revision_processed(7, 0).unwrap());
        assert!(ledger.is_revision_processed(7, 4).unwrap());
        assert!(!ledger.is_revision_processed(7, 5).unwrap());
    }

    #[test]
    fn test_query_count_is_keyed_by_literal_text() {
        let ledger = Ledger::open_in_memory().unwrap();

        ledger.update_query_count("SELECT * FROM WorkItems", 120).unwrap();

        assert_eq!(
            ledger.query_count("SELECT * FROM WorkItems").unwrap(),
            Some(120)
        );
        // Any textual variation misses.
        assert_eq!(
            ledger.query_count("select * from WorkItems").unwrap(),
            None
        );
    }

    #[test]
    fn test_query_count_last_write_wins() {
        let ledger = Ledger::open_in_memory().unwrap();

        ledger.update_query_count("q", 10).unwrap();
        ledger.update_query_count("q", 3).unwrap();

        assert_eq!(ledger.query_count("q").unwrap(), Some(3));
    }

    #[test]
    fn test_watermarks_listing_is_ordered_by_item() {
        let ledger = Ledger::open_in_memory().unwrap();

        ledger.update_watermark(9, 1).unwrap();
        ledger.update_watermark(2, 0).unwrap();

        let records = ledger.watermarks().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].item_id, 2);
        assert_eq!(records[1].item_id, 9);
    }

    #[test]
    fn test_ledger_survives_reopen() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ledger.sqlite");

        {
            let ledger = Ledger::open(&path).unwrap();
            ledger.update_watermark(1, 2).unwrap();
        }

        let reopened = Ledger::open(&path).unwrap();
        assert_eq!(reopened.watermark(1).unwrap(), Some(2));
    }
}
