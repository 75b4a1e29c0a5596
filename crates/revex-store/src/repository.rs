use crate::ledger::Ledger;
use anyhow::{Context, Result};
use revex_types::{AttachmentRef, RevisionDelta};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const LEDGER_FILE: &str = "watermarks.sqlite";
const REVISION_FILE: &str = "revision.json";

/// Filesystem sink for revision deltas.
///
/// Layout: `<root>/items/<item id>/<revision index>/revision.json` plus any
/// attachment files copied next to it; the watermark ledger lives at
/// `<root>/items/watermarks.sqlite`.
///
/// `add_revision` writes the document first and advances the watermark
/// second. A crash between the two leaves a delta on disk whose watermark
/// was never advanced; the next run rewrites it (at-least-once per delta,
/// exactly-once for the watermark's effect).
///
/// Exactly one repository may own a storage root at a time; concurrent
/// writers against the same root are undefined behavior.
pub struct RevisionRepository {
    items_root: PathBuf,
    ledger: Ledger,
}

impl RevisionRepository {
    pub fn open(root: &Path) -> Result<Self> {
        let items_root = root.join("items");
        fs::create_dir_all(&items_root).with_context(|| {
            format!("Failed to create repository root: {}", items_root.display())
        })?;

        let ledger = Ledger::open(&items_root.join(LEDGER_FILE))?;

        Ok(Self { items_root, ledger })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn revision_dir(&self, item_id: i64, revision_index: u32) -> PathBuf {
        self.items_root
            .join(item_id.to_string())
            .join(revision_index.to_string())
    }

    /// Persist the delta document and advance the watermark, in that order.
    pub fn add_revision(&self, delta: &RevisionDelta) -> Result<()> {
        let dir = self.revision_dir(delta.item_id, delta.index);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create revision dir: {}", dir.display()))?;

        let path = dir.join(REVISION_FILE);
        let json = serde_json::to_string_pretty(delta)?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write revision delta: {}", path.display()))?;

        self.ledger.update_watermark(delta.item_id, delta.index)?;
        Ok(())
    }

    /// Copy a downloaded attachment into the revision directory and record
    /// it on the delta. Called before `add_revision` persists the document.
    pub fn add_attachment(
        &self,
        delta: &mut RevisionDelta,
        name: &str,
        comment: &str,
        downloaded: &Path,
    ) -> Result<()> {
        let dir = self.revision_dir(delta.item_id, delta.index);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create revision dir: {}", dir.display()))?;

        let target = dir.join(name);
        fs::copy(downloaded, &target).with_context(|| {
            format!(
                "Failed to copy attachment {} to {}",
                downloaded.display(),
                target.display()
            )
        })?;

        delta.attachments.push(AttachmentRef::new(name, comment));
        Ok(())
    }

    pub fn load_revision(&self, item_id: i64, revision_index: u32) -> Result<RevisionDelta> {
        let path = self.revision_dir(item_id, revision_index).join(REVISION_FILE);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read revision delta: {}", path.display()))?;
        let delta = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse revision delta: {}", path.display()))?;
        Ok(delta)
    }

    pub fn exported_items(&self) -> Result<Vec<i64>> {
        let mut ids = Vec::new();
        for entry in fs::read_dir(&self.items_root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(id) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<i64>().ok())
            {
                ids.push(id);
            }
        }
        ids.sort_unstable();
        Ok(ids)
    }

    pub fn exported_revisions(&self, item_id: i64) -> Result<Vec<u32>> {
        let item_dir = self.items_root.join(item_id.to_string());
        if !item_dir.exists() {
            return Ok(Vec::new());
        }
        let mut indexes = Vec::new();
        for entry in fs::read_dir(&item_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(index) = entry
                .file_name()
                .to_str()
                .and_then(|name| name.parse::<u32>().ok())
            {
                indexes.push(index);
            }
        }
        indexes.sort_unstable();
        Ok(indexes)
    }

    /// Number of revision documents on disk across all items.
    pub fn exported_revision_count(&self) -> u64 {
        WalkDir::new(&self.items_root)
            .min_depth(3)
            .max_depth(3)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name() == REVISION_FILE)
            .count() as u64
    }

    // Ledger passthroughs; the orchestrator sees one storage facade.

    pub fn watermark(&self, item_id: i64) -> Result<Option<i64>> {
        self.ledger.watermark(item_id)
    }

    pub fn is_revision_processed(&self, item_id: i64, revision_index: u32) -> Result<bool> {
        self.ledger.is_revision_processed(item_id, revision_index)
    }

    pub fn query_count(&self, query: &str) -> Result<Option<i64>> {
        self.ledger.query_count(query)
    }

    pub fn update_query_count(&self, query: &str, count: i64) -> Result<()> {
        self.ledger.update_query_count(query, count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use revex_types::FieldChange;
    use serde_json::json;

    fn delta(item_id: i64, index: u32) -> RevisionDelta {
        RevisionDelta {
            item_id,
            index,
            changed_date: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            fields: vec![FieldChange {
                name: "Title".to_string(),
                reference_name: "System.Title".to_string(),
                value: json!("a title"),
            }],
            links: Vec::new(),
            attachments: Vec::new(),
        }
    }

    #[test]
    fn test_add_revision_persists_document_and_watermark() {
        let dir = tempfile::TempDir::new().unwrap();
        let repo = RevisionRepository::open(dir.path()).unwrap();

        repo.add_revision(&delta(7, 0)).unwrap();

        let loaded = repo.load_revision(7, 0).unwrap();
        assert_eq!(loaded, delta(7, 0));
        assert_eq!(repo.watermark(7).unwrap(), Some(0));
    }

    #[test]
    fn test_layout_is_one_directory_per_item_revision() {
        let dir = tempfile::TempDir::new().unwrap();
        let repo = RevisionRepository::open(dir.path()).unwrap();

        repo.add_revision(&delta(7, 0)).unwrap();
        repo.add_revision(&delta(7, 1)).unwrap();
        repo.add_revision(&delta(9, 0)).unwrap();

        assert!(dir.path().join("items/7/0/revision.json").exists());
        assert!(dir.path().join("items/7/1/revision.json").exists());
        assert!(dir.path().join("items/9/0/revision.json").exists());

        assert_eq!(repo.exported_items().unwrap(), vec![7, 9]);
        assert_eq!(repo.exported_revisions(7).unwrap(), vec![0, 1]);
        assert_eq!(repo.exported_revision_count(), 3);
    }

    #[test]
    fn test_add_attachment_copies_file_and_records_ref() {
        let dir = tempfile::TempDir::new().unwrap();
        let repo = RevisionRepository::open(dir.path()).unwrap();

        let staged = dir.path().join("staged.bin");
        fs::write(&staged, b"payload").unwrap();

        let mut d = delta(7, 0);
        repo.add_attachment(&mut d, "design.pdf", "latest", &staged)
            .unwrap();
        repo.add_revision(&d).unwrap();

        let copied = dir.path().join("items/7/0/design.pdf");
        assert_eq!(fs::read(copied).unwrap(), b"payload");

        let loaded = repo.load_revision(7, 0).unwrap();
        assert_eq!(loaded.attachments.len(), 1);
        assert_eq!(loaded.attachments[0].name, "design.pdf");
        assert_eq!(loaded.attachments[0].comment, "latest");
    }

    #[test]
    fn test_repository_reopen_keeps_state() {
        let dir = tempfile::TempDir::new().unwrap();
        {
            let repo = RevisionRepository::open(dir.path()).unwrap();
            repo.add_revision(&delta(3, 2)).unwrap();
        }

        let repo = RevisionRepository::open(dir.path()).unwrap();
        assert_eq!(repo.watermark(3).unwrap(), Some(2));
        assert!(repo.is_revision_processed(3, 2).unwrap());
        assert_eq!(repo.load_revision(3, 2).unwrap().index, 2);
    }
}
