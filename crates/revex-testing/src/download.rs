//! Stub attachment downloader.

use anyhow::{Result, bail};
use revex_runtime::AttachmentDownloader;
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tempfile::TempDir;

/// Materializes attachment payloads into a temp directory on demand, with
/// per-id or blanket failure injection.
pub struct StubDownloader {
    staging: TempDir,
    fail_all: bool,
    fail_ids: Mutex<HashSet<i64>>,
    calls: AtomicU64,
}

impl StubDownloader {
    pub fn new() -> Self {
        Self {
            staging: TempDir::new().expect("temp staging dir"),
            fail_all: false,
            fail_ids: Mutex::new(HashSet::new()),
            calls: AtomicU64::new(0),
        }
    }

    /// A downloader for which every download fails.
    pub fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::new()
        }
    }

    pub fn fail_id(&self, attachment_id: i64) {
        self.fail_ids.lock().unwrap().insert(attachment_id);
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for StubDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl AttachmentDownloader for StubDownloader {
    fn download(&self, attachment_id: i64) -> Result<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_all || self.fail_ids.lock().unwrap().contains(&attachment_id) {
            bail!("stubbed download failure for attachment {}", attachment_id);
        }

        let path = self.staging.path().join(attachment_id.to_string());
        fs::write(&path, format!("attachment {}", attachment_id))?;
        Ok(path)
    }
}
