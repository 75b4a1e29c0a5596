use anyhow::{Result, bail};
use std::path::{Path, PathBuf};

/// Fetches one attachment payload from wherever the remote system keeps
/// binaries and makes it available as a local file. Download failures are
/// the one error class the orchestrator degrades instead of aborting on.
pub trait AttachmentDownloader {
    fn download(&self, attachment_id: i64) -> Result<PathBuf>;
}

/// Resolves attachment ids against a local staging directory: the file for
/// id `n` is `<root>/<n>`. Stands in for a remote binary store in offline
/// replays and tests.
pub struct DirectoryDownloader {
    root: PathBuf,
}

impl DirectoryDownloader {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }
}

impl AttachmentDownloader for DirectoryDownloader {
    fn download(&self, attachment_id: i64) -> Result<PathBuf> {
        let path = self.root.join(attachment_id.to_string());
        if !path.is_file() {
            bail!("attachment {} not staged at {}", attachment_id, path.display());
        }
        Ok(path)
    }
}
