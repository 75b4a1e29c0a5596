use crate::download::AttachmentDownloader;
use crate::metrics::ExportMetrics;
use anyhow::Result;
use chrono::{DateTime, Utc};
use revex_engine::{diff_revision, new_attachments};
use revex_source::{
    ChunkerConfig, ItemQuery, WorkItemSource, count_by_created_window, items_by_created_window,
};
use revex_store::RevisionRepository;
use revex_types::{ExportProgress, Revision, RevisionDelta, WorkItem};
use std::time::Instant;
use tracing::{error, info, warn};

/// Final state of a completed run.
#[derive(Debug)]
pub struct ExportSummary {
    pub duration: std::time::Duration,
    pub progress: ExportProgress,
}

/// The resumable state machine driving one export run end to end. Single
/// threaded: storage and source are touched strictly sequentially, and the
/// progress callback is the only suspension point.
///
/// Exactly one service may drive a given storage root at a time; running
/// two concurrently against the same root is undefined behavior.
pub struct ExportService<'a> {
    repository: &'a RevisionRepository,
    source: &'a dyn WorkItemSource,
    downloader: &'a dyn AttachmentDownloader,
    metrics: &'a dyn ExportMetrics,
    chunker: ChunkerConfig,
}

impl<'a> ExportService<'a> {
    pub fn new(
        repository: &'a RevisionRepository,
        source: &'a dyn WorkItemSource,
        downloader: &'a dyn AttachmentDownloader,
        metrics: &'a dyn ExportMetrics,
        chunker: ChunkerConfig,
    ) -> Self {
        Self {
            repository,
            source,
            downloader,
            metrics,
            chunker,
        }
    }

    pub fn run<F>(&self, query: &ItemQuery, on_progress: F) -> Result<ExportSummary>
    where
        F: FnMut(&ExportProgress),
    {
        self.run_until(query, Utc::now(), on_progress)
    }

    /// Same as `run` with an explicit upper time bound for the backward
    /// window walk.
    pub fn run_until<F>(
        &self,
        query: &ItemQuery,
        until: DateTime<Utc>,
        mut on_progress: F,
    ) -> Result<ExportSummary>
    where
        F: FnMut(&ExportProgress),
    {
        let run_started = Instant::now();
        let mut progress = ExportProgress::default();
        on_progress(&progress);

        self.resolve_total(query, until, &mut progress, &mut on_progress)?;

        for entry in items_by_created_window(self.source, query, self.chunker.clone(), until) {
            let entry = entry?;
            let item_started = Instant::now();

            progress.current_item_id = entry.item.id;
            progress.chunk = Some(entry.chunk);
            progress.items_processed += 1;
            self.metrics.item_exported();

            // Fast-skip: the whole history is already exported. An absent
            // watermark counts as -1, so an item is only skipped when its
            // last revision index is the recorded watermark.
            let revision_count = entry.item.revisions.len() as i64;
            let watermark = self.repository.watermark(entry.item.id)?.unwrap_or(-1);
            if watermark + 1 == revision_count {
                progress.revisions_processed += entry.item.revisions.len() as u64;
                self.metrics.item_duration(item_started.elapsed());
                on_progress(&progress);
                continue;
            }

            let mut previous: Option<&Revision> = None;
            for revision in &entry.item.revisions {
                if self
                    .repository
                    .is_revision_processed(entry.item.id, revision.index)?
                {
                    // A skipped revision never becomes the diff baseline:
                    // the first revision exported after a resume is a full
                    // snapshot, so deltas stay self-contained per run.
                    progress.revisions_processed += 1;
                    continue;
                }

                self.export_revision(&entry.item, revision, previous, &mut progress)?;
                previous = Some(revision);
            }

            self.metrics.item_duration(item_started.elapsed());
            on_progress(&progress);
        }

        let duration = run_started.elapsed();
        self.metrics.run_duration(duration);
        info!(
            items = progress.items_processed,
            revisions = progress.revisions_processed,
            ms = duration.as_millis() as u64,
            "export run complete"
        );

        Ok(ExportSummary { duration, progress })
    }

    /// Resolve the total item count: cache hit by literal query text, or a
    /// full count-mode walk whose result is written back to the cache.
    fn resolve_total<F>(
        &self,
        query: &ItemQuery,
        until: DateTime<Utc>,
        progress: &mut ExportProgress,
        on_progress: &mut F,
    ) -> Result<()>
    where
        F: FnMut(&ExportProgress),
    {
        let query_text = query.text();
        if let Some(cached) = self.repository.query_count(&query_text)? {
            progress.total_items = cached.max(0) as u64;
            on_progress(progress);
            return Ok(());
        }

        let mut total = 0u64;
        for snapshot in count_by_created_window(self.source, query, self.chunker.clone(), until) {
            let snapshot = snapshot?;
            total = snapshot.running_total;
            progress.total_items = total;
            on_progress(progress);
        }
        self.repository.update_query_count(&query_text, total as i64)?;
        on_progress(progress);

        Ok(())
    }

    fn export_revision(
        &self,
        item: &WorkItem,
        revision: &Revision,
        previous: Option<&Revision>,
        progress: &mut ExportProgress,
    ) -> Result<()> {
        let revision_started = Instant::now();
        progress.current_revision_index = revision.index;
        self.metrics.revision_exported(item.id);

        let result = self.export_revision_inner(item, revision, previous, progress);
        self.metrics
            .revision_duration(item.id, revision_started.elapsed());
        if result.is_err() {
            self.metrics.revision_error(item.id);
        }
        result
    }

    fn export_revision_inner(
        &self,
        item: &WorkItem,
        revision: &Revision,
        previous: Option<&Revision>,
        progress: &mut ExportProgress,
    ) -> Result<()> {
        let mut delta = match diff_revision(item.id, revision, previous) {
            Ok(delta) => delta,
            Err(err) => {
                error!(
                    item_id = item.id,
                    revision = revision.index,
                    error = %err,
                    "failed to map revision"
                );
                return Err(err.into());
            }
        };

        progress.fields_processed += delta.fields.len() as u64;
        progress.revisions_processed += 1;

        self.process_attachments(&mut delta, revision, previous, progress);

        if let Err(err) = self.repository.add_revision(&delta) {
            error!(
                item_id = item.id,
                revision = revision.index,
                error = %err,
                "failed to persist revision delta"
            );
            return Err(err);
        }

        Ok(())
    }

    /// Download attachments that are new relative to the previous processed
    /// revision. Failures are counted, never raised: the delta still
    /// persists, possibly with fewer attachments than exist upstream.
    fn process_attachments(
        &self,
        delta: &mut RevisionDelta,
        current: &Revision,
        previous: Option<&Revision>,
        progress: &mut ExportProgress,
    ) {
        for attachment in new_attachments(current, previous) {
            match self.downloader.download(attachment.id) {
                Ok(downloaded) => {
                    match self.repository.add_attachment(
                        delta,
                        &attachment.name,
                        &attachment.comment,
                        &downloaded,
                    ) {
                        Ok(()) => progress.attachments_processed += 1,
                        Err(err) => {
                            warn!(
                                item_id = delta.item_id,
                                revision = delta.index,
                                attachment = %attachment.name,
                                error = %err,
                                "failed to store downloaded attachment"
                            );
                            progress.attachments_failed += 1;
                        }
                    }
                }
                Err(err) => {
                    warn!(
                        item_id = delta.item_id,
                        revision = delta.index,
                        attachment = %attachment.name,
                        attachment_id = attachment.id,
                        error = %err,
                        "attachment download failed"
                    );
                    progress.attachments_failed += 1;
                }
            }
        }
    }
}
