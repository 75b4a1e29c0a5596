use crate::output::{ProgressRenderer, print_summary};
use anyhow::Result;
use revex_runtime::{ChunkerSettings, DirectoryDownloader, TracingMetrics, stream_export};
use revex_source::{ItemQuery, SnapshotSource};
use revex_store::RevisionRepository;
use revex_types::ExportProgress;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Serialize)]
struct ProgressRow {
    total_items: u64,
    items_processed: u64,
    revisions_processed: u64,
    fields_processed: u64,
    attachments_processed: u64,
    attachments_failed: u64,
    item_id: i64,
    revision_index: u32,
    window_start: Option<String>,
    window_end: Option<String>,
    window_hours: Option<i64>,
    query_index: Option<u32>,
}

impl ProgressRow {
    fn from_progress(progress: &ExportProgress) -> Self {
        Self {
            total_items: progress.total_items,
            items_processed: progress.items_processed,
            revisions_processed: progress.revisions_processed,
            fields_processed: progress.fields_processed,
            attachments_processed: progress.attachments_processed,
            attachments_failed: progress.attachments_failed,
            item_id: progress.current_item_id,
            revision_index: progress.current_revision_index,
            window_start: progress.chunk.as_ref().map(|c| c.window_start.to_rfc3339()),
            window_end: progress.chunk.as_ref().map(|c| c.window_end.to_rfc3339()),
            window_hours: progress.chunk.as_ref().map(|c| c.window_size.num_hours()),
            query_index: progress.chunk.as_ref().map(|c| c.query_index),
        }
    }
}

#[allow(clippy::too_many_arguments)]
pub fn handle(
    storage: &Path,
    settings: &ChunkerSettings,
    project: String,
    snapshot: PathBuf,
    base_query: Option<String>,
    attachments: Option<PathBuf>,
    progress_csv: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    let repository = RevisionRepository::open(storage)?;
    let source = Arc::new(SnapshotSource::from_jsonl(&snapshot)?);

    let attachments_dir = attachments.unwrap_or_else(|| {
        snapshot
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("attachments")
    });
    let downloader = Arc::new(DirectoryDownloader::new(&attachments_dir));

    let query = match base_query {
        Some(text) => ItemQuery::with_base(project, text),
        None => ItemQuery::for_project(project),
    };

    let stream = stream_export(
        repository,
        source,
        downloader,
        Arc::new(TracingMetrics),
        settings.to_chunker_config(),
        query,
    )?;

    let mut csv_writer = match &progress_csv {
        Some(path) => Some(csv::Writer::from_path(path)?),
        None => None,
    };
    let renderer = ProgressRenderer::new(quiet);

    for progress in stream.receiver().iter() {
        renderer.render(&progress);
        if let Some(writer) = csv_writer.as_mut() {
            writer.serialize(ProgressRow::from_progress(&progress))?;
        }
    }

    if let Some(writer) = csv_writer.as_mut() {
        writer.flush()?;
    }

    let summary = stream.wait()?;
    print_summary(&summary);

    Ok(())
}
