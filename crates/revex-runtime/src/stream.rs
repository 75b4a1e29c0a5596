use crate::download::AttachmentDownloader;
use crate::export::{ExportService, ExportSummary};
use crate::metrics::ExportMetrics;
use anyhow::{Result, anyhow};
use revex_source::{ChunkerConfig, ItemQuery, WorkItemSource};
use revex_store::RevisionRepository;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, sync_channel};
use std::thread::JoinHandle;

/// A running export whose progress is pulled by the consumer.
///
/// The worker sends on a rendezvous channel, so it blocks until the
/// consumer receives each snapshot: delivery is strictly ordered and
/// backpressure is caller-driven. Dropping the receiver lets the worker
/// run to completion unobserved.
pub struct ExportStream {
    rx: Receiver<revex_types::ExportProgress>,
    handle: JoinHandle<Result<ExportSummary>>,
}

impl ExportStream {
    pub fn receiver(&self) -> &Receiver<revex_types::ExportProgress> {
        &self.rx
    }

    /// Block until the run finishes and return its outcome.
    pub fn wait(self) -> Result<ExportSummary> {
        drop(self.rx);
        match self.handle.join() {
            Ok(result) => result,
            Err(_) => Err(anyhow!("export worker panicked")),
        }
    }
}

/// Run an export on a worker thread, exposing progress as a pull stream.
pub fn stream_export(
    repository: RevisionRepository,
    source: Arc<dyn WorkItemSource + Send + Sync>,
    downloader: Arc<dyn AttachmentDownloader + Send + Sync>,
    metrics: Arc<dyn ExportMetrics + Send + Sync>,
    chunker: ChunkerConfig,
    query: ItemQuery,
) -> Result<ExportStream> {
    let (tx, rx) = sync_channel(0);

    let handle = std::thread::Builder::new()
        .name("export-worker".to_string())
        .spawn(move || {
            let service = ExportService::new(
                &repository,
                source.as_ref(),
                downloader.as_ref(),
                metrics.as_ref(),
                chunker,
            );
            service.run(&query, |progress| {
                let _ = tx.send(progress.clone());
            })
        })?;

    Ok(ExportStream { rx, handle })
}
