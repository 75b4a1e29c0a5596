pub mod config;
pub mod download;
pub mod export;
pub mod metrics;
pub mod stream;

pub use config::{ChunkerSettings, Config};
pub use download::{AttachmentDownloader, DirectoryDownloader};
pub use export::{ExportService, ExportSummary};
pub use metrics::{ExportMetrics, NoopMetrics, TracingMetrics};
pub use stream::{ExportStream, stream_export};
