pub mod chunker;
pub mod query;
pub mod snapshot;
mod source;

pub use chunker::{
    ChunkError, ChunkedWorkItem, ChunkerConfig, CountChunks, ItemChunks, ShrinkReason,
    count_by_created_window, items_by_created_window,
};
pub use query::{ItemQuery, WindowedQuery};
pub use snapshot::SnapshotSource;
pub use source::WorkItemSource;
