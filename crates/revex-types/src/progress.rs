use crate::chunk::ChunkDescriptor;

/// The mutable aggregate the orchestrator streams out. Counters only ever
/// advance within a run; `total_items` is zero until the count phase (or
/// the count cache) resolves it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExportProgress {
    pub total_items: u64,
    pub items_processed: u64,
    pub revisions_processed: u64,
    pub fields_processed: u64,
    pub attachments_processed: u64,
    pub attachments_failed: u64,
    pub current_item_id: i64,
    pub current_revision_index: u32,
    pub chunk: Option<ChunkDescriptor>,
}
