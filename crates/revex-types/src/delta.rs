use crate::item::Link;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The persisted unit of export: everything that changed in one revision
/// relative to its predecessor, plus enough identity to rebuild ordering.
///
/// Written at most once per successful run. Persisting a delta is what
/// advances the item's watermark, so a delta that never reached disk is
/// redone on the next run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionDelta {
    pub item_id: i64,
    pub index: u32,
    pub changed_date: DateTime<Utc>,
    pub fields: Vec<FieldChange>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
}

/// One field retained in a delta because its value differs from the prior
/// retained revision (or because there is no predecessor).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange {
    pub name: String,
    pub reference_name: String,
    pub value: Value,
}

/// Reference to an attachment file copied into the revision directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub name: String,
    #[serde(default)]
    pub comment: String,
}

impl AttachmentRef {
    pub fn new(name: impl Into<String>, comment: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: comment.into(),
        }
    }
}
