use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// A work item as materialized from the remote tracking system.
///
/// Read-only on this side of the boundary: the remote system owns identity
/// and history. Revisions are ordered by index with no gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    pub id: i64,
    pub created_date: DateTime<Utc>,
    pub revisions: Vec<Revision>,
}

impl WorkItem {
    pub fn revision_count(&self) -> usize {
        self.revisions.len()
    }
}

/// One full-snapshot revision of a work item.
///
/// Fields are keyed by reference name (e.g. `System.Title`); the map keeps
/// snapshot comparison order-independent and deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub index: u32,
    pub changed_date: DateTime<Utc>,
    pub fields: BTreeMap<String, Field>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

/// A single field within a revision snapshot: display name plus value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: Value,
}

/// An attachment as reported by the remote system. The id is the handle
/// the attachment downloader resolves; name and comment are carried into
/// the persisted delta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub comment: String,
}

/// A link attached to a revision.
///
/// Closed set of the kinds the exporter understands, plus `Unsupported` for
/// anything the remote system reports that is not modeled here. The differ
/// treats `Unsupported` as fatal so schema drift surfaces immediately
/// instead of producing silently incomplete history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Link {
    External {
        link_type: String,
        #[serde(default)]
        comment: String,
        artifact_uri: String,
    },
    Related {
        link_type: String,
        #[serde(default)]
        comment: String,
        relation_end: String,
        target_id: i64,
    },
    Hyperlink {
        link_type: String,
        #[serde(default)]
        comment: String,
        location: String,
    },
    Unsupported {
        type_name: String,
    },
}

/// The part of a link that identifies what it points at, per variant.
/// Two links are the same link iff their kind, link type, comment, and
/// comparable target all agree; position in the link list never matters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget<'a> {
    Artifact(&'a str),
    Item { id: i64, relation_end: &'a str },
    Location(&'a str),
}

impl Link {
    pub fn link_type(&self) -> Option<&str> {
        match self {
            Link::External { link_type, .. }
            | Link::Related { link_type, .. }
            | Link::Hyperlink { link_type, .. } => Some(link_type),
            Link::Unsupported { .. } => None,
        }
    }

    pub fn comment(&self) -> Option<&str> {
        match self {
            Link::External { comment, .. }
            | Link::Related { comment, .. }
            | Link::Hyperlink { comment, .. } => Some(comment),
            Link::Unsupported { .. } => None,
        }
    }

    /// `None` only for `Unsupported`, which has no comparable identity.
    pub fn comparable_target(&self) -> Option<LinkTarget<'_>> {
        match self {
            Link::External { artifact_uri, .. } => Some(LinkTarget::Artifact(artifact_uri)),
            Link::Related {
                target_id,
                relation_end,
                ..
            } => Some(LinkTarget::Item {
                id: *target_id,
                relation_end,
            }),
            Link::Hyperlink { location, .. } => Some(LinkTarget::Location(location)),
            Link::Unsupported { .. } => None,
        }
    }
}
