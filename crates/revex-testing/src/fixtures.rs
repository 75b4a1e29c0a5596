//! Builders for work items, revisions and snapshot files.

use anyhow::Result;
use chrono::{DateTime, Utc};
use revex_types::{Attachment, Field, Link, Revision, WorkItem};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Parse an RFC 3339 timestamp; panics on malformed test input.
pub fn ts(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .unwrap_or_else(|_| panic!("invalid test timestamp: {}", value))
        .with_timezone(&Utc)
}

pub fn work_item(id: i64, created: DateTime<Utc>, revisions: Vec<Revision>) -> WorkItem {
    WorkItem {
        id,
        created_date: created,
        revisions,
    }
}

/// A revision with the given fields; reference name doubles as display
/// name, which is all the pipeline cares about in tests.
pub fn revision(index: u32, changed: DateTime<Utc>, fields: &[(&str, Value)]) -> Revision {
    let fields = fields
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                Field {
                    name: name.to_string(),
                    value: value.clone(),
                },
            )
        })
        .collect::<BTreeMap<_, _>>();

    Revision {
        index,
        changed_date: changed,
        fields,
        links: Vec::new(),
        attachments: Vec::new(),
    }
}

pub fn attachment(id: i64, name: &str) -> Attachment {
    Attachment {
        id,
        name: name.to_string(),
        comment: String::new(),
    }
}

pub fn external_link(uri: &str) -> Link {
    Link::External {
        link_type: "ArtifactLink".to_string(),
        comment: String::new(),
        artifact_uri: uri.to_string(),
    }
}

pub fn related_link(target_id: i64, relation_end: &str) -> Link {
    Link::Related {
        link_type: "WorkItemLink".to_string(),
        comment: String::new(),
        relation_end: relation_end.to_string(),
        target_id,
    }
}

pub fn hyperlink(location: &str) -> Link {
    Link::Hyperlink {
        link_type: "Hyperlink".to_string(),
        comment: String::new(),
        location: location.to_string(),
    }
}

/// Write items as a JSONL snapshot file, one work item per line.
pub fn write_snapshot(path: &Path, items: &[WorkItem]) -> Result<()> {
    let mut file = fs::File::create(path)?;
    for item in items {
        writeln!(file, "{}", serde_json::to_string(item)?)?;
    }
    Ok(())
}
