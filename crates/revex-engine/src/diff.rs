use revex_types::{Attachment, FieldChange, Link, Revision, RevisionDelta};
use std::fmt;

pub type Result<T> = std::result::Result<T, DiffError>;

/// Errors from the differencing layer. There are no retryable failures
/// here: an unsupported link kind means the source schema has drifted past
/// what this exporter models, and the run must stop rather than persist
/// incomplete history.
#[derive(Debug)]
pub enum DiffError {
    UnsupportedLink {
        item_id: i64,
        revision_index: u32,
        type_name: String,
    },
}

impl fmt::Display for DiffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffError::UnsupportedLink {
                item_id,
                revision_index,
                type_name,
            } => write!(
                f,
                "unsupported link type '{}' on work item {} revision {}",
                type_name, item_id, revision_index
            ),
        }
    }
}

impl std::error::Error for DiffError {}

/// Reduce a revision snapshot to the delta worth persisting.
///
/// A field is retained iff there is no predecessor, the predecessor lacks
/// it, or its value changed. A link is retained iff no predecessor link
/// matches it on (variant, link type, comment, comparable target) - a set
/// membership test, so reordering alone never yields a "new" link.
///
/// Attachments are not populated here; attachment processing appends refs
/// as downloads succeed.
pub fn diff_revision(
    item_id: i64,
    current: &Revision,
    previous: Option<&Revision>,
) -> Result<RevisionDelta> {
    let mut fields = Vec::new();
    for (reference_name, field) in &current.fields {
        let changed = match previous.and_then(|prev| prev.fields.get(reference_name)) {
            Some(prior) => prior.value != field.value,
            None => true,
        };
        if changed {
            fields.push(FieldChange {
                name: field.name.clone(),
                reference_name: reference_name.clone(),
                value: field.value.clone(),
            });
        }
    }

    let mut links = Vec::new();
    for link in &current.links {
        if let Link::Unsupported { type_name } = link {
            return Err(DiffError::UnsupportedLink {
                item_id,
                revision_index: current.index,
                type_name: type_name.clone(),
            });
        }
        let seen = previous.is_some_and(|prev| prev.links.iter().any(|p| links_match(link, p)));
        if !seen {
            links.push(link.clone());
        }
    }

    Ok(RevisionDelta {
        item_id,
        index: current.index,
        changed_date: current.changed_date,
        fields,
        links,
        attachments: Vec::new(),
    })
}

/// Attachments in `current` not present in `previous`, by file name only.
/// Comment edits and re-uploads under the same name do not count as new.
pub fn new_attachments<'a>(
    current: &'a Revision,
    previous: Option<&Revision>,
) -> Vec<&'a Attachment> {
    current
        .attachments
        .iter()
        .filter(|attachment| {
            !previous.is_some_and(|prev| {
                prev.attachments
                    .iter()
                    .any(|prior| prior.name == attachment.name)
            })
        })
        .collect()
}

fn links_match(current: &Link, previous: &Link) -> bool {
    if current.link_type() != previous.link_type() {
        return false;
    }
    if current.comment() != previous.comment() {
        return false;
    }
    match (current.comparable_target(), previous.comparable_target()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
