// Engine module - pure diffing logic between revision snapshots.
// No I/O here; everything downstream of a fetched item happens elsewhere.

mod diff;

pub use diff::{DiffError, diff_revision, new_attachments};
