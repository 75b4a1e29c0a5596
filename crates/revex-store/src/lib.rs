// Storage leaves. The ledger is the resumption checkpoint; the repository
// is the document sink. Neither knows about the chunker or the orchestrator.

mod ledger;
mod repository;

pub use ledger::{Ledger, WatermarkRecord};
pub use repository::RevisionRepository;
