use anyhow::Result;
use revex_store::RevisionRepository;
use std::path::Path;

pub fn handle(storage: &Path, item: i64, revision: Option<u32>) -> Result<()> {
    let repository = RevisionRepository::open(storage)?;

    match revision {
        Some(index) => {
            let delta = repository.load_revision(item, index)?;
            println!("{}", serde_json::to_string_pretty(&delta)?);
        }
        None => {
            let indexes = repository.exported_revisions(item)?;
            if indexes.is_empty() {
                println!("No exported revisions for item {}", item);
                return Ok(());
            }
            println!("Exported revisions for item {}:", item);
            for index in indexes {
                println!("  {}", index);
            }
        }
    }

    Ok(())
}
