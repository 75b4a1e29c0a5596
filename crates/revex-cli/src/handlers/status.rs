use anyhow::Result;
use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::path::Path;

use revex_store::RevisionRepository;

#[derive(Serialize)]
struct WatermarkRow {
    item_id: i64,
    watermark: i64,
    updated_at: Option<String>,
}

pub fn handle(storage: &Path, as_csv: bool) -> Result<()> {
    let repository = RevisionRepository::open(storage)?;
    let records = repository.ledger().watermarks()?;

    if as_csv {
        let mut writer = csv::Writer::from_writer(std::io::stdout());
        for record in &records {
            writer.serialize(WatermarkRow {
                item_id: record.item_id,
                watermark: record.revision_index,
                updated_at: record.updated_at.clone(),
            })?;
        }
        writer.flush()?;
        return Ok(());
    }

    let colored = std::io::stdout().is_terminal();
    let revisions_on_disk = repository.exported_revision_count();

    if records.is_empty() {
        println!("Nothing exported yet at {}", storage.display());
        return Ok(());
    }

    println!(
        "{} items exported, {} revision deltas on disk",
        records.len(),
        revisions_on_disk
    );
    for record in &records {
        let updated = record.updated_at.as_deref().unwrap_or("-");
        if colored {
            println!(
                "  item {}  watermark {}  updated {}",
                record.item_id.cyan(),
                record.revision_index.green(),
                updated.dimmed()
            );
        } else {
            println!(
                "  item {}  watermark {}  updated {}",
                record.item_id, record.revision_index, updated
            );
        }
    }

    Ok(())
}
